pub mod config;
pub mod error;
pub mod extract;
pub mod io;
pub mod layout;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod region;

pub use error::{KatoError, Result};
