//! Core library for the kato-sorter command line application.
//!
//! The sorter gathers KATO-coded report tables from a tree of workbooks and
//! re-emits them as one workbook per area code, filed by region. IO adapters
//! live under [`ephu::kato::io`], the in-memory aggregate inside
//! [`ephu::kato::model`], header detection in [`ephu::kato::extract`], sheet
//! layout in [`ephu::kato::layout`], and the run orchestration under
//! [`ephu::kato::pipeline`].

pub mod ephu;

pub use ephu::kato::{
    KatoError, Result, config, error, extract, io, layout, model, naming, pipeline, region,
};
