pub mod kato;
