//! Biblio CLI - loads SciELO network metadata into the search index.

pub mod config;

pub use config::{Config, DocType};
