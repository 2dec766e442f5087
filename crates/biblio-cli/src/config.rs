use biblio_core::models::EntityType;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "biblio")]
#[command(
    author,
    version,
    about = "Load SciELO network metadata into the publication search index"
)]
#[command(after_help = "Examples:
  biblio --doc-type journal
  biblio --doc-type article --from-date 2013-12-31
  biblio --doc-type article --identifiers --log-level debug")]
pub struct Config {
    /// ArticleMeta service base URL
    #[arg(long, env = "ARTICLEMETA_URL", default_value = "http://127.0.0.1:11720")]
    pub articlemeta_url: String,

    /// Elasticsearch base URL
    #[arg(long, env = "ELASTICSEARCH_URL", default_value = "http://127.0.0.1:9200")]
    pub elasticsearch_url: String,

    /// Document type that will be updated
    #[arg(short = 'd', long, value_enum)]
    pub doc_type: DocType,

    /// ISO date like 2013-12-31; defaults to 30 days before run time
    #[arg(short = 'f', long)]
    pub from_date: Option<NaiveDate>,

    /// Read current records from the identifiers endpoints instead of the
    /// change history. History mode also removes deleted records from the
    /// index.
    #[arg(short, long)]
    pub identifiers: bool,

    /// Logging level
    #[arg(short = 'l', long, default_value = "info")]
    pub log_level: Level,

    /// Full path to the log file; logs go to stderr when omitted
    #[arg(short = 'o', long)]
    pub log_file: Option<PathBuf>,
}

/// Selectable entity types.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DocType {
    Article,
    Journal,
}

impl From<DocType> for EntityType {
    fn from(doc_type: DocType) -> Self {
        match doc_type {
            DocType::Article => EntityType::Article,
            DocType::Journal => EntityType::Journal,
        }
    }
}
