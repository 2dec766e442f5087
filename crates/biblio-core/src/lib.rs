//! Biblio Core - Domain types, record mapping, and sync logic.

pub mod config;
pub mod country;
pub mod error;
pub mod events;
pub mod models;
pub mod sync;
pub mod transform;

pub use config::{default_from_date, HttpConfig};
pub use country::CountryTable;
pub use error::AppError;
pub use events::{stream_events, MetadataSource};
pub use models::{
    Article, ArticleDocument, ChangeEvent, EntityType, HistoryRecord, IndexableDocument, Journal,
    JournalDocument,
};
pub use sync::{run_sync, SearchIndex, SyncOutcome, SyncStats};
