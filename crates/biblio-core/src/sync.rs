//! Sync driver: consumes the change-event stream and applies it to the
//! search index.
//!
//! Events are applied strictly in arrival order, one at a time. Each event
//! is independent; a delete followed later by an add for the same id is
//! applied in stream order, last write wins.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use serde_json::Value;
use tracing::{debug, error};

use crate::country::CountryTable;
use crate::error::AppError;
use crate::events::{stream_events, MetadataSource};
use crate::models::{ChangeEvent, EntityType};

/// Write side of the search index.
#[async_trait]
pub trait SearchIndex {
    /// Creates the index with its schema when missing. Idempotent: an
    /// already existing index is success.
    async fn ensure_index(&self) -> Result<(), AppError>;

    /// Inserts or replaces the document under `id`.
    async fn upsert(
        &self,
        entity: EntityType,
        id: &str,
        document: &Value,
    ) -> Result<(), AppError>;

    /// Removes the document under `id`. Absence is reported as
    /// [`AppError::DocumentNotFound`], distinguishable from other failures.
    async fn delete(&self, entity: EntityType, id: &str) -> Result<(), AppError>;
}

/// Outcome of applying a single change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Document upserted into the index.
    Indexed,
    /// Document removed from the index.
    Removed,
    /// Delete found nothing to remove - already satisfied.
    AlreadyAbsent,
    /// Delete failed for a reason other than absence.
    Failed,
}

/// Statistics for one sync run.
#[derive(Debug, Default, Clone)]
pub struct SyncStats {
    pub indexed: usize,
    pub removed: usize,
    pub already_absent: usize,
    pub failed: usize,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome, incrementing the appropriate counter.
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Indexed => self.indexed += 1,
            SyncOutcome::Removed => self.removed += 1,
            SyncOutcome::AlreadyAbsent => self.already_absent += 1,
            SyncOutcome::Failed => self.failed += 1,
        }
    }

    /// Total number of applied events.
    pub fn total(&self) -> usize {
        self.indexed + self.removed + self.already_absent + self.failed
    }
}

/// Runs one full sync pass for `entity`.
///
/// Ensures the index exists, then applies every event the source yields.
/// Upsert errors propagate and abort the run; delete errors are absorbed -
/// absence at debug level, anything else at error level - and the loop
/// continues.
pub async fn run_sync<S, I>(
    source: &S,
    index: &I,
    entity: EntityType,
    from_date: NaiveDate,
    identifiers: bool,
    countries: &CountryTable,
) -> Result<SyncStats, AppError>
where
    S: MetadataSource + Sync + ?Sized,
    I: SearchIndex + Sync + ?Sized,
{
    index.ensure_index().await?;

    let mut stats = SyncStats::new();
    let mut events = stream_events(source, entity, from_date, identifiers, countries);

    while let Some(event) = events.try_next().await? {
        match event {
            ChangeEvent::Add { id, document } => {
                debug!("loading document {} into index {}", id, entity);
                index.upsert(entity, &id, &document).await?;
                stats.record(SyncOutcome::Indexed);
            }
            ChangeEvent::Delete { id } => {
                debug!("removing document {} from index {}", id, entity);
                match index.delete(entity, &id).await {
                    Ok(()) => stats.record(SyncOutcome::Removed),
                    Err(AppError::DocumentNotFound(_)) => {
                        debug!("record already removed: {}", id);
                        stats.record(SyncOutcome::AlreadyAbsent);
                    }
                    Err(e) => {
                        error!("unexpected error removing {}: {}", id, e);
                        stats.record(SyncOutcome::Failed);
                    }
                }
            }
        }
    }

    Ok(stats)
}
