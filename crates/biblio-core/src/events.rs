//! Change-event stream over the metadata source.
//!
//! Converts the source's paginated iteration (direct listing or
//! history-of-changes) into a single lazy sequence of [`ChangeEvent`]s.
//! The stream makes one forward pass, pulling one page at a time, and is
//! not restartable.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};

use crate::country::CountryTable;
use crate::error::AppError;
use crate::models::{
    Article, ChangeEvent, ChangeKind, EntityType, HistoryEntry, HistoryRecord, IndexableDocument,
    Journal,
};
use crate::transform::{map_article, map_journal};

/// Records fetched per request.
const PAGE_SIZE: usize = 100;

/// Read-only view of the remote metadata source.
///
/// All four listings are paginated with `offset`/`limit`; an empty page
/// ends the iteration.
#[async_trait]
pub trait MetadataSource {
    /// Current article records changed since `from_date`.
    async fn documents(
        &self,
        from_date: NaiveDate,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Article>, AppError>;

    /// Article change history since `from_date`, each entry paired with the
    /// current record when one still exists.
    async fn document_history(
        &self,
        from_date: NaiveDate,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<HistoryRecord<Article>>, AppError>;

    /// All current journal records.
    async fn journals(&self, offset: usize, limit: usize) -> Result<Vec<Journal>, AppError>;

    /// Journal change history since `from_date`.
    async fn journal_history(
        &self,
        from_date: NaiveDate,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<HistoryRecord<Journal>>, AppError>;
}

/// Builds the lazy event stream for one entity type.
///
/// Identifiers mode maps every record to an add event. History mode (the
/// default) interprets delete entries into delete events and maps any
/// accompanying record into an add event, in entry order.
pub fn stream_events<'a, S>(
    source: &'a S,
    entity: EntityType,
    from_date: NaiveDate,
    identifiers: bool,
    countries: &'a CountryTable,
) -> BoxStream<'a, Result<ChangeEvent, AppError>>
where
    S: MetadataSource + Sync + ?Sized,
{
    stream::try_unfold(0usize, move |offset| async move {
        match fetch_page(source, entity, from_date, identifiers, countries, offset).await? {
            Some((events, fetched)) => Ok::<_, AppError>(Some((events, offset + fetched))),
            None => Ok(None),
        }
    })
    .map_ok(|events| stream::iter(events.into_iter().map(Ok::<_, AppError>)))
    .try_flatten()
    .boxed()
}

/// Fetches one page and converts it into events. `None` marks the end of
/// the source; the second tuple element is the number of source items the
/// page held (events per item vary between zero and two).
async fn fetch_page<S>(
    source: &S,
    entity: EntityType,
    from_date: NaiveDate,
    identifiers: bool,
    countries: &CountryTable,
    offset: usize,
) -> Result<Option<(Vec<ChangeEvent>, usize)>, AppError>
where
    S: MetadataSource + Sync + ?Sized,
{
    match (entity, identifiers) {
        (EntityType::Article, true) => {
            let records = source.documents(from_date, offset, PAGE_SIZE).await?;
            if records.is_empty() {
                return Ok(None);
            }
            let fetched = records.len();
            let events = records
                .iter()
                .map(|record| ChangeEvent::add(&map_article(record, countries)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some((events, fetched)))
        }
        (EntityType::Article, false) => {
            let items = source.document_history(from_date, offset, PAGE_SIZE).await?;
            if items.is_empty() {
                return Ok(None);
            }
            let fetched = items.len();
            let mut events = Vec::with_capacity(fetched);
            for item in &items {
                let document = item.record.as_ref().map(|r| map_article(r, countries));
                events.extend(history_events(&item.history, document)?);
            }
            Ok(Some((events, fetched)))
        }
        (EntityType::Journal, true) => {
            let records = source.journals(offset, PAGE_SIZE).await?;
            if records.is_empty() {
                return Ok(None);
            }
            let fetched = records.len();
            let events = records
                .iter()
                .map(|record| ChangeEvent::add(&map_journal(record)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some((events, fetched)))
        }
        (EntityType::Journal, false) => {
            let items = source.journal_history(from_date, offset, PAGE_SIZE).await?;
            if items.is_empty() {
                return Ok(None);
            }
            let fetched = items.len();
            let mut events = Vec::with_capacity(fetched);
            for item in &items {
                let document = item.record.as_ref().map(map_journal);
                events.extend(history_events(&item.history, document)?);
            }
            Ok(Some((events, fetched)))
        }
    }
}

/// Events for one history entry: a delete event when the entry is a delete
/// with a resolvable code, then an add event when a current record
/// accompanies the entry. A delete entry whose code resolves empty is
/// skipped entirely, record included.
fn history_events<D>(
    history: &HistoryEntry,
    document: Option<D>,
) -> Result<Vec<ChangeEvent>, AppError>
where
    D: IndexableDocument,
{
    let mut events = Vec::new();

    if history.event == ChangeKind::Delete {
        let code = history.code.resolve();
        if code.is_empty() {
            return Ok(events);
        }
        events.push(ChangeEvent::Delete {
            id: format!("{}_{}", history.collection, code),
        });
    }

    if let Some(document) = document {
        events.push(ChangeEvent::add(&document)?);
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryCode;

    fn journal() -> Journal {
        serde_json::from_str(
            r#"{
                "collection_acronym": "scl",
                "scielo_issn": "0001-0001",
                "subject_areas": ["Medicine"],
                "creation_date": "2015-06-01",
                "current_status": "current",
                "title": "T",
                "permissions": null
            }"#,
        )
        .unwrap()
    }

    fn delete_entry(code: HistoryCode) -> HistoryEntry {
        HistoryEntry {
            collection: "scl".to_string(),
            event: ChangeKind::Delete,
            code,
        }
    }

    #[test]
    fn test_delete_with_empty_code_yields_nothing() {
        let entry = delete_entry(HistoryCode::Compound(vec![]));
        let events =
            history_events(&entry, Some(map_journal(&journal()))).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn test_delete_with_code_yields_delete_event() {
        let entry = delete_entry(HistoryCode::Compound(vec![
            "0001-0001".to_string(),
            "scl".to_string(),
        ]));
        let events =
            history_events::<crate::models::JournalDocument>(&entry, None)
                .unwrap();

        assert_eq!(
            events,
            vec![ChangeEvent::Delete {
                id: "scl_0001-0001".to_string()
            }]
        );
    }

    #[test]
    fn test_delete_with_record_yields_delete_then_add() {
        let entry = delete_entry(HistoryCode::Compound(vec!["0001-0001".to_string()]));
        let events =
            history_events(&entry, Some(map_journal(&journal()))).unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ChangeEvent::Delete { id } if id == "scl_0001-0001"));
        assert!(matches!(&events[1], ChangeEvent::Add { id, .. } if id == "scl_0001-0001"));
    }

    #[test]
    fn test_update_entry_yields_add_only() {
        let entry = HistoryEntry {
            collection: "scl".to_string(),
            event: ChangeKind::Update,
            code: HistoryCode::Compound(vec!["0001-0001".to_string()]),
        };
        let events =
            history_events(&entry, Some(map_journal(&journal()))).unwrap();

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ChangeEvent::Add { .. }));
    }

    #[test]
    fn test_article_delete_uses_scalar_code() {
        let entry = HistoryEntry {
            collection: "scl".to_string(),
            event: ChangeKind::Delete,
            code: HistoryCode::Single("S0001-00012015000100001".to_string()),
        };
        let events =
            history_events::<crate::models::ArticleDocument>(&entry, None)
                .unwrap();

        assert_eq!(
            events,
            vec![ChangeEvent::Delete {
                id: "scl_S0001-00012015000100001".to_string()
            }]
        );
    }

    struct PagedJournals {
        journals: Vec<Journal>,
    }

    #[async_trait]
    impl MetadataSource for PagedJournals {
        async fn documents(
            &self,
            _from_date: NaiveDate,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<Article>, AppError> {
            Ok(vec![])
        }

        async fn document_history(
            &self,
            _from_date: NaiveDate,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<HistoryRecord<Article>>, AppError> {
            Ok(vec![])
        }

        async fn journals(&self, offset: usize, limit: usize) -> Result<Vec<Journal>, AppError> {
            Ok(self
                .journals
                .iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn journal_history(
            &self,
            _from_date: NaiveDate,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<HistoryRecord<Journal>>, AppError> {
            Ok(vec![])
        }
    }

    struct PagedHistory {
        items: Vec<HistoryRecord<Journal>>,
    }

    #[async_trait]
    impl MetadataSource for PagedHistory {
        async fn documents(
            &self,
            _from_date: NaiveDate,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<Article>, AppError> {
            Ok(vec![])
        }

        async fn document_history(
            &self,
            _from_date: NaiveDate,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<HistoryRecord<Article>>, AppError> {
            Ok(vec![])
        }

        async fn journals(&self, _offset: usize, _limit: usize) -> Result<Vec<Journal>, AppError> {
            Ok(vec![])
        }

        async fn journal_history(
            &self,
            _from_date: NaiveDate,
            offset: usize,
            limit: usize,
        ) -> Result<Vec<HistoryRecord<Journal>>, AppError> {
            Ok(self
                .items
                .iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_stream_interprets_history_entries_in_order() {
        let source = PagedHistory {
            items: vec![
                HistoryRecord {
                    history: delete_entry(HistoryCode::Compound(vec!["0001-0001".to_string()])),
                    record: None,
                },
                HistoryRecord {
                    history: HistoryEntry {
                        collection: "scl".to_string(),
                        event: ChangeKind::Update,
                        code: HistoryCode::Compound(vec!["0001-0001".to_string()]),
                    },
                    record: Some(journal()),
                },
            ],
        };
        let countries = CountryTable::new();
        let from = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();

        let events: Vec<ChangeEvent> =
            stream_events(&source, EntityType::Journal, from, false, &countries)
                .try_collect()
                .await
                .unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], ChangeEvent::Delete { id } if id == "scl_0001-0001"));
        assert!(matches!(&events[1], ChangeEvent::Add { id, .. } if id == "scl_0001-0001"));
    }

    #[tokio::test]
    async fn test_stream_exhausts_identifiers_listing() {
        let source = PagedJournals {
            journals: vec![journal(); 3],
        };
        let countries = CountryTable::new();
        let from = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();

        let events: Vec<ChangeEvent> =
            stream_events(&source, EntityType::Journal, from, true, &countries)
                .try_collect()
                .await
                .unwrap();

        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|event| matches!(event, ChangeEvent::Add { id, .. } if id == "scl_0001-0001")));
    }
}
