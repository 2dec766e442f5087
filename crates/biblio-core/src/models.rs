//! Wire records from the metadata source and the flat documents sent to the
//! search index.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::AppError;

/// Entity kinds handled by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Article,
    Journal,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Article => "article",
            EntityType::Journal => "journal",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Source records
// =============================================================================

/// License terms attached to a record.
#[derive(Deserialize, Debug, Clone)]
pub struct Permission {
    /// License identifier, e.g. `by/4.0`.
    #[serde(default)]
    pub id: Option<String>,
}

/// Issue reference nested inside an article record.
#[derive(Deserialize, Debug, Clone)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: String,
}

/// Author affiliation. Only the country matters to the mapper; everything
/// else the source sends is ignored.
#[derive(Deserialize, Debug, Clone)]
pub struct Affiliation {
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Author {
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub given_names: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Citation {
    #[serde(default)]
    pub citation_type: Option<String>,
    #[serde(default)]
    pub publication_year: Option<String>,
}

/// Journal record as served by the metadata source.
#[derive(Deserialize, Debug, Clone)]
pub struct Journal {
    pub collection_acronym: String,
    pub scielo_issn: String,
    #[serde(default)]
    pub subject_areas: Vec<String>,
    pub creation_date: String,
    pub current_status: String,
    pub title: String,
    #[serde(default)]
    pub permissions: Option<Permission>,
}

/// Article record as served by the metadata source, with its nested journal
/// and issue references.
#[derive(Deserialize, Debug, Clone)]
pub struct Article {
    pub collection_acronym: String,
    pub publisher_id: String,
    pub journal: Journal,
    #[serde(default)]
    pub issue: Option<Issue>,
    pub creation_date: String,
    pub processing_date: String,
    pub publication_date: String,
    pub document_type: String,
    #[serde(default)]
    pub start_page: Option<String>,
    #[serde(default)]
    pub end_page: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub affiliations: Vec<Affiliation>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub permissions: Option<Permission>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub receive_date: Option<String>,
    #[serde(default)]
    pub acceptance_date: Option<String>,
}

// =============================================================================
// Change history
// =============================================================================

/// Change kinds reported by the history feed.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Update,
    Delete,
}

/// History codes arrive as a scalar (articles) or a list (journals).
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum HistoryCode {
    Single(String),
    Compound(Vec<String>),
}

impl HistoryCode {
    /// Resolves the code for a delete id: the scalar code as-is (articles),
    /// or the first element of the list (journals). Empty string means
    /// unresolvable.
    pub fn resolve(&self) -> &str {
        match self {
            HistoryCode::Single(code) => code,
            HistoryCode::Compound(codes) => codes.first().map(String::as_str).unwrap_or(""),
        }
    }
}

/// Single entry of the change-history feed.
#[derive(Deserialize, Debug, Clone)]
pub struct HistoryEntry {
    pub collection: String,
    pub event: ChangeKind,
    pub code: HistoryCode,
}

/// History entry paired with the current record, when one still exists.
/// Delete entries normally carry no record.
#[derive(Deserialize, Debug, Clone)]
pub struct HistoryRecord<T> {
    pub history: HistoryEntry,
    pub record: Option<T>,
}

// =============================================================================
// Index documents
// =============================================================================

/// A flat record ready for indexing. Optional fields serialize as omitted
/// keys, never as nulls.
pub trait IndexableDocument: Serialize {
    /// Stable index id, always non-empty.
    fn id(&self) -> &str;
}

/// Flattened journal document.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JournalDocument {
    pub id: String,
    pub issn: String,
    pub collection: String,
    pub subject_areas: Vec<String>,
    pub included_at_year: String,
    pub status: String,
    pub title: String,
    pub license: String,
}

impl IndexableDocument for JournalDocument {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Flattened article document.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ArticleDocument {
    pub id: String,
    pub pid: String,
    pub issn: String,
    pub journal_title: String,
    pub issue: String,
    pub issue_type: String,
    pub creation_year: String,
    pub creation_date: String,
    pub processing_year: String,
    pub processing_date: String,
    pub publication_date: String,
    pub publication_year: String,
    pub subject_areas: Vec<String>,
    pub collection: String,
    pub document_type: String,
    pub pages: i64,
    pub languages: Vec<String>,
    pub aff_countries: Vec<String>,
    pub citations: usize,
    pub authors: usize,
    pub license: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_delta: Option<i64>,
}

impl IndexableDocument for ArticleDocument {
    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Change events
// =============================================================================

/// Uniform event emitted by the change stream, applied in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// Upsert the document under its id.
    Add { id: String, document: Value },
    /// Remove the document with this id.
    Delete { id: String },
}

impl ChangeEvent {
    /// Builds an add event from a mapped document.
    pub fn add<D: IndexableDocument>(document: &D) -> Result<Self, AppError> {
        let id = document.id().to_string();
        let document = serde_json::to_value(document)?;
        Ok(ChangeEvent::Add { id, document })
    }

    pub fn id(&self) -> &str {
        match self {
            ChangeEvent::Add { id, .. } => id,
            ChangeEvent::Delete { id } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_display() {
        assert_eq!(EntityType::Article.to_string(), "article");
        assert_eq!(EntityType::Journal.to_string(), "journal");
    }

    #[test]
    fn test_history_code_resolve_scalar() {
        let code = HistoryCode::Single("S0001-00012015000100001".to_string());
        assert_eq!(code.resolve(), "S0001-00012015000100001");
    }

    #[test]
    fn test_history_code_resolve_list_takes_first() {
        let code = HistoryCode::Compound(vec!["0001-0001".to_string(), "scl".to_string()]);
        assert_eq!(code.resolve(), "0001-0001");
    }

    #[test]
    fn test_history_code_resolve_empty_list() {
        let code = HistoryCode::Compound(vec![]);
        assert_eq!(code.resolve(), "");
    }

    #[test]
    fn test_history_entry_deserialization() {
        let json = r#"{
            "collection": "scl",
            "event": "delete",
            "code": ["0001-0001", "scl"]
        }"#;

        let entry: HistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.collection, "scl");
        assert_eq!(entry.event, ChangeKind::Delete);
        assert_eq!(entry.code.resolve(), "0001-0001");
    }

    #[test]
    fn test_history_record_without_record_key() {
        // Delete entries may omit the record key instead of sending null.
        let json = r#"{
            "history": {"collection": "scl", "event": "delete", "code": ["0001-0001"]}
        }"#;

        let item: HistoryRecord<Journal> = serde_json::from_str(json).unwrap();
        assert_eq!(item.history.event, ChangeKind::Delete);
        assert!(item.record.is_none());
    }

    #[test]
    fn test_article_record_deserialization_defaults() {
        let json = r#"{
            "collection_acronym": "scl",
            "publisher_id": "S0001-00012015000100001",
            "journal": {
                "collection_acronym": "scl",
                "scielo_issn": "0001-0001",
                "creation_date": "2015-06-01",
                "current_status": "current",
                "title": "T",
                "permissions": null
            },
            "issue": null,
            "creation_date": "2015-06-01",
            "processing_date": "2015-06-10",
            "publication_date": "2015-05-01",
            "document_type": "research-article"
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();
        assert!(article.languages.is_empty());
        assert!(article.affiliations.is_empty());
        assert!(article.citations.is_empty());
        assert!(article.doi.is_none());
    }

    #[test]
    fn test_optional_article_fields_are_omitted() {
        let doc = ArticleDocument {
            id: "scl_S0001".to_string(),
            pid: "S0001".to_string(),
            issn: "0001-0001".to_string(),
            journal_title: "T".to_string(),
            issue: "scl_S0001".to_string(),
            issue_type: "undefined".to_string(),
            creation_year: "2015".to_string(),
            creation_date: "2015-06-01".to_string(),
            processing_year: "2015".to_string(),
            processing_date: "2015-06-10".to_string(),
            publication_date: "2015-05-01".to_string(),
            publication_year: "2015".to_string(),
            subject_areas: vec!["undefined".to_string()],
            collection: "scl".to_string(),
            document_type: "research-article".to_string(),
            pages: 0,
            languages: vec!["undefined".to_string()],
            aff_countries: vec!["undefined".to_string()],
            citations: 0,
            authors: 0,
            license: "undefined".to_string(),
            doi: None,
            doi_prefix: None,
            acceptance_delta: None,
        };

        let value = serde_json::to_value(&doc).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("doi"));
        assert!(!object.contains_key("doi_prefix"));
        assert!(!object.contains_key("acceptance_delta"));
    }
}
