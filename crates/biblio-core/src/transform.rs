//! Flattening of nested source records into indexable documents.
//!
//! All functions here are pure. Unparseable dates and page numbers resolve
//! to safe defaults (zero, or an omitted field) instead of failing the
//! record.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::country::{CountryTable, UNDEFINED};
use crate::models::{Article, ArticleDocument, Journal, JournalDocument, Permission};

/// Number of characters of a publisher id that identify its issue.
const ISSUE_CODE_LEN: usize = 18;

/// Flattens a journal record.
///
/// # Examples
///
/// ```
/// use biblio_core::models::Journal;
/// use biblio_core::transform::map_journal;
///
/// let journal: Journal = serde_json::from_str(r#"{
///     "collection_acronym": "scl",
///     "scielo_issn": "0001-0001",
///     "subject_areas": ["Medicine"],
///     "creation_date": "2015-06-01",
///     "current_status": "current",
///     "title": "T",
///     "permissions": null
/// }"#).unwrap();
///
/// let doc = map_journal(&journal);
/// assert_eq!(doc.id, "scl_0001-0001");
/// assert_eq!(doc.included_at_year, "2015");
/// assert_eq!(doc.license, "undefined");
/// ```
pub fn map_journal(journal: &Journal) -> JournalDocument {
    JournalDocument {
        id: format!("{}_{}", journal.collection_acronym, journal.scielo_issn),
        issn: journal.scielo_issn.clone(),
        collection: journal.collection_acronym.clone(),
        subject_areas: journal.subject_areas.clone(),
        included_at_year: head(&journal.creation_date, 4).to_string(),
        status: journal.current_status.clone(),
        title: journal.title.clone(),
        license: license_of(journal.permissions.as_ref()),
    }
}

/// Flattens an article record, pulling subject areas and the ISSN from the
/// parent journal and normalizing affiliation countries through the table.
pub fn map_article(article: &Article, countries: &CountryTable) -> ArticleDocument {
    let mut languages: BTreeSet<String> = article.languages.iter().cloned().collect();
    languages.insert(
        article
            .original_language
            .clone()
            .unwrap_or_else(|| UNDEFINED.to_string()),
    );

    let aff_countries: Vec<String> = if article.affiliations.is_empty() {
        vec![UNDEFINED.to_string()]
    } else {
        article
            .affiliations
            .iter()
            .map(|aff| {
                countries
                    .normalize(aff.country.as_deref().unwrap_or(UNDEFINED))
                    .to_string()
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };

    let subject_areas = if article.journal.subject_areas.is_empty() {
        vec![UNDEFINED.to_string()]
    } else {
        article.journal.subject_areas.clone()
    };

    let acceptance_delta = match (
        article.receive_date.as_deref(),
        article.acceptance_date.as_deref(),
    ) {
        (Some(received), Some(accepted)) => acceptance_delta(received, accepted),
        _ => None,
    };

    ArticleDocument {
        id: format!("{}_{}", article.collection_acronym, article.publisher_id),
        pid: article.publisher_id.clone(),
        issn: article.journal.scielo_issn.clone(),
        journal_title: article.journal.title.clone(),
        issue: format!(
            "{}_{}",
            article.collection_acronym,
            head(&article.publisher_id, ISSUE_CODE_LEN)
        ),
        issue_type: article
            .issue
            .as_ref()
            .map(|issue| issue.issue_type.clone())
            .unwrap_or_else(|| UNDEFINED.to_string()),
        creation_year: head(&article.creation_date, 4).to_string(),
        creation_date: article.creation_date.clone(),
        processing_year: head(&article.processing_date, 4).to_string(),
        processing_date: article.processing_date.clone(),
        publication_date: article.publication_date.clone(),
        publication_year: head(&article.publication_date, 4).to_string(),
        subject_areas,
        collection: article.collection_acronym.clone(),
        document_type: article.document_type.clone(),
        pages: page_count(article.start_page.as_deref(), article.end_page.as_deref()),
        languages: languages.into_iter().collect(),
        aff_countries,
        citations: article.citations.len(),
        authors: article.authors.len(),
        license: license_of(article.permissions.as_ref()),
        doi: article.doi.clone(),
        doi_prefix: article
            .doi
            .as_deref()
            .and_then(|doi| doi.split('/').next())
            .map(str::to_string),
        acceptance_delta,
    }
}

/// Page count between first and last page. Parse failures and negative
/// differences resolve to zero.
pub fn page_count(first: Option<&str>, last: Option<&str>) -> i64 {
    let parse = |value: Option<&str>| value.and_then(|s| s.trim().parse::<i64>().ok());

    match (parse(first), parse(last)) {
        (Some(first), Some(last)) => (last - first).max(0),
        _ => 0,
    }
}

/// Days between reception and acceptance. `None` when either date fails to
/// parse as `YYYY-MM-DD` or the delta is negative; zero is a valid delta.
pub fn acceptance_delta(received: &str, accepted: &str) -> Option<i64> {
    let received = NaiveDate::parse_from_str(received, "%Y-%m-%d").ok()?;
    let accepted = NaiveDate::parse_from_str(accepted, "%Y-%m-%d").ok()?;

    let days = (accepted - received).num_days();
    (days >= 0).then_some(days)
}

/// License identifier from the permission block, `"undefined"` when the
/// block is absent or carries no id.
fn license_of(permissions: Option<&Permission>) -> String {
    permissions
        .and_then(|permission| permission.id.clone())
        .unwrap_or_else(|| UNDEFINED.to_string())
}

/// First `n` characters of a string, the whole string when shorter.
fn head(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
