use async_trait::async_trait;
use biblio_core::error::AppError;
use biblio_core::models::EntityType;
use biblio_core::sync::SearchIndex;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Name of the index every document type lives in.
const INDEX_NAME: &str = "publication";

/// Index operations can take a long time on large backlogs.
const INDEX_TIMEOUT: Duration = Duration::from_secs(360);

/// Exact-match journal fields.
const JOURNAL_FIELDS: &[&str] = &[
    "collection",
    "id",
    "issn",
    "subject_areas",
    "title",
    "included_at_year",
    "status",
    "license",
];

/// Exact-match article fields. Numeric fields (pages, counts, the
/// acceptance delta) are left to dynamic mapping.
const ARTICLE_FIELDS: &[&str] = &[
    "id",
    "pid",
    "issn",
    "issue",
    "subject_areas",
    "collection",
    "languages",
    "aff_countries",
    "document_type",
    "journal_title",
    "license",
    "creation_date",
    "creation_year",
    "processing_year",
    "processing_date",
    "publication_year",
    "publication_date",
    "doi",
    "doi_prefix",
    "issue_type",
];

/// Reserved citation type, unused by the current mapping.
const CITATION_FIELDS: &[&str] = &["collection", "id", "pid", "citation_type", "publication_year"];

/// HTTP client for the Elasticsearch publication index.
///
/// # Examples
///
/// ```no_run
/// use biblio_index::ElasticIndex;
/// use biblio_core::sync::SearchIndex;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let index = ElasticIndex::new("http://127.0.0.1:9200")?;
/// index.ensure_index().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ElasticIndex {
    client: Client,
    base_url: Url,
}

impl ElasticIndex {
    /// Creates a new client for the given Elasticsearch address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the address is malformed and
    /// `AppError::IndexError` if the HTTP client cannot be built.
    pub fn new(base_url_str: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url_str).map_err(|_| {
            AppError::InvalidUrl(format!("Invalid Elasticsearch URL: {}", base_url_str))
        })?;

        let client = Client::builder()
            .user_agent("biblio/0.1 (metadata-loader)")
            .timeout(INDEX_TIMEOUT)
            .build()
            .map_err(|e| AppError::IndexError(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Full index mapping: journal, article, and the reserved citation
    /// type, every field exact-match.
    fn mappings() -> Value {
        json!({
            "mappings": {
                "journal": { "properties": properties(JOURNAL_FIELDS) },
                "citation": { "properties": properties(CITATION_FIELDS) },
                "article": { "properties": properties(ARTICLE_FIELDS) }
            }
        })
    }

    fn doc_url(&self, entity: EntityType, id: &str) -> Result<Url, AppError> {
        self.base_url
            .join(&format!("{}/{}/{}", INDEX_NAME, entity.as_str(), id))
            .map_err(|e| AppError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    async fn ensure_index(&self) -> Result<(), AppError> {
        let url = self
            .base_url
            .join(INDEX_NAME)
            .map_err(|e| AppError::InvalidUrl(e.to_string()))?;

        let resp = self
            .client
            .put(url)
            .json(&Self::mappings())
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception")
        {
            debug!("index {} already available", INDEX_NAME);
            return Ok(());
        }

        Err(AppError::IndexError(format!(
            "index creation failed: HTTP {}: {}",
            status.as_u16(),
            body
        )))
    }

    async fn upsert(
        &self,
        entity: EntityType,
        id: &str,
        document: &Value,
    ) -> Result<(), AppError> {
        let url = self.doc_url(entity, id)?;

        let resp = self
            .client
            .put(url)
            .json(document)
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::IndexError(format!(
                "upsert of {} failed: HTTP {}: {}",
                id,
                status.as_u16(),
                body
            )));
        }

        Ok(())
    }

    async fn delete(&self, entity: EntityType, id: &str) -> Result<(), AppError> {
        let url = self.doc_url(entity, id)?;

        let resp = self.client.delete(url).send().await.map_err(request_error)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::DocumentNotFound(id.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::IndexError(format!(
                "delete of {} failed: HTTP {}: {}",
                id,
                status.as_u16(),
                body
            )));
        }

        Ok(())
    }
}

/// Builds a `properties` block with every field exact-match.
fn properties(fields: &[&str]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|field| {
            (
                (*field).to_string(),
                json!({ "type": "string", "index": "not_analyzed" }),
            )
        })
        .collect();

    Value::Object(properties)
}

/// Classifies a transport-level failure into a typed error.
fn request_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(INDEX_TIMEOUT.as_secs())
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {}", e))
    } else {
        AppError::IndexError(e.to_string())
    }
}
