use async_trait::async_trait;
use biblio_core::config::HttpConfig;
use biblio_core::error::AppError;
use biblio_core::events::MetadataSource;
use biblio_core::models::{Article, HistoryRecord, Journal};
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

/// Envelope wrapping every paged ArticleMeta response.
///
/// ```json
/// {
///     "objects": [ ... ]
/// }
/// ```
#[derive(Deserialize, Debug)]
struct SourcePage<T> {
    objects: Vec<T>,
}

/// HTTP client for the ArticleMeta metadata service.
///
/// ArticleMeta serves the bibliographic records (journals and articles) of
/// the SciELO network together with a change-history feed per record type.
///
/// # Examples
///
/// ```no_run
/// use biblio_client::ArticleMetaClient;
/// use biblio_core::events::MetadataSource;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ArticleMetaClient::new("http://127.0.0.1:11720")?;
/// let journals = client.journals(0, 100).await?;
/// println!("Fetched {} journals", journals.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ArticleMetaClient {
    client: Client,
    base_url: Url,
}

impl ArticleMetaClient {
    /// Creates a new client for the given service address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the address is malformed and
    /// `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(base_url_str: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url_str).map_err(|_| {
            AppError::InvalidUrl(format!("Invalid ArticleMeta URL: {}", base_url_str))
        })?;

        let config = HttpConfig::default();
        let client = Client::builder()
            .user_agent("biblio/0.1 (metadata-loader)")
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Fetches one page from `path` and unwraps the `objects` envelope.
    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| AppError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(query);

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::ClientError(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        let page: SourcePage<T> = resp
            .json()
            .await
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(page.objects)
    }
}

#[async_trait]
impl MetadataSource for ArticleMetaClient {
    async fn documents(
        &self,
        from_date: NaiveDate,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Article>, AppError> {
        self.get_page("documents", &paged_query(Some(from_date), offset, limit))
            .await
    }

    async fn document_history(
        &self,
        from_date: NaiveDate,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<HistoryRecord<Article>>, AppError> {
        self.get_page(
            "documents/history",
            &paged_query(Some(from_date), offset, limit),
        )
        .await
    }

    async fn journals(&self, offset: usize, limit: usize) -> Result<Vec<Journal>, AppError> {
        self.get_page("journals", &paged_query(None, offset, limit))
            .await
    }

    async fn journal_history(
        &self,
        from_date: NaiveDate,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<HistoryRecord<Journal>>, AppError> {
        self.get_page(
            "journals/history",
            &paged_query(Some(from_date), offset, limit),
        )
        .await
    }
}

fn paged_query(from_date: Option<NaiveDate>, offset: usize, limit: usize) -> Vec<(&'static str, String)> {
    let mut query = Vec::with_capacity(3);
    if let Some(from) = from_date {
        query.push(("from", from.format("%Y-%m-%d").to_string()));
    }
    query.push(("offset", offset.to_string()));
    query.push(("limit", limit.to_string()));
    query
}

/// Classifies a transport-level failure into a typed error.
fn request_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(HttpConfig::default().timeout.as_secs())
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {}", e))
    } else {
        AppError::ClientError(e.to_string())
    }
}
