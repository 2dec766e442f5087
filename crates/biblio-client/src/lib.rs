//! Biblio Client - HTTP client for the ArticleMeta metadata source.

pub mod articlemeta;

pub use articlemeta::ArticleMetaClient;
