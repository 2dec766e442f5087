//! Biblio Index - Elasticsearch client for the publication index.

pub mod elastic;

pub use elastic::ElasticIndex;
