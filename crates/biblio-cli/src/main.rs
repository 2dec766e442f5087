use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use biblio_cli::Config;
use biblio_client::ArticleMetaClient;
use biblio_core::{default_from_date, run_sync, CountryTable, EntityType};
use biblio_index::ElasticIndex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let config = Config::parse();

    init_logging(&config)?;

    let from_date = config.from_date.unwrap_or_else(default_from_date);
    let entity: EntityType = config.doc_type.into();

    let source =
        ArticleMetaClient::new(&config.articlemeta_url).context("Invalid ArticleMeta URL")?;
    let index =
        ElasticIndex::new(&config.elasticsearch_url).context("Invalid Elasticsearch URL")?;
    let countries = CountryTable::new();

    info!(
        "Starting {} sync from {} ({} mode)",
        entity,
        from_date,
        if config.identifiers {
            "identifiers"
        } else {
            "history"
        }
    );

    let stats = run_sync(
        &source,
        &index,
        entity,
        from_date,
        config.identifiers,
        &countries,
    )
    .await?;

    info!(
        "Sync complete: {} indexed, {} removed, {} already absent, {} failed out of {} events",
        stats.indexed,
        stats.removed,
        stats.already_absent,
        stats.failed,
        stats.total()
    );

    Ok(())
}

/// Sets up tracing output: stderr by default, an append-mode file when
/// `--log-file` is given.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(config.log_level)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("setting default subscriber failed")?;
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(config.log_level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("setting default subscriber failed")?;
        }
    }

    Ok(())
}
