// Application layer: wires a config into store, fetcher and runner.

use crate::config::ConfigProvider;
use crate::core::runner::{FeedRunner, RunReport};
use crate::sources::FeedFetcher;
use crate::storage;
use crate::utils::error::Result;

pub async fn run<C: ConfigProvider>(config: &C) -> Result<RunReport> {
    let jobs = config.feeds()?;
    let settings = config.store_settings();
    tracing::info!("📦 Store: {}", settings.describe());

    let store = storage::open(&settings).await?;
    let fetcher = FeedFetcher::new(config.cache_dir());
    let runner = FeedRunner::new(store, fetcher, config.run_options());

    let report = runner.run_all(&jobs).await?;
    tracing::info!(
        "Imported {} feeds: {} products stored, {} records rejected",
        report.summaries.len(),
        report.total_stored(),
        report.total_rejected()
    );
    Ok(report)
}
