use crate::core::etl::{EtlEngine, RunSummary, DEFAULT_BATCH_SIZE};
use crate::core::pipeline::FeedPipeline;
use crate::core::ProductStore;
use crate::parsers::{FeedFormat, Parser};
use crate::sources::{FeedFetcher, FeedSource};
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One feed to import: its format, where it lives, and optional parser tweaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedJob {
    pub format: FeedFormat,
    pub source: String,
    #[serde(default)]
    pub record_tag: Option<String>,
    #[serde(default)]
    pub field_mapping: Option<HashMap<String, String>>,
}

impl FeedJob {
    pub fn new(format: FeedFormat, source: impl Into<String>) -> Self {
        Self {
            format,
            source: source.into(),
            record_tag: None,
            field_mapping: None,
        }
    }

    /// Builds a job whose format is taken from the source's extension.
    pub fn infer(source: &str) -> Result<Self> {
        let format =
            FeedFormat::from_extension(source).ok_or_else(|| EtlError::InvalidConfigValueError {
                field: "input".to_string(),
                value: source.to_string(),
                reason: "Cannot infer feed format from extension; use --csv or --xml".to_string(),
            })?;
        Ok(Self::new(format, source))
    }

    pub fn parser(&self) -> Result<Parser> {
        let mut mapping = self.format.default_mapping();
        if let Some(overrides) = &self.field_mapping {
            mapping = mapping.with_overrides(overrides)?;
        }
        let mut parser = Parser::new(self.format).with_mapping(mapping);
        if let Some(tag) = &self.record_tag {
            parser = parser.with_record_tag(tag.clone());
        }
        Ok(parser)
    }

    pub fn label(&self) -> String {
        format!("{}:{}", self.format, self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub batch_size: usize,
    pub continue_on_error: bool,
    pub monitor: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            continue_on_error: false,
            monitor: false,
        }
    }
}

#[derive(Debug)]
pub struct FeedFailure {
    pub job: String,
    pub error: EtlError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub summaries: Vec<RunSummary>,
    pub failures: Vec<FeedFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_stored(&self) -> usize {
        self.summaries.iter().map(|s| s.stored.total()).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.summaries.iter().map(|s| s.rejected).sum()
    }
}

/// Runs feed jobs one after another against a single store.
pub struct FeedRunner<S: ProductStore> {
    store: Arc<S>,
    fetcher: FeedFetcher,
    options: RunOptions,
}

impl<S: ProductStore> FeedRunner<S> {
    pub fn new(store: S, fetcher: FeedFetcher, options: RunOptions) -> Self {
        Self {
            store: Arc::new(store),
            fetcher,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run_job(&self, job: &FeedJob) -> Result<RunSummary> {
        let parser = job.parser()?;
        let source = FeedSource::parse(&job.source)?;
        let path = source.resolve(&self.fetcher).await?;

        let pipeline =
            FeedPipeline::new(parser, path, Arc::clone(&self.store)).with_label(job.label());
        EtlEngine::new_with_monitoring(pipeline, self.options.monitor)
            .with_batch_size(self.options.batch_size)
            .run()
            .await
    }

    /// Fail-fast unless `continue_on_error` is set, in which case failures
    /// are collected in the report and the remaining jobs still run.
    pub async fn run_all(&self, jobs: &[FeedJob]) -> Result<RunReport> {
        let mut report = RunReport::default();

        for job in jobs {
            match self.run_job(job).await {
                Ok(summary) => report.summaries.push(summary),
                Err(e) if self.options.continue_on_error => {
                    tracing::error!("❌ {} failed: {}", job.label(), e);
                    report.failures.push(FeedFailure {
                        job: job.label(),
                        error: e,
                    });
                }
                Err(e) => {
                    tracing::error!("❌ {} failed, aborting run", job.label());
                    return Err(e);
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Product, StoreReport};
    use std::io::Write;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        products: Mutex<HashMap<String, Product>>,
    }

    impl ProductStore for MemoryStore {
        async fn store(&self, products: &[Product]) -> Result<StoreReport> {
            let mut stored = self.products.lock().await;
            let mut report = StoreReport::default();
            for product in products {
                match stored.insert(product.id.clone(), product.clone()) {
                    Some(_) => report.updated += 1,
                    None => report.inserted += 1,
                }
            }
            Ok(report)
        }
    }

    fn write_feed(dir: &TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_infer_job_format() {
        assert_eq!(FeedJob::infer("a/products.xml").unwrap().format, FeedFormat::Xml);
        assert_eq!(FeedJob::infer("a/products.txt").unwrap().format, FeedFormat::Csv);
        assert!(FeedJob::infer("a/products.dat").is_err());
    }

    #[test]
    fn test_job_parser_applies_overrides() {
        let mut job = FeedJob::new(FeedFormat::Csv, "p.txt");
        job.field_mapping = Some(HashMap::from([(
            "title".to_string(),
            "short_product_description".to_string(),
        )]));
        let parser = job.parser().unwrap();
        assert_eq!(
            parser.mapping().column_for(crate::domain::model::ModelField::Title),
            Some("short_product_description")
        );
    }

    #[tokio::test]
    async fn test_run_all_upserts_across_feeds() {
        let dir = TempDir::new().unwrap();
        let csv = write_feed(&dir, "products.txt", "1|Lamp\n2|Desk\n");
        let xml = write_feed(
            &dir,
            "products.xml",
            "<feed><item_basic_data><item_unique_id>2</item_unique_id>\
             <item_title>Standing Desk</item_title></item_basic_data></feed>",
        );

        let runner = FeedRunner::new(
            MemoryStore::default(),
            FeedFetcher::new(dir.path().join("cache")),
            RunOptions::default(),
        );
        let report = runner
            .run_all(&[
                FeedJob::new(FeedFormat::Csv, csv),
                FeedJob::new(FeedFormat::Xml, xml),
            ])
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.summaries[0].stored.inserted, 2);
        assert_eq!(report.summaries[1].stored.updated, 1);
        assert_eq!(report.total_stored(), 3);

        let stored = runner.store().products.lock().await;
        assert_eq!(stored["2"].title.as_deref(), Some("Standing Desk"));
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_on_missing_feed() {
        let dir = TempDir::new().unwrap();
        let good = write_feed(&dir, "good.txt", "1|Lamp\n");

        let runner = FeedRunner::new(
            MemoryStore::default(),
            FeedFetcher::new(dir.path()),
            RunOptions::default(),
        );
        let result = runner
            .run_all(&[
                FeedJob::new(FeedFormat::Csv, dir.path().join("missing.txt").to_string_lossy()),
                FeedJob::new(FeedFormat::Csv, good),
            ])
            .await;

        assert!(matches!(result, Err(EtlError::IoError(_))));
        assert!(runner.store().products.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_continue_on_error_runs_remaining_feeds() {
        let dir = TempDir::new().unwrap();
        let good = write_feed(&dir, "good.txt", "1|Lamp\n");

        let options = RunOptions {
            continue_on_error: true,
            ..RunOptions::default()
        };
        let runner = FeedRunner::new(MemoryStore::default(), FeedFetcher::new(dir.path()), options);
        let report = runner
            .run_all(&[
                FeedJob::new(FeedFormat::Xml, dir.path().join("missing.xml").to_string_lossy()),
                FeedJob::new(FeedFormat::Csv, good),
            ])
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.total_stored(), 1);
    }
}
