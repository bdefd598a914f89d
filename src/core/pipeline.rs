use crate::core::{Pipeline, ProductStore, RawRecord, RecordStream, StoreReport, TransformResult};
use crate::parsers::Parser;
use crate::utils::error::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// ETL over a single feed file: stream raw records, coerce them into
/// products, upsert into the shared store.
pub struct FeedPipeline<S: ProductStore> {
    parser: Parser,
    path: PathBuf,
    label: String,
    store: Arc<S>,
}

impl<S: ProductStore> FeedPipeline<S> {
    pub fn new(parser: Parser, path: impl Into<PathBuf>, store: Arc<S>) -> Self {
        let path = path.into();
        let label = format!("{}:{}", parser.format(), path.display());
        Self {
            parser,
            path,
            label,
            store,
        }
    }

    /// Replaces the log label (defaults to `format:path`).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait::async_trait]
impl<S: ProductStore> Pipeline for FeedPipeline<S> {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn extract(&self) -> Result<RecordStream> {
        tracing::debug!("Opening {} feed {}", self.parser.format(), self.path.display());
        self.parser.records(&self.path)
    }

    fn transform(&self, batch: Vec<RawRecord>) -> Result<TransformResult> {
        let mut result = TransformResult {
            products: Vec::with_capacity(batch.len()),
            rejected: 0,
        };

        for record in &batch {
            match self.parser.coerce_model(record) {
                Some(product) => result.products.push(product),
                None => {
                    tracing::debug!("Rejected record without id: {:?}", record.data);
                    result.rejected += 1;
                }
            }
        }

        if result.rejected > 0 {
            tracing::warn!(
                "{}: {} of {} records have no id and were skipped",
                self.label,
                result.rejected,
                batch.len()
            );
        }
        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<StoreReport> {
        if result.products.is_empty() {
            return Ok(StoreReport::default());
        }

        let start = Instant::now();
        let report = self.store.store(&result.products).await?;
        tracing::info!("Operation store took {:?}", start.elapsed());
        tracing::debug!(
            "Stored {} products ({} new, {} replaced)",
            report.total(),
            report.inserted,
            report.updated
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Product;
    use crate::parsers::FeedFormat;
    use std::io::Write;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockStore {
        batches: Mutex<Vec<Vec<Product>>>,
    }

    impl ProductStore for MockStore {
        async fn store(&self, products: &[Product]) -> Result<StoreReport> {
            self.batches.lock().await.push(products.to_vec());
            Ok(StoreReport {
                inserted: products.len(),
                updated: 0,
            })
        }
    }

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        let mut record = RawRecord::new();
        for (k, v) in pairs {
            record.insert(*k, *v);
        }
        record
    }

    #[tokio::test]
    async fn test_extract_streams_feed_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1|Lamp").unwrap();
        writeln!(file, "2|Desk").unwrap();

        let store = Arc::new(MockStore::default());
        let pipeline = FeedPipeline::new(Parser::new(FeedFormat::Csv), file.path(), store);

        let records: Vec<RawRecord> = pipeline
            .extract()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("product_name"), Some("Desk"));
    }

    #[tokio::test]
    async fn test_transform_counts_rejected_records() {
        let store = Arc::new(MockStore::default());
        let pipeline = FeedPipeline::new(Parser::new(FeedFormat::Csv), "unused.txt", store);

        let result = pipeline
            .transform(vec![
                raw(&[("product_id", "1"), ("product_name", "Lamp")]),
                raw(&[("product_name", "Orphan")]),
            ])
            .unwrap();

        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].title.as_deref(), Some("Lamp"));
        assert_eq!(result.rejected, 1);
    }

    #[tokio::test]
    async fn test_load_skips_empty_batches() {
        let store = Arc::new(MockStore::default());
        let pipeline = FeedPipeline::new(Parser::new(FeedFormat::Xml), "unused.xml", store.clone());

        let report = pipeline.load(TransformResult::default()).await.unwrap();
        assert_eq!(report.total(), 0);
        assert!(store.batches.lock().await.is_empty());

        let report = pipeline
            .load(TransformResult {
                products: vec![Product::new("a"), Product::new("b")],
                rejected: 0,
            })
            .await
            .unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(store.batches.lock().await.len(), 1);
    }

    #[test]
    fn test_default_label() {
        let store = Arc::new(MockStore::default());
        let pipeline = FeedPipeline::new(Parser::new(FeedFormat::Xml), "feeds/p.xml", store);
        assert_eq!(pipeline.name(), "xml:feeds/p.xml");
    }
}
