use crate::domain::model::{Product, RawRecord, StoreReport, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Lazily produced raw records of a single feed.
pub type RecordStream = Box<dyn Iterator<Item = Result<RawRecord>> + Send>;

/// Persistent product collection. `store` upserts by `Product::id`.
pub trait ProductStore: Send + Sync {
    fn store(
        &self,
        products: &[Product],
    ) -> impl std::future::Future<Output = Result<StoreReport>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Short label used in logs and summaries.
    fn name(&self) -> String;
    fn extract(&self) -> Result<RecordStream>;
    fn transform(&self, batch: Vec<RawRecord>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<StoreReport>;
}
