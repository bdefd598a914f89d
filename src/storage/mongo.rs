use crate::domain::model::{Product, StoreReport};
use crate::domain::ports::ProductStore;
use crate::storage::MongoSettings;
use crate::utils::error::{EtlError, Result};
use futures_util::future::join_all;
use mongodb::bson::{self, doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

/// Upserts products into a MongoDB collection with a unique index on `id`.
#[derive(Debug, Clone)]
pub struct MongoStore {
    collection: Collection<Document>,
    concurrent_writes: usize,
}

impl MongoStore {
    pub async fn connect(settings: &MongoSettings) -> Result<Self> {
        let uri = settings.uri();
        tracing::info!("Connecting to MongoDB at {}", uri);
        let client = Client::with_uri_str(&uri).await?;
        let collection = client
            .database(&settings.database)
            .collection::<Document>(&settings.collection);

        let store = Self {
            collection,
            concurrent_writes: settings.concurrent_writes.max(1),
        };
        store.ensure_id_index().await?;
        Ok(store)
    }

    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    async fn ensure_id_index(&self) -> Result<()> {
        // createIndexes is a no-op when an identical index already exists
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    async fn upsert(&self, product: &Product) -> Result<bool> {
        let replacement = bson::to_document(product)?;
        let result = self
            .collection
            .replace_one(doc! { "id": product.id.as_str() }, replacement)
            .upsert(true)
            .await?;
        Ok(result.upserted_id.is_some())
    }
}

impl ProductStore for MongoStore {
    async fn store(&self, products: &[Product]) -> Result<StoreReport> {
        // at most `concurrent_writes` upserts in flight; order is irrelevant
        let mut outcomes: Vec<Result<bool>> = Vec::with_capacity(products.len());
        for chunk in products.chunks(self.concurrent_writes) {
            outcomes.extend(join_all(chunk.iter().map(|product| self.upsert(product))).await);
        }

        let mut report = StoreReport::default();
        let mut first_error: Option<EtlError> = None;
        for outcome in outcomes {
            match outcome {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.updated += 1,
                Err(e) => {
                    tracing::error!("Upsert failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}
