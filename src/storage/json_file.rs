use crate::domain::model::{Product, StoreReport};
use crate::domain::ports::ProductStore;
use crate::utils::error::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Product collection kept as one JSON object (`id -> product`) on disk.
///
/// Upserts replace whole documents, like the database backend. The file is
/// rewritten through a temporary sibling so a crash never leaves it
/// half-written.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    documents: Mutex<BTreeMap<String, Product>>,
}

impl JsonFileStore {
    pub fn open(base_path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let path = base_path.as_ref().join(format!("{}.json", collection));
        let documents = if path.exists() {
            let data = fs::read(&path)?;
            serde_json::from_slice(&data)?
        } else {
            BTreeMap::new()
        };
        tracing::debug!(
            "Opened local collection {} ({} documents)",
            path.display(),
            documents.len()
        );

        Ok(Self {
            path,
            documents: Mutex::new(documents),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<Product> {
        self.documents.lock().await.get(id).cloned()
    }

    /// All documents ordered by id.
    pub async fn all(&self) -> Vec<Product> {
        self.documents.lock().await.values().cloned().collect()
    }

    fn persist(&self, documents: &BTreeMap<String, Product>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(documents)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl ProductStore for JsonFileStore {
    async fn store(&self, products: &[Product]) -> Result<StoreReport> {
        let mut documents = self.documents.lock().await;
        let mut updated = documents.clone();
        let mut report = StoreReport::default();

        for product in products {
            match updated.insert(product.id.clone(), product.clone()) {
                Some(_) => report.updated += 1,
                None => report.inserted += 1,
            }
        }

        // memory only changes once the file holds the batch
        self.persist(&updated)?;
        *documents = updated;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ModelField;
    use tempfile::TempDir;

    fn product(id: &str, title: &str) -> Product {
        let mut product = Product::new(id);
        product.set(ModelField::Title, title.to_string());
        product
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_replaces() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path(), "parsed").unwrap();

        let report = store
            .store(&[product("1", "Lamp"), product("2", "Desk")])
            .await
            .unwrap();
        assert_eq!(report, StoreReport { inserted: 2, updated: 0 });

        let mut replacement = Product::new("1");
        replacement.set(ModelField::Brand, "Lumen".to_string());
        let report = store.store(&[replacement]).await.unwrap();
        assert_eq!(report, StoreReport { inserted: 0, updated: 1 });

        // replaced whole, not merged
        let stored = store.get("1").await.unwrap();
        assert_eq!(stored.title, None);
        assert_eq!(stored.brand.as_deref(), Some("Lumen"));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_reopen_reads_persisted_documents() {
        let dir = TempDir::new().unwrap();
        {
            let store = JsonFileStore::open(dir.path(), "parsed").unwrap();
            store.store(&[product("9", "Chair")]).await.unwrap();
        }

        let reopened = JsonFileStore::open(dir.path(), "parsed").unwrap();
        assert_eq!(reopened.all().await, vec![product("9", "Chair")]);
        assert!(!dir.path().join("parsed.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_collection_unchanged() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("collections");
        let store = JsonFileStore::open(&base, "parsed").unwrap();
        store.store(&[product("1", "Lamp")]).await.unwrap();

        // a plain file where the directory was makes the next write fail
        std::fs::remove_dir_all(&base).unwrap();
        std::fs::write(&base, b"").unwrap();

        assert!(store.store(&[product("2", "Desk")]).await.is_err());
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("2").await, None);
    }

    #[test]
    fn test_corrupt_collection_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("parsed.json"), b"{ not json").unwrap();
        assert!(JsonFileStore::open(dir.path(), "parsed").is_err());
    }

    #[test]
    fn test_store_from_sync_code() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path(), "parsed").unwrap();
        let report = tokio_test::block_on(store.store(&[product("5", "Shelf")])).unwrap();
        assert_eq!(report.total(), 1);
    }
}
