pub mod json_file;
#[cfg(feature = "mongo")]
pub mod mongo;

use crate::domain::model::{Product, StoreReport};
use crate::domain::ports::ProductStore;
use crate::utils::error::Result;
#[cfg(not(feature = "mongo"))]
use crate::utils::error::EtlError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use json_file::JsonFileStore;
#[cfg(feature = "mongo")]
pub use mongo::MongoStore;

pub const DEFAULT_DB_PORT: u16 = 27017;
pub const DEFAULT_DATABASE: &str = "db";
pub const DEFAULT_COLLECTION: &str = "parsed";
pub const DEFAULT_CONCURRENT_WRITES: usize = 8;

/// `DB_HOST` from the environment, else `localhost`.
pub fn default_db_host() -> String {
    std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub collection: String,
    pub concurrent_writes: usize,
}

impl MongoSettings {
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: DEFAULT_DB_PORT,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            concurrent_writes: DEFAULT_CONCURRENT_WRITES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    Mongo(MongoSettings),
    JsonFile { path: PathBuf, collection: String },
}

impl StoreSettings {
    pub fn describe(&self) -> String {
        match self {
            StoreSettings::Mongo(mongo) => {
                format!("mongo {}/{}.{}", mongo.uri(), mongo.database, mongo.collection)
            }
            StoreSettings::JsonFile { path, collection } => {
                format!("json {}", path.join(format!("{}.json", collection)).display())
            }
        }
    }
}

/// The configured backend, chosen at runtime.
#[derive(Debug)]
pub enum AnyStore {
    #[cfg(feature = "mongo")]
    Mongo(MongoStore),
    JsonFile(JsonFileStore),
}

pub async fn open(settings: &StoreSettings) -> Result<AnyStore> {
    match settings {
        #[cfg(feature = "mongo")]
        StoreSettings::Mongo(mongo) => Ok(AnyStore::Mongo(MongoStore::connect(mongo).await?)),
        #[cfg(not(feature = "mongo"))]
        StoreSettings::Mongo(_) => Err(EtlError::ConfigError {
            message: "MongoDB support was not compiled in; rebuild with --features mongo"
                .to_string(),
        }),
        StoreSettings::JsonFile { path, collection } => {
            Ok(AnyStore::JsonFile(JsonFileStore::open(path, collection)?))
        }
    }
}

impl ProductStore for AnyStore {
    async fn store(&self, products: &[Product]) -> Result<StoreReport> {
        match self {
            #[cfg(feature = "mongo")]
            AnyStore::Mongo(store) => store.store(products).await,
            AnyStore::JsonFile(store) => store.store(products).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mongo_uri() {
        let settings = MongoSettings {
            host: "mongo".to_string(),
            ..MongoSettings::default()
        };
        assert_eq!(settings.uri(), "mongodb://mongo:27017");
        assert_eq!(settings.collection, "parsed");
    }

    #[tokio::test]
    async fn test_open_json_backend() {
        let dir = TempDir::new().unwrap();
        let settings = StoreSettings::JsonFile {
            path: dir.path().to_path_buf(),
            collection: "parsed".to_string(),
        };

        let store = open(&settings).await.unwrap();
        let report = store.store(&[Product::new("x1")]).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert!(dir.path().join("parsed.json").exists());
    }
}
