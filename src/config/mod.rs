#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::runner::{FeedJob, RunOptions};
use crate::sources::FeedSource;
use crate::storage::StoreSettings;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Mongo,
    Json,
}

/// What a run needs to know, regardless of where the settings came from.
pub trait ConfigProvider: Send + Sync {
    fn feeds(&self) -> Result<Vec<FeedJob>>;
    fn store_settings(&self) -> StoreSettings;
    fn run_options(&self) -> RunOptions;
    fn output_path(&self) -> &str;

    /// Download directory for remote feeds.
    fn cache_dir(&self) -> PathBuf {
        Path::new(self.output_path()).join("cache")
    }
}

pub(crate) fn validate_feeds(jobs: &[FeedJob]) -> Result<()> {
    if jobs.is_empty() {
        return Err(EtlError::MissingConfigError {
            field: "feeds".to_string(),
        });
    }
    for job in jobs {
        validate_non_empty_string("feeds.source", &job.source)?;
        if let FeedSource::Local(path) = FeedSource::parse(&job.source)? {
            validate_path("feeds.source", &path.to_string_lossy())?;
        }
        if let Some(tag) = &job.record_tag {
            validate_non_empty_string("feeds.record_tag", tag)?;
        }
        // surfaces unknown model fields before any feed is opened
        job.parser()?;
    }
    Ok(())
}

pub(crate) fn validate_store(settings: &StoreSettings) -> Result<()> {
    match settings {
        StoreSettings::Mongo(mongo) => {
            validate_non_empty_string("store.host", &mongo.host)?;
            validate_range("store.port", mongo.port, 1, u16::MAX)?;
            validate_non_empty_string("store.database", &mongo.database)?;
            validate_non_empty_string("store.collection", &mongo.collection)?;
            validate_positive_number("store.concurrent_writes", mongo.concurrent_writes, 1)
        }
        StoreSettings::JsonFile { path, collection } => {
            validate_path("load.output_path", &path.to_string_lossy())?;
            validate_non_empty_string("store.collection", collection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::FeedFormat;
    use std::collections::HashMap;

    #[test]
    fn test_validate_feeds() {
        assert!(validate_feeds(&[]).is_err());
        assert!(validate_feeds(&[FeedJob::new(FeedFormat::Csv, "p.txt")]).is_ok());
        assert!(validate_feeds(&[FeedJob::new(FeedFormat::Xml, "gopher://x/p.xml")]).is_err());

        let mut job = FeedJob::new(FeedFormat::Csv, "p.txt");
        job.field_mapping = Some(HashMap::from([("colour".to_string(), "m1".to_string())]));
        assert!(validate_feeds(&[job]).is_err());
    }
}
