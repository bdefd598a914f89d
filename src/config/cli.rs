use crate::config::{validate_feeds, validate_store, ConfigProvider, StoreKind};
use crate::core::etl::DEFAULT_BATCH_SIZE;
use crate::core::runner::{FeedJob, RunOptions};
use crate::parsers::FeedFormat;
use crate::storage::{
    MongoSettings, StoreSettings, DEFAULT_COLLECTION, DEFAULT_CONCURRENT_WRITES, DEFAULT_DATABASE,
    DEFAULT_DB_PORT,
};
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "feed-etl")]
#[command(about = "Import affiliate product feeds (CSV / XML) into a product collection")]
pub struct CliConfig {
    /// Feed files or URLs; the format is taken from the extension (.txt, .csv, .xml)
    pub inputs: Vec<String>,

    /// Pipe-separated product feed (repeatable)
    #[arg(long, value_name = "PATH|URL")]
    pub csv: Vec<String>,

    /// XML product feed (repeatable)
    #[arg(long, value_name = "PATH|URL")]
    pub xml: Vec<String>,

    #[arg(long, value_enum, default_value_t = StoreKind::Mongo)]
    pub store: StoreKind,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, default_value_t = DEFAULT_DB_PORT)]
    pub db_port: u16,

    #[arg(long, default_value = DEFAULT_DATABASE)]
    pub database: String,

    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Local collection directory (json store) and download cache
    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_CONCURRENT_WRITES)]
    pub concurrent_writes: usize,

    /// Keep importing the remaining feeds when one fails
    #[arg(long)]
    pub continue_on_error: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU / memory between batches")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn feeds(&self) -> Result<Vec<FeedJob>> {
        let mut jobs = Vec::new();
        for source in &self.csv {
            jobs.push(FeedJob::new(FeedFormat::Csv, source.as_str()));
        }
        for source in &self.xml {
            jobs.push(FeedJob::new(FeedFormat::Xml, source.as_str()));
        }
        for source in &self.inputs {
            jobs.push(FeedJob::infer(source)?);
        }
        Ok(jobs)
    }

    fn store_settings(&self) -> StoreSettings {
        match self.store {
            StoreKind::Mongo => StoreSettings::Mongo(MongoSettings {
                host: self.db_host.clone(),
                port: self.db_port,
                database: self.database.clone(),
                collection: self.collection.clone(),
                concurrent_writes: self.concurrent_writes,
            }),
            StoreKind::Json => StoreSettings::JsonFile {
                path: PathBuf::from(&self.output_path),
                collection: self.collection.clone(),
            },
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            batch_size: self.batch_size,
            continue_on_error: self.continue_on_error,
            monitor: self.monitor,
        }
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_feeds(&self.feeds()?)?;
        validate_path("output_path", &self.output_path)?;
        validate_positive_number("batch_size", self.batch_size, 1)?;
        validate_store(&self.store_settings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_inputs() {
        let config = CliConfig::parse_from([
            "feed-etl",
            "--csv",
            "exports/products_full.dat",
            "--xml",
            "https://feeds.example.com/catalog",
            "extra/products.xml",
            "--store",
            "json",
            "--batch-size",
            "250",
        ]);

        let jobs = config.feeds().unwrap();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].format, FeedFormat::Csv);
        assert_eq!(jobs[1].format, FeedFormat::Xml);
        assert_eq!(jobs[2].source, "extra/products.xml");
        assert_eq!(config.run_options().batch_size, 250);
        assert!(matches!(config.store_settings(), StoreSettings::JsonFile { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_point_at_parsed_collection() {
        let config = CliConfig::parse_from(["feed-etl", "--db-host", "mongo", "p.txt"]);
        match config.store_settings() {
            StoreSettings::Mongo(mongo) => {
                assert_eq!(mongo.uri(), "mongodb://mongo:27017");
                assert_eq!(mongo.database, "db");
                assert_eq!(mongo.collection, "parsed");
            }
            other => panic!("unexpected store settings: {:?}", other),
        }
    }

    #[test]
    fn test_validation_failures() {
        let no_feeds = CliConfig::parse_from(["feed-etl"]);
        assert!(no_feeds.validate().is_err());

        let unknown_extension = CliConfig::parse_from(["feed-etl", "products.json"]);
        assert!(unknown_extension.validate().is_err());

        let zero_batch = CliConfig::parse_from(["feed-etl", "--batch-size", "0", "p.txt"]);
        assert!(zero_batch.validate().is_err());
    }
}
