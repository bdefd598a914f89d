pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod parsers;
pub mod sources;
pub mod storage;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{ConfigProvider, TomlConfig};

pub use core::{
    etl::{EtlEngine, RunSummary},
    pipeline::FeedPipeline,
    runner::{FeedJob, FeedRunner, RunOptions, RunReport},
};
pub use domain::model::{Product, RawRecord, StoreReport};
pub use domain::ports::ProductStore;
pub use parsers::{FeedFormat, FieldMapping, Parser};
pub use storage::{AnyStore, JsonFileStore, StoreSettings};
pub use utils::error::{EtlError, Result};
