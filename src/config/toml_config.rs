use crate::config::{validate_feeds, validate_store, ConfigProvider, StoreKind};
use crate::core::etl::DEFAULT_BATCH_SIZE;
use crate::core::runner::{FeedJob, RunOptions};
use crate::storage::{
    default_db_host, MongoSettings, StoreSettings, DEFAULT_COLLECTION, DEFAULT_CONCURRENT_WRITES,
    DEFAULT_DATABASE, DEFAULT_DB_PORT,
};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub feeds: Vec<FeedJob>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
    pub error_handling: Option<ErrorHandlingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub concurrent_writes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    pub batch_size: Option<usize>,
    pub cache_dir: Option<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            batch_size: None,
            cache_dir: None,
        }
    }
}

fn default_output_path() -> String {
    "./output".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// `compact` (default) or `json`
    pub log_format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    pub continue_on_error: Option<bool>,
}

impl TomlConfig {
    /// Loads and parses a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn batch_size(&self) -> usize {
        self.load.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    pub fn continue_on_error(&self) -> bool {
        self.error_handling
            .as_ref()
            .and_then(|e| e.continue_on_error)
            .unwrap_or(false)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_feeds(&self.feeds)?;
        validate_path("load.output_path", &self.load.output_path)?;
        if let Some(batch_size) = self.load.batch_size {
            validate_positive_number("load.batch_size", batch_size, 1)?;
        }
        if let Some(format) = self
            .monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
        {
            if !["compact", "json"].contains(&format.to_ascii_lowercase().as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }
        validate_store(&self.store_settings())
    }
}

impl ConfigProvider for TomlConfig {
    fn feeds(&self) -> Result<Vec<FeedJob>> {
        Ok(self.feeds.clone())
    }

    fn store_settings(&self) -> StoreSettings {
        let collection = self
            .store
            .collection
            .clone()
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        match self.store.kind {
            StoreKind::Mongo => StoreSettings::Mongo(MongoSettings {
                host: self.store.host.clone().unwrap_or_else(default_db_host),
                port: self.store.port.unwrap_or(DEFAULT_DB_PORT),
                database: self
                    .store
                    .database
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                collection,
                concurrent_writes: self
                    .store
                    .concurrent_writes
                    .unwrap_or(DEFAULT_CONCURRENT_WRITES),
            }),
            StoreKind::Json => StoreSettings::JsonFile {
                path: PathBuf::from(&self.load.output_path),
                collection,
            },
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            batch_size: self.batch_size(),
            continue_on_error: self.continue_on_error(),
            monitor: self.monitoring_enabled(),
        }
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn cache_dir(&self) -> PathBuf {
        match &self.load.cache_dir {
            Some(dir) => PathBuf::from(dir),
            None => Path::new(&self.load.output_path).join("cache"),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
