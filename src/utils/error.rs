use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} while fetching {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("XML processing error at byte {position}: {message}")]
    XmlError { position: u64, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[cfg(feature = "mongo")]
    #[error("Database error: {0}")]
    DatabaseError(#[from] mongodb::error::Error),

    #[cfg(feature = "mongo")]
    #[error("BSON encoding error: {0}")]
    BsonError(#[from] mongodb::bson::ser::Error),

    #[error("No parser for {format} format")]
    UnsupportedFormat { format: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Parsing,
    Storage,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::CsvError(_) | EtlError::XmlError { .. } => ErrorCategory::Parsing,
            EtlError::IoError(_) => ErrorCategory::Storage,
            #[cfg(feature = "mongo")]
            EtlError::DatabaseError(_) => ErrorCategory::Storage,
            #[cfg(feature = "mongo")]
            EtlError::BsonError(_) => ErrorCategory::Processing,
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
            EtlError::UnsupportedFormat { .. }
            | EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // remote feeds and databases can come back on a retry
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Parsing | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => {
                "Check that the feed URL is reachable and try again"
            }
            EtlError::CsvError(_) => "Check that the feed is pipe-separated and not truncated",
            EtlError::XmlError { .. } => "Check that the XML feed is well-formed",
            EtlError::IoError(_) => "Check that the input file exists and the output path is writable",
            #[cfg(feature = "mongo")]
            EtlError::DatabaseError(_) => "Check DB_HOST and that MongoDB is running",
            #[cfg(feature = "mongo")]
            EtlError::BsonError(_) => "Inspect the offending product record",
            EtlError::SerializationError(_) => "Inspect the local collection file for corruption",
            EtlError::UnsupportedFormat { .. } => "Use one of the supported formats: csv, xml",
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => "Fix the configuration and run again",
            EtlError::ProcessingError { .. } => "Re-run with --verbose to see the failing record",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Network => format!("Could not download feed: {}", self),
            ErrorCategory::Parsing => format!("Could not parse feed: {}", self),
            ErrorCategory::Storage => format!("Storage failure: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message() {
        let err = EtlError::UnsupportedFormat {
            format: "json".to_string(),
        };
        assert_eq!(err.to_string(), "No parser for json format");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_severity_drives_exit_code() {
        let network = EtlError::HttpStatusError {
            url: "http://feeds.example.com/a.xml".to_string(),
            status: 503,
        };
        assert_eq!(network.severity(), ErrorSeverity::Medium);
        assert_eq!(network.exit_code(), 2);

        let io = EtlError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.severity(), ErrorSeverity::Critical);
        assert_eq!(io.exit_code(), 3);
    }
}
