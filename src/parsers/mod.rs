//! Feed parsers.
//!
//! Every format streams [`RawRecord`]s keyed by the feed's own column
//! names. [`Parser`] pairs a format with its [`FieldMapping`] so callers
//! get generic [`Product`]s without caring which export they read.

pub mod csv_parser;
pub mod mapping;
pub mod xml_parser;

use crate::domain::model::{Product, RawRecord};
use crate::domain::ports::RecordStream;
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use csv_parser::{CsvRecordReader, HEADERS_CSV};
pub use mapping::FieldMapping;
pub use xml_parser::{XmlRecordReader, DEFAULT_RECORD_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    Csv,
    Xml,
}

impl FeedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedFormat::Csv => "csv",
            FeedFormat::Xml => "xml",
        }
    }

    /// Guesses the format from a file extension (`.xml`, `.txt`, `.csv`).
    pub fn from_extension(path: &str) -> Option<Self> {
        // URLs may carry a query string after the file name
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let extension = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xml" => Some(FeedFormat::Xml),
            "txt" | "csv" => Some(FeedFormat::Csv),
            _ => None,
        }
    }

    pub fn default_mapping(&self) -> FieldMapping {
        match self {
            FeedFormat::Csv => FieldMapping::csv_default(),
            FeedFormat::Xml => FieldMapping::xml_default(),
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FeedFormat::Csv),
            "xml" => Ok(FeedFormat::Xml),
            _ => Err(EtlError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Format-agnostic entry point: picks the record reader for a format and
/// coerces its records into the product model.
#[derive(Debug, Clone)]
pub struct Parser {
    format: FeedFormat,
    mapping: FieldMapping,
    record_tag: String,
}

impl Parser {
    pub fn new(format: FeedFormat) -> Self {
        Self {
            format,
            mapping: format.default_mapping(),
            record_tag: DEFAULT_RECORD_TAG.to_string(),
        }
    }

    pub fn for_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Element that delimits one record in XML feeds. Ignored for CSV.
    pub fn with_record_tag(mut self, record_tag: impl Into<String>) -> Self {
        self.record_tag = record_tag.into();
        self
    }

    pub fn format(&self) -> FeedFormat {
        self.format
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Raw records in feed order, read lazily from `path`.
    pub fn records(&self, path: &Path) -> Result<RecordStream> {
        let stream: RecordStream = match self.format {
            FeedFormat::Csv => Box::new(CsvRecordReader::open(path)?),
            FeedFormat::Xml => Box::new(XmlRecordReader::open(path, &self.record_tag)?),
        };
        Ok(stream)
    }

    pub fn coerce_model(&self, record: &RawRecord) -> Option<Product> {
        self.mapping.coerce(record)
    }

    /// Products in feed order. Records without an id are skipped.
    pub fn parse(&self, path: &Path) -> Result<impl Iterator<Item = Result<Product>> + Send> {
        let mapping = self.mapping.clone();
        let products = self.records(path)?.filter_map(move |record| match record {
            Ok(record) => {
                let product = mapping.coerce(&record);
                if product.is_none() {
                    tracing::warn!("Skipping record without id ({} fields)", record.len());
                }
                product.map(Ok)
            }
            Err(e) => Some(Err(e)),
        });
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = Parser::for_name("json").unwrap_err();
        assert_eq!(err.to_string(), "No parser for json format");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FeedFormat::from_extension("feeds/products.xml"), Some(FeedFormat::Xml));
        assert_eq!(FeedFormat::from_extension("products_full.TXT"), Some(FeedFormat::Csv));
        assert_eq!(
            FeedFormat::from_extension("https://feeds.example.com/p.csv?token=abc"),
            Some(FeedFormat::Csv)
        );
        assert_eq!(FeedFormat::from_extension("products.json"), None);
        assert_eq!(FeedFormat::from_extension("products"), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let parser = Parser::new(FeedFormat::Csv);
        let result = parser.records(Path::new("/nonexistent/products.txt"));
        assert!(matches!(result, Err(EtlError::IoError(_))));
    }
}
