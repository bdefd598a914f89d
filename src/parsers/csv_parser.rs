use crate::domain::model::RawRecord;
use crate::utils::error::Result;
use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Positional column names of the pipe-separated product export. The file
/// itself has no header row.
pub const HEADERS_CSV: [&str; 38] = [
    "product_id",
    "product_name",
    "sku_number",
    "primary_category",
    "secondary_category",
    "product_url",
    "product_image_url",
    "buy_url",
    "short_product_description",
    "long_product_description",
    "discount",
    "discount_type",
    "sale_price",
    "retail_price",
    "begin_date",
    "end_date",
    "brand",
    "shipping",
    "keywords",
    "manufacture_part_number",
    "manufacture_name",
    "shipping_information",
    "availability",
    "universal_product_code",
    "class_id",
    "currency",
    "m1",
    "pixel",
    "miscellaneous_attribute",
    "attribute_2",
    "attribute_3",
    "attribute_4",
    "attribute_5",
    "attribute_6",
    "attribute_7",
    "attribute_8",
    "attribute_9",
    "attribute_10",
];

pub struct CsvRecordReader<R: Read> {
    rows: StringRecordsIntoIter<R>,
}

impl CsvRecordReader<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> CsvRecordReader<R> {
    pub fn from_reader(reader: R) -> Self {
        let rows = ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();
        Self { rows }
    }
}

impl<R: Read> Iterator for CsvRecordReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e.into())),
        };

        if row.len() > HEADERS_CSV.len() {
            tracing::debug!(
                "Ignoring {} trailing columns on line {}",
                row.len() - HEADERS_CSV.len(),
                row.position().map(|p| p.line()).unwrap_or_default()
            );
        }

        let mut record = RawRecord::new();
        for (name, value) in HEADERS_CSV.iter().zip(row.iter()) {
            record.insert(*name, value);
        }
        Some(Ok(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<RawRecord> {
        CsvRecordReader::from_reader(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_columns_are_named_positionally() {
        let records = parse("7|Walnut Desk|WD-7\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("product_id"), Some("7"));
        assert_eq!(records[0].get("product_name"), Some("Walnut Desk"));
        assert_eq!(records[0].get("sku_number"), Some("WD-7"));
        assert_eq!(records[0].get("brand"), None);
    }

    #[test]
    fn test_short_rows_and_empty_values() {
        let records = parse("1|A||\n2|B\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[1].get("product_name"), Some("B"));
    }

    #[test]
    fn test_quoted_pipe_stays_in_field() {
        let records = parse("3|\"Cable | 2m\"|C-2\n");
        assert_eq!(records[0].get("product_name"), Some("Cable | 2m"));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let row = (0..40).map(|i| i.to_string()).collect::<Vec<_>>().join("|");
        let records = parse(&row);
        assert_eq!(records[0].len(), 38);
        assert_eq!(records[0].get("attribute_10"), Some("37"));
    }
}
