use feed_etl::{FeedFormat, Parser, Product, Result};
use std::path::PathBuf;

fn sample(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("samples")
        .join(name)
}

fn expected(name: &str) -> serde_json::Value {
    let data = std::fs::read_to_string(sample(name)).unwrap();
    serde_json::from_str(&data).unwrap()
}

fn parse_sample(format: &str, name: &str) -> Vec<Product> {
    Parser::for_name(format)
        .unwrap()
        .parse(&sample(name))
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn test_csv_sample_matches_expected_products() {
    let products = parse_sample("csv", "products.txt");
    assert_eq!(
        serde_json::to_value(&products).unwrap(),
        expected("products.txt.result")
    );
}

#[test]
fn test_xml_sample_matches_expected_products() {
    let products = parse_sample("xml", "products.xml");
    assert_eq!(
        serde_json::to_value(&products).unwrap(),
        expected("products.xml.result")
    );
}

#[test]
fn test_raw_records_keep_unmapped_columns() {
    let parser = Parser::new(FeedFormat::Csv);
    let records = parser
        .records(&sample("products.txt"))
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();

    // the id-less row is still a raw record; only coercion drops it
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].get("keywords"), Some("desk~walnut"));
    assert_eq!(records[2].get("product_id"), None);
    assert_eq!(records[3].get("secondary_category"), Some("Shelves"));
}

#[test]
fn test_xml_raw_records_include_unmapped_elements() {
    let parser = Parser::new(FeedFormat::Xml);
    let records = parser
        .records(&sample("products.xml"))
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].get("item_currency"), Some("USD"));
    assert_eq!(records[1].get("item_sku"), None);
    assert_eq!(records[1].get("item_seller"), None);
}
