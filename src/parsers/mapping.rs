use crate::domain::model::{ModelField, Product, RawRecord};
use crate::utils::error::Result;
use std::collections::HashMap;

/// Model field -> source column of one feed format. `None` means the format
/// does not carry that field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(ModelField, Option<String>)>,
}

const CSV_COLUMNS: [(ModelField, Option<&str>); 16] = [
    (ModelField::Id, Some("product_id")),
    (ModelField::Title, Some("product_name")),
    (ModelField::SkuNumber, Some("sku_number")),
    (ModelField::Url, Some("product_url")),
    (ModelField::ImageUrl, Some("product_image_url")),
    (ModelField::BuyUrl, Some("buy_url")),
    (ModelField::Description, Some("long_product_description")),
    (ModelField::Discount, Some("discount")),
    (ModelField::DiscountType, Some("discount_type")),
    (ModelField::Currency, Some("currency")),
    (ModelField::RetailPrice, Some("retail_price")),
    (ModelField::SalePrice, Some("sale_price")),
    (ModelField::Brand, Some("brand")),
    (ModelField::Manufacture, Some("manufacture_name")),
    (ModelField::Shipping, Some("shipping")),
    (ModelField::Availability, Some("availability")),
];

const XML_ELEMENTS: [(ModelField, Option<&str>); 16] = [
    (ModelField::Id, Some("item_unique_id")),
    (ModelField::Title, Some("item_title")),
    (ModelField::SkuNumber, Some("item_sku")),
    (ModelField::Url, Some("item_page_url")),
    (ModelField::ImageUrl, Some("item_image_url")),
    (ModelField::BuyUrl, Some("offer_page_url")),
    (ModelField::Description, Some("book_size_description")),
    (ModelField::Discount, None),
    (ModelField::DiscountType, None),
    (ModelField::Currency, None),
    (ModelField::RetailPrice, Some("item_price")),
    (ModelField::SalePrice, Some("list_price")),
    (ModelField::Brand, Some("item_seller")),
    (ModelField::Manufacture, Some("item_platform")),
    (ModelField::Shipping, Some("item_shipping_charge")),
    (ModelField::Availability, Some("amzn_sales_restriction")),
];

impl FieldMapping {
    fn from_table(table: &[(ModelField, Option<&str>)]) -> Self {
        Self {
            entries: table
                .iter()
                .map(|(field, column)| (*field, column.map(str::to_string)))
                .collect(),
        }
    }

    pub fn csv_default() -> Self {
        Self::from_table(&CSV_COLUMNS)
    }

    pub fn xml_default() -> Self {
        Self::from_table(&XML_ELEMENTS)
    }

    /// Remaps model fields by name. An empty column unmaps the field.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Result<Self> {
        for (field_name, column) in overrides {
            let field: ModelField = field_name.parse()?;
            let column = match column.trim() {
                "" => None,
                name => Some(name.to_string()),
            };
            match self.entries.iter_mut().find(|(f, _)| *f == field) {
                Some(entry) => entry.1 = column,
                None => self.entries.push((field, column)),
            }
        }
        Ok(self)
    }

    pub fn column_for(&self, field: ModelField) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, column)| column.as_deref())
    }

    /// Renames the record's columns to model fields, keeping only mapped,
    /// non-blank values. Returns `None` when the record has no id.
    pub fn coerce(&self, record: &RawRecord) -> Option<Product> {
        let id = self
            .column_for(ModelField::Id)
            .and_then(|column| record.get(column))
            .map(str::trim)
            .filter(|id| !id.is_empty())?;

        let mut product = Product::new(id);
        for (field, column) in &self.entries {
            if *field == ModelField::Id {
                continue;
            }
            let Some(column) = column else { continue };
            if let Some(value) = record.get(column).map(str::trim) {
                if !value.is_empty() {
                    product.set(*field, value.to_string());
                }
            }
        }
        Some(product)
    }
}
