use crate::utils::error::EtlError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// One feed record keyed by the feed's own column or element names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub data: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` unless it is blank.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.data.insert(key.into(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Field names of the generic product model shared by every feed format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelField {
    Id,
    Title,
    SkuNumber,
    Url,
    ImageUrl,
    BuyUrl,
    Description,
    Discount,
    DiscountType,
    Currency,
    RetailPrice,
    SalePrice,
    Brand,
    Manufacture,
    Shipping,
    Availability,
}

impl ModelField {
    pub const ALL: [ModelField; 16] = [
        ModelField::Id,
        ModelField::Title,
        ModelField::SkuNumber,
        ModelField::Url,
        ModelField::ImageUrl,
        ModelField::BuyUrl,
        ModelField::Description,
        ModelField::Discount,
        ModelField::DiscountType,
        ModelField::Currency,
        ModelField::RetailPrice,
        ModelField::SalePrice,
        ModelField::Brand,
        ModelField::Manufacture,
        ModelField::Shipping,
        ModelField::Availability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelField::Id => "id",
            ModelField::Title => "title",
            ModelField::SkuNumber => "sku_number",
            ModelField::Url => "url",
            ModelField::ImageUrl => "image_url",
            ModelField::BuyUrl => "buy_url",
            ModelField::Description => "description",
            ModelField::Discount => "discount",
            ModelField::DiscountType => "discount_type",
            ModelField::Currency => "currency",
            ModelField::RetailPrice => "retail_price",
            ModelField::SalePrice => "sale_price",
            ModelField::Brand => "brand",
            ModelField::Manufacture => "manufacture",
            ModelField::Shipping => "shipping",
            ModelField::Availability => "availability",
        }
    }
}

impl fmt::Display for ModelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelField {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| EtlError::InvalidConfigValueError {
                field: "field_mapping".to_string(),
                value: s.to_string(),
                reason: "Unknown product model field".to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retail_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, field: ModelField) -> Option<&str> {
        let value = match field {
            ModelField::Id => return Some(self.id.as_str()),
            ModelField::Title => &self.title,
            ModelField::SkuNumber => &self.sku_number,
            ModelField::Url => &self.url,
            ModelField::ImageUrl => &self.image_url,
            ModelField::BuyUrl => &self.buy_url,
            ModelField::Description => &self.description,
            ModelField::Discount => &self.discount,
            ModelField::DiscountType => &self.discount_type,
            ModelField::Currency => &self.currency,
            ModelField::RetailPrice => &self.retail_price,
            ModelField::SalePrice => &self.sale_price,
            ModelField::Brand => &self.brand,
            ModelField::Manufacture => &self.manufacture,
            ModelField::Shipping => &self.shipping,
            ModelField::Availability => &self.availability,
        };
        value.as_deref()
    }

    pub fn set(&mut self, field: ModelField, value: String) {
        let slot = match field {
            ModelField::Id => {
                self.id = value;
                return;
            }
            ModelField::Title => &mut self.title,
            ModelField::SkuNumber => &mut self.sku_number,
            ModelField::Url => &mut self.url,
            ModelField::ImageUrl => &mut self.image_url,
            ModelField::BuyUrl => &mut self.buy_url,
            ModelField::Description => &mut self.description,
            ModelField::Discount => &mut self.discount,
            ModelField::DiscountType => &mut self.discount_type,
            ModelField::Currency => &mut self.currency,
            ModelField::RetailPrice => &mut self.retail_price,
            ModelField::SalePrice => &mut self.sale_price,
            ModelField::Brand => &mut self.brand,
            ModelField::Manufacture => &mut self.manufacture,
            ModelField::Shipping => &mut self.shipping,
            ModelField::Availability => &mut self.availability,
        };
        *slot = Some(value);
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub products: Vec<Product>,
    pub rejected: usize,
}

/// Outcome of one upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    pub inserted: usize,
    pub updated: usize,
}

impl StoreReport {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

impl std::ops::AddAssign for StoreReport {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.updated += other.updated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_drops_blank_values() {
        let mut record = RawRecord::new();
        record.insert("product_id", "42");
        record.insert("brand", "");
        record.insert("discount", "   ");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("product_id"), Some("42"));
    }

    #[test]
    fn test_model_field_names_round_trip() {
        for field in ModelField::ALL {
            assert_eq!(field.as_str().parse::<ModelField>().unwrap(), field);
        }
        assert!("price".parse::<ModelField>().is_err());
    }

    #[test]
    fn test_product_serializes_only_present_fields() {
        let mut product = Product::new("A1");
        product.set(ModelField::Title, "Lamp".to_string());

        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value, serde_json::json!({"id": "A1", "title": "Lamp"}));
        assert_eq!(product.get(ModelField::Title), Some("Lamp"));
        assert_eq!(product.get(ModelField::Brand), None);
    }
}
