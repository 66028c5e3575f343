//! Canonical product record and the inputs accepted by product operations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::InputError;
use super::status::ProductStatus;

/// A product as exposed to callers.
///
/// `price` and `stock` are taken from the first variant; the full list is in
/// `variants`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Platform global id. Never regenerated locally.
    pub id: String,
    pub name: String,
    pub price: Decimal,
    /// URL of the first image, empty when the product has none.
    pub image: String,
    pub category: String,
    pub description: String,
    pub stock: i64,
    pub status: ProductStatus,
    pub variants: Vec<ProductVariant>,
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub title: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    pub alt_text: Option<String>,
}

/// Input for creating or updating a product.
///
/// On update only provided fields are sent; on create `name` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    /// Price of the default variant.
    pub price: Option<Decimal>,
    pub tags: Option<Vec<String>>,
}

impl ProductInput {
    /// Validate input for product creation.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the name is missing or the price is negative.
    pub fn validate_for_create(&self) -> Result<(), InputError> {
        if self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(InputError::MissingField("name"));
        }
        self.validate_price()
    }

    /// Validate input for a product update.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if no field is set or the price is negative.
    pub fn validate_for_update(&self) -> Result<(), InputError> {
        if *self == Self::default() {
            return Err(InputError::EmptyUpdate);
        }
        self.validate_price()
    }

    fn validate_price(&self) -> Result<(), InputError> {
        if self.price.is_some_and(|p| p.is_sign_negative() && !p.is_zero()) {
            return Err(InputError::NegativePrice);
        }
        Ok(())
    }
}

/// Filters accepted by product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilters {
    /// Matches the platform product type.
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    /// Free text passed through to the platform search.
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_name() {
        let input = ProductInput {
            name: Some(" ".to_string()),
            ..ProductInput::default()
        };
        assert_eq!(
            input.validate_for_create(),
            Err(InputError::MissingField("name"))
        );
    }

    #[test]
    fn test_negative_price_rejected() {
        let input = ProductInput {
            name: Some("Mug".to_string()),
            price: Some(Decimal::new(-100, 2)),
            ..ProductInput::default()
        };
        assert_eq!(input.validate_for_create(), Err(InputError::NegativePrice));
    }

    #[test]
    fn test_empty_update_rejected() {
        assert_eq!(
            ProductInput::default().validate_for_update(),
            Err(InputError::EmptyUpdate)
        );
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let product = Product {
            id: "gid://shopify/Product/1".to_string(),
            name: "Mug".to_string(),
            price: Decimal::new(1250, 2),
            image: String::new(),
            category: "Kitchen".to_string(),
            description: String::new(),
            stock: 4,
            status: ProductStatus::Active,
            variants: vec![],
            images: vec![ProductImage {
                url: "https://cdn.example.com/mug.png".to_string(),
                alt_text: None,
            }],
        };
        let json = serde_json::to_value(&product).unwrap_or_default();
        assert_eq!(json["price"], "12.50");
        assert_eq!(json["status"], "active");
        assert_eq!(json["images"][0]["altText"], serde_json::Value::Null);
    }
}
