//! Canonical order record and the inputs accepted by order operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::InputError;
use super::status::{FinancialStatus, OrderStatus};

/// An order as exposed to callers.
///
/// Built from the platform's order node on every cache miss. Money amounts
/// are exact decimals, so `subtotal + shipping + tax == total` whenever the
/// platform reports all four (or the missing ones were derived).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Platform global id (`gid://shopify/Order/...`).
    pub id: String,
    /// Human-facing order name, e.g. `#1001`.
    pub name: String,
    pub buyer_id: Option<String>,
    pub buyer_email: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency_code: String,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether the components add up to the total. A sum that overflows
    /// never balances.
    #[must_use]
    pub fn totals_balance(&self) -> bool {
        self.subtotal
            .checked_add(self.shipping)
            .and_then(|sum| sum.checked_add(self.tax))
            == Some(self.total)
    }
}

/// A single purchased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    /// Unit price.
    pub price: Decimal,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    /// Unit price times quantity, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Shipping address fields. Every field is optional because the platform
/// omits the address entirely for digital orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

impl ShippingAddress {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Identity of the buyer placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerIdentity {
    pub id: String,
    pub email: String,
}

/// A line requested by [`OrderCreateInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    /// Product variant global id.
    pub variant_id: String,
    pub quantity: i64,
}

/// Input for creating an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateInput {
    pub buyer: BuyerIdentity,
    pub items: Vec<OrderLineInput>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub note: Option<String>,
}

impl OrderCreateInput {
    /// Check the input before any request is issued.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the buyer identity is incomplete, there are no
    /// items, or an item has a non-positive quantity.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.buyer.id.trim().is_empty() {
            return Err(InputError::MissingField("buyer.id"));
        }
        let email = self.buyer.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(InputError::InvalidEmail(self.buyer.email.clone())),
        }
        if self.items.is_empty() {
            return Err(InputError::MissingField("items"));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(InputError::InvalidQuantity {
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
            });
        }
        Ok(())
    }
}

/// Input for updating an order. Only provided fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdateInput {
    /// Recorded on the platform as a `status:` tag.
    pub status: Option<OrderStatus>,
    pub note: Option<String>,
    pub email: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
}

impl OrderUpdateInput {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Filters accepted by order listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilters {
    pub buyer_email: Option<String>,
    pub financial_status: Option<FinancialStatus>,
    /// Free text passed through to the platform search.
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> OrderCreateInput {
        OrderCreateInput {
            buyer: BuyerIdentity {
                id: "user-1".to_string(),
                email: "buyer@example.com".to_string(),
            },
            items: vec![OrderLineInput {
                variant_id: "gid://shopify/ProductVariant/1".to_string(),
                quantity: 2,
            }],
            shipping_address: None,
            note: None,
        }
    }

    #[test]
    fn test_valid_create_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_create_requires_buyer_id() {
        let mut input = input();
        input.buyer.id = "  ".to_string();
        assert!(matches!(
            input.validate(),
            Err(InputError::MissingField("buyer.id"))
        ));
    }

    #[test]
    fn test_create_rejects_bad_email() {
        let mut input = input();
        input.buyer.email = "@example.com".to_string();
        assert!(matches!(input.validate(), Err(InputError::InvalidEmail(_))));
    }

    #[test]
    fn test_create_rejects_zero_quantity() {
        let mut input = input();
        input.items[0].quantity = 0;
        assert!(matches!(
            input.validate(),
            Err(InputError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            product_id: "p".to_string(),
            name: "Tee".to_string(),
            price: Decimal::new(1999, 2),
            quantity: 3,
            image: None,
        };
        assert_eq!(item.line_total(), Decimal::new(5997, 2));
    }

    #[test]
    fn test_line_total_saturates() {
        let item = OrderItem {
            product_id: "p".to_string(),
            name: "Crate".to_string(),
            price: Decimal::new(100_000_000_000, 0),
            quantity: i64::MAX,
            image: None,
        };
        assert_eq!(item.line_total(), Decimal::MAX);
    }
}
