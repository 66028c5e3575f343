//! Order mapping.

use marigold_core::{
    FinancialStatus, FulfillmentStatus, Order, OrderCreateInput, OrderFilters, OrderItem,
    OrderStatus, OrderUpdateInput, ShippingAddress,
};
use rust_decimal::Decimal;
use serde_json::{Map, Value, json};

use super::{bag_amount, bag_currency, join_clauses, parse_timestamp, quote_search_value};
use crate::shopify::types::{ExternalAddress, ExternalLineItem, ExternalOrderNode};

/// Tag carrying the caller's buyer id on orders created through the gateway.
pub const BUYER_TAG_PREFIX: &str = "buyer:";

/// Tag carrying the caller-assigned order status.
pub const STATUS_TAG_PREFIX: &str = "status:";

const DEFAULT_CURRENCY: &str = "USD";

/// Build the canonical [`Order`] from a platform order node.
#[must_use]
pub fn map_order(node: &ExternalOrderNode) -> Order {
    let items: Vec<OrderItem> = node
        .line_items
        .edges
        .iter()
        .map(|edge| map_line_item(&edge.node))
        .collect();

    let total = bag_amount(node.total_price_set.as_ref()).unwrap_or(Decimal::ZERO);
    let shipping = bag_amount(node.total_shipping_price_set.as_ref()).unwrap_or(Decimal::ZERO);
    let subtotal = bag_amount(node.subtotal_price_set.as_ref())
        .filter(|s| !s.is_zero())
        .unwrap_or_else(|| {
            items
                .iter()
                .fold(Decimal::ZERO, |sum, item| sum.saturating_add(item.line_total()))
        });
    // Platform amounts are untrusted; saturate instead of overflowing
    let tax = bag_amount(node.total_tax_set.as_ref())
        .filter(|t| !t.is_zero())
        .unwrap_or_else(|| {
            total
                .saturating_sub(subtotal)
                .saturating_sub(shipping)
                .max(Decimal::ZERO)
        });

    let currency_code = bag_currency(node.total_price_set.as_ref())
        .or_else(|| bag_currency(node.subtotal_price_set.as_ref()))
        .unwrap_or(DEFAULT_CURRENCY)
        .to_string();

    let customer = node.customer.as_ref();
    let buyer_id = customer
        .and_then(|c| c.id.clone())
        .or_else(|| tag_value(&node.tags, BUYER_TAG_PREFIX).map(str::to_string));
    let buyer_email = node
        .email
        .clone()
        .or_else(|| customer.and_then(|c| c.email.clone()));

    Order {
        id: node.id.clone().unwrap_or_default(),
        name: node.name.clone().unwrap_or_default(),
        buyer_id,
        buyer_email,
        items,
        subtotal,
        shipping,
        tax,
        total,
        currency_code,
        status: derive_order_status(
            node.display_financial_status.as_deref(),
            node.display_fulfillment_status.as_deref(),
        ),
        shipping_address: node
            .shipping_address
            .as_ref()
            .map(map_address)
            .unwrap_or_default(),
        created_at: parse_timestamp(node.created_at.as_deref()),
        updated_at: parse_timestamp(node.updated_at.as_deref()),
    }
}

fn map_line_item(item: &ExternalLineItem) -> OrderItem {
    let product_id = item
        .variant
        .as_ref()
        .and_then(|v| v.product.as_ref())
        .and_then(|p| p.id.clone())
        .or_else(|| item.id.clone())
        .unwrap_or_default();

    OrderItem {
        product_id,
        name: item.title.clone().unwrap_or_default(),
        price: bag_amount(item.original_unit_price_set.as_ref()).unwrap_or(Decimal::ZERO),
        quantity: item.quantity.unwrap_or(0),
        image: None,
    }
}

fn map_address(address: &ExternalAddress) -> ShippingAddress {
    ShippingAddress {
        name: address.name.clone(),
        address1: address.address1.clone(),
        address2: address.address2.clone(),
        city: address.city.clone(),
        province: address.province.clone(),
        postal_code: address.zip.clone(),
        country: address.country.clone(),
        phone: address.phone.clone(),
    }
}

fn tag_value<'a>(tags: &'a [String], prefix: &str) -> Option<&'a str> {
    tags.iter()
        .find_map(|t| t.trim().strip_prefix(prefix))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Derive the canonical status from the platform's two status fields.
///
/// The financial status sets a base value; a recognized fulfillment status
/// then overrides it. Unrecognized values leave the current value alone.
#[must_use]
pub fn derive_order_status(financial: Option<&str>, fulfillment: Option<&str>) -> OrderStatus {
    let mut status = OrderStatus::default();

    if let Some(financial) = financial.and_then(FinancialStatus::from_platform) {
        status = match financial {
            FinancialStatus::Pending => OrderStatus::Pending,
            FinancialStatus::Authorized
            | FinancialStatus::Paid
            | FinancialStatus::PartiallyPaid
            | FinancialStatus::PartiallyRefunded => OrderStatus::Processing,
            FinancialStatus::Refunded | FinancialStatus::Voided => OrderStatus::Cancelled,
            FinancialStatus::Expired => status,
        };
    }

    if let Some(fulfillment) = fulfillment.and_then(FulfillmentStatus::from_platform) {
        status = match fulfillment {
            FulfillmentStatus::Fulfilled => OrderStatus::Delivered,
            FulfillmentStatus::Partial => OrderStatus::Shipped,
            FulfillmentStatus::Restocked => OrderStatus::Cancelled,
            FulfillmentStatus::Unfulfilled => OrderStatus::Pending,
        };
    }

    status
}

// =============================================================================
// Internal -> platform
// =============================================================================

/// Variables for `draftOrderCreate`.
#[must_use]
pub fn draft_order_variables(input: &OrderCreateInput) -> Value {
    let line_items: Vec<Value> = input
        .items
        .iter()
        .map(|item| json!({"variantId": item.variant_id, "quantity": item.quantity}))
        .collect();

    let mut draft = Map::new();
    draft.insert("email".into(), json!(input.buyer.email.trim()));
    draft.insert(
        "tags".into(),
        json!([format!("{BUYER_TAG_PREFIX}{}", input.buyer.id.trim())]),
    );
    draft.insert("lineItems".into(), Value::Array(line_items));
    if let Some(address) = input.shipping_address.as_ref().filter(|a| !a.is_empty()) {
        draft.insert("shippingAddress".into(), mailing_address(address));
    }
    if let Some(note) = &input.note {
        draft.insert("note".into(), json!(note));
    }

    json!({ "input": draft })
}

/// Variables for `orderUpdate`. `tags`, when given, replaces the order's tags.
#[must_use]
pub fn order_update_variables(
    id: &str,
    input: &OrderUpdateInput,
    tags: Option<&[String]>,
) -> Value {
    let mut order = Map::new();
    order.insert("id".into(), json!(id));
    if let Some(note) = &input.note {
        order.insert("note".into(), json!(note));
    }
    if let Some(email) = &input.email {
        order.insert("email".into(), json!(email.trim()));
    }
    if let Some(address) = &input.shipping_address {
        order.insert("shippingAddress".into(), mailing_address(address));
    }
    if let Some(tags) = tags {
        order.insert("tags".into(), json!(tags));
    }
    json!({ "input": order })
}

/// Replace every `status:` tag with `status:{status}`, keeping other tags.
#[must_use]
pub fn replace_status_tag(tags: &[String], status: OrderStatus) -> Vec<String> {
    tags.iter()
        .filter(|t| !t.trim().starts_with(STATUS_TAG_PREFIX))
        .cloned()
        .chain(std::iter::once(format!("{STATUS_TAG_PREFIX}{status}")))
        .collect()
}

/// `MailingAddressInput`: the platform splits the name into first/last.
fn mailing_address(address: &ShippingAddress) -> Value {
    let mut fields = Map::new();
    if let Some(name) = address.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        match name.split_once(char::is_whitespace) {
            Some((first, last)) => {
                fields.insert("firstName".into(), json!(first));
                fields.insert("lastName".into(), json!(last.trim()));
            }
            None => {
                fields.insert("lastName".into(), json!(name));
            }
        }
    }
    for (key, value) in [
        ("address1", &address.address1),
        ("address2", &address.address2),
        ("city", &address.city),
        ("province", &address.province),
        ("zip", &address.postal_code),
        ("country", &address.country),
        ("phone", &address.phone),
    ] {
        if let Some(value) = value {
            fields.insert(key.into(), json!(value));
        }
    }
    Value::Object(fields)
}

/// Render order filters as a platform search query.
#[must_use]
pub fn order_search_query(filters: &OrderFilters) -> Option<String> {
    join_clauses(vec![
        filters
            .buyer_email
            .as_deref()
            .map(|e| format!("email:{}", quote_search_value(e.trim())))
            .unwrap_or_default(),
        filters
            .financial_status
            .map(|s| format!("financial_status:{}", s.as_query_value()))
            .unwrap_or_default(),
        filters.search.clone().unwrap_or_default(),
    ])
}
