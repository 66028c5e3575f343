//! Wire shapes of Shopify GraphQL responses.
//!
//! Every field is optional or defaulted: the platform omits fields freely
//! and the mapper decides what a missing value means.

use serde::Deserialize;

/// `MoneyV2 { amount currencyCode }`. Amounts arrive as decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: Option<String>,
    pub currency_code: Option<String>,
}

/// `MoneyBag { shopMoney }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyBag {
    pub shop_money: Option<MoneyV2>,
}

/// Relay-style connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
    pub page_info: Option<PageInfo>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            edges: Vec::new(),
            page_info: None,
        }
    }
}

impl<T> Connection<T> {
    /// Consume the connection, keeping only the nodes in order.
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// `{ id }` reference to another node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeRef {
    pub id: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalOrderNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub display_financial_status: Option<String>,
    pub display_fulfillment_status: Option<String>,
    pub subtotal_price_set: Option<MoneyBag>,
    pub total_shipping_price_set: Option<MoneyBag>,
    pub total_tax_set: Option<MoneyBag>,
    pub total_price_set: Option<MoneyBag>,
    pub customer: Option<ExternalCustomer>,
    pub shipping_address: Option<ExternalAddress>,
    #[serde(default)]
    pub line_items: Connection<ExternalLineItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalCustomer {
    pub id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLineItem {
    pub id: Option<String>,
    pub title: Option<String>,
    pub quantity: Option<i64>,
    pub original_unit_price_set: Option<MoneyBag>,
    pub variant: Option<ExternalLineVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalLineVariant {
    pub id: Option<String>,
    pub product: Option<NodeRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalAddress {
    pub name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalProductNode {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub images: Connection<ExternalImage>,
    #[serde(default)]
    pub variants: Connection<ExternalVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalImage {
    pub id: Option<String>,
    pub url: Option<String>,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalVariant {
    pub id: Option<String>,
    pub title: Option<String>,
    pub sku: Option<String>,
    /// `Money` scalar: a decimal string.
    pub price: Option<String>,
    pub inventory_quantity: Option<i64>,
}

// =============================================================================
// Response envelopes
// =============================================================================

/// A mutation validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    #[serde(default)]
    pub products: Connection<ExternalProductNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product: Option<ExternalProductNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreateData {
    pub product_create: Option<ProductPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdateData {
    pub product_update: Option<ProductPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub product: Option<ExternalProductNode>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPriceUpdateData {
    pub product_variants_bulk_update: Option<UserErrorsPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserErrorsPayload {
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDeleteData {
    pub product_delete: Option<ProductDeletePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDeletePayload {
    pub deleted_product_id: Option<String>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
pub struct OrdersData {
    #[serde(default)]
    pub orders: Connection<ExternalOrderNode>,
}

#[derive(Debug, Deserialize)]
pub struct OrderData {
    pub order: Option<ExternalOrderNode>,
}

#[derive(Debug, Deserialize)]
pub struct OrderTagsData {
    pub order: Option<OrderTagsNode>,
}

#[derive(Debug, Deserialize)]
pub struct OrderTagsNode {
    pub id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdateData {
    pub order_update: Option<OrderPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub order: Option<ExternalOrderNode>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDeleteData {
    pub order_delete: Option<OrderDeletePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDeletePayload {
    pub deleted_id: Option<String>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderCreateData {
    pub draft_order_create: Option<DraftOrderCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderCreatePayload {
    pub draft_order: Option<NodeRef>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderCompleteData {
    pub draft_order_complete: Option<DraftOrderCompletePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderCompletePayload {
    pub draft_order: Option<CompletedDraftOrder>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
pub struct CompletedDraftOrder {
    pub id: Option<String>,
    pub order: Option<ExternalOrderNode>,
}
