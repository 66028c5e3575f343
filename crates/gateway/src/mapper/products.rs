//! Product mapping.

use marigold_core::{
    Product, ProductFilters, ProductImage, ProductInput, ProductStatus, ProductVariant,
};
use rust_decimal::Decimal;
use serde_json::{Map, Value, json};

use super::{join_clauses, parse_amount, quote_search_value};
use crate::shopify::types::{ExternalImage, ExternalProductNode, ExternalVariant};

/// Build the canonical [`Product`] from a platform product node.
///
/// Representative price and stock come from the first variant.
#[must_use]
pub fn map_product(node: &ExternalProductNode) -> Product {
    let variants: Vec<ProductVariant> = node
        .variants
        .edges
        .iter()
        .map(|edge| map_variant(&edge.node))
        .collect();
    let images: Vec<ProductImage> = node
        .images
        .edges
        .iter()
        .filter_map(|edge| map_image(&edge.node))
        .collect();

    let (price, stock) = variants
        .first()
        .map_or((Decimal::ZERO, 0), |v| (v.price, v.stock));

    Product {
        id: node.id.clone().unwrap_or_default(),
        name: node.title.clone().unwrap_or_default(),
        price,
        image: images.first().map(|i| i.url.clone()).unwrap_or_default(),
        category: node.product_type.clone().unwrap_or_default(),
        description: node.description.clone().unwrap_or_default(),
        stock,
        status: ProductStatus::from_platform(node.status.as_deref()),
        variants,
        images,
    }
}

fn map_variant(variant: &ExternalVariant) -> ProductVariant {
    ProductVariant {
        id: variant.id.clone().unwrap_or_default(),
        title: variant.title.clone().unwrap_or_default(),
        sku: variant.sku.clone().filter(|s| !s.is_empty()),
        price: parse_amount(variant.price.as_deref()).unwrap_or(Decimal::ZERO),
        stock: variant.inventory_quantity.unwrap_or(0),
    }
}

/// Images without a URL are dropped.
fn map_image(image: &ExternalImage) -> Option<ProductImage> {
    let url = image.url.clone().filter(|u| !u.is_empty())?;
    Some(ProductImage {
        url,
        alt_text: image.alt_text.clone(),
    })
}

// =============================================================================
// Internal -> platform
// =============================================================================

fn product_fields(input: &ProductInput) -> Map<String, Value> {
    let mut fields = Map::new();
    if let Some(name) = &input.name {
        fields.insert("title".into(), json!(name.trim()));
    }
    if let Some(description) = &input.description {
        fields.insert("descriptionHtml".into(), json!(description));
    }
    if let Some(category) = &input.category {
        fields.insert("productType".into(), json!(category));
    }
    if let Some(status) = input.status {
        fields.insert("status".into(), json!(status.as_platform()));
    }
    if let Some(tags) = &input.tags {
        fields.insert("tags".into(), json!(tags));
    }
    fields
}

/// Variables for `productCreate`. A price becomes the default variant's price.
#[must_use]
pub fn product_create_variables(input: &ProductInput) -> Value {
    let mut fields = product_fields(input);
    if let Some(price) = input.price {
        fields.insert("variants".into(), json!([{ "price": price.to_string() }]));
    }
    json!({ "input": fields })
}

/// Variables for `productUpdate`. Price is set separately on the variant.
#[must_use]
pub fn product_update_variables(id: &str, input: &ProductInput) -> Value {
    let mut fields = product_fields(input);
    fields.insert("id".into(), json!(id));
    json!({ "input": fields })
}

/// Variables for `productVariantsBulkUpdate` setting one variant's price.
#[must_use]
pub fn variant_price_variables(product_id: &str, variant_id: &str, price: Decimal) -> Value {
    json!({
        "productId": product_id,
        "variants": [{ "id": variant_id, "price": price.to_string() }],
    })
}

/// Render product filters as a platform search query.
#[must_use]
pub fn product_search_query(filters: &ProductFilters) -> Option<String> {
    join_clauses(vec![
        filters
            .category
            .as_deref()
            .map(|c| format!("product_type:{}", quote_search_value(c.trim())))
            .unwrap_or_default(),
        filters
            .status
            .map(|s| format!("status:{}", s.as_platform().to_ascii_lowercase()))
            .unwrap_or_default(),
        filters.search.clone().unwrap_or_default(),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn node(value: Value) -> ExternalProductNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_product() {
        let product = map_product(&node(json!({
            "id": "gid://shopify/Product/1",
            "title": "Stoneware Mug",
            "description": "Holds coffee.",
            "productType": "Mugs",
            "status": "ACTIVE",
            "images": {"edges": [
                {"node": {"id": "gid://shopify/ProductImage/1", "url": "https://cdn.example.com/a.jpg", "altText": "front"}},
                {"node": {"id": "gid://shopify/ProductImage/2", "url": "https://cdn.example.com/b.jpg"}}
            ]},
            "variants": {"edges": [
                {"node": {"id": "gid://shopify/ProductVariant/1", "title": "Blue", "sku": "MUG-B", "price": "18.50", "inventoryQuantity": 4}},
                {"node": {"id": "gid://shopify/ProductVariant/2", "title": "Red", "sku": "", "price": "19.00", "inventoryQuantity": 0}}
            ]}
        })));

        assert_eq!(product.id, "gid://shopify/Product/1");
        assert_eq!(product.name, "Stoneware Mug");
        assert_eq!(product.price, Decimal::new(1850, 2));
        assert_eq!(product.stock, 4);
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.category, "Mugs");
        assert_eq!(product.image, "https://cdn.example.com/a.jpg");
        assert_eq!(product.images.len(), 2);
        assert_eq!(product.images[0].alt_text.as_deref(), Some("front"));
        assert_eq!(product.variants.len(), 2);
        assert_eq!(product.variants[1].sku, None);
    }

    #[test]
    fn test_product_without_variants_or_images() {
        let product = map_product(&node(json!({
            "id": "gid://shopify/Product/2",
            "title": "Gift card",
            "status": "DRAFT"
        })));
        assert_eq!(product.price, Decimal::ZERO);
        assert_eq!(product.stock, 0);
        assert_eq!(product.image, "");
        assert_eq!(product.status, ProductStatus::Pending);
        assert!(product.variants.is_empty());
    }

    #[test]
    fn test_unknown_status_is_inactive() {
        for status in [Some("ARCHIVED"), Some("UNLISTED"), None] {
            let mut external = ExternalProductNode::default();
            external.status = status.map(str::to_string);
            assert_eq!(map_product(&external).status, ProductStatus::Inactive);
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let external = node(json!({"id": "gid://shopify/Product/3", "title": "Tea"}));
        assert_eq!(map_product(&external), map_product(&external));
    }

    #[test]
    fn test_create_variables() {
        let input = ProductInput {
            name: Some(" Mug ".to_string()),
            category: Some("Mugs".to_string()),
            status: Some(ProductStatus::Pending),
            price: Some(Decimal::new(1200, 2)),
            ..ProductInput::default()
        };
        assert_eq!(
            product_create_variables(&input),
            json!({"input": {
                "title": "Mug",
                "productType": "Mugs",
                "status": "DRAFT",
                "variants": [{"price": "12.00"}]
            }})
        );
    }

    #[test]
    fn test_update_variables_send_only_given_fields() {
        let input = ProductInput {
            description: Some("<p>New</p>".to_string()),
            price: Some(Decimal::new(5, 0)),
            ..ProductInput::default()
        };
        assert_eq!(
            product_update_variables("gid://shopify/Product/1", &input),
            json!({"input": {"id": "gid://shopify/Product/1", "descriptionHtml": "<p>New</p>"}})
        );
        assert_eq!(
            variant_price_variables("gid://shopify/Product/1", "gid://shopify/ProductVariant/1", Decimal::new(5, 0)),
            json!({"productId": "gid://shopify/Product/1", "variants": [{"id": "gid://shopify/ProductVariant/1", "price": "5"}]})
        );
    }

    #[test]
    fn test_product_search_query() {
        assert_eq!(product_search_query(&ProductFilters::default()), None);
        let filters = ProductFilters {
            category: Some("Coffee Mugs".to_string()),
            status: Some(ProductStatus::Inactive),
            search: Some("blue".to_string()),
        };
        assert_eq!(
            product_search_query(&filters).as_deref(),
            Some("product_type:\"Coffee Mugs\" status:archived blue")
        );
    }
}
