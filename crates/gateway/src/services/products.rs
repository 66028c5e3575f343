//! Product operations.

use marigold_core::{EntityKind, Product, ProductFilters, ProductInput, normalize_gid};
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{
    CacheTtl, DeleteConfirmation, Fetched, Page, check_user_errors, invalidate, normalize_paging,
    over_fetch, window,
};
use crate::cache::{CacheKey, CacheStore};
use crate::mapper::{
    map_product, product_create_variables, product_search_query, product_update_variables,
    variant_price_variables,
};
use crate::shopify::types::{
    ProductCreateData, ProductData, ProductDeleteData, ProductUpdateData, ProductsData,
    VariantPriceUpdateData,
};
use crate::shopify::{ShopifyClient, ShopifyError, queries};

const ENTITY: EntityKind = EntityKind::Product;

/// Product listing, lookup and mutations against the Admin API.
#[derive(Clone)]
pub struct ProductService {
    client: ShopifyClient,
    cache: CacheStore,
    ttl: CacheTtl,
}

impl ProductService {
    #[must_use]
    pub const fn new(client: ShopifyClient, cache: CacheStore, ttl: CacheTtl) -> Self {
        Self { client, cache, ttl }
    }

    /// List one page of products, newest first.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; an unconfigured platform is
    /// `Page::NotConfigured`, not an error.
    #[instrument(skip(self, filters))]
    pub async fn find_all(
        &self,
        page: u32,
        limit: u32,
        filters: &ProductFilters,
    ) -> Result<Page<Product>, ShopifyError> {
        if !self.client.is_configured() {
            debug!("Shopify not configured, returning no products");
            return Ok(Page::NotConfigured);
        }

        let (page, limit) = normalize_paging(page, limit);
        let key = CacheKey::list(ENTITY, page, limit, filters).to_string();
        if let Some(items) = self.cache.get::<Vec<Product>>(&key).await {
            debug!(key = %key, "Cache hit");
            return Ok(Page::Items(items));
        }
        debug!(key = %key, "Cache miss");

        let data: ProductsData = self
            .client
            .query(
                queries::PRODUCTS,
                json!({
                    "first": over_fetch(limit),
                    "query": product_search_query(filters),
                }),
            )
            .await?;

        let products: Vec<Product> = data
            .products
            .edges
            .iter()
            .map(|edge| map_product(&edge.node))
            .collect();
        let items = window(products, page, limit);

        self.cache.set(&key, &items, Some(self.ttl.list)).await;
        Ok(Page::Items(items))
    }

    /// Look up a product by global or numeric id.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; absence and missing configuration are
    /// reported through [`Fetched`].
    #[instrument(skip(self))]
    pub async fn find_one(&self, id: &str) -> Result<Fetched<Product>, ShopifyError> {
        if !self.client.is_configured() {
            return Ok(Fetched::NotConfigured);
        }

        let gid = normalize_gid(ENTITY, id);
        let key = CacheKey::item(ENTITY, gid.as_str()).to_string();
        if let Some(product) = self.cache.get::<Product>(&key).await {
            debug!(key = %key, "Cache hit");
            return Ok(Fetched::Found(product));
        }

        let data: ProductData = self
            .client
            .query(queries::PRODUCT, json!({ "id": gid }))
            .await?;

        let Some(node) = data.product else {
            return Ok(Fetched::NotFound {
                entity: ENTITY,
                id: gid,
            });
        };

        let product = map_product(&node);
        self.cache.set(&key, &product, Some(self.ttl.item)).await;
        Ok(Fetched::Found(product))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// `InvalidInput` before any request if the name is missing or the price
    /// is negative; `UserError` if the platform rejects the input.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &ProductInput) -> Result<Product, ShopifyError> {
        input.validate_for_create()?;

        let data: ProductCreateData = self
            .client
            .query(queries::PRODUCT_CREATE, product_create_variables(input))
            .await?;
        let payload = data
            .product_create
            .ok_or_else(|| ShopifyError::no_data("productCreate returned no payload"))?;
        check_user_errors(&payload.user_errors)?;
        let node = payload
            .product
            .ok_or_else(|| ShopifyError::no_data("productCreate returned no product"))?;

        let product = map_product(&node);
        invalidate(&self.cache, ENTITY, None).await;
        info!(id = %product.id, "Product created");
        Ok(product)
    }

    /// Update a product. Only fields set in `input` change.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty update, `UserError` if rejected, and
    /// `NotFound` if the platform returns no product.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: &ProductInput) -> Result<Product, ShopifyError> {
        input.validate_for_update()?;
        let gid = normalize_gid(ENTITY, id);

        let data: ProductUpdateData = self
            .client
            .query(queries::PRODUCT_UPDATE, product_update_variables(&gid, input))
            .await?;
        let payload = data
            .product_update
            .ok_or_else(|| ShopifyError::no_data("productUpdate returned no payload"))?;
        check_user_errors(&payload.user_errors)?;
        let node = payload
            .product
            .ok_or_else(|| ShopifyError::not_found(ENTITY, gid.as_str()))?;

        let mut product = map_product(&node);
        // The product mutation is committed even if the price change fails
        invalidate(&self.cache, ENTITY, Some(&gid)).await;

        if let Some(price) = input.price {
            if let Some(variant) = product.variants.first_mut() {
                let data: VariantPriceUpdateData = self
                    .client
                    .query(
                        queries::VARIANT_PRICE_UPDATE,
                        variant_price_variables(&gid, &variant.id, price),
                    )
                    .await?;
                if let Some(payload) = data.product_variants_bulk_update {
                    check_user_errors(&payload.user_errors)?;
                }
                variant.price = price;
                product.price = price;
                invalidate(&self.cache, ENTITY, Some(&gid)).await;
            } else {
                debug!(id = %gid, "Product has no variant to carry a price");
            }
        }

        info!(id = %product.id, "Product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// `UserError` if rejected, `NotFound` if nothing was deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<DeleteConfirmation, ShopifyError> {
        let gid = normalize_gid(ENTITY, id);

        let data: ProductDeleteData = self
            .client
            .query(queries::PRODUCT_DELETE, json!({ "input": { "id": gid } }))
            .await?;
        let payload = data
            .product_delete
            .ok_or_else(|| ShopifyError::no_data("productDelete returned no payload"))?;
        check_user_errors(&payload.user_errors)?;
        let deleted = payload
            .deleted_product_id
            .ok_or_else(|| ShopifyError::not_found(ENTITY, gid.as_str()))?;

        invalidate(&self.cache, ENTITY, Some(&gid)).await;
        info!(id = %deleted, "Product deleted");
        Ok(DeleteConfirmation {
            id: deleted,
            message: "Product deleted".to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use marigold_core::ProductStatus;
    use rust_decimal::Decimal;
    use serde_json::Value;

    use super::*;
    use crate::config::{CacheConfig, ShopifyConfig};
    use crate::shopify::{ApiSurface, ErrorKind};
    use crate::testing::{Reply, ScriptedSender, configured_shopify, fast_http};

    fn service(sender: &Arc<ScriptedSender>) -> ProductService {
        service_with(sender, &configured_shopify())
    }

    fn service_with(sender: &Arc<ScriptedSender>, shopify: &ShopifyConfig) -> ProductService {
        let config = CacheConfig::default();
        ProductService::new(
            ShopifyClient::with_sender(ApiSurface::Admin, shopify, &fast_http(), sender.clone()),
            CacheStore::local_only(&config),
            CacheTtl::from(&config),
        )
    }

    fn product_node(n: usize) -> Value {
        json!({
            "id": format!("gid://shopify/Product/{n}"),
            "title": format!("Product {n}"),
            "status": "ACTIVE",
            "variants": {"edges": [{"node": {
                "id": format!("gid://shopify/ProductVariant/{n}"),
                "title": "Default",
                "price": "10.00",
                "inventoryQuantity": 5
            }}]}
        })
    }

    fn products_reply(count: usize) -> Reply {
        let edges: Vec<Value> = (0..count).map(|n| json!({"node": product_node(n)})).collect();
        Reply::data(json!({"products": {"edges": edges}}))
    }

    #[tokio::test]
    async fn test_second_page_is_windowed_from_over_fetch() {
        let sender = ScriptedSender::new(vec![products_reply(40)]);
        let service = service(&sender);

        let items = service
            .find_all(2, 20, &ProductFilters::default())
            .await
            .unwrap()
            .into_items();

        assert_eq!(items.len(), 20);
        assert_eq!(items[0].id, "gid://shopify/Product/20");
        assert_eq!(items[19].id, "gid://shopify/Product/39");
        assert_eq!(sender.variables(0)["first"], 40);
        assert_eq!(sender.variables(0)["query"], Value::Null);
    }

    #[tokio::test]
    async fn test_list_is_cached_per_filters() {
        let sender = ScriptedSender::new(vec![products_reply(3), products_reply(1)]);
        let service = service(&sender);
        let active = ProductFilters {
            status: Some(ProductStatus::Active),
            ..ProductFilters::default()
        };

        let first = service.find_all(1, 20, &active).await.unwrap();
        let second = service.find_all(1, 20, &active).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(sender.requests().len(), 1);
        assert_eq!(sender.variables(0)["query"], "status:active");

        let other = service.find_all(1, 20, &ProductFilters::default()).await.unwrap();
        assert_eq!(other.into_items().len(), 1);
        assert_eq!(sender.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_returns_soft_results_without_requests() {
        let sender = ScriptedSender::new(vec![]);
        let service = service_with(&sender, &ShopifyConfig::default());

        assert_eq!(
            service.find_all(1, 20, &ProductFilters::default()).await.unwrap(),
            Page::NotConfigured
        );
        assert_eq!(service.find_one("1").await.unwrap(), Fetched::NotConfigured);
        assert!(sender.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_writes_fail_loudly() {
        let sender = ScriptedSender::new(vec![]);
        let service = service_with(&sender, &ShopifyConfig::default());
        let input = ProductInput {
            name: Some("Mug".to_string()),
            ..ProductInput::default()
        };

        let err = service.create(&input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(sender.requests().is_empty());
    }

    #[tokio::test]
    async fn test_find_one_normalizes_id_and_caches() {
        let sender = ScriptedSender::new(vec![Reply::data(json!({"product": product_node(7)}))]);
        let service = service(&sender);

        let product = service.find_one("7").await.unwrap().found().unwrap();
        assert_eq!(product.id, "gid://shopify/Product/7");
        assert_eq!(sender.variables(0)["id"], "gid://shopify/Product/7");

        let again = service
            .find_one("gid://shopify/Product/7")
            .await
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(again, product);
        assert_eq!(sender.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_find_one_null_product_is_not_found() {
        let sender = ScriptedSender::new(vec![Reply::data(json!({"product": null}))]);
        let service = service(&sender);

        let fetched = service.find_one("gid://shopify/Product/404").await.unwrap();
        assert_eq!(
            fetched,
            Fetched::NotFound {
                entity: EntityKind::Product,
                id: "gid://shopify/Product/404".to_string()
            }
        );
        assert_eq!(
            fetched.into_result().unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input_before_io() {
        let sender = ScriptedSender::new(vec![]);
        let service = service(&sender);

        let err = service.create(&ProductInput::default()).await.unwrap_err();
        assert!(matches!(err, ShopifyError::InvalidInput(_)));
        assert!(sender.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_surfaces_user_errors() {
        let sender = ScriptedSender::new(vec![Reply::data(json!({"productCreate": {
            "product": null,
            "userErrors": [
                {"field": ["title"], "message": "Title is too long"},
                {"field": ["handle"], "message": "Handle is taken"}
            ]
        }}))]);
        let service = service(&sender);
        let input = ProductInput {
            name: Some("x".repeat(300)),
            ..ProductInput::default()
        };

        let err = service.create(&input).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "User error: title: Title is too long; handle: Handle is taken"
        );
        assert_eq!(err.kind(), ErrorKind::Api);
    }

    #[tokio::test]
    async fn test_create_invalidates_lists() {
        let sender = ScriptedSender::new(vec![
            products_reply(2),
            Reply::data(json!({"productCreate": {"product": product_node(9), "userErrors": []}})),
            products_reply(3),
        ]);
        let service = service(&sender);
        let filters = ProductFilters::default();

        assert_eq!(service.find_all(1, 20, &filters).await.unwrap().into_items().len(), 2);

        let input = ProductInput {
            name: Some("Product 9".to_string()),
            price: Some(Decimal::new(1000, 2)),
            ..ProductInput::default()
        };
        let created = service.create(&input).await.unwrap();
        assert_eq!(created.id, "gid://shopify/Product/9");
        assert_eq!(sender.variables(1)["input"]["variants"][0]["price"], "10.00");

        assert_eq!(service.find_all(1, 20, &filters).await.unwrap().into_items().len(), 3);
        assert_eq!(sender.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_update_sets_price_and_invalidates_item() {
        let sender = ScriptedSender::new(vec![
            Reply::data(json!({"product": product_node(1)})),
            Reply::data(json!({"productUpdate": {"product": product_node(1), "userErrors": []}})),
            Reply::data(json!({"productVariantsBulkUpdate": {"userErrors": []}})),
            Reply::data(json!({"product": product_node(1)})),
        ]);
        let service = service(&sender);

        service.find_one("1").await.unwrap();

        let input = ProductInput {
            price: Some(Decimal::new(1250, 2)),
            ..ProductInput::default()
        };
        let updated = service.update("1", &input).await.unwrap();
        assert_eq!(updated.price, Decimal::new(1250, 2));
        assert_eq!(updated.variants[0].price, Decimal::new(1250, 2));
        assert_eq!(
            sender.variables(2)["variants"][0]["id"],
            "gid://shopify/ProductVariant/1"
        );

        service.find_one("1").await.unwrap();
        assert_eq!(sender.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_rejected_price_still_invalidates_updated_product() {
        let mut renamed = product_node(1);
        renamed["title"] = json!("New");
        let sender = ScriptedSender::new(vec![
            Reply::data(json!({"product": product_node(1)})),
            Reply::data(json!({"productUpdate": {"product": renamed.clone(), "userErrors": []}})),
            Reply::data(json!({"productVariantsBulkUpdate": {
                "userErrors": [{"field": ["price"], "message": "bad price"}]
            }})),
            Reply::data(json!({"product": renamed})),
        ]);
        let service = service(&sender);

        let cached = service.find_one("1").await.unwrap().into_result().unwrap();
        assert_eq!(cached.name, "Product 1");

        let input = ProductInput {
            name: Some("New".to_string()),
            price: Some(Decimal::new(999_999, 2)),
            ..ProductInput::default()
        };
        let err = service.update("1", &input).await.unwrap_err();
        assert!(matches!(&err, ShopifyError::UserError(msg) if msg == "price: bad price"));

        let fresh = service.find_one("1").await.unwrap().into_result().unwrap();
        assert_eq!(fresh.name, "New");
        assert_eq!(sender.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let sender = ScriptedSender::new(vec![]);
        let service = service(&sender);
        let err = service.update("1", &ProductInput::default()).await.unwrap_err();
        assert!(matches!(err, ShopifyError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let sender = ScriptedSender::new(vec![
            Reply::data(json!({"productDelete": {"deletedProductId": "gid://shopify/Product/3", "userErrors": []}})),
            Reply::data(json!({"productDelete": {"deletedProductId": null, "userErrors": []}})),
        ]);
        let service = service(&sender);

        let confirmation = service.delete("3").await.unwrap();
        assert_eq!(confirmation.id, "gid://shopify/Product/3");
        assert_eq!(
            sender.variables(0),
            json!({"input": {"id": "gid://shopify/Product/3"}})
        );

        let err = service.delete("3").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let sender = ScriptedSender::new(vec![Reply::status(502, "bad gateway")]);
        let service = service(&sender);

        let err = service
            .find_all(1, 20, &ProductFilters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ShopifyError::Http { status: 502, .. }));
    }
}
