//! Order operations.
//!
//! Orders are created through a draft order that is completed with payment
//! pending. Status changes are recorded as a `status:` tag.

use marigold_core::{
    EntityKind, InputError, Order, OrderCreateInput, OrderFilters, OrderStatus, OrderUpdateInput,
    normalize_gid,
};
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{
    CacheTtl, DeleteConfirmation, Fetched, Page, check_user_errors, invalidate, normalize_paging,
    over_fetch, window,
};
use crate::cache::{CacheKey, CacheStore};
use crate::mapper::{
    draft_order_variables, map_order, order_search_query, order_update_variables,
    replace_status_tag,
};
use crate::shopify::types::{
    DraftOrderCompleteData, DraftOrderCreateData, OrderData, OrderDeleteData, OrderTagsData,
    OrderUpdateData, OrdersData,
};
use crate::shopify::{ShopifyClient, ShopifyError, queries};

const ENTITY: EntityKind = EntityKind::Order;

/// Order listing, lookup and mutations against the Admin API.
#[derive(Clone)]
pub struct OrderService {
    client: ShopifyClient,
    cache: CacheStore,
    ttl: CacheTtl,
}

impl OrderService {
    #[must_use]
    pub const fn new(client: ShopifyClient, cache: CacheStore, ttl: CacheTtl) -> Self {
        Self { client, cache, ttl }
    }

    /// List one page of orders, newest first.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; an unconfigured platform is
    /// `Page::NotConfigured`.
    #[instrument(skip(self, filters))]
    pub async fn find_all(
        &self,
        page: u32,
        limit: u32,
        filters: &OrderFilters,
    ) -> Result<Page<Order>, ShopifyError> {
        if !self.client.is_configured() {
            debug!("Shopify not configured, returning no orders");
            return Ok(Page::NotConfigured);
        }

        let (page, limit) = normalize_paging(page, limit);
        let key = CacheKey::list(ENTITY, page, limit, filters).to_string();
        if let Some(items) = self.cache.get::<Vec<Order>>(&key).await {
            debug!(key = %key, "Cache hit");
            return Ok(Page::Items(items));
        }
        debug!(key = %key, "Cache miss");

        let data: OrdersData = self
            .client
            .query(
                queries::ORDERS,
                json!({
                    "first": over_fetch(limit),
                    "query": order_search_query(filters),
                }),
            )
            .await?;

        let orders: Vec<Order> = data
            .orders
            .edges
            .iter()
            .map(|edge| map_order(&edge.node))
            .collect();
        let items = window(orders, page, limit);

        self.cache.set(&key, &items, Some(self.ttl.list)).await;
        Ok(Page::Items(items))
    }

    /// Look up an order by global or numeric id.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    #[instrument(skip(self))]
    pub async fn find_one(&self, id: &str) -> Result<Fetched<Order>, ShopifyError> {
        if !self.client.is_configured() {
            return Ok(Fetched::NotConfigured);
        }

        let gid = normalize_gid(ENTITY, id);
        let key = CacheKey::item(ENTITY, gid.as_str()).to_string();
        if let Some(order) = self.cache.get::<Order>(&key).await {
            debug!(key = %key, "Cache hit");
            return Ok(Fetched::Found(order));
        }

        let data: OrderData = self
            .client
            .query(queries::ORDER, json!({ "id": gid }))
            .await?;

        let Some(node) = data.order else {
            return Ok(Fetched::NotFound {
                entity: ENTITY,
                id: gid,
            });
        };

        let order = map_order(&node);
        self.cache.set(&key, &order, Some(self.ttl.item)).await;
        Ok(Fetched::Found(order))
    }

    /// Place an order for `input.buyer`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` before any request if the buyer or items are invalid;
    /// `UserError` if either the draft or its completion is rejected.
    #[instrument(skip(self, input), fields(buyer = %input.buyer.id))]
    pub async fn create(&self, input: &OrderCreateInput) -> Result<Order, ShopifyError> {
        input.validate()?;

        let data: DraftOrderCreateData = self
            .client
            .query(queries::DRAFT_ORDER_CREATE, draft_order_variables(input))
            .await?;
        let payload = data
            .draft_order_create
            .ok_or_else(|| ShopifyError::no_data("draftOrderCreate returned no payload"))?;
        check_user_errors(&payload.user_errors)?;
        let draft_id = payload
            .draft_order
            .and_then(|d| d.id)
            .ok_or_else(|| ShopifyError::no_data("draftOrderCreate returned no draft order"))?;
        debug!(draft_id = %draft_id, "Draft order created");

        let data: DraftOrderCompleteData = self
            .client
            .query(queries::DRAFT_ORDER_COMPLETE, json!({ "id": draft_id }))
            .await?;
        let payload = data
            .draft_order_complete
            .ok_or_else(|| ShopifyError::no_data("draftOrderComplete returned no payload"))?;
        check_user_errors(&payload.user_errors)?;
        let node = payload
            .draft_order
            .and_then(|d| d.order)
            .ok_or_else(|| ShopifyError::no_data("draftOrderComplete returned no order"))?;

        let order = map_order(&node);
        invalidate(&self.cache, ENTITY, None).await;
        info!(id = %order.id, "Order created");
        Ok(order)
    }

    /// Update an order. A new status replaces any existing `status:` tag.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty update, `NotFound` for an unknown order,
    /// `UserError` if rejected.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: &OrderUpdateInput) -> Result<Order, ShopifyError> {
        if input.is_empty() {
            return Err(InputError::EmptyUpdate.into());
        }
        let gid = normalize_gid(ENTITY, id);

        let tags = match input.status {
            Some(status) => Some(self.status_tags(&gid, status).await?),
            None => None,
        };

        let data: OrderUpdateData = self
            .client
            .query(
                queries::ORDER_UPDATE,
                order_update_variables(&gid, input, tags.as_deref()),
            )
            .await?;
        let payload = data
            .order_update
            .ok_or_else(|| ShopifyError::no_data("orderUpdate returned no payload"))?;
        check_user_errors(&payload.user_errors)?;
        let node = payload
            .order
            .ok_or_else(|| ShopifyError::not_found(ENTITY, gid.as_str()))?;

        let order = map_order(&node);
        invalidate(&self.cache, ENTITY, Some(&gid)).await;
        info!(id = %order.id, "Order updated");
        Ok(order)
    }

    /// Record a new status on an order.
    ///
    /// # Errors
    ///
    /// As [`OrderService::update`].
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, ShopifyError> {
        let input = OrderUpdateInput {
            status: Some(status),
            ..OrderUpdateInput::default()
        };
        self.update(id, &input).await
    }

    /// Read the order's tags and swap in the new status tag.
    async fn status_tags(&self, gid: &str, status: OrderStatus) -> Result<Vec<String>, ShopifyError> {
        let data: OrderTagsData = self
            .client
            .query(queries::ORDER_TAGS, json!({ "id": gid }))
            .await?;
        let current = data
            .order
            .ok_or_else(|| ShopifyError::not_found(ENTITY, gid))?;
        Ok(replace_status_tag(&current.tags, status))
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// `UserError` if rejected, `NotFound` if nothing was deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<DeleteConfirmation, ShopifyError> {
        let gid = normalize_gid(ENTITY, id);

        let data: OrderDeleteData = self
            .client
            .query(queries::ORDER_DELETE, json!({ "orderId": gid }))
            .await?;
        let payload = data
            .order_delete
            .ok_or_else(|| ShopifyError::no_data("orderDelete returned no payload"))?;
        check_user_errors(&payload.user_errors)?;
        let deleted = payload
            .deleted_id
            .ok_or_else(|| ShopifyError::not_found(ENTITY, gid.as_str()))?;

        invalidate(&self.cache, ENTITY, Some(&gid)).await;
        info!(id = %deleted, "Order deleted");
        Ok(DeleteConfirmation {
            id: deleted,
            message: "Order deleted".to_string(),
        })
    }
}
