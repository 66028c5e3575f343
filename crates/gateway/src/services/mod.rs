//! Gateway services: the operations callers use.
//!
//! Each service composes the transport, cache store and mapper for one
//! entity type. Reads are cache-aside; successful writes invalidate the
//! affected keys instead of updating them in place.

mod orders;
mod products;

pub use orders::OrderService;
pub use products::ProductService;

use std::time::Duration;

use marigold_core::EntityKind;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStore};
use crate::config::CacheConfig;
use crate::shopify::ShopifyError;
use crate::shopify::types::UserError;

/// Largest page the platform returns for one connection query.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Result of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page<T> {
    Items(Vec<T>),
    /// Shopify credentials are missing; nothing was requested.
    NotConfigured,
}

impl<T> Page<T> {
    /// The items, or nothing when unconfigured.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Items(items) => items,
            Self::NotConfigured => Vec::new(),
        }
    }
}

/// Result of a lookup by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Found(T),
    /// Shopify credentials are missing; nothing was requested.
    NotConfigured,
    NotFound { entity: EntityKind, id: String },
}

impl<T> Fetched<T> {
    /// Treat the soft outcomes as errors.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing entity, `NotConfigured` without credentials.
    pub fn into_result(self) -> Result<T, ShopifyError> {
        match self {
            Self::Found(value) => Ok(value),
            Self::NotConfigured => Err(ShopifyError::NotConfigured("shop credentials")),
            Self::NotFound { entity, id } => Err(ShopifyError::not_found(entity, id)),
        }
    }

    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// Returned by successful deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub id: String,
    pub message: String,
}

/// Cache lifetimes used by services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub list: Duration,
    pub item: Duration,
}

impl From<&CacheConfig> for CacheTtl {
    fn from(config: &CacheConfig) -> Self {
        Self {
            list: config.list_ttl,
            item: config.item_ttl,
        }
    }
}

/// Page is 1-based; limit is clamped to `1..=MAX_PAGE_SIZE`.
pub(crate) fn normalize_paging(page: u32, limit: u32) -> (u32, u32) {
    (page.max(1), limit.clamp(1, MAX_PAGE_SIZE))
}

/// How many nodes to request for one window.
pub(crate) fn over_fetch(limit: u32) -> u32 {
    limit.saturating_mul(2).min(MAX_PAGE_SIZE)
}

/// The `[(page-1)*limit, page*limit)` slice of `items`.
pub(crate) fn window<T>(items: Vec<T>, page: u32, limit: u32) -> Vec<T> {
    let skip = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    items.into_iter().skip(skip).take(limit as usize).collect()
}

/// Fail with `UserError` when a mutation reported validation errors.
pub(crate) fn check_user_errors(errors: &[UserError]) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors
        .iter()
        .map(|e| match e.field.as_deref() {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), e.message),
            _ => e.message.clone(),
        })
        .collect();
    Err(ShopifyError::UserError(messages.join("; ")))
}

/// Drop list pages for `entity`, and the item entry for `id` if given.
pub(crate) async fn invalidate(cache: &CacheStore, entity: EntityKind, id: Option<&str>) {
    if let Some(id) = id {
        cache.delete(&CacheKey::item(entity, id).to_string()).await;
    }
    cache.delete_prefix(&CacheKey::list_prefix(entity)).await;
}
