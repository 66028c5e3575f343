//! Gateway wiring shared by every caller.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheError, CacheStore};
use crate::config::GatewayConfig;
use crate::services::{CacheTtl, OrderService, ProductService};
use crate::shopify::{ApiSurface, HttpSend, ReqwestSender, ShopifyClient};

/// Every gateway component, built once per process.
///
/// This struct is cheaply cloneable via `Arc` and hands out the services,
/// the cache store and the raw API clients.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    config: GatewayConfig,
    cache: CacheStore,
    admin: ShopifyClient,
    storefront: ShopifyClient,
    products: ProductService,
    orders: OrderService,
}

impl Gateway {
    /// Build the gateway from configuration.
    ///
    /// Uses Redis when `REDIS_URL` is configured. Must be called inside a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the Redis URL is malformed.
    pub fn connect(config: GatewayConfig) -> Result<Self, CacheError> {
        let cache = CacheStore::from_config(&config.cache)?;
        Ok(Self::with_parts(config, cache, Arc::new(ReqwestSender::default())))
    }

    /// Build the gateway from explicit parts.
    #[must_use]
    pub fn with_parts(config: GatewayConfig, cache: CacheStore, sender: Arc<dyn HttpSend>) -> Self {
        let admin = ShopifyClient::with_sender(
            ApiSurface::Admin,
            &config.shopify,
            &config.http,
            Arc::clone(&sender),
        );
        let storefront = ShopifyClient::with_sender(
            ApiSurface::Storefront,
            &config.shopify,
            &config.http,
            sender,
        );
        let ttl = CacheTtl::from(&config.cache);

        info!(
            admin_configured = admin.is_configured(),
            storefront_configured = storefront.is_configured(),
            cache_backend = %cache.backend(),
            "Gateway initialized"
        );

        Self {
            inner: Arc::new(GatewayInner {
                products: ProductService::new(admin.clone(), cache.clone(), ttl),
                orders: OrderService::new(admin.clone(), cache.clone(), ttl),
                config,
                cache,
                admin,
                storefront,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    /// Admin API client, for documents the services do not cover.
    #[must_use]
    pub fn admin(&self) -> &ShopifyClient {
        &self.inner.admin
    }

    /// Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &ShopifyClient {
        &self.inner.storefront
    }
}
