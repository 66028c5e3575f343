//! Marigold commerce gateway.
//!
//! Treats Shopify as the source of truth for products and orders:
//! - [`shopify`]: GraphQL transport with timeout, retry and rate-limit handling
//! - [`cache`]: cache-aside store, Redis when ready, in-process otherwise
//! - [`mapper`]: platform shapes to canonical records and back
//! - [`services`]: the list/get/create/update/delete operations
//!
//! Build everything once with [`Gateway::connect`] and share the handle.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod mapper;
pub mod services;
pub mod shopify;
mod state;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, GatewayConfig};
pub use services::{DeleteConfirmation, Fetched, OrderService, Page, ProductService};
pub use shopify::{ErrorKind, ShopifyError};
pub use state::Gateway;
