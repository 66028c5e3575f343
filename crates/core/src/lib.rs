//! Marigold Core - canonical commerce records.
//!
//! This crate provides the records the gateway hands to its callers:
//! - [`Order`] and [`Product`] built from the commerce platform's data
//! - the inputs and filters accepted by gateway operations
//! - status enums and global-id helpers
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no caching.
//! The platform remains the source of truth; these records are a stable view
//! of it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
