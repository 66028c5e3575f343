//! Core types for the Marigold gateway.
//!
//! Canonical records returned to callers, the inputs they send, and the
//! status and id helpers shared by both.

pub mod id;
pub mod input;
pub mod order;
pub mod product;
pub mod status;

pub use id::{EntityKind, normalize_gid};
pub use input::InputError;
pub use order::{
    BuyerIdentity, Order, OrderCreateInput, OrderFilters, OrderItem, OrderLineInput,
    OrderUpdateInput, ShippingAddress,
};
pub use product::{Product, ProductFilters, ProductImage, ProductInput, ProductVariant};
pub use status::{FinancialStatus, FulfillmentStatus, OrderStatus, ProductStatus};
