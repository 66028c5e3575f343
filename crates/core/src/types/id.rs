//! Platform global identifiers and the entity kinds they refer to.
//!
//! Shopify identifies every object with an opaque global id of the form
//! `gid://shopify/{Resource}/{id}`. Internal records keep that string as their
//! id verbatim; these helpers only normalize caller input and describe which
//! entity an id belongs to.

use std::fmt;

use serde::{Deserialize, Serialize};

const GID_SCHEME: &str = "gid://";
const GID_NAMESPACE: &str = "shopify";

/// The entity types the gateway manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Product,
    Order,
}

impl EntityKind {
    /// Resource name used inside platform global ids.
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Order => "Order",
        }
    }

    /// Plural segment used when building cache keys.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Product => "products",
            Self::Order => "orders",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource())
    }
}

/// Normalize a caller-supplied id into a global id for `kind`.
///
/// Strings that already look like a global id (`gid://...`) are returned
/// unchanged, whatever their namespace. Bare numeric ids are expanded into the
/// `gid://shopify/{Resource}/{id}` form. Anything else is passed through so the
/// platform can reject it.
///
/// ```
/// use marigold_core::{EntityKind, normalize_gid};
///
/// assert_eq!(normalize_gid(EntityKind::Product, "42"), "gid://shopify/Product/42");
/// assert_eq!(
///     normalize_gid(EntityKind::Order, "gid://shopify/Order/7"),
///     "gid://shopify/Order/7"
/// );
/// ```
#[must_use]
pub fn normalize_gid(kind: EntityKind, id: &str) -> String {
    let trimmed = id.trim();
    if trimmed.starts_with(GID_SCHEME) {
        return trimmed.to_string();
    }
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return format!("{GID_SCHEME}{GID_NAMESPACE}/{}/{trimmed}", kind.resource());
    }
    trimmed.to_string()
}
