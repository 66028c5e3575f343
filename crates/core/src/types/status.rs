//! Status enums for orders and products.
//!
//! `FinancialStatus` and `FulfillmentStatus` mirror the values Shopify reports
//! for an order. `OrderStatus` and `ProductStatus` are the canonical statuses
//! exposed by internal records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Order financial status (from Shopify).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialStatus {
    Pending,
    Authorized,
    PartiallyPaid,
    Paid,
    PartiallyRefunded,
    Refunded,
    Voided,
    Expired,
}

impl FinancialStatus {
    /// Parse the platform's `displayFinancialStatus` value.
    ///
    /// Unknown values return `None`.
    #[must_use]
    pub fn from_platform(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "AUTHORIZED" => Some(Self::Authorized),
            "PARTIALLY_PAID" => Some(Self::PartiallyPaid),
            "PAID" => Some(Self::Paid),
            "PARTIALLY_REFUNDED" => Some(Self::PartiallyRefunded),
            "REFUNDED" => Some(Self::Refunded),
            "VOIDED" => Some(Self::Voided),
            "EXPIRED" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Value accepted by the platform's order search syntax.
    #[must_use]
    pub const fn as_query_value(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authorized => "authorized",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
            Self::Voided => "voided",
            Self::Expired => "expired",
        }
    }
}

/// Order fulfillment status (from Shopify).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    Unfulfilled,
    Partial,
    Fulfilled,
    Restocked,
}

impl FulfillmentStatus {
    /// Parse the platform's fulfillment status value.
    ///
    /// The Admin API reports partial fulfillment as `PARTIALLY_FULFILLED`,
    /// older payloads as `PARTIAL`; both map to [`FulfillmentStatus::Partial`].
    #[must_use]
    pub fn from_platform(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "UNFULFILLED" => Some(Self::Unfulfilled),
            "PARTIAL" | "PARTIALLY_FULFILLED" => Some(Self::Partial),
            "FULFILLED" => Some(Self::Fulfilled),
            "RESTOCKED" => Some(Self::Restocked),
            _ => None,
        }
    }
}

/// Canonical order status exposed to callers.
///
/// Derived from the platform's financial and fulfillment statuses; the
/// gateway does not validate transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Canonical product status exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    #[default]
    Pending,
    Inactive,
}

impl ProductStatus {
    /// Map the platform product status (`ACTIVE`, `DRAFT`, `ARCHIVED`, ...).
    #[must_use]
    pub fn from_platform(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("ACTIVE") => Self::Active,
            Some(s) if s.eq_ignore_ascii_case("DRAFT") => Self::Pending,
            _ => Self::Inactive,
        }
    }

    /// The platform status written by product mutations.
    #[must_use]
    pub const fn as_platform(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Pending => "DRAFT",
            Self::Inactive => "ARCHIVED",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "pending" | "draft" => Ok(Self::Pending),
            "inactive" | "archived" => Ok(Self::Inactive),
            _ => Err(format!("invalid product status: {s}")),
        }
    }
}
