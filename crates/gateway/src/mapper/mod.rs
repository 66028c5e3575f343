//! Conversion between platform shapes and canonical records.
//!
//! Everything here is pure: no I/O, no logging, and no failure on missing
//! optional input. Absent strings become empty, absent amounts become zero.
//! Both directions live here: nodes into records, and inputs and filters into
//! mutation variables and search queries.

mod orders;
mod products;

pub use orders::{
    derive_order_status, draft_order_variables, map_order, order_search_query,
    order_update_variables, replace_status_tag, BUYER_TAG_PREFIX, STATUS_TAG_PREFIX,
};
pub use products::{
    map_product, product_create_variables, product_search_query, product_update_variables,
    variant_price_variables,
};

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::shopify::types::{MoneyBag, MoneyV2};

/// Parse a decimal amount. Unparseable input counts as absent.
pub(crate) fn parse_amount(amount: Option<&str>) -> Option<Decimal> {
    amount.and_then(|a| Decimal::from_str(a.trim()).ok())
}

fn shop_money(bag: Option<&MoneyBag>) -> Option<&MoneyV2> {
    bag.and_then(|b| b.shop_money.as_ref())
}

/// `shopMoney.amount` of a money bag, if present and parseable.
pub(crate) fn bag_amount(bag: Option<&MoneyBag>) -> Option<Decimal> {
    parse_amount(shop_money(bag).and_then(|m| m.amount.as_deref()))
}

pub(crate) fn bag_currency(bag: Option<&MoneyBag>) -> Option<&str> {
    shop_money(bag).and_then(|m| m.currency_code.as_deref())
}

/// Parse an RFC 3339 timestamp into UTC. Unparseable input is `None`.
pub(crate) fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Quote a value for the platform search syntax.
pub(crate) fn quote_search_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Join non-empty search clauses; `None` when there are none.
pub(crate) fn join_clauses(clauses: Vec<String>) -> Option<String> {
    let clauses: Vec<String> = clauses
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" "))
    }
}
