//! Cache maintenance commands.

use clap::Subcommand;
use marigold_core::EntityKind;
use marigold_gateway::cache::{CacheKey, CacheStore};
use serde_json::json;

use super::CliError;
use crate::output::print_json;

#[derive(Subcommand)]
pub enum CacheAction {
    /// Remove every entry under the gateway namespace
    Clear,
    /// Remove cached listings for one entity type
    Invalidate {
        /// `products` or `orders`
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,
    },
}

fn parse_entity(raw: &str) -> Result<EntityKind, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "products" | "product" => Ok(EntityKind::Product),
        "orders" | "order" => Ok(EntityKind::Order),
        _ => Err(format!("unknown entity: {raw}")),
    }
}

pub async fn run(cache: &CacheStore, action: CacheAction) -> Result<(), CliError> {
    match action {
        CacheAction::Clear => {
            cache.clear().await;
            print_json(&json!({ "cleared": true, "backend": cache.backend().to_string() }))?;
        }
        CacheAction::Invalidate { entity } => {
            let prefix = CacheKey::list_prefix(entity);
            cache.delete_prefix(&prefix).await;
            print_json(&json!({ "invalidated": prefix }))?;
        }
    }
    Ok(())
}
