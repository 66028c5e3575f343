//! Subcommands and their shared error type.

pub mod cache;
pub mod orders;
pub mod products;

use clap::{Args, Subcommand};
use marigold_gateway::cache::CacheError;
use marigold_gateway::{ConfigError, ErrorKind, Gateway, Page, ShopifyError};
use thiserror::Error;

use crate::output::print_json;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    #[error("Invalid input file: {0}")]
    Input(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code: 2 configuration, 3 not found, 4 rate limited, 1 otherwise.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Shopify(e) => match e.kind() {
                ErrorKind::Configuration => 2,
                ErrorKind::NotFound => 3,
                ErrorKind::RateLimit => 4,
                ErrorKind::Api => 1,
            },
            Self::Cache(_) | Self::Input(_) | Self::Io(_) => 1,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Product operations
    Products {
        #[command(subcommand)]
        action: products::ProductAction,
    },
    /// Order operations
    Orders {
        #[command(subcommand)]
        action: orders::OrderAction,
    },
    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        action: cache::CacheAction,
    },
}

/// Paging flags shared by the list commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page (max 250)
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

pub async fn dispatch(gateway: &Gateway, command: Command) -> Result<(), CliError> {
    match command {
        Command::Products { action } => products::run(gateway.products(), action).await,
        Command::Orders { action } => orders::run(gateway.orders(), action).await,
        Command::Cache { action } => cache::run(gateway.cache(), action).await,
    }
}

/// Print a listing; an unconfigured shop prints an empty array.
fn print_page<T: serde::Serialize>(page: Page<T>) -> Result<(), CliError> {
    if matches!(page, Page::NotConfigured) {
        tracing::warn!("Shopify credentials are not configured; listing is empty");
    }
    print_json(&page.into_items())?;
    Ok(())
}
