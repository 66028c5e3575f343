//! Marigold CLI - run gateway operations from a shell.
//!
//! # Usage
//!
//! ```bash
//! # List the second page of active products
//! mg products list --page 2 --limit 20 --status active
//!
//! # Fetch one order by numeric id or global id
//! mg orders get 1001
//!
//! # Create an order from a JSON file (or `-` for stdin)
//! mg orders create --input order.json
//!
//! # Drop every cached entry
//! mg cache clear
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::Parser;
use marigold_gateway::{Gateway, GatewayConfig};

mod commands;
mod output;
mod telemetry;

use commands::{CliError, Command};

#[derive(Parser)]
#[command(name = "mg")]
#[command(author, version, about = "Marigold commerce gateway CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Sentry first so the tracing layer has a client to report to
    let _sentry_guard = telemetry::init_sentry(&telemetry::SentryConfig::from_env());
    telemetry::init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = GatewayConfig::from_env()?;
    let gateway = Gateway::connect(config)?;
    commands::dispatch(&gateway, cli.command).await
}
