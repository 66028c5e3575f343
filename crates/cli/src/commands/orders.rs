//! Order commands.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use marigold_core::{FinancialStatus, OrderCreateInput, OrderFilters, OrderStatus, OrderUpdateInput};
use marigold_gateway::OrderService;

use super::{CliError, PageArgs, print_page};
use crate::output::print_json;

#[derive(Subcommand)]
pub enum OrderAction {
    /// List orders, newest first
    List {
        #[command(flatten)]
        paging: PageArgs,

        /// Buyer email to match
        #[arg(long)]
        email: Option<String>,

        /// Platform financial status, e.g. `paid` or `partially_refunded`
        #[arg(long, value_parser = parse_financial_status)]
        financial_status: Option<FinancialStatus>,

        /// Free-text search
        #[arg(long)]
        search: Option<String>,
    },
    /// Fetch one order
    Get { id: String },
    /// Create an order from a JSON document
    Create {
        /// Path to the order JSON, or `-` for stdin
        #[arg(long)]
        input: PathBuf,
    },
    /// Update an order's note, email or status
    Update {
        id: String,

        #[arg(long)]
        note: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Set an order's status
    Status { id: String, status: OrderStatus },
    /// Delete an order
    Delete { id: String },
}

fn parse_financial_status(raw: &str) -> Result<FinancialStatus, String> {
    FinancialStatus::from_platform(raw).ok_or_else(|| format!("unknown financial status: {raw}"))
}

fn read_create_input(path: &Path) -> Result<OrderCreateInput, CliError> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}

pub async fn run(service: &OrderService, action: OrderAction) -> Result<(), CliError> {
    match action {
        OrderAction::List {
            paging,
            email,
            financial_status,
            search,
        } => {
            let filters = OrderFilters {
                buyer_email: email,
                financial_status,
                search,
            };
            print_page(service.find_all(paging.page, paging.limit, &filters).await?)
        }
        OrderAction::Get { id } => {
            let order = service.find_one(&id).await?.into_result()?;
            Ok(print_json(&order)?)
        }
        OrderAction::Create { input } => {
            let input = read_create_input(&input)?;
            Ok(print_json(&service.create(&input).await?)?)
        }
        OrderAction::Update {
            id,
            note,
            email,
            status,
        } => {
            let input = OrderUpdateInput {
                status,
                note,
                email,
                shipping_address: None,
            };
            Ok(print_json(&service.update(&id, &input).await?)?)
        }
        OrderAction::Status { id, status } => {
            Ok(print_json(&service.update_status(&id, status).await?)?)
        }
        OrderAction::Delete { id } => Ok(print_json(&service.delete(&id).await?)?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_financial_status() {
        assert_eq!(
            parse_financial_status("partially_refunded").unwrap(),
            FinancialStatus::PartiallyRefunded
        );
        assert_eq!(parse_financial_status("PAID").unwrap(), FinancialStatus::Paid);
        assert!(parse_financial_status("settled").is_err());
    }

    #[test]
    fn test_read_create_input_rejects_malformed_json() {
        let path = std::env::temp_dir().join(format!("mg-order-{}.json", std::process::id()));
        std::fs::write(&path, "{\"buyer\": 1}").unwrap();
        let err = read_create_input(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, CliError::Input(_)));
    }
}
