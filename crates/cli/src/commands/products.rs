//! Product commands.

use clap::{Args, Subcommand};
use marigold_core::{ProductFilters, ProductInput, ProductStatus};
use marigold_gateway::ProductService;
use rust_decimal::Decimal;

use super::{CliError, PageArgs, print_page};
use crate::output::print_json;

#[derive(Subcommand)]
pub enum ProductAction {
    /// List products, newest first
    List {
        #[command(flatten)]
        paging: PageArgs,

        /// Product type to match
        #[arg(long)]
        category: Option<String>,

        /// `active`, `pending` or `inactive`
        #[arg(long)]
        status: Option<ProductStatus>,

        /// Free-text search
        #[arg(long)]
        search: Option<String>,
    },
    /// Fetch one product
    Get { id: String },
    /// Create a product
    Create {
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Update a product; only the given fields change
    Update {
        id: String,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    Delete { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProductFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub status: Option<ProductStatus>,

    /// Price of the default variant
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Repeat for several tags
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

impl From<ProductFields> for ProductInput {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            category: fields.category,
            status: fields.status,
            price: fields.price,
            tags: (!fields.tags.is_empty()).then_some(fields.tags),
        }
    }
}

pub async fn run(service: &ProductService, action: ProductAction) -> Result<(), CliError> {
    match action {
        ProductAction::List {
            paging,
            category,
            status,
            search,
        } => {
            let filters = ProductFilters {
                category,
                status,
                search,
            };
            print_page(service.find_all(paging.page, paging.limit, &filters).await?)
        }
        ProductAction::Get { id } => {
            let product = service.find_one(&id).await?.into_result()?;
            Ok(print_json(&product)?)
        }
        ProductAction::Create { fields } => {
            let product = service.create(&fields.into()).await?;
            Ok(print_json(&product)?)
        }
        ProductAction::Update { id, fields } => {
            let product = service.update(&id, &fields.into()).await?;
            Ok(print_json(&product)?)
        }
        ProductAction::Delete { id } => Ok(print_json(&service.delete(&id).await?)?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_fields_without_tags_leave_tags_unset() {
        let input = ProductInput::from(ProductFields {
            price: Some(Decimal::from_str("12.50").unwrap()),
            ..ProductFields::default()
        });
        assert_eq!(input.tags, None);
        assert_eq!(input.price, Some(Decimal::new(1250, 2)));
    }

    #[test]
    fn test_fields_with_tags() {
        let input = ProductInput::from(ProductFields {
            tags: vec!["summer".to_string(), "sale".to_string()],
            ..ProductFields::default()
        });
        assert_eq!(
            input.tags,
            Some(vec!["summer".to_string(), "sale".to_string()])
        );
    }
}
