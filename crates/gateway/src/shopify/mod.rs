//! Shopify GraphQL transport.
//!
//! # Architecture
//!
//! - One request/response cycle per attempt, bounded by a hard timeout
//! - Timeouts and network failures are retried with exponential backoff;
//!   everything else propagates immediately
//! - Cost-based throttling is read from `extensions.cost.throttleStatus`
//! - No caching or mapping happens here (see `cache` and `mapper`)
//!
//! # Example
//!
//! ```rust,ignore
//! use marigold_gateway::shopify::{ApiSurface, ShopifyClient};
//!
//! let client = ShopifyClient::new(ApiSurface::Admin, &config.shopify, &config.http);
//! let data = client
//!     .execute("query { shop { name } }", serde_json::json!({}))
//!     .await?;
//! ```

mod http;
pub mod queries;
mod throttle;
mod transport;
pub mod types;

pub use http::{HttpRequest, HttpResponse, HttpSend, ReqwestSender};
pub use throttle::RateLimitStatus;
pub use transport::{ApiSurface, RetryPolicy, ShopifyClient};

use std::time::Duration;

use marigold_core::{EntityKind, InputError};
use thiserror::Error;

/// Errors that can occur when interacting with the Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Shop domain or access token is missing.
    #[error("Shopify is not configured: missing {0}")]
    NotConfigured(&'static str),

    /// A single attempt exceeded the transport timeout.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Connection-level failure before a response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status (other than 429).
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// Input rejected before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// A by-id lookup returned no entity.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type that was looked up.
        entity: EntityKind,
        /// Id that was looked up.
        id: String,
    },
}

/// Coarse classification of [`ShopifyError`] for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials are absent. Fatal, never retried.
    Configuration,
    /// The platform (or the path to it) failed the request.
    Api,
    /// Back off for at least `retry_after` seconds.
    RateLimit,
    /// The requested entity does not exist.
    NotFound,
}

impl ShopifyError {
    /// Which taxonomy bucket this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured(_) => ErrorKind::Configuration,
            Self::RateLimited(_) => ErrorKind::RateLimit,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Timeout(_)
            | Self::Network(_)
            | Self::Http { .. }
            | Self::GraphQL(_)
            | Self::Parse(_)
            | Self::UserError(_)
            | Self::InvalidInput(_) => ErrorKind::Api,
        }
    }

    /// Whether the transport may retry the attempt that produced this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }

    /// Seconds to wait before retrying, for rate-limit errors.
    #[must_use]
    pub const fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited(secs) => Some(*secs),
            _ => None,
        }
    }

    pub(crate) fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn no_data(context: &str) -> Self {
        Self::GraphQL(vec![GraphQLError::message(context)])
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// `extensions.code`, e.g. `THROTTLED` or `ACCESS_DENIED`.
    pub code: Option<String>,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// An error carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            locations: vec![],
            path: vec![],
        }
    }

    /// Whether this error signals cost-based throttling.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("THROTTLED"))
            || self.message.to_ascii_lowercase().contains("throttled")
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if let Some(code) = &e.code {
                parts.push(format!("[{code}]"));
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
