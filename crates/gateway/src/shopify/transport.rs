//! Shopify GraphQL client implementation.
//!
//! Sends hand-written documents over the `HttpSend` seam and decodes the
//! envelope with `graphql_client::Response`. Owns timeout, retry and
//! rate-limit handling; knows nothing about caching or domain records.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use graphql_client::{PathFragment, Response};
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::config::{HttpConfig, ShopifyConfig};

use super::http::{HttpRequest, HttpSend, ReqwestSender};
use super::throttle::RateLimitStatus;
use super::{GraphQLError, GraphQLErrorLocation, ShopifyError};

/// Maximum body length kept in logs and `Http` errors.
const BODY_PREVIEW_CHARS: usize = 500;

/// Which Shopify GraphQL API a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSurface {
    /// `https://{shop}/admin/api/{version}/graphql.json`
    Admin,
    /// `https://{shop}/api/{version}/graphql.json`
    Storefront,
}

impl ApiSurface {
    fn path(self, api_version: &str) -> String {
        match self {
            Self::Admin => format!("admin/api/{api_version}/graphql.json"),
            Self::Storefront => format!("api/{api_version}/graphql.json"),
        }
    }

    const fn token_header(self) -> &'static str {
        match self {
            Self::Admin => "X-Shopify-Access-Token",
            Self::Storefront => "X-Shopify-Storefront-Access-Token",
        }
    }

    /// Only the Admin API reports cost-based throttle status.
    const fn reports_cost(self) -> bool {
        matches!(self, Self::Admin)
    }

    fn token(self, config: &ShopifyConfig) -> Result<&str, ShopifyError> {
        match self {
            Self::Admin => config
                .admin_token()
                .ok_or(ShopifyError::NotConfigured("admin access token")),
            Self::Storefront => config
                .storefront_token()
                .ok_or(ShopifyError::NotConfigured("storefront access token")),
        }
    }
}

impl fmt::Display for ApiSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Storefront => f.write_str("storefront"),
        }
    }
}

/// Exponential backoff for retryable transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub factor: u32,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): `base * factor^retry`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let multiplier = self.factor.max(1).saturating_pow(retry);
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(Duration::MAX)
    }
}

impl From<&HttpConfig> for RetryPolicy {
    fn from(config: &HttpConfig) -> Self {
        Self {
            max_retries: config.retries,
            base_delay: config.retry_base_delay,
            factor: config.retry_factor,
        }
    }
}

/// Client for one Shopify GraphQL API surface.
///
/// Cheap to clone; all clones share the sender and configuration.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    surface: ApiSurface,
    config: ShopifyConfig,
    sender: Arc<dyn HttpSend>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ShopifyClient {
    /// Create a client backed by `reqwest`.
    #[must_use]
    pub fn new(surface: ApiSurface, shopify: &ShopifyConfig, http: &HttpConfig) -> Self {
        Self::with_sender(surface, shopify, http, Arc::new(ReqwestSender::default()))
    }

    /// Create a client with a custom HTTP sender.
    #[must_use]
    pub fn with_sender(
        surface: ApiSurface,
        shopify: &ShopifyConfig,
        http: &HttpConfig,
        sender: Arc<dyn HttpSend>,
    ) -> Self {
        Self {
            inner: Arc::new(ShopifyClientInner {
                surface,
                config: shopify.clone(),
                sender,
                timeout: http.timeout,
                retry: RetryPolicy::from(http),
            }),
        }
    }

    #[must_use]
    pub fn surface(&self) -> ApiSurface {
        self.inner.surface
    }

    /// Whether shop domain and the surface's token are both present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.endpoint().is_ok()
    }

    /// Resolve the endpoint URL and auth header, or fail with `NotConfigured`.
    fn endpoint(&self) -> Result<(String, (&'static str, String)), ShopifyError> {
        let surface = self.inner.surface;
        let base = self
            .inner
            .config
            .base_url()
            .ok_or(ShopifyError::NotConfigured("shop domain"))?;
        let token = surface.token(&self.inner.config)?;
        let url = base
            .join(&surface.path(&self.inner.config.api_version))
            .map_err(|_| ShopifyError::NotConfigured("valid shop domain"))?;
        Ok((url.to_string(), (surface.token_header(), token.to_string())))
    }

    /// Execute a GraphQL document and return the raw `data` object.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` before any I/O if credentials are missing
    /// - `Timeout`/`Network` once retries are exhausted
    /// - `RateLimited` when the throttle bucket is empty or the platform
    ///   reports throttling
    /// - `Http`, `GraphQL`, `Parse` for non-retryable failures
    pub async fn execute(
        &self,
        document: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, ShopifyError> {
        let (url, auth) = self.endpoint()?;
        let operation = operation_name(document);
        let span = info_span!(
            "shopify_request",
            surface = %self.inner.surface,
            operation,
            request_id = %Uuid::new_v4(),
        );

        let request = HttpRequest {
            url,
            headers: vec![auth, ("Content-Type", "application/json".to_string())],
            body: serde_json::json!({
                "query": document,
                "variables": variables,
            }),
        };

        self.execute_with_retry(&request).instrument(span).await
    }

    /// Execute a GraphQL document and deserialize `data` into `T`.
    ///
    /// # Errors
    ///
    /// As [`ShopifyClient::execute`], plus `Parse` if `data` does not match `T`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        document: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let data = self.execute(document, variables).await?;
        serde_json::from_value(data).map_err(|e| {
            error!(error = %e, operation = operation_name(document), "Unexpected Shopify data shape");
            ShopifyError::Parse(e)
        })
    }

    async fn execute_with_retry(
        &self,
        request: &HttpRequest,
    ) -> Result<serde_json::Value, ShopifyError> {
        let retry = self.inner.retry;
        let mut retries_used = 0;

        loop {
            match self.attempt(request).await {
                Err(err) if err.is_retryable() && retries_used < retry.max_retries => {
                    let delay = retry.delay_for(retries_used);
                    retries_used += 1;
                    warn!(
                        error = %err,
                        attempt = retries_used,
                        max_retries = retry.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Retrying Shopify request"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    /// One HTTP round trip, cancelled when the timeout elapses.
    async fn attempt(&self, request: &HttpRequest) -> Result<serde_json::Value, ShopifyError> {
        let timeout = self.inner.timeout;
        let response = tokio::time::timeout(timeout, self.inner.sender.post(request))
            .await
            .map_err(|_| ShopifyError::Timeout(timeout))??;

        if response.status == 429 {
            let retry_after = response.retry_after.unwrap_or(1);
            warn!(retry_after, "Shopify returned 429");
            return Err(ShopifyError::RateLimited(retry_after));
        }

        if !response.is_success() {
            let preview = preview(&response.body);
            error!(
                status = response.status,
                body = %preview,
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Http {
                status: response.status,
                body: preview,
            });
        }

        let envelope: Response<serde_json::Value> = serde_json::from_str(&response.body)
            .map_err(|e| {
                error!(
                    error = %e,
                    body = %preview(&response.body),
                    "Failed to parse Shopify GraphQL response"
                );
                ShopifyError::Parse(e)
            })?;

        interpret(self.inner.surface, envelope)
    }
}

/// Turn a decoded envelope into data or a classified error.
fn interpret(
    surface: ApiSurface,
    envelope: Response<serde_json::Value>,
) -> Result<serde_json::Value, ShopifyError> {
    let throttle = if surface.reports_cost() {
        envelope
            .extensions
            .as_ref()
            .and_then(RateLimitStatus::from_extensions)
    } else {
        None
    };

    if let Some(status) = throttle {
        if status.is_exhausted() {
            let retry_after = status.retry_after_secs();
            warn!(retry_after, "Shopify throttle bucket exhausted");
            return Err(ShopifyError::RateLimited(retry_after));
        }
        if status.is_low() {
            warn!(
                currently_available = status.currently_available,
                maximum_available = status.maximum_available,
                "Shopify query budget running low"
            );
        }
    }

    if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
        debug!(errors = ?errors, "GraphQL errors in response");
        let errors: Vec<GraphQLError> = errors.into_iter().map(convert_error).collect();

        if errors.iter().any(GraphQLError::is_throttled) {
            let retry_after = throttle.map_or(1, |s| s.retry_after_secs());
            warn!(retry_after, "Shopify reported throttling");
            return Err(ShopifyError::RateLimited(retry_after));
        }

        return Err(ShopifyError::GraphQL(errors));
    }

    match envelope.data {
        Some(data) if !data.is_null() => Ok(data),
        _ => {
            error!("Shopify GraphQL response has no data and no errors");
            Err(ShopifyError::no_data("No data in response"))
        }
    }
}

fn convert_error(e: graphql_client::Error) -> GraphQLError {
    let code = e
        .extensions
        .as_ref()
        .and_then(|ext| ext.get("code"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    GraphQLError {
        message: e.message,
        code,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    PathFragment::Key(s) => serde_json::Value::String(s),
                    PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

/// Operation name of a document (`query Products(...)` → `Products`), for logs.
fn operation_name(document: &str) -> &str {
    let mut words = document
        .split(|c: char| c.is_whitespace() || c == '(' || c == '{')
        .filter(|w| !w.is_empty());
    match words.next() {
        Some("query" | "mutation") => words.next().unwrap_or("anonymous"),
        _ => "anonymous",
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
