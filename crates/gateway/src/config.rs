//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Shopify (all optional; checked lazily per call)
//! - `SHOPIFY_SHOP_DOMAIN` - Shop domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ADMIN_ACCESS_TOKEN` - Admin API access token
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API access token
//! - `SHOPIFY_API_VERSION` - API version (default: 2024-01)
//! - `SHOPIFY_ENDPOINT_OVERRIDE` - Base URL replacing `https://{shop domain}`
//!
//! ## HTTP
//! - `SHOPIFY_HTTP_TIMEOUT_MS` - Per-attempt timeout (default: 8000)
//! - `SHOPIFY_HTTP_RETRIES` - Retries after a timeout/network failure (default: 2)
//! - `SHOPIFY_RETRY_BASE_MS` - First backoff delay (default: 100)
//! - `SHOPIFY_RETRY_FACTOR` - Backoff multiplier (default: 2)
//!
//! ## Cache
//! - `REDIS_URL` - Remote cache; local-only when absent
//! - `CACHE_RECONNECT_MAX_ATTEMPTS` - Reconnect attempts before giving up (default: 10)
//! - `CACHE_RECONNECT_MAX_DELAY_MS` - Cap on a single reconnect delay (default: 2000)
//! - `CACHE_LIST_TTL_SECS` - TTL for list pages (default: 60)
//! - `CACHE_ITEM_TTL_SECS` - TTL for single records (default: 300)
//! - `CACHE_KEY_PREFIX` - Key namespace (default: `marigold:`)
//! - `CACHE_LOCAL_CAPACITY` - Max entries in the in-process cache (default: 10000)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_VERSION: &str = "2024-01";
pub const DEFAULT_TIMEOUT_MS: u64 = 8000;
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_MS: u64 = 100;
pub const DEFAULT_RETRY_FACTOR: u32 = 2;
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 10;
pub const DEFAULT_RECONNECT_BASE_MS: u64 = 50;
pub const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 2000;
pub const DEFAULT_LIST_TTL_SECS: u64 = 60;
pub const DEFAULT_ITEM_TTL_SECS: u64 = 300;
pub const DEFAULT_KEY_PREFIX: &str = "marigold:";
pub const DEFAULT_LOCAL_CAPACITY: u64 = 10_000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub shopify: ShopifyConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
}

/// Shopify connection settings.
///
/// Implements `Debug` manually to redact tokens.
#[derive(Clone)]
pub struct ShopifyConfig {
    pub shop_domain: Option<String>,
    pub admin_access_token: Option<SecretString>,
    pub storefront_access_token: Option<SecretString>,
    pub api_version: String,
    /// Replaces `https://{shop_domain}` when set (proxies, local fakes).
    pub endpoint_override: Option<Url>,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            shop_domain: None,
            admin_access_token: None,
            storefront_access_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            endpoint_override: None,
        }
    }
}

impl fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &Option<SecretString>| s.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ShopifyConfig")
            .field("shop_domain", &self.shop_domain)
            .field("admin_access_token", &redact(&self.admin_access_token))
            .field(
                "storefront_access_token",
                &redact(&self.storefront_access_token),
            )
            .field("api_version", &self.api_version)
            .field("endpoint_override", &self.endpoint_override)
            .finish()
    }
}

impl ShopifyConfig {
    /// Base URL requests are sent to, if a shop domain (or override) is set.
    #[must_use]
    pub fn base_url(&self) -> Option<Url> {
        if let Some(url) = &self.endpoint_override {
            return Some(url.clone());
        }
        let domain = self.shop_domain.as_deref()?.trim().trim_end_matches('/');
        if domain.is_empty() {
            return None;
        }
        Url::parse(&format!("https://{domain}/")).ok()
    }

    /// The admin token, if present and non-blank.
    #[must_use]
    pub fn admin_token(&self) -> Option<&str> {
        non_blank_secret(self.admin_access_token.as_ref())
    }

    /// The storefront token, if present and non-blank.
    #[must_use]
    pub fn storefront_token(&self) -> Option<&str> {
        non_blank_secret(self.storefront_access_token.as_ref())
    }
}

fn non_blank_secret(secret: Option<&SecretString>) -> Option<&str> {
    secret
        .map(|s| s.expose_secret())
        .filter(|s| !s.trim().is_empty())
}

/// HTTP timeout and retry settings for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub retries: u32,
    pub retry_base_delay: Duration,
    pub retry_factor: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retries: DEFAULT_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
            retry_factor: DEFAULT_RETRY_FACTOR,
        }
    }
}

/// Reconnect policy for the remote cache connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RECONNECT_BASE_MS),
            max_delay: Duration::from_millis(DEFAULT_RECONNECT_MAX_DELAY_MS),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (0-based), doubling and capped.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Cache settings.
#[derive(Clone)]
pub struct CacheConfig {
    pub redis_url: Option<SecretString>,
    pub reconnect: ReconnectPolicy,
    pub list_ttl: Duration,
    pub item_ttl: Duration,
    pub key_prefix: String,
    pub local_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            reconnect: ReconnectPolicy::default(),
            list_ttl: Duration::from_secs(DEFAULT_LIST_TTL_SECS),
            item_ttl: Duration::from_secs(DEFAULT_ITEM_TTL_SECS),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            local_capacity: DEFAULT_LOCAL_CAPACITY,
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("reconnect", &self.reconnect)
            .field("list_ttl", &self.list_ttl)
            .field("item_ttl", &self.item_ttl)
            .field("key_prefix", &self.key_prefix)
            .field("local_capacity", &self.local_capacity)
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present. Missing
    /// Shopify credentials are not an error here; operations check for them
    /// when they run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let endpoint_override = env
            .optional("SHOPIFY_ENDPOINT_OVERRIDE")
            .map(|raw| parse_base_url("SHOPIFY_ENDPOINT_OVERRIDE", &raw))
            .transpose()?;

        let shopify = ShopifyConfig {
            shop_domain: env.optional("SHOPIFY_SHOP_DOMAIN"),
            admin_access_token: env.optional("SHOPIFY_ADMIN_ACCESS_TOKEN").map(SecretString::from),
            storefront_access_token: env
                .optional("SHOPIFY_STOREFRONT_ACCESS_TOKEN")
                .map(SecretString::from),
            api_version: env.or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            endpoint_override,
        };

        let http = HttpConfig {
            timeout: Duration::from_millis(
                env.parsed("SHOPIFY_HTTP_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            ),
            retries: env.parsed("SHOPIFY_HTTP_RETRIES", DEFAULT_RETRIES)?,
            retry_base_delay: Duration::from_millis(
                env.parsed("SHOPIFY_RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS)?,
            ),
            retry_factor: env.parsed("SHOPIFY_RETRY_FACTOR", DEFAULT_RETRY_FACTOR)?,
        };

        let cache = CacheConfig {
            redis_url: env.optional("REDIS_URL").map(SecretString::from),
            reconnect: ReconnectPolicy {
                max_attempts: env
                    .parsed("CACHE_RECONNECT_MAX_ATTEMPTS", DEFAULT_RECONNECT_ATTEMPTS)?,
                base_delay: Duration::from_millis(DEFAULT_RECONNECT_BASE_MS),
                max_delay: Duration::from_millis(
                    env.parsed("CACHE_RECONNECT_MAX_DELAY_MS", DEFAULT_RECONNECT_MAX_DELAY_MS)?,
                ),
            },
            list_ttl: Duration::from_secs(env.parsed("CACHE_LIST_TTL_SECS", DEFAULT_LIST_TTL_SECS)?),
            item_ttl: Duration::from_secs(env.parsed("CACHE_ITEM_TTL_SECS", DEFAULT_ITEM_TTL_SECS)?),
            key_prefix: env.or_default("CACHE_KEY_PREFIX", DEFAULT_KEY_PREFIX),
            local_capacity: env.parsed("CACHE_LOCAL_CAPACITY", DEFAULT_LOCAL_CAPACITY)?,
        };

        Ok(Self {
            shopify,
            http,
            cache,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank values count as absent.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when absent.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse a base URL and make sure its path ends with `/` so joins append.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
