//! Cache-aside store with remote/local fallback.
//!
//! Reads and writes go to the remote backend while it reports ready. Any
//! remote failure, or a remote that is not ready, falls back to the
//! in-process backend with the same semantics. Callers never see backend
//! errors; fallback is logged at `warn`.
//!
//! Values are stored as JSON. Keys are namespaced with the configured prefix
//! so `clear` only touches this gateway's entries on a shared Redis.

mod local;
mod remote;

pub use local::LocalCache;
pub use remote::{ConnectionState, RedisCache, RemoteCache};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use marigold_core::EntityKind;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CacheConfig;

/// Backend failures. Only surfaced by [`RemoteCache`] implementations and
/// construction; [`CacheStore`] absorbs them.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend not ready")]
    Unavailable,

    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Which backend served (or would serve) the next operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Remote,
    Local,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => f.write_str("remote"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Structured cache key for gateway records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// One window of a listing.
    List {
        entity: EntityKind,
        page: u32,
        limit: u32,
        /// Canonical JSON of the filters.
        filters: String,
    },
    /// A single record by global id.
    Item { entity: EntityKind, id: String },
}

impl CacheKey {
    pub fn list<F: Serialize>(entity: EntityKind, page: u32, limit: u32, filters: &F) -> Self {
        Self::List {
            entity,
            page,
            limit,
            filters: serde_json::to_string(filters).unwrap_or_default(),
        }
    }

    pub fn item(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::Item {
            entity,
            id: id.into(),
        }
    }

    /// Prefix shared by every list key of `entity`.
    #[must_use]
    pub fn list_prefix(entity: EntityKind) -> String {
        format!("{}:list:", entity.collection())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List {
                entity,
                page,
                limit,
                filters,
            } => write!(
                f,
                "{}{page}:{limit}:{filters}",
                Self::list_prefix(*entity)
            ),
            Self::Item { entity, id } => write!(f, "{}:item:{id}", entity.collection()),
        }
    }
}

/// Cache-aside store shared by all services.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<CacheStoreInner>,
}

struct CacheStoreInner {
    remote: Option<Arc<dyn RemoteCache>>,
    local: LocalCache,
    namespace: String,
}

impl CacheStore {
    /// A store with only the in-process backend.
    #[must_use]
    pub fn local_only(config: &CacheConfig) -> Self {
        Self::build(config, None)
    }

    /// A store backed by `remote`, falling back to the in-process backend.
    #[must_use]
    pub fn with_remote(config: &CacheConfig, remote: Arc<dyn RemoteCache>) -> Self {
        Self::build(config, Some(remote))
    }

    /// Build from configuration: Redis when `REDIS_URL` is set, local otherwise.
    ///
    /// Must be called inside a Tokio runtime (the Redis supervisor is spawned).
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the Redis URL is malformed.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        match &config.redis_url {
            Some(url) => {
                let redis = RedisCache::connect(url.expose_secret(), config.reconnect)?;
                Ok(Self::with_remote(config, Arc::new(redis)))
            }
            None => Ok(Self::local_only(config)),
        }
    }

    fn build(config: &CacheConfig, remote: Option<Arc<dyn RemoteCache>>) -> Self {
        Self {
            inner: Arc::new(CacheStoreInner {
                remote,
                local: LocalCache::new(config.local_capacity),
                namespace: config.key_prefix.clone(),
            }),
        }
    }

    /// The backend the next operation will try first.
    #[must_use]
    pub fn backend(&self) -> Backend {
        if self.ready_remote().is_some() {
            Backend::Remote
        } else {
            Backend::Local
        }
    }

    fn ready_remote(&self) -> Option<&Arc<dyn RemoteCache>> {
        self.inner.remote.as_ref().filter(|r| r.is_ready())
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{key}", self.inner.namespace)
    }

    /// Look up `key`. Missing, expired, or undecodable entries are `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let key = self.namespaced(key);

        let raw = match self.ready_remote() {
            Some(remote) => match remote.get(&key).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, key = %key, "Remote cache get failed, using local");
                    self.inner.local.get(&key).await
                }
            },
            None => self.inner.local.get(&key).await,
        }?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, key = %key, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store `value` under `key`. `None` TTL means no expiry.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let key = self.namespaced(key);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, key = %key, "Value not serializable, skipping cache write");
                return;
            }
        };

        if let Some(remote) = self.ready_remote() {
            match remote.set(&key, &raw, ttl).await {
                Ok(()) => return,
                Err(e) => warn!(error = %e, key = %key, "Remote cache set failed, using local"),
            }
        }
        self.inner.local.set(&key, &raw, ttl).await;
    }

    /// Remove `key` from both backends.
    pub async fn delete(&self, key: &str) {
        let key = self.namespaced(key);
        if let Some(remote) = self.ready_remote()
            && let Err(e) = remote.delete(&key).await
        {
            warn!(error = %e, key = %key, "Remote cache delete failed");
        }
        self.inner.local.delete(&key).await;
    }

    /// Remove every key starting with `prefix` from both backends.
    pub async fn delete_prefix(&self, prefix: &str) {
        let prefix = self.namespaced(prefix);
        if let Some(remote) = self.ready_remote()
            && let Err(e) = remote.delete_prefix(&prefix).await
        {
            warn!(error = %e, prefix = %prefix, "Remote cache prefix delete failed");
        }
        let removed = self.inner.local.delete_prefix(&prefix).await;
        debug!(prefix = %prefix, removed, "Local cache prefix deleted");
    }

    /// Remove every entry in this store's namespace.
    pub async fn clear(&self) {
        if let Some(remote) = self.ready_remote()
            && let Err(e) = remote.delete_prefix(&self.inner.namespace).await
        {
            warn!(error = %e, "Remote cache clear failed");
        }
        self.inner.local.clear().await;
    }
}
