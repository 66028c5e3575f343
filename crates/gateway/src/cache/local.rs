//! In-process cache backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;

#[derive(Debug, Clone)]
struct LocalEntry {
    value: Arc<str>,
    /// `None` means the entry never expires.
    expires_at: Option<Instant>,
}

impl LocalEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Per-entry expiry: each entry lives for the TTL it was written with.
struct EntryExpiry;

impl Expiry<String, LocalEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &LocalEntry,
        created_at: Instant,
    ) -> Option<Duration> {
        value
            .expires_at
            .map(|at| at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &LocalEntry,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value
            .expires_at
            .map(|at| at.saturating_duration_since(updated_at))
    }
}

/// `moka` map of serialized values with per-entry TTL.
#[derive(Clone)]
pub struct LocalCache {
    entries: Cache<String, LocalEntry>,
}

impl LocalCache {
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .expire_after(EntryExpiry)
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let entry = self.entries.get(key).await?;
        if entry.is_expired(Instant::now()) {
            self.entries.invalidate(key).await;
            return None;
        }
        Some(entry.value.to_string())
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let entry = LocalEntry {
            value: Arc::from(value),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.insert(key.to_string(), entry).await;
    }

    pub async fn delete(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    /// Remove every key starting with `prefix`. Returns how many were removed.
    pub async fn delete_prefix(&self, prefix: &str) -> u64 {
        let matching: Vec<Arc<String>> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key)
            .collect();

        let mut removed = 0;
        for key in matching {
            if self.entries.remove(key.as_str()).await.is_some() {
                removed += 1;
            }
        }
        removed
    }

    pub async fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
    }
}
