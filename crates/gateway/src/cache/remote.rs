//! Remote cache backend (Redis).
//!
//! The connection is owned by a supervisor task that (re)connects with capped
//! exponential backoff. Commands are only issued while the state is
//! [`ConnectionState::Ready`]; a failed command hands the connection back to
//! the supervisor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::CacheError;
use crate::config::ReconnectPolicy;

/// Upper bound on a single Redis command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Keys fetched per `SCAN` round trip during prefix deletion.
const SCAN_BATCH: u32 = 500;

/// A key/value backend reachable over the network.
///
/// Values are opaque strings; serialization happens in [`super::CacheStore`].
#[async_trait]
pub trait RemoteCache: Send + Sync {
    /// Whether commands may be issued right now.
    fn is_ready(&self) -> bool;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key starting with `prefix`, returning how many went.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Ready = 1,
    /// Reconnect attempts ran out; waiting for [`RedisCache::restart`].
    Exhausted = 2,
}

impl ConnectionState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Ready,
            2 => Self::Exhausted,
            _ => Self::Connecting,
        }
    }
}

struct Shared {
    client: redis::Client,
    policy: ReconnectPolicy,
    connection: RwLock<Option<MultiplexedConnection>>,
    state: AtomicU8,
    wake: Notify,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Ready → Connecting, and wake the supervisor.
    fn mark_failed(&self) {
        if self
            .state
            .compare_exchange(
                ConnectionState::Ready as u8,
                ConnectionState::Connecting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            warn!("Redis connection lost, reconnecting");
            self.wake.notify_one();
        }
    }
}

/// Redis-backed [`RemoteCache`] with a background reconnect supervisor.
pub struct RedisCache {
    shared: Arc<Shared>,
    supervisor: JoinHandle<()>,
}

impl RedisCache {
    /// Validate `url` and start connecting in the background.
    ///
    /// Returns immediately; until the first connection succeeds the cache
    /// reports not ready.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the URL cannot be parsed.
    pub fn connect(url: &str, policy: ReconnectPolicy) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Backend(e.to_string()))?;
        let shared = Arc::new(Shared {
            client,
            policy,
            connection: RwLock::new(None),
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            wake: Notify::new(),
        });
        let supervisor = tokio::spawn(supervise(Arc::clone(&shared)));
        Ok(Self { shared, supervisor })
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Start a fresh round of reconnect attempts after exhaustion.
    pub fn restart(&self) {
        if self.shared.state() == ConnectionState::Exhausted {
            info!("Restarting Redis reconnect attempts");
            self.shared.set_state(ConnectionState::Connecting);
            self.shared.wake.notify_one();
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        if self.shared.state() != ConnectionState::Ready {
            return Err(CacheError::Unavailable);
        }
        self.shared
            .connection
            .read()
            .await
            .clone()
            .ok_or(CacheError::Unavailable)
    }

    /// Run one command, translating connection failures into a state change.
    async fn run<T, F, Fut>(&self, command: F) -> Result<T, CacheError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut + Send,
        Fut: Future<Output = redis::RedisResult<T>> + Send,
    {
        let connection = self.connection().await?;
        match tokio::time::timeout(COMMAND_TIMEOUT, command(connection)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
                    self.shared.mark_failed();
                }
                Err(CacheError::Backend(e.to_string()))
            }
            Err(_) => {
                self.shared.mark_failed();
                Err(CacheError::Backend("command timed out".to_string()))
            }
        }
    }
}

impl Drop for RedisCache {
    fn drop(&mut self) {
        self.supervisor.abort();
    }
}

#[async_trait]
impl RemoteCache for RedisCache {
    fn is_ready(&self) -> bool {
        self.shared.state() == ConnectionState::Ready
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.run(|mut conn| async move {
            let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.run(|mut conn| async move {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value);
            if let Some(ttl) = ttl {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                cmd.arg("PX").arg(millis);
            }
            let _: () = cmd.query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.run(|mut conn| async move {
            let _removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let pattern = format!("{}*", escape_glob(prefix));
        self.run(|mut conn| async move {
            let mut cursor: u64 = 0;
            let mut removed: u64 = 0;
            loop {
                let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn)
                    .await?;
                if !keys.is_empty() {
                    let count: u64 = redis::cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                    removed += count;
                }
                if next == 0 {
                    return Ok(removed);
                }
                cursor = next;
            }
        })
        .await
    }
}

/// Connect, wait for a failure signal, reconnect. Runs until aborted.
async fn supervise(shared: Arc<Shared>) {
    loop {
        let mut attempt = 0;
        while shared.state() == ConnectionState::Connecting {
            if attempt >= shared.policy.max_attempts {
                warn!(
                    attempts = attempt,
                    "Redis reconnect attempts exhausted, using local cache"
                );
                shared.set_state(ConnectionState::Exhausted);
                break;
            }

            match shared.client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    *shared.connection.write().await = Some(connection);
                    shared.set_state(ConnectionState::Ready);
                    info!(attempt, "Redis connection ready");
                }
                Err(e) => {
                    let delay = shared.policy.delay_for(attempt);
                    attempt += 1;
                    debug!(
                        error = %e,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Redis connect failed"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        shared.wake.notified().await;
    }
}

/// Escape Redis glob metacharacters so `prefix` matches literally.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
