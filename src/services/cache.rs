use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, warn};

use crate::{config::Config, models::notification::Notification, services::metrics};

pub const AVAILABLE_KEY: &str = "shown_notification_available";
pub const SHOWN_KEY: &str = "shown_notification";
pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

/// Best-effort key/value cache with per-entry expiry.
///
/// Backends never fail: an unreachable cache reads as a miss and drops writes.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
    async fn delete(&self, key: &str);
}

pub struct RedisCache {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisCache {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        let res: redis::RedisResult<Option<String>> =
            redis::cmd("GET").arg(key).query_async(&mut conn).await;
        match res {
            Ok(value) => value,
            Err(e) => {
                warn!("cache GET {key} failed, treating as miss: {e}");
                metrics::record_cache_error("get");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry
        let secs = ttl.as_secs().max(1);
        let res: redis::RedisResult<()> = redis::cmd("SETEX")
            .arg(key)
            .arg(secs)
            .arg(value)
            .query_async(&mut conn)
            .await;
        if let Err(e) = res {
            warn!("cache SETEX {key} failed: {e}");
            metrics::record_cache_error("set");
        }
    }

    async fn delete(&self, key: &str) {
        let mut conn = self.conn.clone();
        let res: redis::RedisResult<()> = redis::cmd("DEL").arg(key).query_async(&mut conn).await;
        if let Err(e) = res {
            warn!("cache DEL {key} failed: {e}");
            metrics::record_cache_error("delete");
        }
    }
}

/// Process-local cache. Expiry follows tokio's clock, so paused-time tests can
/// advance past a TTL.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Some(value.clone()),
            _ => None,
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
    }

    async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}

/// What the cache knows about whether a notification is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// No entry, expired, or unreadable: the store has to be asked.
    Unknown,
    Available,
    Unavailable,
}

/// Typed view over the two banner cache entries.
#[derive(Clone)]
pub struct BannerCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    prefix: String,
}

impl BannerCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            ttl: DEFAULT_TTL,
            prefix: String::new(),
        }
    }

    pub fn from_config(backend: Arc<dyn CacheBackend>, config: &Config) -> Self {
        Self::new(backend)
            .with_ttl(config.cache_ttl())
            .with_prefix(config.cache_key_prefix.clone())
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub async fn availability(&self) -> Availability {
        let Some(raw) = self.backend.get(&self.key(AVAILABLE_KEY)).await else {
            return Availability::Unknown;
        };
        match serde_json::from_str::<bool>(&raw) {
            Ok(true) => Availability::Available,
            Ok(false) => Availability::Unavailable,
            Err(e) => {
                warn!("ignoring undecodable {AVAILABLE_KEY} entry {raw:?}: {e}");
                metrics::record_cache_error("decode");
                Availability::Unknown
            }
        }
    }

    pub async fn set_availability(&self, available: bool) {
        debug!("caching {AVAILABLE_KEY} = {available}");
        self.backend
            .set(&self.key(AVAILABLE_KEY), available.to_string(), self.ttl)
            .await;
    }

    pub async fn clear_availability(&self) {
        self.backend.delete(&self.key(AVAILABLE_KEY)).await;
    }

    pub async fn shown_notification(&self) -> Option<Notification> {
        let raw = self.backend.get(&self.key(SHOWN_KEY)).await?;
        match serde_json::from_str(&raw) {
            Ok(notification) => Some(notification),
            Err(e) => {
                warn!("ignoring undecodable {SHOWN_KEY} entry: {e}");
                metrics::record_cache_error("decode");
                None
            }
        }
    }

    pub async fn set_shown_notification(&self, notification: &Notification) {
        match serde_json::to_string(notification) {
            Ok(raw) => {
                debug!("caching {SHOWN_KEY} = #{}", notification.id);
                self.backend.set(&self.key(SHOWN_KEY), raw, self.ttl).await;
            }
            Err(e) => warn!("could not encode notification #{}: {e}", notification.id),
        }
    }

    pub async fn clear_shown_notification(&self) {
        self.backend.delete(&self.key(SHOWN_KEY)).await;
    }
}
