//! Pluggable transcript cache.
//!
//! Caching is advisory: the pipeline goes through [`read_through`] and
//! [`write_behind`], which log and swallow every cache-layer failure so a
//! broken cache can only cost a cache miss, never a failed fetch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use crate::video::VideoId;

/// Default lifetime of an entry when the caller gives no TTL
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

// Longer TTLs are clamped so the expiry stays representable.
const MAX_TTL_DAYS: i64 = 365 * 100;

/// Errors raised inside a cache implementation
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache entry is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Key-value store with per-entry expiry.
///
/// `get` must never return an entry whose expiry has passed.
#[async_trait]
pub trait CacheStrategy: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value`; `ttl` of `None` means the implementation's default
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
}

/// Stored value plus its absolute expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(value: impl Into<String>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::days(MAX_TTL_DAYS))
            .min(chrono::Duration::days(MAX_TTL_DAYS));
        let expires_at = Utc::now() + ttl;
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Key for one (video, language, metadata) combination
pub fn cache_key(video_id: &VideoId, lang: Option<&str>, with_metadata: bool) -> String {
    let mut key = format!("yt:transcript:{}:{}", video_id, lang.unwrap_or(""));
    if with_metadata {
        key.push_str(":details");
    }
    key
}

/// Outcome of a best-effort cache read
#[derive(Debug)]
pub enum CacheRead<T> {
    Hit(T),
    Miss,
}

/// Look up `key` and decode it as `T`; read errors and malformed entries become misses
pub async fn read_through<T: DeserializeOwned>(cache: &dyn CacheStrategy, key: &str) -> CacheRead<T> {
    let raw = match cache.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return CacheRead::Miss,
        Err(err) => {
            tracing::warn!("Cache read failed for {}: {}", key, err);
            return CacheRead::Miss;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => CacheRead::Hit(value),
        Err(err) => {
            tracing::warn!("Ignoring malformed cache entry for {}: {}", key, err);
            CacheRead::Miss
        }
    }
}

/// Encode and store `value`, logging instead of failing
pub async fn write_behind<T: Serialize>(
    cache: &dyn CacheStrategy,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) {
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(err) => {
            tracing::warn!("Could not encode cache entry for {}: {}", key, err);
            return;
        }
    };

    if let Err(err) = cache.set(key, &encoded, ttl).await {
        tracing::warn!("Cache write failed for {}: {}", key, err);
    }
}
