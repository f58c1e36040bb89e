use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

use super::{CacheEntry, CacheError, CacheStrategy, DEFAULT_TTL};
use crate::utils::sanitize_cache_key;

/// Persistent cache storing one JSON file per key.
///
/// There is no cross-process locking: concurrent writers to the same key race
/// and the last rename wins.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    default_ttl: Duration,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(dir, DEFAULT_TTL)
    }

    pub fn with_ttl(dir: impl Into<PathBuf>, default_ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            default_ttl,
        }
    }

    /// Default location under the user's cache directory
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("transcript-fetch")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_cache_key(key)))
    }
}

#[async_trait]
impl CacheStrategy for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let entry: CacheEntry = serde_json::from_str(&content)?;
        if entry.is_expired() {
            tracing::debug!("Evicting expired cache file {}", path.display());
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).await?;

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));
        let path = self.path_for(key);
        let staging = self.dir.join(format!(".{}.tmp", Uuid::new_v4()));

        fs::write(&staging, serde_json::to_vec(&entry)?).await?;
        if let Err(err) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }

        Ok(())
    }
}
