use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStrategy, FileCache, MemoryCache};
use crate::cli::OutputFormat;
use crate::transcribe::{PipelineOptions, DEFAULT_HOST, DEFAULT_USER_AGENT};
use crate::transport::RetryPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outbound request settings
    pub http: HttpConfig,

    /// Backoff for 429/5xx responses
    pub retry: RetryConfig,

    /// Transcript cache
    pub cache: CacheConfig,

    /// Output defaults
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header for every request
    pub user_agent: String,

    /// Talk to YouTube over plain http
    pub plaintext: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables)
    pub max_attempts: u32,

    /// Initial backoff, doubled per retry
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    pub backend: CacheBackend,

    /// Directory for the file backend (user cache dir if not set)
    pub dir: Option<PathBuf>,

    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used when --format is not given
    pub default_format: OutputFormat,

    /// Prefix text lines with timestamps
    pub timestamps: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            plaintext: false,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 1000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::File,
            dir: None,
            ttl_secs: 60 * 60,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Text,
            timestamps: false,
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            if let Err(err) = config.save_to(&config_path) {
                tracing::warn!("Could not write default config to {}: {:#}", config_path.display(), err);
            }
            Ok(config)
        }
    }

    /// Load and validate a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-fetch").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let user_agent = self.http.user_agent.trim();
        if user_agent.is_empty() {
            anyhow::bail!("http.user_agent must not be empty");
        }
        if user_agent.contains(['\r', '\n']) {
            anyhow::bail!("http.user_agent must be a single line");
        }
        if self.cache.ttl_secs == 0 {
            anyhow::bail!("cache.ttl_secs must be greater than zero");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  User Agent: {}", self.http.user_agent);
        println!("  Plaintext HTTP: {}", self.http.plaintext);
        println!(
            "  Retries: {} (base delay {}ms)",
            self.retry.max_attempts, self.retry.base_delay_ms
        );
        if self.cache.enabled {
            println!("  Cache: {:?}, TTL {}s", self.cache.backend, self.cache.ttl_secs);
            if self.cache.backend == CacheBackend::File {
                println!("  Cache Dir: {}", self.cache_dir().display());
            }
        } else {
            println!("  Cache: disabled");
        }
        println!("  Default Format: {}", self.output.default_format);
    }

    /// Pipeline settings derived from this configuration
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            user_agent: self.http.user_agent.trim().to_string(),
            plaintext: self.http.plaintext,
            retry: RetryPolicy::new(self.retry.max_attempts, Duration::from_millis(self.retry.base_delay_ms)),
            host: DEFAULT_HOST.to_string(),
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(FileCache::default_dir)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Build the configured cache, if caching is enabled
    pub fn build_cache(&self) -> Option<Arc<dyn CacheStrategy>> {
        if !self.cache.enabled {
            return None;
        }

        let cache: Arc<dyn CacheStrategy> = match self.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCache::with_ttl(self.cache_ttl())),
            CacheBackend::File => Arc::new(FileCache::with_ttl(self.cache_dir(), self.cache_ttl())),
        };
        Some(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(&path, "retry:\n  max_attempts: 5\ncache:\n  backend: memory\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(config.cache.enabled);
        assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.output.default_format = OutputFormat::Vtt;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.output.default_format, OutputFormat::Vtt);
    }

    #[test]
    fn test_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        fs_err::write(&path, "http:\n  user_agent: \"\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        fs_err::write(&path, "http:\n  user_agent: \"a\\r\\nX-Injected: 1\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        fs_err::write(&path, "cache:\n  ttl_secs: 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_pipeline_options_and_cache() {
        let mut config = Config::default();
        config.retry.max_attempts = 3;
        config.retry.base_delay_ms = 50;
        config.http.plaintext = true;

        let options = config.pipeline_options();
        assert_eq!(options.retry, RetryPolicy::new(3, Duration::from_millis(50)));
        assert!(options.plaintext);

        assert!(config.build_cache().is_some());
        config.cache.enabled = false;
        assert!(config.build_cache().is_none());
    }
}
