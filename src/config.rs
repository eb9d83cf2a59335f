//! Configuration Module
//!
//! Selects and parameterizes the store backend from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::CacheError;

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Which store implementation the cache binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Remote Redis server
    Redis,
    /// Embedded in-process store
    Memory,
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(BackendKind::Redis),
            "memory" => Ok(BackendKind::Memory),
            other => Err(CacheError::Configuration(format!(
                "Unknown cache backend '{}'",
                other
            ))),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend to connect
    pub backend: BackendKind,
    /// Redis connection URL, used when `backend` is `Redis`
    pub redis_url: String,
    /// Expired-entry sweep interval in seconds, used when `backend` is `Memory`
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `REDIS_URL` - Redis connection URL (default: redis://127.0.0.1:6379)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    ///
    /// An unrecognized `CACHE_BACKEND` is a configuration error rather than a
    /// silent fallback.
    pub fn from_env() -> Result<Self, CacheError> {
        let backend = match env::var("CACHE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => BackendKind::Redis,
        };

        Ok(Self {
            backend,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        })
    }

    /// Config for the embedded backend, mostly useful in tests.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Redis,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            cleanup_interval: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.backend, BackendKind::Redis);
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(config.cleanup_interval, 1);
    }

    #[test]
    fn test_config_memory() {
        let config = Config::memory();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.cleanup_interval, 1);
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("redis".parse::<BackendKind>().unwrap(), BackendKind::Redis);
        assert_eq!(" Memory ".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert!(matches!(
            "memcached".parse::<BackendKind>(),
            Err(CacheError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_BACKEND");
        env::remove_var("REDIS_URL");
        env::remove_var("CLEANUP_INTERVAL");

        let config = Config::from_env().unwrap();
        assert_eq!(config.backend, BackendKind::Redis);
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(config.cleanup_interval, 1);
    }
}
