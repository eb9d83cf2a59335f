//! Store Backend Module
//!
//! The key-value store operations the cache layer consumes, and the two
//! implementations shipped with the crate.

mod memory;
mod redis;


use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{BackendKind, Config};
use crate::error::Result;
use crate::tasks::spawn_cleanup_task;

pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

/// Raw value bytes as kept by the store
pub type Payload = Vec<u8>;

/// Which end of a list a push or pop acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    Left,
    Right,
}

// == Backend Trait ==
/// Key-value store operations, one call per store command.
///
/// Implementations do no retrying; every failure is returned to the caller.
/// Indices follow the store convention: negative values count from the tail.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Payload>>;

    /// Writes a string value; `ttl_ms` is applied atomically with the write,
    /// `None` leaves the key without expiration.
    async fn set(&self, key: &str, value: Payload, ttl_ms: Option<u64>) -> Result<()>;

    /// Values in the order of `keys`; non-string or missing keys are `None`.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Payload>>>;

    /// Writes all pairs in one command, without expiration.
    async fn mset(&self, entries: &[(String, Payload)]) -> Result<()>;

    /// Adds `delta` to the integer at `key` (0 when absent), keeping its TTL.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;

    /// Sets a TTL; false when the key does not exist.
    async fn pexpire(&self, key: &str, ttl_ms: u64) -> Result<bool>;

    /// Remaining TTL in milliseconds; -1 without expiration, -2 when missing.
    async fn pttl(&self, key: &str) -> Result<i64>;

    /// Glob-style scan of the whole keyspace.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Deletes keys; returns how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    /// Pushes values one by one at `end`; returns the new length.
    async fn push(&self, key: &str, end: ListEnd, values: Vec<Payload>) -> Result<u64>;

    async fn pop(&self, key: &str, end: ListEnd) -> Result<Option<Payload>>;

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<Payload>>;

    /// Removes up to `|count|` elements equal to `value`: head first when
    /// positive, tail first when negative, all when zero.
    async fn lrem(&self, key: &str, count: i64, value: &[u8]) -> Result<u64>;

    /// Inclusive range.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Payload>>;

    async fn lset(&self, key: &str, index: i64, value: Payload) -> Result<()>;

    async fn llen(&self, key: &str) -> Result<u64>;
}

// == Connect ==
/// Opens the backend selected by `config`.
///
/// The embedded backend gets its expired-entry sweeper spawned on the current
/// Tokio runtime; it runs for the life of the process.
pub async fn connect(config: &Config) -> Result<Arc<dyn KvBackend>> {
    match config.backend {
        BackendKind::Redis => {
            let backend = RedisBackend::connect(&config.redis_url).await?;
            Ok(Arc::new(backend))
        }
        BackendKind::Memory => {
            let backend = Arc::new(MemoryBackend::new());
            spawn_cleanup_task(backend.clone(), config.cleanup_interval);
            info!("Embedded cache backend started");
            Ok(backend)
        }
    }
}
