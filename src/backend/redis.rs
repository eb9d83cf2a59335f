//! Redis store backend
//!
//! Issues one Redis command per trait call over a multiplexed connection
//! manager, which reconnects on its own and is cheap to clone per call.

use ::redis::aio::ConnectionManager;
use ::redis::{cmd, Client, Cmd, FromRedisValue, RedisError};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::{KvBackend, ListEnd, Payload};
use crate::error::{CacheError, Result};

/// Redis-backed store.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Opens a managed connection to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| CacheError::Configuration(format!("Invalid Redis URL '{}': {}", url, e)))?;
        let conn = ConnectionManager::new(client).await.map_err(map_error)?;

        info!("Connected to Redis at {}", url);
        Ok(Self { conn })
    }

    async fn query<T: FromRedisValue>(&self, command: &Cmd) -> Result<T> {
        let mut conn = self.conn.clone();
        command.query_async(&mut conn).await.map_err(map_error)
    }
}

// == Error Mapping ==
/// Transport failures become `Unavailable`; everything the server rejects is `Store`.
fn map_error(e: RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        CacheError::Unavailable(e.to_string())
    } else {
        CacheError::Store(e.to_string())
    }
}

fn is_index_out_of_range(e: &CacheError) -> bool {
    matches!(e, CacheError::Store(message) if message.contains("index out of range"))
}

fn push_command(end: ListEnd) -> &'static str {
    match end {
        ListEnd::Left => "LPUSH",
        ListEnd::Right => "RPUSH",
    }
}

fn pop_command(end: ListEnd) -> &'static str {
    match end {
        ListEnd::Left => "LPOP",
        ListEnd::Right => "RPOP",
    }
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        self.query(cmd("GET").arg(key)).await
    }

    async fn set(&self, key: &str, value: Payload, ttl_ms: Option<u64>) -> Result<()> {
        let mut command = cmd("SET");
        command.arg(key).arg(value);
        if let Some(ttl) = ttl_ms {
            command.arg("PX").arg(ttl);
        }
        self.query(&command).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Payload>>> {
        self.query(cmd("MGET").arg(keys)).await
    }

    async fn mset(&self, entries: &[(String, Payload)]) -> Result<()> {
        let mut command = cmd("MSET");
        for (key, value) in entries {
            command.arg(key).arg(value);
        }
        self.query(&command).await
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.query(cmd("INCRBY").arg(key).arg(delta)).await
    }

    async fn pexpire(&self, key: &str, ttl_ms: u64) -> Result<bool> {
        self.query(cmd("PEXPIRE").arg(key).arg(ttl_ms)).await
    }

    async fn pttl(&self, key: &str) -> Result<i64> {
        self.query(cmd("PTTL").arg(key)).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let keys: Vec<String> = self.query(cmd("KEYS").arg(pattern)).await?;
        debug!("KEYS '{}' matched {} keys", pattern, keys.len());
        Ok(keys)
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        self.query(cmd("DEL").arg(keys)).await
    }

    async fn push(&self, key: &str, end: ListEnd, values: Vec<Payload>) -> Result<u64> {
        let mut command = cmd(push_command(end));
        command.arg(key);
        for value in &values {
            command.arg(value);
        }
        self.query(&command).await
    }

    async fn pop(&self, key: &str, end: ListEnd) -> Result<Option<Payload>> {
        self.query(cmd(pop_command(end)).arg(key)).await
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<Payload>> {
        self.query(cmd("LINDEX").arg(key).arg(index)).await
    }

    async fn lrem(&self, key: &str, count: i64, value: &[u8]) -> Result<u64> {
        self.query(cmd("LREM").arg(key).arg(count).arg(value)).await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Payload>> {
        self.query(cmd("LRANGE").arg(key).arg(start).arg(stop)).await
    }

    async fn lset(&self, key: &str, index: i64, value: Payload) -> Result<()> {
        self.query(cmd("LSET").arg(key).arg(index).arg(value))
            .await
            .map_err(|e| {
                if is_index_out_of_range(&e) {
                    CacheError::IndexOutOfRange {
                        key: key.to_string(),
                        index,
                    }
                } else {
                    e
                }
            })
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        self.query(cmd("LLEN").arg(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| crate::config::DEFAULT_REDIS_URL.to_string())
    }

    #[test]
    fn test_index_error_detection() {
        assert!(is_index_out_of_range(&CacheError::Store(
            "ERR index out of range".to_string()
        )));
        assert!(!is_index_out_of_range(&CacheError::Store(
            "ERR no such key".to_string()
        )));
        assert!(!is_index_out_of_range(&CacheError::Unavailable(
            "index out of range".to_string()
        )));
    }

    #[test]
    fn test_list_commands() {
        assert_eq!(push_command(ListEnd::Left), "LPUSH");
        assert_eq!(pop_command(ListEnd::Right), "RPOP");
    }

    #[tokio::test]
    async fn test_invalid_url_is_configuration_error() {
        let result = RedisBackend::connect("not a url").await;
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server (REDIS_URL)"]
    async fn test_live_round_trip() {
        let backend = RedisBackend::connect(&redis_url()).await.unwrap();
        let key = "fpa:test:backend:round_trip";

        backend.set(key, b"v".to_vec(), Some(5_000)).await.unwrap();
        assert_eq!(backend.get(key).await.unwrap(), Some(b"v".to_vec()));
        let pttl = backend.pttl(key).await.unwrap();
        assert!(pttl > 0 && pttl <= 5_000);

        assert_eq!(backend.del(&[key.to_string()]).await.unwrap(), 1);
        assert_eq!(backend.pttl(key).await.unwrap(), -2);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server (REDIS_URL)"]
    async fn test_live_lset_out_of_range() {
        let backend = RedisBackend::connect(&redis_url()).await.unwrap();
        let key = "fpa:test:backend:lset";
        backend.del(&[key.to_string()]).await.unwrap();
        backend.push(key, ListEnd::Right, vec![b"a".to_vec()]).await.unwrap();

        let result = backend.lset(key, 5, b"z".to_vec()).await;
        assert!(matches!(result, Err(CacheError::IndexOutOfRange { index: 5, .. })));

        backend.del(&[key.to_string()]).await.unwrap();
    }
}
