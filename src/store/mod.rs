//! Cache Store Module
//!
//! Process-wide access façade: resolves cache keys to wire keys, encodes
//! values through the codec and applies each key's expiration policy.

mod list;

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{self, KvBackend, Payload};
use crate::codec::{Codec, JsonCodec};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::key::{CacheKey, TimeUnit, Ttl};

/// The process-wide store used through [`CacheStore::global`].
static GLOBAL: CacheStore = CacheStore::new();

// == Cache Store ==
/// Cache access façade over a write-once backend handle.
///
/// Every operation resolves its key through [`CacheKey::key`] and is a direct
/// pass-through: no retries, no local recovery. Multi-step operations
/// (`increment`, `set_many`) are not atomic across their steps.
pub struct CacheStore<C = JsonCodec> {
    /// Backend handle, published once by `bind`
    backend: OnceLock<Arc<dyn KvBackend>>,
    /// Value codec
    codec: C,
}

impl CacheStore<JsonCodec> {
    // == Constructor ==
    /// Creates an unbound store using the JSON codec.
    pub const fn new() -> Self {
        Self::with_codec(JsonCodec)
    }

    /// The process-wide instance.
    pub fn global() -> &'static CacheStore {
        &GLOBAL
    }
}

impl Default for CacheStore<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CacheStore<C> {
    /// Creates an unbound store using `codec`.
    pub const fn with_codec(codec: C) -> Self {
        Self {
            backend: OnceLock::new(),
            codec,
        }
    }

    // == Binding ==
    /// Binds the backend handle.
    ///
    /// The handle is write-once: a second call fails with
    /// [`CacheError::Configuration`] and leaves the first handle in place.
    /// Concurrent callers observe either the complete handle or that error.
    pub fn bind(&self, backend: Arc<dyn KvBackend>) -> Result<()> {
        self.backend.set(backend).map_err(|_| {
            warn!("Rejected second bind of the cache store backend");
            CacheError::Configuration("cache store backend may only be bound once".to_string())
        })?;
        info!("Cache store backend bound");
        Ok(())
    }

    /// Connects the backend named by `config` and binds it.
    pub async fn bind_config(&self, config: &Config) -> Result<()> {
        if self.is_bound() {
            return Err(CacheError::Configuration(
                "cache store backend may only be bound once".to_string(),
            ));
        }
        let backend = backend::connect(config).await?;
        self.bind(backend)
    }

    pub fn is_bound(&self) -> bool {
        self.backend.get().is_some()
    }

    fn backend(&self) -> Result<&dyn KvBackend> {
        self.backend
            .get()
            .map(|backend| backend.as_ref())
            .ok_or(CacheError::Uninitialized)
    }
}

impl<C: Codec> CacheStore<C> {
    // == Codec Helpers ==
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Payload> {
        self.codec.encode(value)
    }

    fn decode<T: DeserializeOwned>(&self, payload: Option<Payload>) -> Result<Option<T>> {
        match payload {
            Some(bytes) => self.codec.decode(&bytes),
            None => Ok(None),
        }
    }

    /// Decodes an element that must be present (list ranges).
    fn decode_element<T: DeserializeOwned>(&self, key: &str, payload: &[u8]) -> Result<T> {
        self.codec.decode(payload)?.ok_or_else(|| {
            CacheError::Codec(format!("Empty element in list '{}'", key))
        })
    }

    // == Set ==
    /// Writes `value` at the key.
    ///
    /// A key with an expiration is written together with its TTL; a key
    /// without one gets a plain write, which leaves it persistent.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &dyn CacheKey, value: &T) -> Result<()> {
        let backend = self.backend()?;
        let wire = key.key();
        let payload = self.encode(value)?;
        let ttl = key.expire_millis();

        backend.set(&wire, payload, ttl).await?;
        debug!("Cached key '{}' with TTL {:?}ms", wire, ttl);
        Ok(())
    }

    // == Get ==
    /// Reads the value at the key; `Ok(None)` when absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &dyn CacheKey) -> Result<Option<T>> {
        let backend = self.backend()?;
        let wire = key.key();
        let payload = backend.get(&wire).await?;

        match &payload {
            Some(_) => debug!("Cache hit for key '{}'", wire),
            None => debug!("Cache miss for key '{}'", wire),
        }
        self.decode(payload)
    }

    // == Get Or Load ==
    /// Reads the key, or runs `load`, stores its result with the key's TTL
    /// and returns it.
    ///
    /// Concurrent misses each run the loader; the last write wins.
    pub async fn get_or_load<T, F, Fut>(&self, key: &dyn CacheKey, load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get(key).await? {
            return Ok(cached);
        }
        let value = load().await?;
        self.set(key, &value).await?;
        Ok(value)
    }

    // == Increment ==
    /// Adds one to the counter at the key.
    pub async fn increment(&self, key: &dyn CacheKey) -> Result<i64> {
        self.increment_by(key, 1).await
    }

    /// Adds `delta` (may be negative) to the counter at the key.
    ///
    /// When the key declares an expiration, the TTL is stamped again after
    /// every increment, so the counter always lives for its declared duration
    /// from its latest change.
    pub async fn increment_by(&self, key: &dyn CacheKey, delta: i64) -> Result<i64> {
        let backend = self.backend()?;
        let wire = key.key();
        let value = backend.incr_by(&wire, delta).await?;

        if let Some(ttl) = key.expire_millis() {
            backend.pexpire(&wire, ttl).await?;
        }
        debug!("Incremented '{}' by {} to {}", wire, delta, value);
        Ok(value)
    }

    // == Expiration ==
    /// Sets a TTL on the key regardless of its declared expiration.
    ///
    /// Returns false when the key does not exist. A positive duration is
    /// sent as at least 1 ms; zero expires the key at once, as the store does.
    pub async fn set_expire(&self, key: &dyn CacheKey, expire: u64, unit: TimeUnit) -> Result<bool> {
        let backend = self.backend()?;
        let wire = key.key();
        let ttl = if expire > 0 {
            unit.to_millis(expire).max(1)
        } else {
            0
        };
        backend.pexpire(&wire, ttl).await
    }

    /// Remaining TTL of the key, in the key's own unit.
    pub async fn get_expire(&self, key: &dyn CacheKey) -> Result<Ttl> {
        let backend = self.backend()?;
        let pttl = backend.pttl(&key.key()).await?;
        Ok(Ttl::from_pttl(pttl, key.expire_unit()))
    }

    // == Batch Set ==
    /// Writes all pairs in one bulk write, then applies TTLs one key at a time.
    ///
    /// The bulk write cannot carry TTLs. If the process or the connection
    /// fails between the two phases, values stay written without their TTL;
    /// readers may also observe that state while the second phase runs.
    pub async fn set_many<T: Serialize>(&self, entries: &[(&dyn CacheKey, T)]) -> Result<()> {
        let backend = self.backend()?;
        if entries.is_empty() {
            return Ok(());
        }

        let pairs = entries
            .iter()
            .map(|(key, value)| -> Result<(String, Payload)> {
                Ok((key.key(), self.encode(value)?))
            })
            .collect::<Result<Vec<_>>>()?;
        backend.mset(&pairs).await?;

        for ((key, _), (wire, _)) in entries.iter().zip(&pairs) {
            if let Some(ttl) = key.expire_millis() {
                backend.pexpire(wire, ttl).await?;
            }
        }
        debug!("Cached {} keys in one batch", pairs.len());
        Ok(())
    }

    // == Batch Get ==
    /// Reads all keys in one bulk read.
    ///
    /// Values come back in the store's result order, one slot per key.
    pub async fn get_many<T: DeserializeOwned>(&self, keys: &[&dyn CacheKey]) -> Result<Vec<Option<T>>> {
        let backend = self.backend()?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let wires: Vec<String> = keys.iter().map(|key| key.key()).collect();
        backend
            .mget(&wires)
            .await?
            .into_iter()
            .map(|payload| self.decode(payload))
            .collect()
    }

    // == Key Discovery ==
    /// Every wire key matching a glob pattern.
    ///
    /// Use with caution: this is the store's KEYS command, a blocking scan of
    /// the entire keyspace.
    pub async fn keys_matching(&self, pattern: &str) -> Result<HashSet<String>> {
        let backend = self.backend()?;
        let keys = backend.keys(pattern).await?;
        Ok(keys.into_iter().collect())
    }

    /// Every wire key starting with `prefix`. Same cost as [`Self::keys_matching`].
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<HashSet<String>> {
        self.keys_matching(&format!("{}*", prefix)).await
    }

    // == Delete ==
    /// Deletes the key; true when it existed.
    pub async fn delete(&self, key: &dyn CacheKey) -> Result<bool> {
        let backend = self.backend()?;
        let wire = key.key();
        let deleted = backend.del(std::slice::from_ref(&wire)).await?;
        debug!("Deleted key '{}': {}", wire, deleted > 0);
        Ok(deleted > 0)
    }

    /// Deletes all keys; returns how many existed.
    pub async fn delete_all(&self, keys: &[&dyn CacheKey]) -> Result<u64> {
        let backend = self.backend()?;
        if keys.is_empty() {
            return Ok(0);
        }
        let wires: Vec<String> = keys.iter().map(|key| key.key()).collect();
        backend.del(&wires).await
    }

    /// Deletes every key starting with `prefix`; returns how many were removed.
    ///
    /// Issues no delete when nothing matches.
    pub async fn delete_all_with_prefix(&self, prefix: &str) -> Result<u64> {
        let keys = self.keys_with_prefix(prefix).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let wires: Vec<String> = keys.into_iter().collect();
        let deleted = self.backend()?.del(&wires).await?;
        debug!("Deleted {} keys with prefix '{}'", deleted, prefix);
        Ok(deleted)
    }
}
