//! fpa-cache - typed cache keys over a key-value store
//!
//! Application code declares key variants with [`cache_key!`]; each variant
//! derives a namespaced wire key from its own type path. [`CacheStore`] binds
//! once to a backend (Redis or the embedded store) and exposes typed string,
//! counter, batch and list operations that honor each key's expiration.

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod store;
pub mod tasks;

pub use backend::{KvBackend, MemoryBackend, RedisBackend};
pub use codec::{Codec, JsonCodec};
pub use config::Config;
pub use error::{CacheError, Result};
pub use key::{CacheKey, KeyMeta, MethodKey, TimeUnit, Ttl};
pub use store::CacheStore;
pub use tasks::spawn_cleanup_task;
