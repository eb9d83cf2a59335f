//! Embedded Store Module
//!
//! In-process key-value store with the string, list and TTL semantics of the
//! Redis commands the cache layer issues. Expired keys are dropped lazily on
//! access and in bulk by the cleanup task.

mod entry;

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use globset::GlobBuilder;
use tokio::sync::RwLock;

use self::entry::{Entry, Value};
use crate::backend::{KvBackend, ListEnd, Payload};
use crate::error::{CacheError, Result};

// == Memory Backend ==
/// Key-value storage guarded by a single async lock.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Number of stored keys, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

// == Entry Access Helpers ==
/// Returns the entry if present and live, dropping it when expired.
fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(Entry::is_expired) {
        entries.remove(key);
        return None;
    }
    entries.get_mut(key)
}

fn list_mut<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
) -> Result<Option<&'a mut VecDeque<Payload>>> {
    match live_entry(entries, key) {
        None => Ok(None),
        Some(Entry {
            value: Value::List(list),
            ..
        }) => Ok(Some(list)),
        Some(_) => Err(wrong_type(key)),
    }
}

fn wrong_type(key: &str) -> CacheError {
    CacheError::Store(format!(
        "WRONGTYPE Operation against key '{}' holding the wrong kind of value",
        key
    ))
}

/// Resolves a possibly negative index against `len`.
fn resolve_index(len: usize, index: i64) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}

/// Clamps an inclusive range the way LRANGE does; None when empty.
fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((usize::try_from(start).ok()?, usize::try_from(stop).ok()?))
}

/// Rewrites a Redis KEYS pattern into globset syntax.
///
/// Redis has no `{a,b}` alternation, so braces stay literal, and it negates
/// a class with `[^...]` where globset expects `[!...]`.
fn redis_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                glob.push(c);
                if let Some(escaped) = chars.next() {
                    glob.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                glob.push(c);
                if chars.next_if_eq(&'^').is_some() {
                    glob.push('!');
                }
            }
            ']' if in_class => {
                in_class = false;
                glob.push(c);
            }
            '{' | '}' if !in_class => {
                glob.push('\\');
                glob.push(c);
            }
            _ => glob.push(c),
        }
    }
    glob
}

fn parse_integer(key: &str, payload: &[u8]) -> Result<i64> {
    std::str::from_utf8(payload)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| {
            CacheError::Store(format!(
                "ERR value at '{}' is not an integer or out of range",
                key
            ))
        })
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        let mut entries = self.entries.write().await;
        match live_entry(&mut entries, key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Str(payload),
                ..
            }) => Ok(Some(payload.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: Payload, ttl_ms: Option<u64>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry::new(Value::Str(value), ttl_ms));
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Payload>>> {
        let mut entries = self.entries.write().await;
        Ok(keys
            .iter()
            .map(|key| match live_entry(&mut entries, key) {
                Some(Entry {
                    value: Value::Str(payload),
                    ..
                }) => Some(payload.clone()),
                _ => None,
            })
            .collect())
    }

    async fn mset(&self, pairs: &[(String, Payload)]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for (key, value) in pairs {
            entries.insert(key.clone(), Entry::new(Value::Str(value.clone()), None));
        }
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut entries = self.entries.write().await;
        let (current, expires_at) = match live_entry(&mut entries, key) {
            None => (0, None),
            Some(Entry {
                value: Value::Str(payload),
                expires_at,
            }) => (parse_integer(key, payload)?, *expires_at),
            Some(_) => return Err(wrong_type(key)),
        };

        let next = current.checked_add(delta).ok_or_else(|| {
            CacheError::Store(format!(
                "ERR increment or decrement would overflow at '{}'",
                key
            ))
        })?;

        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(next.to_string().into_bytes()),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn pexpire(&self, key: &str, ttl_ms: u64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let Some(entry) = live_entry(&mut entries, key) else {
            return Ok(false);
        };
        if ttl_ms == 0 {
            entries.remove(key);
        } else {
            entry.expire_in(ttl_ms);
        }
        Ok(true)
    }

    async fn pttl(&self, key: &str) -> Result<i64> {
        let mut entries = self.entries.write().await;
        Ok(match live_entry(&mut entries, key) {
            None => -2,
            Some(entry) => match entry.ttl_remaining_ms() {
                Some(remaining) => i64::try_from(remaining).unwrap_or(i64::MAX),
                None => -1,
            },
        })
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = GlobBuilder::new(&redis_glob(pattern))
            .literal_separator(false)
            .backslash_escape(true)
            .build()
            .map_err(|e| CacheError::Store(format!("ERR invalid pattern '{}': {}", pattern, e)))?
            .compile_matcher();

        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && matcher.is_match(key.as_str()))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let mut removed = 0;
        for key in keys {
            if let Some(entry) = entries.remove(key) {
                if !entry.is_expired() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn push(&self, key: &str, end: ListEnd, values: Vec<Payload>) -> Result<u64> {
        let mut entries = self.entries.write().await;
        if list_mut(&mut entries, key)?.is_none() {
            entries.insert(key.to_string(), Entry::new(Value::List(VecDeque::new()), None));
        }
        let list = list_mut(&mut entries, key)?.ok_or_else(|| wrong_type(key))?;

        for value in values {
            match end {
                ListEnd::Left => list.push_front(value),
                ListEnd::Right => list.push_back(value),
            }
        }
        Ok(list.len() as u64)
    }

    async fn pop(&self, key: &str, end: ListEnd) -> Result<Option<Payload>> {
        let mut entries = self.entries.write().await;
        let Some(list) = list_mut(&mut entries, key)? else {
            return Ok(None);
        };

        let popped = match end {
            ListEnd::Left => list.pop_front(),
            ListEnd::Right => list.pop_back(),
        };
        // The store never keeps an empty list
        if list.is_empty() {
            entries.remove(key);
        }
        Ok(popped)
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<Payload>> {
        let mut entries = self.entries.write().await;
        let Some(list) = list_mut(&mut entries, key)? else {
            return Ok(None);
        };
        Ok(resolve_index(list.len(), index).and_then(|i| list.get(i).cloned()))
    }

    async fn lrem(&self, key: &str, count: i64, value: &[u8]) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let Some(list) = list_mut(&mut entries, key)? else {
            return Ok(0);
        };

        let limit = if count == 0 {
            usize::MAX
        } else {
            usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX)
        };
        let matches = list
            .iter()
            .enumerate()
            .filter(|(_, element)| element.as_slice() == value)
            .map(|(i, _)| i);
        let mut chosen: Vec<usize> = if count < 0 {
            matches.rev().take(limit).collect()
        } else {
            matches.take(limit).collect()
        };

        // Remove from the back so earlier positions stay valid
        chosen.sort_unstable_by(|a, b| b.cmp(a));
        for i in &chosen {
            list.remove(*i);
        }
        if list.is_empty() {
            entries.remove(key);
        }
        Ok(chosen.len() as u64)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Payload>> {
        let mut entries = self.entries.write().await;
        let Some(list) = list_mut(&mut entries, key)? else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn lset(&self, key: &str, index: i64, value: Payload) -> Result<()> {
        let mut entries = self.entries.write().await;
        let list = list_mut(&mut entries, key)?
            .ok_or_else(|| CacheError::Store(format!("ERR no such key '{}'", key)))?;

        let slot = resolve_index(list.len(), index)
            .and_then(|i| list.get_mut(i))
            .ok_or_else(|| CacheError::IndexOutOfRange {
                key: key.to_string(),
                index,
            })?;
        *slot = value;
        Ok(())
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        Ok(list_mut(&mut entries, key)?.map_or(0, |list| list.len() as u64))
    }
}
