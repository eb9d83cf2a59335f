//! List operations of the cache store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::CacheStore;
use crate::backend::ListEnd;
use crate::codec::Codec;
use crate::error::Result;
use crate::key::CacheKey;

impl<C: Codec> CacheStore<C> {
    async fn push<T: Serialize>(&self, key: &dyn CacheKey, end: ListEnd, values: &[T]) -> Result<u64> {
        let backend = self.backend()?;
        let wire = key.key();
        // The store rejects a push without values
        if values.is_empty() {
            return backend.llen(&wire).await;
        }

        let payloads = values
            .iter()
            .map(|value| self.encode(value))
            .collect::<Result<Vec<_>>>()?;
        let len = backend.push(&wire, end, payloads).await?;
        debug!("Pushed {} values to {:?} of '{}'", values.len(), end, wire);
        Ok(len)
    }

    async fn pop<T: DeserializeOwned>(&self, key: &dyn CacheKey, end: ListEnd) -> Result<Option<T>> {
        let backend = self.backend()?;
        let payload = backend.pop(&key.key(), end).await?;
        self.decode(payload)
    }

    // == Push ==
    /// Prepends one value; returns the new length.
    pub async fn push_left<T: Serialize>(&self, key: &dyn CacheKey, value: &T) -> Result<u64> {
        self.push(key, ListEnd::Left, std::slice::from_ref(value)).await
    }

    /// Prepends values one at a time, so the last one ends up at the head.
    pub async fn push_left_all<T: Serialize>(&self, key: &dyn CacheKey, values: &[T]) -> Result<u64> {
        self.push(key, ListEnd::Left, values).await
    }

    /// Appends one value; returns the new length.
    pub async fn push_right<T: Serialize>(&self, key: &dyn CacheKey, value: &T) -> Result<u64> {
        self.push(key, ListEnd::Right, std::slice::from_ref(value)).await
    }

    /// Appends values in order.
    pub async fn push_right_all<T: Serialize>(&self, key: &dyn CacheKey, values: &[T]) -> Result<u64> {
        self.push(key, ListEnd::Right, values).await
    }

    // == Pop ==
    pub async fn pop_left<T: DeserializeOwned>(&self, key: &dyn CacheKey) -> Result<Option<T>> {
        self.pop(key, ListEnd::Left).await
    }

    pub async fn pop_right<T: DeserializeOwned>(&self, key: &dyn CacheKey) -> Result<Option<T>> {
        self.pop(key, ListEnd::Right).await
    }

    // == Index ==
    /// Element at `index`; negative indices count from the tail.
    pub async fn element_at<T: DeserializeOwned>(&self, key: &dyn CacheKey, index: i64) -> Result<Option<T>> {
        let backend = self.backend()?;
        let payload = backend.lindex(&key.key(), index).await?;
        self.decode(payload)
    }

    /// Overwrites the element at `index`.
    ///
    /// Fails with `IndexOutOfRange` when the index is outside the list.
    pub async fn set_at<T: Serialize + ?Sized>(&self, key: &dyn CacheKey, index: i64, value: &T) -> Result<()> {
        let backend = self.backend()?;
        let payload = self.encode(value)?;
        backend.lset(&key.key(), index, payload).await
    }

    // == Remove ==
    /// Removes the first occurrence of `value`, scanning from the head.
    pub async fn remove<T: Serialize + ?Sized>(&self, key: &dyn CacheKey, value: &T) -> Result<u64> {
        self.remove_count(key, value, 1).await
    }

    /// Removes up to `|count|` occurrences of `value`.
    ///
    /// A positive count scans head to tail, a negative count tail to head,
    /// and zero removes every occurrence. Returns how many were removed.
    pub async fn remove_count<T: Serialize + ?Sized>(
        &self,
        key: &dyn CacheKey,
        value: &T,
        count: i64,
    ) -> Result<u64> {
        let backend = self.backend()?;
        let wire = key.key();
        let payload = self.encode(value)?;
        let removed = backend.lrem(&wire, count, &payload).await?;
        debug!("Removed {} occurrences from '{}' (count {})", removed, wire, count);
        Ok(removed)
    }

    // == Range ==
    /// Elements from `start` to `end`, both inclusive; negative indices count
    /// from the tail.
    pub async fn range<T: DeserializeOwned>(&self, key: &dyn CacheKey, start: i64, end: i64) -> Result<Vec<T>> {
        let backend = self.backend()?;
        let wire = key.key();
        backend
            .lrange(&wire, start, end)
            .await?
            .iter()
            .map(|payload| self.decode_element(&wire, payload))
            .collect()
    }

    // == Size ==
    /// Length of the list; 0 when the key is absent.
    pub async fn size(&self, key: &dyn CacheKey) -> Result<u64> {
        let backend = self.backend()?;
        backend.llen(&key.key()).await
    }
}
