//! Memory Entry Module
//!
//! Defines the structure for individual stored entries with TTL support.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::backend::Payload;

// == Stored Value ==
/// Value kinds the embedded store holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(Payload),
    List(VecDeque<Payload>),
}

// == Entry ==
/// Represents a single stored key with value and metadata.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub value: Value,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl Entry {
    // == Constructor ==
    /// Creates a new entry with optional TTL in milliseconds.
    pub fn new(value: Value, ttl_ms: Option<u64>) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            expires_at: ttl_ms.map(|ttl| now.saturating_add(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Expire ==
    /// Replaces the TTL, counted from now.
    pub fn expire_in(&mut self, ttl_ms: u64) {
        self.expires_at = Some(current_timestamp_ms().saturating_add(ttl_ms));
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
