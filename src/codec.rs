//! Value Codec Module
//!
//! Converts application values to and from the payload bytes kept in the store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

// == Codec Trait ==
/// Serialization collaborator used by the cache store on every value.
///
/// `decode` of an empty payload yields `Ok(None)`; anything the codec wrote
/// with `encode` must decode back to an equal value of the same type.
pub trait Codec: Send + Sync {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<Option<T>>;
}

// == JSON Codec ==
/// Default codec: UTF-8 JSON via serde_json.
///
/// Integers encode as bare digits, so values written with `set` stay usable
/// by the store's atomic increment.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CacheError::Codec(format!("Failed to encode value: {}", e)))
    }

    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<Option<T>> {
        if payload.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(payload)
            .map(Some)
            .map_err(|e| CacheError::Codec(format!("Failed to decode value: {}", e)))
    }
}
