//! Method result keys
//!
//! Keys for memoized method results: owner path, method name, and the JSON
//! text of the first argument.

use std::sync::OnceLock;

use serde::Serialize;

use super::{CacheKey, KeyMeta, SEPARATOR};
use crate::error::{CacheError, Result};

/// Key for the cached result of `Owner::method(argument)`.
///
/// Only the first argument takes part in the key, so methods whose result
/// depends on more than one argument need a dedicated variant. Usually built
/// with [`method_key!`](crate::method_key), which fixes the owner path at the
/// call site.
#[derive(Debug, Clone)]
pub struct MethodKey {
    owner: &'static str,
    method: &'static str,
    argument: Option<String>,
    root: Option<&'static str>,
    meta: KeyMeta,
}

impl MethodKey {
    /// Key for `method` of the type at path `owner` (e.g. `my_app::UserService`),
    /// called without arguments.
    pub fn new(owner: &'static str, method: &'static str) -> Self {
        Self {
            owner,
            method,
            argument: None,
            root: None,
            meta: KeyMeta::new(),
        }
    }

    /// Adds the first argument, serialized as JSON.
    pub fn with_argument<A: Serialize + ?Sized>(mut self, argument: &A) -> Result<Self> {
        let json = serde_json::to_string(argument).map_err(|e| {
            CacheError::Codec(format!(
                "Failed to encode argument of '{}': {}",
                self.method, e
            ))
        })?;
        self.argument = Some(json);
        Ok(self)
    }

    /// Replaces the owner's crate root in the prefix, like `namespace = ...`
    /// in [`cache_key!`](crate::cache_key).
    pub fn with_namespace(mut self, root: &'static str) -> Self {
        self.root = Some(root);
        self.meta.prefix = OnceLock::new();
        self
    }

    pub fn method(&self) -> &str {
        self.method
    }
}

impl CacheKey for MethodKey {
    fn type_path(&self) -> &'static str {
        self.owner
    }

    fn namespace(&self) -> Option<&'static str> {
        self.root
    }

    fn suffix(&self) -> String {
        match &self.argument {
            Some(argument) => format!("{}{}{}", self.method, SEPARATOR, argument),
            None => self.method.to_string(),
        }
    }

    fn meta(&self) -> &KeyMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut KeyMeta {
        &mut self.meta
    }
}

/// Builds a [`MethodKey`] for `Owner::method`, with the owner path taken from
/// the invocation module.
///
/// ```ignore
/// let key = fpa_cache::method_key!(UserService::find_by_id).with_argument(&42)?;
/// ```
#[macro_export]
macro_rules! method_key {
    ($owner:ident :: $method:ident) => {
        $crate::MethodKey::new(
            concat!(module_path!(), "::", stringify!($owner)),
            stringify!($method),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::TimeUnit;

    #[derive(Serialize)]
    struct Query {
        page: u32,
    }

    #[test]
    fn test_method_key_without_argument() {
        let key = crate::method_key!(UserService::list_all);
        assert_eq!(key.type_path(), "fpa_cache::key::method::tests::UserService");
        assert_eq!(key.key(), "fpa:key:method:tests:UserService:list_all");
    }

    #[test]
    fn test_method_key_with_argument() {
        let key = crate::method_key!(UserService::find)
            .with_argument(&Query { page: 2 })
            .unwrap();
        assert_eq!(
            key.key(),
            r#"fpa:key:method:tests:UserService:find:{"page":2}"#
        );
        assert_eq!(key.method(), "find");
    }

    #[test]
    fn test_explicit_owner_path() {
        let key = MethodKey::new("reports::MonthlyReport", "render");
        assert_eq!(key.key(), "reports:MonthlyReport:render");
    }

    #[test]
    fn test_method_key_namespace() {
        let key = MethodKey::new("my_app::services::UserService", "list_all");
        let _ = key.prefix();

        let rooted = key.with_namespace("fpa");
        assert_eq!(rooted.key(), "fpa:services:UserService:list_all");
    }

    #[test]
    fn test_method_key_same_call_same_key() {
        let a = crate::method_key!(UserService::by_id).with_argument(&42).unwrap();
        let b = crate::method_key!(UserService::by_id)
            .with_argument(&42)
            .unwrap()
            .with_expire(5, TimeUnit::Minutes);
        assert_eq!(a.key(), b.key());
        assert_eq!(b.expire_millis(), Some(300_000));
    }
}
