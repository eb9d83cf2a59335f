//! Property-Based Tests for Cache Keys
//!
//! Uses proptest to check namespace isolation and key determinism.

use proptest::prelude::*;

use crate::key::{CacheKey, KeyMeta};

// == Test Variant ==
/// Variant whose type path is chosen by the test.
struct PathKey {
    path: &'static str,
    suffix: String,
    root: Option<&'static str>,
    meta: KeyMeta,
}

impl PathKey {
    fn new(path: &str, suffix: &str) -> Self {
        Self {
            path: Box::leak(path.to_string().into_boxed_str()),
            suffix: suffix.to_string(),
            root: None,
            meta: KeyMeta::new(),
        }
    }

    fn with_root(mut self, root: &'static str) -> Self {
        self.root = Some(root);
        self
    }
}

impl CacheKey for PathKey {
    fn type_path(&self) -> &'static str {
        self.path
    }

    fn suffix(&self) -> String {
        self.suffix.clone()
    }

    fn namespace(&self) -> Option<&'static str> {
        self.root
    }

    fn meta(&self) -> &KeyMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut KeyMeta {
        &mut self.meta
    }
}

// == Strategies ==
/// Type names as they appear in Rust paths
fn type_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,15}".prop_map(|s| s)
}

/// Module paths below the crate root
fn module_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9_]{0,7}", 0..3).prop_map(|segments| {
        segments
            .into_iter()
            .map(|segment| format!("::{}", segment))
            .collect()
    })
}

/// Suffixes built by callers (entity ids and the like)
fn suffix_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{0,12}".prop_map(|s| s)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For distinct variants in one module, keys never collide whatever the suffixes.
    #[test]
    fn prop_namespace_isolation(
        module in module_strategy(),
        first in type_name_strategy(),
        second in type_name_strategy(),
        first_suffix in suffix_strategy(),
        second_suffix in suffix_strategy()
    ) {
        prop_assume!(first != second);

        let a = PathKey::new(&format!("fpa_cache{}::{}", module, first), &first_suffix);
        let b = PathKey::new(&format!("fpa_cache{}::{}", module, second), &second_suffix);

        prop_assert_ne!(a.prefix(), b.prefix());
        prop_assert_ne!(a.key(), b.key());
    }

    // Repeated calls and fresh instances agree on the key.
    #[test]
    fn prop_key_determinism(
        module in module_strategy(),
        name in type_name_strategy(),
        suffix in suffix_strategy()
    ) {
        let path = format!("fpa_cache{}::{}", module, name);
        let key = PathKey::new(&path, &suffix);
        let fresh = PathKey::new(&path, &suffix);

        let first = key.key();
        prop_assert_eq!(&first, &key.key());
        prop_assert_eq!(&first, &fresh.key());
        prop_assert!(first.starts_with("fpa:"));
        prop_assert!(!key.prefix().is_empty());
        prop_assert!(!first.contains("::"));
    }

    // The suffix appears after exactly one separator, or not at all when empty.
    #[test]
    fn prop_key_composition(
        name in type_name_strategy(),
        suffix in suffix_strategy()
    ) {
        let key = PathKey::new(&format!("fpa_cache::{}", name), &suffix);
        let expected = if suffix.is_empty() {
            format!("fpa:{}", name)
        } else {
            format!("fpa:{}:{}", name, suffix)
        };
        prop_assert_eq!(key.key(), expected);
    }

    // A declared root replaces the crate segment and nothing else.
    #[test]
    fn prop_declared_root_keeps_module_path(
        crate_name in "[a-z][a-z0-9_]{0,7}",
        module in module_strategy(),
        name in type_name_strategy()
    ) {
        let key = PathKey::new(&format!("{}{}::{}", crate_name, module, name), "")
            .with_root("billing");
        let expected = format!("billing{}:{}", module.replace("::", ":"), name);
        prop_assert_eq!(key.prefix(), expected.as_str());
    }
}
