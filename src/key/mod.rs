//! Cache Key Module
//!
//! Typed cache keys: each variant derives its wire key from its own type path
//! plus a per-instance suffix, and carries an optional expiration.
//!
//! ```ignore
//! fpa_cache::cache_key! {
//!     /// Login session of one user.
//!     pub struct Session {
//!         pub user_id: String,
//!     }
//!     namespace = "fpa";
//!     suffix(this) => &this.user_id
//! }
//!
//! let key = Session::new("u42".into()).with_expire(30, TimeUnit::Minutes);
//! // declared at the root of the calling crate: "fpa:Session:u42"
//! ```

mod expire;
mod method;
mod namespace;

#[cfg(test)]
mod property_tests;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

pub use expire::{TimeUnit, Ttl};
pub use method::MethodKey;
pub use namespace::{prefix_for, prefix_for_root, NAMESPACE_ALIASES, SEPARATOR};

// == Key Metadata ==
/// Per-instance state shared by every key variant: the memoized prefix and
/// the expiration policy.
#[derive(Debug, Clone, Default)]
pub struct KeyMeta {
    /// Prefix derived from the variant's type path, computed on first use
    prefix: OnceLock<String>,
    /// Expiration amount; `None` leaves the stored TTL untouched
    expire: Option<u64>,
    /// Unit of `expire`
    expire_unit: TimeUnit,
}

impl KeyMeta {
    /// Creates metadata with no expiration, in milliseconds.
    pub fn new() -> Self {
        Self::default()
    }
}

// == Cache Key Trait ==
/// A logical cache key.
///
/// Implementors supply their type path, suffix and metadata; everything else
/// is derived. [`CacheKey::key`] is the only way a wire key is produced.
/// Most variants are declared with [`cache_key!`](crate::cache_key).
pub trait CacheKey: Send + Sync {
    /// Fully qualified path of the variant, fixed at compile time.
    fn type_path(&self) -> &'static str;

    /// Instance part of the key; empty means "no suffix".
    fn suffix(&self) -> String;

    fn meta(&self) -> &KeyMeta;

    fn meta_mut(&mut self) -> &mut KeyMeta;

    /// Root that replaces the crate segment of [`Self::type_path`];
    /// `None` keeps the crate root.
    fn namespace(&self) -> Option<&'static str> {
        None
    }

    /// Namespace prefix, derived once per instance.
    fn prefix(&self) -> &str {
        self.meta().prefix.get_or_init(|| match self.namespace() {
            Some(root) => namespace::prefix_for_root(self.type_path(), root),
            None => namespace::prefix_for(self.type_path()),
        })
    }

    /// Wire-level key: prefix, then `:suffix` when the suffix is non-empty.
    fn key(&self) -> String {
        let suffix = self.suffix();
        if suffix.is_empty() {
            self.prefix().to_string()
        } else {
            format!("{}{}{}", self.prefix(), SEPARATOR, suffix)
        }
    }

    fn expire(&self) -> Option<u64> {
        self.meta().expire
    }

    fn expire_unit(&self) -> TimeUnit {
        self.meta().expire_unit
    }

    fn set_expire(&mut self, expire: Option<u64>) {
        self.meta_mut().expire = expire;
    }

    fn set_expire_unit(&mut self, unit: TimeUnit) {
        self.meta_mut().expire_unit = unit;
    }

    /// Declared expiration in milliseconds, or `None` when the key leaves TTL
    /// alone. A positive expiration never rounds down to zero.
    fn expire_millis(&self) -> Option<u64> {
        self.expire()
            .filter(|amount| *amount > 0)
            .map(|amount| self.expire_unit().to_millis(amount).max(1))
    }

    /// Builder form of `set_expire` + `set_expire_unit`.
    fn with_expire(mut self, expire: u64, unit: TimeUnit) -> Self
    where
        Self: Sized,
    {
        self.set_expire(Some(expire));
        self.set_expire_unit(unit);
        self
    }
}

// == Identity by Wire Key ==
impl<'a> fmt::Display for dyn CacheKey + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl<'a> fmt::Debug for dyn CacheKey + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKey")
            .field("key", &self.key())
            .field("expire", &self.expire())
            .field("expire_unit", &self.expire_unit())
            .finish()
    }
}

impl<'a> PartialEq for dyn CacheKey + 'a {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<'a> Eq for dyn CacheKey + 'a {}

impl<'a> Hash for dyn CacheKey + 'a {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

// == Declaration Macro ==
/// Declares a key variant.
///
/// Generates the struct (with a hidden metadata field), a `new` constructor
/// taking the listed fields, the [`CacheKey`] impl with the type path taken
/// from the invocation site, and `Display`/`PartialEq`/`Eq`/`Hash` by wire key.
/// The suffix expression may evaluate to anything implementing `Display`.
///
/// An optional `namespace = "root";` before the suffix replaces the calling
/// crate's name in the prefix, so keys from any crate can share a root such
/// as `fpa`.
#[macro_export]
macro_rules! cache_key {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fattr:meta])* $fvis:vis $field:ident : $ty:ty),* $(,)?
        }
        $(namespace = $root:literal;)?
        suffix($this:ident) => $suffix:expr $(;)?
    ) => {
        $(#[$attr])*
        $vis struct $name {
            $($(#[$fattr])* $fvis $field: $ty,)*
            meta: $crate::KeyMeta,
        }

        $(
            const _: () = ::std::assert!(
                !<str>::is_empty($root),
                "cache key namespace must not be empty"
            );
        )?

        impl $name {
            /// Creates the key with no expiration.
            #[allow(clippy::new_without_default)]
            pub fn new($($field: $ty),*) -> Self {
                Self {
                    $($field,)*
                    meta: $crate::KeyMeta::new(),
                }
            }
        }

        impl $crate::CacheKey for $name {
            fn type_path(&self) -> &'static str {
                concat!(module_path!(), "::", stringify!($name))
            }

            $(
                fn namespace(&self) -> ::std::option::Option<&'static str> {
                    ::std::option::Option::Some($root)
                }
            )?

            fn suffix(&self) -> String {
                let $this = self;
                ::std::string::ToString::to_string(&$suffix)
            }

            fn meta(&self) -> &$crate::KeyMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::KeyMeta {
                &mut self.meta
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&$crate::CacheKey::key(self))
            }
        }

        impl ::std::cmp::PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                $crate::CacheKey::key(self) == $crate::CacheKey::key(other)
            }
        }

        impl ::std::cmp::Eq for $name {}

        impl ::std::hash::Hash for $name {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                ::std::hash::Hash::hash(&$crate::CacheKey::key(self), state);
            }
        }
    };
}
