//! Namespace Module
//!
//! Maps a key variant's type path to its colon-delimited wire prefix.

/// Separator between wire key segments
pub const SEPARATOR: &str = ":";

/// Separator between Rust path segments
const PATH_SEPARATOR: &str = "::";

/// Crate roots rewritten to short aliases when deriving prefixes.
///
/// Applies to a variant's own crate root and to a root declared with
/// `namespace = "..."` in [`cache_key!`](crate::cache_key). Changing an entry
/// changes every wire key under that root, so existing data becomes
/// unreachable.
///
/// Alias outputs are reserved roots: a crate literally named `fpa` derives
/// the same prefixes as the aliased `fpa_cache`, so its keys share (and may
/// collide with) that namespace. Declaring `namespace = "fpa"` opts into the
/// same sharing on purpose.
pub const NAMESPACE_ALIASES: &[(&str, &str)] = &[("fpa_cache", "fpa")];

// == Prefix Derivation ==
/// Derives the wire prefix for a type path such as `fpa_cache::keys::Session`.
///
/// The leading root is rewritten through [`NAMESPACE_ALIASES`] (only whole
/// segments match), then every `::` becomes `:`.
pub fn prefix_for(type_path: &str) -> String {
    let aliased = NAMESPACE_ALIASES
        .iter()
        .find_map(|(root, alias)| {
            type_path
                .strip_prefix(root)
                .filter(|rest| rest.is_empty() || rest.starts_with(PATH_SEPARATOR))
                .map(|rest| format!("{}{}", alias, rest))
        })
        .unwrap_or_else(|| type_path.to_string());

    aliased.replace(PATH_SEPARATOR, SEPARATOR)
}

/// Derives the wire prefix with the crate root of `type_path` replaced by
/// `root`; the aliases then apply to `root` as they would to a crate root.
///
/// `my_app::keys::Session` under root `fpa` becomes `fpa:keys:Session`.
pub fn prefix_for_root(type_path: &str, root: &str) -> String {
    let below_root = type_path
        .find(PATH_SEPARATOR)
        .map_or("", |at| &type_path[at..]);
    prefix_for(&format!("{}{}", root, below_root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_at_root() {
        assert_eq!(prefix_for("fpa_cache::Session"), "fpa:Session");
    }

    #[test]
    fn test_alias_with_modules() {
        assert_eq!(
            prefix_for("fpa_cache::keys::user::Profile"),
            "fpa:keys:user:Profile"
        );
    }

    #[test]
    fn test_alias_matches_whole_segment_only() {
        assert_eq!(prefix_for("fpa_cache_ext::Session"), "fpa_cache_ext:Session");
    }

    #[test]
    fn test_unaliased_root() {
        assert_eq!(prefix_for("billing::invoice::Draft"), "billing:invoice:Draft");
    }

    #[test]
    fn test_alias_only_at_start() {
        assert_eq!(prefix_for("app::fpa_cache::Token"), "app:fpa_cache:Token");
    }

    #[test]
    fn test_root_replaces_caller_crate() {
        assert_eq!(prefix_for_root("my_app::Session", "fpa"), "fpa:Session");
        assert_eq!(
            prefix_for_root("my_app::keys::user::Profile", "fpa"),
            "fpa:keys:user:Profile"
        );
    }

    #[test]
    fn test_root_goes_through_aliases() {
        assert_eq!(prefix_for_root("my_app::Session", "fpa_cache"), "fpa:Session");
        assert_eq!(prefix_for_root("my_app::Session", "billing"), "billing:Session");
    }

    #[test]
    fn test_alias_output_is_a_reserved_root() {
        // A crate named like an alias output lands in the aliased namespace
        assert_eq!(prefix_for("fpa::Session"), prefix_for("fpa_cache::Session"));
        assert_ne!(prefix_for("fpa::Session"), prefix_for("fpa_x::Session"));
    }
}
