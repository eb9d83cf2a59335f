//! Expiration Module
//!
//! Time units for key expiration and the remaining-TTL result type.

// == Time Unit ==
/// Unit a key's `expire` value is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Nanoseconds in one unit.
    fn nanos(self) -> u128 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 3_600 * 1_000_000_000,
            TimeUnit::Days => 86_400 * 1_000_000_000,
        }
    }

    /// Converts `amount` of this unit to milliseconds, truncating and saturating.
    pub fn to_millis(self, amount: u64) -> u64 {
        let millis = u128::from(amount) * self.nanos() / TimeUnit::Milliseconds.nanos();
        u64::try_from(millis).unwrap_or(u64::MAX)
    }

    /// Converts milliseconds to this unit, truncating and saturating.
    pub fn from_millis(self, millis: u64) -> u64 {
        let amount = u128::from(millis) * TimeUnit::Milliseconds.nanos() / self.nanos();
        u64::try_from(amount).unwrap_or(u64::MAX)
    }
}

// == Remaining TTL ==
/// Remaining lifetime of a stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key expires after this many units
    Remaining(u64),
    /// Key exists without an expiration
    Persistent,
    /// Key does not exist
    Missing,
}

impl Ttl {
    /// Builds a Ttl from a store PTTL reply (-2 missing, -1 persistent).
    pub fn from_pttl(pttl: i64, unit: TimeUnit) -> Self {
        match pttl {
            -2 => Ttl::Missing,
            ms if ms < 0 => Ttl::Persistent,
            ms => Ttl::Remaining(unit.from_millis(ms.unsigned_abs())),
        }
    }

    /// Remaining units, if the key expires.
    pub fn remaining(self) -> Option<u64> {
        match self {
            Ttl::Remaining(amount) => Some(amount),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_unit_is_millis() {
        assert_eq!(TimeUnit::default(), TimeUnit::Milliseconds);
    }

    #[test]
    fn test_to_millis() {
        assert_eq!(TimeUnit::Seconds.to_millis(3), 3_000);
        assert_eq!(TimeUnit::Minutes.to_millis(2), 120_000);
        assert_eq!(TimeUnit::Days.to_millis(1), 86_400_000);
        assert_eq!(TimeUnit::Microseconds.to_millis(2_500), 2);
        assert_eq!(TimeUnit::Nanoseconds.to_millis(999_999), 0);
    }

    #[test]
    fn test_to_millis_saturates() {
        assert_eq!(TimeUnit::Days.to_millis(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_from_millis() {
        assert_eq!(TimeUnit::Seconds.from_millis(59_999), 59);
        assert_eq!(TimeUnit::Milliseconds.from_millis(42), 42);
        assert_eq!(TimeUnit::Microseconds.from_millis(3), 3_000);
    }

    #[test]
    fn test_ttl_from_pttl() {
        assert_eq!(Ttl::from_pttl(-2, TimeUnit::Seconds), Ttl::Missing);
        assert_eq!(Ttl::from_pttl(-1, TimeUnit::Seconds), Ttl::Persistent);
        assert_eq!(Ttl::from_pttl(4_500, TimeUnit::Seconds), Ttl::Remaining(4));
        assert_eq!(Ttl::from_pttl(4_500, TimeUnit::Milliseconds).remaining(), Some(4_500));
        assert_eq!(Ttl::Persistent.remaining(), None);
    }
}
