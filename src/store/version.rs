//! Version tokens attached to every stored configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, totally ordered marker of a configuration revision.
///
/// Backends supply the value (a Consul `ModifyIndex`, a file generation
/// counter). A reload applies only when the fetched token is strictly
/// greater than the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(u64);

impl VersionToken {
    /// Sentinel held by an empty store. Any real token exceeds it.
    pub const UNSET: VersionToken = VersionToken(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// The following token, saturating at `u64::MAX`.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u64> for VersionToken {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            write!(f, "unset")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_smallest() {
        assert!(VersionToken::UNSET.is_unset());
        assert!(VersionToken::new(1) > VersionToken::UNSET);
        assert_eq!(VersionToken::default(), VersionToken::UNSET);
    }

    #[test]
    fn test_next_saturates() {
        assert_eq!(VersionToken::new(4).next(), VersionToken::new(5));
        assert_eq!(VersionToken::new(u64::MAX).next().get(), u64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(VersionToken::UNSET.to_string(), "unset");
        assert_eq!(VersionToken::from(42).to_string(), "42");
    }
}
