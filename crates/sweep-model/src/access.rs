//! Access levels and visibility
//!
//! Access levels are totally ordered; a user without any grant simply has no
//! level (`Option<AccessLevel>::None`), which sorts below every real level.

use serde::{Deserialize, Serialize};

/// Membership access level (ordered lowest to highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Can see non-confidential content of the container
    Guest,
    /// Can also see confidential issues
    Reporter,
    /// Can push code
    Developer,
    /// Can manage the container
    Maintainer,
    /// Full control
    Owner,
}

impl AccessLevel {
    /// Get numeric value as stored by the membership tables
    #[inline]
    #[must_use]
    pub fn value(&self) -> u8 {
        match self {
            AccessLevel::Guest => 10,
            AccessLevel::Reporter => 20,
            AccessLevel::Developer => 30,
            AccessLevel::Maintainer => 40,
            AccessLevel::Owner => 50,
        }
    }

    /// Build from the stored numeric value
    #[must_use]
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            10 => Some(AccessLevel::Guest),
            20 => Some(AccessLevel::Reporter),
            30 => Some(AccessLevel::Developer),
            40 => Some(AccessLevel::Maintainer),
            50 => Some(AccessLevel::Owner),
            _ => None,
        }
    }

    /// Whether `granted` reaches at least this level
    #[inline]
    #[must_use]
    pub fn satisfied_by(self, granted: Option<AccessLevel>) -> bool {
        granted.is_some_and(|level| level >= self)
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AccessLevel::Guest => "guest",
            AccessLevel::Reporter => "reporter",
            AccessLevel::Developer => "developer",
            AccessLevel::Maintainer => "maintainer",
            AccessLevel::Owner => "owner",
        };
        f.write_str(name)
    }
}

/// Container visibility
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only members can see the container
    #[default]
    Private,
    /// Any signed-in user can see the container
    Internal,
    /// Everyone can see the container
    Public,
}

impl Visibility {
    /// Check if visibility is private
    #[inline]
    #[must_use]
    pub fn is_private(&self) -> bool {
        matches!(self, Visibility::Private)
    }
}

/// Access setting of a single project feature (issues, merge requests, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureAccess {
    /// Feature is switched off for everyone
    Disabled,
    /// Feature is visible to project members only
    Private,
    /// Feature follows the project visibility
    #[default]
    Enabled,
}

impl FeatureAccess {
    /// Whether a user holding `access` on a visible project can use the feature
    #[inline]
    #[must_use]
    pub fn admits(&self, access: Option<AccessLevel>) -> bool {
        match self {
            FeatureAccess::Disabled => false,
            FeatureAccess::Private => access.is_some(),
            FeatureAccess::Enabled => true,
        }
    }

    /// Check if the feature is restricted beyond the project visibility
    #[inline]
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        !matches!(self, FeatureAccess::Enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_level() -> impl Strategy<Value = AccessLevel> {
        prop_oneof![
            Just(AccessLevel::Guest),
            Just(AccessLevel::Reporter),
            Just(AccessLevel::Developer),
            Just(AccessLevel::Maintainer),
            Just(AccessLevel::Owner),
        ]
    }

    proptest! {
        #[test]
        fn prop_value_order_matches_level_order(a in any_level(), b in any_level()) {
            prop_assert_eq!(a.cmp(&b), a.value().cmp(&b.value()));
        }

        #[test]
        fn prop_satisfied_by_is_monotone(required in any_level(), granted in any_level()) {
            if required.satisfied_by(Some(granted)) {
                prop_assert!(granted >= required);
                prop_assert!(required.satisfied_by(Some(AccessLevel::Owner)));
            }
        }
    }

    #[test]
    fn access_levels_are_ordered() {
        assert!(AccessLevel::Guest < AccessLevel::Reporter);
        assert!(AccessLevel::Reporter < AccessLevel::Developer);
        assert!(AccessLevel::Maintainer < AccessLevel::Owner);
        assert!(None < Some(AccessLevel::Guest));
    }

    #[test]
    fn access_level_value_roundtrip() {
        for level in [
            AccessLevel::Guest,
            AccessLevel::Reporter,
            AccessLevel::Developer,
            AccessLevel::Maintainer,
            AccessLevel::Owner,
        ] {
            assert_eq!(AccessLevel::from_value(level.value()), Some(level));
        }
        assert_eq!(AccessLevel::from_value(15), None);
    }

    #[test]
    fn satisfied_by_compares_with_grant() {
        assert!(AccessLevel::Reporter.satisfied_by(Some(AccessLevel::Developer)));
        assert!(!AccessLevel::Reporter.satisfied_by(Some(AccessLevel::Guest)));
        assert!(!AccessLevel::Guest.satisfied_by(None));
    }

    #[test]
    fn feature_access_admits() {
        assert!(FeatureAccess::Enabled.admits(None));
        assert!(!FeatureAccess::Private.admits(None));
        assert!(FeatureAccess::Private.admits(Some(AccessLevel::Guest)));
        assert!(!FeatureAccess::Disabled.admits(Some(AccessLevel::Owner)));
    }

    #[test]
    fn visibility_private_check() {
        assert!(Visibility::Private.is_private());
        assert!(!Visibility::Internal.is_private());
        assert!(!Visibility::Public.is_private());
    }
}
