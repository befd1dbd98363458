//! Reconciler configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use sweep_model::AccessLevel;

/// Reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Minimum access that reveals confidential issues
    pub confidential_access: AccessLevel,
    /// Whether leaving a non-private entity schedules a private-features rescan
    pub enqueue_private_features: bool,
    /// Whether members of a subgroup or project can still see the groups above it
    pub group_visible_through_descendants: bool,
}

impl SweepConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With confidential access threshold
    #[inline]
    #[must_use]
    pub fn with_confidential_access(mut self, level: AccessLevel) -> Self {
        self.confidential_access = level;
        self
    }

    /// With rescan scheduling switched on or off
    #[inline]
    #[must_use]
    pub fn with_private_features_rescan(mut self, enabled: bool) -> Self {
        self.enqueue_private_features = enabled;
        self
    }

    /// With group visibility through descendant memberships
    #[inline]
    #[must_use]
    pub fn with_group_visible_through_descendants(mut self, enabled: bool) -> Self {
        self.group_visible_through_descendants = enabled;
        self
    }

    /// Parse from TOML; missing keys keep their defaults
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML or unknown access levels.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, `ConfigError::Parse` if
    /// its contents are invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            confidential_access: AccessLevel::Reporter,
            enqueue_private_features: true,
            group_visible_through_descendants: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = SweepConfig::new();
        assert_eq!(config.confidential_access, AccessLevel::Reporter);
        assert!(config.enqueue_private_features);
        assert!(config.group_visible_through_descendants);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SweepConfig::from_toml_str("confidential_access = \"developer\"").unwrap();
        assert_eq!(config.confidential_access, AccessLevel::Developer);
        assert!(config.enqueue_private_features);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let err = SweepConfig::from_toml_str("confidential_access = \"admin\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "enqueue_private_features = false").unwrap();

        let config = SweepConfig::from_path(file.path()).unwrap();
        assert!(!config.enqueue_private_features);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SweepConfig::from_path("/nonexistent/sweep.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn builder_methods() {
        let config = SweepConfig::new()
            .with_confidential_access(AccessLevel::Maintainer)
            .with_private_features_rescan(false)
            .with_group_visible_through_descendants(false);
        assert_eq!(config.confidential_access, AccessLevel::Maintainer);
        assert!(!config.enqueue_private_features);
        assert!(!config.group_visible_through_descendants);
    }
}
