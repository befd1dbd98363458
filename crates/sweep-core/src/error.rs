//! Error types for todo reconciliation
//!
//! Provides error handling for:
//! - Rejected entity kinds at the call boundary
//! - Store failures, propagated unchanged
//! - Job dispatch failures
//! - Configuration loading

use std::path::PathBuf;
use sweep_store::StoreError;

/// Main reconciliation error type
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Entity kind is neither `Project` nor `Group`
    #[error("invalid entity type: {0}")]
    InvalidEntityKind(String),

    /// A store collaborator failed
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// The rescan job could not be handed to the job queue
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl ReconcileError {
    /// Check if error is retryable
    ///
    /// Invalid kinds are caller bugs; everything else may succeed on a later
    /// attempt since reconciliation is idempotent.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidEntityKind(_) => false,
            Self::Store(err) => err.is_retryable(),
            Self::Dispatch(_) => true,
        }
    }
}

impl From<sweep_model::ParseEntityKindError> for ReconcileError {
    fn from(err: sweep_model::ParseEntityKindError) -> Self {
        Self::InvalidEntityKind(err.0)
    }
}

/// Job queue errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Consumer side of the queue is gone
    #[error("job queue closed")]
    Closed,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`SweepConfig`](crate::SweepConfig)
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_error_display() {
        let err = ReconcileError::InvalidEntityKind("GroupWrongly".to_string());
        assert_eq!(err.to_string(), "invalid entity type: GroupWrongly");
    }

    #[test]
    fn reconcile_error_is_retryable() {
        assert!(!ReconcileError::InvalidEntityKind("x".to_string()).is_retryable());
        assert!(ReconcileError::Store(StoreError::Unavailable("db".to_string())).is_retryable());
        assert!(!ReconcileError::Store(StoreError::Corrupted("row".to_string())).is_retryable());
        assert!(ReconcileError::Dispatch(DispatchError::Closed).is_retryable());
    }

    #[test]
    fn parse_error_converts_to_invalid_kind() {
        let err: ReconcileError = "Namespace"
            .parse::<sweep_model::EntityKind>()
            .unwrap_err()
            .into();
        assert!(matches!(err, ReconcileError::InvalidEntityKind(kind) if kind == "Namespace"));
    }
}
