//! Error types for store collaborators

use sweep_model::GroupId;

/// Failure reported by a backing store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data violates a structural invariant
    #[error("corrupted record: {0}")]
    Corrupted(String),

    /// Group parent pointers loop back on themselves
    #[error("group hierarchy cycle at group {group}")]
    HierarchyCycle {
        /// First group seen twice
        group: GroupId,
    },
}

impl StoreError {
    /// Check if error is transient
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
