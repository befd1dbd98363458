//! Record identifiers
//!
//! Every record is addressed by a numeric primary key. Each kind gets its own
//! newtype so a project id can never be passed where a group id is expected.

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value
            #[inline]
            #[must_use]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// User identifier
    UserId
);
record_id!(
    /// Group identifier
    GroupId
);
record_id!(
    /// Project identifier
    ProjectId
);
record_id!(
    /// Issue identifier
    IssueId
);
record_id!(
    /// Merge request identifier
    MergeRequestId
);
record_id!(
    /// Todo identifier
    TodoId
);
