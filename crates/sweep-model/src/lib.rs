//! Domain types for todo visibility reconciliation
//!
//! Defines the records the reconciler reasons about:
//! - Identifiers for users, containers, and todo targets
//! - Access levels and container visibility
//! - Groups, projects, and memberships
//! - Issues, merge requests, and the todos that point at them

#![warn(unreachable_pub)]

pub mod access;
pub mod entity;
pub mod ids;
pub mod todo;

pub use access::{AccessLevel, FeatureAccess, Visibility};
pub use entity::{
    EntityKind, EntityRef, Group, Membership, ParseEntityKindError, Project, ProjectFeatures,
};
pub use ids::{GroupId, IssueId, MergeRequestId, ProjectId, TodoId, UserId};
pub use todo::{Issue, MergeRequest, Todo, TodoScope, TodoTarget};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the domain model
    pub use crate::{
        AccessLevel, EntityKind, EntityRef, FeatureAccess, Group, GroupId, Issue, IssueId,
        Membership, MergeRequest, MergeRequestId, Project, ProjectId, Todo, TodoId, TodoScope,
        TodoTarget, UserId, Visibility,
    };
}
