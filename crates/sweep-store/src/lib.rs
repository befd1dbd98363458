//! Store collaborators for todo reconciliation
//!
//! - [`EntityStore`], [`MembershipStore`], [`IssueStore`], [`TodoStore`]:
//!   the persistence seams, as async traits
//! - [`AccessEvaluator`]: effective access with group inheritance
//! - [`DeletionPlan`]: predicate for one set-based todo delete
//! - [`MemoryStore`]: in-memory backend used by tests and the CLI

#![warn(unreachable_pub)]

pub mod access;
pub mod error;
pub mod memory;
pub mod plan;
pub mod traits;

pub use access::{AccessEvaluator, HierarchyAccess};
pub use error::StoreError;
pub use memory::{MemoryStore, Snapshot};
pub use plan::{DeletionPlan, DeletionRule};
pub use traits::{Entity, EntityStore, IssueStore, MembershipStore, TodoStore};
