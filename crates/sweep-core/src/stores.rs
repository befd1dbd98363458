//! Collaborator bundle shared by the services

use crate::config::SweepConfig;
use std::sync::Arc;
use sweep_store::{AccessEvaluator, EntityStore, HierarchyAccess, IssueStore, MemoryStore, TodoStore};

/// Handles to every store a service needs
#[derive(Clone)]
pub struct Stores {
    /// Group and project lookups
    pub entities: Arc<dyn EntityStore>,
    /// Effective access evaluation
    pub access: Arc<dyn AccessEvaluator>,
    /// Issue lookups
    pub issues: Arc<dyn IssueStore>,
    /// Todo queries and deletion
    pub todos: Arc<dyn TodoStore>,
}

impl Stores {
    /// Wire every collaborator to one in-memory store
    #[must_use]
    pub fn in_memory(store: Arc<MemoryStore>, config: &SweepConfig) -> Self {
        let access = HierarchyAccess::new(store.clone(), store.clone())
            .with_descendant_visibility(config.group_visible_through_descendants);

        Self {
            entities: store.clone(),
            access: Arc::new(access),
            issues: store.clone(),
            todos: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
