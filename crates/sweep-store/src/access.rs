//! Effective access evaluation
//!
//! Access is inherited downwards: a grant on a group applies to every subgroup
//! and project beneath it. The effective level of a user on an entity is the
//! maximum explicit grant found walking from the entity up to the root group.
//! A level with no grant contributes nothing; it never revokes.

use crate::error::StoreError;
use crate::traits::{EntityStore, MembershipStore};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use sweep_model::{AccessLevel, EntityRef, GroupId, UserId};

/// Answers "what can this user see" questions
#[async_trait]
pub trait AccessEvaluator: Send + Sync {
    /// Maximum access held on the entity, directly or through ancestors
    async fn effective_access(
        &self,
        user: UserId,
        entity: EntityRef,
    ) -> Result<Option<AccessLevel>, StoreError>;

    /// Whether the user can still see the group
    async fn can_read_group(&self, user: UserId, group: GroupId) -> Result<bool, StoreError>;
}

/// Access evaluator walking the group hierarchy
#[derive(Clone)]
pub struct HierarchyAccess {
    entities: Arc<dyn EntityStore>,
    memberships: Arc<dyn MembershipStore>,
    /// Members of anything below a group can see the group itself
    descendant_visibility: bool,
}

impl std::fmt::Debug for HierarchyAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyAccess")
            .field("descendant_visibility", &self.descendant_visibility)
            .finish_non_exhaustive()
    }
}

impl HierarchyAccess {
    /// Create evaluator over the given stores
    #[inline]
    #[must_use]
    pub fn new(entities: Arc<dyn EntityStore>, memberships: Arc<dyn MembershipStore>) -> Self {
        Self {
            entities,
            memberships,
            descendant_visibility: true,
        }
    }

    /// Toggle group visibility through descendant memberships
    #[inline]
    #[must_use]
    pub fn with_descendant_visibility(mut self, enabled: bool) -> Self {
        self.descendant_visibility = enabled;
        self
    }

    /// Fold direct grants over a group and its ancestors
    async fn inherited_from(
        &self,
        user: UserId,
        group: GroupId,
    ) -> Result<Option<AccessLevel>, StoreError> {
        let mut best = None;
        for ancestor in self.entities.ancestors(group).await? {
            let granted = self
                .memberships
                .direct_access(user, EntityRef::Group(ancestor.id))
                .await?;
            best = best.max(granted);
        }
        Ok(best)
    }

    /// Whether the user holds a grant anywhere strictly below the group
    async fn member_of_descendant(&self, user: UserId, group: GroupId) -> Result<bool, StoreError> {
        let memberships = self.memberships.memberships_of(user).await?;
        if memberships.is_empty() {
            return Ok(false);
        }

        let subtree: HashSet<GroupId> = self
            .entities
            .self_and_descendant_groups(group)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();

        for membership in memberships {
            let inside = match membership.source {
                EntityRef::Group(id) => id != group && subtree.contains(&id),
                EntityRef::Project(id) => self
                    .entities
                    .find_project(id)
                    .await?
                    .and_then(|project| project.namespace)
                    .is_some_and(|namespace| subtree.contains(&namespace)),
            };
            if inside {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[async_trait]
impl AccessEvaluator for HierarchyAccess {
    async fn effective_access(
        &self,
        user: UserId,
        entity: EntityRef,
    ) -> Result<Option<AccessLevel>, StoreError> {
        match entity {
            EntityRef::Group(id) => self.inherited_from(user, id).await,
            EntityRef::Project(id) => {
                let Some(project) = self.entities.find_project(id).await? else {
                    return Ok(None);
                };
                let direct = self.memberships.direct_access(user, entity).await?;
                let inherited = match project.namespace {
                    Some(namespace) => self.inherited_from(user, namespace).await?,
                    None => None,
                };
                Ok(direct.max(inherited))
            }
        }
    }

    async fn can_read_group(&self, user: UserId, group: GroupId) -> Result<bool, StoreError> {
        if self
            .effective_access(user, EntityRef::Group(group))
            .await?
            .is_some()
        {
            return Ok(true);
        }

        if self.descendant_visibility {
            return self.member_of_descendant(user, group).await;
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use sweep_model::{Group, Project, ProjectId, Visibility};

    fn evaluator(store: &Arc<MemoryStore>) -> HierarchyAccess {
        HierarchyAccess::new(store.clone(), store.clone())
    }

    fn nested_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.insert_group(Group::new(GroupId(1), Visibility::Private));
        store.insert_group(Group::new(GroupId(2), Visibility::Private).with_parent(GroupId(1)));
        store.insert_group(Group::new(GroupId(3), Visibility::Private).with_parent(GroupId(2)));
        store.insert_project(Project::new(ProjectId(10), Visibility::Private).in_group(GroupId(3)));
        Arc::new(store)
    }

    #[tokio::test]
    async fn no_grants_means_no_access() {
        let store = nested_store();
        let access = evaluator(&store)
            .effective_access(UserId(1), EntityRef::Project(ProjectId(10)))
            .await
            .unwrap();
        assert_eq!(access, None);
    }

    #[tokio::test]
    async fn access_is_inherited_from_root_group() {
        let store = nested_store();
        store.add_member(UserId(1), GroupId(1), AccessLevel::Reporter);

        let access = evaluator(&store)
            .effective_access(UserId(1), EntityRef::Project(ProjectId(10)))
            .await
            .unwrap();
        assert_eq!(access, Some(AccessLevel::Reporter));
    }

    #[tokio::test]
    async fn effective_access_takes_maximum_of_chain() {
        let store = nested_store();
        store.add_member(UserId(1), GroupId(1), AccessLevel::Developer);
        store.add_member(UserId(1), ProjectId(10), AccessLevel::Guest);

        let access = evaluator(&store)
            .effective_access(UserId(1), EntityRef::Project(ProjectId(10)))
            .await
            .unwrap();
        assert_eq!(access, Some(AccessLevel::Developer));
    }

    #[tokio::test]
    async fn grants_do_not_flow_upwards() {
        let store = nested_store();
        store.add_member(UserId(1), GroupId(3), AccessLevel::Owner);

        let access = evaluator(&store)
            .effective_access(UserId(1), EntityRef::Group(GroupId(2)))
            .await
            .unwrap();
        assert_eq!(access, None);
    }

    #[tokio::test]
    async fn project_members_can_read_enclosing_groups() {
        let store = nested_store();
        store.add_member(UserId(1), ProjectId(10), AccessLevel::Developer);

        let eval = evaluator(&store);
        assert!(eval.can_read_group(UserId(1), GroupId(1)).await.unwrap());
        assert!(eval.can_read_group(UserId(1), GroupId(3)).await.unwrap());

        let strict = eval.with_descendant_visibility(false);
        assert!(!strict.can_read_group(UserId(1), GroupId(1)).await.unwrap());
    }

    #[tokio::test]
    async fn sibling_membership_does_not_reveal_group() {
        let store = nested_store();
        store.insert_group(Group::new(GroupId(4), Visibility::Private).with_parent(GroupId(1)));
        store.add_member(UserId(1), GroupId(4), AccessLevel::Developer);

        let eval = evaluator(&store);
        assert!(!eval.can_read_group(UserId(1), GroupId(2)).await.unwrap());
        assert!(eval.can_read_group(UserId(1), GroupId(1)).await.unwrap());
    }
}
