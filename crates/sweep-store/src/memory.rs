//! In-memory backend implementing every store trait
//!
//! Records live in ordered tables behind a single `RwLock`, so a
//! [`DeletionPlan`] is applied under one write guard and concurrent readers
//! either see all of its deletions or none of them. Memberships are indexed
//! per user in a `DashMap`.

use crate::error::StoreError;
use crate::plan::DeletionPlan;
use crate::traits::{EntityStore, IssueStore, MembershipStore, TodoStore};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use sweep_model::{
    AccessLevel, EntityRef, Group, GroupId, Issue, IssueId, Membership, MergeRequest,
    MergeRequestId, Project, ProjectId, Todo, TodoId, TodoScope, TodoTarget, UserId,
};

/// Serializable dump of a [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Groups
    #[serde(default)]
    pub groups: Vec<Group>,
    /// Projects
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Issues
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Merge requests
    #[serde(default)]
    pub merge_requests: Vec<MergeRequest>,
    /// Memberships
    #[serde(default)]
    pub memberships: Vec<Membership>,
    /// Todos
    #[serde(default)]
    pub todos: Vec<Todo>,
}

#[derive(Debug, Default)]
struct Tables {
    groups: BTreeMap<GroupId, Group>,
    projects: BTreeMap<ProjectId, Project>,
    issues: BTreeMap<IssueId, Issue>,
    merge_requests: BTreeMap<MergeRequestId, MergeRequest>,
    todos: BTreeMap<TodoId, Todo>,
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    /// user -> grants held by that user
    memberships: DashMap<UserId, Vec<Membership>>,
    next_todo_id: AtomicU64,
    /// When set, every trait call fails with `StoreError::Unavailable`
    outage: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot
    ///
    /// # Errors
    /// `StoreError::Corrupted` if a todo id appears twice.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let store = Self::new();
        for group in snapshot.groups {
            store.insert_group(group);
        }
        for project in snapshot.projects {
            store.insert_project(project);
        }
        for issue in snapshot.issues {
            store.insert_issue(issue);
        }
        for merge_request in snapshot.merge_requests {
            store.insert_merge_request(merge_request);
        }
        for membership in snapshot.memberships {
            store.add_member(membership.user, membership.source, membership.access);
        }

        let mut tables = store.tables.write();
        for todo in snapshot.todos {
            let id = todo.id;
            if tables.todos.insert(id, todo).is_some() {
                return Err(StoreError::Corrupted(format!("duplicate todo id {id}")));
            }
            store.next_todo_id.fetch_max(id.0, Ordering::Relaxed);
        }
        drop(tables);

        Ok(store)
    }

    /// Dump the current contents
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read();
        let mut memberships: Vec<Membership> = self
            .memberships
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        memberships.sort_by_key(|m| (m.user, m.source));

        Snapshot {
            groups: tables.groups.values().cloned().collect(),
            projects: tables.projects.values().cloned().collect(),
            issues: tables.issues.values().cloned().collect(),
            merge_requests: tables.merge_requests.values().cloned().collect(),
            memberships,
            todos: tables.todos.values().cloned().collect(),
        }
    }

    /// Insert or replace a group
    pub fn insert_group(&self, group: Group) {
        self.tables.write().groups.insert(group.id, group);
    }

    /// Insert or replace a project
    pub fn insert_project(&self, project: Project) {
        self.tables.write().projects.insert(project.id, project);
    }

    /// Insert or replace an issue
    pub fn insert_issue(&self, issue: Issue) {
        self.tables.write().issues.insert(issue.id, issue);
    }

    /// Modify an issue in place
    ///
    /// Returns `false` if the issue does not exist.
    pub fn update_issue(&self, id: IssueId, f: impl FnOnce(&mut Issue)) -> bool {
        match self.tables.write().issues.get_mut(&id) {
            Some(issue) => {
                f(issue);
                true
            }
            None => false,
        }
    }

    /// Modify a group in place
    ///
    /// Returns `false` if the group does not exist.
    pub fn update_group(&self, id: GroupId, f: impl FnOnce(&mut Group)) -> bool {
        match self.tables.write().groups.get_mut(&id) {
            Some(group) => {
                f(group);
                true
            }
            None => false,
        }
    }

    /// Modify a project in place
    ///
    /// Returns `false` if the project does not exist.
    pub fn update_project(&self, id: ProjectId, f: impl FnOnce(&mut Project)) -> bool {
        match self.tables.write().projects.get_mut(&id) {
            Some(project) => {
                f(project);
                true
            }
            None => false,
        }
    }

    /// Insert or replace a merge request
    pub fn insert_merge_request(&self, merge_request: MergeRequest) {
        self.tables
            .write()
            .merge_requests
            .insert(merge_request.id, merge_request);
    }

    /// Grant access, replacing any existing grant on the same entity
    pub fn add_member(&self, user: UserId, source: impl Into<EntityRef>, access: AccessLevel) {
        let membership = Membership::new(user, source, access);
        let mut grants = self.memberships.entry(user).or_default();
        grants.retain(|m| m.source != membership.source);
        grants.push(membership);
    }

    /// Revoke the grant on an entity
    ///
    /// Returns `true` if a grant was removed.
    pub fn remove_member(&self, user: UserId, source: impl Into<EntityRef>) -> bool {
        let source = source.into();
        let Some(mut grants) = self.memberships.get_mut(&user) else {
            return false;
        };
        let before = grants.len();
        grants.retain(|m| m.source != source);
        before != grants.len()
    }

    /// Create a todo with the next free id
    pub fn insert_todo(&self, owner: UserId, target: TodoTarget, scope: TodoScope) -> TodoId {
        let id = TodoId(self.next_todo_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.tables
            .write()
            .todos
            .insert(id, Todo::new(id, owner, target, scope));
        id
    }

    /// Check whether a todo still exists
    #[must_use]
    pub fn contains_todo(&self, id: TodoId) -> bool {
        self.tables.read().todos.contains_key(&id)
    }

    /// Simulate a backend outage
    pub fn set_outage(&self, reason: Option<&str>) {
        *self.outage.lock() = reason.map(str::to_string);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        match self.outage.lock().as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        self.check_available()?;
        Ok(self.tables.read().groups.get(&id).cloned())
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        self.check_available()?;
        Ok(self.tables.read().projects.get(&id).cloned())
    }

    async fn child_groups(&self, id: GroupId) -> Result<Vec<Group>, StoreError> {
        self.check_available()?;
        Ok(self
            .tables
            .read()
            .groups
            .values()
            .filter(|g| g.parent == Some(id))
            .cloned()
            .collect())
    }

    async fn projects_in_group(&self, id: GroupId) -> Result<Vec<Project>, StoreError> {
        self.check_available()?;
        Ok(self
            .tables
            .read()
            .projects
            .values()
            .filter(|p| p.namespace == Some(id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn direct_access(
        &self,
        user: UserId,
        entity: EntityRef,
    ) -> Result<Option<AccessLevel>, StoreError> {
        self.check_available()?;
        Ok(self.memberships.get(&user).and_then(|grants| {
            grants
                .iter()
                .filter(|m| m.source == entity)
                .map(|m| m.access)
                .max()
        }))
    }

    async fn memberships_of(&self, user: UserId) -> Result<Vec<Membership>, StoreError> {
        self.check_available()?;
        Ok(self
            .memberships
            .get(&user)
            .map(|grants| grants.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn confidential_issues(&self, projects: &[ProjectId]) -> Result<Vec<Issue>, StoreError> {
        self.check_available()?;
        Ok(self
            .tables
            .read()
            .issues
            .values()
            .filter(|issue| issue.confidential && projects.contains(&issue.project))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn todos_for_user(&self, owner: UserId) -> Result<Vec<Todo>, StoreError> {
        self.check_available()?;
        Ok(self
            .tables
            .read()
            .todos
            .values()
            .filter(|todo| todo.owner == owner)
            .cloned()
            .collect())
    }

    async fn todos_in_project(&self, project: ProjectId) -> Result<Vec<Todo>, StoreError> {
        self.check_available()?;
        Ok(self
            .tables
            .read()
            .todos
            .values()
            .filter(|todo| todo.scope == TodoScope::Project(project))
            .cloned()
            .collect())
    }

    async fn todo_count(&self) -> Result<usize, StoreError> {
        self.check_available()?;
        Ok(self.tables.read().todos.len())
    }

    async fn delete_matching(&self, plan: &DeletionPlan) -> Result<usize, StoreError> {
        self.check_available()?;
        if plan.is_empty() {
            return Ok(0);
        }

        let mut tables = self.tables.write();
        let before = tables.todos.len();
        tables.todos.retain(|_, todo| !plan.matches(todo));
        let removed = before - tables.todos.len();

        tracing::trace!(removed, rules = plan.len(), "applied deletion plan");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::DeletionRule;
    use pretty_assertions::assert_eq;
    use sweep_model::Visibility;

    #[tokio::test]
    async fn todos_get_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.insert_todo(UserId(1), TodoTarget::Group, TodoScope::Group(GroupId(1)));
        let b = store.insert_todo(UserId(1), TodoTarget::Group, TodoScope::Group(GroupId(1)));
        assert_eq!(a, TodoId(1));
        assert_eq!(b, TodoId(2));
        assert_eq!(store.todo_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_matching_removes_only_selected() {
        let store = MemoryStore::new();
        let keep = store.insert_todo(UserId(2), TodoTarget::Group, TodoScope::Group(GroupId(1)));
        let gone = store.insert_todo(UserId(1), TodoTarget::Group, TodoScope::Group(GroupId(1)));

        let plan = DeletionPlan::for_owner(UserId(1))
            .with_rule(DeletionRule::GroupTodos { group: GroupId(1) });
        let removed = store.delete_matching(&plan).await.unwrap();

        assert_eq!(removed, 1);
        assert!(store.contains_todo(keep));
        assert!(!store.contains_todo(gone));
    }

    #[tokio::test]
    async fn add_member_replaces_existing_grant() {
        let store = MemoryStore::new();
        store.add_member(UserId(1), GroupId(1), AccessLevel::Guest);
        store.add_member(UserId(1), GroupId(1), AccessLevel::Maintainer);

        let access = store
            .direct_access(UserId(1), EntityRef::Group(GroupId(1)))
            .await
            .unwrap();
        assert_eq!(access, Some(AccessLevel::Maintainer));
        assert_eq!(store.memberships_of(UserId(1)).await.unwrap().len(), 1);

        assert!(store.remove_member(UserId(1), GroupId(1)));
        assert!(!store.remove_member(UserId(1), GroupId(1)));
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let store = MemoryStore::new();
        store.set_outage(Some("maintenance"));

        let err = store.todo_count().await.unwrap_err();
        assert_eq!(err, StoreError::Unavailable("maintenance".to_string()));

        store.set_outage(None);
        assert!(store.todo_count().await.is_ok());
    }

    #[tokio::test]
    async fn hierarchy_traversal() {
        let store = MemoryStore::new();
        store.insert_group(Group::new(GroupId(1), Visibility::Private));
        store.insert_group(Group::new(GroupId(2), Visibility::Private).with_parent(GroupId(1)));
        store.insert_group(Group::new(GroupId(3), Visibility::Private).with_parent(GroupId(2)));
        store.insert_group(Group::new(GroupId(4), Visibility::Private).with_parent(GroupId(1)));
        store.insert_project(Project::new(ProjectId(1), Visibility::Private).in_group(GroupId(3)));
        store.insert_project(Project::new(ProjectId(2), Visibility::Private).in_group(GroupId(4)));
        store.insert_project(Project::new(ProjectId(3), Visibility::Private));

        let chain: Vec<GroupId> = store
            .ancestors(GroupId(3))
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(chain, vec![GroupId(3), GroupId(2), GroupId(1)]);

        let subtree: Vec<GroupId> = store
            .self_and_descendant_groups(GroupId(1))
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(subtree, vec![GroupId(1), GroupId(2), GroupId(4), GroupId(3)]);

        let mut projects: Vec<ProjectId> = store
            .projects_under(GroupId(1))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        projects.sort();
        assert_eq!(projects, vec![ProjectId(1), ProjectId(2)]);
    }

    #[tokio::test]
    async fn ancestor_cycle_is_reported() {
        let store = MemoryStore::new();
        store.insert_group(Group::new(GroupId(1), Visibility::Private).with_parent(GroupId(2)));
        store.insert_group(Group::new(GroupId(2), Visibility::Private).with_parent(GroupId(1)));

        let err = store.ancestors(GroupId(1)).await.unwrap_err();
        assert_eq!(err, StoreError::HierarchyCycle { group: GroupId(1) });
    }

    #[tokio::test]
    async fn snapshot_roundtrip_preserves_todo_ids() {
        let store = MemoryStore::new();
        store.insert_group(Group::new(GroupId(1), Visibility::Internal));
        store.add_member(UserId(5), GroupId(1), AccessLevel::Reporter);
        store.insert_todo(UserId(5), TodoTarget::Group, TodoScope::Group(GroupId(1)));

        let restored = MemoryStore::from_snapshot(store.snapshot()).unwrap();
        assert_eq!(restored.snapshot(), store.snapshot());

        let next = restored.insert_todo(UserId(5), TodoTarget::Group, TodoScope::Group(GroupId(1)));
        assert_eq!(next, TodoId(2));
    }

    #[test]
    fn snapshot_rejects_duplicate_todos() {
        let todo = Todo::new(TodoId(1), UserId(1), TodoTarget::Group, TodoScope::Group(GroupId(1)));
        let snapshot = Snapshot {
            todos: vec![todo.clone(), todo],
            ..Snapshot::default()
        };
        assert!(matches!(
            MemoryStore::from_snapshot(snapshot),
            Err(StoreError::Corrupted(_))
        ));
    }
}
