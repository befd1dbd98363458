//! Testing utilities for the todo-sweep workspace
//!
//! Fixture builder creating groups, projects, issues, and todos in a
//! [`MemoryStore`] with fresh ids.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sweep_model::{
    AccessLevel, EntityRef, Group, GroupId, Issue, IssueId, MergeRequest, MergeRequestId, Project,
    ProjectFeatures, ProjectId, TodoId, TodoScope, TodoTarget, UserId, Visibility,
};
use sweep_store::{MemoryStore, StoreError, TodoStore};

#[derive(Debug)]
pub struct World {
    pub store: Arc<MemoryStore>,
    next_id: AtomicU64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            next_id: AtomicU64::new(100),
        }
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn user(&self) -> UserId {
        UserId(self.next())
    }

    pub fn group(&self, visibility: Visibility) -> GroupId {
        let id = GroupId(self.next());
        self.store.insert_group(Group::new(id, visibility));
        id
    }

    pub fn subgroup(&self, parent: GroupId, visibility: Visibility) -> GroupId {
        let id = GroupId(self.next());
        self.store
            .insert_group(Group::new(id, visibility).with_parent(parent));
        id
    }

    pub fn project(&self, group: GroupId, visibility: Visibility) -> ProjectId {
        let id = ProjectId(self.next());
        self.store
            .insert_project(Project::new(id, visibility).in_group(group));
        id
    }

    pub fn personal_project(&self, visibility: Visibility) -> ProjectId {
        let id = ProjectId(self.next());
        self.store.insert_project(Project::new(id, visibility));
        id
    }

    pub fn set_features(&self, project: ProjectId, features: ProjectFeatures) {
        self.store.update_project(project, |p| p.features = features);
    }

    pub fn set_parent(&self, group: GroupId, parent: GroupId) {
        self.store.update_group(group, |g| g.parent = Some(parent));
    }

    /// Issue authored by a fresh user
    pub fn issue(&self, project: ProjectId) -> IssueId {
        let id = IssueId(self.next());
        let author = self.user();
        self.store.insert_issue(Issue::new(id, project, author));
        id
    }

    pub fn confidential_issue(&self, project: ProjectId) -> IssueId {
        let id = IssueId(self.next());
        let author = self.user();
        self.store
            .insert_issue(Issue::new(id, project, author).confidential());
        id
    }

    pub fn set_author(&self, issue: IssueId, author: UserId) {
        self.store.update_issue(issue, |i| i.author = author);
    }

    pub fn assign(&self, issue: IssueId, user: UserId) {
        self.store.update_issue(issue, |i| {
            i.assignees.insert(user);
        });
    }

    pub fn merge_request(&self, project: ProjectId) -> MergeRequestId {
        let id = MergeRequestId(self.next());
        let author = self.user();
        self.store.insert_merge_request(MergeRequest {
            id,
            project,
            author,
        });
        id
    }

    pub fn issue_todo(&self, user: UserId, project: ProjectId, issue: IssueId) -> TodoId {
        self.store.insert_todo(
            user,
            TodoTarget::Issue(issue),
            TodoScope::Project(project),
        )
    }

    pub fn merge_request_todo(
        &self,
        user: UserId,
        project: ProjectId,
        merge_request: MergeRequestId,
    ) -> TodoId {
        self.store.insert_todo(
            user,
            TodoTarget::MergeRequest(merge_request),
            TodoScope::Project(project),
        )
    }

    /// Todo on a project without a specific target object
    pub fn project_todo(&self, user: UserId, project: ProjectId) -> TodoId {
        self.store.insert_todo(
            user,
            TodoTarget::Commit(format!("{:040x}", self.next())),
            TodoScope::Project(project),
        )
    }

    pub fn group_todo(&self, user: UserId, group: GroupId) -> TodoId {
        self.store
            .insert_todo(user, TodoTarget::Group, TodoScope::Group(group))
    }

    /// Grant access; `None` leaves the user without a grant
    pub fn set_access(&self, entity: impl Into<EntityRef>, user: UserId, access: Option<AccessLevel>) {
        if let Some(level) = access {
            self.store.add_member(user, entity, level);
        }
    }

    pub async fn todo_ids(&self, user: UserId) -> Result<BTreeSet<TodoId>, StoreError> {
        Ok(self
            .store
            .todos_for_user(user)
            .await?
            .into_iter()
            .map(|todo| todo.id)
            .collect())
    }

    pub async fn todo_count(&self) -> Result<usize, StoreError> {
        self.store.todo_count().await
    }
}

/// Collect todo ids into a set for comparisons
pub fn ids<const N: usize>(todos: [TodoId; N]) -> BTreeSet<TodoId> {
    BTreeSet::from(todos)
}
