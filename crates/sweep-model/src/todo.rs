//! Todos and the objects they point at

use crate::entity::EntityRef;
use crate::ids::{GroupId, IssueId, MergeRequestId, ProjectId, TodoId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue ID
    pub id: IssueId,
    /// Project the issue belongs to
    pub project: ProjectId,
    /// Author
    pub author: UserId,
    /// Assigned users
    #[serde(default)]
    pub assignees: BTreeSet<UserId>,
    /// Confidential issues are hidden from members below reporter
    #[serde(default)]
    pub confidential: bool,
}

impl Issue {
    /// Create a non-confidential issue without assignees
    #[inline]
    #[must_use]
    pub fn new(id: IssueId, project: ProjectId, author: UserId) -> Self {
        Self {
            id,
            project,
            author,
            assignees: BTreeSet::new(),
            confidential: false,
        }
    }

    /// Mark confidential
    #[inline]
    #[must_use]
    pub fn confidential(mut self) -> Self {
        self.confidential = true;
        self
    }

    /// Add an assignee
    #[inline]
    #[must_use]
    pub fn with_assignee(mut self, user: UserId) -> Self {
        self.assignees.insert(user);
        self
    }

    /// Authors and assignees keep sight of confidential issues
    #[inline]
    #[must_use]
    pub fn is_author_or_assignee(&self, user: UserId) -> bool {
        self.author == user || self.assignees.contains(&user)
    }
}

/// A merge request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Merge request ID
    pub id: MergeRequestId,
    /// Target project
    pub project: ProjectId,
    /// Author
    pub author: UserId,
}

/// What a todo points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum TodoTarget {
    /// An issue
    Issue(IssueId),
    /// A merge request
    MergeRequest(MergeRequestId),
    /// A commit, by SHA
    Commit(String),
    /// The group itself (e.g. a group mention)
    Group,
}

impl TodoTarget {
    /// Issue id if the target is an issue
    #[inline]
    #[must_use]
    pub fn issue(&self) -> Option<IssueId> {
        match self {
            TodoTarget::Issue(id) => Some(*id),
            _ => None,
        }
    }

    /// Check if the target is an issue
    #[inline]
    #[must_use]
    pub fn is_issue(&self) -> bool {
        matches!(self, TodoTarget::Issue(_))
    }

    /// Check if the target is a merge request
    #[inline]
    #[must_use]
    pub fn is_merge_request(&self) -> bool {
        matches!(self, TodoTarget::MergeRequest(_))
    }

    /// Check if the target is a commit
    #[inline]
    #[must_use]
    pub fn is_commit(&self) -> bool {
        matches!(self, TodoTarget::Commit(_))
    }
}

/// Container a todo is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum TodoScope {
    /// Todo on something inside a project
    Project(ProjectId),
    /// Todo on a group
    Group(GroupId),
}

impl From<TodoScope> for EntityRef {
    fn from(scope: TodoScope) -> Self {
        match scope {
            TodoScope::Project(id) => EntityRef::Project(id),
            TodoScope::Group(id) => EntityRef::Group(id),
        }
    }
}

/// A pending notification owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Todo ID
    pub id: TodoId,
    /// User the todo belongs to
    pub owner: UserId,
    /// Object the todo refers to
    pub target: TodoTarget,
    /// Container of the target
    pub scope: TodoScope,
    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Create a todo stamped with the current time
    #[must_use]
    pub fn new(id: TodoId, owner: UserId, target: TodoTarget, scope: TodoScope) -> Self {
        Self {
            id,
            owner,
            target,
            scope,
            created_at: Utc::now(),
        }
    }

    /// Project the todo is scoped to, if any
    #[inline]
    #[must_use]
    pub fn project(&self) -> Option<ProjectId> {
        match self.scope {
            TodoScope::Project(id) => Some(id),
            TodoScope::Group(_) => None,
        }
    }

    /// Group the todo is scoped to, if any
    #[inline]
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        match self.scope {
            TodoScope::Group(id) => Some(id),
            TodoScope::Project(_) => None,
        }
    }
}
