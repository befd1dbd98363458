//! Collaborator traits
//!
//! The reconciler never talks to a database directly. Entity lookups,
//! memberships, issues, and todos each sit behind one of these traits.

use crate::error::StoreError;
use crate::plan::DeletionPlan;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use sweep_model::{
    AccessLevel, EntityRef, Group, GroupId, Issue, Membership, Project, ProjectId, Todo, UserId,
};

/// A resolved project or group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// A project
    Project(Project),
    /// A group
    Group(Group),
}

impl Entity {
    /// Reference to this entity
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        match self {
            Entity::Project(project) => EntityRef::Project(project.id),
            Entity::Group(group) => EntityRef::Group(group.id),
        }
    }

    /// Visibility of this entity
    #[must_use]
    pub fn visibility(&self) -> sweep_model::Visibility {
        match self {
            Entity::Project(project) => project.visibility,
            Entity::Group(group) => group.visibility,
        }
    }
}

/// Group and project lookups plus hierarchy traversal
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Find group by id
    async fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError>;

    /// Find project by id
    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;

    /// Direct subgroups of a group
    async fn child_groups(&self, id: GroupId) -> Result<Vec<Group>, StoreError>;

    /// Projects whose namespace is exactly this group
    async fn projects_in_group(&self, id: GroupId) -> Result<Vec<Project>, StoreError>;

    /// Resolve an entity reference
    async fn find(&self, entity: EntityRef) -> Result<Option<Entity>, StoreError> {
        Ok(match entity {
            EntityRef::Project(id) => self.find_project(id).await?.map(Entity::Project),
            EntityRef::Group(id) => self.find_group(id).await?.map(Entity::Group),
        })
    }

    /// The group followed by its parents up to the root
    ///
    /// # Errors
    /// `StoreError::HierarchyCycle` if a parent pointer loops back.
    async fn ancestors(&self, id: GroupId) -> Result<Vec<Group>, StoreError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(id);

        while let Some(current) = next {
            if !seen.insert(current) {
                return Err(StoreError::HierarchyCycle { group: current });
            }
            let Some(group) = self.find_group(current).await? else {
                break;
            };
            next = group.parent;
            chain.push(group);
        }

        Ok(chain)
    }

    /// The group and every subgroup below it, breadth first
    async fn self_and_descendant_groups(&self, id: GroupId) -> Result<Vec<Group>, StoreError> {
        let Some(root) = self.find_group(id).await? else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::from([root.id]);
        let mut queue = VecDeque::from([root.id]);
        let mut groups = vec![root];

        while let Some(current) = queue.pop_front() {
            for child in self.child_groups(current).await? {
                if !seen.insert(child.id) {
                    return Err(StoreError::HierarchyCycle { group: child.id });
                }
                queue.push_back(child.id);
                groups.push(child);
            }
        }

        Ok(groups)
    }

    /// Every project in the group or any of its subgroups
    async fn projects_under(&self, id: GroupId) -> Result<Vec<Project>, StoreError> {
        let mut projects = Vec::new();
        for group in self.self_and_descendant_groups(id).await? {
            projects.extend(self.projects_in_group(group.id).await?);
        }
        Ok(projects)
    }
}

/// Explicit membership grants
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Level granted directly on the entity, ignoring inheritance
    async fn direct_access(
        &self,
        user: UserId,
        entity: EntityRef,
    ) -> Result<Option<AccessLevel>, StoreError>;

    /// Every grant held by the user
    async fn memberships_of(&self, user: UserId) -> Result<Vec<Membership>, StoreError>;
}

/// Issue lookups
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Confidential issues of the given projects
    async fn confidential_issues(&self, projects: &[ProjectId]) -> Result<Vec<Issue>, StoreError>;
}

/// Todo queries and set-based deletion
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Todos owned by a user
    async fn todos_for_user(&self, owner: UserId) -> Result<Vec<Todo>, StoreError>;

    /// Todos scoped to a project
    async fn todos_in_project(&self, project: ProjectId) -> Result<Vec<Todo>, StoreError>;

    /// Total number of todos
    async fn todo_count(&self) -> Result<usize, StoreError>;

    /// Delete every todo matching the plan in one atomic step
    ///
    /// Returns number of todos removed.
    async fn delete_matching(&self, plan: &DeletionPlan) -> Result<usize, StoreError>;
}
