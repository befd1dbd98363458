//! Groups, projects, and memberships
//!
//! Groups nest through a parent pointer; a project sits in at most one group
//! (its namespace). Memberships grant an access level on either kind.

use crate::access::{AccessLevel, FeatureAccess, Visibility};
use crate::ids::{GroupId, ProjectId, UserId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of container a user can leave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A project
    Project,
    /// A group (namespace)
    Group,
}

impl EntityKind {
    /// Canonical tag
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "Project",
            EntityKind::Group => "Group",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected entity kind tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity type: {0}")]
pub struct ParseEntityKindError(pub String);

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Project" => Ok(EntityKind::Project),
            "Group" => Ok(EntityKind::Group),
            other => Err(ParseEntityKindError(other.to_string())),
        }
    }
}

/// Reference to a project or group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum EntityRef {
    /// A project
    Project(ProjectId),
    /// A group
    Group(GroupId),
}

impl EntityRef {
    /// Build a reference from a kind and raw id
    #[inline]
    #[must_use]
    pub fn new(kind: EntityKind, id: u64) -> Self {
        match kind {
            EntityKind::Project => EntityRef::Project(ProjectId(id)),
            EntityKind::Group => EntityRef::Group(GroupId(id)),
        }
    }

    /// Kind of the referenced entity
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Project(_) => EntityKind::Project,
            EntityRef::Group(_) => EntityKind::Group,
        }
    }

    /// Raw id of the referenced entity
    #[inline]
    #[must_use]
    pub fn raw_id(&self) -> u64 {
        match self {
            EntityRef::Project(id) => id.0,
            EntityRef::Group(id) => id.0,
        }
    }
}

impl From<ProjectId> for EntityRef {
    fn from(id: ProjectId) -> Self {
        EntityRef::Project(id)
    }
}

impl From<GroupId> for EntityRef {
    fn from(id: GroupId) -> Self {
        EntityRef::Group(id)
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind(), self.raw_id())
    }
}

/// A group, possibly nested under a parent group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group ID
    pub id: GroupId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Group visibility
    pub visibility: Visibility,
    /// Parent group, `None` for top-level groups
    #[serde(default)]
    pub parent: Option<GroupId>,
}

impl Group {
    /// Create a top-level group
    #[inline]
    #[must_use]
    pub fn new(id: GroupId, visibility: Visibility) -> Self {
        Self {
            id,
            name: format!("group-{id}"),
            visibility,
            parent: None,
        }
    }

    /// With parent group
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: GroupId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Per-feature access settings of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectFeatures {
    /// Issue tracker
    #[serde(default)]
    pub issues: FeatureAccess,
    /// Merge requests
    #[serde(default)]
    pub merge_requests: FeatureAccess,
    /// Repository (commits)
    #[serde(default)]
    pub repository: FeatureAccess,
}

/// A project, optionally inside a group namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID
    pub id: ProjectId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Project visibility
    pub visibility: Visibility,
    /// Owning group, `None` for personal projects
    #[serde(default)]
    pub namespace: Option<GroupId>,
    /// Feature access settings
    #[serde(default)]
    pub features: ProjectFeatures,
}

impl Project {
    /// Create a personal (group-less) project
    #[inline]
    #[must_use]
    pub fn new(id: ProjectId, visibility: Visibility) -> Self {
        Self {
            id,
            name: format!("project-{id}"),
            visibility,
            namespace: None,
            features: ProjectFeatures::default(),
        }
    }

    /// Place the project in a group
    #[inline]
    #[must_use]
    pub fn in_group(mut self, group: GroupId) -> Self {
        self.namespace = Some(group);
        self
    }

    /// With feature settings
    #[inline]
    #[must_use]
    pub fn with_features(mut self, features: ProjectFeatures) -> Self {
        self.features = features;
        self
    }
}

/// Explicit grant of an access level to a user on a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
    /// Member
    pub user: UserId,
    /// Container the grant applies to
    pub source: EntityRef,
    /// Granted level
    pub access: AccessLevel,
}

impl Membership {
    /// Create a membership
    #[inline]
    #[must_use]
    pub fn new(user: UserId, source: impl Into<EntityRef>, access: AccessLevel) -> Self {
        Self {
            user,
            source: source.into(),
            access,
        }
    }
}
