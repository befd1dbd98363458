//! Todo cleanup after a user leaves a group or project
//!
//! When a membership ends, some of the user's todos may point at things the
//! user can no longer see. [`EntityLeaveService`] recomputes visibility for the
//! left entity and everything below it, then removes the stale todos in one
//! set-based delete.
//!
//! # Rules
//! - Private entity: todos in projects the user has no access to go, except
//!   on confidential issues the user authored or is assigned to. Below
//!   reporter, todos on other confidential issues go. Group todos go for
//!   groups the user can no longer read.
//! - Internal/public entity: only todos on confidential issues can go, and
//!   a private-features rescan is queued for the rest.
//! - Merge request todos only go together with their whole project.

use crate::config::SweepConfig;
use crate::error::ReconcileError;
use crate::jobs::{JobDispatcher, PrivateFeaturesJob};
use crate::stores::Stores;
use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use sweep_model::{AccessLevel, EntityKind, EntityRef, Group, Issue, IssueId, Project, UserId};
use sweep_store::{DeletionPlan, DeletionRule, Entity};

/// Result of one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The entity does not exist; nothing was touched
    EntityNotFound,
    /// Stale todos were removed
    Reconciled {
        /// Entity the user left
        entity: EntityRef,
        /// Number of todos deleted
        deleted: usize,
        /// Whether a private-features rescan was queued
        rescan_enqueued: bool,
    },
}

impl ReconcileOutcome {
    /// Number of todos deleted
    #[inline]
    #[must_use]
    pub fn deleted(&self) -> usize {
        match self {
            Self::EntityNotFound => 0,
            Self::Reconciled { deleted, .. } => *deleted,
        }
    }
}

/// Projects and groups affected by leaving an entity
#[derive(Debug, Default)]
struct Scope {
    projects: Vec<Project>,
    groups: Vec<Group>,
}

/// Removes todos a departing member can no longer see
pub struct EntityLeaveService {
    stores: Stores,
    dispatcher: Arc<dyn JobDispatcher>,
    config: SweepConfig,
}

impl std::fmt::Debug for EntityLeaveService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityLeaveService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EntityLeaveService {
    /// Create service
    #[inline]
    #[must_use]
    pub fn new(stores: Stores, dispatcher: Arc<dyn JobDispatcher>, config: SweepConfig) -> Self {
        Self {
            stores,
            dispatcher,
            config,
        }
    }

    /// Reconcile from an untyped entity kind tag
    ///
    /// # Errors
    /// - `ReconcileError::InvalidEntityKind` if `entity_kind` is not
    ///   `"Project"` or `"Group"`; no store is touched
    /// - Any store or dispatch failure from [`Self::reconcile`]
    pub async fn execute(
        &self,
        user: UserId,
        entity_id: u64,
        entity_kind: &str,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let kind: EntityKind = entity_kind.parse()?;
        self.reconcile(user, EntityRef::new(kind, entity_id)).await
    }

    /// Remove the user's todos that are no longer visible after leaving `entity`
    ///
    /// # Errors
    /// Store failures and dispatch failures propagate unchanged.
    pub async fn reconcile(
        &self,
        user: UserId,
        entity: EntityRef,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let Some(resolved) = self.stores.entities.find(entity).await? else {
            tracing::debug!(%user, %entity, "entity not found, nothing to reconcile");
            return Ok(ReconcileOutcome::EntityNotFound);
        };

        let private = resolved.visibility().is_private();
        let scope = self.scope_of(&resolved).await?;

        let mut plan = DeletionPlan::for_owner(user);
        if private {
            self.plan_private(user, &scope, &mut plan).await?;
        } else {
            self.plan_confidential(user, &scope.projects, &mut plan).await?;
        }

        let deleted = self.stores.todos.delete_matching(&plan).await?;

        let rescan_enqueued = !private && self.config.enqueue_private_features;
        if rescan_enqueued {
            self.dispatcher
                .dispatch(PrivateFeaturesJob::for_user(entity, user))?;
        }

        tracing::info!(
            %user,
            %entity,
            private,
            deleted,
            rescan_enqueued,
            "reconciled todos after membership change"
        );

        Ok(ReconcileOutcome::Reconciled {
            entity,
            deleted,
            rescan_enqueued,
        })
    }

    /// Collect the projects and groups below the entity
    async fn scope_of(&self, entity: &Entity) -> Result<Scope, ReconcileError> {
        match entity {
            Entity::Project(project) => Ok(Scope {
                projects: vec![project.clone()],
                groups: Vec::new(),
            }),
            Entity::Group(group) => {
                let groups = self.stores.entities.self_and_descendant_groups(group.id).await?;
                let entities = &self.stores.entities;
                let projects = try_join_all(groups.iter().map(|g| entities.projects_in_group(g.id)))
                    .await?
                    .into_iter()
                    .flatten()
                    .collect();
                Ok(Scope { projects, groups })
            }
        }
    }

    /// Effective access of the user on each project
    async fn project_access(
        &self,
        user: UserId,
        projects: &[Project],
    ) -> Result<Vec<Option<AccessLevel>>, ReconcileError> {
        let access = &self.stores.access;
        let levels = try_join_all(
            projects
                .iter()
                .map(|project| access.effective_access(user, EntityRef::Project(project.id))),
        )
        .await?;
        Ok(levels)
    }

    /// Confidential issues of the given projects
    async fn confidential_issues(&self, projects: &[&Project]) -> Result<Vec<Issue>, ReconcileError> {
        if projects.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<_> = projects.iter().map(|project| project.id).collect();
        Ok(self.stores.issues.confidential_issues(&ids).await?)
    }

    /// Deletions for a private entity
    async fn plan_private(
        &self,
        user: UserId,
        scope: &Scope,
        plan: &mut DeletionPlan,
    ) -> Result<(), ReconcileError> {
        let threshold = self.config.confidential_access;
        let levels = self.project_access(user, &scope.projects).await?;

        let exposed: Vec<(&Project, Option<AccessLevel>)> = scope
            .projects
            .iter()
            .zip(levels)
            .filter(|(project, level)| {
                let keep = threshold.satisfied_by(*level);
                if keep {
                    tracing::debug!(%user, project = %project.id, "access retained, keeping todos");
                }
                !keep
            })
            .collect();

        let candidates: Vec<&Project> = exposed.iter().map(|(project, _)| *project).collect();
        let confidential = self.confidential_issues(&candidates).await?;

        let mut hidden_issues = BTreeSet::new();
        for (project, level) in exposed {
            let in_project = confidential.iter().filter(|issue| issue.project == project.id);

            if level.is_none() {
                // Members-only trackers hide even authored or assigned issues.
                let keep_issues: BTreeSet<IssueId> = if project.features.issues.is_restricted() {
                    BTreeSet::new()
                } else {
                    in_project
                        .filter(|issue| issue.is_author_or_assignee(user))
                        .map(|issue| issue.id)
                        .collect()
                };
                tracing::debug!(%user, project = %project.id, "no access left, dropping project todos");
                plan.push(DeletionRule::ProjectTodos {
                    project: project.id,
                    keep_issues,
                });
            } else {
                hidden_issues.extend(
                    in_project
                        .filter(|issue| !issue.is_author_or_assignee(user))
                        .map(|issue| issue.id),
                );
            }
        }
        plan.push(DeletionRule::IssueTargets {
            issues: hidden_issues,
        });

        for group in &scope.groups {
            if !self.stores.access.can_read_group(user, group.id).await? {
                tracing::debug!(%user, group = %group.id, "group no longer readable");
                plan.push(DeletionRule::GroupTodos { group: group.id });
            }
        }

        Ok(())
    }

    /// Deletions for an internal or public entity: confidential issues only
    async fn plan_confidential(
        &self,
        user: UserId,
        projects: &[Project],
        plan: &mut DeletionPlan,
    ) -> Result<(), ReconcileError> {
        let threshold = self.config.confidential_access;
        let levels = self.project_access(user, projects).await?;

        let exposed: Vec<&Project> = projects
            .iter()
            .zip(levels)
            .filter(|(_, level)| !threshold.satisfied_by(*level))
            .map(|(project, _)| project)
            .collect();

        let issues = self
            .confidential_issues(&exposed)
            .await?
            .into_iter()
            .filter(|issue| !issue.is_author_or_assignee(user))
            .map(|issue| issue.id)
            .collect();

        plan.push(DeletionRule::IssueTargets { issues });
        Ok(())
    }
}
