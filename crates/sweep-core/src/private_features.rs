//! Rescan of members-only project features
//!
//! A project can be internal or public while individual features (issues,
//! merge requests, repository) are restricted to members. Leaving such a
//! project does not hide the project, but it does hide those features.
//! [`PrivateFeaturesService`] removes the todos that point into them, and
//! [`PrivateFeaturesWorker`] runs it for every queued [`PrivateFeaturesJob`].

use crate::error::ReconcileError;
use crate::jobs::PrivateFeaturesJob;
use crate::stores::Stores;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use sweep_model::{AccessLevel, EntityRef, FeatureAccess, Project, TodoTarget, UserId};
use sweep_store::{DeletionPlan, DeletionRule};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Deletes todos on features the owner can no longer use
#[derive(Debug, Clone)]
pub struct PrivateFeaturesService {
    stores: Stores,
}

impl PrivateFeaturesService {
    /// Create service
    #[inline]
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Run one rescan job
    ///
    /// Returns number of todos removed.
    ///
    /// # Errors
    /// Store failures propagate unchanged.
    pub async fn execute(&self, job: &PrivateFeaturesJob) -> Result<usize, ReconcileError> {
        let projects: Vec<Project> = match job.entity {
            EntityRef::Project(id) => self
                .stores
                .entities
                .find_project(id)
                .await?
                .into_iter()
                .collect(),
            EntityRef::Group(id) => self.stores.entities.projects_under(id).await?,
        };

        let mut doomed = BTreeSet::new();
        for project in projects.iter().filter(|p| has_restricted_feature(p)) {
            let mut access: HashMap<UserId, Option<AccessLevel>> = HashMap::new();
            let todos = self.stores.todos.todos_in_project(project.id).await?;

            for todo in todos {
                if job.user.is_some_and(|user| user != todo.owner) {
                    continue;
                }
                let Some(feature) = feature_for(project, &todo.target) else {
                    continue;
                };
                if !feature.is_restricted() {
                    continue;
                }

                let level = match access.get(&todo.owner) {
                    Some(level) => *level,
                    None => {
                        let level = self
                            .stores
                            .access
                            .effective_access(todo.owner, EntityRef::Project(project.id))
                            .await?;
                        access.insert(todo.owner, level);
                        level
                    }
                };

                if !feature.admits(level) {
                    doomed.insert(todo.id);
                }
            }
        }

        let plan = match job.user {
            Some(user) => DeletionPlan::for_owner(user),
            None => DeletionPlan::any_owner(),
        }
        .with_rule(DeletionRule::Todos { ids: doomed });

        let deleted = self.stores.todos.delete_matching(&plan).await?;
        tracing::info!(entity = %job.entity, user = ?job.user, deleted, "private features rescan finished");
        Ok(deleted)
    }
}

fn has_restricted_feature(project: &Project) -> bool {
    let features = project.features;
    features.issues.is_restricted()
        || features.merge_requests.is_restricted()
        || features.repository.is_restricted()
}

/// Feature that gates visibility of a todo target
fn feature_for(project: &Project, target: &TodoTarget) -> Option<FeatureAccess> {
    match target {
        TodoTarget::Issue(_) => Some(project.features.issues),
        TodoTarget::MergeRequest(_) => Some(project.features.merge_requests),
        TodoTarget::Commit(_) => Some(project.features.repository),
        TodoTarget::Group => None,
    }
}

/// Worker statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Jobs that completed
    pub jobs_processed: usize,
    /// Jobs that failed
    pub jobs_failed: usize,
    /// Todos removed across all jobs
    pub todos_deleted: usize,
}

/// Consumer side of the rescan queue
#[derive(Debug, Clone)]
pub struct PrivateFeaturesWorker {
    service: Arc<PrivateFeaturesService>,
}

impl PrivateFeaturesWorker {
    /// Create worker
    #[inline]
    #[must_use]
    pub fn new(service: PrivateFeaturesService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Run until every sender is dropped
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<PrivateFeaturesJob>) -> WorkerStats {
        let mut stats = WorkerStats::default();
        while let Some(job) = rx.recv().await {
            self.process(job, &mut stats).await;
        }
        tracing::debug!(?stats, "private features worker stopped");
        stats
    }

    /// Spawn [`Self::run`] on the current runtime
    #[must_use]
    pub fn spawn(self, rx: mpsc::UnboundedReceiver<PrivateFeaturesJob>) -> JoinHandle<WorkerStats> {
        tokio::spawn(self.run(rx))
    }

    /// Process the jobs already queued, without waiting for more
    pub async fn drain(&self, rx: &mut mpsc::UnboundedReceiver<PrivateFeaturesJob>) -> WorkerStats {
        let mut stats = WorkerStats::default();
        while let Ok(job) = rx.try_recv() {
            self.process(job, &mut stats).await;
        }
        stats
    }

    async fn process(&self, job: PrivateFeaturesJob, stats: &mut WorkerStats) {
        match self.service.execute(&job).await {
            Ok(deleted) => {
                stats.jobs_processed += 1;
                stats.todos_deleted += deleted;
            }
            Err(e) => {
                stats.jobs_failed += 1;
                tracing::warn!(entity = %job.entity, error = %e, "private features rescan failed");
            }
        }
    }
}
