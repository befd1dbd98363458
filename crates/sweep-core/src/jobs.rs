//! Deferred job dispatch
//!
//! The reconciler only produces jobs. It never waits on them and never sees
//! their outcome; delivery is at-least-once and the consumer is idempotent.

use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use sweep_model::{EntityRef, UserId};
use tokio::sync::mpsc;

/// Request to rescan members-only project features of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrivateFeaturesJob {
    /// Project or group to rescan
    pub entity: EntityRef,
    /// Restrict the rescan to this user's todos
    pub user: Option<UserId>,
}

impl PrivateFeaturesJob {
    /// Create job for one user
    #[inline]
    #[must_use]
    pub fn for_user(entity: EntityRef, user: UserId) -> Self {
        Self {
            entity,
            user: Some(user),
        }
    }

    /// Create job covering every user
    #[inline]
    #[must_use]
    pub fn for_everyone(entity: EntityRef) -> Self {
        Self { entity, user: None }
    }
}

/// Producer side of the job queue
pub trait JobDispatcher: Send + Sync {
    /// Hand a job to the queue without waiting for it to run
    ///
    /// # Errors
    /// `DispatchError` if the queue does not accept the job.
    fn dispatch(&self, job: PrivateFeaturesJob) -> Result<(), DispatchError>;
}

/// Job queue backed by an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::UnboundedSender<PrivateFeaturesJob>,
}

impl ChannelDispatcher {
    /// Create dispatcher and the receiver a worker consumes
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PrivateFeaturesJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl JobDispatcher for ChannelDispatcher {
    fn dispatch(&self, job: PrivateFeaturesJob) -> Result<(), DispatchError> {
        self.sender.send(job).map_err(|_| DispatchError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_model::ProjectId;

    #[test]
    fn channel_dispatch_delivers_job() {
        let (dispatcher, mut rx) = ChannelDispatcher::channel();
        let job = PrivateFeaturesJob::for_user(EntityRef::Project(ProjectId(3)), UserId(7));

        dispatcher.dispatch(job).unwrap();

        assert_eq!(rx.try_recv().unwrap(), job);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dispatch_after_receiver_dropped_fails() {
        let (dispatcher, rx) = ChannelDispatcher::channel();
        drop(rx);

        let job = PrivateFeaturesJob::for_everyone(EntityRef::Project(ProjectId(1)));
        assert_eq!(dispatcher.dispatch(job), Err(DispatchError::Closed));
    }
}
