//! Todo visibility reconciliation
//!
//! When a user leaves a group or project, the todos that point at things the
//! user can no longer see have to go:
//! - [`EntityLeaveService`] recomputes visibility and deletes stale todos
//! - [`PrivateFeaturesService`] handles members-only features of projects
//!   that stay visible, driven by [`PrivateFeaturesWorker`] off a job queue
//!
//! # Example
//!
//! ```rust,ignore
//! use sweep_core::{ChannelDispatcher, EntityLeaveService, Stores, SweepConfig};
//! use sweep_model::UserId;
//! use sweep_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SweepConfig::new();
//! let store = Arc::new(MemoryStore::new());
//! let (dispatcher, _jobs) = ChannelDispatcher::channel();
//! let service = EntityLeaveService::new(
//!     Stores::in_memory(store, &config),
//!     Arc::new(dispatcher),
//!     config,
//! );
//!
//! let outcome = service.execute(UserId(1), 42, "Project").await?;
//! println!("deleted {} todos", outcome.deleted());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod entity_leave;
pub mod error;
pub mod jobs;
pub mod private_features;
pub mod stores;

pub use config::SweepConfig;
pub use entity_leave::{EntityLeaveService, ReconcileOutcome};
pub use error::{ConfigError, DispatchError, ReconcileError};
pub use jobs::{ChannelDispatcher, JobDispatcher, PrivateFeaturesJob};
pub use private_features::{PrivateFeaturesService, PrivateFeaturesWorker, WorkerStats};
pub use stores::Stores;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the reconciler
    pub use crate::{
        ChannelDispatcher, EntityLeaveService, JobDispatcher, PrivateFeaturesJob,
        PrivateFeaturesService, PrivateFeaturesWorker, ReconcileError, ReconcileOutcome, Stores,
        SweepConfig,
    };
    pub use sweep_model::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
