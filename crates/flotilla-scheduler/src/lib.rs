//! flotilla-scheduler — the engine loop tying the pieces together.
//!
//! One cycle: pull a [`ClusterSnapshot`](flotilla_api::ClusterSnapshot)
//! from the [`SnapshotProvider`], open a session over it with the
//! configured plugin tiers, run the action pipeline in order, and close
//! the session through gang validation into the
//! [`Binder`](flotilla_framework::Binder).
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── SnapshotProvider (external store → ClusterSnapshot)
//!   ├── SchedulerConf (actions + plugin tiers, from TOML)
//!   ├── PluginRegistry (builtins + out-of-tree builders)
//!   ├── run_once() → Session → enqueue/allocate/preempt/reclaim/backfill
//!   └── Binder (bindings, evictions, status updates)
//! ```

pub mod error;
pub mod scheduler;
pub mod testing;

pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::{Scheduler, SnapshotProvider};

pub use flotilla_framework::SchedulerConf;
