//! flotilla-framework — the plugin-driven session machinery.
//!
//! The engine opens a [`Session`] over an immutable cluster snapshot,
//! runs the configured [`Action`] pipeline against it, and closes it,
//! flushing the surviving decisions to a [`Binder`]. Policy lives in
//! [`Plugin`]s organized into ordered tiers; the session composes their
//! opinions into single decision functions.
//!
//! # Architecture
//!
//! ```text
//! Session
//!   ├── SessionState (working copies over Arc<ClusterSnapshot>)
//!   ├── tiers: Vec<Tier> of session-scoped Plugin instances
//!   ├── operation log (Allocate / Pipeline / Evict) → gang rollback
//!   └── close() → Binder (bindings, evictions, status updates)
//!
//! predicate::predicate_nodes   — parallel feasibility fan-out + cache
//! prioritize::prioritize_nodes — weighted score aggregation
//! ```

pub mod action;
pub mod binder;
pub mod conf;
pub mod error;
pub mod plugin;
pub mod predicate;
pub mod prioritize;
pub mod registry;
pub mod session;
pub mod state;

pub use action::Action;
pub use binder::Binder;
pub use conf::{Arguments, PluginOption, SchedulerConf, Tier};
pub use error::{BinderError, FrameworkError, FrameworkResult};
pub use plugin::{Plugin, ValidateResult};
pub use predicate::{predicate_nodes, PredicateMode};
pub use prioritize::{pick_node, prioritize_nodes, select_best_node};
pub use registry::{PluginBuilder, PluginRegistry};
pub use session::{Session, SessionResult};
pub use state::{NodeState, QueueState, SessionState};
