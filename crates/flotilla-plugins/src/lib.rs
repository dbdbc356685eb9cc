//! flotilla-plugins — built-in policy plugins.
//!
//! Each plugin contributes a slice of the capability surface defined by
//! `flotilla-framework`:
//!
//! - [`priority`] — job/task dispatch order, priority-based preemption
//! - [`gang`] — group validity, unready-first ordering, gang-safe
//!   eviction filtering
//! - [`capacity`] — queue capability/deserved/guarantee enforcement
//! - [`predicates`] — node selector, taints, task limit, affinity
//! - [`nodeorder`] — least-requested / binpack node scoring

pub mod capacity;
pub mod gang;
pub mod nodeorder;
pub mod predicates;
pub mod priority;

use flotilla_framework::PluginRegistry;

/// Register every built-in plugin under its canonical name.
pub fn register_defaults(registry: &mut PluginRegistry) {
    registry.register(priority::PLUGIN_NAME, priority::new);
    registry.register(gang::PLUGIN_NAME, gang::new);
    registry.register(capacity::PLUGIN_NAME, capacity::new);
    registry.register(predicates::PLUGIN_NAME, predicates::new);
    registry.register(nodeorder::PLUGIN_NAME, nodeorder::new);
}
