//! Plugin registry — name → builder.

use std::collections::BTreeMap;

use crate::conf::{Arguments, PluginOption};
use crate::error::{FrameworkError, FrameworkResult};
use crate::plugin::Plugin;

/// Builds a session-scoped plugin instance from its configured
/// arguments.
pub type PluginBuilder = fn(&Arguments) -> Box<dyn Plugin>;

/// Registry of available plugin builders. Populated once at engine
/// construction; sessions look builders up by configured name.
#[derive(Default)]
pub struct PluginRegistry {
    builders: BTreeMap<String, PluginBuilder>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, builder: PluginBuilder) {
        self.builders.insert(name.to_string(), builder);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Build the plugin for one tier entry. Unknown names are a
    /// configuration error and fail session open.
    pub fn build(&self, option: &PluginOption) -> FrameworkResult<Box<dyn Plugin>> {
        let builder = self
            .builders
            .get(&option.name)
            .ok_or_else(|| FrameworkError::UnknownPlugin(option.name.clone()))?;
        Ok(builder(&option.arguments))
    }
}
