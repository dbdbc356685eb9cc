//! Scheduler configuration — the ordered action list and plugin tiers.
//!
//! Parsed from TOML. A minimal configuration:
//!
//! ```toml
//! actions = "enqueue, allocate, preempt, reclaim, backfill"
//!
//! [[tiers]]
//! [[tiers.plugins]]
//! name = "priority"
//!
//! [[tiers.plugins]]
//! name = "gang"
//!
//! [[tiers]]
//! [[tiers.plugins]]
//! name = "capacity"
//!
//! [[tiers.plugins]]
//! name = "predicates"
//!
//! [[tiers.plugins]]
//! name = "nodeorder"
//! [tiers.plugins.arguments]
//! "leastrequested.weight" = 1
//! ```
//!
//! Every `enable_*` flag defaults to enabled when unset, so a bare
//! `name = "capacity"` entry contributes all of the plugin's
//! capabilities.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{FrameworkError, FrameworkResult};

/// Free-form plugin arguments (plugin-specific schema).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Arguments(pub BTreeMap<String, toml::Value>);

impl Arguments {
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            toml::Value::Float(f) => Some(*f),
            toml::Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            toml::Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            toml::Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            toml::Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// One plugin entry within a tier: the plugin name, per-function
/// activation flags, and plugin-specific arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginOption {
    pub name: String,
    /// Multiplier applied to this plugin's node-order scores.
    #[serde(default = "default_weight")]
    pub weight: f64,

    pub enable_job_order: Option<bool>,
    pub enable_queue_order: Option<bool>,
    pub enable_task_order: Option<bool>,
    pub enable_predicate: Option<bool>,
    pub enable_node_order: Option<bool>,
    pub enable_best_node: Option<bool>,
    pub enable_job_valid: Option<bool>,
    pub enable_job_enqueued: Option<bool>,
    pub enable_allocatable: Option<bool>,
    pub enable_preemptable: Option<bool>,
    pub enable_reclaimable: Option<bool>,
    pub enable_overused: Option<bool>,

    #[serde(default)]
    pub arguments: Arguments,
}

fn default_weight() -> f64 {
    1.0
}

impl PluginOption {
    /// A bare entry with every capability enabled.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            weight: 1.0,
            enable_job_order: None,
            enable_queue_order: None,
            enable_task_order: None,
            enable_predicate: None,
            enable_node_order: None,
            enable_best_node: None,
            enable_job_valid: None,
            enable_job_enqueued: None,
            enable_allocatable: None,
            enable_preemptable: None,
            enable_reclaimable: None,
            enable_overused: None,
            arguments: Arguments::default(),
        }
    }

    fn on(flag: Option<bool>) -> bool {
        flag.unwrap_or(true)
    }

    pub fn job_order_enabled(&self) -> bool {
        Self::on(self.enable_job_order)
    }
    pub fn queue_order_enabled(&self) -> bool {
        Self::on(self.enable_queue_order)
    }
    pub fn task_order_enabled(&self) -> bool {
        Self::on(self.enable_task_order)
    }
    pub fn predicate_enabled(&self) -> bool {
        Self::on(self.enable_predicate)
    }
    pub fn node_order_enabled(&self) -> bool {
        Self::on(self.enable_node_order)
    }
    pub fn best_node_enabled(&self) -> bool {
        Self::on(self.enable_best_node)
    }
    pub fn job_valid_enabled(&self) -> bool {
        Self::on(self.enable_job_valid)
    }
    pub fn job_enqueued_enabled(&self) -> bool {
        Self::on(self.enable_job_enqueued)
    }
    pub fn allocatable_enabled(&self) -> bool {
        Self::on(self.enable_allocatable)
    }
    pub fn preemptable_enabled(&self) -> bool {
        Self::on(self.enable_preemptable)
    }
    pub fn reclaimable_enabled(&self) -> bool {
        Self::on(self.enable_reclaimable)
    }
    pub fn overused_enabled(&self) -> bool {
        Self::on(self.enable_overused)
    }
}

/// An ordered group of plugins composed with AND/sum semantics. Tiers
/// are consulted in order; the first tier with a definitive answer
/// wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tier {
    #[serde(default)]
    pub plugins: Vec<PluginOption>,
}

/// Top-level scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConf {
    /// Comma-separated action pipeline, executed in order.
    pub actions: String,
    #[serde(default)]
    pub tiers: Vec<Tier>,
}

impl SchedulerConf {
    pub fn from_toml(input: &str) -> FrameworkResult<Self> {
        let conf: SchedulerConf = toml::from_str(input)?;
        if conf.action_names().is_empty() {
            return Err(FrameworkError::InvalidConf(
                "no actions configured".to_string(),
            ));
        }
        Ok(conf)
    }

    /// The configured action names, trimmed, in pipeline order.
    pub fn action_names(&self) -> Vec<String> {
        self.actions
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect()
    }
}

impl Default for SchedulerConf {
    /// The stock pipeline: hard policy tier (priority, gang) above the
    /// capacity/feasibility/ordering tier.
    fn default() -> Self {
        Self {
            actions: "enqueue, allocate, preempt, reclaim, backfill".to_string(),
            tiers: vec![
                Tier {
                    plugins: vec![PluginOption::new("priority"), PluginOption::new("gang")],
                },
                Tier {
                    plugins: vec![
                        PluginOption::new("capacity"),
                        PluginOption::new("predicates"),
                        PluginOption::new("nodeorder"),
                    ],
                },
            ],
        }
    }
}
