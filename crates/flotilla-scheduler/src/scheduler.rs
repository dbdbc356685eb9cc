//! The engine loop — one session per cycle over a fresh snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use flotilla_api::ClusterSnapshot;
use flotilla_framework::{
    Action, Binder, FrameworkError, PluginBuilder, PluginRegistry, SchedulerConf, Session,
    SessionResult,
};
use flotilla_metrics::Collector;

use crate::error::{SchedulerError, SchedulerResult};

/// Produces the point-in-time cluster view a session runs against.
///
/// This is the engine's only read boundary: implementations pull from
/// the external store and assign each snapshot a fresh generation.
pub trait SnapshotProvider: Send + Sync {
    fn snapshot(&self) -> anyhow::Result<ClusterSnapshot>;
}

/// The scheduling engine: configuration, plugin registry, snapshot
/// provider, and binder, driven one cycle at a time.
pub struct Scheduler {
    conf: SchedulerConf,
    actions: Vec<Box<dyn Action>>,
    registry: PluginRegistry,
    provider: Arc<dyn SnapshotProvider>,
    binder: Arc<dyn Binder>,
    collector: Arc<Collector>,
    session_timeout: Option<Duration>,
}

impl Scheduler {
    /// Build an engine from configuration. Unknown action names fail
    /// construction; unknown plugin names fail at session open, which
    /// skips that cycle.
    pub fn new(
        conf: SchedulerConf,
        provider: Arc<dyn SnapshotProvider>,
        binder: Arc<dyn Binder>,
    ) -> SchedulerResult<Self> {
        let mut registry = PluginRegistry::new();
        flotilla_plugins::register_defaults(&mut registry);

        let mut actions = Vec::new();
        for name in conf.action_names() {
            let action = flotilla_actions::new_action(&name)
                .ok_or(FrameworkError::UnknownAction(name))?;
            actions.push(action);
        }

        Ok(Self {
            conf,
            actions,
            registry,
            provider,
            binder,
            collector: Arc::new(Collector::new()),
            session_timeout: None,
        })
    }

    /// Per-session deadline: on expiry the running action finishes its
    /// current task, the pipeline halts, and the session still closes
    /// through gang validation.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    /// Register an out-of-tree plugin builder.
    pub fn with_plugin(mut self, name: &str, builder: PluginBuilder) -> Self {
        self.registry.register(name, builder);
        self
    }

    pub fn collector(&self) -> Arc<Collector> {
        self.collector.clone()
    }

    /// Run one scheduling cycle: snapshot → session → action pipeline →
    /// close. Every cycle starts from a fresh snapshot; nothing carries
    /// over except what the store reflects.
    pub fn run_once(&self) -> SchedulerResult<SessionResult> {
        let snapshot = self
            .provider
            .snapshot()
            .map_err(SchedulerError::Snapshot)?;
        let deadline = self.session_timeout.map(|t| Instant::now() + t);

        let mut ssn = Session::open(
            Arc::new(snapshot),
            &self.conf.tiers,
            &self.registry,
            self.collector.clone(),
            deadline,
        )?;

        for action in &self.actions {
            if ssn.expired() {
                warn!("session deadline expired, halting pipeline");
                break;
            }
            debug!(action = action.name(), "executing action");
            action.execute(&mut ssn);
        }

        let result = ssn.close(self.binder.as_ref());
        info!(
            bindings = result.bindings.len(),
            evictions = result.evictions.len(),
            pipelined = result.pipelined.len(),
            "scheduling cycle complete"
        );
        Ok(result)
    }

    /// Drive [`run_once`](Self::run_once) on a fixed interval. A failed
    /// cycle is logged and skipped; the loop never stops on its own.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_once() {
                warn!(%err, "scheduling cycle skipped");
            }
        }
    }
}
