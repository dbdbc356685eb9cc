//! Predicate helper — parallel feasibility fan-out across nodes.
//!
//! For one task, candidate nodes are checked concurrently on the rayon
//! pool, consulting each node's predicate cache first. The fan-out
//! never crosses task boundaries, so per-task results stay in
//! deterministic node-name order.

use rayon::prelude::*;
use tracing::trace;

use flotilla_api::{FitError, FitErrors, TaskInfo};

use crate::session::Session;
use crate::state::NodeState;

/// How much of the candidate set the caller needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateMode {
    /// Every feasible node, for prioritization.
    AllFeasible,
    /// Stop at the first feasible node in name order.
    FirstFeasible,
}

/// Run the session's composed predicate over all nodes.
///
/// Returns feasible node names in deterministic (lexicographic) order
/// and, when nothing fits, the per-node failures. In
/// [`PredicateMode::FirstFeasible`] the scan short-circuits: nodes
/// after the first success in name order are not evaluated.
pub fn predicate_nodes(
    ssn: &Session,
    task: &TaskInfo,
    mode: PredicateMode,
) -> (Vec<String>, FitErrors) {
    let nodes: Vec<&NodeState> = ssn.state.nodes.values().collect();

    match mode {
        PredicateMode::FirstFeasible => {
            if let Some(node) = nodes
                .par_iter()
                .find_first(|node| check_cached(ssn, task, node).is_ok())
            {
                return (vec![node.name().to_string()], FitErrors::new());
            }
            // Nothing feasible; every per-node result is now cached, so
            // collecting the failures is cheap.
            let mut errors = FitErrors::new();
            for node in &nodes {
                if let Err(err) = check_cached(ssn, task, node) {
                    errors.set_node_error(node.name(), err);
                }
            }
            (Vec::new(), errors)
        }
        PredicateMode::AllFeasible => {
            let results: Vec<(String, Result<(), FitError>)> = nodes
                .par_iter()
                .map(|node| (node.name().to_string(), check_cached(ssn, task, node)))
                .collect();

            let mut feasible = Vec::new();
            let mut errors = FitErrors::new();
            for (name, outcome) in results {
                match outcome {
                    Ok(()) => feasible.push(name),
                    Err(err) => errors.set_node_error(&name, err),
                }
            }
            (feasible, errors)
        }
    }
}

/// Cached composed-predicate check for one `(task, node)` pair.
///
/// The cache key is `(task fingerprint, node generation)`; any node
/// mutation bumps the generation, so stale entries are never read.
/// Concurrent workers may race to insert the same key, which is safe:
/// predicates are pure, so both compute the identical result.
fn check_cached(ssn: &Session, task: &TaskInfo, node: &NodeState) -> Result<(), FitError> {
    let key = (task.fingerprint(), node.generation());
    if let Some(cached) = node.predicate_cache.get(&key) {
        trace!(task = %task.key(), node = node.name(), "predicate cache hit");
        return match cached.value() {
            None => Ok(()),
            Some(err) => Err(err.clone()),
        };
    }

    let outcome = ssn.predicate(task, node);
    node.predicate_cache
        .insert(key, outcome.as_ref().err().cloned());
    outcome
}
