//! Prioritization helper — score aggregation across node-order
//! plugins.
//!
//! Per-plugin map scores are computed in parallel across nodes, each
//! plugin normalizes its own scores, and the totals are summed with the
//! plugin's configured weight. Batch scorers contribute on top. Ties
//! break by node name, ascending, unless a `best_node` override picks
//! a candidate.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::trace;

use flotilla_api::TaskInfo;

use crate::session::Session;
use crate::state::NodeState;

/// Aggregate node scores for one task over its feasible nodes.
pub fn prioritize_nodes(
    ssn: &Session,
    task: &TaskInfo,
    feasible: &[String],
) -> BTreeMap<String, f64> {
    let nodes: Vec<&NodeState> = feasible
        .iter()
        .filter_map(|name| ssn.state.nodes.get(name))
        .collect();
    let mut totals: BTreeMap<String, f64> =
        feasible.iter().map(|name| (name.clone(), 0.0)).collect();

    for (option, plugin) in ssn.tiers() {
        if !option.node_order_enabled() {
            continue;
        }

        let mapped: Vec<(String, Option<f64>)> = nodes
            .par_iter()
            .map(|node| (node.name().to_string(), plugin.node_order(task, node)))
            .collect();
        let mut scores: BTreeMap<String, f64> = mapped
            .into_iter()
            .filter_map(|(name, score)| score.map(|s| (name, s)))
            .collect();
        if !scores.is_empty() {
            plugin.node_order_reduce(task, &mut scores);
            for (node, score) in &scores {
                if let Some(total) = totals.get_mut(node) {
                    *total += option.weight * score;
                }
            }
            trace!(task = %task.key(), plugin = plugin.name(), "applied node-order scores");
        }

        if let Some(batch) = plugin.batch_node_order(task, &nodes) {
            for (node, score) in batch {
                if let Some(total) = totals.get_mut(&node) {
                    *total += option.weight * score;
                }
            }
        }
    }

    totals
}

/// The highest-scored node; ties go to the lexicographically smallest
/// name so identical inputs always produce identical choices.
pub fn select_best_node(scores: &BTreeMap<String, f64>) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for (node, score) in scores {
        let better = match best {
            None => true,
            Some((_, top)) => *score > top + f64::EPSILON,
        };
        if better {
            best = Some((node, *score));
        }
    }
    best.map(|(node, _)| node.to_string())
}

/// Pick the node for a task from aggregated scores: a plugin
/// `best_node` override wins, otherwise the top score.
pub fn pick_node(ssn: &Session, task: &TaskInfo, scores: &BTreeMap<String, f64>) -> Option<String> {
    ssn.best_node(task, scores)
        .or_else(|| select_best_node(scores))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(n, s)| (n.to_string(), *s)).collect()
    }

    #[test]
    fn best_node_is_highest_score() {
        let s = scores(&[("n1", 10.0), ("n2", 30.0), ("n3", 20.0)]);
        assert_eq!(select_best_node(&s).as_deref(), Some("n2"));
    }

    #[test]
    fn ties_break_by_name_ascending() {
        let s = scores(&[("n3", 50.0), ("n1", 50.0), ("n2", 50.0)]);
        assert_eq!(select_best_node(&s).as_deref(), Some("n1"));
    }

    #[test]
    fn empty_scores_give_no_node() {
        assert_eq!(select_best_node(&BTreeMap::new()), None);
    }
}
