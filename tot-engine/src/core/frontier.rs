//! Frontier scheduling and pruning.
//!
//! The frontier is every childless, unpruned node; a leaf labelled terminal by
//! a best-path query stays on it. Requests are offered
//! best-first and capped so that answering all of them cannot push the run
//! past its node budget.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::guide::{DepthGuideline, depth_guideline};
use crate::core::levels::ExplorationLevel;
use crate::core::scoring::{RankKey, rank};
use crate::core::types::RunLimits;
use crate::tree::{Node, NodeIndex, PruneReason, Tree};

/// Low-water pruning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruningPolicy {
    /// Quantile of a depth's scores below which frontier nodes are pruned.
    pub percentile: f64,
    /// Minimum number of scored nodes at a depth before pruning applies.
    pub min_peers: usize,
}

impl Default for PruningPolicy {
    fn default() -> Self {
        Self {
            percentile: 0.25,
            min_peers: 4,
        }
    }
}

impl PruningPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if !self.percentile.is_finite() || !(0.0..=1.0).contains(&self.percentile) {
            return Err(format!(
                "pruning.percentile must be within [0, 1], got {}",
                self.percentile
            ));
        }
        if self.min_peers < 2 {
            return Err("pruning.min_peers must be >= 2".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AncestorEntry {
    pub node_id: String,
    pub depth: usize,
    pub thought: String,
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<Map<String, Value>>,
}

impl From<&Node> for AncestorEntry {
    fn from(node: &Node) -> Self {
        Self {
            node_id: node.id.clone(),
            depth: node.depth,
            thought: node.thought.clone(),
            score: node.score,
            delta: node.delta.clone(),
        }
    }
}

/// One node the caller is asked to expand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRequest {
    pub node_id: String,
    pub depth: usize,
    pub thought: String,
    pub score: Option<f64>,
    /// State carried by the node; the root holds the run's constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<Map<String, Value>>,
    pub num_candidates: usize,
    /// Root first, parent last.
    pub ancestors: Vec<AncestorEntry>,
    /// Scoring hint for the children being requested.
    pub guideline: DepthGuideline,
    pub candidate_strategies: &'static [&'static str],
}

/// Budget left before new nodes are accepted only as pruned.
pub fn remaining_budget(limits: &RunLimits, total_node_count: usize) -> usize {
    limits.node_budget.saturating_sub(total_node_count)
}

/// Frontier nodes that may still grow, best first. The root ranks ahead of
/// everything since it has no score.
pub fn expandable(tree: &Tree, limits: &RunLimits) -> Vec<NodeIndex> {
    let mut nodes: Vec<(RankKey, NodeIndex)> = tree
        .iter()
        .filter(|(_, node)| node.is_open() && node.depth < limits.max_depth)
        .map(|(idx, node)| {
            let key = RankKey {
                score: node.score.unwrap_or(f64::INFINITY),
                risk: node.risk(),
                seq: node.seq,
            };
            (key, idx)
        })
        .collect();
    nodes.sort_by(|a, b| rank(&a.0, &b.0));
    nodes.into_iter().map(|(_, idx)| idx).collect()
}

/// Build the sample requests for the current frontier.
pub fn select_requests(
    tree: &Tree,
    level: ExplorationLevel,
    limits: &RunLimits,
    total_node_count: usize,
) -> Vec<SampleRequest> {
    let remaining = remaining_budget(limits, total_node_count);
    if remaining == 0 {
        return Vec::new();
    }
    let per_request = limits.candidates_per_request.max(1);
    let cap = (remaining / per_request).max(1);
    let num_candidates = per_request.min(remaining);

    expandable(tree, limits)
        .into_iter()
        .take(cap)
        .map(|idx| {
            let node = tree.get(idx);
            SampleRequest {
                node_id: node.id.clone(),
                depth: node.depth,
                thought: node.thought.clone(),
                score: node.score,
                delta: node.delta.clone(),
                num_candidates,
                ancestors: tree
                    .ancestors(idx)
                    .into_iter()
                    .map(|a| AncestorEntry::from(tree.get(a)))
                    .collect(),
                guideline: depth_guideline(level, node.depth),
                candidate_strategies: level.candidate_strategies(),
            }
        })
        .collect()
}

/// Linear-interpolated quantile of `scores`, or `None` with fewer than
/// `min_peers` values.
pub fn low_water_mark(scores: &[f64], policy: &PruningPolicy) -> Option<f64> {
    if scores.is_empty() || scores.len() < policy.min_peers {
        return None;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last = sorted.len() - 1;
    let rank = policy.percentile.clamp(0.0, 1.0) * last as f64;
    let lo = (rank.floor() as usize).min(last);
    let hi = (rank.ceil() as usize).min(last);
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

/// Prune frontier nodes scoring strictly below the low-water mark of their
/// depth, for each depth in `depths`. Returns the pruned indices.
pub fn prune_low_water(
    tree: &mut Tree,
    depths: &BTreeSet<usize>,
    policy: &PruningPolicy,
) -> Vec<NodeIndex> {
    let mut pruned = Vec::new();
    for &depth in depths {
        let peers: Vec<(NodeIndex, f64)> = tree
            .iter()
            .filter(|(_, node)| {
                node.depth == depth && node.prune_reason != Some(PruneReason::Budget)
            })
            .filter_map(|(idx, node)| node.score.map(|score| (idx, score)))
            .collect();
        let scores: Vec<f64> = peers.iter().map(|(_, score)| *score).collect();
        let Some(mark) = low_water_mark(&scores, policy) else {
            continue;
        };
        for (idx, score) in peers {
            if score < mark && tree.get_mut(idx).prune(PruneReason::LowWater) {
                pruned.push(idx);
            }
        }
    }
    pruned
}
