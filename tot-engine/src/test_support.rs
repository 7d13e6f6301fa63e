//! Test-only helpers for building trees, registries and submissions.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};

use crate::clock::Clock;
use crate::core::scoring::Estimates;
use crate::core::types::{Candidate, SampleSubmission};
use crate::io::config::EngineConfig;
use crate::registry::Registry;
use crate::tree::{Node, NodeIndex, NodeState, Tree};

/// Tree holding only a root with id `root`.
pub fn root_tree() -> Tree {
    Tree::new(Node::root("root".to_string(), "task".to_string()))
}

/// Frontier node with an explicit score; risk is `1 - score`.
pub fn child(id: &str, parent: NodeIndex, depth: usize, score: f64) -> Node {
    child_with(id, parent, depth, score, 1.0 - score, 1)
}

/// Frontier node with explicit score, risk and submission order.
pub fn child_with(
    id: &str,
    parent: NodeIndex,
    depth: usize,
    score: f64,
    risk: f64,
    seq: u64,
) -> Node {
    Node {
        id: id.to_string(),
        parent: Some(parent),
        children: Vec::new(),
        depth,
        thought: format!("{id} thought"),
        estimates: Some(Estimates::new(score, score, risk)),
        delta: None,
        score: Some(score),
        seq,
        state: NodeState::Frontier,
        prune_reason: None,
    }
}

/// Submission whose candidates score exactly the given values under the
/// default weights.
pub fn submission(parent: &str, scores: &[f64]) -> SampleSubmission {
    SampleSubmission {
        parent_node_id: parent.to_string(),
        candidates: scores
            .iter()
            .enumerate()
            .map(|(i, &s)| Candidate::new(format!("option {i} at {s}"), s, s, 1.0 - s))
            .collect(),
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().expect("clock lock");
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().expect("clock lock")
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("fixed timestamp")
    }
}

pub fn registry_with_clock(clock: Arc<ManualClock>) -> Registry {
    Registry::with_clock(EngineConfig::default(), clock).expect("default config is valid")
}
