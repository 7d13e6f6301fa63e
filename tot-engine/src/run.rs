//! A single exploration run: its tree, limits and counters.
//!
//! `Run` is the unit of atomicity. Every mutation is validated in full before
//! the first node is attached, so a rejected batch leaves no trace.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::core::enforcement::{self, Counters, EnforcementStatus};
use crate::core::frontier::{self, PruningPolicy, SampleRequest};
use crate::core::invariants::validate_invariants;
use crate::core::levels::ExplorationLevel;
use crate::core::path::{self, PathStep};
use crate::core::scoring::ScoringPolicy;
use crate::core::types::{Mode, RunLimits, RunStatus, SampleSubmission, StartRun};
use crate::error::{EngineError, Result};
use crate::tree::{Node, NodeIndex, NodeState, PruneReason, Tree};

const PROMPT_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone)]
pub struct Run {
    pub id: String,
    pub task_prompt: String,
    pub mode: Mode,
    pub level: ExplorationLevel,
    pub limits: RunLimits,
    pub status: RunStatus,
    pub constraints: Vec<String>,
    pub created_at: DateTime<Utc>,
    started: Instant,
    /// Registry-wide creation order.
    pub(crate) order: u64,
    tree: Tree,
    total_node_count: usize,
    overflow_count: usize,
    next_seq: u64,
    best_leaf: Option<NodeIndex>,
}

/// Node counts per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub frontier: usize,
    pub expanded: usize,
    pub pruned: usize,
    pub terminal: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub mode: Mode,
    pub level: ExplorationLevel,
    pub status: RunStatus,
    pub node_count: usize,
    pub overflow_count: usize,
    pub elapsed_secs: f64,
    pub created_at: DateTime<Utc>,
    pub task_preview: String,
    pub states: StateCounts,
}

/// Response of `request_samples`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleBatch {
    pub run_id: String,
    pub mode: Mode,
    /// All frontier nodes, including those past the depth cap or request cap.
    pub frontier_size: usize,
    pub remaining_budget: usize,
    pub requests: Vec<SampleRequest>,
    pub enforcement: EnforcementStatus,
}

/// Response of `submit_samples`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub run_id: String,
    pub nodes_created: usize,
    pub nodes_admitted: usize,
    /// Budget overflow plus low-water pruning from this batch.
    pub nodes_pruned: usize,
    /// Ids of the created nodes, in submission order.
    pub node_ids: Vec<String>,
    pub total_node_count: usize,
    pub remaining_budget: usize,
}

/// Response of `get_best_path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPath {
    pub run_id: String,
    pub final_answer: String,
    /// Minimum node score along the path.
    pub confidence: f64,
    /// Thoughts from the root's child down to the leaf.
    pub thought_chain: Vec<String>,
    pub steps: Vec<PathStep>,
    pub path_length: usize,
    pub mode: Mode,
    pub status: RunStatus,
    pub enforcement: EnforcementStatus,
}

impl Run {
    pub(crate) fn new(
        id: String,
        root_id: String,
        request: StartRun,
        limits: RunLimits,
        created_at: DateTime<Utc>,
        started: Instant,
        order: u64,
    ) -> Self {
        let mut root = Node::root(root_id, request.task_prompt.clone());
        root.delta = Some(Map::from_iter([(
            "constraints".to_string(),
            Value::from(request.constraints.clone()),
        )]));
        Self {
            id,
            task_prompt: request.task_prompt,
            mode: request.mode,
            level: request.exploration_level,
            limits,
            status: RunStatus::Active,
            constraints: request.constraints,
            created_at,
            started,
            order,
            tree: Tree::new(root),
            total_node_count: 0,
            overflow_count: 0,
            next_seq: 1,
            best_leaf: None,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root_id(&self) -> &str {
        &self.tree.root().id
    }

    /// Nodes admitted within budget; the root and overflow nodes are excluded.
    pub fn total_node_count(&self) -> usize {
        self.total_node_count
    }

    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    pub fn best_node(&self) -> Option<&Node> {
        self.best_leaf.map(|idx| self.tree.get(idx))
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for (_, node) in self.tree.iter() {
            match node.state {
                NodeState::Frontier => counts.frontier += 1,
                NodeState::Expanded => counts.expanded += 1,
                NodeState::Pruned => counts.pruned += 1,
                NodeState::Terminal => counts.terminal += 1,
            }
        }
        counts
    }

    pub fn summary(&self, now: Instant) -> RunSummary {
        let mut task_preview: String = self.task_prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        if self.task_prompt.chars().count() > PROMPT_PREVIEW_CHARS {
            task_preview.push_str("...");
        }
        RunSummary {
            run_id: self.id.clone(),
            mode: self.mode,
            level: self.level,
            status: self.status,
            node_count: self.total_node_count,
            overflow_count: self.overflow_count,
            elapsed_secs: self.elapsed(now).as_secs_f64(),
            created_at: self.created_at,
            task_preview,
            states: self.state_counts(),
        }
    }

    pub fn enforcement_status(&self, now: Instant) -> EnforcementStatus {
        enforcement::evaluate(
            self.mode,
            self.level,
            &self.limits,
            Counters {
                nodes_created: self.total_node_count,
                elapsed: self.elapsed(now),
                max_depth_reached: self.tree.max_depth(),
            },
        )
    }

    pub fn sample_requests(&self, now: Instant) -> SampleBatch {
        let requests = frontier::select_requests(
            &self.tree,
            self.level,
            &self.limits,
            self.total_node_count,
        );
        SampleBatch {
            run_id: self.id.clone(),
            mode: self.mode,
            frontier_size: self.tree.iter().filter(|(_, node)| node.is_open()).count(),
            remaining_budget: frontier::remaining_budget(&self.limits, self.total_node_count),
            requests,
            enforcement: self.enforcement_status(now),
        }
    }

    /// Validate the whole batch, then attach every candidate.
    pub(crate) fn submit(
        &mut self,
        batch: &[SampleSubmission],
        scoring: &ScoringPolicy,
        pruning: &PruningPolicy,
        new_id: &mut dyn FnMut() -> String,
    ) -> Result<SubmitOutcome> {
        let parents = self.validate_batch(batch)?;

        let mut node_ids = Vec::new();
        let mut admitted = 0;
        let mut overflow = 0;
        let mut depths = BTreeSet::new();

        for (submission, parent) in batch.iter().zip(parents) {
            let depth = self.tree.get(parent).depth + 1;
            for candidate in &submission.candidates {
                let estimates = candidate.estimates();
                let mut node = Node {
                    id: new_id(),
                    parent: Some(parent),
                    children: Vec::new(),
                    depth,
                    thought: candidate.thought.clone(),
                    estimates: Some(estimates),
                    delta: candidate.delta.clone(),
                    score: Some(scoring.score(&estimates)),
                    seq: self.next_seq,
                    state: NodeState::Frontier,
                    prune_reason: None,
                };
                self.next_seq += 1;

                if self.total_node_count < self.limits.node_budget {
                    self.total_node_count += 1;
                    admitted += 1;
                    depths.insert(depth);
                } else {
                    node.prune(PruneReason::Budget);
                    overflow += 1;
                }
                node_ids.push(node.id.clone());
                self.tree.attach(node);
            }
        }
        self.overflow_count += overflow;

        let low_water = frontier::prune_low_water(&mut self.tree, &depths, pruning);
        self.status = RunStatus::Active;
        debug_assert!(
            validate_invariants(&self.tree).is_empty(),
            "tree invariants violated after submit"
        );

        if overflow > 0 {
            warn!(run_id = %self.id, overflow, "node budget exhausted; extra candidates pruned");
        }
        debug!(
            run_id = %self.id,
            admitted,
            low_water = low_water.len(),
            total = self.total_node_count,
            "samples submitted"
        );

        Ok(SubmitOutcome {
            run_id: self.id.clone(),
            nodes_created: node_ids.len(),
            nodes_admitted: admitted,
            nodes_pruned: overflow + low_water.len(),
            node_ids,
            total_node_count: self.total_node_count,
            remaining_budget: frontier::remaining_budget(&self.limits, self.total_node_count),
        })
    }

    /// Resolve every parent and check every candidate without mutating anything.
    fn validate_batch(&self, batch: &[SampleSubmission]) -> Result<Vec<NodeIndex>> {
        if self.status == RunStatus::Abandoned {
            return Err(EngineError::invalid(format!(
                "run '{}' has been abandoned",
                self.id
            )));
        }
        if batch.is_empty() {
            return Err(EngineError::invalid("sample batch must not be empty"));
        }

        let mut parents = Vec::with_capacity(batch.len());
        for submission in batch {
            let idx = self
                .tree
                .lookup(&submission.parent_node_id)
                .ok_or_else(|| EngineError::node_not_found(&submission.parent_node_id))?;
            let parent = self.tree.get(idx);
            if parent.is_pruned() {
                return Err(EngineError::invalid(format!(
                    "node '{}' is pruned and cannot be expanded",
                    parent.id
                )));
            }
            if parent.depth >= self.limits.max_depth {
                return Err(EngineError::invalid(format!(
                    "node '{}' is at the maximum depth {}",
                    parent.id, self.limits.max_depth
                )));
            }
            if submission.candidates.is_empty() {
                return Err(EngineError::invalid(format!(
                    "no candidates submitted for node '{}'",
                    parent.id
                )));
            }
            for candidate in &submission.candidates {
                candidate.validate()?;
            }
            parents.push(idx);
        }
        Ok(parents)
    }

    /// Select the best path and label it terminal.
    pub(crate) fn select_best_path(
        &mut self,
        enforce_completion: bool,
        now: Instant,
    ) -> Result<BestPath> {
        let enforcement = self.enforcement_status(now);
        if enforce_completion && self.mode == Mode::Enforced && !enforcement.complete {
            warn!(
                run_id = %self.id,
                nodes = enforcement.nodes_created,
                required = enforcement.min_required,
                "best path requested before enforcement requirements were met"
            );
            return Err(EngineError::EnforcementNotMet(Box::new(enforcement)));
        }

        let choice = path::best_path(&self.tree).ok_or(EngineError::EmptyTree)?;
        let nodes = path::path_to(&self.tree, choice.leaf);
        for &idx in &nodes {
            self.tree.get_mut(idx).mark_terminal();
        }
        self.best_leaf = Some(choice.leaf);
        if self.status != RunStatus::Abandoned {
            self.status = if self.mode == Mode::Enforced && !enforcement.complete {
                RunStatus::EnforcedIncomplete
            } else {
                RunStatus::Complete
            };
        }

        let steps = path::steps(&self.tree, &nodes);
        info!(
            run_id = %self.id,
            path_length = steps.len(),
            confidence = choice.confidence,
            "best path selected"
        );
        Ok(BestPath {
            run_id: self.id.clone(),
            final_answer: self.tree.get(choice.leaf).thought.clone(),
            confidence: choice.confidence,
            thought_chain: steps.iter().map(|s| s.thought.clone()).collect(),
            path_length: steps.len(),
            steps,
            mode: self.mode,
            status: self.status,
            enforcement,
        })
    }

    pub(crate) fn abandon(&mut self) {
        self.status = RunStatus::Abandoned;
    }
}
