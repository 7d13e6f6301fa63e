//! Completion rules for enforced runs.
//!
//! Node count and elapsed time are two independent monotonic counters read at
//! query time. A run is complete once it has created `min_required` nodes or
//! its deadline has passed.

use std::time::Duration;

use serde::Serialize;

use crate::core::levels::ExplorationLevel;
use crate::core::types::{Mode, RunLimits};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnforcementStatus {
    pub mode: Mode,
    pub level: ExplorationLevel,
    pub nodes_created: usize,
    pub min_required: usize,
    pub requirement_met: bool,
    pub time_elapsed_secs: f64,
    pub time_limit_secs: u64,
    pub time_exceeded: bool,
    /// `requirement_met || time_exceeded`.
    pub complete: bool,
    pub max_depth_reached: usize,
}

impl EnforcementStatus {
    /// Nodes still needed before the minimum is met.
    pub fn nodes_remaining(&self) -> usize {
        self.min_required.saturating_sub(self.nodes_created)
    }
}

/// Snapshot of the counters enforcement looks at.
#[derive(Debug, Clone, Copy)]
pub struct Counters {
    pub nodes_created: usize,
    pub elapsed: Duration,
    pub max_depth_reached: usize,
}

pub fn evaluate(
    mode: Mode,
    level: ExplorationLevel,
    limits: &RunLimits,
    counters: Counters,
) -> EnforcementStatus {
    let (min_required, requirement_met) = match mode {
        Mode::Regular => (0, true),
        Mode::Enforced => (
            limits.min_required,
            counters.nodes_created >= limits.min_required,
        ),
    };
    let time_exceeded = counters.elapsed >= limits.time_limit;
    EnforcementStatus {
        mode,
        level,
        nodes_created: counters.nodes_created,
        min_required,
        requirement_met,
        time_elapsed_secs: counters.elapsed.as_secs_f64(),
        time_limit_secs: limits.time_limit.as_secs(),
        time_exceeded,
        complete: requirement_met || time_exceeded,
        max_depth_reached: counters.max_depth_reached,
    }
}
