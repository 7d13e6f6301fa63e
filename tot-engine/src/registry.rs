//! Owner of every run in the process.
//!
//! The registry is an explicit value: create it at startup, pass it by
//! reference to each operation, and drop or [`Registry::clear`] it on
//! shutdown. Operations on one run borrow the registry mutably, so a
//! submission's budget checks and pruning decisions apply as a single unit.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::core::enforcement::EnforcementStatus;
use crate::core::guide::{self, DepthGuideline, ExplorationGuide, LevelGuide};
use crate::core::levels::ExplorationLevel;
use crate::core::types::{Mode, RunLimits, RunStatus, SampleSubmission, StartRun};
use crate::error::{EngineError, Result};
use crate::io::config::EngineConfig;
use crate::run::{BestPath, Run, RunSummary, SampleBatch, SubmitOutcome};

/// Response of `start_run`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartedRun {
    pub run_id: String,
    pub root_node_id: String,
    pub mode: Mode,
    pub level: ExplorationLevel,
    pub limits: RunLimits,
    /// Also stored in the root's delta.
    pub constraints: Vec<String>,
    pub enforcement: EnforcementStatus,
    /// Scoring hint for the first layer of candidates.
    pub guideline: DepthGuideline,
    pub candidate_strategies: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Runs started since the registry was created or cleared.
    pub total_runs: u64,
    /// Nodes currently held across live runs, roots and overflow included.
    pub total_nodes: usize,
    pub active_runs: usize,
    pub completed_runs: usize,
}

pub struct Registry {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    runs: HashMap<String, Run>,
    runs_started: u64,
}

impl Registry {
    /// Create a registry; the config is validated first.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config
            .validate()
            .map_err(|err| EngineError::invalid(format!("{err:#}")))?;
        Ok(Self::build(config, clock))
    }

    fn build(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            runs: HashMap::new(),
            runs_started: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a run from the string arguments of the tool surface.
    pub fn start_run(
        &mut self,
        mode: &str,
        task_prompt: &str,
        exploration_level: &str,
    ) -> Result<StartedRun> {
        self.start_run_with(StartRun::parse(mode, task_prompt, exploration_level)?)
    }

    pub fn start_run_with(&mut self, request: StartRun) -> Result<StartedRun> {
        request.validate()?;
        let limits = RunLimits::resolve(
            request.mode,
            request.exploration_level.profile(),
            request.overrides.as_ref(),
        )?;

        let run_id = new_id();
        let run = Run::new(
            run_id.clone(),
            new_id(),
            request,
            limits,
            self.clock.wall(),
            self.clock.now(),
            self.runs_started,
        );
        self.runs_started += 1;

        let started = StartedRun {
            run_id: run_id.clone(),
            root_node_id: run.root_id().to_string(),
            mode: run.mode,
            level: run.level,
            limits: run.limits,
            constraints: run.constraints.clone(),
            enforcement: run.enforcement_status(self.clock.now()),
            guideline: guide::depth_guideline(run.level, 0),
            candidate_strategies: run.level.candidate_strategies(),
        };
        info!(
            run_id = %run_id,
            mode = %run.mode,
            level = %run.level,
            budget = limits.node_budget,
            min_required = limits.min_required,
            "run started"
        );
        self.runs.insert(run_id, run);
        Ok(started)
    }

    /// Summaries in creation order.
    pub fn list_runs(&self) -> Vec<RunSummary> {
        let now = self.clock.now();
        let mut runs: Vec<&Run> = self.runs.values().collect();
        runs.sort_by_key(|run| run.order);
        runs.into_iter().map(|run| run.summary(now)).collect()
    }

    /// Up to `limit` summaries, newest first.
    pub fn recent_runs(&self, limit: usize) -> Vec<RunSummary> {
        let mut runs = self.list_runs();
        runs.reverse();
        runs.truncate(limit);
        runs
    }

    pub fn get_run(&self, run_id: &str) -> Result<&Run> {
        self.runs
            .get(run_id)
            .ok_or_else(|| EngineError::run_not_found(run_id))
    }

    pub fn run_summary(&self, run_id: &str) -> Result<RunSummary> {
        Ok(self.get_run(run_id)?.summary(self.clock.now()))
    }

    fn get_run_mut(&mut self, run_id: &str) -> Result<&mut Run> {
        self.runs
            .get_mut(run_id)
            .ok_or_else(|| EngineError::run_not_found(run_id))
    }

    pub fn request_samples(&self, run_id: &str) -> Result<SampleBatch> {
        let run = self.get_run(run_id)?;
        Ok(run.sample_requests(self.clock.now()))
    }

    /// All-or-nothing: on error no node from `batch` is added.
    pub fn submit_samples(
        &mut self,
        run_id: &str,
        batch: &[SampleSubmission],
    ) -> Result<SubmitOutcome> {
        let scoring = self.config.scoring;
        let pruning = self.config.pruning;
        let run = self.get_run_mut(run_id)?;
        run.submit(batch, &scoring, &pruning, &mut new_id)
    }

    pub fn get_enforcement_status(&self, run_id: &str) -> Result<EnforcementStatus> {
        let run = self.get_run(run_id)?;
        Ok(run.enforcement_status(self.clock.now()))
    }

    pub fn get_best_path(&mut self, run_id: &str, enforce_completion: bool) -> Result<BestPath> {
        let now = self.clock.now();
        let run = self.get_run_mut(run_id)?;
        run.select_best_path(enforce_completion, now)
    }

    pub fn get_exploration_guide(&self) -> ExplorationGuide {
        guide::exploration_guide()
    }

    pub fn exploration_guide_for(&self, level: &str) -> Result<LevelGuide> {
        Ok(guide::level_guide(level.parse()?))
    }

    /// Mark a run abandoned; it stays readable but rejects submissions.
    pub fn abandon_run(&mut self, run_id: &str) -> Result<RunSummary> {
        let now = self.clock.now();
        let run = self.get_run_mut(run_id)?;
        run.abandon();
        info!(run_id = %run_id, "run abandoned");
        Ok(run.summary(now))
    }

    /// Evict a run and its tree.
    pub fn remove_run(&mut self, run_id: &str) -> Result<RunSummary> {
        let run = self
            .runs
            .remove(run_id)
            .ok_or_else(|| EngineError::run_not_found(run_id))?;
        info!(run_id = %run_id, "run removed");
        Ok(run.summary(self.clock.now()))
    }

    pub fn stats(&self) -> EngineStats {
        let count = |status: RunStatus| self.runs.values().filter(|r| r.status == status).count();
        EngineStats {
            total_runs: self.runs_started,
            total_nodes: self.runs.values().map(|r| r.tree().len()).sum(),
            active_runs: count(RunStatus::Active),
            completed_runs: count(RunStatus::Complete),
        }
    }

    /// Drop every run and reset counters.
    pub fn clear(&mut self) {
        info!(runs = self.runs.len(), "clearing registry");
        self.runs.clear();
        self.runs_started = 0;
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::build(EngineConfig::default(), Arc::new(SystemClock))
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}
