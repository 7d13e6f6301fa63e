//! Scripted session orchestration: drive a registry through a replay script.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::enforcement::EnforcementStatus;
use crate::core::types::{Candidate, SampleSubmission};
use crate::error::EngineError;
use crate::io::script::{ROOT_LABEL, ReplayScript};
use crate::registry::{Registry, StartedRun};
use crate::run::{BestPath, RunSummary, SubmitOutcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    /// 1-based.
    pub round: usize,
    /// Node ids offered by `request_samples` before this round was submitted.
    pub offered: Vec<String>,
    pub outcome: SubmitOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayResult {
    Answer(BestPath),
    EnforcementNotMet(EnforcementStatus),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayOutcome {
    pub task_prompt: String,
    pub started: StartedRun,
    pub rounds: Vec<RoundRecord>,
    pub summary: RunSummary,
    pub result: ReplayResult,
}

impl ReplayOutcome {
    pub fn enforcement_met(&self) -> bool {
        matches!(self.result, ReplayResult::Answer(_))
    }
}

/// Start a run, apply every round as one batch, then ask for the best path.
///
/// An unmet enforcement gate is a normal outcome; any other engine error
/// aborts the replay.
pub fn run_replay(registry: &mut Registry, script: &ReplayScript) -> Result<ReplayOutcome> {
    let started = registry
        .start_run_with(script.start_request())
        .context("start run")?;
    let run_id = started.run_id.clone();

    let mut labels: HashMap<&str, String> = HashMap::new();
    labels.insert(ROOT_LABEL, started.root_node_id.clone());

    let mut rounds = Vec::with_capacity(script.rounds.len());
    for (i, round) in script.rounds.iter().enumerate() {
        let round_no = i + 1;
        let offered: Vec<String> = registry
            .request_samples(&run_id)
            .with_context(|| format!("request samples before round {round_no}"))?
            .requests
            .into_iter()
            .map(|req| req.node_id)
            .collect();

        let mut batch = Vec::with_capacity(round.samples.len());
        for sample in &round.samples {
            let parent_node_id = labels
                .get(sample.parent.as_str())
                .cloned()
                .ok_or_else(|| anyhow!("round {round_no}: unknown parent '{}'", sample.parent))?;
            if !offered.contains(&parent_node_id) {
                debug!(round = round_no, parent = %sample.parent, "parent was not offered for sampling");
            }
            batch.push(SampleSubmission {
                parent_node_id,
                candidates: sample
                    .candidates
                    .iter()
                    .map(|c| c.candidate.clone())
                    .collect::<Vec<Candidate>>(),
            });
        }

        let outcome = registry
            .submit_samples(&run_id, &batch)
            .with_context(|| format!("submit round {round_no}"))?;
        let scripted = round.samples.iter().flat_map(|s| &s.candidates);
        for (candidate, node_id) in scripted.zip(&outcome.node_ids) {
            if let Some(label) = candidate.label.as_deref() {
                labels.insert(label, node_id.clone());
            }
        }
        rounds.push(RoundRecord {
            round: round_no,
            offered,
            outcome,
        });
    }

    let result = match registry.get_best_path(&run_id, script.enforce_completion) {
        Ok(path) => ReplayResult::Answer(path),
        Err(EngineError::EnforcementNotMet(status)) => ReplayResult::EnforcementNotMet(*status),
        Err(err) => return Err(err).context("select best path"),
    };
    let summary = registry.run_summary(&run_id)?;
    info!(
        run_id = %run_id,
        rounds = rounds.len(),
        nodes = summary.node_count,
        "replay finished"
    );

    Ok(ReplayOutcome {
        task_prompt: script.task_prompt.clone(),
        started,
        rounds,
        summary,
        result,
    })
}
