//! Replay script loading with schema + semantic validation.
//!
//! A replay script describes a scripted exploration session: run parameters
//! plus rounds of submissions. Candidates may carry a `label` so later rounds
//! can name them as parents; `root` always names the run's root.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::levels::ExplorationLevel;
use crate::core::types::{Candidate, LimitOverrides, Mode, StartRun};

pub const REPLAY_SCHEMA: &str = include_str!("../../../schemas/replay_script/v1.schema.json");

/// Parent label that always resolves to the run's root.
pub const ROOT_LABEL: &str = "root";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    pub mode: Mode,
    pub task_prompt: String,
    pub exploration_level: ExplorationLevel,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub overrides: Option<LimitOverrides>,
    #[serde(default)]
    pub enforce_completion: bool,
    pub rounds: Vec<ReplayRound>,
}

impl ReplayScript {
    pub fn start_request(&self) -> StartRun {
        StartRun {
            mode: self.mode,
            task_prompt: self.task_prompt.clone(),
            exploration_level: self.exploration_level,
            constraints: self.constraints.clone(),
            overrides: self.overrides.clone(),
        }
    }
}

/// Submissions applied together as one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRound {
    pub samples: Vec<ScriptedSubmission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedSubmission {
    /// `root` or the label of a candidate from an earlier round.
    pub parent: String,
    pub candidates: Vec<ScriptedCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub candidate: Candidate,
}

/// Load a script from disk and validate it.
pub fn load_script(path: &Path) -> Result<ReplayScript> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read script {}", path.display()))?;
    parse_script(&contents).with_context(|| format!("load script {}", path.display()))
}

/// Parse and validate a script: schema conformance + label references.
pub fn parse_script(raw: &str) -> Result<ReplayScript> {
    let value: Value = serde_json::from_str(raw).context("parse script json")?;
    validate_schema(&value)?;
    let script: ReplayScript =
        serde_json::from_value(value).context("deserialize script as v1 struct")?;
    let errors = validate_labels(&script);
    if !errors.is_empty() {
        bail!("script label violations:\n- {}", errors.join("\n- "));
    }
    debug!(rounds = script.rounds.len(), "replay script loaded");
    Ok(script)
}

fn validate_schema(instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(REPLAY_SCHEMA).context("parse replay schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("script schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}

/// Check label rules:
/// - Labels are unique and never `root`
/// - Parents name `root` or a label from an earlier round
pub fn validate_labels(script: &ReplayScript) -> Vec<String> {
    let mut errors = Vec::new();
    let mut known: HashSet<&str> = HashSet::from([ROOT_LABEL]);

    for (i, round) in script.rounds.iter().enumerate() {
        let round_no = i + 1;
        for submission in &round.samples {
            if !known.contains(submission.parent.as_str()) {
                errors.push(format!(
                    "round {round_no}: parent '{}' is not defined by an earlier round",
                    submission.parent
                ));
            }
        }
        for label in round
            .samples
            .iter()
            .flat_map(|s| &s.candidates)
            .filter_map(|c| c.label.as_deref())
        {
            if !known.insert(label) {
                errors.push(format!("round {round_no}: duplicate label '{label}'"));
            }
        }
    }
    errors
}
