//! Boundary types shared by the engine components.
//!
//! Inputs are validated here before anything touches a tree, so the rest of
//! the core can assume well-formed values.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::levels::{ExplorationLevel, LevelProfile};
use crate::core::scoring::Estimates;
use crate::error::{EngineError, Result};

/// Upper bound accepted for a regular-mode `node_budget` override.
pub const MAX_NODE_BUDGET: usize = 1000;
/// Upper bound accepted for a regular-mode `max_depth` override.
pub const MAX_DEPTH_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// No minimum; an answer may be requested at any time.
    Regular,
    /// A minimum node count (or the deadline) must be reached first.
    Enforced,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Regular => "regular",
            Mode::Enforced => "enforced",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "regular" => Ok(Mode::Regular),
            "enforced" => Ok(Mode::Enforced),
            other => Err(EngineError::invalid(format!(
                "unknown mode '{other}' (expected regular or enforced)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Active,
    EnforcedIncomplete,
    Complete,
    Abandoned,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Active => "active",
            RunStatus::EnforcedIncomplete => "enforced_incomplete",
            RunStatus::Complete => "complete",
            RunStatus::Abandoned => "abandoned",
        }
    }
}

/// Limits resolved for one run at `start_run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunLimits {
    pub node_budget: usize,
    pub min_required: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub time_limit: Duration,
    pub max_depth: usize,
    pub candidates_per_request: usize,
}

impl RunLimits {
    /// Copy the level's preset; regular runs have no minimum.
    pub fn resolve(
        mode: Mode,
        profile: &LevelProfile,
        overrides: Option<&LimitOverrides>,
    ) -> Result<Self> {
        let mut limits = Self {
            node_budget: profile.node_budget,
            min_required: match mode {
                Mode::Enforced => profile.min_required(),
                Mode::Regular => 0,
            },
            time_limit: profile.time_limit,
            max_depth: profile.max_depth,
            candidates_per_request: profile.candidates_per_request,
        };
        let Some(overrides) = overrides.filter(|o| !o.is_empty()) else {
            return Ok(limits);
        };
        if mode == Mode::Enforced {
            return Err(EngineError::invalid(
                "limit overrides are only accepted in regular mode",
            ));
        }
        overrides.validate()?;
        if let Some(budget) = overrides.node_budget {
            limits.node_budget = budget;
        }
        if let Some(depth) = overrides.max_depth {
            limits.max_depth = depth;
        }
        if let Some(per_request) = overrides.candidates_per_request {
            limits.candidates_per_request = per_request;
        }
        Ok(limits)
    }
}

fn serialize_secs<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

/// Regular-mode adjustments to the level preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitOverrides {
    pub node_budget: Option<usize>,
    pub max_depth: Option<usize>,
    pub candidates_per_request: Option<usize>,
}

impl LimitOverrides {
    pub fn is_empty(&self) -> bool {
        self.node_budget.is_none()
            && self.max_depth.is_none()
            && self.candidates_per_request.is_none()
    }

    fn validate(&self) -> Result<()> {
        let checks = [
            ("node_budget", self.node_budget, Some(MAX_NODE_BUDGET)),
            ("max_depth", self.max_depth, Some(MAX_DEPTH_LIMIT)),
            ("candidates_per_request", self.candidates_per_request, None),
        ];
        for (name, value, max) in checks {
            let Some(v) = value else { continue };
            match max {
                Some(max) if v == 0 || v > max => {
                    return Err(EngineError::invalid(format!(
                        "{name} override must be between 1 and {max}, got {v}"
                    )));
                }
                None if v == 0 => {
                    return Err(EngineError::invalid(format!(
                        "{name} override must be at least 1, got {v}"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Full `start_run` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRun {
    pub mode: Mode,
    pub task_prompt: String,
    pub exploration_level: ExplorationLevel,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub overrides: Option<LimitOverrides>,
}

impl StartRun {
    pub fn new(mode: Mode, task_prompt: impl Into<String>, level: ExplorationLevel) -> Self {
        Self {
            mode,
            task_prompt: task_prompt.into(),
            exploration_level: level,
            constraints: Vec::new(),
            overrides: None,
        }
    }

    /// Parse the string form used by the remote tool surface.
    pub fn parse(mode: &str, task_prompt: &str, exploration_level: &str) -> Result<Self> {
        Ok(Self::new(
            mode.parse()?,
            task_prompt,
            exploration_level.parse()?,
        ))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.task_prompt.trim().is_empty() {
            return Err(EngineError::invalid("task_prompt must not be empty"));
        }
        Ok(())
    }
}

/// One proposed child thought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub thought: String,
    pub progress_estimate: f64,
    pub feasibility_estimate: f64,
    pub risk_estimate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Map<String, Value>>,
}

impl Candidate {
    pub fn new(thought: impl Into<String>, progress: f64, feasibility: f64, risk: f64) -> Self {
        Self {
            thought: thought.into(),
            progress_estimate: progress,
            feasibility_estimate: feasibility,
            risk_estimate: risk,
            delta: None,
        }
    }

    pub fn estimates(&self) -> Estimates {
        Estimates::new(
            self.progress_estimate,
            self.feasibility_estimate,
            self.risk_estimate,
        )
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.thought.trim().is_empty() {
            return Err(EngineError::invalid("candidate thought must not be empty"));
        }
        self.estimates().validate()
    }
}

/// Candidates proposed beneath one parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSubmission {
    pub parent_node_id: String,
    pub candidates: Vec<Candidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_unknown_mode_and_empty_prompt() {
        assert!(matches!(
            StartRun::parse("relaxed", "task", "shallow"),
            Err(EngineError::InvalidArgument(_))
        ));
        let request = StartRun::parse("enforced", "   ", "shallow").expect("parse");
        assert!(request.validate().is_err());
    }

    #[test]
    fn regular_runs_have_no_minimum() {
        let profile = ExplorationLevel::Moderate.profile();
        let limits = RunLimits::resolve(Mode::Regular, profile, None).expect("limits");
        assert_eq!(limits.min_required, 0);
        assert_eq!(limits.node_budget, 50);

        let enforced = RunLimits::resolve(Mode::Enforced, profile, None).expect("limits");
        assert_eq!(enforced.min_required, 43);
    }

    #[test]
    fn overrides_apply_only_in_regular_mode() {
        let profile = ExplorationLevel::Shallow.profile();
        let overrides = LimitOverrides {
            node_budget: Some(8),
            max_depth: Some(4),
            candidates_per_request: None,
        };
        let limits =
            RunLimits::resolve(Mode::Regular, profile, Some(&overrides)).expect("limits");
        assert_eq!((limits.node_budget, limits.max_depth), (8, 4));
        assert_eq!(limits.candidates_per_request, 2);

        assert!(RunLimits::resolve(Mode::Enforced, profile, Some(&overrides)).is_err());
        assert!(
            RunLimits::resolve(Mode::Enforced, profile, Some(&LimitOverrides::default())).is_ok()
        );
    }

    #[test]
    fn overrides_reject_zero_and_oversized_values() {
        let profile = ExplorationLevel::Shallow.profile();
        for overrides in [
            LimitOverrides {
                node_budget: Some(0),
                ..Default::default()
            },
            LimitOverrides {
                max_depth: Some(MAX_DEPTH_LIMIT + 1),
                ..Default::default()
            },
        ] {
            assert!(RunLimits::resolve(Mode::Regular, profile, Some(&overrides)).is_err());
        }
    }

    #[test]
    fn unbounded_override_reports_lower_bound_only() {
        let overrides = LimitOverrides {
            candidates_per_request: Some(0),
            ..Default::default()
        };
        let err = overrides.validate().expect_err("zero");
        assert_eq!(
            err.to_string(),
            "invalid argument: candidates_per_request override must be at least 1, got 0"
        );
    }

    #[test]
    fn candidate_requires_thought_text() {
        assert!(Candidate::new("", 0.5, 0.5, 0.5).validate().is_err());
        assert!(Candidate::new("idea", 0.5, 0.5, 1.1).validate().is_err());
        assert!(Candidate::new("idea", 0.5, 0.5, 0.5).validate().is_ok());
    }
}
