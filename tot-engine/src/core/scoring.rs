//! Scoring of caller-supplied estimates.
//!
//! Scores are a pure weighted sum; nothing here looks at history or siblings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Caller estimates for one candidate, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimates {
    pub progress: f64,
    pub feasibility: f64,
    pub risk: f64,
}

impl Estimates {
    pub fn new(progress: f64, feasibility: f64, risk: f64) -> Self {
        Self {
            progress,
            feasibility,
            risk,
        }
    }

    /// Reject non-finite or out-of-range estimates.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("progress_estimate", self.progress),
            ("feasibility_estimate", self.feasibility),
            ("risk_estimate", self.risk),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(EngineError::invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Weights of the composite score.
///
/// `score = progress * progress_weight + feasibility * feasibility_weight
///        + (1 - risk) * risk_weight`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub progress_weight: f64,
    pub feasibility_weight: f64,
    pub risk_weight: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            progress_weight: 0.5,
            feasibility_weight: 0.3,
            risk_weight: 0.2,
        }
    }
}

impl ScoringPolicy {
    /// Weights must be finite, non-negative and sum to 1 so scores stay in `[0, 1]`.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let weights = [
            ("progress_weight", self.progress_weight),
            ("feasibility_weight", self.feasibility_weight),
            ("risk_weight", self.risk_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("scoring.{name} must be a non-negative number"));
            }
        }
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(format!("scoring weights must sum to 1, got {total}"));
        }
        Ok(())
    }

    pub fn score(&self, estimates: &Estimates) -> f64 {
        let raw = estimates.progress * self.progress_weight
            + estimates.feasibility * self.feasibility_weight
            + (1.0 - estimates.risk) * self.risk_weight;
        raw.clamp(0.0, 1.0)
    }
}

/// Ranking key shared by frontier ordering and path tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankKey {
    pub score: f64,
    pub risk: f64,
    pub seq: u64,
}

/// Best first: higher score, then lower risk, then earlier submission.
pub fn rank(a: &RankKey, b: &RankKey) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.risk.total_cmp(&b.risk))
        .then_with(|| a.seq.cmp(&b.seq))
}
