//! Fixed exploration-level table.
//!
//! Each level maps to a node budget, a minimum consumption ratio, a wall-clock
//! deadline, a depth cap and the number of candidates asked for per request.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorationLevel {
    Shallow,
    Moderate,
    Deep,
    Exhaustive,
}

impl ExplorationLevel {
    pub const ALL: [ExplorationLevel; 4] = [
        ExplorationLevel::Shallow,
        ExplorationLevel::Moderate,
        ExplorationLevel::Deep,
        ExplorationLevel::Exhaustive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExplorationLevel::Shallow => "shallow",
            ExplorationLevel::Moderate => "moderate",
            ExplorationLevel::Deep => "deep",
            ExplorationLevel::Exhaustive => "exhaustive",
        }
    }

    /// Kinds of candidates worth proposing at this level.
    pub fn candidate_strategies(self) -> &'static [&'static str] {
        match self {
            ExplorationLevel::Shallow => &[
                "Standard approach",
                "Alternative approach",
                "Hybrid (if obvious)",
            ],
            ExplorationLevel::Moderate => &[
                "Established pattern A",
                "Established pattern B",
                "Hybrid A+B",
                "Novel or emerging pattern",
            ],
            ExplorationLevel::Deep => &[
                "Established pattern A",
                "Established pattern B",
                "Established pattern C",
                "Hybrid A+B",
                "Hybrid A+C",
                "Radical alternative",
            ],
            ExplorationLevel::Exhaustive => &[
                "Established pattern A",
                "Established pattern B",
                "Established pattern C",
                "Hybrid A+B",
                "Hybrid A+C",
                "Hybrid B+C",
                "Radical alternative",
                "Edge-case optimized",
                "Risk-minimized conservative",
                "Unconventional wild card",
            ],
        }
    }

    pub fn profile(self) -> &'static LevelProfile {
        match self {
            ExplorationLevel::Shallow => &SHALLOW,
            ExplorationLevel::Moderate => &MODERATE,
            ExplorationLevel::Deep => &DEEP,
            ExplorationLevel::Exhaustive => &EXHAUSTIVE,
        }
    }
}

impl fmt::Display for ExplorationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExplorationLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExplorationLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| {
                EngineError::invalid(format!(
                    "unknown exploration_level '{s}' (expected shallow, moderate, deep or exhaustive)"
                ))
            })
    }
}

/// Static budget profile for one exploration level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelProfile {
    pub level: ExplorationLevel,
    pub description: &'static str,
    /// Maximum number of nodes admitted to the tree (root excluded).
    pub node_budget: usize,
    /// Share of the budget that must be consumed, in percent.
    pub min_consumption_percent: usize,
    pub time_limit: Duration,
    pub max_depth: usize,
    pub candidates_per_request: usize,
    pub use_when: &'static [&'static str],
    pub avoid_when: &'static [&'static str],
}

impl LevelProfile {
    /// `ceil(node_budget * min_consumption_percent / 100)`.
    pub fn min_required(&self) -> usize {
        (self.node_budget * self.min_consumption_percent).div_ceil(100)
    }

    pub fn min_consumption_ratio(&self) -> f64 {
        self.min_consumption_percent as f64 / 100.0
    }
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;

static SHALLOW: LevelProfile = LevelProfile {
    level: ExplorationLevel::Shallow,
    description: "Surface-level exploration for quick directional decisions",
    node_budget: 20,
    min_consumption_percent: 80,
    time_limit: Duration::from_secs(5 * MINUTE),
    max_depth: 2,
    candidates_per_request: 2,
    use_when: &[
        "Simple binary decisions",
        "Well-understood problems",
        "Time-critical choices",
    ],
    avoid_when: &["Novel problems", "High-stakes decisions"],
};

static MODERATE: LevelProfile = LevelProfile {
    level: ExplorationLevel::Moderate,
    description: "Balanced exploration for technology selection and trade-offs",
    node_budget: 50,
    min_consumption_percent: 85,
    time_limit: Duration::from_secs(30 * MINUTE),
    max_depth: 3,
    candidates_per_request: 3,
    use_when: &[
        "Technology selection",
        "Architecture patterns",
        "Two to four competing approaches",
    ],
    avoid_when: &["Trivial decisions", "Safety-critical systems"],
};

static DEEP: LevelProfile = LevelProfile {
    level: ExplorationLevel::Deep,
    description: "Thorough exploration for high-stakes architectural decisions",
    node_budget: 150,
    min_consumption_percent: 90,
    time_limit: Duration::from_secs(2 * HOUR),
    max_depth: 5,
    candidates_per_request: 4,
    use_when: &[
        "Novel research problems",
        "High-stakes architecture",
        "Safety-critical systems",
    ],
    avoid_when: &["Obvious answers", "Time-critical choices"],
};

static EXHAUSTIVE: LevelProfile = LevelProfile {
    level: ExplorationLevel::Exhaustive,
    description: "Maximum rigor for publication-grade research",
    node_budget: 500,
    min_consumption_percent: 95,
    time_limit: Duration::from_secs(8 * HOUR),
    max_depth: 8,
    candidates_per_request: 5,
    use_when: &[
        "Publication-grade research",
        "Fundamental design decisions",
        "Months of work at stake",
    ],
    avoid_when: &["Simple decisions", "Tight time budgets"],
};
