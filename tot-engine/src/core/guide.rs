//! Read-only exploration guide: the level table plus per-depth scoring hints.
//!
//! The guide is process-wide and carries no run state. Sample requests embed the
//! guideline for the depth being expanded, so candidate generators can
//! calibrate their estimates.

use serde::Serialize;

use crate::core::levels::{ExplorationLevel, LevelProfile};

/// Scoring hint for the children of a node at `depth`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthGuideline {
    /// Depth of the node being expanded.
    pub depth: usize,
    pub description: &'static str,
    /// Recommended `(low, high)` score band.
    pub score_range: (f64, f64),
    pub strategy: &'static str,
    pub diversity: &'static str,
}

/// Serializable view of one level profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelGuide {
    pub level: ExplorationLevel,
    pub description: &'static str,
    pub node_budget: usize,
    pub min_consumption_ratio: f64,
    pub min_required: usize,
    pub time_limit_secs: u64,
    pub max_depth: usize,
    pub candidates_per_request: usize,
    pub use_when: Vec<&'static str>,
    pub avoid_when: Vec<&'static str>,
    /// Kinds of candidates worth proposing at this level.
    pub candidate_strategies: Vec<&'static str>,
    /// Level-specific guidelines for every expandable depth.
    pub scoring_guidelines: Vec<DepthGuideline>,
}

impl From<&LevelProfile> for LevelGuide {
    fn from(profile: &LevelProfile) -> Self {
        Self {
            level: profile.level,
            description: profile.description,
            node_budget: profile.node_budget,
            min_consumption_ratio: profile.min_consumption_ratio(),
            min_required: profile.min_required(),
            time_limit_secs: profile.time_limit.as_secs(),
            max_depth: profile.max_depth,
            candidates_per_request: profile.candidates_per_request,
            use_when: profile.use_when.to_vec(),
            avoid_when: profile.avoid_when.to_vec(),
            candidate_strategies: profile.level.candidate_strategies().to_vec(),
            scoring_guidelines: (0..profile.max_depth)
                .map(|depth| depth_guideline(profile.level, depth))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplorationGuide {
    pub levels: Vec<LevelGuide>,
    /// Level-independent guidelines, depth 0 through 4.
    pub depth_guidelines: Vec<DepthGuideline>,
}

type Row = (f64, f64, &'static str);

const BASE: [(&str, Row, &str); 5] = [
    (
        "Root: core approaches",
        (0.50, 0.70, "Propose orthogonal approaches and keep scores below 0.70 so every branch gets expanded."),
        "Maximum diversity: orthogonal approaches",
    ),
    (
        "Refinements of the chosen approach",
        (0.55, 0.72, "Explore variations; only the strongest refinements should reach 0.70."),
        "High diversity: explore variations",
    ),
    (
        "Specific mechanisms",
        (0.50, 0.75, "Exceptional mechanisms may reach 0.75; alternatives stay between 0.50 and 0.65."),
        "Medium diversity: implementation variants",
    ),
    (
        "Implementation details",
        (0.45, 0.70, "Scores trend lower unless a detail carries real insight."),
        "Low diversity: focus on details",
    ),
    (
        "Deep refinements",
        (0.40, 0.65, "Edge cases and optimizations; only breakthroughs exceed 0.60."),
        "Minimal diversity: refinement only",
    ),
];

const SHALLOW: &[Row] = &[
    (0.45, 0.65, "Keep every candidate below 0.70."),
    (0.50, 0.68, "The best candidate may reach 0.68."),
    (0.55, 0.70, "Reserve the top of the band for final answers."),
];

const MODERATE: &[Row] = &[
    (0.50, 0.70, "Spread candidates over 0.50-0.65; the best may reach 0.68-0.70."),
    (0.55, 0.72, "Top candidates may reach 0.70-0.72."),
    (0.50, 0.75, "Exceptional candidates may reach 0.75."),
    (0.45, 0.70, "Implementation details."),
];

const DEEP: &[Row] = &[
    (0.50, 0.70, "Keep everything below 0.70 to force expansion."),
    (0.55, 0.68, "Score conservatively."),
    (0.50, 0.70, "Only excellent candidates reach 0.70."),
    (0.45, 0.65, "Most candidates land in 0.45-0.60."),
    (0.40, 0.60, "Deep details stay within 0.40-0.55."),
];

const EXHAUSTIVE: &[Row] = &[
    (0.45, 0.65, "Score very conservatively to force deep exploration."),
    (0.50, 0.65, "Keep most candidates below 0.65."),
    (0.45, 0.65, "Only exceptional candidates reach 0.65."),
    (0.40, 0.60, "Deep implementation."),
    (0.35, 0.55, "Fine details."),
];

fn level_rows(level: ExplorationLevel) -> &'static [Row] {
    match level {
        ExplorationLevel::Shallow => SHALLOW,
        ExplorationLevel::Moderate => MODERATE,
        ExplorationLevel::Deep => DEEP,
        ExplorationLevel::Exhaustive => EXHAUSTIVE,
    }
}

/// Level-independent guideline. Depths past the table reuse its last row.
pub fn base_guideline(depth: usize) -> DepthGuideline {
    let (description, (low, high, strategy), diversity) = BASE[depth.min(BASE.len() - 1)];
    DepthGuideline {
        depth,
        description,
        score_range: (low, high),
        strategy,
        diversity,
    }
}

/// Guideline for expanding a node at `depth` in a run of `level`.
///
/// Score bands come from the level's own table; depths past it reuse its
/// deepest row.
pub fn depth_guideline(level: ExplorationLevel, depth: usize) -> DepthGuideline {
    let rows = level_rows(level);
    let (low, high, strategy) = rows[depth.min(rows.len() - 1)];
    DepthGuideline {
        score_range: (low, high),
        strategy,
        ..base_guideline(depth)
    }
}

pub fn exploration_guide() -> ExplorationGuide {
    ExplorationGuide {
        levels: ExplorationLevel::ALL
            .iter()
            .map(|level| LevelGuide::from(level.profile()))
            .collect(),
        depth_guidelines: (0..BASE.len()).map(base_guideline).collect(),
    }
}

pub fn level_guide(level: ExplorationLevel) -> LevelGuide {
    LevelGuide::from(level.profile())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guide_lists_every_level_in_order() {
        let guide = exploration_guide();
        let levels: Vec<_> = guide.levels.iter().map(|l| l.level).collect();
        assert_eq!(levels, ExplorationLevel::ALL.to_vec());
        assert_eq!(guide.levels[1].min_required, 43);
        assert_eq!(guide.levels[3].time_limit_secs, 8 * 60 * 60);
        assert_eq!(guide.depth_guidelines.len(), 5);
    }

    #[test]
    fn deep_depths_reuse_last_guideline() {
        let last = base_guideline(4);
        let deeper = base_guideline(9);
        assert_eq!(deeper.depth, 9);
        assert_eq!(deeper.score_range, last.score_range);
        assert_eq!(deeper.strategy, last.strategy);

        let shallow_last = depth_guideline(ExplorationLevel::Shallow, 2);
        assert_eq!(
            depth_guideline(ExplorationLevel::Shallow, 7).score_range,
            shallow_last.score_range
        );
    }

    #[test]
    fn score_bands_differ_by_level() {
        let shallow = depth_guideline(ExplorationLevel::Shallow, 0);
        let exhaustive = depth_guideline(ExplorationLevel::Exhaustive, 4);
        let deep = depth_guideline(ExplorationLevel::Deep, 4);
        assert_eq!(shallow.score_range, (0.45, 0.65));
        assert_eq!(deep.score_range, (0.40, 0.60));
        assert_eq!(exhaustive.score_range, (0.35, 0.55));
        assert_eq!(shallow.description, base_guideline(0).description);
    }

    #[test]
    fn level_guide_carries_strategies_and_guidelines() {
        let guide = level_guide(ExplorationLevel::Deep);
        assert_eq!(guide.candidate_strategies.len(), 6);
        assert_eq!(guide.scoring_guidelines.len(), guide.max_depth);
        assert_eq!(guide.scoring_guidelines[1].score_range, (0.55, 0.68));

        let shallow = level_guide(ExplorationLevel::Shallow);
        assert_eq!(shallow.candidate_strategies[0], "Standard approach");
    }
}
