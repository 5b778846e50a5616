use serde::{Deserialize, Serialize};

use crate::model::ids::IdeaId;

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Leverage score attached to an idea.
///
/// `impact`, `fit` and `speed` are higher-is-better; `effort` and `cost` are
/// lower-is-better. `total` is taken from the analysis as published and is
/// what ranking uses. It is not recomputed from the components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaScore {
    pub impact: u8,
    pub fit: u8,
    pub speed: u8,
    pub effort: u8,
    pub cost: u8,
    pub total: i32,
}

/// Coarse bucket for display of a score total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Moderate,
}

impl IdeaScore {
    /// Each component is rated out of this value.
    pub const COMPONENT_MAX: u8 = 5;

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        match self.total {
            t if t >= 10 => ScoreBand::Excellent,
            t if t >= 7 => ScoreBand::Good,
            _ => ScoreBand::Moderate,
        }
    }

    /// `impact + fit + speed - effort - cost`.
    #[must_use]
    pub fn component_balance(&self) -> i32 {
        i32::from(self.impact) + i32::from(self.fit) + i32::from(self.speed)
            - i32::from(self.effort)
            - i32::from(self.cost)
    }

    /// Whether the published total agrees with `component_balance`.
    ///
    /// The published analyses do not hold to this; callers must not "repair"
    /// `total` based on it.
    #[must_use]
    pub fn total_matches_components(&self) -> bool {
        self.total == self.component_balance()
    }
}

//
// ─── RECOMMENDATION ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    ExecuteNow,
    Priority,
    Deferred,
    LongTerm,
}

impl RecommendationTier {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExecuteNow => "Execute now",
            Self::Priority => "Priority",
            Self::Deferred => "On hold (next step)",
            Self::LongTerm => "Long-term",
        }
    }

    #[must_use]
    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::ExecuteNow)
    }
}

//
// ─── IDEA ──────────────────────────────────────────────────────────────────────
//

/// A scored marketing idea derived from a week's chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: IdeaId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub category_emoji: String,
    pub recommendation: RecommendationTier,
    pub chapter_principle: String,
    pub smallest_viable_action: String,
    pub success_metric: String,
    pub risks: Vec<String>,
    pub score: IdeaScore,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(total: i32) -> IdeaScore {
        IdeaScore {
            impact: 5,
            fit: 5,
            speed: 5,
            effort: 2,
            cost: 2,
            total,
        }
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(score(13).band(), ScoreBand::Excellent);
        assert_eq!(score(10).band(), ScoreBand::Excellent);
        assert_eq!(score(9).band(), ScoreBand::Good);
        assert_eq!(score(7).band(), ScoreBand::Good);
        assert_eq!(score(6).band(), ScoreBand::Moderate);
        assert_eq!(score(-2).band(), ScoreBand::Moderate);
    }

    #[test]
    fn component_balance_subtracts_effort_and_cost() {
        assert_eq!(score(0).component_balance(), 11);
        assert!(score(11).total_matches_components());
        assert!(!score(13).total_matches_components());
    }

    #[test]
    fn only_execute_now_is_urgent() {
        assert!(RecommendationTier::ExecuteNow.is_urgent());
        assert!(!RecommendationTier::Priority.is_urgent());
        assert!(!RecommendationTier::Deferred.is_urgent());
        assert!(!RecommendationTier::LongTerm.is_urgent());
    }
}
