//! Idea ranking by leverage score.

use std::cmp::Reverse;

use serde::Serialize;

use crate::model::Idea;

/// Sort ideas by `score.total`, highest first.
///
/// The sort is stable, so ideas with equal totals keep their presentation
/// order. The input is left untouched.
#[must_use]
pub fn rank_ideas(ideas: &[Idea]) -> Vec<Idea> {
    let mut ranked = ideas.to_vec();
    ranked.sort_by_key(|idea| Reverse(idea.score.total));
    ranked
}

/// An idea together with its 1-based position in the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedIdea {
    pub rank: usize,
    pub idea: Idea,
}

impl RankedIdea {
    /// The top two ideas get highlighted treatment.
    #[must_use]
    pub fn is_highlighted(&self) -> bool {
        self.rank <= 2
    }
}

#[must_use]
pub fn rank_with_positions(ideas: &[Idea]) -> Vec<RankedIdea> {
    rank_ideas(ideas)
        .into_iter()
        .enumerate()
        .map(|(index, idea)| RankedIdea {
            rank: index + 1,
            idea,
        })
        .collect()
}
