//! Progress and timeline status derivation.
//!
//! Unlocking is strictly linear: the only `Current` week is the one right
//! after the highest completed week, or week 1 when nothing is completed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::WeekNumber;

/// Overall curriculum progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// `round(100 * completed / total)`, in `0..=100`.
    pub percentage: u8,
}

impl Progress {
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total - self.completed
    }
}

/// Compute progress for `completed` out of `total` weeks.
///
/// Halves round up. `completed` is capped at `total`, and an empty
/// curriculum reports 0%.
#[must_use]
pub fn derive_progress(total: usize, completed: usize) -> Progress {
    let completed = completed.min(total);
    let percentage = if total == 0 {
        0
    } else {
        // (200c + t) / 2t == floor(100c/t + 1/2)
        let scaled = (200 * completed + total) / (2 * total);
        u8::try_from(scaled).unwrap_or(100)
    };
    Progress {
        completed,
        total,
        percentage,
    }
}

/// Display status of a week on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStatus {
    Completed,
    Current,
    Locked,
}

/// The single week that is unlocked but not completed, if any.
#[must_use]
pub fn current_week(completed: &BTreeSet<WeekNumber>) -> Option<WeekNumber> {
    match completed.last() {
        None => Some(WeekNumber::FIRST),
        Some(highest) => highest.next(),
    }
}

/// Status of `week` given the set of completed weeks.
#[must_use]
pub fn derive_week_status(week: WeekNumber, completed: &BTreeSet<WeekNumber>) -> WeekStatus {
    if completed.contains(&week) {
        WeekStatus::Completed
    } else if current_week(completed) == Some(week) {
        WeekStatus::Current
    } else {
        WeekStatus::Locked
    }
}
