use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::WeekNumber;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WeekError {
    #[error("week must be between 1 and 23, got {0}")]
    OutOfRange(u32),

    #[error("week is not a number: {0:?}")]
    Unparseable(String),

    #[error("week title cannot be empty")]
    EmptyTitle,
}

//
// ─── CURRICULUM WEEK ───────────────────────────────────────────────────────────
//

/// One chapter of the curriculum, shown as a single timeline slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumWeek {
    week: WeekNumber,
    title: String,
    subtitle: String,
}

impl CurriculumWeek {
    /// # Errors
    ///
    /// Returns `WeekError::EmptyTitle` if the title is blank.
    pub fn new(
        week: WeekNumber,
        title: impl Into<String>,
        subtitle: impl Into<String>,
    ) -> Result<Self, WeekError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(WeekError::EmptyTitle);
        }
        Ok(Self {
            week,
            title,
            subtitle: subtitle.into(),
        })
    }

    #[must_use]
    pub fn week(&self) -> WeekNumber {
        self.week
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }
}

/// Publication state of an analyzed week.
///
/// Only `Completed` weeks count towards overall progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleStatus {
    Active,
    Completed,
}
