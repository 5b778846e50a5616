use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LogEntryId, WeekNumber};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LogEntryError {
    #[error("execution plan title cannot be empty")]
    EmptyTitle,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated user input for a new execution plan entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanDraft {
    pub title: String,
    pub detail: String,
}

impl PlanDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.detail.is_empty()
    }

    /// Validate the draft for the given week.
    ///
    /// The title is trimmed; a blank detail becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns `LogEntryError::EmptyTitle` if the title is blank.
    pub fn validate(&self, week: WeekNumber) -> Result<ValidatedPlan, LogEntryError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(LogEntryError::EmptyTitle);
        }
        let detail = self.detail.trim();
        Ok(ValidatedPlan {
            title: title.to_owned(),
            detail: (!detail.is_empty()).then(|| detail.to_owned()),
            week,
        })
    }
}

/// A plan that passed validation and can be sent to the store.
///
/// Carries no id and no timestamp: both are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedPlan {
    pub title: String,
    pub detail: Option<String>,
    pub week: WeekNumber,
}

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

/// An execution plan entry as observed from the store.
///
/// `created_at` is `None` while the store has not yet resolved its server
/// timestamp for a pending write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: LogEntryId,
    pub title: String,
    pub detail: Option<String>,
    pub week: WeekNumber,
    pub created_at: Option<DateTime<Utc>>,
}
