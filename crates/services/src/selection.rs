use std::sync::Arc;

use study_core::CurriculumCatalog;
use study_core::model::{CurriculumWeek, WeekNumber};
use tokio::sync::watch;

use crate::error::SelectionError;

/// Holds the currently selected week and broadcasts changes to observers.
#[derive(Debug)]
pub struct SelectionController {
    catalog: Arc<CurriculumCatalog>,
    selected: watch::Sender<WeekNumber>,
}

impl SelectionController {
    /// Start with week 1 selected.
    #[must_use]
    pub fn new(catalog: Arc<CurriculumCatalog>) -> Self {
        let (selected, _) = watch::channel(WeekNumber::FIRST);
        Self { catalog, selected }
    }

    /// Start with `week` selected.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownWeek` if the catalog has no such week.
    pub fn with_week(
        catalog: Arc<CurriculumCatalog>,
        week: WeekNumber,
    ) -> Result<Self, SelectionError> {
        let controller = Self::new(catalog);
        controller.select(week)?;
        Ok(controller)
    }

    /// Select `week`. Observers are only woken when the value changes.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownWeek` if the catalog has no such week.
    pub fn select(&self, week: WeekNumber) -> Result<(), SelectionError> {
        if self.catalog.week(week).is_none() {
            return Err(SelectionError::UnknownWeek(week));
        }
        let changed = self.selected.send_if_modified(|current| {
            if *current == week {
                false
            } else {
                *current = week;
                true
            }
        });
        if changed {
            tracing::debug!(week = week.value(), "week selected");
        }
        Ok(())
    }

    #[must_use]
    pub fn current(&self) -> WeekNumber {
        *self.selected.borrow()
    }

    #[must_use]
    pub fn current_week(&self) -> Option<&CurriculumWeek> {
        self.catalog.week(self.current())
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WeekNumber> {
        self.selected.subscribe()
    }

    #[must_use]
    pub fn catalog(&self) -> &CurriculumCatalog {
        &self.catalog
    }
}
