use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use study_core::model::{CurriculumWeek, VideoRef, WeekBundle, WeekNumber};
use study_core::{
    Progress, RankedIdea, WeekStatus, derive_progress, derive_week_status, rank_with_positions,
};

use crate::error::SelectionError;
use crate::selection::SelectionController;

/// One row of the week timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineItem {
    pub week: WeekNumber,
    pub title: String,
    pub subtitle: String,
    pub status: WeekStatus,
    pub selected: bool,
}

/// What the selected week has to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeekContent {
    Analyzed {
        bundle: WeekBundle,
        ranked_ideas: Vec<RankedIdea>,
    },
    /// Placeholder for a week whose analysis is not published yet.
    NotYetAnalyzed,
}

/// Render data for the dashboard at the selected week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub progress: Progress,
    pub timeline: Vec<TimelineItem>,
    pub selected: CurriculumWeek,
    pub content: WeekContent,
    pub video: Option<VideoRef>,
}

/// Derives everything the dashboard renders from the catalog and selection.
#[derive(Debug, Clone)]
pub struct DashboardService {
    selection: Arc<SelectionController>,
}

impl DashboardService {
    #[must_use]
    pub fn new(selection: Arc<SelectionController>) -> Self {
        Self { selection }
    }

    /// Progress counts bundles whose status is `Completed`.
    #[must_use]
    pub fn progress(&self) -> Progress {
        let catalog = self.selection.catalog();
        derive_progress(catalog.len(), catalog.completed_count())
    }

    /// Weeks the timeline treats as completed: those with a published bundle.
    #[must_use]
    pub fn completed_weeks(&self) -> BTreeSet<WeekNumber> {
        self.selection.catalog().analyzed_weeks().collect()
    }

    #[must_use]
    pub fn timeline(&self) -> Vec<TimelineItem> {
        let completed = self.completed_weeks();
        let selected = self.selection.current();
        self.selection
            .catalog()
            .weeks()
            .iter()
            .map(|week| TimelineItem {
                week: week.week(),
                title: week.title().to_owned(),
                subtitle: week.subtitle().to_owned(),
                status: derive_week_status(week.week(), &completed),
                selected: week.week() == selected,
            })
            .collect()
    }

    #[must_use]
    pub fn ranked_ideas(&self, week: WeekNumber) -> Vec<RankedIdea> {
        self.selection
            .catalog()
            .bundle(week)
            .map(|bundle| rank_with_positions(&bundle.ideas))
            .unwrap_or_default()
    }

    /// Assemble the full view for the selected week.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownWeek` if the selected week is missing
    /// from the catalog.
    pub fn view(&self) -> Result<DashboardView, SelectionError> {
        let week = self.selection.current();
        let catalog = self.selection.catalog();
        let selected = catalog
            .week(week)
            .cloned()
            .ok_or(SelectionError::UnknownWeek(week))?;

        let content = match catalog.bundle(week) {
            Some(bundle) => WeekContent::Analyzed {
                bundle: bundle.clone(),
                ranked_ideas: rank_with_positions(&bundle.ideas),
            },
            None => WeekContent::NotYetAnalyzed,
        };

        Ok(DashboardView {
            progress: self.progress(),
            timeline: self.timeline(),
            selected,
            content,
            video: catalog.video(week).cloned(),
        })
    }
}
