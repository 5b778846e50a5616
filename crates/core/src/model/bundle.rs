use serde::{Deserialize, Serialize};

use crate::model::analysis::{TrendReport, WeeklyAnalysis};
use crate::model::idea::Idea;
use crate::model::ids::WeekNumber;
use crate::model::week::BundleStatus;

/// Everything published for one analyzed week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBundle {
    pub week: WeekNumber,
    pub chapter: String,
    pub status: BundleStatus,
    pub analysis: WeeklyAnalysis,
    pub trends: TrendReport,
    /// Ideas in presentation order, not ranked.
    pub ideas: Vec<Idea>,
}

impl WeekBundle {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == BundleStatus::Completed
    }
}
