mod analysis;
mod bundle;
mod execution_log;
mod idea;
mod ids;
mod video;
mod week;

pub use analysis::{BrandApplication, FrameworkStep, Principle, Trend, TrendReport, WeeklyAnalysis};
pub use bundle::WeekBundle;
pub use execution_log::{ExecutionLogEntry, LogEntryError, PlanDraft, ValidatedPlan};
pub use idea::{Idea, IdeaScore, RecommendationTier, ScoreBand};
pub use ids::{IdeaId, LogEntryId, TOTAL_WEEKS, WeekNumber};
pub use video::VideoRef;
pub use week::{BundleStatus, CurriculumWeek, WeekError};
