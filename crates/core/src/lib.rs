#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod model;
pub mod progress;
pub mod ranking;
pub mod time;

pub use catalog::{CatalogError, CurriculumCatalog};
pub use error::Error;
pub use progress::{Progress, WeekStatus, derive_progress, derive_week_status};
pub use ranking::{RankedIdea, rank_ideas, rank_with_positions};
pub use time::{Clock, ServerClock};
