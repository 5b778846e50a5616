#![forbid(unsafe_code)]

pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod execution_log;
pub mod selection;

pub use app_services::AppServices;
pub use dashboard::{DashboardService, DashboardView, TimelineItem, WeekContent};
pub use error::{AppServicesError, ExecutionLogError, SelectionError};
pub use execution_log::{
    AlwaysConfirm, ConfirmPrompt, DeleteOutcome, ExecutionLogStore, LogSubscription,
    NeverConfirm, StoreState, TracingNotice, UserNotice,
};
pub use selection::SelectionController;
