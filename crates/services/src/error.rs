//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::{LogEntryError, WeekNumber};

/// Errors emitted by `ExecutionLogStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutionLogError {
    #[error(transparent)]
    Validation(#[from] LogEntryError),
    #[error("a plan is already being submitted")]
    Busy,
    #[error("execution log is not subscribed")]
    NotSubscribed,
    #[error("execution log is already subscribed")]
    AlreadySubscribed,
    #[error("failed to write execution log: {0}")]
    StoreWrite(#[source] StorageError),
    #[error("execution log subscription failed: {0}")]
    Subscription(#[source] StorageError),
}

/// Errors emitted by `SelectionController`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("week {0} is not part of the curriculum")]
    UnknownWeek(WeekNumber),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}
