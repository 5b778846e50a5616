use thiserror::Error;

use crate::catalog::CatalogError;
use crate::model::{LogEntryError, WeekError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Week(#[from] WeekError),
    #[error(transparent)]
    LogEntry(#[from] LogEntryError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
