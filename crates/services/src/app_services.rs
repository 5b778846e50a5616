use std::sync::Arc;

use storage::repository::Storage;
use study_core::CurriculumCatalog;
use study_core::model::WeekNumber;

use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::execution_log::{ConfirmPrompt, ExecutionLogStore, UserNotice};
use crate::selection::SelectionController;

/// Assembles app-facing services around one storage backend.
#[derive(Clone)]
pub struct AppServices {
    selection: Arc<SelectionController>,
    dashboard: Arc<DashboardService>,
    execution_log: Arc<ExecutionLogStore>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage with `week` selected.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the
    /// week is not in the curriculum.
    pub async fn new_sqlite(
        db_url: &str,
        week: WeekNumber,
        confirm: Arc<dyn ConfirmPrompt>,
        notice: Arc<dyn UserNotice>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, week, confirm, notice)
    }

    /// Build services over an existing storage bundle.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Selection` if the week is not in the curriculum.
    pub fn from_storage(
        storage: &Storage,
        week: WeekNumber,
        confirm: Arc<dyn ConfirmPrompt>,
        notice: Arc<dyn UserNotice>,
    ) -> Result<Self, AppServicesError> {
        let catalog = CurriculumCatalog::builtin();
        let selection = Arc::new(SelectionController::with_week(catalog, week)?);
        let dashboard = Arc::new(DashboardService::new(Arc::clone(&selection)));
        let execution_log = Arc::new(
            ExecutionLogStore::new(
                Arc::clone(&storage.execution_logs),
                Arc::clone(&selection),
                confirm,
            )
            .with_notice(notice),
        );

        Ok(Self {
            selection,
            dashboard,
            execution_log,
        })
    }

    #[must_use]
    pub fn selection(&self) -> Arc<SelectionController> {
        Arc::clone(&self.selection)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn execution_log(&self) -> Arc<ExecutionLogStore> {
        Arc::clone(&self.execution_log)
    }
}
