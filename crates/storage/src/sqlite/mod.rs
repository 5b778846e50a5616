use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use study_core::ServerClock;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::repository::{Collection, ExecutionLogRepository, Storage};

mod execution_log_repo;
mod mapping;
mod migrate;

const CHANGE_BUFFER: usize = 64;

/// `SQLite` backend for the execution log.
///
/// Change notification is in-process: subscribers see writes made through
/// any clone of this repository, not writes from other processes.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
    changes: broadcast::Sender<Collection>,
    clock: Arc<ServerClock>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// the connection pragmas fail during setup.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        Self::connect_with_clock(database_url, ServerClock::default()).await
    }

    /// Connect with an explicit timestamp source.
    ///
    /// # Errors
    ///
    /// Same as [`SqliteRepository::connect`].
    pub async fn connect_with_clock(
        database_url: &str,
        clock: ServerClock,
    ) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        tracing::debug!(url = database_url, "sqlite pool ready");
        Ok(Self {
            pool,
            changes,
            clock: Arc::new(clock),
        })
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }

    fn notify(&self, collection: &Collection) {
        let _ = self.changes.send(collection.clone());
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let execution_logs: Arc<dyn ExecutionLogRepository> = Arc::new(repo);
        Ok(Self { execution_logs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }
}
