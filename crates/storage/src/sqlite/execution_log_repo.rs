use study_core::model::LogEntryId;

use super::SqliteRepository;
use super::mapping::{datetime_to_micros, map_log_entry_row, week_to_i64};
use crate::feed::{SnapshotFeed, spawn_feed};
use crate::repository::{
    Collection, ExecutionLogRepository, LogSnapshot, NewLogEntryRecord, StorageError,
};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    async fn load_snapshot(&self, collection: &Collection) -> Result<LogSnapshot, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, detail, week, created_at_us
            FROM log_entries
            WHERE collection = ?1
            ORDER BY created_at_us DESC, seq DESC
            ",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(map_log_entry_row(&row)?);
        }
        Ok(LogSnapshot::new(entries))
    }
}

#[async_trait::async_trait]
impl ExecutionLogRepository for SqliteRepository {
    async fn add(
        &self,
        collection: &Collection,
        record: NewLogEntryRecord,
    ) -> Result<LogEntryId, StorageError> {
        let id = LogEntryId::generate();
        let created_at = record.resolve_created_at(&self.clock);

        sqlx::query(
            r"
            INSERT INTO log_entries (id, collection, title, detail, week, created_at_us)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id.as_str())
        .bind(collection.as_str())
        .bind(record.title)
        .bind(record.detail)
        .bind(week_to_i64(record.week))
        .bind(datetime_to_micros(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;

        tracing::debug!(collection = %collection, id = %id, "log entry inserted");
        self.notify(collection);
        Ok(id)
    }

    async fn delete(&self, collection: &Collection, id: &LogEntryId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM log_entries WHERE collection = ?1 AND id = ?2")
            .bind(collection.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        tracing::debug!(
            collection = %collection,
            id = %id,
            removed = res.rows_affected(),
            "log entry delete applied"
        );
        self.notify(collection);
        Ok(())
    }

    async fn list(&self, collection: &Collection) -> Result<LogSnapshot, StorageError> {
        self.load_snapshot(collection).await
    }

    async fn subscribe(&self, collection: &Collection) -> Result<SnapshotFeed, StorageError> {
        let changes = self.changes.subscribe();
        let repo = self.clone();
        let target = collection.clone();
        Ok(spawn_feed(collection.clone(), changes, move || {
            let repo = repo.clone();
            let target = target.clone();
            async move { repo.load_snapshot(&target).await }
        }))
    }
}
