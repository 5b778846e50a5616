use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use study_core::ServerClock;
use study_core::model::{ExecutionLogEntry, LogEntryId, ValidatedPlan, WeekNumber};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::feed::{SnapshotFeed, spawn_feed};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("subscription closed by the store")]
    SubscriptionClosed,
}

/// Logical namespace of a remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Collection(String);

impl Collection {
    /// The collection holding the user's execution plans.
    pub const EXECUTION_PLANS: &'static str = "execution_plans";

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn execution_plans() -> Self {
        Self::new(Self::EXECUTION_PLANS)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value for a timestamp field on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    /// Let the store assign its own monotonic timestamp.
    ServerTimestamp,
    At(DateTime<Utc>),
}

/// Document sent to the store to create an entry. Carries no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntryRecord {
    pub title: String,
    pub detail: Option<String>,
    pub week: WeekNumber,
    pub created_at: TimestampField,
}

impl NewLogEntryRecord {
    /// Record for a validated plan, timestamped by the server.
    #[must_use]
    pub fn from_plan(plan: ValidatedPlan) -> Self {
        Self {
            title: plan.title,
            detail: plan.detail,
            week: plan.week,
            created_at: TimestampField::ServerTimestamp,
        }
    }

    pub(crate) fn resolve_created_at(&self, clock: &ServerClock) -> DateTime<Utc> {
        match self.created_at {
            TimestampField::ServerTimestamp => clock.next_timestamp(),
            TimestampField::At(at) => at,
        }
    }
}

/// Full, server-ordered state of a collection at one point in time.
///
/// Entries are ordered by `created_at` descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSnapshot {
    entries: Vec<ExecutionLogEntry>,
}

impl LogSnapshot {
    #[must_use]
    pub fn new(entries: Vec<ExecutionLogEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[ExecutionLogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &LogEntryId) -> Option<&ExecutionLogEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Entries paired with their display number, newest first, where the
    /// oldest entry is number 1.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &ExecutionLogEntry)> {
        let len = self.entries.len();
        self.entries
            .iter()
            .enumerate()
            .map(move |(index, entry)| (len - index, entry))
    }
}

/// Repository contract for the remotely persisted execution log.
///
/// Implementations own identity and timestamps, return collections ordered
/// by `created_at` descending, and notify subscribers after every write.
#[async_trait]
pub trait ExecutionLogRepository: Send + Sync {
    /// Create an entry and return its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write is rejected or the store is unreachable.
    async fn add(
        &self,
        collection: &Collection,
        record: NewLogEntryRecord,
    ) -> Result<LogEntryId, StorageError>;

    /// Delete an entry. Deleting an id that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete cannot be applied.
    async fn delete(&self, collection: &Collection, id: &LogEntryId) -> Result<(), StorageError>;

    /// One-shot ordered read of the collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn list(&self, collection: &Collection) -> Result<LogSnapshot, StorageError>;

    /// Open a live feed: the current snapshot, then a fresh one after each change.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the subscription cannot be established.
    async fn subscribe(&self, collection: &Collection) -> Result<SnapshotFeed, StorageError>;
}

const CHANGE_BUFFER: usize = 64;

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<Collection, Vec<StoredEntry>>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    seq: u64,
    entry: ExecutionLogEntry,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
    changes: broadcast::Sender<Collection>,
    clock: Arc<ServerClock>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(ServerClock::default())
    }

    #[must_use]
    pub fn with_clock(clock: ServerClock) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            changes,
            clock: Arc::new(clock),
        }
    }

    fn snapshot_of(&self, collection: &Collection) -> Result<LogSnapshot, StorageError> {
        let guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut stored = guard
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default();
        stored.sort_by(|a, b| {
            b.entry
                .created_at
                .cmp(&a.entry.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(LogSnapshot::new(
            stored.into_iter().map(|s| s.entry).collect(),
        ))
    }

    fn notify(&self, collection: &Collection) {
        // No receivers just means nobody is subscribed.
        let _ = self.changes.send(collection.clone());
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionLogRepository for InMemoryRepository {
    async fn add(
        &self,
        collection: &Collection,
        record: NewLogEntryRecord,
    ) -> Result<LogEntryId, StorageError> {
        let id = LogEntryId::generate();
        let created_at = record.resolve_created_at(&self.clock);
        {
            let mut guard = self
                .state
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            let seq = guard.next_seq;
            guard.next_seq += 1;
            guard
                .collections
                .entry(collection.clone())
                .or_default()
                .push(StoredEntry {
                    seq,
                    entry: ExecutionLogEntry {
                        id: id.clone(),
                        title: record.title,
                        detail: record.detail,
                        week: record.week,
                        created_at: Some(created_at),
                    },
                });
        }
        self.notify(collection);
        Ok(id)
    }

    async fn delete(&self, collection: &Collection, id: &LogEntryId) -> Result<(), StorageError> {
        {
            let mut guard = self
                .state
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            if let Some(entries) = guard.collections.get_mut(collection) {
                entries.retain(|s| &s.entry.id != id);
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn list(&self, collection: &Collection) -> Result<LogSnapshot, StorageError> {
        self.snapshot_of(collection)
    }

    async fn subscribe(&self, collection: &Collection) -> Result<SnapshotFeed, StorageError> {
        let changes = self.changes.subscribe();
        let repo = self.clone();
        let target = collection.clone();
        Ok(spawn_feed(collection.clone(), changes, move || {
            let snapshot = repo.snapshot_of(&target);
            async move { snapshot }
        }))
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub execution_logs: Arc<dyn ExecutionLogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let execution_logs: Arc<dyn ExecutionLogRepository> = Arc::new(InMemoryRepository::new());
        Self { execution_logs }
    }
}
