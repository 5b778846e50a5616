#![forbid(unsafe_code)]

pub mod feed;
pub mod repository;
pub mod sqlite;

pub use feed::{FeedSender, SnapshotEvent, SnapshotFeed, SubscriptionHandle};
pub use repository::{
    Collection, ExecutionLogRepository, InMemoryRepository, LogSnapshot, NewLogEntryRecord,
    Storage, StorageError, TimestampField,
};
