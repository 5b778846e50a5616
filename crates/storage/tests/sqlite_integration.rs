use std::time::Duration;

use storage::repository::{
    Collection, ExecutionLogRepository, NewLogEntryRecord, Storage, TimestampField,
};
use storage::sqlite::SqliteRepository;
use study_core::ServerClock;
use study_core::model::{LogEntryId, WeekNumber};
use study_core::time::{fixed_clock, fixed_now};

fn record(title: &str, detail: Option<&str>, week: u8) -> NewLogEntryRecord {
    NewLogEntryRecord {
        title: title.to_owned(),
        detail: detail.map(str::to_owned),
        week: WeekNumber::new(week).unwrap(),
        created_at: TimestampField::ServerTimestamp,
    }
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect_with_clock(&url, ServerClock::new(fixed_clock()))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_orders_newest_first() {
    let repo = connect("memdb_log_roundtrip").await;
    let plans = Collection::execution_plans();

    let first = repo
        .add(&plans, record("Draft outline", Some("two pages"), 1))
        .await
        .unwrap();
    let second = repo.add(&plans, record("Ship it", None, 2)).await.unwrap();

    let snapshot = repo.list(&plans).await.unwrap();
    assert_eq!(snapshot.len(), 2);
    let entries = snapshot.entries();
    assert_eq!(entries[0].id, second);
    assert_eq!(entries[0].detail, None);
    assert_eq!(entries[0].week.value(), 2);
    assert_eq!(entries[1].id, first);
    assert_eq!(entries[1].detail.as_deref(), Some("two pages"));
    assert_eq!(entries[1].created_at, Some(fixed_now()));
    assert!(entries[0].created_at > entries[1].created_at);
}

#[tokio::test]
async fn sqlite_delete_is_idempotent() {
    let repo = connect("memdb_log_delete").await;
    let plans = Collection::execution_plans();
    let id = repo.add(&plans, record("Remove me", None, 1)).await.unwrap();

    repo.delete(&plans, &id).await.unwrap();
    repo.delete(&plans, &id).await.unwrap();
    repo.delete(&plans, &LogEntryId::new("never-existed"))
        .await
        .unwrap();

    assert!(repo.list(&plans).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_migrations_can_run_twice() {
    let repo = connect("memdb_log_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn sqlite_explicit_timestamp_is_kept() {
    let repo = connect("memdb_log_explicit_ts").await;
    let plans = Collection::execution_plans();
    let at = fixed_now() - chrono::Duration::days(3);
    let mut old = record("Backfilled", None, 1);
    old.created_at = TimestampField::At(at);
    repo.add(&plans, old).await.unwrap();
    repo.add(&plans, record("Fresh", None, 1)).await.unwrap();

    let snapshot = repo.list(&plans).await.unwrap();
    assert_eq!(snapshot.entries()[0].title, "Fresh");
    assert_eq!(snapshot.entries()[1].created_at, Some(at));
}

#[tokio::test]
async fn sqlite_feed_reflects_writes() {
    let storage = Storage::sqlite("sqlite:file:memdb_log_feed?mode=memory&cache=shared")
        .await
        .expect("storage");
    let plans = Collection::execution_plans();

    let mut feed = storage.execution_logs.subscribe(&plans).await.unwrap();
    let initial = feed.next().await.unwrap().unwrap();
    assert!(initial.is_empty());

    let id = storage
        .execution_logs
        .add(&plans, record("Live", None, 1))
        .await
        .unwrap();
    let updated = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .expect("snapshot after add")
        .unwrap()
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated.entries()[0].id, id);

    feed.handle().cancel();
}
