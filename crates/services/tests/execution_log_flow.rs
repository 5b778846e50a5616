use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use services::{
    AlwaysConfirm, AppServices, DeleteOutcome, ExecutionLogError, ExecutionLogStore,
    SelectionController, StoreState, UserNotice,
};
use storage::feed::{FeedSender, SnapshotFeed};
use storage::repository::{
    Collection, ExecutionLogRepository, InMemoryRepository, LogSnapshot, NewLogEntryRecord,
    Storage, StorageError,
};
use study_core::CurriculumCatalog;
use study_core::model::{LogEntryId, PlanDraft, WeekNumber};
use tokio::sync::Notify;

/// How `FakeRepo::subscribe` builds its feed.
enum FeedMode {
    /// Delegate to the in-memory repository.
    Live,
    /// Delegate after a delay.
    Slow(Duration),
    /// Deliver the current list once, then hand the sender to the test.
    Scripted,
    /// End the feed before any snapshot.
    ClosesEarly,
}

/// Wraps the in-memory repository, counting writes and optionally holding
/// `add` until released or failing every write.
struct FakeRepo {
    inner: InMemoryRepository,
    adds: AtomicUsize,
    deletes: AtomicUsize,
    gate: Option<Arc<Notify>>,
    fail_writes: bool,
    feed: FeedMode,
    senders: Mutex<Vec<FeedSender>>,
}

impl FakeRepo {
    fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
            adds: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            gate: None,
            fail_writes: false,
            feed: FeedMode::Live,
            senders: Mutex::new(Vec::new()),
        }
    }

    fn with_feed(feed: FeedMode) -> Self {
        Self {
            feed,
            ..Self::new()
        }
    }

    fn take_sender(&self) -> FeedSender {
        self.senders
            .lock()
            .unwrap()
            .pop()
            .expect("a scripted feed is open")
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl ExecutionLogRepository for FakeRepo {
    async fn add(
        &self,
        collection: &Collection,
        record: NewLogEntryRecord,
    ) -> Result<LogEntryId, StorageError> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_writes {
            return Err(StorageError::Connection("store offline".into()));
        }
        self.inner.add(collection, record).await
    }

    async fn delete(&self, collection: &Collection, id: &LogEntryId) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StorageError::Connection("store offline".into()));
        }
        self.inner.delete(collection, id).await
    }

    async fn list(&self, collection: &Collection) -> Result<LogSnapshot, StorageError> {
        self.inner.list(collection).await
    }

    async fn subscribe(&self, collection: &Collection) -> Result<SnapshotFeed, StorageError> {
        match self.feed {
            FeedMode::Live => self.inner.subscribe(collection).await,
            FeedMode::Slow(delay) => {
                tokio::time::sleep(delay).await;
                self.inner.subscribe(collection).await
            }
            FeedMode::Scripted => {
                let (mut tx, feed) = SnapshotFeed::channel();
                let initial = self.inner.list(collection).await?;
                assert!(tx.send(Ok(initial)).await);
                self.senders.lock().unwrap().push(tx);
                Ok(feed)
            }
            FeedMode::ClosesEarly => {
                let (tx, feed) = SnapshotFeed::channel();
                drop(tx);
                Ok(feed)
            }
        }
    }
}

#[derive(Default)]
struct CountingNotice {
    count: AtomicUsize,
}

impl UserNotice for CountingNotice {
    fn notify(&self, _message: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

fn selection() -> Arc<SelectionController> {
    Arc::new(SelectionController::new(CurriculumCatalog::builtin()))
}

fn store_over(repo: &Arc<FakeRepo>) -> ExecutionLogStore {
    ExecutionLogStore::new(
        Arc::clone(repo) as Arc<dyn ExecutionLogRepository>,
        selection(),
        Arc::new(AlwaysConfirm),
    )
}

async fn wait_for_state(store: &ExecutionLogStore, state: StoreState) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while store.state() != state {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("store should reach {state:?}"));
}

fn plan(title: &str) -> NewLogEntryRecord {
    NewLogEntryRecord::from_plan(PlanDraft::new(title, "").validate(WeekNumber::FIRST).unwrap())
}

#[tokio::test]
async fn concurrent_create_is_rejected_while_submitting() {
    let gate = Arc::new(Notify::new());
    let repo = Arc::new(FakeRepo::gated(Arc::clone(&gate)));
    let store = Arc::new(ExecutionLogStore::new(
        Arc::clone(&repo) as Arc<dyn ExecutionLogRepository>,
        selection(),
        Arc::new(AlwaysConfirm),
    ));
    let _sub = store.subscribe().await.unwrap();

    let first = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.create("First", "").await }
    });

    wait_for_state(&store, StoreState::Submitting).await;

    let second = store.create("Second", "").await;
    assert!(matches!(second, Err(ExecutionLogError::Busy)));
    assert!(!store.can_submit());

    gate.notify_one();
    let id = first.await.unwrap().unwrap();

    assert_eq!(repo.adds.load(Ordering::SeqCst), 1);
    assert_eq!(store.state(), StoreState::Idle);
    let mut rx = store.watch();
    let snapshot = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.len() == 1))
        .await
        .expect("push after create")
        .unwrap()
        .clone();
    assert_eq!(snapshot.entries()[0].id, id);
}

#[tokio::test]
async fn abandoned_create_returns_store_to_idle() {
    let gate = Arc::new(Notify::new());
    let repo = Arc::new(FakeRepo::gated(gate));
    let store = ExecutionLogStore::new(
        Arc::clone(&repo) as Arc<dyn ExecutionLogRepository>,
        selection(),
        Arc::new(AlwaysConfirm),
    );
    let _sub = store.subscribe().await.unwrap();

    let pending = tokio::time::timeout(Duration::from_millis(50), store.create("Stuck", "")).await;
    assert!(pending.is_err());
    assert_eq!(store.state(), StoreState::Idle);
}

#[tokio::test]
async fn failed_create_keeps_buffer_and_notifies() {
    let repo = Arc::new(FakeRepo::failing());
    let notice = Arc::new(CountingNotice::default());
    let store = ExecutionLogStore::new(
        Arc::clone(&repo) as Arc<dyn ExecutionLogRepository>,
        selection(),
        Arc::new(AlwaysConfirm),
    )
    .with_notice(Arc::clone(&notice) as Arc<dyn UserNotice>);
    let _sub = store.subscribe().await.unwrap();

    store.update_draft(PlanDraft::new("Keep this", "and this"));
    let err = store.submit_draft().await.unwrap_err();
    assert!(matches!(err, ExecutionLogError::StoreWrite(_)));
    assert_eq!(store.draft(), PlanDraft::new("Keep this", "and this"));
    assert_eq!(notice.count.load(Ordering::SeqCst), 1);
    assert_eq!(store.state(), StoreState::Idle);
    assert!(store.entries().is_empty());
}

#[tokio::test]
async fn failed_delete_leaves_entry_visible() {
    let repo = Arc::new(FakeRepo::failing());
    let plans = Collection::execution_plans();
    let id = repo.inner.add(&plans, plan("Stays")).await.unwrap();

    let notice = Arc::new(CountingNotice::default());
    let store = ExecutionLogStore::new(
        Arc::clone(&repo) as Arc<dyn ExecutionLogRepository>,
        selection(),
        Arc::new(AlwaysConfirm),
    )
    .with_notice(Arc::clone(&notice) as Arc<dyn UserNotice>);
    let _sub = store.subscribe().await.unwrap();

    let err = store.delete(&id).await.unwrap_err();
    assert!(matches!(err, ExecutionLogError::StoreWrite(_)));
    assert_eq!(repo.deletes.load(Ordering::SeqCst), 1);
    assert_eq!(store.entries().len(), 1);
    assert_eq!(notice.count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let repo = Arc::new(FakeRepo::new());
    let store = ExecutionLogStore::new(
        Arc::clone(&repo) as Arc<dyn ExecutionLogRepository>,
        selection(),
        Arc::new(services::NeverConfirm),
    );
    let _sub = store.subscribe().await.unwrap();

    let outcome = store.delete(&LogEntryId::new("any")).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(repo.deletes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn app_services_wire_selection_into_new_entries() {
    let storage = Storage::sqlite("sqlite:file:memdb_app_services?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let services = AppServices::from_storage(
        &storage,
        WeekNumber::new(4).unwrap(),
        Arc::new(AlwaysConfirm),
        Arc::new(CountingNotice::default()),
    )
    .unwrap();

    let log = services.execution_log();
    let _sub = log.subscribe().await.unwrap();
    let id = log.create("Week four plan", "details").await.unwrap();

    let mut rx = log.watch();
    let snapshot = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.len() == 1))
        .await
        .expect("push after create")
        .unwrap()
        .clone();
    let entry = snapshot.get(&id).unwrap();
    assert_eq!(entry.week.value(), 4);
    assert_eq!(entry.detail.as_deref(), Some("details"));

    let view = services.dashboard().view().unwrap();
    assert_eq!(view.selected.week().value(), 4);
}

#[tokio::test]
async fn abandoned_subscribe_leaves_store_unsubscribed() {
    let repo = Arc::new(FakeRepo::with_feed(FeedMode::Slow(Duration::from_millis(200))));
    let store = store_over(&repo);

    let abandoned = tokio::time::timeout(Duration::from_millis(20), store.subscribe()).await;
    assert!(abandoned.is_err());
    assert_eq!(store.state(), StoreState::Unsubscribed);
    assert!(matches!(
        store.create("Too early", "").await,
        Err(ExecutionLogError::NotSubscribed)
    ));
    assert_eq!(repo.adds.load(Ordering::SeqCst), 0);

    let sub = store.subscribe().await.unwrap();
    assert!(sub.is_active());
    assert_eq!(store.state(), StoreState::Idle);
}

#[tokio::test]
async fn pending_subscribe_rejects_writes_until_first_snapshot() {
    let repo = Arc::new(FakeRepo::with_feed(FeedMode::Slow(Duration::from_millis(200))));
    let store = Arc::new(store_over(&repo));

    let pending = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.subscribe().await }
    });
    wait_for_state(&store, StoreState::Subscribing).await;

    assert!(!store.can_submit());
    assert!(matches!(
        store.create("Too early", "").await,
        Err(ExecutionLogError::NotSubscribed)
    ));
    assert!(matches!(
        store.subscribe().await,
        Err(ExecutionLogError::AlreadySubscribed)
    ));

    let _sub = pending.await.unwrap().unwrap();
    assert_eq!(store.state(), StoreState::Idle);
    assert_eq!(repo.adds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn feed_error_unsubscribes_and_allows_resubscribe() {
    let repo = Arc::new(FakeRepo::with_feed(FeedMode::Scripted));
    let plans = Collection::execution_plans();
    repo.inner.add(&plans, plan("Survives")).await.unwrap();
    let store = store_over(&repo);

    let sub = store.subscribe().await.unwrap();
    assert_eq!(store.entries().len(), 1);

    let mut feed = repo.take_sender();
    assert!(feed.send(Err(StorageError::Connection("link dropped".into()))).await);
    wait_for_state(&store, StoreState::Unsubscribed).await;

    assert!(!sub.is_active());
    assert_eq!(store.entries().entries()[0].title, "Survives");
    assert!(matches!(
        store.create("While down", "").await,
        Err(ExecutionLogError::NotSubscribed)
    ));

    let again = store.subscribe().await.unwrap();
    assert_eq!(store.state(), StoreState::Idle);
    drop(sub);
    assert!(again.is_active());
    assert_eq!(store.state(), StoreState::Idle);
}

#[tokio::test]
async fn feed_closing_before_first_snapshot_fails_subscribe() {
    let repo = Arc::new(FakeRepo::with_feed(FeedMode::ClosesEarly));
    let store = store_over(&repo);

    let err = store.subscribe().await.unwrap_err();
    assert!(matches!(
        err,
        ExecutionLogError::Subscription(StorageError::SubscriptionClosed)
    ));
    assert_eq!(store.state(), StoreState::Unsubscribed);
    assert!(store.entries().is_empty());
}

#[tokio::test]
async fn write_failing_after_cancel_raises_no_notice() {
    let gate = Arc::new(Notify::new());
    let repo = Arc::new(FakeRepo {
        fail_writes: true,
        ..FakeRepo::gated(Arc::clone(&gate))
    });
    let notice = Arc::new(CountingNotice::default());
    let store = Arc::new(
        store_over(&repo).with_notice(Arc::clone(&notice) as Arc<dyn UserNotice>),
    );
    let sub = store.subscribe().await.unwrap();

    let pending = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.create("Orphaned", "").await }
    });
    wait_for_state(&store, StoreState::Submitting).await;

    sub.cancel();
    assert_eq!(store.state(), StoreState::Unsubscribed);
    gate.notify_one();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, ExecutionLogError::StoreWrite(_)));
    assert_eq!(notice.count.load(Ordering::SeqCst), 0);
    assert_eq!(store.state(), StoreState::Unsubscribed);
}
