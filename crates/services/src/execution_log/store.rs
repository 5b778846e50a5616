use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storage::feed::SubscriptionHandle;
use storage::repository::{
    Collection, ExecutionLogRepository, LogSnapshot, NewLogEntryRecord, StorageError,
};
use study_core::model::{LogEntryId, PlanDraft};
use tokio::sync::{mpsc, watch};

use super::ports::{ConfirmPrompt, TracingNotice, UserNotice};
use crate::error::ExecutionLogError;
use crate::selection::SelectionController;

/// Message passed to the confirmation port before a delete.
pub const DELETE_CONFIRMATION: &str = "Delete this plan?";

const SAVE_FAILED_NOTICE: &str =
    "Saving the plan failed. Check that the execution log database is reachable.";
const DELETE_FAILED_NOTICE: &str =
    "Deleting the plan failed. Check that the execution log database is reachable.";

/// Lifecycle of the store: `Unsubscribed -> Subscribing -> Subscribed(Idle <-> Submitting)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Unsubscribed,
    /// Waiting for the initial snapshot. Writes are rejected.
    Subscribing,
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The confirmation was declined; nothing was sent.
    Declined,
}

/// Where the store is with its feed, tagged by subscription generation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Link {
    #[default]
    Unsubscribed,
    Subscribing(u64),
    Live(u64),
}

#[derive(Debug, Default)]
struct Inner {
    link: Link,
    next_generation: u64,
    submitting: bool,
    draft: PlanDraft,
}

struct Shared {
    inner: Mutex<Inner>,
    snapshot: watch::Sender<LogSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_live(&self, generation: u64) -> bool {
        self.lock().link == Link::Live(generation)
    }

    /// Apply the initial snapshot and promote a pending subscribe to live.
    fn go_live(&self, generation: u64, snapshot: LogSnapshot) -> bool {
        let mut inner = self.lock();
        if inner.link != Link::Subscribing(generation) {
            return false;
        }
        inner.link = Link::Live(generation);
        let entries = snapshot.len();
        self.snapshot.send_replace(snapshot);
        drop(inner);
        tracing::debug!(entries, "execution log initial snapshot applied");
        true
    }

    /// Replace the mirror wholesale. Ignored once `generation` is no longer live.
    fn apply(&self, generation: u64, snapshot: LogSnapshot) -> bool {
        let inner = self.lock();
        if inner.link != Link::Live(generation) {
            return false;
        }
        let entries = snapshot.len();
        self.snapshot.send_replace(snapshot);
        drop(inner);
        tracing::debug!(entries, "execution log snapshot applied");
        true
    }

    fn end(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.link == Link::Live(generation) {
            inner.link = Link::Unsubscribed;
            true
        } else {
            false
        }
    }

    fn abandon(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.link == Link::Subscribing(generation) {
            inner.link = Link::Unsubscribed;
            drop(inner);
            tracing::debug!("execution log subscribe abandoned");
        }
    }
}

/// Eventually consistent mirror of the remote execution log.
///
/// The local snapshot is only ever replaced by a push from the store; writes
/// never touch it directly. At most one create is in flight at a time.
pub struct ExecutionLogStore {
    repo: Arc<dyn ExecutionLogRepository>,
    collection: Collection,
    selection: Arc<SelectionController>,
    confirm: Arc<dyn ConfirmPrompt>,
    notice: Arc<dyn UserNotice>,
    shared: Arc<Shared>,
}

impl ExecutionLogStore {
    #[must_use]
    pub fn new(
        repo: Arc<dyn ExecutionLogRepository>,
        selection: Arc<SelectionController>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        let (snapshot, _) = watch::channel(LogSnapshot::default());
        Self {
            repo,
            collection: Collection::execution_plans(),
            selection,
            confirm,
            notice: Arc::new(TracingNotice),
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                snapshot,
            }),
        }
    }

    #[must_use]
    pub fn with_notice(mut self, notice: Arc<dyn UserNotice>) -> Self {
        self.notice = notice;
        self
    }

    #[must_use]
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Open the live subscription and wait for the initial snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionLogError::AlreadySubscribed` while a subscription is
    /// pending or live, or `ExecutionLogError::Subscription` if the feed cannot
    /// be opened or fails before delivering its first snapshot.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned future before it completes leaves the store
    /// `Unsubscribed` and closes the half-opened feed.
    pub async fn subscribe(&self) -> Result<LogSubscription, ExecutionLogError> {
        let generation = {
            let mut inner = self.shared.lock();
            if inner.link != Link::Unsubscribed {
                return Err(ExecutionLogError::AlreadySubscribed);
            }
            let generation = inner.next_generation;
            inner.next_generation += 1;
            inner.link = Link::Subscribing(generation);
            generation
        };
        let _reservation = SubscribeGuard {
            shared: Arc::clone(&self.shared),
            generation,
        };

        match self.open_feed(generation).await {
            Ok(subscription) => {
                tracing::info!(collection = %self.collection, "execution log subscribed");
                Ok(subscription)
            }
            Err(err) => {
                tracing::warn!(collection = %self.collection, error = %err, "execution log subscribe failed");
                Err(ExecutionLogError::Subscription(err))
            }
        }
    }

    async fn open_feed(&self, generation: u64) -> Result<LogSubscription, StorageError> {
        let feed = self.repo.subscribe(&self.collection).await?;
        let (mut events, handle) = feed.into_parts();

        let initial = match events.recv().await {
            Some(Ok(snapshot)) => snapshot,
            Some(Err(err)) => return Err(err),
            None => return Err(StorageError::SubscriptionClosed),
        };
        if !self.shared.go_live(generation, initial) {
            return Err(StorageError::SubscriptionClosed);
        }

        tokio::spawn(apply_pushes(Arc::clone(&self.shared), generation, events));

        Ok(LogSubscription {
            handle,
            shared: Arc::clone(&self.shared),
            generation,
        })
    }

    /// Submit a new plan built from `title` and `detail`.
    ///
    /// The entry is stamped with the selected week; the store assigns its id
    /// and timestamp. It appears locally once the next push arrives.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionLogError::Validation` for a blank title (nothing is
    /// sent), `ExecutionLogError::NotSubscribed` or `ExecutionLogError::Busy`
    /// when a write cannot start, and `ExecutionLogError::StoreWrite` if the
    /// store rejects it.
    pub async fn create(
        &self,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Result<LogEntryId, ExecutionLogError> {
        self.submit(PlanDraft::new(title, detail)).await
    }

    /// Submit the input buffer. Success clears it; failure keeps it.
    ///
    /// # Errors
    ///
    /// Same as [`ExecutionLogStore::create`].
    pub async fn submit_draft(&self) -> Result<LogEntryId, ExecutionLogError> {
        let draft = self.draft();
        self.submit(draft).await
    }

    async fn submit(&self, draft: PlanDraft) -> Result<LogEntryId, ExecutionLogError> {
        let plan = draft.validate(self.selection.current())?;
        let guard = self.begin_submit()?;
        let week = plan.week;

        let result = self
            .repo
            .add(&self.collection, NewLogEntryRecord::from_plan(plan))
            .await;

        match result {
            Ok(id) => {
                if guard.is_live() {
                    self.shared.lock().draft = PlanDraft::default();
                    tracing::info!(id = %id, week = week.value(), "plan submitted");
                } else {
                    tracing::debug!(id = %id, "plan submitted after unsubscribe");
                }
                Ok(id)
            }
            Err(err) => {
                if guard.is_live() {
                    tracing::warn!(error = %err, "plan submit failed");
                    self.notice.notify(SAVE_FAILED_NOTICE);
                } else {
                    tracing::warn!(error = %err, "plan submit failed after unsubscribe");
                }
                Err(ExecutionLogError::StoreWrite(err))
            }
        }
    }

    fn begin_submit(&self) -> Result<SubmitGuard, ExecutionLogError> {
        let mut inner = self.shared.lock();
        let Link::Live(generation) = inner.link else {
            return Err(ExecutionLogError::NotSubscribed);
        };
        if inner.submitting {
            return Err(ExecutionLogError::Busy);
        }
        inner.submitting = true;
        Ok(SubmitGuard {
            shared: Arc::clone(&self.shared),
            generation,
        })
    }

    /// Delete an entry after confirmation.
    ///
    /// The entry disappears locally once the next push arrives.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionLogError::NotSubscribed` without a live subscription
    /// and `ExecutionLogError::StoreWrite` if the store rejects the delete.
    pub async fn delete(&self, id: &LogEntryId) -> Result<DeleteOutcome, ExecutionLogError> {
        let Link::Live(generation) = self.shared.lock().link else {
            return Err(ExecutionLogError::NotSubscribed);
        };

        if !self.confirm.confirm(DELETE_CONFIRMATION) {
            tracing::debug!(id = %id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        match self.repo.delete(&self.collection, id).await {
            Ok(()) => {
                tracing::info!(id = %id, "plan deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                tracing::warn!(id = %id, error = %err, "plan delete failed");
                if self.shared.is_live(generation) {
                    self.notice.notify(DELETE_FAILED_NOTICE);
                }
                Err(ExecutionLogError::StoreWrite(err))
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> StoreState {
        let inner = self.shared.lock();
        match (inner.link, inner.submitting) {
            (Link::Unsubscribed, _) => StoreState::Unsubscribed,
            (Link::Subscribing(_), _) => StoreState::Subscribing,
            (Link::Live(_), true) => StoreState::Submitting,
            (Link::Live(_), false) => StoreState::Idle,
        }
    }

    /// The last applied snapshot, in delivered order.
    #[must_use]
    pub fn entries(&self) -> LogSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Observe every applied snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<LogSnapshot> {
        self.shared.snapshot.subscribe()
    }

    #[must_use]
    pub fn draft(&self) -> PlanDraft {
        self.shared.lock().draft.clone()
    }

    pub fn update_draft(&self, draft: PlanDraft) {
        self.shared.lock().draft = draft;
    }

    /// Whether submitting the buffer would start a write right now.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        let inner = self.shared.lock();
        matches!(inner.link, Link::Live(_)) && !inner.submitting && inner.draft.has_title()
    }
}

impl fmt::Debug for ExecutionLogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionLogStore")
            .field("collection", &self.collection)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn apply_pushes(
    shared: Arc<Shared>,
    generation: u64,
    mut events: mpsc::Receiver<Result<LogSnapshot, StorageError>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            Ok(snapshot) => {
                if !shared.apply(generation, snapshot) {
                    break;
                }
            }
            Err(err) => {
                if shared.end(generation) {
                    tracing::error!(error = %err, "execution log subscription failed");
                }
                break;
            }
        }
    }
}

/// Releases a pending subscribe that never went live.
struct SubscribeGuard {
    shared: Arc<Shared>,
    generation: u64,
}

impl Drop for SubscribeGuard {
    fn drop(&mut self) {
        self.shared.abandon(self.generation);
    }
}

/// Returns the store to `Idle` however the submit ends.
struct SubmitGuard {
    shared: Arc<Shared>,
    generation: u64,
}

impl SubmitGuard {
    fn is_live(&self) -> bool {
        self.shared.is_live(self.generation)
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.shared.lock().submitting = false;
    }
}

/// Cancellation capability for a live store subscription.
///
/// Cancelling is idempotent and also happens on drop. The last snapshot
/// stays readable afterwards.
#[must_use = "dropping the subscription cancels it"]
pub struct LogSubscription {
    handle: SubscriptionHandle,
    shared: Arc<Shared>,
    generation: u64,
}

impl LogSubscription {
    pub fn cancel(&self) {
        self.handle.cancel();
        if self.shared.end(self.generation) {
            tracing::info!("execution log unsubscribed");
        }
    }

    /// `false` once cancelled or after the feed failed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.is_live(self.generation)
    }
}

impl fmt::Debug for LogSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSubscription")
            .field("generation", &self.generation)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
