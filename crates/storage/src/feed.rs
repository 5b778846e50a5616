//! Push-based snapshot delivery shared by the repository backends.
//!
//! A feed emits the full, ordered collection once on start and again after
//! every change notification for its collection. It never emits diffs.

use std::future::Future;

use tokio::sync::{broadcast, mpsc, watch};

use crate::repository::{Collection, LogSnapshot, StorageError};

/// One delivery on a feed. An `Err` is terminal: nothing follows it.
pub type SnapshotEvent = Result<LogSnapshot, StorageError>;

const FEED_BUFFER: usize = 16;

/// Cancels a live subscription.
///
/// Cancelling is idempotent. Dropping the handle cancels as well, so a
/// subscription cannot outlive its owner.
#[derive(Debug)]
pub struct SubscriptionHandle {
    cancel: watch::Sender<bool>,
}

impl SubscriptionHandle {
    /// Stop delivery and release the watcher task.
    pub fn cancel(&self) {
        let was_cancelled = self.cancel.send_replace(true);
        if !was_cancelled {
            tracing::debug!("snapshot subscription cancelled");
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// Receiving side of a subscription: snapshots plus the cancel capability.
#[derive(Debug)]
pub struct SnapshotFeed {
    events: mpsc::Receiver<SnapshotEvent>,
    handle: SubscriptionHandle,
}

impl SnapshotFeed {
    /// Wait for the next delivery. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.events.recv().await
    }

    #[must_use]
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    #[must_use]
    pub fn into_parts(self) -> (mpsc::Receiver<SnapshotEvent>, SubscriptionHandle) {
        (self.events, self.handle)
    }
}

/// Producing side of a feed, for backends that drive delivery themselves.
#[derive(Debug)]
pub struct FeedSender {
    events: mpsc::Sender<SnapshotEvent>,
    cancelled: watch::Receiver<bool>,
}

impl FeedSender {
    /// Deliver one event. Returns `false` once the subscriber has cancelled
    /// or gone away, after which nothing more should be sent.
    pub async fn send(&mut self, event: SnapshotEvent) -> bool {
        if *self.cancelled.borrow() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.cancelled.changed() => false,
            sent = self.events.send(event) => sent.is_ok(),
        }
    }
}

impl SnapshotFeed {
    /// An unconnected feed and the sender that drives it.
    #[must_use]
    pub fn channel() -> (FeedSender, SnapshotFeed) {
        let (events_tx, events) = mpsc::channel(FEED_BUFFER);
        let (cancel, cancelled) = watch::channel(false);
        let sender = FeedSender {
            events: events_tx,
            cancelled,
        };
        let feed = SnapshotFeed {
            events,
            handle: SubscriptionHandle { cancel },
        };
        (sender, feed)
    }
}

/// Spawn a watcher that reloads `collection` on every matching change.
///
/// `changes` must be subscribed before this is called so that a write
/// racing with the initial load is not missed.
pub(crate) fn spawn_feed<L, Fut>(
    collection: Collection,
    mut changes: broadcast::Receiver<Collection>,
    load: L,
) -> SnapshotFeed
where
    L: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = SnapshotEvent> + Send + 'static,
{
    let (mut tx, feed) = SnapshotFeed::channel();

    tokio::spawn(async move {
        loop {
            let event = load().await;
            let terminal = event.is_err();
            if let Err(err) = &event {
                tracing::warn!(collection = %collection, error = %err, "snapshot load failed");
            }

            if !tx.send(event).await || terminal {
                break;
            }

            tokio::select! {
                biased;
                _ = tx.cancelled.changed() => break,
                change = next_change(&mut changes, &collection) => {
                    if change.is_err() {
                        tx.send(Err(StorageError::SubscriptionClosed)).await;
                        break;
                    }
                }
            }
        }
        tracing::debug!(collection = %collection, "snapshot watcher stopped");
    });

    feed
}

struct ChangesClosed;

/// Wait for a change on `collection`, then drain whatever else is queued so
/// a burst of writes costs one reload.
async fn next_change(
    changes: &mut broadcast::Receiver<Collection>,
    collection: &Collection,
) -> Result<(), ChangesClosed> {
    loop {
        match changes.recv().await {
            Ok(changed) if &changed == collection => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "change notifications lagged; reloading");
                break;
            }
            Err(broadcast::error::RecvError::Closed) => return Err(ChangesClosed),
        }
    }
    loop {
        match changes.try_recv() {
            Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => return Ok(()),
        }
    }
}
