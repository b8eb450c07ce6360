//! Background tasks that carry store changes into the feed state.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::StoreError;
use crate::feed::{FeedEvent, FeedState, LinkState};
use crate::store::{Change, ChangeStream};

const EVENT_BUFFER: usize = 64;

/// Reads the change stream and turns inserts into feed events.
pub(crate) struct SyncTask {
    changes: ChangeStream,
    events: mpsc::Sender<FeedEvent>,
}

impl SyncTask {
    pub(crate) fn new(changes: ChangeStream, events: mpsc::Sender<FeedEvent>) -> Self {
        Self { changes, events }
    }

    pub(crate) async fn run(mut self) {
        let reason = loop {
            match self.changes.next().await {
                Some(Ok(Change::Insert(update))) => {
                    debug!(id = %update.id, "update inserted");
                    if self.events.send(FeedEvent::Inserted(update)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Change::Update { id })) => {
                    trace!(%id, "ignoring update notification");
                }
                Some(Ok(Change::Delete { id })) => {
                    trace!(%id, "ignoring delete notification");
                }
                Some(Err(StoreError::Malformed(message))) => {
                    warn!(%message, "skipping unreadable change notification");
                }
                Some(Err(e)) => break e.to_string(),
                None => break "change stream closed by the store".to_string(),
            }
        };

        warn!(%reason, "change subscription lost; feed is no longer live");
        let _ = self.events.send(FeedEvent::Link(LinkState::Lost { reason })).await;
    }
}

/// The single consumer applying events to the published state, in order.
///
/// Events are checked against `generation` under the watch lock, so nothing
/// from a closed subscription lands after a newer link state.
async fn apply_events(
    mut events: mpsc::Receiver<FeedEvent>,
    state: Arc<watch::Sender<FeedState>>,
    generation: u64,
) {
    while let Some(event) = events.recv().await {
        let applied = state.send_if_modified(|current| current.apply_from(generation, event));
        if !applied {
            debug!(generation, "dropping event from a closed subscription");
            return;
        }
    }
}

/// The running halves of an open subscription.
pub(crate) struct Subscription {
    transport: JoinHandle<()>,
    consumer: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn start(
        changes: ChangeStream,
        state: Arc<watch::Sender<FeedState>>,
        generation: u64,
    ) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let transport = tokio::spawn(SyncTask::new(changes, tx).run());
        let consumer = tokio::spawn(apply_events(rx, state, generation));

        Self {
            transport,
            consumer,
        }
    }

    /// Whether the transport task is still reading the change stream.
    pub(crate) fn is_active(&self) -> bool {
        !self.transport.is_finished()
    }

    pub(crate) fn close(self) {
        self.transport.abort();
        self.consumer.abort();
    }
}
