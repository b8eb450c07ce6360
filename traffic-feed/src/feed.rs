//! The data feed: one bulk load, then a live subscription of inserts.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{Error, LoadError};
use crate::filter::filter;
use crate::recent::{FEED_CAPACITY, RecentUpdates};
use crate::record::TrafficUpdate;
use crate::store::RecordStore;
use crate::sync::Subscription;

/// Health of the push subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LinkState {
    /// Never subscribed.
    #[default]
    Idle,
    Live,
    /// The change stream ended or failed; the list may be stale.
    Lost { reason: String },
    /// Released by [`DataFeed::unsubscribe`].
    Closed,
}

/// Everything that can happen to the feed state.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    LoadStarted,
    Loaded(Vec<TrafficUpdate>),
    LoadFailed(LoadError),
    Inserted(TrafficUpdate),
    Link(LinkState),
}

/// Snapshot of the feed as published to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    updates: RecentUpdates,
    loading: bool,
    error: Option<LoadError>,
    link: LinkState,
    /// Bumped whenever a subscription opens or is released.
    generation: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            updates: RecentUpdates::new(),
            loading: true,
            error: None,
            link: LinkState::Idle,
            generation: 0,
        }
    }
}

impl FeedState {
    pub fn apply(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::LoadStarted => {
                self.loading = true;
                self.error = None;
            }
            FeedEvent::Loaded(updates) => {
                self.updates.replace(updates);
                self.loading = false;
            }
            FeedEvent::LoadFailed(error) => {
                self.error = Some(error);
                self.loading = false;
            }
            FeedEvent::Inserted(update) => {
                self.updates.prepend(update);
            }
            FeedEvent::Link(link) => self.link = link,
        }
    }

    /// Marks a new subscription live and returns its generation.
    pub(crate) fn open_link(&mut self) -> u64 {
        self.generation += 1;
        self.link = LinkState::Live;
        self.generation
    }

    pub(crate) fn close_link(&mut self) {
        self.generation += 1;
        self.link = LinkState::Closed;
    }

    /// Applies an event from the subscription of `generation`.
    ///
    /// Returns `false` and leaves the state untouched when that subscription
    /// has since been replaced or released.
    pub(crate) fn apply_from(&mut self, generation: u64, event: FeedEvent) -> bool {
        if generation != self.generation {
            return false;
        }
        self.apply(event);
        true
    }

    /// Newest first, at most [`FEED_CAPACITY`] entries.
    pub fn updates(&self) -> &[TrafficUpdate] {
        self.updates.as_slice()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    pub fn link(&self) -> &LinkState {
        &self.link
    }

    /// The updates relevant to `selection`.
    pub fn filtered(&self, selection: Option<&str>) -> Vec<&TrafficUpdate> {
        filter(self.updates(), selection)
    }
}

/// In-memory view of the most recent updates, kept in sync with a store.
///
/// The feed starts in the loading state. [`load`](Self::load) fills it once;
/// [`subscribe`](Self::subscribe) keeps it current by prepending every
/// inserted update. Observers read snapshots or [`watch`](Self::watch) for
/// changes.
///
/// # Example
///
/// ```no_run
/// use traffic_feed::{DataFeed, GrpcStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = GrpcStore::connect("localhost:50051").await?;
///     let feed = DataFeed::new(store);
///
///     feed.load().await?;
///     feed.subscribe().await?;
///
///     for update in feed.snapshot().filtered(Some("Ramallah")) {
///         println!("{}", update.message);
///     }
///
///     feed.unsubscribe();
///     Ok(())
/// }
/// ```
pub struct DataFeed<S> {
    store: Arc<S>,
    state: Arc<watch::Sender<FeedState>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<S: RecordStore> DataFeed<S> {
    pub fn new(store: S) -> Self {
        Self::with_store(Arc::new(store))
    }

    pub fn with_store(store: Arc<S>) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            store,
            state: Arc::new(state),
            subscription: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Replaces the list with the newest updates from the store.
    ///
    /// A failure is recorded in the state and returned; it is not retried.
    pub async fn load(&self) -> Result<(), LoadError> {
        self.state.send_modify(|s| s.apply(FeedEvent::LoadStarted));

        match self.store.fetch_latest(FEED_CAPACITY).await {
            Ok(updates) => {
                info!(count = updates.len(), "traffic updates loaded");
                self.state.send_modify(|s| s.apply(FeedEvent::Loaded(updates)));
                Ok(())
            }
            Err(e) => {
                let error = LoadError::from(e);
                warn!(%error, "loading traffic updates failed");
                self.state
                    .send_modify(|s| s.apply(FeedEvent::LoadFailed(error.clone())));
                Err(error)
            }
        }
    }

    /// Opens the push channel of inserts.
    ///
    /// Fails with [`Error::AlreadySubscribed`] while a channel is live. After
    /// the link was lost a new call opens a fresh channel.
    pub async fn subscribe(&self) -> Result<(), Error> {
        if self.is_subscribed() {
            return Err(Error::AlreadySubscribed);
        }

        let changes = self.store.changes().await?;

        let mut slot = match self.subscription.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.as_ref().is_some_and(Subscription::is_active) {
            return Err(Error::AlreadySubscribed);
        }
        if let Some(previous) = slot.take() {
            previous.close();
        }

        let mut generation = 0;
        self.state.send_modify(|s| generation = s.open_link());
        *slot = Some(Subscription::start(
            changes,
            Arc::clone(&self.state),
            generation,
        ));
        info!("subscribed to traffic update inserts");

        Ok(())
    }
}

impl<S> DataFeed<S> {
    /// Releases the push channel. Returns `false` when none was open.
    pub fn unsubscribe(&self) -> bool {
        let previous = match self.subscription.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        match previous {
            Some(subscription) => {
                subscription.close();
                self.state.send_modify(FeedState::close_link);
                info!("unsubscribed from traffic update inserts");
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .map(|slot| slot.as_ref().is_some_and(Subscription::is_active))
            .unwrap_or(false)
    }

    /// Current state.
    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }
}

impl<S> Drop for DataFeed<S> {
    fn drop(&mut self) {
        let subscription = match self.subscription.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(subscription) = subscription {
            subscription.close();
        }
    }
}
