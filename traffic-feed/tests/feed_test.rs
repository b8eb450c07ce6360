use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::UnboundedReceiverStream;
use traffic_feed::{
    Change, ChangeStream, DataFeed, Error, FEED_CAPACITY, FeedState, LOAD_FALLBACK, LinkState,
    LoadError, RecordStore, SETUP_GUIDANCE, StoreError, TrafficUpdate, filter,
};

struct FakeStore {
    listed: Mutex<Result<Vec<TrafficUpdate>, StoreError>>,
    streams: Mutex<Vec<mpsc::UnboundedSender<Result<Change, StoreError>>>>,
}

impl FakeStore {
    fn with_updates(updates: Vec<TrafficUpdate>) -> Arc<Self> {
        Arc::new(Self {
            listed: Mutex::new(Ok(updates)),
            streams: Mutex::new(Vec::new()),
        })
    }

    fn failing(err: StoreError) -> Arc<Self> {
        Arc::new(Self {
            listed: Mutex::new(Err(err)),
            streams: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, change: Change) {
        for stream in self.streams.lock().unwrap().iter() {
            let _ = stream.send(Ok(change.clone()));
        }
    }

    fn push_error(&self, err: StoreError) {
        for stream in self.streams.lock().unwrap().iter() {
            let _ = stream.send(Err(err.clone()));
        }
    }

    fn close_streams(&self) {
        self.streams.lock().unwrap().clear();
    }

    fn open_streams(&self) -> usize {
        self.streams
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<TrafficUpdate>, StoreError> {
        self.listed.lock().unwrap().clone().map(|mut updates| {
            updates.truncate(limit);
            updates
        })
    }

    async fn changes(&self) -> Result<ChangeStream, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams.lock().unwrap().push(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

fn update(id: &str, minutes_ago: i64) -> TrafficUpdate {
    TrafficUpdate::new(
        id,
        Utc::now() - chrono::Duration::minutes(minutes_ago),
        format!("report {id}"),
    )
}

fn full_page() -> Vec<TrafficUpdate> {
    (0..FEED_CAPACITY)
        .map(|i| update(&format!("old-{i}"), i as i64 + 1))
        .collect()
}

fn ids(state: &FeedState) -> Vec<String> {
    state.updates().iter().map(|u| u.id.clone()).collect()
}

async fn wait_for<S: RecordStore>(
    feed: &DataFeed<S>,
    mut ready: impl FnMut(&FeedState) -> bool,
) -> FeedState {
    let mut rx = feed.watch();
    let state = timeout(Duration::from_secs(5), rx.wait_for(|s| ready(s)))
        .await
        .expect("timed out waiting for the feed")
        .expect("feed state dropped")
        .clone();
    state
}

#[tokio::test]
async fn load_then_filter_by_location() {
    let store = FakeStore::with_updates(vec![
        update("1", 1).with_city("Ramallah"),
        update("2", 2).with_checkpoint("Qalandia", "Open"),
    ]);
    let feed = DataFeed::with_store(store);

    feed.load().await.unwrap();
    let state = feed.snapshot();

    assert!(!state.is_loading());
    assert_eq!(ids(&state), vec!["1", "2"]);

    let pick = |selection: Option<&str>| -> Vec<String> {
        filter(state.updates(), selection)
            .into_iter()
            .map(|u| u.id.clone())
            .collect()
    };
    assert_eq!(pick(Some("Ramallah")), vec!["1"]);
    assert_eq!(pick(Some("Qalandia")), vec!["2"]);
    assert!(pick(Some("Gaza")).is_empty());
    assert_eq!(pick(None), vec!["1", "2"]);
}

#[tokio::test]
async fn empty_store_loads_empty_list() {
    let feed = DataFeed::with_store(FakeStore::with_updates(Vec::new()));

    feed.load().await.unwrap();

    let state = feed.snapshot();
    assert!(state.updates().is_empty());
    assert!(state.error().is_none());
}

#[tokio::test]
async fn missing_table_shows_setup_guidance() {
    let store = FakeStore::failing(StoreError::Rejected {
        code: Some("42P01".to_string()),
        message: "relation \"public.traffic_updates\" does not exist".to_string(),
    });
    let feed = DataFeed::with_store(store);

    let err = feed.load().await.unwrap_err();

    assert_eq!(err, LoadError::Setup);
    let state = feed.snapshot();
    assert!(!state.is_loading());
    assert_eq!(state.error().unwrap().to_string(), SETUP_GUIDANCE);
}

#[tokio::test]
async fn other_failures_are_reported_verbatim_or_with_fallback() {
    let feed = DataFeed::with_store(FakeStore::failing(StoreError::Rejected {
        code: None,
        message: "JWT expired".to_string(),
    }));
    feed.load().await.unwrap_err();
    assert_eq!(feed.snapshot().error().unwrap().to_string(), "JWT expired");

    let feed = DataFeed::with_store(FakeStore::failing(StoreError::Unreachable(None)));
    feed.load().await.unwrap_err();
    assert_eq!(feed.snapshot().error().unwrap().to_string(), LOAD_FALLBACK);
}

#[tokio::test]
async fn insert_beyond_capacity_drops_the_oldest() {
    let store = FakeStore::with_updates(full_page());
    let feed = DataFeed::with_store(Arc::clone(&store));
    feed.load().await.unwrap();
    feed.subscribe().await.unwrap();

    // Older than everything loaded; still goes to the front.
    store.push(Change::Insert(update("new", 10_000)));

    let state = wait_for(&feed, |s| {
        s.updates().first().map(|u| u.id.as_str()) == Some("new")
    })
    .await;
    assert_eq!(state.updates().len(), FEED_CAPACITY);
    assert_eq!(state.updates()[1].id, "old-0");
    assert_eq!(
        state.updates().last().unwrap().id,
        format!("old-{}", FEED_CAPACITY - 2)
    );
    assert_eq!(state.link(), &LinkState::Live);
}

#[tokio::test]
async fn burst_of_inserts_keeps_cap_and_arrival_order() {
    let store = FakeStore::with_updates(Vec::new());
    let feed = DataFeed::with_store(Arc::clone(&store));
    feed.load().await.unwrap();
    feed.subscribe().await.unwrap();

    for i in 0..120 {
        store.push(Change::Insert(update(&format!("i-{i}"), 0)));
    }

    let state = wait_for(&feed, |s| {
        assert!(s.updates().len() <= FEED_CAPACITY);
        s.updates().first().map(|u| u.id.as_str()) == Some("i-119")
    })
    .await;

    let expected: Vec<String> = (70..120).rev().map(|i| format!("i-{i}")).collect();
    assert_eq!(ids(&state), expected);
}

#[tokio::test]
async fn updates_and_deletes_are_ignored() {
    let store = FakeStore::with_updates(vec![update("a", 1), update("b", 2)]);
    let feed = DataFeed::with_store(Arc::clone(&store));
    feed.load().await.unwrap();
    feed.subscribe().await.unwrap();

    store.push(Change::Update { id: "a".to_string() });
    store.push(Change::Delete { id: "b".to_string() });
    store.push(Change::Insert(update("marker", 0)));

    let state = wait_for(&feed, |s| s.updates().len() == 3).await;
    assert_eq!(ids(&state), vec!["marker", "a", "b"]);
    assert_eq!(state.updates()[1].message, "report a");
}

#[tokio::test]
async fn unreadable_change_is_skipped_and_link_stays_live() {
    let store = FakeStore::with_updates(Vec::new());
    let feed = DataFeed::with_store(Arc::clone(&store));
    feed.load().await.unwrap();
    feed.subscribe().await.unwrap();

    store.push_error(StoreError::Malformed(
        "update x has timestamp out of range".to_string(),
    ));
    store.push(Change::Insert(update("good", 0)));

    let state = wait_for(&feed, |s| !s.updates().is_empty()).await;
    assert_eq!(ids(&state), vec!["good"]);
    assert_eq!(state.link(), &LinkState::Live);
    assert!(feed.is_subscribed());
}

#[tokio::test]
async fn store_failure_on_the_stream_marks_link_lost() {
    let store = FakeStore::with_updates(vec![update("kept", 1)]);
    let feed = DataFeed::with_store(Arc::clone(&store));
    feed.load().await.unwrap();
    feed.subscribe().await.unwrap();

    store.push_error(StoreError::Unreachable(Some("connection reset".to_string())));

    let state = wait_for(&feed, |s| matches!(s.link(), LinkState::Lost { .. })).await;
    assert_eq!(ids(&state), vec!["kept"]);
}

#[tokio::test]
async fn second_subscribe_while_live_is_rejected() {
    let store = FakeStore::with_updates(Vec::new());
    let feed = DataFeed::with_store(Arc::clone(&store));
    feed.subscribe().await.unwrap();

    assert!(matches!(
        feed.subscribe().await,
        Err(Error::AlreadySubscribed)
    ));
    assert_eq!(store.open_streams(), 1);
}

#[tokio::test]
async fn unsubscribe_is_idempotent() {
    let store = FakeStore::with_updates(Vec::new());
    let feed = DataFeed::with_store(Arc::clone(&store));

    assert!(!feed.unsubscribe());

    feed.subscribe().await.unwrap();
    assert!(feed.is_subscribed());

    assert!(feed.unsubscribe());
    assert!(!feed.unsubscribe());
    assert!(!feed.is_subscribed());
    assert_eq!(feed.snapshot().link(), &LinkState::Closed);

    // The aborted transport task dropped its end of the stream.
    timeout(Duration::from_secs(5), async {
        while store.open_streams() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("change stream still open after unsubscribe");
}

#[tokio::test]
async fn closed_stream_marks_link_lost_and_allows_resubscribe() {
    let store = FakeStore::with_updates(vec![update("kept", 1)]);
    let feed = DataFeed::with_store(Arc::clone(&store));
    feed.load().await.unwrap();
    feed.subscribe().await.unwrap();

    store.close_streams();

    let state = wait_for(&feed, |s| matches!(s.link(), LinkState::Lost { .. })).await;
    assert_eq!(ids(&state), vec!["kept"]);

    timeout(Duration::from_secs(5), async {
        while feed.is_subscribed() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("transport task did not finish");

    feed.subscribe().await.unwrap();
    store.push(Change::Insert(update("after", 0)));

    let state = wait_for(&feed, |s| s.updates().len() == 2).await;
    assert_eq!(ids(&state), vec!["after", "kept"]);
    assert_eq!(state.link(), &LinkState::Live);
}

#[tokio::test]
async fn dropping_the_feed_releases_the_stream() {
    let store = FakeStore::with_updates(Vec::new());
    let feed = DataFeed::with_store(Arc::clone(&store));
    feed.subscribe().await.unwrap();

    drop(feed);

    timeout(Duration::from_secs(5), async {
        while store.open_streams() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("change stream still open after drop");
}
