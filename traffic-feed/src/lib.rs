//! Realtime feed of traffic and checkpoint status updates.
//!
//! `traffic-feed` keeps the 50 most recent updates of a record store in memory.
//! It loads them once, then follows the store's change stream and prepends
//! every inserted update. Views for a selected city or checkpoint are derived
//! with [`filter`].
//!
//! # Features
//!
//! - Injected store handle ([`RecordStore`]), with a gRPC implementation
//! - Insert notifications applied by a single consumer loop
//! - State published through a `tokio::sync::watch` channel
//! - Configurable keyword classification of free-text statuses
//! - Map markers and focus for known cities and checkpoints
//!
//! # Example
//!
//! ```no_run
//! use traffic_feed::{DashboardView, DataFeed, GrpcStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let feed = DataFeed::new(GrpcStore::connect("localhost:50051").await?);
//!
//!     feed.load().await?;
//!     feed.subscribe().await?;
//!
//!     let state = feed.snapshot();
//!     if let DashboardView::Updates(updates) = DashboardView::derive(&state, Some("Nablus")) {
//!         println!("{} updates for Nablus", updates.len());
//!     }
//!
//!     feed.unsubscribe();
//!     Ok(())
//! }
//! ```

mod error;
mod feed;
mod filter;
mod overview;
mod recent;
mod record;
mod status;
mod store;
mod sync;
mod view;

pub use error::{Error, LOAD_FALLBACK, LoadError, SETUP_GUIDANCE, StoreError};
pub use feed::{DataFeed, FeedEvent, FeedState, LinkState};
pub use filter::{concerns, filter};
pub use overview::{
    Focus, Gazetteer, LOCATION_ZOOM, Location, LocationKind, Marker, MarkerStatus,
    OVERVIEW_CENTER, OVERVIEW_ZOOM,
};
pub use recent::{FEED_CAPACITY, RecentUpdates};
pub use record::{Draft, TrafficUpdate};
pub use status::{CheckpointTone, StatusKeywords, TrafficTone};
pub use store::{Change, ChangeStream, GrpcStore, RecordStore, ServerAddr};
pub use view::{DashboardView, NO_UPDATES_YET, empty_message, staleness_notice};
