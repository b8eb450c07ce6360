//! Terminal dashboard for traffic and checkpoint status updates.
//!
//! The dashboard is a thin presentation layer over [`traffic_feed`]: it drives
//! the feed's load/subscribe/unsubscribe cycle and renders update cards, the
//! map overview and the loading, empty and error states as plain text.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use traffic_dashboard::{load_config, render_dashboard};
//! use traffic_feed::{DataFeed, GrpcStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config(None)?;
//!     let feed = DataFeed::new(GrpcStore::connect(config.store_address.as_str()).await?);
//!
//!     let _ = feed.load().await;
//!     let state = feed.snapshot();
//!     print!("{}", render_dashboard(&state, Some("Ramallah"), &config.keywords, Utc::now()));
//!     Ok(())
//! }
//! ```

mod config;
mod draft;
mod error;
mod render;

pub use config::{DEFAULT_STORE_ADDRESS, DashboardConfig, load_config};
pub use draft::{build_draft, parse_status_pairs};
pub use error::Error;
pub use render::{load_outcome, relative_age, render_card, render_dashboard, render_overview};
