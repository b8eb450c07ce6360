//! Error types for the traffic feed.

use thiserror::Error;
use traffic_types::UNDEFINED_TABLE;

/// Shown instead of the raw store message when the update table is missing.
pub const SETUP_GUIDANCE: &str =
    "Database table not set up yet. Please wait while we set up the database.";

/// Shown when a failure outside the store's error channel carries no message.
pub const LOAD_FALLBACK: &str = "Failed to fetch traffic data";

#[derive(Debug, Error)]
pub enum Error {
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("feed is already subscribed")]
    AlreadySubscribed,
}

/// Failure reported by a [`RecordStore`](crate::RecordStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store answered with a structured error.
    #[error("{message}")]
    Rejected {
        code: Option<String>,
        message: String,
    },

    /// The store could not be reached.
    #[error("store unreachable: {}", .0.as_deref().unwrap_or("no details"))]
    Unreachable(Option<String>),

    /// The store answered with something that is not a valid update.
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn is_missing_table(&self) -> bool {
        matches!(self, StoreError::Rejected { code: Some(code), .. } if code == UNDEFINED_TABLE)
    }
}

/// Terminal outcome of a failed [`DataFeed::load`](crate::DataFeed::load).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{}", SETUP_GUIDANCE)]
    Setup,

    #[error("{0}")]
    Query(String),

    #[error("{0}")]
    Unexpected(String),
}

impl From<StoreError> for LoadError {
    fn from(err: StoreError) -> Self {
        if err.is_missing_table() {
            return LoadError::Setup;
        }

        match err {
            StoreError::Rejected { message, .. } => LoadError::Query(message),
            StoreError::Unreachable(message) => LoadError::Unexpected(
                message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| LOAD_FALLBACK.to_string()),
            ),
            StoreError::Malformed(message) => LoadError::Unexpected(message),
        }
    }
}
