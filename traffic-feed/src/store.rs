//! Access to the record store behind the feed.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::debug;
use traffic_types::STORE_CODE_METADATA;
use traffic_types::traffic::traffic_store_client::TrafficStoreClient;
use traffic_types::traffic::{self, ListRequest, PublishRequest, SubscribeRequest};

use crate::error::{Error, StoreError};
use crate::record::{Draft, TrafficUpdate};

/// A change notification for the update table.
///
/// Only inserts carry the record; the feed ignores the other kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert(TrafficUpdate),
    Update { id: String },
    Delete { id: String },
}

pub type ChangeStream = Pin<Box<dyn Stream<Item = Result<Change, StoreError>> + Send>>;

/// The two store capabilities the feed relies on.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Up to `limit` updates, newest first.
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<TrafficUpdate>, StoreError>;

    /// Opens a push channel of changes committed from now on.
    async fn changes(&self) -> Result<ChangeStream, StoreError>;
}

/// Server address wrapper for type-safe connection.
#[derive(Clone, Debug)]
pub struct ServerAddr(pub String);

impl From<String> for ServerAddr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServerAddr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// [`RecordStore`] backed by the traffic store's gRPC service.
#[derive(Clone)]
pub struct GrpcStore {
    client: TrafficStoreClient<Channel>,
}

impl GrpcStore {
    /// Connects to a traffic store, e.g. `"localhost:50051"`.
    pub async fn connect(addr: impl Into<ServerAddr>) -> Result<Self, Error> {
        let server_addr = addr.into();
        let endpoint = Endpoint::from_shared(format!("http://{}", server_addr.0))?;
        let channel = endpoint.connect().await?;

        Ok(Self {
            client: TrafficStoreClient::new(channel),
        })
    }

    /// Publishes a new update and returns it as stored.
    pub async fn publish(&self, draft: Draft) -> Result<TrafficUpdate, StoreError> {
        let response = self
            .client
            .clone()
            .publish(PublishRequest {
                content: Some(draft.into()),
            })
            .await
            .map_err(store_error)?
            .into_inner();

        response
            .update
            .ok_or_else(|| StoreError::Malformed("publish response without update".into()))?
            .try_into()
    }
}

#[async_trait]
impl RecordStore for GrpcStore {
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<TrafficUpdate>, StoreError> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        let response = self
            .client
            .clone()
            .list(ListRequest { limit })
            .await
            .map_err(store_error)?
            .into_inner();

        response
            .updates
            .into_iter()
            .map(TrafficUpdate::try_from)
            .collect()
    }

    async fn changes(&self) -> Result<ChangeStream, StoreError> {
        let stream = self
            .client
            .clone()
            .subscribe(SubscribeRequest {})
            .await
            .map_err(store_error)?
            .into_inner();

        Ok(Box::pin(stream.map(|event| {
            let event = event.map_err(store_error)?;
            decode_change(event)
        })))
    }
}

fn decode_change(event: traffic::ChangeEvent) -> Result<Change, StoreError> {
    let kind = event.kind();
    let record = event
        .record
        .ok_or_else(|| StoreError::Malformed(format!("change {} without record", event.ordinal)))?;
    debug!(ordinal = event.ordinal, ?kind, id = %record.id, "change received");

    match kind {
        traffic::ChangeKind::Insert => Ok(Change::Insert(record.try_into()?)),
        traffic::ChangeKind::Update => Ok(Change::Update { id: record.id }),
        traffic::ChangeKind::Delete => Ok(Change::Delete { id: record.id }),
        traffic::ChangeKind::Unspecified => Err(StoreError::Malformed(format!(
            "change {} has no kind",
            event.ordinal
        ))),
    }
}

/// Splits gRPC failures into answers from the store and transport trouble.
fn store_error(status: Status) -> StoreError {
    match status.code() {
        Code::Unavailable | Code::Unknown | Code::Cancelled | Code::DeadlineExceeded => {
            let message = status.message();
            StoreError::Unreachable((!message.is_empty()).then(|| message.to_string()))
        }
        _ => StoreError::Rejected {
            code: status
                .metadata()
                .get(STORE_CODE_METADATA)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            message: status.message().to_string(),
        },
    }
}
