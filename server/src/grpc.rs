use std::pin::Pin;
use std::sync::Arc;

use futures_util::stream::{Stream, StreamExt};
use tonic::metadata::MetadataValue;
use tonic::{Request, Response, Status};
use tracing::{info, warn};
use traffic_types::traffic::traffic_store_server::{TrafficStore, TrafficStoreServer};
use traffic_types::traffic::{
    ChangeEvent, DeleteRequest, DeleteResponse, ListRequest, ListResponse, PublishRequest,
    PublishResponse, ReviseRequest, ReviseResponse, SubscribeRequest,
};
use traffic_types::{STORE_CODE_METADATA, UNDEFINED_TABLE};

use crate::models::NewUpdate;
use crate::storage::{Storage, StorageError};

pub const DEFAULT_PAGE: u32 = 50;
pub const MAX_PAGE: u32 = 500;

#[derive(Clone)]
pub struct TrafficStoreService {
    storage: Arc<Storage>,
}

impl TrafficStoreService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl From<StorageError> for Status {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MissingTable(message) => {
                let mut status = Status::failed_precondition(message);
                status
                    .metadata_mut()
                    .insert(STORE_CODE_METADATA, MetadataValue::from_static(UNDEFINED_TABLE));
                status
            }
            StorageError::NotFound(id) => Status::not_found(format!("update {id} not found")),
            other => Status::internal(other.to_string()),
        }
    }
}

fn page_size(limit: u32) -> u32 {
    match limit {
        0 => DEFAULT_PAGE,
        n => n.min(MAX_PAGE),
    }
}

type SubscribeStream = Pin<Box<dyn Stream<Item = Result<ChangeEvent, Status>> + Send>>;

#[tonic::async_trait]
impl TrafficStore for TrafficStoreService {
    type SubscribeStream = SubscribeStream;

    async fn list(&self, request: Request<ListRequest>) -> Result<Response<ListResponse>, Status> {
        let limit = page_size(request.into_inner().limit);
        let updates = self.storage.list_latest(limit).await?;

        Ok(Response::new(ListResponse {
            updates: updates.into_iter().map(Into::into).collect(),
        }))
    }

    async fn subscribe(
        &self,
        _request: Request<SubscribeRequest>,
    ) -> Result<Response<Self::SubscribeStream>, Status> {
        let head = self.storage.latest_ordinal().await?;
        let changes = self.storage.changes_after(head);
        info!(head, "change subscription opened");

        let output = async_stream::stream! {
            let mut changes = changes;
            while let Some(result) = changes.next().await {
                match result {
                    Ok(change) => yield Ok(ChangeEvent::from(change)),
                    Err(e) => {
                        warn!(error = %e, "change subscription failed");
                        yield Err(Status::from(e));
                        break;
                    }
                }
            }
        };

        Ok(Response::new(Box::pin(output)))
    }

    async fn publish(
        &self,
        request: Request<PublishRequest>,
    ) -> Result<Response<PublishResponse>, Status> {
        let content = request
            .into_inner()
            .content
            .ok_or_else(|| Status::invalid_argument("content is required"))?;
        let stored = self.storage.insert(NewUpdate::from(content)).await?;
        info!(id = %stored.id, "published traffic update");

        Ok(Response::new(PublishResponse {
            update: Some(stored.into()),
        }))
    }

    async fn revise(
        &self,
        request: Request<ReviseRequest>,
    ) -> Result<Response<ReviseResponse>, Status> {
        let req = request.into_inner();
        let content = req
            .content
            .ok_or_else(|| Status::invalid_argument("content is required"))?;
        let stored = self.storage.revise(&req.id, NewUpdate::from(content)).await?;

        Ok(Response::new(ReviseResponse {
            update: Some(stored.into()),
        }))
    }

    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        let removed = self.storage.delete(&request.into_inner().id).await?;

        Ok(Response::new(DeleteResponse {
            removed: Some(removed.into()),
        }))
    }
}

pub fn create_server(storage: Arc<Storage>) -> TrafficStoreServer<TrafficStoreService> {
    TrafficStoreServer::new(TrafficStoreService::new(storage))
}
