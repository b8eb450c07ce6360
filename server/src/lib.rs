//! Record store for traffic and checkpoint status updates.
//!
//! Updates live in a sqlite table next to an append-only change log. The gRPC
//! service answers bulk queries and streams every committed change to
//! subscribers.

pub mod db;
pub mod grpc;
pub mod models;
pub mod storage;
