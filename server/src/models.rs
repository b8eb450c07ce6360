use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use traffic_types::traffic;

/// A persisted traffic update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUpdate {
    pub id: String,
    pub message: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub cities: Option<Vec<String>>,
    pub traffic_status: Option<BTreeMap<String, String>>,
    pub checkpoint_status: Option<BTreeMap<String, String>>,
    pub incidents: Option<Vec<String>>,
}

/// Content of an update as supplied by a publisher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUpdate {
    pub message: String,
    pub cities: Option<Vec<String>>,
    pub traffic_status: Option<BTreeMap<String, String>>,
    pub checkpoint_status: Option<BTreeMap<String, String>>,
    pub incidents: Option<Vec<String>>,
}

impl StoredUpdate {
    pub fn new(content: NewUpdate) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), content)
    }

    pub fn with_id(id: String, content: NewUpdate) -> Self {
        Self {
            id,
            message: content.message,
            timestamp: Utc::now().timestamp_millis(),
            cities: content.cities,
            traffic_status: content.traffic_status,
            checkpoint_status: content.checkpoint_status,
            incidents: content.incidents,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(ChangeKind::Insert),
            "update" => Ok(ChangeKind::Update),
            "delete" => Ok(ChangeKind::Delete),
            other => Err(format!("unknown change kind {other:?}")),
        }
    }
}

impl From<ChangeKind> for traffic::ChangeKind {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Insert => traffic::ChangeKind::Insert,
            ChangeKind::Update => traffic::ChangeKind::Update,
            ChangeKind::Delete => traffic::ChangeKind::Delete,
        }
    }
}

/// One entry of the change log.
#[derive(Debug, Clone)]
pub struct Change {
    pub ordinal: u64,
    pub kind: ChangeKind,
    pub update: StoredUpdate,
}

impl From<StoredUpdate> for traffic::TrafficUpdate {
    fn from(update: StoredUpdate) -> Self {
        Self {
            id: update.id,
            timestamp: update.timestamp,
            message: update.message,
            cities: update.cities.map(Into::into),
            traffic_status: update.traffic_status.map(Into::into),
            checkpoint_status: update.checkpoint_status.map(Into::into),
            incidents: update.incidents.map(Into::into),
        }
    }
}

impl From<traffic::UpdateContent> for NewUpdate {
    fn from(content: traffic::UpdateContent) -> Self {
        Self {
            message: content.message,
            cities: content.cities.map(Into::into),
            traffic_status: content.traffic_status.map(Into::into),
            checkpoint_status: content.checkpoint_status.map(Into::into),
            incidents: content.incidents.map(Into::into),
        }
    }
}

impl From<Change> for traffic::ChangeEvent {
    fn from(change: Change) -> Self {
        Self {
            ordinal: change.ordinal,
            kind: traffic::ChangeKind::from(change.kind) as i32,
            record: Some(change.update.into()),
        }
    }
}
