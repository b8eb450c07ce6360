//! The update record as seen by the feed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use traffic_types::traffic;

use crate::error::StoreError;

/// One traffic/checkpoint status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficUpdate {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Original-language text of the report.
    pub message: String,
    pub cities: Option<Vec<String>>,
    /// Route name to status.
    pub traffic_status: Option<BTreeMap<String, String>>,
    /// Checkpoint name to status.
    pub checkpoint_status: Option<BTreeMap<String, String>>,
    pub incidents: Option<Vec<String>>,
}

impl TrafficUpdate {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            message: message.into(),
            cities: None,
            traffic_status: None,
            checkpoint_status: None,
            incidents: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.cities.get_or_insert_with(Vec::new).push(city.into());
        self
    }

    pub fn with_route(mut self, route: impl Into<String>, status: impl Into<String>) -> Self {
        self.traffic_status
            .get_or_insert_with(BTreeMap::new)
            .insert(route.into(), status.into());
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: impl Into<String>, status: impl Into<String>) -> Self {
        self.checkpoint_status
            .get_or_insert_with(BTreeMap::new)
            .insert(checkpoint.into(), status.into());
        self
    }

    pub fn with_incident(mut self, incident: impl Into<String>) -> Self {
        self.incidents.get_or_insert_with(Vec::new).push(incident.into());
        self
    }

    pub fn mentions_city(&self, city: &str) -> bool {
        self.cities
            .as_ref()
            .is_some_and(|cities| cities.iter().any(|c| c == city))
    }

    pub fn checkpoint(&self, checkpoint: &str) -> Option<&str> {
        self.checkpoint_status
            .as_ref()
            .and_then(|statuses| statuses.get(checkpoint))
            .map(String::as_str)
    }

    pub fn checkpoint_names(&self) -> impl Iterator<Item = &str> {
        self.checkpoint_status
            .iter()
            .flat_map(|statuses| statuses.keys().map(String::as_str))
    }

    pub fn traffic_statuses(&self) -> impl Iterator<Item = &str> {
        self.traffic_status
            .iter()
            .flat_map(|statuses| statuses.values().map(String::as_str))
    }
}

impl TryFrom<traffic::TrafficUpdate> for TrafficUpdate {
    type Error = StoreError;

    fn try_from(update: traffic::TrafficUpdate) -> Result<Self, Self::Error> {
        let timestamp = DateTime::from_timestamp_millis(update.timestamp).ok_or_else(|| {
            StoreError::Malformed(format!(
                "update {} has timestamp {} out of range",
                update.id, update.timestamp
            ))
        })?;

        Ok(Self {
            id: update.id,
            timestamp,
            message: update.message,
            cities: update.cities.map(Into::into),
            traffic_status: update.traffic_status.map(Into::into),
            checkpoint_status: update.checkpoint_status.map(Into::into),
            incidents: update.incidents.map(Into::into),
        })
    }
}

/// Content of an update to be published; the store assigns id and timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub message: String,
    pub cities: Option<Vec<String>>,
    pub traffic_status: Option<BTreeMap<String, String>>,
    pub checkpoint_status: Option<BTreeMap<String, String>>,
    pub incidents: Option<Vec<String>>,
}

impl From<Draft> for traffic::UpdateContent {
    fn from(draft: Draft) -> Self {
        Self {
            message: draft.message,
            cities: draft.cities.map(Into::into),
            traffic_status: draft.traffic_status.map(Into::into),
            checkpoint_status: draft.checkpoint_status.map(Into::into),
            incidents: draft.incidents.map(Into::into),
        }
    }
}
