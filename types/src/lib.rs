//! Protobuf contract of the traffic record store.
//!
//! Optional sequences and maps are wrapped in [`traffic::StringList`] and
//! [`traffic::StatusMap`] so that "absent" and "empty" stay distinguishable
//! on the wire.

use std::collections::BTreeMap;

pub mod traffic {
    tonic::include_proto!("traffic");
}

/// Metadata key carrying the store-specific error code on a failed call.
pub const STORE_CODE_METADATA: &str = "store-code";

/// Store code for "relation does not exist".
pub const UNDEFINED_TABLE: &str = "42P01";

impl From<Vec<String>> for traffic::StringList {
    fn from(items: Vec<String>) -> Self {
        Self { items }
    }
}

impl From<traffic::StringList> for Vec<String> {
    fn from(list: traffic::StringList) -> Self {
        list.items
    }
}

impl From<BTreeMap<String, String>> for traffic::StatusMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(name, status)| traffic::StatusEntry { name, status })
                .collect(),
        }
    }
}

impl From<traffic::StatusMap> for BTreeMap<String, String> {
    fn from(map: traffic::StatusMap) -> Self {
        map.entries
            .into_iter()
            .map(|entry| (entry.name, entry.status))
            .collect()
    }
}
