//! Keyword classification of free-text statuses.

use serde::{Deserialize, Serialize};

/// How a checkpoint status reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointTone {
    Open,
    Closed,
    Other,
}

/// How the traffic on a set of routes reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficTone {
    Congested,
    Moderate,
    Flowing,
}

/// Keyword lists used to classify statuses. Matching is a case-insensitive
/// substring search, so keywords should be lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusKeywords {
    pub open: Vec<String>,
    pub closed: Vec<String>,
    pub congested: Vec<String>,
    pub moderate: Vec<String>,
}

impl Default for StatusKeywords {
    fn default() -> Self {
        Self {
            open: words(&["open"]),
            closed: words(&["closed"]),
            congested: words(&["heavy", "closed"]),
            moderate: words(&["moderate"]),
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| !keyword.is_empty() && haystack.contains(&keyword.to_lowercase()))
}

impl StatusKeywords {
    /// "open" keywords win over "closed" ones, so "reopened after closure"
    /// reads as open.
    pub fn checkpoint_tone(&self, status: &str) -> CheckpointTone {
        let status = status.to_lowercase();
        if contains_any(&status, &self.open) {
            CheckpointTone::Open
        } else if contains_any(&status, &self.closed) {
            CheckpointTone::Closed
        } else {
            CheckpointTone::Other
        }
    }

    pub fn traffic_tone<'a>(&self, statuses: impl IntoIterator<Item = &'a str>) -> TrafficTone {
        let joined = statuses
            .into_iter()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if contains_any(&joined, &self.congested) {
            TrafficTone::Congested
        } else if contains_any(&joined, &self.moderate) {
            TrafficTone::Moderate
        } else {
            TrafficTone::Flowing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_tones() {
        let keywords = StatusKeywords::default();

        assert_eq!(keywords.checkpoint_tone("Open"), CheckpointTone::Open);
        assert_eq!(keywords.checkpoint_tone("CLOSED since morning"), CheckpointTone::Closed);
        assert_eq!(keywords.checkpoint_tone("reopened after closure"), CheckpointTone::Open);
        assert_eq!(keywords.checkpoint_tone("crowded"), CheckpointTone::Other);
    }

    #[test]
    fn traffic_tones() {
        let keywords = StatusKeywords::default();

        assert_eq!(keywords.traffic_tone(["Heavy traffic", "clear"]), TrafficTone::Congested);
        assert_eq!(keywords.traffic_tone(["road closed"]), TrafficTone::Congested);
        assert_eq!(keywords.traffic_tone(["Moderate"]), TrafficTone::Moderate);
        assert_eq!(keywords.traffic_tone(["smooth"]), TrafficTone::Flowing);
        assert_eq!(keywords.traffic_tone(std::iter::empty::<&str>()), TrafficTone::Flowing);
    }

    #[test]
    fn custom_vocabulary() {
        let keywords = StatusKeywords {
            open: words(&["مفتوح"]),
            closed: words(&["مغلق"]),
            ..StatusKeywords::default()
        };

        assert_eq!(keywords.checkpoint_tone("الحاجز مغلق"), CheckpointTone::Closed);
        assert_eq!(keywords.checkpoint_tone("Open"), CheckpointTone::Other);
    }
}
