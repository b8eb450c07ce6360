//! Known locations and the map markers derived from the feed.

use serde::{Deserialize, Serialize};

use crate::record::TrafficUpdate;
use crate::status::{CheckpointTone, StatusKeywords, TrafficTone};

pub const OVERVIEW_CENTER: (f64, f64) = (31.9522, 35.2332);
pub const OVERVIEW_ZOOM: u8 = 9;
pub const LOCATION_ZOOM: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    City,
    Checkpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub kind: LocationKind,
    pub lat: f64,
    pub lon: f64,
}

/// Where the map should look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Focus {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

/// State of a plotted location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerStatus {
    /// No update mentions the city.
    Unknown,
    City {
        tone: TrafficTone,
        /// Route statuses of the newest update mentioning the city.
        summary: Vec<String>,
    },
    Checkpoint {
        tone: CheckpointTone,
        status: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker<'a> {
    pub location: &'a Location,
    pub status: MarkerStatus,
    /// Id of the update the status was taken from.
    pub source: Option<&'a str>,
}

/// Ordered set of locations the dashboard can plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gazetteer {
    locations: Vec<Location>,
}

fn place(name: &str, kind: LocationKind, lat: f64, lon: f64) -> Location {
    Location {
        name: name.to_string(),
        kind,
        lat,
        lon,
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        use LocationKind::{Checkpoint, City};

        Self::new(vec![
            place("Jerusalem", City, 31.7683, 35.2137),
            place("Ramallah", City, 31.9038, 35.2034),
            place("Nablus", City, 32.2211, 35.2544),
            place("Hebron", City, 31.5326, 35.0998),
            place("Gaza", City, 31.5017, 34.4668),
            place("Bethlehem", City, 31.7054, 35.2024),
            place("Tulkarm", City, 32.3104, 35.0286),
            place("Jenin", City, 32.4597, 35.2956),
            place("Jericho", City, 31.8667, 35.4500),
            place("Qalandia", Checkpoint, 31.8672, 35.2094),
            place("Huwara", Checkpoint, 32.1789, 35.2561),
            place("Container", Checkpoint, 31.7172, 35.2714),
            place("Beit El DCO", Checkpoint, 31.9272, 35.2167),
            place("Zatara", Checkpoint, 32.1711, 35.2503),
        ])
    }
}

impl Gazetteer {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Cities take precedence over checkpoints of the same name.
    pub fn find(&self, name: &str) -> Option<&Location> {
        self.locations
            .iter()
            .filter(|l| l.name == name)
            .min_by_key(|l| l.kind != LocationKind::City)
    }

    pub fn focus(&self, selection: Option<&str>) -> Focus {
        match selection.and_then(|name| self.find(name)) {
            Some(location) => Focus {
                lat: location.lat,
                lon: location.lon,
                zoom: LOCATION_ZOOM,
            },
            None => Focus {
                lat: OVERVIEW_CENTER.0,
                lon: OVERVIEW_CENTER.1,
                zoom: OVERVIEW_ZOOM,
            },
        }
    }

    /// Markers for every city, plus every checkpoint some update reports on.
    ///
    /// `updates` is expected newest first; each marker reflects the first
    /// update that concerns its location.
    pub fn markers<'a>(
        &'a self,
        updates: &'a [TrafficUpdate],
        keywords: &StatusKeywords,
    ) -> Vec<Marker<'a>> {
        self.locations
            .iter()
            .filter_map(|location| match location.kind {
                LocationKind::City => Some(city_marker(location, updates, keywords)),
                LocationKind::Checkpoint => checkpoint_marker(location, updates, keywords),
            })
            .collect()
    }
}

fn city_marker<'a>(
    location: &'a Location,
    updates: &'a [TrafficUpdate],
    keywords: &StatusKeywords,
) -> Marker<'a> {
    match updates.iter().find(|u| u.mentions_city(&location.name)) {
        Some(update) => Marker {
            location,
            status: MarkerStatus::City {
                tone: keywords.traffic_tone(update.traffic_statuses()),
                summary: update.traffic_statuses().map(str::to_string).collect(),
            },
            source: Some(update.id.as_str()),
        },
        None => Marker {
            location,
            status: MarkerStatus::Unknown,
            source: None,
        },
    }
}

fn checkpoint_marker<'a>(
    location: &'a Location,
    updates: &'a [TrafficUpdate],
    keywords: &StatusKeywords,
) -> Option<Marker<'a>> {
    updates.iter().find_map(|update| {
        update.checkpoint(&location.name).map(|status| Marker {
            location,
            status: MarkerStatus::Checkpoint {
                tone: keywords.checkpoint_tone(status),
                status: status.to_string(),
            },
            source: Some(update.id.as_str()),
        })
    })
}
