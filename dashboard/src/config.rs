//! Dashboard configuration file.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};
use traffic_feed::{Gazetteer, StatusKeywords};

use crate::error::Error;

pub const DEFAULT_STORE_ADDRESS: &str = "localhost:50051";

/// Settings read from the dashboard's TOML file. Every key is optional.
///
/// ```toml
/// store_address = "localhost:50051"
///
/// [keywords]
/// closed = ["closed", "مغلق"]
///
/// [[locations]]
/// name = "Ramallah"
/// kind = "city"
/// lat = 31.9038
/// lon = 35.2034
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub store_address: String,
    pub keywords: StatusKeywords,
    pub locations: Gazetteer,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            store_address: DEFAULT_STORE_ADDRESS.to_string(),
            keywords: StatusKeywords::default(),
            locations: Gazetteer::default(),
        }
    }
}

/// Reads the config file at `path`, or returns the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<DashboardConfig, Error> {
    let Some(path) = path else {
        debug!("no config file given, using defaults");
        return Ok(DashboardConfig::default());
    };

    let text = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let config: DashboardConfig = toml::from_str(&text).map_err(|source| Error::ParseConfig {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), store = %config.store_address, "loaded dashboard config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use traffic_feed::LocationKind;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn no_path_gives_defaults() {
        assert_eq!(load_config(None).unwrap(), DashboardConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"
            store_address = "10.0.0.5:50051"

            [keywords]
            closed = ["closed", "مغلق"]
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.store_address, "10.0.0.5:50051");
        assert_eq!(config.keywords.closed, vec!["closed", "مغلق"]);
        assert_eq!(config.keywords.open, StatusKeywords::default().open);
        assert_eq!(config.locations, Gazetteer::default());
    }

    #[test]
    fn locations_replace_the_gazetteer() {
        let file = write_config(
            r#"
            [[locations]]
            name = "Eyal"
            kind = "checkpoint"
            lat = 32.2
            lon = 34.98
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();
        let locations = config.locations.locations();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].kind, LocationKind::Checkpoint);
    }

    #[test]
    fn unreadable_and_invalid_files_are_errors() {
        let missing = load_config(Some(Path::new("/nonexistent/dashboard.toml")));
        assert!(matches!(missing, Err(Error::ReadConfig { .. })));

        let file = write_config("store_address = [");
        assert!(matches!(
            load_config(Some(file.path())),
            Err(Error::ParseConfig { .. })
        ));
    }
}
