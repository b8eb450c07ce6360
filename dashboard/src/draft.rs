//! Building a publishable update from command-line values.

use std::collections::BTreeMap;

use traffic_feed::Draft;

use crate::error::Error;

/// Parses `NAME=STATUS` pairs. No values means the map is absent.
pub fn parse_status_pairs(
    flag: &'static str,
    values: &[String],
) -> Result<Option<BTreeMap<String, String>>, Error> {
    if values.is_empty() {
        return Ok(None);
    }

    values
        .iter()
        .map(|value| {
            value
                .split_once('=')
                .map(|(name, status)| (name.trim(), status.trim()))
                .filter(|(name, status)| !name.is_empty() && !status.is_empty())
                .map(|(name, status)| (name.to_string(), status.to_string()))
                .ok_or_else(|| Error::StatusPair {
                    flag,
                    value: value.clone(),
                })
        })
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(Some)
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

pub fn build_draft(
    message: String,
    cities: Vec<String>,
    routes: &[String],
    checkpoints: &[String],
    incidents: Vec<String>,
) -> Result<Draft, Error> {
    if message.trim().is_empty() {
        return Err(Error::EmptyMessage);
    }

    Ok(Draft {
        message,
        cities: non_empty(cities),
        traffic_status: parse_status_pairs("route", routes)?,
        checkpoint_status: parse_status_pairs("checkpoint", checkpoints)?,
        incidents: non_empty(incidents),
    })
}
