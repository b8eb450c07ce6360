//! Location filter over a list of updates.

use crate::record::TrafficUpdate;

/// Whether `update` concerns `location`, either as an affected city or as a
/// checkpoint with a reported status. Names are compared exactly.
pub fn concerns(update: &TrafficUpdate, location: &str) -> bool {
    update.mentions_city(location) || update.checkpoint(location).is_some()
}

/// Updates relevant to `selection`, in input order.
///
/// Without a selection every update is returned.
pub fn filter<'a>(updates: &'a [TrafficUpdate], selection: Option<&str>) -> Vec<&'a TrafficUpdate> {
    match selection {
        None => updates.iter().collect(),
        Some(location) => updates
            .iter()
            .filter(|update| concerns(update, location))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample() -> Vec<TrafficUpdate> {
        let t1 = Utc::now() - Duration::minutes(10);
        let t2 = Utc::now();
        vec![
            TrafficUpdate::new("1", t2, "traffic in Ramallah").with_city("Ramallah"),
            TrafficUpdate::new("2", t1, "Qalandia open").with_checkpoint("Qalandia", "Open"),
        ]
    }

    fn ids(filtered: &[&TrafficUpdate]) -> Vec<String> {
        filtered.iter().map(|u| u.id.clone()).collect()
    }

    #[test]
    fn no_selection_is_identity() {
        let updates = sample();
        let filtered = filter(&updates, None);

        assert_eq!(filtered.len(), updates.len());
        assert!(filtered.iter().zip(&updates).all(|(a, b)| *a == b));
    }

    #[test]
    fn selects_by_city_or_checkpoint() {
        let updates = sample();

        assert_eq!(ids(&filter(&updates, Some("Ramallah"))), vec!["1"]);
        assert_eq!(ids(&filter(&updates, Some("Qalandia"))), vec!["2"]);
        assert!(filter(&updates, Some("Gaza")).is_empty());
    }

    #[test]
    fn match_is_case_sensitive() {
        let updates = sample();

        assert!(filter(&updates, Some("ramallah")).is_empty());
        assert!(filter(&updates, Some("QALANDIA")).is_empty());
    }

    #[test]
    fn route_names_do_not_match() {
        let updates = vec![
            TrafficUpdate::new("3", Utc::now(), "road").with_route("Jenin", "heavy traffic"),
        ];

        assert!(filter(&updates, Some("Jenin")).is_empty());
    }

    #[test]
    fn preserves_input_order() {
        let now = Utc::now();
        let updates = vec![
            TrafficUpdate::new("a", now, "x").with_city("Hebron"),
            TrafficUpdate::new("b", now, "y").with_city("Jericho"),
            TrafficUpdate::new("c", now, "z")
                .with_city("Jericho")
                .with_checkpoint("Hebron", "Closed"),
        ];

        assert_eq!(ids(&filter(&updates, Some("Hebron"))), vec!["a", "c"]);
    }
}
