//! What the presentation should show for a feed state and selection.

use crate::error::LoadError;
use crate::feed::{FeedState, LinkState};
use crate::record::TrafficUpdate;

pub const NO_UPDATES_YET: &str =
    "No traffic updates available yet. Updates will appear here as they come in.";

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView<'a> {
    Loading,
    /// Replaces the whole dashboard; there is no way to dismiss it.
    Failed(&'a LoadError),
    Empty(String),
    Updates(Vec<&'a TrafficUpdate>),
}

impl<'a> DashboardView<'a> {
    pub fn derive(state: &'a FeedState, selection: Option<&str>) -> Self {
        if let Some(error) = state.error() {
            return DashboardView::Failed(error);
        }
        if state.is_loading() {
            return DashboardView::Loading;
        }

        let updates = state.filtered(selection);
        if updates.is_empty() {
            return DashboardView::Empty(empty_message(selection));
        }

        DashboardView::Updates(updates)
    }
}

pub fn empty_message(selection: Option<&str>) -> String {
    match selection {
        Some(location) => format!("No traffic updates available for {location}."),
        None => NO_UPDATES_YET.to_string(),
    }
}

/// Notice to show next to the updates when they may be out of date.
pub fn staleness_notice(link: &LinkState) -> Option<String> {
    match link {
        LinkState::Lost { reason } => Some(format!(
            "Live updates interrupted ({reason}); the list may be out of date."
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedEvent;
    use chrono::Utc;

    #[test]
    fn loading_before_any_result() {
        let state = FeedState::default();

        assert_eq!(DashboardView::derive(&state, None), DashboardView::Loading);
    }

    #[test]
    fn error_replaces_everything() {
        let mut state = FeedState::default();
        state.apply(FeedEvent::LoadFailed(LoadError::Query("boom".into())));

        assert_eq!(
            DashboardView::derive(&state, Some("Gaza")),
            DashboardView::Failed(&LoadError::Query("boom".into()))
        );
    }

    #[test]
    fn empty_messages_depend_on_selection() {
        let mut state = FeedState::default();
        state.apply(FeedEvent::Loaded(Vec::new()));

        assert_eq!(
            DashboardView::derive(&state, None),
            DashboardView::Empty(NO_UPDATES_YET.to_string())
        );

        state.apply(FeedEvent::Inserted(
            TrafficUpdate::new("1", Utc::now(), "m").with_city("Jenin"),
        ));
        assert_eq!(
            DashboardView::derive(&state, Some("Gaza")),
            DashboardView::Empty("No traffic updates available for Gaza.".to_string())
        );
    }

    #[test]
    fn updates_are_filtered() {
        let mut state = FeedState::default();
        state.apply(FeedEvent::Loaded(vec![
            TrafficUpdate::new("1", Utc::now(), "a").with_city("Jenin"),
            TrafficUpdate::new("2", Utc::now(), "b").with_city("Gaza"),
        ]));

        match DashboardView::derive(&state, Some("Gaza")) {
            DashboardView::Updates(updates) => {
                assert_eq!(updates.len(), 1);
                assert_eq!(updates[0].id, "2");
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn lost_link_is_flagged() {
        assert!(staleness_notice(&LinkState::Live).is_none());
        assert!(
            staleness_notice(&LinkState::Lost {
                reason: "closed".into()
            })
            .unwrap()
            .contains("closed")
        );
    }
}
