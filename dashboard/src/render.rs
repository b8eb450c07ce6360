//! Plain-text rendering of the dashboard.

use std::fmt::Write;

use chrono::{DateTime, Datelike, Timelike, Utc};
use traffic_feed::{
    CheckpointTone, DashboardView, FeedState, Focus, Marker, MarkerStatus, StatusKeywords,
    TrafficTone, TrafficUpdate, staleness_notice,
};

use crate::error::Error;

const SETUP_HINT: &str =
    "Please make sure the traffic store is running and its database is properly set up.";

const MINUTES_IN_DAY: i64 = 1_440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2_520;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// Distance between `then` and `now` in words, e.g. "5 minutes ago" or
/// "in about 2 hours".
///
/// Thresholds follow date-fns `formatDistanceToNow` without seconds.
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let (earlier, later) = if then <= now { (then, now) } else { (now, then) };
    let seconds = later.signed_duration_since(earlier).num_seconds();
    let minutes = rounded_div(seconds, 60);

    let distance = if minutes < 2 {
        if minutes == 0 {
            "less than a minute".to_string()
        } else {
            "1 minute".to_string()
        }
    } else if minutes < 45 {
        format!("{minutes} minutes")
    } else if minutes < 90 {
        "about 1 hour".to_string()
    } else if minutes < MINUTES_IN_DAY {
        format!("about {} hours", rounded_div(minutes, 60))
    } else if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        "1 day".to_string()
    } else if minutes < MINUTES_IN_MONTH {
        plural(rounded_div(minutes, MINUTES_IN_DAY), "day", "")
    } else if minutes < MINUTES_IN_TWO_MONTHS {
        plural(rounded_div(minutes, MINUTES_IN_MONTH), "month", "about ")
    } else {
        let months = calendar_months(earlier, later);
        if months < 12 {
            plural(rounded_div(minutes, MINUTES_IN_MONTH), "month", "")
        } else {
            let years = months / 12;
            match months % 12 {
                0..=2 => plural(years, "year", "about "),
                3..=8 => plural(years, "year", "over "),
                _ => plural(years + 1, "year", "almost "),
            }
        }
    };

    if then > now {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

/// `value / divisor` rounded half up, for non-negative values.
fn rounded_div(value: i64, divisor: i64) -> i64 {
    (value + divisor / 2) / divisor
}

fn plural(count: i64, unit: &str, prefix: &str) -> String {
    if count == 1 {
        format!("{prefix}1 {unit}")
    } else {
        format!("{prefix}{count} {unit}s")
    }
}

/// Whole calendar months from `earlier` to `later`.
fn calendar_months(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let mut months = i64::from(later.year() - earlier.year()) * 12
        + i64::from(later.month())
        - i64::from(earlier.month());
    let later_in_month = (later.day(), later.num_seconds_from_midnight());
    let earlier_in_month = (earlier.day(), earlier.num_seconds_from_midnight());
    if months > 0 && later_in_month < earlier_in_month {
        months -= 1;
    }
    months
}

fn checkpoint_label(tone: CheckpointTone) -> &'static str {
    match tone {
        CheckpointTone::Open => "open",
        CheckpointTone::Closed => "closed",
        CheckpointTone::Other => "other",
    }
}

fn traffic_label(tone: TrafficTone) -> &'static str {
    match tone {
        TrafficTone::Congested => "congested",
        TrafficTone::Moderate => "moderate",
        TrafficTone::Flowing => "flowing",
    }
}

pub fn render_card(update: &TrafficUpdate, keywords: &StatusKeywords, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Traffic Update · {}", relative_age(update.timestamp, now));

    if let Some(cities) = update.cities.as_ref().filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "  Cities Affected: {}", cities.join(", "));
    }

    if let Some(routes) = update.traffic_status.as_ref().filter(|r| !r.is_empty()) {
        let _ = writeln!(out, "  Traffic Conditions:");
        for (route, status) in routes {
            let _ = writeln!(out, "    {route}: {status}");
        }
    }

    if let Some(checkpoints) = update.checkpoint_status.as_ref().filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "  Checkpoint Status:");
        for (checkpoint, status) in checkpoints {
            let tone = checkpoint_label(keywords.checkpoint_tone(status));
            let _ = writeln!(out, "    {checkpoint}: {status} [{tone}]");
        }
    }

    if let Some(incidents) = update.incidents.as_ref().filter(|i| !i.is_empty()) {
        let _ = writeln!(out, "  Incidents:");
        for incident in incidents {
            let _ = writeln!(out, "    - {incident}");
        }
    }

    let _ = writeln!(out, "  Original Message:");
    let _ = writeln!(out, "    {}", update.message);
    out
}

pub fn render_dashboard(
    state: &FeedState,
    selection: Option<&str>,
    keywords: &StatusKeywords,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    match DashboardView::derive(state, selection) {
        DashboardView::Loading => out.push_str("Loading traffic updates...\n"),
        DashboardView::Failed(error) => {
            let _ = writeln!(out, "Error!\n  {error}\n\n{SETUP_HINT}");
        }
        view => {
            if let Some(notice) = staleness_notice(state.link()) {
                let _ = writeln!(out, "! {notice}\n");
            }
            if let Some(location) = selection {
                let _ = writeln!(out, "Showing updates for: {location}\n");
            }
            match view {
                DashboardView::Empty(message) => {
                    let _ = writeln!(out, "{message}");
                }
                DashboardView::Updates(updates) => {
                    let cards: Vec<_> = updates
                        .iter()
                        .map(|update| render_card(update, keywords, now))
                        .collect();
                    out.push_str(&cards.join("\n"));
                }
                DashboardView::Loading | DashboardView::Failed(_) => {}
            }
        }
    }

    out
}

/// The load failure recorded in `state`, as an error for the caller's exit status.
pub fn load_outcome(state: &FeedState) -> Result<(), Error> {
    match state.error() {
        Some(error) => Err(Error::Load(error.clone())),
        None => Ok(()),
    }
}

pub fn render_overview(focus: Focus, markers: &[Marker<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Map focus: {:.4}, {:.4} (zoom {})",
        focus.lat, focus.lon, focus.zoom
    );

    for marker in markers {
        let location = marker.location;
        let line = match &marker.status {
            MarkerStatus::Unknown => "no recent updates".to_string(),
            MarkerStatus::City { tone, summary } if summary.is_empty() => {
                traffic_label(*tone).to_string()
            }
            MarkerStatus::City { tone, summary } => {
                format!("{}: {}", traffic_label(*tone), summary.join(", "))
            }
            MarkerStatus::Checkpoint { tone, status } => {
                format!("{}: {status}", checkpoint_label(*tone))
            }
        };
        let _ = writeln!(
            out,
            "  {:<12} ({:.4}, {:.4})  {line}",
            location.name, location.lat, location.lon
        );
    }

    out
}
