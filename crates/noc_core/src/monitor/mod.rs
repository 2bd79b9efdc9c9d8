use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::MonitorRules;
use crate::domain::RawRow;
use crate::normalize::first_text;

/// Secondary monitoring feeds shown next to the incident dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum MonitorFeed {
    NewMonitor,
    #[serde(rename = "SGO")]
    Sgo,
}

impl MonitorFeed {
    pub fn label(self) -> &'static str {
        match self {
            MonitorFeed::NewMonitor => "NewMonitor",
            MonitorFeed::Sgo => "SGO",
        }
    }

    pub fn default_rules(self) -> MonitorRules {
        match self {
            MonitorFeed::NewMonitor => MonitorRules::new_monitor(),
            MonitorFeed::Sgo => MonitorRules::sgo(),
        }
    }
}

/// One row of the monitor table, tagged with the feed it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorRow {
    pub id: String,
    pub source: MonitorFeed,
    pub title: String,
    pub location: String,
    pub status: String,
    pub time: String,
}

/// Map one feed's raw rows onto monitor rows.
///
/// Every field falls back to the feed's default. A row without an id gets
/// `<feed>-<index>` so ids stay stable across refreshes of the same payload. A row
/// without a time shows the `now` clock (`HH:MM:SS`, UTC).
pub fn normalize_monitor_rows_at(
    rows: &[RawRow],
    feed: MonitorFeed,
    rules: &MonitorRules,
    now: OffsetDateTime,
) -> Vec<MonitorRow> {
    let clock = now
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default();

    let out = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| MonitorRow {
            id: first_text(row, &rules.id)
                .unwrap_or_else(|| format!("{}-{idx}", feed.label())),
            source: feed,
            title: first_text(row, &rules.title).unwrap_or_else(|| rules.default_title.clone()),
            location: first_text(row, &rules.location)
                .unwrap_or_else(|| rules.default_location.clone()),
            status: first_text(row, &rules.status)
                .unwrap_or_else(|| rules.default_status.clone()),
            time: first_text(row, &rules.time).unwrap_or_else(|| clock.clone()),
        })
        .collect::<Vec<_>>();

    debug!(feed = feed.label(), rows = out.len(), "normalized monitor rows");
    out
}
