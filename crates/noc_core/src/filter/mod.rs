use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::domain::Incident;
use crate::normalize::timestamps::parse_canonical;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeWindow {
    /// Same calendar day as the latest incident in the set (not the wall clock).
    Today,
    /// Wall clock minus seven days.
    Last7Days,
    #[default]
    All,
}

/// Status labels as offered by the dashboard's status selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusLabel {
    #[serde(rename = "Todos")]
    All,
    #[serde(rename = "Pendentes")]
    Pending,
    #[serde(rename = "Tratadas")]
    Treated,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    pub time_window: TimeWindow,
    /// Empty set means every market.
    pub markets: BTreeSet<String>,
    /// Empty set means every group.
    pub groups: BTreeSet<String>,
    /// Applied only when exactly one label is selected.
    pub statuses: BTreeSet<StatusLabel>,
}

/// Resolve the status selection into a pending/treated constraint.
///
/// Only a single selection constrains. Zero or several selections mean "no status filter",
/// not a union of the selected labels.
fn status_constraint(statuses: &BTreeSet<StatusLabel>) -> Option<bool> {
    if statuses.len() != 1 {
        return None;
    }
    match statuses.iter().next() {
        Some(StatusLabel::Pending) => Some(true),
        Some(StatusLabel::Treated) => Some(false),
        Some(StatusLabel::All) | None => None,
    }
}

/// Calendar-date prefix (`YYYY-MM-DD`) of the latest incident in the set.
fn latest_day_prefix(incidents: &[Incident]) -> Option<String> {
    let latest = incidents
        .iter()
        .max_by(|a, b| match (parse_canonical(&a.timestamp), parse_canonical(&b.timestamp)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.timestamp.cmp(&b.timestamp),
        })?;
    latest.timestamp.get(..10).map(str::to_string)
}

/// Narrow `incidents` by `criteria`, preserving relative order. `now` anchors `Last7Days`.
pub fn filter_incidents(
    incidents: &[Incident],
    criteria: &FilterCriteria,
    now: OffsetDateTime,
) -> Vec<Incident> {
    let day_prefix = match criteria.time_window {
        TimeWindow::Today => latest_day_prefix(incidents),
        _ => None,
    };
    let cutoff = now - Duration::days(7);
    let pending_only = status_constraint(&criteria.statuses);

    let out = incidents
        .iter()
        .filter(|inc| match criteria.time_window {
            TimeWindow::All => true,
            TimeWindow::Today => day_prefix
                .as_deref()
                .is_some_and(|p| inc.timestamp.starts_with(p)),
            TimeWindow::Last7Days => {
                parse_canonical(&inc.timestamp).is_some_and(|ts| ts >= cutoff)
            }
        })
        .filter(|inc| criteria.markets.is_empty() || criteria.markets.contains(&inc.market))
        .filter(|inc| criteria.groups.is_empty() || criteria.groups.contains(&inc.group))
        .filter(|inc| pending_only.map_or(true, |p| inc.is_pending() == p))
        .cloned()
        .collect::<Vec<_>>();

    debug!(
        input = incidents.len(),
        kept = out.len(),
        "filtered incidents"
    );
    out
}
