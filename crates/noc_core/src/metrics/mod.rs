use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::domain::{is_known, Incident};
use crate::normalize::timestamps::parse_canonical;

const DEFAULT_HOUR: &str = "00:00";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvolutionPoint {
    pub time: String,
    pub val: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechShare {
    pub name: String,
    pub value: i64,
    pub color: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Critical,
    Pending,
}

/// Display projection of one incident for the "recent alerts" cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentIncident {
    pub id: String,
    pub title: String,
    pub location: String,
    pub time: String,
    pub status: DisplayStatus,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CauseCell {
    pub cause: String,
    pub count: i64,
    pub percent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CityFailures {
    pub city: String,
    pub total: i64,
    /// One cell per global top cause, in column order, zero-filled.
    pub stats: Vec<CauseCell>,
    /// The city's own most frequent cause; may be absent from `stats`.
    pub top_failure: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutageKind {
    #[serde(rename = "SEM SINAL")]
    SignalLoss,
    #[serde(rename = "DEGRADAÇÃO")]
    Degradation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outage {
    /// City, or market when the city is unknown.
    pub market: String,
    #[serde(rename = "type")]
    pub kind: OutageKind,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total: i64,
    pub pending: i64,
    pub treated: i64,
    pub efficiency: String,
    pub evolution_data: Vec<EvolutionPoint>,
    pub tech_data: Vec<TechShare>,
    pub recent_incidents: Vec<RecentIncident>,
    pub top_cities: Vec<CityFailures>,
    pub outages: Vec<Outage>,
    pub available_markets: Vec<String>,
    pub available_groups: Vec<String>,
    pub available_statuses: Vec<String>,
}

/// `round(part / whole * 100)`, rounding halves up; 0 when `whole` is 0.
fn percent(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    (part * 200 + whole) / (whole * 2)
}

/// Two characters after the date/time separator, when both are digits.
fn hour_of(timestamp: &str) -> Option<&str> {
    let (_, time) = timestamp.split_once('T')?;
    let hh = time.get(..2)?;
    hh.bytes().all(|b| b.is_ascii_digit()).then_some(hh)
}

fn hour_label(timestamp: &str) -> String {
    hour_of(timestamp)
        .map(|hh| format!("{hh}:00"))
        .unwrap_or_else(|| DEFAULT_HOUR.to_string())
}

fn clock_label(timestamp: &str) -> String {
    timestamp
        .split_once('T')
        .and_then(|(_, time)| time.get(..5))
        .unwrap_or(DEFAULT_HOUR)
        .to_string()
}

/// Grouping key for failure statistics: cause, then category, then the configured fallback.
fn failure_key(inc: &Incident, config: &EngineConfig) -> String {
    if is_known(&inc.cause) {
        inc.cause.clone()
    } else if is_known(&inc.category) {
        inc.category.clone()
    } else {
        config.fallback_cause.clone()
    }
}

fn location_key(inc: &Incident) -> String {
    if is_known(&inc.city) {
        inc.city.clone()
    } else {
        inc.market.clone()
    }
}

/// Keys ordered by count descending, then key ascending.
fn stable_top_n_by_count(map: &BTreeMap<String, i64>, n: usize) -> Vec<(String, i64)> {
    let mut items = map
        .iter()
        .map(|(k, c)| (k.clone(), *c))
        .collect::<Vec<_>>();
    items.sort_by(|a, b| (-(a.1), &a.0).cmp(&(-(b.1), &b.0)));
    items.truncate(n);
    items
}

fn build_evolution(incidents: &[Incident]) -> Vec<EvolutionPoint> {
    let mut by_hour: BTreeMap<String, i64> = BTreeMap::new();
    for inc in incidents {
        *by_hour.entry(hour_label(&inc.timestamp)).or_default() += 1;
    }
    // BTreeMap iteration is already the lexicographic label order.
    by_hour
        .into_iter()
        .map(|(time, val)| EvolutionPoint { time, val })
        .collect()
}

fn build_tech_data(
    failure_counts: &BTreeMap<String, i64>,
    total: i64,
    config: &EngineConfig,
) -> Vec<TechShare> {
    // Percent is monotonic in count, so count order is percent order.
    stable_top_n_by_count(failure_counts, config.tech_top_n)
        .into_iter()
        .enumerate()
        .map(|(rank, (name, count))| TechShare {
            name,
            value: percent(count, total),
            color: config.color_for_rank(rank),
        })
        .collect()
}

fn build_recent(incidents: &[Incident], config: &EngineConfig) -> Vec<RecentIncident> {
    let marker = config.critical_marker.to_lowercase();
    incidents
        .iter()
        .take(config.recent_limit)
        .map(|inc| RecentIncident {
            id: format!("INC-{}", inc.id),
            title: inc.category.clone(),
            location: format!("{} - {}", inc.city, inc.market),
            time: clock_label(&inc.timestamp),
            status: if !marker.is_empty() && inc.nature.to_lowercase().contains(&marker) {
                DisplayStatus::Critical
            } else {
                DisplayStatus::Pending
            },
            kind: inc.cause.clone(),
        })
        .collect()
}

fn build_top_cities(
    incidents: &[Incident],
    failure_counts: &BTreeMap<String, i64>,
    config: &EngineConfig,
) -> Vec<CityFailures> {
    let mut city_totals: BTreeMap<String, i64> = BTreeMap::new();
    let mut city_causes: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
    for inc in incidents {
        *city_totals.entry(inc.city.clone()).or_default() += 1;
        *city_causes
            .entry(inc.city.clone())
            .or_default()
            .entry(failure_key(inc, config))
            .or_default() += 1;
    }

    let columns = stable_top_n_by_count(failure_counts, config.matrix_columns)
        .into_iter()
        .map(|(cause, _)| cause)
        .collect::<Vec<_>>();

    stable_top_n_by_count(&city_totals, config.city_top_n)
        .into_iter()
        .map(|(city, total)| {
            let causes = city_causes.get(&city).cloned().unwrap_or_default();
            let stats = columns
                .iter()
                .map(|cause| {
                    let count = causes.get(cause).copied().unwrap_or(0);
                    CauseCell {
                        cause: cause.clone(),
                        count,
                        percent: percent(count, total),
                    }
                })
                .collect();
            let top_failure = stable_top_n_by_count(&causes, 1)
                .into_iter()
                .next()
                .map(|(cause, _)| cause)
                .unwrap_or_else(|| config.fallback_cause.clone());
            CityFailures {
                city,
                total,
                stats,
                top_failure,
            }
        })
        .collect()
}

/// Frequency-threshold outage detection.
///
/// A location is an outage once it accumulates `outage_threshold` signal-loss or
/// degradation incidents. This is deliberately a plain count, not an anomaly test.
/// Incidents are visited in ascending timestamp order so the classification never depends
/// on arrival order; a location seen with signal loss stays signal loss.
fn detect_outages(incidents: &[Incident], config: &EngineConfig) -> Vec<Outage> {
    let signal_loss = config.signal_loss_pattern.to_uppercase();
    let degradation = config.degradation_pattern.to_uppercase();

    let mut ordered = incidents.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|inc| parse_canonical(&inc.timestamp));

    let mut by_location: BTreeMap<String, (OutageKind, i64)> = BTreeMap::new();
    for inc in ordered {
        let cause = inc.cause.to_uppercase();
        let kind = if !signal_loss.is_empty() && cause.contains(&signal_loss) {
            OutageKind::SignalLoss
        } else if !degradation.is_empty() && cause.contains(&degradation) {
            OutageKind::Degradation
        } else {
            continue;
        };

        let entry = by_location
            .entry(location_key(inc))
            .or_insert((kind, 0));
        entry.1 += 1;
        if kind == OutageKind::SignalLoss {
            entry.0 = OutageKind::SignalLoss;
        }
    }

    let threshold = config.outage_threshold as i64;
    let mut outages = by_location
        .into_iter()
        .filter(|(_, (_, count))| *count >= threshold)
        .map(|(market, (kind, count))| Outage {
            market,
            kind,
            count,
        })
        .collect::<Vec<_>>();
    outages.sort_by(|a, b| (-(a.count), &a.market).cmp(&(-(b.count), &b.market)));
    outages
}

/// Compute the dashboard snapshot with the production constants.
pub fn compute_metrics(incidents: &[Incident]) -> MetricsSnapshot {
    compute_metrics_with(incidents, &EngineConfig::default())
}

/// Compute every derived dashboard view from scratch.
///
/// Deterministic and total: the empty input yields zero counts, `"0%"` and empty lists.
/// `recent_incidents` takes the first incidents in input order; callers wanting recency
/// must sort first.
pub fn compute_metrics_with(incidents: &[Incident], config: &EngineConfig) -> MetricsSnapshot {
    let total = incidents.len() as i64;
    let pending = incidents.iter().filter(|i| i.is_pending()).count() as i64;
    let treated = total - pending;
    debug_assert!(pending >= 0 && treated >= 0);
    debug_assert_eq!(pending + treated, total);

    let efficiency = format!("{}%", percent(treated, total));

    let mut failure_counts: BTreeMap<String, i64> = BTreeMap::new();
    let mut markets = BTreeSet::new();
    let mut groups = BTreeSet::new();
    for inc in incidents {
        *failure_counts.entry(failure_key(inc, config)).or_default() += 1;
        markets.insert(inc.market.clone());
        groups.insert(inc.group.clone());
    }

    let snapshot = MetricsSnapshot {
        total,
        pending,
        treated,
        efficiency,
        evolution_data: build_evolution(incidents),
        tech_data: build_tech_data(&failure_counts, total, config),
        recent_incidents: build_recent(incidents, config),
        top_cities: build_top_cities(incidents, &failure_counts, config),
        outages: detect_outages(incidents, config),
        available_markets: markets.into_iter().collect(),
        available_groups: groups.into_iter().collect(),
        available_statuses: config.statuses.clone(),
    };

    debug!(
        total,
        pending,
        outages = snapshot.outages.len(),
        "computed metrics snapshot"
    );
    snapshot
}
