use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

use noc_core::config::{EngineConfig, FieldRules};
use noc_core::domain::RawRow;
use noc_core::error::AppError;
use noc_core::filter::{FilterCriteria, StatusLabel};
use noc_source::{IncidentSource, RefreshCycle};
use pretty_assertions::assert_eq;
use serde_json::json;
use time::macros::datetime;

/// Scripted source: each fetch pops the next canned response.
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<RawRow>, AppError>>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Vec<RawRow>, AppError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

impl IncidentSource for ScriptedSource {
    fn fetch_rows(&self) -> Result<Vec<RawRow>, AppError> {
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(AppError::source_unavailable("script exhausted")))
    }
}

fn row(id: i64, cause: &str, resolved: bool) -> RawRow {
    let v = json!({
        "data": "2024-01-01T08:15:00Z",
        "idEvento": id,
        "tipoEvento": "Falha",
        "mercado": "SUL",
        "sintoma": cause,
        "cidade": "Curitiba",
        "dataPrev": if resolved { json!("2024-01-01T10:00:00Z") } else { serde_json::Value::Null },
    });
    match v {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    }
}

fn offline() -> AppError {
    AppError::source_unavailable("Failed to reach incident source").with_retryable(true)
}

fn cycle(responses: Vec<Result<Vec<RawRow>, AppError>>) -> RefreshCycle<ScriptedSource> {
    RefreshCycle::new(
        ScriptedSource::new(responses),
        FieldRules::default(),
        EngineConfig::default(),
    )
}

#[test]
fn failure_before_any_success_leaves_no_snapshot() {
    let mut c = cycle(vec![Err(offline())]);
    let err = c.refresh_at(datetime!(2024-01-01 12:00 UTC)).unwrap_err();
    assert!(err.is_source_unavailable());
    assert!(err.retryable);
    assert!(c.snapshot().is_none());
}

#[test]
fn failure_keeps_last_known_good_snapshot() {
    let mut c = cycle(vec![
        Ok(vec![row(1, "SEM SINAL", false), row(2, "SEM SINAL", true)]),
        Err(offline()),
    ]);
    let now = datetime!(2024-01-01 12:00 UTC);

    let total = c.refresh_at(now).expect("first refresh").total;
    assert_eq!(total, 2);

    assert!(c.refresh_at(now).is_err());
    let kept = c.snapshot().expect("last known good");
    assert_eq!(kept.total, 2);
    assert_eq!(kept.pending, 1);
}

#[test]
fn stale_batch_never_replaces_fresher_one() {
    let mut c = cycle(vec![
        Ok(vec![row(1, "A", false)]),
        Ok(vec![row(2, "B", false), row(3, "B", false)]),
    ]);
    let now = datetime!(2024-01-01 12:00 UTC);

    let older = c.fetch(now).expect("older");
    let newer = c.fetch(now).expect("newer");
    assert!(older.seq < newer.seq);

    assert!(c.publish(newer, now));
    assert!(!c.publish(older, now));
    assert_eq!(c.snapshot().expect("snapshot").total, 2);
}

#[test]
fn criteria_change_recomputes_without_refetch() {
    let mut c = cycle(vec![Ok(vec![
        row(1, "A", false),
        row(2, "A", true),
        row(3, "A", true),
    ])]);
    let now = datetime!(2024-01-01 12:00 UTC);
    c.refresh_at(now).expect("refresh");

    let pending_only = FilterCriteria {
        statuses: BTreeSet::from([StatusLabel::Pending]),
        ..FilterCriteria::default()
    };
    let snap = c.apply_criteria(pending_only.clone(), now).expect("snapshot");
    assert_eq!(snap.total, 1);
    assert_eq!(snap.treated, 0);
    assert_eq!(c.criteria(), &pending_only);

    // The cached incident set is untouched by filtering.
    assert_eq!(c.published().expect("published").incidents.len(), 3);
}

#[test]
fn normalization_warnings_travel_with_published_batch() {
    let mut c = cycle(vec![Ok(vec![RawRow::new()])]);
    c.refresh_at(datetime!(2024-01-01 12:00 UTC)).expect("refresh");
    let published = c.published().expect("published");
    assert_eq!(published.fetched_at, "2024-01-01T12:00:00Z");
    assert!(published
        .warnings
        .iter()
        .any(|w| w.code == "NORMALIZE_TS_DEFAULTED_NOW"));
    assert_eq!(published.snapshot.total, 1);
}
