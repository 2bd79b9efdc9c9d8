pub mod timestamps;

use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::FieldRules;
use crate::domain::{Incident, RawRow, ValidationWarning, NOT_AVAILABLE};
use timestamps::{canonicalize_rfc3339_utc, combine_date_and_time, normalize_timestamp};

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub incidents: Vec<Incident>,
    pub warnings: Vec<ValidationWarning>,
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First non-empty scalar among `keys`, in rule order.
pub(crate) fn first_text(row: &RawRow, keys: &[String]) -> Option<String> {
    keys.iter()
        .filter_map(|k| row.get(k))
        .find_map(scalar_text)
}

fn text_or_default(row: &RawRow, keys: &[String]) -> String {
    first_text(row, keys).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn first_present(row: &RawRow, keys: &[String]) -> Value {
    keys.iter()
        .filter_map(|k| row.get(k))
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null)
}

fn resolve_timestamp(
    row_idx: usize,
    row: &RawRow,
    rules: &FieldRules,
    now: OffsetDateTime,
    warnings: &mut Vec<ValidationWarning>,
) -> String {
    // Date joined with the time-of-day column first, then the date on its own, so a bad
    // time value never discards a usable date.
    let mut candidates = Vec::new();
    if let Some(date) = first_text(row, &rules.timestamp) {
        if let Some(joined) = first_text(row, &rules.time_of_day)
            .and_then(|tod| combine_date_and_time(&date, &tod))
        {
            candidates.push(joined);
        }
        candidates.push(date);
    }

    for raw in candidates {
        let norm = normalize_timestamp("timestamp", &raw, warnings);
        if let Some(canon) = norm.canonical_rfc3339_utc {
            return canon;
        }
    }

    warnings.push(
        ValidationWarning::new(
            "NORMALIZE_TS_DEFAULTED_NOW",
            "No usable timestamp; substituted normalization time",
        )
        .with_details(format!("row={row_idx}")),
    );
    canonicalize_rfc3339_utc(now).unwrap_or_default()
}

fn resolve_resolved_at(
    row_idx: usize,
    row: &RawRow,
    rules: &FieldRules,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<String> {
    let raw = first_text(row, &rules.resolved_at)?;
    let norm = normalize_timestamp("resolved_at", &raw, warnings);
    match norm.canonical_rfc3339_utc {
        Some(canon) => Some(canon),
        None => {
            // Any non-empty value still marks the incident as treated.
            warnings.push(
                ValidationWarning::new(
                    "NORMALIZE_RESOLVED_AT_RAW_KEPT",
                    "Kept non-canonical resolved_at; incident counts as treated",
                )
                .with_details(format!("row={row_idx}")),
            );
            norm.raw
        }
    }
}

fn normalize_row(
    row_idx: usize,
    row: &RawRow,
    rules: &FieldRules,
    now: OffsetDateTime,
    warnings: &mut Vec<ValidationWarning>,
) -> Incident {
    Incident {
        timestamp: resolve_timestamp(row_idx, row, rules, now, warnings),
        id: text_or_default(row, &rules.id),
        category: text_or_default(row, &rules.category),
        market: text_or_default(row, &rules.market),
        nature: text_or_default(row, &rules.nature),
        cause: text_or_default(row, &rules.cause),
        city: text_or_default(row, &rules.city),
        group: text_or_default(row, &rules.group),
        equipment: text_or_default(row, &rules.equipment),
        resolved_at: resolve_resolved_at(row_idx, row, rules, warnings),
        associates: first_present(row, &rules.associates),
    }
}

/// Map heterogeneous source rows onto canonical incidents, using the wall clock as the
/// fallback instant for rows without a usable date.
pub fn normalize_rows(rows: &[RawRow], rules: &FieldRules) -> NormalizeOutcome {
    normalize_rows_at(rows, rules, OffsetDateTime::now_utc())
}

/// Deterministic variant of [`normalize_rows`].
///
/// Never fails for a single row: a row with every field missing still yields a fully
/// defaulted incident. Output order matches input order.
pub fn normalize_rows_at(
    rows: &[RawRow],
    rules: &FieldRules,
    now: OffsetDateTime,
) -> NormalizeOutcome {
    let mut warnings = Vec::new();
    let incidents = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| normalize_row(idx, row, rules, now, &mut warnings))
        .collect::<Vec<_>>();

    debug!(
        rows = rows.len(),
        warnings = warnings.len(),
        "normalized incident rows"
    );

    NormalizeOutcome {
        incidents,
        warnings,
    }
}
