use time::format_description::well_known::Rfc3339;
use time::{format_description, Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::domain::ValidationWarning;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTimestamp {
    /// Canonical RFC3339 UTC string, if deterministically parseable.
    pub canonical_rfc3339_utc: Option<String>,
    /// Raw input preserved for unparseable inputs.
    pub raw: Option<String>,
}

pub(crate) fn canonicalize_rfc3339_utc(dt: OffsetDateTime) -> Option<String> {
    let utc = dt.to_offset(UtcOffset::UTC);
    utc.format(&Rfc3339).ok()
}

/// Parse a canonical timestamp produced by this module.
pub fn parse_canonical(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).ok()
}

/// Interpret an all-digit value as milliseconds since the Unix epoch.
pub(crate) fn parse_epoch_millis(raw: &str) -> Option<OffsetDateTime> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis = raw.parse::<i64>().ok()?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

fn parse_primitive_assume_utc(
    raw: &str,
    fmt: &str,
    field: &str,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<String> {
    let items = match format_description::parse(fmt) {
        Ok(i) => i,
        Err(e) => {
            warnings.push(
                ValidationWarning::new(
                    "NORMALIZE_TS_FORMAT_CONFIG_FAILED",
                    format!("Timestamp format config error for {field}"),
                )
                .with_details(format!("fmt={fmt}; err={e}")),
            );
            return None;
        }
    };

    let pdt = PrimitiveDateTime::parse(raw, &items).ok()?;

    warnings.push(
        ValidationWarning::new(
            "NORMALIZE_TS_TZ_ASSUMED_UTC",
            format!("Assumed UTC timezone for {field}"),
        )
        .with_details(format!("value={raw}; fmt={fmt}")),
    );

    canonicalize_rfc3339_utc(pdt.assume_utc())
}

fn parse_date_only(raw: &str) -> Option<Date> {
    let items = format_description::parse("[year]-[month]-[day]").ok()?;
    Date::parse(raw, &items).ok()
}

fn parse_allowlist(
    raw: &str,
    field: &str,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<String> {
    // Deterministic allowlist only. None of these carry a timezone.
    for fmt in [
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
        "[year]-[month]-[day]T[hour]:[minute]:[second]",
        "[year]-[month]-[day]T[hour]:[minute]",
        "[year]-[month]-[day] [hour]:[minute]:[second]",
        "[year]-[month]-[day] [hour]:[minute]",
        "[day]/[month]/[year] [hour]:[minute]:[second]",
        "[day]/[month]/[year] [hour]:[minute]",
    ] {
        if let Some(canon) = parse_primitive_assume_utc(raw, fmt, field, warnings) {
            return Some(canon);
        }
    }

    let date = parse_date_only(raw)?;
    warnings.push(
        ValidationWarning::new(
            "NORMALIZE_TS_DATE_ONLY",
            format!("Date-only value for {field}; assumed midnight UTC"),
        )
        .with_details(format!("value={raw}")),
    );
    canonicalize_rfc3339_utc(date.midnight().assume_utc())
}

/// Join a date-only value with a separate time-of-day column (`"2024-01-01"` + `"08:15"`).
///
/// Returns `None` when `date` is not date-only, leaving it to be parsed on its own.
pub fn combine_date_and_time(date: &str, time_of_day: &str) -> Option<String> {
    let date = date.trim();
    let time_of_day = time_of_day.trim();
    if time_of_day.is_empty() {
        return None;
    }
    parse_date_only(date)?;
    Some(format!("{date}T{time_of_day}"))
}

/// Normalize a source timestamp into canonical RFC3339 UTC.
///
/// Contract:
/// - An all-digit value is epoch milliseconds.
/// - Otherwise RFC3339, then the allowlist (zoneless values assumed UTC, with a warning).
/// - If unparseable, `raw` is preserved, canonical stays `None` and a warning is emitted.
pub fn normalize_timestamp(
    field: &str,
    raw_input: &str,
    warnings: &mut Vec<ValidationWarning>,
) -> NormalizedTimestamp {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return NormalizedTimestamp {
            canonical_rfc3339_utc: None,
            raw: None,
        };
    }

    if let Some(dt) = parse_epoch_millis(trimmed) {
        return NormalizedTimestamp {
            canonical_rfc3339_utc: canonicalize_rfc3339_utc(dt),
            raw: None,
        };
    }

    if let Ok(dt) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return NormalizedTimestamp {
            canonical_rfc3339_utc: canonicalize_rfc3339_utc(dt),
            raw: None,
        };
    }

    if let Some(canon) = parse_allowlist(trimmed, field, warnings) {
        return NormalizedTimestamp {
            canonical_rfc3339_utc: Some(canon),
            raw: None,
        };
    }

    warnings.push(
        ValidationWarning::new(
            "NORMALIZE_TS_UNPARSEABLE",
            format!("Unparseable timestamp for {field}; preserved raw"),
        )
        .with_details(format!("raw={trimmed}")),
    );

    NormalizedTimestamp {
        canonical_rfc3339_utc: None,
        raw: Some(trimmed.to_string()),
    }
}
