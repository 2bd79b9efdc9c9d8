use std::time::Duration;

use noc_core::config::MonitorRules;
use noc_core::domain::RawRow;
use noc_core::error::AppError;
use noc_core::monitor::{normalize_monitor_rows_at, MonitorFeed, MonitorRow};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::http_source::{get_json, into_rows, validate_endpoint, SourceConfig};

/// Secondary monitor feed (NewMonitor, SGO) shown in the monitor table.
pub trait MonitorFeedSource {
    fn feed(&self) -> MonitorFeed;
    fn rules(&self) -> &MonitorRules;
    fn fetch_feed_rows(&self) -> Result<Vec<RawRow>, AppError>;
}

/// Monitor feed reached over HTTP: `GET <url>` returning a bare JSON array of rows.
#[derive(Debug, Clone)]
pub struct HttpMonitorFeed {
    feed: MonitorFeed,
    rules: MonitorRules,
    url: String,
    timeout: Duration,
}

impl HttpMonitorFeed {
    pub fn new(feed: MonitorFeed, config: SourceConfig) -> Result<Self, AppError> {
        let (url, timeout) = validate_endpoint(&config, feed.label())?;
        Ok(Self {
            feed,
            rules: feed.default_rules(),
            url,
            timeout,
        })
    }

    pub fn with_rules(mut self, rules: MonitorRules) -> Self {
        self.rules = rules;
        self
    }
}

/// Anything but an array carries no rows.
fn array_rows(body: Value) -> Vec<RawRow> {
    match body {
        Value::Array(values) => into_rows(values),
        _ => Vec::new(),
    }
}

impl MonitorFeedSource for HttpMonitorFeed {
    fn feed(&self) -> MonitorFeed {
        self.feed
    }

    fn rules(&self) -> &MonitorRules {
        &self.rules
    }

    fn fetch_feed_rows(&self) -> Result<Vec<RawRow>, AppError> {
        let body: Value = get_json(&self.url, self.timeout, self.feed.label())?;
        Ok(array_rows(body))
    }
}

/// Fetch and normalize every feed, concatenated in `feeds` order.
///
/// A failing feed is logged and contributes no rows; it never hides the others.
pub fn load_monitor_rows(
    feeds: &[&dyn MonitorFeedSource],
    now: OffsetDateTime,
) -> Vec<MonitorRow> {
    let mut out = Vec::new();
    for source in feeds {
        let feed = source.feed();
        match source.fetch_feed_rows() {
            Ok(rows) => {
                out.extend(normalize_monitor_rows_at(&rows, feed, source.rules(), now));
            }
            Err(err) => {
                warn!(feed = feed.label(), error = %err, "monitor feed unavailable");
            }
        }
    }
    debug!(rows = out.len(), "loaded monitor table");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use noc_core::error::SOURCE_CONFIG_INVALID;
    use serde_json::json;

    #[test]
    fn only_arrays_carry_rows() {
        assert_eq!(array_rows(json!([{ "id": 1 }, "x"])).len(), 2);
        assert!(array_rows(json!({ "conteudo": [{ "id": 1 }] })).is_empty());
        assert!(array_rows(Value::Null).is_empty());
    }

    #[test]
    fn feed_urls_are_validated() {
        let err = HttpMonitorFeed::new(MonitorFeed::Sgo, SourceConfig::new("sgo.local/api"))
            .unwrap_err();
        assert_eq!(err.code, SOURCE_CONFIG_INVALID);
        assert!(err.message.starts_with("SGO"));

        let feed = HttpMonitorFeed::new(
            MonitorFeed::NewMonitor,
            SourceConfig::new("http://nm.local/alertas"),
        )
        .expect("feed");
        assert_eq!(feed.rules(), &MonitorRules::new_monitor());
    }
}
