use std::time::Duration;

use noc_core::domain::RawRow;
use noc_core::error::{AppError, SOURCE_CONFIG_INVALID};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::IncidentSource;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    /// Full extraction endpoint, query string included.
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    15_000
}

impl SourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    conteudo: Option<Vec<Value>>,
}

/// Incident store reached over HTTP: `GET <url>` returning `{ "conteudo": [rows] }`.
#[derive(Debug, Clone)]
pub struct HttpIncidentSource {
    url: String,
    timeout: Duration,
}

fn host_of(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Checked `(url, timeout)` pair for an http(s) endpoint; `what` names it in errors.
pub(super) fn validate_endpoint(
    config: &SourceConfig,
    what: &str,
) -> Result<(String, Duration), AppError> {
    let url = config.url.trim().to_string();

    let valid_host = host_of(&url)
        .is_some_and(|h| !h.is_empty() && !h.contains(char::is_whitespace));
    if !valid_host {
        return Err(AppError::new(
            SOURCE_CONFIG_INVALID,
            format!("{what} URL must be http(s) with a host"),
        )
        .with_details(format!("url={url}")));
    }
    if config.timeout_ms == 0 {
        return Err(AppError::new(
            SOURCE_CONFIG_INVALID,
            format!("{what} timeout must be positive"),
        ));
    }
    Ok((url, Duration::from_millis(config.timeout_ms)))
}

/// `GET url` decoded as JSON. Every failure is `SOURCE_UNAVAILABLE`; only 5xx and
/// transport errors are retryable.
pub(super) fn get_json<T: serde::de::DeserializeOwned>(
    url: &str,
    timeout: Duration,
    what: &str,
) -> Result<T, AppError> {
    let resp = ureq::get(url).timeout(timeout).call();

    match resp {
        Ok(r) if r.status() == 200 => r.into_json().map_err(|e| {
            AppError::source_unavailable(format!("Failed to decode {what} response"))
                .with_details(e.to_string())
        }),
        Ok(r) => Err(
            AppError::source_unavailable(format!("Upstream {what} returned an unexpected status"))
                .with_details(format!("status={}", r.status())),
        ),
        Err(ureq::Error::Status(code, _)) => Err(AppError::source_unavailable(format!(
            "Upstream {what} rejected the request"
        ))
        .with_details(format!("status={code}"))
        .with_retryable(code >= 500)),
        Err(e) => Err(AppError::source_unavailable(format!("Failed to reach {what}"))
            .with_details(e.to_string())
            .with_retryable(true)),
    }
}

impl HttpIncidentSource {
    pub fn new(config: SourceConfig) -> Result<Self, AppError> {
        let (url, timeout) = validate_endpoint(&config, "Incident source")?;
        Ok(Self { url, timeout })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Non-object entries become empty rows so they are defaulted, not dropped.
pub(super) fn into_rows(values: Vec<Value>) -> Vec<RawRow> {
    values
        .into_iter()
        .map(|v| match v {
            Value::Object(m) => m,
            _ => RawRow::new(),
        })
        .collect()
}

impl IncidentSource for HttpIncidentSource {
    fn fetch_rows(&self) -> Result<Vec<RawRow>, AppError> {
        let body: ExtractionResponse = get_json(&self.url, self.timeout, "incident source")?;
        let rows = into_rows(body.conteudo.unwrap_or_default());
        debug!(rows = rows.len(), "fetched incident rows");
        Ok(rows)
    }
}
