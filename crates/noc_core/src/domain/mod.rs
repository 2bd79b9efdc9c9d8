use serde::{Deserialize, Serialize};

/// Sentinel used for every textual field the source omitted.
pub const NOT_AVAILABLE: &str = "N/A";

/// One loosely-typed row as returned by the incident store. Key spellings vary by schema.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Canonical incident representation consumed by the filter stage and the metrics engine.
///
/// Notes:
/// - `timestamp` is always a canonical RFC3339 UTC string; the normalizer substitutes the
///   normalization instant when the source has no usable date (and warns about it).
/// - Textual fields are never empty; missing values become `"N/A"`.
/// - `resolved_at` is the only pending/treated discriminator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub timestamp: String,
    pub id: String,
    pub category: String,
    pub market: String,
    pub nature: String,
    pub cause: String,
    pub city: String,
    pub group: String,
    pub equipment: String,
    pub resolved_at: Option<String>,
    #[serde(default)]
    pub associates: serde_json::Value,
}

impl Incident {
    pub fn is_pending(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// True when a canonical text field carries real data rather than the sentinel.
pub fn is_known(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && v != NOT_AVAILABLE
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
