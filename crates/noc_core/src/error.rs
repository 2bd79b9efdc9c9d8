use serde::{Deserialize, Serialize};
use std::fmt;

pub const SOURCE_UNAVAILABLE: &str = "SOURCE_UNAVAILABLE";
pub const SOURCE_CONFIG_INVALID: &str = "SOURCE_CONFIG_INVALID";
pub const CONFIG_DECODE_FAILED: &str = "CONFIG_DECODE_FAILED";

/// Single structured error shape crossing the core/source boundary.
///
/// Row-level problems never become an `AppError`; they are absorbed by the normalizer and
/// reported as `ValidationWarning`s instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    /// The upstream incident store could not be queried at all.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::new(SOURCE_UNAVAILABLE, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is_source_unavailable(&self) -> bool {
        self.code == SOURCE_UNAVAILABLE
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
