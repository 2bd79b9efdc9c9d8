use noc_core::domain::RawRow;
use noc_core::error::AppError;

/// Upstream incident store.
///
/// Implementations return every raw row of the current dataset or a single
/// `SOURCE_UNAVAILABLE` error; they never report per-row failures.
pub trait IncidentSource {
    fn fetch_rows(&self) -> Result<Vec<RawRow>, AppError>;
}

pub mod http_source;
pub mod monitor_feed;
