pub mod refresh;
pub mod source;

pub use refresh::{FetchedBatch, Published, RefreshCycle};
pub use source::http_source::{HttpIncidentSource, SourceConfig};
pub use source::monitor_feed::{load_monitor_rows, HttpMonitorFeed, MonitorFeedSource};
pub use source::IncidentSource;
