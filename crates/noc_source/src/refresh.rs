use std::sync::atomic::{AtomicU64, Ordering};

use noc_core::config::{EngineConfig, FieldRules};
use noc_core::domain::{Incident, ValidationWarning};
use noc_core::error::AppError;
use noc_core::filter::{filter_incidents, FilterCriteria};
use noc_core::metrics::{compute_metrics_with, MetricsSnapshot};
use noc_core::normalize::normalize_rows_at;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::source::IncidentSource;

/// Normalized incidents from one fetch, tagged with the order the fetch was started in.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBatch {
    pub seq: u64,
    pub fetched_at: OffsetDateTime,
    pub incidents: Vec<Incident>,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub seq: u64,
    pub fetched_at: String,
    pub incidents: Vec<Incident>,
    pub warnings: Vec<ValidationWarning>,
    pub snapshot: MetricsSnapshot,
}

/// One dashboard's fetch → normalize → filter → metrics loop.
///
/// A failed fetch leaves the last published snapshot in place. Batches are published
/// last-writer-wins by start order: a fetch that started earlier never replaces the
/// result of one that started later.
pub struct RefreshCycle<S: IncidentSource> {
    source: S,
    rules: FieldRules,
    engine: EngineConfig,
    criteria: FilterCriteria,
    next_seq: AtomicU64,
    published: Option<Published>,
}

impl<S: IncidentSource> RefreshCycle<S> {
    pub fn new(source: S, rules: FieldRules, engine: EngineConfig) -> Self {
        Self {
            source,
            rules,
            engine,
            criteria: FilterCriteria::default(),
            next_seq: AtomicU64::new(1),
            published: None,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Last-known-good snapshot, if any fetch has ever succeeded.
    pub fn snapshot(&self) -> Option<&MetricsSnapshot> {
        self.published.as_ref().map(|p| &p.snapshot)
    }

    pub fn published(&self) -> Option<&Published> {
        self.published.as_ref()
    }

    /// Fetch and normalize without touching published state. Safe to call from several
    /// threads over a shared reference when the source allows it.
    pub fn fetch(&self, now: OffsetDateTime) -> Result<FetchedBatch, AppError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let rows = self.source.fetch_rows()?;
        let outcome = normalize_rows_at(&rows, &self.rules, now);
        Ok(FetchedBatch {
            seq,
            fetched_at: now,
            incidents: outcome.incidents,
            warnings: outcome.warnings,
        })
    }

    /// Publish a batch unless a later-started batch is already published.
    ///
    /// Returns whether the batch was published.
    pub fn publish(&mut self, batch: FetchedBatch, now: OffsetDateTime) -> bool {
        if let Some(current) = &self.published {
            if current.seq > batch.seq {
                debug!(
                    stale = batch.seq,
                    current = current.seq,
                    "discarded stale incident batch"
                );
                return false;
            }
        }

        let filtered = filter_incidents(&batch.incidents, &self.criteria, now);
        let snapshot = compute_metrics_with(&filtered, &self.engine);
        info!(
            seq = batch.seq,
            total = snapshot.total,
            warnings = batch.warnings.len(),
            "published metrics snapshot"
        );

        self.published = Some(Published {
            seq: batch.seq,
            fetched_at: batch.fetched_at.format(&Rfc3339).unwrap_or_default(),
            incidents: batch.incidents,
            warnings: batch.warnings,
            snapshot,
        });
        true
    }

    pub fn refresh(&mut self) -> Result<&MetricsSnapshot, AppError> {
        self.refresh_at(OffsetDateTime::now_utc())
    }

    /// Fetch and publish in one step. On failure the last-known-good snapshot is kept and
    /// the single source error is returned to the caller.
    pub fn refresh_at(&mut self, now: OffsetDateTime) -> Result<&MetricsSnapshot, AppError> {
        match self.fetch(now) {
            Ok(batch) => {
                self.publish(batch, now);
            }
            Err(e) => {
                warn!(
                    code = %e.code,
                    kept_snapshot = self.published.is_some(),
                    "incident refresh failed: {}",
                    e.message
                );
                return Err(e);
            }
        }
        self.snapshot().ok_or_else(|| {
            AppError::source_unavailable("No snapshot published after refresh")
        })
    }

    /// Recompute the published snapshot for new criteria from the cached incidents.
    pub fn apply_criteria(
        &mut self,
        criteria: FilterCriteria,
        now: OffsetDateTime,
    ) -> Option<&MetricsSnapshot> {
        self.criteria = criteria;
        let published = self.published.as_mut()?;
        let filtered = filter_incidents(&published.incidents, &self.criteria, now);
        published.snapshot = compute_metrics_with(&filtered, &self.engine);
        Some(&published.snapshot)
    }
}
