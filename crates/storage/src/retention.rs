//! Retention purger.
//!
//! Computes the cutoff for a retention window and purges both the local
//! dump directory and the configured backend. The local pass always runs, so
//! leftovers from earlier local-only runs are cleaned even when dumps now go
//! to a remote bucket.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use dumpster_core::retention::retention_cutoff;
use dumpster_core::types::Timestamp;
use serde::Serialize;

use crate::error::StorageError;
use crate::local::purge_dir;
use crate::Storage;

/// Outcome of one purge run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// `None` when retention is disabled (`days == 0`).
    pub cutoff: Option<Timestamp>,
    pub local_removed: usize,
    pub backend_removed: usize,
}

impl PurgeReport {
    pub fn total(&self) -> usize {
        self.local_removed + self.backend_removed
    }
}

pub struct RetentionPurger {
    backend: Arc<dyn Storage>,
    local_dump_dir: Option<PathBuf>,
}

impl RetentionPurger {
    pub fn new(backend: Arc<dyn Storage>) -> Self {
        Self {
            backend,
            local_dump_dir: None,
        }
    }

    /// Also sweep `dir` (normally `<local root>/dumps`) before purging the
    /// backend.
    pub fn with_local_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dump_dir = Some(dir.into());
        self
    }

    pub async fn purge(&self, days: u32) -> Result<PurgeReport, StorageError> {
        self.purge_at(Utc::now(), days).await
    }

    /// Purge relative to an explicit `now`.
    pub async fn purge_at(&self, now: Timestamp, days: u32) -> Result<PurgeReport, StorageError> {
        let Some(cutoff) = retention_cutoff(now, days) else {
            tracing::debug!("Retention disabled, skipping purge");
            return Ok(PurgeReport::default());
        };

        tracing::info!(days, cutoff = %cutoff, "Purging dumps older than cutoff");

        let local_removed = match &self.local_dump_dir {
            Some(dir) => purge_dir(dir, cutoff).await?,
            None => 0,
        };
        let backend_removed = self.backend.purge(cutoff).await?;

        let report = PurgeReport {
            cutoff: Some(cutoff),
            local_removed,
            backend_removed,
        };

        tracing::info!(
            local_removed = report.local_removed,
            backend_removed = report.backend_removed,
            "Purge complete"
        );

        Ok(report)
    }
}
