//! Top-level run: the `dags/` job followed by the `data/` job.
//!
//! Each half is skipped with a warning when its directory is absent from the
//! configuration or does not exist on disk. The halves are independent except
//! that a fatal [`SyncError`] from the first one ends the run before the
//! second starts.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{RunConfig, DAGS_PREFIX, DATA_PREFIX};
use crate::contract::{ObjectUploader, UploadError};
use crate::error::SyncError;
use crate::upload::{upload, UploadReport};

/// Reports of both halves; `None` means the half was skipped before staging.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub dags: Option<UploadReport>,
    pub data: Option<UploadReport>,
}

impl RunSummary {
    pub fn reports(&self) -> impl Iterator<Item = &UploadReport> {
        self.dags.iter().chain(self.data.iter())
    }

    pub fn uploaded_count(&self) -> usize {
        self.reports().map(UploadReport::uploaded_count).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.reports().map(UploadReport::failed_count).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.reports().any(UploadReport::has_failures)
    }

    /// Process exit status for a completed run. Per-file failures only count
    /// when `fail_on_error` is set.
    pub fn exit_code(&self, fail_on_error: bool) -> u8 {
        if fail_on_error && self.has_failures() {
            1
        } else {
            0
        }
    }
}

pub async fn synchronise<U, F>(config: &RunConfig, connect: F) -> Result<RunSummary, SyncError>
where
    U: ObjectUploader,
    F: Fn(&str) -> Result<U, UploadError>,
{
    info!("[RUN] Starting upload run");

    let dags = match config.dags_directory.as_deref().filter(|d| d.exists()) {
        Some(dir) => Some(upload(&config.job(dir, DAGS_PREFIX), &connect).await?),
        None => {
            warn!(dags_directory = ?config.dags_directory, "[RUN] Skipping DAGs upload");
            None
        }
    };

    let data = match config.data_directory.as_deref().filter(|d| d.exists()) {
        Some(dir) => Some(upload(&config.job(dir, DATA_PREFIX), &connect).await?),
        None => {
            warn!(data_directory = ?config.data_directory, "[RUN] Skipping data upload");
            None
        }
    };

    let summary = RunSummary { dags, data };
    info!(
        uploaded = summary.uploaded_count(),
        failed = summary.failed_count(),
        "[RUN] Upload run complete"
    );
    Ok(summary)
}
