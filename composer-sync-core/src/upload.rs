//! Upload pipeline for a single [`UploadJob`]: stage, connect, upload each
//! file, report.
//!
//! Every staged file is uploaded independently. A failure is recorded in the
//! [`UploadReport`] and the loop moves on; only staging errors and storage
//! client construction errors end the job early. The staging directory is
//! removed on every path.
//!
//! Nothing here writes to stdout; progress goes through `tracing` and the
//! returned report is what callers render for operators.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::UploadJob;
use crate::contract::{ObjectUploader, StoredObject, UploadError};
use crate::error::{StageError, SyncError};
use crate::key::{object_key, object_uri};
use crate::stage::{stage, StagedFileSet};

/// Why a job made no bucket calls at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingSourceDirectory,
    EmptyFileSet,
}

/// Result of uploading one staged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Uploaded {
        source: PathBuf,
        object: StoredObject,
    },
    Failed {
        source: PathBuf,
        key: String,
        error: String,
    },
}

impl FileOutcome {
    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Uploaded { source, .. } | FileOutcome::Failed { source, .. } => source,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            FileOutcome::Uploaded { object, .. } => &object.key,
            FileOutcome::Failed { key, .. } => key,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub job: UploadJob,
    pub skipped: Option<SkipReason>,
    pub files: Vec<FileOutcome>,
}

impl UploadReport {
    fn skipped(job: &UploadJob, reason: SkipReason) -> Self {
        Self {
            job: job.clone(),
            skipped: Some(reason),
            files: Vec::new(),
        }
    }

    pub fn uploaded(&self) -> impl Iterator<Item = &StoredObject> {
        self.files.iter().filter_map(|f| match f {
            FileOutcome::Uploaded { object, .. } => Some(object),
            FileOutcome::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.is_failure())
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploaded().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn has_failures(&self) -> bool {
        self.files.iter().any(FileOutcome::is_failure)
    }
}

/// Stages `job.source_dir` and uploads every staged file under `job.prefix`.
///
/// `connect` is only invoked when there is at least one file to upload, so a
/// skipped job makes no credential or network calls. Its error is fatal and
/// surfaces as [`SyncError::Client`].
pub async fn upload<U, F>(job: &UploadJob, connect: F) -> Result<UploadReport, SyncError>
where
    U: ObjectUploader,
    F: FnOnce(&str) -> Result<U, UploadError>,
{
    job.trace_loaded();

    let staged = match stage(&job.source_dir) {
        Ok(staged) => staged,
        Err(StageError::MissingSourceDirectory(dir)) => {
            warn!(source_dir = %dir.display(), prefix = %job.prefix, "[UPLOAD] Source directory missing, skipping");
            return Ok(UploadReport::skipped(job, SkipReason::MissingSourceDirectory));
        }
        Err(e) => {
            error!(source_dir = %job.source_dir.display(), error = %e, "[UPLOAD][ERROR] Staging failed");
            return Err(e.into());
        }
    };

    if staged.is_empty() {
        warn!(source_dir = %job.source_dir.display(), prefix = %job.prefix, "[UPLOAD] Nothing to upload after exclusions, skipping");
        release(staged);
        return Ok(UploadReport::skipped(job, SkipReason::EmptyFileSet));
    }

    let uploader = connect(job.bucket.as_str()).map_err(|e| {
        error!(bucket = %job.bucket, error = %e, "[UPLOAD][ERROR] Failed to construct storage client");
        SyncError::Client {
            bucket: job.bucket.clone(),
            reason: e.to_string(),
        }
    })?;
    info!(bucket = %job.bucket, files = staged.len(), prefix = %job.prefix, "[UPLOAD] Uploading staged files");

    let mut files = Vec::with_capacity(staged.len());
    for file in staged.files() {
        let key = object_key(&job.prefix, &file.relative);
        let source = job.source_dir.join(&file.relative);

        match uploader.upload_file(&key, &file.path).await {
            Ok(object) => {
                info!(file = %source.display(), uri = %object.uri(), size = object.size, "[UPLOAD] Uploaded file");
                files.push(FileOutcome::Uploaded { source, object });
            }
            Err(e) => {
                error!(
                    file = %source.display(),
                    uri = %object_uri(&job.bucket, &key),
                    error = %e,
                    "[UPLOAD][ERROR] Upload failed"
                );
                files.push(FileOutcome::Failed {
                    source,
                    key,
                    error: e.to_string(),
                });
            }
        }
    }
    release(staged);

    let report = UploadReport {
        job: job.clone(),
        skipped: None,
        files,
    };
    info!(
        prefix = %job.prefix,
        uploaded = report.uploaded_count(),
        failed = report.failed_count(),
        "[UPLOAD] Job finished"
    );
    match serde_json::to_string_pretty(&report) {
        Ok(json) => debug!(json = %json, "[UPLOAD][DEBUG] Report as JSON"),
        Err(e) => error!(error = ?e, "[UPLOAD][DEBUG] Failed to serialize report as JSON"),
    }
    Ok(report)
}

fn release(staged: StagedFileSet) {
    let root = staged.root().to_path_buf();
    match staged.close() {
        Ok(()) => debug!(staging_root = %root.display(), "[STAGE] Removed staging directory"),
        Err(e) => warn!(staging_root = %root.display(), error = ?e, "[STAGE] Failed to remove staging directory"),
    }
}
