//! Error types for staging and uploading.
//!
//! Per-file upload failures are not represented here: they are absorbed into
//! [`crate::upload::FileOutcome::Failed`] and never abort a job.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while building the staged copy of a source directory.
#[derive(Debug, Error)]
pub enum StageError {
    /// The source path does not exist. Callers treat this as "nothing to upload".
    #[error("source directory '{0}' does not exist")]
    MissingSourceDirectory(PathBuf),

    #[error("source path '{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to create staging directory: {0}")]
    StagingDir(#[source] std::io::Error),

    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("entry '{0}' is outside the directory being walked")]
    OutsideRoot(PathBuf),
}

/// Errors that end an upload job (and, from the CLI, the whole process).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Storage client construction or bucket resolution failed.
    #[error("failed to construct storage client for bucket '{bucket}': {reason}")]
    Client { bucket: String, reason: String },

    #[error(transparent)]
    Stage(#[from] StageError),
}
