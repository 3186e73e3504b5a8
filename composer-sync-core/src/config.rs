use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Object-key prefix for workflow definitions.
pub const DAGS_PREFIX: &str = "dags/";
/// Object-key prefix for supporting data files.
pub const DATA_PREFIX: &str = "data/";

/// Inputs for one run: both source directories and the shared bucket.
/// Every field is optional; absent directories skip their half of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dags_directory: Option<PathBuf>,
    pub dags_bucket: Option<String>,
    pub data_directory: Option<PathBuf>,
    /// Exit non-zero when any single file fails to upload.
    pub fail_on_error: bool,
}

impl RunConfig {
    pub fn trace_loaded(&self) {
        info!(
            dags_directory = ?self.dags_directory,
            dags_bucket = ?self.dags_bucket,
            data_directory = ?self.data_directory,
            fail_on_error = self.fail_on_error,
            "Loaded RunConfig"
        );
        debug!(?self, "RunConfig loaded (full debug)");
    }

    /// The job for `prefix` sourced from `dir`. A missing bucket becomes an
    /// empty name, which the storage client rejects only if there is
    /// something to upload.
    pub fn job(&self, dir: &std::path::Path, prefix: &str) -> UploadJob {
        UploadJob {
            source_dir: dir.to_path_buf(),
            bucket: self.dags_bucket.clone().unwrap_or_default(),
            prefix: prefix.to_string(),
        }
    }
}

/// One directory-to-bucket upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadJob {
    pub source_dir: PathBuf,
    pub bucket: String,
    pub prefix: String,
}

impl UploadJob {
    pub fn trace_loaded(&self) {
        info!(
            source_dir = %self.source_dir.display(),
            bucket = %self.bucket,
            prefix = %self.prefix,
            "Prepared UploadJob"
        );
    }
}
