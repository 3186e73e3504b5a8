//! # contract: interface to the object store
//!
//! [`ObjectUploader`] is the single seam between the upload pipeline and a
//! concrete storage backend. An uploader is bound to one bucket when it is
//! constructed; the pipeline only supplies object keys and local files.
//!
//! The trait is annotated for `mockall`, so tests (and downstream crates with
//! the `test-export-mocks` feature) get a `MockObjectUploader`.

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::key::object_uri;

/// Boxed error returned by uploader implementations.
pub type UploadError = Box<dyn std::error::Error + Send + Sync>;

/// An object written to the bucket.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub size: u64,
}

impl StoredObject {
    pub fn uri(&self) -> String {
        object_uri(&self.bucket, &self.key)
    }
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Write the contents of `local_path` to `key` in the bound bucket.
    ///
    /// A single attempt; the caller never retries.
    async fn upload_file(&self, key: &str, local_path: &Path) -> Result<StoredObject, UploadError>;
}
