#![doc = "Google Cloud Storage implementation of the core ObjectUploader contract."]
//
//! # Cloud Storage client
//!
//! [`GcsClient`] is bound to one bucket and writes objects with the JSON API's
//! simple media upload (`POST /upload/storage/v1/b/{bucket}/o?uploadType=media`).
//!
//! ## Credentials and endpoint
//!
//! - `GOOGLE_OAUTH_ACCESS_TOKEN`: bearer token, if set.
//! - Otherwise the ambient gcloud credentials via `gcloud auth print-access-token`.
//! - `STORAGE_EMULATOR_HOST`: alternate endpoint (e.g. a local fake-gcs-server);
//!   a token is optional when it is set.
//!
//! A `.env` file is honoured for all of the above.

use std::env;
use std::path::Path;
use std::process::Command;

use async_trait::async_trait;
use composer_sync_core::contract::{ObjectUploader, StoredObject, UploadError};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Connection settings shared by every bucket handle of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsSettings {
    pub endpoint: String,
    pub access_token: Option<String>,
}

impl GcsSettings {
    /// Resolves endpoint and credentials from the environment, shelling out
    /// to gcloud when no token is configured and no emulator is in use.
    pub fn from_env() -> Result<Self, UploadError> {
        dotenvy::dotenv().ok();
        let emulator = non_empty_var("STORAGE_EMULATOR_HOST");
        let token = non_empty_var("GOOGLE_OAUTH_ACCESS_TOKEN");

        let endpoint = match &emulator {
            Some(host) => normalise_endpoint(host),
            None => DEFAULT_ENDPOINT.to_string(),
        };
        let access_token = match (token, &emulator) {
            (Some(token), _) => Some(token),
            (None, Some(_)) => None,
            (None, None) => Some(gcloud_access_token()?),
        };

        tracing::info!(
            endpoint = %endpoint,
            token_set = access_token.is_some(),
            "Resolved Cloud Storage settings from environment"
        );
        Ok(GcsSettings {
            endpoint,
            access_token,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Emulator hosts are commonly given without a scheme (`localhost:4443`).
pub fn normalise_endpoint(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

fn gcloud_access_token() -> Result<String, UploadError> {
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .map_err(|e| {
            tracing::error!(error = ?e, "Failed to launch gcloud for ambient credentials");
            format!("failed to launch gcloud for ambient credentials: {e}")
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!(status = %output.status, stderr = %stderr.trim(), "gcloud auth print-access-token failed");
        return Err(format!("gcloud auth print-access-token failed: {}", stderr.trim()).into());
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err("gcloud returned an empty access token".into());
    }
    Ok(token)
}

/// Checks the Cloud Storage bucket naming rules that can be verified locally.
pub fn validate_bucket_name(name: &str) -> Result<(), UploadError> {
    if name.is_empty() {
        return Err("bucket name is empty; pass --dags_bucket".into());
    }
    if name.contains('.') {
        if !(3..=222).contains(&name.len()) {
            return Err(format!(
                "invalid bucket name '{name}': dotted names must be 3-222 characters"
            )
            .into());
        }
        if name.split('.').any(|part| !(1..=63).contains(&part.len())) {
            return Err(format!(
                "invalid bucket name '{name}': each dot-separated part must be 1-63 characters"
            )
            .into());
        }
    } else if !(3..=63).contains(&name.len()) {
        return Err(format!("invalid bucket name '{name}': must be 3-63 characters").into());
    }
    let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.');
    if let Some(bad) = name.chars().find(|c| !valid_char(*c)) {
        return Err(format!("invalid bucket name '{name}': character '{bad}' not allowed").into());
    }
    let alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !alnum(name.chars().next()) || !alnum(name.chars().last()) {
        return Err(format!(
            "invalid bucket name '{name}': must start and end with a letter or digit"
        )
        .into());
    }
    Ok(())
}

/// Subset of the object resource returned by a successful upload.
#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    bucket: String,
    #[serde(default)]
    size: Option<String>,
}

pub struct GcsClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    bucket: String,
}

impl GcsClient {
    /// Binds a client to `bucket`. The bucket is not looked up; a missing
    /// bucket shows up as a per-file upload error.
    pub fn connect(bucket: &str, settings: &GcsSettings) -> Result<Self, UploadError> {
        validate_bucket_name(bucket)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("composer-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        tracing::info!(bucket, endpoint = %settings.endpoint, "Initialized GcsClient");
        Ok(GcsClient {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            access_token: settings.access_token.clone(),
            bucket: bucket.to_string(),
        })
    }

    /// Validates the bucket before touching credentials, so a malformed name
    /// fails without a gcloud round trip.
    pub fn new_from_env(bucket: &str) -> Result<Self, UploadError> {
        validate_bucket_name(bucket)?;
        let settings = GcsSettings::from_env()?;
        Self::connect(bucket, &settings)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/storage/v1/b/{}/o", self.endpoint, self.bucket)
    }
}

#[async_trait]
impl ObjectUploader for GcsClient {
    async fn upload_file(&self, key: &str, local_path: &Path) -> Result<StoredObject, UploadError> {
        let body = tokio::fs::read(local_path).await.map_err(|e| {
            tracing::error!(error = ?e, path = %local_path.display(), "Failed to read staged file");
            e
        })?;
        let len = body.len() as u64;

        let mut request = self
            .http
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", key)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, bucket = %self.bucket, key, "Cloud Storage rejected upload. Response body: {text}");
            return Err(format!("Cloud Storage returned {status}: {}", text.trim()).into());
        }

        let stored = match response.json::<ObjectResource>().await {
            Ok(resource) => StoredObject {
                size: resource
                    .size
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(len),
                bucket: resource.bucket,
                key: resource.name,
            },
            Err(e) => {
                tracing::debug!(error = ?e, key, "Upload response was not an object resource");
                StoredObject {
                    bucket: self.bucket.clone(),
                    key: key.to_string(),
                    size: len,
                }
            }
        };
        Ok(stored)
    }
}
