///
/// This module implements the CLI interface for composer-sync: flag parsing,
/// config resolution, the operator echo, and the exit-code policy.
///
/// All staging and upload logic lives in the [`composer-sync-core`] crate;
/// this module only wires it to the Cloud Storage client in [`crate::gcs`].
///
/// ## How To Use
/// - Command line: `composer-sync --dags_directory dags/ --dags_bucket <bucket> --data_directory data/`
/// - Programmatic/integration use: call [`run`] with a constructed [`Cli`], or
///   [`run_with`] to supply a different uploader.
///
/// [`composer-sync-core`]: ../../composer-sync-core/
use crate::gcs::GcsClient;
use crate::load_config::{load_config, merge};
use anyhow::Result;
use clap::Parser;
use composer_sync_core::config::RunConfig;
use composer_sync_core::contract::{ObjectUploader, UploadError};
use composer_sync_core::synchronise::{synchronise, RunSummary};
use composer_sync_core::upload::{FileOutcome, SkipReason, UploadReport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Upload DAGs and data to a Cloud Composer environment's bucket.
#[derive(Parser, Debug, Default)]
#[clap(
    name = "composer-sync",
    version,
    about = "Upload DAGs and data to a Cloud Composer environment's Cloud Storage bucket"
)]
pub struct Cli {
    /// Local path to DAGs folder
    #[clap(long = "dags_directory")]
    pub dags_directory: Option<PathBuf>,

    /// Cloud Storage bucket of the Composer environment
    #[clap(long = "dags_bucket")]
    pub dags_bucket: Option<String>,

    /// Local path to supporting data folder
    #[clap(long = "data_directory")]
    pub data_directory: Option<PathBuf>,

    /// Exit with status 1 when any file fails to upload
    #[clap(long = "fail_on_error")]
    pub fail_on_error: bool,

    /// Optional YAML file providing defaults for the flags above
    #[clap(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Flags merged over the optional config file.
    pub fn resolve(&self) -> Result<RunConfig> {
        let flags = RunConfig {
            dags_directory: self.dags_directory.clone(),
            dags_bucket: self.dags_bucket.clone(),
            data_directory: self.data_directory.clone(),
            fail_on_error: self.fail_on_error,
        };
        match &self.config {
            Some(path) => Ok(merge(load_config(path)?, flags)),
            None => Ok(flags),
        }
    }
}

/// Async CLI entrypoint for main() and integration tests.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    tracing::info!("trace_initialised");

    let config = cli.resolve()?;
    config.trace_loaded();

    let summary = run_with(&config, GcsClient::new_from_env).await?;
    Ok(ExitCode::from(summary.exit_code(config.fail_on_error)))
}

/// Echoes the inputs and runs both upload halves with `connect` as the
/// storage client factory.
pub async fn run_with<U, F>(config: &RunConfig, connect: F) -> Result<RunSummary>
where
    U: ObjectUploader,
    F: Fn(&str) -> Result<U, UploadError>,
{
    println!("🧠 DAG Directory: {}", display_path(config.dags_directory.as_deref()));
    println!("🪣 GCS Bucket: {}", config.dags_bucket.as_deref().unwrap_or("None"));
    println!("📦 Data Directory: {}", display_path(config.data_directory.as_deref()));

    match synchronise(config, connect).await {
        Ok(summary) => {
            for line in summary_lines(&summary) {
                println!("{line}");
            }
            println!(
                "Upload complete: {} uploaded, {} failed.",
                summary.uploaded_count(),
                summary.failed_count()
            );
            tracing::info!(
                uploaded = summary.uploaded_count(),
                failed = summary.failed_count(),
                "Upload run complete"
            );
            Ok(summary)
        }
        Err(e) => {
            tracing::error!(error = %e, "Upload run failed");
            Err(e.into())
        }
    }
}

/// Operator-facing lines for a finished run: one per skipped half, skipped
/// job, and uploaded or failed file, in run order.
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let mut lines = Vec::new();
    match &summary.dags {
        Some(report) => lines.extend(report_lines(report)),
        None => lines.push("⚠️ Skipping DAGs upload — invalid or missing directory.".to_string()),
    }
    match &summary.data {
        Some(report) => lines.extend(report_lines(report)),
        None => lines.push("⚠️ Skipping Data upload — invalid or missing directory.".to_string()),
    }
    lines
}

fn report_lines(report: &UploadReport) -> Vec<String> {
    let source_dir = report.job.source_dir.display();
    match report.skipped {
        Some(SkipReason::MissingSourceDirectory) => vec![format!(
            "⚠️ Warning: Directory '{source_dir}' does not exist. Skipping upload."
        )],
        Some(SkipReason::EmptyFileSet) => {
            vec![format!("⚠️ No files found in '{source_dir}'. Skipping upload.")]
        }
        None => report
            .files
            .iter()
            .map(|outcome| match outcome {
                FileOutcome::Uploaded { source, object } => {
                    format!("✅ Uploaded: {} → {}", source.display(), object.uri())
                }
                FileOutcome::Failed { source, error, .. } => {
                    format!("❌ Failed to upload {}: {}", source.display(), error)
                }
            })
            .collect(),
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "None".to_string())
}
