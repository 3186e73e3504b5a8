use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use composer_sync_core::config::UploadJob;
use composer_sync_core::contract::{MockObjectUploader, StoredObject, UploadError};
use composer_sync_core::error::SyncError;
use composer_sync_core::upload::{upload, FileOutcome, SkipReason};
use tempfile::tempdir;

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        create_dir_all(parent).unwrap();
    }
    write(path, contents).unwrap();
}

fn job(source_dir: &Path, prefix: &str) -> UploadJob {
    UploadJob {
        source_dir: source_dir.to_path_buf(),
        bucket: "my-bucket".to_string(),
        prefix: prefix.to_string(),
    }
}

/// Mock that accepts every upload and records the key and staged path.
fn recording_uploader(calls: Arc<Mutex<Vec<(String, PathBuf)>>>) -> MockObjectUploader {
    let mut uploader = MockObjectUploader::new();
    uploader
        .expect_upload_file()
        .returning(move |key: &str, path: &Path| {
            calls
                .lock()
                .unwrap()
                .push((key.to_string(), path.to_path_buf()));
            Ok(StoredObject {
                bucket: "my-bucket".to_string(),
                key: key.to_string(),
                size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            })
        });
    uploader
}

#[tokio::test]
async fn test_upload_missing_directory_makes_no_calls() {
    let tmp = tempdir().unwrap();
    let connects = AtomicUsize::new(0);

    let report = upload(&job(&tmp.path().join("absent"), "dags/"), |_bucket: &str| {
        connects.fetch_add(1, Ordering::SeqCst);
        Ok::<_, UploadError>(MockObjectUploader::new())
    })
    .await
    .expect("missing directory must not raise");

    assert_eq!(connects.load(Ordering::SeqCst), 0);
    assert_eq!(report.skipped, Some(SkipReason::MissingSourceDirectory));
    assert!(report.files.is_empty());
}

#[tokio::test]
async fn test_upload_fully_excluded_directory_makes_no_calls() {
    let src = tempdir().unwrap();
    write_file(src.path(), "__init__.py", "");
    write_file(src.path(), "README.md", "# dags");
    write_file(src.path(), "tests/flow_test.py", "");
    let connects = AtomicUsize::new(0);

    let report = upload(&job(src.path(), "dags/"), |_bucket: &str| {
        connects.fetch_add(1, Ordering::SeqCst);
        Ok::<_, UploadError>(MockObjectUploader::new())
    })
    .await
    .unwrap();

    assert_eq!(connects.load(Ordering::SeqCst), 0);
    assert_eq!(report.skipped, Some(SkipReason::EmptyFileSet));
}

#[tokio::test]
async fn test_upload_writes_exactly_the_eligible_keys() {
    let src = tempdir().unwrap();
    write_file(src.path(), "flow.py", "flow");
    write_file(src.path(), "__init__.py", "");
    write_file(src.path(), "helpers/sub_test.py", "");
    write_file(src.path(), "README.md", "");
    write_file(src.path(), "helpers/util.py", "util");

    let calls = Arc::new(Mutex::new(Vec::new()));
    let buckets = Arc::new(Mutex::new(Vec::new()));
    let report = upload(&job(src.path(), "dags/"), |bucket: &str| {
        buckets.lock().unwrap().push(bucket.to_string());
        Ok::<_, UploadError>(recording_uploader(calls.clone()))
    })
    .await
    .unwrap();

    let mut keys: Vec<String> = calls.lock().unwrap().iter().map(|(k, _)| k.clone()).collect();
    keys.sort();
    assert_eq!(keys, vec!["dags/flow.py", "dags/helpers/util.py"]);
    assert_eq!(*buckets.lock().unwrap(), vec!["my-bucket".to_string()]);

    assert_eq!(report.skipped, None);
    assert_eq!(report.uploaded_count(), 2);
    assert!(!report.has_failures());
    let uris: Vec<String> = report.uploaded().map(|o| o.uri()).collect();
    assert!(uris.contains(&"gs://my-bucket/dags/helpers/util.py".to_string()));

    // Outcomes point back at the source tree, not the staging copy.
    for outcome in &report.files {
        assert!(outcome.source().starts_with(src.path()));
    }
}

#[tokio::test]
async fn test_upload_continues_after_a_failed_file() {
    let src = tempdir().unwrap();
    write_file(src.path(), "a_broken.py", "x");
    write_file(src.path(), "b_fine.py", "y");

    let attempted = Arc::new(Mutex::new(Vec::new()));
    let attempted_in_mock = attempted.clone();
    let mut uploader = MockObjectUploader::new();
    uploader
        .expect_upload_file()
        .times(2)
        .returning(move |key: &str, _path: &Path| {
            attempted_in_mock.lock().unwrap().push(key.to_string());
            if key.ends_with("a_broken.py") {
                Err("simulated network partition".into())
            } else {
                Ok(StoredObject {
                    bucket: "my-bucket".into(),
                    key: key.to_string(),
                    size: 1,
                })
            }
        });

    let report = upload(&job(src.path(), "data/"), move |_bucket: &str| {
        Ok::<_, UploadError>(uploader)
    })
    .await
    .expect("per-file failures must not fail the job");

    assert_eq!(attempted.lock().unwrap().len(), 2);
    assert_eq!(report.uploaded_count(), 1);
    assert_eq!(report.failed_count(), 1);
    match report.failed().next() {
        Some(FileOutcome::Failed { key, error, source }) => {
            assert_eq!(key, "data/a_broken.py");
            assert!(error.contains("simulated network partition"));
            assert_eq!(source, &src.path().join("a_broken.py"));
        }
        other => panic!("expected a failed outcome, got {other:?}"),
    }
    assert_eq!(report.uploaded().next().unwrap().key, "data/b_fine.py");
}

#[tokio::test]
async fn test_upload_client_construction_error_is_fatal() {
    let src = tempdir().unwrap();
    write_file(src.path(), "flow.py", "x");

    let err = upload(&job(src.path(), "dags/"), |_bucket: &str| {
        Err::<MockObjectUploader, UploadError>("bucket name is invalid".into())
    })
    .await
    .unwrap_err();

    match err {
        SyncError::Client { bucket, reason } => {
            assert_eq!(bucket, "my-bucket");
            assert!(reason.contains("invalid"));
        }
        other => panic!("expected SyncError::Client, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_removes_staging_directory_afterwards() {
    let src = tempdir().unwrap();
    write_file(src.path(), "flow.py", "x");
    write_file(src.path(), "nested/job.py", "y");

    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorder = calls.clone();
    upload(&job(src.path(), "dags/"), move |_bucket: &str| {
        Ok::<_, UploadError>(recording_uploader(recorder))
    })
    .await
    .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    for (_, staged_path) in calls.iter() {
        assert!(!staged_path.starts_with(src.path()));
        assert!(!staged_path.exists(), "staged copy should be gone after upload");
    }
}
