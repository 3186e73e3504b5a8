//! Filtered staging of a source directory into a scoped temporary directory.
//!
//! [`stage`] copies a source tree into a fresh temporary directory, skipping
//! every entry whose base name matches an [`ExclusionPatterns`] glob, then
//! enumerates the regular files of the copy. The returned [`StagedFileSet`]
//! owns the temporary directory and deletes it when dropped or closed.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::StageError;
use crate::patterns::ExclusionPatterns;

/// A regular file inside the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Absolute path of the staged copy.
    pub path: PathBuf,
    /// Path relative to the staging root, mirroring the source layout.
    pub relative: PathBuf,
}

/// Filtered copy of a source directory.
#[derive(Debug)]
pub struct StagedFileSet {
    root: TempDir,
    files: Vec<StagedFile>,
}

impl StagedFileSet {
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn relative_paths(&self) -> Vec<&Path> {
        self.files.iter().map(|f| f.relative.as_path()).collect()
    }

    /// Deletes the staging directory, reporting removal errors instead of
    /// swallowing them like `Drop` does.
    pub fn close(self) -> std::io::Result<()> {
        self.root.close()
    }
}

/// Stages `source_dir` with the default exclusion patterns.
pub fn stage(source_dir: &Path) -> Result<StagedFileSet, StageError> {
    stage_with(source_dir, &ExclusionPatterns::default())
}

pub fn stage_with(
    source_dir: &Path,
    excludes: &ExclusionPatterns,
) -> Result<StagedFileSet, StageError> {
    if !source_dir.exists() {
        warn!(source_dir = %source_dir.display(), "[STAGE] Source directory does not exist");
        return Err(StageError::MissingSourceDirectory(source_dir.to_path_buf()));
    }
    if !source_dir.is_dir() {
        return Err(StageError::NotADirectory(source_dir.to_path_buf()));
    }

    let root = tempfile::Builder::new()
        .prefix("composer-sync-")
        .tempdir()
        .map_err(StageError::StagingDir)?;
    debug!(
        source_dir = %source_dir.display(),
        staging_root = %root.path().display(),
        "[STAGE] Created staging directory"
    );

    copy_filtered(source_dir, root.path(), excludes)?;
    let files = list_files(root.path())?;

    info!(
        source_dir = %source_dir.display(),
        staging_root = %root.path().display(),
        files = files.len(),
        "[STAGE] Staged source directory"
    );
    Ok(StagedFileSet { root, files })
}

/// Recursively copies `src` into `dest`, pruning excluded names at every level.
/// Existing directories under `dest` are merged into.
fn copy_filtered(src: &Path, dest: &Path, excludes: &ExclusionPatterns) -> Result<(), StageError> {
    let walker = WalkDir::new(src)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            let keep = entry.depth() == 0 || !excludes.is_excluded(entry.file_name());
            if !keep {
                debug!(path = %entry.path().display(), "[STAGE] Excluded by pattern");
            }
            keep
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_dangling_link(&e) => {
                warn!(
                    path = ?e.path(),
                    "[STAGE] Skipping dangling symlink"
                );
                continue;
            }
            Err(e) => {
                let path = e.path().unwrap_or(src).to_path_buf();
                return Err(StageError::Walk { path, source: e });
            }
        };

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| StageError::OutsideRoot(entry.path().to_path_buf()))?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|source| StageError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).map_err(|source| StageError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
        } else {
            debug!(path = %entry.path().display(), "[STAGE] Skipping non-regular entry");
        }
    }
    Ok(())
}

fn is_dangling_link(e: &walkdir::Error) -> bool {
    e.io_error()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

fn list_files(root: &Path) -> Result<Vec<StagedFile>, StageError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| StageError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| StageError::OutsideRoot(entry.path().to_path_buf()))?
            .to_path_buf();
        files.push(StagedFile {
            path: entry.path().to_path_buf(),
            relative,
        });
    }
    Ok(files)
}
