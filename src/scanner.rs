//! Directory scanning.
//!
//! Lists the regular files directly inside one directory (no recursion),
//! builds a [`FileRecord`] for each, and classifies it on the spot.

use crate::file_category::{CategoryRuleTable, OrganizeMode, classify};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The directory itself could not be listed.
///
/// Unlike per-file failures, this aborts the whole scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The path does not exist or cannot be resolved.
    #[error("cannot access directory {}: {source}", .path.display())]
    Inaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The path exists but is not a directory.
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// Listing the directory failed.
    #[error("cannot list directory {}: {source}", .path.display())]
    ListFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file found by a scan.
///
/// Records are snapshots: if the file is moved, modified or deleted afterwards
/// the record goes stale and a new scan is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Absolute path; unique within one scan.
    pub path: PathBuf,
    /// File name for display.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Lowercase extension with leading dot, or empty.
    pub extension: String,
    /// Last modification time.
    pub modified: DateTime<Local>,
    /// Bucket assigned by the classifier.
    pub destination: String,
    /// Hex content digest, filled in lazily by duplicate detection.
    pub digest: Option<String>,
}

impl FileRecord {
    /// Builds a record from a path and its metadata, classifying it immediately.
    pub fn from_metadata(
        path: PathBuf,
        metadata: &fs::Metadata,
        mode: OrganizeMode,
        rules: &CategoryRuleTable,
    ) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = extension_of(&path);
        let size = metadata.len();
        let modified = metadata
            .modified()
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());
        let destination = classify(&extension, size, modified, mode, rules);

        Self {
            path,
            name,
            size,
            extension,
            modified,
            destination,
            digest: None,
        }
    }

    /// Recomputes the bucket after the mode or rule table changed.
    pub fn reclassify(&mut self, mode: OrganizeMode, rules: &CategoryRuleTable) {
        self.destination = classify(&self.extension, self.size, self.modified, mode, rules);
    }
}

/// Returns the lowercase extension of `path` with a leading dot, or an empty string.
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Scans the regular files directly inside `dir`.
///
/// Records come back sorted by file name. `on_progress(completed, total)` is
/// called once per candidate entry, including entries whose metadata could not
/// be read (those are logged and left out of the result).
///
/// # Errors
///
/// Returns [`ScanError`] only if `dir` itself is missing, not a directory, or
/// cannot be listed.
pub fn scan_directory<F>(
    dir: &Path,
    mode: OrganizeMode,
    rules: &CategoryRuleTable,
    mut on_progress: F,
) -> Result<Vec<FileRecord>, ScanError>
where
    F: FnMut(usize, usize),
{
    let dir = fs::canonicalize(dir).map_err(|e| ScanError::Inaccessible {
        path: dir.to_path_buf(),
        source: e,
    })?;
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir));
    }

    let entries = fs::read_dir(&dir).map_err(|e| ScanError::ListFailed {
        path: dir.clone(),
        source: e,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let total = paths.len();
    let mut records = Vec::with_capacity(total);

    for (index, path) in paths.into_iter().enumerate() {
        match fs::metadata(&path) {
            Ok(metadata) => records.push(FileRecord::from_metadata(path, &metadata, mode, rules)),
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
        on_progress(index + 1, total);
    }

    log::debug!("Scanned {} files in {}", records.len(), dir.display());
    Ok(records)
}
