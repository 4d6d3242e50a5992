/// The organize workflow.
///
/// Walks a list of scanned [`FileRecord`]s in order and hands each one to the
/// mover, collecting completed moves into a [`MoveBatch`]. Files are processed
/// strictly one at a time: collision resolution depends on what earlier moves
/// left in the destination directory.
///
/// A failed move does not stop the run. The remaining files are still
/// processed, so a run can end up partially organized; the failures are listed
/// in the [`OrganizeReport`] and only the successful moves enter the batch.
use crate::mover::{MoveBatch, MoveError, MoveOperation, move_file};
use crate::scanner::FileRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Switches supplied by the caller for one organize run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganizeOptions {
    /// Only compute where files would go; never touch the filesystem.
    pub preview_only: bool,
    /// Move into `<base>/<bucket>`. When false every file targets `base`
    /// itself and the bucket is informational only.
    pub create_subfolders: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            preview_only: false,
            create_subfolders: true,
        }
    }
}

/// Where a file would go, as computed in preview mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination_dir: PathBuf,
    pub bucket: String,
}

/// A file whose move failed.
#[derive(Debug)]
pub struct FailedMove {
    pub path: PathBuf,
    pub error: MoveError,
}

/// Outcome of one organize run.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Completed moves in execution order, ready to push for undo.
    pub batch: MoveBatch,
    /// Files already at their destination.
    pub unchanged: Vec<PathBuf>,
    /// Files that could not be moved.
    pub failures: Vec<FailedMove>,
    /// Preview-mode plan; empty for real runs.
    pub planned: Vec<PlannedMove>,
}

impl OrganizeReport {
    /// Number of files actually moved.
    pub fn moved(&self) -> usize {
        self.batch.len()
    }

    /// True when some files moved and others failed.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() && !self.batch.is_empty()
    }
}

/// Returns the directory a record should be moved into.
pub fn destination_dir(base_path: &Path, record: &FileRecord, options: &OrganizeOptions) -> PathBuf {
    if options.create_subfolders {
        base_path.join(&record.destination)
    } else {
        base_path.to_path_buf()
    }
}

/// Organizes `records` under `base_path`.
///
/// `on_progress(completed, total)` fires after each record. In preview mode the
/// report only carries the plan and the filesystem is left alone.
///
/// # Examples
///
/// ```no_run
/// use dirsort::file_category::{CategoryRuleTable, OrganizeMode};
/// use dirsort::file_organizer::{OrganizeOptions, organize};
/// use dirsort::scanner::scan_directory;
/// use std::path::Path;
///
/// let base = Path::new("/path/to/downloads");
/// let records = scan_directory(base, OrganizeMode::Category, &CategoryRuleTable::default(), |_, _| {})?;
/// let report = organize(base, &records, &OrganizeOptions::default(), |_, _| {});
/// println!("moved {} files, {} failed", report.moved(), report.failures.len());
/// # Ok::<(), dirsort::scanner::ScanError>(())
/// ```
pub fn organize<F>(
    base_path: &Path,
    records: &[FileRecord],
    options: &OrganizeOptions,
    mut on_progress: F,
) -> OrganizeReport
where
    F: FnMut(usize, usize),
{
    let total = records.len();
    let mut report = OrganizeReport::default();

    for (index, record) in records.iter().enumerate() {
        let target_dir = destination_dir(base_path, record, options);

        if options.preview_only {
            report.planned.push(PlannedMove {
                source: record.path.clone(),
                destination_dir: target_dir,
                bucket: record.destination.clone(),
            });
        } else {
            match move_file(&record.path, &target_dir) {
                Ok(outcome) if outcome.moved => {
                    report
                        .batch
                        .record(MoveOperation::new(record.path.clone(), outcome.final_path));
                }
                Ok(_) => report.unchanged.push(record.path.clone()),
                Err(error) => {
                    log::warn!("{}", error);
                    report.failures.push(FailedMove {
                        path: record.path.clone(),
                        error,
                    });
                }
            }
        }

        on_progress(index + 1, total);
    }

    if !options.preview_only {
        log::info!(
            "Organized {}: {} moved, {} unchanged, {} failed",
            base_path.display(),
            report.moved(),
            report.unchanged.len(),
            report.failures.len()
        );
    }
    report
}
