//! Running long operations off the calling thread.
//!
//! A [`BackgroundTask`] runs a closure on its own thread. The closure reports
//! progress through a [`ProgressSink`], which pushes [`ProgressEvent`]s into an
//! unbounded channel: sending never blocks the worker, however slowly the
//! controller drains events. Tasks cannot be cancelled once started.

use crate::duplicates::{DuplicateReport, find_duplicates};
use crate::file_category::{CategoryRuleTable, OrganizeMode};
use crate::file_organizer::{OrganizeOptions, OrganizeReport, organize};
use crate::scanner::{FileRecord, ScanError, scan_directory};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Which operation a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scanning,
    Hashing,
    Organizing,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Scanning => "Scanning",
            Stage::Hashing => "Hashing",
            Stage::Organizing => "Organizing",
        }
    }
}

/// `completed` of `total` items done in `stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub completed: usize,
    pub total: usize,
}

/// The worker thread panicked before producing a result.
#[derive(Debug, Error)]
#[error("background task panicked")]
pub struct TaskPanicked;

/// Sending half of the progress channel, handed to the worker.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: Sender<ProgressEvent>,
}

impl ProgressSink {
    /// Emits one event. A dropped receiver is ignored.
    pub fn emit(&self, stage: Stage, completed: usize, total: usize) {
        let _ = self.tx.send(ProgressEvent {
            stage,
            completed,
            total,
        });
    }

    /// Adapts the sink into a `(completed, total)` callback for `stage`.
    pub fn callback(&self, stage: Stage) -> impl FnMut(usize, usize) + '_ {
        move |completed, total| self.emit(stage, completed, total)
    }
}

/// An operation running on its own thread.
pub struct BackgroundTask<T> {
    events: Receiver<ProgressEvent>,
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Starts `work` on a new thread.
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce(ProgressSink) -> T + Send + 'static,
    {
        let (tx, events) = mpsc::channel();
        let handle = thread::spawn(move || work(ProgressSink { tx }));
        Self { events, handle }
    }

    /// Blocks on events until the worker finishes, handing each to `on_event`.
    ///
    /// The channel closes when the worker drops its sink, which happens when it
    /// returns.
    pub fn for_each_event<F: FnMut(ProgressEvent)>(&self, mut on_event: F) {
        for event in self.events.iter() {
            on_event(event);
        }
    }

    /// Waits for the worker and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`TaskPanicked`] if the worker panicked.
    pub fn join(self) -> Result<T, TaskPanicked> {
        self.handle.join().map_err(|_| TaskPanicked)
    }
}

/// Scans `dir` on a background thread.
pub fn spawn_scan(
    dir: PathBuf,
    mode: OrganizeMode,
    rules: CategoryRuleTable,
) -> BackgroundTask<Result<Vec<FileRecord>, ScanError>> {
    BackgroundTask::spawn(move |sink| {
        scan_directory(&dir, mode, &rules, sink.callback(Stage::Scanning))
    })
}

/// Hashes `records` on a background thread. The records come back with their
/// digests filled in.
pub fn spawn_duplicates(
    mut records: Vec<FileRecord>,
) -> BackgroundTask<(Vec<FileRecord>, DuplicateReport)> {
    BackgroundTask::spawn(move |sink| {
        let report = find_duplicates(&mut records, sink.callback(Stage::Hashing));
        (records, report)
    })
}

/// Organizes `records` under `base_path` on a background thread.
pub fn spawn_organize(
    base_path: PathBuf,
    records: Vec<FileRecord>,
    options: OrganizeOptions,
) -> BackgroundTask<OrganizeReport> {
    BackgroundTask::spawn(move |sink| {
        organize(&base_path, &records, &options, sink.callback(Stage::Organizing))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_spawn_returns_result() {
        let task = BackgroundTask::spawn(|sink| {
            sink.emit(Stage::Scanning, 1, 2);
            sink.emit(Stage::Scanning, 2, 2);
            42
        });

        let mut events = Vec::new();
        task.for_each_event(|e| events.push(e.completed));

        assert_eq!(events, vec![1, 2]);
        assert_eq!(task.join().unwrap(), 42);
    }

    #[test]
    fn test_panicking_task() {
        let task: BackgroundTask<()> = BackgroundTask::spawn(|_| panic!("boom"));
        assert!(task.join().is_err());
    }

    #[test]
    fn test_background_scan_and_hash() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "same").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "same").unwrap();

        let scan = spawn_scan(
            temp_dir.path().to_path_buf(),
            OrganizeMode::Category,
            CategoryRuleTable::default(),
        );
        let mut last = None;
        scan.for_each_event(|e| last = Some(e));
        let records = scan.join().unwrap().unwrap();

        assert_eq!(
            last,
            Some(ProgressEvent {
                stage: Stage::Scanning,
                completed: 2,
                total: 2
            })
        );

        let hashing = spawn_duplicates(records);
        let (records, report) = hashing.join().unwrap();
        assert!(records.iter().all(|r| r.digest.is_some()));
        assert_eq!(report.group_count(), 1);
    }
}
