//! Duplicate detection by content digest.
//!
//! Every record is hashed (reusing a digest already stored on the record), and
//! records are grouped by digest. Only digests shared by two or more files are
//! reported. Files that cannot be read are listed separately and never grouped.

use crate::hasher::{Unreadable, hash_file};
use crate::scanner::FileRecord;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Result of a duplicate search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateReport {
    /// Digest to the records sharing it; every group has at least two members.
    pub groups: BTreeMap<String, Vec<FileRecord>>,
    /// Files that could not be hashed.
    pub unreadable: Vec<PathBuf>,
}

impl DuplicateReport {
    /// Number of duplicate groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of redundant copies: every group member beyond the first.
    pub fn duplicate_count(&self) -> usize {
        self.groups.values().map(|files| files.len() - 1).sum()
    }

    /// Bytes that would be freed by keeping one copy per group.
    pub fn wasted_bytes(&self) -> u64 {
        self.groups
            .values()
            .filter_map(|files| files.first().map(|f| f.size * (files.len() as u64 - 1)))
            .sum()
    }

    /// Returns true when no duplicates were found.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn from_outcomes(records: &[FileRecord], outcomes: Vec<Result<(), Unreadable>>) -> Self {
        let mut by_digest: BTreeMap<String, Vec<FileRecord>> = BTreeMap::new();
        let mut unreadable = Vec::new();

        for (record, outcome) in records.iter().zip(outcomes) {
            match (outcome, &record.digest) {
                (Ok(()), Some(digest)) => by_digest
                    .entry(digest.clone())
                    .or_default()
                    .push(record.clone()),
                (Ok(()), None) => {}
                (Err(e), _) => {
                    log::warn!("{}", e);
                    unreadable.push(e.path);
                }
            }
        }

        by_digest.retain(|_, files| files.len() >= 2);
        Self {
            groups: by_digest,
            unreadable,
        }
    }
}

/// Fills in `record.digest` if it is not already known.
fn ensure_digest(record: &mut FileRecord) -> Result<(), Unreadable> {
    if record.digest.is_none() {
        record.digest = Some(hash_file(&record.path)?);
    }
    Ok(())
}

/// Groups `records` by content, hashing them one after another.
///
/// Computed digests are stored back on the records so later searches skip the
/// work. `on_progress(completed, total)` fires once per record whether or not it
/// could be hashed.
pub fn find_duplicates<F>(records: &mut [FileRecord], mut on_progress: F) -> DuplicateReport
where
    F: FnMut(usize, usize),
{
    let total = records.len();
    let outcomes = records
        .iter_mut()
        .enumerate()
        .map(|(index, record)| {
            let outcome = ensure_digest(record);
            on_progress(index + 1, total);
            outcome
        })
        .collect();

    DuplicateReport::from_outcomes(records, outcomes)
}

/// Same as [`find_duplicates`] but hashes on the rayon thread pool.
///
/// Workers only hash; grouping happens afterwards on the calling thread in
/// record order, so the report is identical to the sequential one. Progress
/// callbacks arrive from worker threads: every count from 1 to `total` is
/// reported exactly once, but calls may arrive out of order.
pub fn find_duplicates_parallel<F>(records: &mut [FileRecord], on_progress: F) -> DuplicateReport
where
    F: Fn(usize, usize) + Sync,
{
    let total = records.len();
    let completed = AtomicUsize::new(0);

    let outcomes = records
        .par_iter_mut()
        .map(|record| {
            let outcome = ensure_digest(record);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            on_progress(done, total);
            outcome
        })
        .collect();

    DuplicateReport::from_outcomes(records, outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::{CategoryRuleTable, OrganizeMode};
    use crate::scanner::scan_directory;
    use std::fs;
    use tempfile::TempDir;

    fn scan(dir: &std::path::Path) -> Vec<FileRecord> {
        scan_directory(
            dir,
            OrganizeMode::Category,
            &CategoryRuleTable::default(),
            |_, _| {},
        )
        .unwrap()
    }

    #[test]
    fn test_identical_files_grouped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "hello").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "hello").unwrap();
        fs::write(temp_dir.path().join("c.txt"), "world").unwrap();

        let mut records = scan(temp_dir.path());
        let report = find_duplicates(&mut records, |_, _| {});

        assert_eq!(report.group_count(), 1);
        let group = &report.groups["5d41402abc4b2a76b9719d911017c592"];
        let names: Vec<_> = group.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(report.duplicate_count(), 1);
        assert_eq!(report.wasted_bytes(), 5);
    }

    #[test]
    fn test_distinct_files_never_grouped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "one").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "two").unwrap();

        let mut records = scan(temp_dir.path());
        let report = find_duplicates(&mut records, |_, _| {});

        assert!(report.is_empty());
        assert!(records.iter().all(|r| r.digest.is_some()));
    }

    #[test]
    fn test_progress_counts_every_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "x").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "x").unwrap();
        let mut records = scan(temp_dir.path());
        fs::remove_file(temp_dir.path().join("b.txt")).unwrap();

        let mut calls = Vec::new();
        let report = find_duplicates(&mut records, |done, total| calls.push((done, total)));

        assert_eq!(calls, vec![(1, 2), (2, 2)]);
        assert!(report.is_empty());
        assert_eq!(report.unreadable.len(), 1);
        assert!(report.unreadable[0].ends_with("b.txt"));
    }

    #[test]
    fn test_existing_digest_is_reused() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "x").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "y").unwrap();
        let mut records = scan(temp_dir.path());
        for record in &mut records {
            record.digest = Some("same".to_string());
        }

        let report = find_duplicates(&mut records, |_, _| {});
        assert_eq!(report.groups["same"].len(), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for i in 0..20 {
            let content = format!("content-{}", i % 4);
            fs::write(temp_dir.path().join(format!("f{:02}.bin", i)), content).unwrap();
        }

        let mut sequential = scan(temp_dir.path());
        let mut parallel = sequential.clone();

        let seq_report = find_duplicates(&mut sequential, |_, _| {});
        let max_seen = AtomicUsize::new(0);
        let par_report = find_duplicates_parallel(&mut parallel, |done, _| {
            max_seen.fetch_max(done, Ordering::SeqCst);
        });

        assert_eq!(seq_report.group_count(), 4);
        assert_eq!(seq_report.groups, par_report.groups);
        assert_eq!(max_seen.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_parallel_progress_reports_each_count_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for i in 0..16 {
            fs::write(temp_dir.path().join(format!("f{:02}.bin", i)), i.to_string()).unwrap();
        }
        let mut records = scan(temp_dir.path());

        let seen = std::sync::Mutex::new(Vec::new());
        find_duplicates_parallel(&mut records, |done, total| {
            assert_eq!(total, 16);
            seen.lock().unwrap().push(done);
        });

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (1..=16).collect::<Vec<_>>());
    }
}
