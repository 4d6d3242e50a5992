//! Per-bucket statistics and run summaries.

use crate::scanner::FileRecord;
use humansize::{BINARY, format_size};
use serde::Serialize;
use std::collections::HashMap;

/// File count and byte total for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats {
    pub bucket: String,
    pub files: usize,
    pub bytes: u64,
    /// Share of all scanned files, 0-100.
    pub percentage: f64,
}

/// Breaks records down by bucket, largest file count first (ties by name).
pub fn breakdown(records: &[FileRecord]) -> Vec<BucketStats> {
    let mut totals: HashMap<&str, (usize, u64)> = HashMap::new();
    for record in records {
        let entry = totals.entry(record.destination.as_str()).or_default();
        entry.0 += 1;
        entry.1 += record.size;
    }

    let total_files = records.len().max(1) as f64;
    let mut stats: Vec<BucketStats> = totals
        .into_iter()
        .map(|(bucket, (files, bytes))| BucketStats {
            bucket: bucket.to_string(),
            files,
            bytes,
            percentage: files as f64 * 100.0 / total_files,
        })
        .collect();

    stats.sort_by(|a, b| b.files.cmp(&a.files).then_with(|| a.bucket.cmp(&b.bucket)));
    stats
}

/// Sum of record sizes.
pub fn total_bytes(records: &[FileRecord]) -> u64 {
    records.iter().map(|r| r.size).sum()
}

/// Formats a byte count with binary units, e.g. `2.44 MiB`.
pub fn human_size(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// The headline numbers reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub total_bytes: u64,
    pub files_moved: usize,
    pub duplicates_found: usize,
}

impl RunSummary {
    /// Starts a summary from a scan result.
    pub fn from_records(records: &[FileRecord]) -> Self {
        Self {
            files_scanned: records.len(),
            total_bytes: total_bytes(records),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::path::PathBuf;

    fn record(name: &str, bucket: &str, size: u64) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/tmp").join(name),
            name: name.to_string(),
            size,
            extension: String::new(),
            modified: Local::now(),
            destination: bucket.to_string(),
            digest: None,
        }
    }

    #[test]
    fn test_breakdown_sorted_by_count() {
        let records = vec![
            record("a", "Images", 10),
            record("b", "Documents", 5),
            record("c", "Images", 20),
            record("d", "Audio", 1),
        ];

        let stats = breakdown(&records);

        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].bucket, "Images");
        assert_eq!(stats[0].files, 2);
        assert_eq!(stats[0].bytes, 30);
        assert_eq!(stats[0].percentage, 50.0);
        assert_eq!(stats[1].bucket, "Audio");
        assert_eq!(stats[2].bucket, "Documents");
    }

    #[test]
    fn test_breakdown_empty() {
        assert!(breakdown(&[]).is_empty());
    }

    #[test]
    fn test_summary_from_records() {
        let records = vec![
            record("report.pdf", "Documents", 500 * 1024),
            record("photo.jpg", "Images", 2 * 1024 * 1024),
        ];
        let summary = RunSummary::from_records(&records);

        assert_eq!(summary.files_scanned, 2);
        assert_eq!(summary.total_bytes, 2_609_152);
        assert!(human_size(summary.total_bytes).starts_with("2.4"));
        assert!(human_size(summary.total_bytes).ends_with("MiB"));
    }
}
