//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! progress bars, and the tables printed after scans, duplicate searches and
//! organize runs.

use crate::background::ProgressEvent;
use crate::duplicates::DuplicateReport;
use crate::scanner::FileRecord;
use crate::stats::{BucketStats, RunSummary, human_size};
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a preview-mode notice.
    pub fn preview_notice(message: &str) {
        println!("{}", format!("[PREVIEW] {}", message).yellow());
    }

    /// Creates a progress bar for `total` items.
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Moves a progress bar to match a background event.
    pub fn apply_event(pb: &ProgressBar, event: &ProgressEvent) {
        pb.set_length(event.total as u64);
        pb.set_position(event.completed as u64);
        pb.set_message(event.stage.label());
    }

    /// Prints one line per record: name, size and bucket.
    pub fn records_table(records: &[FileRecord]) {
        let name_width = records
            .iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0)
            .max(4);

        println!(
            "{:<width$}  {:>10}  {}",
            "Name".bold(),
            "Size".bold(),
            "Bucket".bold(),
            width = name_width
        );
        for record in records {
            println!(
                "{:<width$}  {:>10}  → {}",
                record.name,
                human_size(record.size),
                record.destination.cyan(),
                width = name_width
            );
        }
    }

    /// Prints a table of file counts and sizes by bucket.
    pub fn summary_table(stats: &[BucketStats], total_files: usize) {
        Self::header("SUMMARY");

        let max_bucket_len = stats
            .iter()
            .map(|s| s.bucket.len())
            .max()
            .unwrap_or(0)
            .max(6);

        println!(
            "{:<width$} | {}",
            "Bucket".bold(),
            "Files".bold(),
            width = max_bucket_len
        );
        println!("{}", "-".repeat(max_bucket_len + 30));

        for entry in stats {
            let file_word = if entry.files == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {} ({:.1}%) - {}",
                entry.bucket,
                entry.files.to_string().green(),
                file_word,
                entry.percentage,
                human_size(entry.bytes),
                width = max_bucket_len
            );
        }

        println!("{}", "-".repeat(max_bucket_len + 30));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
            width = max_bucket_len
        );
    }

    /// Prints the headline counts of a run.
    pub fn run_summary(summary: &RunSummary) {
        Self::header("RUN SUMMARY");
        println!("  Files scanned:    {}", summary.files_scanned);
        println!("  Total size:       {}", human_size(summary.total_bytes));
        println!("  Files moved:      {}", summary.files_moved);
        println!("  Duplicates found: {}", summary.duplicates_found);
    }

    /// Prints every duplicate group.
    pub fn duplicate_groups(report: &DuplicateReport) {
        if report.is_empty() {
            Self::success("No duplicates found.");
        } else {
            for (digest, files) in &report.groups {
                Self::header(&format!("{} ({} copies)", digest, files.len()));
                for file in files {
                    println!("  {} ({})", file.path.display(), human_size(file.size));
                }
            }
            Self::header("DUPLICATES");
            println!(
                "  {} groups, {} redundant files, {} reclaimable",
                report.group_count(),
                report.duplicate_count(),
                human_size(report.wasted_bytes())
            );
        }

        if !report.unreadable.is_empty() {
            Self::warning(&format!(
                "{} files could not be read and were skipped:",
                report.unreadable.len()
            ));
            for path in &report.unreadable {
                println!("    - {}", path.display());
            }
        }
    }

    /// Prints the outcome of an undo.
    pub fn undo_report(report: &UndoReport) {
        if report.is_complete_success() {
            Self::success(&format!("Undone {} file movements", report.reversed));
        } else {
            Self::warning(&format!(
                "Undone {} of {} file movements",
                report.reversed, report.total
            ));
        }

        if !report.skipped_files.is_empty() {
            println!("  Skipped (no longer present): {}", report.skipped_files.len());
            for path in &report.skipped_files {
                println!("    - {}", path.display());
            }
        }
        if !report.failed_restores.is_empty() {
            println!("  Failed: {}", report.failed_restores.len());
            for (path, reason) in &report.failed_restores {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }
    }
}
