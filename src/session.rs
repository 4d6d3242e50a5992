//! A working session over one directory.
//!
//! [`Session`] ties the pieces together for a front end: it holds the target
//! directory, the active mode and rule table, the latest scan, and the
//! [`UndoManager`] for the whole session. Runs that change the filesystem
//! (organize, rename, undo) invalidate the cached scan, and the next operation
//! that needs records rescans first.

use crate::duplicates::{DuplicateReport, find_duplicates};
use crate::file_category::{CategoryRuleTable, OrganizeMode};
use crate::file_organizer::{OrganizeOptions, OrganizeReport, organize};
use crate::rename::{PlannedRename, RenamePattern, RenameReport, apply_renames, plan_renames};
use crate::scanner::{FileRecord, ScanError, scan_directory};
use crate::stats::RunSummary;
use crate::undo::{UndoError, UndoManager, UndoReport};
use std::path::{Path, PathBuf};

/// State for one directory across several operations.
#[derive(Debug)]
pub struct Session {
    dir: PathBuf,
    mode: OrganizeMode,
    rules: CategoryRuleTable,
    records: Option<Vec<FileRecord>>,
    undo: UndoManager,
    summary: RunSummary,
}

impl Session {
    pub fn new(dir: impl Into<PathBuf>, mode: OrganizeMode, rules: CategoryRuleTable) -> Self {
        Self {
            dir: dir.into(),
            mode,
            rules,
            records: None,
            undo: UndoManager::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mode(&self) -> OrganizeMode {
        self.mode
    }

    pub fn rules(&self) -> &CategoryRuleTable {
        &self.rules
    }

    /// Batches available to undo.
    pub fn undo_depth(&self) -> usize {
        self.undo.depth()
    }

    /// Counts from the latest scan, organize and duplicate search.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// The cached scan, if still valid.
    pub fn records(&self) -> Option<&[FileRecord]> {
        self.records.as_deref()
    }

    /// Switches mode and reclassifies cached records in place.
    pub fn set_mode(&mut self, mode: OrganizeMode) {
        self.mode = mode;
        self.reclassify();
    }

    /// Replaces the rule table and reclassifies cached records in place.
    pub fn set_rules(&mut self, rules: CategoryRuleTable) {
        self.rules = rules;
        self.reclassify();
    }

    fn reclassify(&mut self) {
        if let Some(records) = self.records.as_mut() {
            for record in records.iter_mut() {
                record.reclassify(self.mode, &self.rules);
            }
        }
    }

    /// Rescans the directory, replacing the cached records.
    pub fn scan<F>(&mut self, on_progress: F) -> Result<&[FileRecord], ScanError>
    where
        F: FnMut(usize, usize),
    {
        let records = scan_directory(&self.dir, self.mode, &self.rules, on_progress)?;
        self.summary = RunSummary::from_records(&records);
        let records = self.records.insert(records);
        Ok(records.as_slice())
    }

    fn ensure_scanned(&mut self) -> Result<(), ScanError> {
        if self.records.is_none() {
            self.scan(|_, _| {})?;
        }
        Ok(())
    }

    /// Finds duplicates among the cached records, scanning first if needed.
    pub fn find_duplicates<F>(&mut self, on_progress: F) -> Result<DuplicateReport, ScanError>
    where
        F: FnMut(usize, usize),
    {
        self.ensure_scanned()?;
        let records = self.records.get_or_insert_with(Vec::new);
        let report = find_duplicates(records, on_progress);
        self.summary.duplicates_found = report.duplicate_count();
        Ok(report)
    }

    /// Organizes the directory and records the run for undo.
    ///
    /// Preview runs leave the filesystem, the cached scan and the undo stack
    /// untouched.
    pub fn organize<F>(
        &mut self,
        options: &OrganizeOptions,
        on_progress: F,
    ) -> Result<OrganizeReport, ScanError>
    where
        F: FnMut(usize, usize),
    {
        self.ensure_scanned()?;
        let records = self.records.as_deref().unwrap_or_default();
        let report = organize(&self.dir, records, options, on_progress);

        if !options.preview_only {
            self.summary.files_moved = report.moved();
            self.undo.push(report.batch.clone());
            self.records = None;
        }
        Ok(report)
    }

    /// Plans a batch rename over the cached records.
    pub fn plan_rename(&mut self, pattern: &RenamePattern) -> Result<Vec<PlannedRename>, ScanError> {
        self.ensure_scanned()?;
        Ok(plan_renames(
            self.records.as_deref().unwrap_or_default(),
            pattern,
        ))
    }

    /// Renames files and records the run for undo.
    pub fn rename(&mut self, pattern: &RenamePattern) -> Result<RenameReport, ScanError> {
        let plan = self.plan_rename(pattern)?;
        let report = apply_renames(&plan);
        self.undo.push(report.batch.clone());
        self.records = None;
        Ok(report)
    }

    /// Reverses the most recent organize or rename run.
    pub fn undo(&mut self) -> Result<UndoReport, UndoError> {
        let report = self.undo.undo()?;
        self.records = None;
        Ok(report)
    }
}
