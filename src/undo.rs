/// Undo functionality for reverting file organization.
///
/// The [`UndoManager`] keeps an in-memory stack of [`MoveBatch`]es, one per run
/// that moved at least one file. Undoing pops the newest batch and moves each
/// file back, newest move first. Nothing is persisted: the stack lives as long
/// as the manager does.
use crate::mover::{MoveBatch, MoveOperation};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`UndoManager::undo`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UndoError {
    /// There is nothing to undo.
    #[error("no previous organization to undo")]
    EmptyStack,
}

/// Represents the result of an undo operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UndoReport {
    /// Number of operations in the undone batch.
    pub total: usize,
    /// Number of files moved back to their original location.
    pub reversed: usize,
    /// Files no longer present at their organized location.
    pub skipped_files: Vec<PathBuf>,
    /// Files that could not be moved back, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Returns true if every operation in the batch was reversed.
    pub fn is_complete_success(&self) -> bool {
        self.reversed == self.total
    }
}

/// Why a single restore did not happen.
enum RestoreFailure {
    Missing,
    Failed(String),
}

/// Manages undo for file organization.
///
/// Owned by whoever drives organize runs; there is no global instance.
#[derive(Debug, Default)]
pub struct UndoManager {
    stack: Vec<MoveBatch>,
}

impl UndoManager {
    /// Creates a manager with an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a completed batch. Empty batches are dropped since there is
    /// nothing to reverse.
    pub fn push(&mut self, batch: MoveBatch) {
        if batch.is_empty() {
            log::debug!("Ignoring empty move batch");
            return;
        }
        log::debug!("Recorded batch of {} moves", batch.len());
        self.stack.push(batch);
    }

    /// Number of batches that can be undone.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Undoes the most recent batch.
    ///
    /// Operations are reversed newest first. Files missing from their organized
    /// location are skipped, and files whose original location is now taken are
    /// reported as failed rather than overwriting anything. Either way the rest
    /// of the batch continues, and the batch is discarded afterwards; partial
    /// undos are not retried.
    ///
    /// # Errors
    ///
    /// Returns [`UndoError::EmptyStack`] if there is nothing to undo.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::undo::{UndoError, UndoManager};
    ///
    /// let mut manager = UndoManager::new();
    /// assert_eq!(manager.undo().unwrap_err(), UndoError::EmptyStack);
    /// ```
    pub fn undo(&mut self) -> Result<UndoReport, UndoError> {
        let batch = self.stack.pop().ok_or(UndoError::EmptyStack)?;

        let mut report = UndoReport {
            total: batch.len(),
            ..UndoReport::default()
        };

        for operation in batch.operations().iter().rev() {
            match Self::restore_file(operation) {
                Ok(()) => report.reversed += 1,
                Err(RestoreFailure::Missing) => {
                    log::warn!(
                        "Cannot undo {}: file no longer exists",
                        operation.destination().display()
                    );
                    report
                        .skipped_files
                        .push(operation.destination().to_path_buf());
                }
                Err(RestoreFailure::Failed(reason)) => {
                    log::warn!(
                        "Cannot undo {}: {}",
                        operation.destination().display(),
                        reason
                    );
                    report
                        .failed_restores
                        .push((operation.destination().to_path_buf(), reason));
                }
            }
        }

        Ok(report)
    }

    /// Moves one file back to where it came from.
    fn restore_file(operation: &MoveOperation) -> Result<(), RestoreFailure> {
        let current = operation.destination();
        let original = operation.source();

        match fs::symlink_metadata(current) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(RestoreFailure::Missing),
            Err(e) => return Err(RestoreFailure::Failed(e.to_string())),
        }

        if fs::symlink_metadata(original).is_ok() {
            return Err(RestoreFailure::Failed(format!(
                "original location {} is occupied",
                original.display()
            )));
        }

        if let Some(parent) = original.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RestoreFailure::Failed(format!("could not recreate {}: {}", parent.display(), e))
            })?;
        }

        fs::rename(current, original)
            .map_err(|e| RestoreFailure::Failed(format!("failed to restore file: {}", e)))?;
        log::debug!("Restored {} -> {}", current.display(), original.display());
        Ok(())
    }
}
