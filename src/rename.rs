//! Batch renaming within the scanned directory.
//!
//! A [`RenamePattern`] rewrites each file's stem; the extension is kept. Plans
//! can be previewed with [`plan_renames`] and executed with [`apply_renames`],
//! which never overwrites an existing file and returns a [`MoveBatch`] so a
//! rename run can be undone like an organize run.
//!
//! Renames stay inside the file's own directory. A new name containing a path
//! separator, or one that is empty, `.` or `..`, is refused. Names that are not
//! valid UTF-8 are left untouched.

use crate::mover::{MoveBatch, MoveOperation};
use crate::scanner::FileRecord;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// How to rewrite file stems.
///
/// Steps run in this order: find/replace, prefix, suffix, numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePattern {
    pub prefix: String,
    pub suffix: String,
    /// Substring to replace; ignored when empty.
    pub find: String,
    pub replace: String,
    /// Append `_001`, `_002`, ... in record order.
    pub number: bool,
}

impl RenamePattern {
    /// Returns true if the pattern cannot change any name.
    pub fn is_noop(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty() && self.find.is_empty() && !self.number
    }

    /// Computes the new file name for `file_name` at 1-based position `index`.
    ///
    /// ```
    /// use dirsort::rename::RenamePattern;
    ///
    /// let pattern = RenamePattern {
    ///     prefix: "trip_".into(),
    ///     find: "IMG".into(),
    ///     replace: "photo".into(),
    ///     number: true,
    ///     ..Default::default()
    /// };
    /// assert_eq!(pattern.apply("IMG1234.jpg", 7), "trip_photo1234_007.jpg");
    /// ```
    pub fn apply(&self, file_name: &str, index: usize) -> String {
        let path = Path::new(file_name);
        let (stem, extension) = match (path.file_stem(), path.extension()) {
            (Some(stem), Some(ext)) => (
                stem.to_string_lossy().into_owned(),
                format!(".{}", ext.to_string_lossy()),
            ),
            _ => (file_name.to_string(), String::new()),
        };

        let mut new_stem = if self.find.is_empty() {
            stem
        } else {
            stem.replace(&self.find, &self.replace)
        };
        new_stem = format!("{}{}{}", self.prefix, new_stem, self.suffix);
        if self.number {
            new_stem = format!("{}_{:03}", new_stem, index);
        }

        new_stem + &extension
    }
}

/// One proposed rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRename {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Outcome of [`apply_renames`].
#[derive(Debug, Default)]
pub struct RenameReport {
    /// Completed renames, ready to push for undo.
    pub batch: MoveBatch,
    /// Renames left out because the name did not change or the target existed.
    pub skipped: Vec<PlannedRename>,
    /// Renames the filesystem refused.
    pub failures: Vec<(PathBuf, String)>,
}

/// Returns true if `name` is a single path component usable as a file name.
///
/// ```
/// use dirsort::rename::is_plain_file_name;
///
/// assert!(is_plain_file_name("photo_001.jpg"));
/// assert!(!is_plain_file_name("../photo.jpg"));
/// assert!(!is_plain_file_name(".."));
/// ```
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Computes the new path for every record, in record order.
///
/// A record whose file name is not valid UTF-8 keeps its path, so applying the
/// plan skips it.
pub fn plan_renames(records: &[FileRecord], pattern: &RenamePattern) -> Vec<PlannedRename> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let Some(name) = record.path.file_name().and_then(|n| n.to_str()) else {
                log::warn!("Not renaming {}: name is not valid UTF-8", record.path.display());
                return PlannedRename {
                    source: record.path.clone(),
                    target: record.path.clone(),
                };
            };
            let new_name = pattern.apply(name, i + 1);
            let target = match record.path.parent() {
                Some(parent) => parent.join(new_name),
                None => PathBuf::from(new_name),
            };
            PlannedRename {
                source: record.path.clone(),
                target,
            }
        })
        .collect()
}

/// Checks that `rename` only changes the last component of the path.
fn check_target(rename: &PlannedRename) -> Result<(), String> {
    let plain = rename
        .target
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_plain_file_name);
    if plain && rename.target.parent() == rename.source.parent() {
        Ok(())
    } else {
        Err(format!(
            "new name {} would leave the directory",
            rename.target.display()
        ))
    }
}

/// Executes a plan, skipping unchanged names and occupied targets.
///
/// Entries whose target is outside the source's directory are recorded as
/// failures and not renamed.
pub fn apply_renames(plan: &[PlannedRename]) -> RenameReport {
    let mut report = RenameReport::default();

    for rename in plan {
        if let Err(reason) = check_target(rename) {
            log::warn!("Refusing to rename {}: {}", rename.source.display(), reason);
            report.failures.push((rename.source.clone(), reason));
            continue;
        }
        if rename.source == rename.target || fs::symlink_metadata(&rename.target).is_ok() {
            log::debug!("Skipping rename of {}", rename.source.display());
            report.skipped.push(rename.clone());
            continue;
        }

        match fs::rename(&rename.source, &rename.target) {
            Ok(()) => report.batch.record(MoveOperation::new(
                rename.source.clone(),
                rename.target.clone(),
            )),
            Err(e) => {
                log::warn!("Failed to rename {}: {}", rename.source.display(), e);
                report.failures.push((rename.source.clone(), e.to_string()));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::{CategoryRuleTable, OrganizeMode};
    use crate::scanner::scan_directory;
    use tempfile::TempDir;

    #[test]
    fn test_apply_order() {
        let pattern = RenamePattern {
            prefix: "p_".into(),
            suffix: "_s".into(),
            find: "old".into(),
            replace: "new".into(),
            number: false,
        };
        assert_eq!(pattern.apply("old_name.txt", 1), "p_new_name_s.txt");
    }

    #[test]
    fn test_apply_without_extension() {
        let pattern = RenamePattern {
            number: true,
            ..Default::default()
        };
        assert_eq!(pattern.apply("Makefile", 12), "Makefile_012");
        assert_eq!(pattern.apply(".env", 1), ".env_001");
    }

    #[test]
    fn test_noop_pattern() {
        assert!(RenamePattern::default().is_noop());
        let pattern = RenamePattern {
            replace: "ignored".into(),
            ..Default::default()
        };
        assert!(pattern.is_noop());

        let pattern = RenamePattern {
            prefix: "p_".into(),
            ..Default::default()
        };
        assert!(!pattern.is_noop());
    }

    #[test]
    fn test_apply_renames_skips_existing_targets() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.txt"), "a").unwrap();
        fs::write(base.join("b.txt"), "b").unwrap();
        fs::write(base.join("x_b.txt"), "taken").unwrap();

        let records = scan_directory(
            base,
            OrganizeMode::Category,
            &CategoryRuleTable::default(),
            |_, _| {},
        )
        .unwrap();
        let records: Vec<_> = records.into_iter().filter(|r| r.name != "x_b.txt").collect();
        let pattern = RenamePattern {
            prefix: "x_".into(),
            ..Default::default()
        };

        let plan = plan_renames(&records, &pattern);
        let report = apply_renames(&plan);

        assert_eq!(report.batch.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(base.join("x_a.txt").exists());
        assert!(base.join("b.txt").exists());
        assert_eq!(fs::read_to_string(base.join("x_b.txt")).unwrap(), "taken");
    }

    #[test]
    fn test_rename_cannot_leave_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let inbox = temp_dir.path().join("inbox");
        fs::create_dir(&inbox).unwrap();
        fs::write(inbox.join("a.txt"), "a").unwrap();

        let records = scan_directory(
            &inbox,
            OrganizeMode::Category,
            &CategoryRuleTable::default(),
            |_, _| {},
        )
        .unwrap();
        let pattern = RenamePattern {
            find: "a".into(),
            replace: "../escaped".into(),
            ..Default::default()
        };

        let report = apply_renames(&plan_renames(&records, &pattern));

        assert!(report.batch.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(inbox.join("a.txt").exists());
        assert!(!temp_dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("a.txt"));
        assert!(is_plain_file_name(".env"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name("sub/a.txt"));
        assert!(!is_plain_file_name("sub\\a.txt"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_left_alone() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let name = OsStr::from_bytes(b"caf\xe9.txt");
        let path = temp_dir.path().join(name);
        fs::write(&path, "bytes").unwrap();

        let records = scan_directory(
            temp_dir.path(),
            OrganizeMode::Category,
            &CategoryRuleTable::default(),
            |_, _| {},
        )
        .unwrap();
        let pattern = RenamePattern {
            prefix: "p_".into(),
            ..Default::default()
        };

        let report = apply_renames(&plan_renames(&records, &pattern));

        assert!(report.batch.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(path.exists());
        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![name.to_os_string()]);
    }
}
