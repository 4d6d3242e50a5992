/// Collision-safe relocation of single files.
///
/// [`move_file`] moves one file into a destination directory. If the plain
/// file name is taken, it tries `<stem>_1<ext>`, `<stem>_2<ext>`, ... until a
/// free name is found, so an existing file is never overwritten. The mover
/// itself keeps no history; callers collect [`MoveOperation`]s into a
/// [`MoveBatch`] for undo.
use chrono::{DateTime, Local};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while moving a file.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Failed to create the destination directory.
    #[error("failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The source path has no file name component.
    #[error("{} has no file name", .0.display())]
    InvalidSource(PathBuf),
    /// A path could not be resolved or checked for existence.
    #[error("failed to inspect {}: {source}", .path.display())]
    InspectFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The rename itself failed (for example across devices, or permission denied).
    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for move operations.
pub type MoveResult<T> = Result<T, MoveError>;

/// Outcome of a successful [`move_file`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Where the file lives now. Equal to the source when nothing moved.
    pub final_path: PathBuf,
    /// False when the file was already at its destination.
    pub moved: bool,
}

/// One completed relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOperation {
    source: PathBuf,
    destination: PathBuf,
}

impl MoveOperation {
    /// Records that `source` now lives at `destination`.
    pub fn new(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Where the file was before the move.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Where the file was moved to.
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// The relocations performed by one run, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveBatch {
    created_at: DateTime<Local>,
    operations: Vec<MoveOperation>,
}

impl MoveBatch {
    /// Starts an empty batch stamped with the current time.
    pub fn new() -> Self {
        Self {
            created_at: Local::now(),
            operations: Vec::new(),
        }
    }

    /// Appends a completed operation.
    pub fn record(&mut self, operation: MoveOperation) {
        self.operations.push(operation);
    }

    /// When the run that produced this batch started.
    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Operations in the order they were performed.
    pub fn operations(&self) -> &[MoveOperation] {
        &self.operations
    }

    /// Number of recorded operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if nothing was moved.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Default for MoveBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the `n`th collision candidate name: `<stem>_<n><ext>`.
///
/// ```
/// use dirsort::mover::collision_name;
/// use std::path::Path;
///
/// assert_eq!(collision_name(Path::new("photo.jpg"), 1), "photo_1.jpg");
/// assert_eq!(collision_name(Path::new("archive.tar.gz"), 2), "archive.tar_2.gz");
/// assert_eq!(collision_name(Path::new("README"), 3), "README_3");
/// ```
pub fn collision_name(file_name: &Path, counter: u32) -> OsString {
    let mut name = file_name
        .file_stem()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(format!("_{}", counter));
    if let Some(extension) = file_name.extension() {
        name.push(".");
        name.push(extension);
    }
    name
}

/// Returns true if anything (file, directory, or dangling symlink) occupies `path`.
fn is_occupied(path: &Path) -> MoveResult<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MoveError::InspectFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Resolves `dir/name` with `dir` canonicalized, so two spellings of the same
/// location compare equal without requiring the file itself to exist.
fn resolve_in(dir: &Path, name: &std::ffi::OsStr) -> MoveResult<PathBuf> {
    let dir = fs::canonicalize(dir).map_err(|e| MoveError::InspectFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;
    Ok(dir.join(name))
}

/// Picks a free path inside `destination_dir` for `file_name`.
///
/// Every candidate is checked right before it is returned.
pub fn resolve_collision(destination_dir: &Path, file_name: &Path) -> MoveResult<PathBuf> {
    let mut candidate = destination_dir.join(file_name);
    let mut counter = 1;

    while is_occupied(&candidate)? {
        candidate = destination_dir.join(collision_name(file_name, counter));
        counter += 1;
    }

    Ok(candidate)
}

/// Moves `source` into `destination_dir` without overwriting anything.
///
/// The destination directory is created (recursively) if missing. If the file
/// is already in `destination_dir`, nothing happens and `moved` is false.
///
/// # Errors
///
/// Returns [`MoveError`] if the directory cannot be created, the source has no
/// file name, or the rename fails. A failed rename is never retried or turned
/// into a copy.
///
/// # Examples
///
/// ```no_run
/// use dirsort::mover::move_file;
/// use std::path::Path;
///
/// let outcome = move_file(Path::new("/data/photo.jpg"), Path::new("/data/Images"))?;
/// println!("now at {}", outcome.final_path.display());
/// # Ok::<(), dirsort::mover::MoveError>(())
/// ```
pub fn move_file(source: &Path, destination_dir: &Path) -> MoveResult<MoveOutcome> {
    fs::create_dir_all(destination_dir).map_err(|e| MoveError::DirectoryCreationFailed {
        path: destination_dir.to_path_buf(),
        source: e,
    })?;

    let file_name = source
        .file_name()
        .ok_or_else(|| MoveError::InvalidSource(source.to_path_buf()))?;

    let source_parent = match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if resolve_in(source_parent, file_name)? == resolve_in(destination_dir, file_name)? {
        log::debug!("{} is already in place", source.display());
        return Ok(MoveOutcome {
            final_path: source.to_path_buf(),
            moved: false,
        });
    }

    let destination = resolve_collision(destination_dir, Path::new(file_name))?;
    if destination.file_name() != Some(file_name) {
        log::info!(
            "Name taken, moving {} as {}",
            source.display(),
            destination.display()
        );
    }

    fs::rename(source, &destination).map_err(|e| MoveError::RenameFailed {
        from: source.to_path_buf(),
        to: destination.clone(),
        source: e,
    })?;
    log::debug!("Moved {} -> {}", source.display(), destination.display());

    Ok(MoveOutcome {
        final_path: destination,
        moved: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("test.txt");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let outcome = move_file(&file_path, &base_path.join("Documents").join("Nested"))
            .expect("Failed to move file");

        assert!(outcome.moved);
        assert!(!file_path.exists());
        assert_eq!(
            outcome.final_path,
            base_path.join("Documents").join("Nested").join("test.txt")
        );
        assert_eq!(fs::read_to_string(&outcome.final_path).unwrap(), "test content");
    }

    #[test]
    fn test_move_uses_existing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let category_dir = base_path.join("Images");
        fs::create_dir(&category_dir).expect("Failed to create category directory");
        let file_path = base_path.join("test.png");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let outcome = move_file(&file_path, &category_dir).expect("Failed to move file");

        assert!(outcome.moved);
        assert!(category_dir.join("test.png").exists());
    }

    #[test]
    fn test_collision_counter_increments() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let images = base_path.join("Images");
        fs::create_dir(&images).unwrap();
        fs::write(images.join("photo.jpg"), "existing").unwrap();

        fs::write(base_path.join("photo.jpg"), "second").unwrap();
        let first = move_file(&base_path.join("photo.jpg"), &images).unwrap();
        assert_eq!(first.final_path, images.join("photo_1.jpg"));

        fs::write(base_path.join("photo.jpg"), "third").unwrap();
        let second = move_file(&base_path.join("photo.jpg"), &images).unwrap();
        assert_eq!(second.final_path, images.join("photo_2.jpg"));

        assert_eq!(fs::read_to_string(images.join("photo.jpg")).unwrap(), "existing");
        assert_eq!(fs::read_to_string(images.join("photo_1.jpg")).unwrap(), "second");
        assert_eq!(fs::read_to_string(images.join("photo_2.jpg")).unwrap(), "third");
    }

    #[test]
    fn test_collision_skips_taken_suffixes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dest = temp_dir.path().join("dest");
        fs::create_dir(&dest).unwrap();
        for name in ["a.txt", "a_1.txt", "a_2.txt"] {
            fs::write(dest.join(name), name).unwrap();
        }
        let before: Vec<_> = fs::read_dir(&dest)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();

        let source = temp_dir.path().join("a.txt");
        fs::write(&source, "new").unwrap();
        let outcome = move_file(&source, &dest).unwrap();

        assert_eq!(outcome.final_path, dest.join("a_3.txt"));
        assert!(!before.contains(&outcome.final_path));
    }

    #[test]
    fn test_move_in_place_is_noop() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("stay.txt");
        fs::write(&file_path, "content").unwrap();

        let outcome = move_file(&file_path, temp_dir.path()).unwrap();

        assert!(!outcome.moved);
        assert_eq!(outcome.final_path, file_path);
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "content");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_move_in_place_through_other_spelling() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let sub = temp_dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let file_path = sub.join("f.txt");
        fs::write(&file_path, "content").unwrap();

        let outcome = move_file(&file_path, &sub.join("..").join("sub")).unwrap();
        assert!(!outcome.moved);
        assert!(file_path.exists());
    }

    #[test]
    fn test_missing_source_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = move_file(&temp_dir.path().join("ghost.txt"), &temp_dir.path().join("Out"));
        assert!(matches!(result, Err(MoveError::RenameFailed { .. })));
    }

    #[test]
    fn test_batch_records_in_order() {
        let mut batch = MoveBatch::new();
        assert!(batch.is_empty());
        batch.record(MoveOperation::new("a".into(), "x/a".into()));
        batch.record(MoveOperation::new("b".into(), "x/b".into()));

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.operations()[0].source(), Path::new("a"));
        assert_eq!(batch.operations()[1].destination(), Path::new("x/b"));
    }
}
