//! Streaming content digests for duplicate detection.
//!
//! Files are read in fixed-size chunks and folded into an MD5 accumulator, so
//! memory use stays at one chunk regardless of file size. MD5 is plenty for
//! telling identical files apart; it is not used for anything security related.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bytes read per chunk.
pub const HASH_CHUNK_SIZE: usize = 8 * 1024;

/// A file could not be opened or read.
///
/// This is a per-file condition: callers exclude the file from duplicate
/// grouping and carry on.
#[derive(Debug, Error)]
#[error("cannot read {}: {source}", .path.display())]
pub struct Unreadable {
    /// The file that failed.
    pub path: PathBuf,
    /// The underlying I/O error.
    #[source]
    pub source: io::Error,
}

/// Computes the lowercase hex MD5 digest of a file's contents.
///
/// # Errors
///
/// Returns [`Unreadable`] on any permission or I/O failure.
pub fn hash_file(path: &Path) -> Result<String, Unreadable> {
    let unreadable = |source| Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unreadable)?;
    hash_reader(file).map_err(unreadable)
}

/// Computes the lowercase hex MD5 digest of everything `reader` yields.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Md5::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
