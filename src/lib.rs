//! dirsort - sort a directory's files into buckets and take it back
//!
//! This library scans a single directory level, classifies each file into a
//! bucket by extension, modification month or size, finds byte-identical
//! duplicates by content hash, moves files into bucket subfolders without ever
//! overwriting anything, and reverses those moves batch by batch.

pub mod background;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod file_category;
pub mod file_organizer;
pub mod hasher;
pub mod mover;
pub mod output;
pub mod rename;
pub mod scanner;
pub mod session;
pub mod stats;
pub mod undo;

pub use config::{ConfigError, RuleConfig};
pub use duplicates::{DuplicateReport, find_duplicates, find_duplicates_parallel};
pub use file_category::{CategoryRuleTable, OrganizeMode, classify};
pub use file_organizer::{OrganizeOptions, OrganizeReport, organize};
pub use mover::{MoveBatch, MoveError, MoveOperation, move_file};
pub use scanner::{FileRecord, ScanError, scan_directory};
pub use session::Session;
pub use undo::{UndoError, UndoManager, UndoReport};

pub use cli::{Cli, run_cli};

/// Initializes logging. `RUST_LOG` wins when set; otherwise warnings only, or
/// debug output when `verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
