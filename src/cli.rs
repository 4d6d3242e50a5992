//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Command parsing (clap)
//! - Running scans, duplicate searches and organize runs off the main thread
//! - The interactive session, which keeps one undo stack alive across commands

use crate::background::{BackgroundTask, spawn_duplicates, spawn_organize, spawn_scan};
use crate::config::RuleConfig;
use crate::file_category::{CategoryRuleTable, OrganizeMode};
use crate::file_organizer::{OrganizeOptions, OrganizeReport};
use crate::output::OutputFormatter;
use crate::rename::{RenamePattern, apply_renames, plan_renames};
use crate::scanner::FileRecord;
use crate::session::Session;
use crate::stats::{RunSummary, breakdown};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Sort a directory's files into buckets, find duplicates, and undo moves.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Organization mode; overrides the configuration file.
    #[arg(long, value_enum, global = true)]
    pub mode: Option<OrganizeMode>,

    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Represents a CLI command to execute.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List files with their buckets and per-bucket statistics.
    Scan {
        dir: PathBuf,
    },
    /// Find byte-identical files.
    Duplicates {
        dir: PathBuf,
        /// Hash files on all cores.
        #[arg(long)]
        parallel: bool,
    },
    /// Move files into bucket subfolders.
    Organize {
        dir: PathBuf,
        /// Show where files would go without moving anything.
        #[arg(long)]
        preview: bool,
        /// Do not create bucket subfolders.
        #[arg(long)]
        flat: bool,
    },
    /// Rename files in place.
    Rename {
        dir: PathBuf,
        #[command(flatten)]
        pattern: RenameArgs,
        /// Show the new names without renaming.
        #[arg(long)]
        preview: bool,
    },
    /// Interactive session with undo.
    Session {
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct RenameArgs {
    #[arg(long, default_value = "")]
    pub prefix: String,
    #[arg(long, default_value = "")]
    pub suffix: String,
    #[arg(long, default_value = "")]
    pub find: String,
    #[arg(long, default_value = "")]
    pub replace: String,
    /// Append a running three-digit number.
    #[arg(long)]
    pub number: bool,
}

impl From<RenameArgs> for RenamePattern {
    fn from(args: RenameArgs) -> Self {
        Self {
            prefix: args.prefix,
            suffix: args.suffix,
            find: args.find,
            replace: args.replace,
            number: args.number,
        }
    }
}

/// Settings resolved from the config file and command-line overrides.
struct Resolved {
    mode: OrganizeMode,
    rules: CategoryRuleTable,
    create_subfolders: bool,
}

fn resolve(cli: &Cli) -> Result<Resolved, String> {
    let config = RuleConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let rules = config
        .rule_table()
        .map_err(|e| format!("Error in configuration: {}", e))?;

    Ok(Resolved {
        mode: cli.mode.unwrap_or(config.mode),
        rules,
        create_subfolders: config.create_subfolders,
    })
}

/// Runs the CLI application with parsed arguments.
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let settings = resolve(&cli)?;

    match &cli.command {
        Command::Scan { dir } => scan_command(dir, &settings, cli.json),
        Command::Duplicates { dir, parallel } => {
            duplicates_command(dir, &settings, *parallel, cli.json)
        }
        Command::Organize { dir, preview, flat } => {
            let options = OrganizeOptions {
                preview_only: *preview,
                create_subfolders: settings.create_subfolders && !*flat,
            };
            organize_command(dir, &settings, &options, cli.json)
        }
        Command::Rename {
            dir,
            pattern,
            preview,
        } => rename_command(dir, &settings, pattern.clone().into(), *preview, cli.json),
        Command::Session { dir } => run_session(dir, settings),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("JSON serialization failed: {}", e))?;
    println!("{}", text);
    Ok(())
}

/// Waits for a background task, driving a progress bar from its events.
fn wait_with_progress<T: Send + 'static>(task: BackgroundTask<T>, quiet: bool) -> Result<T, String> {
    let pb = if quiet {
        indicatif::ProgressBar::hidden()
    } else {
        OutputFormatter::create_progress_bar(0)
    };
    task.for_each_event(|event| OutputFormatter::apply_event(&pb, &event));
    pb.finish_and_clear();
    task.join().map_err(|e| e.to_string())
}

fn scan_records(dir: &Path, settings: &Resolved, quiet: bool) -> Result<Vec<FileRecord>, String> {
    let task = spawn_scan(dir.to_path_buf(), settings.mode, settings.rules.clone());
    wait_with_progress(task, quiet)?.map_err(|e| format!("Scan failed: {}", e))
}

fn scan_command(dir: &Path, settings: &Resolved, json: bool) -> Result<(), String> {
    let records = scan_records(dir, settings, json)?;

    if json {
        return print_json(&records);
    }

    OutputFormatter::info(&format!(
        "Scanned {} ({} mode)",
        dir.display(),
        settings.mode
    ));
    if records.is_empty() {
        OutputFormatter::plain("No files found.");
        return Ok(());
    }
    OutputFormatter::records_table(&records);
    OutputFormatter::summary_table(&breakdown(&records), records.len());
    OutputFormatter::run_summary(&RunSummary::from_records(&records));
    Ok(())
}

fn duplicates_command(
    dir: &Path,
    settings: &Resolved,
    parallel: bool,
    json: bool,
) -> Result<(), String> {
    let mut records = scan_records(dir, settings, json)?;

    let report = if parallel {
        let pb = if json {
            indicatif::ProgressBar::hidden()
        } else {
            OutputFormatter::create_progress_bar(records.len() as u64)
        };
        // Worker counts can arrive out of order.
        let report =
            crate::duplicates::find_duplicates_parallel(&mut records, |_, _| pb.inc(1));
        pb.finish_and_clear();
        report
    } else {
        wait_with_progress(spawn_duplicates(records), json)?.1
    };

    if json {
        return print_json(&report);
    }
    OutputFormatter::duplicate_groups(&report);
    Ok(())
}

fn print_organize_report(report: &OrganizeReport, options: &OrganizeOptions) {
    if options.preview_only {
        for plan in &report.planned {
            let name = plan
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            OutputFormatter::plain(&format!(
                " - {}\n   → Would move to {}",
                name,
                plan.destination_dir.display()
            ));
        }
        OutputFormatter::preview_notice(&format!(
            "{} files would be organized. No files were modified.",
            report.planned.len()
        ));
        return;
    }

    for op in report.batch.operations() {
        OutputFormatter::success(&format!(
            "{} → {}",
            op.source().display(),
            op.destination().display()
        ));
    }
    for failure in &report.failures {
        OutputFormatter::error(&failure.error.to_string());
    }
    if report.is_partial() {
        OutputFormatter::warning(
            "Some files could not be organized; the directory is partially organized.",
        );
    }
}

fn organize_command(
    dir: &Path,
    settings: &Resolved,
    options: &OrganizeOptions,
    json: bool,
) -> Result<(), String> {
    let records = scan_records(dir, settings, json)?;
    let mut summary = RunSummary::from_records(&records);

    let task = spawn_organize(dir.to_path_buf(), records, *options);
    let report = wait_with_progress(task, json)?;
    summary.files_moved = report.moved();

    if json {
        #[derive(Serialize)]
        struct OrganizeJson<'a> {
            summary: RunSummary,
            moves: &'a crate::mover::MoveBatch,
            planned: &'a [crate::file_organizer::PlannedMove],
            failures: Vec<String>,
        }
        return print_json(&OrganizeJson {
            summary,
            moves: &report.batch,
            planned: &report.planned,
            failures: report.failures.iter().map(|f| f.error.to_string()).collect(),
        });
    }

    print_organize_report(&report, options);
    OutputFormatter::run_summary(&summary);
    if !options.preview_only && report.moved() > 0 {
        OutputFormatter::plain(
            "Undo is only available within an interactive session (`dirsort session <DIR>`).",
        );
    }
    Ok(())
}

fn rename_command(
    dir: &Path,
    settings: &Resolved,
    pattern: RenamePattern,
    preview: bool,
    json: bool,
) -> Result<(), String> {
    if pattern.is_noop() {
        return Err("Nothing to rename: give --prefix, --suffix, --find or --number".to_string());
    }

    let records = scan_records(dir, settings, json)?;
    let plan = plan_renames(&records, &pattern);

    if preview {
        if json {
            return print_json(&plan);
        }
        for item in &plan {
            OutputFormatter::plain(&format!(
                "{}\n  → {}",
                item.source.display(),
                item.target.display()
            ));
        }
        OutputFormatter::preview_notice("No files were renamed.");
        return Ok(());
    }

    let report = apply_renames(&plan);
    if json {
        return print_json(&report.batch);
    }
    OutputFormatter::success(&format!("Renamed {} files", report.batch.len()));
    if !report.skipped.is_empty() {
        OutputFormatter::warning(&format!(
            "Skipped {} files (unchanged name or target exists)",
            report.skipped.len()
        ));
    }
    for (path, reason) in &report.failures {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }
    Ok(())
}

const SESSION_HELP: &str = "\
Commands:
  scan                 rescan and list files
  stats                per-bucket statistics
  dupes                find duplicate files
  preview              show where files would go
  organize             move files into bucket folders
  flat                 toggle creating bucket subfolders
  mode <category|date|size>
  rename [prefix=P] [suffix=S] [find=F] [replace=R] [number]
  undo                 reverse the last organize or rename
  summary              show run counts
  help                 show this help
  quit                 leave the session";

fn parse_rename_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> RenamePattern {
    let mut pattern = RenamePattern::default();
    for token in tokens {
        match token.split_once('=') {
            Some(("prefix", v)) => pattern.prefix = v.to_string(),
            Some(("suffix", v)) => pattern.suffix = v.to_string(),
            Some(("find", v)) => pattern.find = v.to_string(),
            Some(("replace", v)) => pattern.replace = v.to_string(),
            None if token == "number" => pattern.number = true,
            _ => OutputFormatter::warning(&format!("Ignoring '{}'", token)),
        }
    }
    pattern
}

/// Runs one session command. Returns false when the session should end.
fn session_step(session: &mut Session, options: &mut OrganizeOptions, line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    let Some(command) = tokens.next() else {
        return true;
    };

    let result: Result<(), String> = match command {
        "quit" | "exit" => return false,
        "help" => {
            OutputFormatter::plain(SESSION_HELP);
            Ok(())
        }
        "scan" => session
            .scan(|_, _| {})
            .map(|records| OutputFormatter::records_table(records))
            .map_err(|e| e.to_string()),
        "stats" => session
            .scan(|_, _| {})
            .map(|records| OutputFormatter::summary_table(&breakdown(records), records.len()))
            .map_err(|e| e.to_string()),
        "dupes" => session
            .find_duplicates(|_, _| {})
            .map(|report| OutputFormatter::duplicate_groups(&report))
            .map_err(|e| e.to_string()),
        "preview" | "organize" => {
            let run = OrganizeOptions {
                preview_only: command == "preview",
                ..*options
            };
            session
                .organize(&run, |_, _| {})
                .map(|report| print_organize_report(&report, &run))
                .map_err(|e| e.to_string())
        }
        "flat" => {
            options.create_subfolders = !options.create_subfolders;
            OutputFormatter::info(&format!(
                "Create subfolders: {}",
                options.create_subfolders
            ));
            Ok(())
        }
        "mode" => match tokens.next().map(|m| m.parse::<ModeArg>()) {
            Some(Ok(ModeArg(mode))) => {
                session.set_mode(mode);
                OutputFormatter::info(&format!("Mode set to {}", mode));
                Ok(())
            }
            _ => Err("usage: mode <category|date|size>".to_string()),
        },
        "rename" => {
            let pattern = parse_rename_tokens(tokens);
            if pattern.is_noop() {
                Err("Nothing to rename".to_string())
            } else {
                session
                    .rename(&pattern)
                    .map(|report| {
                        OutputFormatter::success(&format!("Renamed {} files", report.batch.len()))
                    })
                    .map_err(|e| e.to_string())
            }
        }
        "undo" => session
            .undo()
            .map(|report| OutputFormatter::undo_report(&report))
            .map_err(|e| e.to_string()),
        "summary" => {
            OutputFormatter::run_summary(&session.summary());
            Ok(())
        }
        other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };

    if let Err(message) = result {
        OutputFormatter::error(&message);
    }
    true
}

/// Parses an [`OrganizeMode`] from session input.
struct ModeArg(OrganizeMode);

impl std::str::FromStr for ModeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <OrganizeMode as clap::ValueEnum>::from_str(s, true).map(ModeArg)
    }
}

fn run_session(dir: &Path, settings: Resolved) -> Result<(), String> {
    let mut session = Session::new(dir, settings.mode, settings.rules);
    let mut options = OrganizeOptions {
        preview_only: false,
        create_subfolders: settings.create_subfolders,
    };

    OutputFormatter::info(&format!(
        "Session on {} ({} mode). Type 'help' for commands.",
        dir.display(),
        session.mode()
    ));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("dirsort> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(|e| format!("Failed to read input: {}", e))?;
        if !session_step(&mut session, &mut options, &line) {
            break;
        }
    }

    if session.undo_depth() > 0 {
        OutputFormatter::warning("Leaving the session discards the undo history.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_organize_flags() {
        let cli = Cli::try_parse_from([
            "dirsort", "organize", "/tmp/x", "--preview", "--flat", "--mode", "size",
        ])
        .unwrap();

        assert_eq!(cli.mode, Some(OrganizeMode::Size));
        assert!(matches!(
            cli.command,
            Command::Organize {
                preview: true,
                flat: true,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["dirsort", "scan", "/tmp", "--mode", "colour"]).is_err());
    }

    #[test]
    fn test_parse_rename_tokens() {
        let pattern = parse_rename_tokens(
            ["prefix=a_", "find=x", "replace=y", "number"].into_iter(),
        );
        assert_eq!(pattern.prefix, "a_");
        assert_eq!(pattern.find, "x");
        assert_eq!(pattern.replace, "y");
        assert!(pattern.number);
    }

    #[test]
    fn test_session_steps_organize_then_undo() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.txt"), "a").unwrap();

        let mut session = Session::new(base, OrganizeMode::Category, CategoryRuleTable::default());
        let mut options = OrganizeOptions::default();

        assert!(session_step(&mut session, &mut options, "organize"));
        assert!(base.join("Documents").join("a.txt").exists());

        assert!(session_step(&mut session, &mut options, "undo"));
        assert!(base.join("a.txt").exists());

        assert!(session_step(&mut session, &mut options, "mode date"));
        assert_eq!(session.mode(), OrganizeMode::Date);

        assert!(!session_step(&mut session, &mut options, "quit"));
    }
}
