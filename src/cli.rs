//! Command-line interface module for episort.
//!
//! This module handles:
//! - Argument parsing
//! - Target directory resolution
//! - Running the organize pass, then the folder timestamp pass
//! - Reporting every per-file decision

use crate::file_organizer::{FileOrganizer, FileOutcome, OrganizeError, OrganizeReport};
use crate::folder_timestamps::{FolderTimestampUpdater, FolderUpdate, TimestampReport};
use crate::output::OutputFormatter;
use crate::title_pattern::PatternSet;
use clap::Parser;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sort loose anime episodes and movies into per-title folders.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory to organise (defaults to the current directory)
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub path: Option<PathBuf>,
}

/// Reports from both phases of a run.
#[derive(Debug)]
pub struct RunReport {
    /// Per-file outcomes of the organize phase.
    pub organize: OrganizeReport,
    /// Folders touched by the timestamp phase.
    pub timestamps: TimestampReport,
}

/// Runs the organizer on `target`, or on the current directory if `None`.
///
/// Uses the built-in patterns and never moves the running executable.
///
/// # Examples
///
/// ```no_run
/// use episort::cli::run_cli;
/// use std::path::Path;
///
/// match run_cli(Some(Path::new("/path/to/anime"))) {
///     Ok(()) => println!("Operation completed successfully"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(target: Option<&Path>) -> Result<(), String> {
    let base_path = resolve_target(target).map_err(|e| e.to_string())?;
    let patterns =
        PatternSet::builtin().map_err(|e| format!("Error compiling patterns: {}", e))?;

    let mut organizer = FileOrganizer::new(&base_path, patterns);
    if let Ok(exe) = env::current_exe() {
        organizer = organizer.exclude(exe);
    }

    organize_directory(&organizer).map(|_| ())
}

/// Resolves the directory to organise into an absolute path.
///
/// # Errors
///
/// Returns `OrganizeError::InvalidBasePath` if the path does not exist or is
/// not a directory.
pub fn resolve_target(target: Option<&Path>) -> Result<PathBuf, OrganizeError> {
    let raw = match target {
        Some(path) => path.to_path_buf(),
        None => env::current_dir().map_err(|e| OrganizeError::InvalidBasePath {
            path: PathBuf::from("."),
            source: e,
        })?,
    };

    let resolved = fs::canonicalize(&raw).map_err(|e| OrganizeError::InvalidBasePath {
        path: raw.clone(),
        source: e,
    })?;

    if !resolved.is_dir() {
        return Err(OrganizeError::InvalidBasePath {
            path: resolved,
            source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        });
    }

    Ok(resolved)
}

/// Organizes files, then syncs folder timestamps, printing each decision.
///
/// The two phases run strictly one after the other. Per-file failures are
/// reported and collected; only a base path that cannot be listed is an error.
pub fn organize_directory(organizer: &FileOrganizer) -> Result<RunReport, String> {
    let base_path = organizer.base_path();
    OutputFormatter::info(&format!("Organizing contents of: {}", base_path.display()));

    let scan = organizer.scan().map_err(|e| e.to_string())?;
    let mut organize = OrganizeReport::default();

    if scan.is_empty() {
        OutputFormatter::plain("No loose files found.");
    } else {
        let pb = OutputFormatter::create_progress_bar(scan.len() as u64);
        for failure in scan.failures {
            pb.suspend(|| report_outcome(&failure));
            pb.inc(1);
            organize.record(failure);
        }
        for file in &scan.candidates {
            pb.set_message(file.name.clone());
            let outcome = organizer.organize_file(file);
            pb.suspend(|| report_outcome(&outcome));
            pb.inc(1);
            organize.record(outcome);
        }
        pb.finish_and_clear();
    }

    OutputFormatter::header("Updating folder timestamps");
    let timestamps = FolderTimestampUpdater::update_with(base_path, |update| {
        report_folder_update(base_path, update)
    });
    OutputFormatter::plain(&format!(
        "{} folder(s) updated, {} without files left unchanged.",
        timestamps.updated.len(),
        timestamps.untouched.len()
    ));

    OutputFormatter::summary_table(&organize.folder_counts(), organize.moved.len());

    if !organize.unmatched.is_empty() {
        OutputFormatter::warning(&format!(
            "{} file(s) did not match any pattern.",
            organize.unmatched.len()
        ));
    }
    if !organize.failed.is_empty() || !timestamps.failed.is_empty() {
        OutputFormatter::warning("Some operations failed. Please review errors above.");
    }

    OutputFormatter::plain(&format!(
        "\nDone. {} file(s) moved; folder timestamps updated.",
        organize.moved.len()
    ));

    Ok(RunReport {
        organize,
        timestamps,
    })
}

fn report_outcome(outcome: &FileOutcome) {
    let name = display_name(outcome.file());
    match outcome {
        FileOutcome::Moved(moved) => {
            OutputFormatter::success(&format!("Moved: {} → {}/", name, moved.folder));
        }
        FileOutcome::Skipped { destination, .. } => {
            OutputFormatter::warning(&format!(
                "Skipped (already exists): {}",
                destination.display()
            ));
        }
        FileOutcome::Unmatched { .. } => {
            OutputFormatter::warning(&format!("Unmatched: {}", name));
        }
        FileOutcome::Failed { error, .. } => {
            OutputFormatter::error(&format!("Failed: {}: {}", name, error));
        }
    }
}

fn report_folder_update(base_path: &Path, update: &FolderUpdate) {
    match update {
        FolderUpdate::Updated { path, modified } => {
            OutputFormatter::success(&format!(
                "{}/ → {}",
                relative_display(base_path, path),
                OutputFormatter::format_time(*modified)
            ));
        }
        FolderUpdate::Untouched { .. } => {}
        FolderUpdate::Failed { error, .. } => OutputFormatter::error(&error.to_string()),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn relative_display(base_path: &Path, path: &Path) -> String {
    match path.strip_prefix(base_path) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
