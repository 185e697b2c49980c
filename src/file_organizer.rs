//! Moving loose files into per-title folders.
//!
//! This module scans the top level of a base directory, classifies each file
//! with a [`PatternSet`], and moves it into a folder named after the sanitized
//! title. A file whose name already exists in the destination folder is left
//! where it is. Failures are reported per file and never stop the batch.

use crate::sanitize::{is_usable_folder_name, sanitize_folder_name};
use crate::title_pattern::PatternSet;
use filetime::FileTime;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while organizing files or syncing folder timestamps.
#[derive(Debug)]
pub enum OrganizeError {
    /// The base directory path is invalid or doesn't exist.
    InvalidBasePath { path: PathBuf, source: io::Error },
    /// Failed to list a directory.
    ReadDirFailed { path: PathBuf, source: io::Error },
    /// Failed to read metadata for a file or directory.
    MetadataReadFailed { path: PathBuf, source: io::Error },
    /// Failed to create a title folder.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// The title folder path is taken by something that is not a directory.
    DestinationNotADirectory { path: PathBuf },
    /// Failed to move a file into its title folder.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// A cross-device copy succeeded but the source could not be removed,
    /// so the file now exists in both places.
    SourceRemovalFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// Failed to set a modification time.
    TimestampUpdateFailed { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBasePath { path, source } => {
                write!(f, "Invalid base path {}: {}", path.display(), source)
            }
            Self::ReadDirFailed { path, source } => {
                write!(f, "Error reading directory {}: {}", path.display(), source)
            }
            Self::MetadataReadFailed { path, source } => {
                write!(f, "Failed to read metadata of {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::DestinationNotADirectory { path } => {
                write!(f, "Destination {} exists and is not a directory", path.display())
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::SourceRemovalFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Copied {} to {} but could not remove the original ({}); the file now exists in both places",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::TimestampUpdateFailed { path, source } => {
                write!(
                    f,
                    "Failed to update modification time of {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A top-level non-directory entry considered for organization.
///
/// Symlinks count as candidates unless they point at a directory; moving one
/// moves the link itself.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// The file name, lossily converted for display and ordering.
    ///
    /// Pattern matching uses the exact name from `path`, so a name that is not
    /// valid UTF-8 never matches.
    pub name: String,
    /// The full path to the file.
    pub path: PathBuf,
}

/// The entries found by [`FileOrganizer::scan`].
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Files to classify, sorted by name.
    pub candidates: Vec<CandidateFile>,
    /// Entries that could not be listed or inspected, as `FileOutcome::Failed`.
    pub failures: Vec<FileOutcome>,
}

impl ScanReport {
    /// Number of entries that will produce an outcome.
    pub fn len(&self) -> usize {
        self.candidates.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.failures.is_empty()
    }
}

/// Records a file that was moved into a title folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedFile {
    /// The path of the file before the move.
    pub original_path: PathBuf,
    /// The path of the file after the move.
    pub new_path: PathBuf,
    /// The sanitized folder name the file was moved into.
    pub folder: String,
}

/// What happened to a single candidate file.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was moved into its title folder.
    Moved(MovedFile),
    /// A file with the same name already exists in the title folder.
    Skipped { file: PathBuf, destination: PathBuf },
    /// No pattern produced a usable title.
    Unmatched { file: PathBuf },
    /// A filesystem operation failed for this file.
    Failed { file: PathBuf, error: OrganizeError },
}

impl FileOutcome {
    /// Returns the path of the file this outcome is about, as it was before any move.
    pub fn file(&self) -> &Path {
        match self {
            FileOutcome::Moved(moved) => &moved.original_path,
            FileOutcome::Skipped { file, .. }
            | FileOutcome::Unmatched { file }
            | FileOutcome::Failed { file, .. } => file,
        }
    }
}

/// Collected outcomes of an organize pass.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Files moved into title folders.
    pub moved: Vec<MovedFile>,
    /// Files left in place because the destination already had a file of that name.
    pub skipped: Vec<PathBuf>,
    /// Files left in place because no pattern matched.
    pub unmatched: Vec<PathBuf>,
    /// Files that failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl OrganizeReport {
    /// Adds a single outcome to the report.
    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Moved(moved) => self.moved.push(moved),
            FileOutcome::Skipped { file, .. } => self.skipped.push(file),
            FileOutcome::Unmatched { file } => self.unmatched.push(file),
            FileOutcome::Failed { file, error } => self.failed.push((file, error.to_string())),
        }
    }

    /// Returns the total number of files processed.
    pub fn total_processed(&self) -> usize {
        self.moved.len() + self.skipped.len() + self.unmatched.len() + self.failed.len()
    }

    /// Number of files moved, keyed by destination folder.
    pub fn folder_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for moved in &self.moved {
            *counts.entry(moved.folder.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Organizes the top-level files of a base directory into title folders.
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    base_path: PathBuf,
    patterns: PatternSet,
    excluded: Vec<PathBuf>,
}

impl FileOrganizer {
    /// Creates an organizer for `base_path` using `patterns` for classification.
    pub fn new(base_path: impl Into<PathBuf>, patterns: PatternSet) -> Self {
        Self {
            base_path: base_path.into(),
            patterns,
            excluded: Vec::new(),
        }
    }

    /// Never treats `path` as a candidate, e.g. the running executable.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.excluded.push(fs::canonicalize(&path).unwrap_or(path));
        self
    }

    /// Returns the directory whose top-level files get organized.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.excluded.iter().any(|excluded| *excluded == canonical)
    }

    /// Lists the entries directly inside the base path that are not directories.
    ///
    /// Symlinks are followed only to decide whether they point at a directory;
    /// a dangling link is still a candidate. Excluded paths are left out.
    /// Entries that cannot be listed or inspected are returned as failures so
    /// they get reported alongside the other files.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::ReadDirFailed` if the base path cannot be listed.
    pub fn scan(&self) -> OrganizeResult<ScanReport> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| OrganizeError::ReadDirFailed {
            path: self.base_path.clone(),
            source: e,
        })?;

        let mut scan = ScanReport::default();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    scan.failures.push(FileOutcome::Failed {
                        file: self.base_path.clone(),
                        error: OrganizeError::ReadDirFailed {
                            path: self.base_path.clone(),
                            source: e,
                        },
                    });
                    continue;
                }
            };

            let metadata = fs::metadata(&path).or_else(|_| fs::symlink_metadata(&path));
            match self.classify(path, metadata) {
                Some(Ok(candidate)) => scan.candidates.push(candidate),
                Some(Err(failure)) => scan.failures.push(failure),
                None => {}
            }
        }

        scan.candidates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scan)
    }

    /// Decides what a listed entry is, given its (link-following) metadata.
    ///
    /// Returns `None` for directories and excluded paths.
    fn classify(
        &self,
        path: PathBuf,
        metadata: io::Result<fs::Metadata>,
    ) -> Option<Result<CandidateFile, FileOutcome>> {
        let metadata = match metadata {
            Ok(metadata) => metadata,
            Err(e) => {
                return Some(Err(FileOutcome::Failed {
                    error: OrganizeError::MetadataReadFailed {
                        path: path.clone(),
                        source: e,
                    },
                    file: path,
                }));
            }
        };

        if metadata.is_dir() || self.is_excluded(&path) {
            return None;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Some(Ok(CandidateFile { name, path }))
    }

    /// Classifies one file and moves it into its title folder.
    ///
    /// The folder is created when absent. A same-named file already present
    /// in the folder is never overwritten; the source stays in place instead.
    pub fn organize_file(&self, file: &CandidateFile) -> FileOutcome {
        let unmatched = || FileOutcome::Unmatched {
            file: file.path.clone(),
        };

        let Some(file_name) = file.path.file_name() else {
            return unmatched();
        };
        // Lossy names would merge distinct byte sequences into one folder
        let Some(exact_name) = file_name.to_str() else {
            return unmatched();
        };
        let Some(matched) = self.patterns.match_title(exact_name) else {
            return unmatched();
        };
        let folder = sanitize_folder_name(&matched.title);
        if !is_usable_folder_name(&folder) {
            return unmatched();
        }

        let folder_path = self.base_path.join(&folder);
        if let Err(error) = Self::ensure_folder(&folder_path) {
            return FileOutcome::Failed {
                file: file.path.clone(),
                error,
            };
        }

        let destination = folder_path.join(file_name);

        // symlink_metadata so that a dangling link also counts as taken
        if fs::symlink_metadata(&destination).is_ok() {
            return FileOutcome::Skipped {
                file: file.path.clone(),
                destination,
            };
        }

        match Self::move_file(&file.path, &destination) {
            Ok(()) => FileOutcome::Moved(MovedFile {
                original_path: file.path.clone(),
                new_path: destination,
                folder,
            }),
            Err(error) => FileOutcome::Failed {
                file: file.path.clone(),
                error,
            },
        }
    }

    /// Scans the base path and organizes every candidate.
    ///
    /// # Errors
    ///
    /// Only fails if the base path cannot be listed; per-file problems end up
    /// in the returned report.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use episort::file_organizer::FileOrganizer;
    /// use episort::title_pattern::PatternSet;
    ///
    /// let organizer = FileOrganizer::new("/path/to/anime", PatternSet::builtin().unwrap());
    /// let report = organizer.organize().unwrap();
    /// println!("{} file(s) moved", report.moved.len());
    /// ```
    pub fn organize(&self) -> OrganizeResult<OrganizeReport> {
        let scan = self.scan()?;
        let mut report = OrganizeReport::default();
        for failure in scan.failures {
            report.record(failure);
        }
        for file in &scan.candidates {
            report.record(self.organize_file(file));
        }
        Ok(report)
    }

    /// Creates `folder_path` if it does not exist yet.
    fn ensure_folder(folder_path: &Path) -> OrganizeResult<()> {
        match fs::metadata(folder_path) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(OrganizeError::DestinationNotADirectory {
                path: folder_path.to_path_buf(),
            }),
            Err(_) => fs::create_dir(folder_path).map_err(|e| {
                OrganizeError::DirectoryCreationFailed {
                    path: folder_path.to_path_buf(),
                    source: e,
                }
            }),
        }
    }

    /// Moves `source` to `destination`, keeping its modification time.
    ///
    /// Falls back to copy and delete when the two paths are on different
    /// devices. A symlink is moved as a link.
    ///
    /// # Arguments
    ///
    /// * `source` - The file to move
    /// * `destination` - The full target path, including the file name
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::FileMoveFailure` if nothing was moved, or
    /// `OrganizeError::SourceRemovalFailed` if the fallback copied the file
    /// but could not delete the original.
    pub fn move_file(source: &Path, destination: &Path) -> OrganizeResult<()> {
        match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                Self::copy_then_remove(source, destination)
            }
            Err(e) => Err(OrganizeError::FileMoveFailure {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                source_error: e,
            }),
        }
    }

    fn copy_then_remove(source: &Path, destination: &Path) -> OrganizeResult<()> {
        let move_failure = |e: io::Error| OrganizeError::FileMoveFailure {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: e,
        };

        #[cfg(unix)]
        if fs::symlink_metadata(source).is_ok_and(|m| m.file_type().is_symlink()) {
            let target = fs::read_link(source).map_err(move_failure)?;
            std::os::unix::fs::symlink(&target, destination).map_err(move_failure)?;
            return Self::remove_copied_source(source, destination);
        }

        let metadata = fs::metadata(source).map_err(|e| OrganizeError::MetadataReadFailed {
            path: source.to_path_buf(),
            source: e,
        })?;

        if let Err(e) = fs::copy(source, destination) {
            // Best effort: don't leave a partial copy behind
            let _ = fs::remove_file(destination);
            return Err(move_failure(e));
        }

        filetime::set_file_mtime(
            destination,
            FileTime::from_last_modification_time(&metadata),
        )
        .map_err(|e| OrganizeError::TimestampUpdateFailed {
            path: destination.to_path_buf(),
            source: e,
        })?;

        Self::remove_copied_source(source, destination)
    }

    fn remove_copied_source(source: &Path, destination: &Path) -> OrganizeResult<()> {
        fs::remove_file(source).map_err(|e| OrganizeError::SourceRemovalFailed {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: e,
        })
    }
}
