//! Folder modification time propagation.
//!
//! After organizing, every folder at or below the base path gets the
//! modification time of the newest file nested anywhere beneath it. A
//! symlink to a regular file counts with its target's time; links are never
//! descended into. Folders without any files are left alone. The walk visits directory
//! contents before the directory itself, so each folder's newest time is
//! known by the time it is reached and can be handed up to its parent.

use crate::file_organizer::OrganizeError;
use filetime::FileTime;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A single decision taken by the timestamp pass.
#[derive(Debug)]
pub enum FolderUpdate {
    /// The folder's modification time was set to `modified`.
    Updated { path: PathBuf, modified: FileTime },
    /// The folder has no files beneath it and was not touched.
    Untouched { path: PathBuf },
    /// Reading an entry or updating a folder failed.
    Failed { path: PathBuf, error: OrganizeError },
}

/// Outcome of a timestamp pass.
#[derive(Debug, Default)]
pub struct TimestampReport {
    /// Folders whose modification time was set, with the time applied.
    pub updated: Vec<(PathBuf, FileTime)>,
    /// Folders without any nested files.
    pub untouched: Vec<PathBuf>,
    /// Entries that could not be read or folders that could not be updated.
    pub failed: Vec<(PathBuf, String)>,
}

impl TimestampReport {
    fn record(&mut self, update: FolderUpdate) {
        match update {
            FolderUpdate::Updated { path, modified } => self.updated.push((path, modified)),
            FolderUpdate::Untouched { path } => self.untouched.push(path),
            FolderUpdate::Failed { path, error } => self.failed.push((path, error.to_string())),
        }
    }

    /// Returns the time applied to `path`, if it was updated.
    pub fn updated_time(&self, path: &Path) -> Option<FileTime> {
        self.updated
            .iter()
            .find(|(updated, _)| updated == path)
            .map(|(_, time)| *time)
    }
}

/// Syncs folder modification times with the newest file they contain.
pub struct FolderTimestampUpdater;

impl FolderTimestampUpdater {
    /// Updates `root` and every folder beneath it.
    pub fn update(root: &Path) -> TimestampReport {
        Self::update_with(root, |_| {})
    }

    /// Like [`FolderTimestampUpdater::update`], calling `on_update` for each
    /// decision as it is taken.
    ///
    /// Symbolic links are not followed. A link whose target is a regular file
    /// counts as a file with the target's modification time. Failures on one
    /// entry do not stop the walk.
    pub fn update_with<F>(root: &Path, mut on_update: F) -> TimestampReport
    where
        F: FnMut(&FolderUpdate),
    {
        let mut report = TimestampReport::default();
        let mut newest: HashMap<PathBuf, FileTime> = HashMap::new();

        let mut emit = |update: FolderUpdate, report: &mut TimestampReport| {
            on_update(&update);
            report.record(update);
        };

        for entry in WalkDir::new(root).contents_first(true).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    let error = OrganizeError::ReadDirFailed {
                        path: path.clone(),
                        source: io::Error::from(e),
                    };
                    emit(FolderUpdate::Failed { path, error }, &mut report);
                    continue;
                }
            };

            let path = entry.path();

            if entry.file_type().is_dir() {
                let Some(modified) = newest.remove(path) else {
                    emit(
                        FolderUpdate::Untouched {
                            path: path.to_path_buf(),
                        },
                        &mut report,
                    );
                    continue;
                };

                let update = match filetime::set_file_mtime(path, modified) {
                    Ok(()) => FolderUpdate::Updated {
                        path: path.to_path_buf(),
                        modified,
                    },
                    Err(e) => FolderUpdate::Failed {
                        path: path.to_path_buf(),
                        error: OrganizeError::TimestampUpdateFailed {
                            path: path.to_path_buf(),
                            source: e,
                        },
                    },
                };
                emit(update, &mut report);

                // The parent's newest time covers this folder's files either way
                if entry.depth() > 0
                    && let Some(parent) = path.parent()
                {
                    merge_newest(&mut newest, parent, modified);
                }
            } else if let Some(time) = file_time(&entry) {
                match time {
                    Ok(modified) => {
                        if let Some(parent) = path.parent() {
                            merge_newest(&mut newest, parent, modified);
                        }
                    }
                    Err(source) => {
                        let error = OrganizeError::MetadataReadFailed {
                            path: path.to_path_buf(),
                            source,
                        };
                        emit(
                            FolderUpdate::Failed {
                                path: path.to_path_buf(),
                                error,
                            },
                            &mut report,
                        );
                    }
                }
            }
        }

        report
    }

    /// Returns the newest modification time among all files beneath `dir`,
    /// counting symlinks to regular files the same way [`update_with`] does.
    ///
    /// [`update_with`]: FolderTimestampUpdater::update_with
    pub fn newest_file_time(dir: &Path) -> Option<FileTime> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter_map(|entry| file_time(&entry)?.ok())
            .max()
    }
}

/// The time `entry` contributes to its folder, or `None` if it is not a file.
fn file_time(entry: &DirEntry) -> Option<io::Result<FileTime>> {
    let file_type = entry.file_type();
    if file_type.is_file() {
        let metadata = entry.metadata().map_err(io::Error::from);
        Some(metadata.map(|m| FileTime::from_last_modification_time(&m)))
    } else if file_type.is_symlink() {
        // Dangling links and links to folders contribute nothing
        fs::metadata(entry.path())
            .ok()
            .filter(|m| m.is_file())
            .map(|m| Ok(FileTime::from_last_modification_time(&m)))
    } else {
        None
    }
}

fn merge_newest(newest: &mut HashMap<PathBuf, FileTime>, dir: &Path, candidate: FileTime) {
    newest
        .entry(dir.to_path_buf())
        .and_modify(|current| {
            if candidate > *current {
                *current = candidate;
            }
        })
        .or_insert(candidate);
}
