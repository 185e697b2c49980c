//! episort - sort loose anime episodes and movies into per-title folders
//!
//! This library classifies filenames with an ordered list of regex patterns,
//! moves each matched file into a folder named after its sanitized title, and
//! then sets every folder's modification time to that of the newest file it
//! contains.

pub mod cli;
pub mod file_organizer;
pub mod folder_timestamps;
pub mod output;
pub mod sanitize;
pub mod title_pattern;

pub use file_organizer::{FileOrganizer, FileOutcome, OrganizeError, OrganizeReport};
pub use folder_timestamps::{FolderTimestampUpdater, TimestampReport};
pub use sanitize::sanitize_folder_name;
pub use title_pattern::{PatternError, PatternSet, TitlePattern};

pub use cli::{RunReport, run_cli};
