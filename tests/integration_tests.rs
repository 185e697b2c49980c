//! Integration tests for episort
//!
//! These tests run both phases end to end on temporary directories.
//!
//! Test categories:
//! 1. Episode and movie organization
//! 2. Collisions, unmatched files and idempotency
//! 3. Folder timestamp propagation
//! 4. Error scenarios

use episort::cli::{organize_directory, run_cli};
use episort::file_organizer::FileOrganizer;
use episort::folder_timestamps::FolderTimestampUpdater;
use episort::sanitize::INVALID_FOLDER_CHARS;
use episort::title_pattern::{PatternSet, TitlePattern};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file with a pinned modification time (seconds since the epoch).
    fn create_file(&self, rel_path: &str, mtime: i64) -> PathBuf {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, rel_path).expect("Failed to write file");
        filetime::set_file_mtime(&file_path, FileTime::from_unix_time(mtime, 0))
            .expect("Failed to set mtime");
        file_path
    }

    fn organizer(&self) -> FileOrganizer {
        FileOrganizer::new(self.path(), PatternSet::builtin().expect("built-in patterns"))
    }

    fn mtime(&self, rel_path: &str) -> FileTime {
        let metadata = fs::metadata(self.path().join(rel_path)).expect("Failed to stat");
        FileTime::from_last_modification_time(&metadata)
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn list_dirs_recursive(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.path().to_path_buf()];
        Self::walk_dirs(self.path(), &mut dirs);
        dirs
    }

    fn walk_dirs(dir: &Path, dirs: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    dirs.push(path.clone());
                    Self::walk_dirs(&path, dirs);
                }
            }
        }
    }
}

// ============================================================================
// Organization
// ============================================================================

#[test]
fn test_episode_moved_and_folder_timestamp_synced() {
    let fixture = TestFixture::new();
    let name = "[SubsPlease] Demo - 03v2 (720p) [ABC12345].mkv";
    fixture.create_file(name, 1_650_000_000);

    let report = organize_directory(&fixture.organizer()).expect("run failed");

    fixture.assert_dir_exists("Demo");
    fixture.assert_file_exists(&format!("Demo/{}", name));
    fixture.assert_file_not_exists(name);
    assert_eq!(report.organize.moved.len(), 1);
    assert_eq!(
        fixture.mtime("Demo"),
        FileTime::from_unix_time(1_650_000_000, 0)
    );
    assert_eq!(
        fixture.mtime(&format!("Demo/{}", name)),
        FileTime::from_unix_time(1_650_000_000, 0)
    );
}

#[test]
fn test_mixed_library_is_sorted() {
    let fixture = TestFixture::new();
    fixture.create_file("[SubsPlease] Aparida - 09.5 (720p) [F40254DB].mkv", 1_600_000_100);
    fixture.create_file("[SubsPlease] Aparida - 10 (720p) [0A0B0C0D].mkv", 1_600_000_200);
    fixture.create_file(
        "I Want to Eat Your Pancreas (2018) 1080p AV1 Opus [UnAV1Chain] v2.mkv",
        1_500_000_000,
    );
    fixture.create_file("todo.txt", 1_400_000_000);

    let report = organize_directory(&fixture.organizer()).expect("run failed");

    assert_eq!(report.organize.moved.len(), 3);
    assert_eq!(report.organize.unmatched.len(), 1);
    fixture.assert_file_exists("Aparida/[SubsPlease] Aparida - 09.5 (720p) [F40254DB].mkv");
    fixture.assert_file_exists("Aparida/[SubsPlease] Aparida - 10 (720p) [0A0B0C0D].mkv");
    fixture.assert_file_exists(
        "I Want to Eat Your Pancreas/I Want to Eat Your Pancreas (2018) 1080p AV1 Opus [UnAV1Chain] v2.mkv",
    );
    fixture.assert_file_exists("todo.txt");

    assert_eq!(
        fixture.mtime("Aparida"),
        FileTime::from_unix_time(1_600_000_200, 0)
    );
    assert_eq!(
        fixture.mtime("I Want to Eat Your Pancreas"),
        FileTime::from_unix_time(1_500_000_000, 0)
    );
}

#[test]
fn test_sanitized_folder_names_are_valid() {
    let fixture = TestFixture::new();
    let names = [
        "[Grp] Re:Zero - 01 [ABCDEF12].mkv",
        "[Grp]  Spaced Out   - 02 [ABCDEF12].mkv",
        "What If? (2021) WEB.mkv",
    ];
    for name in names {
        if fs::write(fixture.path().join(name), "x").is_err() {
            // Skip on filesystems that reject these characters in file names
            return;
        }
    }

    let report = fixture.organizer().organize().expect("organize failed");
    assert_eq!(report.moved.len(), names.len());

    for moved in &report.moved {
        assert!(!moved.folder.chars().any(|c| INVALID_FOLDER_CHARS.contains(&c)));
        assert_eq!(moved.folder, moved.folder.trim());
    }
    fixture.assert_dir_exists("Re_Zero");
    fixture.assert_dir_exists("Spaced Out");
    fixture.assert_dir_exists("What If_");
}

#[test]
fn test_weird_title_sanitized_before_folder_creation() {
    let fixture = TestFixture::new();
    let name = "Weird:Title*Name.mkv";
    if fs::write(fixture.path().join(name), "x").is_err() {
        return;
    }
    let patterns =
        PatternSet::new().with(TitlePattern::new("stem", r"^(?P<title>.+)\.mkv$").unwrap());

    let report = FileOrganizer::new(fixture.path(), patterns)
        .organize()
        .expect("organize failed");

    assert_eq!(report.moved.len(), 1);
    fixture.assert_file_exists(&format!("Weird_Title_Name/{}", name));
}

#[test]
fn test_custom_pattern_set_leaves_movie_unmatched() {
    let fixture = TestFixture::new();
    fixture.create_file("Movie Title (2020) 1080p.mkv", 1_600_000_000);
    let episodes_only = PatternSet::new().with(
        TitlePattern::new(
            "episode",
            r"^\[[^\]]+\]\s+(?P<title>.*?)\s*-\s*\d+.*\.[A-Za-z0-9]+$",
        )
        .unwrap(),
    );

    let report = organize_directory(&FileOrganizer::new(fixture.path(), episodes_only))
        .expect("run failed");

    assert_eq!(report.organize.moved.len(), 0);
    assert_eq!(
        report.organize.unmatched,
        vec![fixture.path().join("Movie Title (2020) 1080p.mkv")]
    );
    fixture.assert_file_exists("Movie Title (2020) 1080p.mkv");
}

#[test]
fn test_existing_subfolders_are_not_scanned() {
    let fixture = TestFixture::new();
    let nested = "Inbox/[SubsPlease] Demo - 01 (720p) [ABC12345].mkv";
    fixture.create_file(nested, 1_600_000_000);

    let report = fixture.organizer().organize().expect("organize failed");

    assert_eq!(report.total_processed(), 0);
    fixture.assert_file_exists(nested);
    fixture.assert_file_not_exists("Demo");
}

#[test]
fn test_excluded_file_is_left_alone() {
    let fixture = TestFixture::new();
    let me = fixture.create_file("Organizer Build (2024) release.exe", 1_700_000_000);

    let organizer = fixture.organizer().exclude(&me);
    let report = organizer.organize().expect("organize failed");

    assert_eq!(report.total_processed(), 0);
    fixture.assert_file_exists("Organizer Build (2024) release.exe");
}

// ============================================================================
// Collisions and idempotency
// ============================================================================

#[test]
fn test_destination_collision_leaves_both_files() {
    let fixture = TestFixture::new();
    let name = "[SubsPlease] Title - 05 (1080p) [DEADBEEF].mkv";
    fixture.create_file(&format!("Title/{}", name), 1_500_000_000);
    fs::write(fixture.path().join(name), "newer download").unwrap();

    let report = organize_directory(&fixture.organizer()).expect("run failed");

    assert_eq!(report.organize.skipped, vec![fixture.path().join(name)]);
    assert!(report.organize.moved.is_empty());
    assert_eq!(
        fs::read_to_string(fixture.path().join(name)).unwrap(),
        "newer download"
    );
    assert_eq!(
        fs::read_to_string(fixture.path().join("Title").join(name)).unwrap(),
        format!("Title/{}", name)
    );
}

#[test]
fn test_second_run_moves_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("[SubsPlease] Demo - 01 (720p) [ABC12345].mkv", 1_600_000_000);
    fixture.create_file("[SubsPlease] Demo - 02 (720p) [ABC12346].mkv", 1_600_000_500);
    fixture.create_file("Spirited Away (2001) BD.mkv", 1_300_000_000);

    let first = organize_directory(&fixture.organizer()).expect("first run failed");
    assert_eq!(first.organize.moved.len(), 3);
    let demo_after_first = fixture.mtime("Demo");

    let second = organize_directory(&fixture.organizer()).expect("second run failed");
    assert_eq!(second.organize.moved.len(), 0);
    assert!(second.organize.failed.is_empty());
    assert!(second.timestamps.failed.is_empty());
    assert_eq!(fixture.mtime("Demo"), demo_after_first);
    assert_eq!(
        fixture.mtime("Spirited Away"),
        FileTime::from_unix_time(1_300_000_000, 0)
    );
}

#[test]
fn test_failure_on_one_file_does_not_stop_batch() {
    let fixture = TestFixture::new();
    // A regular file squats on the folder name the first episode needs
    fixture.create_file("Blocked", 1_000_000_000);
    fixture.create_file("[Grp] Blocked - 01 [ABCDEF12].mkv", 1_600_000_000);
    fixture.create_file("[Grp] Open - 01 [ABCDEF12].mkv", 1_600_000_000);

    let report = fixture.organizer().organize().expect("organize failed");

    assert_eq!(report.failed.len(), 1);
    assert_eq!(
        report.failed[0].0,
        fixture.path().join("[Grp] Blocked - 01 [ABCDEF12].mkv")
    );
    assert_eq!(report.moved.len(), 1);
    fixture.assert_file_exists("[Grp] Blocked - 01 [ABCDEF12].mkv");
    fixture.assert_file_exists("Open/[Grp] Open - 01 [ABCDEF12].mkv");
}

// ============================================================================
// Folder timestamps
// ============================================================================

#[test]
fn test_every_folder_matches_newest_nested_file() {
    let fixture = TestFixture::new();
    fixture.create_file("Show/Season 1/01.mkv", 1_400_000_000);
    fixture.create_file("Show/Season 2/01.mkv", 1_450_000_000);
    fixture.create_file("Show/Season 2/Extras/nced.mkv", 1_480_000_000);
    fixture.create_file("Other/movie.mkv", 1_200_000_000);
    fs::create_dir_all(fixture.path().join("Empty/Deeper")).unwrap();
    fixture.create_file("[Grp] Fresh - 01 [ABCDEF12].mkv", 1_490_000_000);

    organize_directory(&fixture.organizer()).expect("run failed");

    for dir in fixture.list_dirs_recursive() {
        let Some(expected) = FolderTimestampUpdater::newest_file_time(&dir) else {
            continue;
        };
        let actual = FileTime::from_last_modification_time(&fs::metadata(&dir).unwrap());
        assert_eq!(actual, expected, "mtime mismatch for {}", dir.display());
    }

    assert_eq!(
        fixture.mtime("Show"),
        FileTime::from_unix_time(1_480_000_000, 0)
    );
    assert_eq!(
        fixture.mtime("Fresh"),
        FileTime::from_unix_time(1_490_000_000, 0)
    );
    assert_eq!(
        fixture.mtime("."),
        FileTime::from_unix_time(1_490_000_000, 0)
    );
}

#[test]
fn test_empty_folder_keeps_its_timestamp() {
    let fixture = TestFixture::new();
    fs::create_dir(fixture.path().join("Empty")).unwrap();
    let pinned = FileTime::from_unix_time(1_111_111_111, 0);
    filetime::set_file_mtime(fixture.path().join("Empty"), pinned).unwrap();
    fixture.create_file("[Grp] Show - 01 [ABCDEF12].mkv", 1_600_000_000);

    let report = organize_directory(&fixture.organizer()).expect("run failed");

    assert_eq!(fixture.mtime("Empty"), pinned);
    assert!(report.timestamps.untouched.contains(&fixture.path().join("Empty")));
}

// ============================================================================
// Error scenarios
// ============================================================================

#[test]
fn test_run_cli_invalid_target() {
    let result = run_cli(Some(Path::new("/non/existent/episort/target")));
    assert!(result.is_err());
}

#[test]
fn test_run_cli_file_target() {
    let fixture = TestFixture::new();
    let file = fixture.create_file("not-a-dir.mkv", 1_600_000_000);
    assert!(run_cli(Some(&file)).is_err());
}

#[test]
fn test_run_cli_organizes_target() {
    let fixture = TestFixture::new();
    fixture.create_file("[SubsPlease] Demo - 07 (720p) [ABC12345].mkv", 1_600_000_000);

    run_cli(Some(fixture.path())).expect("run_cli failed");

    fixture.assert_file_exists("Demo/[SubsPlease] Demo - 07 (720p) [ABC12345].mkv");
}
