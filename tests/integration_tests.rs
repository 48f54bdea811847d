//! Integration tests for datetidy
//!
//! These tests run the organizer end to end against temporary source and
//! destination directories whose files carry controlled modification times.
//!
//! Test categories:
//! 1. Basic organization and layout
//! 2. Video separation
//! 3. Repeated runs
//! 4. Partial failures
//! 5. Non-regular entries
//! 6. CLI, dry run and configuration

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use datetidy::cli::{Cli, RunOutcome, run_cli};
use datetidy::file_organizer::{FileOrganizer, SilentReporter, organize};
use datetidy::{OrganizeError, RunMarker};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A source directory and a destination directory for one test.
struct TestFixture {
    source: TempDir,
    destination: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        TestFixture {
            source: TempDir::new().expect("Failed to create source directory"),
            destination: TempDir::new().expect("Failed to create destination directory"),
        }
    }

    fn source(&self) -> &Path {
        self.source.path()
    }

    fn destination(&self) -> &Path {
        self.destination.path()
    }

    /// Create a file in the source directory with the given modification time.
    fn create_file(&self, name: &str, modified: DateTime<Utc>) -> PathBuf {
        self.create_file_with(name, name, modified)
    }

    fn create_file_with(&self, name: &str, content: &str, modified: DateTime<Utc>) -> PathBuf {
        let path = self.source().join(name);
        fs::write(&path, content).expect("Failed to write file");
        File::options()
            .write(true)
            .open(&path)
            .and_then(|file| file.set_modified(SystemTime::from(modified)))
            .expect("Failed to set modification time");
        path
    }

    fn assert_moved(&self, rel_path: &str, original_name: &str) {
        let path = self.destination().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
        assert_eq!(
            fs::read_to_string(&path).expect("Failed to read moved file"),
            original_name,
            "Moved file should keep its content"
        );
        assert!(
            !self.source().join(original_name).exists(),
            "Original should be gone: {}",
            original_name
        );
    }

    /// Count regular files left in the source directory.
    fn remaining_in_source(&self) -> usize {
        fs::read_dir(self.source())
            .expect("Failed to read directory")
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .count()
    }

    /// List all files under the destination, relative to it.
    fn destination_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.destination(), &mut files);
        let mut relative: Vec<_> = files
            .into_iter()
            .map(|p| p.strip_prefix(self.destination()).unwrap().to_path_buf())
            .collect();
        relative.sort();
        relative
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }

    /// A CLI invocation with an empty config so no user config is picked up.
    fn cli(&self, config: &str) -> Cli {
        let config_path = self.destination().join("datetidy.toml");
        fs::write(&config_path, config).expect("Failed to write config");
        Cli {
            config: Some(config_path),
            ..Default::default()
        }
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

fn started(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 5)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

const DAY_FOLDER_MAY_3: &str = "2024/05/03 - MOVED 2025.08.05 10.00.00";

// ============================================================================
// Test Suite 1: Basic Organization
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();

    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert_eq!(summary.attempted(), 0);
    assert!(summary.is_complete_success());
    assert!(fixture.destination_files().is_empty());
}

#[test]
fn test_organize_single_raw_file() {
    let fixture = TestFixture::new();
    fixture.create_file("DSC_0001.NEF", at(2024, 5, 3, 14));

    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert_eq!(summary.moved(), 1);
    fixture.assert_moved(&format!("{}/DSC_0001.NEF", DAY_FOLDER_MAY_3), "DSC_0001.NEF");
}

#[test]
fn test_every_file_accounted_for() {
    let fixture = TestFixture::new();
    for i in 0..20 {
        fixture.create_file(
            &format!("IMG_{:04}.jpg", i),
            at(2023, (i % 12) + 1, (i % 28) + 1, i % 24),
        );
    }

    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert_eq!(summary.attempted(), 20);
    assert_eq!(summary.moved(), 20);
    assert_eq!(fixture.remaining_in_source(), 0);
    assert_eq!(fixture.destination_files().len(), 20);
}

#[test]
fn test_same_utc_day_shares_one_folder() {
    let fixture = TestFixture::new();
    fixture.create_file("early.nef", Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 1).unwrap());
    fixture.create_file("late.nef", Utc.with_ymd_and_hms(2024, 5, 3, 23, 59, 59).unwrap());
    fixture.create_file("next.nef", Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap());

    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert_eq!(summary.moved_per_day.len(), 2);
    fixture.assert_moved(&format!("{}/early.nef", DAY_FOLDER_MAY_3), "early.nef");
    fixture.assert_moved(&format!("{}/late.nef", DAY_FOLDER_MAY_3), "late.nef");
    fixture.assert_moved("2024/05/04 - MOVED 2025.08.05 10.00.00/next.nef", "next.nef");
}

#[test]
fn test_missing_year_and_month_are_created() {
    let fixture = TestFixture::new();
    fixture.create_file("a.nef", at(2024, 5, 3, 9));
    assert!(!fixture.destination().join("2024/05").exists());

    organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert!(fixture.destination().join("2024/05").is_dir());
    fixture.assert_moved(&format!("{}/a.nef", DAY_FOLDER_MAY_3), "a.nef");
}

#[test]
fn test_existing_month_directory_is_reused() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.destination().join("2024/05/01 - older")).unwrap();
    fixture.create_file("a.nef", at(2024, 5, 3, 9));

    organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert!(fixture.destination().join("2024/05/01 - older").is_dir());
    fixture.assert_moved(&format!("{}/a.nef", DAY_FOLDER_MAY_3), "a.nef");
}

// ============================================================================
// Test Suite 2: Video Separation
// ============================================================================

#[test]
fn test_videos_go_to_videos_folder() {
    let fixture = TestFixture::new();
    fixture.create_file("clip.MOV", at(2024, 5, 3, 9));
    fixture.create_file("trip.mp4", at(2024, 5, 3, 10));
    fixture.create_file("DSC_0001.NEF", at(2024, 5, 3, 11));

    organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    fixture.assert_moved(&format!("{}/Videos/clip.MOV", DAY_FOLDER_MAY_3), "clip.MOV");
    fixture.assert_moved(&format!("{}/Videos/trip.mp4", DAY_FOLDER_MAY_3), "trip.mp4");
    fixture.assert_moved(&format!("{}/DSC_0001.NEF", DAY_FOLDER_MAY_3), "DSC_0001.NEF");
}

#[test]
fn test_video_folder_can_be_disabled() {
    let fixture = TestFixture::new();
    fixture.create_file("clip.mkv", at(2024, 5, 3, 9));

    let organizer = FileOrganizer::new(fixture.destination(), RunMarker::new(started(10, 0, 0)))
        .separate_videos(false);
    let plan = organizer.plan(FileOrganizer::scan(fixture.source()).unwrap());
    let summary = FileOrganizer::execute(&plan, &mut SilentReporter);

    assert!(summary.is_complete_success());
    fixture.assert_moved(&format!("{}/clip.mkv", DAY_FOLDER_MAY_3), "clip.mkv");
}

// ============================================================================
// Test Suite 3: Repeated Runs
// ============================================================================

#[test]
fn test_second_run_never_overwrites_first() {
    let fixture = TestFixture::new();
    fixture.create_file("DSC_0001.NEF", at(2024, 5, 3, 9));
    organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    // Same name, same day, new content, later run
    fixture.create_file_with("DSC_0001.NEF", "second", at(2024, 5, 3, 9));
    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 1)).unwrap();

    assert!(summary.is_complete_success());
    let first = fixture.destination().join(format!("{}/DSC_0001.NEF", DAY_FOLDER_MAY_3));
    let second = fixture
        .destination()
        .join("2024/05/03 - MOVED 2025.08.05 10.00.01/DSC_0001.NEF");
    assert_eq!(fs::read_to_string(first).unwrap(), "DSC_0001.NEF");
    assert_eq!(fs::read_to_string(second).unwrap(), "second");
}

#[test]
fn test_rerun_with_same_marker_reports_collision() {
    let fixture = TestFixture::new();
    fixture.create_file("a.nef", at(2024, 5, 3, 9));
    organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    fixture.create_file("a.nef", at(2024, 5, 3, 9));
    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert_eq!(summary.failed(), 1);
    assert!(matches!(
        summary.failures[0].error,
        OrganizeError::DestinationExists { .. }
    ));
    assert!(fixture.source().join("a.nef").exists());
}

// ============================================================================
// Test Suite 4: Partial Failures
// ============================================================================

#[test]
fn test_failure_in_middle_does_not_stop_batch() {
    let fixture = TestFixture::new();
    fixture.create_file("first.nef", at(2024, 5, 1, 9));
    fixture.create_file("second.nef", at(2024, 5, 2, 9));
    fixture.create_file("third.nef", at(2024, 5, 3, 9));

    // A file where the second day's folder should be makes its creation fail
    let blocker = fixture.destination().join("2024/05/02 - MOVED 2025.08.05 10.00.00");
    fs::create_dir_all(blocker.parent().unwrap()).unwrap();
    fs::write(&blocker, "not a directory").unwrap();

    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert_eq!(summary.moved(), 2);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.attempted(), 3);
    assert_eq!(summary.failures[0].source, fixture.source().join("second.nef"));
    assert_eq!(
        summary.failures[0].destination,
        blocker.join("second.nef")
    );
    assert!(!summary.failures[0].error.to_string().is_empty());

    fixture.assert_moved("2024/05/01 - MOVED 2025.08.05 10.00.00/first.nef", "first.nef");
    fixture.assert_moved(&format!("{}/third.nef", DAY_FOLDER_MAY_3), "third.nef");
    assert!(fixture.source().join("second.nef").exists());
}

#[cfg(unix)]
#[test]
fn test_permission_denied_move_does_not_stop_batch() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new();
    fixture.create_file("first.nef", at(2024, 5, 1, 9));
    fixture.create_file("second.nef", at(2024, 5, 2, 9));
    fixture.create_file("third.nef", at(2024, 5, 3, 9));

    // The second day's folder exists but can't be written to
    let locked = fixture.destination().join("2024/05/02 - MOVED 2025.08.05 10.00.00");
    fs::create_dir_all(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
    if fs::write(locked.join(".write_check"), "").is_ok() {
        // Running as root, permissions aren't enforced
        return;
    }

    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(summary.moved(), 2);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.failures[0].source, fixture.source().join("second.nef"));
    match &summary.failures[0].error {
        OrganizeError::MoveFailed { source, .. } => {
            assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
        }
        other => panic!("expected MoveFailed, got {other:?}"),
    }

    fixture.assert_moved("2024/05/01 - MOVED 2025.08.05 10.00.00/first.nef", "first.nef");
    fixture.assert_moved(&format!("{}/third.nef", DAY_FOLDER_MAY_3), "third.nef");
    assert!(fixture.source().join("second.nef").exists());
}

#[test]
fn test_unreadable_source_is_fatal() {
    let fixture = TestFixture::new();
    let missing = fixture.source().join("does-not-exist");

    let result = organize(&missing, fixture.destination(), started(10, 0, 0));

    assert!(matches!(result, Err(OrganizeError::SourceUnreadable { .. })));
    assert!(fixture.destination_files().is_empty());
}

// ============================================================================
// Test Suite 5: Non-regular Entries
// ============================================================================

#[test]
fn test_subdirectories_are_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_file("a.nef", at(2024, 5, 3, 9));
    fs::create_dir(fixture.source().join("edits")).unwrap();
    fs::write(fixture.source().join("edits/a_edit.jpg"), "edit").unwrap();

    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert_eq!(summary.attempted(), 1);
    assert!(summary.failures.is_empty());
    assert!(fixture.source().join("edits/a_edit.jpg").is_file());
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_left_alone() {
    let fixture = TestFixture::new();
    let target = fixture.create_file("a.nef", at(2024, 5, 3, 9));
    let link = fixture.source().join("link.nef");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let summary = organize(fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    assert_eq!(summary.attempted(), 1);
    assert!(summary.failures.is_empty());
    assert!(fs::symlink_metadata(&link).is_ok());
}

// ============================================================================
// Test Suite 6: CLI, Dry Run and Configuration
// ============================================================================

#[test]
fn test_cli_run_moves_files() {
    let fixture = TestFixture::new();
    fixture.create_file("a.nef", at(2024, 5, 3, 9));
    let cli = fixture.cli("");

    let outcome =
        run_cli(&cli, fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    match outcome {
        RunOutcome::Completed(summary) => assert_eq!(summary.moved(), 1),
        RunOutcome::DryRun(_) => panic!("expected a real run"),
    }
    fixture.assert_moved(&format!("{}/a.nef", DAY_FOLDER_MAY_3), "a.nef");
}

#[test]
fn test_dry_run_moves_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("a.nef", at(2024, 5, 3, 9));
    fixture.create_file("b.mov", at(2024, 5, 4, 9));
    let cli = Cli {
        dry_run: true,
        ..fixture.cli("")
    };

    let outcome =
        run_cli(&cli, fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    match outcome {
        RunOutcome::DryRun(plan) => {
            assert_eq!(plan.len(), 2);
            assert_eq!(plan.groups().len(), 2);
        }
        RunOutcome::Completed(_) => panic!("expected a dry run"),
    }
    assert_eq!(fixture.remaining_in_source(), 2);
    assert_eq!(
        fixture.destination_files(),
        vec![PathBuf::from("datetidy.toml")]
    );
}

#[test]
fn test_cli_no_video_folder_flag() {
    let fixture = TestFixture::new();
    fixture.create_file("clip.webm", at(2024, 5, 3, 9));
    let cli = Cli {
        no_video_folder: true,
        ..fixture.cli("[organize]\nseparate_videos = true\n")
    };

    run_cli(&cli, fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    fixture.assert_moved(&format!("{}/clip.webm", DAY_FOLDER_MAY_3), "clip.webm");
}

#[test]
fn test_config_filters_leave_files_in_place() {
    let fixture = TestFixture::new();
    fixture.create_file("a.nef", at(2024, 5, 3, 9));
    fixture.create_file("Thumbs.db", at(2024, 5, 3, 9));
    fixture.create_file("a.xmp", at(2024, 5, 3, 9));
    let cli = fixture.cli(
        r#"
        [filters.exclude]
        filenames = ["Thumbs.db"]
        extensions = ["xmp"]
        "#,
    );

    let outcome =
        run_cli(&cli, fixture.source(), fixture.destination(), started(10, 0, 0)).unwrap();

    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected a real run");
    };
    assert_eq!(summary.moved(), 1);
    assert_eq!(summary.skipped.len(), 2);
    assert!(summary.failures.is_empty());
    assert!(fixture.source().join("Thumbs.db").exists());
    assert!(fixture.source().join("a.xmp").exists());
}

#[test]
fn test_invalid_config_stops_before_moving() {
    let fixture = TestFixture::new();
    fixture.create_file("a.nef", at(2024, 5, 3, 9));
    let cli = fixture.cli("[filters.exclude]\nregex = [\"[invalid(\"]\n");

    let result = run_cli(&cli, fixture.source(), fixture.destination(), started(10, 0, 0));

    assert!(result.is_err());
    assert_eq!(fixture.remaining_in_source(), 1);
}
