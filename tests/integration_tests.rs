/// Integration tests for dexsort
///
/// These tests drive the public `Organizer` API end to end against real
/// temporary directories.
///
/// Test categories:
/// 1. Extension-based organization
/// 2. Filtering of ignored and in-progress files
/// 3. Deduplication and name collisions
/// 4. Date-based organization
/// 5. Dry-run mode
/// 6. Undo and history
/// 7. Recursive mode and cleanup
/// 8. Destinations stay inside the source directory
use chrono::{DateTime, Local};
use dexsort::hasher::hash_file;
use dexsort::history::{HISTORY_FILE_NAME, MAX_BATCHES};
use dexsort::{
    Config, FolderMapping, Level, MemoryReporter, OrganizeError, Organizer, OrganizerOptions,
    Strategy,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory to organize, with helpers to populate and inspect it.
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

    /// Canonical form of the fixture path, as the organizer records it.
    fn canonical(&self) -> PathBuf {
        fs::canonicalize(self.path()).expect("Failed to canonicalize fixture path")
    }

    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_text_file(&self, name: &str, content: &str) {
        self.create_file(name, content.as_bytes());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    /// Count files in the root (non-recursive), excluding the history file.
    fn count_root_files(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok())
            .filter(|e| e.file_name() != HISTORY_FILE_NAME)
            .filter(|e| e.metadata().map(|m| m.is_file()).unwrap_or(false))
            .count()
    }

    fn count_dirs(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok())
            .filter(|e| e.metadata().map(|m| m.is_dir()).unwrap_or(false))
            .count()
    }

    fn organizer(&self, config: Config, options: OrganizerOptions) -> Organizer<MemoryReporter> {
        Organizer::new(self.path(), config, options, MemoryReporter::new())
            .expect("Failed to create organizer")
    }
}

fn documents_and_images() -> Config {
    Config {
        mappings: vec![
            FolderMapping::new("Documents", ["pdf", "txt"]),
            FolderMapping::new("Images", ["jpg"]),
        ],
        ..Config::default()
    }
}

fn dry_run() -> OrganizerOptions {
    OrganizerOptions {
        dry_run: true,
        ..Default::default()
    }
}

// ============================================================================
// Test Suite 1: Extension-based organization
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 0);
    assert_eq!(fixture.count_dirs(), 0);
    fixture.assert_not_exists(HISTORY_FILE_NAME);
}

#[test]
fn test_organize_documents_and_images() {
    let fixture = TestFixture::new();
    fixture.create_text_file("report.pdf", "pdf");
    fixture.create_text_file("photo.jpg", "jpg");
    fixture.create_text_file("notes.txt", "txt");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 3);
    fixture.assert_file_exists("Documents/report.pdf");
    fixture.assert_file_exists("Documents/notes.txt");
    fixture.assert_file_exists("Images/photo.jpg");
    assert_eq!(fixture.count_root_files(), 0);
    assert_eq!(report.per_folder.get("Documents"), Some(&2));
    assert_eq!(report.per_folder.get("Images"), Some(&1));
}

#[test]
fn test_unmapped_files_go_to_others() {
    let fixture = TestFixture::new();
    fixture.create_text_file("archive.zip", "zip");
    fixture.create_text_file("Makefile", "all:");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 2);
    fixture.assert_file_exists("Others/archive.zip");
    fixture.assert_file_exists("Others/Makefile");
}

#[test]
fn test_organize_twice_is_idempotent() {
    let fixture = TestFixture::new();
    fixture.create_text_file("report.pdf", "pdf");
    fixture.create_text_file("photo.jpg", "jpg");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    assert_eq!(organizer.organize().unwrap().moved, 2);
    let second = organizer.organize().unwrap();

    assert_eq!(second.moved, 0);
    assert_eq!(second.duplicates_removed, 0);
    assert_eq!(organizer.history().load(organizer.reporter()).len(), 1);
}

#[test]
fn test_missing_source_directory_is_fatal() {
    let fixture = TestFixture::new();
    let result = Organizer::new(
        &fixture.path().join("does-not-exist"),
        Config::default(),
        OrganizerOptions::default(),
        MemoryReporter::new(),
    );
    assert!(matches!(result, Err(OrganizeError::SourceNotFound { .. })));
}

// ============================================================================
// Test Suite 2: Filtering
// ============================================================================

#[test]
fn test_partial_downloads_are_left_in_place() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.tmp", "partial");
    fixture.create_text_file("b.crdownload", "partial");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 0);
    fixture.assert_file_exists("a.tmp");
    fixture.assert_file_exists("b.crdownload");
    assert_eq!(fixture.count_dirs(), 0);
}

#[test]
fn test_ignored_names_and_patterns_are_left_in_place() {
    let fixture = TestFixture::new();
    fixture.create_text_file("desktop.ini", "ini");
    fixture.create_text_file("Cargo.lock", "lock");
    fixture.create_text_file("notes.txt", "txt");
    let config = Config::from_toml_str(
        r#"
        ignore = ["desktop.ini"]
        ignore_patterns = ["*.lock"]

        [mappings]
        Documents = ["txt"]
        "#,
    )
    .expect("Failed to parse config");
    let organizer = fixture.organizer(config, OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 1);
    fixture.assert_file_exists("desktop.ini");
    fixture.assert_file_exists("Cargo.lock");
    fixture.assert_file_exists("Documents/notes.txt");
}

#[test]
fn test_history_and_excluded_files_are_never_moved() {
    let fixture = TestFixture::new();
    fixture.create_text_file("settings.toml", "[mappings]");
    fixture.create_text_file("first.txt", "1");
    let organizer = fixture.organizer(
        documents_and_images(),
        OrganizerOptions {
            exclusions: vec![fixture.path().join("settings.toml")],
            ..Default::default()
        },
    );
    organizer.organize().unwrap();

    fixture.create_text_file("second.txt", "2");
    organizer.organize().unwrap();

    fixture.assert_file_exists(HISTORY_FILE_NAME);
    fixture.assert_file_exists("settings.toml");
    fixture.assert_not_exists("Others");
    fixture.assert_file_exists("Documents/second.txt");
}

// ============================================================================
// Test Suite 3: Deduplication and collisions
// ============================================================================

#[test]
fn test_identical_file_is_deleted_and_existing_untouched() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Documents/report.pdf", "same content");
    fixture.create_text_file("report.pdf", "same content");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 0);
    assert_eq!(report.duplicates_removed, 1);
    fixture.assert_not_exists("report.pdf");
    fixture.assert_not_exists("Documents/report_1.pdf");
    assert_eq!(fixture.read("Documents/report.pdf"), "same content");
    // Nothing moved, so nothing to undo.
    fixture.assert_not_exists(HISTORY_FILE_NAME);
}

#[test]
fn test_same_name_different_content_keeps_both() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Documents/notes.txt", "old notes");
    fixture.create_text_file("notes.txt", "new notes");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 1);
    assert_eq!(fixture.read("Documents/notes.txt"), "old notes");
    assert_eq!(fixture.read("Documents/notes_1.txt"), "new notes");
}

#[test]
fn test_successive_identical_files_counted_once() {
    let fixture = TestFixture::new();
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    fixture.create_text_file("dup.txt", "duplicate bytes");
    assert_eq!(organizer.organize().unwrap().moved, 1);

    fixture.create_text_file("dup.txt", "duplicate bytes");
    let report = organizer.organize().unwrap();

    assert_eq!(report.moved, 0);
    assert_eq!(report.duplicates_removed, 1);
    fixture.assert_not_exists("dup.txt");
    fixture.assert_file_exists("Documents/dup.txt");
    fixture.assert_not_exists("Documents/dup_1.txt");
}

#[test]
fn test_repeated_collisions_count_upwards() {
    let fixture = TestFixture::new();
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    for i in 0..4 {
        fixture.create_text_file("draft.txt", &format!("version {}", i));
        assert_eq!(organizer.organize().unwrap().moved, 1);
    }

    assert_eq!(fixture.read("Documents/draft.txt"), "version 0");
    assert_eq!(fixture.read("Documents/draft_1.txt"), "version 1");
    assert_eq!(fixture.read("Documents/draft_2.txt"), "version 2");
    assert_eq!(fixture.read("Documents/draft_3.txt"), "version 3");
}

// ============================================================================
// Test Suite 4: Date-based organization
// ============================================================================

fn set_mtime(path: &Path, mtime: SystemTime) {
    let file = File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file");
    file.set_modified(mtime).expect("Failed to set mtime");
}

#[test]
fn test_date_strategy_buckets_by_modification_month() {
    let fixture = TestFixture::new();
    fixture.create_text_file("old.txt", "old");
    fixture.create_text_file("older.jpg", "older");
    let march = SystemTime::UNIX_EPOCH + Duration::from_secs(1_710_000_000);
    let january = SystemTime::UNIX_EPOCH + Duration::from_secs(1_705_000_000);
    set_mtime(&fixture.path().join("old.txt"), march);
    set_mtime(&fixture.path().join("older.jpg"), january);

    let organizer = fixture.organizer(
        documents_and_images(),
        OrganizerOptions {
            strategy: Some(Strategy::Date),
            ..Default::default()
        },
    );
    let report = organizer.organize().expect("Organize failed");

    let march_folder = DateTime::<Local>::from(march).format("%Y-%m").to_string();
    let january_folder = DateTime::<Local>::from(january).format("%Y-%m").to_string();
    assert_eq!(report.moved, 2);
    fixture.assert_file_exists(&format!("{}/old.txt", march_folder));
    fixture.assert_file_exists(&format!("{}/older.jpg", january_folder));
}

#[test]
fn test_date_strategy_from_config_with_custom_format() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("b.txt", "b");
    let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_710_000_000);
    set_mtime(&fixture.path().join("a.txt"), mtime);
    set_mtime(&fixture.path().join("b.txt"), mtime);

    let config = Config::from_toml_str(
        r#"
        default_strategy = "date"
        date_format = "%Y"
        "#,
    )
    .unwrap();
    let organizer = fixture.organizer(config, OrganizerOptions::default());
    organizer.organize().unwrap();

    let year = DateTime::<Local>::from(mtime).format("%Y").to_string();
    fixture.assert_file_exists(&format!("{}/a.txt", year));
    fixture.assert_file_exists(&format!("{}/b.txt", year));
}

// ============================================================================
// Test Suite 5: Dry-run mode
// ============================================================================

#[test]
fn test_dry_run_reports_without_changes() {
    let fixture = TestFixture::new();
    fixture.create_text_file("report.pdf", "pdf");
    fixture.create_text_file("photo.jpg", "jpg");
    fixture.create_text_file("Documents/dup.txt", "dup");
    fixture.create_text_file("dup.txt", "dup");
    let organizer = fixture.organizer(documents_and_images(), dry_run());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 2);
    assert_eq!(report.duplicates_removed, 1);
    fixture.assert_file_exists("report.pdf");
    fixture.assert_file_exists("photo.jpg");
    fixture.assert_file_exists("dup.txt");
    fixture.assert_not_exists("Images");
    fixture.assert_not_exists(HISTORY_FILE_NAME);
    assert!(
        organizer
            .reporter()
            .contains(Level::Info, "[DRY-RUN] Move")
    );
}

// ============================================================================
// Test Suite 6: Undo and history
// ============================================================================

#[test]
fn test_organize_then_undo_round_trip() {
    let fixture = TestFixture::new();
    fixture.create_text_file("report.pdf", "quarterly numbers");
    let before = hash_file(&fixture.path().join("report.pdf")).unwrap();
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    organizer.organize().unwrap();
    fixture.assert_file_exists("Documents/report.pdf");

    let report = organizer.undo().expect("Undo failed");

    assert_eq!(report.restored, 1);
    assert!(report.is_complete_success());
    let after = hash_file(&fixture.path().join("report.pdf")).unwrap();
    assert_eq!(before, after);
    fixture.assert_not_exists("Documents");
}

#[test]
fn test_undo_restores_renamed_files_to_original_names() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Documents/notes.txt", "existing");
    fixture.create_text_file("notes.txt", "incoming");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    organizer.organize().unwrap();
    fixture.assert_file_exists("Documents/notes_1.txt");

    organizer.undo().unwrap();

    assert_eq!(fixture.read("notes.txt"), "incoming");
    assert_eq!(fixture.read("Documents/notes.txt"), "existing");
    fixture.assert_not_exists("Documents/notes_1.txt");
}

#[test]
fn test_undo_batches_in_reverse_order() {
    let fixture = TestFixture::new();
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    fixture.create_text_file("first.txt", "1");
    organizer.organize().unwrap();
    fixture.create_text_file("second.jpg", "2");
    organizer.organize().unwrap();

    organizer.undo().unwrap();
    fixture.assert_file_exists("second.jpg");
    fixture.assert_file_exists("Documents/first.txt");
    fixture.assert_not_exists("Images");

    organizer.undo().unwrap();
    fixture.assert_file_exists("first.txt");
    fixture.assert_not_exists("Documents");

    let result = organizer.undo();
    assert!(matches!(result, Err(OrganizeError::NoHistory { .. })));
}

#[test]
fn test_history_records_absolute_paths() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.jpg", "jpg");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    organizer.organize().unwrap();

    let batches = organizer.history().load(organizer.reporter());
    let record = &batches[0].moves[0];
    assert!(record.src.is_absolute());
    assert_eq!(record.src, fixture.canonical().join("photo.jpg"));
    assert_eq!(record.dest, fixture.canonical().join("Images/photo.jpg"));
}

#[test]
fn test_history_keeps_only_newest_batches() {
    let fixture = TestFixture::new();
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    for i in 0..(MAX_BATCHES + 2) {
        fixture.create_text_file(&format!("file{}.txt", i), &i.to_string());
        organizer.organize().unwrap();
    }

    let batches = organizer.history().load(organizer.reporter());
    assert_eq!(batches.len(), MAX_BATCHES);
    assert_eq!(
        batches[0].moves[0].src,
        fixture.canonical().join("file2.txt")
    );
}

#[test]
fn test_corrupt_history_does_not_block_organizing() {
    let fixture = TestFixture::new();
    fixture.create_text_file(HISTORY_FILE_NAME, "definitely not json");
    fixture.create_text_file("report.pdf", "pdf");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 1);
    assert!(organizer.reporter().contains(Level::Warning, "corrupt"));
    assert_eq!(organizer.history().load(organizer.reporter()).len(), 1);
}

#[test]
fn test_undo_skips_files_moved_away_by_user() {
    let fixture = TestFixture::new();
    fixture.create_text_file("report.pdf", "pdf");
    fixture.create_text_file("photo.jpg", "jpg");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());
    organizer.organize().unwrap();

    fs::remove_file(fixture.path().join("Images/photo.jpg")).unwrap();
    let report = organizer.undo().expect("Undo failed");

    assert_eq!(report.restored, 1);
    assert_eq!(report.skipped.len(), 1);
    fixture.assert_file_exists("report.pdf");
    assert!(organizer.reporter().contains(Level::Warning, "not found"));
}

// ============================================================================
// Test Suite 7: Recursive mode and cleanup
// ============================================================================

#[test]
fn test_recursive_mode_collects_nested_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("inbox/2024/report.pdf", "pdf");
    fixture.create_text_file("inbox/photo.jpg", "jpg");
    fixture.create_text_file(".git/config.txt", "hidden");
    let organizer = fixture.organizer(
        documents_and_images(),
        OrganizerOptions {
            recursive: Some(true),
            ..Default::default()
        },
    );

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 2);
    fixture.assert_file_exists("Documents/report.pdf");
    fixture.assert_file_exists("Images/photo.jpg");
    fixture.assert_file_exists(".git/config.txt");
    fixture.assert_not_exists("inbox");

    // Files already in their folders stay put on the next run.
    assert_eq!(organizer.organize().unwrap().moved, 0);
}

#[test]
fn test_non_recursive_mode_ignores_subdirectories() {
    let fixture = TestFixture::new();
    fixture.create_text_file("inbox/report.pdf", "pdf");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 0);
    fixture.assert_file_exists("inbox/report.pdf");
}

#[test]
fn test_cleanup_removes_preexisting_empty_folders() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.path().join("stale/nested")).unwrap();
    fs::create_dir(fixture.path().join(".hidden")).unwrap();
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.removed_dirs.len(), 2);
    fixture.assert_not_exists("stale");
    assert!(fixture.path().join(".hidden").is_dir());
}

#[test]
fn test_hidden_folder_does_not_block_cleanup_after_undo() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.path().join(".git/objects")).unwrap();
    fixture.create_text_file("report.pdf", "pdf");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    organizer.organize().unwrap();
    organizer.undo().unwrap();

    fixture.assert_file_exists("report.pdf");
    fixture.assert_not_exists("Documents");
    assert!(fixture.path().join(".git/objects").is_dir());
}

#[test]
fn test_dotfiles_are_moved_in_both_modes() {
    let fixture = TestFixture::new();
    fixture.create_text_file(".env", "KEY=1");
    fixture.create_text_file("inbox/.profile", "export A=1");
    let organizer = fixture.organizer(
        documents_and_images(),
        OrganizerOptions {
            recursive: Some(true),
            ..Default::default()
        },
    );

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 2);
    fixture.assert_file_exists("Others/.env");
    fixture.assert_file_exists("Others/.profile");
}

// ============================================================================
// Test Suite 8: Destinations stay inside the source directory
// ============================================================================

#[test]
fn test_mapping_outside_source_is_rejected() {
    let result = Config::from_toml_str(
        r#"
        [mappings]
        "../escaped" = ["pdf"]
        "#,
    );
    assert!(matches!(
        result,
        Err(dexsort::ConfigError::InvalidMapping { .. })
    ));
}

#[test]
fn test_escaping_folders_fall_back_to_others() {
    let fixture = TestFixture::new();
    fixture.create_text_file("inbox/report.pdf", "pdf");
    let inbox = fixture.path().join("inbox");

    // Built directly, so config validation never sees these values.
    let by_extension = Config {
        mappings: vec![FolderMapping::new("../escaped", ["pdf"])],
        ..Config::default()
    };
    let organizer = Organizer::new(
        &inbox,
        by_extension,
        OrganizerOptions::default(),
        MemoryReporter::new(),
    )
    .unwrap();
    organizer.organize().unwrap();

    fixture.assert_file_exists("inbox/Others/report.pdf");
    fixture.assert_not_exists("escaped");

    fixture.create_text_file("inbox/a.txt", "txt");
    let by_date = Config {
        default_strategy: Strategy::Date,
        date_format: "..".to_string(),
        ..Config::default()
    };
    let organizer = Organizer::new(
        &inbox,
        by_date,
        OrganizerOptions::default(),
        MemoryReporter::new(),
    )
    .unwrap();
    organizer.organize().unwrap();

    fixture.assert_file_exists("inbox/Others/a.txt");
    fixture.assert_not_exists("a.txt");
}

#[test]
fn test_file_named_like_destination_folder_fails_clearly() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Others", "a file, not a folder");
    fixture.create_text_file("archive.zip", "zip");
    fixture.create_text_file("report.pdf", "pdf");
    let organizer = fixture.organizer(documents_and_images(), OrganizerOptions::default());

    let report = organizer.organize().expect("Organize failed");

    assert_eq!(report.moved, 1);
    assert_eq!(report.failed, 2);
    fixture.assert_file_exists("archive.zip");
    fixture.assert_file_exists("Others");
    fixture.assert_file_exists("Documents/report.pdf");
    assert!(
        organizer
            .reporter()
            .contains(Level::Error, "a file with that name exists")
    );
}
