//! Integration tests for huriwake
//!
//! These tests drive the distributor end to end against real temporary
//! directories.
//!
//! Test categories:
//! 1. Basic distribution
//! 2. Rule priority and matching kinds
//! 3. Name conflicts
//! 4. Error scenarios
//! 5. Configuration and CLI

use clap::Parser;
use huriwake::cli::{Cli, distribute_paths, run_cli};
use huriwake::config::ConfigLocation;
use huriwake::conflict::{ConflictDecision, ScriptedDecisions};
use huriwake::file_distributor::FileDistributor;
use huriwake::result_log::OutcomeStatus;
use huriwake::rule::{Rule, RuleKind, RuleSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary workspace with an `inbox` folder to distribute from.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fixture = TestFixture { temp_dir };
        fs::create_dir(fixture.inbox()).expect("Failed to create inbox");
        fixture
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn inbox(&self) -> PathBuf {
        self.path().join("inbox")
    }

    /// Create a file relative to the workspace root, creating parents.
    fn create_file(&self, rel_path: &str, content: &str) -> PathBuf {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content.as_bytes())
            .expect("Failed to write file content");
        file_path
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn rule(&self, kind: RuleKind, pattern: &str, dest: &str) -> Rule {
        Rule::new(kind, pattern, self.path().join(dest)).expect("valid rule")
    }
}

// ============================================================================
// Test Suite 1: Basic Distribution
// ============================================================================

#[test]
fn test_extension_rule_moves_matching_file_only() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/a.pdf", "pdf");
    fixture.create_file("inbox/b.txt", "txt");
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".pdf", "PDFs")]);

    let log = FileDistributor::new(&rules).run([fixture.inbox()], &mut ConflictDecision::Cancel);

    assert_eq!(log.len(), 1);
    let record = &log.records()[0];
    assert_eq!(record.file_name, "a.pdf");
    assert_eq!(record.status, OutcomeStatus::Moved);
    assert_eq!(record.detail, fixture.path().join("PDFs").display().to_string());
    assert!(record.matched_rule.as_deref().unwrap().contains(".pdf"));

    fixture.assert_file_exists("PDFs/a.pdf");
    fixture.assert_file_not_exists("inbox/a.pdf");
    fixture.assert_file_exists("inbox/b.txt");
}

#[test]
fn test_empty_inbox_twice_yields_empty_logs() {
    let fixture = TestFixture::new();
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".pdf", "PDFs")]);
    let distributor = FileDistributor::new(&rules);

    for _ in 0..2 {
        let log = distributor.run([fixture.inbox()], &mut ConflictDecision::Overwrite);
        assert!(log.is_empty());
    }
    fixture.assert_file_not_exists("PDFs");
}

#[test]
fn test_subfolders_are_not_descended_into() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/nested/deep.pdf", "pdf");
    fixture.create_file("inbox/top.pdf", "pdf");
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".pdf", "PDFs")]);

    let log = FileDistributor::new(&rules).run([fixture.inbox()], &mut ConflictDecision::Cancel);

    assert_eq!(log.len(), 1);
    fixture.assert_file_exists("PDFs/top.pdf");
    fixture.assert_file_exists("inbox/nested/deep.pdf");
}

#[test]
fn test_explicit_files_and_missing_paths() {
    let fixture = TestFixture::new();
    let second = fixture.create_file("elsewhere/second.pdf", "2");
    let first = fixture.create_file("inbox/first.pdf", "1");
    let missing = fixture.path().join("inbox/gone.pdf");
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".pdf", "PDFs")]);

    let log = FileDistributor::new(&rules)
        .run([&second, &missing, &first], &mut ConflictDecision::Cancel);

    let names: Vec<_> = log.records().iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["second.pdf", "first.pdf"]);
    fixture.assert_file_exists("PDFs/first.pdf");
    fixture.assert_file_exists("PDFs/second.pdf");
}

#[test]
fn test_unmatched_files_leave_no_trace() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/notes.md", "md");
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".pdf", "PDFs")]);
    let mut decisions = ScriptedDecisions::default();

    let log = FileDistributor::new(&rules).run([fixture.inbox()], &mut decisions);

    assert!(log.is_empty());
    assert!(decisions.asked().is_empty());
    fixture.assert_file_exists("inbox/notes.md");
}

// ============================================================================
// Test Suite 2: Rule Priority and Matching Kinds
// ============================================================================

#[test]
fn test_first_matching_rule_wins() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/invoice-2024.pdf", "inv");
    fixture.create_file("inbox/manual.pdf", "man");
    let rules = RuleSet::from(vec![
        fixture.rule(RuleKind::FilenameSubstring, "INVOICE", "Invoices"),
        fixture.rule(RuleKind::Extension, "pdf", "PDFs"),
    ]);

    FileDistributor::new(&rules).run([fixture.inbox()], &mut ConflictDecision::Cancel);

    fixture.assert_file_exists("Invoices/invoice-2024.pdf");
    fixture.assert_file_exists("PDFs/manual.pdf");
    fixture.assert_file_not_exists("PDFs/invoice-2024.pdf");
}

#[test]
fn test_extension_requires_exact_match() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/photo.JPG", "a");
    fixture.create_file("inbox/photo2.jpeg", "b");
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".jpg", "Photos")]);

    let log = FileDistributor::new(&rules).run([fixture.inbox()], &mut ConflictDecision::Cancel);

    assert_eq!(log.len(), 1);
    fixture.assert_file_exists("Photos/photo.JPG");
    fixture.assert_file_exists("inbox/photo2.jpeg");
}

#[test]
fn test_folder_name_rule_uses_parent_folder() {
    let fixture = TestFixture::new();
    fixture.create_file("Scanner Output/page1.png", "p");
    fixture.create_file("inbox/page2.png", "p");
    let rules = RuleSet::from(vec![fixture.rule(
        RuleKind::FolderNameSubstring,
        "scanner",
        "Scans",
    )]);

    let log = FileDistributor::new(&rules).run(
        [fixture.path().join("Scanner Output"), fixture.inbox()],
        &mut ConflictDecision::Cancel,
    );

    assert_eq!(log.len(), 1);
    fixture.assert_file_exists("Scans/page1.png");
    fixture.assert_file_exists("inbox/page2.png");
}

// ============================================================================
// Test Suite 3: Name Conflicts
// ============================================================================

#[test]
fn test_conflict_rename_unique() {
    let fixture = TestFixture::new();
    fixture.create_file("PDFs/a.pdf", "existing");
    fixture.create_file("inbox/a.pdf", "incoming");
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".pdf", "PDFs")]);
    let mut decisions = ScriptedDecisions::new([ConflictDecision::RenameUnique]);

    let log = FileDistributor::new(&rules).run([fixture.inbox()], &mut decisions);

    assert_eq!(decisions.asked(), ["a.pdf"]);
    let record = &log.records()[0];
    assert_eq!(record.status, OutcomeStatus::Moved);
    assert!(record.detail.contains("PDFs"));
    assert_eq!(
        record.destination.as_deref(),
        Some(fixture.path().join("PDFs/a_1.pdf").as_path())
    );
    assert_eq!(fixture.read("PDFs/a.pdf"), "existing");
    assert_eq!(fixture.read("PDFs/a_1.pdf"), "incoming");
}

#[test]
fn test_conflict_rename_continues_numbering() {
    let fixture = TestFixture::new();
    fixture.create_file("Docs/report.txt", "0");
    fixture.create_file("Docs/report_1.txt", "1");
    fixture.create_file("inbox/report.txt", "new");
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".txt", "Docs")]);

    FileDistributor::new(&rules).run([fixture.inbox()], &mut ConflictDecision::RenameUnique);

    assert_eq!(fixture.read("Docs/report_2.txt"), "new");
}

#[test]
fn test_conflict_cancel_leaves_both_files() {
    let fixture = TestFixture::new();
    fixture.create_file("PDFs/a.pdf", "existing");
    fixture.create_file("inbox/a.pdf", "incoming");
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".pdf", "PDFs")]);

    let log = FileDistributor::new(&rules).run([fixture.inbox()], &mut ConflictDecision::Cancel);

    assert_eq!(log.len(), 1);
    assert_eq!(log.records()[0].status, OutcomeStatus::Skipped);
    assert_eq!(fixture.read("inbox/a.pdf"), "incoming");
    assert_eq!(fixture.read("PDFs/a.pdf"), "existing");
}

#[test]
fn test_each_conflict_is_decided_separately() {
    let fixture = TestFixture::new();
    fixture.create_file("Out/one.txt", "old1");
    fixture.create_file("Out/two.txt", "old2");
    fixture.create_file("in1/one.txt", "new1");
    fixture.create_file("in2/two.txt", "new2");
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".txt", "Out")]);
    let mut decisions =
        ScriptedDecisions::new([ConflictDecision::Overwrite, ConflictDecision::Cancel]);

    let log = FileDistributor::new(&rules).run(
        [fixture.path().join("in1"), fixture.path().join("in2")],
        &mut decisions,
    );

    let statuses: Vec<_> = log.records().iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![OutcomeStatus::Moved, OutcomeStatus::Skipped]);
    assert_eq!(fixture.read("Out/one.txt"), "new1");
    assert_eq!(fixture.read("Out/two.txt"), "old2");
    fixture.assert_file_exists("in2/two.txt");
}

#[cfg(unix)]
#[test]
fn test_non_utf8_names_keep_their_bytes() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = TestFixture::new();
    let names = [OsStr::from_bytes(b"\xff.pdf"), OsStr::from_bytes(b"\xfe.pdf")];
    for (i, name) in names.iter().enumerate() {
        fs::write(fixture.inbox().join(name), format!("file {}", i)).unwrap();
    }
    let rules = RuleSet::from(vec![fixture.rule(RuleKind::Extension, ".pdf", "Out")]);
    let mut decisions = ScriptedDecisions::new([ConflictDecision::Overwrite]);

    let log = FileDistributor::new(&rules).run([fixture.inbox()], &mut decisions);

    assert_eq!(log.count(OutcomeStatus::Moved), 2);
    assert!(decisions.asked().is_empty());
    for (i, name) in names.iter().enumerate() {
        let moved = fixture.path().join("Out").join(name);
        assert_eq!(fs::read_to_string(&moved).unwrap(), format!("file {}", i));
    }
    assert_eq!(fs::read_dir(fixture.path().join("Out")).unwrap().count(), 2);
}

// ============================================================================
// Test Suite 4: Error Scenarios
// ============================================================================

#[test]
fn test_destination_creation_failure_is_recorded() {
    let fixture = TestFixture::new();
    fixture.create_file("blocker", "i am a file");
    fixture.create_file("inbox/a.pdf", "pdf");
    fixture.create_file("inbox/b.txt", "txt");
    let rules = RuleSet::from(vec![
        fixture.rule(RuleKind::Extension, ".pdf", "blocker/PDFs"),
        fixture.rule(RuleKind::Extension, ".txt", "Texts"),
    ]);

    let log = FileDistributor::new(&rules).run(
        [fixture.path().join("inbox/a.pdf"), fixture.path().join("inbox/b.txt")],
        &mut ConflictDecision::Cancel,
    );

    assert_eq!(log.len(), 2);
    let failed = &log.records()[0];
    assert_eq!(failed.status, OutcomeStatus::Error);
    assert!(failed.detail.contains("failed to create folder"));
    fixture.assert_file_exists("inbox/a.pdf");

    assert_eq!(log.records()[1].status, OutcomeStatus::Moved);
    fixture.assert_file_exists("Texts/b.txt");
}

// ============================================================================
// Test Suite 5: Configuration and CLI
// ============================================================================

#[test]
fn test_legacy_config_drives_distribution() {
    let fixture = TestFixture::new();
    let dest = fixture.path().join("PDFs");
    let config_path = fixture.create_file(
        "config.json",
        &serde_json::json!({ "mappings": { ".pdf": dest } }).to_string(),
    );
    fixture.create_file("inbox/a.pdf", "pdf");

    let result = distribute_paths(
        &ConfigLocation::new(&config_path),
        &[fixture.inbox()],
        Box::new(ConflictDecision::Cancel),
        false,
        true,
    );

    assert!(result.is_ok());
    fixture.assert_file_exists("PDFs/a.pdf");
}

#[test]
fn test_cli_dry_run_moves_nothing() {
    let fixture = TestFixture::new();
    let config_path = fixture.path().join("rules.toml");
    fixture.create_file("inbox/a.pdf", "pdf");
    let config_arg = config_path.display().to_string();
    let dest_arg = fixture.path().join("PDFs").display().to_string();

    run_cli(&Cli::parse_from([
        "huriwake", "--config", config_arg.as_str(), "rules", "add", "extension", "pdf", dest_arg.as_str(),
    ]))
    .expect("add rule");

    let inbox_arg = fixture.inbox().display().to_string();
    run_cli(&Cli::parse_from([
        "huriwake", "--config", config_arg.as_str(), "--dry-run", "--json", inbox_arg.as_str(),
    ]))
    .expect("dry run");

    fixture.assert_file_exists("inbox/a.pdf");
    fixture.assert_file_not_exists("PDFs");
}

#[test]
fn test_cli_rule_management_round_trip() {
    let fixture = TestFixture::new();
    let config_path = fixture.path().join("config.json");
    let config_arg = config_path.display().to_string();
    let run = |args: &[&str]| {
        let mut argv = vec!["huriwake", "--config", config_arg.as_str()];
        argv.extend_from_slice(args);
        run_cli(&Cli::parse_from(argv))
    };

    run(&["rules", "add", "extension", ".pdf", "/pdfs"]).unwrap();
    run(&["rules", "add", "filename", "Invoice", "/invoices"]).unwrap();
    run(&["rules", "add", "folder", "scan", "/scans"]).unwrap();
    run(&["rules", "move", "2", "1"]).unwrap();
    run(&["rules", "remove", "3"]).unwrap();
    run(&["rules", "add", "extension", "PDF", "/documents"]).unwrap();
    assert!(run(&["rules", "remove", "7"]).is_err());

    let config = ConfigLocation::new(&config_path).load().unwrap();
    let rules: Vec<_> = config
        .rules
        .iter()
        .map(|r| (r.kind(), r.pattern().to_string(), r.destination().to_path_buf()))
        .collect();
    assert_eq!(
        rules,
        vec![
            (
                RuleKind::FilenameSubstring,
                "invoice".to_string(),
                PathBuf::from("/invoices")
            ),
            (
                RuleKind::Extension,
                ".pdf".to_string(),
                PathBuf::from("/documents")
            ),
        ]
    );
}

#[test]
fn test_cli_rejects_empty_pattern() {
    let fixture = TestFixture::new();
    let config_arg = fixture.path().join("config.json").display().to_string();

    let result = run_cli(&Cli::parse_from([
        "huriwake", "--config", config_arg.as_str(), "rules", "add", "filename", " ", "/x",
    ]));

    assert!(result.is_err());
    fixture.assert_file_not_exists("config.json");
}

#[test]
fn test_cli_rejects_multi_dot_extension() {
    let fixture = TestFixture::new();
    let config_arg = fixture.path().join("config.json").display().to_string();

    let result = run_cli(&Cli::parse_from([
        "huriwake", "--config", config_arg.as_str(), "rules", "add", "extension", "tar.gz", "/x",
    ]));

    let err = result.expect_err("multi-dot extension accepted");
    assert!(err.to_string().contains(".tar.gz"));
    fixture.assert_file_not_exists("config.json");
}
