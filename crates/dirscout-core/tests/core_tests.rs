use dirscout_core::{
    DirectorySelection, ErrorPhase, FileRecord, PermissionCategory, PermissionDecision,
    PlatformKind, ScanConfig, ScanError, ScanReport, ScanStatus,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use strum::IntoEnumIterator;

#[test]
fn test_records_deduplicate_by_path() {
    let mut seen = HashSet::new();
    assert!(seen.insert(FileRecord::new("/data/a.txt", 5)));
    assert!(!seen.insert(FileRecord::new("/data/a.txt", 99)));
    assert!(seen.insert(FileRecord::new("/data/b.txt", 5)));
    assert_eq!(seen.len(), 2);
}

#[test]
fn test_zero_length_record_has_known_size() {
    let record = FileRecord::new("/data/empty", 0);
    assert!(record.size_known);
    assert_eq!(record.size, 0);
}

#[test]
fn test_report_sort_is_lexicographic_on_path_string() {
    let files = vec![
        FileRecord::new("/a/b/c.txt", 1),
        FileRecord::new("/a/B.txt", 1),
        FileRecord::new("/a/a.txt", 1),
        FileRecord::new("/a/b.txt", 1),
    ];
    let report = ScanReport::new(
        PathBuf::from("/a"),
        None,
        ScanStatus::Completed,
        files,
        Vec::new(),
        Duration::from_millis(5),
    );

    let paths: Vec<_> = report
        .files
        .iter()
        .map(|f| f.path.to_string_lossy().to_string())
        .collect();
    assert_eq!(paths, vec!["/a/B.txt", "/a/a.txt", "/a/b.txt", "/a/b/c.txt"]);
    assert_eq!(report.status_line(), "4 files found");
}

#[test]
fn test_report_error_filtering() {
    let errors = vec![
        ScanError::enumerate("/a", "listing failed"),
        ScanError::classify("/a/x", "odd"),
        ScanError::enumerate("/a/y", "listing failed"),
    ];
    let report = ScanReport::new(
        PathBuf::from("/a"),
        Some(PathBuf::from("/fallback")),
        ScanStatus::Completed,
        Vec::new(),
        errors,
        Duration::ZERO,
    );

    assert_eq!(report.errors_in(ErrorPhase::Enumerate).count(), 2);
    assert_eq!(report.errors_in(ErrorPhase::Access).count(), 0);
    assert!(report.used_fallback());
    assert_eq!(report.status_line(), "No files found");
}

#[test]
fn test_report_serializes() {
    let report = ScanReport::new(
        PathBuf::from("/a"),
        None,
        ScanStatus::Cancelled,
        vec![FileRecord::new("/a/x", 3)],
        Vec::new(),
        Duration::ZERO,
    );
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"status\":\"Cancelled\""));
    assert!(json.contains("\"file_count\":1"));
}

#[test]
fn test_terminal_statuses() {
    assert!(!ScanStatus::Idle.is_terminal());
    assert!(!ScanStatus::Scanning.is_terminal());
    assert!(ScanStatus::Completed.is_terminal());
    assert!(ScanStatus::Cancelled.is_terminal());
    assert!(ScanStatus::Failed.is_terminal());
    assert_eq!(ScanStatus::default(), ScanStatus::Idle);
}

#[test]
fn test_every_category_belongs_to_some_tier() {
    let tiers = [
        PlatformKind::ScopedStorage { sdk_level: 28 },
        PlatformKind::ScopedStorage { sdk_level: 31 },
        PlatformKind::ScopedStorage { sdk_level: 34 },
    ];
    for category in PermissionCategory::iter() {
        assert!(
            tiers
                .iter()
                .any(|t| t.required_categories().contains(&category)),
            "{category} not covered"
        );
    }
}

#[test]
fn test_unrestricted_decision() {
    let decision = PermissionDecision::unrestricted();
    assert!(decision.granted);
    assert!(decision.checked_categories.is_empty());
    assert!(!PlatformKind::default().has_permission_model());
}

#[test]
fn test_config_roundtrips_through_json_defaults() {
    let config: ScanConfig = serde_json::from_str(r#"{"root":"/srv"}"#).unwrap();
    assert_eq!(config.root, PathBuf::from("/srv"));
    assert!(config.include_hidden);
    assert!(config.dedupe_paths);
    assert!(config.is_paced());
}

#[test]
fn test_selection_trims_input() {
    assert_eq!(
        DirectorySelection::from_input("  /srv/data  "),
        DirectorySelection::Selected(PathBuf::from("/srv/data"))
    );
}
