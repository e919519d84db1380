use dirmatch::compare::{load_collection, Comparator, CompareConfig, MatchKind, Side};
use dirmatch::error::ExitCode;
use dirmatch::scanner::{HashError, ScanError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_vanished_file_is_reported_and_comparison_continues() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();
    fs::write(a.join("x"), b"shared content").unwrap();
    fs::write(b.join("y"), b"shared content").unwrap();
    fs::write(a.join("kept"), b"kept on both sides").unwrap();
    fs::write(b.join("kept"), b"kept on both sides").unwrap();

    let config = CompareConfig::default();
    let loaded_a = load_collection(&a, &config).unwrap();
    let loaded_b = load_collection(&b, &config).unwrap();
    fs::remove_file(b.join("y")).unwrap();

    let outcome = Comparator::new(config)
        .compare_collections(&loaded_a.collection, &loaded_b.collection)
        .unwrap();

    assert!(outcome.has_errors());
    // confirmation and similarity scan both hit y; reported once
    assert_eq!(outcome.summary.failed_files(), 1);
    for err in &outcome.summary.errors {
        assert_eq!(err.path(), b.join("y"));
        match err {
            ScanError::Hash(HashError::NotFound(_)) => {}
            other => panic!("Expected NotFound HashError, got: {:?}", other),
        }
    }
    assert_eq!(outcome.classify(Side::A, "kept"), Some(MatchKind::Equal));
    assert_eq!(outcome.classify(Side::A, "x"), Some(MatchKind::Unique));
    assert_eq!(ExitCode::for_outcome(&outcome), ExitCode::PartialSuccess);
}

#[test]
#[cfg(unix)]
fn test_unreadable_file_is_skipped_with_warning() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();
    fs::write(a.join("ok"), b"readable").unwrap();
    fs::write(b.join("ok"), b"readable").unwrap();
    let locked = a.join("locked");
    fs::write(&locked, b"secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // root can read anything; nothing to assert in that case
    if fs::read(&locked).is_ok() {
        return;
    }

    let outcome = Comparator::new(CompareConfig::default()).compare(&a, &b).unwrap();

    assert_eq!(outcome.summary.files_a, 1);
    assert_eq!(outcome.summary.failed_files(), 1);
    assert_eq!(outcome.summary.errors[0].path(), locked);
    assert!(outcome.is_reconciled());
    assert_eq!(ExitCode::for_outcome(&outcome), ExitCode::PartialSuccess);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}

#[test]
fn test_root_without_files_is_not_an_error() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::create_dir_all(a.join("only_subdirs")).unwrap();
    fs::create_dir(&b).unwrap();

    let outcome = Comparator::new(CompareConfig::default()).compare(&a, &b).unwrap();
    assert!(!outcome.has_errors());
    assert_eq!(ExitCode::for_outcome(&outcome), ExitCode::Success);
}
