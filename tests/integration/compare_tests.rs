use dirmatch::compare::{
    compare, Comparator, CompareConfig, CompareError, CountingContent, FsContent, MatchKind, Side,
};
use dirmatch::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn two_dirs() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();
    (dir, a, b)
}

fn write(dir: &Path, name: &str, content: &[u8]) {
    fs::write(dir.join(name), content).unwrap();
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

#[test]
fn test_empty_directories_are_reconciled() {
    let (_dir, a, b) = two_dirs();
    let outcome = compare(&a, &b, 0.8).unwrap();

    assert!(outcome.is_reconciled());
    assert_eq!(outcome.summary.files_a, 0);
    assert_eq!(outcome.summary.files_b, 0);
}

#[test]
fn test_invalid_threshold_rejected_before_work() {
    let (_dir, a, b) = two_dirs();
    for threshold in [0.0, -0.5, 1.0001, f64::NAN] {
        match compare(&a, &b, threshold) {
            Err(CompareError::InvalidThreshold(_)) => {}
            other => panic!("Expected InvalidThreshold, got: {:?}", other.map(|_| ())),
        }
    }
}

#[test]
fn test_file_instead_of_directory_rejected() {
    let (_dir, a, b) = two_dirs();
    write(&a, "plain", b"x");

    let result = compare(&a.join("plain"), &b, 0.8);
    assert!(matches!(result, Err(CompareError::InvalidDirectory { .. })));
}

#[test]
fn test_threshold_one_requires_identical_sizes() {
    let (_dir, a, b) = two_dirs();
    let base = pattern(200, 1);

    let mut same_size = base.clone();
    same_size[50] ^= 0xff;
    let mut longer = base.clone();
    longer.push(7);

    write(&a, "base", &base);
    write(&b, "edited", &same_size);
    write(&b, "longer", &longer);

    let outcome = compare(&a, &b, 1.0).unwrap();

    assert_eq!(outcome.similar_pairs.len(), 1);
    assert_eq!(outcome.similar_pairs[0].b.name, "edited");
    assert_eq!(outcome.similar_pairs[0].similarity, 1.0);
    assert_eq!(outcome.classify(Side::B, "longer"), Some(MatchKind::Unique));
}

#[test]
fn test_tiny_threshold_admits_prefix_of_large_file() {
    let (_dir, a, b) = two_dirs();
    let large = pattern(1000, 9);
    write(&a, "head", &large[..10]);
    write(&b, "whole", &large);

    let outcome = compare(&a, &b, 0.001).unwrap();

    assert_eq!(outcome.similar_pairs.len(), 1);
    let pair = &outcome.similar_pairs[0];
    assert!((pair.similarity - 0.01).abs() < 1e-12);
    assert_eq!(pair.matched_bytes, 10);

    // The same pair is out of reach at the default threshold.
    let outcome = compare(&a, &b, 0.8).unwrap();
    assert!(outcome.similar_pairs.is_empty());
}

#[test]
fn test_size_gate_never_loads_content() {
    let (_dir, a, b) = two_dirs();
    write(&a, "small", &pattern(10, 1));
    write(&b, "large", &pattern(100, 2));

    let counter = Arc::new(CountingContent::new(FsContent::default()));
    let comparator =
        Comparator::new(CompareConfig::default().with_threshold(0.8)).with_content_source(counter.clone());
    let outcome = comparator.compare(&a, &b).unwrap();

    assert_eq!(counter.loads(), 0);
    assert_eq!(outcome.summary.similarity_candidates, 0);
    assert_eq!(outcome.unique_a.len(), 1);
    assert_eq!(outcome.unique_b.len(), 1);
}

#[test]
fn test_equal_pair_is_not_rescanned_for_similarity() {
    let (_dir, a, b) = two_dirs();
    let content = pattern(64, 4);
    write(&a, "one", &content);
    write(&b, "two", &content);

    let counter = Arc::new(CountingContent::new(FsContent::default()));
    let comparator = Comparator::new(CompareConfig::default()).with_content_source(counter.clone());
    let outcome = comparator.compare(&a, &b).unwrap();

    assert_eq!(outcome.equal_pairs.len(), 1);
    assert!(outcome.similar_pairs.is_empty());
    assert_eq!(outcome.summary.similarity_candidates, 0);
    // one load per side for the byte confirmation
    assert_eq!(counter.loads(), 2);
}

#[test]
fn test_every_record_has_exactly_one_category() {
    let (_dir, a, b) = two_dirs();
    let shared = pattern(300, 3);
    let mut edited = shared.clone();
    edited[100] ^= 1;

    write(&a, "shared", &shared);
    write(&a, "draft", &pattern(280, 5));
    write(&a, "lonely", &pattern(17, 6));
    write(&b, "shared_copy", &shared);
    write(&b, "shared_edit", &edited);
    write(&b, "other", &pattern(5000, 7));

    let outcome = compare(&a, &b, 0.8).unwrap();

    for (side, names) in [
        (Side::A, vec!["draft", "lonely", "shared"]),
        (Side::B, vec!["other", "shared_copy", "shared_edit"]),
    ] {
        let classified = outcome.classifications(side);
        let classified_names: Vec<&str> = classified.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(classified_names, names);
    }

    assert_eq!(outcome.classify(Side::A, "shared"), Some(MatchKind::Equal));
    assert_eq!(outcome.classify(Side::B, "shared_copy"), Some(MatchKind::Equal));
    assert_eq!(outcome.classify(Side::B, "shared_edit"), Some(MatchKind::Similar));
    assert_eq!(outcome.classify(Side::A, "lonely"), Some(MatchKind::Unique));
    assert_eq!(outcome.classify(Side::B, "other"), Some(MatchKind::Unique));
}

#[test]
fn test_recursive_walk_keys_by_name() {
    let (_dir, a, b) = two_dirs();
    fs::create_dir(a.join("nested")).unwrap();
    write(&a, "top", b"top level");
    write(&a.join("nested"), "deep", b"deep content");
    write(&b, "deep", b"deep content");

    let flat = compare(&a, &b, 0.8).unwrap();
    assert_eq!(flat.summary.files_a, 1);
    assert_eq!(flat.classify(Side::B, "deep"), Some(MatchKind::Unique));

    let config = CompareConfig::default().with_walker_config(WalkerConfig::default().with_recursive(true));
    let recursive = Comparator::new(config).compare(&a, &b).unwrap();
    assert_eq!(recursive.summary.files_a, 2);
    assert_eq!(recursive.classify(Side::A, "deep"), Some(MatchKind::Equal));
}

#[test]
fn test_shutdown_flag_interrupts() {
    let (_dir, a, b) = two_dirs();
    write(&a, "x", b"x");

    let flag = Arc::new(AtomicBool::new(true));
    let comparator = Comparator::new(CompareConfig::default().with_shutdown_flag(flag));
    assert!(matches!(comparator.compare(&a, &b), Err(CompareError::Interrupted)));
}

#[test]
fn test_comparison_is_symmetric_in_counts() {
    let (_dir, a, b) = two_dirs();
    let base = pattern(400, 8);
    let mut near = base.clone();
    near.truncate(360);
    write(&a, "base", &base);
    write(&a, "solo", &pattern(12, 1));
    write(&b, "near", &near);
    write(&b, "copy", &base);

    let forward = compare(&a, &b, 0.8).unwrap();
    let backward = compare(&b, &a, 0.8).unwrap();

    assert_eq!(forward.equal_pairs.len(), backward.equal_pairs.len());
    assert_eq!(forward.similar_pairs.len(), backward.similar_pairs.len());
    assert_eq!(forward.unique_a.len(), backward.unique_b.len());
    assert_eq!(forward.unique_b.len(), backward.unique_a.len());
}

#[derive(Default)]
struct RecordingProgress {
    phases: std::sync::Mutex<Vec<String>>,
}

impl dirmatch::progress::ProgressCallback for RecordingProgress {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        self.phases.lock().unwrap().push(format!("start:{phase}"));
    }

    fn on_progress(&self, _current: usize, _path: &str) {}

    fn on_phase_end(&self, phase: &str) {
        self.phases.lock().unwrap().push(format!("end:{phase}"));
    }
}

#[test]
fn test_progress_reports_each_phase() {
    let (_dir, a, b) = two_dirs();
    write(&a, "x", b"content");
    write(&b, "x", b"content");

    let progress = Arc::new(RecordingProgress::default());
    let comparator =
        Comparator::new(CompareConfig::default().with_progress_callback(progress.clone()));
    comparator.compare(&a, &b).unwrap();

    let phases = progress.phases.lock().unwrap().clone();
    assert_eq!(
        phases,
        vec![
            "start:fingerprint",
            "end:fingerprint",
            "start:fingerprint",
            "end:fingerprint",
            "start:exact",
            "end:exact",
            "start:similar",
            "end:similar",
        ]
    );
}
