use dirmatch::compare::{compare, MatchKind, Side};
use dirmatch::generator::{generate, GeneratorConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_identical_ten_megabyte_file_is_equal() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();

    let content: Vec<u8> = (0..10 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
    fs::write(a.join("big.bin"), &content).unwrap();
    fs::write(b.join("big.bin"), &content).unwrap();

    let outcome = compare(&a, &b, 0.8).unwrap();

    assert_eq!(outcome.equal_pairs.len(), 1);
    assert!(outcome.similar_pairs.is_empty());
    assert!(outcome.unique_a.is_empty());
    assert!(outcome.unique_b.is_empty());
    assert!(outcome.is_reconciled());
}

#[test]
fn test_independent_random_content_is_unique() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let config = GeneratorConfig::default()
        .with_seed(3)
        .with_big_size(64 * 1024)
        .with_small_size(1024)
        .with_count(3);
    generate(&a, &b, &config).unwrap();

    // Keep only the independently generated files.
    for side in [&a, &b] {
        for entry in fs::read_dir(side).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if !(name.starts_with("different") || name.starts_with("small")) {
                fs::remove_file(path).unwrap();
            }
        }
    }

    let outcome = compare(&a, &b, 0.8).unwrap();

    assert!(outcome.equal_pairs.is_empty());
    assert!(outcome.similar_pairs.is_empty());
    assert_eq!(outcome.unique_a.len(), 6);
    assert_eq!(outcome.unique_b.len(), 6);
}

#[test]
fn test_mutated_copy_is_similar_with_size_ratio_score() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let config = GeneratorConfig::default()
        .with_seed(5)
        .with_big_size(32 * 1024)
        .with_similar_size(5 * 1024)
        .with_max_mutations(1000);
    let report = generate(&a, &b, &config).unwrap();
    assert!(report.mutations[0] < 1000);

    let left = fs::read(a.join("similar_left")).unwrap();
    let right = fs::read(b.join("similar_right0")).unwrap();
    assert_eq!(left.len(), right.len());

    let outcome = compare(&a, &b, 0.8).unwrap();

    if left == right {
        assert_eq!(outcome.classify(Side::B, "similar_right0"), Some(MatchKind::Equal));
        assert_eq!(outcome.classify(Side::A, "similar_left"), Some(MatchKind::Equal));
        assert!(outcome.similar_pairs.is_empty());
        return;
    }

    assert_eq!(outcome.classify(Side::B, "similar_right0"), Some(MatchKind::Similar));
    assert_eq!(outcome.classify(Side::A, "similar_left"), Some(MatchKind::Similar));
    assert_eq!(outcome.similar_pairs.len(), 1);
    let pair = &outcome.similar_pairs[0];
    assert_eq!(pair.a.name, "similar_left");
    assert_eq!(pair.b.name, "similar_right0");
    assert_eq!(pair.similarity, 1.0);
    assert!(outcome.unique_b.iter().all(|r| r.name != "similar_right0"));
}

#[test]
fn test_generated_fixture_classification() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let config = GeneratorConfig::default()
        .with_seed(9)
        .with_big_size(64 * 1024)
        .with_similar_size(5 * 1024)
        .with_count(2);
    generate(&a, &b, &config).unwrap();

    let outcome = compare(&a, &b, 0.8).unwrap();

    for name in ["equal0", "equal1"] {
        assert_eq!(outcome.classify(Side::A, name), Some(MatchKind::Equal));
        assert_eq!(outcome.classify(Side::B, name), Some(MatchKind::Equal));
    }
    for name in ["different0", "different1", "small0", "small1"] {
        assert_eq!(outcome.classify(Side::A, name), Some(MatchKind::Unique));
        assert_eq!(outcome.classify(Side::B, name), Some(MatchKind::Unique));
    }
    assert!(!outcome.is_reconciled());
}
