use clap::Parser;
use dirmatch::cli::Cli;
use dirmatch::error::{ExitCode, StructuredError};
use dirmatch::run_app;
use std::fs;
use tempfile::tempdir;

fn run(argv: &[&str]) -> anyhow::Result<ExitCode> {
    let _guard = crate::env_lock();
    let mut full = vec!["dirmatch", "-q", "--no-color"];
    full.extend_from_slice(argv);
    run_app(Cli::try_parse_from(full).unwrap())
}

#[test]
fn test_generate_then_compare() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let (a_str, b_str) = (a.to_str().unwrap(), b.to_str().unwrap());

    let code = run(&[
        "generate", a_str, b_str, "--seed", "1", "--big-size", "8KiB", "--small-size", "512",
        "--similar-size", "4KiB",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read_dir(&a).unwrap().count(), 4);
    assert_eq!(fs::read_dir(&b).unwrap().count(), 4);

    // `different0` and `small0` never match
    let code = run(&["compare", a_str, b_str, "--output", "json"]).unwrap();
    assert_eq!(code, ExitCode::UniqueFiles);
}

#[test]
fn test_invalid_threshold_from_config_is_invalid_input() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "threshold = 1.5\n").unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();

    let err = run(&[
        "--config",
        config_path.to_str().unwrap(),
        "compare",
        dir.path().join("a").to_str().unwrap(),
        dir.path().join("b").to_str().unwrap(),
    ])
    .unwrap_err();

    let code = ExitCode::for_error(&err);
    assert_eq!(code, ExitCode::InvalidInput);

    let structured = StructuredError::new(&err, code);
    assert_eq!(structured.code, "DM004");
    assert!(structured.message.contains("1.5"));
    assert!(!structured.interrupted);
}

#[test]
fn test_generate_into_file_path_fails() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    let err = run(&[
        "generate",
        blocker.join("a").to_str().unwrap(),
        dir.path().join("b").to_str().unwrap(),
    ])
    .unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}
