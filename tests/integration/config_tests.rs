use clap::Parser;
use dirmatch::cli::{Cli, Commands, OutputFormat};
use dirmatch::config::Config;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_from_toml() {
    let _guard = crate::env_lock();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
threshold = 0.95
io_threads = 8
mmap_threshold = 1048576
recursive = true
skip_hidden = true
follow_symlinks = true
output = "csv"
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load(Some(config_path.as_path()));

    assert_eq!(config.threshold, 0.95);
    assert_eq!(config.io_threads, 8);
    assert_eq!(config.mmap_threshold, 1_048_576);
    assert!(config.recursive);
    assert!(config.skip_hidden);
    assert!(config.follow_symlinks);
    assert_eq!(config.output, OutputFormat::Csv);
}

#[test]
fn test_config_load_from_env() {
    let _guard = crate::env_lock();
    std::env::set_var("DIRMATCH_THRESHOLD", "0.7");
    std::env::set_var("DIRMATCH_OUTPUT", "json");

    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed("DIRMATCH_"));
    let config: Result<Config, _> = figment.extract();

    std::env::remove_var("DIRMATCH_THRESHOLD");
    std::env::remove_var("DIRMATCH_OUTPUT");

    let config = config.unwrap();
    assert_eq!(config.threshold, 0.7);
    assert_eq!(config.output, OutputFormat::Json);
}

#[test]
fn test_config_layers_in_order() {
    let _guard = crate::env_lock();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "threshold = 0.6\nio_threads = 2\n").unwrap();

    std::env::set_var("DIRMATCH_IO_THREADS", "6");
    let mut config = Config::load(Some(config_path.as_path()));
    std::env::remove_var("DIRMATCH_IO_THREADS");

    assert_eq!(config.threshold, 0.6);
    assert_eq!(config.io_threads, 6);

    let cli = Cli::try_parse_from(["dirmatch", "compare", "/a", "/b", "--io-threads", "1"]).unwrap();
    let Commands::Compare(args) = cli.command else {
        panic!("Expected Compare command");
    };
    config.apply_args(&args);

    assert_eq!(config.threshold, 0.6);
    assert_eq!(config.io_threads, 1);
}

#[test]
fn test_config_invalid_toml_fallback() {
    let _guard = crate::env_lock();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "output = \"html\"").unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let result: Result<Config, _> = figment.extract();
    assert!(result.is_err());

    assert_eq!(Config::load(Some(config_path.as_path())), Config::default());
}
