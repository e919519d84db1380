//! Command-line interface definitions for dirmatch.
//!
//! Global options (verbosity, colour, error format, config file) apply to
//! every subcommand.
//!
//! ```bash
//! # List equal, similar and unique files of two directories
//! dirmatch compare ./left ./right
//!
//! # Stricter similarity, recursive walk, JSON for scripting
//! dirmatch compare ./left ./right --threshold 0.95 --recursive --output json
//!
//! # Write reproducible fixture trees
//! dirmatch generate ./left ./right --seed 7 --big-size 1MiB
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Classify the files of two directories as equal, similar or unique.
///
/// Equal files have identical content. Similar files differ in size by no
/// more than the threshold allows and share aligned runs of bytes.
#[derive(Debug, Parser)]
#[command(name = "dirmatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare two directories
    Compare(CompareArgs),
    /// Write fixture directories for trying out `compare`
    Generate(GenerateArgs),
}

/// Arguments for the compare subcommand.
///
/// Options left unset fall back to the configuration file, then to
/// `DIRMATCH_*` environment variables, then to built-in defaults.
#[derive(Debug, Args)]
pub struct CompareArgs {
    /// First directory (collection A)
    #[arg(value_name = "DIR_A")]
    pub dir_a: PathBuf,

    /// Second directory (collection B)
    #[arg(value_name = "DIR_B")]
    pub dir_b: PathBuf,

    /// Minimum size ratio (small / large) for two files to be similar, in (0, 1]
    #[arg(short, long, value_name = "F", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Descend into subdirectories
    ///
    /// Files are keyed by name, so a nested file shadows an earlier one with
    /// the same name.
    #[arg(short, long)]
    pub recursive: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Number of I/O threads for fingerprinting (default: 4)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Memory-map files at least this large (e.g. 64MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub mmap_threshold: Option<u64>,

    /// Do not draw progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the generate subcommand.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Directory receiving the A side
    #[arg(value_name = "DIR_A")]
    pub dir_a: PathBuf,

    /// Directory receiving the B side
    #[arg(value_name = "DIR_B")]
    pub dir_b: PathBuf,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Size of the equal and different files
    #[arg(long, value_name = "SIZE", default_value = "10MiB", value_parser = parse_size)]
    pub big_size: u64,

    /// Size of the small files
    #[arg(long, value_name = "SIZE", default_value = "1KiB", value_parser = parse_size)]
    pub small_size: u64,

    /// Size of the similar files
    #[arg(long, value_name = "SIZE", default_value = "5KiB", value_parser = parse_size)]
    pub similar_size: u64,

    /// How many files of each kind
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub count: usize,

    /// Upper bound (exclusive) on byte substitutions per similar copy
    #[arg(long, value_name = "N", default_value_t = 1000)]
    pub max_mutations: usize,
}

/// Output format for comparison results.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Section listing for terminals
    #[default]
    Text,
    /// JSON document for scripting
    Json,
    /// One CSV row per relation
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a similarity threshold. Accepts values in `(0, 1]`.
///
/// ```
/// use dirmatch::cli::parse_threshold;
///
/// assert_eq!(parse_threshold("0.8").unwrap(), 0.8);
/// assert!(parse_threshold("0").is_err());
/// assert!(parse_threshold("1.5").is_err());
/// ```
///
/// # Errors
///
/// Returns an error for non-numbers and values outside the range.
pub fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid threshold: '{s}'"))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("Threshold must be in (0, 1], got {value}"))
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// ```
/// use dirmatch::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
