//! Application configuration.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. built-in defaults
//! 2. `config.toml` in the platform config directory, or the file given with `--config`
//! 3. `DIRMATCH_*` environment variables (`DIRMATCH_THRESHOLD=0.9`)
//! 4. command-line flags, applied by [`Config::apply_args`]
//!
//! ```toml
//! threshold = 0.9
//! io_threads = 8
//! recursive = true
//! output = "json"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{CompareArgs, OutputFormat};
use crate::compare::{CompareConfig, DEFAULT_IO_THREADS, DEFAULT_THRESHOLD};
use crate::scanner::{WalkerConfig, DEFAULT_MMAP_THRESHOLD};

/// Prefix of environment variables read into [`Config`].
pub const ENV_PREFIX: &str = "DIRMATCH_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum size ratio for similar files.
    pub threshold: f64,
    /// Fingerprinting threads.
    pub io_threads: usize,
    /// Files at least this large are memory-mapped.
    pub mmap_threshold: u64,
    /// Descend into subdirectories.
    pub recursive: bool,
    pub skip_hidden: bool,
    pub follow_symlinks: bool,
    /// Output format when `--output` is not given.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            io_threads: DEFAULT_IO_THREADS,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            recursive: false,
            skip_hidden: false,
            follow_symlinks: false,
            output: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// `explicit` replaces the platform config path. A file that cannot be
    /// parsed is ignored and the defaults are used.
    #[must_use]
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit.map(Path::to_path_buf).or_else(Self::default_path);
        match Self::figment(path.as_deref()).extract() {
            Ok(config) => {
                log::debug!("Loaded configuration: {config:?}");
                config
            }
            Err(e) => {
                if explicit.is_some() {
                    log::warn!("Ignoring configuration file: {e}");
                } else {
                    log::debug!("Failed to load config, using defaults: {e}");
                }
                Self::default()
            }
        }
    }

    /// The provider stack behind [`load`](Self::load).
    ///
    /// A missing file contributes nothing.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// `config.toml` in the platform config directory, if one can be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dirmatch", "dirmatch")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply flags given on the command line.
    ///
    /// Switches can only be turned on from the command line; a `true` in the
    /// file stays in effect when the flag is absent.
    pub fn apply_args(&mut self, args: &CompareArgs) {
        if let Some(threshold) = args.threshold {
            self.threshold = threshold;
        }
        if let Some(output) = args.output {
            self.output = output;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(size) = args.mmap_threshold {
            self.mmap_threshold = size;
        }
        self.recursive |= args.recursive;
        self.skip_hidden |= args.skip_hidden;
        self.follow_symlinks |= args.follow_symlinks;
    }

    /// Comparator settings derived from this configuration.
    #[must_use]
    pub fn compare_config(&self) -> CompareConfig {
        let walker = WalkerConfig::default()
            .with_recursive(self.recursive)
            .with_skip_hidden(self.skip_hidden)
            .with_follow_symlinks(self.follow_symlinks);
        CompareConfig::default()
            .with_threshold(self.threshold)
            .with_io_threads(self.io_threads)
            .with_mmap_threshold(self.mmap_threshold)
            .with_walker_config(walker)
    }
}
