//! File discovery and content fingerprinting.
//!
//! This module provides:
//! - Directory walking with walkdir (flat by default, optionally recursive)
//! - BLAKE3 fingerprints with size verification
//!
//! # Architecture
//!
//! - [`walker`]: finds regular files under a collection root
//! - [`hasher`]: turns a path into `(size, digest)`
//!
//! # Example
//!
//! ```no_run
//! use dirmatch::scanner::{Hasher, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let hasher = Hasher::new();
//! for entry in walker.walk() {
//!     match entry.and_then(|file| hasher.fingerprint_entry(&file).map_err(Into::into)) {
//!         Ok(record) => println!("{} {}", record.name, record.digest_hex()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use hasher::{hash_to_hex, Hash, Hasher, DEFAULT_MMAP_THRESHOLD};
pub use walker::Walker;

/// A regular file discovered by the walker, before fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// Size reported by the filesystem at discovery time
    pub size: u64,
}

impl FileEntry {
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// A fingerprinted file belonging to one collection.
///
/// `size` and `digest` are fixed at construction. Whether the record has
/// been matched is tracked by the comparison driver, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Location of the file, used for reporting only
    pub path: PathBuf,
    /// Base name, the deduplication key inside a collection
    pub name: String,
    /// Byte length verified while hashing
    pub size: u64,
    /// BLAKE3 digest of the full content
    #[serde(serialize_with = "serialize_digest")]
    pub digest: Hash,
}

impl FileRecord {
    /// Build a record from an already computed fingerprint.
    ///
    /// The name is the final path component, lossily converted to UTF-8.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, digest: Hash) -> Self {
        let name = file_name_of(&path);
        Self {
            path,
            name,
            size,
            digest,
        }
    }

    /// Digest as a lowercase hex string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn serialize_digest<S: serde::Serializer>(digest: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hash_to_hex(digest))
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into subdirectories. When false only direct children of the
    /// root are listed.
    pub recursive: bool,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl WalkerConfig {
    /// Set recursive traversal.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set symlink following.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set hidden file skipping.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }
}

/// Errors that can occur while discovering or fingerprinting files.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path disappeared or never existed.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Fingerprinting failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) => p,
            Self::Io { path, .. } => path,
            Self::Hash(e) => e.path(),
        }
    }
}

/// Errors that can occur while reading file content.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The number of bytes read differs from the size the filesystem reported.
    #[error("Size mismatch for {path}: expected {expected} bytes, read {actual}")]
    SizeMismatch {
        /// File that changed under us
        path: PathBuf,
        /// Size from metadata (or from the fingerprint)
        expected: u64,
        /// Bytes actually available
        actual: u64,
    },

    /// Reading was abandoned because shutdown was requested.
    #[error("Interrupted while reading {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Map an I/O error to the most specific variant.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::SizeMismatch { path, .. } | Self::Io { path, .. } => path,
        }
    }
}
