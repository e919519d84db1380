//! One side of a comparison: the fingerprinted files of a directory.
//!
//! # Overview
//!
//! A [`Collection`] is keyed by file **base name**. When two files with the
//! same name are inserted (possible with recursive walks), the later one
//! replaces the earlier one and [`Collection::insert`] hands the displaced
//! record back. [`load_collection`] inserts in walk order, and the walk is
//! sorted by name, so which file wins is deterministic: the one visited last.
//!
//! Fingerprinting runs on a bounded rayon pool of `io_threads` workers.
//! Files that fail to fingerprint are logged, recorded in
//! [`LoadedCollection::errors`] and left out.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::progress::PHASE_FINGERPRINT;
use crate::scanner::{FileEntry, FileRecord, HashError, Hasher, ScanError, Walker};

use super::driver::{CompareConfig, CompareError};

/// Name-keyed, name-ordered set of fingerprinted files.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    root: PathBuf,
    records: BTreeMap<String, FileRecord>,
}

impl Collection {
    /// Create an empty collection for `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            records: BTreeMap::new(),
        }
    }

    /// Build a collection by inserting `records` in order.
    #[must_use]
    pub fn from_records(root: impl Into<PathBuf>, records: impl IntoIterator<Item = FileRecord>) -> Self {
        let mut collection = Self::new(root);
        for record in records {
            collection.insert(record);
        }
        collection
    }

    /// Directory this collection was loaded from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Insert a record, replacing any record with the same name.
    ///
    /// Returns the replaced record, if any.
    pub fn insert(&mut self, record: FileRecord) -> Option<FileRecord> {
        let displaced = self.records.insert(record.name.clone(), record);
        if let Some(ref old) = displaced {
            log::warn!(
                "Duplicate name '{}' in {}: {} replaced by a later file",
                old.name,
                self.root.display(),
                old.path.display()
            );
        }
        displaced
    }

    /// Look up a record by base name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.records.get(name)
    }

    /// Records in name order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the collection has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total bytes across all records.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.records.values().map(|r| r.size).sum()
    }
}

/// Result of loading one directory.
#[derive(Debug)]
pub struct LoadedCollection {
    /// Successfully fingerprinted files
    pub collection: Collection,
    /// Files that were skipped, with the reason
    pub errors: Vec<ScanError>,
    /// Records replaced by a later file with the same name
    pub displaced: Vec<FileRecord>,
}

/// Walk `root` and fingerprint every file found.
///
/// # Errors
///
/// - [`CompareError::Io`] if the root itself cannot be read
/// - [`CompareError::Interrupted`] if shutdown was requested
pub fn load_collection(root: &Path, config: &CompareConfig) -> Result<LoadedCollection, CompareError> {
    let mut walker = Walker::new(root, config.walker.clone());
    if let Some(ref flag) = config.shutdown_flag {
        walker = walker.with_shutdown_flag(flag.clone());
    }

    let mut entries: Vec<FileEntry> = Vec::new();
    let mut errors: Vec<ScanError> = Vec::new();
    for item in walker.walk() {
        match item {
            Ok(entry) => entries.push(entry),
            Err(e) if e.path() == root => {
                log::error!("Cannot read {}: {}", root.display(), e);
                return Err(CompareError::from_scan(root, e));
            }
            Err(e) => errors.push(e),
        }
    }
    if config.is_shutdown_requested() {
        log::info!("Walk of {} interrupted by shutdown signal", root.display());
        return Err(CompareError::Interrupted);
    }
    log::debug!("Found {} files in {}", entries.len(), root.display());

    let results = fingerprint_entries(&entries, config);

    if config.is_shutdown_requested() {
        log::info!("Fingerprinting of {} interrupted by shutdown signal", root.display());
        return Err(CompareError::Interrupted);
    }

    let mut collection = Collection::new(root);
    let mut displaced = Vec::new();
    for result in results {
        match result {
            Ok(record) => {
                if let Some(old) = collection.insert(record) {
                    displaced.push(old);
                }
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", e.path().display(), e);
                errors.push(ScanError::Hash(e));
            }
        }
    }

    log::info!(
        "Loaded {}: {} files, {} skipped",
        root.display(),
        collection.len(),
        errors.len()
    );

    Ok(LoadedCollection {
        collection,
        errors,
        displaced,
    })
}

/// Fingerprint `entries` in parallel, returning results in input order.
fn fingerprint_entries(
    entries: &[FileEntry],
    config: &CompareConfig,
) -> Vec<Result<FileRecord, HashError>> {
    let mut hasher = Hasher::new().with_mmap_threshold(config.mmap_threshold);
    if let Some(ref flag) = config.shutdown_flag {
        hasher = hasher.with_shutdown_flag(flag.clone());
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_FINGERPRINT, entries.len());
    }

    let run = || -> Vec<Result<FileRecord, HashError>> {
        entries
            .par_iter()
            .enumerate()
            .map(|(idx, entry)| {
                if config.is_shutdown_requested() {
                    return Err(HashError::Interrupted(entry.path.clone()));
                }
                if let Some(ref callback) = config.progress_callback {
                    callback.on_progress(idx + 1, entry.path.to_string_lossy().as_ref());
                }
                let record = hasher.fingerprint_entry(entry)?;
                log::trace!("Fingerprinted {}", entry.path.display());
                if let Some(ref callback) = config.progress_callback {
                    callback.on_item_completed(record.size);
                }
                Ok(record)
            })
            .collect()
    };

    let results = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(e) => {
            log::warn!(
                "Failed to create I/O thread pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            run()
        }
    };

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_FINGERPRINT);
    }

    results
}
