//! Comparison driver: load, exact pass, similarity pass, classify.
//!
//! # Overview
//!
//! 1. **Load**: walk and fingerprint both directories (see [`load_collection`])
//! 2. **Exact pass**: index B by `(size, digest)`, probe it with every record
//!    of A, confirm each hit byte for byte
//! 3. **Similarity pass**: merge both sides into one list sorted by size and
//!    slide a window over it. For a record of size `s` only records up to
//!    `ceil(s / threshold)` bytes can pass the size gate, so the window stops
//!    there. Each cross-side pair is tested once, smaller file first.
//! 4. **Classify**: records that matched nothing are unique
//!
//! # Example
//!
//! ```no_run
//! use dirmatch::compare::{Comparator, CompareConfig};
//! use std::path::Path;
//!
//! let comparator = Comparator::new(CompareConfig::default().with_threshold(0.9));
//! let outcome = comparator.compare(Path::new("left"), Path::new("right")).unwrap();
//! println!("{} equal, {} similar", outcome.equal_pairs.len(), outcome.similar_pairs.len());
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::progress::{ProgressCallback, PHASE_EXACT, PHASE_SIMILAR};
use crate::scanner::{FileRecord, Hash, ScanError, WalkerConfig, DEFAULT_MMAP_THRESHOLD};

use super::collection::{load_collection, Collection};
use super::content::{Content, ContentSource, FsContent};
use super::equality::files_equal;
use super::outcome::{
    CompareSummary, ComparisonOutcome, EqualPair, MatchFlags, Side, SimilarPair,
};
use super::similarity::{
    check_similar_loaded, max_similar_size, passes_size_gate, Similarity, SimilarityError,
};

/// Default similarity threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Default number of fingerprinting threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Errors that abort a comparison.
///
/// Failures on individual files never end up here; they are collected in
/// [`CompareSummary::errors`].
#[derive(thiserror::Error, Debug)]
pub enum CompareError {
    /// Threshold outside `(0, 1]`.
    #[error("Invalid threshold {0}: must be greater than 0 and at most 1")]
    InvalidThreshold(f64),

    /// A root is missing, not a directory, or unreadable.
    #[error("Invalid directory {path}: {reason}")]
    InvalidDirectory {
        /// The offending path
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// Shutdown was requested before the comparison finished.
    #[error("Comparison interrupted")]
    Interrupted,

    /// A root could not be read once the comparison had started.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// The root that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl CompareError {
    /// Turn a walk failure on a root into a fatal I/O error.
    #[must_use]
    pub fn from_scan(root: &Path, error: ScanError) -> Self {
        let source = match error {
            ScanError::Io { source, .. } => source,
            ScanError::NotFound(_) => std::io::Error::from(std::io::ErrorKind::NotFound),
            ScanError::PermissionDenied(_) => {
                std::io::Error::from(std::io::ErrorKind::PermissionDenied)
            }
            ScanError::Hash(e) => std::io::Error::other(e.to_string()),
        };
        Self::Io {
            path: root.to_path_buf(),
            source,
        }
    }
}

/// Configuration for a comparison.
#[derive(Clone)]
pub struct CompareConfig {
    /// Similarity threshold in `(0, 1]`.
    pub threshold: f64,
    /// How each directory is walked.
    pub walker: WalkerConfig,
    /// Number of I/O threads for parallel fingerprinting.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Files at or above this size are memory-mapped.
    pub mmap_threshold: u64,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for CompareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompareConfig")
            .field("threshold", &self.threshold)
            .field("walker", &self.walker)
            .field("io_threads", &self.io_threads)
            .field("mmap_threshold", &self.mmap_threshold)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            walker: WalkerConfig::default(),
            io_threads: DEFAULT_IO_THREADS,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl CompareConfig {
    /// Set the similarity threshold. Validated when the comparison starts.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    /// Set the number of fingerprinting threads (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the mmap threshold.
    #[must_use]
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    pub(crate) fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Reject thresholds outside `(0, 1]`, including NaN.
///
/// # Errors
///
/// [`CompareError::InvalidThreshold`]
pub fn validate_threshold(threshold: f64) -> Result<(), CompareError> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(CompareError::InvalidThreshold(threshold))
    }
}

/// Check that `path` is an existing, readable directory.
///
/// # Errors
///
/// [`CompareError::InvalidDirectory`]
pub fn validate_directory(path: &Path) -> Result<(), CompareError> {
    let invalid = |reason: String| CompareError::InvalidDirectory {
        path: path.to_path_buf(),
        reason,
    };

    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => invalid("does not exist".to_string()),
        _ => invalid(e.to_string()),
    })?;
    if !metadata.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    std::fs::read_dir(path).map_err(|e| invalid(format!("not readable: {e}")))?;
    Ok(())
}

/// One record in the size-sorted union of both collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SizedRef {
    size: u64,
    side: Side,
    idx: usize,
}

impl SizedRef {
    fn record<'a>(&self, a: &[&'a FileRecord], b: &[&'a FileRecord]) -> &'a FileRecord {
        match self.side {
            Side::A => a[self.idx],
            Side::B => b[self.idx],
        }
    }
}

/// Drives a comparison of two directories.
pub struct Comparator {
    config: CompareConfig,
    source: Arc<dyn ContentSource>,
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comparator")
            .field("config", &self.config)
            .field("source", &"<content source>")
            .finish()
    }
}

impl Comparator {
    /// Create a comparator that reads content from disk.
    #[must_use]
    pub fn new(config: CompareConfig) -> Self {
        let source = Arc::new(FsContent::with_mmap_threshold(config.mmap_threshold));
        Self { config, source }
    }

    /// Replace the content source used for byte comparison and scanning.
    #[must_use]
    pub fn with_content_source(mut self, source: Arc<dyn ContentSource>) -> Self {
        self.source = source;
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Compare the files of `path_a` with the files of `path_b`.
    ///
    /// # Errors
    ///
    /// - [`CompareError::InvalidThreshold`] / [`CompareError::InvalidDirectory`]
    ///   before any work is done
    /// - [`CompareError::Io`] if a root vanishes mid-scan
    /// - [`CompareError::Interrupted`] on shutdown
    pub fn compare(&self, path_a: &Path, path_b: &Path) -> Result<ComparisonOutcome, CompareError> {
        validate_threshold(self.config.threshold)?;
        validate_directory(path_a)?;
        validate_directory(path_b)?;

        log::info!(
            "Comparing {} with {} (threshold {})",
            path_a.display(),
            path_b.display(),
            self.config.threshold
        );

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_message(&path_a.to_string_lossy());
        }
        let loaded_a = load_collection(path_a, &self.config)?;
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_message(&path_b.to_string_lossy());
        }
        let loaded_b = load_collection(path_b, &self.config)?;

        let mut errors = loaded_a.errors;
        errors.extend(loaded_b.errors);
        let displaced = loaded_a.displaced.len() + loaded_b.displaced.len();

        let mut outcome = self.compare_collections(&loaded_a.collection, &loaded_b.collection)?;
        outcome.summary.displaced_files = displaced;
        errors.append(&mut outcome.summary.errors);
        dedup_by_path(&mut errors);
        outcome.summary.errors = errors;
        Ok(outcome)
    }

    /// Compare two already loaded collections.
    ///
    /// # Errors
    ///
    /// - [`CompareError::InvalidThreshold`]
    /// - [`CompareError::Interrupted`] on shutdown
    pub fn compare_collections(
        &self,
        a: &Collection,
        b: &Collection,
    ) -> Result<ComparisonOutcome, CompareError> {
        validate_threshold(self.config.threshold)?;

        let records_a: Vec<&FileRecord> = a.records().collect();
        let records_b: Vec<&FileRecord> = b.records().collect();
        let flags_a = MatchFlags::new(records_a.len());
        let flags_b = MatchFlags::new(records_b.len());
        let mut summary = CompareSummary {
            files_a: records_a.len(),
            files_b: records_b.len(),
            bytes_hashed: a.total_size() + b.total_size(),
            ..Default::default()
        };

        let equal = self.exact_pass(&records_a, &records_b, &flags_a, &flags_b, &mut summary.errors);
        if self.config.is_shutdown_requested() {
            log::info!("Exact pass: Interrupted by shutdown signal");
            return Err(CompareError::Interrupted);
        }

        let (similar, candidates) = self.similarity_pass(
            &records_a,
            &records_b,
            &equal,
            &flags_a,
            &flags_b,
            &mut summary.errors,
        );
        if self.config.is_shutdown_requested() {
            log::info!("Similarity pass: Interrupted by shutdown signal");
            return Err(CompareError::Interrupted);
        }

        dedup_by_path(&mut summary.errors);
        let unique_a: Vec<FileRecord> = unmatched(&records_a, &flags_a);
        let unique_b: Vec<FileRecord> = unmatched(&records_b, &flags_b);

        summary.equal_pairs = equal.len();
        summary.similar_pairs = similar.len();
        summary.unique_a = unique_a.len();
        summary.unique_b = unique_b.len();
        summary.similarity_candidates = candidates;

        log::info!(
            "Comparison complete: {} equal, {} similar, {} unique in A, {} unique in B",
            summary.equal_pairs,
            summary.similar_pairs,
            summary.unique_a,
            summary.unique_b
        );

        Ok(ComparisonOutcome {
            root_a: a.root().to_path_buf(),
            root_b: b.root().to_path_buf(),
            threshold: self.config.threshold,
            equal_pairs: equal
                .into_iter()
                .map(|(i, j)| EqualPair {
                    a: records_a[i].clone(),
                    b: records_b[j].clone(),
                })
                .collect(),
            similar_pairs: similar
                .into_iter()
                .map(|(i, j, s)| SimilarPair::new(records_a[i].clone(), records_b[j].clone(), s))
                .collect(),
            unique_a,
            unique_b,
            summary,
        })
    }

    /// Index pairs `(a, b)` of byte-identical files, A-major in name order.
    fn exact_pass(
        &self,
        records_a: &[&FileRecord],
        records_b: &[&FileRecord],
        flags_a: &MatchFlags,
        flags_b: &MatchFlags,
        errors: &mut Vec<ScanError>,
    ) -> Vec<(usize, usize)> {
        let mut index: HashMap<(u64, Hash), Vec<usize>> = HashMap::new();
        for (j, record) in records_b.iter().enumerate() {
            index.entry((record.size, record.digest)).or_default().push(j);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_EXACT, records_a.len());
        }
        log::info!(
            "Exact pass: probing {} files against {} size/digest keys",
            records_a.len(),
            index.len()
        );

        let source = self.source.as_ref();
        let per_record: Vec<(Vec<(usize, usize)>, Vec<ScanError>)> = records_a
            .par_iter()
            .enumerate()
            .map(|(i, record)| {
                let mut pairs = Vec::new();
                let mut failures = Vec::new();
                if self.config.is_shutdown_requested() {
                    return (pairs, failures);
                }
                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(i + 1, record.path.to_string_lossy().as_ref());
                }

                let Some(candidates) = index.get(&(record.size, record.digest)) else {
                    return (pairs, failures);
                };
                for &j in candidates {
                    match files_equal(record, records_b[j], source) {
                        Ok(true) => {
                            log::trace!(
                                "Equal: {} == {}",
                                record.path.display(),
                                records_b[j].path.display()
                            );
                            flags_a.mark(i);
                            flags_b.mark(j);
                            pairs.push((i, j));
                        }
                        Ok(false) => {}
                        Err(e) => {
                            log::warn!("Failed to confirm {}: {}", e.path().display(), e);
                            failures.push(ScanError::Hash(e));
                        }
                    }
                }
                (pairs, failures)
            })
            .collect();

        let mut equal = Vec::new();
        for (pairs, failures) in per_record {
            equal.extend(pairs);
            errors.extend(failures);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_EXACT);
        }
        log::info!("Exact pass complete: {} equal pairs", equal.len());

        equal
    }

    /// Similar pairs `(a, b, similarity)` and the number of pairs scanned.
    fn similarity_pass(
        &self,
        records_a: &[&FileRecord],
        records_b: &[&FileRecord],
        equal: &[(usize, usize)],
        flags_a: &MatchFlags,
        flags_b: &MatchFlags,
        errors: &mut Vec<ScanError>,
    ) -> (Vec<(usize, usize, Similarity)>, usize) {
        let threshold = self.config.threshold;
        let equal_set: HashSet<(usize, usize)> = equal.iter().copied().collect();

        let mut union: Vec<SizedRef> = records_a
            .iter()
            .enumerate()
            .map(|(idx, r)| SizedRef {
                size: r.size,
                side: Side::A,
                idx,
            })
            .chain(records_b.iter().enumerate().map(|(idx, r)| SizedRef {
                size: r.size,
                side: Side::B,
                idx,
            }))
            .collect();
        union.sort_unstable();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_SIMILAR, union.len());
        }
        log::info!(
            "Similarity pass: {} files, threshold {}",
            union.len(),
            threshold
        );

        let source = self.source.as_ref();
        type WindowResult = (Vec<(usize, usize, Similarity)>, Vec<ScanError>, usize);
        let per_record: Vec<WindowResult> = (0..union.len())
            .into_par_iter()
            .map(|i| {
                let mut found = Vec::new();
                let mut failures = Vec::new();
                let mut scanned = 0usize;
                if self.config.is_shutdown_requested() {
                    return (found, failures, scanned);
                }

                let small = union[i];
                let small_record = small.record(records_a, records_b);
                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(i + 1, small_record.path.to_string_lossy().as_ref());
                }

                let limit = max_similar_size(small.size, threshold);
                let mut small_content: Option<Content> = None;
                for large in union[i + 1..].iter().take_while(|r| r.size <= limit) {
                    if large.side == small.side {
                        continue;
                    }
                    let (ia, ib) = match small.side {
                        Side::A => (small.idx, large.idx),
                        Side::B => (large.idx, small.idx),
                    };
                    if equal_set.contains(&(ia, ib)) {
                        continue;
                    }

                    scanned += 1;
                    if !passes_size_gate(small.size, large.size, threshold) {
                        continue;
                    }
                    if small_content.is_none() {
                        match source.load(small_record) {
                            Ok(content) => small_content = Some(content),
                            Err(e) => {
                                log::warn!("Failed to scan {}: {}", e.path().display(), e);
                                failures.push(ScanError::Hash(e));
                                break;
                            }
                        }
                    }
                    let Some(ref content) = small_content else {
                        break;
                    };

                    let large_record = large.record(records_a, records_b);
                    let checked =
                        check_similar_loaded(small_record, content, large_record, threshold, source);
                    match checked {
                        Ok(Some(similarity)) => {
                            log::trace!(
                                "Similar ({:.4}): {} ~ {}",
                                similarity.score,
                                small_record.path.display(),
                                large_record.path.display()
                            );
                            flags_a.mark(ia);
                            flags_b.mark(ib);
                            found.push((ia, ib, similarity));
                        }
                        Ok(None) => {}
                        Err(SimilarityError::Read(e)) => {
                            log::warn!("Failed to scan {}: {}", e.path().display(), e);
                            failures.push(ScanError::Hash(e));
                        }
                        Err(e @ SimilarityError::OrderViolation { .. }) => {
                            log::error!("Similarity pass ordering bug: {}", e);
                        }
                    }
                }
                (found, failures, scanned)
            })
            .collect();

        let mut similar = Vec::new();
        let mut candidates = 0;
        for (found, failures, scanned) in per_record {
            similar.extend(found);
            errors.extend(failures);
            candidates += scanned;
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_SIMILAR);
        }
        log::info!(
            "Similarity pass complete: {} similar pairs from {} candidates",
            similar.len(),
            candidates
        );

        (similar, candidates)
    }
}

/// Keep the first error reported for each path.
fn dedup_by_path(errors: &mut Vec<ScanError>) {
    let mut seen = HashSet::new();
    errors.retain(|e| seen.insert(e.path().to_path_buf()));
}

fn unmatched(records: &[&FileRecord], flags: &MatchFlags) -> Vec<FileRecord> {
    records
        .iter()
        .enumerate()
        .filter(|(idx, _)| !flags.is_matched(*idx))
        .map(|(_, r)| (*r).clone())
        .collect()
}

/// Compare two directories with default settings and the given threshold.
///
/// # Errors
///
/// See [`Comparator::compare`].
pub fn compare(
    path_a: &Path,
    path_b: &Path,
    threshold: f64,
) -> Result<ComparisonOutcome, CompareError> {
    Comparator::new(CompareConfig::default().with_threshold(threshold)).compare(path_a, path_b)
}
