//! Comparison results and per-record classification.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Serialize, Serializer};

use crate::scanner::{FileRecord, ScanError};

use super::similarity::Similarity;

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// First directory
    A,
    /// Second directory
    B,
}

/// Final category of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Byte-identical to at least one file on the other side
    Equal,
    /// Not equal to anything, but similar to at least one file on the other side
    Similar,
    /// Neither
    Unique,
}

/// Two byte-identical files, one from each side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqualPair {
    /// Record from collection A
    pub a: FileRecord,
    /// Record from collection B
    pub b: FileRecord,
}

/// Two similar files, one from each side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPair {
    /// Record from collection A
    pub a: FileRecord,
    /// Record from collection B
    pub b: FileRecord,
    /// Size ratio, in `[threshold, 1.0]`
    pub similarity: f64,
    /// Bytes covered by matching runs
    pub matched_bytes: u64,
    /// Number of matching runs
    pub runs: u64,
}

impl SimilarPair {
    /// Build a pair from a similarity verdict.
    #[must_use]
    pub fn new(a: FileRecord, b: FileRecord, similarity: Similarity) -> Self {
        Self {
            a,
            b,
            similarity: similarity.score,
            matched_bytes: similarity.matched_bytes,
            runs: similarity.runs,
        }
    }
}

/// Counters collected during a comparison.
#[derive(Debug, Default, Serialize)]
pub struct CompareSummary {
    /// Records in collection A
    pub files_a: usize,
    /// Records in collection B
    pub files_b: usize,
    /// Bytes fingerprinted across both sides
    pub bytes_hashed: u64,
    /// Number of equal pairs
    pub equal_pairs: usize,
    /// Number of similar pairs
    pub similar_pairs: usize,
    /// Unmatched records in A
    pub unique_a: usize,
    /// Unmatched records in B
    pub unique_b: usize,
    /// Files replaced by a later file with the same name
    pub displaced_files: usize,
    /// Pairs that passed the size window and got a content scan
    pub similarity_candidates: usize,
    /// Files that were skipped or could not be compared
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<ScanError>,
}

impl CompareSummary {
    /// Number of per-file errors.
    #[must_use]
    pub fn failed_files(&self) -> usize {
        self.errors.len()
    }

    /// Human-readable size of the hashed data.
    #[must_use]
    pub fn bytes_hashed_display(&self) -> String {
        bytesize::ByteSize::b(self.bytes_hashed).to_string()
    }
}

#[derive(Serialize)]
struct ErrorEntry<'a> {
    path: &'a std::path::Path,
    message: String,
}

fn serialize_errors<S: Serializer>(errors: &[ScanError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| ErrorEntry {
        path: e.path(),
        message: e.to_string(),
    }))
}

/// Per-record match flags for one collection.
///
/// Flags only move from unmatched to matched, so concurrent workers can set
/// them without further coordination.
#[derive(Debug)]
pub struct MatchFlags(Vec<AtomicBool>);

impl MatchFlags {
    /// `len` unmatched flags.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self((0..len).map(|_| AtomicBool::new(false)).collect())
    }

    /// Mark record `idx` as matched.
    pub fn mark(&self, idx: usize) {
        if let Some(flag) = self.0.get(idx) {
            flag.store(true, Ordering::Release);
        }
    }

    /// Whether record `idx` has been matched.
    #[must_use]
    pub fn is_matched(&self, idx: usize) -> bool {
        self.0.get(idx).is_some_and(|f| f.load(Ordering::Acquire))
    }
}

/// Everything a comparison produced.
#[derive(Debug, Serialize)]
pub struct ComparisonOutcome {
    /// First directory
    pub root_a: PathBuf,
    /// Second directory
    pub root_b: PathBuf,
    /// Threshold the comparison ran with
    pub threshold: f64,
    /// Byte-identical pairs, A in name order then B in name order
    pub equal_pairs: Vec<EqualPair>,
    /// Similar pairs
    pub similar_pairs: Vec<SimilarPair>,
    /// Records of A that matched nothing, in name order
    pub unique_a: Vec<FileRecord>,
    /// Records of B that matched nothing, in name order
    pub unique_b: Vec<FileRecord>,
    /// Counters and per-file errors
    pub summary: CompareSummary,
}

impl ComparisonOutcome {
    /// Category of the record named `name` on `side`.
    ///
    /// Equal takes priority over Similar. Returns `None` for names that are
    /// not part of the comparison.
    #[must_use]
    pub fn classify(&self, side: Side, name: &str) -> Option<MatchKind> {
        let pick = |a: &FileRecord, b: &FileRecord| -> bool {
            match side {
                Side::A => a.name == name,
                Side::B => b.name == name,
            }
        };

        if self.equal_pairs.iter().any(|p| pick(&p.a, &p.b)) {
            return Some(MatchKind::Equal);
        }
        if self.similar_pairs.iter().any(|p| pick(&p.a, &p.b)) {
            return Some(MatchKind::Similar);
        }
        let uniques = match side {
            Side::A => &self.unique_a,
            Side::B => &self.unique_b,
        };
        uniques
            .iter()
            .any(|r| r.name == name)
            .then_some(MatchKind::Unique)
    }

    /// Names of all records on `side` with their category, in name order.
    #[must_use]
    pub fn classifications(&self, side: Side) -> Vec<(String, MatchKind)> {
        let mut names: Vec<&str> = Vec::new();
        let mut seen = HashSet::new();
        let paired = self
            .equal_pairs
            .iter()
            .map(|p| (&p.a, &p.b))
            .chain(self.similar_pairs.iter().map(|p| (&p.a, &p.b)));
        for (a, b) in paired {
            let record = match side {
                Side::A => a,
                Side::B => b,
            };
            if seen.insert(record.name.as_str()) {
                names.push(record.name.as_str());
            }
        }
        let uniques = match side {
            Side::A => &self.unique_a,
            Side::B => &self.unique_b,
        };
        names.extend(uniques.iter().map(|r| r.name.as_str()));
        names.sort_unstable();

        names
            .into_iter()
            .filter_map(|n| self.classify(side, n).map(|k| (n.to_string(), k)))
            .collect()
    }

    /// True when every file on both sides matched something.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.unique_a.is_empty() && self.unique_b.is_empty()
    }

    /// True if any file was skipped or could not be compared.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.summary.errors.is_empty()
    }
}
