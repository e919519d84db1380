//! JSON output formatter for comparison results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "root_a": "/data/left",
//!   "root_b": "/data/right",
//!   "threshold": 0.8,
//!   "equal": [{ "a": "/data/left/x", "b": "/data/right/x", "size": 1024, "digest": "ab12..." }],
//!   "similar": [{ "a": "...", "b": "...", "size_a": 900, "size_b": 1000,
//!                 "similarity": 0.9, "matched_bytes": 880, "runs": 4 }],
//!   "unique_a": [{ "path": "...", "size": 12 }],
//!   "unique_b": [],
//!   "summary": { "files_a": 3, "files_b": 2, "...": "...", "exit_code": 2, "exit_code_name": "DM002" }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::compare::ComparisonOutcome;
use crate::error::ExitCode;
use crate::scanner::FileRecord;

/// An equal pair in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEqualPair {
    /// Path in collection A
    pub a: String,
    /// Path in collection B
    pub b: String,
    /// Shared size in bytes
    pub size: u64,
    /// Shared BLAKE3 digest (hex)
    pub digest: String,
}

/// A similar pair in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSimilarPair {
    /// Path in collection A
    pub a: String,
    /// Path in collection B
    pub b: String,
    /// Size of the file in A
    pub size_a: u64,
    /// Size of the file in B
    pub size_b: u64,
    /// Size ratio
    pub similarity: f64,
    /// Bytes covered by matching runs
    pub matched_bytes: u64,
    /// Number of matching runs
    pub runs: u64,
}

/// A unique file in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonUniqueFile {
    /// Path of the file
    pub path: String,
    /// Size in bytes
    pub size: u64,
}

impl From<&FileRecord> for JsonUniqueFile {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.to_string_lossy().into_owned(),
            size: record.size,
        }
    }
}

/// A skipped file in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    /// Path of the file
    pub path: String,
    /// Why it was skipped
    pub message: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files compared from A
    pub files_a: usize,
    /// Files compared from B
    pub files_b: usize,
    /// Bytes fingerprinted
    pub bytes_hashed: u64,
    /// Equal pairs found
    pub equal_pairs: usize,
    /// Similar pairs found
    pub similar_pairs: usize,
    /// Unique files in A
    pub unique_a: usize,
    /// Unique files in B
    pub unique_b: usize,
    /// Files replaced by a same-named file
    pub displaced_files: usize,
    /// Pairs that reached the content scan
    pub similarity_candidates: usize,
    /// Files skipped because of errors
    pub failed_files: usize,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DM000")
    pub exit_code_name: String,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// First directory
    pub root_a: String,
    /// Second directory
    pub root_b: String,
    /// Threshold used
    pub threshold: f64,
    /// Equal pairs
    pub equal: Vec<JsonEqualPair>,
    /// Similar pairs
    pub similar: Vec<JsonSimilarPair>,
    /// Unique files in A
    pub unique_a: Vec<JsonUniqueFile>,
    /// Unique files in B
    pub unique_b: Vec<JsonUniqueFile>,
    /// Skipped files
    pub errors: Vec<JsonError>,
    /// Counters
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON document for `outcome`.
    #[must_use]
    pub fn new(outcome: &ComparisonOutcome, exit_code: ExitCode) -> Self {
        let summary = &outcome.summary;
        Self {
            root_a: outcome.root_a.to_string_lossy().into_owned(),
            root_b: outcome.root_b.to_string_lossy().into_owned(),
            threshold: outcome.threshold,
            equal: outcome
                .equal_pairs
                .iter()
                .map(|p| JsonEqualPair {
                    a: p.a.path.to_string_lossy().into_owned(),
                    b: p.b.path.to_string_lossy().into_owned(),
                    size: p.a.size,
                    digest: p.a.digest_hex(),
                })
                .collect(),
            similar: outcome
                .similar_pairs
                .iter()
                .map(|p| JsonSimilarPair {
                    a: p.a.path.to_string_lossy().into_owned(),
                    b: p.b.path.to_string_lossy().into_owned(),
                    size_a: p.a.size,
                    size_b: p.b.size,
                    similarity: p.similarity,
                    matched_bytes: p.matched_bytes,
                    runs: p.runs,
                })
                .collect(),
            unique_a: outcome.unique_a.iter().map(JsonUniqueFile::from).collect(),
            unique_b: outcome.unique_b.iter().map(JsonUniqueFile::from).collect(),
            errors: summary
                .errors
                .iter()
                .map(|e| JsonError {
                    path: e.path().to_string_lossy().into_owned(),
                    message: e.to_string(),
                })
                .collect(),
            summary: JsonSummary {
                files_a: summary.files_a,
                files_b: summary.files_b,
                bytes_hashed: summary.bytes_hashed,
                equal_pairs: summary.equal_pairs,
                similar_pairs: summary.similar_pairs,
                unique_a: summary.unique_a,
                unique_b: summary.unique_b,
                displaced_files: summary.displaced_files,
                similarity_candidates: summary.similarity_candidates,
                failed_files: summary.failed_files(),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
