//! CSV output formatter for comparison results.
//!
//! One row per relation, unique files included.
//!
//! # Columns
//!
//! - `kind`: `equal`, `similar`, `unique_a` or `unique_b`
//! - `path_a`, `path_b`: the paths involved (empty for the missing side of a unique file)
//! - `size_a`, `size_b`: sizes in bytes (empty likewise)
//! - `similarity`: size ratio for similar pairs, `1` for equal pairs, empty otherwise

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::compare::ComparisonOutcome;
use crate::scanner::FileRecord;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow {
    kind: &'static str,
    path_a: Option<String>,
    path_b: Option<String>,
    size_a: Option<u64>,
    size_b: Option<u64>,
    similarity: Option<f64>,
}

impl CsvRow {
    fn unique(kind: &'static str, record: &FileRecord, side_a: bool) -> Self {
        let path = Some(record.path.to_string_lossy().into_owned());
        let size = Some(record.size);
        if side_a {
            Self {
                kind,
                path_a: path,
                path_b: None,
                size_a: size,
                size_b: None,
                similarity: None,
            }
        } else {
            Self {
                kind,
                path_a: None,
                path_b: path,
                size_a: None,
                size_b: size,
                similarity: None,
            }
        }
    }
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    outcome: &'a ComparisonOutcome,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(outcome: &'a ComparisonOutcome) -> Self {
        Self { outcome }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for pair in &self.outcome.equal_pairs {
            csv_writer.serialize(CsvRow {
                kind: "equal",
                path_a: Some(pair.a.path.to_string_lossy().into_owned()),
                path_b: Some(pair.b.path.to_string_lossy().into_owned()),
                size_a: Some(pair.a.size),
                size_b: Some(pair.b.size),
                similarity: Some(1.0),
            })?;
        }
        for pair in &self.outcome.similar_pairs {
            csv_writer.serialize(CsvRow {
                kind: "similar",
                path_a: Some(pair.a.path.to_string_lossy().into_owned()),
                path_b: Some(pair.b.path.to_string_lossy().into_owned()),
                size_a: Some(pair.a.size),
                size_b: Some(pair.b.size),
                similarity: Some(pair.similarity),
            })?;
        }
        for record in &self.outcome.unique_a {
            csv_writer.serialize(CsvRow::unique("unique_a", record, true))?;
        }
        for record in &self.outcome.unique_b {
            csv_writer.serialize(CsvRow::unique("unique_b", record, false))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
