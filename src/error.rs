//! Structured error handling and exit codes.

use serde::Serialize;

use crate::compare::{CompareError, ComparisonOutcome};

/// Exit codes for the dirmatch application.
///
/// - 0: Success (every file on both sides matched something)
/// - 1: General error (unexpected failure)
/// - 2: Unique files found (completed normally, directories differ)
/// - 3: Partial success (completed, but some files were skipped)
/// - 4: Invalid input (bad threshold or directory)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: both directories are fully reconciled.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// At least one file on either side is unique.
    UniqueFiles = 2,
    /// Comparison completed but some files could not be read.
    PartialSuccess = 3,
    /// The threshold or a directory was rejected before any work.
    InvalidInput = 4,
    /// Interrupted: Comparison was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DM000",
            Self::GeneralError => "DM001",
            Self::UniqueFiles => "DM002",
            Self::PartialSuccess => "DM003",
            Self::InvalidInput => "DM004",
            Self::Interrupted => "DM130",
        }
    }

    /// Exit code for a finished comparison.
    ///
    /// Skipped files take priority over unique files, since a skipped file
    /// may be the missing match.
    #[must_use]
    pub fn for_outcome(outcome: &ComparisonOutcome) -> Self {
        if outcome.has_errors() {
            Self::PartialSuccess
        } else if outcome.is_reconciled() {
            Self::Success
        } else {
            Self::UniqueFiles
        }
    }

    /// Exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<CompareError>() {
            Some(CompareError::Interrupted) => Self::Interrupted,
            Some(CompareError::InvalidThreshold(_) | CompareError::InvalidDirectory { .. }) => {
                Self::InvalidInput
            }
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DM001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
