//! Output formatters for comparison results.
//!
//! This module provides different output formats for a [`ComparisonOutcome`]:
//! - Text listing for terminals (the default)
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use dirmatch::compare::compare;
//! use dirmatch::output::TextOutput;
//! use std::path::Path;
//!
//! let outcome = compare(Path::new("left"), Path::new("right"), 0.8).unwrap();
//! print!("{}", TextOutput::new(&outcome).render());
//! ```
//!
//! [`ComparisonOutcome`]: crate::compare::ComparisonOutcome

pub mod csv;
pub mod json;
pub mod text;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;
