//! dirmatch - Directory Reconciliation
//!
//! Compares two directories and classifies every file as equal to a file on
//! the other side (identical BLAKE3 fingerprint confirmed byte by byte),
//! similar to one (size ratio at or above a threshold and an aligned content
//! scan that does not diverge), or unique.

pub mod app;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

pub use app::run_app;
