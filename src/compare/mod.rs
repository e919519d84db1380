//! Directory comparison engine.
//!
//! This module provides:
//! - Name-keyed collections of fingerprinted files ([`collection`])
//! - Exact equality with byte confirmation ([`equality`])
//! - Size-gated approximate similarity ([`similarity`])
//! - The comparison driver and its result types ([`driver`], [`outcome`])
//!
//! Content access goes through [`ContentSource`] so the byte-level passes
//! can be observed in tests.

pub mod collection;
pub mod content;
pub mod driver;
pub mod equality;
pub mod outcome;
pub mod similarity;

pub use collection::{load_collection, Collection, LoadedCollection};
pub use content::{Content, ContentSource, CountingContent, FsContent};
pub use driver::{
    compare, validate_directory, validate_threshold, Comparator, CompareConfig, CompareError,
    DEFAULT_IO_THREADS, DEFAULT_THRESHOLD,
};
pub use equality::files_equal;
pub use outcome::{
    CompareSummary, ComparisonOutcome, EqualPair, MatchFlags, MatchKind, Side, SimilarPair,
};
pub use similarity::{
    check_similar, check_similar_loaded, max_similar_size, passes_size_gate, scan_content,
    size_ratio, ScanOutcome, Similarity, SimilarityError,
};
