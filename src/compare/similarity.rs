//! Approximate similarity between a smaller and a larger file.
//!
//! # Rule
//!
//! The score is the size ratio `small.size / large.size`. A pair whose ratio
//! is below the threshold is rejected before any content is read; that gate
//! is what keeps the expensive scan rare.
//!
//! Pairs that pass the gate get a run-matching scan ([`scan_content`]) that
//! walks the small file in order, staying aligned across short substituted
//! stretches and otherwise looking for each byte in the remaining part of
//! the large file. The scan only decides accept or reject. The
//! reported score stays the size ratio; the scan's matched-byte count is
//! exposed next to it as [`Similarity::matched_bytes`].

use serde::Serialize;

use crate::scanner::{FileRecord, HashError};

use super::content::ContentSource;

/// Accepted similarity between two files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Similarity {
    /// Size ratio of the smaller to the larger file, in `[threshold, 1.0]`
    pub score: f64,
    /// Bytes of the smaller file covered by matching runs
    pub matched_bytes: u64,
    /// Number of matching runs found by the scan
    pub runs: u64,
}

impl Similarity {
    /// Fraction of the larger file covered by matching runs.
    #[must_use]
    pub fn content_ratio(&self, large_size: u64) -> f64 {
        if large_size == 0 {
            0.0
        } else {
            self.matched_bytes as f64 / large_size as f64
        }
    }
}

/// Result of the run-matching scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The small file was consumed without a failed search.
    Matched {
        /// Sum of all run lengths
        matched_bytes: u64,
        /// Number of runs
        runs: u64,
    },
    /// A byte of the small file has no occurrence in the rest of the large one.
    Diverged {
        /// Offset in the small file where the search failed
        at: usize,
    },
}

/// Errors from the similarity tester.
#[derive(thiserror::Error, Debug)]
pub enum SimilarityError {
    /// The caller passed the larger file first.
    #[error("{small} ({small_size} bytes) is larger than {large} ({large_size} bytes)")]
    OrderViolation {
        /// Path passed as the small file
        small: std::path::PathBuf,
        /// Its size
        small_size: u64,
        /// Path passed as the large file
        large: std::path::PathBuf,
        /// Its size
        large_size: u64,
    },

    /// Content could not be read.
    #[error(transparent)]
    Read(#[from] HashError),
}

/// Size ratio `small / large`, or `None` when `large` is empty.
#[must_use]
pub fn size_ratio(small: u64, large: u64) -> Option<f64> {
    if large == 0 {
        None
    } else {
        Some(small as f64 / large as f64)
    }
}

/// Largest size a file of `size` bytes can be similar to: `ceil(size / threshold)`.
///
/// Saturates at `u64::MAX`.
#[must_use]
pub fn max_similar_size(size: u64, threshold: f64) -> u64 {
    (size as f64 / threshold).ceil() as u64
}

/// Longest stretch of substituted bytes skipped in lockstep before the scan
/// falls back to searching.
pub const REALIGN_WINDOW: usize = 8;

enum Realign {
    At(usize),
    SmallExhausted,
    Lost,
}

fn realign(small: &[u8], large: &[u8], s: usize, l: usize) -> Realign {
    for d in 0..=REALIGN_WINDOW {
        if s + d >= small.len() {
            return Realign::SmallExhausted;
        }
        if l + d >= large.len() {
            return Realign::Lost;
        }
        if small[s + d] == large[l + d] {
            return Realign::At(d);
        }
    }
    Realign::Lost
}

/// Run-matching scan of `small` against `large`.
///
/// Both cursors start at 0. At each step the scan first tries to stay
/// aligned: if one of the next [`REALIGN_WINDOW`] positions agrees on both
/// sides, the mismatching bytes before it are skipped on both sides. If none
/// does, it searches the rest of `large` for the current byte of `small` and
/// diverges when there is no occurrence. From the aligned or found position a
/// run is extended while both sides agree.
///
/// A copy with scattered substitutions stays aligned and matches; unrelated
/// content keeps falling back to the search, which runs out of `large` long
/// before `small` is consumed.
#[must_use]
pub fn scan_content(small: &[u8], large: &[u8]) -> ScanOutcome {
    let mut s = 0usize;
    let mut l = 0usize;
    let mut matched_bytes = 0u64;
    let mut runs = 0u64;

    while s < small.len() {
        match realign(small, large, s, l) {
            Realign::At(d) => {
                s += d;
                l += d;
            }
            Realign::SmallExhausted => break,
            Realign::Lost => {
                let found = large
                    .get(l..)
                    .and_then(|rest| rest.iter().position(|&b| b == small[s]));
                match found {
                    Some(offset) => l += offset,
                    None => return ScanOutcome::Diverged { at: s },
                }
            }
        }

        runs += 1;
        while s < small.len() && l < large.len() && small[s] == large[l] {
            s += 1;
            l += 1;
            matched_bytes += 1;
        }
    }

    ScanOutcome::Matched {
        matched_bytes,
        runs,
    }
}

/// Decide whether `small` and `large` are similar under `threshold`.
///
/// Returns `Ok(None)` when the pair is rejected, either by the size gate
/// (no content read) or by the content scan.
///
/// # Errors
///
/// - [`SimilarityError::OrderViolation`] if `small.size > large.size`
/// - [`SimilarityError::Read`] if loading content fails
pub fn check_similar(
    small: &FileRecord,
    large: &FileRecord,
    threshold: f64,
    source: &dyn ContentSource,
) -> Result<Option<Similarity>, SimilarityError> {
    let Some(score) = size_gate(small, large, threshold)? else {
        return Ok(None);
    };
    let small_content = source.load(small)?;
    let large_content = source.load(large)?;
    Ok(judge(small, large, score, &small_content, &large_content))
}

/// [`check_similar`] with the content of `small` already in hand.
///
/// Only `large` is loaded, and only when the size gate passes.
///
/// # Errors
///
/// - [`SimilarityError::OrderViolation`] if `small.size > large.size`
/// - [`SimilarityError::Read`] if loading `large` fails
pub fn check_similar_loaded(
    small: &FileRecord,
    small_content: &[u8],
    large: &FileRecord,
    threshold: f64,
    source: &dyn ContentSource,
) -> Result<Option<Similarity>, SimilarityError> {
    let Some(score) = size_gate(small, large, threshold)? else {
        return Ok(None);
    };
    let large_content = source.load(large)?;
    Ok(judge(small, large, score, small_content, &large_content))
}

/// Whether the size gate lets `small` and `large` through under `threshold`.
#[must_use]
pub fn passes_size_gate(small: u64, large: u64, threshold: f64) -> bool {
    size_ratio(small, large).is_some_and(|score| score >= threshold)
}

fn size_gate(
    small: &FileRecord,
    large: &FileRecord,
    threshold: f64,
) -> Result<Option<f64>, SimilarityError> {
    if small.size > large.size {
        return Err(SimilarityError::OrderViolation {
            small: small.path.clone(),
            small_size: small.size,
            large: large.path.clone(),
            large_size: large.size,
        });
    }

    let Some(score) = size_ratio(small.size, large.size) else {
        return Ok(None);
    };
    if score < threshold {
        log::trace!(
            "Size gate rejected {} / {} (ratio {:.4})",
            small.path.display(),
            large.path.display(),
            score
        );
        return Ok(None);
    }
    Ok(Some(score))
}

fn judge(
    small: &FileRecord,
    large: &FileRecord,
    score: f64,
    small_content: &[u8],
    large_content: &[u8],
) -> Option<Similarity> {
    match scan_content(small_content, large_content) {
        ScanOutcome::Matched {
            matched_bytes,
            runs,
        } => Some(Similarity {
            score,
            matched_bytes,
            runs,
        }),
        ScanOutcome::Diverged { at } => {
            log::trace!(
                "Content scan rejected {} / {} at offset {}",
                small.path.display(),
                large.path.display(),
                at
            );
            None
        }
    }
}
