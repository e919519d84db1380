//! Exact equality between two fingerprinted files.
//!
//! The checks run cheapest first: size, then digest, then a full byte
//! comparison. Digests rule out almost every non-match, but a digest match is
//! never trusted alone; equality is only declared after the bytes agree.

use crate::scanner::{FileRecord, HashError};

use super::content::ContentSource;

/// Decide whether `a` and `b` have byte-identical content.
///
/// Two empty files are equal without touching either of them.
///
/// # Errors
///
/// Returns a [`HashError`] if the confirming read fails or a file changed
/// size since it was fingerprinted.
///
/// # Example
///
/// ```no_run
/// use dirmatch::compare::{files_equal, FsContent};
/// use dirmatch::scanner::{FileEntry, Hasher};
/// use std::path::PathBuf;
///
/// let hasher = Hasher::new();
/// let a = hasher.fingerprint_entry(&FileEntry::new(PathBuf::from("left/x"), 0)).unwrap();
/// let b = hasher.fingerprint_entry(&FileEntry::new(PathBuf::from("right/x"), 0)).unwrap();
/// println!("{}", files_equal(&a, &b, &FsContent::default()).unwrap());
/// ```
pub fn files_equal(
    a: &FileRecord,
    b: &FileRecord,
    source: &dyn ContentSource,
) -> Result<bool, HashError> {
    if !is_candidate(a, b) {
        return Ok(false);
    }
    if a.size == 0 {
        return Ok(true);
    }

    let left = source.load(a)?;
    let right = source.load(b)?;
    let equal = *left == *right;
    if !equal {
        log::warn!(
            "Digest collision: {} and {} share a digest but differ in content",
            a.path.display(),
            b.path.display()
        );
    }
    Ok(equal)
}

/// Size and digest agree, so the pair needs a byte comparison.
#[must_use]
pub fn is_candidate(a: &FileRecord, b: &FileRecord) -> bool {
    a.size == b.size && a.digest == b.digest
}
