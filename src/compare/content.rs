//! Full-content access for byte comparison and similarity scans.
//!
//! Both the equality confirmation and the similarity scan need the whole
//! content of a file. They go through the [`ContentSource`] trait so the
//! driver can be handed a different source (tests count loads to prove that
//! the size gate never touches a file).

use std::fs::File;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use memmap2::Mmap;

use crate::scanner::{FileRecord, HashError, DEFAULT_MMAP_THRESHOLD};

/// The full content of one file.
#[derive(Debug)]
pub enum Content {
    /// Memory-mapped file
    Mapped(Mmap),
    /// Content read into memory
    Buffered(Vec<u8>),
}

impl Deref for Content {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(m) => &m[..],
            Self::Buffered(v) => v.as_slice(),
        }
    }
}

/// Loads the content of a fingerprinted file.
pub trait ContentSource: Send + Sync {
    /// Return the content of `record`.
    ///
    /// Implementations must fail with [`HashError::SizeMismatch`] when the
    /// content length differs from `record.size`.
    ///
    /// # Errors
    ///
    /// Any [`HashError`] raised while opening or reading the file.
    fn load(&self, record: &FileRecord) -> Result<Content, HashError>;
}

/// Reads files from disk, memory-mapping the large ones.
#[derive(Debug, Clone)]
pub struct FsContent {
    mmap_threshold: u64,
}

impl Default for FsContent {
    fn default() -> Self {
        Self {
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
        }
    }
}

impl FsContent {
    /// Memory-map files of at least `threshold` bytes.
    #[must_use]
    pub fn with_mmap_threshold(threshold: u64) -> Self {
        Self {
            mmap_threshold: threshold,
        }
    }
}

impl ContentSource for FsContent {
    fn load(&self, record: &FileRecord) -> Result<Content, HashError> {
        let path = record.path.as_path();
        let content = if record.size > 0 && record.size >= self.mmap_threshold {
            let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
            // SAFETY: read-only mapping; length is verified below.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| HashError::from_io(path, e))?;
            Content::Mapped(mmap)
        } else {
            Content::Buffered(std::fs::read(path).map_err(|e| HashError::from_io(path, e))?)
        };

        let actual = content.len() as u64;
        if actual != record.size {
            log::warn!(
                "{} changed since it was fingerprinted ({} -> {} bytes)",
                path.display(),
                record.size,
                actual
            );
            return Err(HashError::SizeMismatch {
                path: record.path.clone(),
                expected: record.size,
                actual,
            });
        }
        Ok(content)
    }
}

/// A [`ContentSource`] wrapper that counts loads.
///
/// Useful for asserting how much content I/O a comparison performed.
#[derive(Debug, Default)]
pub struct CountingContent<S> {
    inner: S,
    loads: AtomicUsize,
}

impl<S: ContentSource> CountingContent<S> {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of `load` calls so far.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl<S: ContentSource> ContentSource for CountingContent<S> {
    fn load(&self, record: &FileRecord) -> Result<Content, HashError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(record)
    }
}
