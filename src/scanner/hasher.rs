//! BLAKE3 content fingerprinting.
//!
//! # Overview
//!
//! [`Hasher`] reads a file exactly once and returns its size together with a
//! 32-byte BLAKE3 digest. Small files are streamed through a fixed buffer;
//! files at or above the mmap threshold are memory-mapped and hashed with
//! BLAKE3's rayon-parallel path, which is several times faster on large
//! inputs.
//!
//! The size reported by the filesystem must match the number of bytes
//! actually hashed. A file that grows or shrinks while it is being read is
//! rejected with [`HashError::SizeMismatch`] instead of being fingerprinted
//! with inconsistent data.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use memmap2::Mmap;

use super::{FileEntry, FileRecord, HashError};

/// A BLAKE3 digest.
pub type Hash = [u8; 32];

/// Files at or above this size are memory-mapped for hashing (64 MiB).
pub const DEFAULT_MMAP_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Read buffer for streamed hashing.
const BUFFER_SIZE: usize = 64 * 1024;

/// Content hasher with optional memory mapping and cancellation.
#[derive(Debug, Clone)]
pub struct Hasher {
    use_mmap: bool,
    mmap_threshold: u64,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with mmap enabled at [`DEFAULT_MMAP_THRESHOLD`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            use_mmap: true,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            shutdown_flag: None,
        }
    }

    /// Enable or disable memory-mapped hashing.
    #[must_use]
    pub fn with_mmap(mut self, enabled: bool) -> Self {
        self.use_mmap = enabled;
        self
    }

    /// Minimum file size for memory-mapped hashing.
    #[must_use]
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    /// Abort streamed reads when the flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Whether a file of `size` bytes would be memory-mapped.
    #[must_use]
    pub fn uses_mmap_for(&self, size: u64) -> bool {
        self.use_mmap && size > 0 && size >= self.mmap_threshold
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Read the whole file and return `(size, digest)`.
    ///
    /// # Errors
    ///
    /// - [`HashError::NotFound`] / [`HashError::PermissionDenied`] when the
    ///   file cannot be opened
    /// - [`HashError::SizeMismatch`] when the bytes read differ from the
    ///   metadata size
    /// - [`HashError::Interrupted`] when shutdown was requested mid-read
    pub fn fingerprint(&self, path: &Path) -> Result<(u64, Hash), HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let expected = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();

        let (actual, hash) = if self.uses_mmap_for(expected) {
            self.hash_mapped(path, &file)?
        } else {
            self.hash_streamed(path, file)?
        };

        if actual != expected {
            log::warn!(
                "{} changed while hashing ({} bytes expected, {} read)",
                path.display(),
                expected,
                actual
            );
            return Err(HashError::SizeMismatch {
                path: path.to_path_buf(),
                expected,
                actual,
            });
        }

        Ok((expected, hash))
    }

    /// Digest of the full file content.
    ///
    /// # Errors
    ///
    /// Same as [`Hasher::fingerprint`].
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        self.fingerprint(path).map(|(_, hash)| hash)
    }

    /// Fingerprint a discovered file into a [`FileRecord`].
    ///
    /// # Errors
    ///
    /// Same as [`Hasher::fingerprint`].
    pub fn fingerprint_entry(&self, entry: &FileEntry) -> Result<FileRecord, HashError> {
        let (size, digest) = self.fingerprint(&entry.path)?;
        if size != entry.size {
            log::debug!(
                "{} changed size since discovery ({} -> {})",
                entry.path.display(),
                entry.size,
                size
            );
        }
        Ok(FileRecord::new(entry.path.clone(), size, digest))
    }

    fn hash_mapped(&self, path: &Path, file: &File) -> Result<(u64, Hash), HashError> {
        // SAFETY: the mapping is read-only and dropped before returning. A
        // concurrent writer can still change the bytes; the length check in
        // `fingerprint` catches truncation and growth.
        let mmap = unsafe { Mmap::map(file) }.map_err(|e| HashError::from_io(path, e))?;
        if self.is_shutdown_requested() {
            return Err(HashError::Interrupted(path.to_path_buf()));
        }
        log::trace!("Hashing {} via mmap ({} bytes)", path.display(), mmap.len());

        let mut hasher = blake3::Hasher::new();
        hasher.update_rayon(&mmap);
        Ok((mmap.len() as u64, *hasher.finalize().as_bytes()))
    }

    fn hash_streamed(&self, path: &Path, file: File) -> Result<(u64, Hash), HashError> {
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut hasher = blake3::Hasher::new();
        let mut total: u64 = 0;

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..n]);
            total += n as u64;
        }

        Ok((total, *hasher.finalize().as_bytes()))
    }
}

/// Convert a hash to a lowercase hex string.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_fingerprint_matches_blake3() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.bin", b"hello world");

        let (size, hash) = Hasher::new().fingerprint(&path).unwrap();
        assert_eq!(size, 11);
        assert_eq!(hash, *blake3::hash(b"hello world").as_bytes());
    }

    #[test]
    fn test_fingerprint_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty", b"");

        let (size, hash) = Hasher::new().fingerprint(&path).unwrap();
        assert_eq!(size, 0);
        assert_eq!(hash, *blake3::hash(b"").as_bytes());
    }

    #[test]
    fn test_fingerprint_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Hasher::new().fingerprint(&dir.path().join("nope"));
        assert!(matches!(result, Err(HashError::NotFound(_))));
    }

    #[test]
    fn test_mmap_and_streamed_agree() {
        let dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
        let path = write_file(&dir, "big.bin", &content);

        let streamed = Hasher::new().with_mmap(false).full_hash(&path).unwrap();
        let mapped = Hasher::new()
            .with_mmap(true)
            .with_mmap_threshold(1024)
            .full_hash(&path)
            .unwrap();
        assert_eq!(streamed, mapped);
    }

    #[test]
    fn test_uses_mmap_for() {
        let hasher = Hasher::new().with_mmap_threshold(100);
        assert!(!hasher.uses_mmap_for(0));
        assert!(!hasher.uses_mmap_for(99));
        assert!(hasher.uses_mmap_for(100));
        assert!(!hasher.with_mmap(false).uses_mmap_for(1000));
    }

    #[test]
    fn test_shutdown_interrupts_streamed_read() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.bin", b"content");
        let flag = Arc::new(AtomicBool::new(true));

        let result = Hasher::new().with_shutdown_flag(flag).fingerprint(&path);
        assert!(matches!(result, Err(HashError::Interrupted(_))));
    }

    #[test]
    fn test_fingerprint_entry_builds_record() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "doc.txt", b"abc");
        let entry = FileEntry::new(path.clone(), 3);

        let record = Hasher::new().fingerprint_entry(&entry).unwrap();
        assert_eq!(record.path, path);
        assert_eq!(record.name, "doc.txt");
        assert_eq!(record.size, 3);
    }

    #[test]
    fn test_hash_to_hex_is_lowercase() {
        let hash = *blake3::hash(b"x").as_bytes();
        let hex = hash_to_hex(&hash);
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, blake3::hash(b"x").to_hex().as_str());
    }
}
