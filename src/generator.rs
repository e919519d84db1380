//! Fixture generator for exercising the comparison end to end.
//!
//! # Overview
//!
//! [`generate`] fills two directories with files whose expected
//! classification is known:
//!
//! | Files (per index `i`)        | Side A          | Side B                     | Expected |
//! |------------------------------|-----------------|----------------------------|----------|
//! | `equal{i}`                   | random buffer   | same buffer                | Equal    |
//! | `different{i}`               | random buffer   | independent random buffer  | Unique   |
//! | `small{i}`                   | random buffer   | independent random buffer  | Unique   |
//! | `similar_left` / `similar_right{i}` | random buffer | copy with substitutions | Similar |
//!
//! The generator is seeded, so the same configuration always produces the
//! same bytes.
//!
//! # Example
//!
//! ```no_run
//! use dirmatch::generator::{generate, GeneratorConfig};
//! use std::path::Path;
//!
//! let config = GeneratorConfig::default().with_seed(7).with_big_size(1024 * 1024);
//! let report = generate(Path::new("dir1"), Path::new("dir2"), &config).unwrap();
//! println!("wrote {} files", report.files_written);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Errors raised while writing fixtures.
#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    /// A directory or file could not be written.
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Path being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// RNG seed
    pub seed: u64,
    /// Size of the `equal` and `different` files
    pub big_size: u64,
    /// Size of the `small` files
    pub small_size: u64,
    /// Size of the `similar` files
    pub similar_size: u64,
    /// How many files of each kind
    pub count: usize,
    /// Upper bound (exclusive) on substitutions per similar copy
    pub max_mutations: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            big_size: 10 * 1024 * 1024,
            small_size: 1024,
            similar_size: 5 * 1024,
            count: 1,
            max_mutations: 1000,
        }
    }
}

impl GeneratorConfig {
    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the size of the big files.
    #[must_use]
    pub fn with_big_size(mut self, size: u64) -> Self {
        self.big_size = size;
        self
    }

    /// Set the size of the small files.
    #[must_use]
    pub fn with_small_size(mut self, size: u64) -> Self {
        self.small_size = size;
        self
    }

    /// Set the size of the similar files.
    #[must_use]
    pub fn with_similar_size(mut self, size: u64) -> Self {
        self.similar_size = size;
        self
    }

    /// Set how many files of each kind are written.
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the substitution bound for similar copies.
    #[must_use]
    pub fn with_max_mutations(mut self, max: usize) -> Self {
        self.max_mutations = max;
        self
    }
}

/// Summary of a generator run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Files written across both directories
    pub files_written: usize,
    /// Bytes written across both directories
    pub bytes_written: u64,
    /// Substitutions applied to each `similar_right{i}`, in index order
    pub mutations: Vec<usize>,
}

/// Write fixture files into `dir_a` and `dir_b`, creating them if needed.
///
/// # Errors
///
/// [`GenerateError::Io`] on the first failed write.
pub fn generate(
    dir_a: &Path,
    dir_b: &Path,
    config: &GeneratorConfig,
) -> Result<GenerateReport, GenerateError> {
    create_dir(dir_a)?;
    create_dir(dir_b)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut report = GenerateReport::default();

    let equal = random_buffer(&mut rng, config.big_size);
    for i in 0..config.count {
        let name = format!("equal{i}");
        write(&mut report, &dir_a.join(&name), &equal)?;
        write(&mut report, &dir_b.join(&name), &equal)?;
    }

    for (prefix, size) in [("different", config.big_size), ("small", config.small_size)] {
        for i in 0..config.count {
            let name = format!("{prefix}{i}");
            let left = random_buffer(&mut rng, size);
            let right = random_buffer(&mut rng, size);
            write(&mut report, &dir_a.join(&name), &left)?;
            write(&mut report, &dir_b.join(&name), &right)?;
        }
    }

    let similar = random_buffer(&mut rng, config.similar_size);
    write(&mut report, &dir_a.join("similar_left"), &similar)?;
    for i in 0..config.count {
        let mut copy = similar.clone();
        let applied = mutate(&mut rng, &mut copy, config.max_mutations);
        report.mutations.push(applied);
        write(&mut report, &dir_b.join(format!("similar_right{i}")), &copy)?;
    }

    log::info!(
        "Generated {} files ({}) in {} and {}",
        report.files_written,
        bytesize::ByteSize::b(report.bytes_written),
        dir_a.display(),
        dir_b.display()
    );

    Ok(report)
}

fn random_buffer(rng: &mut StdRng, size: u64) -> Vec<u8> {
    let mut buffer = vec![0u8; usize::try_from(size).unwrap_or(usize::MAX)];
    rng.fill(buffer.as_mut_slice());
    buffer
}

/// Overwrite up to `max_mutations - 1` random positions with random bytes.
///
/// Returns the number of substitutions applied.
fn mutate(rng: &mut StdRng, buffer: &mut [u8], max_mutations: usize) -> usize {
    if buffer.is_empty() || max_mutations == 0 {
        return 0;
    }
    let count = rng.gen_range(0..max_mutations);
    for _ in 0..count {
        let pos = rng.gen_range(0..buffer.len());
        buffer[pos] = rng.gen();
    }
    count
}

fn create_dir(dir: &Path) -> Result<(), GenerateError> {
    fs::create_dir_all(dir).map_err(|source| GenerateError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write(report: &mut GenerateReport, path: &Path, content: &[u8]) -> Result<(), GenerateError> {
    fs::write(path, content).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Wrote {} ({} bytes)", path.display(), content.len());
    report.files_written += 1;
    report.bytes_written += content.len() as u64;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig::default()
            .with_seed(42)
            .with_big_size(4096)
            .with_small_size(1024)
            .with_similar_size(2048)
    }

    #[test]
    fn test_generate_layout() {
        let root = TempDir::new().unwrap();
        let (a, b) = (root.path().join("a"), root.path().join("b"));

        let report = generate(&a, &b, &small_config().with_count(2)).unwrap();

        // 2 equal + 2 different + 2 small per side, similar_left, 2 similar_right
        assert_eq!(report.files_written, 15);
        for name in ["equal0", "equal1", "different1", "small0", "similar_left"] {
            assert!(a.join(name).exists(), "{name} missing in a");
        }
        assert!(b.join("similar_right1").exists());
        assert!(!b.join("similar_left").exists());
        assert_eq!(fs::read(a.join("equal0")).unwrap(), fs::read(b.join("equal0")).unwrap());
        assert_ne!(
            fs::read(a.join("different0")).unwrap(),
            fs::read(b.join("different0")).unwrap()
        );
    }

    #[test]
    fn test_generate_is_deterministic() {
        let root = TempDir::new().unwrap();
        let config = small_config();
        generate(&root.path().join("a1"), &root.path().join("b1"), &config).unwrap();
        generate(&root.path().join("a2"), &root.path().join("b2"), &config).unwrap();

        for name in ["different0", "small0", "similar_right0"] {
            let side = if name == "similar_right0" { "b" } else { "a" };
            assert_eq!(
                fs::read(root.path().join(format!("{side}1")).join(name)).unwrap(),
                fs::read(root.path().join(format!("{side}2")).join(name)).unwrap()
            );
        }
    }

    #[test]
    fn test_similar_copy_is_mutated_and_same_size() {
        let root = TempDir::new().unwrap();
        let (a, b) = (root.path().join("a"), root.path().join("b"));
        let report = generate(&a, &b, &small_config().with_max_mutations(50)).unwrap();

        let left = fs::read(a.join("similar_left")).unwrap();
        let right = fs::read(b.join("similar_right0")).unwrap();
        assert_eq!(left.len(), right.len());

        let differing = left.iter().zip(&right).filter(|(x, y)| x != y).count();
        assert!(report.mutations[0] < 50);
        assert!(differing <= report.mutations[0]);
    }

    #[test]
    fn test_zero_max_mutations_writes_exact_copy() {
        let root = TempDir::new().unwrap();
        let (a, b) = (root.path().join("a"), root.path().join("b"));
        generate(&a, &b, &small_config().with_max_mutations(0)).unwrap();

        assert_eq!(
            fs::read(a.join("similar_left")).unwrap(),
            fs::read(b.join("similar_right0")).unwrap()
        );
    }

    #[test]
    fn test_generate_into_file_path_fails() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let result = generate(&blocker, &root.path().join("b"), &small_config());
        assert!(matches!(result, Err(GenerateError::Io { .. })));
    }
}
