use std::fs;
use std::path::Path;

use rand::Rng;
use tracing::{info, warn};

use crate::sampling::sample_uniform;

/// A static pool of image bytes used as upload payloads.
///
/// Images live in a directory as numbered files (`house.1.jpg`,
/// `house.2.jpg`, ...) and are read fully into memory once; after that they
/// are referenced by value, never by path. Missing files shrink the pool
/// instead of failing the run.
pub struct ImagePool {
    images: Vec<Vec<u8>>,
}

impl ImagePool {
    /// Load up to `count` numbered images from `dir`.
    pub fn load(dir: &Path, count: usize) -> Self {
        let mut images = Vec::new();
        for i in 1..=count {
            let path = dir.join(format!("house.{i}.jpg"));
            match fs::read(&path) {
                Ok(bytes) => images.push(bytes),
                Err(err) => warn!("skipping image {}: {err}", path.display()),
            }
        }
        info!("image pool loaded with {} images", images.len());
        Self { images }
    }

    /// An empty pool, for scenarios that never upload media.
    pub fn empty() -> Self {
        Self { images: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Pick a random image, or `None` when the pool is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&[u8]> {
        sample_uniform(rng, &self.images).map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn loads_numbered_files_and_skips_gaps() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("house.1.jpg"), b"one").unwrap();
        fs::write(dir.path().join("house.3.jpg"), b"three").unwrap();

        let pool = ImagePool::load(dir.path(), 3);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn sample_returns_loaded_bytes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("house.1.jpg"), b"one").unwrap();
        let pool = ImagePool::load(dir.path(), 1);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pool.sample(&mut rng).unwrap(), b"one");
    }

    #[test]
    fn empty_pool_samples_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(ImagePool::empty().sample(&mut rng).is_none());
    }
}
