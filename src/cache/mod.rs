//! Two-tier image cache: decoded images in memory, raw bytes on disk.
//!
//! Lookups check the [`MemoryIndex`] first, then the [`ByteStore`], promoting
//! a disk hit into memory. The cache never fetches remotely; that is the
//! loader's job.

mod memory;
mod store;

pub use memory::MemoryIndex;
pub use store::ByteStore;

use std::io::Cursor;
use std::sync::Arc;

use anyhow::Result;
use image::DynamicImage;

use crate::config::CacheConfig;
use crate::error::LoadError;

/// Thread-safe image cache shared by loaders and sessions.
///
/// Cheap to clone (the state lives behind an `Arc`); construct one per
/// application and pass the handle to every consumer.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Inner>,
}

struct Inner {
    store: ByteStore,
    memory: MemoryIndex,
    downscale_to: Option<u32>,
}

impl ImageCache {
    /// Build a cache from configuration.
    ///
    /// Uses `config.cache_dir` if set, otherwise the platform default
    /// directory.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => crate::paths::default_cache_dir()?,
        };
        let store = ByteStore::new(dir)?;
        Ok(Self {
            inner: Arc::new(Inner {
                store,
                memory: MemoryIndex::new(config.max_memory_entries),
                downscale_to: config.downscale_to,
            }),
        })
    }

    /// Check whether an entry exists for `url`, in memory or on disk.
    /// No side effects.
    pub fn has_cached(&self, url: &str) -> bool {
        self.inner.memory.contains(url) || self.inner.store.contains(url)
    }

    /// Decoded image for `url`, if cached. Never fetches remotely.
    ///
    /// A disk hit is decoded and promoted into the memory index. A corrupt
    /// disk entry degrades to a miss.
    pub fn image_for_url(&self, url: &str) -> Option<Arc<DynamicImage>> {
        if let Some(image) = self.inner.memory.get(url) {
            return Some(image);
        }

        let bytes = self.inner.store.read(url)?;
        match self.decode(&bytes) {
            Ok(image) => {
                let image = Arc::new(image);
                self.inner.memory.insert(url, Arc::clone(&image));
                Some(image)
            }
            Err(e) => {
                tracing::warn!("Corrupt cache entry for {url}: {e}");
                None
            }
        }
    }

    /// Raw cached bytes for `url`, if present on disk.
    pub fn data_for_url(&self, url: &str) -> Option<Vec<u8>> {
        self.inner.store.read(url)
    }

    /// Cache raw encoded bytes under `url`, overwriting any previous entry.
    ///
    /// Idempotent. The decoded image is placed in the memory index before
    /// the disk write, so a storage-write failure is reported but the image
    /// stays deliverable for this run.
    pub fn save_data(&self, bytes: &[u8], url: &str) -> Result<(), LoadError> {
        let image = Arc::new(self.decode(bytes)?);
        self.admit(url, bytes, image)
    }

    /// Cache an already-decoded image under `url`, re-encoding it as PNG.
    pub fn save_image(&self, image: &DynamicImage, url: &str) -> Result<(), LoadError> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| LoadError::Decode(e.to_string()))?;
        self.admit(url, &bytes, Arc::new(image.clone()))
    }

    /// Remove the entry for `url` from both stores. No-op if absent.
    pub fn delete(&self, url: &str) {
        self.inner.memory.remove(url);
        self.inner.store.remove(url);
    }

    /// Remove every entry from both stores.
    ///
    /// Fetches already in flight complete normally and re-save their result
    /// (last-writer-wins).
    pub fn delete_all(&self) {
        self.inner.memory.clear();
        self.inner.store.clear();
    }

    /// Insert into the memory index, then persist to disk.
    ///
    /// Only the disk write can fail; on failure the in-memory entry is kept.
    pub(crate) fn admit(
        &self,
        url: &str,
        bytes: &[u8],
        image: Arc<DynamicImage>,
    ) -> Result<(), LoadError> {
        self.inner.memory.insert(url, image);
        self.inner.store.write(url, bytes)
    }

    /// Decode bytes, applying the configured downscale.
    pub(crate) fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, LoadError> {
        let image = image::load_from_memory(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
        Ok(self.downscale(image))
    }

    /// Downscale oversized images to save memory and rendering time.
    fn downscale(&self, image: DynamicImage) -> DynamicImage {
        let Some(max_dimension) = self.inner.downscale_to else {
            return image;
        };

        let (width, height) = (image.width(), image.height());
        if width <= max_dimension && height <= max_dimension {
            return image;
        }

        let ratio = f64::from(width) / f64::from(height);
        let (new_width, new_height) = if width > height {
            (max_dimension, (f64::from(max_dimension) / ratio) as u32)
        } else {
            ((f64::from(max_dimension) * ratio) as u32, max_dimension)
        };

        image.resize(new_width, new_height, image::imageops::FilterType::Triangle)
    }
}
