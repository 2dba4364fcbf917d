//! Bounded in-memory index of decoded images.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use image::DynamicImage;

/// A decoded image plus its last access time (for LRU eviction)
struct Slot {
    image: Arc<DynamicImage>,
    last_access: Instant,
}

/// Fast in-process URL -> decoded image map with bounded retention.
pub struct MemoryIndex {
    max_entries: usize,
    slots: Mutex<HashMap<String, Slot>>,
}

impl MemoryIndex {
    /// Create an index retaining at most `max_entries` images.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Store a decoded image, evicting the least recently used entry if full.
    pub fn insert(&self, url: &str, image: Arc<DynamicImage>) {
        let mut slots = self.slots.lock().unwrap();

        if slots.len() >= self.max_entries && !slots.contains_key(url) {
            Self::evict_oldest(&mut slots);
        }

        slots.insert(
            url.to_string(),
            Slot {
                image,
                last_access: Instant::now(),
            },
        );
    }

    /// Get a decoded image, refreshing its access time.
    pub fn get(&self, url: &str) -> Option<Arc<DynamicImage>> {
        let mut slots = self.slots.lock().unwrap();
        slots.get_mut(url).map(|slot| {
            slot.last_access = Instant::now();
            Arc::clone(&slot.image)
        })
    }

    /// Check if an image is indexed.
    pub fn contains(&self, url: &str) -> bool {
        self.slots.lock().unwrap().contains_key(url)
    }

    /// Drop the entry for `url`. No-op if absent.
    pub fn remove(&self, url: &str) {
        self.slots.lock().unwrap().remove(url);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.slots.lock().unwrap().clear();
    }

    /// Number of indexed images.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().unwrap().is_empty()
    }

    fn evict_oldest(slots: &mut HashMap<String, Slot>) {
        if let Some(oldest_key) = slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_access)
            .map(|(key, _)| key.clone())
        {
            slots.remove(&oldest_key);
        }
    }
}
