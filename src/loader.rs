//! Single-flight image fetching.
//!
//! At most one retrieval per URL is in flight at any time. The first request
//! becomes the leader: it retrieves the bytes, decodes them once, saves the
//! entry into the cache, and notifies every waiter in arrival order.
//! Requests arriving while the fetch is in flight join its waiter list
//! instead of starting new work.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use image::DynamicImage;
use tokio::sync::oneshot;

use crate::cache::ImageCache;
use crate::config::CacheConfig;
use crate::error::LoadError;
use crate::fetch::{Fetch, HttpFetcher};

/// Result fanned out to every waiter of a coalesced fetch.
pub type FetchOutcome = Result<Arc<DynamicImage>, LoadError>;

type WaiterMap = Mutex<HashMap<String, Vec<oneshot::Sender<FetchOutcome>>>>;

/// Coalescing image loader over a shared cache and a byte transport.
///
/// Cheap to clone; clones share the same in-flight table, so coalescing
/// works across all of them.
#[derive(Clone)]
pub struct ImageLoader {
    cache: ImageCache,
    fetcher: Arc<dyn Fetch>,
    in_flight: Arc<WaiterMap>,
}

impl ImageLoader {
    /// Create a loader with an explicit transport.
    pub fn new(cache: ImageCache, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            cache,
            fetcher,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a loader with the production HTTP transport.
    pub fn over_http(cache: ImageCache, config: &CacheConfig) -> Self {
        let timeout = std::time::Duration::from_secs(config.fetch_timeout_secs);
        Self::new(cache, Arc::new(HttpFetcher::new(timeout)))
    }

    /// The cache this loader saves into.
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Join or start the coalesced fetch for `url`.
    ///
    /// Must be called inside a tokio runtime. The returned receiver resolves
    /// once the fetch completes; waiters are notified in arrival order.
    pub fn request(&self, url: &str) -> oneshot::Receiver<FetchOutcome> {
        let (tx, rx) = oneshot::channel();

        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(waiters) = in_flight.get_mut(url) {
            waiters.push(tx);
            return rx;
        }
        in_flight.insert(url.to_string(), vec![tx]);
        drop(in_flight);

        let this = self.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            let outcome = this.fetch_and_store(&url).await;

            // Remove the entry before notifying, so a request landing after
            // this point starts a fresh fetch instead of being lost.
            let waiters = this
                .in_flight
                .lock()
                .unwrap()
                .remove(&url)
                .unwrap_or_default();
            for waiter in waiters {
                let _ = waiter.send(outcome.clone());
            }
        });
        rx
    }

    /// Await the coalesced fetch for `url`.
    pub async fn load(&self, url: &str) -> FetchOutcome {
        self.request(url).await.unwrap_or(Err(LoadError::Canceled))
    }

    async fn fetch_and_store(&self, url: &str) -> FetchOutcome {
        let bytes = self.fetcher.retrieve(url).await?;
        let image = Arc::new(self.cache.decode(&bytes)?);

        if let Err(e) = self.cache.admit(url, &bytes, Arc::clone(&image)) {
            // The decoded image already sits in the memory index; keep
            // serving it this run even though persistence failed.
            tracing::warn!("Failed to persist image {url}: {e}");
        }

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;
    use tokio::sync::Semaphore;

    fn png_bytes() -> Vec<u8> {
        let image = DynamicImage::new_rgba8(2, 2);
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn cache_in(dir: &std::path::Path) -> ImageCache {
        let config = CacheConfig {
            cache_dir: Some(dir.to_path_buf()),
            ..CacheConfig::default()
        };
        ImageCache::new(&config).unwrap()
    }

    /// Transport fake: counts calls, optionally parks until released.
    struct FakeFetcher {
        calls: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
        response: Result<Vec<u8>, LoadError>,
    }

    impl FakeFetcher {
        fn ok(bytes: Vec<u8>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: None,
                response: Ok(bytes),
            }
        }

        fn failing(error: LoadError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: None,
                response: Err(error),
            }
        }

        fn gated(bytes: Vec<u8>, gate: Arc<Semaphore>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: Some(gate),
                response: Ok(bytes),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetch for FakeFetcher {
        fn retrieve(&self, _url: &str) -> crate::fetch::FetchFuture {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.clone();
            let response = self.response.clone();
            Box::pin(async move {
                if let Some(gate) = gate {
                    let _permit = gate.acquire().await.unwrap();
                }
                response
            })
        }
    }

    #[tokio::test]
    async fn test_single_flight() {
        let dir = tempdir().unwrap();
        let gate = Arc::new(Semaphore::new(0));
        let fetcher = Arc::new(FakeFetcher::gated(png_bytes(), Arc::clone(&gate)));
        let loader = ImageLoader::new(cache_in(dir.path()), Arc::clone(&fetcher) as Arc<dyn Fetch>);

        let receivers: Vec<_> = (0..5).map(|_| loader.request("u1")).collect();
        gate.add_permits(1);

        let mut images = Vec::new();
        for rx in receivers {
            images.push(rx.await.unwrap().unwrap());
        }

        assert_eq!(fetcher.calls(), 1);
        // every waiter shares the one decoded image
        for image in &images[1..] {
            assert!(Arc::ptr_eq(&images[0], image));
        }
    }

    #[tokio::test]
    async fn test_success_populates_cache() {
        let dir = tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::ok(png_bytes()));
        let loader = ImageLoader::new(cache_in(dir.path()), Arc::clone(&fetcher) as Arc<dyn Fetch>);

        loader.load("u1").await.unwrap();
        assert!(loader.cache().has_cached("u1"));
        assert_eq!(loader.cache().data_for_url("u1").unwrap(), png_bytes());
    }

    #[tokio::test]
    async fn test_failure_not_cached() {
        let dir = tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::failing(LoadError::HttpStatus(404)));
        let loader = ImageLoader::new(cache_in(dir.path()), Arc::clone(&fetcher) as Arc<dyn Fetch>);

        let err = loader.load("u3").await.unwrap_err();
        assert_eq!(err, LoadError::HttpStatus(404));
        assert!(!loader.cache().has_cached("u3"));

        // failures are not cached: the next request fetches again
        let _ = loader.load("u3").await;
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_bytes_not_cached() {
        let dir = tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::ok(b"not an image".to_vec()));
        let loader = ImageLoader::new(cache_in(dir.path()), Arc::clone(&fetcher) as Arc<dyn Fetch>);

        let err = loader.load("u1").await.unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
        assert!(!loader.cache().has_cached("u1"));
    }

    #[tokio::test]
    async fn test_request_after_completion_fetches_fresh() {
        let dir = tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::ok(png_bytes()));
        let loader = ImageLoader::new(cache_in(dir.path()), Arc::clone(&fetcher) as Arc<dyn Fetch>);

        loader.load("u1").await.unwrap();
        loader.load("u1").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_during_in_flight_resaves() {
        let dir = tempdir().unwrap();
        let gate = Arc::new(Semaphore::new(0));
        let fetcher = Arc::new(FakeFetcher::gated(png_bytes(), Arc::clone(&gate)));
        let loader = ImageLoader::new(cache_in(dir.path()), Arc::clone(&fetcher) as Arc<dyn Fetch>);

        let rx = loader.request("u1");
        loader.cache().delete_all();
        gate.add_permits(1);

        rx.await.unwrap().unwrap();
        // the in-flight fetch completed normally and re-saved its result
        assert!(loader.cache().has_cached("u1"));
    }
}
