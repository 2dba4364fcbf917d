//! Per-consumer load session.
//!
//! A session tracks one active load request for one display surface:
//! `Idle -> Loading -> Loaded | Failed`. A new request supersedes any
//! in-flight one through a generation counter; a completion carrying an
//! older generation is discarded without delivery, while the coalesced
//! fetch itself still completes and populates the cache for everyone else.
//!
//! Fetch and disk work run on tokio worker tasks; delivery happens through
//! an event channel the consumer drains on its own context with
//! [`LoadSession::poll_events`].

use std::sync::{Arc, Mutex};

use image::DynamicImage;
use tokio::sync::mpsc;

use crate::error::LoadError;
use crate::loader::ImageLoader;
use crate::style::{ImageStyle, IndicatorStyle};

/// Lifecycle of one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No request active
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// The requested image was delivered
    Loaded,
    /// The fetch failed; any placeholder stays displayed
    Failed,
}

/// Delivery events drained by the consumer.
#[derive(Clone)]
pub enum SessionEvent {
    /// Interim visual shown while the real image is in flight.
    Placeholder {
        /// The placeholder image
        image: Arc<DynamicImage>,
    },
    /// The requested image is ready.
    Loaded {
        /// URL (or file path) the image was loaded for
        url: String,
        /// The decoded image
        image: Arc<DynamicImage>,
    },
    /// The fetch failed.
    Failed {
        /// URL the fetch was for
        url: String,
        /// What went wrong
        error: LoadError,
    },
}

/// Generation counter, state, and loaded URL, guarded by one mutex so a
/// completion can never interleave between the staleness check and delivery.
struct SessionState {
    generation: u64,
    state: LoadState,
    loaded_url: Option<String>,
}

/// Per-consumer load state machine bound to one display surface.
pub struct LoadSession {
    loader: ImageLoader,
    style: ImageStyle,
    show_indicator: bool,
    indicator_style: IndicatorStyle,
    shared: Arc<Mutex<SessionState>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl LoadSession {
    /// Create a session over a shared loader.
    #[must_use]
    pub fn new(loader: ImageLoader) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            loader,
            style: ImageStyle::default(),
            show_indicator: false,
            indicator_style: IndicatorStyle::default(),
            shared: Arc::new(Mutex::new(SessionState {
                generation: 0,
                state: LoadState::Idle,
                loaded_url: None,
            })),
            events_tx,
            events_rx,
        }
    }

    /// Request the image behind `url`.
    ///
    /// With `use_cache` set and a warm cache, the image is delivered
    /// synchronously before this returns. Otherwise the session enters
    /// `Loading`, the placeholder (if any) is delivered as an interim
    /// visual, and the fetch is joined or started via the loader. A newer
    /// request supersedes this one; its result is then discarded.
    ///
    /// Must be called inside a tokio runtime.
    pub fn request(&self, url: &str, use_cache: bool, placeholder: Option<Arc<DynamicImage>>) {
        let generation = {
            let mut shared = self.shared.lock().unwrap();
            shared.generation += 1;

            if use_cache {
                if let Some(image) = self.loader.cache().image_for_url(url) {
                    shared.state = LoadState::Loaded;
                    shared.loaded_url = Some(url.to_string());
                    let _ = self.events_tx.send(SessionEvent::Loaded {
                        url: url.to_string(),
                        image,
                    });
                    return;
                }
            }

            shared.state = LoadState::Loading;
            shared.generation
        };

        if let Some(image) = placeholder {
            let _ = self.events_tx.send(SessionEvent::Placeholder { image });
        }

        let rx = self.loader.request(url);
        let shared = Arc::clone(&self.shared);
        let events_tx = self.events_tx.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            let outcome = rx.await.unwrap_or(Err(LoadError::Canceled));

            let mut state = shared.lock().unwrap();
            if state.generation != generation {
                tracing::debug!("Discarding stale result for {url}");
                return;
            }
            match outcome {
                Ok(image) => {
                    state.state = LoadState::Loaded;
                    state.loaded_url = Some(url.clone());
                    let _ = events_tx.send(SessionEvent::Loaded { url, image });
                }
                Err(error) => {
                    state.state = LoadState::Failed;
                    tracing::warn!("Failed to load image {url}: {error}");
                    let _ = events_tx.send(SessionEvent::Failed { url, error });
                }
            }
        });
    }

    /// Load an image from a local file, delivered synchronously as a
    /// zero-latency cache hit keyed by the path string.
    pub fn load_file(&self, path: &str) -> Result<(), LoadError> {
        let cache = self.loader.cache();
        let image = match cache.image_for_url(path) {
            Some(image) => image,
            None => {
                let bytes =
                    std::fs::read(path).map_err(|e| LoadError::StorageRead(e.to_string()))?;
                let image = Arc::new(cache.decode(&bytes)?);
                if let Err(e) = cache.admit(path, &bytes, Arc::clone(&image)) {
                    tracing::warn!("Failed to persist file image {path}: {e}");
                }
                image
            }
        };

        let mut shared = self.shared.lock().unwrap();
        shared.generation += 1;
        shared.state = LoadState::Loaded;
        shared.loaded_url = Some(path.to_string());
        let _ = self.events_tx.send(SessionEvent::Loaded {
            url: path.to_string(),
            image,
        });
        Ok(())
    }

    /// Cancel delivery interest and reset to `Idle`.
    ///
    /// Any in-flight completion is treated as stale; the underlying
    /// coalesced fetch is not aborted, since other sessions may share it.
    pub fn clear(&self) {
        let mut shared = self.shared.lock().unwrap();
        shared.generation += 1;
        shared.state = LoadState::Idle;
        shared.loaded_url = None;
    }

    /// Drain delivered events (non-blocking).
    pub fn poll_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Current state.
    pub fn state(&self) -> LoadState {
        self.shared.lock().unwrap().state
    }

    /// True while a fetch is in flight.
    pub fn loading(&self) -> bool {
        self.state() == LoadState::Loading
    }

    /// True once the requested image has been delivered.
    pub fn loaded(&self) -> bool {
        self.state() == LoadState::Loaded
    }

    /// URL of the last successfully loaded image, if any.
    pub fn loaded_url(&self) -> Option<String> {
        self.shared.lock().unwrap().loaded_url.clone()
    }

    /// Whether the busy indicator should currently be drawn.
    ///
    /// Pure projection of state: visible for the whole `Loading` state when
    /// enabled, hidden otherwise.
    pub fn indicator_visible(&self) -> bool {
        self.show_indicator && self.loading()
    }

    /// Presentation transforms handed to the renderer.
    pub const fn style(&self) -> ImageStyle {
        self.style
    }

    /// Set the presentation transforms.
    pub const fn set_style(&mut self, style: ImageStyle) {
        self.style = style;
    }

    /// Whether an indicator is shown during loads.
    pub const fn show_indicator(&self) -> bool {
        self.show_indicator
    }

    /// Enable or disable the busy indicator.
    pub const fn set_show_indicator(&mut self, show: bool) {
        self.show_indicator = show;
    }

    /// Indicator style handed to the indicator view.
    pub const fn indicator_style(&self) -> IndicatorStyle {
        self.indicator_style
    }

    /// Set the indicator style.
    pub const fn set_indicator_style(&mut self, style: IndicatorStyle) {
        self.indicator_style = style;
    }
}
