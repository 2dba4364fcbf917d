//! # pixcache
//!
//! Asynchronous, cached image loading with single-flight fetch coalescing.
//!
//! Given a URL (or a local file path), pixcache fetches the image at most
//! once, persists the bytes in a durable URL-keyed cache, and delivers the
//! decoded image to the requesting consumer along with its presentation
//! transforms and a busy-indicator projection while the load is in flight.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       LoadSession                           │
//! │   Per-consumer state machine: Idle → Loading → Loaded/Failed│
//! │   Generation counter suppresses stale deliveries            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ImageLoader                           │
//! │   Single-flight coalescing: one fetch per URL, waiters      │
//! │   notified in arrival order, decode once, save once         │
//! └─────────────────────────────────────────────────────────────┘
//!              │                               │
//!              ▼                               ▼
//! ┌─────────────────────────┐      ┌─────────────────────────┐
//! │       ImageCache        │      │          Fetch          │
//! │                         │      │                         │
//! │ • MemoryIndex (LRU)     │      │ • HttpFetcher (reqwest) │
//! │ • ByteStore (disk)      │      │ • test fakes            │
//! └─────────────────────────┘      └─────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cache`] — two-tier cache: decoded images in memory, bytes on disk
//! - [`loader`] — coalescing fetch pipeline
//! - [`session`] — per-consumer load lifecycle and delivery
//! - [`fetch`] — byte transport trait and the reqwest implementation
//! - [`style`] — declarative render parameters carried to the renderer
//! - [`config`] — cache and loader configuration
//!
//! ## Example
//!
//! ```no_run
//! use pixcache::{CacheConfig, ImageCache, ImageLoader, LoadSession};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = CacheConfig::default();
//! let cache = ImageCache::new(&config)?;
//! let loader = ImageLoader::over_http(cache, &config);
//!
//! let mut session = LoadSession::new(loader);
//! session.request("https://example.com/avatar.png", true, None);
//!
//! // later, on the consumer's own context:
//! for event in session.poll_events() {
//!     // hand the image and session.style() to the renderer
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::option_if_let_else)]

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod paths;
pub mod session;
pub mod style;

// Re-export main types for convenience
pub use cache::{ByteStore, ImageCache, MemoryIndex};
pub use config::CacheConfig;
pub use error::LoadError;
pub use fetch::{Fetch, FetchFuture, HttpFetcher};
pub use loader::{FetchOutcome, ImageLoader};
pub use session::{LoadSession, LoadState, SessionEvent};
pub use style::{EdgeInsets, ImageStyle, IndicatorStyle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
