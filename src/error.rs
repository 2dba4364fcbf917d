//! Error taxonomy for fetch, decode, and cache persistence.

use thiserror::Error;

/// Errors produced while fetching, decoding, or persisting images.
///
/// `Clone` so the result of one coalesced fetch can be fanned out to every
/// waiter sharing it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// Transport-level failure reaching the remote host.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status code.
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// The payload could not be decoded as an image.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// A cache file could not be read. Callers treat this as a cache miss.
    #[error("cache read failed: {0}")]
    StorageRead(String),

    /// A cache file could not be written (disk full, permissions).
    #[error("cache write failed: {0}")]
    StorageWrite(String),

    /// The in-flight fetch was dropped before producing a result.
    #[error("fetch canceled")]
    Canceled,
}
