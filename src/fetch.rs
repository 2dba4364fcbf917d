//! Remote byte retrieval.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::LoadError;

/// Boxed future returned by [`Fetch::retrieve`].
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, LoadError>> + Send>>;

/// Opaque byte transport: `retrieve(url) -> bytes | error`.
///
/// Object-safe so the loader can hold any transport behind an `Arc`; tests
/// substitute an in-memory fake.
pub trait Fetch: Send + Sync {
    /// Retrieve the raw bytes behind `url`.
    fn retrieve(&self, url: &str) -> FetchFuture;
}

/// Production transport over reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl Fetch for HttpFetcher {
    fn retrieve(&self, url: &str) -> FetchFuture {
        let client = self.client.clone();
        let url = url.to_string();
        Box::pin(async move {
            tracing::debug!("Downloading image: {url}");

            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| LoadError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::HttpStatus(status.as_u16()));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| LoadError::Network(e.to_string()))?;

            Ok(bytes.to_vec())
        })
    }
}
