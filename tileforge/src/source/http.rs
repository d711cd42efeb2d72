//! HTTP client abstraction for testability

use super::SourceError;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling mock HTTP clients in tests. It uses `Pin<Box<dyn Future>>` so
/// the engine can hold the client as a trait object (`Arc<dyn HttpClient>`).
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, SourceError>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(30)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, SourceError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| SourceError::Http(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(SourceError::Http(format!(
                    "HTTP {} from {}",
                    response.status(),
                    url
                )));
            }

            response
                .bytes()
                .await
                .map_err(|e| SourceError::Http(format!("Failed to read response: {}", e)))
        })
    }
}
