//! Remote tile source
//!
//! Resolves a tile coordinate to a URL by template substitution and fetches
//! the raw encoded bytes through an opaque [`HttpClient`]. Zoom levels
//! outside the configured bounds produce no URL rather than an error, and
//! every fetch failure (timeout, HTTP status, transport error) degrades to
//! an absent tile: the orchestrator treats remote unavailability identically
//! to a cache miss.

mod http;

pub use http::{BoxFuture, HttpClient, ReqwestClient};

#[cfg(test)]
pub use http::tests::MockHttpClient;

use crate::coord::TileCoord;
use crate::engine::EngineConfig;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during remote source operations.
///
/// These never escape the engine: the orchestrator maps every fetch failure
/// to an absent result.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// HTTP request failed (transport error, timeout, or non-success status).
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Remote tile source addressing a templated XYZ endpoint.
///
/// Stateless apart from the injected HTTP client; all addressing parameters
/// come from the per-request configuration snapshot, so a reconfigured
/// template or zoom bound applies to subsequent requests with no coordination.
pub struct TileSource {
    client: Arc<dyn HttpClient>,
}

impl TileSource {
    /// Creates a source backed by the given HTTP client.
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Builds the remote URL for a coordinate.
    ///
    /// Substitutes the `{x}`, `{y}` and `{z}` tokens, applying the TMS row
    /// flip when configured. Returns `None` ("no URL", not an error) when
    /// the template is empty or the zoom falls outside a configured-active
    /// bound (bound value 0 means no limit).
    pub fn build_url(&self, coord: &TileCoord, config: &EngineConfig) -> Option<String> {
        if config.url_template.is_empty() {
            return None;
        }
        if config.max_zoom > 0 && coord.zoom > config.max_zoom {
            return None;
        }
        if config.min_zoom > 0 && coord.zoom < config.min_zoom {
            return None;
        }

        let row = if config.flip_rows {
            coord.flipped_row()
        } else {
            coord.row
        };

        Some(
            config
                .url_template
                .replace("{x}", &coord.col.to_string())
                .replace("{y}", &row.to_string())
                .replace("{z}", &coord.zoom.to_string()),
        )
    }

    /// Fetches the encoded bytes for a coordinate.
    ///
    /// Returns `None` when no URL applies or on any fetch failure; the
    /// failure is logged at debug level and otherwise swallowed.
    pub async fn fetch(&self, coord: &TileCoord, config: &EngineConfig) -> Option<Bytes> {
        let url = self.build_url(coord, config)?;
        match self.client.get(&url).await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                debug!(coord = %coord, "Remote source returned empty body");
                None
            }
            Err(e) => {
                debug!(coord = %coord, error = %e, "Tile fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_template(template: &str) -> EngineConfig {
        EngineConfig::new(template)
    }

    fn source_returning(response: Result<Bytes, SourceError>) -> TileSource {
        TileSource::new(Arc::new(MockHttpClient { response }))
    }

    #[test]
    fn test_build_url_substitutes_tokens() {
        let source = source_returning(Ok(Bytes::new()));
        let config = config_with_template("https://tiles.example.com/{z}/{x}/{y}.png");
        let coord = TileCoord::new(5, 3, 4).unwrap();

        let url = source.build_url(&coord, &config).unwrap();
        assert_eq!(url, "https://tiles.example.com/4/5/3.png");
    }

    #[test]
    fn test_build_url_applies_row_flip() {
        let source = source_returning(Ok(Bytes::new()));
        let config = config_with_template("https://t.example.com/{z}/{x}/{y}").with_flip_rows(true);
        let coord = TileCoord::new(0, 1, 3).unwrap();

        // 2^3 - 1 - 1 = 6
        let url = source.build_url(&coord, &config).unwrap();
        assert_eq!(url, "https://t.example.com/3/0/6");
    }

    #[test]
    fn test_build_url_none_above_max_zoom() {
        let source = source_returning(Ok(Bytes::new()));
        let config = config_with_template("https://t.example.com/{z}/{x}/{y}").with_zoom_bounds(0, 10);
        let coord = TileCoord::new(0, 0, 11).unwrap();

        assert!(source.build_url(&coord, &config).is_none());
    }

    #[test]
    fn test_build_url_none_below_min_zoom() {
        let source = source_returning(Ok(Bytes::new()));
        let config = config_with_template("https://t.example.com/{z}/{x}/{y}").with_zoom_bounds(5, 10);
        let coord = TileCoord::new(0, 0, 4).unwrap();

        assert!(source.build_url(&coord, &config).is_none());
    }

    #[test]
    fn test_build_url_zero_bounds_mean_no_limit() {
        let source = source_returning(Ok(Bytes::new()));
        let config = config_with_template("https://t.example.com/{z}/{x}/{y}");
        let coord = TileCoord::new(0, 0, 25).unwrap();

        assert!(source.build_url(&coord, &config).is_some());
    }

    #[test]
    fn test_build_url_none_for_empty_template() {
        let source = source_returning(Ok(Bytes::new()));
        let config = config_with_template("");
        let coord = TileCoord::new(0, 0, 3).unwrap();

        assert!(source.build_url(&coord, &config).is_none());
    }

    #[tokio::test]
    async fn test_fetch_returns_bytes_on_success() {
        let source = source_returning(Ok(Bytes::from_static(b"png-bytes")));
        let config = config_with_template("https://t.example.com/{z}/{x}/{y}");
        let coord = TileCoord::new(1, 1, 2).unwrap();

        let fetched = source.fetch(&coord, &config).await.unwrap();
        assert_eq!(fetched.as_ref(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_absent() {
        let source = source_returning(Err(SourceError::Http("HTTP 503".into())));
        let config = config_with_template("https://t.example.com/{z}/{x}/{y}");
        let coord = TileCoord::new(1, 1, 2).unwrap();

        assert!(source.fetch(&coord, &config).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_empty_body_is_absent() {
        let source = source_returning(Ok(Bytes::new()));
        let config = config_with_template("https://t.example.com/{z}/{x}/{y}");
        let coord = TileCoord::new(1, 1, 2).unwrap();

        assert!(source.fetch(&coord, &config).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_out_of_bounds_never_hits_network() {
        // A client that would fail loudly if invoked.
        let source = source_returning(Err(SourceError::Http("must not be called".into())));
        let config = config_with_template("https://t.example.com/{z}/{x}/{y}").with_zoom_bounds(0, 5);
        let coord = TileCoord::new(0, 0, 6).unwrap();

        // Out-of-bounds zoom short-circuits to absent before the client.
        assert!(source.fetch(&coord, &config).await.is_none());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_build_url_never_leaks_tokens(
                col in 0u32..256,
                row in 0u32..256,
                zoom in 8u8..=12
            ) {
                let source = source_returning(Ok(Bytes::new()));
                let config = config_with_template("https://t.example.com/{z}/{x}/{y}@2x.png");
                let coord = TileCoord::new(col, row, zoom).unwrap();

                let url = source.build_url(&coord, &config).unwrap();
                prop_assert!(!url.contains('{'), "url should not contain an unsubstituted open brace");
                prop_assert!(!url.contains('}'), "url should not contain an unsubstituted close brace");
            }

            #[test]
            fn test_build_url_row_flip_stays_in_grid(
                col in 0u32..256,
                row in 0u32..256,
                zoom in 8u8..=12
            ) {
                let source = source_returning(Ok(Bytes::new()));
                let config = config_with_template("{z}/{x}/{y}").with_flip_rows(true);
                let coord = TileCoord::new(col, row, zoom).unwrap();

                let url = source.build_url(&coord, &config).unwrap();
                let flipped: u32 = url.rsplit('/').next().unwrap().parse().unwrap();
                prop_assert!(flipped < (1u32 << zoom));
            }
        }
    }
}
