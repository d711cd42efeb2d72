//! TileForge - tile resolution and caching for map-rendering hosts
//!
//! Given a request for a map tile identified by (column, row, zoom), this
//! library returns encoded image bytes drawn from a local on-disk cache, a
//! templated remote source, or, when the exact zoom level is not natively
//! available, synthesized from neighboring zoom levels by cropping or
//! compositing.
//!
//! The entry point is [`TileEngine`]:
//!
//! ```no_run
//! use std::sync::Arc;
//! use tileforge::{EngineConfig, ReqwestClient, TileEngine};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::new("https://tiles.example.com/{z}/{x}/{y}.png")
//!     .with_max_native_zoom(18)
//!     .with_cache_root("/var/cache/tiles");
//!
//! let engine = TileEngine::new(config, Arc::new(ReqwestClient::new()?))?;
//! let tile = engine.resolve_tile(19295, 24640, 16).await;
//! # Ok(())
//! # }
//! ```
//!
//! Per-tile failures (cache misses, fetch errors, corrupt images, synthesis
//! out of bounds) never surface as errors; they degrade to
//! [`TileResult::Absent`] and the host renders its placeholder. The only
//! fatal condition is an invalid [`EngineConfig`] at construction.

pub mod cache;
pub mod coord;
pub mod engine;
pub mod logging;
pub mod source;
pub mod synth;

pub use coord::{CoordError, TileCoord};
pub use engine::{Canvas, ConfigError, EngineConfig, ResolutionPlan, TileEngine, TileResult};
pub use source::{HttpClient, ReqwestClient, SourceError};
