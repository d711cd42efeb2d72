//! Engine configuration.
//!
//! `EngineConfig` carries every addressing, caching and synthesis parameter
//! the engine needs. It is validated once at construction (the engine's only
//! fatal error surface) and then held as an immutable snapshot; reconfiguring
//! swaps the snapshot atomically and applies to subsequent requests only.

use crate::coord::MAX_ZOOM;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Configuration for a [`crate::engine::TileEngine`].
///
/// Zoom bounds use 0 as "unconfigured / no limit" throughout, matching the
/// convention of XYZ tile overlays. A typical remote-backed setup:
///
/// ```
/// use tileforge::engine::EngineConfig;
///
/// let config = EngineConfig::new("https://tiles.example.com/{z}/{x}/{y}.png")
///     .with_zoom_bounds(2, 20)
///     .with_max_native_zoom(18)
///     .with_cache_root("/var/cache/tiles")
///     .with_cache_max_age_secs(86_400);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tile edge length in pixels.
    pub tile_size: u32,

    /// Render onto a doubled canvas by compositing children one zoom deeper.
    pub double_tile_size: bool,

    /// Minimum zoom the remote source serves (0 = no limit).
    pub min_zoom: u8,

    /// Maximum zoom the engine serves at all (0 = no limit).
    pub max_zoom: u8,

    /// Maximum zoom natively available from cache/remote; deeper requests
    /// are synthesized by overzoom (0 = no limit, never synthesize).
    pub max_native_zoom: u8,

    /// Address remote rows bottom-up (TMS). Cache keys are unaffected.
    pub flip_rows: bool,

    /// Root directory of the on-disk tile cache; `None` disables caching.
    pub cache_root: Option<PathBuf>,

    /// Maximum age of a cache entry before a refresh is attempted;
    /// 0 = entries never expire (sliding freshness).
    pub cache_max_age_secs: u64,

    /// Never touch the network; serve from cache and synthesis only.
    pub offline_mode: bool,

    /// Enable the cache/synthesis machinery. When off, every request is a
    /// plain pass-through fetch.
    pub synthesis_enabled: bool,

    /// Remote URL template with `{x}`, `{y}` and `{z}` tokens. Empty means
    /// no remote source (cache/synthesis only).
    pub url_template: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            double_tile_size: false,
            min_zoom: 0,
            max_zoom: 0,
            max_native_zoom: 0,
            flip_rows: false,
            cache_root: None,
            cache_max_age_secs: 0,
            offline_mode: false,
            synthesis_enabled: true,
            url_template: String::new(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration for the given URL template with defaults for
    /// everything else.
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            ..Self::default()
        }
    }

    /// Sets the tile edge length in pixels.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Enables or disables double-size rendering.
    pub fn with_double_tile_size(mut self, double: bool) -> Self {
        self.double_tile_size = double;
        self
    }

    /// Sets the minimum and maximum served zoom (0 = no limit).
    pub fn with_zoom_bounds(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// Sets the maximum natively available zoom (0 = no limit).
    pub fn with_max_native_zoom(mut self, max_native_zoom: u8) -> Self {
        self.max_native_zoom = max_native_zoom;
        self
    }

    /// Enables or disables TMS row flipping for remote addressing.
    pub fn with_flip_rows(mut self, flip: bool) -> Self {
        self.flip_rows = flip;
        self
    }

    /// Sets the cache root directory.
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }

    /// Sets the cache freshness window (0 = never expire).
    pub fn with_cache_max_age_secs(mut self, secs: u64) -> Self {
        self.cache_max_age_secs = secs;
        self
    }

    /// Enables or disables offline mode.
    pub fn with_offline_mode(mut self, offline: bool) -> Self {
        self.offline_mode = offline;
        self
    }

    /// Enables or disables the cache/synthesis machinery.
    pub fn with_synthesis_enabled(mut self, enabled: bool) -> Self {
        self.synthesis_enabled = enabled;
        self
    }

    /// The canvas edge length a top-level request renders to.
    pub fn canvas_size(&self) -> u32 {
        if self.double_tile_size {
            self.tile_size * 2
        } else {
            self.tile_size
        }
    }

    /// Validates the configuration.
    ///
    /// This is the engine's only fatal error surface: everything else
    /// degrades per request.
    ///
    /// # Errors
    ///
    /// - `ZeroTileSize`: the tile size must be positive.
    /// - `ZoomBoundExceedsMax`: a bound beyond the coordinate grid.
    /// - `ZoomBoundsInverted`: `min_zoom > max_zoom` with both configured.
    /// - `NativeBelowMin`: `max_native_zoom < min_zoom` with both
    ///   configured; synthesis recursion relies on this ordering.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size == 0 {
            return Err(ConfigError::ZeroTileSize);
        }
        for zoom in [self.min_zoom, self.max_zoom, self.max_native_zoom] {
            if zoom > MAX_ZOOM {
                return Err(ConfigError::ZoomBoundExceedsMax(zoom));
            }
        }
        if self.min_zoom > 0 && self.max_zoom > 0 && self.min_zoom > self.max_zoom {
            return Err(ConfigError::ZoomBoundsInverted {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if self.min_zoom > 0 && self.max_native_zoom > 0 && self.max_native_zoom < self.min_zoom {
            return Err(ConfigError::NativeBelowMin {
                native: self.max_native_zoom,
                min: self.min_zoom,
            });
        }
        Ok(())
    }
}

/// Errors reported for an invalid [`EngineConfig`] at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Tile size must be positive.
    #[error("Tile size must be positive")]
    ZeroTileSize,

    /// A zoom bound exceeds the supported coordinate range.
    #[error("Zoom bound {0} exceeds the maximum supported zoom {MAX_ZOOM}")]
    ZoomBoundExceedsMax(u8),

    /// Minimum zoom exceeds maximum zoom.
    #[error("Minimum zoom {min} exceeds maximum zoom {max}")]
    ZoomBoundsInverted { min: u8, max: u8 },

    /// Maximum native zoom lies below the minimum zoom.
    #[error("Maximum native zoom {native} lies below minimum zoom {min}")]
    NativeBelowMin { native: u8, min: u8 },
}
