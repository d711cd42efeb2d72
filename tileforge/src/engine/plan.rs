//! Resolution planning.
//!
//! The branch over {pass-through, overzoom, underzoom, native, double-size
//! composite} is a pure function of the requested zoom and the configuration
//! snapshot, expressed as an explicit [`ResolutionPlan`] so the precedence
//! and bounds are testable in isolation from any I/O.

use crate::engine::EngineConfig;

/// The canvas a resolution renders to.
///
/// Only the requested tile targets a doubled canvas; recursive child and
/// ancestor resolutions always render standard-size tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Canvas {
    /// `tile_size` square output.
    Standard,
    /// `2 * tile_size` square output (double-size mode, top level only).
    Doubled,
}

/// How a request at a given zoom is to be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPlan {
    /// Synthesis machinery disabled: plain remote fetch, no cache.
    PassThrough,

    /// Zoom above the configured maximum: unavailable.
    OutOfRange,

    /// Zoom below the configured minimum: composite from the four children
    /// one level deeper.
    Underzoom,

    /// Zoom beyond (or, doubled, at) the native maximum: crop and upscale
    /// from the ancestor at `ancestor_zoom`.
    Overzoom { ancestor_zoom: u8 },

    /// Within native range: cache lookup, then remote fetch.
    Native,

    /// Within native range on a doubled canvas: composite the four children
    /// one level deeper at full resolution.
    DoubleComposite,
}

impl ResolutionPlan {
    /// Whether the offline fallback search applies when this plan comes up
    /// empty. Only the native-range plans fall back to ancestor synthesis;
    /// the synthesized plans already exhausted their sources.
    pub fn fallback_eligible(&self) -> bool {
        matches!(self, ResolutionPlan::Native | ResolutionPlan::DoubleComposite)
    }
}

/// Computes the resolution plan for a zoom level.
///
/// `doubled` is whether this resolution targets a doubled canvas; nested
/// resolutions pass `Canvas::Standard` regardless of the configuration.
/// Zoom bounds with value 0 are treated as "no limit" in every comparison.
pub fn plan_for(zoom: u8, config: &EngineConfig, canvas: Canvas) -> ResolutionPlan {
    if !config.synthesis_enabled {
        return ResolutionPlan::PassThrough;
    }
    if config.max_zoom > 0 && zoom > config.max_zoom {
        return ResolutionPlan::OutOfRange;
    }
    if zoom < config.min_zoom {
        return ResolutionPlan::Underzoom;
    }

    let doubled = canvas == Canvas::Doubled;
    if config.max_native_zoom > 0 {
        if !doubled && zoom > config.max_native_zoom {
            return ResolutionPlan::Overzoom {
                ancestor_zoom: config.max_native_zoom,
            };
        }
        // On a doubled canvas the children would sit beyond the native
        // maximum, so the native tile itself is upscaled instead.
        if doubled && zoom >= config.max_native_zoom {
            return ResolutionPlan::Overzoom {
                ancestor_zoom: config.max_native_zoom,
            };
        }
    }

    if doubled {
        ResolutionPlan::DoubleComposite
    } else {
        ResolutionPlan::Native
    }
}
