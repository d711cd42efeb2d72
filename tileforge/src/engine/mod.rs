//! Resolution orchestrator
//!
//! The decision procedure that, for each requested tile, chooses among the
//! disk cache, the remote source, synthesis from neighboring zoom levels,
//! and a bounded offline fallback search, and returns final bytes or an
//! absent result. Per-tile failures of any kind degrade to `Absent`; nothing
//! recoverable crosses the engine boundary.
//!
//! Synthesis re-enters the orchestrator for child and ancestor coordinates
//! through a depth-bounded recursive resolve with an injected coalescing
//! layer, so concurrent requests for the same coordinate share one in-flight
//! resolution.

mod coalesce;
mod config;
pub mod plan;

pub use config::{ConfigError, EngineConfig, DEFAULT_TILE_SIZE};
pub use plan::{plan_for, Canvas, ResolutionPlan};

use crate::cache::TileCache;
use crate::coord::TileCoord;
use crate::source::{BoxFuture, HttpClient, TileSource};
use crate::synth;
use bytes::Bytes;
use coalesce::{Flight, FlightKey, RequestCoalescer};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bound on orchestrator re-entry for synthesis.
///
/// Composites recurse upward in zoom and overzoom recurses downward, so the
/// dependency graph is acyclic; this bound is the backstop against runaway
/// fan-out on misconfigured stacks.
pub const MAX_SYNTH_DEPTH: u8 = 4;

/// Outcome of a tile resolution.
///
/// Either complete (encoded bytes plus the canvas dimensions they render
/// to) or absent. Never partially populated; an absent tile is the host's
/// cue to paint its blank placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum TileResult {
    /// Encoded image bytes sized `width × height`.
    Present {
        bytes: Bytes,
        width: u32,
        height: u32,
    },
    /// No tile could be produced for this request.
    Absent,
}

impl TileResult {
    /// Whether a tile was produced.
    pub fn is_present(&self) -> bool {
        matches!(self, TileResult::Present { .. })
    }

    /// The encoded bytes, if present.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            TileResult::Present { bytes, .. } => Some(bytes),
            TileResult::Absent => None,
        }
    }
}

/// The tile resolution engine.
///
/// Owns an immutable configuration snapshot (swapped atomically by
/// [`reconfigure`](TileEngine::reconfigure)), a remote source behind an
/// injected [`HttpClient`], and the per-coordinate request coalescer. The
/// cache store is stateless and derived from the snapshot per request, so a
/// changed cache root takes effect with no coordination.
///
/// `resolve_tile` is safe to call from any number of tasks concurrently.
pub struct TileEngine {
    config: RwLock<Arc<EngineConfig>>,
    source: TileSource,
    coalescer: RequestCoalescer,
}

impl TileEngine {
    /// Creates an engine from a validated configuration and an HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an invalid configuration, the engine's
    /// only fatal error surface.
    pub fn new(config: EngineConfig, client: Arc<dyn HttpClient>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: RwLock::new(Arc::new(config)),
            source: TileSource::new(client),
            coalescer: RequestCoalescer::new(),
        })
    }

    /// Swaps in a new configuration.
    ///
    /// Takes effect for subsequent requests only; resolutions already in
    /// flight finish against the snapshot they started with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the new configuration is invalid; the
    /// previous configuration stays active.
    pub fn reconfigure(&self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.config.write() = Arc::new(config);
        Ok(())
    }

    /// Returns the active configuration snapshot.
    pub fn config(&self) -> Arc<EngineConfig> {
        Arc::clone(&self.config.read())
    }

    /// Returns `(total, coalesced)` request counts since construction, for
    /// host-side observability of the singleflight layer.
    pub fn coalescing_stats(&self) -> (u64, u64) {
        self.coalescer.stats()
    }

    /// Resolves a tile to encoded image bytes.
    ///
    /// Reads the configuration snapshot once, then walks the resolution
    /// state machine: cache, remote fetch, synthesis, offline fallback.
    /// Invalid coordinates and every per-tile failure produce
    /// [`TileResult::Absent`].
    pub async fn resolve_tile(&self, col: u32, row: u32, zoom: u8) -> TileResult {
        let coord = match TileCoord::new(col, row, zoom) {
            Ok(coord) => coord,
            Err(e) => {
                warn!(col, row, zoom, error = %e, "Rejecting invalid tile coordinate");
                return TileResult::Absent;
            }
        };

        let config = self.config();
        let canvas = if config.double_tile_size {
            Canvas::Doubled
        } else {
            Canvas::Standard
        };

        match self.resolve_shared(coord, canvas, &config, 0).await {
            Some(bytes) => {
                // Pass-through relays the remote bytes unexamined at the
                // declared tile size, and a below-minimum composite always
                // renders a standard canvas; only the remaining plans honor
                // the doubled target.
                let side = match plan_for(coord.zoom, &config, canvas) {
                    ResolutionPlan::PassThrough | ResolutionPlan::Underzoom => config.tile_size,
                    _ => self.target_size(canvas, &config),
                };
                TileResult::Present {
                    bytes,
                    width: side,
                    height: side,
                }
            }
            None => TileResult::Absent,
        }
    }

    /// Coalesced resolve: one in-flight resolution per `(coord, canvas)`.
    ///
    /// Boxed so synthesis can recurse through it for children and ancestors.
    fn resolve_shared<'a>(
        &'a self,
        coord: TileCoord,
        canvas: Canvas,
        config: &'a Arc<EngineConfig>,
        depth: u8,
    ) -> BoxFuture<'a, Option<Bytes>> {
        Box::pin(async move {
            let key = FlightKey { coord, canvas };
            match self.coalescer.register(key) {
                follower @ Flight::Follower(_) => follower.wait().await.unwrap_or(None),
                Flight::Leader => {
                    let result = self.resolve_plan(coord, canvas, config, depth).await;
                    self.coalescer.complete(key, result.clone());
                    result
                }
            }
        })
    }

    /// The per-request state machine.
    async fn resolve_plan(
        &self,
        coord: TileCoord,
        canvas: Canvas,
        config: &Arc<EngineConfig>,
        depth: u8,
    ) -> Option<Bytes> {
        let plan = plan_for(coord.zoom, config, canvas);
        debug!(coord = %coord, ?plan, depth, "Resolving tile");

        let resolved = match plan {
            ResolutionPlan::PassThrough => self.source.fetch(&coord, config).await,
            ResolutionPlan::OutOfRange => None,
            ResolutionPlan::Underzoom => {
                // Below the minimum zoom the canvas stays standard-size and
                // the composite is persisted at the requested coordinate to
                // fill the gap for repeat access.
                self.compose_children(coord, config.tile_size, true, config, depth)
                    .await
            }
            ResolutionPlan::Overzoom { ancestor_zoom } => {
                self.overzoom_from(coord, ancestor_zoom, self.target_size(canvas, config), config, depth)
                    .await
            }
            ResolutionPlan::Native => self.resolve_native(coord, config).await,
            ResolutionPlan::DoubleComposite => {
                self.compose_children(coord, config.tile_size * 2, false, config, depth)
                    .await
            }
        };

        if resolved.is_some() {
            return resolved;
        }

        // The fallback search runs for the requested tile only. Letting
        // nested resolutions fall back as well would chain ancestor searches
        // transitively and escape the three-level bound.
        if depth == 0
            && plan.fallback_eligible()
            && config.offline_mode
            && config.cache_root.is_some()
        {
            return self
                .fallback_search(coord, self.target_size(canvas, config), config, depth)
                .await;
        }
        None
    }

    /// Native-range resolution: cache lookup, then remote fetch.
    ///
    /// A cached entry is served when offline or fresh; a stale entry is
    /// discarded in favor of a refresh, and a failed refresh yields absent
    /// rather than stale bytes. Fetched tiles are written back when a cache
    /// root is configured; a failed write is logged and the tile is served
    /// anyway.
    async fn resolve_native(&self, coord: TileCoord, config: &EngineConfig) -> Option<Bytes> {
        let cache = config
            .cache_root
            .as_ref()
            .map(|root| TileCache::new(root.clone()));
        let max_age = config.cache_max_age_secs;

        if let Some(cache) = &cache {
            if let Some(bytes) = cache.read(&coord, max_age).await {
                if config.offline_mode || !cache.is_stale(&coord, max_age).await {
                    return Some(bytes);
                }
                debug!(coord = %coord, "Cache entry stale, attempting refresh");
            }
        }

        if config.offline_mode {
            return None;
        }

        let fetched = self.source.fetch(&coord, config).await?;
        if let Some(cache) = &cache {
            if let Err(e) = cache.write(&coord, &fetched).await {
                warn!(coord = %coord, error = %e, "Cache write failed, serving tile anyway");
            }
        }
        Some(fetched)
    }

    /// Resolves the four children one level deeper and composites them.
    async fn compose_children(
        &self,
        coord: TileCoord,
        canvas_size: u32,
        persist: bool,
        config: &Arc<EngineConfig>,
        depth: u8,
    ) -> Option<Bytes> {
        if depth >= MAX_SYNTH_DEPTH {
            debug!(coord = %coord, depth, "Synthesis depth exhausted");
            return None;
        }
        let children = match coord.children() {
            Ok(children) => children,
            Err(e) => {
                debug!(coord = %coord, error = %e, "No children available for composite");
                return None;
            }
        };

        let (top_left, top_right, bottom_left, bottom_right) = tokio::join!(
            self.resolve_shared(children.top_left, Canvas::Standard, config, depth + 1),
            self.resolve_shared(children.top_right, Canvas::Standard, config, depth + 1),
            self.resolve_shared(children.bottom_left, Canvas::Standard, config, depth + 1),
            self.resolve_shared(children.bottom_right, Canvas::Standard, config, depth + 1),
        );
        let inputs = [top_left, top_right, bottom_left, bottom_right];

        let composed =
            tokio::task::spawn_blocking(move || synth::compose(&inputs, canvas_size)).await;
        let bytes = match composed {
            Ok(Ok(bytes)) => Bytes::from(bytes),
            Ok(Err(e)) => {
                debug!(coord = %coord, error = %e, "Composite unavailable");
                return None;
            }
            Err(e) => {
                warn!(coord = %coord, error = %e, "Composite task failed");
                return None;
            }
        };

        if persist {
            if let Some(root) = &config.cache_root {
                let cache = TileCache::new(root.clone());
                if let Err(e) = cache.write(&coord, &bytes).await {
                    warn!(coord = %coord, error = %e, "Failed to persist composite tile");
                }
            }
        }
        Some(bytes)
    }

    /// Resolves the ancestor at `ancestor_zoom` and crops/upscales out of it.
    ///
    /// Overzoom results are never persisted; they are re-derived from the
    /// ancestor, which keeps ancestor refreshes visible.
    async fn overzoom_from(
        &self,
        coord: TileCoord,
        ancestor_zoom: u8,
        canvas_size: u32,
        config: &Arc<EngineConfig>,
        depth: u8,
    ) -> Option<Bytes> {
        if depth >= MAX_SYNTH_DEPTH {
            debug!(coord = %coord, depth, "Synthesis depth exhausted");
            return None;
        }
        let levels = coord.zoom.checked_sub(ancestor_zoom)?;
        if levels > synth::MAX_OVERZOOM_LEVELS {
            debug!(coord = %coord, levels, "Overzoom delta beyond cap");
            return None;
        }
        let ancestor = coord.parent_at(levels).ok()?;

        let ancestor_bytes = self
            .resolve_shared(ancestor, Canvas::Standard, config, depth + 1)
            .await?;

        let (dx, dy) = coord.offset_within_parent(levels);
        let tile_size = config.tile_size;
        let result = tokio::task::spawn_blocking(move || {
            synth::overzoom(&ancestor_bytes, dx, dy, levels, tile_size, canvas_size)
        })
        .await;

        match result {
            Ok(Ok(bytes)) => Some(Bytes::from(bytes)),
            Ok(Err(e)) => {
                debug!(coord = %coord, error = %e, "Overzoom unavailable");
                None
            }
            Err(e) => {
                warn!(coord = %coord, error = %e, "Overzoom task failed");
                None
            }
        }
    }

    /// Offline fallback: bounded search for any usable ancestor.
    ///
    /// Walks candidate ancestor zooms downward from
    /// `min(zoom - 1, max_native_zoom - 1)` to `max(min_zoom, zoom - 3)`,
    /// at most three synthesis attempts, and stops at the first success.
    async fn fallback_search(
        &self,
        coord: TileCoord,
        canvas_size: u32,
        config: &Arc<EngineConfig>,
        depth: u8,
    ) -> Option<Bytes> {
        let mut start = coord.zoom.checked_sub(1)?;
        if config.max_native_zoom > 0 {
            start = start.min(config.max_native_zoom - 1);
        }
        let floor = config.min_zoom.max(coord.zoom.saturating_sub(3));
        if start < floor {
            return None;
        }

        for try_zoom in (floor..=start).rev() {
            if let Some(bytes) = self
                .overzoom_from(coord, try_zoom, canvas_size, config, depth)
                .await
            {
                debug!(coord = %coord, try_zoom, "Offline fallback found an ancestor");
                return Some(bytes);
            }
        }
        None
    }

    /// The canvas edge length for a resolution target.
    fn target_size(&self, canvas: Canvas, config: &EngineConfig) -> u32 {
        match canvas {
            Canvas::Standard => config.tile_size,
            Canvas::Doubled => config.tile_size * 2,
        }
    }
}
