//! Tile coordinate model
//!
//! Validated `(column, row, zoom)` triples in the XYZ slippy-map scheme and
//! the derived quantities the synthesis paths need: ancestors via bit-shifted
//! zoom deltas, the 2×2 child quadrant set, and the offset of a tile within
//! an ancestor's footprint. All operations are pure.

mod types;

pub use types::{Children, CoordError, TileCoord, MAX_ZOOM};
