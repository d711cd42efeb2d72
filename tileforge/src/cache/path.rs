//! Cache path construction.

use crate::coord::TileCoord;
use std::path::{Path, PathBuf};

/// Construct the on-disk path for a cached tile.
///
/// Creates a hierarchical path structure with no file extension:
/// ```text
/// <cache_root>/<zoom>/<col>/<row>
/// ```
///
/// The row component is always the caller's original row; TMS row flipping
/// applies to remote addressing only.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use tileforge::cache::tile_path;
/// use tileforge::coord::TileCoord;
///
/// let root = PathBuf::from("/cache");
/// let coord = TileCoord::new(19295, 24640, 16).unwrap();
///
/// assert_eq!(
///     tile_path(&root, &coord),
///     PathBuf::from("/cache/16/19295/24640")
/// );
/// ```
pub fn tile_path(cache_root: &Path, coord: &TileCoord) -> PathBuf {
    cache_root
        .join(coord.zoom.to_string())
        .join(coord.col.to_string())
        .join(coord.row.to_string())
}
