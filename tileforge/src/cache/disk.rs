//! Disk-backed tile store with mtime-based freshness.

use crate::cache::path::tile_path;
use crate::coord::TileCoord;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};

/// Sequence number for temp file names, unique within the process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Errors that can occur during cache operations.
///
/// All of these are recoverable from the caller's perspective: a failed read
/// is a miss, a failed write still leaves the fetched tile available to
/// return.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Disk store mapping tile coordinates to raw encoded image bytes.
///
/// Entries live at `<root>/<zoom>/<col>/<row>` with no extension. Freshness
/// is the file's modification time; the store never deletes entries, so
/// eviction, if any, is the host's concern.
///
/// Writes are atomic: bytes land in a uniquely-named temp file in the target
/// directory and are renamed into place, so a concurrent reader sees either
/// the old bytes or the new bytes, never a torn file. Concurrent writers to
/// the same coordinate degrade to last-write-wins.
pub struct TileCache {
    root: PathBuf,
}

impl TileCache {
    /// Creates a store rooted at `root`.
    ///
    /// The directory hierarchy is created lazily on first write.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the on-disk path for a coordinate.
    pub fn path_for(&self, coord: &TileCoord) -> PathBuf {
        tile_path(&self.root, coord)
    }

    /// Reads the cached bytes for a coordinate.
    ///
    /// A missing entry is a normal outcome, not an error; I/O failures on an
    /// existing entry are logged and reported as a miss.
    ///
    /// With `max_age_secs == 0` entries are eternally fresh and the entry's
    /// mtime is refreshed on each read, giving sliding freshness for hosts
    /// that never want re-fetches.
    pub async fn read(&self, coord: &TileCoord, max_age_secs: u64) -> Option<Bytes> {
        let path = self.path_for(coord);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                if max_age_secs == 0 {
                    // Sliding freshness: touching keeps the entry young for
                    // any external mtime-based cleanup.
                    let now = filetime::FileTime::from_system_time(SystemTime::now());
                    if let Err(e) = filetime::set_file_mtime(&path, now) {
                        debug!(coord = %coord, error = %e, "Failed to refresh cache mtime");
                    }
                }
                Some(Bytes::from(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(coord = %coord, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Reports whether the entry for a coordinate is older than `max_age_secs`.
    ///
    /// `max_age_secs == 0` means eternally fresh. A missing or unreadable
    /// entry is reported stale, which steers the caller toward a refresh.
    pub async fn is_stale(&self, coord: &TileCoord, max_age_secs: u64) -> bool {
        if max_age_secs == 0 {
            return false;
        }
        let path = self.path_for(coord);
        let modified = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.modified().ok(),
            Err(_) => None,
        };
        match modified.and_then(|m| SystemTime::now().duration_since(m).ok()) {
            Some(age) => age.as_secs() > max_age_secs,
            // Unreadable mtime or clock skew: err on the side of refreshing.
            None => true,
        }
    }

    /// Persists bytes for a coordinate, creating intermediate directories.
    ///
    /// The write goes to a temp file in the target directory and is renamed
    /// into place. Failure is non-fatal to resolution; callers log and move
    /// on.
    pub async fn write(&self, coord: &TileCoord, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(coord);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_file_name(format!(
            "{}.{}.{}.tmp",
            coord.row,
            std::process::id(),
            seq
        ));

        tokio::fs::write(&tmp, bytes).await?;
        match tokio::fs::rename(&tmp, &path).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Leave no orphaned temp file behind.
                let _ = tokio::fs::remove_file(&tmp).await;
                Err(e.into())
            }
        }
    }
}
