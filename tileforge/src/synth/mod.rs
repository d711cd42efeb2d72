//! Tile synthesis
//!
//! Produces a tile image when no cached or remote tile exists at the exact
//! requested zoom, by cropping and upscaling an ancestor (overzoom) or by
//! compositing child tiles one level deeper onto a quadrant canvas
//! (underzoom and double-size rendering).
//!
//! Both algorithms are pure with respect to their inputs: the same ancestor
//! or child bytes always produce the same output encoding. Overzoom uses
//! nearest-neighbor upscaling so the crop arithmetic stays exact; composites
//! paint onto a transparent canvas and leave missing quadrants transparent
//! rather than interpolating.
//!
//! The functions here are CPU-bound and synchronous; the orchestrator runs
//! them under `spawn_blocking`.

use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use thiserror::Error;
use tracing::warn;

/// Cap on overzoom extrapolation. Cropping deeper than 3 levels magnifies a
/// sub-tile past the point of visual acceptability.
pub const MAX_OVERZOOM_LEVELS: u8 = 3;

/// Errors that can occur during tile synthesis.
///
/// All of these degrade to an absent tile at the orchestrator; none are
/// surfaced to the host.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Requested extrapolation beyond [`MAX_OVERZOOM_LEVELS`].
    #[error("Overzoom of {levels} levels exceeds the maximum of {MAX_OVERZOOM_LEVELS}")]
    TooDeep { levels: u8 },

    /// Source bytes could not be decoded as an image.
    #[error("Image decode failed: {0}")]
    Decode(String),

    /// Composed canvas could not be encoded.
    #[error("Image encode failed: {0}")]
    Encode(String),

    /// No usable source images were available.
    #[error("No usable source tiles for synthesis")]
    NoSources,
}

/// Quadrant placement offsets in painting order: top-left, top-right,
/// bottom-left, bottom-right. Matches [`crate::coord::Children::as_array`].
const QUADRANTS: [(u32, u32); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];

/// Synthesizes a tile by cropping a sub-rectangle out of an ancestor and
/// scaling it up to the target canvas.
///
/// The ancestor sits `levels` zoom steps above the requested tile; the crop
/// starts at `(x_offset, y_offset) * (tile_size / 2^levels)` with that side
/// length, where the offsets come from
/// [`crate::coord::TileCoord::offset_within_parent`]. Level 0 scales the
/// whole ancestor; the double-size path uses this to serve the native zoom
/// on a doubled canvas.
///
/// # Errors
///
/// `TooDeep` beyond the extrapolation cap, `Decode` for corrupt ancestor
/// bytes, `Encode` if the PNG encoder fails.
pub fn overzoom(
    ancestor: &[u8],
    x_offset: u32,
    y_offset: u32,
    levels: u8,
    tile_size: u32,
    canvas_size: u32,
) -> Result<Vec<u8>, SynthesisError> {
    if levels > MAX_OVERZOOM_LEVELS {
        return Err(SynthesisError::TooDeep { levels });
    }
    let sub_size = tile_size >> levels;
    if sub_size == 0 {
        return Err(SynthesisError::TooDeep { levels });
    }

    let source = decode(ancestor)?;
    let crop = imageops::crop_imm(
        &source,
        x_offset * sub_size,
        y_offset * sub_size,
        sub_size,
        sub_size,
    )
    .to_image();

    // Nearest keeps the upscale an exact pixel replication.
    let scaled = imageops::resize(&crop, canvas_size, canvas_size, FilterType::Nearest);
    encode_png(&scaled)
}

/// Composites up to four child tiles onto a transparent quadrant canvas.
///
/// `children` is in painting order (top-left, top-right, bottom-left,
/// bottom-right); absent entries leave their quadrant transparent, and a
/// child that fails to decode is skipped the same way. Children whose
/// dimensions differ from the half-canvas quadrant are resampled to fit;
/// this is what turns four native-resolution children into one
/// coarser-zoom tile, or leaves them untouched on a doubled canvas.
///
/// # Errors
///
/// `NoSources` when nothing could be painted, `Encode` if the PNG encoder
/// fails.
pub fn compose(
    children: &[Option<Bytes>; 4],
    canvas_size: u32,
) -> Result<Vec<u8>, SynthesisError> {
    if children.iter().all(Option::is_none) {
        return Err(SynthesisError::NoSources);
    }

    let half = canvas_size / 2;
    let mut canvas = RgbaImage::new(canvas_size, canvas_size);
    let mut painted = 0u32;

    for (bytes, (qx, qy)) in children.iter().zip(QUADRANTS) {
        let Some(bytes) = bytes else { continue };
        let child = match decode(bytes) {
            Ok(img) => img,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable child tile in composite");
                continue;
            }
        };
        let child = if child.width() != half || child.height() != half {
            imageops::resize(&child, half, half, FilterType::Triangle)
        } else {
            child
        };
        imageops::overlay(&mut canvas, &child, (qx * half) as i64, (qy * half) as i64);
        painted += 1;
    }

    if painted == 0 {
        return Err(SynthesisError::NoSources);
    }
    encode_png(&canvas)
}

/// Decodes encoded image bytes into RGBA.
fn decode(bytes: &[u8]) -> Result<RgbaImage, SynthesisError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| SynthesisError::Decode(e.to_string()))
}

/// Encodes an RGBA canvas as PNG.
fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, SynthesisError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| SynthesisError::Encode(e.to_string()))?;
    Ok(buffer)
}
