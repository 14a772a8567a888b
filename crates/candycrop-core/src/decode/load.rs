//! Load pipeline: decode, orient, downsample and apply the initial rotation.
//!
//! The cancellation token is checked before every expensive step so a
//! superseded load stops as early as possible.

use tracing::debug;

use super::resize::resize_to_fit;
use super::source::{apply_orientation, decode_dynamic, extract_orientation};
use super::{FilterType, LoadError, SourceImage};
use crate::worker::CancelToken;

/// Default longest edge a loaded source may keep.
pub const DEFAULT_MAX_SOURCE_EDGE: u32 = 4096;

/// Parameters for turning encoded bytes into a crop source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Sources larger than this on either edge are downsampled.
    pub max_edge: u32,
    /// Requested rotation in degrees, quantized to 90° steps.
    pub initial_rotation: f32,
    /// Filter used when downsampling.
    pub filter: FilterType,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_MAX_SOURCE_EDGE,
            initial_rotation: 0.0,
            filter: FilterType::Bilinear,
        }
    }
}

/// Quantize an initial rotation to clockwise quarter turns.
///
/// `(0, 90]` maps to one turn, `(90, 180]` to two, `(180, 270]` to three;
/// everything else (including negative angles) leaves the image upright.
pub fn initial_quarter_turns(degrees: f32) -> u8 {
    if degrees > 0.0 && degrees <= 90.0 {
        1
    } else if degrees > 90.0 && degrees <= 180.0 {
        2
    } else if degrees > 180.0 && degrees <= 270.0 {
        3
    } else {
        0
    }
}

/// Decode `bytes` into a crop source.
pub fn load_source(
    bytes: &[u8],
    options: &LoadOptions,
    cancel: &CancelToken,
) -> Result<SourceImage, LoadError> {
    cancel.check(LoadError::Cancelled)?;
    let img = decode_dynamic(bytes)?;

    cancel.check(LoadError::Cancelled)?;
    let orientation = extract_orientation(bytes);
    let img = apply_orientation(img, orientation);

    let img = match initial_quarter_turns(options.initial_rotation) {
        1 => img.rotate90(),
        2 => img.rotate180(),
        3 => img.rotate270(),
        _ => img,
    };
    let source = SourceImage::from_rgba_image(img.into_rgba8());

    cancel.check(LoadError::Cancelled)?;
    let (width, height) = (source.width, source.height);
    let source = resize_to_fit(&source, options.max_edge, options.filter)
        .ok_or_else(|| LoadError::Decode("image has no pixels".to_string()))?;

    debug!(
        ?orientation,
        width,
        height,
        loaded_width = source.width,
        loaded_height = source.height,
        "decoded crop source"
    );
    Ok(source)
}
