//! Image resizing used by the loader and the crop renderer.
//!
//! All functions return new `SourceImage` instances without modifying the input.

use super::{FilterType, SourceImage};

/// Resize an image to exact dimensions.
///
/// Returns `None` when a target dimension is zero or the source buffer does
/// not match its declared size.
pub fn resize(
    image: &SourceImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Option<SourceImage> {
    if width == 0 || height == 0 {
        return None;
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Some(image.clone());
    }

    let view = image.as_view()?;
    let resized = image::imageops::resize(&view, width, height, filter.to_image_filter());
    Some(SourceImage::from_rgba_image(resized))
}

/// Downsample an image so neither edge exceeds `max_edge`, preserving the
/// aspect ratio. Images that already fit are returned unchanged.
pub fn resize_to_fit(image: &SourceImage, max_edge: u32, filter: FilterType) -> Option<SourceImage> {
    if max_edge == 0 {
        return None;
    }

    if image.width <= max_edge && image.height <= max_edge {
        return Some(image.clone());
    }

    let (new_width, new_height) = calculate_fit_dimensions(image.width, image.height, max_edge);
    resize(image, new_width, new_height, filter)
}

/// Calculate dimensions to fit within max_edge while preserving aspect ratio.
pub(crate) fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f64 / height as f64;

    if width >= height {
        // Landscape or square: constrain by width
        let new_height = (max_edge as f64 / ratio).round() as u32;
        (max_edge, new_height.max(1))
    } else {
        // Portrait: constrain by height
        let new_width = (max_edge as f64 * ratio).round() as u32;
        (new_width.max(1), max_edge)
    }
}
