//! Snap-to-crop: keep the crop rectangle covered by the image.
//!
//! Coverage is judged on the axis-aligned bounds of the mapped image.

use tracing::trace;

use crate::geometry::{AffineTransform, Rect};

/// Axis-aligned bounds of a `width` x `height` image mapped by `transform`.
pub fn image_bounds(transform: &AffineTransform, width: u32, height: u32) -> Rect {
    transform.map_rect(&Rect::from_size(width as f64, height as f64))
}

/// Scale magnitude at which the mapped bounds just cover `crop`, keeping the
/// transform's current rotation.
pub fn cover_scale(transform: &AffineTransform, width: u32, height: u32, crop: &Rect) -> f64 {
    let bounds = image_bounds(transform, width, height);
    if bounds.is_empty() {
        return transform.scale_factor();
    }
    let needed = (crop.width() / bounds.width()).max(crop.height() / bounds.height());
    transform.scale_factor() * needed
}

/// Enforce coverage of `crop` by the mapped image.
///
/// Bounds smaller than the crop rectangle are scaled up uniformly about its
/// center. Then the left, top, right and bottom edges are corrected in turn
/// with the smallest translation that brings each inside the bounds.
pub fn snap_to_crop(
    transform: &AffineTransform,
    width: u32,
    height: u32,
    crop: &Rect,
) -> AffineTransform {
    let mut t = *transform;
    let mut bounds = image_bounds(&t, width, height);
    if bounds.is_empty() || crop.is_empty() {
        return t;
    }

    if bounds.width() < crop.width() || bounds.height() < crop.height() {
        let factor = (crop.width() / bounds.width()).max(crop.height() / bounds.height());
        let (cx, cy) = crop.center();
        t = t.post_scale(factor, factor, cx, cy);
        bounds = image_bounds(&t, width, height);
        trace!(factor, "snap scaled image to cover crop window");
    }

    let shift = |dx: f64, dy: f64, t: &mut AffineTransform, bounds: &mut Rect| {
        *t = t.post_translate(dx, dy);
        *bounds = bounds.translate(dx, dy);
        trace!(dx, dy, "snap translated image");
    };
    if bounds.left > crop.left {
        shift(crop.left - bounds.left, 0.0, &mut t, &mut bounds);
    }
    if bounds.top > crop.top {
        shift(0.0, crop.top - bounds.top, &mut t, &mut bounds);
    }
    if bounds.right < crop.right {
        shift(crop.right - bounds.right, 0.0, &mut t, &mut bounds);
    }
    if bounds.bottom < crop.bottom {
        shift(0.0, crop.bottom - bounds.bottom, &mut t, &mut bounds);
    }

    t
}
