//! Fitting the cropped region into the requested output size.

use image::{imageops, Rgba, RgbaImage};

use crate::config::{Color, OutputSize};
use crate::decode::{resize, FilterType, SourceImage};

/// Relative aspect ratio difference tolerated before letterboxing.
pub const ASPECT_EPSILON: f64 = 0.001;

/// True when `width`x`height` and `output` differ in aspect ratio by more
/// than [`ASPECT_EPSILON`], relative to the output's.
pub fn needs_letterbox(width: u32, height: u32, output: OutputSize) -> bool {
    let cropped = width as f64 / height as f64;
    let target = output.width as f64 / output.height as f64;
    (cropped - target).abs() / target > ASPECT_EPSILON
}

/// Resize `image` into `output`.
///
/// Matching aspect ratios are resized exactly. Otherwise the image is
/// scaled to fit inside the output and centered on a canvas filled with
/// `background`.
pub fn fit_to_output(
    image: &SourceImage,
    output: OutputSize,
    background: Color,
    filter: FilterType,
) -> Option<SourceImage> {
    if image.is_empty() || output.width == 0 || output.height == 0 {
        return None;
    }
    if !needs_letterbox(image.width, image.height, output) {
        return resize(image, output.width, output.height, filter);
    }

    let (w, h) = (image.width as f64, image.height as f64);
    let dw = output.width as f64 / w;
    let dh = output.height as f64 / h;
    let (scaled_w, scaled_h) = if dw < dh {
        let sh = ((h * dw).round() as u32).clamp(1, output.height);
        (output.width, sh)
    } else {
        let sw = ((w * dh).round() as u32).clamp(1, output.width);
        (sw, output.height)
    };

    let scaled = resize(image, scaled_w, scaled_h, filter)?.to_rgba_image()?;
    let mut canvas = RgbaImage::from_pixel(output.width, output.height, Rgba(background.to_rgba()));
    let x = (output.width - scaled_w) / 2;
    let y = (output.height - scaled_h) / 2;
    imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);

    Some(SourceImage::from_rgba_image(canvas))
}

/// Fill pixels outside the circle inscribed in the image (diameter = image
/// height) with `background`.
pub fn apply_circle_mask(image: &mut SourceImage, background: Color) {
    let (cx, cy) = (image.width as f64 / 2.0, image.height as f64 / 2.0);
    let radius = image.height as f64 / 2.0;
    let fill = background.to_rgba();
    let width = image.width as usize;

    for (i, px) in image
        .pixels
        .chunks_exact_mut(SourceImage::CHANNELS)
        .enumerate()
    {
        let x = (i % width) as f64 + 0.5;
        let y = (i / width) as f64 + 0.5;
        if (x - cx).hypot(y - cy) > radius {
            px.copy_from_slice(&fill);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: Color = Color::from_argb(255, 0, 0, 255);

    #[test]
    fn test_needs_letterbox_tolerates_rounding() {
        assert!(!needs_letterbox(1000, 1000, OutputSize::new(500, 500)));
        assert!(!needs_letterbox(1001, 1000, OutputSize::new(500, 500)));
        assert!(needs_letterbox(1002, 1000, OutputSize::new(500, 500)));
        assert!(needs_letterbox(400, 300, OutputSize::new(100, 100)));
    }

    #[test]
    fn test_matching_aspect_resizes_exactly() {
        let img = SourceImage::filled(300, 200, RED);
        let out = fit_to_output(&img, OutputSize::new(150, 100), BLUE, FilterType::Bilinear)
            .unwrap();
        assert_eq!((out.width, out.height), (150, 100));
        assert_eq!(out.pixel(0, 0), Some(RED));
        assert_eq!(out.pixel(149, 99), Some(RED));
    }

    #[test]
    fn test_wide_crop_is_letterboxed() {
        let img = SourceImage::filled(400, 200, RED);
        let out = fit_to_output(&img, OutputSize::new(100, 100), BLUE, FilterType::Bilinear)
            .unwrap();
        assert_eq!((out.width, out.height), (100, 100));
        // image occupies rows 25..75
        assert_eq!(out.pixel(50, 10), Some(BLUE.to_rgba()));
        assert_eq!(out.pixel(50, 50), Some(RED));
        assert_eq!(out.pixel(50, 90), Some(BLUE.to_rgba()));
    }

    #[test]
    fn test_tall_crop_is_pillarboxed() {
        let img = SourceImage::filled(100, 300, RED);
        let out = fit_to_output(&img, OutputSize::new(300, 300), BLUE, FilterType::Nearest)
            .unwrap();
        assert_eq!((out.width, out.height), (300, 300));
        assert_eq!(out.pixel(10, 150), Some(BLUE.to_rgba()));
        assert_eq!(out.pixel(150, 150), Some(RED));
        assert_eq!(out.pixel(290, 150), Some(BLUE.to_rgba()));
    }

    #[test]
    fn test_circle_mask() {
        let mut img = SourceImage::filled(20, 10, RED);
        apply_circle_mask(&mut img, Color::TRANSPARENT);
        assert_eq!(img.pixel(10, 5), Some(RED));
        assert_eq!(img.pixel(0, 0), Some([0, 0, 0, 0]));
        // outside the circle horizontally too, since the diameter is the height
        assert_eq!(img.pixel(1, 5), Some([0, 0, 0, 0]));
    }
}
