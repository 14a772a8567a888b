//! Mapping the crop window back into source pixels.

use image::imageops;

use super::RenderError;
use crate::decode::SourceImage;
use crate::geometry::{AffineTransform, Rect};

/// Integer pixel region of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Inverse-map `crop_rect` through `transform` and clamp the resulting
/// bounding box to a `src_width` x `src_height` source.
///
/// Edges are rounded to whole pixels. When the rounded extent would run past
/// the source, it is floored instead, then cut at the edge. The region is
/// never smaller than 1x1.
pub fn source_region(
    transform: &AffineTransform,
    crop_rect: &Rect,
    src_width: u32,
    src_height: u32,
) -> Result<SourceRegion, RenderError> {
    if src_width == 0 || src_height == 0 {
        return Err(RenderError::InvalidRegion(format!(
            "source is {src_width}x{src_height}"
        )));
    }
    let inverse = transform.invert().ok_or(RenderError::DegenerateTransform)?;
    let mapped = inverse.map_rect(crop_rect);
    let finite = [mapped.left, mapped.top, mapped.right, mapped.bottom]
        .iter()
        .all(|v| v.is_finite());
    if !finite || mapped.is_empty() {
        return Err(RenderError::InvalidRegion(format!("{mapped:?}")));
    }

    let (x, width) = clamp_span(mapped.left, mapped.right, src_width).ok_or_else(|| {
        RenderError::InvalidRegion(format!("{mapped:?} outside {src_width}x{src_height}"))
    })?;
    let (y, height) = clamp_span(mapped.top, mapped.bottom, src_height).ok_or_else(|| {
        RenderError::InvalidRegion(format!("{mapped:?} outside {src_width}x{src_height}"))
    })?;

    Ok(SourceRegion {
        x,
        y,
        width,
        height,
    })
}

fn clamp_span(start: f64, end: f64, limit: u32) -> Option<(u32, u32)> {
    let limit_f = limit as f64;
    let start = start.max(0.0);
    let end = end.min(limit_f);
    if end <= 0.0 || start >= limit_f {
        return None;
    }

    let origin = start.round().min(limit_f - 1.0);
    let exact = end - start;
    let mut len = exact.round();
    if origin + len > limit_f {
        len = exact.floor();
    }
    if origin + len > limit_f {
        len = limit_f - origin;
    }
    Some((origin as u32, len.max(1.0) as u32))
}

/// Copy `region` out of `source` and rotate it counter-clockwise by
/// `quarter_turns` * 90°.
pub fn extract_region(
    source: &SourceImage,
    region: SourceRegion,
    quarter_turns: u8,
) -> Result<SourceImage, RenderError> {
    let owned = source.to_rgba_image().ok_or_else(|| {
        RenderError::InvalidRegion("source pixel buffer does not match its size".to_string())
    })?;
    let cropped =
        imageops::crop_imm(&owned, region.x, region.y, region.width, region.height).to_image();

    let rotated = match quarter_turns % 4 {
        1 => imageops::rotate270(&cropped),
        2 => imageops::rotate180(&cropped),
        3 => imageops::rotate90(&cropped),
        _ => cropped,
    };
    Ok(SourceImage::from_rgba_image(rotated))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Each pixel encodes its own coordinates in R and G.
    fn coordinates_image(width: u32, height: u32) -> SourceImage {
        SourceImage::from_rgba_image(image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([x as u8, y as u8, 0, 255])
        }))
    }

    #[test]
    fn test_identity_region() {
        let region = source_region(
            &AffineTransform::identity(),
            &Rect::new(10.0, 20.0, 40.0, 60.0),
            100,
            100,
        )
        .unwrap();
        assert_eq!(
            region,
            SourceRegion {
                x: 10,
                y: 20,
                width: 30,
                height: 40
            }
        );
    }

    #[test]
    fn test_scaled_and_translated_region() {
        // image drawn at half size, shifted by (-50, 10)
        let t = AffineTransform::scaling(0.5, 0.5, 0.0, 0.0).post_translate(-50.0, 10.0);
        let region = source_region(&t, &Rect::new(0.0, 10.0, 100.0, 60.0), 400, 400).unwrap();
        assert_eq!(
            region,
            SourceRegion {
                x: 100,
                y: 0,
                width: 200,
                height: 100
            }
        );
    }

    #[test]
    fn test_rounding_never_overflows() {
        // the origin rounds up to 1 and the 99.5 extent to 100, ending at 101
        let region = source_region(
            &AffineTransform::identity(),
            &Rect::new(0.5, 0.0, 100.0, 10.0),
            100,
            10,
        )
        .unwrap();
        assert_eq!(region.x, 1);
        assert_eq!(region.width, 99);
        assert!(region.x + region.width <= 100);
    }

    #[test]
    fn test_tiny_region_is_one_pixel() {
        let region = source_region(
            &AffineTransform::identity(),
            &Rect::new(5.0, 5.0, 5.2, 5.2),
            10,
            10,
        )
        .unwrap();
        assert_eq!((region.width, region.height), (1, 1));
    }

    #[test]
    fn test_singular_transform() {
        let t = AffineTransform::scaling(0.0, 1.0, 0.0, 0.0);
        let result = source_region(&t, &Rect::from_size(10.0, 10.0), 10, 10);
        assert!(matches!(result, Err(RenderError::DegenerateTransform)));
    }

    #[test]
    fn test_region_outside_source() {
        let t = AffineTransform::translation(-500.0, 0.0);
        let result = source_region(&t, &Rect::from_size(10.0, 10.0), 100, 100);
        assert!(matches!(result, Err(RenderError::InvalidRegion(_))));
    }

    #[test]
    fn test_extract_without_rotation() {
        let source = coordinates_image(8, 6);
        let region = SourceRegion {
            x: 2,
            y: 1,
            width: 3,
            height: 2,
        };
        let out = extract_region(&source, region, 0).unwrap();
        assert_eq!((out.width, out.height), (3, 2));
        assert_eq!(out.pixel(0, 0), Some([2, 1, 0, 255]));
        assert_eq!(out.pixel(2, 1), Some([4, 2, 0, 255]));
    }

    #[test]
    fn test_extract_quarter_turn_counter_clockwise() {
        let source = coordinates_image(4, 2);
        let region = SourceRegion {
            x: 0,
            y: 0,
            width: 4,
            height: 2,
        };
        let out = extract_region(&source, region, 1).unwrap();
        assert_eq!((out.width, out.height), (2, 4));
        // counter-clockwise: the top-right corner moves to the top-left
        assert_eq!(out.pixel(0, 0), Some([3, 0, 0, 255]));
        assert_eq!(out.pixel(0, 3), Some([0, 0, 0, 255]));

        let half = extract_region(&source, region, 2).unwrap();
        assert_eq!(half.pixel(0, 0), Some([3, 1, 0, 255]));

        let three = extract_region(&source, region, 3).unwrap();
        assert_eq!(three.pixel(0, 0), Some([0, 1, 0, 255]));
    }

    #[test]
    fn test_extract_leaves_source_intact() {
        let source = coordinates_image(6, 6);
        let region = SourceRegion {
            x: 1,
            y: 1,
            width: 2,
            height: 2,
        };
        let first = extract_region(&source, region, 0).unwrap();
        let second = extract_region(&source, region, 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(source, coordinates_image(6, 6));
    }

    #[test]
    fn test_extract_rejects_short_buffer() {
        let source = SourceImage {
            width: 4,
            height: 4,
            pixels: vec![0; 3],
        };
        let region = SourceRegion {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        };
        assert!(matches!(
            extract_region(&source, region, 0),
            Err(RenderError::InvalidRegion(_))
        ));
    }
}
