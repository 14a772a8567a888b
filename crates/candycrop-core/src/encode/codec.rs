//! Output encoding using the `image` crate's JPEG, PNG and WebP encoders.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::SourceImage;

/// Quality used when the requested value is outside `0..=100`.
pub const DEFAULT_QUALITY: u8 = 95;

/// Errors that can occur while encoding the crop result.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder itself failed
    #[error("{format:?} encoding failed: {message}")]
    EncodingFailed {
        format: OutputFormat,
        message: String,
    },
}

/// Container format of the encoded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    /// Lossless WebP; the quality setting is ignored.
    Webp,
}

impl OutputFormat {
    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }
}

/// Normalize a requested quality: values outside `0..=100` fall back to
/// [`DEFAULT_QUALITY`].
pub fn effective_quality(quality: i32) -> u8 {
    match u8::try_from(quality) {
        Ok(q) if q <= 100 => q,
        _ => DEFAULT_QUALITY,
    }
}

/// Encode an RGBA image in the requested format.
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for archival or further editing
/// * 60-90: Good quality, recommended for avatars and thumbnails
/// * Below 60: Low quality, visible artifacts
///
/// Quality only affects JPEG output.
pub fn encode_image(
    image: &SourceImage,
    format: OutputFormat,
    quality: i32,
) -> Result<Vec<u8>, EncodeError> {
    validate(&image.pixels, image.width, image.height, SourceImage::CHANNELS)?;

    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb: Vec<u8> = image
                .pixels
                .chunks_exact(SourceImage::CHANNELS)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            encode_jpeg(&rgb, image.width, image.height, effective_quality(quality))
        }
        OutputFormat::Png => encode_rgba(format, &image.pixels, image.width, image.height),
        OutputFormat::Webp => encode_rgba(format, &image.pixels, image.width, image.height),
    }
}

/// Encode RGB pixel data (3 bytes per pixel, row-major) to JPEG bytes.
///
/// The quality is clamped to `1..=100`.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    validate(pixels, width, height, 3)?;

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: OutputFormat::Jpeg,
            message: e.to_string(),
        })?;

    Ok(buffer.into_inner())
}

fn encode_rgba(
    format: OutputFormat,
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Png => PngEncoder::new(&mut buffer).write_image(
            pixels,
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        _ => WebPEncoder::new_lossless(&mut buffer).write_image(
            pixels,
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    };
    result.map_err(|e| EncodeError::EncodingFailed {
        format,
        message: e.to_string(),
    })?;

    Ok(buffer.into_inner())
}

fn validate(pixels: &[u8], width: u32, height: u32, channels: usize) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * channels;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> SourceImage {
        SourceImage::from_rgba_image(image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 128, 255])
        }))
    }

    #[test]
    fn test_effective_quality() {
        assert_eq!(effective_quality(0), 0);
        assert_eq!(effective_quality(50), 50);
        assert_eq!(effective_quality(100), 100);
        assert_eq!(effective_quality(101), DEFAULT_QUALITY);
        assert_eq!(effective_quality(-1), DEFAULT_QUALITY);
    }

    #[test]
    fn test_encode_jpeg_markers() {
        let jpeg = encode_image(&gradient(64, 48), OutputFormat::Jpeg, 90).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_quality_zero_is_clamped() {
        assert!(encode_image(&gradient(8, 8), OutputFormat::Jpeg, 0).is_ok());
    }

    #[test]
    fn test_encode_png_round_trip() {
        let img = gradient(20, 10);
        let png = encode_image(&img, OutputFormat::Png, 10).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded.into_raw(), img.pixels);
    }

    #[test]
    fn test_encode_webp_header() {
        let webp = encode_image(&gradient(16, 16), OutputFormat::Webp, 50).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn test_encode_invalid_pixel_data() {
        let img = SourceImage {
            width: 10,
            height: 10,
            pixels: vec![0; 10],
        };
        let result = encode_image(&img, OutputFormat::Png, 95);
        assert!(matches!(result, Err(EncodeError::InvalidPixelData { .. })));
    }

    #[test]
    fn test_encode_zero_dimensions() {
        let result = encode_jpeg(&[], 0, 10, 90);
        assert!(matches!(result, Err(EncodeError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_lower_quality_is_not_larger() {
        let img = gradient(64, 64);
        let low = encode_image(&img, OutputFormat::Jpeg, 10).unwrap();
        let high = encode_image(&img, OutputFormat::Jpeg, 100).unwrap();
        assert!(high.len() >= low.len());
    }
}
