//! Crop options recognized by the view and the render engine.

use serde::{Deserialize, Serialize};

use crate::crop_window::{AspectRatio, OverlayShape, MAX_CROP_SIZE, MIN_CROP_SIZE};
use crate::decode::{FilterType, LoadOptions, DEFAULT_MAX_SOURCE_EDGE};
use crate::encode::{effective_quality, OutputFormat, DEFAULT_QUALITY};
use crate::error::CropError;
use crate::io::ImageRef;

/// Default upper bound on the image scale.
pub const DEFAULT_MAX_SCALE: f64 = 30.0;

/// A packed `0xAARRGGBB` colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    pub const BLACK: Self = Self(0xFF00_0000);
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Byte order used by [`crate::decode::SourceImage`] pixels.
    pub fn to_rgba(self) -> [u8; 4] {
        let [a, r, g, b] = self.0.to_be_bytes();
        [r, g, b, a]
    }
}

/// Requested output dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CropOptions {
    pub aspect_ratio_x: f64,
    pub aspect_ratio_y: f64,
    /// Crop window size as a fraction of the view, in `[0.5, 1.0]`.
    pub crop_size: f64,
    /// `None` keeps the cropped region's own pixel size.
    pub output_size: Option<OutputSize>,
    pub background_color: Color,
    pub format: OutputFormat,
    /// `0..=100`; anything else falls back to 95.
    pub quality: i32,
    pub overlay_shape: OverlayShape,
    /// Fill output pixels outside the inscribed circle with the background.
    pub mask_circle: bool,
    pub initial_rotation: f32,
    pub allow_gesture_rotation: bool,
    pub max_scale: f64,
    pub max_source_edge: u32,
    pub filter: FilterType,
    pub use_animation: bool,
    pub animation_millis: u64,
    pub result_destination: Option<ImageRef>,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            aspect_ratio_x: 1.0,
            aspect_ratio_y: 1.0,
            crop_size: 0.9,
            output_size: Some(OutputSize::new(1024, 1024)),
            background_color: Color::TRANSPARENT,
            format: OutputFormat::Jpeg,
            quality: DEFAULT_QUALITY as i32,
            overlay_shape: OverlayShape::Rect,
            mask_circle: false,
            initial_rotation: 0.0,
            allow_gesture_rotation: true,
            max_scale: DEFAULT_MAX_SCALE,
            max_source_edge: DEFAULT_MAX_SOURCE_EDGE,
            filter: FilterType::Bilinear,
            use_animation: true,
            animation_millis: 200,
            result_destination: None,
        }
    }
}

impl CropOptions {
    /// Parse a JSON options document and validate it. Missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, CropError> {
        let options: Self =
            serde_json::from_str(json).map_err(|e| CropError::InvalidOption(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), CropError> {
        if !self.aspect_ratio().is_valid() {
            return Err(CropError::InvalidOption(format!(
                "aspect ratio {}:{} must be positive",
                self.aspect_ratio_x, self.aspect_ratio_y
            )));
        }
        if !(MIN_CROP_SIZE..=MAX_CROP_SIZE).contains(&self.crop_size) {
            return Err(CropError::InvalidOption(format!(
                "crop size {} must be within [{MIN_CROP_SIZE}, {MAX_CROP_SIZE}]",
                self.crop_size
            )));
        }
        if let Some(size) = self.output_size {
            if size.width == 0 || size.height == 0 {
                return Err(CropError::InvalidOption(format!(
                    "output size {}x{} must be non-zero",
                    size.width, size.height
                )));
            }
        }
        if !(self.max_scale.is_finite() && self.max_scale > 0.0) {
            return Err(CropError::InvalidOption(format!(
                "max scale {} must be positive",
                self.max_scale
            )));
        }
        if self.max_source_edge == 0 {
            return Err(CropError::InvalidOption(
                "max source edge must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::new(self.aspect_ratio_x, self.aspect_ratio_y)
    }

    pub fn effective_quality(&self) -> u8 {
        effective_quality(self.quality)
    }

    /// Whether output pixels outside the inscribed circle are masked.
    pub fn masks_circle(&self) -> bool {
        self.mask_circle && self.overlay_shape == OverlayShape::Circle
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            max_edge: self.max_source_edge,
            initial_rotation: self.initial_rotation,
            filter: self.filter,
        }
    }
}
