//! Crop window geometry.
//!
//! The crop rectangle is centered in the view, keeps the requested aspect
//! ratio exactly and never exceeds `crop_size` of either view dimension.

use serde::{Deserialize, Serialize};

use crate::error::CropError;
use crate::geometry::Rect;

/// Smallest accepted crop window size, as a fraction of the view.
pub const MIN_CROP_SIZE: f64 = 0.5;
/// Largest accepted crop window size, as a fraction of the view.
pub const MAX_CROP_SIZE: f64 = 1.0;

/// Desired width:height ratio of the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub x: f64,
    pub y: f64,
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::SQUARE
    }
}

impl AspectRatio {
    pub const SQUARE: Self = Self { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both terms are finite and positive.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x > 0.0 && self.y > 0.0
    }

    pub fn ratio(&self) -> f64 {
        self.x / self.y
    }
}

/// Shape drawn over the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverlayShape {
    #[default]
    Rect,
    /// Circle inscribed in the crop rectangle. Cropping still uses the
    /// rectangle; masking the output is opt-in.
    Circle,
}

/// Circle inscribed in the crop rectangle, in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

/// Compute the crop rectangle for a view.
///
/// ```text
/// targetW = W*s, targetH = H*s
/// dw = targetW/aX, dh = targetH/aY
/// dw <  dh: width-constrained  (cropW = targetW, cropH = aY*dw)
/// dw >= dh: height-constrained (cropH = targetH, cropW = aX*dh)
/// ```
pub fn compute_crop_rect(
    view_width: f64,
    view_height: f64,
    aspect: AspectRatio,
    crop_size: f64,
) -> Rect {
    let target_w = view_width * crop_size;
    let target_h = view_height * crop_size;
    let dw = target_w / aspect.x;
    let dh = target_h / aspect.y;

    let (crop_w, crop_h) = if dw < dh {
        (target_w, aspect.y * dw)
    } else {
        (aspect.x * dh, target_h)
    };

    Rect::centered(view_width / 2.0, view_height / 2.0, crop_w, crop_h)
}

/// The crop window of a view: its inputs and the derived rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct CropWindow {
    view_width: f64,
    view_height: f64,
    aspect: AspectRatio,
    crop_size: f64,
    shape: OverlayShape,
    rect: Rect,
}

impl Default for CropWindow {
    fn default() -> Self {
        Self {
            view_width: 0.0,
            view_height: 0.0,
            aspect: AspectRatio::SQUARE,
            crop_size: 0.9,
            shape: OverlayShape::Rect,
            rect: Rect::default(),
        }
    }
}

impl CropWindow {
    pub fn new(aspect: AspectRatio, crop_size: f64, shape: OverlayShape) -> Result<Self, CropError> {
        let mut window = Self {
            shape,
            ..Self::default()
        };
        window.set_aspect_ratio(aspect)?;
        window.set_crop_size(crop_size)?;
        Ok(window)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect
    }

    pub fn crop_size(&self) -> f64 {
        self.crop_size
    }

    pub fn shape(&self) -> OverlayShape {
        self.shape
    }

    pub fn view_size(&self) -> (f64, f64) {
        (self.view_width, self.view_height)
    }

    /// True once the view has a size and the rectangle has area.
    pub fn is_laid_out(&self) -> bool {
        !self.rect.is_empty()
    }

    /// Negative or non-finite sizes are treated as zero.
    pub fn set_view_size(&mut self, width: f64, height: f64) {
        let sanitize = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.view_width = sanitize(width);
        self.view_height = sanitize(height);
        self.recompute();
    }

    /// Rejects non-positive terms and keeps the previous ratio.
    pub fn set_aspect_ratio(&mut self, aspect: AspectRatio) -> Result<(), CropError> {
        if !aspect.is_valid() {
            return Err(CropError::InvalidOption(format!(
                "aspect ratio {}:{} must be positive",
                aspect.x, aspect.y
            )));
        }
        self.aspect = aspect;
        self.recompute();
        Ok(())
    }

    /// Rejects sizes outside `[0.5, 1.0]` and keeps the previous size.
    pub fn set_crop_size(&mut self, crop_size: f64) -> Result<(), CropError> {
        if !(MIN_CROP_SIZE..=MAX_CROP_SIZE).contains(&crop_size) {
            return Err(CropError::InvalidOption(format!(
                "crop size {crop_size} must be within [{MIN_CROP_SIZE}, {MAX_CROP_SIZE}]"
            )));
        }
        self.crop_size = crop_size;
        self.recompute();
        Ok(())
    }

    pub fn set_overlay_shape(&mut self, shape: OverlayShape) {
        self.shape = shape;
    }

    /// Inscribed circle when the overlay is circular. Its diameter is the
    /// rectangle's height.
    pub fn circle(&self) -> Option<Circle> {
        match self.shape {
            OverlayShape::Rect => None,
            OverlayShape::Circle => {
                let (cx, cy) = self.rect.center();
                Some(Circle {
                    cx,
                    cy,
                    radius: self.rect.height() / 2.0,
                })
            }
        }
    }

    fn recompute(&mut self) {
        self.rect = compute_crop_rect(self.view_width, self.view_height, self.aspect, self.crop_size);
    }
}
