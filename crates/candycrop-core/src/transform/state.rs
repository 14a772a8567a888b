//! The crop view's transform state machine.
//!
//! [`CropView`] owns the source image, the crop window and the transform
//! that places the image in the view. Every mutation goes through
//! [`snap_to_crop`], so after any public call the mapped image bounds
//! contain the crop rectangle.
//!
//! ```text
//! Empty --load--> Busy(Load) --ok--> Ready --confirm--> Busy(Crop) --ok--> Ready
//!                     |                                     |
//!                     +--err (first load)--> Error <--err---+
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::animation::TransformAnimation;
use super::snap::{cover_scale, image_bounds, snap_to_crop};
use crate::config::CropOptions;
use crate::crop_window::{AspectRatio, CropWindow, OverlayShape};
use crate::decode::SourceImage;
use crate::error::CropError;
use crate::geometry::{AffineTransform, Rect};
use crate::gesture::GestureDelta;
use crate::io::ImageRef;
use crate::render::CropRequest;

/// Kind of background operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Load,
    Crop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropState {
    /// No image loaded.
    #[default]
    Empty,
    /// Image loaded and covering the crop window.
    Ready,
    /// A background operation is in flight.
    Busy(OperationKind),
    /// The last load or crop failed. Only a new load leaves this state.
    Error,
}

#[derive(Debug, Clone)]
pub struct CropView {
    options: CropOptions,
    window: CropWindow,
    image: Option<Arc<SourceImage>>,
    source_ref: Option<ImageRef>,
    transform: AffineTransform,
    state: CropState,
    // state to return to when the operation in flight is cancelled
    resume: CropState,
}

impl CropView {
    pub fn new(options: CropOptions) -> Result<Self, CropError> {
        options.validate()?;
        let window = CropWindow::new(
            options.aspect_ratio(),
            options.crop_size,
            options.overlay_shape,
        )?;
        Ok(Self {
            options,
            window,
            image: None,
            source_ref: None,
            transform: AffineTransform::identity(),
            state: CropState::Empty,
            resume: CropState::Empty,
        })
    }

    pub fn options(&self) -> &CropOptions {
        &self.options
    }

    pub fn window(&self) -> &CropWindow {
        &self.window
    }

    pub fn crop_rect(&self) -> Rect {
        self.window.rect()
    }

    pub fn transform(&self) -> AffineTransform {
        self.transform
    }

    pub fn state(&self) -> CropState {
        self.state
    }

    pub fn image(&self) -> Option<&Arc<SourceImage>> {
        self.image.as_ref()
    }

    pub fn source_ref(&self) -> Option<&ImageRef> {
        self.source_ref.as_ref()
    }

    /// Bounds of the image in view coordinates.
    pub fn image_bounds(&self) -> Option<Rect> {
        let image = self.image.as_ref()?;
        Some(image_bounds(&self.transform, image.width, image.height))
    }

    /// `(min, max)` scale magnitudes at the current rotation. The minimum is
    /// the smallest scale that still covers the crop window.
    pub fn scale_bounds(&self) -> Option<(f64, f64)> {
        let image = self.image.as_ref()?;
        if !self.window.is_laid_out() {
            return None;
        }
        let min = cover_scale(&self.transform, image.width, image.height, &self.window.rect());
        Some((min, self.options.max_scale.max(min)))
    }

    /// Gestures and toolbar actions only apply while this is true.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self.state,
            CropState::Ready | CropState::Busy(OperationKind::Crop)
        ) && self.image.is_some()
            && self.window.is_laid_out()
    }

    /// Resize the view. The first layout fits the image to the crop window;
    /// later ones re-snap the current transform.
    pub fn set_view_size(&mut self, width: f64, height: f64) -> bool {
        let was_laid_out = self.window.is_laid_out();
        self.window.set_view_size(width, height);
        if was_laid_out {
            self.commit(self.transform)
        } else {
            self.fit()
        }
    }

    pub fn set_aspect_ratio(&mut self, aspect: AspectRatio) -> Result<bool, CropError> {
        self.window.set_aspect_ratio(aspect)?;
        self.options.aspect_ratio_x = aspect.x;
        self.options.aspect_ratio_y = aspect.y;
        Ok(self.commit(self.transform))
    }

    pub fn set_crop_size(&mut self, crop_size: f64) -> Result<bool, CropError> {
        self.window.set_crop_size(crop_size)?;
        self.options.crop_size = crop_size;
        Ok(self.commit(self.transform))
    }

    pub fn set_overlay_shape(&mut self, shape: OverlayShape) {
        self.window.set_overlay_shape(shape);
        self.options.overlay_shape = shape;
    }

    /// Install a freshly loaded image: identity transform, then fit-to-crop.
    pub fn load_image(&mut self, image: Arc<SourceImage>, reference: Option<ImageRef>) {
        info!(
            width = image.width,
            height = image.height,
            reference = reference.as_ref().map(ImageRef::as_str),
            "image loaded"
        );
        self.image = Some(image);
        self.source_ref = reference;
        self.transform = AffineTransform::identity();
        self.state = CropState::Ready;
        self.resume = CropState::Ready;
        self.fit();
    }

    /// Re-apply fit-to-crop to the loaded image.
    pub fn reset(&mut self) -> bool {
        if !self.is_interactive() {
            return false;
        }
        self.fit()
    }

    pub fn apply_pan(&mut self, dx: f64, dy: f64) -> bool {
        if !self.is_interactive() || !(dx.is_finite() && dy.is_finite()) {
            return false;
        }
        self.commit(self.transform.post_translate(dx, dy))
    }

    /// Scale about `(focal_x, focal_y)`. The resulting magnitude is clamped
    /// to [`CropView::scale_bounds`].
    pub fn apply_scale(&mut self, factor: f64, focal_x: f64, focal_y: f64) -> bool {
        if !self.is_interactive() || !(factor.is_finite() && factor > 0.0) {
            return false;
        }
        let Some((min, max)) = self.scale_bounds() else {
            return false;
        };
        let current = self.transform.scale_factor();
        let target = (current * factor).clamp(min, max);
        let effective = target / current;
        self.commit(
            self.transform
                .post_scale(effective, effective, focal_x, focal_y),
        )
    }

    /// Rotate by `degrees` (clockwise on screen) about the crop window center.
    pub fn apply_rotation(&mut self, degrees: f64) -> bool {
        if !self.is_interactive() || !degrees.is_finite() {
            return false;
        }
        let (cx, cy) = self.window.rect().center();
        self.commit(self.transform.post_rotate(degrees, cx, cy))
    }

    pub fn apply_gesture(&mut self, delta: GestureDelta) -> bool {
        match delta {
            GestureDelta::Pan { dx, dy } => self.apply_pan(dx, dy),
            GestureDelta::Scale {
                factor,
                focal_x,
                focal_y,
            } => self.apply_scale(factor, focal_x, focal_y),
            GestureDelta::Rotate { degrees } => self.apply_rotation(degrees),
        }
    }

    /// Rotate by whole quarter turns (clockwise on screen) about the crop
    /// window center.
    ///
    /// Returns the animation from the old to the new transform, or `None` if
    /// nothing changed. The new transform is committed immediately; with
    /// animations disabled the returned animation has zero duration.
    pub fn rotate_by(&mut self, quarter_turns: i32) -> Option<TransformAnimation> {
        if !self.is_interactive() || quarter_turns.rem_euclid(4) == 0 {
            return None;
        }
        let from = self.transform;
        let (cx, cy) = self.window.rect().center();
        let degrees = 90.0 * quarter_turns.rem_euclid(4) as f64;
        if !self.commit(from.post_rotate(degrees, cx, cy)) {
            return None;
        }

        let duration = if self.options.use_animation {
            Duration::from_millis(self.options.animation_millis)
        } else {
            Duration::ZERO
        };
        Some(TransformAnimation::new(from, self.transform, duration))
    }

    /// Immutable snapshot for the render worker.
    pub fn snapshot(&self) -> Result<CropRequest, CropError> {
        let not_ready = CropError::NotReady { state: self.state };
        if !matches!(
            self.state,
            CropState::Ready | CropState::Busy(OperationKind::Crop)
        ) || !self.window.is_laid_out()
        {
            return Err(not_ready);
        }
        let source = self.image.clone().ok_or(not_ready)?;

        Ok(CropRequest {
            source,
            source_ref: self.source_ref.clone(),
            transform: self.transform,
            crop_rect: self.window.rect(),
            output_size: self.options.output_size,
            background: self.options.background_color,
            filter: self.options.filter,
            mask_circle: self.options.masks_circle(),
            format: self.options.format,
            quality: self.options.quality,
            destination: self.options.result_destination.clone(),
        })
    }

    /// Enter `Busy(kind)`, remembering the state to resume on cancellation.
    pub fn begin(&mut self, kind: OperationKind) {
        if !matches!(self.state, CropState::Busy(_)) {
            self.resume = self.state;
        }
        self.state = CropState::Busy(kind);
    }

    /// Apply a finished load. Returns true when a new image was installed.
    ///
    /// A failed re-load keeps the previous image and transform; a failed
    /// first load ends in `Error`.
    pub fn finish_load(
        &mut self,
        result: &Result<Arc<SourceImage>, CropError>,
        reference: Option<ImageRef>,
    ) -> bool {
        if self.state != CropState::Busy(OperationKind::Load) {
            debug!(state = ?self.state, "ignoring load result outside of a load");
            return false;
        }
        match result {
            Ok(image) => {
                self.load_image(Arc::clone(image), reference);
                true
            }
            Err(e) if e.is_cancelled() => {
                self.state = self.resume;
                false
            }
            Err(_) => {
                self.state = if self.image.is_some() {
                    CropState::Ready
                } else {
                    CropState::Error
                };
                false
            }
        }
    }

    /// Apply a finished crop.
    pub fn finish_crop<T>(&mut self, result: &Result<T, CropError>) {
        if self.state != CropState::Busy(OperationKind::Crop) {
            debug!(state = ?self.state, "ignoring crop result outside of a crop");
            return;
        }
        self.state = match result {
            Ok(_) => CropState::Ready,
            Err(e) if e.is_cancelled() => self.resume,
            Err(_) => CropState::Error,
        };
    }

    fn fit(&mut self) -> bool {
        let Some((width, height)) = self.image.as_ref().map(|i| (i.width, i.height)) else {
            return false;
        };
        if !self.window.is_laid_out() || width == 0 || height == 0 {
            return false;
        }

        let crop = self.window.rect();
        let (w, h) = (width as f64, height as f64);
        let scale = (crop.width() / w).max(crop.height() / h);
        let (cx, cy) = crop.center();
        let fitted = AffineTransform::scaling(scale, scale, 0.0, 0.0)
            .post_translate(cx - w * scale / 2.0, cy - h * scale / 2.0);
        self.commit(fitted)
    }

    // Snap `candidate` and store it. Returns whether the transform changed.
    fn commit(&mut self, candidate: AffineTransform) -> bool {
        let Some(image) = self.image.as_ref() else {
            return false;
        };
        if !self.window.is_laid_out() {
            return false;
        }
        let snapped = snap_to_crop(&candidate, image.width, image.height, &self.window.rect());
        if snapped == self.transform {
            return false;
        }
        self.transform = snapped;
        true
    }
}
