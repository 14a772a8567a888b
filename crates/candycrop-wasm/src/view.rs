//! Crop view bindings.
//!
//! Wasm runs on a single thread, so this surface drives the state machine
//! and the render engine directly instead of going through the session's
//! workers. The host forwards touch events and draws the source image with
//! the exported transform.
//!
//! # Example
//!
//! ```typescript
//! import init, { JsCropView } from '@candycrop/wasm';
//!
//! await init();
//! const view = new JsCropView({ aspectRatioX: 4, aspectRatioY: 3 });
//! view.set_view_size(canvas.width, canvas.height);
//! view.load_bytes(new Uint8Array(await file.arrayBuffer()));
//!
//! canvas.onpointermove = (e) => {
//!   if (view.touch(e.pointerId, e.offsetX, e.offsetY, 1)) redraw(view.transform());
//! };
//! const jpeg = view.crop_encoded();
//! ```

use std::sync::Arc;

use candycrop_core::decode::{load_source, LoadError, SourceImage};
use candycrop_core::render::{encode_output, render_region, RenderError};
use candycrop_core::transform::OperationKind;
use candycrop_core::{CancelToken, CropError, CropOptions, CropView, GestureInterpreter, TouchEvent};
use wasm_bindgen::prelude::*;

use crate::types::{phase_from_u8, JsImage};

/// Interactive crop view for JavaScript hosts.
#[wasm_bindgen]
pub struct JsCropView {
    view: CropView,
    gestures: GestureInterpreter,
}

#[wasm_bindgen]
impl JsCropView {
    /// Create a view from a `CropOptions` object (camelCase keys). Missing
    /// keys take their defaults; `undefined` uses all defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsCropView, JsValue> {
        let options: CropOptions = if options.is_undefined() || options.is_null() {
            CropOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsValue::from_str(&format!("Invalid crop options: {}", e)))?
        };
        Self::with_options(options).map_err(|e| report("create", &e))
    }

    /// Resize the view. Returns true if the transform changed.
    pub fn set_view_size(&mut self, width: f64, height: f64) -> bool {
        self.view.set_view_size(width, height)
    }

    /// Load RGBA pixel data (4 bytes per pixel, row-major).
    pub fn load_pixels(&mut self, image: &JsImage) -> Result<(), JsValue> {
        self.try_load_pixels(image)
            .map_err(|e| report("load_pixels", &e))
    }

    /// Decode and load an encoded image (JPEG, PNG or WebP).
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.try_load_bytes(bytes)
            .map_err(|e| report("load_bytes", &e))
    }

    /// Feed one pointer event. `phase` is 0 = down, 1 = move, 2 = up,
    /// 3 = cancel. Returns true if the transform changed.
    pub fn touch(&mut self, pointer_id: i32, x: f64, y: f64, phase: u8) -> bool {
        let Some(phase) = phase_from_u8(phase) else {
            return false;
        };
        let deltas = self
            .gestures
            .on_touch(&TouchEvent::new(pointer_id, x, y, phase));
        let mut changed = false;
        for delta in deltas {
            changed |= self.view.apply_gesture(delta);
        }
        changed
    }

    /// Rotate by quarter turns, clockwise. Returns true if the transform
    /// changed.
    pub fn rotate_by(&mut self, quarter_turns: i32) -> bool {
        self.view.rotate_by(quarter_turns).is_some()
    }

    pub fn reset(&mut self) -> bool {
        self.view.reset()
    }

    /// Current transform as `[a, b, c, d, tx, ty]`, ready for
    /// `CanvasRenderingContext2D.setTransform`.
    pub fn transform(&self) -> Vec<f64> {
        self.view.transform().to_array().to_vec()
    }

    /// Crop window as `[left, top, right, bottom]` in view coordinates.
    pub fn crop_rect(&self) -> Vec<f64> {
        let r = self.view.crop_rect();
        vec![r.left, r.top, r.right, r.bottom]
    }

    /// Current state name: `Empty`, `Ready`, `Busy(...)` or `Error`.
    pub fn state(&self) -> String {
        format!("{:?}", self.view.state())
    }

    /// Render the crop window to pixels.
    pub fn crop(&mut self) -> Result<JsImage, JsValue> {
        self.try_crop()
            .map(JsImage::from_source)
            .map_err(|e| report("crop", &e))
    }

    /// Render the crop window and encode it with the configured format
    /// and quality.
    pub fn crop_encoded(&mut self) -> Result<Vec<u8>, JsValue> {
        self.try_crop_encoded()
            .map_err(|e| report("crop_encoded", &e))
    }
}

impl JsCropView {
    pub fn with_options(options: CropOptions) -> Result<Self, CropError> {
        let gestures = GestureInterpreter::new(options.allow_gesture_rotation);
        Ok(Self {
            view: CropView::new(options)?,
            gestures,
        })
    }

    fn try_load_pixels(&mut self, image: &JsImage) -> Result<(), CropError> {
        let source = image.to_source().ok_or_else(|| {
            CropError::load(
                "pixels".into(),
                LoadError::Decode(format!(
                    "expected {} bytes for {}x{}, got {}",
                    image.expected_len(),
                    image.width(),
                    image.height(),
                    image.byte_length()
                )),
            )
        })?;
        self.view.load_image(Arc::new(source), None);
        Ok(())
    }

    fn try_load_bytes(&mut self, bytes: &[u8]) -> Result<(), CropError> {
        let options = self.view.options().load_options();
        let image = load_source(bytes, &options, &CancelToken::new())
            .map_err(|e| CropError::load("bytes".into(), e))?;
        self.view.load_image(Arc::new(image), None);
        Ok(())
    }

    fn try_crop(&mut self) -> Result<SourceImage, CropError> {
        let request = self.view.snapshot()?;
        self.view.begin(OperationKind::Crop);
        let result = render_region(&request, &CancelToken::new())
            .map_err(|e| CropError::crop(None, e));
        self.view.finish_crop(&result);
        result
    }

    fn try_crop_encoded(&mut self) -> Result<Vec<u8>, CropError> {
        let request = self.view.snapshot()?;
        self.view.begin(OperationKind::Crop);
        let result = render_region(&request, &CancelToken::new())
            .and_then(|image| encode_output(&image, &request))
            .map_err(|e: RenderError| CropError::crop(None, e));
        self.view.finish_crop(&result);
        result
    }
}

/// Log `err` to the browser console and convert it for JavaScript.
fn report(context: &str, err: &CropError) -> JsValue {
    let message = format!("{}: {}", context, err);
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}
