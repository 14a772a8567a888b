//! CandyCrop WASM - WebAssembly bindings for CandyCrop
//!
//! This crate exposes the candycrop-core crop view to JavaScript/TypeScript
//! hosts such as webviews.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data and touch phases
//! - `view` - The interactive crop view (gestures, transform, crop, encode)
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropView, JsImage } from '@candycrop/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const view = new JsCropView({ cropSize: 0.8, format: 'PNG' });
//! view.set_view_size(400, 400);
//! view.load_pixels(new JsImage(width, height, rgba));
//! const png = view.crop_encoded();
//! ```

use wasm_bindgen::prelude::*;

mod types;
mod view;

pub use types::JsImage;
pub use view::JsCropView;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
