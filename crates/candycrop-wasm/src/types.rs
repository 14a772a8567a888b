//! WASM-compatible wrapper types.
//!
//! This module converts between the core CandyCrop types and their
//! JavaScript-facing representations.

use candycrop_core::decode::SourceImage;
use candycrop_core::gesture::TouchPhase;
use wasm_bindgen::prelude::*;

/// An RGBA image handed to or returned from JavaScript.
///
/// The pixel data lives in WASM memory. `pixels()` copies it into a
/// `Uint8Array`.
#[wasm_bindgen]
pub struct JsImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    /// Create an image from RGBA pixel data (4 bytes per pixel, row-major).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsImage {
        JsImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array (a copy).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsImage {
    pub(crate) fn from_source(img: SourceImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Bytes a `width` x `height` RGBA buffer must hold.
    pub(crate) fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * SourceImage::CHANNELS
    }

    /// Convert to a core image, or `None` if the buffer doesn't match the
    /// dimensions. Clones the pixel data.
    pub(crate) fn to_source(&self) -> Option<SourceImage> {
        if self.width == 0 || self.height == 0 || self.pixels.len() != self.expected_len() {
            return None;
        }
        Some(SourceImage::new(self.width, self.height, self.pixels.clone()))
    }
}

/// Convert a u8 phase value from the host into a [`TouchPhase`].
///
/// Values:
/// - 0 = Down
/// - 1 = Move
/// - 2 = Up
/// - 3 = Cancel
///
/// Anything else is `None`.
pub(crate) fn phase_from_u8(value: u8) -> Option<TouchPhase> {
    match value {
        0 => Some(TouchPhase::Down),
        1 => Some(TouchPhase::Move),
        2 => Some(TouchPhase::Up),
        3 => Some(TouchPhase::Cancel),
        _ => None,
    }
}
