//! Source image loading for CandyCrop.
//!
//! This module provides functionality for:
//! - Decoding JPEG/PNG/WebP bytes into an RGBA [`SourceImage`]
//! - Applying EXIF orientation
//! - Downsampling oversized sources and applying the initial rotation
//! - Resizing used by the crop renderer
//!
//! # Examples
//!
//! ```ignore
//! use candycrop_core::decode::{load_source, LoadOptions};
//! use candycrop_core::worker::CancelToken;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = load_source(&bytes, &LoadOptions::default(), &CancelToken::new()).unwrap();
//! ```

mod load;
mod resize;
mod source;
mod types;

pub use load::{initial_quarter_turns, load_source, LoadOptions, DEFAULT_MAX_SOURCE_EDGE};
pub use resize::{resize, resize_to_fit};
pub use source::{decode_image, decode_image_no_orientation, get_orientation};
pub use types::{FilterType, LoadError, Orientation, SourceImage};

#[cfg(test)]
pub(crate) use source::tests::png_bytes;
