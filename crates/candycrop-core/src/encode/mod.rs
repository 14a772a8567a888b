//! Output encoding for crop results.
//!
//! This module provides functionality for:
//! - Encoding the final RGBA buffer as JPEG (with quality), PNG or lossless WebP
//! - Normalizing the caller's quality setting
//!
//! # Examples
//!
//! ```ignore
//! use candycrop_core::encode::{encode_image, OutputFormat};
//!
//! let bytes = encode_image(&cropped, OutputFormat::Jpeg, 90).unwrap();
//! ```

mod codec;

pub use codec::{
    effective_quality, encode_image, encode_jpeg, EncodeError, OutputFormat, DEFAULT_QUALITY,
};
