//! Geometry primitives shared by the crop window and the transform engine.
//!
//! # Coordinate System
//!
//! - View coordinates are in pixels, origin at the top-left of the view
//! - Image coordinates are in source pixels, origin at the top-left pixel
//! - The current [`AffineTransform`] maps image coordinates to view coordinates

mod matrix;
mod rect;

pub use matrix::AffineTransform;
pub use rect::{Rect, GEOMETRY_EPSILON};
