//! Transform state for the crop view.
//!
//! # Coordinate System
//!
//! - The transform maps source pixels to view coordinates
//! - Positive rotation passed to the view turns the image clockwise on screen
//! - [`crate::geometry::AffineTransform::rotation_degrees`] reports
//!   counter-clockwise-positive angles
//! - Origin is the top-left corner of the view

mod animation;
mod snap;
mod state;

pub use animation::TransformAnimation;
pub use snap::{cover_scale, image_bounds, snap_to_crop};
pub use state::{CropState, CropView, OperationKind};
