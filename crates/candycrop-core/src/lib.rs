//! CandyCrop Core - crop view engine
//!
//! This crate provides the geometry behind an interactive image cropper:
//! an affine transform placing the source image in the view, gesture
//! interpreters that turn touch events into pan/scale/rotate deltas, the
//! crop window, a state machine that keeps the crop window covered by the
//! image, and the render engine that produces the cropped output.
//!
//! [`CropSession`] wires these together with background load and crop
//! workers. No `tracing` subscriber is installed here; hosts install one.

pub mod config;
pub mod crop_window;
pub mod decode;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod io;
pub mod render;
pub mod session;
pub mod transform;
pub mod worker;

pub use config::{Color, CropOptions, OutputSize};
pub use crop_window::{AspectRatio, CropWindow, OverlayShape};
pub use decode::{LoadError, SourceImage};
pub use encode::OutputFormat;
pub use error::CropError;
pub use geometry::{AffineTransform, Rect};
pub use gesture::{GestureDelta, GestureInterpreter, TouchEvent, TouchPhase};
pub use io::{FsImageLoader, FsImageSink, ImageLoader, ImageRef, ImageSink};
pub use render::{CropRequest, CropResult, RenderError};
pub use session::{CropListener, CropSession};
pub use transform::{CropState, CropView, TransformAnimation};
pub use worker::CancelToken;

/// Route `tracing` output to the test harness. Set `RUST_LOG` to see it.
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
