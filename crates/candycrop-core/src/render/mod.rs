//! Crop/render engine.
//!
//! Turns a [`CropRequest`] snapshot into output pixels:
//!
//! 1. Invert the transform and map the crop rectangle into source pixels
//! 2. Clamp the region to the source and extract it
//! 3. Rotate by the transform's rotation, rounded to quarter turns
//! 4. Optionally mask to the inscribed circle
//! 5. Resize to the output size, letterboxing on aspect mismatch
//! 6. Encode and write to the destination, if one is set
//!
//! The cancellation token is checked before every expensive step.

mod letterbox;
mod region;

pub use letterbox::{apply_circle_mask, fit_to_output, needs_letterbox, ASPECT_EPSILON};
pub use region::{extract_region, source_region, SourceRegion};

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Color, OutputSize};
use crate::decode::{FilterType, SourceImage};
use crate::encode::{encode_image, EncodeError, OutputFormat};
use crate::error::CropError;
use crate::geometry::{AffineTransform, Rect};
use crate::io::{ImageRef, ImageSink};
use crate::worker::CancelToken;

/// Errors that can occur while producing the crop output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The transform can't be inverted
    #[error("Transform is not invertible")]
    DegenerateTransform,

    /// The crop window doesn't map onto usable source pixels
    #[error("Invalid crop region: {0}")]
    InvalidRegion(String),

    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Failed to write {destination}: {message}")]
    Write {
        destination: ImageRef,
        message: String,
    },

    /// The render worker died before producing a result
    #[error("Crop worker failed: {0}")]
    Worker(String),

    #[error("Crop cancelled")]
    Cancelled,
}

/// Everything the render worker needs, captured from the view at confirm
/// time.
#[derive(Debug, Clone)]
pub struct CropRequest {
    pub source: Arc<SourceImage>,
    pub source_ref: Option<ImageRef>,
    pub transform: AffineTransform,
    pub crop_rect: Rect,
    /// `None` keeps the cropped region's pixel size.
    pub output_size: Option<OutputSize>,
    pub background: Color,
    pub filter: FilterType,
    pub mask_circle: bool,
    pub format: OutputFormat,
    pub quality: i32,
    pub destination: Option<ImageRef>,
}

/// Outcome of one crop.
#[derive(Debug)]
pub struct CropResult {
    pub source: Arc<SourceImage>,
    pub source_ref: Option<ImageRef>,
    /// The output pixels, or why there are none.
    pub cropped: Result<SourceImage, CropError>,
    pub destination: Option<ImageRef>,
}

/// Produce the output pixels for `request` (steps 1 to 5).
pub fn render_region(
    request: &CropRequest,
    cancel: &CancelToken,
) -> Result<SourceImage, RenderError> {
    cancel.check(RenderError::Cancelled)?;
    let source = &request.source;
    let region = source_region(
        &request.transform,
        &request.crop_rect,
        source.width,
        source.height,
    )?;
    let quarter_turns = request.transform.quarter_turns();
    debug!(?region, quarter_turns, "extracting crop region");

    cancel.check(RenderError::Cancelled)?;
    let mut cropped = extract_region(source, region, quarter_turns)?;
    if request.mask_circle {
        apply_circle_mask(&mut cropped, request.background);
    }

    let Some(output) = request.output_size else {
        return Ok(cropped);
    };

    cancel.check(RenderError::Cancelled)?;
    fit_to_output(&cropped, output, request.background, request.filter).ok_or_else(|| {
        RenderError::InvalidRegion(format!(
            "cannot resize {}x{} to {}x{}",
            cropped.width, cropped.height, output.width, output.height
        ))
    })
}

/// Encode `image` with the request's format and quality.
pub fn encode_output(
    image: &SourceImage,
    request: &CropRequest,
) -> Result<Vec<u8>, RenderError> {
    Ok(encode_image(image, request.format, request.quality)?)
}

/// Run the whole pipeline, writing through `sink` when the request has a
/// destination.
pub fn render_crop(
    request: &CropRequest,
    sink: &dyn ImageSink,
    cancel: &CancelToken,
) -> Result<SourceImage, RenderError> {
    let output = render_region(request, cancel)?;

    if let Some(destination) = &request.destination {
        cancel.check(RenderError::Cancelled)?;
        let bytes = encode_output(&output, request)?;

        cancel.check(RenderError::Cancelled)?;
        sink.write(destination, &bytes)
            .map_err(|e| RenderError::Write {
                destination: destination.clone(),
                message: e.to_string(),
            })?;
        debug!(%destination, len = bytes.len(), "wrote crop output");
    }

    // a crop cancelled while writing still reports no pixels
    cancel.check(RenderError::Cancelled)?;
    Ok(output)
}

/// [`render_crop`] packaged as a [`CropResult`].
pub fn crop(request: &CropRequest, sink: &dyn ImageSink, cancel: &CancelToken) -> CropResult {
    let cropped = render_crop(request, sink, cancel)
        .map_err(|cause| CropError::crop(request.destination.clone(), cause));

    match &cropped {
        Ok(image) => info!(width = image.width, height = image.height, "crop finished"),
        Err(e) if e.is_cancelled() => debug!("crop cancelled"),
        Err(e) => warn!(error = %e, "crop failed"),
    }

    CropResult {
        source: Arc::clone(&request.source),
        source_ref: request.source_ref.clone(),
        cropped,
        destination: request.destination.clone(),
    }
}
