//! Top-level error type reported to session callers.

use thiserror::Error;

use crate::decode::LoadError;
use crate::io::ImageRef;
use crate::render::RenderError;
use crate::transform::CropState;

#[derive(Debug, Error)]
pub enum CropError {
    /// The source image could not be loaded.
    #[error("Failed to load {reference}: {cause}")]
    LoadFailure {
        reference: ImageRef,
        #[source]
        cause: LoadError,
    },

    /// Cropping, resizing, encoding or writing the result failed.
    #[error("Crop failed: {cause}")]
    CropFailure {
        destination: Option<ImageRef>,
        #[source]
        cause: RenderError,
    },

    /// Superseded by a newer request or cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// The view has no usable image in its current state.
    #[error("No image ready to crop (state: {state:?})")]
    NotReady { state: CropState },

    /// A configuration value is out of range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

impl CropError {
    /// Builds a load failure, lifting a cancelled cause to [`CropError::Cancelled`].
    pub fn load(reference: ImageRef, cause: LoadError) -> Self {
        match cause {
            LoadError::Cancelled => CropError::Cancelled,
            cause => CropError::LoadFailure { reference, cause },
        }
    }

    /// Builds a crop failure, lifting a cancelled cause to [`CropError::Cancelled`].
    pub fn crop(destination: Option<ImageRef>, cause: RenderError) -> Self {
        match cause {
            RenderError::Cancelled => CropError::Cancelled,
            cause => CropError::CropFailure { destination, cause },
        }
    }

    /// Cancellation is expected control flow, not a user-facing failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CropError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_causes_are_lifted() {
        let err = CropError::load(ImageRef::new("a.jpg"), LoadError::Cancelled);
        assert!(err.is_cancelled());

        let err = CropError::crop(None, RenderError::Cancelled);
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_load_failure_keeps_reference() {
        let err = CropError::load(
            ImageRef::new("missing.jpg"),
            LoadError::NotFound("no such file".to_string()),
        );
        assert!(!err.is_cancelled());
        match &err {
            CropError::LoadFailure { reference, .. } => {
                assert_eq!(reference.as_str(), "missing.jpg")
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Failed to load missing.jpg: Image not found: no such file"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_not_ready_display() {
        let err = CropError::NotReady {
            state: CropState::Empty,
        };
        assert_eq!(err.to_string(), "No image ready to crop (state: Empty)");
    }
}
