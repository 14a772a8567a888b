//! Source and destination collaborators.
//!
//! The crop engine never touches storage directly: sources come in through an
//! [`ImageLoader`] and encoded results go out through an [`ImageSink`]. The
//! filesystem implementations are the defaults.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decode::{load_source, LoadError, LoadOptions, SourceImage};
use crate::worker::CancelToken;

/// Opaque reference (URI or path) to a source or destination image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem path for the reference, with a `file://` scheme removed.
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(self.0.strip_prefix("file://").unwrap_or(&self.0))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

impl From<String> for ImageRef {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

/// Produces decoded source images from references.
pub trait ImageLoader: Send + Sync {
    fn load(&self, reference: &ImageRef, cancel: &CancelToken) -> Result<SourceImage, LoadError>;
}

/// Persists encoded output bytes.
pub trait ImageSink: Send + Sync {
    fn write(&self, destination: &ImageRef, bytes: &[u8]) -> std::io::Result<()>;
}

/// Reads and decodes images from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsImageLoader {
    options: LoadOptions,
}

impl FsImageLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, reference: &ImageRef, cancel: &CancelToken) -> Result<SourceImage, LoadError> {
        cancel.check(LoadError::Cancelled)?;
        let path = reference.to_path();
        let bytes = fs::read(&path)?;
        debug!(path = %path.display(), len = bytes.len(), "read source");
        load_source(&bytes, &self.options, cancel)
    }
}

/// Writes encoded output to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageSink;

impl ImageSink for FsImageSink {
    fn write(&self, destination: &ImageRef, bytes: &[u8]) -> std::io::Result<()> {
        fs::write(destination.to_path(), bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::png_bytes;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("candycrop-io-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_image_ref_path() {
        assert_eq!(
            ImageRef::new("file:///tmp/a.jpg").to_path(),
            PathBuf::from("/tmp/a.jpg")
        );
        assert_eq!(ImageRef::from("b.png").to_path(), PathBuf::from("b.png"));
        assert_eq!(ImageRef::new("c.webp").to_string(), "c.webp");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let reference = ImageRef::new("/definitely/not/here.jpg");
        let result = FsImageLoader::default().load(&reference, &CancelToken::new());
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let path = temp_path("load.png");
        fs::write(&path, png_bytes(12, 8)).unwrap();

        let reference = ImageRef::new(path.to_string_lossy().into_owned());
        let img = FsImageLoader::default()
            .load(&reference, &CancelToken::new())
            .unwrap();
        assert_eq!((img.width, img.height), (12, 8));

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_cancelled_load_skips_io() {
        let token = CancelToken::new();
        token.cancel();
        let result = FsImageLoader::default().load(&ImageRef::new("/nope.png"), &token);
        assert!(matches!(result, Err(LoadError::Cancelled)));
    }

    #[test]
    fn test_sink_writes_bytes() {
        let path = temp_path("sink.bin");
        let reference = ImageRef::new(format!("file://{}", path.display()));
        FsImageSink.write(&reference, b"abc").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"abc");
        fs::remove_file(path).unwrap();
    }
}
