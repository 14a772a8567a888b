//! Display animation between two committed transforms.

use std::time::Duration;

use crate::geometry::AffineTransform;

/// Frames between two transforms, sampled by elapsed time.
///
/// Only the end state is ever committed to the view; the frames are for
/// drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformAnimation {
    from: AffineTransform,
    to: AffineTransform,
    duration: Duration,
}

impl TransformAnimation {
    pub fn new(from: AffineTransform, to: AffineTransform, duration: Duration) -> Self {
        Self { from, to, duration }
    }

    pub fn from(&self) -> AffineTransform {
        self.from
    }

    pub fn to(&self) -> AffineTransform {
        self.to
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Progress in `[0, 1]` after `elapsed`.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn frame(&self, elapsed: Duration) -> AffineTransform {
        self.from.interpolate(&self.to, self.progress(elapsed))
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
