//! Axis-aligned rectangles in view or image space.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing mapped bounds against the crop window.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// An axis-aligned rectangle defined by its four edges.
///
/// The rectangle is valid when `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle with its top-left corner at the origin.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Rectangle of the given size centered on `(cx, cy)`.
    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self::new(cx - hw, cy - hh, cx + hw, cy + hh)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// True when the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Width divided by height, or `None` for an empty rectangle.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.width() / self.height())
        }
    }

    /// The four corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.left, self.top),
            (self.right, self.top),
            (self.right, self.bottom),
            (self.left, self.bottom),
        ]
    }

    /// Smallest rectangle containing all `points`.
    pub fn bounding(points: &[(f64, f64)]) -> Self {
        let mut rect = Rect::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for &(x, y) in points {
            rect.left = rect.left.min(x);
            rect.top = rect.top.min(y);
            rect.right = rect.right.max(x);
            rect.bottom = rect.bottom.max(y);
        }
        rect
    }

    /// True when `other` lies inside this rectangle, allowing `tolerance`
    /// of slack on every edge.
    pub fn contains_rect(&self, other: &Rect, tolerance: f64) -> bool {
        self.left <= other.left + tolerance
            && self.top <= other.top + tolerance
            && self.right >= other.right - tolerance
            && self.bottom >= other.bottom - tolerance
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let r = Rect::centered(50.0, 40.0, 20.0, 10.0);
        assert_eq!(r, Rect::new(40.0, 35.0, 60.0, 45.0));
        assert_eq!(r.center(), (50.0, 40.0));
    }

    #[test]
    fn test_bounding_of_points() {
        let r = Rect::bounding(&[(3.0, -1.0), (-2.0, 4.0), (1.0, 1.0)]);
        assert_eq!(r, Rect::new(-2.0, -1.0, 3.0, 4.0));
    }

    #[test]
    fn test_contains_rect_with_tolerance() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(10.0, 10.0, 90.0, 90.0);
        assert!(outer.contains_rect(&inner, 0.0));
        assert!(!inner.contains_rect(&outer, 0.0));

        let nearly = Rect::new(-1e-9, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&nearly, GEOMETRY_EPSILON));
        assert!(!outer.contains_rect(&nearly, 0.0));
    }

    #[test]
    fn test_empty_rect_has_no_aspect() {
        assert!(Rect::from_size(0.0, 10.0).is_empty());
        assert_eq!(Rect::from_size(0.0, 10.0).aspect_ratio(), None);
        assert_eq!(Rect::from_size(20.0, 10.0).aspect_ratio(), Some(2.0));
    }
}
