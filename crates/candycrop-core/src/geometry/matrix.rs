//! 2-D affine transform used to place the source image in the view.
//!
//! The transform is an immutable value: every operation returns a new
//! transform and leaves the receiver untouched.
//!
//! # Layout
//!
//! ```text
//! | a  c  tx |      x' = a*x + c*y + tx
//! | b  d  ty |      y' = b*x + d*y + ty
//! | 0  0  1  |
//! ```
//!
//! `a`/`d` are the scale terms, `b` is the y-skew and `c` the x-skew.
//! View coordinates grow to the right and down, so a positive angle passed
//! to [`AffineTransform::post_rotate`] turns the image clockwise on screen.
//! [`AffineTransform::rotation_degrees`] reports the opposite sign
//! (counter-clockwise positive).

use serde::{Deserialize, Serialize};

use super::Rect;

/// Determinants below this magnitude are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    /// Scale by `(sx, sy)` keeping `(px, py)` fixed.
    pub fn scaling(sx: f64, sy: f64, px: f64, py: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, px - sx * px, py - sy * py)
    }

    /// Rotate by `degrees` (clockwise on screen) around `(px, py)`.
    pub fn rotation(degrees: f64, px: f64, py: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(
            cos,
            sin,
            -sin,
            cos,
            px - (cos * px - sin * py),
            py - (sin * px + cos * py),
        )
    }

    /// Returns `other ∘ self`: points are mapped by `self` first.
    pub fn post_concat(&self, other: &AffineTransform) -> Self {
        Self {
            a: other.a * self.a + other.c * self.b,
            b: other.b * self.a + other.d * self.b,
            c: other.a * self.c + other.c * self.d,
            d: other.b * self.c + other.d * self.d,
            tx: other.a * self.tx + other.c * self.ty + other.tx,
            ty: other.b * self.tx + other.d * self.ty + other.ty,
        }
    }

    pub fn post_translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            tx: self.tx + dx,
            ty: self.ty + dy,
            ..*self
        }
    }

    pub fn post_scale(&self, sx: f64, sy: f64, px: f64, py: f64) -> Self {
        self.post_concat(&Self::scaling(sx, sy, px, py))
    }

    pub fn post_rotate(&self, degrees: f64, px: f64, py: f64) -> Self {
        self.post_concat(&Self::rotation(degrees, px, py))
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > SINGULAR_EPSILON
    }

    pub fn invert(&self) -> Option<Self> {
        if !self.is_invertible() {
            return None;
        }
        let det = self.determinant();
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            tx: (self.c * self.ty - self.d * self.tx) / det,
            ty: (self.b * self.tx - self.a * self.ty) / det,
        })
    }

    pub fn map_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// Maps the corners of `rect` and returns their axis-aligned bounds.
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        let corners = rect.corners().map(|(x, y)| self.map_point(x, y));
        Rect::bounding(&corners)
    }

    /// Rotation in whole degrees, counter-clockwise positive.
    pub fn rotation_degrees(&self) -> f64 {
        let degrees = -self.b.atan2(self.a).to_degrees().round();
        // keep 0 instead of -0 for an unrotated transform
        degrees + 0.0
    }

    /// Uniform scale magnitude.
    pub fn scale_factor(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    pub fn translation_offset(&self) -> (f64, f64) {
        (self.tx, self.ty)
    }

    /// Rotation rounded to the nearest multiple of 90°, as a number of
    /// counter-clockwise quarter turns in `0..4`.
    pub fn quarter_turns(&self) -> u8 {
        ((self.rotation_degrees() / 90.0).round() as i64).rem_euclid(4) as u8
    }

    /// Linear interpolation of the six coefficients.
    ///
    /// This is not a polar decomposition: the in-between frames of a
    /// combined rotate and scale are only approximately rigid. `t` is
    /// clamped to `[0, 1]`.
    pub fn interpolate(&self, other: &AffineTransform, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let lerp = |from: f64, to: f64| from + (to - from) * t;
        Self {
            a: lerp(self.a, other.a),
            b: lerp(self.b, other.b),
            c: lerp(self.c, other.c),
            d: lerp(self.d, other.d),
            tx: lerp(self.tx, other.tx),
            ty: lerp(self.ty, other.ty),
        }
    }

    /// Coefficients in `[a, b, c, d, tx, ty]` order, the layout used by
    /// canvas `setTransform` on the host side.
    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn approx_point(p: (f64, f64), q: (f64, f64)) -> bool {
        approx(p.0, q.0) && approx(p.1, q.1)
    }

    #[test]
    fn test_identity_maps_points_unchanged() {
        let m = AffineTransform::identity();
        assert_eq!(m.map_point(3.0, -4.0), (3.0, -4.0));
        assert_eq!(m.rotation_degrees(), 0.0);
        assert_eq!(m.scale_factor(), 1.0);
    }

    #[test]
    fn test_post_scale_keeps_pivot_fixed() {
        let m = AffineTransform::identity().post_scale(2.0, 2.0, 10.0, 20.0);
        assert!(approx_point(m.map_point(10.0, 20.0), (10.0, 20.0)));
        assert!(approx_point(m.map_point(11.0, 20.0), (12.0, 20.0)));
        assert!(approx(m.scale_factor(), 2.0));
    }

    #[test]
    fn test_post_rotate_is_clockwise_on_screen() {
        let m = AffineTransform::identity().post_rotate(90.0, 0.0, 0.0);
        // the x axis turns towards +y (down)
        assert!(approx_point(m.map_point(1.0, 0.0), (0.0, 1.0)));
        assert_eq!(m.rotation_degrees(), -90.0);
        assert_eq!(m.quarter_turns(), 3);
    }

    #[test]
    fn test_rotation_degrees_rounds() {
        let m = AffineTransform::identity().post_rotate(-30.4, 5.0, 5.0);
        assert_eq!(m.rotation_degrees(), 30.0);
        let m = AffineTransform::identity().post_rotate(-44.0, 0.0, 0.0);
        assert_eq!(m.quarter_turns(), 0);
        let m = AffineTransform::identity().post_rotate(-46.0, 0.0, 0.0);
        assert_eq!(m.quarter_turns(), 1);
    }

    #[test]
    fn test_scale_survives_rotation() {
        let m = AffineTransform::identity()
            .post_scale(3.0, 3.0, 0.0, 0.0)
            .post_rotate(37.0, 4.0, 9.0);
        assert!(approx(m.scale_factor(), 3.0));
    }

    #[test]
    fn test_translation_offset() {
        let m = AffineTransform::identity()
            .post_translate(5.0, -2.0)
            .post_translate(1.0, 1.0);
        assert_eq!(m.translation_offset(), (6.0, -1.0));
    }

    #[test]
    fn test_invert_round_trip() {
        let m = AffineTransform::identity()
            .post_scale(1.5, 1.5, 20.0, 30.0)
            .post_rotate(25.0, 50.0, 50.0)
            .post_translate(-7.0, 12.0);
        let inv = m.invert().unwrap();
        let (x, y) = m.map_point(13.0, 17.0);
        assert!(approx_point(inv.map_point(x, y), (13.0, 17.0)));
        let both = m.post_concat(&inv);
        assert!(approx_point(both.map_point(99.0, -3.0), (99.0, -3.0)));
    }

    #[test]
    fn test_singular_transform_has_no_inverse() {
        let m = AffineTransform::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0);
        assert!(!m.is_invertible());
        assert!(m.invert().is_none());
    }

    #[test]
    fn test_map_rect_returns_bounds() {
        let m = AffineTransform::identity().post_rotate(90.0, 0.0, 0.0);
        let r = m.map_rect(&Rect::from_size(20.0, 10.0));
        assert!(approx(r.left, -10.0));
        assert!(approx(r.top, 0.0));
        assert!(approx(r.width(), 10.0));
        assert!(approx(r.height(), 20.0));
    }

    #[test]
    fn test_interpolate_endpoints_and_midpoint() {
        let a = AffineTransform::identity();
        let b = AffineTransform::identity()
            .post_scale(3.0, 3.0, 0.0, 0.0)
            .post_translate(10.0, 20.0);
        assert_eq!(a.interpolate(&b, 0.0), a);
        assert_eq!(a.interpolate(&b, 1.0), b);
        let mid = a.interpolate(&b, 0.5);
        assert!(approx(mid.a, 2.0));
        assert!(approx(mid.tx, 5.0));
        assert!(approx(mid.ty, 10.0));
        // out-of-range t is clamped
        assert_eq!(a.interpolate(&b, 7.0), b);
    }
}
