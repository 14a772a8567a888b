//! Two-pointer rotation detection.
//!
//! The angle is measured between the line through both pointers when the
//! pair formed and the line through them now. Small angles are treated as
//! an imprecise pinch and reported as zero.

use super::GestureState;

/// Angles strictly inside `(-5°, 5°)` are suppressed.
pub const DEAD_ZONE_DEGREES: f64 = 5.0;

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationDelta {
    /// Change since the previous sample, clockwise on screen.
    pub delta: f64,
    /// Cumulative angle since the gesture started.
    pub angle: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RotationDetector {
    ids: Option<(i32, i32)>,
    start_line: f64,
    angle: f64,
}

impl RotationDetector {
    /// Cumulative angle of the gesture in progress, zero when idle.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn reset(&mut self) {
        self.ids = None;
        self.start_line = 0.0;
        self.angle = 0.0;
    }

    /// Returns `None` (unhandled) unless two pointers were already paired.
    pub fn update(&mut self, state: &GestureState) -> Option<RotationDelta> {
        let Some((a, b)) = state.pair() else {
            self.reset();
            return None;
        };

        let line = (b.y - a.y).atan2(b.x - a.x).to_degrees();
        if self.ids != Some((a.id, b.id)) {
            self.ids = Some((a.id, b.id));
            self.start_line = line;
            self.angle = 0.0;
            return None;
        }

        let mut angle = normalize_degrees(line - self.start_line);
        if angle.abs() < DEAD_ZONE_DEGREES {
            angle = 0.0;
        }

        let delta = angle - self.angle;
        self.angle = angle;
        Some(RotationDelta { delta, angle })
    }
}
