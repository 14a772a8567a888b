//! Two-pointer pinch detection.

use super::GestureState;

/// Spans below this many pixels are too unstable to divide by.
pub const MIN_SPAN: f64 = 10.0;

// Factors this close to 1 are reported as no change.
const FACTOR_EPSILON: f64 = 1e-9;

/// Incremental scale since the previous pinch sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleDelta {
    pub factor: f64,
    pub focal_x: f64,
    pub focal_y: f64,
}

/// Reports the span ratio between consecutive samples of a pinch, focused
/// on the midpoint of the two pointers.
#[derive(Debug, Clone, Default)]
pub struct ScaleDetector {
    ids: Option<(i32, i32)>,
    prev_span: f64,
}

impl ScaleDetector {
    pub fn is_in_progress(&self) -> bool {
        self.ids.is_some()
    }

    pub fn reset(&mut self) {
        self.ids = None;
        self.prev_span = 0.0;
    }

    pub fn update(&mut self, state: &GestureState) -> Option<ScaleDelta> {
        let Some((a, b)) = state.pair() else {
            self.reset();
            return None;
        };

        let span = (b.x - a.x).hypot(b.y - a.y);
        if self.ids != Some((a.id, b.id)) {
            self.ids = Some((a.id, b.id));
            self.prev_span = span;
            return None;
        }

        if span < MIN_SPAN {
            return None;
        }
        if self.prev_span < MIN_SPAN {
            self.prev_span = span;
            return None;
        }

        let factor = span / self.prev_span;
        self.prev_span = span;
        if (factor - 1.0).abs() < FACTOR_EPSILON {
            return None;
        }

        Some(ScaleDelta {
            factor,
            focal_x: (a.x + b.x) / 2.0,
            focal_y: (a.y + b.y) / 2.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{TouchEvent, TouchPhase};

    fn state(points: &[(i32, f64, f64)]) -> GestureState {
        let mut state = GestureState::default();
        for &(id, x, y) in points {
            state.apply(&TouchEvent::new(id, x, y, TouchPhase::Down));
        }
        state
    }

    #[test]
    fn test_first_sample_only_begins() {
        let mut detector = ScaleDetector::default();
        assert!(detector
            .update(&state(&[(1, 0.0, 0.0), (2, 100.0, 0.0)]))
            .is_none());
        assert!(detector.is_in_progress());
    }

    #[test]
    fn test_factors_compose_across_samples() {
        let mut detector = ScaleDetector::default();
        let mut s = state(&[(1, 0.0, 0.0), (2, 100.0, 0.0)]);
        detector.update(&s);

        s.apply(&TouchEvent::new(2, 200.0, 0.0, TouchPhase::Move));
        let first = detector.update(&s).unwrap();
        assert_eq!(first.factor, 2.0);
        assert_eq!((first.focal_x, first.focal_y), (100.0, 0.0));

        s.apply(&TouchEvent::new(2, 50.0, 0.0, TouchPhase::Move));
        let second = detector.update(&s).unwrap();
        assert_eq!(second.factor, 0.25);
        assert_eq!(first.factor * second.factor, 0.5);
    }

    #[test]
    fn test_tiny_span_is_ignored() {
        let mut detector = ScaleDetector::default();
        let mut s = state(&[(1, 0.0, 0.0), (2, 100.0, 0.0)]);
        detector.update(&s);

        s.apply(&TouchEvent::new(2, 5.0, 0.0, TouchPhase::Move));
        assert!(detector.update(&s).is_none());

        // the reference span survives the ignored sample
        s.apply(&TouchEvent::new(2, 50.0, 0.0, TouchPhase::Move));
        assert_eq!(detector.update(&s).map(|d| d.factor), Some(0.5));
    }

    #[test]
    fn test_lifted_pointer_resets() {
        let mut detector = ScaleDetector::default();
        let mut s = state(&[(1, 0.0, 0.0), (2, 100.0, 0.0)]);
        detector.update(&s);

        s.apply(&TouchEvent::new(2, 100.0, 0.0, TouchPhase::Up));
        assert!(detector.update(&s).is_none());
        assert!(!detector.is_in_progress());
    }
}
