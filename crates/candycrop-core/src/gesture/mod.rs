//! Touch gesture interpretation.
//!
//! Raw pointer events are folded into a [`GestureState`], then turned into
//! pan, scale and rotate deltas for the transform state machine:
//!
//! - one pointer pans
//! - two pointers pinch ([`ScaleDetector`]) and rotate ([`RotationDetector`])
//!
//! Only the first two pointers of a gesture are tracked.

mod rotation;
mod scale;

pub use rotation::{normalize_degrees, RotationDelta, RotationDetector, DEAD_ZONE_DEGREES};
pub use scale::{ScaleDelta, ScaleDetector, MIN_SPAN};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One pointer event in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub pointer_id: i32,
    pub x: f64,
    pub y: f64,
    pub phase: TouchPhase,
}

impl TouchEvent {
    pub fn new(pointer_id: i32, x: f64, y: f64, phase: TouchPhase) -> Self {
        Self {
            pointer_id,
            x,
            y,
            phase,
        }
    }
}

/// A tracked pointer with its current and previous position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub id: i32,
    pub x: f64,
    pub y: f64,
    pub prev_x: f64,
    pub prev_y: f64,
}

impl Pointer {
    fn new(id: i32, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            prev_x: x,
            prev_y: y,
        }
    }
}

/// Pointers of the gesture in progress, in the order they went down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureState {
    pointers: Vec<Pointer>,
}

impl GestureState {
    pub const MAX_POINTERS: usize = 2;

    /// Fold `event` into the state. Returns false for pointers that aren't
    /// tracked.
    pub fn apply(&mut self, event: &TouchEvent) -> bool {
        match event.phase {
            TouchPhase::Down => {
                let tracked = self.index_of(event.pointer_id).is_some();
                if tracked || self.pointers.len() >= Self::MAX_POINTERS {
                    return false;
                }
                self.pointers
                    .push(Pointer::new(event.pointer_id, event.x, event.y));
                self.reseed();
                true
            }
            TouchPhase::Move => match self.index_of(event.pointer_id) {
                Some(i) => {
                    let p = &mut self.pointers[i];
                    p.prev_x = p.x;
                    p.prev_y = p.y;
                    p.x = event.x;
                    p.y = event.y;
                    true
                }
                None => false,
            },
            TouchPhase::Up => match self.index_of(event.pointer_id) {
                Some(i) => {
                    self.pointers.remove(i);
                    self.reseed();
                    true
                }
                None => false,
            },
            TouchPhase::Cancel => {
                self.pointers.clear();
                true
            }
        }
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// The single pointer of a one-finger gesture.
    pub fn single(&self) -> Option<&Pointer> {
        match self.pointers.as_slice() {
            [p] => Some(p),
            _ => None,
        }
    }

    /// Both pointers of a two-finger gesture.
    pub fn pair(&self) -> Option<(&Pointer, &Pointer)> {
        match self.pointers.as_slice() {
            [a, b] => Some((a, b)),
            _ => None,
        }
    }

    fn index_of(&self, id: i32) -> Option<usize> {
        self.pointers.iter().position(|p| p.id == id)
    }

    // A change in pointer count must not produce a jump on the next move.
    fn reseed(&mut self) {
        for p in &mut self.pointers {
            p.prev_x = p.x;
            p.prev_y = p.y;
        }
    }
}

/// A change requested by the user's gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureDelta {
    Pan { dx: f64, dy: f64 },
    Scale { factor: f64, focal_x: f64, focal_y: f64 },
    /// Clockwise on screen, in degrees.
    Rotate { degrees: f64 },
}

/// Turns touch events into [`GestureDelta`]s.
#[derive(Debug, Clone, Default)]
pub struct GestureInterpreter {
    state: Option<GestureState>,
    scale: ScaleDetector,
    rotation: RotationDetector,
    rotation_disabled: bool,
}

impl GestureInterpreter {
    pub fn new(allow_rotation: bool) -> Self {
        Self {
            rotation_disabled: !allow_rotation,
            ..Self::default()
        }
    }

    pub fn set_rotation_enabled(&mut self, enabled: bool) {
        self.rotation_disabled = !enabled;
        if !enabled {
            self.rotation.reset();
        }
    }

    /// True while at least one pointer is down.
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&GestureState> {
        self.state.as_ref()
    }

    /// Cumulative rotation of the current two-finger gesture.
    pub fn rotation_angle(&self) -> f64 {
        self.rotation.angle()
    }

    pub fn on_touch(&mut self, event: &TouchEvent) -> Vec<GestureDelta> {
        let mut deltas = Vec::new();

        if self.state.is_none() {
            if event.phase != TouchPhase::Down {
                return deltas;
            }
            self.state = Some(GestureState::default());
        }
        let Some(state) = self.state.as_mut() else {
            return deltas;
        };

        if !state.apply(event) {
            return deltas;
        }

        if let Some(delta) = self.scale.update(state) {
            deltas.push(GestureDelta::Scale {
                factor: delta.factor,
                focal_x: delta.focal_x,
                focal_y: delta.focal_y,
            });
        }

        if !self.rotation_disabled {
            if let Some(delta) = self.rotation.update(state) {
                if delta.delta != 0.0 {
                    deltas.push(GestureDelta::Rotate {
                        degrees: delta.delta,
                    });
                }
            }
        }

        if event.phase == TouchPhase::Move {
            if let Some(p) = state.single() {
                let (dx, dy) = (p.x - p.prev_x, p.y - p.prev_y);
                if dx != 0.0 || dy != 0.0 {
                    deltas.push(GestureDelta::Pan { dx, dy });
                }
            }
        }

        if state.is_empty() {
            self.state = None;
            self.scale.reset();
            self.rotation.reset();
        }

        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(id: i32, x: f64, y: f64) -> TouchEvent {
        TouchEvent::new(id, x, y, TouchPhase::Down)
    }

    fn mv(id: i32, x: f64, y: f64) -> TouchEvent {
        TouchEvent::new(id, x, y, TouchPhase::Move)
    }

    fn up(id: i32, x: f64, y: f64) -> TouchEvent {
        TouchEvent::new(id, x, y, TouchPhase::Up)
    }

    #[test]
    fn test_state_tracks_two_pointers() {
        let mut state = GestureState::default();
        assert!(state.apply(&down(1, 0.0, 0.0)));
        assert!(state.apply(&down(2, 10.0, 0.0)));
        assert!(!state.apply(&down(3, 20.0, 0.0)));
        assert!(!state.apply(&mv(3, 25.0, 0.0)));
        assert_eq!(state.pointer_count(), 2);

        assert!(state.apply(&up(1, 0.0, 0.0)));
        assert_eq!(state.single().map(|p| p.id), Some(2));
        assert!(state.apply(&TouchEvent::new(2, 0.0, 0.0, TouchPhase::Cancel)));
        assert!(state.is_empty());
    }

    #[test]
    fn test_single_pointer_pans() {
        let mut gestures = GestureInterpreter::new(true);
        assert!(gestures.on_touch(&down(1, 100.0, 100.0)).is_empty());
        assert!(gestures.is_active());

        let deltas = gestures.on_touch(&mv(1, 110.0, 95.0));
        assert_eq!(deltas, vec![GestureDelta::Pan { dx: 10.0, dy: -5.0 }]);

        gestures.on_touch(&up(1, 110.0, 95.0));
        assert!(!gestures.is_active());
    }

    #[test]
    fn test_events_without_gesture_are_ignored() {
        let mut gestures = GestureInterpreter::default();
        assert!(gestures.on_touch(&mv(4, 1.0, 1.0)).is_empty());
        assert!(!gestures.is_active());
    }

    #[test]
    fn test_two_pointers_do_not_pan() {
        let mut gestures = GestureInterpreter::new(false);
        gestures.on_touch(&down(1, 100.0, 100.0));
        gestures.on_touch(&down(2, 200.0, 100.0));

        // moving both fingers together keeps the span
        let deltas = gestures.on_touch(&mv(1, 120.0, 100.0));
        assert!(deltas
            .iter()
            .all(|d| !matches!(d, GestureDelta::Pan { .. })));
    }

    #[test]
    fn test_pan_after_pointer_lift_does_not_jump() {
        let mut gestures = GestureInterpreter::new(true);
        gestures.on_touch(&down(1, 100.0, 100.0));
        gestures.on_touch(&down(2, 300.0, 100.0));
        gestures.on_touch(&mv(2, 320.0, 100.0));
        gestures.on_touch(&up(1, 100.0, 100.0));

        let deltas = gestures.on_touch(&mv(2, 325.0, 102.0));
        assert_eq!(deltas, vec![GestureDelta::Pan { dx: 5.0, dy: 2.0 }]);
    }

    #[test]
    fn test_pinch_reports_scale_at_midpoint() {
        let mut gestures = GestureInterpreter::new(true);
        gestures.on_touch(&down(1, 450.0, 500.0));
        gestures.on_touch(&down(2, 550.0, 500.0));

        let deltas = gestures.on_touch(&mv(2, 500.0, 500.0));
        assert_eq!(
            deltas,
            vec![GestureDelta::Scale {
                factor: 0.5,
                focal_x: 475.0,
                focal_y: 500.0
            }]
        );
    }

    #[test]
    fn test_twist_reports_rotation_when_enabled() {
        let twist = |allow: bool| {
            let mut gestures = GestureInterpreter::new(allow);
            gestures.on_touch(&down(1, 0.0, 0.0));
            gestures.on_touch(&down(2, 100.0, 0.0));
            // 45° clockwise on screen, same span
            let s = 100.0 / 2f64.sqrt();
            gestures.on_touch(&mv(2, s, s))
        };

        let deltas = twist(true);
        assert_eq!(deltas.len(), 1);
        match deltas[0] {
            GestureDelta::Rotate { degrees } => assert!((degrees - 45.0).abs() < 1e-9),
            other => panic!("unexpected delta {other:?}"),
        }
        assert!(twist(false).is_empty());
    }
}
