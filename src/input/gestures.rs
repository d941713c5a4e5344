use crate::{
    core::geo::Point,
    input::events::{TouchEventType, TouchPoint},
    prelude::HashMap,
};
use instant::Instant;
use std::time::Duration;

/// Gestures recognized from raw touches. Continuous gestures carry the change
/// since the previous event.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// First finger went down
    Began { focus: Point },
    /// Fingers moved the focus by `delta` points
    Pan { delta: Point },
    /// Finger spread changed by the factor `scale`
    Pinch { focus: Point, scale: f64 },
    /// Fingers turned clockwise on screen by `degrees`
    Rotate { focus: Point, degrees: f64 },
    /// Two fingers moved vertically together by `delta_y` points
    Tilt { delta_y: f64 },
    Tap { position: Point },
    DoubleTap { position: Point },
    TwoFingerTap { focus: Point },
    /// Last finger lifted after a continuous gesture. Velocities are per second:
    /// points, zoom levels and screen degrees.
    Released {
        focus: Point,
        pan_velocity: Point,
        zoom_velocity: f64,
        rotate_velocity: f64,
    },
}

/// Configuration for gesture recognition
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Minimum distance for a pan to start
    pub drag_threshold: f64,
    /// Maximum time for tap gesture
    pub tap_timeout: Duration,
    /// Maximum time between double taps
    pub double_tap_timeout: Duration,
    /// Maximum distance between taps for double tap
    pub double_tap_distance_threshold: f64,
    /// Minimum finger spread change for a pinch
    pub pinch_threshold: f64,
    /// Minimum finger angle change for a rotation, in degrees
    pub rotate_threshold: f64,
    /// Minimum common vertical movement for a tilt
    pub tilt_threshold: f64,
    /// Movement older than this at release carries no velocity
    pub velocity_window: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 8.0,
            tap_timeout: Duration::from_millis(300),
            double_tap_timeout: Duration::from_millis(300),
            double_tap_distance_threshold: 40.0,
            pinch_threshold: 8.0,
            rotate_threshold: 10.0,
            tilt_threshold: 10.0,
            velocity_window: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    Idle,
    /// Fingers down, nothing recognized yet
    Pending,
    Panning,
    /// Two-finger pan, pinch and rotate
    Transforming,
    Tilting,
}

/// Touch tracking information
#[derive(Debug, Clone)]
struct TouchInfo {
    start_position: Point,
    current_position: Point,
}

#[derive(Debug, Clone, Copy, Default)]
struct Velocity {
    pan: Point,
    zoom: f64,
    rotate: f64,
}

/// Turns raw touch events into gestures
pub struct GestureRecognizer {
    config: GestureConfig,
    active_touches: HashMap<u64, TouchInfo>,
    mode: GestureMode,
    sequence_start: Option<Instant>,
    max_touches: usize,
    last_focus: Point,
    last_distance: f64,
    last_angle: f64,
    /// Spread and angle when the second finger landed
    initial_distance: f64,
    initial_angle: f64,
    initial_focus: Point,
    /// Midpoint of the first two fingers, where a two-finger tap lands
    two_finger_focus: Option<Point>,
    last_move: Option<Instant>,
    velocity: Velocity,
    last_tap: Option<(Point, Instant)>,
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::with_config(GestureConfig::default())
    }

    pub fn with_config(config: GestureConfig) -> Self {
        Self {
            config,
            active_touches: HashMap::default(),
            mode: GestureMode::Idle,
            sequence_start: None,
            max_touches: 0,
            last_focus: Point::new(0.0, 0.0),
            last_distance: 0.0,
            last_angle: 0.0,
            initial_distance: 0.0,
            initial_angle: 0.0,
            initial_focus: Point::new(0.0, 0.0),
            two_finger_focus: None,
            last_move: None,
            velocity: Velocity::default(),
            last_tap: None,
        }
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn touch_count(&self) -> usize {
        self.active_touches.len()
    }

    /// Feeds one touch event and returns the gestures it completes
    pub fn process(
        &mut self,
        event_type: TouchEventType,
        touches: &[TouchPoint],
        now: Instant,
    ) -> Vec<Gesture> {
        let mut gestures = Vec::new();

        match event_type {
            TouchEventType::Start => {
                let was_idle = self.active_touches.is_empty();
                for touch in touches {
                    self.active_touches.insert(
                        touch.id,
                        TouchInfo {
                            start_position: touch.position,
                            current_position: touch.position,
                        },
                    );
                }
                self.max_touches = self.max_touches.max(self.active_touches.len());
                self.reset_baseline();
                if self.active_touches.len() >= 2 && self.two_finger_focus.is_none() {
                    self.two_finger_focus = self.finger_pair().map(|(a, b)| a.midpoint(&b));
                }
                if was_idle && !self.active_touches.is_empty() {
                    self.mode = GestureMode::Pending;
                    self.sequence_start = Some(now);
                    self.velocity = Velocity::default();
                    self.last_move = None;
                    gestures.push(Gesture::Began {
                        focus: self.last_focus,
                    });
                }
            }
            TouchEventType::Move => {
                for touch in touches {
                    if let Some(info) = self.active_touches.get_mut(&touch.id) {
                        info.current_position = touch.position;
                    }
                }
                match self.active_touches.len() {
                    1 => self.single_finger_move(now, &mut gestures),
                    2 => self.two_finger_move(now, &mut gestures),
                    _ => self.reset_baseline(),
                }
            }
            TouchEventType::End | TouchEventType::Cancel => {
                for touch in touches {
                    self.active_touches.remove(&touch.id);
                }
                if self.active_touches.is_empty() {
                    self.finish(event_type == TouchEventType::Cancel, now, &mut gestures);
                } else {
                    if self.mode == GestureMode::Transforming || self.mode == GestureMode::Tilting {
                        self.mode = GestureMode::Panning;
                    }
                    self.reset_baseline();
                }
            }
        }

        gestures
    }

    fn single_finger_move(&mut self, now: Instant, gestures: &mut Vec<Gesture>) {
        let Some((position, start)) = self
            .active_touches
            .values()
            .next()
            .map(|touch| (touch.current_position, touch.start_position))
        else {
            return;
        };

        if self.mode == GestureMode::Pending
            && position.distance_to(&start) > self.config.drag_threshold
        {
            self.mode = GestureMode::Panning;
        }

        if self.mode == GestureMode::Panning {
            let delta = position.subtract(&self.last_focus);
            self.track_velocity(now, delta, 0.0, 0.0);
            gestures.push(Gesture::Pan { delta });
            self.last_focus = position;
        }
    }

    fn two_finger_move(&mut self, now: Instant, gestures: &mut Vec<Gesture>) {
        let Some((a, b)) = self.finger_pair() else {
            return;
        };
        let focus = a.midpoint(&b);
        let distance = a.distance_to(&b);
        let angle = finger_angle(&a, &b);

        if matches!(self.mode, GestureMode::Pending | GestureMode::Panning) {
            self.mode = self.classify_two_finger(focus, distance, angle);
        }

        match self.mode {
            GestureMode::Transforming => {
                let delta = focus.subtract(&self.last_focus);
                let scale = if self.last_distance > 0.0 {
                    distance / self.last_distance
                } else {
                    1.0
                };
                let degrees = angle_delta(self.last_angle, angle);
                self.track_velocity(now, delta, scale.log2(), degrees);

                if delta.length() > 0.0 {
                    gestures.push(Gesture::Pan { delta });
                }
                if (scale - 1.0).abs() > f64::EPSILON {
                    gestures.push(Gesture::Pinch { focus, scale });
                }
                if degrees.abs() > f64::EPSILON {
                    gestures.push(Gesture::Rotate { focus, degrees });
                }
            }
            GestureMode::Tilting => {
                let delta_y = focus.y - self.last_focus.y;
                if delta_y.abs() > 0.0 {
                    gestures.push(Gesture::Tilt { delta_y });
                }
            }
            _ => {}
        }

        self.last_focus = focus;
        self.last_distance = distance;
        self.last_angle = angle;
    }

    /// Decides between tilt and transform once two fingers move far enough
    fn classify_two_finger(&self, focus: Point, distance: f64, angle: f64) -> GestureMode {
        let moved = focus.subtract(&self.initial_focus);
        let spread = (distance - self.initial_distance).abs();
        let turned = angle_delta(self.initial_angle, angle).abs();

        // fingers side by side sliding vertically together
        let side_by_side = {
            let folded = self.initial_angle.abs() % 180.0;
            folded < 30.0 || folded > 150.0
        };
        if side_by_side
            && moved.y.abs() > self.config.tilt_threshold
            && moved.y.abs() > moved.x.abs() * 2.0
            && spread < self.config.pinch_threshold
            && turned < self.config.rotate_threshold
        {
            return GestureMode::Tilting;
        }

        if spread > self.config.pinch_threshold
            || turned > self.config.rotate_threshold
            || moved.length() > self.config.drag_threshold
        {
            GestureMode::Transforming
        } else {
            self.mode
        }
    }

    fn finish(&mut self, cancelled: bool, now: Instant, gestures: &mut Vec<Gesture>) {
        let mode = std::mem::replace(&mut self.mode, GestureMode::Idle);
        let max_touches = std::mem::take(&mut self.max_touches);
        let started = self.sequence_start.take();
        let two_finger_focus = self.two_finger_focus.take();

        match mode {
            GestureMode::Pending if !cancelled => {
                let quick = started
                    .map(|start| now.duration_since(start) <= self.config.tap_timeout)
                    .unwrap_or(false);
                if !quick {
                    return;
                }
                if max_touches >= 2 {
                    self.last_tap = None;
                    gestures.push(Gesture::TwoFingerTap {
                        focus: two_finger_focus.unwrap_or(self.last_focus),
                    });
                } else {
                    self.tap(self.last_focus, now, gestures);
                }
            }
            GestureMode::Panning | GestureMode::Transforming => {
                let recent = self
                    .last_move
                    .map(|at| now.duration_since(at) <= self.config.velocity_window)
                    .unwrap_or(false);
                let velocity = if recent && !cancelled {
                    self.velocity
                } else {
                    Velocity::default()
                };
                gestures.push(Gesture::Released {
                    focus: self.last_focus,
                    pan_velocity: velocity.pan,
                    zoom_velocity: velocity.zoom,
                    rotate_velocity: velocity.rotate,
                });
            }
            _ => {}
        }
    }

    fn tap(&mut self, position: Point, now: Instant, gestures: &mut Vec<Gesture>) {
        if let Some((last_position, last_time)) = self.last_tap {
            if now.duration_since(last_time) <= self.config.double_tap_timeout
                && position.distance_to(&last_position) <= self.config.double_tap_distance_threshold
            {
                self.last_tap = None;
                gestures.push(Gesture::DoubleTap { position });
                return;
            }
        }
        self.last_tap = Some((position, now));
        gestures.push(Gesture::Tap { position });
    }

    fn track_velocity(&mut self, now: Instant, delta: Point, zoom: f64, degrees: f64) {
        if let Some(last) = self.last_move {
            let dt = now.duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let sample = Velocity {
                    pan: delta.multiply(1.0 / dt),
                    zoom: zoom / dt,
                    rotate: degrees / dt,
                };
                // exponential smoothing
                self.velocity = Velocity {
                    pan: self.velocity.pan.multiply(0.2).add(&sample.pan.multiply(0.8)),
                    zoom: self.velocity.zoom * 0.2 + sample.zoom * 0.8,
                    rotate: self.velocity.rotate * 0.2 + sample.rotate * 0.8,
                };
            }
        }
        self.last_move = Some(now);
    }

    fn finger_pair(&self) -> Option<(Point, Point)> {
        let mut ids: Vec<_> = self.active_touches.keys().copied().collect();
        ids.sort_unstable();
        let a = self.active_touches.get(ids.first()?)?.current_position;
        let b = self.active_touches.get(ids.get(1)?)?.current_position;
        Some((a, b))
    }

    fn reset_baseline(&mut self) {
        let count = self.active_touches.len();
        if count == 0 {
            return;
        }
        let sum = self
            .active_touches
            .values()
            .fold(Point::new(0.0, 0.0), |acc, touch| acc.add(&touch.current_position));
        self.last_focus = sum.multiply(1.0 / count as f64);

        if let Some((a, b)) = self.finger_pair() {
            self.last_distance = a.distance_to(&b);
            self.last_angle = finger_angle(&a, &b);
            self.initial_distance = self.last_distance;
            self.initial_angle = self.last_angle;
            self.initial_focus = self.last_focus;
        }
    }

    /// Resets all gesture state
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Angle of the line between two fingers, degrees clockwise from +x (y down)
fn finger_angle(a: &Point, b: &Point) -> f64 {
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

/// Signed change from `from` to `to` in (-180, 180]
fn angle_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    fn touch(id: u64, x: f64, y: f64) -> TouchPoint {
        TouchPoint::new(id, x, y)
    }

    #[test]
    fn test_tap_and_double_tap() {
        let mut recognizer = GestureRecognizer::new();
        let t0 = Instant::now();

        let began = recognizer.process(TouchEventType::Start, &[touch(1, 50.0, 50.0)], t0);
        assert!(matches!(began[0], Gesture::Began { .. }));
        let tap = recognizer.process(TouchEventType::End, &[touch(1, 50.0, 50.0)], at(t0, 80));
        assert_eq!(
            tap,
            vec![Gesture::Tap {
                position: Point::new(50.0, 50.0)
            }]
        );

        recognizer.process(TouchEventType::Start, &[touch(2, 52.0, 51.0)], at(t0, 200));
        let double = recognizer.process(TouchEventType::End, &[touch(2, 52.0, 51.0)], at(t0, 260));
        assert!(matches!(double[0], Gesture::DoubleTap { .. }));
    }

    #[test]
    fn test_slow_press_is_not_a_tap() {
        let mut recognizer = GestureRecognizer::new();
        let t0 = Instant::now();
        recognizer.process(TouchEventType::Start, &[touch(1, 10.0, 10.0)], t0);
        let result = recognizer.process(TouchEventType::End, &[touch(1, 10.0, 10.0)], at(t0, 900));
        assert!(result.is_empty());
    }

    #[test]
    fn test_drag_threshold_and_pan() {
        let mut recognizer = GestureRecognizer::new();
        let t0 = Instant::now();
        recognizer.process(TouchEventType::Start, &[touch(1, 0.0, 0.0)], t0);

        let small = recognizer.process(TouchEventType::Move, &[touch(1, 3.0, 3.0)], at(t0, 10));
        assert!(small.is_empty());

        let pan = recognizer.process(TouchEventType::Move, &[touch(1, 20.0, 0.0)], at(t0, 20));
        assert_eq!(
            pan,
            vec![Gesture::Pan {
                delta: Point::new(20.0, 0.0)
            }]
        );
        assert_eq!(recognizer.mode(), GestureMode::Panning);

        recognizer.process(TouchEventType::Move, &[touch(1, 40.0, 0.0)], at(t0, 36));
        let released = recognizer.process(TouchEventType::End, &[touch(1, 40.0, 0.0)], at(t0, 40));
        match &released[0] {
            Gesture::Released { pan_velocity, .. } => assert!(pan_velocity.x > 0.0),
            other => panic!("unexpected gesture {:?}", other),
        }
    }

    #[test]
    fn test_stale_release_has_no_velocity() {
        let mut recognizer = GestureRecognizer::new();
        let t0 = Instant::now();
        recognizer.process(TouchEventType::Start, &[touch(1, 0.0, 0.0)], t0);
        recognizer.process(TouchEventType::Move, &[touch(1, 30.0, 0.0)], at(t0, 16));
        recognizer.process(TouchEventType::Move, &[touch(1, 60.0, 0.0)], at(t0, 32));
        let released = recognizer.process(TouchEventType::End, &[touch(1, 60.0, 0.0)], at(t0, 600));
        assert_eq!(
            released,
            vec![Gesture::Released {
                focus: Point::new(60.0, 0.0),
                pan_velocity: Point::new(0.0, 0.0),
                zoom_velocity: 0.0,
                rotate_velocity: 0.0,
            }]
        );
    }

    #[test]
    fn test_pinch_spread_zooms() {
        let mut recognizer = GestureRecognizer::new();
        let t0 = Instant::now();
        recognizer.process(
            TouchEventType::Start,
            &[touch(1, 100.0, 100.0), touch(2, 200.0, 100.0)],
            t0,
        );
        let gestures = recognizer.process(
            TouchEventType::Move,
            &[touch(1, 50.0, 100.0), touch(2, 250.0, 100.0)],
            at(t0, 16),
        );

        assert_eq!(recognizer.mode(), GestureMode::Transforming);
        let scale = gestures
            .iter()
            .find_map(|gesture| match gesture {
                Gesture::Pinch { scale, .. } => Some(*scale),
                _ => None,
            })
            .unwrap();
        assert!((scale - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_finger_rotation() {
        let mut recognizer = GestureRecognizer::new();
        let t0 = Instant::now();
        recognizer.process(
            TouchEventType::Start,
            &[touch(1, 100.0, 100.0), touch(2, 200.0, 100.0)],
            t0,
        );
        // both fingers turn clockwise around the same focus
        let gestures = recognizer.process(
            TouchEventType::Move,
            &[touch(1, 110.0, 70.0), touch(2, 190.0, 130.0)],
            at(t0, 16),
        );
        assert_eq!(recognizer.mode(), GestureMode::Transforming);
        let degrees = gestures
            .iter()
            .find_map(|gesture| match gesture {
                Gesture::Rotate { degrees, .. } => Some(*degrees),
                _ => None,
            })
            .unwrap();
        assert!(degrees > 30.0 && degrees < 40.0);
    }

    #[test]
    fn test_two_finger_vertical_drag_tilts() {
        let mut recognizer = GestureRecognizer::new();
        let t0 = Instant::now();
        recognizer.process(
            TouchEventType::Start,
            &[touch(1, 100.0, 300.0), touch(2, 200.0, 300.0)],
            t0,
        );
        let gestures = recognizer.process(
            TouchEventType::Move,
            &[touch(1, 100.0, 280.0), touch(2, 200.0, 280.0)],
            at(t0, 16),
        );
        assert_eq!(recognizer.mode(), GestureMode::Tilting);
        assert_eq!(gestures, vec![Gesture::Tilt { delta_y: -20.0 }]);
    }

    #[test]
    fn test_two_finger_tap() {
        let mut recognizer = GestureRecognizer::new();
        let t0 = Instant::now();
        recognizer.process(
            TouchEventType::Start,
            &[touch(1, 100.0, 100.0), touch(2, 140.0, 100.0)],
            t0,
        );
        recognizer.process(TouchEventType::End, &[touch(1, 100.0, 100.0)], at(t0, 60));
        let gestures = recognizer.process(TouchEventType::End, &[touch(2, 140.0, 100.0)], at(t0, 70));
        assert_eq!(
            gestures,
            vec![Gesture::TwoFingerTap {
                focus: Point::new(120.0, 100.0)
            }]
        );
    }

    /// Fingers landing and lifting one by one still tap at their midpoint
    #[test]
    fn test_two_finger_tap_focus_with_staggered_fingers() {
        let mut recognizer = GestureRecognizer::new();
        let t0 = Instant::now();
        recognizer.process(TouchEventType::Start, &[touch(1, 100.0, 300.0)], t0);
        recognizer.process(TouchEventType::Start, &[touch(2, 160.0, 340.0)], at(t0, 20));
        recognizer.process(TouchEventType::End, &[touch(2, 160.0, 340.0)], at(t0, 60));
        let gestures = recognizer.process(TouchEventType::End, &[touch(1, 100.0, 300.0)], at(t0, 90));
        assert_eq!(
            gestures,
            vec![Gesture::TwoFingerTap {
                focus: Point::new(130.0, 320.0)
            }]
        );

        // the next sequence starts without a stale focus
        recognizer.process(TouchEventType::Start, &[touch(3, 10.0, 10.0), touch(4, 30.0, 10.0)], at(t0, 1000));
        let gestures = recognizer.process(
            TouchEventType::End,
            &[touch(3, 10.0, 10.0), touch(4, 30.0, 10.0)],
            at(t0, 1040),
        );
        assert_eq!(
            gestures,
            vec![Gesture::TwoFingerTap {
                focus: Point::new(20.0, 10.0)
            }]
        );
    }

    #[test]
    fn test_angle_delta_wraps() {
        assert_eq!(angle_delta(170.0, -170.0), 20.0);
        assert_eq!(angle_delta(-170.0, 170.0), -20.0);
    }
}
