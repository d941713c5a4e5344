use crate::{
    core::{config::GestureOptions, constants::TILT_DEGREES_PER_POINT, geo::Point},
    input::{
        events::{TouchEventType, TouchPoint},
        gestures::{Gesture, GestureConfig, GestureRecognizer},
    },
};
use instant::Instant;

/// Inertia stops once every velocity drops below these
const MIN_PAN_VELOCITY: f64 = 10.0;
const MIN_ZOOM_VELOCITY: f64 = 0.01;
const MIN_ROTATE_VELOCITY: f64 = 1.0;

/// Frame length the frictions are defined against
const FRICTION_FRAME: f64 = 1.0 / 60.0;

/// Camera actions produced by gestures. Screen positions are in points.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureAction {
    /// Stop the running camera transition
    CancelTransitions,
    /// Move the camera by a screen offset
    ScrollBy(Point),
    ZoomBy { delta: f64, pivot: Point },
    /// Change the bearing by `degrees`, keeping `pivot` fixed
    RotateBy { degrees: f64, pivot: Point },
    TiltBy(f64),
    /// Animated zoom step (double tap, two-finger tap)
    AnimatedZoom { delta: f64, pivot: Point },
    /// Pick at this point
    Tap(Point),
}

/// Velocities carried after the fingers lift, per second
#[derive(Debug, Clone, Copy, PartialEq)]
struct Inertia {
    scroll: Point,
    zoom: f64,
    rotate: f64,
    pivot: Point,
}

impl Inertia {
    fn is_spent(&self) -> bool {
        self.scroll.length() < MIN_PAN_VELOCITY
            && self.zoom.abs() < MIN_ZOOM_VELOCITY
            && self.rotate.abs() < MIN_ROTATE_VELOCITY
    }
}

/// Maps recognized gestures onto camera actions honoring the enable flags,
/// and runs friction-decayed inertia after release
pub struct GestureHandler {
    recognizer: GestureRecognizer,
    options: GestureOptions,
    inertia: Option<Inertia>,
    /// The touch that stopped an animation must not also tap
    swallow_tap: bool,
}

impl GestureHandler {
    pub fn new(options: GestureOptions) -> Self {
        Self::with_config(options, GestureConfig::default())
    }

    pub fn with_config(options: GestureOptions, config: GestureConfig) -> Self {
        Self {
            recognizer: GestureRecognizer::with_config(config),
            options: options.sanitized(),
            inertia: None,
            swallow_tap: false,
        }
    }

    pub fn options(&self) -> &GestureOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: GestureOptions) {
        self.options = options.sanitized();
    }

    /// Whether fingers are on the screen
    pub fn is_touching(&self) -> bool {
        self.recognizer.touch_count() > 0
    }

    pub fn is_inertia_active(&self) -> bool {
        self.inertia.is_some()
    }

    /// Drops any inertia; returns whether some was running
    pub fn stop_inertia(&mut self) -> bool {
        self.inertia.take().is_some()
    }

    /// Processes one touch event. `animating` tells whether a camera
    /// transition is running.
    pub fn handle(
        &mut self,
        event_type: TouchEventType,
        touches: &[TouchPoint],
        now: Instant,
        animating: bool,
    ) -> Vec<GestureAction> {
        let mut actions = Vec::new();
        for gesture in self.recognizer.process(event_type, touches, now) {
            self.apply(gesture, animating, &mut actions);
        }
        actions
    }

    fn apply(&mut self, gesture: Gesture, animating: bool, actions: &mut Vec<GestureAction>) {
        let options = self.options;
        match gesture {
            Gesture::Began { .. } => {
                self.swallow_tap = false;
                if options.stop_enabled {
                    let had_inertia = self.stop_inertia();
                    if animating || had_inertia {
                        log::debug!("touch stopped camera movement");
                        actions.push(GestureAction::CancelTransitions);
                        self.swallow_tap = true;
                    }
                }
            }
            Gesture::Pan { delta } => {
                if options.scroll_enabled {
                    self.inertia = None;
                    actions.push(GestureAction::ScrollBy(delta.multiply(-1.0)));
                }
            }
            Gesture::Pinch { focus, scale } => {
                if options.zoom_enabled && scale > 0.0 {
                    self.inertia = None;
                    actions.push(GestureAction::ZoomBy {
                        delta: scale.log2(),
                        pivot: focus,
                    });
                }
            }
            Gesture::Rotate { focus, degrees } => {
                // content turning clockwise means the heading turns the other way
                if options.rotate_enabled {
                    self.inertia = None;
                    actions.push(GestureAction::RotateBy {
                        degrees: -degrees,
                        pivot: focus,
                    });
                }
            }
            Gesture::Tilt { delta_y } => {
                if options.tilt_enabled {
                    self.inertia = None;
                    actions.push(GestureAction::TiltBy(-delta_y * TILT_DEGREES_PER_POINT));
                }
            }
            Gesture::Tap { position } => {
                if !std::mem::take(&mut self.swallow_tap) {
                    actions.push(GestureAction::Tap(position));
                }
            }
            Gesture::DoubleTap { position } => {
                if !std::mem::take(&mut self.swallow_tap) && options.zoom_enabled {
                    actions.push(GestureAction::AnimatedZoom {
                        delta: 1.0,
                        pivot: position,
                    });
                }
            }
            Gesture::TwoFingerTap { focus } => {
                if !std::mem::take(&mut self.swallow_tap) && options.zoom_enabled {
                    actions.push(GestureAction::AnimatedZoom {
                        delta: -1.0,
                        pivot: focus,
                    });
                }
            }
            Gesture::Released {
                focus,
                pan_velocity,
                zoom_velocity,
                rotate_velocity,
            } => {
                let carries = |enabled: bool, friction: f64| enabled && friction < 1.0;
                let inertia = Inertia {
                    scroll: if carries(options.scroll_enabled, options.scroll_friction) {
                        pan_velocity.multiply(-1.0)
                    } else {
                        Point::new(0.0, 0.0)
                    },
                    zoom: if carries(options.zoom_enabled, options.zoom_friction) {
                        zoom_velocity
                    } else {
                        0.0
                    },
                    rotate: if carries(options.rotate_enabled, options.rotate_friction) {
                        -rotate_velocity
                    } else {
                        0.0
                    },
                    pivot: focus,
                };
                self.inertia = (!inertia.is_spent()).then_some(inertia);
            }
        }
    }

    /// Advances inertia by `delta_time` seconds and returns the resulting moves
    pub fn tick(&mut self, delta_time: f64) -> Vec<GestureAction> {
        let mut actions = Vec::new();
        let Some(inertia) = self.inertia.as_mut() else {
            return actions;
        };
        if delta_time <= 0.0 {
            return actions;
        }

        if inertia.scroll.length() >= MIN_PAN_VELOCITY {
            actions.push(GestureAction::ScrollBy(inertia.scroll.multiply(delta_time)));
        }
        if inertia.zoom.abs() >= MIN_ZOOM_VELOCITY {
            actions.push(GestureAction::ZoomBy {
                delta: inertia.zoom * delta_time,
                pivot: inertia.pivot,
            });
        }
        if inertia.rotate.abs() >= MIN_ROTATE_VELOCITY {
            actions.push(GestureAction::RotateBy {
                degrees: inertia.rotate * delta_time,
                pivot: inertia.pivot,
            });
        }

        let frames = delta_time / FRICTION_FRAME;
        let decay = |friction: f64| (1.0 - friction).powf(frames);
        inertia.scroll = inertia.scroll.multiply(decay(self.options.scroll_friction));
        inertia.zoom *= decay(self.options.zoom_friction);
        inertia.rotate *= decay(self.options.rotate_friction);

        if inertia.is_spent() {
            log::debug!("gesture inertia settled");
            self.inertia = None;
        }
        actions
    }

    /// Forgets touches and inertia
    pub fn reset(&mut self) {
        self.recognizer.reset();
        self.inertia = None;
        self.swallow_tap = false;
    }
}

impl Default for GestureHandler {
    fn default() -> Self {
        Self::new(GestureOptions::default())
    }
}
