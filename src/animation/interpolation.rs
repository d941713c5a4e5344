use crate::core::geo::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Easing curves used by camera transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EasingFunction {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInOutSine,
}

impl EasingFunction {
    /// Apply the easing function to a normalized time value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::EaseInCubic => t * t * t,
            EasingFunction::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EasingFunction::EaseInOutSine => -(((PI * t).cos() - 1.0) / 2.0),
        }
    }
}

/// Interpolation of camera components
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two f64 values
    pub fn linear(start: f64, end: f64, t: f64) -> f64 {
        start + (end - start) * t
    }

    /// Interpolates between two angles in degrees along the shorter arc
    pub fn angle(start: f64, end: f64, t: f64) -> f64 {
        let mut delta = (end - start).rem_euclid(360.0);
        if delta > 180.0 {
            delta -= 360.0;
        }
        start + delta * t
    }

    /// Interpolates between two normalized world positions, crossing the
    /// antimeridian when that is the shorter way
    pub fn world(start: &Point, end: &Point, t: f64) -> Point {
        let mut dx = end.x - start.x;
        dx -= dx.round();
        Point::new(start.x + dx * t, Self::linear(start.y, end.y, t))
    }
}
