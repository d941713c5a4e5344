use crate::core::{
    constants::{
        DEFAULT_CAMERA_LAT, DEFAULT_CAMERA_LNG, DEFAULT_CAMERA_ZOOM, MAX_TILT, MAX_ZOOM, MIN_ZOOM,
    },
    geo::LatLng,
};
use serde::{Deserialize, Serialize};

/// The camera viewpoint: what the map center looks at, how close, how
/// steep and which way up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPosition {
    pub target: LatLng,
    pub zoom: f64,
    /// Degrees from straight down.
    pub tilt: f64,
    /// Degrees clockwise from north.
    pub bearing: f64,
}

impl CameraPosition {
    pub fn new(target: LatLng, zoom: f64) -> Self {
        Self {
            target,
            zoom,
            tilt: 0.0,
            bearing: 0.0,
        }
    }

    pub fn with_tilt(mut self, tilt: f64) -> Self {
        self.tilt = tilt;
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = bearing;
        self
    }

    /// Brings every component into its engine-wide range: zoom within
    /// [0, 21], tilt within [0, 60], bearing within [0, 360), latitude within
    /// the Mercator limit and longitude wrapped.
    pub fn normalized(&self) -> CameraPosition {
        CameraPosition {
            target: self.target.normalized(),
            zoom: finite_or(self.zoom, MIN_ZOOM).clamp(MIN_ZOOM, MAX_ZOOM),
            tilt: finite_or(self.tilt, 0.0).clamp(0.0, MAX_TILT),
            bearing: normalize_bearing(finite_or(self.bearing, 0.0)),
        }
    }

    /// Approximate equality used to decide whether the camera moved
    pub fn approx_eq(&self, other: &CameraPosition) -> bool {
        const EPSILON: f64 = 1e-9;
        (self.target.lat - other.target.lat).abs() < EPSILON
            && (self.target.lng - other.target.lng).abs() < EPSILON
            && (self.zoom - other.zoom).abs() < EPSILON
            && (self.tilt - other.tilt).abs() < EPSILON
            && (self.bearing - other.bearing).abs() < EPSILON
    }
}

impl Default for CameraPosition {
    fn default() -> Self {
        Self::new(
            LatLng::new(DEFAULT_CAMERA_LAT, DEFAULT_CAMERA_LNG),
            DEFAULT_CAMERA_ZOOM,
        )
    }
}

pub fn normalize_bearing(bearing: f64) -> f64 {
    let wrapped = bearing.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_clamps_every_component() {
        let position = CameraPosition {
            target: LatLng::new(89.0, 190.0),
            zoom: 25.0,
            tilt: 75.0,
            bearing: -90.0,
        }
        .normalized();

        assert_eq!(position.zoom, MAX_ZOOM);
        assert_eq!(position.tilt, MAX_TILT);
        assert_eq!(position.bearing, 270.0);
        assert!(position.target.lat < 85.1);
        assert!((position.target.lng + 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_values_fall_back() {
        let position = CameraPosition {
            target: LatLng::new(0.0, 0.0),
            zoom: f64::NAN,
            tilt: f64::INFINITY,
            bearing: f64::NAN,
        }
        .normalized();

        assert_eq!(position.zoom, MIN_ZOOM);
        assert_eq!(position.tilt, 0.0);
        assert_eq!(position.bearing, 0.0);
    }

    #[test]
    fn test_bearing_wraps() {
        assert_eq!(normalize_bearing(360.0), 0.0);
        assert_eq!(normalize_bearing(725.0), 5.0);
        assert!(normalize_bearing(-1e-20) < 360.0);
    }
}
