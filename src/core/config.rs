//! Configuration for a map view
//!
//! Options can be built from presets, assembled field by field, or loaded
//! from JSON. Scalar styling values are clamped into their ranges by
//! [`MapViewOptions::sanitized`]; structural mistakes are reported by
//! [`MapViewOptions::validate`].

use crate::{
    camera::position::CameraPosition,
    core::{
        constants::{
            DEFAULT_ANIMATION_DURATION, DEFAULT_FRAMES_PER_SECOND, DEFAULT_INDOOR_FOCUS_RADIUS,
            DEFAULT_MAX_ZOOM, DEFAULT_PICK_TOLERANCE, DEFAULT_ROTATE_FRICTION, DEFAULT_SCROLL_FRICTION,
            DEFAULT_ZOOM_FRICTION, MAX_ZOOM, MIN_ZOOM,
        },
        geo::LatLngBounds,
    },
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base map style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    #[default]
    Basic,
    Navi,
    Satellite,
    Hybrid,
    Terrain,
}

impl MapType {
    /// Whether a night variant of this style exists
    pub fn supports_night_mode(&self) -> bool {
        matches!(self, MapType::Navi)
    }
}

/// Gesture enable flags and inertia frictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureOptions {
    pub scroll_enabled: bool,
    pub zoom_enabled: bool,
    pub tilt_enabled: bool,
    pub rotate_enabled: bool,
    /// A touch during a camera animation stops it
    pub stop_enabled: bool,
    /// Fraction of inertial velocity lost per 1/60 s frame, in [0, 1]
    pub scroll_friction: f64,
    pub zoom_friction: f64,
    pub rotate_friction: f64,
}

impl Default for GestureOptions {
    fn default() -> Self {
        Self {
            scroll_enabled: true,
            zoom_enabled: true,
            tilt_enabled: true,
            rotate_enabled: true,
            stop_enabled: true,
            scroll_friction: DEFAULT_SCROLL_FRICTION,
            zoom_friction: DEFAULT_ZOOM_FRICTION,
            rotate_friction: DEFAULT_ROTATE_FRICTION,
        }
    }
}

impl GestureOptions {
    /// Every gesture off
    pub fn disabled() -> Self {
        Self {
            scroll_enabled: false,
            zoom_enabled: false,
            tilt_enabled: false,
            rotate_enabled: false,
            stop_enabled: false,
            ..Self::default()
        }
    }

    pub fn sanitized(&self) -> Self {
        Self {
            scroll_friction: clamp_unit(self.scroll_friction, DEFAULT_SCROLL_FRICTION),
            zoom_friction: clamp_unit(self.zoom_friction, DEFAULT_ZOOM_FRICTION),
            rotate_friction: clamp_unit(self.rotate_friction, DEFAULT_ROTATE_FRICTION),
            ..*self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewOptions {
    pub map_type: MapType,
    pub lite_mode_enabled: bool,
    /// Effective only for map types with a night style
    pub night_mode_enabled: bool,
    /// Map brightness, -1 (darkest) to 1 (brightest)
    pub lightness: f64,
    /// Building extrusion scale, 0 (flat) to 1
    pub building_height: f64,
    /// Symbol size multiplier, 0 to 2
    pub symbol_scale: f64,
    /// How much symbols shrink with distance under tilt, 0 to 1
    pub symbol_perspective_ratio: f64,
    /// `None` follows the system locale
    pub locale: Option<String>,
    /// Show indoor floors when zoomed in over a building that has them
    pub indoor_map_enabled: bool,
    /// Points the camera may drift from a focused indoor area before the
    /// focus is released
    pub indoor_focus_radius: f64,
    pub preferred_frames_per_second: f64,
    /// Default camera animation duration in seconds
    pub animation_duration: f64,
    pub gestures: GestureOptions,
    /// Radius in points used when a tap picks
    pub pick_tolerance: u32,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub extent: Option<LatLngBounds>,
    /// Layer group states overriding the defaults
    pub layer_groups: BTreeMap<String, bool>,
    pub camera: CameraPosition,
}

impl Default for MapViewOptions {
    fn default() -> Self {
        Self {
            map_type: MapType::Basic,
            lite_mode_enabled: false,
            night_mode_enabled: false,
            lightness: 0.0,
            building_height: 1.0,
            symbol_scale: 1.0,
            symbol_perspective_ratio: 1.0,
            locale: None,
            indoor_map_enabled: false,
            indoor_focus_radius: DEFAULT_INDOOR_FOCUS_RADIUS,
            preferred_frames_per_second: DEFAULT_FRAMES_PER_SECOND,
            animation_duration: DEFAULT_ANIMATION_DURATION,
            gestures: GestureOptions::default(),
            pick_tolerance: DEFAULT_PICK_TOLERANCE,
            min_zoom: MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            extent: None,
            layer_groups: BTreeMap::new(),
            camera: CameraPosition::default(),
        }
    }
}

impl MapViewOptions {
    /// Reports structural misconfiguration
    pub fn validate(&self) -> Result<()> {
        if !self.min_zoom.is_finite()
            || !self.max_zoom.is_finite()
            || self.min_zoom < MIN_ZOOM
            || self.max_zoom > MAX_ZOOM
            || self.min_zoom > self.max_zoom
        {
            return Err(MapError::InvalidZoom(format!(
                "zoom bounds [{}, {}] must satisfy {} <= min <= max <= {}",
                self.min_zoom, self.max_zoom, MIN_ZOOM, MAX_ZOOM
            )));
        }
        if let Some(extent) = &self.extent {
            if extent.is_empty() || !extent.south_west.is_valid() || !extent.north_east.is_valid() {
                return Err(MapError::InvalidConfig(format!(
                    "extent {:?} is empty or out of range",
                    extent
                )));
            }
        }
        if !(self.preferred_frames_per_second.is_finite() && self.preferred_frames_per_second > 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "preferred frames per second must be positive, got {}",
                self.preferred_frames_per_second
            )));
        }
        if !(self.animation_duration.is_finite() && self.animation_duration >= 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "animation duration must be non-negative, got {}",
                self.animation_duration
            )));
        }
        if !self.camera.target.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "initial camera target {:?} is not a valid coordinate",
                self.camera.target
            )));
        }
        Ok(())
    }

    /// Copy with every scalar styling value clamped into its range
    pub fn sanitized(&self) -> Self {
        Self {
            lightness: clamp_or(self.lightness, -1.0, 1.0, 0.0),
            building_height: clamp_or(self.building_height, 0.0, 1.0, 1.0),
            symbol_scale: clamp_or(self.symbol_scale, 0.0, 2.0, 1.0),
            symbol_perspective_ratio: clamp_unit(self.symbol_perspective_ratio, 1.0),
            indoor_focus_radius: if self.indoor_focus_radius.is_finite() {
                self.indoor_focus_radius.max(0.0)
            } else {
                DEFAULT_INDOOR_FOCUS_RADIUS
            },
            gestures: self.gestures.sanitized(),
            ..self.clone()
        }
    }

    /// Parses options from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: MapViewOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options.sanitized())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Lightweight static map: no symbol picking, styling or layer groups
    pub fn lite() -> Self {
        Self {
            lite_mode_enabled: true,
            gestures: GestureOptions {
                rotate_enabled: false,
                tilt_enabled: false,
                ..GestureOptions::default()
            },
            ..Self::default()
        }
    }

    /// Turn-by-turn style: navi map type with night mode and traffic on
    pub fn navigation() -> Self {
        let mut layer_groups = BTreeMap::new();
        layer_groups.insert(crate::layers::groups::LAYER_GROUP_TRAFFIC.to_string(), true);
        Self {
            map_type: MapType::Navi,
            night_mode_enabled: true,
            symbol_perspective_ratio: 0.5,
            layer_groups,
            ..Self::default()
        }
    }
}

/// Named option presets
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MapViewProfile {
    #[default]
    Standard,
    Lite,
    Navigation,
    Custom(MapViewOptions),
}

impl MapViewProfile {
    pub fn resolve(&self) -> MapViewOptions {
        match self {
            Self::Standard => MapViewOptions::default(),
            Self::Lite => MapViewOptions::lite(),
            Self::Navigation => MapViewOptions::navigation(),
            Self::Custom(options) => options.clone(),
        }
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

fn clamp_unit(value: f64, fallback: f64) -> f64 {
    clamp_or(value, 0.0, 1.0, fallback)
}
