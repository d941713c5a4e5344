//! Fluent construction of a [`MapView`]
//!
//! Starts from a profile's options and overrides individual fields before
//! validating everything once in [`MapViewBuilder::build`].

use crate::{
    camera::position::CameraPosition,
    core::{
        config::{GestureOptions, MapType, MapViewOptions, MapViewProfile},
        geo::{LatLng, LatLngBounds, Point},
        map::MapView,
    },
    layers::base::Pickable,
    pick::PickEngine,
    Result,
};

/// Builder for creating and configuring MapView instances
pub struct MapViewBuilder {
    options: MapViewOptions,
    size: Point,
    /// Pickables added right after construction
    pickables: PickEngine,
}

impl MapViewBuilder {
    pub fn new() -> Self {
        Self::from_profile(MapViewProfile::Standard)
    }

    /// Start from a preset
    pub fn from_profile(profile: MapViewProfile) -> Self {
        Self {
            options: profile.resolve(),
            size: Point::new(0.0, 0.0),
            pickables: PickEngine::new(),
        }
    }

    /// Start from options loaded from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::from_profile(MapViewProfile::Custom(
            MapViewOptions::from_json_str(json)?,
        )))
    }

    /// View size in points
    pub fn with_size(mut self, size: Point) -> Self {
        self.size = size;
        self
    }

    pub fn with_center_and_zoom(mut self, center: LatLng, zoom: f64) -> Self {
        self.options.camera.target = center;
        self.options.camera.zoom = zoom;
        self
    }

    pub fn with_camera(mut self, camera: CameraPosition) -> Self {
        self.options.camera = camera;
        self
    }

    pub fn with_map_type(mut self, map_type: MapType) -> Self {
        self.options.map_type = map_type;
        self
    }

    pub fn with_zoom_limits(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.options.min_zoom = min_zoom;
        self.options.max_zoom = max_zoom;
        self
    }

    pub fn with_extent(mut self, extent: LatLngBounds) -> Self {
        self.options.extent = Some(extent);
        self
    }

    pub fn with_gestures(mut self, gestures: GestureOptions) -> Self {
        self.options.gestures = gestures;
        self
    }

    /// Default camera animation duration in seconds
    pub fn with_animation_duration(mut self, seconds: f64) -> Self {
        self.options.animation_duration = seconds;
        self
    }

    pub fn with_frame_rate(mut self, frames_per_second: f64) -> Self {
        self.options.preferred_frames_per_second = frames_per_second;
        self
    }

    pub fn with_pick_tolerance(mut self, tolerance: u32) -> Self {
        self.options.pick_tolerance = tolerance;
        self
    }

    pub fn with_layer_group(mut self, name: &str, enabled: bool) -> Self {
        self.options.layer_groups.insert(name.to_string(), enabled);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.options.locale = Some(locale.into());
        self
    }

    /// Indoor maps with the focus radius in points
    pub fn with_indoor_map(mut self, enabled: bool, focus_radius: f64) -> Self {
        self.options.indoor_map_enabled = enabled;
        self.options.indoor_focus_radius = focus_radius;
        self
    }

    pub fn with_lite_mode(mut self, enabled: bool) -> Self {
        self.options.lite_mode_enabled = enabled;
        self
    }

    /// Registers a pickable; geometry errors surface from `add` immediately
    pub fn with_pickable<P: Pickable + 'static>(mut self, pickable: P) -> Result<Self> {
        self.pickables.add(pickable)?;
        Ok(self)
    }

    /// Build the map view with the configured options
    pub fn build(self) -> Result<MapView> {
        let mut view = MapView::new(self.options, self.size)?;
        *view.pickables_mut() = self.pickables;
        Ok(view)
    }
}

impl Default for MapViewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience constructors for common setups
impl MapViewBuilder {
    /// Interactive map with every gesture on
    pub fn interactive(center: LatLng, zoom: f64, size: Point) -> Self {
        Self::new().with_center_and_zoom(center, zoom).with_size(size)
    }

    /// Static thumbnail: lite mode with no gestures
    pub fn thumbnail(center: LatLng, zoom: f64, size: Point) -> Self {
        Self::from_profile(MapViewProfile::Lite)
            .with_center_and_zoom(center, zoom)
            .with_size(size)
            .with_gestures(GestureOptions::disabled())
    }

    /// Navigation view tilted toward the horizon
    pub fn navigation(center: LatLng, size: Point) -> Self {
        Self::from_profile(MapViewProfile::Navigation)
            .with_size(size)
            .with_camera(CameraPosition::new(center, 17.0).with_tilt(45.0))
    }
}
