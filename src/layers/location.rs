//! The map's own location overlay: the user's position with a heading icon
//! and an accuracy circle. Every map view has exactly one, owned by its pick
//! engine under [`LOCATION_OVERLAY_ID`]; it starts hidden.

use crate::{
    core::{
        bounds::Bounds,
        constants::{
            LOCATION_CIRCLE_RADIUS, LOCATION_ICON_SIZE, LOCATION_OVERLAY_GLOBAL_Z_INDEX,
            LOCATION_OVERLAY_ID,
        },
        geo::{LatLng, Point},
        projection::Projection,
    },
    layers::{
        base::{PickContext, Pickable, PickableKind, PickableProperties},
        overlay::geo_point,
    },
};
use geo::EuclideanDistance;

pub struct LocationOverlay {
    properties: PickableProperties,
    position: LatLng,
    /// Heading of the icon in degrees clockwise from north
    bearing: f64,
    icon_width: f64,
    icon_height: f64,
    /// Accuracy circle radius in points
    circle_radius: f64,
}

impl LocationOverlay {
    pub(crate) fn new() -> Self {
        let mut properties = PickableProperties::new(
            LOCATION_OVERLAY_ID,
            PickableKind::LocationOverlay,
            LOCATION_OVERLAY_GLOBAL_Z_INDEX,
        );
        properties.visible = false;
        Self {
            properties,
            position: LatLng::new(0.0, 0.0),
            bearing: 0.0,
            icon_width: LOCATION_ICON_SIZE.0,
            icon_height: LOCATION_ICON_SIZE.1,
            circle_radius: LOCATION_CIRCLE_RADIUS,
        }
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    /// Invalid coordinates are ignored
    pub fn set_position(&mut self, position: LatLng) {
        if position.is_valid() {
            self.position = position.normalized();
        } else {
            log::warn!("ignoring invalid location {:?}", position);
        }
    }

    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    pub fn set_bearing(&mut self, bearing: f64) {
        if bearing.is_finite() {
            self.bearing = bearing.rem_euclid(360.0);
        }
    }

    pub fn icon_size(&self) -> (f64, f64) {
        (self.icon_width, self.icon_height)
    }

    pub fn set_icon_size(&mut self, width: f64, height: f64) {
        self.icon_width = width.max(0.0);
        self.icon_height = height.max(0.0);
    }

    pub fn circle_radius(&self) -> f64 {
        self.circle_radius
    }

    pub fn set_circle_radius(&mut self, radius: f64) {
        if radius.is_finite() {
            self.circle_radius = radius.max(0.0);
        }
    }

    /// Screen rectangle of the icon, centered on the position
    pub fn icon_bounds(&self, projection: &Projection) -> Option<Bounds> {
        let center = projection.to_screen_location(&self.position)?;
        Some(Bounds::from_center_and_size(center, self.icon_width, self.icon_height))
    }
}

impl Pickable for LocationOverlay {
    crate::impl_pickable!(properties);

    fn world_bounds(&self) -> Option<Bounds> {
        let world = self.position.to_world();
        Some(Bounds::new(world, world))
    }

    fn screen_extent(&self) -> f64 {
        self.circle_radius.max(self.icon_width.hypot(self.icon_height) / 2.0)
    }

    fn hit_distance(&self, context: &PickContext<'_>, point: &Point) -> Option<f64> {
        let center = context.projection.to_screen_location(&self.position)?;
        let circle = (point.distance_to(&center) - self.circle_radius).max(0.0);
        let icon = Bounds::from_center_and_size(center, self.icon_width, self.icon_height);
        let icon = geo_point(point).euclidean_distance(&icon.to_polygon());
        Some(circle.min(icon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::position::CameraPosition;

    fn projection() -> Projection {
        Projection::new(
            CameraPosition::new(LatLng::new(37.5666, 126.9784), 16.0),
            Point::new(400.0, 800.0),
        )
    }

    #[test]
    fn test_starts_hidden_under_reserved_id() {
        let overlay = LocationOverlay::new();
        assert_eq!(overlay.id(), LOCATION_OVERLAY_ID);
        assert_eq!(overlay.kind(), PickableKind::LocationOverlay);
        assert!(!overlay.is_visible());
        assert!(overlay.global_z_index() > crate::core::constants::MARKER_GLOBAL_Z_INDEX);
    }

    #[test]
    fn test_footprint_is_circle_or_icon() {
        let projection = projection();
        let context = PickContext {
            projection: &projection,
            symbol_scale: 1.0,
        };
        let mut overlay = LocationOverlay::new();
        overlay.set_position(projection.camera().target);

        assert_eq!(overlay.hit_distance(&context, &Point::new(210.0, 400.0)), Some(0.0));
        let outside = overlay.hit_distance(&context, &Point::new(230.0, 400.0)).unwrap();
        assert!((outside - 12.0).abs() < 1e-6);

        overlay.set_circle_radius(0.0);
        let icon_only = overlay.hit_distance(&context, &Point::new(230.0, 400.0)).unwrap();
        assert!((icon_only - 19.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut overlay = LocationOverlay::new();
        overlay.set_position(LatLng::new(f64::NAN, 10.0));
        assert_eq!(overlay.position(), LatLng::new(0.0, 0.0));
        overlay.set_bearing(-90.0);
        assert_eq!(overlay.bearing(), 270.0);
        overlay.set_circle_radius(-4.0);
        assert_eq!(overlay.circle_radius(), 0.0);
    }
}
