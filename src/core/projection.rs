//! Screen <-> geographic mapping for a camera and a view size.
//!
//! The world is a Web Mercator square `TILE_SIZE * 2^zoom` points wide. The
//! camera is a pinhole looking at the ground plane: with zero tilt one point on
//! screen is one world point; tilting pitches the camera around the screen
//! center so that the top of the view recedes toward the horizon. Bearing
//! rotates the ground clockwise around the screen center.

use crate::{
    camera::position::CameraPosition,
    core::{
        constants::{EARTH_RADIUS, FOCAL_LENGTH_RATIO, TILE_SIZE},
        geo::{LatLng, LatLngBounds, Point},
    },
};
use geo_types::{LineString, Polygon};
use std::f64::consts::PI;

/// Smallest depth (as a fraction of the focal length) a visible ground point may have.
const MIN_DEPTH_RATIO: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    camera: CameraPosition,
    size: Point,
    world_size: f64,
    center_world: Point,
    focal: f64,
}

impl Projection {
    pub fn new(camera: CameraPosition, size: Point) -> Self {
        let size = Point::new(size.x.max(0.0), size.y.max(0.0));
        Self {
            world_size: TILE_SIZE * 2_f64.powf(camera.zoom),
            center_world: camera.target.to_world(),
            focal: size.y.max(1.0) * FOCAL_LENGTH_RATIO,
            camera,
            size,
        }
    }

    pub fn camera(&self) -> &CameraPosition {
        &self.camera
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn screen_center(&self) -> Point {
        Point::new(self.size.x / 2.0, self.size.y / 2.0)
    }

    /// Width of the whole world in points at the camera zoom
    pub fn world_size(&self) -> f64 {
        self.world_size
    }

    /// Normalized world position of the camera target
    pub fn center_world(&self) -> Point {
        self.center_world
    }

    /// Maps a screen point to normalized world coordinates. The x coordinate is
    /// not wrapped, so points left of the antimeridian come out negative.
    /// Returns `None` for points at or above the horizon.
    pub fn screen_to_world(&self, point: &Point) -> Option<Point> {
        let center = self.screen_center();
        let u = point.x - center.x;
        let v = point.y - center.y;
        let (sin_t, cos_t) = self.camera.tilt.to_radians().sin_cos();

        let denominator = self.focal * cos_t + v * sin_t;
        if denominator <= self.focal * MIN_DEPTH_RATIO * 0.5 {
            return None;
        }

        let scale = self.focal * cos_t / denominator;
        let ground = Point::new(
            scale * u,
            self.focal * sin_t + scale * (v * cos_t - self.focal * sin_t),
        );
        let offset = ground.rotate(self.camera.bearing);

        Some(self.center_world.add(&offset.multiply(1.0 / self.world_size)))
    }

    /// Maps normalized world coordinates to the screen, using whichever copy of
    /// the world lies closest to the camera. Returns `None` behind the camera.
    pub fn world_to_screen(&self, world: &Point) -> Option<Point> {
        let mut dx = world.x - self.center_world.x;
        dx -= dx.round();
        let offset = Point::new(dx, world.y - self.center_world.y).multiply(self.world_size);
        let ground = offset.rotate(-self.camera.bearing);
        let (sin_t, cos_t) = self.camera.tilt.to_radians().sin_cos();

        let depth = self.focal - ground.y * sin_t;
        if depth <= self.focal * MIN_DEPTH_RATIO * 0.5 {
            return None;
        }

        let center = self.screen_center();
        Some(Point::new(
            center.x + self.focal * ground.x / depth,
            center.y + self.focal * ground.y * cos_t / depth,
        ))
    }

    /// Geographic coordinate under a screen point, or `None` above the horizon
    pub fn from_screen_location(&self, point: &Point) -> Option<LatLng> {
        self.screen_to_world(point)
            .map(|world| LatLng::from_world(world).normalized())
    }

    /// Screen point of a geographic coordinate, or `None` behind the camera
    pub fn to_screen_location(&self, lat_lng: &LatLng) -> Option<Point> {
        self.world_to_screen(&lat_lng.to_world())
    }

    /// Ground resolution at the camera target
    pub fn meters_per_pixel(&self) -> f64 {
        Self::meters_per_pixel_at(self.camera.target.lat, self.camera.zoom)
    }

    /// Ground resolution at a latitude and zoom, ignoring tilt
    pub fn meters_per_pixel_at(lat: f64, zoom: f64) -> f64 {
        let circumference = 2.0 * PI * EARTH_RADIUS;
        circumference * LatLng::clamp_lat(lat).to_radians().cos() / (TILE_SIZE * 2_f64.powf(zoom))
    }

    /// The four corners of the visible ground in normalized, unwrapped world
    /// coordinates, clockwise from the top-left. When the camera is tilted far
    /// enough for the top edge to reach the horizon, the top edge is lowered.
    pub fn content_region_world(&self) -> Vec<Point> {
        let center = self.screen_center();
        let (sin_t, cos_t) = self.camera.tilt.to_radians().sin_cos();

        let mut top = 0.0;
        if sin_t > f64::EPSILON {
            let horizon_v = (self.focal * MIN_DEPTH_RATIO - self.focal * cos_t) / sin_t;
            top = (center.y + horizon_v).max(0.0);
        }

        let corners = [
            Point::new(0.0, top),
            Point::new(self.size.x, top),
            Point::new(self.size.x, self.size.y),
            Point::new(0.0, self.size.y),
        ];

        corners
            .iter()
            .map(|corner| {
                self.screen_to_world(corner)
                    .unwrap_or(self.center_world)
            })
            .collect()
    }

    /// Polygon of the visible ground in (lng, lat) order. Longitudes are not
    /// wrapped so that the ring stays continuous across the antimeridian.
    pub fn content_region(&self) -> Polygon<f64> {
        let ring: Vec<(f64, f64)> = self
            .content_region_world()
            .into_iter()
            .map(|world| {
                let lat_lng = LatLng::from_world(world);
                (lat_lng.lng, lat_lng.lat)
            })
            .collect();
        Polygon::new(LineString::from(ring), vec![])
    }

    /// Bounding box of [`Projection::content_region`]
    pub fn content_bounds(&self) -> LatLngBounds {
        let corners: Vec<LatLng> = self
            .content_region_world()
            .into_iter()
            .map(LatLng::from_world)
            .collect();
        LatLngBounds::from_points(&corners)
            .unwrap_or_else(|| LatLngBounds::new(self.camera.target, self.camera.target))
    }
}
