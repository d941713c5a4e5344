//! Developer-added overlays: markers, polylines, polygons and circles.
//!
//! Shapes test taps in two steps: a tap inside the filled area (checked on
//! the ground, so partly off-screen shapes still work) hits at distance zero;
//! otherwise the distance to the projected outline decides.

use crate::{
    core::{
        bounds::Bounds,
        constants::{MARKER_GLOBAL_Z_INDEX, MARKER_ICON_SIZE, SHAPE_GLOBAL_Z_INDEX},
        geo::{LatLng, Point},
        projection::Projection,
    },
    layers::base::{PickContext, Pickable, PickableKind, PickableProperties},
    MapError, Result,
};
use geo::{Contains, EuclideanDistance};
use geo_types::{Coord, LineString, Polygon};

/// Vertices of the polygon approximating a circle
const CIRCLE_SEGMENTS: usize = 64;

pub const DEFAULT_POLYLINE_WIDTH: f64 = 5.0;
pub const DEFAULT_OUTLINE_WIDTH: f64 = 0.0;

pub struct Marker {
    properties: PickableProperties,
    position: LatLng,
    width: f64,
    height: f64,
    /// Icon point placed on `position`, as a fraction of the icon size
    anchor: Point,
    caption: Option<String>,
}

impl Marker {
    pub fn new(id: impl Into<String>, position: LatLng) -> Self {
        Self {
            properties: PickableProperties::new(id, PickableKind::Marker, MARKER_GLOBAL_Z_INDEX),
            position,
            width: MARKER_ICON_SIZE.0,
            height: MARKER_ICON_SIZE.1,
            anchor: Point::new(0.5, 1.0),
            caption: None,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self
    }

    pub fn with_anchor(mut self, anchor: Point) -> Self {
        self.anchor = Point::new(anchor.x.clamp(0.0, 1.0), anchor.y.clamp(0.0, 1.0));
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn set_position(&mut self, position: LatLng) {
        self.position = position;
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Screen rectangle of the icon
    pub fn icon_bounds(&self, projection: &Projection) -> Option<Bounds> {
        let anchor = projection.to_screen_location(&self.position)?;
        let left = anchor.x - self.anchor.x * self.width;
        let top = anchor.y - self.anchor.y * self.height;
        Some(Bounds::from_coords(left, top, left + self.width, top + self.height))
    }
}

impl Pickable for Marker {
    crate::impl_pickable!(properties);

    fn world_bounds(&self) -> Option<Bounds> {
        let world = self.position.to_world();
        Some(Bounds::new(world, world))
    }

    fn screen_extent(&self) -> f64 {
        self.width.hypot(self.height)
    }

    fn hit_distance(&self, context: &PickContext<'_>, point: &Point) -> Option<f64> {
        let icon = self.icon_bounds(context.projection)?;
        Some(geo_point(point).euclidean_distance(&icon.to_polygon()))
    }
}

pub struct Polyline {
    properties: PickableProperties,
    coords: Vec<LatLng>,
    width: f64,
}

impl Polyline {
    /// A polyline needs at least two valid coordinates
    pub fn new(id: impl Into<String>, coords: Vec<LatLng>) -> Result<Self> {
        let id = id.into();
        validate_coords(&id, &coords, 2)?;
        Ok(Self {
            properties: PickableProperties::new(id, PickableKind::Polyline, SHAPE_GLOBAL_Z_INDEX),
            coords,
            width: DEFAULT_POLYLINE_WIDTH,
        })
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width.max(0.0);
        self
    }

    pub fn coords(&self) -> &[LatLng] {
        &self.coords
    }

    pub fn width(&self) -> f64 {
        self.width
    }
}

impl Pickable for Polyline {
    crate::impl_pickable!(properties);

    fn world_bounds(&self) -> Option<Bounds> {
        world_bounds(&self.coords)
    }

    fn screen_extent(&self) -> f64 {
        self.width / 2.0
    }

    fn hit_distance(&self, context: &PickContext<'_>, point: &Point) -> Option<f64> {
        let runs = screen_runs(context.projection, &self.coords, false);
        distance_to_runs(point, &runs).map(|distance| (distance - self.width / 2.0).max(0.0))
    }
}

pub struct PolygonOverlay {
    properties: PickableProperties,
    exterior: Vec<LatLng>,
    holes: Vec<Vec<LatLng>>,
    outline_width: f64,
}

impl PolygonOverlay {
    /// A polygon needs at least three valid coordinates per ring
    pub fn new(id: impl Into<String>, exterior: Vec<LatLng>) -> Result<Self> {
        let id = id.into();
        validate_coords(&id, &exterior, 3)?;
        Ok(Self {
            properties: PickableProperties::new(id, PickableKind::Polygon, SHAPE_GLOBAL_Z_INDEX),
            exterior,
            holes: Vec::new(),
            outline_width: DEFAULT_OUTLINE_WIDTH,
        })
    }

    pub fn with_holes(mut self, holes: Vec<Vec<LatLng>>) -> Result<Self> {
        for hole in &holes {
            validate_coords(&self.properties.id, hole, 3)?;
        }
        self.holes = holes;
        Ok(self)
    }

    pub fn with_outline_width(mut self, width: f64) -> Self {
        self.outline_width = width.max(0.0);
        self
    }

    pub fn exterior(&self) -> &[LatLng] {
        &self.exterior
    }

    pub fn holes(&self) -> &[Vec<LatLng>] {
        &self.holes
    }
}

impl Pickable for PolygonOverlay {
    crate::impl_pickable!(properties);

    fn world_bounds(&self) -> Option<Bounds> {
        world_bounds(&self.exterior)
    }

    fn screen_extent(&self) -> f64 {
        self.outline_width / 2.0
    }

    fn hit_distance(&self, context: &PickContext<'_>, point: &Point) -> Option<f64> {
        let polygon = world_polygon(&self.exterior, &self.holes);
        if ground_contains(context.projection, &polygon, point) {
            return Some(0.0);
        }

        let mut runs = screen_runs(context.projection, &self.exterior, true);
        for hole in &self.holes {
            runs.extend(screen_runs(context.projection, hole, true));
        }
        distance_to_runs(point, &runs).map(|distance| (distance - self.outline_width / 2.0).max(0.0))
    }
}

pub struct Circle {
    properties: PickableProperties,
    center: LatLng,
    /// Radius in meters
    radius: f64,
    outline_width: f64,
}

impl Circle {
    pub fn new(id: impl Into<String>, center: LatLng, radius: f64) -> Result<Self> {
        let id = id.into();
        validate_coords(&id, &[center], 1)?;
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(MapError::InvalidCoordinates(format!(
                "circle {} has an invalid radius {}",
                id, radius
            )));
        }
        Ok(Self {
            properties: PickableProperties::new(id, PickableKind::Circle, SHAPE_GLOBAL_Z_INDEX),
            center,
            radius,
            outline_width: DEFAULT_OUTLINE_WIDTH,
        })
    }

    pub fn with_outline_width(mut self, width: f64) -> Self {
        self.outline_width = width.max(0.0);
        self
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Polygon approximating the circle on the ground
    pub fn ring(&self) -> Vec<LatLng> {
        (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let bearing = 360.0 * i as f64 / CIRCLE_SEGMENTS as f64;
                self.center.offset(self.radius, bearing)
            })
            .collect()
    }
}

impl Pickable for Circle {
    crate::impl_pickable!(properties);

    fn world_bounds(&self) -> Option<Bounds> {
        world_bounds(&self.ring())
    }

    fn screen_extent(&self) -> f64 {
        self.outline_width / 2.0
    }

    fn hit_distance(&self, context: &PickContext<'_>, point: &Point) -> Option<f64> {
        let ring = self.ring();
        let polygon = world_polygon(&ring, &[]);
        if ground_contains(context.projection, &polygon, point) {
            return Some(0.0);
        }
        let runs = screen_runs(context.projection, &ring, true);
        distance_to_runs(point, &runs).map(|distance| (distance - self.outline_width / 2.0).max(0.0))
    }
}

fn validate_coords(id: &str, coords: &[LatLng], min_len: usize) -> Result<()> {
    if coords.len() < min_len {
        return Err(MapError::InvalidCoordinates(format!(
            "{} needs at least {} coordinates, got {}",
            id,
            min_len,
            coords.len()
        )));
    }
    if let Some(bad) = coords.iter().find(|coord| !coord.is_valid()) {
        return Err(MapError::InvalidCoordinates(format!(
            "{} contains an invalid coordinate {:?}",
            id, bad
        )));
    }
    Ok(())
}

pub(crate) fn geo_point(point: &Point) -> geo_types::Point<f64> {
    geo_types::Point::new(point.x, point.y)
}

/// World coordinates of a path, with x kept continuous across the antimeridian
fn world_path(coords: &[LatLng]) -> Vec<Point> {
    let mut path: Vec<Point> = Vec::with_capacity(coords.len());
    for coord in coords {
        let mut world = coord.to_world();
        if let Some(previous) = path.last() {
            let dx = world.x - previous.x;
            world.x -= dx.round();
        }
        path.push(world);
    }
    path
}

fn world_bounds(coords: &[LatLng]) -> Option<Bounds> {
    Bounds::from_points(&world_path(coords))
}

fn world_polygon(exterior: &[LatLng], holes: &[Vec<LatLng>]) -> Polygon<f64> {
    let ring = |coords: &[LatLng]| -> LineString<f64> {
        world_path(coords)
            .into_iter()
            .map(|world| Coord { x: world.x, y: world.y })
            .collect::<Vec<_>>()
            .into()
    };
    Polygon::new(ring(exterior), holes.iter().map(|hole| ring(hole)).collect())
}

/// Whether the ground under a screen point lies inside a world polygon,
/// trying the neighbouring world copies too
fn ground_contains(projection: &Projection, polygon: &Polygon<f64>, point: &Point) -> bool {
    let Some(world) = projection.screen_to_world(point) else {
        return false;
    };
    let wrapped = world.x - world.x.floor();
    [wrapped, wrapped - 1.0, wrapped + 1.0]
        .iter()
        .any(|x| polygon.contains(&geo_types::Point::new(*x, world.y)))
}

/// Projects a path to the screen, splitting it wherever a vertex is behind
/// the camera
fn screen_runs(projection: &Projection, coords: &[LatLng], closed: bool) -> Vec<LineString<f64>> {
    let mut vertices: Vec<Option<Point>> = coords
        .iter()
        .map(|coord| projection.to_screen_location(coord))
        .collect();
    if closed {
        if let Some(first) = vertices.first().copied() {
            vertices.push(first);
        }
    }

    let mut runs = Vec::new();
    let mut current: Vec<Coord<f64>> = Vec::new();
    for vertex in vertices {
        match vertex {
            Some(p) => current.push(Coord { x: p.x, y: p.y }),
            None => {
                if !current.is_empty() {
                    runs.push(LineString::from(std::mem::take(&mut current)));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(LineString::from(current));
    }
    runs
}

fn distance_to_runs(point: &Point, runs: &[LineString<f64>]) -> Option<f64> {
    let target = geo_point(point);
    runs.iter()
        .map(|run| match run.0.as_slice() {
            [single] => point.distance_to(&Point::new(single.x, single.y)),
            _ => target.euclidean_distance(run),
        })
        .reduce(f64::min)
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

    fn context(projection: &Projection) -> PickContext<'_> {
        PickContext {
            projection,
            symbol_scale: 1.0,
        }
    }

    #[test]
    fn test_marker_icon_sits_above_anchor() {
        let projection = projection();
        let marker = Marker::new("m", projection.camera().target);
        let icon = marker.icon_bounds(&projection).unwrap();

        assert!((icon.max.y - 400.0).abs() < 1e-6);
        assert!((icon.width() - 25.0).abs() < 1e-9);

        let ctx = context(&projection);
        assert_eq!(marker.hit_distance(&ctx, &Point::new(200.0, 380.0)), Some(0.0));
        let below = marker.hit_distance(&ctx, &Point::new(200.0, 405.0)).unwrap();
        assert!((below - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_polyline_stroke_width() {
        let projection = projection();
        let west = projection.from_screen_location(&Point::new(100.0, 400.0)).unwrap();
        let east = projection.from_screen_location(&Point::new(300.0, 400.0)).unwrap();
        let line = Polyline::new("l", vec![west, east]).unwrap().with_width(10.0);
        let ctx = context(&projection);

        let on_edge = line.hit_distance(&ctx, &Point::new(200.0, 404.0)).unwrap();
        assert!(on_edge < 1e-6);
        let off = line.hit_distance(&ctx, &Point::new(200.0, 420.0)).unwrap();
        assert!((off - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_polygon_interior_and_hole() {
        let projection = projection();
        let at = |x: f64, y: f64| projection.from_screen_location(&Point::new(x, y)).unwrap();
        let polygon = PolygonOverlay::new(
            "p",
            vec![at(100.0, 300.0), at(300.0, 300.0), at(300.0, 500.0), at(100.0, 500.0)],
        )
        .unwrap()
        .with_holes(vec![vec![
            at(180.0, 380.0),
            at(220.0, 380.0),
            at(220.0, 420.0),
            at(180.0, 420.0),
        ]])
        .unwrap();
        let ctx = context(&projection);

        assert_eq!(polygon.hit_distance(&ctx, &Point::new(120.0, 320.0)), Some(0.0));
        let in_hole = polygon.hit_distance(&ctx, &Point::new(200.0, 400.0)).unwrap();
        assert!((in_hole - 20.0).abs() < 1e-3);
        let outside = polygon.hit_distance(&ctx, &Point::new(50.0, 400.0)).unwrap();
        assert!((outside - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_circle_radius_in_meters() {
        let projection = projection();
        let meters = projection.meters_per_pixel() * 50.0;
        let circle = Circle::new("c", projection.camera().target, meters).unwrap();
        let ctx = context(&projection);

        assert_eq!(circle.hit_distance(&ctx, &Point::new(230.0, 400.0)), Some(0.0));
        let outside = circle.hit_distance(&ctx, &Point::new(270.0, 400.0)).unwrap();
        assert!((outside - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_invalid_geometry_is_rejected() {
        assert!(Polyline::new("l", vec![LatLng::new(0.0, 0.0)]).is_err());
        assert!(PolygonOverlay::new("p", vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)]).is_err());
        assert!(Circle::new("c", LatLng::new(0.0, 0.0), -1.0).is_err());
        assert!(Circle::new("c", LatLng::new(f64::NAN, 0.0), 10.0).is_err());
    }
}
