//! Camera update commands: what should change and how the change is animated.

use crate::{
    animation::interpolation::EasingFunction,
    camera::position::CameraPosition,
    core::{
        constants::{MAX_ZOOM, TILE_SIZE},
        geo::{LatLng, LatLngBounds, Point},
        projection::Projection,
    },
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Why the camera moved. The numeric codes are stable for callers that log them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraChangeReason {
    Developer,
    Gesture,
    Control,
    Location,
}

impl CameraChangeReason {
    pub fn code(&self) -> i32 {
        match self {
            Self::Developer => 0,
            Self::Gesture => -1,
            Self::Control => -2,
            Self::Location => -3,
        }
    }
}

/// How a camera update travels to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraAnimation {
    /// Jump immediately
    None,
    Linear,
    EaseIn,
    EaseOut,
    /// Zoom out, travel, and zoom back in
    Fly,
}

impl CameraAnimation {
    pub fn easing(&self) -> EasingFunction {
        match self {
            Self::None | Self::Linear => EasingFunction::Linear,
            Self::EaseIn => EasingFunction::EaseInCubic,
            Self::EaseOut => EasingFunction::EaseOutCubic,
            Self::Fly => EasingFunction::EaseInOutCubic,
        }
    }
}

/// Individual changes that can be combined in one update. Absolute values win
/// over relative ones when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraUpdateParams {
    pub scroll_to: Option<LatLng>,
    /// Screen-space offset, in points
    pub scroll_by: Option<Point>,
    pub zoom_to: Option<f64>,
    pub zoom_by: Option<f64>,
    pub tilt_to: Option<f64>,
    pub tilt_by: Option<f64>,
    pub rotate_to: Option<f64>,
    pub rotate_by: Option<f64>,
}

impl CameraUpdateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_to(mut self, target: LatLng) -> Self {
        self.scroll_to = Some(target);
        self
    }

    pub fn scroll_by(mut self, delta: Point) -> Self {
        self.scroll_by = Some(delta);
        self
    }

    pub fn zoom_to(mut self, zoom: f64) -> Self {
        self.zoom_to = Some(zoom);
        self
    }

    pub fn zoom_by(mut self, delta: f64) -> Self {
        self.zoom_by = Some(delta);
        self
    }

    pub fn tilt_to(mut self, tilt: f64) -> Self {
        self.tilt_to = Some(tilt);
        self
    }

    pub fn tilt_by(mut self, delta: f64) -> Self {
        self.tilt_by = Some(delta);
        self
    }

    pub fn rotate_to(mut self, bearing: f64) -> Self {
        self.rotate_to = Some(bearing);
        self
    }

    pub fn rotate_by(mut self, delta: f64) -> Self {
        self.rotate_by = Some(delta);
        self
    }
}

/// What a camera update changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CameraUpdateKind {
    ScrollTo(LatLng),
    ScrollBy(Point),
    ZoomTo(f64),
    ZoomBy(f64),
    Params(CameraUpdateParams),
    Position(CameraPosition),
    /// Fit the bounds inside the view, leaving `padding` points on every side.
    /// Tilt and bearing are reset.
    FitBounds { bounds: LatLngBounds, padding: f64 },
}

pub type CancelCallback = Box<dyn FnOnce() + Send>;
pub type FinishCallback = Box<dyn FnOnce() + Send>;

/// A camera movement command
pub struct CameraUpdate {
    pub kind: CameraUpdateKind,
    pub animation: CameraAnimation,
    /// `None` uses the map's default animation duration
    pub duration: Option<Duration>,
    /// Normalized screen point (0..1 on each axis) kept fixed while zooming,
    /// tilting or rotating. `None` means the view center.
    pub pivot: Option<Point>,
    pub reason: CameraChangeReason,
    pub(crate) on_cancel: Option<CancelCallback>,
    pub(crate) on_finish: Option<FinishCallback>,
}

impl fmt::Debug for CameraUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraUpdate")
            .field("kind", &self.kind)
            .field("animation", &self.animation)
            .field("duration", &self.duration)
            .field("pivot", &self.pivot)
            .field("reason", &self.reason)
            .field("on_cancel", &self.on_cancel.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

impl CameraUpdate {
    pub fn new(kind: CameraUpdateKind) -> Self {
        Self {
            kind,
            animation: CameraAnimation::None,
            duration: None,
            pivot: None,
            reason: CameraChangeReason::Developer,
            on_cancel: None,
            on_finish: None,
        }
    }

    pub fn scroll_to(target: LatLng) -> Self {
        Self::new(CameraUpdateKind::ScrollTo(target))
    }

    pub fn scroll_by(delta: Point) -> Self {
        Self::new(CameraUpdateKind::ScrollBy(delta))
    }

    pub fn zoom_to(zoom: f64) -> Self {
        Self::new(CameraUpdateKind::ZoomTo(zoom))
    }

    pub fn zoom_by(delta: f64) -> Self {
        Self::new(CameraUpdateKind::ZoomBy(delta))
    }

    pub fn zoom_in() -> Self {
        Self::zoom_by(1.0)
    }

    pub fn zoom_out() -> Self {
        Self::zoom_by(-1.0)
    }

    pub fn with_params(params: CameraUpdateParams) -> Self {
        Self::new(CameraUpdateKind::Params(params))
    }

    pub fn with_position(position: CameraPosition) -> Self {
        Self::new(CameraUpdateKind::Position(position))
    }

    pub fn fit_bounds(bounds: LatLngBounds, padding: f64) -> Self {
        Self::new(CameraUpdateKind::FitBounds { bounds, padding })
    }

    pub fn animate(mut self, animation: CameraAnimation) -> Self {
        self.animation = animation;
        self
    }

    pub fn animate_with_duration(mut self, animation: CameraAnimation, duration: Duration) -> Self {
        self.animation = animation;
        self.duration = Some(duration);
        self
    }

    pub fn pivot(mut self, pivot: Point) -> Self {
        self.pivot = Some(pivot);
        self
    }

    pub fn reason(mut self, reason: CameraChangeReason) -> Self {
        self.reason = reason;
        self
    }

    /// Runs when this update is interrupted before reaching its target
    pub fn on_cancel<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_cancel = Some(Box::new(callback));
        self
    }

    /// Runs when this update reaches its target
    pub fn on_finish<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_finish = Some(Box::new(callback));
        self
    }

    /// Computes the unconstrained target position of this update, starting
    /// from `from` in a view of `size` points.
    pub fn resolve(&self, from: &CameraPosition, size: Point) -> CameraPosition {
        let projection = Projection::new(*from, size);

        match &self.kind {
            CameraUpdateKind::ScrollTo(target) => CameraPosition { target: *target, ..*from },
            CameraUpdateKind::ScrollBy(delta) => CameraPosition {
                target: scrolled_target(&projection, delta),
                ..*from
            },
            CameraUpdateKind::ZoomTo(zoom) => {
                let to = CameraPosition { zoom: *zoom, ..*from };
                self.keep_pivot(&projection, to)
            }
            CameraUpdateKind::ZoomBy(delta) => {
                let to = CameraPosition {
                    zoom: from.zoom + delta,
                    ..*from
                };
                self.keep_pivot(&projection, to)
            }
            CameraUpdateKind::Params(params) => self.resolve_params(&projection, params),
            CameraUpdateKind::Position(position) => *position,
            CameraUpdateKind::FitBounds { bounds, padding } => fit_bounds(bounds, *padding, size),
        }
    }

    fn resolve_params(&self, projection: &Projection, params: &CameraUpdateParams) -> CameraPosition {
        let from = projection.camera();
        let mut to = *from;

        let scrolled = if let Some(target) = params.scroll_to {
            to.target = target;
            true
        } else if let Some(delta) = params.scroll_by {
            to.target = scrolled_target(projection, &delta);
            true
        } else {
            false
        };

        if let Some(zoom) = params.zoom_to {
            to.zoom = zoom;
        } else if let Some(delta) = params.zoom_by {
            to.zoom += delta;
        }

        if let Some(tilt) = params.tilt_to {
            to.tilt = tilt;
        } else if let Some(delta) = params.tilt_by {
            to.tilt += delta;
        }

        if let Some(bearing) = params.rotate_to {
            to.bearing = bearing;
        } else if let Some(delta) = params.rotate_by {
            to.bearing += delta;
        }

        if scrolled {
            to
        } else {
            self.keep_pivot(projection, to)
        }
    }

    /// Moves the target of `to` so that the ground under the pivot stays under
    /// the pivot after the zoom, tilt and bearing change.
    fn keep_pivot(&self, projection: &Projection, to: CameraPosition) -> CameraPosition {
        let Some(pivot) = self.pivot else {
            return to;
        };
        let size = projection.size();
        let pivot_px = Point::new(pivot.x * size.x, pivot.y * size.y);
        if pivot_px.distance_to(&projection.screen_center()) < 1e-9 {
            return to;
        }

        let Some(anchor) = projection.screen_to_world(&pivot_px) else {
            return to;
        };
        let after = Projection::new(to.normalized(), size);
        let Some(moved) = after.world_to_screen(&anchor) else {
            return to;
        };

        let delta = moved.subtract(&pivot_px);
        match after.from_screen_location(&after.screen_center().add(&delta)) {
            Some(target) => CameraPosition { target, ..to },
            None => to,
        }
    }
}

fn scrolled_target(projection: &Projection, delta: &Point) -> LatLng {
    let destination = projection.screen_center().add(delta);
    projection
        .from_screen_location(&destination)
        .unwrap_or(projection.camera().target)
}

fn fit_bounds(bounds: &LatLngBounds, padding: f64, size: Point) -> CameraPosition {
    let north_west = LatLng::new(bounds.north_east.lat, bounds.south_west.lng).to_world();
    let mut south_east = LatLng::new(bounds.south_west.lat, bounds.north_east.lng).to_world();
    if south_east.x < north_west.x {
        // bounds crossing the antimeridian
        south_east.x += 1.0;
    }

    let width = (south_east.x - north_west.x) * TILE_SIZE;
    let height = (south_east.y - north_west.y) * TILE_SIZE;
    let available_width = (size.x - 2.0 * padding).max(1.0);
    let available_height = (size.y - 2.0 * padding).max(1.0);

    let zoom = if width <= 0.0 && height <= 0.0 {
        MAX_ZOOM
    } else {
        let scale_x = if width > 0.0 { available_width / width } else { f64::INFINITY };
        let scale_y = if height > 0.0 { available_height / height } else { f64::INFINITY };
        scale_x.min(scale_y).log2()
    };

    let center = north_west.midpoint(&south_east);
    CameraPosition::new(LatLng::from_world(center), zoom)
}
