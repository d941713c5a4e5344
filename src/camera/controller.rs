//! Owns the camera: applies updates immediately or through a transition,
//! enforces the zoom bounds and the extent, and settles completion callbacks.

use crate::{
    animation::transitions::{Transition, TransitionState},
    camera::{
        position::CameraPosition,
        update::{CameraAnimation, CameraChangeReason, CameraUpdate, CancelCallback, FinishCallback},
    },
    core::{
        constants::{DEFAULT_ANIMATION_DURATION, DEFAULT_MAX_ZOOM, MAX_ZOOM, MIN_ZOOM},
        geo::{LatLngBounds, Point},
        projection::Projection,
    },
    input::events::MapEvent,
    MapError, Result,
};
use std::time::Duration;

/// Completion callback of a camera move; receives `true` when the move was cancelled
pub type CompletionCallback = Box<dyn FnOnce(bool) + Send>;

/// A running transition together with the callbacks waiting on it
struct ActiveTransition {
    transition: Transition,
    on_cancel: Option<CancelCallback>,
    on_finish: Option<FinishCallback>,
    completion: Option<CompletionCallback>,
}

impl ActiveTransition {
    fn settle(mut self, cancelled: bool) {
        if cancelled {
            if let Some(callback) = self.on_cancel.take() {
                callback();
            }
        } else if let Some(callback) = self.on_finish.take() {
            callback();
        }
        if let Some(completion) = self.completion.take() {
            completion(cancelled);
        }
    }
}

pub struct CameraController {
    position: CameraPosition,
    size: Point,
    min_zoom: f64,
    max_zoom: f64,
    extent: Option<LatLngBounds>,
    default_duration: f64,
    active: Option<ActiveTransition>,
    /// Reason of the movement in progress, set from the first change until idle
    moving: Option<CameraChangeReason>,
    outbox: Vec<MapEvent>,
}

impl CameraController {
    pub fn new(position: CameraPosition, size: Point) -> Self {
        let mut controller = Self {
            position: position.normalized(),
            size,
            min_zoom: MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            extent: None,
            default_duration: DEFAULT_ANIMATION_DURATION,
            active: None,
            moving: None,
            outbox: Vec::new(),
        };
        controller.position = controller.constrain(&controller.position);
        controller
    }

    pub fn position(&self) -> CameraPosition {
        self.position
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = Point::new(size.x.max(0.0), size.y.max(0.0));
    }

    pub fn projection(&self) -> Projection {
        Projection::new(self.position, self.size)
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Sets both zoom bounds; they must lie within [0, 21] with min <= max.
    /// The current camera is re-clamped.
    pub fn set_zoom_bounds(&mut self, min_zoom: f64, max_zoom: f64) -> Result<()> {
        if !min_zoom.is_finite() || !max_zoom.is_finite() {
            return Err(MapError::InvalidZoom(format!(
                "zoom bounds must be finite, got [{}, {}]",
                min_zoom, max_zoom
            )));
        }
        let min_zoom = min_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let max_zoom = max_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if min_zoom > max_zoom {
            return Err(MapError::InvalidZoom(format!(
                "min zoom {} exceeds max zoom {}",
                min_zoom, max_zoom
            )));
        }

        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.reconstrain();
        Ok(())
    }

    pub fn extent(&self) -> Option<LatLngBounds> {
        self.extent
    }

    pub fn set_extent(&mut self, extent: Option<LatLngBounds>) -> Result<()> {
        if let Some(bounds) = extent {
            if bounds.is_empty() || !bounds.south_west.is_valid() || !bounds.north_east.is_valid() {
                return Err(MapError::InvalidConfig(format!(
                    "extent {:?} is empty or out of range",
                    bounds
                )));
            }
        }
        self.extent = extent;
        self.reconstrain();
        Ok(())
    }

    pub fn default_duration(&self) -> Duration {
        Duration::from_secs_f64(self.default_duration)
    }

    pub fn set_default_duration(&mut self, duration: Duration) {
        self.default_duration = duration.as_secs_f64();
    }

    /// Clamps a position into the engine range, the zoom bounds and the extent
    pub fn constrain(&self, position: &CameraPosition) -> CameraPosition {
        let mut constrained = position.normalized();
        constrained.zoom = constrained.zoom.clamp(self.min_zoom, self.max_zoom);
        if let Some(extent) = &self.extent {
            constrained.target = extent.clamp(&constrained.target);
        }
        constrained
    }

    fn reconstrain(&mut self) {
        let constrained = self.constrain(&self.position);
        if !constrained.approx_eq(&self.position) {
            self.cancel_transitions();
            self.apply(constrained, CameraChangeReason::Developer, false);
        }
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the camera changed since it was last settled
    pub fn is_moving(&self) -> bool {
        self.moving.is_some()
    }

    pub fn move_camera(&mut self, update: CameraUpdate) -> Result<()> {
        self.move_camera_with_completion(update, None)
    }

    /// Moves the camera. A transition already in progress is cancelled first:
    /// its cancel callback runs and its completion receives `true`. The new
    /// completion receives `false` once the camera reaches its target, which
    /// happens synchronously for unanimated updates. A rejected update leaves
    /// the camera alone and its completion receives `true` before the error
    /// returns.
    pub fn move_camera_with_completion(
        &mut self,
        mut update: CameraUpdate,
        completion: Option<CompletionCallback>,
    ) -> Result<()> {
        if let Err(err) = validate(&update) {
            log::warn!("rejected camera update: {}", err);
            if let Some(completion) = completion {
                completion(true);
            }
            return Err(err);
        }
        self.cancel_transitions();

        let target = self.constrain(&update.resolve(&self.position, self.size));
        let duration = update
            .duration
            .map(|duration| duration.as_secs_f64())
            .unwrap_or(self.default_duration);

        if update.animation == CameraAnimation::None || duration <= 0.0 {
            log::debug!("camera jump to {:?} ({:?})", target, update.reason);
            self.apply(target, update.reason, false);
            if let Some(callback) = update.on_finish.take() {
                callback();
            }
            if let Some(completion) = completion {
                completion(false);
            }
            return Ok(());
        }

        log::debug!(
            "camera {:?} transition to {:?} over {:.3}s ({:?})",
            update.animation,
            target,
            duration,
            update.reason
        );
        self.begin(update.reason, true);
        self.active = Some(ActiveTransition {
            transition: Transition::new(
                self.position,
                target,
                update.animation,
                update.reason,
                duration,
                self.size,
            ),
            on_cancel: update.on_cancel.take(),
            on_finish: update.on_finish.take(),
            completion,
        });
        Ok(())
    }

    /// Cancels the running transition, leaving the camera where it is. Returns
    /// whether anything was cancelled.
    pub fn cancel_transitions(&mut self) -> bool {
        match self.active.take() {
            Some(mut active) => {
                active.transition.cancel();
                log::debug!(
                    "camera transition cancelled at {:.0}%",
                    active.transition.progress() * 100.0
                );
                active.settle(true);
                true
            }
            None => false,
        }
    }

    /// Advances the running transition by `delta_time` seconds
    pub fn tick(&mut self, delta_time: f64) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let reason = active.transition.reason;
        let position = active.transition.update(delta_time);
        let finished = active.transition.state == TransitionState::Completed;
        let position = self.constrain(&position);
        self.apply(position, reason, true);

        if finished {
            if let Some(active) = self.active.take() {
                active.settle(false);
            }
        }
    }

    /// Applies a gesture-driven update immediately, cancelling any transition
    pub fn apply_gesture(&mut self, update: CameraUpdate) -> Result<()> {
        self.move_camera(update.reason(CameraChangeReason::Gesture))
    }

    /// Ends the current movement; emits the idle event if the camera moved
    pub fn settle(&mut self) {
        if self.active.is_none() && self.moving.take().is_some() {
            self.outbox.push(MapEvent::CameraIdle);
        }
    }

    /// Drains the camera events produced since the last call
    pub fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn begin(&mut self, reason: CameraChangeReason, animated: bool) {
        if self.moving.is_none() {
            self.moving = Some(reason);
            self.outbox.push(MapEvent::CameraWillChange { reason, animated });
        }
    }

    fn apply(&mut self, position: CameraPosition, reason: CameraChangeReason, animated: bool) {
        if position.approx_eq(&self.position) {
            return;
        }
        self.begin(reason, animated);
        self.position = position;
        self.outbox.push(MapEvent::CameraDidChange {
            reason,
            animated,
            position,
        });
    }
}

fn validate(update: &CameraUpdate) -> Result<()> {
    use crate::camera::update::CameraUpdateKind;

    let finite = |value: f64| value.is_finite();
    let valid = match &update.kind {
        CameraUpdateKind::ScrollTo(target) => finite(target.lat) && finite(target.lng),
        CameraUpdateKind::ScrollBy(delta) => finite(delta.x) && finite(delta.y),
        CameraUpdateKind::ZoomTo(zoom) | CameraUpdateKind::ZoomBy(zoom) => finite(*zoom),
        CameraUpdateKind::Params(params) => {
            params
                .scroll_to
                .map_or(true, |target| finite(target.lat) && finite(target.lng))
                && params.scroll_by.map_or(true, |delta| finite(delta.x) && finite(delta.y))
                && [
                    params.zoom_to,
                    params.zoom_by,
                    params.tilt_to,
                    params.tilt_by,
                    params.rotate_to,
                    params.rotate_by,
                ]
                .iter()
                .all(|value| value.map_or(true, finite))
        }
        CameraUpdateKind::Position(position) => {
            finite(position.target.lat)
                && finite(position.target.lng)
                && finite(position.zoom)
                && finite(position.tilt)
                && finite(position.bearing)
        }
        CameraUpdateKind::FitBounds { bounds, padding } => {
            bounds.south_west.is_valid() && bounds.north_east.is_valid() && finite(*padding)
        }
    };

    if valid {
        Ok(())
    } else {
        Err(MapError::InvalidCoordinates(format!(
            "camera update contains non-finite or out-of-range values: {:?}",
            update.kind
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    fn controller() -> CameraController {
        CameraController::new(
            CameraPosition::new(LatLng::new(37.5666, 126.9784), 14.0),
            Point::new(400.0, 800.0),
        )
    }

    fn recorder() -> (Arc<Mutex<Vec<bool>>>, CompletionCallback) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        (calls, Box::new(move |cancelled| sink.lock().unwrap().push(cancelled)))
    }

    #[test]
    fn test_immediate_move_completes_synchronously() {
        let mut camera = controller();
        let (calls, completion) = recorder();

        camera
            .move_camera_with_completion(CameraUpdate::zoom_to(16.0), Some(completion))
            .unwrap();

        assert_eq!(camera.position().zoom, 16.0);
        assert_eq!(*calls.lock().unwrap(), vec![false]);
        assert!(!camera.is_animating());
    }

    #[test]
    fn test_zoom_is_clamped_to_bounds() {
        let mut camera = controller();
        camera.set_zoom_bounds(5.0, 15.0).unwrap();

        camera.move_camera(CameraUpdate::zoom_to(19.0)).unwrap();
        assert_eq!(camera.position().zoom, 15.0);

        camera.move_camera(CameraUpdate::zoom_to(-3.0)).unwrap();
        assert_eq!(camera.position().zoom, 5.0);

        assert!(camera.set_zoom_bounds(12.0, 8.0).is_err());
        camera.set_zoom_bounds(8.0, 12.0).unwrap();
        assert_eq!(camera.position().zoom, 8.0);
    }

    #[test]
    fn test_new_move_cancels_running_transition() {
        let mut camera = controller();
        let (calls, completion) = recorder();
        let cancels = Arc::new(AtomicUsize::new(0));
        let counter = cancels.clone();

        let update = CameraUpdate::zoom_to(18.0)
            .animate_with_duration(CameraAnimation::Linear, Duration::from_secs(1))
            .on_cancel(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        camera.move_camera_with_completion(update, Some(completion)).unwrap();
        camera.tick(0.25);
        assert!(camera.is_animating());

        camera.move_camera(CameraUpdate::zoom_to(10.0)).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![true]);
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
        assert_eq!(camera.position().zoom, 10.0);
    }

    #[test]
    fn test_transition_completes_on_tick() {
        let mut camera = controller();
        let (calls, completion) = recorder();

        let update = CameraUpdate::scroll_to(LatLng::new(35.1796, 129.0756))
            .animate_with_duration(CameraAnimation::EaseOut, Duration::from_millis(500));
        camera.move_camera_with_completion(update, Some(completion)).unwrap();

        camera.tick(0.2);
        assert!(calls.lock().unwrap().is_empty());
        camera.tick(0.4);

        assert_eq!(*calls.lock().unwrap(), vec![false]);
        assert!((camera.position().target.lat - 35.1796).abs() < 1e-9);
        assert!(!camera.is_animating());
    }

    #[test]
    fn test_cancel_transitions_keeps_current_position() {
        let mut camera = controller();
        let (calls, completion) = recorder();

        let update = CameraUpdate::zoom_to(18.0)
            .animate_with_duration(CameraAnimation::Linear, Duration::from_secs(1));
        camera.move_camera_with_completion(update, Some(completion)).unwrap();
        camera.tick(0.5);
        let midway = camera.position();

        assert!(camera.cancel_transitions());
        assert!(!camera.cancel_transitions());
        assert_eq!(camera.position(), midway);
        assert_eq!(*calls.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_extent_clamps_target() {
        let mut camera = controller();
        camera
            .set_extent(Some(LatLngBounds::from_coords(37.0, 126.0, 38.0, 127.0)))
            .unwrap();

        camera
            .move_camera(CameraUpdate::scroll_to(LatLng::new(40.0, 130.0)))
            .unwrap();
        assert_eq!(camera.position().target, LatLng::new(38.0, 127.0));

        assert!(camera
            .set_extent(Some(LatLngBounds::from_coords(38.0, 127.0, 37.0, 126.0)))
            .is_err());
    }

    #[test]
    fn test_rejects_non_finite_updates() {
        let mut camera = controller();
        assert!(camera
            .move_camera(CameraUpdate::scroll_to(LatLng::new(f64::NAN, 0.0)))
            .is_err());
        assert!(camera.move_camera(CameraUpdate::zoom_by(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_rejected_update_still_completes() {
        let mut camera = controller();
        let running = CameraUpdate::zoom_to(18.0)
            .animate_with_duration(CameraAnimation::Linear, Duration::from_secs(1));
        camera.move_camera(running).unwrap();
        let (calls, completion) = recorder();

        let result = camera.move_camera_with_completion(CameraUpdate::zoom_to(f64::NAN), Some(completion));

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), vec![true]);
        // the running transition is untouched
        assert!(camera.is_animating());
    }

    #[test]
    fn test_events_and_idle() {
        let mut camera = controller();
        camera.move_camera(CameraUpdate::zoom_in()).unwrap();

        let events = camera.take_events();
        assert!(matches!(
            events[0],
            MapEvent::CameraWillChange {
                reason: CameraChangeReason::Developer,
                animated: false
            }
        ));
        assert!(matches!(events[1], MapEvent::CameraDidChange { .. }));

        camera.settle();
        assert_eq!(camera.take_events(), vec![MapEvent::CameraIdle]);
        camera.settle();
        assert!(camera.take_events().is_empty());
    }
}
