use crate::{
    animation::interpolation::{EasingFunction, Interpolation},
    camera::{
        position::CameraPosition,
        update::{CameraAnimation, CameraChangeReason},
    },
    core::{
        constants::{MIN_ZOOM, TILE_SIZE},
        geo::{LatLng, Point},
    },
};

/// State of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Running,
    Completed,
    Cancelled,
}

/// A timed camera movement from one position to another
#[derive(Debug, Clone)]
pub struct Transition {
    pub start: CameraPosition,
    pub target: CameraPosition,
    pub animation: CameraAnimation,
    pub reason: CameraChangeReason,
    /// Duration in seconds
    pub duration: f64,
    pub elapsed: f64,
    pub state: TransitionState,
    easing: EasingFunction,
    start_world: Point,
    target_world: Point,
    /// Zoom levels dropped at the middle of a fly animation
    fly_dip: f64,
}

impl Transition {
    pub fn new(
        start: CameraPosition,
        target: CameraPosition,
        animation: CameraAnimation,
        reason: CameraChangeReason,
        duration: f64,
        view_size: Point,
    ) -> Self {
        let start_world = start.target.to_world();
        let target_world = target.target.to_world();
        let fly_dip = if animation == CameraAnimation::Fly {
            Self::fly_dip(&start, &target, start_world, target_world, view_size)
        } else {
            0.0
        };

        Self {
            start,
            target,
            animation,
            reason,
            duration: duration.max(0.0),
            elapsed: 0.0,
            state: TransitionState::Running,
            easing: animation.easing(),
            start_world,
            target_world,
            fly_dip,
        }
    }

    /// How far a fly animation zooms out: enough for both endpoints to fit in
    /// the view at the apex.
    fn fly_dip(
        start: &CameraPosition,
        target: &CameraPosition,
        start_world: Point,
        target_world: Point,
        view_size: Point,
    ) -> f64 {
        let mut dx = target_world.x - start_world.x;
        dx -= dx.round();
        let distance = Point::new(dx, target_world.y - start_world.y).length() * TILE_SIZE;
        if distance <= 0.0 {
            return 0.0;
        }

        let span = view_size.x.min(view_size.y).max(1.0);
        let apex_zoom = (span / distance).log2();
        (start.zoom.min(target.zoom) - apex_zoom).max(0.0)
    }

    /// Advances the transition and returns the interpolated camera
    pub fn update(&mut self, delta_time: f64) -> CameraPosition {
        if self.state != TransitionState::Running {
            return self.current();
        }

        self.elapsed += delta_time.max(0.0);
        if self.progress() >= 1.0 {
            self.state = TransitionState::Completed;
        }
        self.current()
    }

    /// Camera at the current progress
    pub fn current(&self) -> CameraPosition {
        let progress = self.progress();
        if progress >= 1.0 {
            return self.target;
        }

        let t = self.easing.apply(progress);
        let world = Interpolation::world(&self.start_world, &self.target_world, t);
        let mut zoom = Interpolation::linear(self.start.zoom, self.target.zoom, t);
        if self.fly_dip > 0.0 {
            // parabolic arc: zero at both ends, full dip at the middle
            zoom = (zoom - self.fly_dip * 4.0 * t * (1.0 - t)).max(MIN_ZOOM);
        }

        CameraPosition {
            target: LatLng::from_world(world).normalized(),
            zoom,
            tilt: Interpolation::linear(self.start.tilt, self.target.tilt, t),
            bearing: Interpolation::angle(self.start.bearing, self.target.bearing, t),
        }
        .normalized()
    }

    pub fn cancel(&mut self) {
        if self.state == TransitionState::Running {
            self.state = TransitionState::Cancelled;
        }
    }

    /// Check if the transition is finished
    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            TransitionState::Completed | TransitionState::Cancelled
        )
    }

    /// Get the current progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> Point {
        Point::new(800.0, 600.0)
    }

    #[test]
    fn test_linear_transition_reaches_target() {
        let start = CameraPosition::new(LatLng::new(0.0, 0.0), 10.0);
        let target = CameraPosition::new(LatLng::new(1.0, 1.0), 12.0);
        let mut transition = Transition::new(
            start,
            target,
            CameraAnimation::Linear,
            CameraChangeReason::Developer,
            1.0,
            view(),
        );

        let halfway = transition.update(0.5);
        assert!((halfway.zoom - 11.0).abs() < 1e-9);
        assert!(halfway.target.lng > 0.0 && halfway.target.lng < 1.0);
        assert!(!transition.is_finished());

        let done = transition.update(0.6);
        assert_eq!(done, target);
        assert_eq!(transition.state, TransitionState::Completed);
    }

    #[test]
    fn test_fly_zooms_out_midway() {
        let start = CameraPosition::new(LatLng::new(37.5, 127.0), 14.0);
        let target = CameraPosition::new(LatLng::new(35.1, 129.0), 14.0);
        let mut transition = Transition::new(
            start,
            target,
            CameraAnimation::Fly,
            CameraChangeReason::Developer,
            2.0,
            view(),
        );

        let apex = transition.update(1.0);
        assert!(apex.zoom < 14.0 - 1.0);
        assert_eq!(transition.update(1.0), target);
    }

    #[test]
    fn test_bearing_takes_shorter_arc() {
        let start = CameraPosition::new(LatLng::new(0.0, 0.0), 10.0).with_bearing(350.0);
        let target = CameraPosition::new(LatLng::new(0.0, 0.0), 10.0).with_bearing(10.0);
        let mut transition = Transition::new(
            start,
            target,
            CameraAnimation::Linear,
            CameraChangeReason::Developer,
            1.0,
            view(),
        );

        let halfway = transition.update(0.5);
        assert!(halfway.bearing < 1e-9 || halfway.bearing > 359.999);
    }

    #[test]
    fn test_cancelled_transition_stops_advancing() {
        let start = CameraPosition::new(LatLng::new(0.0, 0.0), 10.0);
        let target = CameraPosition::new(LatLng::new(0.0, 10.0), 10.0);
        let mut transition = Transition::new(
            start,
            target,
            CameraAnimation::EaseOut,
            CameraChangeReason::Developer,
            1.0,
            view(),
        );

        let before = transition.update(0.3);
        transition.cancel();
        assert_eq!(transition.update(0.3), before);
        assert!(transition.is_finished());
    }
}
