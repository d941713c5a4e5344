use instant::Instant;
use mapview::prelude::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

/// Touch sequences driven through the map view
#[cfg(test)]
mod gesture_tests {
    use super::*;

    fn view() -> MapView {
        let _ = env_logger::builder().is_test(true).try_init();
        MapViewBuilder::interactive(LatLng::new(37.5666, 126.9784), 14.0, Point::new(400.0, 800.0))
            .build()
            .unwrap()
    }

    fn at(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    fn send(view: &mut MapView, event_type: TouchEventType, touches: &[(u64, f64, f64)], when: Instant) {
        let touches = touches
            .iter()
            .map(|&(id, x, y)| TouchPoint::new(id, x, y))
            .collect();
        view.handle_input_at(InputEvent::touch(event_type, touches), when)
            .unwrap();
    }

    /// Dragging up moves the camera south and keeps drifting after release
    #[test]
    fn test_fling_carries_on_then_idles() {
        let mut view = view();
        let start = view.camera_position().target;
        let t0 = Instant::now();

        send(&mut view, TouchEventType::Start, &[(1, 200.0, 400.0)], t0);
        send(&mut view, TouchEventType::Move, &[(1, 200.0, 370.0)], at(t0, 16));
        send(&mut view, TouchEventType::Move, &[(1, 200.0, 340.0)], at(t0, 32));
        send(&mut view, TouchEventType::End, &[(1, 200.0, 340.0)], at(t0, 40));

        let released = view.camera_position().target;
        assert!(released.lat < start.lat);
        assert!((released.lng - start.lng).abs() < 1e-9);
        assert!(view.is_moving());

        view.tick(1.0 / 60.0);
        assert!(view.camera_position().target.lat < released.lat);

        for _ in 0..1200 {
            view.tick(1.0 / 60.0);
        }
        assert!(!view.is_moving());

        let events = view.process_events();
        assert_eq!(
            events.first(),
            Some(&MapEvent::CameraWillChange {
                reason: CameraChangeReason::Gesture,
                animated: false
            })
        );
        assert_eq!(events.last(), Some(&MapEvent::CameraIdle));
        let idles = events
            .iter()
            .filter(|event| matches!(event, MapEvent::CameraIdle))
            .count();
        assert_eq!(idles, 1);
    }

    /// Spreading two fingers to twice their distance zooms in one level
    #[test]
    fn test_pinch_zooms_about_focus() {
        let mut view = view();
        let target = view.camera_position().target;
        let t0 = Instant::now();

        send(&mut view, TouchEventType::Start, &[(1, 150.0, 400.0), (2, 250.0, 400.0)], t0);
        send(&mut view, TouchEventType::Move, &[(1, 100.0, 400.0), (2, 300.0, 400.0)], at(t0, 30));

        let camera = view.camera_position();
        assert!((camera.zoom - 15.0).abs() < 1e-9);
        assert!((camera.target.lat - target.lat).abs() < 1e-9);
        assert!((camera.target.lng - target.lng).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_zoom_gestures_ignore_pinch() {
        let mut view = view();
        view.set_zoom_gestures_enabled(false);
        let t0 = Instant::now();

        send(&mut view, TouchEventType::Start, &[(1, 150.0, 400.0), (2, 250.0, 400.0)], t0);
        send(&mut view, TouchEventType::Move, &[(1, 100.0, 400.0), (2, 300.0, 400.0)], at(t0, 30));
        send(&mut view, TouchEventType::End, &[(1, 100.0, 400.0), (2, 300.0, 400.0)], at(t0, 40));

        assert_eq!(view.camera_position().zoom, 14.0);
    }

    /// Two fingers sliding up together tilt the camera
    #[test]
    fn test_two_finger_vertical_drag_tilts() {
        let mut view = view();
        let t0 = Instant::now();

        send(&mut view, TouchEventType::Start, &[(1, 150.0, 400.0), (2, 250.0, 400.0)], t0);
        send(&mut view, TouchEventType::Move, &[(1, 150.0, 350.0), (2, 250.0, 350.0)], at(t0, 30));

        let camera = view.camera_position();
        assert!(camera.tilt > 0.0);
        assert_eq!(camera.zoom, 14.0);
    }

    /// Double tap zooms in one level keeping the tapped ground point in place
    #[test]
    fn test_double_tap_zooms_in_at_point() {
        let mut view = view();
        let tapped = Point::new(100.0, 200.0);
        let ground = view.from_screen_location(&tapped).unwrap();
        let t0 = Instant::now();

        send(&mut view, TouchEventType::Start, &[(1, tapped.x, tapped.y)], t0);
        send(&mut view, TouchEventType::End, &[(1, tapped.x, tapped.y)], at(t0, 50));
        send(&mut view, TouchEventType::Start, &[(1, tapped.x, tapped.y)], at(t0, 150));
        send(&mut view, TouchEventType::End, &[(1, tapped.x, tapped.y)], at(t0, 200));
        assert!(view.is_animating());

        for _ in 0..60 {
            view.tick(1.0 / 30.0);
        }
        assert!((view.camera_position().zoom - 15.0).abs() < 1e-9);
        let back = view.to_screen_location(&ground).unwrap();
        assert!(back.distance_to(&tapped) < 1e-3, "{:?}", back);
    }

    /// A touch landing during a transition stops it and is not a tap
    #[test]
    fn test_touch_stops_transition() {
        let mut view = view();
        let done = view
            .move_camera_async(
                CameraUpdate::zoom_to(18.0)
                    .animate_with_duration(CameraAnimation::Linear, Duration::from_secs(1)),
            )
            .unwrap();
        view.tick(0.25);
        view.process_events();
        let t0 = Instant::now();

        send(&mut view, TouchEventType::Start, &[(1, 300.0, 300.0)], t0);
        assert!(!view.is_animating());
        assert!(futures::executor::block_on(done));
        let zoom = view.camera_position().zoom;
        assert!((zoom - 15.0).abs() < 1e-9);

        send(&mut view, TouchEventType::End, &[(1, 300.0, 300.0)], at(t0, 40));
        let events = view.process_events();
        assert!(events
            .iter()
            .all(|event| !matches!(event, MapEvent::MapTapped { .. })));
        assert_eq!(events.last(), Some(&MapEvent::CameraIdle));

        view.tick(0.5);
        assert_eq!(view.camera_position().zoom, zoom);
    }

    /// Panning over a running move cancels it even when touches do not stop the camera
    #[test]
    fn test_pan_cancels_transition_without_stop_gesture() {
        let mut view = view();
        view.set_stop_gesture_enabled(false);
        let completions: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = completions.clone();
        let completion: CompletionCallback = Box::new(move |cancelled: bool| sink.lock().unwrap().push(cancelled));
        let cancels = Arc::new(AtomicUsize::new(0));
        let counter = cancels.clone();

        view.move_camera_with_completion(
            CameraUpdate::zoom_to(18.0)
                .animate_with_duration(CameraAnimation::Linear, Duration::from_secs(1))
                .on_cancel(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            Some(completion),
        )
        .unwrap();
        view.tick(0.25);
        let t0 = Instant::now();

        // a plain touch leaves the move running
        send(&mut view, TouchEventType::Start, &[(1, 200.0, 400.0)], t0);
        assert!(view.is_animating());
        assert!(completions.lock().unwrap().is_empty());

        send(&mut view, TouchEventType::Move, &[(1, 200.0, 360.0)], at(t0, 16));
        assert!(!view.is_animating());
        assert_eq!(*completions.lock().unwrap(), vec![true]);
        assert_eq!(cancels.load(Ordering::SeqCst), 1);

        let events = view.process_events();
        assert!(events.iter().any(|event| matches!(
            event,
            MapEvent::CameraDidChange {
                reason: CameraChangeReason::Gesture,
                ..
            }
        )));

        send(&mut view, TouchEventType::End, &[(1, 200.0, 360.0)], at(t0, 200));
        view.tick(0.5);
        assert_eq!(*completions.lock().unwrap(), vec![true]);
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
    }
}
