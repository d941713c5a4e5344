use instant::Instant;
use mapview::prelude::*;
use std::time::Duration;

/// Picking through the map view: overlay footprints, ordering, tap events
/// and the state that hides symbols
#[cfg(test)]
mod pick_tests {
    use super::*;

    fn view() -> MapView {
        let _ = env_logger::builder().is_test(true).try_init();
        MapViewBuilder::interactive(LatLng::new(37.5666, 126.9784), 16.0, Point::new(400.0, 800.0))
            .build()
            .unwrap()
    }

    fn ground(view: &MapView, x: f64, y: f64) -> LatLng {
        view.from_screen_location(&Point::new(x, y)).unwrap()
    }

    /// Taps `point` at `at` and returns the events it produced
    fn tap(view: &mut MapView, point: Point, at: Instant) -> Vec<MapEvent> {
        let touch = vec![TouchPoint::new(7, point.x, point.y)];
        view.handle_input_at(InputEvent::touch(TouchEventType::Start, touch.clone()), at)
            .unwrap();
        view.handle_input_at(
            InputEvent::touch(TouchEventType::End, touch),
            at + Duration::from_millis(40),
        )
        .unwrap();
        view.process_events()
    }

    fn ids(hits: Vec<PickHit>) -> Vec<String> {
        hits.into_iter().map(|hit| hit.id).collect()
    }

    /// Markers above shapes; among shapes z-index, then the later one
    #[test]
    fn test_overlays_ordered_topmost_first() {
        let mut view = view();
        let center = view.camera_position().target;
        let square = vec![
            ground(&view, 100.0, 300.0),
            ground(&view, 300.0, 300.0),
            ground(&view, 300.0, 500.0),
            ground(&view, 100.0, 500.0),
        ];
        let line = vec![ground(&view, 50.0, 400.0), ground(&view, 350.0, 400.0)];

        view.add_pickable(PolygonOverlay::new("area", square.clone()).unwrap())
            .unwrap();
        view.add_pickable(Polyline::new("route", line).unwrap()).unwrap();
        view.add_pickable(Marker::new("pin", center)).unwrap();

        let point = Point::new(200.0, 395.0);
        assert_eq!(ids(view.pick_all(&point, 3)), vec!["pin", "route", "area"]);

        let mut raised = PolygonOverlay::new("area", square).unwrap();
        raised.set_z_index(1);
        view.update_pickable(raised).unwrap();
        assert_eq!(ids(view.pick_all(&point, 3)), vec!["pin", "area", "route"]);

        // tolerance zero misses the thin line
        assert_eq!(ids(view.pick_all(&point, 0)), vec!["pin", "area"]);
        assert_eq!(view.pick(&point).map(|hit| hit.id), Some("pin".to_string()));
    }

    /// A polyline is hit within half its width plus the tolerance
    #[test]
    fn test_polyline_stroke_and_tolerance() {
        let mut view = view();
        let line = vec![ground(&view, 50.0, 400.0), ground(&view, 350.0, 400.0)];
        view.add_pickable(Polyline::new("route", line).unwrap().with_width(6.0))
            .unwrap();

        let below = Point::new(200.0, 410.0);
        assert!(view.pick_all(&below, 6).is_empty());
        let hits = view.pick_all(&below, 8);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 7.0).abs() < 1e-6);

        // beyond the end of the line
        assert!(view.pick_all(&Point::new(380.0, 400.0), 8).is_empty());
    }

    /// Nothing within tolerance gives empty results, never an error
    #[test]
    fn test_empty_results() {
        let mut view = view();
        assert!(view.pick_all(&Point::new(10.0, 10.0), 50).is_empty());
        view.add_pickable(Circle::new("ring", view.camera_position().target, 20.0).unwrap())
            .unwrap();
        assert!(view.pick(&Point::new(10.0, 10.0)).is_none());
        assert!(view.pick(&Point::new(200.0, 400.0)).is_some());
    }

    /// Taps report the topmost symbol with its caption, or the map itself
    #[test]
    fn test_tap_events() {
        let mut view = view();
        let spot = ground(&view, 100.0, 600.0);
        view.add_pickable(Symbol::new("city-hall", "City Hall", spot))
            .unwrap();
        let t0 = Instant::now();

        let events = tap(&mut view, Point::new(101.0, 601.0), t0);
        assert_eq!(
            events,
            vec![MapEvent::SymbolTapped {
                symbol_id: "city-hall".to_string(),
                caption: "City Hall".to_string(),
                point: Point::new(101.0, 601.0),
            }]
        );

        let events = tap(&mut view, Point::new(300.0, 100.0), t0 + Duration::from_secs(1));
        assert!(matches!(events.as_slice(), [MapEvent::MapTapped { .. }]));
    }

    /// Symbols of a disabled layer group and symbols in lite mode are not hit
    #[test]
    fn test_hidden_symbols_are_not_picked() {
        let mut view = view();
        let spot = view.camera_position().target;
        view.add_pickable(Symbol::new("station", "Station", spot).with_layer_group("transit"))
            .unwrap();
        let center = Point::new(200.0, 400.0);

        assert!(view.pick(&center).is_none());
        view.set_layer_group("transit", true);
        assert_eq!(view.pick(&center).map(|hit| hit.kind), Some(PickableKind::Symbol));

        view.set_lite_mode_enabled(true);
        assert!(view.pick(&center).is_none());
    }

    /// Overlays outside their zoom range or hidden are skipped
    #[test]
    fn test_visibility_and_zoom_range() {
        let mut view = view();
        let mut pin = Marker::new("pin", view.camera_position().target);
        pin.properties_mut().max_zoom = 15.0;
        view.add_pickable(pin).unwrap();
        let point = Point::new(200.0, 390.0);

        assert!(view.pick(&point).is_none());
        view.move_camera(CameraUpdate::zoom_to(14.0)).unwrap();
        assert!(view.pick(&point).is_some());

        view.pickables_mut().set_visible("pin", false).unwrap();
        assert!(view.pick(&point).is_none());
        assert!(view.remove_pickable("pin").is_some());
        assert!(view.pickables().is_empty());
    }
}
