use mapview::prelude::*;
use std::sync::Arc;

/// Tile coverage of the visible region through the map view
#[cfg(test)]
mod coverage_tests {
    use super::*;

    fn view(tilt: f64, bearing: f64) -> MapView {
        let _ = env_logger::builder().is_test(true).try_init();
        let camera = CameraPosition::new(LatLng::new(37.5666, 126.9784), 14.3)
            .with_tilt(tilt)
            .with_bearing(bearing);
        MapViewBuilder::new()
            .with_size(Point::new(400.0, 800.0))
            .with_camera(camera)
            .build()
            .unwrap()
    }

    fn coords(tiles: &[TileId]) -> Vec<TileCoord> {
        tiles.iter().map(|tile| tile.coord()).collect()
    }

    /// Every ground point on screen lies in one of the covering tiles
    #[test]
    fn test_screen_samples_are_covered() {
        for (tilt, bearing) in [(0.0, 0.0), (45.0, 30.0), (60.0, 200.0)] {
            let view = view(tilt, bearing);
            let tiles = coords(&view.covering_tile_ids());
            assert!(tiles.iter().all(|tile| tile.z == 14));

            for row in 0..9 {
                for column in 0..9 {
                    let point = Point::new(10.0 + column as f64 * 47.5, 10.0 + row as f64 * 97.5);
                    let Some(ground) = view.from_screen_location(&point) else {
                        continue;
                    };
                    let expected = TileCoord::from_lat_lng(&ground, 14);
                    assert!(
                        tiles.contains(&expected),
                        "tilt {} bearing {}: {:?} at {:?} not covered",
                        tilt,
                        bearing,
                        expected,
                        point
                    );
                }
            }
        }
    }

    /// The center tile comes first and distance from the center never shrinks
    #[test]
    fn test_nearest_tiles_first() {
        let view = view(45.0, 30.0);
        let center = view.camera_position().target;
        let tiles = coords(&view.covering_tile_ids());
        assert_eq!(tiles[0], TileCoord::from_lat_lng(&center, 14));

        let world = center.to_world().multiply(16384.0);
        let distances: Vec<f64> = tiles
            .iter()
            .map(|tile| {
                let dx = tile.x as f64 + 0.5 - world.x;
                let dy = tile.y as f64 + 0.5 - world.y;
                dx * dx + dy * dy
            })
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1] + 1e-9));
    }

    #[test]
    fn test_tilted_view_needs_more_tiles() {
        let flat = view(0.0, 0.0).covering_tile_ids().len();
        let tilted = view(60.0, 0.0).covering_tile_ids().len();
        assert!(tilted > flat, "flat {} tilted {}", flat, tilted);
    }

    /// Repeated queries reuse the cached result until the camera moves
    #[test]
    fn test_results_reused_until_camera_moves() {
        let mut view = view(0.0, 0.0);
        let first = view.covering_tile_ids();
        assert!(Arc::ptr_eq(&first, &view.covering_tile_ids()));

        view.move_camera(CameraUpdate::scroll_by(Point::new(300.0, 0.0)))
            .unwrap();
        let moved = view.covering_tile_ids();
        assert!(!Arc::ptr_eq(&first, &moved));
        assert_ne!(*first, *moved);
    }

    #[test]
    fn test_explicit_zoom() {
        let view = view(0.0, 0.0);
        let coarse = view.covering_tile_ids_at_zoom(10).unwrap();
        assert!(coarse.iter().all(|tile| tile.zoom() == 10));
        assert!(coarse.len() <= view.covering_tile_ids().len());

        assert!(view.covering_tile_ids_at_zoom(22).is_err());
        assert!(view.covering_tile_ids_at_zoom(-1).is_err());
    }
}
