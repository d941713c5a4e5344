//! Tiles needed to cover the visible ground.
//!
//! The content region (a convex quadrilateral on the ground) is scaled to tile
//! units and tested against tile squares in square rings around the tile under
//! the camera target. Because the region is convex and contains that tile, the
//! first ring without a hit ends the search.

use crate::{
    core::{
        bounds::Bounds,
        constants::{COVERAGE_CACHE_SIZE, MAX_COVERING_TILES, MAX_ZOOM, MIN_ZOOM},
        projection::Projection,
    },
    prelude::HashSet,
    tiles::{
        cache::{CoverageCache, CoverageKey},
        id::{TileCoord, TileId},
    },
    MapError, Result,
};
use geo::Intersects;
use geo_types::{Coord, LineString, Polygon};
use std::sync::Arc;

/// Shrinks tile squares so that tiles only touching the region edge are left out
const EDGE_EPSILON: f64 = 1e-9;

/// Tile zoom used for a camera zoom
pub fn tile_zoom(camera_zoom: f64) -> u8 {
    camera_zoom.floor().clamp(MIN_ZOOM, MAX_ZOOM) as u8
}

/// Tile ids covering the content region of `projection` at `zoom`, nearest to
/// the center first
pub fn covering_tiles(projection: &Projection, zoom: u8) -> Vec<TileId> {
    let tiles_per_axis = (1_u64 << zoom) as f64;
    let center = projection.center_world().multiply(tiles_per_axis);
    let center_tile = (center.x.floor() as i64, center.y.floor() as i64);

    let size = projection.size();
    if size.x <= 0.0 || size.y <= 0.0 {
        return vec![TileId::new(wrap(center_tile, zoom))];
    }

    let region = region_in_tiles(projection, tiles_per_axis);
    let Some(extent) = Bounds::from_points(&region) else {
        return vec![TileId::new(wrap(center_tile, zoom))];
    };
    let polygon = Polygon::new(
        LineString::from(
            region
                .iter()
                .map(|p| Coord { x: p.x, y: p.y })
                .collect::<Vec<_>>(),
        ),
        vec![],
    );

    let max_ring = ring_limit(center_tile, &extent);
    let mut seen = HashSet::default();
    let mut found: Vec<(f64, TileCoord)> = Vec::new();

    for ring in 0..=max_ring {
        let mut hits = 0;
        for (x, y) in ring_cells(center_tile, ring) {
            if y < 0 || y as f64 >= tiles_per_axis {
                continue;
            }
            let square = Bounds::from_coords(
                x as f64 + EDGE_EPSILON,
                y as f64 + EDGE_EPSILON,
                x as f64 + 1.0 - EDGE_EPSILON,
                y as f64 + 1.0 - EDGE_EPSILON,
            );
            if ring > 0 && !square.to_polygon().intersects(&polygon) {
                continue;
            }
            hits += 1;
            let coord = wrap((x, y), zoom);
            if seen.insert(coord) {
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                found.push((dx * dx + dy * dy, coord));
            }
        }
        if hits == 0 || found.len() >= MAX_COVERING_TILES {
            break;
        }
    }

    found.sort_by(|a, b| a.0.total_cmp(&b.0));
    if found.len() > MAX_COVERING_TILES {
        log::warn!(
            "covering {} tiles at zoom {}, keeping the nearest {}",
            found.len(),
            zoom,
            MAX_COVERING_TILES
        );
        found.truncate(MAX_COVERING_TILES);
    }
    found.into_iter().map(|(_, coord)| TileId::new(coord)).collect()
}

/// Content region corners in tile units, x unwrapped
fn region_in_tiles(projection: &Projection, tiles_per_axis: f64) -> Vec<crate::core::geo::Point> {
    projection
        .content_region_world()
        .into_iter()
        .map(|corner| corner.multiply(tiles_per_axis))
        .collect()
}

/// Rings needed to reach every tile of the region bounding box
fn ring_limit(center: (i64, i64), extent: &Bounds) -> i64 {
    let reach = [
        center.0 - extent.min.x.floor() as i64,
        extent.max.x.floor() as i64 - center.0,
        center.1 - extent.min.y.floor() as i64,
        extent.max.y.floor() as i64 - center.1,
    ];
    reach.into_iter().max().unwrap_or(0).max(0)
}

/// Cells at Chebyshev distance `ring` from `center`
fn ring_cells(center: (i64, i64), ring: i64) -> Vec<(i64, i64)> {
    if ring == 0 {
        return vec![center];
    }
    let (cx, cy) = center;
    let mut cells = Vec::with_capacity((8 * ring) as usize);
    for x in (cx - ring)..=(cx + ring) {
        cells.push((x, cy - ring));
        cells.push((x, cy + ring));
    }
    for y in (cy - ring + 1)..=(cy + ring - 1) {
        cells.push((cx - ring, y));
        cells.push((cx + ring, y));
    }
    cells
}

fn wrap((x, y): (i64, i64), zoom: u8) -> TileCoord {
    let n = 1_i64 << zoom;
    TileCoord::new(x.rem_euclid(n) as u32, y.clamp(0, n - 1) as u32, zoom)
}

/// Covering queries with an LRU memo in front
#[derive(Debug, Clone)]
pub struct TileCoverage {
    cache: CoverageCache,
}

impl TileCoverage {
    pub fn new() -> Self {
        Self::with_capacity(COVERAGE_CACHE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: CoverageCache::new(capacity),
        }
    }

    /// Covering tiles at the tile zoom of the camera
    pub fn covering_tile_ids(&self, projection: &Projection) -> Arc<Vec<TileId>> {
        let zoom = tile_zoom(projection.camera().zoom);
        self.lookup(projection, zoom)
    }

    /// Covering tiles at an explicit zoom within [0, 21]
    pub fn covering_tile_ids_at_zoom(&self, projection: &Projection, zoom: i32) -> Result<Arc<Vec<TileId>>> {
        if !(MIN_ZOOM as i32..=MAX_ZOOM as i32).contains(&zoom) {
            return Err(MapError::InvalidZoom(format!(
                "tile zoom {} is outside [{}, {}]",
                zoom, MIN_ZOOM, MAX_ZOOM
            )));
        }
        Ok(self.lookup(projection, zoom as u8))
    }

    fn lookup(&self, projection: &Projection, zoom: u8) -> Arc<Vec<TileId>> {
        let key = CoverageKey::new(projection.camera(), projection.size(), zoom);
        self.cache
            .get_or_insert_with(key, || covering_tiles(projection, zoom))
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn cached_results(&self) -> usize {
        self.cache.len()
    }
}

impl Default for TileCoverage {
    fn default() -> Self {
        Self::new()
    }
}
