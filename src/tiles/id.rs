use crate::core::{
    bounds::Bounds,
    constants::MAX_ZOOM,
    geo::{LatLng, LatLngBounds, Point},
};
use serde::{Deserialize, Serialize};

const COORD_BITS: u32 = 28;
const COORD_MASK: u64 = (1 << COORD_BITS) - 1;

/// Slippy-map tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Tile containing a coordinate at a zoom level
    pub fn from_lat_lng(lat_lng: &LatLng, zoom: u8) -> Self {
        let world = lat_lng.normalized().to_world();
        let n = (1_u64 << zoom) as f64;
        let max = (1_u64 << zoom) - 1;
        let x = ((world.x * n).floor().max(0.0) as u64).min(max);
        let y = ((world.y * n).floor().max(0.0) as u64).min(max);
        Self::new(x as u32, y as u32, zoom)
    }

    /// Tiles per axis at this zoom
    pub fn tiles_per_axis(&self) -> u64 {
        1_u64 << self.z
    }

    /// Square of the tile in normalized world coordinates
    pub fn world_bounds(&self) -> Bounds {
        let n = self.tiles_per_axis() as f64;
        Bounds::from_coords(
            self.x as f64 / n,
            self.y as f64 / n,
            (self.x as f64 + 1.0) / n,
            (self.y as f64 + 1.0) / n,
        )
    }

    /// Northwest corner
    pub fn to_lat_lng(&self) -> LatLng {
        let n = self.tiles_per_axis() as f64;
        LatLng::from_world(Point::new(self.x as f64 / n, self.y as f64 / n))
    }

    pub fn bounds(&self) -> LatLngBounds {
        let world = self.world_bounds();
        let north_west = LatLng::from_world(world.min);
        let south_east = LatLng::from_world(world.max);
        LatLngBounds::new(
            LatLng::new(south_east.lat, north_west.lng),
            LatLng::new(north_west.lat, south_east.lng),
        )
    }

    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            None
        } else {
            Some(TileCoord::new(self.x / 2, self.y / 2, self.z - 1))
        }
    }

    pub fn children(&self) -> Vec<TileCoord> {
        if f64::from(self.z) >= MAX_ZOOM {
            return Vec::new();
        }
        vec![
            TileCoord::new(self.x * 2, self.y * 2, self.z + 1),
            TileCoord::new(self.x * 2 + 1, self.y * 2, self.z + 1),
            TileCoord::new(self.x * 2, self.y * 2 + 1, self.z + 1),
            TileCoord::new(self.x * 2 + 1, self.y * 2 + 1, self.z + 1),
        ]
    }

    pub fn is_valid(&self) -> bool {
        f64::from(self.z) <= MAX_ZOOM
            && u64::from(self.x) < self.tiles_per_axis()
            && u64::from(self.y) < self.tiles_per_axis()
    }
}

/// Tile address packed into 64 bits: zoom in the top 8 bits, then 28 bits
/// of x and 28 bits of y
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u64);

impl TileId {
    pub fn new(coord: TileCoord) -> Self {
        Self(
            (u64::from(coord.z) << (2 * COORD_BITS))
                | ((u64::from(coord.x) & COORD_MASK) << COORD_BITS)
                | (u64::from(coord.y) & COORD_MASK),
        )
    }

    pub fn coord(&self) -> TileCoord {
        TileCoord {
            x: ((self.0 >> COORD_BITS) & COORD_MASK) as u32,
            y: (self.0 & COORD_MASK) as u32,
            z: (self.0 >> (2 * COORD_BITS)) as u8,
        }
    }

    pub fn zoom(&self) -> u8 {
        self.coord().z
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<TileCoord> for TileId {
    fn from(coord: TileCoord) -> Self {
        TileId::new(coord)
    }
}

impl From<TileId> for TileCoord {
    fn from(id: TileId) -> Self {
        id.coord()
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let coord = self.coord();
        write!(f, "{}/{}/{}", coord.z, coord.x, coord.y)
    }
}
