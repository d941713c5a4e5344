pub mod cache;
pub mod coverage;
pub mod id;

// Re-exports for convenience
pub use coverage::{covering_tiles, tile_zoom, TileCoverage};
pub use id::{TileCoord, TileId};
