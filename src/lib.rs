//! # mapview
//!
//! A headless map-view engine: the state and logic behind a tiled mobile map.
//!
//! The crate owns the camera and its animated transitions, projects between
//! screen and geographic coordinates under bearing and tilt, computes the
//! tiles covering the visible ground, hit-tests overlays and map symbols
//! around a screen point, tracks thematic layer groups and styling, and turns
//! touch gestures into camera movement with friction-based inertia. Drawing is
//! left to the embedding renderer.

pub mod animation;
pub mod camera;
pub mod core;
pub mod input;
pub mod layers;
pub mod pick;
pub mod prelude;
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
pub mod spatial;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    builder::MapViewBuilder,
    config::{GestureOptions, MapType, MapViewOptions, MapViewProfile},
    geo::{LatLng, LatLngBounds, Point},
    map::{MapView, RenderStyle},
    projection::Projection,
};

pub use camera::{
    CameraAnimation, CameraChangeReason, CameraPosition, CameraUpdate, CameraUpdateParams,
};

pub use input::{events::InputEvent, events::MapEvent};

pub use layers::{Circle, LayerGroup, LocationOverlay, Marker, Pickable, PickableKind, PolygonOverlay, Polyline, Symbol};

pub use pick::{PickEngine, PickHit};

pub use tiles::{TileCoord, TileId};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid zoom: {0}")]
    InvalidZoom(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown pickable: {0}")]
    UnknownPickable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = MapError;
