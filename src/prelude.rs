//! Prelude module for common mapview types and traits
//!
//! Re-exports the types most embedders need, for `use mapview::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    builder::MapViewBuilder,
    config::{GestureOptions, MapType, MapViewOptions, MapViewProfile},
    geo::{LatLng, LatLngBounds, Point},
    map::{MapView, RenderStyle},
    projection::Projection,
};

pub use crate::camera::{
    CameraAnimation, CameraChangeReason, CameraPosition, CameraUpdate, CameraUpdateParams,
    CompletionCallback,
};

pub use crate::input::{
    events::{InputEvent, MapEvent, TouchEventType, TouchPoint},
    handler::GestureAction,
};

pub use crate::layers::{
    groups::{LayerGroup, LayerGroups},
    Circle, LocationOverlay, Marker, Pickable, PickableKind, PolygonOverlay, Polyline, Symbol,
};

pub use crate::pick::{PickEngine, PickHit};

pub use crate::tiles::{TileCoord, TileCoverage, TileId};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::FrameDriver;

pub use crate::{Error as MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
