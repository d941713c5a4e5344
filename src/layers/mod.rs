//! Pickable map content: overlays added by the app and symbols of the base map,
//! plus the thematic layer groups

pub mod base;
pub mod groups;
pub mod location;
pub mod macros;
pub mod overlay;
pub mod symbol;

pub use base::{PickContext, Pickable, PickableKind, PickableProperties};
pub use groups::{LayerGroup, LayerGroups};
pub use location::LocationOverlay;
pub use overlay::{Circle, Marker, PolygonOverlay, Polyline};
pub use symbol::Symbol;
