use crate::core::{
    bounds::Bounds,
    constants::{MAX_ZOOM, MIN_ZOOM},
    geo::Point,
    projection::Projection,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickableKind {
    Marker,
    Polyline,
    Polygon,
    Circle,
    LocationOverlay,
    Symbol,
}

impl PickableKind {
    /// Overlays are added by the developer; symbols come from the base map
    pub fn is_overlay(&self) -> bool {
        !matches!(self, PickableKind::Symbol)
    }
}

impl std::fmt::Display for PickableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickableKind::Marker => write!(f, "marker"),
            PickableKind::Polyline => write!(f, "polyline"),
            PickableKind::Polygon => write!(f, "polygon"),
            PickableKind::Circle => write!(f, "circle"),
            PickableKind::LocationOverlay => write!(f, "location overlay"),
            PickableKind::Symbol => write!(f, "symbol"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PickableProperties {
    pub id: String,
    pub kind: PickableKind,
    /// Draw order across kinds; higher is drawn on top
    pub global_z_index: i32,
    /// Draw order among items with the same global z-index
    pub z_index: i32,
    pub visible: bool,
    /// Whether taps may hit this item
    pub pickable: bool,
    /// Camera zoom range in which the item is drawn
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Caller-defined payload
    pub user_info: serde_json::Value,
}

impl PickableProperties {
    pub fn new(id: impl Into<String>, kind: PickableKind, global_z_index: i32) -> Self {
        Self {
            id: id.into(),
            kind,
            global_z_index,
            z_index: 0,
            visible: true,
            pickable: true,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            user_info: serde_json::Value::Null,
        }
    }

    pub fn visible_at(&self, zoom: f64) -> bool {
        self.visible && zoom >= self.min_zoom && zoom <= self.max_zoom
    }
}

/// Inputs a footprint test needs besides the geometry
#[derive(Debug, Clone, Copy)]
pub struct PickContext<'a> {
    pub projection: &'a Projection,
    pub symbol_scale: f64,
}

/// A rendered element that can be hit-tested
pub trait Pickable: Send + Sync {
    fn properties(&self) -> &PickableProperties;

    fn properties_mut(&mut self) -> &mut PickableProperties;

    fn id(&self) -> &str {
        &self.properties().id
    }

    fn kind(&self) -> PickableKind {
        self.properties().kind
    }

    fn global_z_index(&self) -> i32 {
        self.properties().global_z_index
    }

    fn set_global_z_index(&mut self, global_z_index: i32) {
        self.properties_mut().global_z_index = global_z_index;
    }

    fn z_index(&self) -> i32 {
        self.properties().z_index
    }

    fn set_z_index(&mut self, z_index: i32) {
        self.properties_mut().z_index = z_index;
    }

    fn is_visible(&self) -> bool {
        self.properties().visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.properties_mut().visible = visible;
    }

    /// Layer group gating this item, if any
    fn layer_group(&self) -> Option<&str> {
        None
    }

    /// Envelope of the geometry in normalized world coordinates
    fn world_bounds(&self) -> Option<Bounds>;

    /// Largest distance in points the screen footprint reaches beyond the
    /// world geometry (icon and caption boxes, stroke half width)
    fn screen_extent(&self) -> f64;

    /// Distance in points from `point` to the screen footprint, zero inside.
    /// `None` when the item is not on screen.
    fn hit_distance(&self, context: &PickContext<'_>, point: &Point) -> Option<f64>;

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
