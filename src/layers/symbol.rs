use crate::{
    core::{bounds::Bounds, constants::SYMBOL_GLOBAL_Z_INDEX, geo::{LatLng, Point}},
    layers::{
        base::{PickContext, Pickable, PickableKind, PickableProperties},
        overlay::geo_point,
    },
};
use geo::EuclideanDistance;

/// Default caption box of a symbol, in points at scale 1
const DEFAULT_SYMBOL_SIZE: (f64, f64) = (24.0, 24.0);

/// A labelled point of interest drawn by the base map
pub struct Symbol {
    properties: PickableProperties,
    caption: String,
    position: LatLng,
    width: f64,
    height: f64,
    layer_group: Option<String>,
}

impl Symbol {
    pub fn new(id: impl Into<String>, caption: impl Into<String>, position: LatLng) -> Self {
        Self {
            properties: PickableProperties::new(id, PickableKind::Symbol, SYMBOL_GLOBAL_Z_INDEX),
            caption: caption.into(),
            position,
            width: DEFAULT_SYMBOL_SIZE.0,
            height: DEFAULT_SYMBOL_SIZE.1,
            layer_group: None,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self
    }

    /// Hides the symbol while the layer group is disabled
    pub fn with_layer_group(mut self, group: impl Into<String>) -> Self {
        self.layer_group = Some(group.into());
        self
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    /// Screen box of the symbol at a symbol scale
    pub fn screen_bounds(&self, context: &PickContext<'_>) -> Option<Bounds> {
        let center = context.projection.to_screen_location(&self.position)?;
        Some(Bounds::from_center_and_size(
            center,
            self.width * context.symbol_scale,
            self.height * context.symbol_scale,
        ))
    }
}

impl Pickable for Symbol {
    crate::impl_pickable!(properties);

    fn layer_group(&self) -> Option<&str> {
        self.layer_group.as_deref()
    }

    fn world_bounds(&self) -> Option<Bounds> {
        let world = self.position.to_world();
        Some(Bounds::new(world, world))
    }

    // half diagonal at the largest symbol scale (2)
    fn screen_extent(&self) -> f64 {
        self.width.hypot(self.height)
    }

    fn hit_distance(&self, context: &PickContext<'_>, point: &Point) -> Option<f64> {
        let bounds = self.screen_bounds(context)?;
        Some(geo_point(point).euclidean_distance(&bounds.to_polygon()))
    }
}
