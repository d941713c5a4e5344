//! Hit-testing of overlays and symbols around a screen point.
//!
//! Candidates come from an R-tree over normalized world envelopes: the query
//! square around the point, grown by the largest screen footprint, is
//! unprojected to the ground and looked up in the tree (and in the world
//! copies on either side). Every candidate then runs its exact screen-space
//! footprint test. Results are ordered topmost first.

use crate::{
    core::{bounds::Bounds, constants::LOCATION_OVERLAY_ID, geo::Point, projection::Projection},
    layers::{
        base::{PickContext, Pickable, PickableKind},
        groups::LayerGroups,
        location::LocationOverlay,
    },
    prelude::{HashMap, HashSet},
    spatial::index::{SpatialIndex, SpatialItem},
    MapError, Result,
};
use std::cmp::Ordering;

/// State outside the pickables that decides what can be hit
#[derive(Debug, Clone, Copy)]
pub struct PickFilter<'a> {
    pub layer_groups: &'a LayerGroups,
    pub symbol_scale: f64,
    /// Lite mode turns this off
    pub symbols_enabled: bool,
}

/// One entry of a pick result
#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub id: String,
    pub kind: PickableKind,
    pub global_z_index: i32,
    pub z_index: i32,
    /// Distance in points from the query point to the footprint
    pub distance: f64,
    sequence: u64,
}

struct Entry {
    pickable: Box<dyn Pickable>,
    sequence: u64,
}

/// Registry and spatial index of everything that can be picked. The map's
/// location overlay lives here permanently under [`LOCATION_OVERLAY_ID`].
pub struct PickEngine {
    entries: HashMap<String, Entry>,
    location: LocationOverlay,
    index: SpatialIndex<()>,
    next_sequence: u64,
    /// Largest screen footprint reach among the entries
    max_screen_extent: f64,
}

impl PickEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            entries: HashMap::default(),
            location: LocationOverlay::new(),
            index: SpatialIndex::new(),
            next_sequence: 0,
            max_screen_extent: 0.0,
        };
        engine.index_location();
        engine
    }

    /// Adds a pickable, replacing any with the same id. A replaced item
    /// counts as newly added for ordering.
    pub fn add<P: Pickable + 'static>(&mut self, pickable: P) -> Result<()> {
        reject_reserved(pickable.id())?;
        self.insert(Box::new(pickable), None)
    }

    /// Replaces an existing pickable, keeping its insertion order
    pub fn update<P: Pickable + 'static>(&mut self, pickable: P) -> Result<()> {
        reject_reserved(pickable.id())?;
        let sequence = self
            .entries
            .get(pickable.id())
            .map(|entry| entry.sequence)
            .ok_or_else(|| MapError::UnknownPickable(pickable.id().to_string()))?;
        self.insert(Box::new(pickable), Some(sequence))
    }

    fn insert(&mut self, pickable: Box<dyn Pickable>, sequence: Option<u64>) -> Result<()> {
        let id = pickable.id().to_string();
        let bounds = pickable.world_bounds().ok_or_else(|| {
            MapError::InvalidCoordinates(format!("{} {} has no geometry", pickable.kind(), id))
        })?;
        self.index.insert(SpatialItem::new(id.clone(), bounds, ()))?;

        let sequence = sequence.unwrap_or_else(|| {
            self.next_sequence += 1;
            self.next_sequence
        });
        self.max_screen_extent = self.max_screen_extent.max(pickable.screen_extent());
        log::debug!("pickable {} {} indexed at {:?}", pickable.kind(), id, bounds);
        self.entries.insert(id, Entry { pickable, sequence });
        Ok(())
    }

    /// Removes an added pickable. The location overlay cannot be removed.
    pub fn remove(&mut self, id: &str) -> Option<Box<dyn Pickable>> {
        if id == LOCATION_OVERLAY_ID {
            log::warn!("the location overlay cannot be removed; hide it instead");
            return None;
        }
        self.index.remove(id);
        let removed = self.entries.remove(id).map(|entry| entry.pickable);
        if self.entries.is_empty() {
            self.max_screen_extent = self.location.screen_extent();
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&dyn Pickable> {
        if id == LOCATION_OVERLAY_ID {
            let location: &dyn Pickable = &self.location;
            return Some(location);
        }
        self.entries.get(id).map(|entry| entry.pickable.as_ref())
    }

    /// Typed access, e.g. `engine.get_as::<Marker>("m1")`
    pub fn get_as<T: 'static>(&self, id: &str) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref::<T>()
    }

    /// Mutable access for properties that do not move the geometry
    /// (visibility, z-indices, zoom range). Geometry changes go through
    /// [`PickEngine::update`].
    pub fn properties_mut(&mut self, id: &str) -> Result<&mut crate::layers::base::PickableProperties> {
        if id == LOCATION_OVERLAY_ID {
            return Ok(self.location.properties_mut());
        }
        self.entries
            .get_mut(id)
            .map(|entry| entry.pickable.properties_mut())
            .ok_or_else(|| MapError::UnknownPickable(id.to_string()))
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) -> Result<()> {
        self.properties_mut(id)?.visible = visible;
        Ok(())
    }

    /// The map's location overlay; always the same object
    pub fn location_overlay(&self) -> &LocationOverlay {
        &self.location
    }

    /// Edits the location overlay and re-indexes it
    pub fn update_location_overlay<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut LocationOverlay),
    {
        edit(&mut self.location);
        self.index_location();
    }

    fn index_location(&mut self) {
        let world = self.location.position().to_world();
        let item = SpatialItem::new(LOCATION_OVERLAY_ID, Bounds::new(world, world), ());
        if let Err(err) = self.index.insert(item) {
            log::warn!("location overlay not indexed: {}", err);
        }
        self.max_screen_extent = self.max_screen_extent.max(self.location.screen_extent());
    }

    pub fn contains(&self, id: &str) -> bool {
        id == LOCATION_OVERLAY_ID || self.entries.contains_key(id)
    }

    /// Ids of the added pickables, sorted; the location overlay is not listed
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of added pickables
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every added pickable; the location overlay stays
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.max_screen_extent = 0.0;
        self.index_location();
    }

    fn lookup(&self, id: &str) -> Option<(&dyn Pickable, u64)> {
        if id == LOCATION_OVERLAY_ID {
            let location: &dyn Pickable = &self.location;
            return Some((location, 0));
        }
        self.entries
            .get(id)
            .map(|entry| (entry.pickable.as_ref(), entry.sequence))
    }

    /// Every pickable whose footprint lies within `tolerance` points of
    /// `point`, topmost first
    pub fn pick_all(
        &self,
        projection: &Projection,
        point: &Point,
        tolerance: u32,
        filter: &PickFilter<'_>,
    ) -> Vec<PickHit> {
        let tolerance = f64::from(tolerance);
        let zoom = projection.camera().zoom;
        let context = PickContext {
            projection,
            symbol_scale: filter.symbol_scale,
        };

        let mut hits: Vec<PickHit> = self
            .candidates(projection, point, tolerance)
            .into_iter()
            .filter_map(|id| self.lookup(&id))
            .filter(|(pickable, _)| self.is_eligible(*pickable, zoom, filter))
            .filter_map(|(pickable, sequence)| {
                let distance = pickable.hit_distance(&context, point)?;
                (distance <= tolerance).then(|| PickHit {
                    id: pickable.id().to_string(),
                    kind: pickable.kind(),
                    global_z_index: pickable.global_z_index(),
                    z_index: pickable.z_index(),
                    distance,
                    sequence,
                })
            })
            .collect();

        hits.sort_by(topmost_first);
        hits
    }

    /// The topmost pickable exactly under `point`
    pub fn pick(
        &self,
        projection: &Projection,
        point: &Point,
        filter: &PickFilter<'_>,
    ) -> Option<PickHit> {
        self.pick_all(projection, point, 0, filter).into_iter().next()
    }

    fn is_eligible(&self, pickable: &dyn Pickable, zoom: f64, filter: &PickFilter<'_>) -> bool {
        let properties = pickable.properties();
        if !properties.pickable || !properties.visible_at(zoom) {
            return false;
        }
        if pickable.kind() == PickableKind::Symbol && !filter.symbols_enabled {
            return false;
        }
        pickable
            .layer_group()
            .map_or(true, |group| filter.layer_groups.is_enabled(group))
    }

    /// Ids whose world envelope may reach the query square
    fn candidates(&self, projection: &Projection, point: &Point, tolerance: f64) -> Vec<String> {
        let reach = tolerance + self.max_screen_extent + 1.0;
        let square = Bounds::from_center_and_size(*point, reach * 2.0, reach * 2.0);

        let corners: Option<Vec<Point>> = square
            .corners()
            .iter()
            .map(|corner| projection.screen_to_world(corner))
            .collect();
        let Some(area) = corners.as_deref().and_then(Bounds::from_points) else {
            // part of the square is above the horizon
            return self.index.iter().map(|item| item.id.clone()).collect();
        };

        let mut seen = HashSet::default();
        let mut ids = Vec::new();
        for shift in [0.0, -1.0, 1.0] {
            let shifted = Bounds::from_coords(
                area.min.x + shift,
                area.min.y,
                area.max.x + shift,
                area.max.y,
            );
            for item in self.index.query(&shifted) {
                if seen.insert(item.id.as_str()) {
                    ids.push(item.id.clone());
                }
            }
        }
        ids
    }
}

impl Default for PickEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn reject_reserved(id: &str) -> Result<()> {
    if id == LOCATION_OVERLAY_ID {
        return Err(MapError::InvalidConfig(format!(
            "{} is reserved for the location overlay",
            id
        )));
    }
    Ok(())
}

/// Higher global z-index, then higher z-index, then later insertion
fn topmost_first(a: &PickHit, b: &PickHit) -> Ordering {
    b.global_z_index
        .cmp(&a.global_z_index)
        .then(b.z_index.cmp(&a.z_index))
        .then(b.sequence.cmp(&a.sequence))
}
