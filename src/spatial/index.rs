use crate::{core::bounds::Bounds, prelude::HashMap, MapError, Result};

use rstar::{RTree, RTreeObject, AABB};

/// An entry of the spatial index: an id, its envelope and a payload
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: String,
    pub bounds: Bounds,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: impl Into<String>, bounds: Bounds, data: T) -> Self {
        Self {
            id: id.into(),
            bounds,
            data,
        }
    }
}

impl<T> PartialEq for SpatialItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for SpatialItem<T> {}

// --- rstar integration -------------------------------------------------------------------------

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        to_envelope(&self.bounds)
    }
}

fn to_envelope(bounds: &Bounds) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [bounds.min.x, bounds.min.y],
        [bounds.max.x, bounds.max.y],
    )
}

/// R-tree keyed by id. Inserting an existing id replaces its entry.
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
    envelopes: HashMap<String, Bounds>,
}

impl<T: Clone> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
            envelopes: HashMap::default(),
        }
    }

    pub fn insert(&mut self, item: SpatialItem<T>) -> Result<()> {
        let finite = [item.bounds.min, item.bounds.max]
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite());
        if !finite {
            return Err(MapError::InvalidCoordinates(format!(
                "item {} has a non-finite envelope {:?}",
                item.id, item.bounds
            )));
        }

        self.remove(&item.id);
        self.envelopes.insert(item.id.clone(), item.bounds);
        self.rtree.insert(item);
        Ok(())
    }

    pub fn query(&self, bounds: &Bounds) -> Vec<&SpatialItem<T>> {
        self.rtree
            .locate_in_envelope_intersecting(&to_envelope(bounds))
            .collect()
    }

    pub fn remove(&mut self, id: &str) -> Option<SpatialItem<T>> {
        let bounds = self.envelopes.remove(id)?;
        // locate through the stored envelope, then remove the matching clone
        let found = self
            .rtree
            .locate_in_envelope(&to_envelope(&bounds))
            .find(|item| item.id == id)
            .cloned()?;
        self.rtree.remove(&found)
    }

    pub fn get(&self, id: &str) -> Option<&SpatialItem<T>> {
        let bounds = self.envelopes.get(id)?;
        self.rtree
            .locate_in_envelope(&to_envelope(bounds))
            .find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.envelopes.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpatialItem<T>> {
        self.rtree.iter()
    }

    /// Envelope of every item, or `None` when empty
    pub fn bounds(&self) -> Option<Bounds> {
        if self.is_empty() {
            return None;
        }
        let envelope = self.rtree.root().envelope();
        Some(Bounds::from_coords(
            envelope.lower()[0],
            envelope.lower()[1],
            envelope.upper()[0],
            envelope.upper()[1],
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
        self.envelopes.clear();
    }
}

impl<T: Clone> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: &str, x: f64, y: f64, half: f64) -> SpatialItem<u32> {
        SpatialItem::new(id, Bounds::from_coords(x - half, y - half, x + half, y + half), 0)
    }

    #[test]
    fn test_insert_query_remove() {
        let mut index = SpatialIndex::new();
        index.insert(square("a", 0.2, 0.2, 0.01)).unwrap();
        index.insert(square("b", 0.8, 0.8, 0.01)).unwrap();
        assert_eq!(index.len(), 2);

        let hits = index.query(&Bounds::from_coords(0.1, 0.1, 0.3, 0.3));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");

        assert!(index.remove("a").is_some());
        assert!(index.remove("a").is_none());
        assert!(index.query(&Bounds::from_coords(0.1, 0.1, 0.3, 0.3)).is_empty());
    }

    #[test]
    fn test_reinsert_replaces() {
        let mut index = SpatialIndex::new();
        index.insert(square("a", 0.2, 0.2, 0.01)).unwrap();
        index.insert(square("a", 0.6, 0.6, 0.01)).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.get("a").unwrap().bounds.contains(&crate::core::geo::Point::new(0.6, 0.6)));
        let bounds = index.bounds().unwrap();
        assert!((bounds.min.x - 0.59).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_finite_envelope() {
        let mut index: SpatialIndex<u32> = SpatialIndex::new();
        assert!(index.insert(square("nan", f64::NAN, 0.0, 0.1)).is_err());
        assert!(index.is_empty());
    }
}
