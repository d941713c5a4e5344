use crate::{camera::position::CameraPosition, core::geo::Point, tiles::id::TileId};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Identity of a covering query: bit patterns of the camera, the view size
/// and the tile zoom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoverageKey {
    camera: [u64; 5],
    size: [u64; 2],
    zoom: u8,
}

impl CoverageKey {
    pub fn new(camera: &CameraPosition, size: Point, zoom: u8) -> Self {
        Self {
            camera: [
                camera.target.lat.to_bits(),
                camera.target.lng.to_bits(),
                camera.zoom.to_bits(),
                camera.tilt.to_bits(),
                camera.bearing.to_bits(),
            ],
            size: [size.x.to_bits(), size.y.to_bits()],
            zoom,
        }
    }
}

/// LRU memo of covering results. Clones share the same storage.
#[derive(Debug)]
pub struct CoverageCache {
    cache: Arc<Mutex<LruCache<CoverageKey, Arc<Vec<TileId>>>>>,
}

impl CoverageCache {
    /// Create a cache holding `capacity` results (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn get(&self, key: &CoverageKey) -> Option<Arc<Vec<TileId>>> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    pub fn put(&self, key: CoverageKey, tiles: Arc<Vec<TileId>>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, tiles);
        }
    }

    /// Returns the cached result or computes and stores it
    pub fn get_or_insert_with<F>(&self, key: CoverageKey, compute: F) -> Arc<Vec<TileId>>
    where
        F: FnOnce() -> Vec<TileId>,
    {
        if let Some(tiles) = self.get(&key) {
            return tiles;
        }
        let tiles = Arc::new(compute());
        self.put(key, tiles.clone());
        tiles
    }

    pub fn contains(&self, key: &CoverageKey) -> bool {
        self.cache
            .lock()
            .ok()
            .map(|cache| cache.contains(key))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().ok().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for CoverageCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_memoizes_identical_queries() {
        let cache = CoverageCache::new(4);
        let camera = CameraPosition::new(LatLng::new(37.0, 127.0), 12.0);
        let key = CoverageKey::new(&camera, Point::new(400.0, 800.0), 12);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let tiles = cache.get_or_insert_with(key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                vec![TileId(1), TileId(2)]
            });
            assert_eq!(tiles.len(), 2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let moved = CoverageKey::new(&camera.with_bearing(10.0), Point::new(400.0, 800.0), 12);
        assert!(!cache.contains(&moved));
    }

    #[test]
    fn test_lru_eviction() {
        let cache = CoverageCache::new(2);
        let camera = CameraPosition::new(LatLng::new(0.0, 0.0), 3.0);
        let keys: Vec<CoverageKey> = (0..3)
            .map(|zoom| CoverageKey::new(&camera, Point::new(100.0, 100.0), zoom))
            .collect();

        for key in &keys {
            cache.put(*key, Arc::new(Vec::new()));
        }
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&keys[0]));
        assert!(cache.contains(&keys[2]));

        cache.clear();
        assert!(cache.is_empty());
    }
}
