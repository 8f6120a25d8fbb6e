use std::sync::{Arc, RwLock};

use hashbrown::{HashMap, HashSet};
use voxmap_raster::{Canvas, TileGrid};

/// Latest image per live tile id, served to viewers who join or ask.
#[derive(Debug, Default)]
pub struct TileImageStore {
    images: RwLock<HashMap<u64, Arc<Canvas>>>,
}

impl TileImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, tile_id: u64, image: Arc<Canvas>) {
        let mut images = self.images.write().unwrap_or_else(|e| e.into_inner());
        images.insert(tile_id, image);
    }

    /// Stores each piece under the id at the same grid slot.
    pub fn put_grid(&self, ids: &TileGrid<u64>, pieces: TileGrid<Canvas>) -> Vec<(u64, Arc<Canvas>)> {
        let pieces = pieces.into_vec();
        let mut out = Vec::with_capacity(pieces.len());
        let mut images = self.images.write().unwrap_or_else(|e| e.into_inner());
        for ((_, id), piece) in ids.iter().zip(pieces) {
            let piece = Arc::new(piece);
            images.insert(*id, Arc::clone(&piece));
            out.push((*id, piece));
        }
        out
    }

    pub fn get(&self, tile_id: u64) -> Option<Arc<Canvas>> {
        let images = self.images.read().unwrap_or_else(|e| e.into_inner());
        images.get(&tile_id).cloned()
    }

    /// Drops every image whose id is not in `live`.
    pub fn retain(&self, live: &HashSet<u64>) -> usize {
        let mut images = self.images.write().unwrap_or_else(|e| e.into_inner());
        let before = images.len();
        images.retain(|id, _| live.contains(id));
        before - images.len()
    }

    pub fn len(&self) -> usize {
        self.images.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
