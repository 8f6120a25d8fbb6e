use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use hashbrown::HashMap;
use voxmap_raster::Canvas;
use voxmap_runtime::{Host, RecipientId, Transport, ViewerSnapshot, WallPlacer};
use voxmap_world::{BlockPos, WorldStore};

/// Stand-in game host: a fixed set of worlds and scripted viewers. Tile sends
/// and block placements are only counted and logged.
#[derive(Default)]
pub struct DemoHost {
    worlds: HashMap<String, Arc<dyn WorldStore>>,
    viewers: RwLock<Vec<ViewerSnapshot>>,
    tiles_sent: AtomicUsize,
    blocks_placed: AtomicUsize,
}

impl DemoHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_world(mut self, region: &str, world: Arc<dyn WorldStore>) -> Self {
        self.worlds.insert(region.to_string(), world);
        self
    }

    pub fn regions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.worlds.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn spawn(&self, region: &str) -> Option<BlockPos> {
        self.worlds.get(region).and_then(|w| w.spawn_point().ok())
    }

    /// Adds or replaces the viewer with the same id.
    pub fn upsert_viewer(&self, viewer: ViewerSnapshot) {
        let mut viewers = self.viewers.write().unwrap_or_else(|e| e.into_inner());
        match viewers.iter_mut().find(|v| v.id == viewer.id) {
            Some(v) => *v = viewer,
            None => viewers.push(viewer),
        }
    }

    pub fn tiles_sent(&self) -> usize {
        self.tiles_sent.load(Ordering::Relaxed)
    }

    pub fn blocks_placed(&self) -> usize {
        self.blocks_placed.load(Ordering::Relaxed)
    }
}

impl Transport for DemoHost {
    fn is_connected(&self, recipient: RecipientId) -> bool {
        self.viewers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|v| v.id == recipient)
    }

    fn send_tile(&self, recipient: RecipientId, tile_id: u64, image: &Canvas) {
        self.tiles_sent.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            target: "host",
            "tile {tile_id} ({}x{}) -> viewer {recipient}",
            image.width,
            image.height
        );
    }
}

impl WallPlacer for DemoHost {
    fn place_backing(&self, region: &str, pos: BlockPos) {
        self.blocks_placed.fetch_add(1, Ordering::Relaxed);
        log::trace!(target: "host", "backing in '{region}' at {pos:?}");
    }

    fn place_frame(&self, region: &str, pos: BlockPos, meta: u8, tile_id: u64, image: Option<&Canvas>) {
        log::trace!(
            target: "host",
            "frame in '{region}' at {pos:?} meta={meta} tile={tile_id} image={}",
            image.is_some()
        );
    }
}

impl Host for DemoHost {
    fn world(&self, region: &str) -> Option<Arc<dyn WorldStore>> {
        self.worlds.get(region).cloned()
    }

    fn viewers(&self) -> Vec<ViewerSnapshot> {
        self.viewers.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxmap_world::MemoryWorld;

    fn viewer(id: u64, x: f64) -> ViewerSnapshot {
        ViewerSnapshot {
            id,
            name: format!("v{id}"),
            region: "world".into(),
            x,
            y: 64.0,
            z: 0.0,
            yaw: 0.0,
        }
    }

    #[test]
    fn viewers_are_replaced_by_id() {
        let host = DemoHost::new().with_world("world", Arc::new(MemoryWorld::new()));
        host.upsert_viewer(viewer(1, 0.0));
        host.upsert_viewer(viewer(2, 0.0));
        host.upsert_viewer(viewer(1, 9.5));
        let viewers = host.viewers();
        assert_eq!(viewers.len(), 2);
        assert_eq!(viewers[0].x, 9.5);
        assert!(host.is_connected(2));
        assert!(!host.is_connected(3));
        assert!(host.world("world").is_some());
        assert!(host.world("nether").is_none());
        assert_eq!(host.regions(), vec!["world".to_string()]);
    }
}
