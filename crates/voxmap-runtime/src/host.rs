use std::sync::Arc;

use voxmap_raster::{Canvas, ViewerSample};
use voxmap_world::{BlockPos, WorldStore};

/// Opaque handle the host uses for a connected viewer.
pub type RecipientId = u64;

/// One viewer as seen at the start of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerSnapshot {
    pub id: RecipientId,
    pub name: String,
    pub region: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
}

impl ViewerSnapshot {
    /// Marker sample at the viewer's block column.
    pub fn sample(&self) -> ViewerSample {
        ViewerSample::new(self.name.clone(), self.x.floor(), self.z.floor())
    }

    pub fn block_pos(&self) -> BlockPos {
        BlockPos::new(self.x.floor() as i32, self.y.floor() as i32, self.z.floor() as i32)
    }
}

/// Pushes tile images to viewers. Sends are fire-and-forget.
pub trait Transport: Send + Sync {
    fn is_connected(&self, recipient: RecipientId) -> bool;
    fn send_tile(&self, recipient: RecipientId, tile_id: u64, image: &Canvas);
}

/// Mutates the world to hang a wall.
pub trait WallPlacer: Send + Sync {
    fn place_backing(&self, region: &str, pos: BlockPos);
    /// Hangs a frame with `meta` orientation showing `tile_id`. `image` is
    /// `None` when the tile has no stored picture yet.
    fn place_frame(&self, region: &str, pos: BlockPos, meta: u8, tile_id: u64, image: Option<&Canvas>);
}

/// Everything the map service needs from the game host.
pub trait Host: Transport + WallPlacer {
    /// World data for `region`, or `None` if the host does not know it.
    fn world(&self, region: &str) -> Option<Arc<dyn WorldStore>>;
    fn viewers(&self) -> Vec<ViewerSnapshot>;
}
