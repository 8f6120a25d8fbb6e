use std::path::PathBuf;
use std::time::Duration;

use voxmap_raster::DEFAULT_MAX_CANVAS_DIM;

use crate::delivery::DEFAULT_BATCH_SIZE;

/// Seconds after start before the first render of every region.
pub const INITIAL_RENDER_DELAY_SECS: u64 = 5;
/// Seconds after start before persisted walls are re-split and pushed.
pub const WALL_REFRESH_DELAY_SECS: u64 = 2;
/// Delay between a viewer joining and their walls being queued.
pub const JOIN_DELAY_SECS: u64 = 5;

/// Runtime knobs for [`MapService`](crate::MapService), already validated.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceSettings {
    pub data_dir: PathBuf,
    pub render_regions: Vec<String>,
    pub render_interval_hours: u32,
    pub marker_update_seconds: u32,
    pub cache_ttl: Duration,
    pub delivery_batch_size: usize,
    pub max_canvas_dim: u32,
    pub ticks_per_second: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            render_regions: vec!["world".to_string()],
            render_interval_hours: 24,
            marker_update_seconds: 2,
            cache_ttl: Duration::from_secs(600),
            delivery_batch_size: DEFAULT_BATCH_SIZE,
            max_canvas_dim: DEFAULT_MAX_CANVAS_DIM,
            ticks_per_second: 20,
        }
    }
}

impl ServiceSettings {
    pub fn maps_dir(&self) -> PathBuf {
        self.data_dir.join("maps")
    }

    pub fn walls_file(&self) -> PathBuf {
        self.data_dir.join("walls.toml")
    }

    pub fn regions_file(&self) -> PathBuf {
        self.data_dir.join("regions.toml")
    }

    pub fn maps_feed(&self) -> PathBuf {
        self.data_dir.join("maps.json")
    }

    pub fn players_feed(&self) -> PathBuf {
        self.data_dir.join("players.json")
    }

    pub fn secs_to_ticks(&self, secs: u64) -> u64 {
        secs * u64::from(self.ticks_per_second.max(1))
    }

    pub fn marker_period_ticks(&self) -> u64 {
        self.secs_to_ticks(u64::from(self.marker_update_seconds.clamp(1, 60)))
    }

    /// Zero when periodic rendering is off.
    pub fn render_period_ticks(&self) -> u64 {
        self.secs_to_ticks(u64::from(self.render_interval_hours) * 3600)
    }
}
