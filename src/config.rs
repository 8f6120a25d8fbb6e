use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use voxmap_palette::PixelColorTable;
use voxmap_runtime::ServiceSettings;

const MIN_CANVAS_DIM: u32 = 128;

/// Contents of `voxmap.toml`. Every key is optional.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub render_regions: Vec<String>,
    pub render_interval_hours: i64,
    pub marker_update_seconds: i64,
    pub cache_ttl_seconds: u64,
    pub delivery_batch_size: usize,
    pub max_canvas_dim: u32,
    pub ticks_per_second: u32,
    pub palette: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let s = ServiceSettings::default();
        Self {
            data_dir: s.data_dir,
            render_regions: s.render_regions,
            render_interval_hours: i64::from(s.render_interval_hours),
            marker_update_seconds: i64::from(s.marker_update_seconds),
            cache_ttl_seconds: s.cache_ttl.as_secs(),
            delivery_batch_size: s.delivery_batch_size,
            max_canvas_dim: s.max_canvas_dim,
            ticks_per_second: s.ticks_per_second,
            palette: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }

    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path)?;
        let cfg = Self::from_toml_str(&s).map_err(|e| format!("{}: {e}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(cfg)
    }

    /// The built-in table, with the configured overrides applied.
    pub fn load_palette(&self) -> Result<PixelColorTable, Box<dyn Error>> {
        match &self.palette {
            Some(path) => {
                let table = PixelColorTable::from_path(path)?;
                log::info!(
                    "Palette: {} override(s) from {}",
                    table.override_count(),
                    path.display()
                );
                Ok(table)
            }
            None => Ok(PixelColorTable::builtin()),
        }
    }

    /// Validated runtime settings.
    pub fn settings(&self) -> ServiceSettings {
        let render_regions = if self.render_regions.is_empty() {
            ServiceSettings::default().render_regions
        } else {
            self.render_regions.clone()
        };
        ServiceSettings {
            data_dir: self.data_dir.clone(),
            render_regions,
            render_interval_hours: self.render_interval_hours.clamp(0, i64::from(u32::MAX)) as u32,
            marker_update_seconds: self.marker_update_seconds.clamp(1, 60) as u32,
            cache_ttl: Duration::from_secs(self.cache_ttl_seconds),
            delivery_batch_size: self.delivery_batch_size.max(1),
            max_canvas_dim: self.max_canvas_dim.max(MIN_CANVAS_DIM),
            ticks_per_second: self.ticks_per_second.max(1),
        }
    }
}
