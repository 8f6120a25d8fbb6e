use std::path::PathBuf;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use toml::Value;
use voxmap_world::{BoundingRegion, RegionError};

use crate::MIN_REGION_RADIUS;
use crate::error::{PersistError, WallError};
use crate::mapping::MappingFile;

const REGIONS_KEY: &str = "regions";

/// Explicit render area for a region. Only an enabled config switches
/// rendering to bounded mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub center_x: i32,
    pub center_z: i32,
    pub radius: i32,
    #[serde(default)]
    pub enabled: bool,
}

impl RegionConfig {
    /// Side length of the square area in blocks.
    pub fn side(&self) -> i64 {
        i64::from(self.radius) * 2
    }

    pub fn bounds(&self) -> Result<BoundingRegion, RegionError> {
        BoundingRegion::centered(self.center_x, self.center_z, self.radius)
    }
}

/// Per-region render configuration persisted to `regions.toml`.
pub struct RegionRegistry {
    file: MappingFile,
    regions: HashMap<String, RegionConfig>,
}

impl RegionRegistry {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let file = MappingFile::open(path)?;
        let mut regions = HashMap::new();
        if let Some(table) = file.get_table_in(&[REGIONS_KEY]) {
            for (name, value) in table {
                match value.clone().try_into::<RegionConfig>() {
                    Ok(cfg) if cfg.radius >= MIN_REGION_RADIUS => {
                        regions.insert(name.clone(), cfg);
                    }
                    Ok(cfg) => log::warn!(target: "walls", "Skipping region '{name}': radius {} too small", cfg.radius),
                    Err(e) => log::warn!(target: "walls", "Skipping region '{name}': {e}"),
                }
            }
        }
        Ok(Self { file, regions })
    }

    /// Records a new area for `region`. It stays disabled until [`confirm`](Self::confirm).
    pub fn set(&mut self, region: &str, center_x: i32, center_z: i32, radius: i32) -> Result<RegionConfig, WallError> {
        if radius < MIN_REGION_RADIUS {
            return Err(WallError::InvalidRadius(radius));
        }
        let cfg = RegionConfig {
            center_x,
            center_z,
            radius,
            enabled: false,
        };
        cfg.bounds()?;
        self.store(region, cfg)?;
        log::info!(
            target: "walls",
            "Region '{region}' set to center ({center_x}, {center_z}) radius {radius}, awaiting confirmation"
        );
        Ok(cfg)
    }

    /// Enables the pending config. Returns false when the region has none.
    pub fn confirm(&mut self, region: &str) -> Result<bool, WallError> {
        let Some(mut cfg) = self.regions.get(region).copied() else {
            return Ok(false);
        };
        cfg.enabled = true;
        self.store(region, cfg)?;
        Ok(true)
    }

    /// Removes the config so the region falls back to full renders.
    pub fn clear(&mut self, region: &str) -> Result<Option<RegionConfig>, WallError> {
        if !self.regions.contains_key(region) {
            return Ok(None);
        }
        let mut next = self.file.clone();
        next.remove_in(&[REGIONS_KEY, region]);
        next.save()?;
        self.file = next;
        Ok(self.regions.remove(region))
    }

    pub fn get(&self, region: &str) -> Option<&RegionConfig> {
        self.regions.get(region)
    }

    /// The config to render with, if one is enabled.
    pub fn active(&self, region: &str) -> Option<&RegionConfig> {
        self.regions.get(region).filter(|c| c.enabled)
    }

    /// All configs ordered by region name.
    pub fn info(&self) -> Vec<(&str, &RegionConfig)> {
        let mut out: Vec<(&str, &RegionConfig)> =
            self.regions.iter().map(|(k, v)| (k.as_str(), v)).collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    fn store(&mut self, region: &str, cfg: RegionConfig) -> Result<(), WallError> {
        let value = Value::try_from(cfg).map_err(PersistError::from)?;
        let mut next = self.file.clone();
        next.set_in(&[REGIONS_KEY, region], value);
        next.save()?;
        self.file = next;
        self.regions.insert(region.to_string(), cfg);
        Ok(())
    }
}
