use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use voxmap_world::BoundingRegion;

/// Published description of a region's latest render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    pub region: String,
    pub width: u32,
    pub height: u32,
    pub last_update_ms: u64,
    pub center_x: i32,
    pub center_z: i32,
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl MapInfo {
    pub fn new(region: impl Into<String>, width: u32, height: u32, bounds: &BoundingRegion, now_ms: u64) -> Self {
        let (center_x, center_z) = bounds.center();
        Self {
            region: region.into(),
            width,
            height,
            last_update_ms: now_ms,
            center_x,
            center_z,
            min_x: bounds.min_x(),
            max_x: bounds.max_x(),
            min_z: bounds.min_z(),
            max_z: bounds.max_z(),
        }
    }

    /// World area the image covers. `None` for a degenerate record.
    pub fn bounds(&self) -> Option<BoundingRegion> {
        BoundingRegion::new(self.min_x, self.max_x, self.min_z, self.max_z).ok()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapsFeed {
    pub maps: Vec<MapInfo>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub name: String,
    pub region: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayersFeed {
    pub players: Vec<PlayerEntry>,
}

/// Pretty JSON written next to `path` then renamed over it.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)
}

/// Reads a previously written maps feed. A missing file is an empty feed.
pub fn read_maps(path: &Path) -> io::Result<MapsFeed> {
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).map_err(io::Error::other),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(MapsFeed::default()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_info_projects_bounds() {
        let b = BoundingRegion::new(-32, 64, 0, 48).unwrap();
        let info = MapInfo::new("world", 1152, 576, &b, 42);
        assert_eq!((info.center_x, info.center_z), b.center());
        assert_eq!(info.bounds(), Some(b));
    }

    #[test]
    fn feeds_serialize_with_expected_keys() {
        let feed = PlayersFeed {
            players: vec![PlayerEntry {
                name: "alex".into(),
                region: "world".into(),
                x: 1.5,
                y: 64.0,
                z: -3.0,
            }],
        };
        let v: serde_json::Value = serde_json::to_value(&feed).unwrap();
        assert_eq!(v["players"][0]["name"], "alex");
        assert_eq!(v["players"][0]["z"], -3.0);

        let path = std::env::temp_dir().join(format!("voxmap-feed-{}.json", std::process::id()));
        let maps = MapsFeed {
            maps: vec![MapInfo::new("world", 10, 10, &BoundingRegion::new(0, 16, 0, 16).unwrap(), 7)],
        };
        write_json(&path, &maps).unwrap();
        assert_eq!(read_maps(&path).unwrap(), maps);
        let _ = fs::remove_file(path);
    }
}
