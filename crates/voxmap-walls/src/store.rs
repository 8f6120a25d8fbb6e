use std::path::PathBuf;

use hashbrown::HashMap;
use toml::{Table, Value};
use voxmap_raster::TileGrid;
use voxmap_world::BlockPos;

use crate::error::{PersistError, WallError};
use crate::mapping::MappingFile;
use crate::tile_ids::{BASE_TILE_ID, TileIdAllocator};
use crate::wall::{Orientation, WallInfo, check_grid_size};

const NEXT_ID_KEY: &str = "next_tile_id";
const WALLS_KEY: &str = "walls";

/// Every wall keyed by region, persisted to one TOML document alongside the
/// tile id counter.
///
/// Layout:
///
/// ```toml
/// next_tile_id = 10000009
///
/// [walls.world]
/// size = 3
/// base_x = 10
/// base_y = 64
/// base_z = -4
/// facing = "south"
/// image_path = "data/maps/world.png"
/// tile_ids = [10000000, 10000001, ...]
/// ```
pub struct WallStore {
    file: MappingFile,
    walls: HashMap<String, WallInfo>,
    ids: TileIdAllocator,
}

impl WallStore {
    /// Opens the store, skipping (and logging) any record that does not decode.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let file = MappingFile::open(path)?;
        let mut store = Self {
            file,
            walls: HashMap::new(),
            ids: TileIdAllocator::default(),
        };
        store.load_records();
        Ok(store)
    }

    fn load_records(&mut self) {
        let persisted = self
            .file
            .get_i64(NEXT_ID_KEY)
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(BASE_TILE_ID);
        self.ids = TileIdAllocator::new(persisted);
        self.walls.clear();
        let Some(table) = self.file.get_table_in(&[WALLS_KEY]).cloned() else {
            return;
        };
        for (region, value) in table {
            match decode(&region, &value) {
                Ok(wall) => {
                    // never hand out an id that a stored wall still shows
                    if let Some(max) = wall.ids().max() {
                        self.ids.advance_to(max + 1);
                    }
                    self.walls.insert(region, wall);
                }
                Err(e) => log::warn!(target: "walls", "Skipping wall record: {e}"),
            }
        }
        log::info!(target: "walls", "Loaded {} wall(s), next tile id {}", self.walls.len(), self.ids.peek());
    }

    /// Allocates `size * size` fresh ids and stores a new wall, replacing any
    /// existing wall for `region`. Nothing changes when validation fails.
    pub fn create(
        &mut self,
        region: &str,
        size: u32,
        origin: BlockPos,
        facing: Orientation,
        image_path: impl Into<PathBuf>,
    ) -> Result<(WallInfo, Option<WallInfo>), WallError> {
        check_grid_size(size)?;
        let ids = self.ids.allocate(u64::from(size) * u64::from(size));
        let wall = WallInfo::new(region, size, origin, facing, image_path, ids)?;
        let old = self.replace(wall.clone())?;
        if let Some(prev) = &old {
            log::info!(
                target: "walls",
                "Replaced wall in '{region}' ({}x{} -> {size}x{size})",
                prev.size,
                prev.size
            );
        }
        Ok((wall, old))
    }

    /// Stores `wall` under its region and saves. On a failed save the store
    /// is left as it was.
    pub fn replace(&mut self, wall: WallInfo) -> Result<Option<WallInfo>, PersistError> {
        let mut next = self.file.clone();
        next.set_in(&[WALLS_KEY, wall.region.as_str()], Value::Table(encode(&wall)));
        next.set(NEXT_ID_KEY, id_value(self.ids.peek()));
        next.save()?;
        self.file = next;
        Ok(self.walls.insert(wall.region.clone(), wall))
    }

    pub fn remove(&mut self, region: &str) -> Result<Option<WallInfo>, PersistError> {
        if !self.walls.contains_key(region) {
            return Ok(None);
        }
        let mut next = self.file.clone();
        next.remove_in(&[WALLS_KEY, region]);
        next.save()?;
        self.file = next;
        Ok(self.walls.remove(region))
    }

    pub fn get(&self, region: &str) -> Option<&WallInfo> {
        self.walls.get(region)
    }

    /// Walls ordered by region name.
    pub fn walls(&self) -> Vec<&WallInfo> {
        let mut out: Vec<&WallInfo> = self.walls.values().collect();
        out.sort_by(|a, b| a.region.cmp(&b.region));
        out
    }

    /// The wall showing `tile_id`, if any.
    pub fn wall_for_tile(&self, tile_id: u64) -> Option<&WallInfo> {
        self.walls.values().find(|w| w.ids().any(|id| id == tile_id))
    }

    pub fn len(&self) -> usize {
        self.walls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    pub fn next_tile_id(&self) -> u64 {
        self.ids.peek()
    }
}

fn id_value(id: u64) -> Value {
    Value::Integer(i64::try_from(id).unwrap_or(i64::MAX))
}

fn encode(wall: &WallInfo) -> Table {
    let mut t = Table::new();
    t.insert("size".into(), Value::Integer(i64::from(wall.size)));
    t.insert("base_x".into(), Value::Integer(i64::from(wall.origin.x)));
    t.insert("base_y".into(), Value::Integer(i64::from(wall.origin.y)));
    t.insert("base_z".into(), Value::Integer(i64::from(wall.origin.z)));
    t.insert("facing".into(), Value::String(wall.facing.as_str().to_string()));
    t.insert(
        "image_path".into(),
        Value::String(wall.image_path.to_string_lossy().into_owned()),
    );
    t.insert(
        "tile_ids".into(),
        Value::Array(wall.ids().map(id_value).collect()),
    );
    t
}

fn decode(region: &str, value: &Value) -> Result<WallInfo, PersistError> {
    let t = value
        .as_table()
        .ok_or_else(|| PersistError::corrupt(region, "not a table"))?;
    let int = |key: &str| -> Result<i64, PersistError> {
        t.get(key)
            .and_then(Value::as_integer)
            .ok_or_else(|| PersistError::corrupt(region, format!("missing integer '{key}'")))
    };
    let coord = |key: &str| -> Result<i32, PersistError> {
        i32::try_from(int(key)?).map_err(|_| PersistError::corrupt(region, format!("'{key}' out of range")))
    };

    let size = u32::try_from(int("size")?)
        .map_err(|_| PersistError::corrupt(region, "negative size"))?;
    check_grid_size(size).map_err(|e| PersistError::corrupt(region, e.to_string()))?;
    let origin = BlockPos::new(coord("base_x")?, coord("base_y")?, coord("base_z")?);
    let facing = t
        .get("facing")
        .and_then(Value::as_str)
        .and_then(Orientation::parse)
        .ok_or_else(|| PersistError::corrupt(region, "bad facing"))?;
    let image_path = t
        .get("image_path")
        .and_then(Value::as_str)
        .ok_or_else(|| PersistError::corrupt(region, "missing image_path"))?;

    let raw = t
        .get("tile_ids")
        .and_then(Value::as_array)
        .ok_or_else(|| PersistError::corrupt(region, "missing tile_ids"))?;
    let mut ids = Vec::with_capacity(raw.len());
    for v in raw {
        let id = v
            .as_integer()
            .and_then(|i| u64::try_from(i).ok())
            .ok_or_else(|| PersistError::corrupt(region, "tile id is not a non-negative integer"))?;
        ids.push(id);
    }
    let mut distinct = ids.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() != ids.len() {
        return Err(PersistError::corrupt(region, "duplicate tile ids"));
    }
    let found = ids.len();
    let tile_ids = TileGrid::from_vec(size, ids).ok_or_else(|| {
        PersistError::corrupt(region, format!("expected {} tile ids, found {found}", size * size))
    })?;

    Ok(WallInfo {
        region: region.to_string(),
        size,
        origin,
        facing,
        image_path: PathBuf::from(image_path),
        tile_ids,
    })
}
