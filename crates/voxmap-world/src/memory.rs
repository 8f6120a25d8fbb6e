use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use hashbrown::{HashMap, HashSet};
use voxmap_palette::Material;

use crate::cell::{BlockPos, CELL_SIZE, Cell};
use crate::store::{StoreError, WorldStore};

const COLUMNS: usize = (CELL_SIZE * CELL_SIZE) as usize;

/// Block stacks for one cell, indexed `[lz * 16 + lx][y]`.
#[derive(Clone, Debug)]
pub struct CellData {
    columns: Vec<Vec<Material>>,
}

impl Default for CellData {
    fn default() -> Self {
        Self {
            columns: vec![Vec::new(); COLUMNS],
        }
    }
}

impl CellData {
    /// Every column filled with `material` from y=0 up to and including `top`.
    pub fn flat(material: Material, top: i32) -> Self {
        let mut data = Self::default();
        for lx in 0..16 {
            for lz in 0..16 {
                data.fill_column(lx, lz, material, top);
            }
        }
        data
    }

    #[inline]
    fn index(lx: u8, lz: u8) -> usize {
        usize::from(lz) * CELL_SIZE as usize + usize::from(lx)
    }

    pub fn fill_column(&mut self, lx: u8, lz: u8, material: Material, top: i32) {
        let col = &mut self.columns[Self::index(lx, lz)];
        col.clear();
        if top >= 0 {
            col.resize(top as usize + 1, material);
        }
    }

    pub fn set_block(&mut self, lx: u8, y: i32, lz: u8, material: Material) {
        if y < 0 {
            return;
        }
        let col = &mut self.columns[Self::index(lx, lz)];
        let y = y as usize;
        if col.len() <= y {
            col.resize(y + 1, Material::AIR);
        }
        col[y] = material;
    }

    pub fn highest(&self, lx: u8, lz: u8) -> i32 {
        let col = &self.columns[Self::index(lx, lz)];
        col.iter()
            .rposition(|m| m.id != 0)
            .map(|y| y as i32)
            .unwrap_or(-1)
    }

    pub fn material(&self, lx: u8, y: i32, lz: u8) -> Material {
        if y < 0 {
            return Material::AIR;
        }
        self.columns[Self::index(lx, lz)]
            .get(y as usize)
            .copied()
            .unwrap_or(Material::AIR)
    }
}

pub type CellGenerator = dyn Fn(Cell) -> Option<CellData> + Send + Sync;

/// In-process world store. Cells are either inserted up front or produced on
/// first existence probe by an optional generator.
pub struct MemoryWorld {
    cells: RwLock<HashMap<Cell, CellData>>,
    absent: RwLock<HashSet<Cell>>,
    failing: RwLock<HashSet<Cell>>,
    generator: Option<Box<CellGenerator>>,
    spawn: RwLock<BlockPos>,
    viewers: RwLock<Vec<BlockPos>>,
    enumerable: bool,
    probes: AtomicU64,
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
            absent: RwLock::new(HashSet::new()),
            failing: RwLock::new(HashSet::new()),
            generator: None,
            spawn: RwLock::new(BlockPos::default()),
            viewers: RwLock::new(Vec::new()),
            enumerable: false,
            probes: AtomicU64::new(0),
        }
    }

    pub fn with_generator<F>(generator: F) -> Self
    where
        F: Fn(Cell) -> Option<CellData> + Send + Sync + 'static,
    {
        Self {
            generator: Some(Box::new(generator)),
            ..Self::new()
        }
    }

    /// Expose inserted cells through [`WorldStore::known_cells`].
    pub fn enumerable(mut self, on: bool) -> Self {
        self.enumerable = on;
        self
    }

    pub fn insert_cell(&self, cell: Cell, data: CellData) {
        write(&self.absent).remove(&cell);
        write(&self.cells).insert(cell, data);
    }

    pub fn remove_cell(&self, cell: Cell) {
        write(&self.cells).remove(&cell);
    }

    /// Queries touching `cell` will return an error.
    pub fn fail_cell(&self, cell: Cell) {
        write(&self.failing).insert(cell);
    }

    pub fn set_spawn(&self, pos: BlockPos) {
        *write(&self.spawn) = pos;
    }

    pub fn set_viewers(&self, positions: Vec<BlockPos>) {
        *write(&self.viewers) = positions;
    }

    pub fn cell_count(&self) -> usize {
        read(&self.cells).len()
    }

    /// Number of existence probes answered so far.
    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::Relaxed)
    }

    fn check(&self, cell: Cell) -> Result<(), StoreError> {
        if read(&self.failing).contains(&cell) {
            return Err(StoreError::at(cell, "cell unreadable"));
        }
        Ok(())
    }

    fn with_cell<T>(&self, cell: Cell, f: impl FnOnce(&CellData) -> T) -> Result<T, StoreError> {
        self.check(cell)?;
        let cells = read(&self.cells);
        match cells.get(&cell) {
            Some(data) => Ok(f(data)),
            None => Err(StoreError::at(cell, "cell not loaded")),
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn check_local(cell: Cell, lx: u8, lz: u8) -> Result<(), StoreError> {
    if i32::from(lx) >= CELL_SIZE || i32::from(lz) >= CELL_SIZE {
        return Err(StoreError::at(cell, format!("local column ({lx}, {lz}) out of range")));
    }
    Ok(())
}

impl WorldStore for MemoryWorld {
    fn cell_exists(&self, cell: Cell) -> Result<bool, StoreError> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        self.check(cell)?;
        if read(&self.cells).contains_key(&cell) {
            return Ok(true);
        }
        let Some(generator) = self.generator.as_ref() else {
            return Ok(false);
        };
        if read(&self.absent).contains(&cell) {
            return Ok(false);
        }
        match generator(cell) {
            Some(data) => {
                write(&self.cells).entry(cell).or_insert(data);
                Ok(true)
            }
            None => {
                write(&self.absent).insert(cell);
                Ok(false)
            }
        }
    }

    fn highest_opaque_y(&self, cell: Cell, lx: u8, lz: u8) -> Result<i32, StoreError> {
        check_local(cell, lx, lz)?;
        self.with_cell(cell, |d| d.highest(lx, lz))
    }

    fn material_at(&self, cell: Cell, lx: u8, y: i32, lz: u8) -> Result<Material, StoreError> {
        check_local(cell, lx, lz)?;
        self.with_cell(cell, |d| d.material(lx, y, lz))
    }

    fn spawn_point(&self) -> Result<BlockPos, StoreError> {
        Ok(*read(&self.spawn))
    }

    fn connected_viewer_cells(&self) -> Result<Vec<Cell>, StoreError> {
        Ok(read(&self.viewers).iter().map(|p| p.cell()).collect())
    }

    fn known_cells(&self) -> Option<Vec<Cell>> {
        if !self.enumerable {
            return None;
        }
        let mut cells: Vec<Cell> = read(&self.cells).keys().copied().collect();
        cells.sort();
        Some(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_memoised() {
        let world = MemoryWorld::with_generator(|c| {
            (c.cx == 1).then(|| CellData::flat(Material::plain(1), 4))
        });
        assert!(world.cell_exists(Cell::new(1, 7)).unwrap());
        assert!(!world.cell_exists(Cell::new(0, 0)).unwrap());
        assert!(!world.cell_exists(Cell::new(0, 0)).unwrap());
        assert_eq!(world.cell_count(), 1);
        assert_eq!(world.highest_opaque_y(Cell::new(1, 7), 3, 3).unwrap(), 4);
        assert_eq!(world.probe_count(), 3);
    }

    #[test]
    fn failing_cells_error() {
        let world = MemoryWorld::new();
        world.insert_cell(Cell::new(0, 0), CellData::flat(Material::plain(2), 10));
        world.fail_cell(Cell::new(0, 0));
        assert!(world.cell_exists(Cell::new(0, 0)).is_err());
        assert!(world.material_at(Cell::new(0, 0), 0, 0, 0).is_err());
    }

    #[test]
    fn set_block_extends_column() {
        let mut d = CellData::default();
        assert_eq!(d.highest(2, 3), -1);
        d.set_block(2, 5, 3, Material::plain(20));
        assert_eq!(d.highest(2, 3), 5);
        assert_eq!(d.material(2, 4, 3), Material::AIR);
        assert_eq!(d.material(2, 5, 3), Material::plain(20));
    }
}
