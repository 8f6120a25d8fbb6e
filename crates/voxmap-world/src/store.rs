use std::fmt;

use voxmap_palette::Material;

use crate::cell::{BlockPos, Cell};

/// A world-store query failed. Callers treat this as "no data".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub cell: Option<Cell>,
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            cell: None,
            message: message.into(),
        }
    }

    pub fn at(cell: Cell, message: impl Into<String>) -> Self {
        Self {
            cell: Some(cell),
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell {
            Some(c) => write!(f, "store error at cell ({}, {}): {}", c.cx, c.cz, self.message),
            None => write!(f, "store error: {}", self.message),
        }
    }
}

impl std::error::Error for StoreError {}

/// Read access to a voxel world. Local coordinates are `0..16` within the cell.
pub trait WorldStore: Send + Sync {
    /// Whether the cell holds data. May materialise the cell as a side effect.
    fn cell_exists(&self, cell: Cell) -> Result<bool, StoreError>;

    /// Y of the topmost non-air block in the column, or a negative value for
    /// an empty column.
    fn highest_opaque_y(&self, cell: Cell, lx: u8, lz: u8) -> Result<i32, StoreError>;

    fn material_at(&self, cell: Cell, lx: u8, y: i32, lz: u8) -> Result<Material, StoreError>;

    fn spawn_point(&self) -> Result<BlockPos, StoreError>;

    fn connected_viewer_cells(&self) -> Result<Vec<Cell>, StoreError>;

    /// Cheap enumeration of already-known cells, for stores that can offer one.
    fn known_cells(&self) -> Option<Vec<Cell>> {
        None
    }
}
