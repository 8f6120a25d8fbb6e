use serde::{Deserialize, Serialize};

/// Side length of a cell in world units.
pub const CELL_SIZE: i32 = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub cx: i32,
    pub cz: i32,
}

impl Cell {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Cell holding world column `(x, z)`.
    #[inline]
    pub const fn containing(x: i32, z: i32) -> Self {
        Self {
            cx: x.div_euclid(CELL_SIZE),
            cz: z.div_euclid(CELL_SIZE),
        }
    }

    /// World coordinate of the cell's north-west column.
    #[inline]
    pub const fn origin(self) -> (i32, i32) {
        (self.cx * CELL_SIZE, self.cz * CELL_SIZE)
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cz: self.cz + dz,
        }
    }

    /// Chebyshev (ring) distance between two cells.
    #[inline]
    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.cx - other.cx).abs().max((self.cz - other.cz).abs())
    }
}

impl From<(i32, i32)> for Cell {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<Cell> for (i32, i32) {
    fn from(value: Cell) -> Self {
        (value.cx, value.cz)
    }
}

/// Absolute block coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn cell(self) -> Cell {
        Cell::containing(self.x, self.z)
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }
}
