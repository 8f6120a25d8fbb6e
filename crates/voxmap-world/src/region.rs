use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell::{CELL_SIZE, Cell};

/// Largest absolute block coordinate a centred region may reach.
pub const WORLD_LIMIT: i32 = 30_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    InvalidRegion(&'static str),
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::InvalidRegion(msg) => write!(f, "invalid region: {msg}"),
        }
    }
}

impl std::error::Error for RegionError {}

/// Axis-aligned world rectangle, min inclusive and max exclusive.
/// Always non-empty on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingRegion {
    min_x: i32,
    max_x: i32,
    min_z: i32,
    max_z: i32,
}

impl BoundingRegion {
    pub fn new(min_x: i32, max_x: i32, min_z: i32, max_z: i32) -> Result<Self, RegionError> {
        if min_x >= max_x || min_z >= max_z {
            return Err(RegionError::InvalidRegion(
                "region max must be greater than min",
            ));
        }
        Ok(Self {
            min_x,
            max_x,
            min_z,
            max_z,
        })
    }

    /// `[cx - radius, cx + radius)` on both axes, within `±WORLD_LIMIT`.
    pub fn centered(center_x: i32, center_z: i32, radius: i32) -> Result<Self, RegionError> {
        if radius <= 0 {
            return Err(RegionError::InvalidRegion("radius must be positive"));
        }
        let span = |c: i32| match (c.checked_sub(radius), c.checked_add(radius)) {
            (Some(lo), Some(hi)) if lo >= -WORLD_LIMIT && hi <= WORLD_LIMIT => Ok((lo, hi)),
            _ => Err(RegionError::InvalidRegion("region exceeds world coordinates")),
        };
        let (min_x, max_x) = span(center_x)?;
        let (min_z, max_z) = span(center_z)?;
        Self::new(min_x, max_x, min_z, max_z)
    }

    /// Tight envelope of the footprints of `cells`, or `None` when empty.
    pub fn enclosing<I>(cells: I) -> Option<Self>
    where
        I: IntoIterator<Item = Cell>,
    {
        let mut iter = cells.into_iter();
        let first = iter.next()?;
        let (mut min_cx, mut max_cx, mut min_cz, mut max_cz) =
            (first.cx, first.cx, first.cz, first.cz);
        for c in iter {
            min_cx = min_cx.min(c.cx);
            max_cx = max_cx.max(c.cx);
            min_cz = min_cz.min(c.cz);
            max_cz = max_cz.max(c.cz);
        }
        Some(Self {
            min_x: min_cx * CELL_SIZE,
            max_x: (max_cx + 1) * CELL_SIZE,
            min_z: min_cz * CELL_SIZE,
            max_z: (max_cz + 1) * CELL_SIZE,
        })
    }

    #[inline]
    pub fn min_x(&self) -> i32 {
        self.min_x
    }
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.max_x
    }
    #[inline]
    pub fn min_z(&self) -> i32 {
        self.min_z
    }
    #[inline]
    pub fn max_z(&self) -> i32 {
        self.max_z
    }

    #[inline]
    pub fn width(&self) -> u32 {
        (i64::from(self.max_x) - i64::from(self.min_x)) as u32
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        (i64::from(self.max_z) - i64::from(self.min_z)) as u32
    }

    pub fn center(&self) -> (i32, i32) {
        (
            ((i64::from(self.min_x) + i64::from(self.max_x)) / 2) as i32,
            ((i64::from(self.min_z) + i64::from(self.max_z)) / 2) as i32,
        )
    }

    #[inline]
    pub fn contains_column(&self, x: i32, z: i32) -> bool {
        x >= self.min_x && x < self.max_x && z >= self.min_z && z < self.max_z
    }

    pub fn contains_cell(&self, cell: Cell) -> bool {
        let (x, z) = cell.origin();
        x >= self.min_x && x + CELL_SIZE <= self.max_x && z >= self.min_z && z + CELL_SIZE <= self.max_z
    }

    /// Inclusive cell span touching the region, corner to corner.
    pub fn cell_range(&self) -> (Cell, Cell) {
        (
            Cell::new(self.min_x >> 4, self.min_z >> 4),
            Cell::new(self.max_x >> 4, self.max_z >> 4),
        )
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (lo, hi) = self.cell_range();
        (lo.cx..=hi.cx).flat_map(move |cx| (lo.cz..=hi.cz).map(move |cz| Cell::new(cx, cz)))
    }

    /// Position of `(x, z)` as a fraction of the region's extent, when both
    /// fractions fall in `[0, 1]`.
    pub fn relative(&self, x: f64, z: f64) -> Option<(f64, f64)> {
        let rx = (x - f64::from(self.min_x)) / f64::from(self.width());
        let rz = (z - f64::from(self.min_z)) / f64::from(self.depth());
        if (0.0..=1.0).contains(&rx) && (0.0..=1.0).contains(&rz) {
            Some((rx, rz))
        } else {
            None
        }
    }
}
