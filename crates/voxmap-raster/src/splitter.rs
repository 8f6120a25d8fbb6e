use crate::canvas::Canvas;

/// Side length of one tile in pixels.
pub const TILE_SIZE: u32 = 128;

/// Dense `n`×`n` grid addressed by `(gx, gy)`, where `gy = 0` is the bottom row.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid<T> {
    size: u32,
    cells: Vec<T>,
}

impl<T> TileGrid<T> {
    /// Builds a grid from items in gx-major order (`index = gx * n + gy`).
    pub fn from_vec(size: u32, cells: Vec<T>) -> Option<Self> {
        if size == 0 || cells.len() != (size * size) as usize {
            return None;
        }
        Some(Self { size, cells })
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, gx: u32, gy: u32) -> Option<&T> {
        if gx >= self.size || gy >= self.size {
            return None;
        }
        self.cells.get((gx * self.size + gy) as usize)
    }

    /// `((gx, gy), item)` in gx-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), &T)> {
        let n = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, t)| (((i as u32) / n, (i as u32) % n), t))
    }

    pub fn map<U>(&self, mut f: impl FnMut((u32, u32), &T) -> U) -> TileGrid<U> {
        TileGrid {
            size: self.size,
            cells: self.iter().map(|(at, t)| f(at, t)).collect(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }
}

/// Cuts a `(n*128)`-square canvas into tiles. Tile `(gx, gy)` is the pixel
/// block at `(gx*128, (n-1-gy)*128)`.
///
/// Panics if the canvas is not exactly `n*128` on both axes.
pub fn split(canvas: &Canvas, n: u32) -> TileGrid<Canvas> {
    let side = n * TILE_SIZE;
    assert!(n > 0, "grid size must be positive");
    assert!(
        canvas.width == side && canvas.height == side,
        "canvas {}x{} does not match grid {n} ({side}px)",
        canvas.width,
        canvas.height
    );
    let mut cells = Vec::with_capacity((n * n) as usize);
    for gx in 0..n {
        for gy in 0..n {
            cells.push(canvas.sub_image(gx * TILE_SIZE, (n - 1 - gy) * TILE_SIZE, TILE_SIZE, TILE_SIZE));
        }
    }
    TileGrid { size: n, cells }
}

/// Inverse of [`split`].
pub fn assemble(grid: &TileGrid<Canvas>) -> Canvas {
    let n = grid.size();
    let mut out = Canvas::new(n * TILE_SIZE, n * TILE_SIZE);
    for ((gx, gy), tile) in grid.iter() {
        out.blit(tile, gx * TILE_SIZE, (n - 1 - gy) * TILE_SIZE);
    }
    if let Some(first) = grid.get(0, 0) {
        out.pixels_per_unit = first.pixels_per_unit;
    }
    out
}
