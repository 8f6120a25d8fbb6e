use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use voxmap_palette::{Material, PixelColorTable, Rgb};
use voxmap_world::{
    BoundingRegion, CELL_SIZE, Cell, RegionError, ScanSettings, StoreError, WorldScanner,
    WorldStore,
};

use crate::canvas::Canvas;
use crate::error::RasterError;
use crate::shade::shade;

pub const PIXELS_PER_UNIT: f64 = 12.0;
pub const BACKGROUND: Rgb = [25, 50, 100];
pub const DEFAULT_MAX_CANVAS_DIM: u32 = 16384;

const COLUMNS: usize = (CELL_SIZE * CELL_SIZE) as usize;
const BATCH: usize = 4096;

#[derive(Clone, Copy, Debug)]
pub struct RenderSettings {
    pub max_canvas_dim: u32,
    pub scan: ScanSettings,
    /// Progress log interval in cells, bounded renders.
    pub progress_bounded: usize,
    /// Progress log interval in cells, full renders.
    pub progress_full: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_canvas_dim: DEFAULT_MAX_CANVAS_DIM,
            scan: ScanSettings::default(),
            progress_bounded: 500,
            progress_full: 1000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderResult {
    pub canvas: Canvas,
    pub bounds: BoundingRegion,
    pub cells_rendered: usize,
    pub cells_skipped: usize,
}

/// Canvas size and effective density for a `width`×`depth` unit region.
///
/// Both axes are scaled by one factor so that neither exceeds `max_dim`.
pub fn canvas_size(width: u32, depth: u32, max_dim: u32) -> (u32, u32, f64) {
    let w = f64::from(width) * PIXELS_PER_UNIT;
    let h = f64::from(depth) * PIXELS_PER_UNIT;
    let max = f64::from(max_dim);
    if w <= max && h <= max {
        return (w as u32, h as u32, PIXELS_PER_UNIT);
    }
    let scale = (max / w).min(max / h);
    (
        ((w * scale) as u32).max(1),
        ((h * scale) as u32).max(1),
        PIXELS_PER_UNIT * scale,
    )
}

/// Shaded colours for one cell; `None` where the column had nothing visible.
type CellColumns = [Option<Rgb>; COLUMNS];

pub struct Rasterizer<'a> {
    store: &'a dyn WorldStore,
    palette: &'a PixelColorTable,
    settings: RenderSettings,
}

impl<'a> Rasterizer<'a> {
    pub fn new(store: &'a dyn WorldStore, palette: &'a PixelColorTable) -> Self {
        Self {
            store,
            palette,
            settings: RenderSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Scan for populated cells and render their envelope.
    pub fn render_full(&self) -> Result<RenderResult, RasterError> {
        let report = WorldScanner::with_settings(self.store, self.settings.scan).scan();
        self.render(&report.cells, None)
    }

    /// Render the square `[cx - r, cx + r)` around a centre.
    pub fn render_bounded(&self, center_x: i32, center_z: i32, radius: i32) -> Result<RenderResult, RasterError> {
        let region = BoundingRegion::centered(center_x, center_z, radius)?;
        log::info!(
            target: "render",
            "bounded render: X[{} to {}] Z[{} to {}]",
            region.min_x(),
            region.max_x(),
            region.min_z(),
            region.max_z()
        );
        let cells: Vec<Cell> = region.cells().collect();
        self.render(&cells, Some(region))
    }

    /// Render `cells` into a canvas covering `region`, or the cells' envelope
    /// when no region is given. Columns outside the region are clipped.
    pub fn render(&self, cells: &[Cell], region: Option<BoundingRegion>) -> Result<RenderResult, RasterError> {
        let bounded = region.is_some();
        let bounds = match region {
            Some(r) => r,
            None => BoundingRegion::enclosing(cells.iter().copied())
                .ok_or(RegionError::InvalidRegion("no cells to render"))?,
        };
        let (width, height, ppu) =
            canvas_size(bounds.width(), bounds.depth(), self.settings.max_canvas_dim);
        if ppu < PIXELS_PER_UNIT {
            log::info!(target: "render", "scaled to: {width}x{height} ({ppu:.3} px/unit)");
        }
        log::info!(target: "render", "image size: {width}x{height}");

        let mut canvas = Canvas::filled(width, height, BACKGROUND);
        canvas.pixels_per_unit = ppu;

        let every = if bounded {
            self.settings.progress_bounded
        } else {
            self.settings.progress_full
        }
        .max(1);
        let total = cells.len();
        let done = AtomicUsize::new(0);
        let mut rendered = 0;
        for batch in cells.chunks(BATCH) {
            let patches: Vec<(Cell, Option<Box<CellColumns>>)> = batch
                .par_iter()
                .map(|&cell| {
                    let cols = match self.sample_cell(cell) {
                        Ok(cols) => cols,
                        Err(e) => {
                            log::debug!(target: "render", "skipping cell: {e}");
                            None
                        }
                    };
                    if cols.is_some() {
                        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                        if n % every == 0 {
                            log::info!(target: "render", "Progress: {n}/{total}");
                        }
                    }
                    (cell, cols)
                })
                .collect();
            for (cell, cols) in patches {
                if let Some(cols) = cols {
                    write_cell(&mut canvas, &bounds, cell, &cols);
                    rendered += 1;
                }
            }
        }
        log::info!(target: "render", "render complete: {rendered} cells");
        Ok(RenderResult {
            canvas,
            bounds,
            cells_rendered: rendered,
            cells_skipped: total - rendered,
        })
    }

    /// Colours for every column of `cell`, or `None` if the cell does not exist.
    fn sample_cell(&self, cell: Cell) -> Result<Option<Box<CellColumns>>, StoreError> {
        if !self.store.cell_exists(cell)? {
            return Ok(None);
        }
        let mut tops = [0i32; COLUMNS];
        for lz in 0..16u8 {
            for lx in 0..16u8 {
                tops[col(lx, lz)] = self.store.highest_opaque_y(cell, lx, lz)?;
            }
        }
        let mut out: Box<CellColumns> = Box::new([None; COLUMNS]);
        for lz in 0..16u8 {
            for lx in 0..16u8 {
                let Some((y, material)) = self.visible_top(cell, lx, lz, tops[col(lx, lz)])? else {
                    continue;
                };
                let north = if lz > 0 { tops[col(lx, lz - 1)] } else { y };
                let west = if lx > 0 { tops[col(lx - 1, lz)] } else { y };
                out[col(lx, lz)] = Some(shade(self.palette.base_color(material), y, north, west));
            }
        }
        Ok(Some(out))
    }

    fn visible_top(
        &self,
        cell: Cell,
        lx: u8,
        lz: u8,
        top: i32,
    ) -> Result<Option<(i32, Material)>, StoreError> {
        let mut y = top;
        while y >= 0 {
            let m = self.store.material_at(cell, lx, y, lz)?;
            if m.id != 0 && !self.palette.is_transparent(m.id) {
                return Ok(Some((y, m)));
            }
            y -= 1;
        }
        Ok(None)
    }
}

#[inline]
fn col(lx: u8, lz: u8) -> usize {
    usize::from(lz) * CELL_SIZE as usize + usize::from(lx)
}

fn write_cell(canvas: &mut Canvas, bounds: &BoundingRegion, cell: Cell, cols: &CellColumns) {
    let ppu = canvas.pixels_per_unit;
    let footprint = (ppu.ceil() as i64).max(1);
    let (ox, oz) = cell.origin();
    for lz in 0..16u8 {
        for lx in 0..16u8 {
            let Some(rgb) = cols[col(lx, lz)] else {
                continue;
            };
            let wx = ox + i32::from(lx);
            let wz = oz + i32::from(lz);
            if !bounds.contains_column(wx, wz) {
                continue;
            }
            let px = (f64::from(wx - bounds.min_x()) * ppu) as i64;
            let pz = (f64::from(wz - bounds.min_z()) * ppu) as i64;
            if px >= i64::from(canvas.width) || pz >= i64::from(canvas.height) {
                continue;
            }
            canvas.fill_rect(px, pz, footprint, footprint, rgb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclamped_sizes_use_full_density() {
        assert_eq!(canvas_size(32, 16, 16384), (384, 192, 12.0));
    }

    #[test]
    fn clamp_uses_the_larger_axis() {
        let (w, h, ppu) = canvas_size(4096, 1024, 16384);
        assert!(w <= 16384 && h <= 16384);
        assert!((ppu - 4.0).abs() < 1e-9);
        assert!((4095..=4096).contains(&h));
    }
}
