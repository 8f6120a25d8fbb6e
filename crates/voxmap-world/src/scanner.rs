use hashbrown::HashSet;

use crate::cell::Cell;
use crate::region::BoundingRegion;
use crate::store::WorldStore;

#[derive(Clone, Copy, Debug)]
pub struct ScanSettings {
    /// Largest ring radius visited around any seed.
    pub max_radius: i32,
    /// Consecutive rings without a new find that end a seed's expansion.
    pub empty_ring_limit: u32,
    /// Half-width of the square around spawn used when nothing is found.
    pub fallback_radius: i32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_radius: 150,
            empty_ring_limit: 10,
            fallback_radius: 4,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScanReport {
    /// Discovered cells, sorted.
    pub cells: Vec<Cell>,
    pub seeds: usize,
    pub probes: u64,
    pub failed_probes: u64,
    /// Deepest ring reached by any seed.
    pub max_ring: i32,
    /// True when discovery found nothing and the spawn square was substituted.
    pub fell_back: bool,
}

impl ScanReport {
    pub fn bounds(&self) -> Option<BoundingRegion> {
        BoundingRegion::enclosing(self.cells.iter().copied())
    }
}

/// Finds populated cells by ring expansion around a set of seeds.
pub struct WorldScanner<'a> {
    store: &'a dyn WorldStore,
    settings: ScanSettings,
}

impl<'a> WorldScanner<'a> {
    pub fn new(store: &'a dyn WorldStore) -> Self {
        Self {
            store,
            settings: ScanSettings::default(),
        }
    }

    pub fn with_settings(store: &'a dyn WorldStore, settings: ScanSettings) -> Self {
        Self { store, settings }
    }

    /// Seed centres in priority order, deduplicated: spawn, origin, connected
    /// viewers, then any cells the store can enumerate cheaply.
    pub fn seeds(&self, known: &[Cell]) -> Vec<Cell> {
        let mut seen = HashSet::new();
        let mut seeds = Vec::new();
        let mut push = |c: Cell| {
            if seen.insert(c) {
                seeds.push(c);
            }
        };
        match self.store.spawn_point() {
            Ok(p) => push(p.cell()),
            Err(e) => log::debug!(target: "scan", "spawn lookup failed: {e}"),
        }
        push(Cell::new(0, 0));
        match self.store.connected_viewer_cells() {
            Ok(cells) => cells.into_iter().for_each(&mut push),
            Err(e) => log::debug!(target: "scan", "viewer lookup failed: {e}"),
        }
        known.iter().copied().for_each(&mut push);
        seeds
    }

    pub fn scan(&self) -> ScanReport {
        let known = self.store.known_cells().unwrap_or_default();
        if !known.is_empty() {
            log::info!(target: "scan", "store enumerated {} known cells", known.len());
        }
        let mut found: HashSet<Cell> = known.iter().copied().collect();
        let seeds = self.seeds(&known);
        log::info!(target: "scan", "scanning from {} points", seeds.len());

        let mut report = ScanReport {
            seeds: seeds.len(),
            ..ScanReport::default()
        };
        let mut scanned = 0usize;
        for seed in &seeds {
            scanned += self.expand(*seed, &mut found, &mut report);
        }
        log::info!(target: "scan", "found {scanned} cells via scan, {} total", found.len());

        if found.is_empty() {
            let spawn = self
                .store
                .spawn_point()
                .map(|p| p.cell())
                .unwrap_or_default();
            let r = self.settings.fallback_radius;
            for dx in -r..=r {
                for dz in -r..=r {
                    found.insert(spawn.offset(dx, dz));
                }
            }
            report.fell_back = true;
            log::info!(
                target: "scan",
                "nothing discovered; falling back to {} cells around spawn",
                found.len()
            );
        }

        let mut cells: Vec<Cell> = found.into_iter().collect();
        cells.sort();
        report.cells = cells;
        report
    }

    /// Ring expansion around one seed. Returns the number of new cells.
    fn expand(&self, center: Cell, found: &mut HashSet<Cell>, report: &mut ScanReport) -> usize {
        let mut total = 0;
        let mut empty_rings = 0u32;
        let mut r = 0;
        while r <= self.settings.max_radius && empty_rings < self.settings.empty_ring_limit {
            let mut ring_found = 0;
            for cell in ring(center, r) {
                if found.contains(&cell) {
                    continue;
                }
                report.probes += 1;
                match self.store.cell_exists(cell) {
                    Ok(true) => {
                        found.insert(cell);
                        ring_found += 1;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        report.failed_probes += 1;
                        log::trace!(target: "scan", "{e}");
                    }
                }
            }
            total += ring_found;
            empty_rings = if ring_found == 0 { empty_rings + 1 } else { 0 };
            report.max_ring = report.max_ring.max(r);
            r += 1;
        }
        total
    }
}

/// Cells at Chebyshev distance exactly `r` from `center`.
pub fn ring(center: Cell, r: i32) -> impl Iterator<Item = Cell> {
    // each side owns one corner and 2r cells; all four are empty at r = 0
    let top = (-r..r).map(move |d| (d, -r));
    let right = (-r..r).map(move |d| (r, d));
    let bottom = (-r..r).map(move |d| (-d, r));
    let left = (-r..r).map(move |d| (-r, -d));
    std::iter::once((0, 0))
        .filter(move |_| r == 0)
        .chain(top)
        .chain(right)
        .chain(bottom)
        .chain(left)
        .map(move |(dx, dz)| center.offset(dx, dz))
}
