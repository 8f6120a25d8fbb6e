use std::collections::VecDeque;

use voxmap_walls::WallInfo;

use crate::host::WallPlacer;
use crate::tiles::TileImageStore;

pub const SLOTS_PER_TICK: usize = 10;
const PROGRESS_EVERY: usize = 100;

struct Job {
    wall: WallInfo,
    next: usize,
}

/// Progress of one wall after a placement step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementProgress {
    pub region: String,
    pub placed: usize,
    pub total: usize,
}

impl PlacementProgress {
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.placed * 100 / self.total
        }
    }

    pub fn is_done(&self) -> bool {
        self.placed >= self.total
    }
}

/// Hangs walls a few slots per tick so a large grid never stalls the host.
pub struct PlacementQueue {
    per_tick: usize,
    jobs: VecDeque<Job>,
}

impl Default for PlacementQueue {
    fn default() -> Self {
        Self::new(SLOTS_PER_TICK)
    }
}

impl PlacementQueue {
    pub fn new(per_tick: usize) -> Self {
        Self {
            per_tick: per_tick.max(1),
            jobs: VecDeque::new(),
        }
    }

    /// Queues `wall`, dropping any unfinished placement for the same region.
    pub fn push(&mut self, wall: WallInfo) {
        self.cancel(&wall.region);
        self.jobs.push_back(Job { wall, next: 0 });
    }

    pub fn cancel(&mut self, region: &str) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.wall.region != region);
        before != self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Places up to the per-tick budget of slots for the front wall. Tiles
    /// come from `tiles`; a slot whose image is missing still gets its frame.
    pub fn step<P: WallPlacer + ?Sized>(
        &mut self,
        placer: &P,
        tiles: &TileImageStore,
    ) -> Option<PlacementProgress> {
        let job = self.jobs.front_mut()?;
        let total = job.wall.slots();
        let mut done = 0;
        while done < self.per_tick && job.next < total {
            if let Some(p) = job.wall.placement(job.next) {
                placer.place_backing(&job.wall.region, p.backing);
                let image = tiles.get(p.tile_id);
                placer.place_frame(
                    &job.wall.region,
                    p.frame,
                    p.facing.frame_meta(),
                    p.tile_id,
                    image.as_deref(),
                );
            }
            job.next += 1;
            done += 1;
        }
        let progress = PlacementProgress {
            region: job.wall.region.clone(),
            placed: job.next,
            total,
        };
        if job.next % PROGRESS_EVERY == 0 || progress.is_done() {
            log::info!(
                target: "walls",
                "Placing wall '{}': {}% ({}/{})",
                progress.region,
                progress.percent(),
                progress.placed,
                progress.total
            );
        }
        if progress.is_done() {
            log::info!(target: "walls", "Wall '{}' created ({}x{})", progress.region, job.wall.size, job.wall.size);
            self.jobs.pop_front();
        }
        Some(progress)
    }
}
