use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use voxmap_palette::PixelColorTable;
use voxmap_raster::{
    Canvas, RasterError, Rasterizer, RenderSettings, TILE_SIZE, TileGrid, ViewerSample, composite,
    split,
};
use voxmap_walls::{BaseImageCache, CacheKey, Orientation, RegionConfig};
use voxmap_world::{BlockPos, BoundingRegion, WorldStore};

use crate::host::RecipientId;

/// Why a wall's source image is being loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WallLoad {
    Create { origin: BlockPos, facing: Orientation },
    Refresh { first_tile: u64 },
}

/// One wall's marker refresh input, captured on the tick thread.
#[derive(Clone, Debug)]
pub struct RefreshItem {
    pub region: String,
    pub size: u32,
    pub tile_ids: TileGrid<u64>,
    pub bounds: BoundingRegion,
    pub samples: Vec<ViewerSample>,
    pub recipients: Vec<RecipientId>,
}

pub enum Job {
    Render {
        region: String,
        world: Arc<dyn WorldStore>,
        palette: Arc<PixelColorTable>,
        area: Option<RegionConfig>,
        settings: RenderSettings,
        out_path: PathBuf,
    },
    LoadWall {
        region: String,
        size: u32,
        source: PathBuf,
        purpose: WallLoad,
    },
    Refresh {
        items: Vec<RefreshItem>,
        cache: Arc<BaseImageCache>,
    },
}

#[derive(Clone, Debug)]
pub struct RenderOutcome {
    pub width: u32,
    pub height: u32,
    pub bounds: BoundingRegion,
    pub cells_rendered: usize,
    pub cells_skipped: usize,
    pub elapsed_ms: u64,
}

pub struct RefreshedWall {
    pub region: String,
    pub tile_ids: TileGrid<u64>,
    pub pieces: TileGrid<Canvas>,
    pub recipients: Vec<RecipientId>,
}

pub enum JobResult {
    Rendered {
        region: String,
        outcome: Result<RenderOutcome, RasterError>,
    },
    WallImage {
        region: String,
        size: u32,
        purpose: WallLoad,
        image: Result<Canvas, RasterError>,
    },
    Refreshed {
        walls: Vec<RefreshedWall>,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Lane {
    Render,
    Refresh,
}

fn process_job(job: Job, lane: Lane, tx: &Sender<JobResult>) {
    let out = match job {
        Job::Render {
            region,
            world,
            palette,
            area,
            settings,
            out_path,
        } => {
            let t0 = Instant::now();
            let rasterizer = Rasterizer::new(world.as_ref(), palette.as_ref()).with_settings(settings);
            let rendered = match area {
                Some(cfg) => {
                    log::info!(
                        target: "render",
                        "Using region limit for '{region}': center ({}, {}) radius {}",
                        cfg.center_x,
                        cfg.center_z,
                        cfg.radius
                    );
                    rasterizer.render_bounded(cfg.center_x, cfg.center_z, cfg.radius)
                }
                None => rasterizer.render_full(),
            };
            let outcome = rendered.and_then(|r| {
                r.canvas.save_png(&out_path)?;
                Ok(RenderOutcome {
                    width: r.canvas.width,
                    height: r.canvas.height,
                    bounds: r.bounds,
                    cells_rendered: r.cells_rendered,
                    cells_skipped: r.cells_skipped,
                    elapsed_ms: t0.elapsed().as_millis().min(u128::from(u64::MAX)) as u64,
                })
            });
            JobResult::Rendered { region, outcome }
        }
        Job::LoadWall {
            region,
            size,
            source,
            purpose,
        } => {
            let side = size * TILE_SIZE;
            let image = Canvas::load_png(&source).map(|c| c.resized(side, side));
            JobResult::WallImage {
                region,
                size,
                purpose,
                image,
            }
        }
        Job::Refresh { items, cache } => {
            let walls = items
                .into_iter()
                .filter_map(|item| composite_wall(item, &cache))
                .collect();
            JobResult::Refreshed { walls }
        }
    };
    log::trace!(target: "runtime", "{lane:?} lane finished a job");
    let _ = tx.send(out);
}

fn composite_wall(item: RefreshItem, cache: &BaseImageCache) -> Option<RefreshedWall> {
    let base = match cache.get(&CacheKey::new(item.region.as_str(), item.size)) {
        Ok(Some(base)) => base,
        Ok(None) => return None,
        Err(e) => {
            log::debug!(target: "runtime", "Base image for '{}' unavailable: {e}", item.region);
            return None;
        }
    };
    let marked = composite(&base, &item.bounds, &item.samples);
    Some(RefreshedWall {
        pieces: split(&marked, item.size),
        region: item.region,
        tile_ids: item.tile_ids,
        recipients: item.recipients,
    })
}

/// Background workers on a named rayon pool. Renders and wall loads share
/// one lane; marker refreshes have their own so a long render never delays
/// them. Remaining pool threads help with the rasteriser's parallel work.
pub struct WorkerPool {
    render_tx: Sender<Job>,
    refresh_tx: Sender<Job>,
    res_rx: Receiver<JobResult>,
    _pool: Arc<ThreadPool>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    pub threads: usize,
}

impl WorkerPool {
    pub fn new() -> Result<Self, ThreadPoolBuildError> {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .max(3);
        Self::with_threads(threads)
    }

    pub fn with_threads(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let threads = threads.max(2);
        let (render_tx, render_rx) = unbounded::<Job>();
        let (refresh_tx, refresh_rx) = unbounded::<Job>();
        let (res_tx, res_rx) = unbounded::<JobResult>();
        let queued = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("voxmap-render-{i}"))
                .build()?,
        );
        for (lane, rx) in [(Lane::Render, render_rx), (Lane::Refresh, refresh_rx)] {
            let tx = res_tx.clone();
            let queued = queued.clone();
            let inflight = inflight.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    inflight.fetch_add(1, Ordering::SeqCst);
                    queued.fetch_sub(1, Ordering::SeqCst);
                    process_job(job, lane, &tx);
                    inflight.fetch_sub(1, Ordering::SeqCst);
                }
            });
        }
        log::debug!(target: "runtime", "Worker pool started with {threads} threads");

        Ok(Self {
            render_tx,
            refresh_tx,
            res_rx,
            _pool: pool,
            queued,
            inflight,
            threads,
        })
    }

    pub fn submit(&self, job: Job) {
        let tx = match job {
            Job::Refresh { .. } => &self.refresh_tx,
            Job::Render { .. } | Job::LoadWall { .. } => &self.render_tx,
        };
        self.queued.fetch_add(1, Ordering::SeqCst);
        if tx.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn drain(&self) -> Vec<JobResult> {
        self.res_rx.try_iter().collect()
    }

    /// Jobs queued, running, or finished but not yet drained.
    pub fn pending(&self) -> usize {
        self.inflight.load(Ordering::SeqCst) + self.queued.load(Ordering::SeqCst) + self.res_rx.len()
    }
}
