use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hashbrown::{HashMap, HashSet};
use voxmap_palette::PixelColorTable;
use voxmap_raster::{Canvas, RenderSettings, split};
use voxmap_walls::{
    BaseImageCache, CacheKey, CacheStats, Clock, MapsDir, Orientation, RegionConfig,
    RegionRegistry, SystemClock, WallError, WallInfo, WallStore, wall::check_grid_size,
};
use voxmap_world::BlockPos;

use crate::delivery::{Delivery, DeliveryScheduler, StepReport};
use crate::error::ServiceError;
use crate::feeds::{self, MapInfo, MapsFeed, PlayerEntry, PlayersFeed};
use crate::host::{Host, RecipientId, ViewerSnapshot};
use crate::placement::{PlacementProgress, PlacementQueue};
use crate::pool::{Job, JobResult, RefreshItem, RefreshedWall, RenderOutcome, WallLoad, WorkerPool};
use crate::schedule::{Every, Once};
use crate::settings::{INITIAL_RENDER_DELAY_SECS, JOIN_DELAY_SECS, ServiceSettings, WALL_REFRESH_DELAY_SECS};
use crate::tiles::TileImageStore;

/// What one call to [`MapService::tick`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub results_applied: usize,
    pub delivered: StepReport,
    pub placement: Option<PlacementProgress>,
}

/// Owns every map concern of one host and advances it from the host's tick.
///
/// Expensive work (scanning, rasterising, rescaling, compositing) runs on the
/// worker pool; results are applied on the next [`tick`](Self::tick).
pub struct MapService {
    host: Arc<dyn Host>,
    settings: ServiceSettings,
    palette: Arc<PixelColorTable>,
    clock: Arc<dyn Clock>,
    walls: WallStore,
    regions: RegionRegistry,
    maps: MapsDir,
    cache: Arc<BaseImageCache>,
    tiles: Arc<TileImageStore>,
    delivery: DeliveryScheduler,
    placement: PlacementQueue,
    pool: WorkerPool,
    rendered: HashMap<String, MapInfo>,
    rendering: HashSet<String>,
    preparing: HashSet<String>,
    is_refreshing: AtomicBool,
    joins: Vec<(u64, RecipientId)>,
    tick: u64,
    initial_render: Once,
    wall_refresh: Once,
    periodic_render: Every,
    marker_refresh: Every,
}

impl MapService {
    pub fn open(
        host: Arc<dyn Host>,
        settings: ServiceSettings,
        palette: Arc<PixelColorTable>,
    ) -> Result<Self, ServiceError> {
        Self::open_with_clock(host, settings, palette, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        host: Arc<dyn Host>,
        settings: ServiceSettings,
        palette: Arc<PixelColorTable>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceError> {
        fs::create_dir_all(settings.maps_dir()).map_err(voxmap_walls::PersistError::from)?;
        let walls = WallStore::open(settings.walls_file())?;
        let regions = RegionRegistry::open(settings.regions_file())?;
        let maps = MapsDir::new(settings.maps_dir());
        let cache = Arc::new(BaseImageCache::with_clock(
            Arc::new(maps.clone()),
            Arc::clone(&clock),
            settings.cache_ttl,
        ));
        let pool = WorkerPool::new().map_err(|e| ServiceError::Workers(e.to_string()))?;

        let mut rendered = HashMap::new();
        match feeds::read_maps(&settings.maps_feed()) {
            Ok(feed) => {
                for info in feed.maps {
                    rendered.insert(info.region.clone(), info);
                }
            }
            Err(e) => log::warn!(target: "runtime", "Ignoring unreadable maps feed: {e}"),
        }

        let initial_render = Once::at(settings.secs_to_ticks(INITIAL_RENDER_DELAY_SECS));
        let wall_refresh = Once::at(settings.secs_to_ticks(WALL_REFRESH_DELAY_SECS));
        let render_period = settings.render_period_ticks();
        let periodic_render = if render_period > 0 {
            log::info!(target: "runtime", "Auto render: every {} hour(s)", settings.render_interval_hours);
            Every::new(render_period, render_period)
        } else {
            log::info!(target: "runtime", "Auto render: disabled (manual only)");
            Every::disabled()
        };
        let marker_period = settings.marker_period_ticks();
        let marker_refresh = Every::new(marker_period, marker_period);
        log::info!(
            target: "runtime",
            "Marker update: every {} second(s), {} wall(s) loaded",
            settings.marker_update_seconds.clamp(1, 60),
            walls.len()
        );

        Ok(Self {
            delivery: DeliveryScheduler::new(settings.delivery_batch_size),
            host,
            settings,
            palette,
            clock,
            walls,
            regions,
            maps,
            cache,
            tiles: Arc::new(TileImageStore::new()),
            placement: PlacementQueue::default(),
            pool,
            rendered,
            rendering: HashSet::new(),
            preparing: HashSet::new(),
            is_refreshing: AtomicBool::new(false),
            joins: Vec::new(),
            tick: 0,
            initial_render,
            wall_refresh,
            periodic_render,
            marker_refresh,
        })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn set_palette(&mut self, palette: Arc<PixelColorTable>) {
        self.palette = palette;
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn walls(&self) -> &WallStore {
        &self.walls
    }

    pub fn tiles(&self) -> &TileImageStore {
        &self.tiles
    }

    pub fn rendered(&self, region: &str) -> Option<&MapInfo> {
        self.rendered.get(region)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn pending_deliveries(&self) -> usize {
        self.delivery.pending()
    }

    pub fn is_refreshing(&self) -> bool {
        self.is_refreshing.load(Ordering::Acquire)
    }

    /// No background job, queued delivery, or placement is outstanding.
    pub fn is_idle(&self) -> bool {
        self.pool.pending() == 0
            && self.rendering.is_empty()
            && self.preparing.is_empty()
            && !self.is_refreshing()
            && self.delivery.is_idle()
            && self.placement.is_empty()
    }

    // ---- commands ----

    /// Queues a render of `region`: bounded when it has an enabled region
    /// config, otherwise a full scan.
    pub fn request_render(&mut self, region: &str) -> Result<(), ServiceError> {
        if self.rendering.contains(region) {
            return Err(ServiceError::Busy(region.to_string()));
        }
        let world = self
            .host
            .world(region)
            .ok_or_else(|| ServiceError::UnknownRegion(region.to_string()))?;
        let settings = RenderSettings {
            max_canvas_dim: self.settings.max_canvas_dim,
            ..RenderSettings::default()
        };
        log::info!(target: "render", "Rendering: {region}");
        self.pool.submit(Job::Render {
            region: region.to_string(),
            world,
            palette: Arc::clone(&self.palette),
            area: self.regions.active(region).copied(),
            settings,
            out_path: self.maps.path_for(region),
        });
        self.rendering.insert(region.to_string());
        Ok(())
    }

    /// Queues every configured region. Failures are logged per region.
    pub fn request_render_all(&mut self) -> usize {
        let regions = self.settings.render_regions.clone();
        let mut queued = 0;
        for region in &regions {
            match self.request_render(region) {
                Ok(()) => queued += 1,
                Err(ServiceError::UnknownRegion(r)) => {
                    log::warn!(target: "render", "World not found: {r}")
                }
                Err(e) => log::warn!(target: "render", "Not rendering '{region}': {e}"),
            }
        }
        queued
    }

    /// Starts building a `size`×`size` wall in `region` at `origin`, facing
    /// away from a viewer looking along `yaw`. The source image is loaded and
    /// rescaled off-thread; ids are allocated and the wall persisted when it
    /// arrives.
    pub fn create_wall(
        &mut self,
        region: &str,
        size: u32,
        origin: BlockPos,
        yaw: f64,
    ) -> Result<Orientation, ServiceError> {
        check_grid_size(size)?;
        let source = self.maps.path_for(region);
        if !source.exists() {
            return Err(WallError::SourceMissing(region.to_string()).into());
        }
        if !self.preparing.insert(region.to_string()) {
            return Err(ServiceError::Busy(region.to_string()));
        }
        let facing = Orientation::from_yaw(yaw);
        log::info!(target: "walls", "Creating {size}x{size} wall in '{region}' facing {facing}");
        self.pool.submit(Job::LoadWall {
            region: region.to_string(),
            size,
            source,
            purpose: WallLoad::Create { origin, facing },
        });
        Ok(facing)
    }

    pub fn remove_wall(&mut self, region: &str) -> Result<Option<WallInfo>, ServiceError> {
        let removed = self.walls.remove(region)?;
        if removed.is_some() {
            self.placement.cancel(region);
            self.forget_dead_tiles();
            log::info!(target: "walls", "Removed wall in '{region}'");
        }
        Ok(removed)
    }

    pub fn set_region(
        &mut self,
        region: &str,
        center_x: i32,
        center_z: i32,
        radius: i32,
    ) -> Result<RegionConfig, ServiceError> {
        Ok(self.regions.set(region, center_x, center_z, radius)?)
    }

    /// Enables the pending config and re-renders the region with it.
    pub fn confirm_region(&mut self, region: &str) -> Result<bool, ServiceError> {
        if !self.regions.confirm(region)? {
            return Ok(false);
        }
        self.request_render(region)?;
        Ok(true)
    }

    pub fn clear_region(&mut self, region: &str) -> Result<Option<RegionConfig>, ServiceError> {
        Ok(self.regions.clear(region)?)
    }

    pub fn region_info(&self) -> Vec<(String, RegionConfig)> {
        self.regions
            .info()
            .into_iter()
            .map(|(name, cfg)| (name.to_string(), *cfg))
            .collect()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Queues the viewer's walls once the join delay has passed.
    pub fn viewer_joined(&mut self, recipient: RecipientId) {
        let due = self.tick + self.settings.secs_to_ticks(JOIN_DELAY_SECS);
        self.joins.push((due, recipient));
    }

    /// Sends the stored image for `tile_id` straight away, if there is one.
    pub fn tile_requested(&self, recipient: RecipientId, tile_id: u64) -> bool {
        match self.tiles.get(tile_id) {
            Some(image) => {
                self.host.send_tile(recipient, tile_id, &image);
                true
            }
            None => false,
        }
    }

    /// Reloads every persisted wall's source image and pushes the pieces to
    /// viewers in its region. Walls whose source is gone are skipped.
    pub fn refresh_loaded_walls(&mut self) -> usize {
        let mut queued = 0;
        for wall in self.walls.walls() {
            if !wall.image_path.exists() {
                log::warn!(
                    target: "walls",
                    "Map file not found for wall '{}': {}",
                    wall.region,
                    wall.image_path.display()
                );
                continue;
            }
            let Some(first_tile) = wall.ids().next() else {
                continue;
            };
            self.pool.submit(Job::LoadWall {
                region: wall.region.clone(),
                size: wall.size,
                source: wall.image_path.clone(),
                purpose: WallLoad::Refresh { first_tile },
            });
            queued += 1;
        }
        queued
    }

    /// Starts one marker refresh cycle. Returns false when skipped: no walls,
    /// no viewers, nothing to draw on, or a cycle already in flight.
    pub fn refresh_markers(&mut self) -> bool {
        if self.walls.is_empty() {
            return false;
        }
        let viewers = self.host.viewers();
        if viewers.is_empty() {
            return false;
        }
        if self.is_refreshing() {
            log::trace!(target: "runtime", "Marker refresh still in flight, skipping");
            return false;
        }

        let items: Vec<RefreshItem> = self
            .walls
            .walls()
            .into_iter()
            .filter_map(|wall| self.refresh_item(wall, &viewers))
            .collect();
        self.write_players_feed(&viewers);
        if items.is_empty() {
            return false;
        }
        if self
            .is_refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.pool.submit(Job::Refresh {
            items,
            cache: Arc::clone(&self.cache),
        });
        true
    }

    fn refresh_item(&self, wall: &WallInfo, viewers: &[ViewerSnapshot]) -> Option<RefreshItem> {
        let here: Vec<&ViewerSnapshot> = viewers.iter().filter(|v| v.region == wall.region).collect();
        if here.is_empty() {
            return None;
        }
        let bounds = self.rendered.get(&wall.region)?.bounds()?;
        Some(RefreshItem {
            region: wall.region.clone(),
            size: wall.size,
            tile_ids: wall.tile_ids.clone(),
            bounds,
            samples: here.iter().map(|v| v.sample()).collect(),
            recipients: here.iter().map(|v| v.id).collect(),
        })
    }

    // ---- tick ----

    /// Advances one host tick. Never blocks on background work.
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let tick = self.tick;

        let results = self.pool.drain();
        let results_applied = results.len();
        for result in results {
            self.apply(result);
        }

        if self.initial_render.due(tick) {
            log::info!(target: "render", "Rendering maps on startup");
            self.request_render_all();
        }
        if self.wall_refresh.due(tick) && !self.walls.is_empty() {
            self.refresh_loaded_walls();
        }
        if self.periodic_render.due(tick) {
            log::info!(
                target: "render",
                "Scheduled render ({}h interval)",
                self.settings.render_interval_hours
            );
            self.request_render_all();
        }
        if self.marker_refresh.due(tick) {
            self.refresh_markers();
        }
        self.process_joins(tick);

        let placement = self.placement.step(self.host.as_ref(), &self.tiles);
        let delivered = self.delivery.step(self.host.as_ref());
        TickReport {
            tick,
            results_applied,
            delivered,
            placement,
        }
    }

    fn apply(&mut self, result: JobResult) {
        match result {
            JobResult::Rendered { region, outcome } => {
                self.rendering.remove(&region);
                match outcome {
                    Ok(out) => self.apply_render(&region, out),
                    Err(e) => log::error!(target: "render", "Render failed for '{region}': {e}"),
                }
            }
            JobResult::WallImage {
                region,
                size,
                purpose,
                image,
            } => {
                let image = match image {
                    Ok(image) => image,
                    Err(e) => {
                        if matches!(purpose, WallLoad::Create { .. }) {
                            self.preparing.remove(&region);
                        }
                        log::error!(target: "walls", "Failed to load map for wall '{region}': {e}");
                        return;
                    }
                };
                match purpose {
                    WallLoad::Create { origin, facing } => {
                        self.preparing.remove(&region);
                        if let Err(e) = self.finish_create(&region, size, origin, facing, image) {
                            log::error!(target: "walls", "Wall creation in '{region}' failed: {e}");
                        }
                    }
                    WallLoad::Refresh { first_tile } => self.finish_reload(&region, first_tile, image),
                }
            }
            JobResult::Refreshed { walls } => {
                self.is_refreshing.store(false, Ordering::Release);
                for wall in walls {
                    self.apply_refreshed(wall);
                }
            }
        }
    }

    fn apply_render(&mut self, region: &str, out: RenderOutcome) {
        let info = MapInfo::new(region, out.width, out.height, &out.bounds, self.clock.now_ms());
        log::info!(
            target: "render",
            "Rendered '{region}': {}x{} from {} cell(s) ({} skipped) in {} ms",
            out.width,
            out.height,
            out.cells_rendered,
            out.cells_skipped,
            out.elapsed_ms
        );
        self.rendered.insert(region.to_string(), info);
        self.write_maps_feed();
        self.cache.clear();
    }

    fn finish_create(
        &mut self,
        region: &str,
        size: u32,
        origin: BlockPos,
        facing: Orientation,
        scaled: Canvas,
    ) -> Result<(), ServiceError> {
        let (wall, old) = self
            .walls
            .create(region, size, origin, facing, self.maps.path_for(region))?;
        if old.is_some() {
            self.forget_dead_tiles();
        }
        self.cache.clear();
        let pieces = self.tiles.put_grid(&wall.tile_ids, split(&scaled, size));
        self.push_to_region(region, &pieces);
        self.placement.push(wall);
        Ok(())
    }

    fn finish_reload(&mut self, region: &str, first_tile: u64, scaled: Canvas) {
        let Some(wall) = self.walls.get(region) else {
            return;
        };
        // replaced or resized since the load was queued
        if wall.ids().next() != Some(first_tile) || scaled.width != wall.target_side() {
            return;
        }
        let pieces = self.tiles.put_grid(&wall.tile_ids, split(&scaled, wall.size));
        log::info!(target: "walls", "Refreshed wall: {region}");
        self.push_to_region(region, &pieces);
    }

    fn apply_refreshed(&mut self, refreshed: RefreshedWall) {
        let current = self
            .walls
            .get(&refreshed.region)
            .is_some_and(|w| w.tile_ids == refreshed.tile_ids);
        if !current {
            return;
        }
        let pieces = self.tiles.put_grid(&refreshed.tile_ids, refreshed.pieces);
        let recipients: Vec<RecipientId> = refreshed
            .recipients
            .into_iter()
            .filter(|r| self.host.is_connected(*r))
            .collect();
        self.queue_pieces(&recipients, &pieces);
    }

    fn process_joins(&mut self, tick: u64) {
        if self.joins.iter().all(|(due, _)| *due > tick) {
            return;
        }
        let (due, waiting): (Vec<_>, Vec<_>) = self.joins.drain(..).partition(|(at, _)| *at <= tick);
        self.joins = waiting;
        let viewers = self.host.viewers();
        for (_, recipient) in due {
            let Some(viewer) = viewers.iter().find(|v| v.id == recipient) else {
                continue;
            };
            let Some(wall) = self.walls.get(&viewer.region) else {
                continue;
            };
            let pieces: Vec<(u64, Arc<Canvas>)> = wall
                .ids()
                .filter_map(|id| self.tiles.get(id).map(|img| (id, img)))
                .collect();
            self.queue_pieces(&[recipient], &pieces);
        }
    }

    fn push_to_region(&mut self, region: &str, pieces: &[(u64, Arc<Canvas>)]) {
        let recipients: Vec<RecipientId> = self
            .host
            .viewers()
            .into_iter()
            .filter(|v| v.region == region)
            .map(|v| v.id)
            .collect();
        self.queue_pieces(&recipients, pieces);
    }

    fn queue_pieces(&mut self, recipients: &[RecipientId], pieces: &[(u64, Arc<Canvas>)]) {
        self.delivery.enqueue(pieces.iter().flat_map(|(tile_id, image)| {
            recipients.iter().map(move |r| Delivery {
                recipient: *r,
                tile_id: *tile_id,
                image: Arc::clone(image),
            })
        }));
    }

    fn forget_dead_tiles(&self) {
        let live: HashSet<u64> = self.walls.walls().iter().flat_map(|w| w.ids()).collect();
        let dropped = self.tiles.retain(&live);
        if dropped > 0 {
            log::debug!(target: "walls", "Dropped {dropped} abandoned tile image(s)");
        }
    }

    fn write_maps_feed(&self) {
        let mut maps: Vec<MapInfo> = self.rendered.values().cloned().collect();
        maps.sort_by(|a, b| a.region.cmp(&b.region));
        if let Err(e) = feeds::write_json(&self.settings.maps_feed(), &MapsFeed { maps }) {
            log::warn!(target: "runtime", "Failed to write maps feed: {e}");
        }
    }

    fn write_players_feed(&self, viewers: &[ViewerSnapshot]) {
        let feed = PlayersFeed {
            players: viewers
                .iter()
                .map(|v| PlayerEntry {
                    name: v.name.clone(),
                    region: v.region.clone(),
                    x: v.x,
                    y: v.y,
                    z: v.z,
                })
                .collect(),
        };
        if let Err(e) = feeds::write_json(&self.settings.players_feed(), &feed) {
            log::warn!(target: "runtime", "Failed to write players feed: {e}");
        }
    }

    /// Cached base for `region` at `size`, for callers that want to inspect it.
    pub fn base_image(&self, region: &str, size: u32) -> Result<Option<Arc<Canvas>>, ServiceError> {
        Ok(self.cache.get(&CacheKey::new(region, size))?)
    }
}
