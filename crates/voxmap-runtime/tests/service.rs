use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use hashbrown::HashSet;
use voxmap_palette::{Material, PixelColorTable};
use voxmap_raster::Canvas;
use voxmap_runtime::{
    Host, MapService, RecipientId, ServiceError, ServiceSettings, Transport, ViewerSnapshot,
    WallPlacer,
};
use voxmap_walls::{Orientation, WallError};
use voxmap_world::memory::CellData;
use voxmap_world::{BlockPos, Cell, MemoryWorld, WorldStore};

#[derive(Default)]
struct FakeHost {
    world: Option<Arc<MemoryWorld>>,
    viewers: Mutex<Vec<ViewerSnapshot>>,
    offline: Mutex<HashSet<RecipientId>>,
    sent: Mutex<Vec<(RecipientId, u64)>>,
    backings: Mutex<Vec<BlockPos>>,
    frames: Mutex<Vec<(BlockPos, u8, u64, bool)>>,
}

impl FakeHost {
    fn with_grass() -> Self {
        let world = MemoryWorld::new();
        for (cx, cz) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            world.insert_cell(Cell::new(cx, cz), CellData::flat(Material::plain(2), 64));
        }
        Self {
            world: Some(Arc::new(world)),
            ..Self::default()
        }
    }

    fn add_viewer(&self, id: RecipientId, name: &str, region: &str, x: f64, z: f64) {
        self.viewers.lock().unwrap().push(ViewerSnapshot {
            id,
            name: name.to_string(),
            region: region.to_string(),
            x,
            y: 64.0,
            z,
            yaw: 0.0,
        });
    }

    fn sent_to(&self, id: RecipientId) -> Vec<u64> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == id)
            .map(|(_, t)| *t)
            .collect()
    }
}

impl Transport for FakeHost {
    fn is_connected(&self, recipient: RecipientId) -> bool {
        !self.offline.lock().unwrap().contains(&recipient)
    }

    fn send_tile(&self, recipient: RecipientId, tile_id: u64, image: &Canvas) {
        assert_eq!((image.width, image.height), (128, 128));
        self.sent.lock().unwrap().push((recipient, tile_id));
    }
}

impl WallPlacer for FakeHost {
    fn place_backing(&self, _region: &str, pos: BlockPos) {
        self.backings.lock().unwrap().push(pos);
    }

    fn place_frame(&self, _region: &str, pos: BlockPos, meta: u8, tile_id: u64, image: Option<&Canvas>) {
        self.frames.lock().unwrap().push((pos, meta, tile_id, image.is_some()));
    }
}

impl Host for FakeHost {
    fn world(&self, region: &str) -> Option<Arc<dyn WorldStore>> {
        if region != "world" {
            return None;
        }
        self.world.clone().map(|w| w as Arc<dyn WorldStore>)
    }

    fn viewers(&self) -> Vec<ViewerSnapshot> {
        self.viewers.lock().unwrap().clone()
    }
}

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("voxmap-service-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Schedules are pushed far out so only explicit commands run.
fn settings(dir: PathBuf) -> ServiceSettings {
    ServiceSettings {
        data_dir: dir,
        ticks_per_second: 100_000,
        ..ServiceSettings::default()
    }
}

fn open(host: &Arc<FakeHost>, dir: PathBuf) -> MapService {
    MapService::open(
        host.clone(),
        settings(dir),
        Arc::new(PixelColorTable::builtin()),
    )
    .unwrap()
}

fn tick_until(service: &mut MapService, mut done: impl FnMut(&MapService) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while !done(service) {
        assert!(Instant::now() < deadline, "timed out waiting for service");
        service.tick();
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn render_world(service: &mut MapService) {
    service.request_render("world").unwrap();
    tick_until(service, |s| s.rendered("world").is_some() && s.is_idle());
}

#[test]
fn render_publishes_png_and_feed() {
    let dir = scratch("render");
    let host = Arc::new(FakeHost::with_grass());
    let mut service = open(&host, dir.clone());

    assert!(matches!(
        service.request_render("nether"),
        Err(ServiceError::UnknownRegion(_))
    ));
    service.request_render("world").unwrap();
    assert!(matches!(service.request_render("world"), Err(ServiceError::Busy(_))));
    tick_until(&mut service, |s| s.rendered("world").is_some() && s.is_idle());

    let info = service.rendered("world").unwrap();
    assert_eq!((info.min_x, info.max_x, info.min_z, info.max_z), (0, 32, 0, 32));
    assert_eq!((info.width, info.height), (384, 384));
    assert!(dir.join("maps/world.png").exists());
    let feed = std::fs::read_to_string(dir.join("maps.json")).unwrap();
    assert!(feed.contains("\"region\": \"world\""));

    // a restarted service picks the metadata back up
    drop(service);
    let again = open(&host, dir);
    assert_eq!(again.rendered("world").map(|i| i.width), Some(384));
}

#[test]
fn create_wall_validates_before_touching_state() {
    let dir = scratch("validate");
    let host = Arc::new(FakeHost::with_grass());
    let mut service = open(&host, dir);

    assert!(matches!(
        service.create_wall("world", 2, BlockPos::default(), 0.0),
        Err(ServiceError::Wall(WallError::SourceMissing(_)))
    ));
    render_world(&mut service);
    assert!(matches!(
        service.create_wall("world", 0, BlockPos::default(), 0.0),
        Err(ServiceError::Wall(WallError::InvalidGridSize(0)))
    ));
    assert!(matches!(
        service.create_wall("world", 101, BlockPos::default(), 0.0),
        Err(ServiceError::Wall(WallError::InvalidGridSize(101)))
    ));
    assert!(service.walls().is_empty());
}

#[test]
fn wall_is_placed_in_batches_and_pushed_to_viewers() {
    let dir = scratch("create");
    let host = Arc::new(FakeHost::with_grass());
    host.add_viewer(1, "alex", "world", 8.0, 8.0);
    host.add_viewer(2, "sam", "nether", 0.0, 0.0);
    let mut service = open(&host, dir.clone());
    render_world(&mut service);

    let facing = service
        .create_wall("world", 4, BlockPos::new(0, 70, 0), 10.0)
        .unwrap();
    assert_eq!(facing, Orientation::South);
    tick_until(&mut service, |s| !s.walls().is_empty() && s.is_idle());

    let wall = service.walls().get("world").unwrap().clone();
    assert_eq!(wall.size, 4);
    let frames = host.frames.lock().unwrap().clone();
    assert_eq!(frames.len(), 16);
    assert_eq!(host.backings.lock().unwrap().len(), 16);
    assert!(frames.iter().all(|(_, meta, _, has_image)| *meta == 3 && *has_image));
    let ids: HashSet<u64> = wall.ids().collect();
    assert_eq!(ids.len(), 16);
    assert_eq!(service.tiles().len(), 16);

    let mut got = host.sent_to(1);
    got.sort_unstable();
    let mut want: Vec<u64> = wall.ids().collect();
    want.sort_unstable();
    assert_eq!(got, want);
    assert!(host.sent_to(2).is_empty());

    // a late request for one tile is served directly
    let id = wall.tile_id(1, 2).unwrap();
    assert!(service.tile_requested(2, id));
    assert!(!service.tile_requested(2, 1));
    assert_eq!(host.sent_to(2), vec![id]);
    assert!(dir.join("walls.toml").exists());
}

#[test]
fn replacing_a_wall_abandons_old_tiles() {
    let dir = scratch("replace");
    let host = Arc::new(FakeHost::with_grass());
    let mut service = open(&host, dir.clone());
    render_world(&mut service);

    service.create_wall("world", 2, BlockPos::default(), 90.0).unwrap();
    tick_until(&mut service, |s| !s.walls().is_empty() && s.is_idle());
    let first = service.walls().get("world").unwrap().clone();
    assert_eq!(first.facing, Orientation::West);

    service.create_wall("world", 1, BlockPos::default(), 180.0).unwrap();
    tick_until(&mut service, |s| {
        s.walls().get("world").map(|w| w.size) == Some(1) && s.is_idle()
    });
    let second = service.walls().get("world").unwrap().clone();
    assert_eq!(second.facing, Orientation::North);
    assert_eq!(service.tiles().len(), 1);
    assert!(first.ids().all(|id| service.tiles().get(id).is_none()));
    assert!(second.ids().all(|id| !first.ids().any(|o| o == id)));

    drop(service);
    let reopened = voxmap_walls::WallStore::open(dir.join("walls.toml")).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.get("world"), Some(&second));
}

#[test]
fn marker_refresh_is_single_flight_and_skips_offline_viewers() {
    let dir = scratch("markers");
    let host = Arc::new(FakeHost::with_grass());
    let mut service = open(&host, dir.clone());

    // nothing to do without walls
    assert!(!service.refresh_markers());
    render_world(&mut service);
    service.create_wall("world", 1, BlockPos::default(), 0.0).unwrap();
    tick_until(&mut service, |s| !s.walls().is_empty() && s.is_idle());

    // no viewers yet
    assert!(!service.refresh_markers());
    host.add_viewer(7, "alex", "world", 16.0, 16.0);
    host.add_viewer(8, "gone", "world", 4.0, 4.0);
    host.offline.lock().unwrap().insert(8);

    assert!(service.refresh_markers());
    assert!(service.is_refreshing());
    assert!(!service.refresh_markers());
    tick_until(&mut service, |s| !s.is_refreshing() && s.is_idle());

    let wall = service.walls().get("world").unwrap().clone();
    assert_eq!(host.sent_to(7), wall.ids().collect::<Vec<_>>());
    assert!(host.sent_to(8).is_empty());
    let players = std::fs::read_to_string(dir.join("players.json")).unwrap();
    assert!(players.contains("alex") && players.contains("gone"));
    assert!(service.cache_stats().reloads >= 1);

    // the stored tile now carries the marker, unlike the plain base image
    let base = service.base_image("world", 1).unwrap().unwrap();
    let tile = service.tiles().get(wall.tile_id(0, 0).unwrap()).unwrap();
    assert_ne!(tile.data, base.data);
}

#[test]
fn removing_a_wall_forgets_its_tiles() {
    let dir = scratch("remove");
    let host = Arc::new(FakeHost::with_grass());
    let mut service = open(&host, dir);
    render_world(&mut service);
    service.create_wall("world", 2, BlockPos::default(), 0.0).unwrap();
    tick_until(&mut service, |s| !s.walls().is_empty() && s.is_idle());

    assert!(service.remove_wall("world").unwrap().is_some());
    assert!(service.remove_wall("world").unwrap().is_none());
    assert!(service.tiles().is_empty());
    assert!(!service.refresh_markers());
}

#[test]
fn region_config_switches_to_bounded_render() {
    let dir = scratch("region");
    let host = Arc::new(FakeHost::with_grass());
    let mut service = open(&host, dir);

    assert!(matches!(
        service.set_region("world", 16, 16, 8),
        Err(ServiceError::Wall(WallError::InvalidRadius(8)))
    ));
    service.set_region("world", 16, 16, 16).unwrap();
    assert!(!service.region_info()[0].1.enabled);
    assert!(service.confirm_region("world").unwrap());
    tick_until(&mut service, |s| s.rendered("world").is_some() && s.is_idle());
    let info = service.rendered("world").unwrap();
    assert_eq!((info.min_x, info.max_x, info.min_z, info.max_z), (0, 32, 0, 32));
    assert_eq!((info.center_x, info.center_z), (16, 16));

    assert!(service.clear_region("world").unwrap().is_some());
    assert!(service.region_info().is_empty());
    assert!(!service.confirm_region("world").unwrap());
}

#[test]
fn joining_viewer_gets_region_walls_after_delay() {
    let dir = scratch("join");
    let host = Arc::new(FakeHost::with_grass());
    let mut service = open(&host, dir);
    render_world(&mut service);
    service.create_wall("world", 2, BlockPos::default(), 0.0).unwrap();
    tick_until(&mut service, |s| !s.walls().is_empty() && s.is_idle());

    host.add_viewer(3, "late", "world", 0.0, 0.0);
    service.viewer_joined(3);
    // join delay is many ticks at this tick rate
    for _ in 0..5 {
        service.tick();
    }
    assert!(host.sent_to(3).is_empty());
}
