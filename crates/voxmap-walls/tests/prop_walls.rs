use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;
use voxmap_raster::{Canvas, RasterError};
use voxmap_walls::{
    BASE_TILE_ID, BaseImageCache, CacheKey, Clock, MapsDir, Orientation, SourceImages,
    TileIdAllocator, WallError, WallStore,
};
use voxmap_world::BlockPos;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("voxmap-walls-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

proptest! {
    #[test]
    fn allocation_is_dense_and_monotonic(start in 0u64..50_000_000, sizes in prop::collection::vec(1u64..=100, 1..8)) {
        let ids = TileIdAllocator::new(start);
        let mut seen = Vec::new();
        for n in sizes {
            let before = ids.peek();
            let range = ids.allocate(n * n);
            prop_assert_eq!(range.start, before);
            prop_assert_eq!(ids.peek(), before + n * n);
            prop_assert!(range.start >= BASE_TILE_ID);
            seen.extend(range);
        }
        let mut dedup = seen.clone();
        dedup.sort_unstable();
        dedup.dedup();
        prop_assert_eq!(dedup.len(), seen.len());
    }
}

#[test]
fn creating_over_existing_wall_replaces_it() {
    let dir = scratch("replace");
    let path = dir.join("walls.toml");
    let mut store = WallStore::open(&path).unwrap();
    let (first, old) = store
        .create("world", 2, BlockPos::new(0, 64, 0), Orientation::South, dir.join("world.png"))
        .unwrap();
    assert!(old.is_none());
    assert_eq!(first.ids().collect::<Vec<_>>(), (BASE_TILE_ID..BASE_TILE_ID + 4).collect::<Vec<_>>());

    let before = store.next_tile_id();
    let (second, old) = store
        .create("world", 3, BlockPos::new(5, 70, 5), Orientation::East, dir.join("world.png"))
        .unwrap();
    assert_eq!(old.as_ref().map(|w| w.size), Some(2));
    assert_eq!(store.next_tile_id(), before + 9);
    assert!(second.ids().all(|id| id >= before));
    assert!(second.ids().all(|id| !first.ids().any(|o| o == id)));

    let reopened = WallStore::open(&path).unwrap();
    assert_eq!(reopened.len(), 1);
    let loaded = reopened.get("world").unwrap();
    assert_eq!(loaded, &second);
    assert_eq!(reopened.next_tile_id(), before + 9);
    assert!(reopened.wall_for_tile(first.tile_id(0, 0).unwrap()).is_none());
    assert_eq!(
        reopened.wall_for_tile(second.tile_id(2, 1).unwrap()).map(|w| w.region.as_str()),
        Some("world")
    );
}

#[test]
fn invalid_size_leaves_store_untouched() {
    let dir = scratch("invalid");
    let mut store = WallStore::open(dir.join("walls.toml")).unwrap();
    let before = store.next_tile_id();
    let err = store
        .create("world", 101, BlockPos::default(), Orientation::North, "x.png")
        .unwrap_err();
    assert!(matches!(err, WallError::InvalidGridSize(101)));
    assert_eq!(store.next_tile_id(), before);
    assert!(store.is_empty());
}

#[test]
fn ids_stay_unique_across_regions_and_reopen() {
    let dir = scratch("unique");
    let path = dir.join("walls.toml");
    let mut store = WallStore::open(&path).unwrap();
    let (a, _) = store
        .create("world", 3, BlockPos::default(), Orientation::North, dir.join("world.png"))
        .unwrap();
    let (b, _) = store
        .create("nether", 2, BlockPos::default(), Orientation::West, dir.join("nether.png"))
        .unwrap();
    drop(store);

    let mut store = WallStore::open(&path).unwrap();
    let (c, _) = store
        .create("end", 4, BlockPos::default(), Orientation::East, dir.join("end.png"))
        .unwrap();
    let (d, _) = store
        .create("world", 1, BlockPos::default(), Orientation::South, dir.join("world.png"))
        .unwrap();

    let mut all: Vec<u64> = [&a, &b, &c, &d].into_iter().flat_map(|w| w.ids()).collect();
    let n = all.len();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), n);
    assert_eq!(n, 9 + 4 + 16 + 1);
    assert_eq!(store.next_tile_id(), BASE_TILE_ID + n as u64);
}

#[test]
fn failed_save_leaves_store_untouched() {
    let dir = scratch("blocked");
    let path = dir.join("walls.toml");
    let mut store = WallStore::open(&path).unwrap();
    // a non-empty directory at the target path makes the rename fail
    std::fs::create_dir_all(path.join("occupied")).unwrap();
    assert!(
        store
            .create("world", 2, BlockPos::default(), Orientation::South, dir.join("world.png"))
            .is_err()
    );
    assert!(store.get("world").is_none());
    assert_eq!(store.len(), 0);

    std::fs::remove_dir_all(&path).unwrap();
    let (wall, _) = store
        .create("world", 2, BlockPos::default(), Orientation::South, dir.join("world.png"))
        .unwrap();
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir_all(path.join("occupied")).unwrap();
    assert!(store.remove("world").is_err());
    assert_eq!(store.get("world"), Some(&wall));

    std::fs::remove_dir_all(&path).unwrap();
    assert_eq!(store.remove("world").unwrap(), Some(wall));
    assert!(WallStore::open(&path).unwrap().is_empty());
}

#[test]
fn corrupt_record_is_skipped() {
    let dir = scratch("corrupt");
    let path = dir.join("walls.toml");
    std::fs::write(
        &path,
        r#"
next_tile_id = 10000010

[walls.good]
size = 1
base_x = 1
base_y = 2
base_z = 3
facing = "west"
image_path = "good.png"
tile_ids = [10000004]

[walls.bad]
size = 2
base_x = 0
base_y = 0
base_z = 0
facing = "west"
image_path = "bad.png"
tile_ids = [1, 2, 3]
"#,
    )
    .unwrap();
    let store = WallStore::open(&path).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("good").map(|w| w.facing), Some(Orientation::West));
    assert!(store.get("bad").is_none());
    assert_eq!(store.next_tile_id(), 10_000_010);
}

#[test]
fn counter_never_trails_stored_ids() {
    let dir = scratch("trailing");
    let path = dir.join("walls.toml");
    std::fs::write(
        &path,
        r#"
next_tile_id = 5

[walls.a]
size = 1
base_x = 0
base_y = 0
base_z = 0
facing = "north"
image_path = "a.png"
tile_ids = [10000050]
"#,
    )
    .unwrap();
    let store = WallStore::open(&path).unwrap();
    assert_eq!(store.next_tile_id(), 10_000_051);
}

#[derive(Default)]
struct ManualClock(AtomicU64);

impl ManualClock {
    fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct CountingSource {
    loads: Mutex<Vec<String>>,
}

impl CountingSource {
    fn count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }
}

impl SourceImages for CountingSource {
    fn load(&self, region: &str) -> Result<Option<Canvas>, RasterError> {
        self.loads.lock().unwrap().push(region.to_string());
        if region == "missing" {
            return Ok(None);
        }
        Ok(Some(Canvas::filled(300, 200, [10, 200, 30])))
    }
}

fn cache_with(ttl_ms: u64) -> (BaseImageCache, Arc<CountingSource>, Arc<ManualClock>) {
    let source = Arc::new(CountingSource::default());
    let clock = Arc::new(ManualClock::default());
    let cache = BaseImageCache::with_clock(
        source.clone(),
        clock.clone(),
        Duration::from_millis(ttl_ms),
    );
    (cache, source, clock)
}

#[test]
fn cache_hits_within_ttl_and_reloads_once_after() {
    let (cache, source, clock) = cache_with(600_000);
    let key = CacheKey::new("world", 2);
    let a = cache.get(&key).unwrap().unwrap();
    assert_eq!((a.width, a.height), (256, 256));
    clock.advance(599_999);
    let b = cache.get(&key).unwrap().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(source.count(), 1);

    clock.advance(1);
    let c = cache.get(&key).unwrap().unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    let d = cache.get(&key).unwrap().unwrap();
    assert!(Arc::ptr_eq(&c, &d));
    assert_eq!(source.count(), 2);

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.reloads), (2, 2, 2));
}

#[test]
fn cache_keys_by_grid_size_and_clear_evicts() {
    let (cache, source, _clock) = cache_with(600_000);
    let small = cache.get(&CacheKey::new("world", 1)).unwrap().unwrap();
    let big = cache.get(&CacheKey::new("world", 3)).unwrap().unwrap();
    assert_eq!(small.width, 128);
    assert_eq!(big.width, 384);
    assert_eq!(cache.stats().entries, 2);
    cache.clear();
    assert_eq!(cache.stats().entries, 0);
    cache.get(&CacheKey::new("world", 1)).unwrap();
    assert_eq!(source.count(), 3);
}

#[test]
fn cache_reports_missing_source() {
    let (cache, _source, _clock) = cache_with(1000);
    assert!(cache.get(&CacheKey::new("missing", 2)).unwrap().is_none());
    assert!(matches!(
        cache.get(&CacheKey::new("world", 0)),
        Err(WallError::InvalidGridSize(0))
    ));
}

#[test]
fn concurrent_misses_load_once() {
    let (cache, source, _clock) = cache_with(600_000);
    let cache = Arc::new(cache);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || cache.get(&CacheKey::new("world", 1)).unwrap().is_some())
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
    assert_eq!(source.count(), 1);
}

/// Blocks its first load until released so a `clear` can land mid-reload.
struct GatedSource {
    loads: AtomicU64,
    started: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl SourceImages for GatedSource {
    fn load(&self, _region: &str) -> Result<Option<Canvas>, RasterError> {
        if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            return Ok(Some(Canvas::filled(128, 128, [1, 1, 1])));
        }
        Ok(Some(Canvas::filled(128, 128, [2, 2, 2])))
    }
}

#[test]
fn clear_during_reload_discards_the_stale_image() {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let source = Arc::new(GatedSource {
        loads: AtomicU64::new(0),
        started: Mutex::new(started_tx),
        release: Mutex::new(release_rx),
    });
    let cache = Arc::new(BaseImageCache::with_clock(
        source.clone(),
        Arc::new(ManualClock::default()),
        Duration::from_secs(600),
    ));

    let loader = {
        let cache = Arc::clone(&cache);
        std::thread::spawn(move || cache.get(&CacheKey::new("world", 1)).unwrap().unwrap())
    };
    started_rx.recv().unwrap();
    cache.clear();
    release_tx.send(()).unwrap();
    let stale = loader.join().unwrap();
    assert_eq!(stale.pixel(0, 0), [1, 1, 1]);
    assert_eq!(cache.stats().entries, 0);

    let fresh = cache.get(&CacheKey::new("world", 1)).unwrap().unwrap();
    assert_eq!(fresh.pixel(0, 0), [2, 2, 2]);
    assert_eq!(source.loads.load(Ordering::SeqCst), 2);
}

#[test]
fn maps_dir_reads_png_and_reports_absent() {
    let dir = scratch("mapsdir");
    let maps = MapsDir::new(&dir);
    assert!(maps.load("world").unwrap().is_none());
    Canvas::filled(16, 16, [1, 2, 3]).save_png(maps.path_for("world")).unwrap();
    let c = maps.load("world").unwrap().unwrap();
    assert_eq!(c.pixel(5, 5), [1, 2, 3]);
}
