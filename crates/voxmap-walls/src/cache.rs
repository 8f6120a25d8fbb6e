use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;
use voxmap_raster::{Canvas, RasterError, TILE_SIZE};

use crate::error::WallError;
use crate::wall::check_grid_size;

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub region: String,
    pub grid_size: u32,
}

impl CacheKey {
    pub fn new(region: impl Into<String>, grid_size: u32) -> Self {
        Self {
            region: region.into(),
            grid_size,
        }
    }
}

/// Full-resolution render output per region.
pub trait SourceImages: Send + Sync {
    /// `Ok(None)` when the region has never been rendered.
    fn load(&self, region: &str) -> Result<Option<Canvas>, RasterError>;
}

/// PNG files named `<region>.png` under one directory.
#[derive(Clone, Debug)]
pub struct MapsDir {
    root: PathBuf,
}

impl MapsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, region: &str) -> PathBuf {
        self.root.join(format!("{region}.png"))
    }
}

impl SourceImages for MapsDir {
    fn load(&self, region: &str) -> Result<Option<Canvas>, RasterError> {
        let path = self.path_for(region);
        if !path.exists() {
            return Ok(None);
        }
        Canvas::load_png(path).map(Some)
    }
}

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub reloads: u64,
    pub entries: usize,
}

struct Entry {
    canvas: Arc<Canvas>,
    stored_at: u64,
}

/// Base images rescaled to `grid_size * 128` square, kept for a fixed TTL.
///
/// Reads take the shared map lock only. A reload holds a lock private to its
/// key, so two callers missing on the same key load the source once while
/// other keys proceed.
pub struct BaseImageCache {
    source: Arc<dyn SourceImages>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
    entries: RwLock<HashMap<CacheKey, Entry>>,
    reload_locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    /// Bumped by every `clear`; a reload started before it is not stored.
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    reloads: AtomicU64,
}

impl BaseImageCache {
    pub fn new(source: Arc<dyn SourceImages>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock), DEFAULT_TTL)
    }

    pub fn with_clock(source: Arc<dyn SourceImages>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl_ms: ttl.as_millis() as u64,
            entries: RwLock::new(HashMap::new()),
            reload_locks: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Cached base for `key`, reloading it when missing or stale.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Arc<Canvas>>, WallError> {
        check_grid_size(key.grid_size)?;
        if let Some(c) = self.fresh(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(c));
        }

        let lock = self.reload_lock(key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        // another caller may have reloaded while we waited
        if let Some(c) = self.fresh(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(c));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let generation = self.generation.load(Ordering::Acquire);
        let Some(source) = self.source.load(&key.region)? else {
            log::debug!(target: "cache", "No source image for region '{}'", key.region);
            return Ok(None);
        };
        let side = key.grid_size * TILE_SIZE;
        let canvas = Arc::new(source.resized(side, side));
        self.reloads.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            target: "cache",
            "Reloaded '{}' {}x{} -> {side}x{side}",
            key.region,
            source.width,
            source.height
        );

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::Acquire) == generation {
            entries.insert(
                key.clone(),
                Entry {
                    canvas: Arc::clone(&canvas),
                    stored_at: self.clock.now_ms(),
                },
            );
        } else {
            log::debug!(target: "cache", "Cache cleared during reload of '{}', not storing", key.region);
        }
        Ok(Some(canvas))
    }

    /// Evicts every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::AcqRel);
        let n = entries.len();
        entries.clear();
        if n > 0 {
            log::info!(target: "cache", "Cleared {n} cached base image(s)");
        }
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner()).len();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
            entries,
        }
    }

    fn fresh(&self, key: &CacheKey) -> Option<Arc<Canvas>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;
        let age = self.clock.now_ms().saturating_sub(entry.stored_at);
        (age < self.ttl_ms).then(|| Arc::clone(&entry.canvas))
    }

    fn reload_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self.reload_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(key.clone()).or_default())
    }
}
