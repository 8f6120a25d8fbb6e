//! Wall records, tile identifiers, region configuration, and the base-image cache.
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod mapping;
pub mod regions;
pub mod store;
pub mod tile_ids;
pub mod wall;

pub use cache::{BaseImageCache, CacheKey, CacheStats, Clock, DEFAULT_TTL, MapsDir, SourceImages, SystemClock};
pub use error::{PersistError, WallError};
pub use mapping::MappingFile;
pub use regions::{RegionConfig, RegionRegistry};
pub use store::WallStore;
pub use tile_ids::{BASE_TILE_ID, TileIdAllocator};
pub use wall::{FramePlacement, Orientation, WallInfo};

/// Largest accepted wall grid size.
pub const MAX_GRID_SIZE: u32 = 100;
/// Smallest accepted bounded-render radius.
pub const MIN_REGION_RADIUS: i32 = 16;
