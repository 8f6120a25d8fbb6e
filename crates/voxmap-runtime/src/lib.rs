//! Map service: background workers, tick-side application, and tile delivery.
#![forbid(unsafe_code)]

pub mod delivery;
pub mod error;
pub mod feeds;
pub mod host;
pub mod placement;
pub mod pool;
pub mod schedule;
pub mod service;
pub mod settings;
pub mod tiles;

pub use delivery::{DEFAULT_BATCH_SIZE, Delivery, DeliveryScheduler, StepReport};
pub use error::ServiceError;
pub use feeds::{MapInfo, MapsFeed, PlayerEntry, PlayersFeed};
pub use host::{Host, RecipientId, Transport, ViewerSnapshot, WallPlacer};
pub use placement::{PlacementProgress, PlacementQueue, SLOTS_PER_TICK};
pub use pool::WorkerPool;
pub use service::{MapService, TickReport};
pub use settings::ServiceSettings;
pub use tiles::TileImageStore;
