//! World-store contract, cell addressing, and populated-cell discovery.
#![forbid(unsafe_code)]

pub mod cell;
pub mod memory;
pub mod region;
pub mod scanner;
pub mod store;

pub use cell::{BlockPos, CELL_SIZE, Cell};
pub use memory::MemoryWorld;
pub use region::{BoundingRegion, RegionError, WORLD_LIMIT};
pub use scanner::{ScanReport, ScanSettings, WorldScanner};
pub use store::{StoreError, WorldStore};
