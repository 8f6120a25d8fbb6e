use std::fmt;

use voxmap_walls::{PersistError, WallError};

#[derive(Debug)]
pub enum ServiceError {
    /// The host has no world by that name.
    UnknownRegion(String),
    Wall(WallError),
    /// A job for the same region is already in flight.
    Busy(String),
    /// The worker pool could not be started.
    Workers(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::UnknownRegion(r) => write!(f, "unknown region '{r}'"),
            ServiceError::Wall(e) => write!(f, "{e}"),
            ServiceError::Busy(r) => write!(f, "region '{r}' is busy"),
            ServiceError::Workers(e) => write!(f, "worker pool: {e}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Wall(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WallError> for ServiceError {
    fn from(e: WallError) -> Self {
        ServiceError::Wall(e)
    }
}

impl From<PersistError> for ServiceError {
    fn from(e: PersistError) -> Self {
        ServiceError::Wall(WallError::Persist(e))
    }
}
