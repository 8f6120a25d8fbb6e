use std::fmt;

use voxmap_raster::RasterError;
use voxmap_world::RegionError;

#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Corrupt { key: String, reason: String },
}

impl PersistError {
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        PersistError::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "io error: {e}"),
            PersistError::Parse(e) => write!(f, "parse error: {e}"),
            PersistError::Serialize(e) => write!(f, "serialize error: {e}"),
            PersistError::Corrupt { key, reason } => write!(f, "corrupt record '{key}': {reason}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(e) => Some(e),
            PersistError::Parse(e) => Some(e),
            PersistError::Serialize(e) => Some(e),
            PersistError::Corrupt { .. } => None,
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Io(e)
    }
}

impl From<toml::de::Error> for PersistError {
    fn from(e: toml::de::Error) -> Self {
        PersistError::Parse(e)
    }
}

impl From<toml::ser::Error> for PersistError {
    fn from(e: toml::ser::Error) -> Self {
        PersistError::Serialize(e)
    }
}

#[derive(Debug)]
pub enum WallError {
    InvalidGridSize(u32),
    InvalidRadius(i32),
    /// The requested area does not fit in world coordinates.
    InvalidArea(RegionError),
    SourceMissing(String),
    Persist(PersistError),
    Raster(RasterError),
}

impl fmt::Display for WallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WallError::InvalidGridSize(n) => {
                write!(f, "grid size {n} out of range (1-{})", crate::MAX_GRID_SIZE)
            }
            WallError::InvalidRadius(r) => {
                write!(f, "radius {r} below minimum {}", crate::MIN_REGION_RADIUS)
            }
            WallError::InvalidArea(e) => write!(f, "{e}"),
            WallError::SourceMissing(region) => write!(f, "no rendered map for region '{region}'"),
            WallError::Persist(e) => write!(f, "{e}"),
            WallError::Raster(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for WallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WallError::Persist(e) => Some(e),
            WallError::Raster(e) => Some(e),
            WallError::InvalidArea(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PersistError> for WallError {
    fn from(e: PersistError) -> Self {
        WallError::Persist(e)
    }
}

impl From<RasterError> for WallError {
    fn from(e: RasterError) -> Self {
        WallError::Raster(e)
    }
}

impl From<RegionError> for WallError {
    fn from(e: RegionError) -> Self {
        WallError::InvalidArea(e)
    }
}
