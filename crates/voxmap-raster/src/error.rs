use std::fmt;

use voxmap_world::RegionError;

#[derive(Debug)]
pub enum RasterError {
    InvalidRegion(RegionError),
    Image(image::ImageError),
    Io(std::io::Error),
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::InvalidRegion(e) => write!(f, "{e}"),
            RasterError::Image(e) => write!(f, "image error: {e}"),
            RasterError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for RasterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RasterError::InvalidRegion(e) => Some(e),
            RasterError::Image(e) => Some(e),
            RasterError::Io(e) => Some(e),
        }
    }
}

impl From<RegionError> for RasterError {
    fn from(e: RegionError) -> Self {
        RasterError::InvalidRegion(e)
    }
}

impl From<image::ImageError> for RasterError {
    fn from(e: image::ImageError) -> Self {
        RasterError::Image(e)
    }
}

impl From<std::io::Error> for RasterError {
    fn from(e: std::io::Error) -> Self {
        RasterError::Io(e)
    }
}
