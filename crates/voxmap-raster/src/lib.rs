//! Canvas rasterisation, shading, tiling, and marker overlays.
#![forbid(unsafe_code)]

pub mod canvas;
pub mod error;
pub mod font;
pub mod markers;
pub mod rasterizer;
pub mod shade;
pub mod splitter;

pub use canvas::Canvas;
pub use error::RasterError;
pub use markers::{MarkerStyle, ViewerSample, composite, map_to_canvas};
pub use rasterizer::{
    BACKGROUND, DEFAULT_MAX_CANVAS_DIM, PIXELS_PER_UNIT, Rasterizer, RenderResult, RenderSettings,
    canvas_size,
};
pub use shade::shade;
pub use splitter::{TILE_SIZE, TileGrid, assemble, split};
