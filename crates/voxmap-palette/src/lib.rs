//! Material palette: base colours and transparency for top-down rendering.
#![forbid(unsafe_code)]

pub mod config;
pub mod defaults;
pub mod table;

pub use table::{Material, PixelColorTable, Rgb};
