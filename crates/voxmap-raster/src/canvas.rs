use std::fs;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage};
use voxmap_palette::Rgb;

use crate::error::RasterError;

/// Packed RGB pixel buffer, row-major from the north-west corner.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// Device pixels per world unit. 1.0 for images that did not come from a render.
    pub pixels_per_unit: f64,
    pub data: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0])
    }

    pub fn filled(width: u32, height: u32, rgb: Rgb) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            pixels_per_unit: 1.0,
            data,
        }
    }

    #[inline]
    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: Rgb) {
        let idx = self.idx(x, y);
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let idx = self.idx(x, y);
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Fills the rectangle, clipped to the canvas. Negative origins are allowed.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, rgb: Rgb) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(i64::from(self.width));
        let y1 = (y + h).min(i64::from(self.height));
        for py in y0..y1 {
            for px in x0..x1 {
                self.put_pixel(px as u32, py as u32, rgb);
            }
        }
    }

    /// Source-over blend of `rgb` at `alpha` (0..=255). Out-of-bounds is a no-op.
    pub fn blend_pixel(&mut self, x: i64, y: i64, rgb: Rgb, alpha: u8) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if alpha == 255 {
            self.put_pixel(x, y, rgb);
            return;
        }
        let dst = self.pixel(x, y);
        let a = u32::from(alpha);
        let mut out = [0u8; 3];
        for c in 0..3 {
            out[c] = ((u32::from(rgb[c]) * a + u32::from(dst[c]) * (255 - a) + 127) / 255) as u8;
        }
        self.put_pixel(x, y, out);
    }

    /// Copy of the `w`×`h` block at `(x, y)`. The block must lie inside the canvas.
    pub fn sub_image(&self, x: u32, y: u32, w: u32, h: u32) -> Canvas {
        assert!(x + w <= self.width && y + h <= self.height, "sub_image out of bounds");
        let mut data = Vec::with_capacity(w as usize * h as usize * 3);
        for row in y..y + h {
            let start = self.idx(x, row);
            data.extend_from_slice(&self.data[start..start + w as usize * 3]);
        }
        Canvas {
            width: w,
            height: h,
            pixels_per_unit: self.pixels_per_unit,
            data,
        }
    }

    /// Copies `src` with its north-west corner at `(x, y)`, clipped.
    pub fn blit(&mut self, src: &Canvas, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = src.width.min(self.width - x) as usize;
        for row in 0..src.height.min(self.height - y) {
            let s = src.idx(0, row);
            let d = self.idx(x, y + row);
            self.data[d..d + w * 3].copy_from_slice(&src.data[s..s + w * 3]);
        }
    }

    /// Bilinear resample to `width`×`height`.
    pub fn resized(&self, width: u32, height: u32) -> Canvas {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let sx = f64::from(width) / f64::from(self.width.max(1));
        let resized = imageops::resize(&self.to_image(), width, height, FilterType::Triangle);
        let mut out = Canvas::from_image(resized);
        out.pixels_per_unit = self.pixels_per_unit * sx;
        out
    }

    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    pub fn from_image(img: RgbImage) -> Canvas {
        let (width, height) = img.dimensions();
        Canvas {
            width,
            height,
            pixels_per_unit: 1.0,
            data: img.into_raw(),
        }
    }

    /// Writes a PNG next to `path` then renames it into place, so readers
    /// never observe a partial file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), RasterError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("png.tmp");
        self.to_image().save_with_format(&tmp, ImageFormat::Png)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load_png(path: impl AsRef<Path>) -> Result<Canvas, RasterError> {
        let img = image::open(path.as_ref())?;
        Ok(Canvas::from_image(img.to_rgb8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_mixes_towards_source() {
        let mut c = Canvas::filled(2, 1, [200, 200, 200]);
        c.blend_pixel(0, 0, [0, 0, 0], 230);
        let p = c.pixel(0, 0);
        assert!(p[0] < 30, "{p:?}");
        c.blend_pixel(5, 0, [0, 0, 0], 255);
        assert_eq!(c.pixel(1, 0), [200, 200, 200]);
    }

    #[test]
    fn blit_and_sub_image_agree() {
        let mut c = Canvas::filled(8, 8, [1, 2, 3]);
        let patch = Canvas::filled(3, 2, [9, 9, 9]);
        c.blit(&patch, 6, 7);
        assert_eq!(c.pixel(7, 7), [9, 9, 9]);
        assert_eq!(c.pixel(5, 7), [1, 2, 3]);
        let s = c.sub_image(6, 6, 2, 2);
        assert_eq!(s.pixel(0, 1), [9, 9, 9]);
        assert_eq!(s.pixel(0, 0), [1, 2, 3]);
    }

    #[test]
    fn resize_keeps_solid_colour() {
        let c = Canvas::filled(10, 10, [40, 80, 120]);
        let r = c.resized(25, 25);
        assert_eq!((r.width, r.height), (25, 25));
        assert_eq!(r.pixel(12, 12), [40, 80, 120]);
    }

    #[test]
    fn png_roundtrip_on_disk() {
        let dir = std::env::temp_dir().join(format!("voxmap-canvas-{}", std::process::id()));
        let path = dir.join("a.png");
        let mut c = Canvas::filled(4, 3, [10, 20, 30]);
        c.put_pixel(3, 2, [255, 0, 0]);
        c.save_png(&path).unwrap();
        let back = Canvas::load_png(&path).unwrap();
        assert_eq!(back.data, c.data);
        let _ = fs::remove_dir_all(dir);
    }
}
