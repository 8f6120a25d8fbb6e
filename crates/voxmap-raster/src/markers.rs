use serde::{Deserialize, Serialize};
use voxmap_palette::Rgb;
use voxmap_world::BoundingRegion;

use crate::canvas::Canvas;
use crate::font;

const DOT: Rgb = [255, 51, 51];
const OUTLINE: Rgb = [255, 255, 255];
const LABEL_BG: Rgb = [0, 0, 0];
const LABEL_ALPHA: u8 = 230;
const LABEL_FG: Rgb = [255, 255, 255];

/// A viewer position captured for one refresh cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewerSample {
    pub name: String,
    pub x: f64,
    pub z: f64,
}

impl ViewerSample {
    pub fn new(name: impl Into<String>, x: f64, z: f64) -> Self {
        Self {
            name: name.into(),
            x,
            z,
        }
    }
}

/// Marker geometry for a square canvas, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerStyle {
    pub dot: u32,
    pub font_px: u32,
    pub stroke: u32,
    pub gap: u32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub corner: u32,
}

impl MarkerStyle {
    pub fn for_side(side: u32) -> Self {
        let s = f64::from(side);
        let at_least = |min: u32, f: f64| min.max((s * f) as u32);
        let stroke = at_least(2, 0.004);
        Self {
            dot: at_least(8, 0.025),
            font_px: at_least(12, 0.022),
            stroke,
            gap: at_least(4, 0.008),
            pad_x: at_least(4, 0.006),
            pad_y: at_least(2, 0.003),
            corner: stroke.max(2),
        }
    }
}

/// Pixel of world position `(x, z)` on a `side`-square canvas covering
/// `bounds`, or `None` when the position lies outside the bounds.
pub fn map_to_canvas(bounds: &BoundingRegion, side: u32, x: f64, z: f64) -> Option<(u32, u32)> {
    let (rx, rz) = bounds.relative(x, z)?;
    let last = side.saturating_sub(1);
    let px = ((rx * f64::from(side)) as u32).min(last);
    let pz = ((rz * f64::from(side)) as u32).min(last);
    Some((px, pz))
}

/// Copy of `base` with a marker and name label for every sample inside
/// `bounds`. `base` must be square.
pub fn composite(base: &Canvas, bounds: &BoundingRegion, samples: &[ViewerSample]) -> Canvas {
    let mut out = base.clone();
    let side = base.width;
    let style = MarkerStyle::for_side(side);
    for sample in samples {
        let Some((px, pz)) = map_to_canvas(bounds, side, sample.x, sample.z) else {
            log::trace!(target: "markers", "{} outside mapped area", sample.name);
            continue;
        };
        draw_dot(&mut out, i64::from(px), i64::from(pz), &style);
        draw_label(&mut out, i64::from(px), i64::from(pz), &sample.name, &style);
    }
    out
}

fn draw_dot(canvas: &mut Canvas, cx: i64, cz: i64, style: &MarkerStyle) {
    let d = i64::from(style.dot);
    let left = cx - d / 2;
    let top = cz - d / 2;
    let r = d as f64 / 2.0;
    let half_stroke = f64::from(style.stroke) / 2.0;
    let (mx, mz) = (left as f64 + r, top as f64 + r);
    let reach = (r + half_stroke).ceil() as i64;
    for y in (cz - reach)..=(cz + reach) {
        for x in (cx - reach)..=(cx + reach) {
            let dist = ((x as f64 + 0.5 - mx).powi(2) + (y as f64 + 0.5 - mz).powi(2)).sqrt();
            if dist > r + half_stroke {
                continue;
            }
            let rgb = if dist >= r - half_stroke { OUTLINE } else { DOT };
            canvas.blend_pixel(x, y, rgb, 255);
        }
    }
}

fn draw_label(canvas: &mut Canvas, cx: i64, cz: i64, name: &str, style: &MarkerStyle) {
    let side = i64::from(canvas.width);
    let scale = font::scale_for(style.font_px);
    let (tw, th) = font::measure(name, scale);
    let box_w = i64::from(tw + style.pad_x * 2);
    let box_h = i64::from(th + style.pad_y * 2);
    let box_x = (cx - box_w / 2).min(side - box_w - 2).max(2);
    let box_y = (cz - i64::from(style.dot) / 2 - i64::from(style.gap) - box_h).max(2);
    fill_round_rect(canvas, box_x, box_y, box_w, box_h, i64::from(style.corner) / 2);
    font::draw_text(
        canvas,
        box_x + i64::from(style.pad_x),
        box_y + i64::from(style.pad_y),
        name,
        scale,
        LABEL_FG,
    );
}

fn fill_round_rect(canvas: &mut Canvas, x: i64, y: i64, w: i64, h: i64, radius: i64) {
    let r = radius.min(w / 2).min(h / 2);
    for py in y..y + h {
        for px in x..x + w {
            // distance into the nearest corner square, if any
            let dx = (x + r - px).max(px - (x + w - 1 - r)).max(0);
            let dy = (y + r - py).max(py - (y + h - 1 - r)).max(0);
            if dx > 0 && dy > 0 && dx * dx + dy * dy > r * r {
                continue;
            }
            canvas.blend_pixel(px, py, LABEL_BG, LABEL_ALPHA);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_has_floors_and_scales_up() {
        let small = MarkerStyle::for_side(128);
        assert_eq!(small.dot, 8);
        assert_eq!(small.font_px, 12);
        assert_eq!(small.stroke, 2);
        assert_eq!(small.corner, 2);
        let big = MarkerStyle::for_side(1280);
        assert_eq!(big.dot, 32);
        assert_eq!(big.font_px, 28);
        assert_eq!(big.stroke, 5);
        assert_eq!(big.gap, 10);
    }

    #[test]
    fn rounded_corners_are_skipped() {
        let mut c = Canvas::filled(20, 20, [255, 255, 255]);
        fill_round_rect(&mut c, 2, 2, 10, 10, 3);
        assert_eq!(c.pixel(2, 2), [255, 255, 255]);
        assert_ne!(c.pixel(6, 2), [255, 255, 255]);
        assert_ne!(c.pixel(6, 6), [255, 255, 255]);
    }
}
