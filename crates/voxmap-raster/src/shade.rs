//! Height and slope shading for top-down pixels.

use voxmap_palette::Rgb;

const HEIGHT_SPAN: f32 = 180.0;
const SLOPE_FACTOR: f32 = 0.025;
const SLOPE_LIMIT: f32 = 0.25;
const MIN_BRIGHT: f32 = 0.35;
const MAX_BRIGHT: f32 = 1.5;
const SATURATION_BOOST: f32 = 1.4;

/// Final colour of a column whose visible top is `base` at `height`.
///
/// Lower north/west neighbours brighten the pixel, higher ones darken it.
/// The result is deterministic for identical inputs.
pub fn shade(base: Rgb, height: i32, north: i32, west: i32) -> Rgb {
    let mut bright = 0.5 + (height as f32 / HEIGHT_SPAN) * 0.9;
    let mut slope = (height - north) as f32 * SLOPE_FACTOR;
    slope += (height - west) as f32 * SLOPE_FACTOR;
    bright += slope.clamp(-SLOPE_LIMIT, SLOPE_LIMIT);
    let bright = bright.clamp(MIN_BRIGHT, MAX_BRIGHT);

    let lit = base.map(|c| ((f32::from(c) * bright) as i32).clamp(0, 255) as u8);
    let [h, s, v] = rgb_to_hsb(lit);
    hsb_to_rgb(h, (s * SATURATION_BOOST).min(1.0), v)
}

fn rgb_to_hsb([r, g, b]: Rgb) -> [f32; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let cmax = r.max(g).max(b);
    let cmin = r.min(g).min(b);
    let brightness = cmax as f32 / 255.0;
    let saturation = if cmax != 0 {
        (cmax - cmin) as f32 / cmax as f32
    } else {
        0.0
    };
    if saturation == 0.0 {
        return [0.0, 0.0, brightness];
    }
    let span = (cmax - cmin) as f32;
    let rc = (cmax - r) as f32 / span;
    let gc = (cmax - g) as f32 / span;
    let bc = (cmax - b) as f32 / span;
    let mut hue = if r == cmax {
        bc - gc
    } else if g == cmax {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    hue /= 6.0;
    if hue < 0.0 {
        hue += 1.0;
    }
    [hue, saturation, brightness]
}

fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> Rgb {
    let to_u8 = |v: f32| (v * 255.0 + 0.5) as i32 as u8;
    if saturation == 0.0 {
        let v = to_u8(brightness);
        return [v, v, v];
    }
    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));
    let (r, g, b) = match h as i32 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    };
    [to_u8(r), to_u8(g), to_u8(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsb_roundtrip_is_close() {
        for rgb in [[255, 0, 0], [10, 200, 30], [128, 128, 128], [0, 0, 0], [20, 40, 90]] {
            let [h, s, v] = rgb_to_hsb(rgb);
            let back = hsb_to_rgb(h, s, v);
            for c in 0..3 {
                assert!((i32::from(back[c]) - i32::from(rgb[c])).abs() <= 1, "{rgb:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn grey_stays_grey() {
        let out = shade([128, 128, 128], 64, 64, 64);
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
    }

    #[test]
    fn lower_neighbours_brighten() {
        let flat = shade([100, 150, 100], 64, 64, 64);
        let lit = shade([100, 150, 100], 64, 60, 60);
        let dark = shade([100, 150, 100], 64, 70, 70);
        assert!(lit[1] > flat[1]);
        assert!(dark[1] < flat[1]);
    }

    #[test]
    fn brightness_is_clamped() {
        // very deep and in a pit: 0.35 floor
        let deep = shade([200, 200, 200], -400, 0, 0);
        assert!((69..=70).contains(&deep[0]), "{deep:?}");
        assert_eq!(deep[0], deep[2]);
        // very high and on a ridge: 1.5 ceiling, channels saturate
        let high = shade([200, 200, 200], 400, 0, 0);
        assert_eq!(high, [255, 255, 255]);
    }
}
