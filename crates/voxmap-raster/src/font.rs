//! Built-in 5×7 bitmap font for marker labels.

use voxmap_palette::Rgb;

use crate::canvas::Canvas;

pub const GLYPH_W: u32 = 5;
pub const GLYPH_H: u32 = 7;
/// Horizontal advance per glyph at scale 1, including one column of spacing.
pub const ADVANCE: u32 = GLYPH_W + 1;

type Glyph = [u8; GLYPH_H as usize];

// Rows top to bottom, bit 4 is the leftmost column.
const DIGITS: [Glyph; 10] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
];

const LETTERS: [Glyph; 26] = [
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
];

const SPACE: Glyph = [0; 7];
const DASH: Glyph = [0, 0, 0, 0x1F, 0, 0, 0];
const UNDERSCORE: Glyph = [0, 0, 0, 0, 0, 0, 0x1F];
const DOT: Glyph = [0, 0, 0, 0, 0, 0x0C, 0x0C];
const QUESTION: Glyph = [0x0E, 0x11, 0x01, 0x02, 0x04, 0, 0x04];
const BANG: Glyph = [0x04, 0x04, 0x04, 0x04, 0x04, 0, 0x04];
const COLON: Glyph = [0, 0x0C, 0x0C, 0, 0x0C, 0x0C, 0];
const APOSTROPHE: Glyph = [0x04, 0x04, 0x08, 0, 0, 0, 0];

/// Bitmap for `c`. Lowercase renders as uppercase; anything unsupported as `?`.
pub fn glyph(c: char) -> &'static Glyph {
    match c.to_ascii_uppercase() {
        d @ '0'..='9' => &DIGITS[(d as u8 - b'0') as usize],
        l @ 'A'..='Z' => &LETTERS[(l as u8 - b'A') as usize],
        ' ' => &SPACE,
        '-' => &DASH,
        '_' => &UNDERSCORE,
        '.' => &DOT,
        '!' => &BANG,
        ':' => &COLON,
        '\'' => &APOSTROPHE,
        _ => &QUESTION,
    }
}

/// Integer glyph scale giving roughly `font_px` of line height.
pub fn scale_for(font_px: u32) -> u32 {
    ((font_px + 4) / 8).max(1)
}

/// Pixel size of `text` drawn at `scale`.
pub fn measure(text: &str, scale: u32) -> (u32, u32) {
    let n = text.chars().count() as u32;
    if n == 0 {
        return (0, GLYPH_H * scale);
    }
    (n * ADVANCE * scale - scale, GLYPH_H * scale)
}

/// Draws `text` with its top-left corner at `(x, y)`, clipped to the canvas.
pub fn draw_text(canvas: &mut Canvas, x: i64, y: i64, text: &str, scale: u32, rgb: Rgb) {
    let s = i64::from(scale);
    let mut pen = x;
    for c in text.chars() {
        let g = glyph(c);
        for (row, bits) in g.iter().enumerate() {
            for colm in 0..GLYPH_W {
                if bits & (0x10 >> colm) != 0 {
                    canvas.fill_rect(
                        pen + i64::from(colm) * s,
                        y + row as i64 * s,
                        s,
                        s,
                        rgb,
                    );
                }
            }
        }
        pen += i64::from(ADVANCE) * s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_accounts_for_scale() {
        assert_eq!(measure("AB", 1), (11, 7));
        assert_eq!(measure("AB", 3), (33, 21));
        assert_eq!(measure("", 2), (0, 14));
    }

    #[test]
    fn unsupported_characters_fall_back() {
        assert_eq!(glyph('é'), glyph('?'));
        assert_eq!(glyph('q'), glyph('Q'));
    }

    #[test]
    fn draws_inside_canvas_only() {
        let mut c = Canvas::filled(8, 8, [0, 0, 0]);
        draw_text(&mut c, -2, -3, "I", 1, [255, 255, 255]);
        // the I stem (column 2) lands on x = 0
        assert_eq!(c.pixel(0, 0), [255, 255, 255]);
        assert_eq!(c.pixel(7, 7), [0, 0, 0]);
    }
}
