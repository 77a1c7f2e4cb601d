//! Bitmap text from the `font8x8` glyph set.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};

/// Glyph cell size in pixels at scale 1.
pub const GLYPH: u32 = 8;

/// Pixel width of `text` at `scale`.
pub fn width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH * scale
}

/// Longest prefix of `text` that fits in `max` pixels at scale 1.
pub fn fit(text: &str, max: u32) -> &str {
    let keep = (max / GLYPH) as usize;
    match text.char_indices().nth(keep) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, c: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, c);
    }
}

/// Set pixels of glyph `ch` through `place(column, row)`. Characters outside
/// basic Latin draw nothing.
fn glyph(ch: char, mut place: impl FnMut(i64, i64)) {
    let Some(rows) = BASIC_FONTS.get(ch) else {
        return;
    };
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..8 {
            if bits & (1 << col) != 0 {
                place(col, row as i64);
            }
        }
    }
}

/// Draw `text` left to right with its top-left corner at `(x, y)`.
pub fn draw(img: &mut RgbImage, x: i64, y: i64, text: &str, scale: u32, c: Rgb<u8>) {
    let s = scale as i64;
    for (i, ch) in text.chars().enumerate() {
        let left = x + i as i64 * GLYPH as i64 * s;
        glyph(ch, |col, row| {
            for dy in 0..s {
                for dx in 0..s {
                    put(img, left + col * s + dx, y + row * s + dy, c);
                }
            }
        });
    }
}

/// Draw `text` reading bottom to top, a quarter turn counter-clockwise.
/// `(x, y)` is the bottom-left corner of the first glyph.
pub fn draw_vertical(img: &mut RgbImage, x: i64, y: i64, text: &str, c: Rgb<u8>) {
    for (i, ch) in text.chars().enumerate() {
        let start = i as i64 * GLYPH as i64;
        glyph(ch, |col, row| put(img, x + row, y - start - col, c));
    }
}
