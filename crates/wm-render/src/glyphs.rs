//! 3×5 bitmap digits for waypoint badges.

use crate::surface::RasterSurface;
use kurbo::{Point, Rect};
use wm_core::Color;

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;

/// One row per byte, the low three bits are the columns (bit 2 = left).
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b010, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

/// Width of `text` in glyph cells, including one blank column between digits.
pub fn text_cells(text: &str) -> u32 {
    let n = text.chars().filter(char::is_ascii_digit).count() as u32;
    if n == 0 { 0 } else { n * (GLYPH_WIDTH + 1) - 1 }
}

/// Draw the digits of `text` centred on `centre`, each glyph cell `cell` pixels square.
/// Non-digit characters are skipped.
pub fn draw_digits(surface: &mut RasterSurface, text: &str, centre: Point, cell: f64, color: Color) {
    let width = text_cells(text) as f64 * cell;
    let height = GLYPH_HEIGHT as f64 * cell;
    let mut x = centre.x - width / 2.0;
    let top = centre.y - height / 2.0;

    for digit in text.chars().filter_map(|c| c.to_digit(10)) {
        for (row, bits) in DIGITS[digit as usize].iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0b100 >> col) != 0 {
                    let x0 = x + col as f64 * cell;
                    let y0 = top + row as f64 * cell;
                    surface.fill_rect(Rect::new(x0, y0, x0 + cell, y0 + cell), color);
                }
            }
        }
        x += (GLYPH_WIDTH + 1) as f64 * cell;
    }
}
