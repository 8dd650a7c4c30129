use ndarray::ArrayView3;

use crate::common::errors::Result;

pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];
pub const WHITE: Rgb = [255, 255, 255];
pub const RED: Rgb = [255, 0, 0];
pub const ORANGE: Rgb = [255, 165, 0];
pub const YELLOW: Rgb = [255, 255, 0];
pub const GREEN: Rgb = [0, 255, 0];
pub const BLUE: Rgb = [0, 0, 255];
pub const PURPLE: Rgb = [128, 0, 128];
pub const MAGENTA: Rgb = [255, 0, 255];
pub const CYAN: Rgb = [0, 255, 255];

// 3x5 glyphs, '#' marks a lit pixel
const DIGITS: [[&str; 5]; 10] = [
    ["###", "#.#", "#.#", "#.#", "###"],
    [".#.", "##.", ".#.", ".#.", "###"],
    ["###", "..#", "###", "#..", "###"],
    ["###", "..#", "###", "..#", "###"],
    ["#.#", "#.#", "###", "..#", "..#"],
    ["###", "#..", "###", "..#", "###"],
    ["###", "#..", "###", "#.#", "###"],
    ["###", "..#", "..#", "..#", "..#"],
    ["###", "#.#", "###", "#.#", "###"],
    ["###", "#.#", "###", "..#", "###"],
];

/// A 210x160 RGB raster, stored row major as `height * width * 3` bytes.
///
/// All drawing is clipped to the screen, so callers may pass positions that
/// are partly or fully off screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    data: Vec<u8>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    pub const HEIGHT: usize = 210;
    pub const WIDTH: usize = 160;
    pub const CHANNELS: usize = 3;
    pub const LEN: usize = Self::HEIGHT * Self::WIDTH * Self::CHANNELS;

    pub fn new() -> Self {
        Self {
            data: vec![0; Self::LEN],
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(width).min(Self::WIDTH as i32);
        let y1 = y.saturating_add(height).min(Self::HEIGHT as i32);

        for py in y0..y1 {
            for px in x0..x1 {
                let idx = (py as usize * Self::WIDTH + px as usize) * Self::CHANNELS;
                self.data[idx..idx + Self::CHANNELS].copy_from_slice(&color);
            }
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        self.fill_rect(x, y, 1, 1, color);
    }

    /// Draws a bitmap given as rows of `#` (lit) and any other char (skipped).
    pub fn draw_sprite(&mut self, x: i32, y: i32, rows: &[&str], color: Rgb) {
        for (dy, row) in rows.iter().enumerate() {
            for (dx, c) in row.chars().enumerate() {
                if c == '#' {
                    self.set_pixel(x + dx as i32, y + dy as i32, color);
                }
            }
        }
    }

    /// Draws a single decimal digit with the 3x5 font. Values above 9 are
    /// ignored.
    pub fn draw_digit(&mut self, digit: u32, x: i32, y: i32, color: Rgb) {
        if let Some(glyph) = DIGITS.get(digit as usize) {
            self.draw_sprite(x, y, glyph, color);
        }
    }

    /// Draws `value` in decimal, one glyph every `spacing` pixels.
    pub fn draw_number(&mut self, value: usize, x: i32, y: i32, spacing: i32, color: Rgb) {
        let text = value.to_string();
        for (i, c) in text.chars().enumerate() {
            if let Some(d) = c.to_digit(10) {
                self.draw_digit(d, x + i as i32 * spacing, y, color);
            }
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= Self::WIDTH || y >= Self::HEIGHT {
            return None;
        }

        let idx = (y * Self::WIDTH + x) * Self::CHANNELS;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Number of pixels currently showing exactly `color`.
    pub fn count_color(&self, color: Rgb) -> usize {
        self.data
            .chunks_exact(Self::CHANNELS)
            .filter(|px| *px == color)
            .count()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// `(height, width, channel)` view over the raster.
    pub fn view(&self) -> Result<ArrayView3<'_, u8>> {
        Ok(ArrayView3::from_shape(
            (Self::HEIGHT, Self::WIDTH, Self::CHANNELS),
            &self.data,
        )?)
    }
}
