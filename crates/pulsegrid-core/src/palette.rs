//! Display colors and the rotating palette assignment.

use serde::{Deserialize, Serialize};

/// An RGBA color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
    /// Alpha component
    pub a: f32,
}

impl Rgba {
    /// Opaque color from RGB components.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Opaque color from hue [0, 360), saturation [0, 1] and value [0, 1].
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let h = h.rem_euclid(360.0) / 60.0;
        let i = h.floor();
        let f = h - i;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match i as u32 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::new(r, g, b)
    }
}

/// Evenly spaced hue wheel with one entry per column.
pub fn default_palette(len: usize) -> Vec<Rgba> {
    let len = len.max(1);
    (0..len)
        .map(|i| Rgba::from_hsv(i as f32 / len as f32 * 360.0, 0.85, 1.0))
        .collect()
}

/// Rotates palette indices across columns over time.
///
/// Purely cosmetic: the assignment is independent of intensity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorCycler {
    offset: f32,
}

impl ColorCycler {
    /// Advance the rotation by `speed * dt` palette positions.
    ///
    /// The offset wraps at `palette_len` so `floor` stays exact over long
    /// sessions.
    pub fn advance(&mut self, speed: f32, dt: f32, palette_len: usize) {
        self.offset += speed * dt;
        let len = palette_len.max(1) as f32;
        if self.offset >= len || self.offset < 0.0 {
            self.offset = self.offset.rem_euclid(len);
        }
    }

    /// Palette index currently assigned to `column`.
    pub fn palette_index(&self, column: usize, palette_len: usize) -> usize {
        let len = palette_len.max(1);
        (column + self.offset.floor() as usize) % len
    }
}
