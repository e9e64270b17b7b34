use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::grid::IterationGrid;

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// An opaque 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a packed `0xRRGGBB` value; higher bits are ignored.
    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub const fn to_hex(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    fn lerp(a: Self, b: Self, t: f64) -> Self {
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
        Self::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
    }
}

impl FromStr for Rgb {
    type Err = RenderError;

    /// Accepts `#rrggbb`, `0xrrggbb`, or bare `rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .unwrap_or(trimmed);
        if digits.len() != 6 {
            return Err(RenderError::InvalidColor(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self::from_hex)
            .map_err(|_| RenderError::InvalidColor(s.to_string()))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Lookup table from escape time to color.
///
/// Entry `n` for `n < max_iterations` comes from the gradient; entry
/// `max_iterations` is always the inside color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    inside: Rgb,
    gradient: Vec<Rgb>,
    table: Vec<Rgb>,
}

impl ColorPalette {
    /// Derive the table for `max_iterations` from an inside color and the
    /// gradient stops as authored.
    ///
    /// The first authored stop colors the points that survive longest before
    /// escaping (`n = max_iterations - 1`); the last authored stop colors the
    /// points that escape immediately (`n = 0`).
    pub fn build(inside: Rgb, gradient: &[Rgb], max_iterations: u32) -> crate::Result<Self> {
        if gradient.is_empty() {
            return Err(RenderError::EmptyGradient);
        }
        let steps = max_iterations as usize;
        let mut table = Vec::new();
        table
            .try_reserve_exact(steps + 1)
            .map_err(|_| RenderError::OutOfResources {
                width: max_iterations,
                height: 1,
            })?;

        if let [only] = gradient {
            table.resize(steps, *only);
        } else {
            let stops: Vec<Rgb> = gradient.iter().rev().copied().collect();
            table.extend((0..steps).map(|i| sample(&stops, i, steps)));
        }
        table.push(inside);

        Ok(Self {
            inside,
            gradient: gradient.to_vec(),
            table,
        })
    }

    /// Color for an escape time. Counts beyond the table are inside.
    #[inline]
    pub fn color_for(&self, iterations: u32) -> Rgb {
        self.table
            .get(iterations as usize)
            .copied()
            .unwrap_or(self.inside)
    }

    pub fn inside_color(&self) -> Rgb {
        self.inside
    }

    pub fn gradient(&self) -> &[Rgb] {
        &self.gradient
    }

    pub fn table(&self) -> &[Rgb] {
        &self.table
    }

    pub fn max_iterations(&self) -> u32 {
        (self.table.len() - 1) as u32
    }

    /// Color a whole grid into an RGBA buffer of the same size.
    pub fn colorize(&self, grid: &IterationGrid) -> RenderBuffer {
        let mut pixels = vec![0u8; grid.data().len() * 4];
        pixels
            .par_chunks_mut(4)
            .zip(grid.data().par_iter())
            .for_each(|(pixel, &n)| pixel.copy_from_slice(&self.color_for(n).to_rgba()));
        RenderBuffer {
            width: grid.width,
            height: grid.height,
            pixels,
        }
    }
}

/// Piecewise-linear sample of evenly spaced stops at position `i / steps`.
///
/// Stop `k` sits at `k / len`; past the last stop the color is held.
fn sample(stops: &[Rgb], i: usize, steps: usize) -> Rgb {
    let scaled = (i * stops.len()) as f64 / steps as f64;
    let k = scaled.floor() as usize;
    if k + 1 >= stops.len() {
        return stops[stops.len() - 1];
    }
    Rgb::lerp(stops[k], stops[k + 1], scaled - k as f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
