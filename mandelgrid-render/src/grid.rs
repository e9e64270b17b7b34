use crate::band::RowBand;
use crate::error::RenderError;

/// Per-pixel escape times for the area of a viewport.
///
/// Row-major, `width × height` entries, each in `[0, max_iterations]`.
/// Keeping raw counts separate from colors means a palette change never
/// needs a recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationGrid {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    data: Vec<u32>,
}

/// Summary figures over a finished grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStats {
    /// Sum of all escape times.
    pub total_iterations: u64,
    /// `total_iterations` divided by the pixel count.
    pub mean_iterations: f64,
    /// Pixels that never escaped.
    pub inside_pixels: usize,
}

impl IterationGrid {
    /// Allocate a zeroed grid, reporting exhaustion instead of aborting.
    pub fn allocate(width: u32, height: u32, max_iterations: u32) -> crate::Result<Self> {
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            max_iterations,
            data: try_zeroed(len, width, height)?,
        })
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Escape time at area pixel `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Copy a finished band into its rows.
    pub(crate) fn blit_band(&mut self, band: &RowBand, band_data: &[u32]) {
        let width = self.width as usize;
        let start = band.start as usize * width;
        let len = band.pixel_count(self.width);
        debug_assert_eq!(band_data.len(), len);
        self.data[start..start + len].copy_from_slice(band_data);
    }

    pub fn stats(&self) -> GridStats {
        let total_iterations: u64 = self.data.iter().map(|&n| n as u64).sum();
        let inside_pixels = self
            .data
            .iter()
            .filter(|&&n| n == self.max_iterations)
            .count();
        let mean_iterations = if self.data.is_empty() {
            0.0
        } else {
            total_iterations as f64 / self.data.len() as f64
        };
        GridStats {
            total_iterations,
            mean_iterations,
            inside_pixels,
        }
    }
}

/// `vec![0; len]` that surfaces allocation failure as `OutOfResources`.
pub(crate) fn try_zeroed(len: usize, width: u32, height: u32) -> crate::Result<Vec<u32>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| RenderError::OutOfResources { width, height })?;
    data.resize(len, 0);
    Ok(data)
}
