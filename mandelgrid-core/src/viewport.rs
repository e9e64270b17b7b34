use tracing::debug;

use crate::bounds::PlaneBounds;
use crate::complex::Complex;
use crate::error::CoreError;

/// Smallest plane extent (on either axis) a viewport may have.
///
/// Below this, neighbouring pixels stop mapping to distinct `f64` values
/// for typical coordinates and the image degenerates.
pub const MIN_EXTENT: f64 = 1e-12;

/// A window of the complex plane rendered into a pixel canvas.
///
/// The canvas is `full_width × full_height` pixels. The plane window is drawn
/// into the largest sub-rectangle of the canvas (the *area*) whose aspect
/// ratio matches the window, centred inside the canvas. Pixel coordinates
/// passed to [`to_complex`](Self::to_complex) are relative to the area;
/// [`canvas_to_complex`](Self::canvas_to_complex) takes canvas coordinates.
///
/// Viewports are immutable values: zooming or resizing returns a new one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexViewport {
    bounds: PlaneBounds,
    full_width: u32,
    full_height: u32,
    area_width: u32,
    area_height: u32,
    offset_x: u32,
    offset_y: u32,
}

impl ComplexViewport {
    /// Create a viewport for `bounds` on a `full_width × full_height` canvas.
    pub fn new(bounds: PlaneBounds, full_width: u32, full_height: u32) -> crate::Result<Self> {
        check_dimensions(full_width, full_height)?;
        check_bounds(&bounds)?;

        let (area_width, area_height) =
            fit_area(full_width, full_height, bounds.aspect_ratio());

        Ok(Self {
            bounds,
            full_width,
            full_height,
            area_width,
            area_height,
            offset_x: (full_width - area_width).div_ceil(2),
            offset_y: (full_height - area_height).div_ceil(2),
        })
    }

    pub fn bounds(&self) -> PlaneBounds {
        self.bounds
    }

    pub fn full_width(&self) -> u32 {
        self.full_width
    }

    pub fn full_height(&self) -> u32 {
        self.full_height
    }

    pub fn area_width(&self) -> u32 {
        self.area_width
    }

    pub fn area_height(&self) -> u32 {
        self.area_height
    }

    pub fn offset_x(&self) -> u32 {
        self.offset_x
    }

    pub fn offset_y(&self) -> u32 {
        self.offset_y
    }

    /// Number of pixels in the area.
    pub fn area_pixels(&self) -> usize {
        self.area_width as usize * self.area_height as usize
    }

    /// Plane units spanned by one area pixel, `(re, im)`.
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            self.bounds.range_re() / self.area_width as f64,
            self.bounds.range_im() / self.area_height as f64,
        )
    }

    /// Map (fractional) area pixel coordinates to the complex plane.
    ///
    /// `(0, 0)` is the top-left corner of the area and maps to
    /// `(min_re, max_im)`; pixel y grows downward while Im grows upward.
    #[inline]
    pub fn to_complex(&self, px: f64, py: f64) -> Complex {
        let (dre, dim) = self.pixel_size();
        Complex::new(self.bounds.min_re + px * dre, self.bounds.max_im - py * dim)
    }

    /// Integer-pixel form of [`to_complex`](Self::to_complex), used by the engine.
    #[inline]
    pub fn pixel_to_complex(&self, px: u32, py: u32) -> Complex {
        self.to_complex(px as f64, py as f64)
    }

    /// Inverse of [`to_complex`](Self::to_complex), in fractional area pixels.
    ///
    /// Points outside the window map outside `[0, area_width) × [0, area_height)`.
    #[inline]
    pub fn to_pixel(&self, c: Complex) -> (f64, f64) {
        let (dre, dim) = self.pixel_size();
        ((c.re - self.bounds.min_re) / dre, (self.bounds.max_im - c.im) / dim)
    }

    /// Map a canvas pixel to the plane, or `None` if it falls in the letterbox.
    pub fn canvas_to_complex(&self, x: u32, y: u32) -> Option<Complex> {
        let px = x.checked_sub(self.offset_x)?;
        let py = y.checked_sub(self.offset_y)?;
        if px >= self.area_width || py >= self.area_height {
            return None;
        }
        Some(self.pixel_to_complex(px, py))
    }

    /// [`to_pixel`](Self::to_pixel) shifted into canvas coordinates.
    pub fn to_canvas_pixel(&self, c: Complex) -> (f64, f64) {
        let (px, py) = self.to_pixel(c);
        (px + self.offset_x as f64, py + self.offset_y as f64)
    }

    /// Scale the plane window by `1 / factor` around `center`.
    ///
    /// `factor > 1` zooms in, `0 < factor < 1` zooms out. The canvas size is
    /// unchanged. Fails with [`CoreError::ViewportTooSmall`] when the new
    /// window would be narrower than [`MIN_EXTENT`]; `self` stays usable.
    pub fn zoom(&self, center: Complex, factor: f64) -> crate::Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(CoreError::InvalidZoomFactor(factor));
        }
        let bounds = PlaneBounds::centered(
            center,
            self.bounds.range_re() / factor,
            self.bounds.range_im() / factor,
        );
        let extent = bounds.range_re().min(bounds.range_im());
        if extent < MIN_EXTENT {
            debug!(extent, factor, "Rejecting zoom below precision limit");
            return Err(CoreError::ViewportTooSmall {
                extent,
                min: MIN_EXTENT,
            });
        }
        Self::new(bounds, self.full_width, self.full_height)
    }

    /// Same plane window on a new canvas; the area is letterboxed again.
    pub fn resize_keeping_bounds(&self, new_width: u32, new_height: u32) -> crate::Result<Self> {
        Self::new(self.bounds, new_width, new_height)
    }

    /// Widen the shorter axis of the window, keeping its centre, so the area
    /// fills the whole new canvas.
    pub fn resize_extending_bounds(&self, new_width: u32, new_height: u32) -> crate::Result<Self> {
        check_dimensions(new_width, new_height)?;
        let canvas_aspect = new_width as f64 / new_height as f64;
        let (mut range_re, mut range_im) = (self.bounds.range_re(), self.bounds.range_im());
        if canvas_aspect > range_re / range_im {
            range_re = range_im * canvas_aspect;
        } else {
            range_im = range_re / canvas_aspect;
        }
        let bounds = PlaneBounds::centered(self.bounds.center(), range_re, range_im);
        Self::new(bounds, new_width, new_height)
    }

    /// Stretch the window so that one pixel of the previous area covers the
    /// same plane distance on the new canvas.
    ///
    /// The top-left corner `(min_re, max_im)` stays fixed; the right and
    /// bottom edges move with the canvas size. Used when a canvas is resized
    /// without an aspect-ratio lock.
    pub fn fit_to_new_pixel_size(&self, new_width: u32, new_height: u32) -> crate::Result<Self> {
        check_dimensions(new_width, new_height)?;
        let width_factor = new_width as f64 / self.area_width as f64;
        let height_factor = new_height as f64 / self.area_height as f64;
        let b = self.bounds;
        let bounds = PlaneBounds::new(
            b.min_re,
            b.max_im - b.range_im() * height_factor,
            b.min_re + b.range_re() * width_factor,
            b.max_im,
        );
        Self::new(bounds, new_width, new_height)
    }
}

fn check_dimensions(width: u32, height: u32) -> crate::Result<()> {
    if width == 0 || height == 0 {
        return Err(CoreError::InvalidViewport {
            reason: format!("canvas must be at least 1×1, got {width}×{height}"),
        });
    }
    Ok(())
}

fn check_bounds(b: &PlaneBounds) -> crate::Result<()> {
    let all_finite = [b.min_re, b.min_im, b.max_re, b.max_im]
        .iter()
        .all(|v| v.is_finite());
    if !all_finite {
        return Err(CoreError::InvalidViewport {
            reason: format!("bounds must be finite, got {b:?}"),
        });
    }
    if b.max_re <= b.min_re || b.max_im <= b.min_im {
        return Err(CoreError::InvalidViewport {
            reason: format!(
                "max must exceed min on both axes, got re {}..{} and im {}..{}",
                b.min_re, b.max_re, b.min_im, b.max_im
            ),
        });
    }
    let extent = b.range_re().min(b.range_im());
    if extent < MIN_EXTENT || !b.range_re().is_finite() || !b.range_im().is_finite() {
        return Err(CoreError::InvalidViewport {
            reason: format!("extent {extent:e} outside [{MIN_EXTENT:e}, inf)"),
        });
    }
    Ok(())
}

/// Largest `w × h` inside the canvas with aspect ratio `aspect`.
///
/// Fits to the full height first and falls back to the full width if that
/// overflows. Both dimensions round up, then clamp to the canvas.
fn fit_area(full_width: u32, full_height: u32, aspect: f64) -> (u32, u32) {
    let mut w = (full_height as f64 * aspect).ceil();
    let mut h = full_height as f64;
    if w > full_width as f64 {
        w = full_width as f64;
        h = (full_width as f64 / aspect).ceil();
    }
    ((w as u32).clamp(1, full_width), (h as u32).clamp(1, full_height))
}
