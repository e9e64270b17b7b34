use serde::{Deserialize, Serialize};

use crate::complex::Complex;

/// An axis-aligned window of the complex plane.
///
/// This is plain data; [`ComplexViewport::new`](crate::ComplexViewport::new)
/// is where a window gets validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneBounds {
    /// Left edge.
    pub min_re: f64,
    /// Bottom edge.
    pub min_im: f64,
    /// Right edge.
    pub max_re: f64,
    /// Top edge.
    pub max_im: f64,
}

impl PlaneBounds {
    /// The whole set, `[-1.5, 1.5] × [-1.5, 1.5]`.
    pub const DEFAULT: Self = Self::new(-1.5, -1.5, 1.5, 1.5);

    /// Seahorse valley between the main cardioid and the period-2 bulb.
    pub const SEAHORSES: Self = Self::new(
        -0.766_874_999_999_999_9,
        0.039_687_500_000_000_195,
        -0.735_624_999_999_999_9,
        0.070_937_500_000_000_2,
    );

    /// Elephant valley near the cusp of the main cardioid.
    pub const ELEPHANTS: Self = Self::new(
        0.251_105_957_031_249_94,
        -1.318_359_374_999_915_5e-4,
        0.251_350_097_656_249_94,
        1.123_046_875_000_084_5e-4,
    );

    pub const fn new(min_re: f64, min_im: f64, max_re: f64, max_im: f64) -> Self {
        Self {
            min_re,
            min_im,
            max_re,
            max_im,
        }
    }

    /// A window of imaginary height 3 centred on the origin, widened so its
    /// aspect ratio matches a `width × height` canvas.
    pub fn reset_for_canvas(width: u32, height: u32) -> Self {
        let range_im = 3.0;
        let range_re = if height == 0 {
            range_im
        } else {
            width as f64 / height as f64 * range_im
        };
        Self::new(-range_re / 2.0, -range_im / 2.0, range_re / 2.0, range_im / 2.0)
    }

    /// Build the window of the given extents around `center`.
    pub fn centered(center: Complex, range_re: f64, range_im: f64) -> Self {
        Self::new(
            center.re - range_re / 2.0,
            center.im - range_im / 2.0,
            center.re + range_re / 2.0,
            center.im + range_im / 2.0,
        )
    }

    #[inline]
    pub fn range_re(&self) -> f64 {
        self.max_re - self.min_re
    }

    #[inline]
    pub fn range_im(&self) -> f64 {
        self.max_im - self.min_im
    }

    pub fn center(&self) -> Complex {
        Complex::new(
            (self.min_re + self.max_re) / 2.0,
            (self.min_im + self.max_im) / 2.0,
        )
    }

    /// Width over height of the window in plane units.
    pub fn aspect_ratio(&self) -> f64 {
        self.range_re() / self.range_im()
    }

    pub fn contains(&self, c: Complex) -> bool {
        (self.min_re..=self.max_re).contains(&c.re) && (self.min_im..=self.max_im).contains(&c.im)
    }
}

impl Default for PlaneBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn default_window_is_square_around_origin() {
        let b = PlaneBounds::default();
        assert_eq!(b.range_re(), 3.0);
        assert_eq!(b.range_im(), 3.0);
        assert_eq!(b.center(), Complex::ZERO);
    }

    #[test]
    fn reset_matches_canvas_aspect() {
        let b = PlaneBounds::reset_for_canvas(800, 400);
        assert!((b.range_im() - 3.0).abs() < EPSILON);
        assert!((b.range_re() - 6.0).abs() < EPSILON);
        assert!((b.aspect_ratio() - 2.0).abs() < EPSILON);
        assert!(b.center().re.abs() < EPSILON);
    }

    #[test]
    fn centered_round_trips_center_and_extent() {
        let b = PlaneBounds::centered(Complex::new(-0.5, 0.25), 2.0, 1.0);
        assert!((b.center().re + 0.5).abs() < EPSILON);
        assert!((b.center().im - 0.25).abs() < EPSILON);
        assert!((b.range_re() - 2.0).abs() < EPSILON);
        assert!((b.range_im() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn presets_are_well_formed() {
        for b in [PlaneBounds::DEFAULT, PlaneBounds::SEAHORSES, PlaneBounds::ELEPHANTS] {
            assert!(b.max_re > b.min_re);
            assert!(b.max_im > b.min_im);
        }
    }

    #[test]
    fn contains_is_inclusive() {
        let b = PlaneBounds::DEFAULT;
        assert!(b.contains(Complex::new(-1.5, 1.5)));
        assert!(!b.contains(Complex::new(1.6, 0.0)));
    }
}
