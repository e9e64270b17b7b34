use crate::complex::Complex;
use crate::viewport::ComplexViewport;

/// Bailout radius for drawn orbits.
///
/// Larger than [`ESCAPE_RADIUS`](crate::ESCAPE_RADIUS) so a plotted path can
/// leave the set's disc before the trace is cut off.
pub const ORBIT_BOUND: f64 = 16.0;

/// Iterator over the orbit `z₀ = 0, z₁, …, z_max` of a single point.
///
/// Always yields exactly `max_iterations + 1` points. Once an iterate leaves
/// the [`ORBIT_BOUND`] disc, that iterate is repeated for every remaining
/// sample.
#[derive(Debug, Clone)]
pub struct Orbit {
    c: Complex,
    z: Complex,
    remaining: u32,
    started: bool,
    escaped: bool,
}

impl Orbit {
    pub fn new(c: Complex, max_iterations: u32) -> Self {
        Self {
            c,
            z: Complex::ZERO,
            remaining: max_iterations,
            started: false,
            escaped: false,
        }
    }
}

impl Iterator for Orbit {
    type Item = Complex;

    fn next(&mut self) -> Option<Complex> {
        if !self.started {
            self.started = true;
            return Some(self.z);
        }
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if !self.escaped {
            self.z = self.z.square_add(self.c);
            self.escaped = self.z.norm_sq() > ORBIT_BOUND * ORBIT_BOUND;
        }
        Some(self.z)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize + usize::from(!self.started);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Orbit {}

/// Collect the full orbit of `c`.
pub fn trace(c: Complex, max_iterations: u32) -> Vec<Complex> {
    Orbit::new(c, max_iterations).collect()
}

/// Project orbit points into canvas pixel coordinates of `viewport`.
///
/// Points outside the window are kept; they land outside the area.
pub fn project(points: &[Complex], viewport: &ComplexViewport) -> Vec<(f64, f64)> {
    points.iter().map(|&z| viewport.to_canvas_pixel(z)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlaneBounds;

    #[test]
    fn length_is_fixed_by_depth() {
        for n in [0, 1, 5, 100] {
            assert_eq!(trace(Complex::new(0.1, 0.2), n).len(), n as usize + 1);
            assert_eq!(trace(Complex::new(10.0, 10.0), n).len(), n as usize + 1);
        }
    }

    #[test]
    fn starts_at_origin() {
        let orbit = trace(Complex::new(-0.5, 0.5), 3);
        assert_eq!(orbit[0], Complex::ZERO);
        assert_eq!(orbit[1], Complex::new(-0.5, 0.5));
    }

    #[test]
    fn escaped_orbit_has_constant_tail() {
        let orbit = trace(Complex::new(3.0, 0.0), 20);
        // 0 → 3 → 12 → 147 (escapes the radius-16 disc at z3).
        assert_eq!(orbit[1], Complex::new(3.0, 0.0));
        assert_eq!(orbit[2], Complex::new(12.0, 0.0));
        assert_eq!(orbit[3], Complex::new(147.0, 0.0));
        assert!(orbit[3..].iter().all(|&z| z == orbit[3]));
    }

    #[test]
    fn orbit_bound_exceeds_escape_radius() {
        // c = 1 escapes the set's radius at z3 = 5 but keeps going here.
        let orbit = trace(Complex::new(1.0, 0.0), 4);
        assert_eq!(orbit[3], Complex::new(5.0, 0.0));
        assert_eq!(orbit[4], Complex::new(26.0, 0.0));
    }

    #[test]
    fn exact_size_hint() {
        let mut it = Orbit::new(Complex::ZERO, 3);
        assert_eq!(it.len(), 4);
        it.next();
        assert_eq!(it.len(), 3);
    }

    #[test]
    fn projection_uses_canvas_offset() {
        let vp = ComplexViewport::new(PlaneBounds::DEFAULT, 400, 300).unwrap();
        let pts = project(&[Complex::new(-1.5, 1.5)], &vp);
        assert!((pts[0].0 - vp.offset_x() as f64).abs() < 1e-9);
        assert!(pts[0].1.abs() < 1e-9);
    }
}
