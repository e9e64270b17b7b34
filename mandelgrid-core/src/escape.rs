use crate::complex::Complex;

/// Bailout radius of the set itself.
pub const ESCAPE_RADIUS: f64 = 2.0;

const ESCAPE_RADIUS_SQ: f64 = ESCAPE_RADIUS * ESCAPE_RADIUS;

/// Escape time of `c` under `z ← z² + c`, starting from `z = 0`.
///
/// Returns the 0-based index `n` of the first iterate with `|z|² > 4`, or
/// `max_iterations` if none of the first `max_iterations` iterates escape.
/// The result is therefore always in `[0, max_iterations]`, and a result
/// equal to `max_iterations` means "inside".
#[inline]
pub fn iterate(c: Complex, max_iterations: u32) -> u32 {
    let mut z = Complex::ZERO;
    for n in 0..max_iterations {
        z = z.square_add(c);
        if z.norm_sq() > ESCAPE_RADIUS_SQ {
            return n;
        }
    }
    max_iterations
}

/// Membership read-out for a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointInfo {
    /// Raw result of [`iterate`].
    pub iterations: u32,
    pub max_iterations: u32,
}

impl PointInfo {
    /// Whether the point survived every iteration.
    pub fn is_inside(&self) -> bool {
        self.iterations == self.max_iterations
    }
}

impl std::fmt::Display for PointInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let relation = if self.is_inside() { "∈" } else { "∉" };
        write!(
            f,
            "c {relation} M ({}/{})",
            self.iterations, self.max_iterations
        )
    }
}

/// Classify `c` against the set at the given iteration depth.
pub fn classify(c: Complex, max_iterations: u32) -> PointInfo {
    PointInfo {
        iterations: iterate(c, max_iterations),
        max_iterations,
    }
}
