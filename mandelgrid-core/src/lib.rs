pub mod bounds;
pub mod complex;
pub mod error;
pub mod escape;
pub mod orbit;
pub mod viewport;

// Re-export primary types for convenience.
pub use bounds::PlaneBounds;
pub use complex::Complex;
pub use error::CoreError;
pub use escape::{classify, iterate, PointInfo, ESCAPE_RADIUS};
pub use orbit::{Orbit, ORBIT_BOUND};
pub use viewport::{ComplexViewport, MIN_EXTENT};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
