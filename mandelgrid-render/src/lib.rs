pub mod band;
pub mod buffer;
pub mod engine;
pub mod error;
pub mod grid;
pub mod job;
pub mod orbit;
pub mod palette;

pub use band::{partition_rows, RowBand};
pub use buffer::RenderBuffer;
pub use engine::{
    default_worker_count, evaluate, evaluate_grid, RenderCancel, RenderResult, Workspace,
};
pub use error::RenderError;
pub use grid::{GridStats, IterationGrid};
pub use job::{JobObserver, JobState, RenderConfig, RenderJob};
pub use orbit::OrbitTracer;
pub use palette::{ColorPalette, Rgb};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
