use thiserror::Error;

/// Errors originating from palette construction and grid evaluation.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("color gradient must contain at least one color")]
    EmptyGradient,

    #[error("not enough memory for a {width}×{height} iteration grid")]
    OutOfResources { width: u32, height: u32 },

    #[error("invalid color {0:?} (expected #rrggbb)")]
    InvalidColor(String),

    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] mandelgrid_core::CoreError),
}
