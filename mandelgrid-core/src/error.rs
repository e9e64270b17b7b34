use thiserror::Error;

/// Errors raised while constructing or transforming plane windows.
///
/// All of them are raised before any object exists, so a failed call never
/// leaves a half-built viewport behind.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },

    #[error("viewport too small: extent {extent:e} is below the precision limit {min:e}")]
    ViewportTooSmall { extent: f64, min: f64 },

    #[error("invalid zoom factor: {0} (must be positive and finite)")]
    InvalidZoomFactor(f64),
}
