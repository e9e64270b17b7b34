use std::path::PathBuf;

use thiserror::Error;

use mandelgrid_core::CoreError;
use mandelgrid_render::RenderError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid project file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{} already exists (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{0} did not complete")]
    Incomplete(&'static str),
}

pub type Result<T> = std::result::Result<T, CliError>;
