//! Animation errors.

use thiserror::Error;

pub type AnimationResult<T> = Result<T, AnimationError>;

#[derive(Error, Debug)]
pub enum AnimationError {
    #[error(transparent)]
    NetCdf(#[from] netcdf_parser::NetCdfError),

    #[error(transparent)]
    Render(#[from] renderer::RenderError),

    #[error(transparent)]
    Projection(#[from] projection::ProjectionError),

    #[error(transparent)]
    Field(#[from] foci_common::FociError),

    #[error("No frames to render")]
    NoFrames,

    #[error("Frame {index} is out of range (animation has {len} frames)")]
    FrameOutOfRange { index: usize, len: usize },

    #[error("Variable '{0}' has no valid values")]
    EmptyField(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Encoder failed: {0}")]
    Encoder(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
