//! Rendering errors.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unknown colormap '{0}'")]
    UnknownColormap(String),

    #[error("Invalid contour levels: {0}")]
    InvalidLevels(String),

    #[error("Invalid image size {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    #[error("Data does not match the plot grid: {0}")]
    DataMismatch(String),

    #[error("Cannot plot this grid: {0}")]
    UnsupportedGrid(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Projection(#[from] projection::ProjectionError),

    #[error(transparent)]
    Field(#[from] foci_common::FociError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
