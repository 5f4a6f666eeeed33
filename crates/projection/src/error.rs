//! Projection errors.

use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Unknown projection '{0}' (expected PlateCarree, Robinson, Mercator, LambertConformal, AlbersEqualArea, Orthographic, NorthPolarStereo or SouthPolarStereo)")]
    UnknownProjection(String),

    #[error("Invalid projection parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}
