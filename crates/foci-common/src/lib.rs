//! Common types shared across the FOCI animation crates.

pub mod bbox;
pub mod error;
pub mod field;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{FociError, FociResult};
pub use field::FieldCube;
pub use grid::CurvilinearGrid;
pub use time::{TimeAxis, TimeUnit};
