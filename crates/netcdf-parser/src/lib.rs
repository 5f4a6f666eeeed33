//! NetCDF loading for FOCI ocean-model output.
//!
//! This crate reads NEMO/FOCI style files: a `(time_counter, y, x)` variable
//! such as `sosstsst` or `iicethic`, plus the 2-D `nav_lat`/`nav_lon` mesh.
//! One or many files are combined into a single [`Dataset`].
//!
//! # Implementation Notes
//!
//! Reading goes through the `netcdf` crate, which wraps libnetcdf/HDF5.
//! HDF5 error printing is silenced on first use, see
//! [`native::silence_hdf5_errors`].

pub mod dataset;
pub mod error;
pub mod metadata;
pub mod native;

pub use dataset::{open_dataset, open_from_folder, resolve_paths, Dataset, LoadOptions};
pub use error::{NetCdfError, NetCdfResult};
pub use metadata::{list_variables, VariableInfo};
pub use native::silence_hdf5_errors;
