//! Variable listing for the `info` command.

use std::path::Path;

use serde::Serialize;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{get_string_attr, silence_hdf5_errors};

/// Summary of one variable in a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableInfo {
    pub name: String,
    /// `(dimension name, length)` in storage order
    pub dimensions: Vec<(String, usize)>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

impl VariableInfo {
    /// True for `(time, y, x)` variables that can be animated.
    pub fn is_animatable(&self) -> bool {
        self.dimensions.len() == 3
    }
}

/// List every variable of a NetCDF file, sorted by name.
pub fn list_variables(path: &Path) -> NetCdfResult<Vec<VariableInfo>> {
    silence_hdf5_errors();

    let file = netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let mut infos: Vec<VariableInfo> = file
        .variables()
        .map(|var| VariableInfo {
            name: var.name(),
            dimensions: var
                .dimensions()
                .iter()
                .map(|d| (d.name(), d.len()))
                .collect(),
            units: get_string_attr(&var, "units"),
            long_name: get_string_attr(&var, "long_name"),
        })
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(infos)
}
