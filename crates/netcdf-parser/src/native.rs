//! Reading a single NetCDF file with the native netcdf library.

use std::path::Path;
use std::sync::Once;

use foci_common::{CurvilinearGrid, FieldCube, TimeAxis};
use tracing::{debug, warn};

use crate::dataset::LoadOptions;
use crate::error::{NetCdfError, NetCdfResult};

/// Coordinate names tried when the caller does not pin one down.
const LAT_CANDIDATES: &[&str] = &["nav_lat", "lat", "latitude"];
const LON_CANDIDATES: &[&str] = &["nav_lon", "lon", "longitude"];
const TIME_CANDIDATES: &[&str] = &["time_counter", "time"];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This function disables that output by calling
/// H5Eset_auto2 with null handlers. It only needs to be called once per
/// process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Everything read from one file, before files are combined.
#[derive(Debug)]
pub(crate) struct FilePart {
    pub field: FieldCube,
    pub grid: CurvilinearGrid,
    pub time: TimeAxis,
}

/// Open `path` and read `var_name`, its grid and its time axis.
pub(crate) fn read_file(path: &Path, var_name: &str, options: &LoadOptions) -> NetCdfResult<FilePart> {
    silence_hdf5_errors();

    let file = netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let var = file
        .variable(var_name)
        .ok_or_else(|| NetCdfError::MissingData(format!("variable '{}' in {}", var_name, path.display())))?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let (nt, rows, cols) = match shape.as_slice() {
        [nt, rows, cols] => (*nt, *rows, *cols),
        other => {
            return Err(NetCdfError::InvalidFormat(format!(
                "variable '{}' has {} dimensions, expected (time, y, x)",
                var_name,
                other.len()
            )))
        }
    };

    let mut values = read_f32_values(&var)?;

    // Fill values are masked before unpacking, since they are stored packed
    let fill_values: Vec<f32> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| get_f32_attr(&var, name))
        .collect();
    let scale_factor = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);

    for v in values.iter_mut() {
        if fill_values.iter().any(|fill| *v == *fill) {
            *v = f32::NAN;
        } else if scale_factor != 1.0 || add_offset != 0.0 {
            *v = *v * scale_factor + add_offset;
        }
    }

    let field = FieldCube::new(var_name, nt, rows, cols, values)?
        .with_units(get_string_attr(&var, "units"))
        .with_long_name(get_string_attr(&var, "long_name"));

    let grid = read_grid(&file, rows, cols, options)?;
    let time = read_time(&file, nt, options)?;

    debug!(
        path = %path.display(),
        var = var_name,
        nt,
        rows,
        cols,
        "Read NetCDF variable"
    );

    Ok(FilePart { field, grid, time })
}

/// Read the latitude/longitude mesh matching a `(rows, cols)` field.
fn read_grid(
    file: &netcdf::File,
    rows: usize,
    cols: usize,
    options: &LoadOptions,
) -> NetCdfResult<CurvilinearGrid> {
    let lat_var = find_variable(file, options.lat_name.as_deref(), LAT_CANDIDATES)
        .ok_or_else(|| NetCdfError::MissingData("latitude coordinate (nav_lat/lat)".to_string()))?;
    let lon_var = find_variable(file, options.lon_name.as_deref(), LON_CANDIDATES)
        .ok_or_else(|| NetCdfError::MissingData("longitude coordinate (nav_lon/lon)".to_string()))?;

    let lat = read_coordinate(&lat_var)?;
    let lon = read_coordinate(&lon_var)?;

    let grid = match (lat_var.dimensions().len(), lon_var.dimensions().len()) {
        (2, 2) => CurvilinearGrid::new(rows, cols, lat, lon)?,
        (1, 1) if lat.len() == rows && lon.len() == cols => CurvilinearGrid::from_axes(&lat, &lon)?,
        (la, lo) => {
            return Err(NetCdfError::InvalidFormat(format!(
                "coordinates are {}-D (lat, {} values) and {}-D (lon, {} values), field grid is {}x{}",
                la,
                lat.len(),
                lo,
                lon.len(),
                rows,
                cols
            )))
        }
    };
    Ok(grid)
}

/// Read the time coordinate, falling back to a plain index axis.
fn read_time(file: &netcdf::File, nt: usize, options: &LoadOptions) -> NetCdfResult<TimeAxis> {
    let Some(time_var) = find_variable(file, options.time_name.as_deref(), TIME_CANDIDATES) else {
        warn!(steps = nt, "No time coordinate found, using time step indices");
        return Ok(TimeAxis::index(nt));
    };

    let values = read_f64_values(&time_var)?;
    if values.len() != nt {
        return Err(NetCdfError::InvalidFormat(format!(
            "time coordinate has {} values but the field has {} time steps",
            values.len(),
            nt
        )));
    }

    Ok(TimeAxis::new(
        values,
        get_string_attr(&time_var, "units"),
        get_string_attr(&time_var, "calendar"),
    ))
}

/// Look up an explicitly requested variable, or the first candidate present.
pub(crate) fn find_variable<'f>(
    file: &'f netcdf::File,
    requested: Option<&str>,
    candidates: &[&str],
) -> Option<netcdf::Variable<'f>> {
    match requested {
        Some(name) => file.variable(name),
        None => candidates.iter().find_map(|name| file.variable(name)),
    }
}

// =============================================================================
// Value helpers
// =============================================================================

/// Read a whole variable as `f32`, whatever its storage type.
///
/// Model output stores fields as float but packed files use short ints, so
/// the common storage types are tried in turn.
fn read_f32_values(var: &netcdf::Variable) -> NetCdfResult<Vec<f32>> {
    if let Ok(values) = var.get_values::<f32, _>(..) {
        return Ok(values);
    }
    if let Ok(values) = var.get_values::<f64, _>(..) {
        return Ok(values.into_iter().map(|v| v as f32).collect());
    }
    if let Ok(values) = var.get_values::<i16, _>(..) {
        return Ok(values.into_iter().map(f32::from).collect());
    }
    var.get_values::<i32, _>(..)
        .map(|values| values.into_iter().map(|v| v as f32).collect())
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read '{}': {}", var.name(), e)))
}

/// Read a whole coordinate variable as `f64`.
fn read_f64_values(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    if let Ok(values) = var.get_values::<f64, _>(..) {
        return Ok(values);
    }
    if let Ok(values) = var.get_values::<f32, _>(..) {
        return Ok(values.into_iter().map(f64::from).collect());
    }
    var.get_values::<i32, _>(..)
        .map(|values| values.into_iter().map(f64::from).collect())
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read '{}': {}", var.name(), e)))
}

/// Read a coordinate variable with its fill cells set to NaN.
///
/// NEMO writes a fill value into `nav_lat`/`nav_lon` over land blocks that
/// were removed from the domain decomposition.
fn read_coordinate(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    let mut values = read_f64_values(var)?;
    let fill_values: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| get_f64_attr(var, name))
        .collect();
    let mut masked = 0;
    for v in values.iter_mut() {
        if fill_values.contains(v) || !v.is_finite() {
            *v = f64::NAN;
            masked += 1;
        }
    }
    if masked > 0 {
        debug!(var = %var.name(), masked, "Masked coordinate fill values");
    }
    Ok(values)
}

// =============================================================================
// Attribute helpers
// =============================================================================

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f32 attribute.
fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

/// Helper to get f64 attribute.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get a text attribute.
pub(crate) fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
