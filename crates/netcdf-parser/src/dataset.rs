//! Multi-file dataset loading.
//!
//! Model output is usually split into one file per year or per variable.
//! A dataset is opened from a folder plus a file name, where the file name
//! may be a glob pattern (`*` and `?`). Matching files are read, ordered by
//! their first time value and concatenated along the time axis.

use std::path::{Path, PathBuf};

use foci_common::{CurvilinearGrid, FieldCube, TimeAxis};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{read_file, FilePart};

/// Tolerance (degrees) when checking that files share a grid.
const GRID_TOLERANCE: f64 = 1e-4;

/// Options controlling how a dataset is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Sentinel value masked to NaN (model output uses 0 over land)
    pub missing_value: Option<f32>,
    /// Latitude variable name (default: `nav_lat`, then `lat`, `latitude`)
    pub lat_name: Option<String>,
    /// Longitude variable name (default: `nav_lon`, then `lon`, `longitude`)
    pub lon_name: Option<String>,
    /// Time variable name (default: `time_counter`, then `time`)
    pub time_name: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            missing_value: Some(0.0),
            lat_name: None,
            lon_name: None,
            time_name: None,
        }
    }
}

/// A variable loaded from one or more files, with its grid and time axis.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub field: FieldCube,
    pub grid: CurvilinearGrid,
    pub time: TimeAxis,
    /// Files the data came from, in time order
    pub sources: Vec<PathBuf>,
}

impl Dataset {
    /// Number of time steps.
    pub fn time_len(&self) -> usize {
        self.field.time_len()
    }
}

/// Resolve `data_name` inside `folder`.
///
/// Plain names are joined to the folder. Names containing `*` or `?` are
/// matched against the folder's entries and the matches returned sorted.
pub fn resolve_paths(folder: &Path, data_name: &str) -> NetCdfResult<Vec<PathBuf>> {
    if !is_pattern(data_name) {
        return Ok(vec![folder.join(data_name)]);
    }

    let mut matches: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| wildcard_match(data_name, name))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    if matches.is_empty() {
        return Err(NetCdfError::NoFilesMatched {
            folder: folder.display().to_string(),
            pattern: data_name.to_string(),
        });
    }
    matches.sort();
    Ok(matches)
}

/// Open `var_name` from every file in `paths` and combine them by time.
pub fn open_dataset(paths: &[PathBuf], var_name: &str, options: &LoadOptions) -> NetCdfResult<Dataset> {
    if paths.is_empty() {
        return Err(NetCdfError::MissingData("no input files".to_string()));
    }

    let mut parts: Vec<(PathBuf, FilePart)> = paths
        .iter()
        .map(|path| read_file(path, var_name, options).map(|part| (path.clone(), part)))
        .collect::<NetCdfResult<_>>()?;

    // Order by coordinate, like xarray's combine='by_coords'
    parts.sort_by(|(_, a), (_, b)| {
        let a = a.time.first().unwrap_or(f64::INFINITY);
        let b = b.time.first().unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });

    let grid = parts[0].1.grid.clone();
    let units = parts[0].1.time.units.clone();
    for (path, part) in &parts[1..] {
        if !part.grid.approx_eq(&grid, GRID_TOLERANCE) {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} uses a different grid than the first file",
                path.display()
            )));
        }
        if part.time.units != units {
            warn!(
                path = %path.display(),
                units = ?part.time.units,
                expected = ?units,
                "Time units differ between files, dates may be wrong"
            );
        }
    }

    let mut sources = Vec::with_capacity(parts.len());
    let mut fields = Vec::with_capacity(parts.len());
    let mut times = Vec::with_capacity(parts.len());
    for (path, part) in parts {
        sources.push(path);
        fields.push(part.field);
        times.push(part.time);
    }

    let mut field = FieldCube::concat_time(fields)?;
    let time = TimeAxis::concat(times);

    let masked = match options.missing_value {
        Some(missing) => field.mask_value(missing),
        None => 0,
    };

    let (nt, rows, cols) = field.shape();
    info!(
        var = var_name,
        files = sources.len(),
        nt,
        rows,
        cols,
        masked,
        "Opened dataset"
    );

    Ok(Dataset {
        field,
        grid,
        time,
        sources,
    })
}

/// Resolve and open in one step.
pub fn open_from_folder(
    folder: &Path,
    data_name: &str,
    var_name: &str,
    options: &LoadOptions,
) -> NetCdfResult<Dataset> {
    let paths = resolve_paths(folder, data_name)?;
    open_dataset(&paths, var_name, options)
}

fn is_pattern(name: &str) -> bool {
    name.contains('*') || name.contains('?')
}

/// Shell-style wildcard match supporting `*` and `?`.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut star_ni = 0usize;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            star_ni = ni;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            star_ni += 1;
            ni = star_ni;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*.nc", "1_FOCI1.10-TM028_5d_20000101_20001231_sosstsst.nc"));
        assert!(wildcard_match("*_sosstsst.nc", "a_sosstsst.nc"));
        assert!(!wildcard_match("*_sosstsst.nc", "a_iicethic.nc"));
        assert!(wildcard_match("file?.nc", "file1.nc"));
        assert!(!wildcard_match("file?.nc", "file12.nc"));
        assert!(wildcard_match("*", ""));
    }

    #[test]
    fn test_plain_name_is_joined() {
        let paths = resolve_paths(Path::new("/data"), "sst.nc").unwrap();
        assert_eq!(paths, vec![PathBuf::from("/data/sst.nc")]);
    }

    #[test]
    fn test_default_missing_value_is_zero() {
        assert_eq!(LoadOptions::default().missing_value, Some(0.0));
    }
}
