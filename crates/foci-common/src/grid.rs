//! Curvilinear model grids.
//!
//! Ocean models such as NEMO store their mesh as two 2-D coordinate arrays
//! (`nav_lat`, `nav_lon`) with one entry per grid cell. Rows run roughly
//! south to north and columns roughly west to east, but neither axis is
//! guaranteed to be aligned with a parallel or a meridian.

use crate::{BoundingBox, FociError, FociResult};
use serde::{Deserialize, Serialize};

/// Latitude/longitude of every cell of a `(rows, cols)` mesh, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvilinearGrid {
    rows: usize,
    cols: usize,
    lat: Vec<f64>,
    lon: Vec<f64>,
}

impl CurvilinearGrid {
    /// Build a grid from 2-D coordinate arrays in row-major order.
    pub fn new(rows: usize, cols: usize, lat: Vec<f64>, lon: Vec<f64>) -> FociResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(FociError::ShapeMismatch(format!(
                "grid must have at least one cell, got {}x{}",
                rows, cols
            )));
        }
        if lat.len() != rows * cols || lon.len() != rows * cols {
            return Err(FociError::ShapeMismatch(format!(
                "coordinate arrays have {} (lat) and {} (lon) values, expected {}x{}={}",
                lat.len(),
                lon.len(),
                rows,
                cols,
                rows * cols
            )));
        }
        Ok(Self {
            rows,
            cols,
            lat,
            lon,
        })
    }

    /// Broadcast 1-D latitude and longitude axes to a full 2-D mesh.
    pub fn from_axes(lat: &[f64], lon: &[f64]) -> FociResult<Self> {
        let rows = lat.len();
        let cols = lon.len();
        let mut lat2 = Vec::with_capacity(rows * cols);
        let mut lon2 = Vec::with_capacity(rows * cols);
        for &la in lat {
            for &lo in lon {
                lat2.push(la);
                lon2.push(lo);
            }
        }
        Self::new(rows, cols, lat2, lon2)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.lat
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.lon
    }

    pub fn lat_at(&self, row: usize, col: usize) -> f64 {
        self.lat[row * self.cols + col]
    }

    pub fn lon_at(&self, row: usize, col: usize) -> f64 {
        self.lon[row * self.cols + col]
    }

    /// Longitudes along the first row, used as the x axis of a plain grid plot.
    pub fn row_longitudes(&self) -> Vec<f64> {
        self.lon[..self.cols].to_vec()
    }

    /// Latitudes along the first column, used as the y axis of a plain grid plot.
    pub fn column_latitudes(&self) -> Vec<f64> {
        (0..self.rows).map(|r| self.lat[r * self.cols]).collect()
    }

    /// Geographic extent (x = longitude, y = latitude), ignoring NaN cells.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.lon.iter().copied().zip(self.lat.iter().copied()))
    }

    /// True when every row shares the first row's longitudes and every column
    /// shares the first column's latitudes, within `tolerance` degrees.
    pub fn is_rectilinear(&self, tolerance: f64) -> bool {
        for r in 0..self.rows {
            for c in 0..self.cols {
                let idx = r * self.cols + c;
                if (self.lon[idx] - self.lon[c]).abs() > tolerance
                    || (self.lat[idx] - self.lat[r * self.cols]).abs() > tolerance
                {
                    return false;
                }
            }
        }
        true
    }

    /// Bilinear lookup of the lon/lat at a fractional `(row, col)` position.
    ///
    /// Longitudes of the four corners are unwrapped relative to the first
    /// corner so cells straddling the antimeridian interpolate correctly.
    /// The result is normalised back to [-180, 180).
    pub fn interpolate(&self, row: f64, col: f64) -> Option<(f64, f64)> {
        if !(row >= 0.0 && col >= 0.0) {
            return None;
        }
        let max_r = (self.rows - 1) as f64;
        let max_c = (self.cols - 1) as f64;
        if row > max_r || col > max_c {
            return None;
        }

        let r0 = (row.floor() as usize).min(self.rows.saturating_sub(2));
        let c0 = (col.floor() as usize).min(self.cols.saturating_sub(2));
        let r1 = (r0 + 1).min(self.rows - 1);
        let c1 = (c0 + 1).min(self.cols - 1);
        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let lon00 = self.lon_at(r0, c0);
        let lon01 = unwrap_longitude(self.lon_at(r0, c1), lon00);
        let lon10 = unwrap_longitude(self.lon_at(r1, c0), lon00);
        let lon11 = unwrap_longitude(self.lon_at(r1, c1), lon00);

        let bilinear = |v00: f64, v01: f64, v10: f64, v11: f64| {
            let top = v00 * (1.0 - fc) + v01 * fc;
            let bottom = v10 * (1.0 - fc) + v11 * fc;
            top * (1.0 - fr) + bottom * fr
        };

        let lon = bilinear(lon00, lon01, lon10, lon11);
        let lat = bilinear(
            self.lat_at(r0, c0),
            self.lat_at(r0, c1),
            self.lat_at(r1, c0),
            self.lat_at(r1, c1),
        );
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        Some((normalize_longitude(lon), lat))
    }

    /// Whether two grids describe the same mesh within `tolerance` degrees.
    pub fn approx_eq(&self, other: &CurvilinearGrid, tolerance: f64) -> bool {
        self.shape() == other.shape()
            && self
                .lat
                .iter()
                .zip(&other.lat)
                .chain(self.lon.iter().zip(&other.lon))
                .all(|(a, b)| (a - b).abs() <= tolerance || (a.is_nan() && b.is_nan()))
    }
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped.is_finite() {
        wrapped
    } else {
        lon
    }
}

/// Shift `lon` by whole turns so it lies within 180 degrees of `reference`.
///
/// Non-finite inputs give NaN.
pub fn unwrap_longitude(lon: f64, reference: f64) -> f64 {
    let d = lon - reference;
    if !d.is_finite() {
        return f64::NAN;
    }
    reference + (d + 180.0).rem_euclid(360.0) - 180.0
}
