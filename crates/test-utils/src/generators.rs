//! Synthetic ocean fields on small curvilinear grids.
//!
//! Values follow the shape of real model output closely enough to exercise
//! masking and contouring: land is stored as exactly `0.0`, sea surface
//! temperature is in degrees Celsius and ice thickness in metres.

use std::f64::consts::PI;

/// Extent and shape of a synthetic grid.
///
/// `skew` tilts the mesh: latitude grows by `skew` degrees per column
/// across the grid, which makes it curvilinear like an ORCA tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub skew: f64,
}

impl GridSpec {
    /// A regular latitude/longitude grid.
    pub const fn regular(rows: usize, cols: usize, min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            rows,
            cols,
            min_lon,
            max_lon,
            min_lat,
            max_lat,
            skew: 0.0,
        }
    }

    pub const fn with_skew(mut self, skew: f64) -> Self {
        self.skew = skew;
        self
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Longitude of column `c` (the same on every row).
    pub fn lon(&self, c: usize) -> f64 {
        self.min_lon + (self.max_lon - self.min_lon) * frac(c, self.cols)
    }

    /// Latitude of node `(r, c)`.
    pub fn lat(&self, r: usize, c: usize) -> f64 {
        self.min_lat + (self.max_lat - self.min_lat) * frac(r, self.rows) + self.skew * frac(c, self.cols)
    }

    /// Row-major 2-D `(lat, lon)` meshes.
    pub fn coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        let mut lat = Vec::with_capacity(self.len());
        let mut lon = Vec::with_capacity(self.len());
        for r in 0..self.rows {
            for c in 0..self.cols {
                lat.push(self.lat(r, c));
                lon.push(self.lon(c));
            }
        }
        (lat, lon)
    }

    /// 1-D axes for a regular grid.
    pub fn axes(&self) -> (Vec<f64>, Vec<f64>) {
        let lat = (0..self.rows).map(|r| self.lat(r, 0)).collect();
        let lon = (0..self.cols).map(|c| self.lon(c)).collect();
        (lat, lon)
    }
}

/// North Atlantic tile used by most tests.
pub const NORTH_ATLANTIC: GridSpec = GridSpec {
    rows: 12,
    cols: 16,
    min_lon: -60.0,
    max_lon: 0.0,
    min_lat: 30.0,
    max_lat: 80.0,
    skew: 4.0,
};

fn frac(i: usize, n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        i as f64 / (n - 1) as f64
    }
}

/// Land cells: a rectangular block in the middle third of the grid.
pub fn land_mask(rows: usize, cols: usize) -> Vec<bool> {
    let mut mask = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            mask.push((rows / 3..rows / 2 + 1).contains(&r) && (cols / 3..cols / 2 + 1).contains(&c));
        }
    }
    mask
}

/// A grid with predictable values, `col * 1000 + row`, row-major.
pub fn create_test_grid(cols: usize, rows: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Sea surface temperature cube `(nt, rows, cols)` in degrees Celsius.
///
/// Warm in the south, cold in the north, with a seasonal swing of two
/// degrees over 73 five-day steps. Land is `0.0`. Ocean values are kept
/// away from zero so only land is masked.
pub fn sst_cube(spec: &GridSpec, nt: usize) -> Vec<f32> {
    let mask = land_mask(spec.rows, spec.cols);
    let mut data = Vec::with_capacity(nt * spec.len());
    for t in 0..nt {
        let season = 2.0 * (2.0 * PI * t as f64 / 73.0).sin();
        for r in 0..spec.rows {
            for c in 0..spec.cols {
                if mask[r * spec.cols + c] {
                    data.push(0.0);
                    continue;
                }
                let lat = spec.lat(r, c);
                let mut v = 28.0 - 30.0 * lat.abs() / 90.0 + season;
                v = v.max(-1.8);
                if v.abs() < 0.05 {
                    v = 0.05;
                }
                data.push(v as f32);
            }
        }
    }
    data
}

/// Sea ice thickness cube `(nt, rows, cols)` in metres.
///
/// Ice grows poleward of 60 degrees and thickens in winter. Land and open
/// water are both `0.0`.
pub fn ice_cube(spec: &GridSpec, nt: usize) -> Vec<f32> {
    let mask = land_mask(spec.rows, spec.cols);
    let mut data = Vec::with_capacity(nt * spec.len());
    for t in 0..nt {
        let season = 0.5 * (2.0 * PI * t as f64 / 73.0).cos();
        for r in 0..spec.rows {
            for c in 0..spec.cols {
                let lat = spec.lat(r, c).abs();
                let v = if mask[r * spec.cols + c] || lat < 60.0 {
                    0.0
                } else {
                    ((lat - 60.0) / 30.0 * 3.0 + season).max(0.0)
                };
                data.push(v as f32);
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[1], 1000.0);
        assert_eq!(grid[10], 1.0);
    }

    #[test]
    fn test_coordinates_are_skewed() {
        let (lat, lon) = NORTH_ATLANTIC.coordinates();
        assert_eq!(lat.len(), NORTH_ATLANTIC.len());
        assert_eq!(lon[0], -60.0);
        assert_eq!(lon[NORTH_ATLANTIC.cols - 1], 0.0);
        assert!(lat[NORTH_ATLANTIC.cols - 1] > lat[0]);
    }

    #[test]
    fn test_land_is_zero_and_ocean_is_not() {
        let spec = NORTH_ATLANTIC;
        let sst = sst_cube(&spec, 2);
        let mask = land_mask(spec.rows, spec.cols);
        assert!(mask.iter().any(|&m| m));
        for t in 0..2 {
            for (i, &land) in mask.iter().enumerate() {
                let v = sst[t * spec.len() + i];
                assert_eq!(v == 0.0, land, "cell {} at t={}", i, t);
            }
        }
    }

    #[test]
    fn test_ice_only_in_the_north() {
        let spec = NORTH_ATLANTIC;
        let ice = ice_cube(&spec, 1);
        assert_eq!(ice[0], 0.0);
        assert!(ice.iter().any(|&v| v > 0.0));
    }
}
