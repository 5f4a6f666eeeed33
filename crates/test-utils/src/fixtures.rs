//! NEMO-style NetCDF files for tests.
//!
//! Files carry `nav_lat`/`nav_lon` on `(y, x)`, a `time_counter` in seconds
//! since 1900 and one `(time_counter, y, x)` float variable, which is how
//! FOCI writes its 5-day means.

use std::path::Path;

use crate::generators::{ice_cube, sst_cube, GridSpec};

/// Time units of NEMO output.
pub const NEMO_TIME_UNITS: &str = "seconds since 1900-01-01 00:00:00";

/// Five days in seconds, the output frequency of the `5d` files.
pub const FIVE_DAYS: f64 = 432_000.0;

/// 2000-01-01 in seconds since 1900-01-01 (36524 days).
pub const YEAR_2000: f64 = 36_524.0 * 86_400.0;

/// Description of a file to write.
#[derive(Debug, Clone)]
pub struct NetcdfFixture {
    pub var_name: String,
    pub units: Option<String>,
    pub long_name: Option<String>,
    pub grid: GridSpec,
    pub nt: usize,
    /// First time value, seconds since 1900
    pub t0: f64,
    pub dt: f64,
    /// `(nt, rows, cols)` row-major
    pub values: Vec<f32>,
    /// Write `lat(y)`/`lon(x)` instead of `nav_lat`/`nav_lon`
    pub coords_1d: bool,
    pub with_time: bool,
    /// NaNs are written as this value, declared as `_FillValue`
    pub fill_value: Option<f32>,
    /// Store the variable as `i16` with this `(scale_factor, add_offset)`
    pub packing: Option<(f32, f32)>,
    /// Write this `_FillValue` into `nav_lat`/`nav_lon` where time step 0 is NaN
    pub coordinate_fill: Option<f32>,
}

/// `_FillValue` of packed variables.
pub const PACKED_FILL: i16 = i16::MIN + 1;

impl NetcdfFixture {
    pub fn new(var_name: &str, grid: GridSpec, nt: usize, values: Vec<f32>) -> Self {
        Self {
            var_name: var_name.to_string(),
            units: None,
            long_name: None,
            grid,
            nt,
            t0: YEAR_2000,
            dt: FIVE_DAYS,
            values,
            coords_1d: false,
            with_time: true,
            fill_value: None,
            packing: None,
            coordinate_fill: None,
        }
    }

    /// `sosstsst` with land stored as zero.
    pub fn sst(grid: GridSpec, nt: usize) -> Self {
        let mut fixture = Self::new("sosstsst", grid, nt, sst_cube(&grid, nt));
        fixture.units = Some("degC".to_string());
        fixture.long_name = Some("Sea Surface Temperature".to_string());
        fixture
    }

    /// `iicethic` with land and open water stored as zero.
    pub fn ice(grid: GridSpec, nt: usize) -> Self {
        let mut fixture = Self::new("iicethic", grid, nt, ice_cube(&grid, nt));
        fixture.units = Some("m".to_string());
        fixture.long_name = Some("Ice thickness".to_string());
        fixture
    }

    pub fn starting_at(mut self, t0: f64) -> Self {
        self.t0 = t0;
        self
    }

    pub fn with_1d_coords(mut self) -> Self {
        self.coords_1d = true;
        self
    }

    pub fn without_time(mut self) -> Self {
        self.with_time = false;
        self
    }

    pub fn with_fill_value(mut self, fill: f32) -> Self {
        self.fill_value = Some(fill);
        self
    }

    /// Pack the variable into short ints, NaNs becoming [`PACKED_FILL`].
    pub fn packed(mut self, scale_factor: f32, add_offset: f32) -> Self {
        self.packing = Some((scale_factor, add_offset));
        self
    }

    pub fn with_coordinate_fill(mut self, fill: f32) -> Self {
        self.coordinate_fill = Some(fill);
        self
    }

    /// Time values this fixture writes.
    pub fn times(&self) -> Vec<f64> {
        (0..self.nt).map(|t| self.t0 + t as f64 * self.dt).collect()
    }

    /// Write the file, replacing anything at `path`.
    pub fn write(&self, path: &Path) -> Result<(), netcdf::Error> {
        let mut file = netcdf::create(path)?;

        file.add_dimension("time_counter", self.nt)?;
        file.add_dimension("y", self.grid.rows)?;
        file.add_dimension("x", self.grid.cols)?;

        if self.coords_1d {
            let (lat, lon) = self.grid.axes();
            let mut lat_var = file.add_variable::<f64>("lat", &["y"])?;
            lat_var.put_attribute("units", "degrees_north")?;
            lat_var.put_values(&lat, ..)?;

            let mut lon_var = file.add_variable::<f64>("lon", &["x"])?;
            lon_var.put_attribute("units", "degrees_east")?;
            lon_var.put_values(&lon, ..)?;
        } else {
            let (lat, lon) = self.grid.coordinates();
            let coordinate = |values: Vec<f64>| -> Vec<f32> {
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| match self.coordinate_fill {
                        Some(fill) if self.values.get(i).is_some_and(|x| x.is_nan()) => fill,
                        _ => v as f32,
                    })
                    .collect()
            };
            let lat = coordinate(lat);
            let lon = coordinate(lon);

            let mut lat_var = file.add_variable::<f32>("nav_lat", &["y", "x"])?;
            lat_var.put_attribute("units", "degrees_north")?;
            lat_var.put_attribute("long_name", "Latitude")?;
            if let Some(fill) = self.coordinate_fill {
                lat_var.put_attribute("_FillValue", fill)?;
            }
            lat_var.put_values(&lat, ..)?;

            let mut lon_var = file.add_variable::<f32>("nav_lon", &["y", "x"])?;
            lon_var.put_attribute("units", "degrees_east")?;
            lon_var.put_attribute("long_name", "Longitude")?;
            if let Some(fill) = self.coordinate_fill {
                lon_var.put_attribute("_FillValue", fill)?;
            }
            lon_var.put_values(&lon, ..)?;
        }

        if self.with_time {
            let mut time_var = file.add_variable::<f64>("time_counter", &["time_counter"])?;
            time_var.put_attribute("units", NEMO_TIME_UNITS)?;
            time_var.put_attribute("calendar", "gregorian")?;
            time_var.put_values(&self.times(), ..)?;
        }

        let dims = ["time_counter", "y", "x"];
        if let Some((scale_factor, add_offset)) = self.packing {
            let mut var = file.add_variable::<i16>(&self.var_name, &dims)?;
            self.put_text_attributes(&mut var)?;
            var.put_attribute("_FillValue", PACKED_FILL)?;
            var.put_attribute("scale_factor", scale_factor)?;
            var.put_attribute("add_offset", add_offset)?;
            let packed: Vec<i16> = self
                .values
                .iter()
                .map(|v| {
                    if v.is_nan() {
                        PACKED_FILL
                    } else {
                        ((v - add_offset) / scale_factor).round() as i16
                    }
                })
                .collect();
            var.put_values(&packed, ..)?;
            return Ok(());
        }

        let mut var = file.add_variable::<f32>(&self.var_name, &dims)?;
        self.put_text_attributes(&mut var)?;
        match self.fill_value {
            Some(fill) => {
                var.put_attribute("_FillValue", fill)?;
                let values: Vec<f32> = self
                    .values
                    .iter()
                    .map(|v| if v.is_nan() { fill } else { *v })
                    .collect();
                var.put_values(&values, ..)?;
            }
            None => var.put_values(&self.values, ..)?,
        }

        Ok(())
    }

    fn put_text_attributes(&self, var: &mut netcdf::VariableMut<'_>) -> Result<(), netcdf::Error> {
        if let Some(units) = &self.units {
            var.put_attribute("units", units.as_str())?;
        }
        if let Some(long_name) = &self.long_name {
            var.put_attribute("long_name", long_name.as_str())?;
        }
        Ok(())
    }
}
