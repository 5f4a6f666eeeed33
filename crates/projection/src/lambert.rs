//! Lambert Conformal Conic projection.
//!
//! Maps a cone secant to the sphere at two standard parallels onto a flat
//! plane. The projection parameters are:
//! - Central meridian (lon0)
//! - Latitude of origin (lat0): y is zero here
//! - Standard parallels: latin1 and latin2 (equal for a tangent cone)
//!
//! The far pole maps to infinity, so latitudes south of `cutoff` (for a
//! northern cone) have no image.

use std::f64::consts::PI;

use foci_common::BoundingBox;

use crate::{delta_lon, lon_from_delta, sampled_domain, MapProjection, ProjectionError, ProjectionResult, EARTH_RADIUS};

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformal {
    /// Central meridian in degrees
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    /// Latitude (degrees) beyond which points are dropped
    pub cutoff: f64,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl LambertConformal {
    /// Create a projection from its parameters in degrees.
    pub fn new(lon0_deg: f64, lat0_deg: f64, latin1_deg: f64, latin2_deg: f64) -> ProjectionResult<Self> {
        let to_rad = PI / 180.0;
        let lat0 = lat0_deg * to_rad;
        let latin1 = latin1_deg * to_rad;
        let latin2 = latin2_deg * to_rad;

        if (latin1 + latin2).abs() < 1e-10 {
            return Err(ProjectionError::InvalidParameter {
                param: "standard_parallels".to_string(),
                message: "parallels symmetric about the equator give a cylinder, not a cone".to_string(),
            });
        }
        Ok(Self::from_radians(lon0_deg, lat0, latin1, latin2))
    }

    fn from_radians(lon0: f64, lat0: f64, latin1: f64, latin2: f64) -> Self {
        // Compute cone constant n
        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            latin1.sin()
        } else {
            // Secant cone (two standard parallels)
            let ln_ratio = (latin1.cos() / latin2.cos()).ln();
            let tan_ratio = ((PI / 4.0 + latin2 / 2.0).tan() / (PI / 4.0 + latin1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        // Compute F constant
        let f = (latin1.cos() * (PI / 4.0 + latin1 / 2.0).tan().powf(n)) / n;

        let rho0 = EARTH_RADIUS * f / (PI / 4.0 + lat0 / 2.0).tan().powf(n);

        Self {
            lon0,
            lat0,
            latin1,
            latin2,
            cutoff: if n > 0.0 { -30.0 } else { 30.0 },
            n,
            f,
            rho0,
        }
    }

    fn rho(&self, lat: f64) -> f64 {
        EARTH_RADIUS * self.f / (PI / 4.0 + lat / 2.0).tan().powf(self.n)
    }

    fn in_range(&self, lat_deg: f64) -> bool {
        if self.n > 0.0 {
            lat_deg >= self.cutoff && lat_deg <= 90.0
        } else {
            lat_deg <= self.cutoff && lat_deg >= -90.0
        }
    }
}

impl Default for LambertConformal {
    /// Cartopy's defaults, centred on North America.
    fn default() -> Self {
        Self::from_radians(-96.0, 39f64.to_radians(), 33f64.to_radians(), 45f64.to_radians())
    }
}

impl MapProjection for LambertConformal {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !self.in_range(lat) {
            return None;
        }
        // Compute rho for this latitude
        let rho = self.rho(lat.to_radians());
        if !rho.is_finite() {
            return None;
        }
        // Compute theta (angle from central meridian)
        let theta = self.n * delta_lon(lon, self.lon0);

        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();
        Some((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dy = self.rho0 - y;
        let rho = (x * x + dy * dy).sqrt().copysign(self.n);
        let theta = if self.n < 0.0 { (-x).atan2(-dy) } else { x.atan2(dy) };

        let lat = if rho == 0.0 {
            (PI / 2.0).copysign(self.n)
        } else {
            2.0 * ((EARTH_RADIUS * self.f / rho).powf(1.0 / self.n)).atan() - PI / 2.0
        };

        let dlon = theta / self.n;
        if !lat.is_finite() || dlon.abs() > PI {
            return None;
        }
        let lat = lat.to_degrees();
        if !self.in_range(lat) {
            return None;
        }
        Some((lon_from_delta(self.lon0, dlon), lat))
    }

    fn domain(&self) -> BoundingBox {
        if self.n > 0.0 {
            sampled_domain(self, self.cutoff, 90.0)
        } else {
            sampled_domain(self, -90.0, self.cutoff)
        }
    }

    fn name(&self) -> &'static str {
        "LambertConformal"
    }

    fn central_longitude(&self) -> f64 {
        self.lon0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let proj = LambertConformal::default();
        let (x, y) = proj.forward(-96.0, 39.0).unwrap();
        assert!(x.abs() < 1e-6, "x should be ~0, got {}", x);
        assert!(y.abs() < 1e-6, "y should be ~0, got {}", y);
    }

    #[test]
    fn test_roundtrip() {
        let proj = LambertConformal::default();
        for &(lon, lat) in &[(-94.5, 39.0), (-40.0, 60.0), (10.0, 80.0), (120.0, -20.0)] {
            let (x, y) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-6, "lon roundtrip failed: {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-6, "lat roundtrip failed: {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_cutoff() {
        let proj = LambertConformal::default();
        assert!(proj.forward(0.0, -45.0).is_none());
        assert!(proj.forward(0.0, -29.0).is_some());
    }

    #[test]
    fn test_southern_cone() {
        let proj = LambertConformal::new(0.0, -40.0, -30.0, -50.0).unwrap();
        let (x, y) = proj.forward(15.0, -45.0).unwrap();
        let (lon, lat) = proj.inverse(x, y).unwrap();
        assert!((lon - 15.0).abs() < 1e-6);
        assert!((lat - (-45.0)).abs() < 1e-6);
        assert!(proj.forward(0.0, 60.0).is_none());
    }

    #[test]
    fn test_symmetric_parallels_rejected() {
        assert!(LambertConformal::new(0.0, 0.0, 30.0, -30.0).is_err());
    }
}
