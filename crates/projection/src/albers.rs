//! Albers equal-area conic projection.

use std::f64::consts::PI;

use foci_common::BoundingBox;

use crate::{delta_lon, lon_from_delta, sampled_domain, MapProjection, ProjectionError, ProjectionResult, EARTH_RADIUS};

#[derive(Debug, Clone, PartialEq)]
pub struct AlbersEqualArea {
    /// Central meridian in degrees
    pub lon0: f64,
    n: f64,
    c: f64,
    rho0: f64,
}

impl AlbersEqualArea {
    /// Parameters in degrees: central meridian, latitude of origin and the
    /// two standard parallels.
    pub fn new(lon0: f64, lat0: f64, parallel1: f64, parallel2: f64) -> ProjectionResult<Self> {
        let (phi0, phi1, phi2) = (lat0.to_radians(), parallel1.to_radians(), parallel2.to_radians());
        let n = (phi1.sin() + phi2.sin()) / 2.0;
        if n.abs() < 1e-10 {
            return Err(ProjectionError::InvalidParameter {
                param: "standard_parallels".to_string(),
                message: format!("{} and {} are symmetric about the equator", parallel1, parallel2),
            });
        }
        let c = phi1.cos().powi(2) + 2.0 * n * phi1.sin();
        let rho0 = EARTH_RADIUS * (c - 2.0 * n * phi0.sin()).sqrt() / n;
        Ok(Self { lon0, n, c, rho0 })
    }
}

impl MapProjection for AlbersEqualArea {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        let rho = EARTH_RADIUS * (self.c - 2.0 * self.n * lat.to_radians().sin()).max(0.0).sqrt() / self.n;
        let theta = self.n * delta_lon(lon, self.lon0);
        Some((rho * theta.sin(), self.rho0 - rho * theta.cos()))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dy = self.rho0 - y;
        let rho = (x * x + dy * dy).sqrt();
        let theta = if self.n < 0.0 { (-x).atan2(-dy) } else { x.atan2(dy) };
        let sin_lat = (self.c - (rho * self.n / EARTH_RADIUS).powi(2)) / (2.0 * self.n);
        let dlon = theta / self.n;
        if !sin_lat.is_finite() || sin_lat.abs() > 1.0 || dlon.abs() > PI {
            return None;
        }
        Some((lon_from_delta(self.lon0, dlon), sin_lat.asin().to_degrees()))
    }

    fn domain(&self) -> BoundingBox {
        sampled_domain(self, -90.0, 90.0)
    }

    fn name(&self) -> &'static str {
        "AlbersEqualArea"
    }

    fn central_longitude(&self) -> f64 {
        self.lon0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let proj = AlbersEqualArea::new(0.0, 0.0, 20.0, 50.0).unwrap();
        for &(lon, lat) in &[(0.0, 0.0), (-30.0, 55.0), (150.0, -60.0), (-5.0, 89.0)] {
            let (x, y) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-6, "lon {} -> {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-6, "lat {} -> {}", lat, lat2);
        }
    }

    #[test]
    fn test_origin() {
        let proj = AlbersEqualArea::new(10.0, 0.0, 20.0, 50.0).unwrap();
        let (x, y) = proj.forward(10.0, 0.0).unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    }

    #[test]
    fn test_invalid_parallels() {
        assert!(AlbersEqualArea::new(0.0, 0.0, 30.0, -30.0).is_err());
    }
}
