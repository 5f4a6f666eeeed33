//! Polar stereographic projections.

use std::f64::consts::FRAC_PI_4;

use foci_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::{delta_lon, lon_from_delta, MapProjection, EARTH_RADIUS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pole {
    North,
    South,
}

/// Stereographic projection from the opposite pole.
///
/// Only the hemisphere around the chosen pole is drawn; the equator sits
/// on a circle of radius `2R`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarStereographic {
    pub pole: Pole,
    pub central_longitude: f64,
}

impl PolarStereographic {
    pub fn new(pole: Pole, central_longitude: f64) -> Self {
        Self {
            pole,
            central_longitude,
        }
    }

    /// +1 for the north pole, -1 for the south.
    fn sign(&self) -> f64 {
        match self.pole {
            Pole::North => 1.0,
            Pole::South => -1.0,
        }
    }
}

impl MapProjection for PolarStereographic {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let s = self.sign();
        if !lon.is_finite() || !(0.0..=90.0).contains(&(s * lat)) {
            return None;
        }
        let rho = 2.0 * EARTH_RADIUS * (FRAC_PI_4 - s * lat.to_radians() / 2.0).tan();
        let dlon = delta_lon(lon, self.central_longitude);
        Some((rho * dlon.sin(), -s * rho * dlon.cos()))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let s = self.sign();
        let rho = (x * x + y * y).sqrt();
        if !rho.is_finite() || rho > 2.0 * EARTH_RADIUS * (1.0 + 1e-12) {
            return None;
        }
        let lat = s * (90.0 - 2.0 * (rho / (2.0 * EARTH_RADIUS)).atan().to_degrees());
        let dlon = x.atan2(-s * y);
        Some((lon_from_delta(self.central_longitude, dlon), lat))
    }

    fn domain(&self) -> BoundingBox {
        let r = 2.0 * EARTH_RADIUS;
        BoundingBox::new(-r, -r, r, r)
    }

    fn name(&self) -> &'static str {
        match self.pole {
            Pole::North => "NorthPolarStereo",
            Pole::South => "SouthPolarStereo",
        }
    }

    fn central_longitude(&self) -> f64 {
        self.central_longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pole_at_origin() {
        let north = PolarStereographic::new(Pole::North, 0.0);
        let (x, y) = north.forward(45.0, 90.0).unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
        assert!(north.forward(0.0, -10.0).is_none());

        let south = PolarStereographic::new(Pole::South, 0.0);
        assert!(south.forward(0.0, 10.0).is_none());
        assert!(south.forward(0.0, -60.0).is_some());
    }

    #[test]
    fn test_equator_radius() {
        let (x, y) = PolarStereographic::new(Pole::North, 0.0).forward(90.0, 0.0).unwrap();
        assert!(((x * x + y * y).sqrt() - 2.0 * EARTH_RADIUS).abs() < 1e-3);
    }

    #[test]
    fn test_roundtrip_both_poles() {
        for pole in [Pole::North, Pole::South] {
            let proj = PolarStereographic::new(pole, -45.0);
            let s = proj.sign();
            for &(lon, lat) in &[(-45.0, 70.0), (100.0, 55.5), (-170.0, 5.0)] {
                let (x, y) = proj.forward(lon, s * lat).unwrap();
                let (lon2, lat2) = proj.inverse(x, y).unwrap();
                assert!((lon - lon2).abs() < 1e-6, "lon {} -> {}", lon, lon2);
                assert!((s * lat - lat2).abs() < 1e-6, "lat {} -> {}", lat, lat2);
            }
        }
    }
}
