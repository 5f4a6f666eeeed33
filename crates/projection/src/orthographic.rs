//! Orthographic projection: the globe seen from space.

use std::f64::consts::FRAC_PI_2;

use foci_common::BoundingBox;

use crate::{delta_lon, lon_from_delta, MapProjection, EARTH_RADIUS};

/// View centred on `(central_longitude, central_latitude)`. The far
/// hemisphere is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orthographic {
    pub central_longitude: f64,
    pub central_latitude: f64,
}

impl Orthographic {
    pub fn new(central_longitude: f64, central_latitude: f64) -> Self {
        Self {
            central_longitude,
            central_latitude: central_latitude.clamp(-90.0, 90.0),
        }
    }
}

impl MapProjection for Orthographic {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        let phi = lat.to_radians();
        let phi0 = self.central_latitude.to_radians();
        let dlon = delta_lon(lon, self.central_longitude);

        let cos_c = phi0.sin() * phi.sin() + phi0.cos() * phi.cos() * dlon.cos();
        if cos_c < 0.0 {
            return None;
        }
        let x = EARTH_RADIUS * phi.cos() * dlon.sin();
        let y = EARTH_RADIUS * (phi0.cos() * phi.sin() - phi0.sin() * phi.cos() * dlon.cos());
        Some((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let rho = (x * x + y * y).sqrt();
        if !rho.is_finite() || rho > EARTH_RADIUS {
            return None;
        }
        let phi0 = self.central_latitude.to_radians();
        if rho == 0.0 {
            return Some((self.central_longitude, self.central_latitude));
        }
        let c = (rho / EARTH_RADIUS).asin();
        let (sin_c, cos_c) = c.sin_cos();
        let phi = (cos_c * phi0.sin() + y * sin_c * phi0.cos() / rho).clamp(-1.0, 1.0).asin();
        let dlon = if (phi0.abs() - FRAC_PI_2).abs() < 1e-12 {
            // Polar aspect
            if phi0 > 0.0 {
                x.atan2(-y)
            } else {
                x.atan2(y)
            }
        } else {
            (x * sin_c).atan2(rho * cos_c * phi0.cos() - y * sin_c * phi0.sin())
        };
        Some((lon_from_delta(self.central_longitude, dlon), phi.to_degrees()))
    }

    fn domain(&self) -> BoundingBox {
        BoundingBox::new(-EARTH_RADIUS, -EARTH_RADIUS, EARTH_RADIUS, EARTH_RADIUS)
    }

    fn name(&self) -> &'static str {
        "Orthographic"
    }

    fn central_longitude(&self) -> f64 {
        self.central_longitude
    }
}
