//! Spherical Mercator.

use std::f64::consts::PI;

use foci_common::BoundingBox;

use crate::{delta_lon, lon_from_delta, MapProjection, EARTH_RADIUS};

/// Latitude limits, matching cartopy's defaults.
const MIN_LATITUDE: f64 = -80.0;
const MAX_LATITUDE: f64 = 84.0;

/// Conformal cylinder. Latitudes beyond the limits (and the poles, which map
/// to infinity) have no image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mercator {
    pub central_longitude: f64,
}

impl Mercator {
    pub fn new(central_longitude: f64) -> Self {
        Self { central_longitude }
    }

    fn y(lat: f64) -> f64 {
        EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln()
    }
}

impl MapProjection for Mercator {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat) {
            return None;
        }
        Some((EARTH_RADIUS * delta_lon(lon, self.central_longitude), Self::y(lat)))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dlon = x / EARTH_RADIUS;
        if !dlon.is_finite() || dlon.abs() > PI || !y.is_finite() {
            return None;
        }
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Some((lon_from_delta(self.central_longitude, dlon), lat))
    }

    fn domain(&self) -> BoundingBox {
        let half = PI * EARTH_RADIUS;
        BoundingBox::new(-half, Self::y(MIN_LATITUDE), half, Self::y(MAX_LATITUDE))
    }

    fn name(&self) -> &'static str {
        "Mercator"
    }

    fn central_longitude(&self) -> f64 {
        self.central_longitude
    }
}
