//! Equirectangular projection in degrees.

use foci_common::BoundingBox;

use crate::{delta_lon, lon_from_delta, MapProjection};

/// Longitude and latitude used directly as x and y.
///
/// x is measured from the central meridian, so a central longitude of 180
/// puts the Pacific in the middle of the map.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlateCarree {
    pub central_longitude: f64,
}

impl PlateCarree {
    pub fn new(central_longitude: f64) -> Self {
        Self { central_longitude }
    }
}

impl MapProjection for PlateCarree {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        Some((delta_lon(lon, self.central_longitude).to_degrees(), lat))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y) {
            return None;
        }
        Some((lon_from_delta(self.central_longitude, x.to_radians()), y))
    }

    fn domain(&self) -> BoundingBox {
        BoundingBox::new(-180.0, -90.0, 180.0, 90.0)
    }

    fn name(&self) -> &'static str {
        "PlateCarree"
    }

    fn central_longitude(&self) -> f64 {
        self.central_longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_at_zero() {
        let proj = PlateCarree::default();
        assert_eq!(proj.forward(-30.0, 60.0), Some((-30.0, 60.0)));
        assert_eq!(proj.forward(0.0, 95.0), None);
    }

    #[test]
    fn test_pacific_centered() {
        let proj = PlateCarree::new(180.0);
        let (x, y) = proj.forward(-170.0, 10.0).unwrap();
        assert!((x - 10.0).abs() < 1e-9);
        assert_eq!(y, 10.0);
        let (lon, _) = proj.inverse(x, y).unwrap();
        assert!((lon - (-170.0)).abs() < 1e-9);
    }
}
