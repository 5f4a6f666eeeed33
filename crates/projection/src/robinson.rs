//! Robinson pseudo-cylindrical projection.
//!
//! Defined by a table of parallel lengths (`X`) and distances from the
//! equator (`Y`) every 5 degrees of latitude, interpolated in between.

use std::f64::consts::PI;

use foci_common::BoundingBox;

use crate::{delta_lon, lon_from_delta, MapProjection, EARTH_RADIUS};

const TABLE_X: [f64; 19] = [
    1.0000, 0.9986, 0.9954, 0.9900, 0.9822, 0.9730, 0.9600, 0.9427, 0.9216, 0.8962, 0.8679, 0.8350, 0.7986,
    0.7597, 0.7186, 0.6732, 0.6213, 0.5722, 0.5322,
];
const TABLE_Y: [f64; 19] = [
    0.0000, 0.0620, 0.1240, 0.1860, 0.2480, 0.3100, 0.3720, 0.4340, 0.4958, 0.5571, 0.6176, 0.6769, 0.7346,
    0.7903, 0.8435, 0.8936, 0.9394, 0.9761, 1.0000,
];
const FXC: f64 = 0.8487;
const FYC: f64 = 1.3523;
const STEP: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Robinson {
    pub central_longitude: f64,
}

impl Robinson {
    pub fn new(central_longitude: f64) -> Self {
        Self { central_longitude }
    }

    /// Interpolated `(X, Y)` factors for `|lat|` in degrees.
    fn factors(abs_lat: f64) -> (f64, f64) {
        let pos = (abs_lat / STEP).clamp(0.0, 18.0);
        let i = (pos.floor() as usize).min(17);
        let t = pos - i as f64;
        (
            TABLE_X[i] + (TABLE_X[i + 1] - TABLE_X[i]) * t,
            TABLE_Y[i] + (TABLE_Y[i + 1] - TABLE_Y[i]) * t,
        )
    }

    /// `|lat|` in degrees for a `Y` factor in `[0, 1]`.
    fn latitude_for(y_factor: f64) -> f64 {
        let i = TABLE_Y
            .windows(2)
            .position(|w| y_factor <= w[1])
            .unwrap_or(17);
        let t = (y_factor - TABLE_Y[i]) / (TABLE_Y[i + 1] - TABLE_Y[i]);
        (i as f64 + t) * STEP
    }
}

impl MapProjection for Robinson {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        let (fx, fy) = Self::factors(lat.abs());
        let x = FXC * EARTH_RADIUS * fx * delta_lon(lon, self.central_longitude);
        let y = FYC * EARTH_RADIUS * fy * lat.signum();
        Some((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let y_factor = y.abs() / (FYC * EARTH_RADIUS);
        if !y_factor.is_finite() || y_factor > 1.0 {
            return None;
        }
        let abs_lat = Self::latitude_for(y_factor);
        let (fx, _) = Self::factors(abs_lat);
        let dlon = x / (FXC * EARTH_RADIUS * fx);
        if !dlon.is_finite() || dlon.abs() > PI + 1e-12 {
            return None;
        }
        Some((lon_from_delta(self.central_longitude, dlon), abs_lat.copysign(y)))
    }

    fn domain(&self) -> BoundingBox {
        let half_x = FXC * EARTH_RADIUS * PI;
        let half_y = FYC * EARTH_RADIUS;
        BoundingBox::new(-half_x, -half_y, half_x, half_y)
    }

    fn name(&self) -> &'static str {
        "Robinson"
    }

    fn central_longitude(&self) -> f64 {
        self.central_longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_endpoints() {
        let proj = Robinson::default();
        let (_, y) = proj.forward(0.0, 90.0).unwrap();
        assert!((y - FYC * EARTH_RADIUS).abs() < 1e-6);
        let (x, _) = proj.forward(179.999999, 0.0).unwrap();
        assert!((x - FXC * EARTH_RADIUS * PI).abs() < 1.0);
    }

    #[test]
    fn test_roundtrip() {
        let proj = Robinson::new(10.0);
        for &(lon, lat) in &[(-20.0, 65.0), (100.0, -33.3), (10.0, 0.0), (-160.0, 87.5)] {
            let (x, y) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-6, "lon {} -> {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-6, "lat {} -> {}", lat, lat2);
        }
    }

    #[test]
    fn test_outside_outline() {
        assert!(Robinson::default().inverse(0.0, 2.0 * FYC * EARTH_RADIUS).is_none());
    }
}
