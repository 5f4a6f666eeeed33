//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// For geographic extents, x is longitude and y is latitude (degrees).
/// For projected extents, coordinates are in the projection's native units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// An inverted box that any point will expand.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Smallest box containing every finite point of the iterator.
    ///
    /// Returns `None` when no finite point was seen.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut bbox = Self::empty();
        for (x, y) in points {
            bbox.expand_to_include(x, y);
        }
        bbox.is_valid().then_some(bbox)
    }

    /// Grow the box to include a point. Non-finite points are ignored.
    pub fn expand_to_include(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// True when min <= max on both axes.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_skips_nan() {
        let bbox = BoundingBox::from_points(vec![(1.0, 2.0), (f64::NAN, 5.0), (-3.0, 4.0)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-3.0, 2.0, 1.0, 4.0));
    }

    #[test]
    fn test_from_points_empty() {
        assert!(BoundingBox::from_points(Vec::new()).is_none());
        assert!(BoundingBox::from_points(vec![(f64::NAN, f64::NAN)]).is_none());
    }
}
