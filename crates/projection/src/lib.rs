//! Map projections for plotting model output.
//!
//! Implements the handful of cartographic projections the plots need from
//! scratch, on a sphere. Projected coordinates are metres except for
//! [`PlateCarree`], which works in degrees like its cartopy counterpart.

pub mod albers;
pub mod error;
pub mod lambert;
pub mod mercator;
pub mod orthographic;
pub mod plate_carree;
pub mod robinson;
pub mod stereographic;

use std::fmt;
use std::str::FromStr;

use foci_common::grid::normalize_longitude;
use foci_common::BoundingBox;
use serde::{Deserialize, Serialize};

pub use albers::AlbersEqualArea;
pub use error::{ProjectionError, ProjectionResult};
pub use lambert::LambertConformal;
pub use mercator::Mercator;
pub use orthographic::Orthographic;
pub use plate_carree::PlateCarree;
pub use robinson::Robinson;
pub use stereographic::{Pole, PolarStereographic};

/// Sphere radius used by every projection (metres).
pub const EARTH_RADIUS: f64 = 6_371_229.0;

/// Forward and inverse mapping between lon/lat and a projected plane.
pub trait MapProjection: Send + Sync {
    /// Project a point given in degrees. `None` when the point has no image.
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;

    /// Map projected coordinates back to `(lon, lat)` degrees.
    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// Extent of the whole projected globe.
    fn domain(&self) -> BoundingBox;

    fn name(&self) -> &'static str;

    fn central_longitude(&self) -> f64;
}

/// Longitude offset from a central meridian, in radians within [-pi, pi).
pub(crate) fn delta_lon(lon: f64, central_longitude: f64) -> f64 {
    normalize_longitude(lon - central_longitude).to_radians()
}

/// Central meridian plus an offset in radians, normalized to degrees.
pub(crate) fn lon_from_delta(central_longitude: f64, dlon: f64) -> f64 {
    normalize_longitude(central_longitude + dlon.to_degrees())
}

/// Extent of a projection found by projecting a lon/lat lattice.
///
/// Used for conic projections whose outline has no simple closed form.
pub(crate) fn sampled_domain<P: MapProjection + ?Sized>(proj: &P, min_lat: f64, max_lat: f64) -> BoundingBox {
    const STEPS: usize = 180;
    let c = proj.central_longitude();
    let mut bbox = BoundingBox::empty();
    for i in 0..=STEPS {
        // Stay a hair inside the seam so the outline does not fold over
        let lon = c - 179.999 + 359.998 * i as f64 / STEPS as f64;
        for j in 0..=STEPS / 2 {
            let lat = min_lat + (max_lat - min_lat) * j as f64 / (STEPS / 2) as f64;
            if let Some((x, y)) = proj.forward(lon, lat) {
                bbox.expand_to_include(x, y);
            }
        }
    }
    bbox
}

/// Any supported projection, selected by name at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    PlateCarree(PlateCarree),
    Robinson(Robinson),
    Mercator(Mercator),
    LambertConformal(LambertConformal),
    AlbersEqualArea(AlbersEqualArea),
    Orthographic(Orthographic),
    PolarStereographic(PolarStereographic),
}

/// Projection names as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionKind {
    PlateCarree,
    Robinson,
    Mercator,
    LambertConformal,
    AlbersEqualArea,
    Orthographic,
    NorthPolarStereo,
    SouthPolarStereo,
}

impl ProjectionKind {
    pub const ALL: [ProjectionKind; 8] = [
        ProjectionKind::PlateCarree,
        ProjectionKind::Robinson,
        ProjectionKind::Mercator,
        ProjectionKind::LambertConformal,
        ProjectionKind::AlbersEqualArea,
        ProjectionKind::Orthographic,
        ProjectionKind::NorthPolarStereo,
        ProjectionKind::SouthPolarStereo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionKind::PlateCarree => "PlateCarree",
            ProjectionKind::Robinson => "Robinson",
            ProjectionKind::Mercator => "Mercator",
            ProjectionKind::LambertConformal => "LambertConformal",
            ProjectionKind::AlbersEqualArea => "AlbersEqualArea",
            ProjectionKind::Orthographic => "Orthographic",
            ProjectionKind::NorthPolarStereo => "NorthPolarStereo",
            ProjectionKind::SouthPolarStereo => "SouthPolarStereo",
        }
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectionKind {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "");
        ProjectionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| ProjectionError::UnknownProjection(s.to_string()))
    }
}

impl Projection {
    /// Build a projection with its default parameters.
    ///
    /// `central_longitude` replaces the default central meridian when given.
    pub fn new(kind: ProjectionKind, central_longitude: Option<f64>) -> ProjectionResult<Self> {
        if let Some(c) = central_longitude {
            if !c.is_finite() || !(-360.0..=360.0).contains(&c) {
                return Err(ProjectionError::InvalidParameter {
                    param: "central_longitude".to_string(),
                    message: format!("{} is outside [-360, 360]", c),
                });
            }
        }
        let c = central_longitude.map(normalize_longitude);
        let proj = match kind {
            ProjectionKind::PlateCarree => Projection::PlateCarree(PlateCarree::new(c.unwrap_or(0.0))),
            ProjectionKind::Robinson => Projection::Robinson(Robinson::new(c.unwrap_or(0.0))),
            ProjectionKind::Mercator => Projection::Mercator(Mercator::new(c.unwrap_or(0.0))),
            ProjectionKind::LambertConformal => Projection::LambertConformal(match c {
                Some(c) => LambertConformal::new(c, 39.0, 33.0, 45.0)?,
                None => LambertConformal::default(),
            }),
            ProjectionKind::AlbersEqualArea => {
                Projection::AlbersEqualArea(AlbersEqualArea::new(c.unwrap_or(0.0), 0.0, 20.0, 50.0)?)
            }
            ProjectionKind::Orthographic => Projection::Orthographic(Orthographic::new(c.unwrap_or(0.0), 0.0)),
            ProjectionKind::NorthPolarStereo => {
                Projection::PolarStereographic(PolarStereographic::new(Pole::North, c.unwrap_or(0.0)))
            }
            ProjectionKind::SouthPolarStereo => {
                Projection::PolarStereographic(PolarStereographic::new(Pole::South, c.unwrap_or(0.0)))
            }
        };
        Ok(proj)
    }

    /// Parse a cartopy-style name such as `Robinson` or `north_polar_stereo`.
    pub fn from_name(name: &str, central_longitude: Option<f64>) -> ProjectionResult<Self> {
        Self::new(name.parse()?, central_longitude)
    }

    pub fn kind(&self) -> ProjectionKind {
        match self {
            Projection::PlateCarree(_) => ProjectionKind::PlateCarree,
            Projection::Robinson(_) => ProjectionKind::Robinson,
            Projection::Mercator(_) => ProjectionKind::Mercator,
            Projection::LambertConformal(_) => ProjectionKind::LambertConformal,
            Projection::AlbersEqualArea(_) => ProjectionKind::AlbersEqualArea,
            Projection::Orthographic(_) => ProjectionKind::Orthographic,
            Projection::PolarStereographic(p) => match p.pole {
                Pole::North => ProjectionKind::NorthPolarStereo,
                Pole::South => ProjectionKind::SouthPolarStereo,
            },
        }
    }

    pub fn is_plate_carree(&self) -> bool {
        matches!(self, Projection::PlateCarree(_))
    }

    fn inner(&self) -> &dyn MapProjection {
        match self {
            Projection::PlateCarree(p) => p,
            Projection::Robinson(p) => p,
            Projection::Mercator(p) => p,
            Projection::LambertConformal(p) => p,
            Projection::AlbersEqualArea(p) => p,
            Projection::Orthographic(p) => p,
            Projection::PolarStereographic(p) => p,
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::PlateCarree(PlateCarree::default())
    }
}

impl FromStr for Projection {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Projection::from_name(s, None)
    }
}

impl MapProjection for Projection {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        self.inner().forward(lon, lat)
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.inner().inverse(x, y)
    }

    fn domain(&self) -> BoundingBox {
        self.inner().domain()
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn central_longitude(&self) -> f64 {
        self.inner().central_longitude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_case_insensitive() {
        assert_eq!("robinson".parse::<ProjectionKind>().unwrap(), ProjectionKind::Robinson);
        assert_eq!("PLATECARREE".parse::<ProjectionKind>().unwrap(), ProjectionKind::PlateCarree);
        assert_eq!(
            "north_polar_stereo".parse::<ProjectionKind>().unwrap(),
            ProjectionKind::NorthPolarStereo
        );
        assert!(matches!(
            "Mollweide".parse::<ProjectionKind>(),
            Err(ProjectionError::UnknownProjection(_))
        ));
    }

    #[test]
    fn test_every_kind_builds() {
        for kind in ProjectionKind::ALL {
            let proj = Projection::new(kind, None).unwrap();
            assert_eq!(proj.kind(), kind);
            assert_eq!(proj.name(), kind.as_str());
            assert!(proj.domain().is_valid(), "{} domain", kind);
        }
    }

    #[test]
    fn test_central_longitude_override() {
        let proj = Projection::from_name("Robinson", Some(-30.0)).unwrap();
        assert_eq!(proj.central_longitude(), -30.0);
        let (x, _) = proj.forward(-30.0, 45.0).unwrap();
        assert!(x.abs() < 1e-6);
        assert!(Projection::from_name("Robinson", Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_delta_lon_wraps() {
        assert!((delta_lon(170.0, -170.0).to_degrees() - (-20.0)).abs() < 1e-9);
        assert!((lon_from_delta(170.0, 20f64.to_radians()) - (-170.0)).abs() < 1e-9);
    }
}
