//! Contour level selection.
//!
//! Filled contours shade the band between consecutive levels. Levels come
//! either from a requested count, picked the way matplotlib's `MaxNLocator`
//! does so boundaries land on round numbers, or from an explicit list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::colormap::{Color, Colormap};
use crate::error::{RenderError, RenderResult};

/// How contour levels are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    /// About this many levels at round numbers over the data range
    Count(usize),
    /// Exactly these boundaries
    Explicit(Vec<f32>),
    /// Every multiple of `interval` covering the data range
    Interval { interval: f32 },
}

impl Default for LevelSpec {
    fn default() -> Self {
        LevelSpec::Count(20)
    }
}

impl fmt::Display for LevelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSpec::Count(n) => write!(f, "{}", n),
            LevelSpec::Explicit(levels) => {
                let parts: Vec<String> = levels.iter().map(|l| l.to_string()).collect();
                f.write_str(&parts.join(","))
            }
            LevelSpec::Interval { interval } => write!(f, "interval={}", interval),
        }
    }
}

impl FromStr for LevelSpec {
    type Err = RenderError;

    /// `20`, `0,2.5,5` or `interval=2.5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || RenderError::InvalidLevels(format!("cannot parse '{}'", s));
        if let Some(step) = s.strip_prefix("interval=") {
            let interval: f32 = step.trim().parse().map_err(|_| invalid())?;
            return Ok(LevelSpec::Interval { interval });
        }
        if s.contains(',') {
            let levels = s
                .split(',')
                .map(|part| part.trim().parse::<f32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| invalid())?;
            return Ok(LevelSpec::Explicit(levels));
        }
        s.parse::<usize>().map(LevelSpec::Count).map_err(|_| invalid())
    }
}

/// Generate contour levels automatically based on data range and interval
pub fn generate_contour_levels(min_value: f32, max_value: f32, interval: f32) -> Vec<f32> {
    if interval <= 0.0 || max_value <= min_value {
        return vec![];
    }

    // Start from first multiple of interval above min_value
    let start = (min_value / interval).ceil() * interval;
    let mut levels = Vec::new();

    let mut i = 0;
    loop {
        let level = start + i as f32 * interval;
        if level > max_value {
            break;
        }
        levels.push(level);
        i += 1;
    }

    levels
}

/// Round-number tick values spanning `[vmin, vmax]` in at most `nbins` bins.
///
/// Mirrors matplotlib's `MaxNLocator` with steps `[1, 2, 2.5, 5, 10]`.
pub fn nice_levels(vmin: f64, vmax: f64, nbins: usize) -> Vec<f64> {
    const STEPS: [f64; 10] = [0.1, 0.2, 0.25, 0.5, 1.0, 2.0, 2.5, 5.0, 10.0, 20.0];
    const TOLERANCE: f64 = 1e-10;

    let (vmin, vmax) = if vmin <= vmax { (vmin, vmax) } else { (vmax, vmin) };
    let nbins = nbins.max(1) as f64;
    let (scale, offset) = scale_range(vmin, vmax, nbins);
    let lo = vmin - offset;
    let hi = vmax - offset;
    let raw_step = (hi - lo) / nbins;

    let istep = STEPS
        .iter()
        .position(|s| s * scale >= raw_step)
        .unwrap_or(STEPS.len() - 1);

    let mut ticks = Vec::new();
    for &step in STEPS[..=istep].iter().rev() {
        let step = step * scale;
        let best_vmin = (lo / step).floor() * step;

        let (d, m) = div_mod(lo - best_vmin, step);
        let low = if (m / step - 1.0).abs() < TOLERANCE { d + 1.0 } else { d };
        let (d, m) = div_mod(hi - best_vmin, step);
        let high = if (m / step).abs() < TOLERANCE { d } else { d + 1.0 };

        ticks = ((low as i64)..=(high as i64))
            .map(|k| k as f64 * step + best_vmin)
            .collect();
        let inside = ticks.iter().filter(|t| **t >= lo && **t <= hi).count();
        if inside >= 1 {
            break;
        }
    }
    ticks.into_iter().map(|t| t + offset).collect()
}

fn div_mod(x: f64, step: f64) -> (f64, f64) {
    let d = (x / step).floor();
    (d, x - d * step)
}

fn scale_range(vmin: f64, vmax: f64, n: f64) -> (f64, f64) {
    let dv = (vmax - vmin).abs();
    let meanv = (vmax + vmin) / 2.0;
    let offset = if meanv.abs() / dv < 100.0 {
        0.0
    } else {
        10f64.powf(meanv.abs().log10().floor()).copysign(meanv)
    };
    let scale = 10f64.powf((dv / n).log10().floor());
    (scale, offset)
}

/// Contour level boundaries, strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Levels {
    bounds: Vec<f32>,
}

impl Levels {
    pub fn new(bounds: Vec<f32>) -> RenderResult<Self> {
        if bounds.len() < 2 {
            return Err(RenderError::InvalidLevels(
                "filled contours need at least two levels".to_string(),
            ));
        }
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(RenderError::InvalidLevels("levels must be finite".to_string()));
        }
        if bounds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RenderError::InvalidLevels("levels must be increasing".to_string()));
        }
        Ok(Self { bounds })
    }

    /// Resolve a [`LevelSpec`] against the data range `[min, max]`.
    pub fn from_spec(spec: &LevelSpec, min: f32, max: f32) -> RenderResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(RenderError::InvalidLevels("data range is not finite".to_string()));
        }
        let (mut lo, mut hi) = (min.min(max) as f64, min.max(max) as f64);
        if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
            // Constant field: open a small window around the value
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
            lo -= pad;
            hi += pad;
        }

        match spec {
            LevelSpec::Count(n) => {
                if *n == 0 {
                    return Err(RenderError::InvalidLevels("level count must be positive".to_string()));
                }
                let bounds = nice_levels(lo, hi, n + 1).into_iter().map(|v| v as f32).collect();
                Self::new(bounds)
            }
            LevelSpec::Explicit(bounds) => Self::new(bounds.clone()),
            LevelSpec::Interval { interval } => {
                if !(*interval > 0.0) {
                    return Err(RenderError::InvalidLevels("interval must be positive".to_string()));
                }
                let start = (lo as f32 / interval).floor() * interval;
                let end = (hi as f32 / interval).ceil() * interval;
                Self::new(generate_contour_levels(start, end + interval * 1e-3, *interval))
            }
        }
    }

    pub fn bounds(&self) -> &[f32] {
        &self.bounds
    }

    pub fn band_count(&self) -> usize {
        self.bounds.len() - 1
    }

    pub fn min(&self) -> f32 {
        self.bounds[0]
    }

    pub fn max(&self) -> f32 {
        self.bounds[self.bounds.len() - 1]
    }

    /// Band holding `value`: `[L_i, L_{i+1})`, with the top level included
    /// in the last band. `None` for NaN and values outside the levels.
    pub fn band_index(&self, value: f32) -> Option<usize> {
        if !(value >= self.min() && value <= self.max()) {
            return None;
        }
        let i = self.bounds.partition_point(|&b| b <= value);
        Some(i.saturating_sub(1).min(self.band_count() - 1))
    }

    /// Color of each band: the colormap at the band midpoint, normalized
    /// over the level range.
    pub fn band_colors(&self, cmap: &Colormap) -> Vec<Color> {
        let span = self.max() - self.min();
        self.bounds
            .windows(2)
            .map(|w| cmap.sample(((w[0] + w[1]) / 2.0 - self.min()) / span))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_contour_levels() {
        assert_eq!(generate_contour_levels(-3.0, 10.0, 5.0), vec![0.0, 5.0, 10.0]);
        assert!(generate_contour_levels(0.0, 10.0, 0.0).is_empty());
    }

    #[test]
    fn test_nice_levels_sst_range() {
        // Typical SST range gives 2-degree steps from -2 to 30
        let levels = nice_levels(-1.8, 29.7, 21);
        assert_eq!(levels.first().copied(), Some(-2.0));
        assert_eq!(levels.last().copied(), Some(30.0));
        let step = levels[1] - levels[0];
        assert!((step - 2.0).abs() < 1e-9, "step {}", step);
    }

    #[test]
    fn test_nice_levels_cover_range() {
        for &(lo, hi) in &[(0.0, 1.0), (0.013, 4.87), (271.2, 303.9), (-5e-4, 7e-4)] {
            let levels = nice_levels(lo, hi, 21);
            assert!(levels[0] <= lo && *levels.last().unwrap() >= hi, "{:?} for {}..{}", levels, lo, hi);
            assert!(levels.len() <= 23, "{} levels", levels.len());
        }
    }

    #[test]
    fn test_band_index() {
        let levels = Levels::new(vec![0.0, 1.0, 2.0]).unwrap();
        assert_eq!(levels.band_index(0.0), Some(0));
        assert_eq!(levels.band_index(0.99), Some(0));
        assert_eq!(levels.band_index(1.0), Some(1));
        assert_eq!(levels.band_index(2.0), Some(1));
        assert_eq!(levels.band_index(2.1), None);
        assert_eq!(levels.band_index(-0.1), None);
        assert_eq!(levels.band_index(f32::NAN), None);
    }

    #[test]
    fn test_invalid_levels() {
        assert!(Levels::new(vec![1.0]).is_err());
        assert!(Levels::new(vec![1.0, 1.0]).is_err());
        assert!(Levels::from_spec(&LevelSpec::Count(0), 0.0, 1.0).is_err());
        assert!(Levels::from_spec(&LevelSpec::Count(20), f32::NAN, 1.0).is_err());
    }

    #[test]
    fn test_constant_field_still_has_levels() {
        let levels = Levels::from_spec(&LevelSpec::Count(20), 0.0, 0.0).unwrap();
        assert!(levels.band_index(0.0).is_some());
    }

    #[test]
    fn test_interval_spec() {
        let levels = Levels::from_spec(&LevelSpec::Interval { interval: 5.0 }, -1.0, 12.0).unwrap();
        assert_eq!(levels.bounds(), &[-5.0, 0.0, 5.0, 10.0, 15.0]);
    }

    #[test]
    fn test_parse_level_spec() {
        assert_eq!("20".parse::<LevelSpec>().unwrap(), LevelSpec::Count(20));
        assert_eq!(
            "0, 1.5,3".parse::<LevelSpec>().unwrap(),
            LevelSpec::Explicit(vec![0.0, 1.5, 3.0])
        );
        assert_eq!(
            "interval=2.5".parse::<LevelSpec>().unwrap(),
            LevelSpec::Interval { interval: 2.5 }
        );
        assert!("many".parse::<LevelSpec>().is_err());
    }

    #[test]
    fn test_band_colors_use_midpoints() {
        let cmap = Colormap::from_name("gray").unwrap();
        let levels = Levels::new(vec![0.0, 1.0, 2.0]).unwrap();
        let colors = levels.band_colors(&cmap);
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[0], cmap.sample(0.25));
        assert_eq!(colors[1], cmap.sample(0.75));
    }
}
