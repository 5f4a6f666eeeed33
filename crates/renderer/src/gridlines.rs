//! Gridlines: axis ticks for grid plots and a labelled graticule for maps.

use projection::MapProjection;
use tracing::debug;

use crate::layout::ViewTransform;
use crate::levels::nice_levels;

/// Graticule spacings tried, in degrees.
const DEGREE_STEPS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 30.0, 45.0, 60.0];

/// Spacing of samples along graticule lines, in degrees.
const SAMPLE_STEP: f64 = 0.5;

/// Most lines wanted across the visible span.
const MAX_LINES: f64 = 6.0;

/// Smallest spacing giving at most six lines over `span` degrees.
pub fn nice_degree_step(span: f64) -> f64 {
    let span = span.abs();
    DEGREE_STEPS
        .iter()
        .copied()
        .find(|step| span / step <= MAX_LINES)
        .unwrap_or(60.0)
}

/// Tick positions inside `[min, max]`.
pub fn axis_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    let (lo, hi) = (min.min(max), min.max(max));
    let eps = (hi - lo) * 1e-9;
    nice_levels(lo, hi, max_ticks.max(1))
        .into_iter()
        .filter(|v| *v >= lo - eps && *v <= hi + eps)
        .collect()
}

/// Decimals needed to tell ticks `step` apart.
pub fn tick_decimals(step: f64) -> usize {
    if !(step > 0.0) {
        return 0;
    }
    let mut decimals = 0;
    let mut scaled = step;
    while decimals < 6 && (scaled - scaled.round()).abs() > 1e-6 * scaled.max(1.0) {
        scaled *= 10.0;
        decimals += 1;
    }
    decimals
}

/// Format a tick value with `decimals` places, without a negative zero.
pub fn format_tick(value: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, value);
    if s.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        s.trim_start_matches('-').to_string()
    } else {
        s
    }
}

fn format_degrees(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

/// `30°W`, `0°`, `180°`, `45°E`.
pub fn format_lon(lon: f64) -> String {
    let lon = foci_common::grid::normalize_longitude(lon);
    let abs = lon.abs();
    if abs < 1e-9 {
        "0°".to_string()
    } else if (abs - 180.0).abs() < 1e-9 {
        "180°".to_string()
    } else if lon < 0.0 {
        format!("{}°W", format_degrees(abs))
    } else {
        format!("{}°E", format_degrees(abs))
    }
}

/// `45°N`, `0°`, `60°S`.
pub fn format_lat(lat: f64) -> String {
    if lat.abs() < 1e-9 {
        "0°".to_string()
    } else if lat < 0.0 {
        format!("{}°S", format_degrees(-lat))
    } else {
        format!("{}°N", format_degrees(lat))
    }
}

/// A label where a graticule line leaves the axes.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Projected meridians and parallels in pixel coordinates.
#[derive(Debug, Clone, Default)]
pub struct Graticule {
    pub lines: Vec<Vec<(f32, f32)>>,
    /// Meridian labels along the bottom edge
    pub bottom_labels: Vec<EdgeLabel>,
    /// Parallel labels along the left edge
    pub left_labels: Vec<EdgeLabel>,
    pub lon_step: f64,
    pub lat_step: f64,
}

impl Graticule {
    /// Build the graticule. Steps are chosen from the visible `lon_span`
    /// and `lat_span`; lines cover the globe and rely on clipping.
    /// Labels closer than `min_spacing` pixels to the previous one on the
    /// same edge are dropped.
    pub fn build(
        proj: &dyn MapProjection,
        view: &ViewTransform,
        lon_span: f64,
        lat_span: f64,
        min_spacing: f32,
    ) -> Self {
        let lon_step = nice_degree_step(lon_span);
        let lat_step = nice_degree_step(lat_span);
        let max_jump = view.rect.w / 2.0;
        let mut graticule = Graticule {
            lon_step,
            lat_step,
            ..Graticule::default()
        };

        let lat_samples = sample_range(-90.0, 90.0);
        let lon_samples = sample_range(-180.0, 180.0);
        let bottom = view.rect.bottom();
        let left = view.rect.x;

        let k0 = (-180.0 / lon_step).ceil() as i64;
        let k1 = (180.0 / lon_step).floor() as i64;
        for k in k0..=k1 {
            let lon = k as f64 * lon_step;
            // -180 and 180 are the same meridian
            if k > k0 && (lon - 180.0).abs() < 1e-9 && (k0 as f64 * lon_step + 180.0).abs() < 1e-9 {
                continue;
            }
            let pieces = project_line(proj, view, lat_samples.iter().map(|&lat| (lon, lat)), max_jump);
            if let Some(x) = pieces.iter().find_map(|p| crossing(p, Axis::Y, bottom)) {
                if x >= view.rect.x && x <= view.rect.right() {
                    push_spaced(&mut graticule.bottom_labels, format_lon(lon), x, bottom, min_spacing, Axis::X);
                }
            }
            graticule.lines.extend(pieces);
        }

        let j0 = (-90.0 / lat_step).ceil() as i64;
        let j1 = (90.0 / lat_step).floor() as i64;
        for j in j0..=j1 {
            let lat = j as f64 * lat_step;
            if lat.abs() >= 90.0 {
                continue;
            }
            let pieces = project_line(proj, view, lon_samples.iter().map(|&lon| (lon, lat)), max_jump);
            if let Some(y) = pieces.iter().find_map(|p| crossing(p, Axis::X, left)) {
                if y >= view.rect.y && y <= view.rect.bottom() {
                    push_spaced(&mut graticule.left_labels, format_lat(lat), left, y, min_spacing, Axis::Y);
                }
            }
            graticule.lines.extend(pieces);
        }

        if graticule.bottom_labels.is_empty() && graticule.left_labels.is_empty() {
            debug!(projection = proj.name(), "No graticule line crosses a labelled edge, drawing without labels");
        }
        graticule
    }

    pub fn has_labels(&self) -> bool {
        !self.bottom_labels.is_empty() || !self.left_labels.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

fn sample_range(from: f64, to: f64) -> Vec<f64> {
    let n = ((to - from) / SAMPLE_STEP).round() as usize;
    (0..=n).map(|i| from + i as f64 * SAMPLE_STEP).collect()
}

/// Project a sampled line, splitting it where points vanish or jump across
/// the projection seam.
pub(crate) fn project_line<I>(proj: &dyn MapProjection, view: &ViewTransform, samples: I, max_jump: f32) -> Vec<Vec<(f32, f32)>>
where
    I: Iterator<Item = (f64, f64)>,
{
    let mut pieces = Vec::new();
    let mut current: Vec<(f32, f32)> = Vec::new();
    for (lon, lat) in samples {
        match proj.forward(lon, lat) {
            Some((x, y)) => {
                let p = view.to_pixel(x, y);
                if let Some(&(px, py)) = current.last() {
                    if (p.0 - px).abs() > max_jump || (p.1 - py).abs() > max_jump * 2.0 {
                        pieces.push(std::mem::take(&mut current));
                    }
                }
                current.push(p);
            }
            None => {
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                }
            }
        }
    }
    pieces.push(current);
    pieces.retain(|p| p.len() >= 2);
    pieces
}

/// Where a polyline crosses the line `axis = at`: the other coordinate.
fn crossing(points: &[(f32, f32)], axis: Axis, at: f32) -> Option<f32> {
    let coord = |p: &(f32, f32)| match axis {
        Axis::X => p.0,
        Axis::Y => p.1,
    };
    let other = |p: &(f32, f32)| match axis {
        Axis::X => p.1,
        Axis::Y => p.0,
    };
    points.windows(2).find_map(|w| {
        let (a, b) = (coord(&w[0]) - at, coord(&w[1]) - at);
        if a == b || a * b > 0.0 {
            return None;
        }
        let t = a / (a - b);
        Some(other(&w[0]) + (other(&w[1]) - other(&w[0])) * t)
    })
}

fn push_spaced(labels: &mut Vec<EdgeLabel>, text: String, x: f32, y: f32, min_spacing: f32, along: Axis) {
    let pos = |l: &EdgeLabel| match along {
        Axis::X => l.x,
        Axis::Y => l.y,
    };
    let candidate = EdgeLabel { text, x, y };
    if labels.iter().any(|l| (pos(l) - pos(&candidate)).abs() < min_spacing) {
        return;
    }
    labels.push(candidate);
}
