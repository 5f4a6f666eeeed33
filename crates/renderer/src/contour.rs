//! Iso-line extraction using the marching squares algorithm.
//!
//! Coordinates are in grid index space: `x` is the column and `y` the row,
//! so a point can be mapped to lon/lat through the grid and then projected.
//! Plots use this for coastlines, which are the 0.5 iso-line of the
//! land/ocean validity mask.

use std::collections::HashMap;

/// A point in grid index space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Marching squares algorithm to generate contour lines
///
/// # Arguments
/// * `data` - Grid data in row-major order
/// * `width` - Grid width
/// * `height` - Grid height
/// * `level` - Contour level to extract
///
/// # Returns
/// Vector of line segments representing the contour
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            // Skip cells with NaN values
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            // Calculate cell index (0-15) based on which corners are above the threshold
            let mut cell_index = 0;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            segments.extend(get_cell_segments(
                cell_index, x as f32, y as f32, tl, tr, br, bl, level,
            ));
        }
    }

    segments
}

/// Get line segments for a marching squares cell
///
/// Uses linear interpolation to find where the contour crosses cell edges
#[allow(clippy::too_many_arguments)]
fn get_cell_segments(
    cell_index: u8,
    x: f32,
    y: f32,
    tl: f32,
    tr: f32,
    br: f32,
    bl: f32,
    level: f32,
) -> Vec<Segment> {
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![Segment { start: left, end: top }],
        2 | 13 => vec![Segment { start: top, end: right }],
        3 | 12 => vec![Segment { start: left, end: right }],
        4 | 11 => vec![Segment { start: right, end: bottom }],
        // Saddles are disambiguated by the cell centre value
        5 => {
            if (tl + tr + br + bl) / 4.0 >= level {
                vec![Segment { start: left, end: bottom }, Segment { start: top, end: right }]
            } else {
                vec![Segment { start: left, end: top }, Segment { start: right, end: bottom }]
            }
        }
        6 | 9 => vec![Segment { start: top, end: bottom }],
        7 | 8 => vec![Segment { start: left, end: bottom }],
        10 => {
            if (tl + tr + br + bl) / 4.0 >= level {
                vec![Segment { start: left, end: top }, Segment { start: right, end: bottom }]
            } else {
                vec![Segment { start: top, end: right }, Segment { start: left, end: bottom }]
            }
        }
        _ => vec![],
    }
}

/// Linearly interpolate between two edge points based on data values
fn interpolate_edge(x1: f32, y1: f32, x2: f32, y2: f32, val1: f32, val2: f32, level: f32) -> Point {
    if (val2 - val1).abs() < 1e-6 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);

    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Endpoint key with ~1e-3 tolerance, matching the old linear scan.
fn point_key(p: Point) -> (i64, i64) {
    ((p.x * 1000.0).round() as i64, (p.y * 1000.0).round() as i64)
}

/// Connect line segments into continuous polylines
///
/// Segments sharing an endpoint are chained. Endpoints are indexed in a
/// hash map so large grids stay linear in the number of segments.
pub fn connect_segments(segments: Vec<Segment>) -> Vec<Contour> {
    if segments.is_empty() {
        return vec![];
    }

    let mut by_point: HashMap<(i64, i64), Vec<usize>> = HashMap::with_capacity(segments.len() * 2);
    for (i, seg) in segments.iter().enumerate() {
        by_point.entry(point_key(seg.start)).or_default().push(i);
        by_point.entry(point_key(seg.end)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    // Next unused segment touching `p`, with the point at its other end
    let next_from = |p: Point, used: &[bool]| -> Option<(usize, Point)> {
        let key = point_key(p);
        by_point.get(&key)?.iter().find(|&&i| !used[i]).map(|&i| {
            let seg = &segments[i];
            if point_key(seg.start) == key {
                (i, seg.end)
            } else {
                (i, seg.start)
            }
        })
    };

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let mut points = vec![segments[start_idx].start, segments[start_idx].end];

        // Extend forward from the end, then backward from the start
        let mut tail = segments[start_idx].end;
        while let Some((i, p)) = next_from(tail, &used) {
            used[i] = true;
            points.push(p);
            tail = p;
        }
        let mut head = segments[start_idx].start;
        let mut prefix = Vec::new();
        while let Some((i, p)) = next_from(head, &used) {
            used[i] = true;
            prefix.push(p);
            head = p;
        }
        if !prefix.is_empty() {
            prefix.reverse();
            prefix.extend(points);
            points = prefix;
        }

        let closed = points.len() > 2 && point_key(points[0]) == point_key(points[points.len() - 1]);
        contours.push(Contour {
            level: 0.0, // Level will be set by caller
            points,
            closed,
        });
    }

    contours
}

/// Apply Chaikin's corner cutting algorithm for smoothing
pub fn smooth_contour(contour: &Contour, iterations: u32) -> Contour {
    if iterations == 0 || contour.points.len() < 3 {
        return contour.clone();
    }

    let mut points = contour.points.clone();

    for _ in 0..iterations {
        let mut new_points = Vec::with_capacity(points.len() * 2);

        for i in 0..points.len() {
            let p1 = points[i];
            let p2 = if contour.closed {
                points[(i + 1) % points.len()]
            } else if i + 1 < points.len() {
                points[i + 1]
            } else {
                break;
            };

            // Create two new points: 25% and 75% along the segment
            new_points.push(Point::new(0.75 * p1.x + 0.25 * p2.x, 0.75 * p1.y + 0.25 * p2.y));
            new_points.push(Point::new(0.25 * p1.x + 0.75 * p2.x, 0.25 * p1.y + 0.75 * p2.y));
        }

        // If not closed, keep the endpoints
        if !contour.closed {
            new_points.insert(0, points[0]);
            new_points.push(points[points.len() - 1]);
        }

        points = new_points;
    }

    Contour {
        level: contour.level,
        points,
        closed: contour.closed,
    }
}

/// Outline of the valid (non-NaN) region of a field.
///
/// Valid nodes count as 1 and masked nodes as 0; the result is the 0.5
/// iso-line, i.e. the coastline when land is masked.
pub fn validity_outline(values: &[f32], width: usize, height: usize, smoothing_passes: u32) -> Vec<Contour> {
    let mask: Vec<f32> = values.iter().map(|v| if v.is_nan() { 0.0 } else { 1.0 }).collect();
    connect_segments(march_squares(&mask, width, height, 0.5))
        .iter()
        .map(|c| {
            let mut smoothed = smooth_contour(c, smoothing_passes);
            smoothed.level = 0.5;
            smoothed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_masked_node_gives_closed_ring() {
        let mut values = vec![1.0f32; 9];
        values[4] = f32::NAN;
        let outline = validity_outline(&values, 3, 3, 0);
        assert_eq!(outline.len(), 1);
        assert!(outline[0].closed);
        // Ring around (1, 1) at half a cell
        for p in &outline[0].points {
            assert!((p.x - 1.0).abs() <= 0.5 + 1e-6 && (p.y - 1.0).abs() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn test_no_mask_no_outline() {
        assert!(validity_outline(&[1.0; 16], 4, 4, 1).is_empty());
    }
}
