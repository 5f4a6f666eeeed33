//! Contour-fill rasterisation.
//!
//! Both modes colour each pixel by the band its interpolated value falls
//! in, which gives the same picture as filled iso-bands without building
//! polygons.
//!
//! * [`GridSampler`] works on the plain lon/lat axes of the grid. The
//!   per-pixel cell lookup is computed once and reused for every frame.
//! * [`MapMesh`] projects every grid node once. Per frame each valid cell is
//!   split into two triangles and rasterised with barycentric weights.

use foci_common::grid::unwrap_longitude;
use foci_common::{BoundingBox, CurvilinearGrid};
use projection::MapProjection;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::canvas::Canvas;
use crate::colormap::Color;
use crate::error::{RenderError, RenderResult};
use crate::layout::ViewTransform;
use crate::levels::Levels;

/// Slack on barycentric weights so shared triangle edges leave no cracks.
const EDGE_EPSILON: f32 = 1e-4;

fn check_values(values: &[f32], rows: usize, cols: usize) -> RenderResult<()> {
    if values.len() != rows * cols {
        return Err(RenderError::DataMismatch(format!(
            "{} values for a {}x{} grid",
            values.len(),
            rows,
            cols
        )));
    }
    Ok(())
}

fn check_grid(grid: &CurvilinearGrid) -> RenderResult<()> {
    if grid.rows() < 2 || grid.cols() < 2 {
        return Err(RenderError::UnsupportedGrid(format!(
            "need at least 2x2 nodes to fill contours, got {}x{}",
            grid.rows(),
            grid.cols()
        )));
    }
    Ok(())
}

// =============================================================================
// Grid mode
// =============================================================================

/// Position of a pixel inside the grid: top-left node plus fractions.
#[derive(Debug, Clone, Copy)]
struct CellSample {
    row: u32,
    col: u32,
    fy: f32,
    fx: f32,
}

impl CellSample {
    /// Bilinear value, `None` if any corner is missing.
    #[inline]
    fn value(&self, values: &[f32], cols: usize) -> Option<f32> {
        let i = self.row as usize * cols + self.col as usize;
        let (v00, v01, v10, v11) = (values[i], values[i + 1], values[i + cols], values[i + cols + 1]);
        if v00.is_nan() || v01.is_nan() || v10.is_nan() || v11.is_nan() {
            return None;
        }
        let top = v00 + (v01 - v00) * self.fx;
        let bottom = v10 + (v11 - v10) * self.fx;
        Some(top + (bottom - top) * self.fy)
    }
}

/// Longitudes of row 0 (unwrapped) and latitudes of column 0.
///
/// An axis that is not monotonic cannot be searched; it is replaced by a
/// straight line between its end values so the plot still shows the data.
pub fn grid_axes(grid: &CurvilinearGrid) -> (Vec<f64>, Vec<f64>) {
    let mut lon = grid.row_longitudes();
    let mut previous = None;
    for v in lon.iter_mut().filter(|v| v.is_finite()) {
        if let Some(p) = previous {
            *v = unwrap_longitude(*v, p);
        }
        previous = Some(*v);
    }
    let lat = grid.column_latitudes();
    (straighten("longitude", lon), straighten("latitude", lat))
}

fn straighten(name: &str, axis: Vec<f64>) -> Vec<f64> {
    let increasing = axis.windows(2).all(|w| w[1] > w[0]);
    let decreasing = axis.windows(2).all(|w| w[1] < w[0]);
    if increasing || decreasing || axis.len() < 2 {
        return axis;
    }
    warn!(axis = name, "Grid axis is not monotonic, spacing it evenly between its end values");
    let (first, last) = (axis[0], axis[axis.len() - 1]);
    let n = (axis.len() - 1) as f64;
    (0..axis.len()).map(|i| first + (last - first) * i as f64 / n).collect()
}

/// Extent of the grid-mode axes in degrees.
pub fn grid_extent(grid: &CurvilinearGrid) -> RenderResult<BoundingBox> {
    check_grid(grid)?;
    let (lon, lat) = grid_axes(grid);
    let (lon0, lon1) = (lon[0], lon[lon.len() - 1]);
    let (lat0, lat1) = (lat[0], lat[lat.len() - 1]);
    let extent = BoundingBox::new(lon0.min(lon1), lat0.min(lat1), lon0.max(lon1), lat0.max(lat1));
    if !(extent.width() > 0.0 && extent.height() > 0.0) {
        return Err(RenderError::UnsupportedGrid(
            "grid axes do not span an area, try a map projection".to_string(),
        ));
    }
    Ok(extent)
}

/// Fractional index of `v` along a monotonic axis.
pub fn fractional_index(axis: &[f64], v: f64) -> Option<f64> {
    let n = axis.len();
    if n < 2 || !v.is_finite() {
        return None;
    }
    let sign = if axis[n - 1] >= axis[0] { 1.0 } else { -1.0 };
    let key = v * sign;
    if key < axis[0] * sign || key > axis[n - 1] * sign {
        return None;
    }
    let upper = axis.partition_point(|&a| a * sign <= key);
    let i = upper.saturating_sub(1).min(n - 2);
    let (a0, a1) = (axis[i] * sign, axis[i + 1] * sign);
    let frac = if a1 > a0 { (key - a0) / (a1 - a0) } else { 0.0 };
    Some(i as f64 + frac.clamp(0.0, 1.0))
}

/// Pixel-to-cell lookup for plotting a grid on its own lon/lat axes.
#[derive(Debug, Clone)]
pub struct GridSampler {
    rows: usize,
    cols: usize,
    x0: usize,
    y0: usize,
    span_w: usize,
    span_h: usize,
    samples: Vec<Option<CellSample>>,
}

impl GridSampler {
    pub fn new(grid: &CurvilinearGrid, view: &ViewTransform, width: u32, height: u32) -> RenderResult<Self> {
        check_grid(grid)?;
        let (lon_axis, lat_axis) = grid_axes(grid);
        let (rows, cols) = grid.shape();
        let (x0, x1, y0, y1) = view.rect.pixel_span(width, height);
        let (span_w, span_h) = (x1 - x0, y1 - y0);

        let samples: Vec<Option<CellSample>> = (0..span_h)
            .into_par_iter()
            .flat_map_iter(|dy| {
                let py = (y0 + dy) as f32 + 0.5;
                let row = {
                    let (_, lat) = view.to_data(0.0, py);
                    fractional_index(&lat_axis, lat)
                };
                let lon_axis = &lon_axis;
                (0..span_w).map(move |dx| {
                    let row = row?;
                    let (lon, _) = view.to_data((x0 + dx) as f32 + 0.5, py);
                    let col = fractional_index(lon_axis, lon)?;
                    let r = (row.floor() as usize).min(rows - 2);
                    let c = (col.floor() as usize).min(cols - 2);
                    Some(CellSample {
                        row: r as u32,
                        col: c as u32,
                        fy: (row - r as f64) as f32,
                        fx: (col - c as f64) as f32,
                    })
                })
            })
            .collect();

        debug!(
            rows,
            cols,
            pixels = samples.len(),
            covered = samples.iter().filter(|s| s.is_some()).count(),
            "Built grid sampler"
        );

        Ok(Self {
            rows,
            cols,
            x0,
            y0,
            span_w,
            span_h,
            samples,
        })
    }

    /// Interpolated value under pixel `(px, py)`.
    pub fn sample(&self, values: &[f32], px: usize, py: usize) -> Option<f32> {
        if px < self.x0 || py < self.y0 || px >= self.x0 + self.span_w || py >= self.y0 + self.span_h {
            return None;
        }
        let s = self.samples[(py - self.y0) * self.span_w + (px - self.x0)]?;
        s.value(values, self.cols)
    }

    /// Paint every pixel whose value falls inside the levels.
    pub fn fill(&self, canvas: &mut Canvas, values: &[f32], levels: &Levels, colors: &[Color]) -> RenderResult<()> {
        check_values(values, self.rows, self.cols)?;
        let stride = canvas.width() as usize * 4;
        let (x0, y0, span_w) = (self.x0, self.y0, self.span_w);

        canvas
            .data_mut()
            .par_chunks_mut(stride)
            .enumerate()
            .skip(y0)
            .take(self.span_h)
            .for_each(|(py, line)| {
                let samples = &self.samples[(py - y0) * span_w..(py - y0 + 1) * span_w];
                for (dx, sample) in samples.iter().enumerate() {
                    let Some(v) = sample.and_then(|s| s.value(values, self.cols)) else {
                        continue;
                    };
                    if let Some(band) = levels.band_index(v) {
                        let offset = (x0 + dx) * 4;
                        line[offset..offset + 4].copy_from_slice(&colors[band].to_array());
                    }
                }
            });
        Ok(())
    }
}

// =============================================================================
// Map mode
// =============================================================================

/// Bounding box of every projectable grid node, in projected units.
pub fn projected_extent(grid: &CurvilinearGrid, proj: &dyn MapProjection) -> Option<BoundingBox> {
    BoundingBox::from_points(
        grid.longitudes()
            .iter()
            .zip(grid.latitudes())
            .filter_map(|(&lon, &lat)| proj.forward(lon, lat)),
    )
}

/// A grid projected to pixels, with the cells that can be drawn.
#[derive(Debug, Clone)]
pub struct MapMesh {
    rows: usize,
    cols: usize,
    nodes: Vec<Option<(f32, f32)>>,
    /// Top-left node index of each drawable cell
    cells: Vec<usize>,
}

impl MapMesh {
    /// Project the grid. Cells with a corner that does not project, or
    /// wider than half the projection domain (wrapping across the seam),
    /// are dropped.
    pub fn new(grid: &CurvilinearGrid, proj: &dyn MapProjection, view: &ViewTransform) -> RenderResult<Self> {
        check_grid(grid)?;
        let (rows, cols) = grid.shape();
        let projected: Vec<Option<(f64, f64)>> = grid
            .longitudes()
            .par_iter()
            .zip(grid.latitudes().par_iter())
            .map(|(&lon, &lat)| proj.forward(lon, lat))
            .collect();
        let max_width = proj.domain().width() / 2.0;

        let mut cells = Vec::with_capacity((rows - 1) * (cols - 1));
        let mut seam = 0usize;
        for r in 0..rows - 1 {
            for c in 0..cols - 1 {
                let i = r * cols + c;
                let corners = [projected[i], projected[i + 1], projected[i + cols], projected[i + cols + 1]];
                let Some(xs) = corners.iter().map(|p| p.map(|(x, _)| x)).collect::<Option<Vec<f64>>>() else {
                    continue;
                };
                let (lo, hi) = xs.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
                if hi - lo > max_width {
                    seam += 1;
                    continue;
                }
                cells.push(i);
            }
        }

        let nodes = projected
            .into_iter()
            .map(|p| p.map(|(x, y)| view.to_pixel(x, y)))
            .collect();

        debug!(
            projection = proj.name(),
            cells = cells.len(),
            seam_cells = seam,
            "Projected grid mesh"
        );

        Ok(Self { rows, cols, nodes, cells })
    }

    pub fn drawable_cells(&self) -> usize {
        self.cells.len()
    }

    /// Pixel position of a node, if it projects.
    pub fn node(&self, row: usize, col: usize) -> Option<(f32, f32)> {
        self.nodes.get(row * self.cols + col).copied().flatten()
    }

    /// Fill the frame. Cells with a missing corner are painted with `land`
    /// (when given) underneath the data.
    pub fn fill(
        &self,
        canvas: &mut Canvas,
        values: &[f32],
        levels: &Levels,
        colors: &[Color],
        land: Option<Color>,
        clip: (usize, usize, usize, usize),
    ) -> RenderResult<()> {
        check_values(values, self.rows, self.cols)?;
        let cols = self.cols;
        let quad = |i: usize| [i, i + 1, i + cols + 1, i + cols];

        if let Some(land) = land {
            for &i in &self.cells {
                let idx = quad(i);
                if idx.iter().all(|&k| !values[k].is_nan()) {
                    continue;
                }
                let corners: Vec<(f32, f32)> = idx.iter().filter_map(|&k| self.nodes[k]).collect();
                canvas.fill_polygon(&corners, land);
            }
        }

        let width = canvas.width() as usize;
        let buf = canvas.data_mut();
        for &i in &self.cells {
            let [tl, tr, br, bl] = quad(i);
            let v = [values[tl], values[tr], values[br], values[bl]];
            if v.iter().any(|x| x.is_nan()) {
                continue;
            }
            let (Some(ptl), Some(ptr), Some(pbr), Some(pbl)) =
                (self.nodes[tl], self.nodes[tr], self.nodes[br], self.nodes[bl])
            else {
                continue;
            };
            let target = Target { buf: &mut *buf, width, clip };
            fill_triangle(target, [ptl, ptr, pbr], [v[0], v[1], v[2]], levels, colors);
            let target = Target { buf: &mut *buf, width, clip };
            fill_triangle(target, [ptl, pbr, pbl], [v[0], v[2], v[3]], levels, colors);
        }
        Ok(())
    }
}

/// Pixel buffer plus the clip span `(x0, x1, y0, y1)`, end-exclusive.
pub struct Target<'a> {
    pub buf: &'a mut [u8],
    pub width: usize,
    pub clip: (usize, usize, usize, usize),
}

#[inline]
fn edge(a: (f32, f32), b: (f32, f32), px: f32, py: f32) -> f32 {
    (b.0 - a.0) * (py - a.1) - (b.1 - a.1) * (px - a.0)
}

/// Rasterise one triangle, interpolating `v` across it.
pub fn fill_triangle(target: Target<'_>, p: [(f32, f32); 3], v: [f32; 3], levels: &Levels, colors: &[Color]) {
    let area = edge(p[0], p[1], p[2].0, p[2].1);
    if area.abs() < 1e-6 || !area.is_finite() {
        return;
    }
    let (cx0, cx1, cy0, cy1) = target.clip;
    let min_x = p.iter().map(|q| q.0).fold(f32::INFINITY, f32::min).floor().max(cx0 as f32) as usize;
    let max_x = p.iter().map(|q| q.0).fold(f32::NEG_INFINITY, f32::max).ceil().min(cx1 as f32) as usize;
    let min_y = p.iter().map(|q| q.1).fold(f32::INFINITY, f32::min).floor().max(cy0 as f32) as usize;
    let max_y = p.iter().map(|q| q.1).fold(f32::NEG_INFINITY, f32::max).ceil().min(cy1 as f32) as usize;

    for py in min_y..max_y {
        let fy = py as f32 + 0.5;
        for px in min_x..max_x {
            let fx = px as f32 + 0.5;
            let w0 = edge(p[1], p[2], fx, fy) / area;
            let w1 = edge(p[2], p[0], fx, fy) / area;
            let w2 = 1.0 - w0 - w1;
            if w0 < -EDGE_EPSILON || w1 < -EDGE_EPSILON || w2 < -EDGE_EPSILON {
                continue;
            }
            let value = w0 * v[0] + w1 * v[1] + w2 * v[2];
            if let Some(band) = levels.band_index(value) {
                let offset = (py * target.width + px) * 4;
                target.buf[offset..offset + 4].copy_from_slice(&colors[band].to_array());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::Colormap;
    use crate::layout::Rect;
    use projection::Projection;

    fn levels() -> (Levels, Vec<Color>) {
        let levels = Levels::new(vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let colors = levels.band_colors(&Colormap::default());
        (levels, colors)
    }

    #[test]
    fn test_fractional_index() {
        let up = [0.0, 1.0, 3.0];
        assert_eq!(fractional_index(&up, 0.0), Some(0.0));
        assert_eq!(fractional_index(&up, 2.0), Some(1.5));
        assert_eq!(fractional_index(&up, 3.0), Some(2.0));
        assert_eq!(fractional_index(&up, 3.5), None);
        let down = [80.0, 60.0, 40.0];
        assert_eq!(fractional_index(&down, 70.0), Some(0.5));
        assert_eq!(fractional_index(&down, 30.0), None);
    }

    #[test]
    fn test_axes_unwrap_dateline() {
        let grid = CurvilinearGrid::from_axes(&[0.0, 10.0], &[170.0, 180.0, -170.0]).unwrap();
        let (lon, _) = grid_axes(&grid);
        assert_eq!(lon, vec![170.0, 180.0, 190.0]);
    }

    #[test]
    fn test_axes_with_fill_longitude() {
        let grid = CurvilinearGrid::from_axes(&[0.0, 1.0], &[0.0, 1e20, 2.0]).unwrap();
        let (lon, _) = grid_axes(&grid);
        assert_eq!(lon.len(), 3);
        assert!(lon.iter().all(|v| v.is_finite()));

        let grid = CurvilinearGrid::from_axes(&[0.0, 1.0], &[0.0, f64::NAN, 2.0]).unwrap();
        let (lon, _) = grid_axes(&grid);
        assert_eq!(lon, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_grid_fill_band_and_mask() {
        // 3x3 nodes, values rise to the east
        let grid = CurvilinearGrid::from_axes(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]).unwrap();
        let mut values = vec![0.5, 1.5, 2.5, 0.5, 1.5, 2.5, 0.5, 1.5, 2.5];
        let view = ViewTransform::new(grid_extent(&grid).unwrap(), Rect::new(0.0, 0.0, 20.0, 20.0)).unwrap();
        let sampler = GridSampler::new(&grid, &view, 20, 20).unwrap();
        let (levels, colors) = levels();

        let mut canvas = Canvas::new(20, 20).unwrap();
        canvas.clear(Color::WHITE);
        sampler.fill(&mut canvas, &values, &levels, &colors).unwrap();
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(0, 10).0, colors[0].to_array());
        assert_eq!(img.get_pixel(19, 10).0, colors[2].to_array());

        // Masking the centre node blanks every cell touching it
        values[4] = f32::NAN;
        let mut canvas = Canvas::new(20, 20).unwrap();
        canvas.clear(Color::WHITE);
        sampler.fill(&mut canvas, &values, &levels, &colors).unwrap();
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
        assert!(sampler.sample(&values, 10, 10).is_none());
    }

    #[test]
    fn test_fill_rejects_wrong_length() {
        let grid = CurvilinearGrid::from_axes(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        let view = ViewTransform::new(grid_extent(&grid).unwrap(), Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        let sampler = GridSampler::new(&grid, &view, 4, 4).unwrap();
        let (levels, colors) = levels();
        let mut canvas = Canvas::new(4, 4).unwrap();
        assert!(matches!(
            sampler.fill(&mut canvas, &[1.0; 3], &levels, &colors),
            Err(RenderError::DataMismatch(_))
        ));
    }

    #[test]
    fn test_map_mesh_drops_seam_cells() {
        let grid = CurvilinearGrid::from_axes(&[0.0, 10.0], &[160.0, 175.0, -170.0]).unwrap();
        let proj = Projection::default();
        let extent = projected_extent(&grid, &proj).unwrap();
        let view = ViewTransform::new(extent, Rect::new(0.0, 0.0, 100.0, 50.0)).unwrap();
        let mesh = MapMesh::new(&grid, &proj, &view).unwrap();
        // The cell from 175 to -170 wraps around the whole map
        assert_eq!(mesh.drawable_cells(), 1);
    }

    #[test]
    fn test_map_fill_with_land() {
        let grid = CurvilinearGrid::from_axes(&[0.0, 10.0, 20.0], &[0.0, 10.0, 20.0]).unwrap();
        let proj = Projection::default();
        let view = ViewTransform::new(
            projected_extent(&grid, &proj).unwrap(),
            Rect::new(0.0, 0.0, 40.0, 40.0),
        )
        .unwrap();
        let mesh = MapMesh::new(&grid, &proj, &view).unwrap();
        let (levels, colors) = levels();
        let land = Color::rgb(0xB1, 0xB2, 0xB4);

        // Row 2 is the northern row, so its first node sits top-left on screen
        let mut values = vec![1.5; 9];
        values[6] = f32::NAN;
        let mut canvas = Canvas::new(40, 40).unwrap();
        canvas.clear(Color::WHITE);
        mesh.fill(&mut canvas, &values, &levels, &colors, Some(land), (0, 40, 0, 40)).unwrap();
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(5, 5).0, land.to_array());
        assert_eq!(img.get_pixel(30, 30).0, colors[1].to_array());
    }

    #[test]
    fn test_triangle_respects_clip() {
        let (levels, colors) = levels();
        let mut buf = vec![0u8; 10 * 10 * 4];
        let target = Target { buf: &mut buf, width: 10, clip: (0, 5, 0, 10) };
        fill_triangle(target, [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)], [0.5; 3], &levels, &colors);
        let px = |x: usize, y: usize| &buf[(y * 10 + x) * 4..(y * 10 + x) * 4 + 4];
        assert_eq!(px(1, 1), &colors[0].to_array());
        assert_eq!(px(7, 1), &[0, 0, 0, 0]);
    }
}
