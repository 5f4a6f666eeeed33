//! Complete figures: filled contours, decorations, colorbar and title.
//!
//! A plot is built once per animation. Everything that only depends on
//! the grid (pixel lookups, projected mesh, graticule, ticks) is computed
//! in the constructor; [`FramePlot::render`] then only fills the frame.

use foci_common::CurvilinearGrid;
use image::RgbaImage;
use projection::{MapProjection, Projection};
use tracing::{debug, info};

use crate::canvas::Canvas;
use crate::colorbar::Colorbar;
use crate::colormap::Color;
use crate::contour::validity_outline;
use crate::error::{RenderError, RenderResult};
use crate::fill::{grid_extent, projected_extent, GridSampler, MapMesh};
use crate::gridlines::{axis_ticks, format_tick, project_line, tick_decimals, Graticule};
use crate::layout::{FigureSize, Layout, ViewTransform};
use crate::levels::Levels;
use crate::style::{PlotStyle, ResolvedStyle};
use crate::text::{HAlign, TextItem, TextRenderer, VAlign};

/// Pixels per axis tick in grid mode.
const PIXELS_PER_TICK: f32 = 60.0;
const MAX_AXIS_TICKS: usize = 9;

/// Anything that turns one time slice into an image.
pub trait FramePlot: Send + Sync {
    /// Image size in pixels.
    fn size(&self) -> (u32, u32);

    /// Render one slice of `rows * cols` values.
    fn render(&self, values: &[f32], levels: &Levels, title: &str) -> RenderResult<RgbaImage>;
}

/// Build a grid plot, or a map plot when a projection is given.
pub fn build_plot(
    grid: &CurvilinearGrid,
    projection: Option<Projection>,
    label: &str,
    style: &PlotStyle,
    text: TextRenderer,
) -> RenderResult<Box<dyn FramePlot>> {
    Ok(match projection {
        None => Box::new(GridPlot::new(grid, label, style, text)?),
        Some(proj) => Box::new(MapPlot::new(grid, proj, label, style, text)?),
    })
}

/// Parts shared by both plot kinds.
struct Frame {
    layout: Layout,
    style: PlotStyle,
    resolved: ResolvedStyle,
    text: TextRenderer,
    label: String,
}

impl Frame {
    fn new(layout: Layout, style: &PlotStyle, text: TextRenderer, label: &str) -> RenderResult<Self> {
        Ok(Self {
            layout,
            style: style.clone(),
            resolved: style.resolve()?,
            text,
            label: label.to_string(),
        })
    }

    fn font_px(&self) -> f32 {
        self.layout.size.pt(self.style.font_size)
    }

    fn line_px(&self, points: f32) -> f32 {
        self.layout.size.pt(points).max(0.5)
    }

    fn canvas(&self) -> RenderResult<Canvas> {
        let mut canvas = Canvas::new(self.layout.width, self.layout.height)?;
        canvas.clear(Color::WHITE);
        Ok(canvas)
    }

    fn axes_span(&self) -> (usize, usize, usize, usize) {
        self.layout.axes.pixel_span(self.layout.width, self.layout.height)
    }

    /// Axes frame, colorbar and title, then all text.
    fn finish(
        &self,
        mut canvas: Canvas,
        levels: &Levels,
        colors: &[Color],
        title: &str,
        mut items: Vec<TextItem>,
    ) -> RgbaImage {
        canvas.set_clip(None);
        let frame_width = self.line_px(0.8);
        canvas.stroke_rect(self.layout.axes, Color::BLACK, frame_width);

        let bar = Colorbar::new(self.layout.colorbar, levels, colors);
        items.extend(bar.draw(&mut canvas, &self.text, &self.label, self.font_px(), frame_width));

        if !title.is_empty() {
            items.push(
                TextItem::new(
                    title,
                    self.layout.axes.center_x(),
                    self.layout.title_y,
                    self.layout.size.pt(self.style.title_size),
                )
                .align(HAlign::Center, VAlign::Middle),
            );
        }

        let mut img = canvas.into_image();
        self.text.draw_all(&mut img, &items);
        img
    }
}

// =============================================================================
// Grid plot
// =============================================================================

/// Contour fill on the grid's own longitude/latitude axes.
pub struct GridPlot {
    frame: Frame,
    view: ViewTransform,
    sampler: GridSampler,
    x_ticks: Vec<f64>,
    y_ticks: Vec<f64>,
}

impl GridPlot {
    pub fn new(grid: &CurvilinearGrid, label: &str, style: &PlotStyle, text: TextRenderer) -> RenderResult<Self> {
        let extent = grid_extent(grid)?;
        let layout = Layout::new(style.figure.unwrap_or(FigureSize::GRID), None)?;
        let view = ViewTransform::new(extent, layout.axes)?;
        let sampler = GridSampler::new(grid, &view, layout.width, layout.height)?;

        let bins = |pixels: f32| ((pixels / PIXELS_PER_TICK).round() as usize).clamp(2, MAX_AXIS_TICKS);
        let x_ticks = axis_ticks(extent.min_x, extent.max_x, bins(layout.axes.w));
        let y_ticks = axis_ticks(extent.min_y, extent.max_y, bins(layout.axes.h));

        info!(
            rows = grid.rows(),
            cols = grid.cols(),
            width = layout.width,
            height = layout.height,
            "Prepared grid plot"
        );

        Ok(Self {
            frame: Frame::new(layout, style, text, label)?,
            view,
            sampler,
            x_ticks,
            y_ticks,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.frame.layout
    }

    /// Gridlines, tick marks and tick labels for both axes.
    fn draw_axes(&self, canvas: &mut Canvas) -> Vec<TextItem> {
        let axes = self.frame.layout.axes;
        let font_px = self.frame.font_px();
        let tick_len = font_px * 0.35;
        let line = self.frame.line_px(self.frame.style.gridline_width);
        let mut items = Vec::new();

        let step = |ticks: &[f64]| if ticks.len() > 1 { ticks[1] - ticks[0] } else { 1.0 };
        let x_dec = tick_decimals(step(self.x_ticks.as_slice()));
        let y_dec = tick_decimals(step(self.y_ticks.as_slice()));

        for &lon in &self.x_ticks {
            let (x, _) = self.view.to_pixel(lon, self.view.extent.min_y);
            if self.frame.style.draw_gridlines {
                canvas.stroke_polyline(&[(x, axes.y), (x, axes.bottom())], self.frame.resolved.gridline, line, false);
            }
            canvas.stroke_polyline(&[(x, axes.bottom()), (x, axes.bottom() + tick_len)], Color::BLACK, line, false);
            items.push(
                TextItem::new(format_tick(lon, x_dec), x, axes.bottom() + tick_len * 1.5, font_px)
                    .align(HAlign::Center, VAlign::Top),
            );
        }

        let mut widest = 0.0f32;
        for &lat in &self.y_ticks {
            let (_, y) = self.view.to_pixel(self.view.extent.min_x, lat);
            if self.frame.style.draw_gridlines {
                canvas.stroke_polyline(&[(axes.x, y), (axes.right(), y)], self.frame.resolved.gridline, line, false);
            }
            canvas.stroke_polyline(&[(axes.x - tick_len, y), (axes.x, y)], Color::BLACK, line, false);
            let text = format_tick(lat, y_dec);
            widest = widest.max(self.frame.text.measure(&text, font_px).0);
            items.push(
                TextItem::new(text, axes.x - tick_len * 1.5, y, font_px).align(HAlign::Right, VAlign::Middle),
            );
        }

        items.push(
            TextItem::new("Longitudes", axes.center_x(), axes.bottom() + tick_len * 2.0 + font_px * 1.4, font_px)
                .align(HAlign::Center, VAlign::Top),
        );
        items.push(
            TextItem::new("Latitudes", axes.x - tick_len * 2.0 - widest - font_px * 0.4, axes.center_y(), font_px)
                .align(HAlign::Right, VAlign::Middle)
                .vertical(),
        );
        items
    }
}

impl FramePlot for GridPlot {
    fn size(&self) -> (u32, u32) {
        (self.frame.layout.width, self.frame.layout.height)
    }

    fn render(&self, values: &[f32], levels: &Levels, title: &str) -> RenderResult<RgbaImage> {
        let colors = levels.band_colors(&self.frame.resolved.colormap);
        let mut canvas = self.frame.canvas()?;

        self.sampler.fill(&mut canvas, values, levels, &colors)?;
        let items = self.draw_axes(&mut canvas);

        Ok(self.frame.finish(canvas, levels, &colors, title, items))
    }
}

// =============================================================================
// Map plot
// =============================================================================

/// Contour fill reprojected onto a map, with land, coastline and graticule.
pub struct MapPlot {
    frame: Frame,
    grid: CurvilinearGrid,
    projection: Projection,
    view: ViewTransform,
    mesh: MapMesh,
    graticule: Option<Graticule>,
}

impl MapPlot {
    pub fn new(
        grid: &CurvilinearGrid,
        projection: Projection,
        label: &str,
        style: &PlotStyle,
        text: TextRenderer,
    ) -> RenderResult<Self> {
        let extent = if style.global_extent {
            projection.domain()
        } else {
            projected_extent(grid, &projection).ok_or_else(|| {
                RenderError::UnsupportedGrid(format!("no grid point is visible in {}", projection.name()))
            })?
        };

        let default_size = if projection.is_plate_carree() {
            FigureSize::PLATE_CARREE
        } else {
            FigureSize::MAP
        };
        let aspect = (extent.width() / extent.height()) as f32;
        let layout = Layout::new(style.figure.unwrap_or(default_size), Some(aspect))?;
        let view = ViewTransform::new(extent, layout.axes)?;
        let mesh = MapMesh::new(grid, &projection, &view)?;
        let frame = Frame::new(layout, style, text, label)?;

        let graticule = style.draw_gridlines.then(|| {
            let (lon_span, lat_span) = match grid.bounds() {
                Some(b) if !style.global_extent => (b.width(), b.height()),
                _ => (360.0, 180.0),
            };
            Graticule::build(&projection, &view, lon_span, lat_span, frame.font_px() * 2.5)
        });

        info!(
            projection = projection.name(),
            cells = mesh.drawable_cells(),
            width = frame.layout.width,
            height = frame.layout.height,
            "Prepared map plot"
        );

        Ok(Self {
            frame,
            grid: grid.clone(),
            projection,
            view,
            mesh,
            graticule,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.frame.layout
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Coastline polylines in pixels: the outline of the valid data,
    /// mapped through the grid and projected.
    pub fn coastline(&self, values: &[f32]) -> Vec<Vec<(f32, f32)>> {
        let (rows, cols) = self.grid.shape();
        let max_jump = self.frame.layout.axes.w / 2.0;
        validity_outline(values, cols, rows, self.frame.style.coastline_smoothing)
            .iter()
            .flat_map(|contour| {
                let lonlat = contour
                    .points
                    .iter()
                    .filter_map(|p| self.grid.interpolate(p.y as f64, p.x as f64));
                project_line(&self.projection, &self.view, lonlat, max_jump)
            })
            .collect()
    }

    fn draw_graticule(&self, canvas: &mut Canvas, graticule: &Graticule) -> Vec<TextItem> {
        let line = self.frame.line_px(self.frame.style.gridline_width);
        for piece in &graticule.lines {
            canvas.stroke_polyline(piece, self.frame.resolved.gridline, line, false);
        }

        let axes = self.frame.layout.axes;
        let font_px = self.frame.font_px();
        let pad = font_px * 0.3;
        let mut items: Vec<TextItem> = graticule
            .bottom_labels
            .iter()
            .map(|l| TextItem::new(l.text.clone(), l.x, axes.bottom() + pad, font_px).align(HAlign::Center, VAlign::Top))
            .collect();
        items.extend(graticule.left_labels.iter().map(|l| {
            TextItem::new(l.text.clone(), axes.x - pad, l.y, font_px).align(HAlign::Right, VAlign::Middle)
        }));
        items
    }
}

impl FramePlot for MapPlot {
    fn size(&self) -> (u32, u32) {
        (self.frame.layout.width, self.frame.layout.height)
    }

    fn render(&self, values: &[f32], levels: &Levels, title: &str) -> RenderResult<RgbaImage> {
        let colors = levels.band_colors(&self.frame.resolved.colormap);
        let style = &self.frame.style;
        let mut canvas = self.frame.canvas()?;
        canvas.set_clip(Some(self.frame.layout.axes));

        let land = style.draw_land.then_some(self.frame.resolved.land);
        self.mesh
            .fill(&mut canvas, values, levels, &colors, land, self.frame.axes_span())?;

        if style.draw_coastline {
            let width = self.frame.line_px(style.coastline_width);
            let lines = self.coastline(values);
            debug!(pieces = lines.len(), "Drawing coastline");
            for line in &lines {
                canvas.stroke_polyline(line, self.frame.resolved.coastline, width, false);
            }
        }

        let items = match &self.graticule {
            Some(graticule) => self.draw_graticule(&mut canvas, graticule),
            None => Vec::new(),
        };

        Ok(self.frame.finish(canvas, levels, &colors, title, items))
    }
}

/// Title line: `"{title} Timestep: {frame}"`, with an optional date.
pub fn frame_title(title: &str, frame: usize, show_timestep: bool, date: Option<&str>) -> String {
    let mut out = if show_timestep {
        format!("{} Timestep: {}", title, frame)
    } else {
        title.to_string()
    };
    if let Some(date) = date {
        out.push_str(&format!(" ({})", date));
    }
    out
}
