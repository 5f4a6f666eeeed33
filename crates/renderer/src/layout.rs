//! Figure geometry: pixel size, axes box, colorbar box and title position.
//!
//! Proportions follow matplotlib's defaults (subplot margins of 0.125,
//! 0.9, 0.11 and 0.88 of the figure, a colorbar taking 15% of the axes
//! width plus a 5% gap).

use std::fmt;
use std::str::FromStr;

use foci_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Largest figure side accepted, in pixels.
const MAX_SIDE: u32 = 16_384;

/// Figure size in inches at a given resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width_in: f32,
    pub height_in: f32,
    #[serde(default = "default_dpi")]
    pub dpi: f32,
}

fn default_dpi() -> f32 {
    100.0
}

impl FigureSize {
    /// matplotlib's default figure, used for plain grid plots.
    pub const GRID: FigureSize = FigureSize::new(6.4, 4.8);
    /// Wide figure for PlateCarree maps.
    pub const PLATE_CARREE: FigureSize = FigureSize::new(10.0, 4.0);
    /// Figure for every other projection.
    pub const MAP: FigureSize = FigureSize::new(8.0, 4.0);

    pub const fn new(width_in: f32, height_in: f32) -> Self {
        Self {
            width_in,
            height_in,
            dpi: 100.0,
        }
    }

    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Size in whole pixels.
    pub fn pixels(&self) -> RenderResult<(u32, u32)> {
        let w = (self.width_in * self.dpi).round();
        let h = (self.height_in * self.dpi).round();
        if !(w >= 1.0 && h >= 1.0 && w <= MAX_SIDE as f32 && h <= MAX_SIDE as f32) {
            return Err(RenderError::InvalidDimensions {
                width: w.max(0.0) as u32,
                height: h.max(0.0) as u32,
            });
        }
        Ok((w as u32, h as u32))
    }

    /// Points to pixels at this resolution.
    pub fn pt(&self, points: f32) -> f32 {
        points * self.dpi / 72.0
    }
}

impl fmt::Display for FigureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width_in, self.height_in)
    }
}

impl FromStr for FigureSize {
    type Err = RenderError;

    /// `WxH` in inches, e.g. `10x4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RenderError::InvalidDimensions { width: 0, height: 0 };
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let w: f32 = w.trim().parse().map_err(|_| invalid())?;
        let h: f32 = h.trim().parse().map_err(|_| invalid())?;
        if !(w > 0.0 && h > 0.0) {
            return Err(invalid());
        }
        Ok(FigureSize::new(w, h))
    }
}

/// An axis-aligned rectangle in pixels, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Integer pixel span `[x0, x1) x [y0, y1)` clamped to an image.
    pub fn pixel_span(&self, width: u32, height: u32) -> (usize, usize, usize, usize) {
        let clamp_x = |v: f32| v.round().clamp(0.0, width as f32) as usize;
        let clamp_y = |v: f32| v.round().clamp(0.0, height as f32) as usize;
        (clamp_x(self.x), clamp_x(self.right()), clamp_y(self.y), clamp_y(self.bottom()))
    }
}

/// Where everything goes on a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub size: FigureSize,
    pub width: u32,
    pub height: u32,
    /// The data area
    pub axes: Rect,
    /// The color bar itself, excluding tick labels
    pub colorbar: Rect,
    /// Vertical centre of the title line
    pub title_y: f32,
}

impl Layout {
    /// Lay out a figure. `aspect` (width / height of the data) keeps maps
    /// undistorted; `None` stretches the axes to fill the box.
    pub fn new(size: FigureSize, aspect: Option<f32>) -> RenderResult<Self> {
        let (width, height) = size.pixels()?;
        let (fw, fh) = (width as f32, height as f32);

        let left = 0.125 * fw;
        let right = 0.9 * fw;
        let top = 0.12 * fh;
        let bottom = 0.89 * fh;

        let avail_w = right - left;
        let box_w = avail_w * 0.80;
        let box_h = bottom - top;

        let axes = match aspect {
            Some(a) if a.is_finite() && a > 0.0 => {
                let (w, h) = if box_w / box_h > a {
                    (box_h * a, box_h)
                } else {
                    (box_w, box_w / a)
                };
                Rect::new(left + (box_w - w) / 2.0, top + (box_h - h) / 2.0, w, h)
            }
            _ => Rect::new(left, top, box_w, box_h),
        };

        let gap = avail_w * 0.05;
        let bar_w = (axes.h / 20.0).max(size.pt(6.0));
        let colorbar = Rect::new(axes.right() + gap, axes.y, bar_w, axes.h);

        let title_y = (axes.y - size.pt(12.0)).max(size.pt(8.0));

        Ok(Self {
            size,
            width,
            height,
            axes,
            colorbar,
            title_y,
        })
    }
}

/// Maps data coordinates (degrees or projected metres) onto the axes box.
/// The y axis points up in data space and down in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub extent: BoundingBox,
    pub rect: Rect,
}

impl ViewTransform {
    pub fn new(extent: BoundingBox, rect: Rect) -> RenderResult<Self> {
        if !(extent.width() > 0.0 && extent.height() > 0.0) {
            return Err(RenderError::UnsupportedGrid(format!(
                "plot extent {}x{} is empty",
                extent.width(),
                extent.height()
            )));
        }
        Ok(Self { extent, rect })
    }

    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let fx = (x - self.extent.min_x) / self.extent.width();
        let fy = (self.extent.max_y - y) / self.extent.height();
        (
            self.rect.x + (fx * self.rect.w as f64) as f32,
            self.rect.y + (fy * self.rect.h as f64) as f32,
        )
    }

    pub fn to_data(&self, px: f32, py: f32) -> (f64, f64) {
        let fx = ((px - self.rect.x) / self.rect.w) as f64;
        let fy = ((py - self.rect.y) / self.rect.h) as f64;
        (
            self.extent.min_x + fx * self.extent.width(),
            self.extent.max_y - fy * self.extent.height(),
        )
    }
}
