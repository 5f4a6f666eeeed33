//! Plot style: colors, line widths and which decorations are drawn.
//!
//! Loaded from the `defaults:` section of the YAML config; every field has
//! a default so partial configs work.

use serde::{Deserialize, Serialize};

use crate::colormap::{Color, Colormap};
use crate::error::{RenderError, RenderResult};
use crate::layout::FigureSize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    /// Colormap name, `_r` suffix reverses
    pub colormap: String,
    /// Figure size; `None` picks the size for the plot mode
    pub figure: Option<FigureSize>,
    pub land_color: String,
    pub coastline_color: String,
    /// Coastline width in points
    pub coastline_width: f32,
    pub gridline_color: String,
    /// Gridline width in points
    pub gridline_width: f32,
    /// Tick and label text size in points
    pub font_size: f32,
    /// Title size in points
    pub title_size: f32,
    pub draw_coastline: bool,
    pub draw_land: bool,
    pub draw_gridlines: bool,
    /// Show the whole projection domain instead of the data extent
    pub global_extent: bool,
    /// Chaikin passes applied to the coastline
    pub coastline_smoothing: u32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            colormap: "coolwarm".to_string(),
            figure: None,
            land_color: "#B1B2B4".to_string(),
            coastline_color: "#000000".to_string(),
            coastline_width: 0.8,
            gridline_color: "#80808080".to_string(),
            gridline_width: 0.6,
            font_size: 10.0,
            title_size: 12.0,
            draw_coastline: true,
            draw_land: true,
            draw_gridlines: true,
            global_extent: false,
            coastline_smoothing: 1,
        }
    }
}

/// A [`PlotStyle`] with colors parsed, ready for drawing.
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    pub colormap: Colormap,
    pub land: Color,
    pub coastline: Color,
    pub gridline: Color,
}

impl PlotStyle {
    pub fn with_colormap(mut self, name: impl Into<String>) -> Self {
        self.colormap = name.into();
        self
    }

    pub fn with_figure(mut self, figure: FigureSize) -> Self {
        self.figure = Some(figure);
        self
    }

    /// Parse colors and look up the colormap.
    pub fn resolve(&self) -> RenderResult<ResolvedStyle> {
        Ok(ResolvedStyle {
            colormap: Colormap::from_name(&self.colormap)?,
            land: parse_color("land_color", &self.land_color)?,
            coastline: parse_color("coastline_color", &self.coastline_color)?,
            gridline: parse_color("gridline_color", &self.gridline_color)?,
        })
    }
}

fn parse_color(field: &str, hex: &str) -> RenderResult<Color> {
    Color::from_hex(hex).ok_or_else(|| {
        RenderError::InvalidStyle(format!("{}: '{}' is not a #RRGGBB or #RRGGBBAA color", field, hex))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resolves() {
        let resolved = PlotStyle::default().resolve().unwrap();
        assert_eq!(resolved.land, Color::rgb(0xB1, 0xB2, 0xB4));
        assert_eq!(resolved.gridline.a, 0x80);
        assert_eq!(resolved.colormap.name(), "coolwarm");
    }

    #[test]
    fn test_bad_color_is_reported() {
        let style = PlotStyle {
            land_color: "grey".to_string(),
            ..PlotStyle::default()
        };
        match style.resolve() {
            Err(RenderError::InvalidStyle(msg)) => assert!(msg.contains("land_color")),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unknown_colormap() {
        let style = PlotStyle::default().with_colormap("rainbow_unicorn");
        assert!(matches!(style.resolve(), Err(RenderError::UnknownColormap(_))));
    }
}
