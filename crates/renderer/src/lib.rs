//! Figure rendering for ocean-model fields.
//!
//! - Colormaps and contour levels
//! - Contour fill on plain lon/lat axes or reprojected onto a map
//! - Coastlines (marching squares on the land mask)
//! - Gridlines, colorbar, title text
//! - PNG encoding

pub mod canvas;
pub mod colorbar;
pub mod colormap;
pub mod contour;
pub mod error;
pub mod fill;
pub mod gridlines;
pub mod layout;
pub mod levels;
pub mod plot;
pub mod png;
pub mod style;
pub mod text;

pub use colormap::{Color, Colormap, COLORMAP_NAMES};
pub use error::{RenderError, RenderResult};
pub use layout::{FigureSize, Layout};
pub use levels::{LevelSpec, Levels};
pub use plot::{build_plot, frame_title, FramePlot, GridPlot, MapPlot};
pub use png::{encode_png, write_png};
pub use style::PlotStyle;
pub use text::TextRenderer;
