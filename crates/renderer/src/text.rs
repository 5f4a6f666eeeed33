//! Text drawing with rusttype and imageproc.
//!
//! No font is bundled. One is loaded from the configured path or from the
//! usual system locations; without one, text is skipped and a single
//! warning is logged.

use std::path::{Path, PathBuf};
use std::sync::Once;

use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::{debug, warn};

use crate::colormap::Color;

/// Fonts tried when no path is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static MISSING_FONT: Once = Once::new();

/// Horizontal anchor of a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Vertical anchor of a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// A piece of text to draw once the geometry is finished.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Size in pixels
    pub size: f32,
    pub color: Color,
    pub h_align: HAlign,
    pub v_align: VAlign,
    /// Rotated 90 degrees counter-clockwise, reading bottom to top
    pub vertical: bool,
}

impl TextItem {
    pub fn new(text: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size,
            color: Color::BLACK,
            h_align: HAlign::Left,
            v_align: VAlign::Top,
            vertical: false,
        }
    }

    pub fn align(mut self, h_align: HAlign, v_align: VAlign) -> Self {
        self.h_align = h_align;
        self.v_align = v_align;
        self
    }

    pub fn vertical(mut self) -> Self {
        self.vertical = true;
        self
    }
}

/// Draws [`TextItem`]s when a font is available.
#[derive(Clone, Default)]
pub struct TextRenderer {
    font: Option<Font<'static>>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl TextRenderer {
    /// Load `path` if given, otherwise the first system font found.
    pub fn load(path: Option<&Path>) -> Self {
        let candidates: Vec<PathBuf> = match path {
            Some(p) => vec![p.to_path_buf()],
            None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
        };
        for candidate in &candidates {
            let Ok(bytes) = std::fs::read(candidate) else {
                continue;
            };
            match Font::try_from_vec(bytes) {
                Some(font) => {
                    debug!(path = %candidate.display(), "Loaded font");
                    return Self { font: Some(font) };
                }
                None => warn!(path = %candidate.display(), "Not a usable TrueType font"),
            }
        }
        MISSING_FONT.call_once(|| {
            warn!(
                configured = ?path,
                "No font found, plots will be drawn without text (set font_path in the config)"
            );
        });
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(bytes).map(|font| Self { font: Some(font) })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Width and height of `text` at `size` pixels, or zero without a font.
    pub fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        match &self.font {
            Some(font) => {
                let (w, h) = text_size(Scale::uniform(size), font, text);
                (w as f32, h.max(size.round() as i32) as f32)
            }
            None => (0.0, 0.0),
        }
    }

    pub fn draw(&self, img: &mut RgbaImage, item: &TextItem) {
        let Some(font) = &self.font else {
            return;
        };
        if item.text.is_empty() {
            return;
        }
        let scale = Scale::uniform(item.size);
        let (w, h) = self.measure(&item.text, item.size);
        let color = Rgba(item.color.to_array());

        if !item.vertical {
            let (x, y) = anchor(item, w, h);
            draw_text_mut(img, color, x.round() as i32, y.round() as i32, scale, font, &item.text);
            return;
        }

        // Draw horizontally on a scratch image, then turn it upright
        let (sw, sh) = (w.ceil().max(1.0) as u32 + 2, h.ceil().max(1.0) as u32 + 2);
        let mut scratch = RgbaImage::new(sw, sh);
        draw_text_mut(&mut scratch, color, 1, 1, scale, font, &item.text);
        let rotated = imageops::rotate270(&scratch);
        let (rw, rh) = (rotated.width() as f32, rotated.height() as f32);
        let (x, y) = anchor(item, rw, rh);
        imageops::overlay(img, &rotated, x.round() as i64, y.round() as i64);
    }

    pub fn draw_all(&self, img: &mut RgbaImage, items: &[TextItem]) {
        if self.font.is_none() {
            return;
        }
        for item in items {
            self.draw(img, item);
        }
    }
}

/// Top-left corner of a `w` x `h` box anchored as `item` asks.
fn anchor(item: &TextItem, w: f32, h: f32) -> (f32, f32) {
    let x = match item.h_align {
        HAlign::Left => item.x,
        HAlign::Center => item.x - w / 2.0,
        HAlign::Right => item.x - w,
    };
    let y = match item.v_align {
        VAlign::Top => item.y,
        VAlign::Middle => item.y - h / 2.0,
        VAlign::Bottom => item.y - h,
    };
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_font_nothing_is_drawn() {
        let text = TextRenderer::default();
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
        text.draw(&mut img, &TextItem::new("sosstsst", 0.0, 0.0, 12.0));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
        assert_eq!(text.measure("abc", 12.0), (0.0, 0.0));
    }

    #[test]
    fn test_missing_font_path_falls_back_to_none() {
        let text = TextRenderer::load(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!text.has_font());
    }

    #[test]
    fn test_anchor() {
        let item = TextItem::new("x", 100.0, 50.0, 10.0).align(HAlign::Center, VAlign::Middle);
        assert_eq!(anchor(&item, 20.0, 10.0), (90.0, 45.0));
        let item = item.align(HAlign::Right, VAlign::Bottom);
        assert_eq!(anchor(&item, 20.0, 10.0), (80.0, 40.0));
    }

    #[test]
    fn test_invalid_font_bytes() {
        assert!(TextRenderer::from_bytes(vec![0, 1, 2, 3]).is_none());
    }
}
