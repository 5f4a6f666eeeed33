//! Vertical colorbar with one equal-height block per band.

use crate::canvas::Canvas;
use crate::colormap::Color;
use crate::gridlines::{format_tick, tick_decimals};
use crate::layout::Rect;
use crate::levels::Levels;
use crate::text::{HAlign, TextItem, TextRenderer, VAlign};

/// Most tick labels drawn next to the bar.
pub const MAX_COLORBAR_TICKS: usize = 11;

pub struct Colorbar<'a> {
    pub rect: Rect,
    pub levels: &'a Levels,
    pub colors: &'a [Color],
}

impl<'a> Colorbar<'a> {
    pub fn new(rect: Rect, levels: &'a Levels, colors: &'a [Color]) -> Self {
        Self { rect, levels, colors }
    }

    /// Pixel row of level `k`, counted from the bottom of the bar.
    pub fn level_y(&self, k: usize) -> f32 {
        let n = self.levels.band_count() as f32;
        self.rect.bottom() - self.rect.h * k as f32 / n
    }

    /// Indices of the levels that get a tick: every `stride`-th level.
    pub fn tick_indices(&self, max_ticks: usize) -> Vec<usize> {
        let n = self.levels.bounds().len();
        let stride = n.div_ceil(max_ticks.max(1)).max(1);
        (0..n).step_by(stride).collect()
    }

    /// Draw the bar and return its tick labels and `label` for the text pass.
    pub fn draw(
        &self,
        canvas: &mut Canvas,
        text: &TextRenderer,
        label: &str,
        font_px: f32,
        line_width: f32,
    ) -> Vec<TextItem> {
        for (k, color) in self.colors.iter().enumerate() {
            let top = self.level_y(k + 1);
            let bottom = self.level_y(k);
            canvas.fill_rect(Rect::new(self.rect.x, top, self.rect.w, bottom - top), *color);
        }
        canvas.stroke_rect(self.rect, Color::BLACK, line_width);

        let ticks = self.tick_indices(MAX_COLORBAR_TICKS);
        let bounds = self.levels.bounds();
        let decimals = ticks
            .iter()
            .map(|&k| tick_decimals((bounds[k] as f64).abs()))
            .max()
            .unwrap_or(0);
        let tick_len = font_px * 0.35;
        let label_x = self.rect.right() + tick_len + font_px * 0.3;

        let mut items = Vec::with_capacity(ticks.len() + 1);
        let mut widest = 0.0f32;
        for k in ticks {
            let y = self.level_y(k);
            canvas.stroke_polyline(
                &[(self.rect.right(), y), (self.rect.right() + tick_len, y)],
                Color::BLACK,
                line_width,
                false,
            );
            let tick_text = format_tick(bounds[k] as f64, decimals);
            widest = widest.max(text.measure(&tick_text, font_px).0);
            items.push(TextItem::new(tick_text, label_x, y, font_px).align(HAlign::Left, VAlign::Middle));
        }

        if !label.is_empty() {
            let x = label_x + widest + font_px * 0.5;
            items.push(
                TextItem::new(label, x, self.rect.center_y(), font_px)
                    .align(HAlign::Left, VAlign::Middle)
                    .vertical(),
            );
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::Colormap;

    #[test]
    fn test_band_blocks_are_stacked_bottom_up() {
        let levels = Levels::new(vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let colors = levels.band_colors(&Colormap::default());
        let bar = Colorbar::new(Rect::new(10.0, 10.0, 10.0, 80.0), &levels, &colors);
        assert_eq!(bar.level_y(0), 90.0);
        assert_eq!(bar.level_y(4), 10.0);

        let mut canvas = Canvas::new(100, 100).unwrap();
        canvas.clear(Color::WHITE);
        let items = bar.draw(&mut canvas, &TextRenderer::default(), "sosstsst", 10.0, 1.0);
        let img = canvas.into_image();
        // Lowest band at the bottom, highest at the top
        assert_eq!(img.get_pixel(15, 85).0, colors[0].to_array());
        assert_eq!(img.get_pixel(15, 15).0, colors[3].to_array());
        assert_eq!(items.len(), 6);
        assert!(items.last().unwrap().vertical);
        assert_eq!(items[0].text, "0");
    }

    #[test]
    fn test_tick_subset() {
        let levels = Levels::new((0..=20).map(|v| v as f32 * 2.0).collect()).unwrap();
        let colors = vec![Color::BLACK; 20];
        let bar = Colorbar::new(Rect::new(0.0, 0.0, 10.0, 100.0), &levels, &colors);
        let ticks = bar.tick_indices(MAX_COLORBAR_TICKS);
        assert_eq!(ticks, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20]);
        assert_eq!(bar.tick_indices(5), vec![0, 5, 10, 15, 20]);
    }
}
