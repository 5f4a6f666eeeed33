//! Drawing surface for one figure.
//!
//! Vector work (strokes, polygons) goes through tiny-skia. Filled contours
//! write pixels directly, which is safe because every color they write is
//! opaque and premultiplied opaque RGBA is plain RGBA.

use image::RgbaImage;
use tiny_skia::{FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Rect as SkRect, Stroke, Transform};

use crate::colormap::Color;
use crate::error::{RenderError, RenderResult};
use crate::layout::Rect;

pub struct Canvas {
    pixmap: Pixmap,
    clip: Option<Mask>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions { width, height })?;
        Ok(Self { pixmap, clip: None })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    /// Restrict strokes and polygon fills to `rect`, or lift the restriction.
    pub fn set_clip(&mut self, rect: Option<Rect>) {
        self.clip = rect.and_then(|r| {
            let mut mask = Mask::new(self.width(), self.height())?;
            let path = PathBuilder::from_rect(SkRect::from_xywh(r.x, r.y, r.w, r.h)?);
            mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
            Some(mask)
        });
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        if let Some(r) = SkRect::from_xywh(rect.x, rect.y, rect.w, rect.h) {
            let paint = paint(color, false);
            self.pixmap.fill_rect(r, &paint, Transform::identity(), self.clip.as_ref());
        }
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) {
        let corners = [
            (rect.x, rect.y),
            (rect.right(), rect.y),
            (rect.right(), rect.bottom()),
            (rect.x, rect.bottom()),
        ];
        self.stroke_polyline(&corners, color, width, true);
    }

    /// Stroke a polyline given in pixel coordinates.
    pub fn stroke_polyline(&mut self, points: &[(f32, f32)], color: Color, width: f32, closed: bool) {
        let Some(path) = polyline_path(points, closed) else {
            return;
        };
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color, true), &stroke, Transform::identity(), self.clip.as_ref());
    }

    /// Fill a polygon. Anti-aliasing is off so adjacent cells tile cleanly.
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Color) {
        let Some(path) = polyline_path(points, true) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint(color, false),
            FillRule::Winding,
            Transform::identity(),
            self.clip.as_ref(),
        );
    }

    /// Raw premultiplied RGBA bytes, row-major.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_mut()
    }

    /// Write an opaque pixel, ignoring coordinates outside the canvas.
    pub fn put_pixel(&mut self, x: usize, y: usize, color: Color) {
        let width = self.width() as usize;
        if x >= width || y >= self.height() as usize {
            return;
        }
        let offset = (y * width + x) * 4;
        self.pixmap.data_mut()[offset..offset + 4].copy_from_slice(&color.to_array());
    }

    /// Convert to a straight-alpha image.
    pub fn into_image(self) -> RgbaImage {
        let (width, height) = (self.width(), self.height());
        let mut raw = Vec::with_capacity((width * height * 4) as usize);
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        // Length always matches, so this cannot fail
        RgbaImage::from_raw(width, height, raw).unwrap_or_else(|| RgbaImage::new(width, height))
    }
}

fn paint(color: Color, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = anti_alias;
    paint
}

fn polyline_path(points: &[(f32, f32)], closed: bool) -> Option<tiny_skia::Path> {
    if points.len() < 2 {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(points[0].0, points[0].1);
    for &(x, y) in &points[1..] {
        pb.line_to(x, y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            Canvas::new(0, 10),
            Err(RenderError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_clear_and_put_pixel() {
        let mut canvas = Canvas::new(4, 3).unwrap();
        canvas.clear(Color::WHITE);
        canvas.put_pixel(1, 2, Color::rgb(10, 20, 30));
        canvas.put_pixel(100, 100, Color::BLACK);
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(1, 2).0, [10, 20, 30, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_clip_limits_fill() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.clear(Color::WHITE);
        canvas.set_clip(Some(Rect::new(0.0, 0.0, 5.0, 10.0)));
        canvas.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK);
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(2, 5).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(8, 5).0, [255, 255, 255, 255]);
    }
}
