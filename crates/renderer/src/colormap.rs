//! Named colormaps.
//!
//! Each map is a list of anchor colors spread evenly over `[0, 1]` and
//! linearly interpolated, which is close enough to matplotlib's tables for
//! filled contours with a few dozen bands.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// Linear interpolation, `t` in `[0, 1]`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// A continuous colormap sampled on `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    name: String,
    anchors: Vec<Color>,
}

const COOLWARM: &[u32] = &[
    0x3b4cc0, 0x5977e3, 0x7b9ff9, 0x9ebeff, 0xc0d4f5, 0xdddcdc, 0xf2cbb7, 0xf7ac8e, 0xee8468, 0xd65244, 0xb40426,
];
const VIRIDIS: &[u32] = &[
    0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58, 0xb5de2b, 0xfde725,
];
const PLASMA: &[u32] = &[
    0x0d0887, 0x46039f, 0x7201a8, 0x9c179e, 0xbd3786, 0xd8576b, 0xed7953, 0xfb9f3a, 0xfdca26, 0xf0f921,
];
const RDBU: &[u32] = &[
    0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3, 0x2166ac, 0x053061,
];
const BLUES: &[u32] = &[
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];
// Dark ocean blue to white, for ice thickness
const ICE: &[u32] = &[0x04062b, 0x15367a, 0x2a6ea8, 0x5aa3c8, 0x9fd0e2, 0xdcf0f5, 0xffffff];
const JET: &[u32] = &[
    0x00007f, 0x0000ff, 0x007fff, 0x00ffff, 0x7fff7f, 0xffff00, 0xff7f00, 0xff0000, 0x7f0000,
];
const GRAY: &[u32] = &[0x000000, 0xffffff];

/// Names accepted by [`Colormap::from_name`], without the `_r` suffix.
pub const COLORMAP_NAMES: &[&str] = &["coolwarm", "viridis", "plasma", "RdBu", "Blues", "ice", "jet", "gray"];

impl Colormap {
    /// Look up a named map. Names are case-insensitive and `_r` reverses.
    pub fn from_name(name: &str) -> RenderResult<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let table = match base.to_ascii_lowercase().as_str() {
            "coolwarm" => COOLWARM,
            "viridis" => VIRIDIS,
            "plasma" => PLASMA,
            "rdbu" => RDBU,
            "blues" => BLUES,
            "ice" => ICE,
            "jet" => JET,
            "gray" | "grey" => GRAY,
            _ => return Err(RenderError::UnknownColormap(name.to_string())),
        };
        let anchors = table
            .iter()
            .map(|&hex| Color::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8))
            .collect();
        let cmap = Self {
            name: name.to_string(),
            anchors,
        };
        Ok(if reversed { cmap.reversed_keep_name() } else { cmap })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The same map run backwards, named with a toggled `_r` suffix.
    pub fn reversed(&self) -> Self {
        let name = match self.name.strip_suffix("_r") {
            Some(base) => base.to_string(),
            None => format!("{}_r", self.name),
        };
        Self {
            name,
            ..self.reversed_keep_name()
        }
    }

    fn reversed_keep_name(&self) -> Self {
        Self {
            name: self.name.clone(),
            anchors: self.anchors.iter().rev().copied().collect(),
        }
    }

    /// Color at `t` in `[0, 1]`. Values outside are clamped, NaN gives the
    /// low end.
    pub fn sample(&self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.anchors.len() - 1;
        let pos = t * last as f32;
        let i = (pos.floor() as usize).min(last - 1);
        self.anchors[i].lerp(self.anchors[i + 1], pos - i as f32)
    }

    /// `n` colors evenly spaced from the low end to the high end.
    pub fn discrete(&self, n: usize) -> Vec<Color> {
        match n {
            0 => Vec::new(),
            1 => vec![self.sample(0.5)],
            _ => (0..n).map(|i| self.sample(i as f32 / (n - 1) as f32)).collect(),
        }
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self {
            name: "coolwarm".to_string(),
            anchors: COOLWARM
                .iter()
                .map(|&hex| Color::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#B1B2B4"), Some(Color::rgb(0xb1, 0xb2, 0xb4)));
        assert_eq!(Color::from_hex("00000080"), Some(Color::new(0, 0, 0, 0x80)));
        assert_eq!(Color::from_hex("#12"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_every_name_resolves() {
        for name in COLORMAP_NAMES {
            assert!(Colormap::from_name(name).is_ok(), "{}", name);
            assert!(Colormap::from_name(&format!("{}_r", name)).is_ok(), "{}_r", name);
        }
        assert!(matches!(
            Colormap::from_name("rainbow_unicorn"),
            Err(RenderError::UnknownColormap(_))
        ));
    }

    #[test]
    fn test_coolwarm_endpoints() {
        let cmap = Colormap::from_name("coolwarm").unwrap();
        assert_eq!(cmap.sample(0.0), Color::rgb(0x3b, 0x4c, 0xc0));
        assert_eq!(cmap.sample(1.0), Color::rgb(0xb4, 0x04, 0x26));
        assert_eq!(cmap.sample(2.0), cmap.sample(1.0));
    }

    #[test]
    fn test_reversed() {
        let cmap = Colormap::from_name("viridis").unwrap();
        let rev = Colormap::from_name("viridis_r").unwrap();
        assert_eq!(cmap.sample(0.0), rev.sample(1.0));
        assert_eq!(cmap.reversed().name(), "viridis_r");
        assert_eq!(cmap.reversed().reversed(), cmap);
    }

    #[test]
    fn test_discrete() {
        let cmap = Colormap::from_name("gray").unwrap();
        let colors = cmap.discrete(3);
        assert_eq!(colors, vec![Color::BLACK, Color::rgb(128, 128, 128), Color::WHITE]);
    }
}
