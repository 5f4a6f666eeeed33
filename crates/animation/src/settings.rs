//! Options for animations and single plots.

use std::path::PathBuf;

use netcdf_parser::LoadOptions;
use renderer::{LevelSpec, PlotStyle};
use serde::{Deserialize, Serialize};

/// How contour levels are chosen across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelScope {
    /// One set of levels from the range of all animated frames
    Global,
    /// Levels recomputed from each frame's own range
    #[default]
    PerFrame,
}

/// Which time slice a single plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSelection {
    Index(usize),
    /// Mean over the whole time axis
    Mean,
}

impl Default for TimeSelection {
    fn default() -> Self {
        TimeSelection::Index(0)
    }
}

/// Everything that shapes an animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub levels: LevelSpec,
    /// Sentinel masked to NaN; model output stores land as 0
    pub missing_value: Option<f32>,
    pub colormap: String,
    /// Append "Timestep: i" to the title
    pub show_timestep: bool,
    /// Append the decoded date of the time step to the title
    pub show_date: bool,
    /// Number of frames; the whole time axis when unset
    pub frames: Option<usize>,
    pub interval_ms: u64,
    /// Title prefix; the variable name when unset
    pub title: Option<String>,
    pub level_scope: LevelScope,
    pub font_path: Option<PathBuf>,
    /// Everything else about the figure. Its colormap is replaced by `colormap`.
    pub style: PlotStyle,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            levels: LevelSpec::default(),
            missing_value: Some(0.0),
            colormap: "coolwarm".to_string(),
            show_timestep: true,
            show_date: false,
            frames: None,
            interval_ms: 200,
            title: None,
            level_scope: LevelScope::PerFrame,
            font_path: None,
            style: PlotStyle::default(),
        }
    }
}

impl AnimationSettings {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            missing_value: self.missing_value,
            ..LoadOptions::default()
        }
    }

    pub fn plot_style(&self) -> PlotStyle {
        self.style.clone().with_colormap(self.colormap.clone())
    }

    pub fn title_for(&self, var_name: &str) -> String {
        self.title.clone().unwrap_or_else(|| var_name.to_string())
    }
}

/// Encoder options for [`crate::Animation::save`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    /// Frames per second; `1000 / interval_ms` when unset
    pub fps: Option<f32>,
    /// Video bitrate in kbit/s; the encoder decides when unset
    pub bitrate: Option<u32>,
    /// ffmpeg executable used for video output
    pub ffmpeg: PathBuf,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            fps: None,
            bitrate: None,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl SaveOptions {
    pub fn effective_fps(&self, interval_ms: u64) -> f32 {
        match self.fps {
            Some(fps) if fps.is_finite() && fps > 0.0 => fps,
            _ => 1000.0 / interval_ms.max(1) as f32,
        }
    }
}
