//! Animations and single plots of FOCI ocean-model fields.
//!
//! ```ignore
//! use animation::{animate_2d_map, AnimationSettings, SaveOptions};
//! use projection::Projection;
//!
//! let settings = AnimationSettings::default();
//! let anim = animate_2d_map(folder, "*_sosstsst.nc", "sosstsst", Projection::default(), &settings)?;
//! anim.save(Path::new("sst.mp4"), &SaveOptions::default())?;
//! ```

pub mod animation;
pub mod error;
pub mod settings;
pub mod single;
pub mod sink;

pub use animation::{animate_2d, animate_2d_map, animation_for, load_dataset, Animation};
pub use error::{AnimationError, AnimationResult};
pub use settings::{AnimationSettings, LevelScope, SaveOptions, TimeSelection};
pub use single::{plot_single, render_single};
pub use sink::{open_sink, FfmpegSink, FrameSink, GifSink, OutputFormat, PngSequenceSink};
