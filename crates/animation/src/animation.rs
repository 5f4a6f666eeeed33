//! Frame-by-frame animations of one variable.
//!
//! An [`Animation`] owns the loaded field and a prepared plot. Every frame
//! is drawn from scratch into a fresh canvas, so frames are independent and
//! can be rendered in parallel. Saving renders batches of frames with rayon
//! and hands them to the sink in order.

use std::path::Path;
use std::time::Instant;

use foci_common::field::finite_range;
use foci_common::{FieldCube, TimeAxis};
use image::RgbaImage;
use netcdf_parser::{open_from_folder, Dataset};
use projection::Projection;
use rayon::prelude::*;
use renderer::{build_plot, frame_title, FramePlot, LevelSpec, Levels, TextRenderer};
use tracing::{debug, info, warn};

use crate::error::{AnimationError, AnimationResult};
use crate::settings::{AnimationSettings, LevelScope, SaveOptions};
use crate::sink::{open_sink, FrameSink};

/// A renderable animation.
pub struct Animation {
    plot: Box<dyn FramePlot>,
    field: FieldCube,
    time: TimeAxis,
    frames: usize,
    interval_ms: u64,
    title: String,
    show_timestep: bool,
    show_date: bool,
    level_spec: LevelSpec,
    level_scope: LevelScope,
    /// Levels over all animated frames
    global_levels: Levels,
    /// Frame 0, drawn while setting up
    first_frame: RgbaImage,
}

impl std::fmt::Debug for Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("var", &self.field.name)
            .field("frames", &self.frames)
            .field("interval_ms", &self.interval_ms)
            .field("size", &self.plot.size())
            .finish()
    }
}

impl Animation {
    /// Set up an animation over `dataset` and draw its first frame.
    pub fn new(dataset: Dataset, plot: Box<dyn FramePlot>, settings: &AnimationSettings) -> AnimationResult<Self> {
        let available = dataset.time_len();
        let frames = match settings.frames {
            Some(requested) if requested > available => {
                warn!(requested, available, "More frames requested than time steps, clamping");
                available
            }
            Some(requested) => requested,
            None => available,
        };
        if frames == 0 {
            return Err(AnimationError::NoFrames);
        }

        let (min, max) = dataset
            .field
            .value_range(0, frames)
            .ok_or_else(|| AnimationError::EmptyField(dataset.field.name.clone()))?;
        let global_levels = Levels::from_spec(&settings.levels, min, max)?;
        debug!(min, max, bands = global_levels.band_count(), "Global contour levels");

        let title = settings.title_for(&dataset.field.name);
        let mut animation = Self {
            plot,
            field: dataset.field,
            time: dataset.time,
            frames,
            interval_ms: settings.interval_ms,
            title,
            show_timestep: settings.show_timestep,
            show_date: settings.show_date,
            level_spec: settings.levels.clone(),
            level_scope: settings.level_scope,
            global_levels,
            first_frame: RgbaImage::new(0, 0),
        };
        animation.first_frame = animation.draw(0)?;
        Ok(animation)
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Frame size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.plot.size()
    }

    pub fn field(&self) -> &FieldCube {
        &self.field
    }

    /// Title shown on frame `i`.
    pub fn title(&self, i: usize) -> String {
        let date = if self.show_date {
            self.time.date_label(i)
        } else {
            None
        };
        frame_title(&self.title, i, self.show_timestep, date.as_deref())
    }

    /// Contour levels used for frame `i`.
    pub fn levels(&self, i: usize) -> AnimationResult<Levels> {
        match self.level_scope {
            LevelScope::Global => Ok(self.global_levels.clone()),
            LevelScope::PerFrame => match finite_range(self.field.slice(i)?) {
                Some((min, max)) => Ok(Levels::from_spec(&self.level_spec, min, max)?),
                None => Ok(self.global_levels.clone()),
            },
        }
    }

    /// Render frame `i`: fresh canvas, contours for time index `i`,
    /// decorations and title.
    pub fn render_frame(&self, i: usize) -> AnimationResult<RgbaImage> {
        if i >= self.frames {
            return Err(AnimationError::FrameOutOfRange {
                index: i,
                len: self.frames,
            });
        }
        if i == 0 {
            return Ok(self.first_frame.clone());
        }
        self.draw(i)
    }

    fn draw(&self, i: usize) -> AnimationResult<RgbaImage> {
        let values = self.field.slice(i)?;
        let levels = self.levels(i)?;
        Ok(self.plot.render(values, &levels, &self.title(i))?)
    }

    /// Push every frame to `sink` in order, rendering `batch` frames at a time.
    pub fn write_frames(&self, sink: &mut dyn FrameSink, batch: usize) -> AnimationResult<()> {
        let batch = batch.max(1);
        let mut start = 0;
        while start < self.frames {
            let end = (start + batch).min(self.frames);
            let images: Vec<RgbaImage> = (start..end)
                .into_par_iter()
                .map(|i| self.render_frame(i))
                .collect::<AnimationResult<_>>()?;
            for image in &images {
                sink.push(image)?;
            }
            debug!(done = end, total = self.frames, "Encoded frame batch");
            start = end;
        }
        sink.finish()
    }

    /// Render all frames and encode them to `path`.
    ///
    /// The format follows the extension, see [`crate::sink`].
    pub fn save(&self, path: &Path, options: &SaveOptions) -> AnimationResult<usize> {
        let started = Instant::now();
        let fps = options.effective_fps(self.interval_ms);
        let mut sink = open_sink(path, self.size(), fps, options.bitrate, &options.ffmpeg)?;

        let batch = rayon::current_num_threads() * 2;
        self.write_frames(sink.as_mut(), batch)?;

        let frames = sink.frames_written();
        info!(
            path = %path.display(),
            frames,
            fps,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Saved animation"
        );
        Ok(frames)
    }
}

/// Load `var_name` from `folder/data_name` with the settings' missing value.
pub fn load_dataset(
    folder: &Path,
    data_name: &str,
    var_name: &str,
    settings: &AnimationSettings,
) -> AnimationResult<Dataset> {
    Ok(open_from_folder(folder, data_name, var_name, &settings.load_options())?)
}

/// Animation on the grid's own longitude/latitude axes.
pub fn animate_2d(
    folder: &Path,
    data_name: &str,
    var_name: &str,
    settings: &AnimationSettings,
) -> AnimationResult<Animation> {
    let dataset = load_dataset(folder, data_name, var_name, settings)?;
    animation_for(dataset, None, settings)
}

/// Animation reprojected onto `projection`, with land, coastline and graticule.
pub fn animate_2d_map(
    folder: &Path,
    data_name: &str,
    var_name: &str,
    projection: Projection,
    settings: &AnimationSettings,
) -> AnimationResult<Animation> {
    let dataset = load_dataset(folder, data_name, var_name, settings)?;
    animation_for(dataset, Some(projection), settings)
}

/// Build an animation over an already loaded dataset.
pub fn animation_for(
    dataset: Dataset,
    projection: Option<Projection>,
    settings: &AnimationSettings,
) -> AnimationResult<Animation> {
    let text = TextRenderer::load(settings.font_path.as_deref());
    let plot = build_plot(
        &dataset.grid,
        projection,
        &dataset.field.name,
        &settings.plot_style(),
        text,
    )?;
    Animation::new(dataset, plot, settings)
}
