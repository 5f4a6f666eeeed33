//! Subcommand arguments and handlers.

use std::path::{Path, PathBuf};

use animation::{animation_for, load_dataset, render_single, AnimationSettings, LevelScope, SaveOptions, TimeSelection};
use anyhow::{Context, Result};
use clap::Args;
use foci_common::BoundingBox;
use netcdf_parser::{list_variables, open_dataset, resolve_paths, LoadOptions, VariableInfo};
use projection::Projection;
use renderer::{write_png, FigureSize, LevelSpec};
use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;

/// Where the data comes from.
#[derive(Args, Debug)]
pub struct DataArgs {
    /// Folder holding the model output
    #[arg(long, env = "FOCI_DATA_DIR")]
    pub folder: PathBuf,

    /// File name inside the folder, `*` and `?` match several files
    #[arg(long)]
    pub data: String,

    /// Variable to plot, e.g. sosstsst or iicethic
    #[arg(long = "var")]
    pub var: String,
}

#[derive(Args, Debug, Default)]
pub struct MapArgs {
    /// Map projection, e.g. PlateCarree, Robinson, NorthPolarStereo
    #[arg(long)]
    pub projection: Option<String>,

    /// Central meridian of the projection
    #[arg(long, allow_negative_numbers = true, requires = "projection")]
    pub central_longitude: Option<f64>,
}

impl MapArgs {
    pub fn resolve(&self) -> Result<Option<Projection>> {
        self.projection
            .as_deref()
            .map(|name| Projection::from_name(name, self.central_longitude))
            .transpose()
            .context("Invalid projection")
    }
}

/// Style flags shared by `plot` and `animate`. Unset flags keep config values.
#[derive(Args, Debug, Default)]
pub struct StyleArgs {
    /// Number of levels (20), a list (0,2.5,5) or interval=STEP
    #[arg(long)]
    pub levels: Option<LevelSpec>,

    /// Value masked as missing (default 0)
    #[arg(long, allow_negative_numbers = true)]
    pub missing: Option<f32>,

    /// Do not mask any value
    #[arg(long, conflicts_with = "missing")]
    pub no_mask: bool,

    /// Colormap name, `_r` reverses
    #[arg(long)]
    pub cmap: Option<String>,

    /// Leave the time step out of the title
    #[arg(long)]
    pub no_timestep: bool,

    /// Add the decoded date to the title
    #[arg(long)]
    pub show_date: bool,

    /// Title prefix (default: the variable name)
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub dpi: Option<f32>,

    /// Figure size in inches, WxH
    #[arg(long)]
    pub size: Option<FigureSize>,

    /// Use one set of contour levels over all frames
    #[arg(long)]
    pub global_levels: bool,

    /// TrueType font for labels
    #[arg(long)]
    pub font: Option<PathBuf>,

    #[arg(long)]
    pub no_coastline: bool,

    #[arg(long)]
    pub no_land: bool,

    #[arg(long)]
    pub no_gridlines: bool,

    /// Show the whole projection instead of the data extent
    #[arg(long)]
    pub global: bool,
}

impl StyleArgs {
    /// Layer the flags over `settings`. `default_size` is the figure size
    /// of the plot mode, used when only `--dpi` is given.
    pub fn apply(&self, mut settings: AnimationSettings, default_size: FigureSize) -> AnimationSettings {
        if let Some(levels) = &self.levels {
            settings.levels = levels.clone();
        }
        if self.no_mask {
            settings.missing_value = None;
        } else if let Some(missing) = self.missing {
            settings.missing_value = Some(missing);
        }
        if let Some(cmap) = &self.cmap {
            settings.colormap = cmap.clone();
        }
        if self.no_timestep {
            settings.show_timestep = false;
        }
        if self.show_date {
            settings.show_date = true;
        }
        if let Some(title) = &self.title {
            settings.title = Some(title.clone());
        }
        if self.global_levels {
            settings.level_scope = LevelScope::Global;
        }
        if let Some(font) = &self.font {
            settings.font_path = Some(font.clone());
        }

        let style = &mut settings.style;
        let mut figure = self.size.or(style.figure);
        if let Some(dpi) = self.dpi {
            figure = Some(figure.unwrap_or(default_size).with_dpi(dpi));
        }
        style.figure = figure;
        style.draw_coastline &= !self.no_coastline;
        style.draw_land &= !self.no_land;
        style.draw_gridlines &= !self.no_gridlines;
        style.global_extent |= self.global;
        settings
    }
}

/// Figure size a plot mode uses when none is configured.
fn default_size(projection: Option<&Projection>) -> FigureSize {
    match projection {
        None => FigureSize::GRID,
        Some(p) if p.is_plate_carree() => FigureSize::PLATE_CARREE,
        Some(_) => FigureSize::MAP,
    }
}

// =============================================================================
// plot
// =============================================================================

#[derive(Args, Debug)]
pub struct PlotArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub map: MapArgs,

    #[command(flatten)]
    pub style: StyleArgs,

    /// Time step to plot
    #[arg(long, conflicts_with = "mean")]
    pub time: Option<usize>,

    /// Plot the mean over all time steps
    #[arg(long)]
    pub mean: bool,

    /// Output PNG (default: <var>.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn plot(args: PlotArgs, config: &AppConfig) -> Result<()> {
    let projection = args.map.resolve()?;
    let settings = args
        .style
        .apply(config.defaults.clone(), default_size(projection.as_ref()));
    let time = if args.mean {
        TimeSelection::Mean
    } else {
        TimeSelection::Index(args.time.unwrap_or(0))
    };
    let output = args.output.unwrap_or_else(|| {
        let suffix = if args.mean { "_mean" } else { "" };
        PathBuf::from(format!("{}{}.png", args.data.var, suffix))
    });

    let dataset = load_dataset(&args.data.folder, &args.data.data, &args.data.var, &settings)
        .with_context(|| format!("Failed to load '{}' from {}", args.data.var, args.data.folder.display()))?;
    let image = render_single(&dataset, projection, time, &settings).context("Failed to render plot")?;
    write_png(&output, &image).with_context(|| format!("Failed to write {}", output.display()))?;

    info!(path = %output.display(), "Plot written");
    Ok(())
}

// =============================================================================
// animate
// =============================================================================

#[derive(Args, Debug)]
pub struct AnimateArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub map: MapArgs,

    #[command(flatten)]
    pub style: StyleArgs,

    /// Number of frames (default: all time steps)
    #[arg(long)]
    pub frames: Option<usize>,

    /// Milliseconds between frames
    #[arg(long)]
    pub interval: Option<u64>,

    /// Frames per second of the output (default: 1000 / interval)
    #[arg(long)]
    pub fps: Option<f32>,

    /// Video bitrate in kbit/s (default: chosen by the encoder)
    #[arg(long)]
    pub bitrate: Option<u32>,

    /// ffmpeg executable for video output
    #[arg(long, env = "FOCI_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Output file: .gif, .mp4/.mkv/.mov/.avi/.webm, .png or a directory
    /// (default: <var>.mp4)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn animate(args: AnimateArgs, config: &AppConfig) -> Result<()> {
    let projection = args.map.resolve()?;
    let mut settings = args
        .style
        .apply(config.defaults.clone(), default_size(projection.as_ref()));
    if args.frames.is_some() {
        settings.frames = args.frames;
    }
    if let Some(interval) = args.interval {
        anyhow::ensure!(interval > 0, "--interval must be greater than 0");
        settings.interval_ms = interval;
    }

    let mut save = config.save.clone();
    if args.fps.is_some() {
        save.fps = args.fps;
    }
    if args.bitrate.is_some() {
        save.bitrate = args.bitrate;
    }
    if let Some(ffmpeg) = args.ffmpeg {
        save.ffmpeg = ffmpeg;
    }
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.mp4", args.data.var)));

    let dataset = load_dataset(&args.data.folder, &args.data.data, &args.data.var, &settings)
        .with_context(|| format!("Failed to load '{}' from {}", args.data.var, args.data.folder.display()))?;
    let anim = animation_for(dataset, projection, &settings).context("Failed to set up animation")?;
    info!(
        frames = anim.frame_count(),
        interval_ms = anim.interval_ms(),
        width = anim.size().0,
        height = anim.size().1,
        "Rendering animation"
    );

    anim.save(&output, &save)
        .with_context(|| format!("Failed to save animation to {}", output.display()))?;
    Ok(())
}

// =============================================================================
// info
// =============================================================================

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Folder holding the model output
    #[arg(long, env = "FOCI_DATA_DIR")]
    pub folder: PathBuf,

    /// File name inside the folder, `*` and `?` match several files
    #[arg(long)]
    pub data: String,

    /// Also load this variable and summarise it
    #[arg(long = "var")]
    pub var: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct FileReport {
    path: PathBuf,
    variables: Vec<VariableInfo>,
}

#[derive(Debug, Serialize)]
struct VariableSummary {
    name: String,
    units: Option<String>,
    long_name: Option<String>,
    /// `(time, rows, cols)`
    shape: (usize, usize, usize),
    first_date: Option<String>,
    last_date: Option<String>,
    min: Option<f32>,
    max: Option<f32>,
    bounds: Option<BoundingBox>,
}

#[derive(Debug, Serialize)]
struct InfoReport {
    files: Vec<FileReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    variable: Option<VariableSummary>,
}

pub fn info(args: InfoArgs) -> Result<()> {
    let report = build_report(&args.folder, &args.data, args.var.as_deref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn build_report(folder: &Path, data: &str, var: Option<&str>) -> Result<InfoReport> {
    let paths = resolve_paths(folder, data)?;
    let files = paths
        .iter()
        .map(|path| {
            let variables =
                list_variables(path).with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(FileReport {
                path: path.clone(),
                variables,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let variable = match var {
        Some(var) => {
            let ds = open_dataset(&paths, var, &LoadOptions::default())?;
            let (nt, rows, cols) = ds.field.shape();
            let range = ds.field.value_range(0, nt);
            Some(VariableSummary {
                name: ds.field.name.clone(),
                units: ds.field.units.clone(),
                long_name: ds.field.long_name.clone(),
                shape: (nt, rows, cols),
                first_date: ds.time.date_label(0),
                last_date: nt.checked_sub(1).and_then(|last| ds.time.date_label(last)),
                min: range.map(|r| r.0),
                max: range.map(|r| r.1),
                bounds: ds.grid.bounds(),
            })
        }
        None => None,
    };

    Ok(InfoReport { files, variable })
}

fn print_report(report: &InfoReport) {
    for file in &report.files {
        println!("{}", file.path.display());
        for var in &file.variables {
            let dims: Vec<String> = var
                .dimensions
                .iter()
                .map(|(name, len)| format!("{}={}", name, len))
                .collect();
            let marker = if var.is_animatable() { "*" } else { " " };
            println!(
                "  {} {:<16} ({}) {}",
                marker,
                var.name,
                dims.join(", "),
                var.long_name.as_deref().unwrap_or("")
            );
        }
    }
    if let Some(v) = &report.variable {
        println!();
        println!("{} [{}]", v.name, v.units.as_deref().unwrap_or("-"));
        println!("  steps: {}  grid: {}x{}", v.shape.0, v.shape.1, v.shape.2);
        if let (Some(first), Some(last)) = (&v.first_date, &v.last_date) {
            println!("  dates: {} .. {}", first, last);
        }
        if let (Some(min), Some(max)) = (v.min, v.max) {
            println!("  range: {} .. {}", min, max);
        }
        if let Some(b) = &v.bounds {
            println!("  lon: {:.2} .. {:.2}  lat: {:.2} .. {:.2}", b.min_x, b.max_x, b.min_y, b.max_y);
        }
    }
}
