//! Single contour-fill plots of one time slice or of the time mean.

use std::path::Path;

use foci_common::field::finite_range;
use image::RgbaImage;
use netcdf_parser::Dataset;
use projection::Projection;
use renderer::{build_plot, frame_title, write_png, Levels, TextRenderer};
use tracing::info;

use crate::animation::load_dataset;
use crate::error::{AnimationError, AnimationResult};
use crate::settings::{AnimationSettings, TimeSelection};

/// Render one slice of an already loaded dataset.
pub fn render_single(
    dataset: &Dataset,
    projection: Option<Projection>,
    time: TimeSelection,
    settings: &AnimationSettings,
) -> AnimationResult<RgbaImage> {
    let title = settings.title_for(&dataset.field.name);
    let (values, title) = match time {
        TimeSelection::Index(i) => {
            let values = dataset.field.slice(i)?.to_vec();
            let date = if settings.show_date {
                dataset.time.date_label(i)
            } else {
                None
            };
            (values, frame_title(&title, i, settings.show_timestep, date.as_deref()))
        }
        TimeSelection::Mean => (dataset.field.time_mean(), format!("{} (time mean)", title)),
    };

    let (min, max) =
        finite_range(&values).ok_or_else(|| AnimationError::EmptyField(dataset.field.name.clone()))?;
    let levels = Levels::from_spec(&settings.levels, min, max)?;

    let text = TextRenderer::load(settings.font_path.as_deref());
    let plot = build_plot(&dataset.grid, projection, &dataset.field.name, &settings.plot_style(), text)?;
    Ok(plot.render(&values, &levels, &title)?)
}

/// Load, render and write a single plot as PNG.
pub fn plot_single(
    folder: &Path,
    data_name: &str,
    var_name: &str,
    projection: Option<Projection>,
    time: TimeSelection,
    settings: &AnimationSettings,
    output: &Path,
) -> AnimationResult<RgbaImage> {
    let dataset = load_dataset(folder, data_name, var_name, settings)?;
    let image = render_single(&dataset, projection, time, settings)?;
    write_png(output, &image)?;
    info!(
        path = %output.display(),
        var = var_name,
        time = ?time,
        width = image.width(),
        height = image.height(),
        "Saved plot"
    );
    Ok(image)
}
