//! Rendering whole figures from synthetic ocean fields.

use foci_common::field::finite_range;
use foci_common::CurvilinearGrid;
use projection::{Projection, ProjectionKind};
use renderer::fill::grid_extent;
use renderer::layout::ViewTransform;
use renderer::plot::{build_plot, FramePlot, GridPlot, MapPlot};
use renderer::{Color, Colormap, FigureSize, LevelSpec, Levels, PlotStyle, RenderError, TextRenderer};
use test_utils::{sst_cube, GridSpec, NORTH_ATLANTIC};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const LAND: [u8; 4] = [0xB1, 0xB2, 0xB4, 255];

fn grid(spec: &GridSpec) -> CurvilinearGrid {
    let (lat, lon) = spec.coordinates();
    CurvilinearGrid::new(spec.rows, spec.cols, lat, lon).unwrap()
}

/// First SST slice with land masked.
fn sst_slice(spec: &GridSpec) -> Vec<f32> {
    sst_cube(spec, 1)
        .into_iter()
        .map(|v| if v == 0.0 { f32::NAN } else { v })
        .collect()
}

fn levels_for(values: &[f32]) -> Levels {
    let (min, max) = finite_range(values).unwrap();
    Levels::from_spec(&LevelSpec::default(), min, max).unwrap()
}

fn pixel(img: &image::RgbaImage, (x, y): (f32, f32)) -> [u8; 4] {
    img.get_pixel(x.floor() as u32, y.floor() as u32).0
}

// ============================================================================
// Grid plots
// ============================================================================

#[test]
fn test_grid_plot_default_size() {
    let plot = GridPlot::new(&grid(&NORTH_ATLANTIC), "sosstsst", &PlotStyle::default(), TextRenderer::default()).unwrap();
    assert_eq!(plot.size(), (640, 480));
}

#[test]
fn test_grid_plot_fills_ocean_and_leaves_land_blank() {
    let spec = NORTH_ATLANTIC;
    let grid = grid(&spec);
    let values = sst_slice(&spec);
    let levels = levels_for(&values);
    let colors = levels.band_colors(&Colormap::default());

    let plot = GridPlot::new(&grid, "sosstsst", &PlotStyle::default(), TextRenderer::default()).unwrap();
    let img = plot.render(&values, &levels, "sosstsst Timestep: 0").unwrap();
    assert_eq!(img.dimensions(), (640, 480));

    let view = ViewTransform::new(grid_extent(&grid).unwrap(), plot.layout().axes).unwrap();

    // Middle of the land block (row 5, column 6.5)
    let land = view.to_pixel(spec.lon(6) + 2.0, spec.lat(5, 0));
    assert_eq!(pixel(&img, land), WHITE);

    // Open ocean in the south-west
    let ocean = pixel(&img, view.to_pixel(-53.0, 33.0));
    assert!(colors.iter().any(|c| c.to_array() == ocean), "{:?} is not a band color", ocean);
}

#[test]
fn test_grid_plot_rejects_wrong_slice_length() {
    let plot = GridPlot::new(&grid(&NORTH_ATLANTIC), "sosstsst", &PlotStyle::default(), TextRenderer::default()).unwrap();
    let levels = Levels::new(vec![0.0, 1.0]).unwrap();
    assert!(matches!(
        plot.render(&[1.0; 10], &levels, ""),
        Err(RenderError::DataMismatch(_))
    ));
}

#[test]
fn test_values_outside_levels_stay_blank() {
    let spec = GridSpec::regular(4, 4, -10.0, 10.0, 40.0, 50.0);
    let grid = grid(&spec);
    let values = vec![100.0f32; spec.len()];
    let levels = Levels::new(vec![0.0, 1.0, 2.0]).unwrap();
    let plot = GridPlot::new(&grid, "x", &PlotStyle::default(), TextRenderer::default()).unwrap();
    let img = plot.render(&values, &levels, "").unwrap();
    let axes = plot.layout().axes;
    assert_eq!(pixel(&img, (axes.center_x(), axes.center_y())), WHITE);
}

#[test]
fn test_custom_figure_size() {
    let style = PlotStyle::default().with_figure(FigureSize::new(4.0, 3.0).with_dpi(50.0));
    let plot = GridPlot::new(&grid(&NORTH_ATLANTIC), "sosstsst", &style, TextRenderer::default()).unwrap();
    assert_eq!(plot.size(), (200, 150));
}

// ============================================================================
// Map plots
// ============================================================================

#[test]
fn test_map_plot_default_sizes() {
    let grid = grid(&NORTH_ATLANTIC);
    let style = PlotStyle::default();
    let pc = build_plot(&grid, Some(Projection::default()), "sosstsst", &style, TextRenderer::default()).unwrap();
    assert_eq!(pc.size(), (1000, 400));
    let robinson = Projection::new(ProjectionKind::Robinson, None).unwrap();
    let rob = build_plot(&grid, Some(robinson), "sosstsst", &style, TextRenderer::default()).unwrap();
    assert_eq!(rob.size(), (800, 400));
    let plain = build_plot(&grid, None, "sosstsst", &style, TextRenderer::default()).unwrap();
    assert_eq!(plain.size(), (640, 480));
}

#[test]
fn test_map_plot_paints_land_under_data() {
    let spec = NORTH_ATLANTIC;
    let grid = grid(&spec);
    let values = sst_slice(&spec);
    let levels = levels_for(&values);
    let colors = levels.band_colors(&Colormap::default());

    let proj = Projection::default();
    let plot = MapPlot::new(&grid, proj.clone(), "sosstsst", &PlotStyle::default(), TextRenderer::default()).unwrap();
    let img = plot.render(&values, &levels, "sosstsst Timestep: 0").unwrap();

    let extent = renderer::fill::projected_extent(&grid, &proj).unwrap();
    let view = ViewTransform::new(extent, plot.layout().axes).unwrap();

    // Row 5, column 6.5: inside the masked block
    let land_lat = spec.lat(5, 0) + spec.skew * 6.5 / (spec.cols - 1) as f64;
    assert_eq!(pixel(&img, view.to_pixel(-34.0, land_lat)), LAND);

    let ocean = pixel(&img, view.to_pixel(-45.0, 37.0));
    assert!(colors.iter().any(|c| c.to_array() == ocean), "{:?} is not a band color", ocean);
}

#[test]
fn test_map_plot_without_land_leaves_mask_blank() {
    let spec = NORTH_ATLANTIC;
    let grid = grid(&spec);
    let values = sst_slice(&spec);
    let style = PlotStyle {
        draw_land: false,
        draw_coastline: false,
        draw_gridlines: false,
        ..PlotStyle::default()
    };
    let proj = Projection::default();
    let plot = MapPlot::new(&grid, proj.clone(), "sosstsst", &style, TextRenderer::default()).unwrap();
    let img = plot.render(&values, &levels_for(&values), "").unwrap();

    let view = ViewTransform::new(renderer::fill::projected_extent(&grid, &proj).unwrap(), plot.layout().axes).unwrap();
    let land_lat = spec.lat(5, 0) + spec.skew * 6.5 / (spec.cols - 1) as f64;
    assert_eq!(pixel(&img, view.to_pixel(-34.0, land_lat)), WHITE);
}

#[test]
fn test_every_projection_renders() {
    let spec = NORTH_ATLANTIC;
    let grid = grid(&spec);
    let values = sst_slice(&spec);
    let levels = levels_for(&values);
    let style = PlotStyle::default().with_figure(FigureSize::MAP.with_dpi(40.0));

    for kind in ProjectionKind::ALL {
        // The tile lies entirely in the northern hemisphere
        if kind == ProjectionKind::SouthPolarStereo {
            continue;
        }
        let proj = Projection::new(kind, Some(-30.0)).unwrap();
        let plot = MapPlot::new(&grid, proj, "sosstsst", &style, TextRenderer::default())
            .unwrap_or_else(|e| panic!("{}: {}", kind, e));
        let img = plot.render(&values, &levels, "t").unwrap();
        assert_eq!(img.dimensions(), (320, 160));
        let filled = img.pixels().filter(|p| p.0 != WHITE).count();
        assert!(filled > 1000, "{}: only {} painted pixels", kind, filled);
    }
}

#[test]
fn test_hidden_hemisphere_is_an_error() {
    let proj = Projection::new(ProjectionKind::Orthographic, Some(150.0)).unwrap();
    match MapPlot::new(&grid(&NORTH_ATLANTIC), proj, "sosstsst", &PlotStyle::default(), TextRenderer::default()) {
        Err(RenderError::UnsupportedGrid(_)) => {}
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("expected an error"),
    }
}

#[test]
fn test_global_extent_uses_projection_domain() {
    let style = PlotStyle {
        global_extent: true,
        ..PlotStyle::default()
    };
    let plot = MapPlot::new(&grid(&NORTH_ATLANTIC), Projection::default(), "sosstsst", &style, TextRenderer::default()).unwrap();
    let axes = plot.layout().axes;
    // 360 x 180 degrees
    assert!((axes.w / axes.h - 2.0).abs() < 0.01);
}

#[test]
fn test_coastline_follows_land_block() {
    let spec = NORTH_ATLANTIC;
    let grid = grid(&spec);
    let values = sst_slice(&spec);
    let plot = MapPlot::new(&grid, Projection::default(), "sosstsst", &PlotStyle::default(), TextRenderer::default()).unwrap();
    let lines = plot.coastline(&values);
    assert_eq!(lines.len(), 1);
    let axes = plot.layout().axes;
    assert!(lines[0].iter().all(|&(x, y)| axes.contains(x, y)));
}

// ============================================================================
// Style configuration
// ============================================================================

#[test]
fn test_style_from_yaml() {
    let yaml = r##"
colormap: viridis_r
figure:
  width_in: 8
  height_in: 6
land_color: "#A0A0A0"
draw_gridlines: false
"##;
    let style: PlotStyle = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(style.colormap, "viridis_r");
    assert_eq!(style.figure, Some(FigureSize::new(8.0, 6.0)));
    assert!(!style.draw_gridlines);
    // Unset fields keep their defaults
    assert!(style.draw_coastline);
    assert_eq!(style.font_size, 10.0);

    let resolved = style.resolve().unwrap();
    assert_eq!(resolved.land, Color::rgb(0xA0, 0xA0, 0xA0));
}

#[test]
fn test_level_spec_from_yaml() {
    assert_eq!(serde_yaml::from_str::<LevelSpec>("20").unwrap(), LevelSpec::Count(20));
    assert_eq!(
        serde_yaml::from_str::<LevelSpec>("[0.0, 0.5, 1.0]").unwrap(),
        LevelSpec::Explicit(vec![0.0, 0.5, 1.0])
    );
    assert_eq!(
        serde_yaml::from_str::<LevelSpec>("interval: 2.5").unwrap(),
        LevelSpec::Interval { interval: 2.5 }
    );
}
