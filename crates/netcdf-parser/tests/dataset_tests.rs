//! Integration tests reading NetCDF files written by the test fixtures.

use std::path::PathBuf;

use netcdf_parser::{list_variables, open_dataset, open_from_folder, resolve_paths, LoadOptions, NetCdfError};
use test_utils::{
    assert_approx_eq, land_mask, temp_test_dir, GridSpec, NetcdfFixture, FIVE_DAYS, NORTH_ATLANTIC, YEAR_2000,
};

fn write(dir: &std::path::Path, name: &str, fixture: &NetcdfFixture) -> PathBuf {
    let path = dir.join(name);
    fixture.write(&path).expect("write fixture");
    path
}

// ============================================================================
// Single file
// ============================================================================

#[test]
fn test_open_single_file_masks_land() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "sst.nc", &NetcdfFixture::sst(NORTH_ATLANTIC, 3));

    let ds = open_dataset(&[path], "sosstsst", &LoadOptions::default()).unwrap();
    assert_eq!(ds.field.shape(), (3, NORTH_ATLANTIC.rows, NORTH_ATLANTIC.cols));
    assert_eq!(ds.grid.shape(), (NORTH_ATLANTIC.rows, NORTH_ATLANTIC.cols));
    assert_eq!(ds.field.units.as_deref(), Some("degC"));

    let mask = land_mask(NORTH_ATLANTIC.rows, NORTH_ATLANTIC.cols);
    let slice = ds.field.slice(0).unwrap();
    for (v, land) in slice.iter().zip(mask.iter()) {
        assert_eq!(v.is_nan(), *land);
    }
}

#[test]
fn test_missing_value_none_keeps_zeros() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "sst.nc", &NetcdfFixture::sst(NORTH_ATLANTIC, 1));

    let options = LoadOptions {
        missing_value: None,
        ..LoadOptions::default()
    };
    let ds = open_dataset(&[path], "sosstsst", &options).unwrap();
    let slice = ds.field.slice(0).unwrap();
    assert!(slice.iter().all(|v| !v.is_nan()));
    assert!(slice.iter().any(|&v| v == 0.0));
}

#[test]
fn test_fill_value_attribute_is_masked() {
    let dir = temp_test_dir();
    let spec = GridSpec::regular(2, 2, 0.0, 1.0, 0.0, 1.0);
    let fixture = NetcdfFixture::new("sosstsst", spec, 1, vec![1.0, f32::NAN, 3.0, 4.0]).with_fill_value(1e20);
    let path = write(dir.path(), "fill.nc", &fixture);

    let ds = open_dataset(&[path], "sosstsst", &LoadOptions::default()).unwrap();
    let slice = ds.field.slice(0).unwrap();
    assert_eq!(slice[0], 1.0);
    assert!(slice[1].is_nan());
}

#[test]
fn test_packed_values_are_unpacked() {
    let dir = temp_test_dir();
    let spec = GridSpec::regular(2, 2, 0.0, 1.0, 0.0, 1.0);
    let fixture = NetcdfFixture::new("sosstsst", spec, 1, vec![12.34, f32::NAN, 5.0, 10.5]).packed(0.01, 10.0);
    let path = write(dir.path(), "packed.nc", &fixture);

    let ds = open_dataset(&[path], "sosstsst", &LoadOptions::default()).unwrap();
    let slice = ds.field.slice(0).unwrap();
    assert_approx_eq!(slice[0], 12.34, 1e-4);
    // The fill is compared in packed units, so it never becomes a real value
    assert!(slice[1].is_nan(), "{:?}", slice);
    assert_approx_eq!(slice[2], 5.0, 1e-4);
    assert_approx_eq!(slice[3], 10.5, 1e-4);
}

#[test]
fn test_coordinate_fill_values_are_masked() {
    let dir = temp_test_dir();
    let spec = GridSpec::regular(2, 2, 0.0, 1.0, 0.0, 1.0);
    let fixture = NetcdfFixture::new("sosstsst", spec, 1, vec![1.0, f32::NAN, 3.0, 4.0])
        .with_fill_value(1e20)
        .with_coordinate_fill(1e20);
    let path = write(dir.path(), "coords.nc", &fixture);

    let ds = open_dataset(&[path], "sosstsst", &LoadOptions::default()).unwrap();
    assert!(ds.grid.lon_at(0, 1).is_nan());
    assert!(ds.grid.lat_at(0, 1).is_nan());
    assert_approx_eq!(ds.grid.lon_at(1, 1), 1.0, 1e-6);
    assert_approx_eq!(ds.grid.lat_at(1, 1), 1.0, 1e-6);
    assert!(ds.grid.interpolate(0.5, 0.5).is_none());
    assert!(ds.grid.interpolate(1.0, 0.0).is_some());
}

#[test]
fn test_time_is_decoded() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "sst.nc", &NetcdfFixture::sst(NORTH_ATLANTIC, 2));

    let ds = open_dataset(&[path], "sosstsst", &LoadOptions::default()).unwrap();
    assert_eq!(ds.time.date_label(0).as_deref(), Some("2000-01-01"));
    assert_eq!(ds.time.date_label(1).as_deref(), Some("2000-01-06"));
}

#[test]
fn test_one_dimensional_coordinates_are_broadcast() {
    let dir = temp_test_dir();
    let spec = GridSpec::regular(4, 5, -10.0, 10.0, 40.0, 55.0);
    let path = write(dir.path(), "regular.nc", &NetcdfFixture::sst(spec, 1).with_1d_coords());

    let ds = open_dataset(&[path], "sosstsst", &LoadOptions::default()).unwrap();
    assert_eq!(ds.grid.shape(), (4, 5));
    assert!(ds.grid.is_rectilinear(1e-9));
    assert_approx_eq!(ds.grid.lon_at(3, 4), 10.0, 1e-9);
    assert_approx_eq!(ds.grid.lat_at(3, 0), 55.0, 1e-9);
}

#[test]
fn test_no_time_coordinate_uses_indices() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "notime.nc", &NetcdfFixture::ice(NORTH_ATLANTIC, 3).without_time());

    let ds = open_dataset(&[path], "iicethic", &LoadOptions::default()).unwrap();
    assert_eq!(ds.time.values, vec![0.0, 1.0, 2.0]);
    assert!(ds.time.units.is_none());
}

#[test]
fn test_missing_variable() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "sst.nc", &NetcdfFixture::sst(NORTH_ATLANTIC, 1));

    let err = open_dataset(&[path], "iicethic", &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, NetCdfError::MissingData(_)), "{:?}", err);
}

#[test]
fn test_coordinate_variable_is_not_a_field() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "sst.nc", &NetcdfFixture::sst(NORTH_ATLANTIC, 1));

    let err = open_dataset(&[path.clone()], "time_counter", &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, NetCdfError::InvalidFormat(_)), "{:?}", err);

    let err = open_dataset(&[path], "nav_lat", &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, NetCdfError::InvalidFormat(_)), "{:?}", err);
}

// ============================================================================
// Multiple files
// ============================================================================

#[test]
fn test_glob_concatenates_in_time_order() {
    let dir = temp_test_dir();
    // File names sort opposite to their time order
    let later = NetcdfFixture::sst(NORTH_ATLANTIC, 2).starting_at(YEAR_2000 + 2.0 * FIVE_DAYS);
    let earlier = NetcdfFixture::sst(NORTH_ATLANTIC, 2);
    write(dir.path(), "a_sosstsst.nc", &later);
    write(dir.path(), "b_sosstsst.nc", &earlier);
    write(dir.path(), "c_iicethic.nc", &NetcdfFixture::ice(NORTH_ATLANTIC, 1));

    let ds = open_from_folder(dir.path(), "*_sosstsst.nc", "sosstsst", &LoadOptions::default()).unwrap();
    assert_eq!(ds.time_len(), 4);
    assert_eq!(ds.sources.len(), 2);
    assert!(ds.sources[0].ends_with("b_sosstsst.nc"));
    let times = &ds.time.values;
    assert!(times.windows(2).all(|w| w[0] < w[1]), "{:?}", times);
}

#[test]
fn test_glob_without_matches() {
    let dir = temp_test_dir();
    let err = resolve_paths(dir.path(), "*_sosstsst.nc").unwrap_err();
    assert!(matches!(err, NetCdfError::NoFilesMatched { .. }));
}

#[test]
fn test_mismatched_grids_are_rejected() {
    let dir = temp_test_dir();
    let other = GridSpec {
        min_lon: -50.0,
        ..NORTH_ATLANTIC
    };
    write(dir.path(), "1_sosstsst.nc", &NetcdfFixture::sst(NORTH_ATLANTIC, 1));
    write(
        dir.path(),
        "2_sosstsst.nc",
        &NetcdfFixture::sst(other, 1).starting_at(YEAR_2000 + FIVE_DAYS),
    );

    let err = open_from_folder(dir.path(), "*.nc", "sosstsst", &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, NetCdfError::InvalidFormat(_)), "{:?}", err);
}

// ============================================================================
// Variable listing
// ============================================================================

#[test]
fn test_list_variables() {
    let dir = temp_test_dir();
    let path = write(dir.path(), "sst.nc", &NetcdfFixture::sst(NORTH_ATLANTIC, 2));

    let vars = list_variables(&path).unwrap();
    let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["nav_lat", "nav_lon", "sosstsst", "time_counter"]);

    let sst = vars.iter().find(|v| v.name == "sosstsst").unwrap();
    assert!(sst.is_animatable());
    assert_eq!(sst.dimensions[0], ("time_counter".to_string(), 2));
    assert_eq!(sst.long_name.as_deref(), Some("Sea Surface Temperature"));
}
