//! Tests for curvilinear grids and field cubes working together.

use foci_common::{CurvilinearGrid, FieldCube, FociError};

// ============================================================================
// Curvilinear grid tests
// ============================================================================

/// A small rotated grid: columns drift north as they go east.
fn rotated_grid() -> CurvilinearGrid {
    let rows = 3;
    let cols = 4;
    let mut lat = Vec::new();
    let mut lon = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            lat.push(50.0 + r as f64 * 2.0 + c as f64 * 0.5);
            lon.push(-20.0 + c as f64 * 3.0);
        }
    }
    CurvilinearGrid::new(rows, cols, lat, lon).unwrap()
}

#[test]
fn test_rotated_grid_is_not_rectilinear() {
    let grid = rotated_grid();
    assert!(!grid.is_rectilinear(0.01));
    assert!(grid.is_rectilinear(10.0));
}

#[test]
fn test_rotated_grid_axes() {
    let grid = rotated_grid();
    assert_eq!(grid.row_longitudes(), vec![-20.0, -17.0, -14.0, -11.0]);
    assert_eq!(grid.column_latitudes(), vec![50.0, 52.0, 54.0]);
}

#[test]
fn test_rotated_grid_bounds() {
    let bbox = rotated_grid().bounds().unwrap();
    assert_eq!(bbox.min_x, -20.0);
    assert_eq!(bbox.max_x, -11.0);
    assert_eq!(bbox.min_y, 50.0);
    assert_eq!(bbox.max_y, 55.5);
}

#[test]
fn test_interpolate_at_nodes_matches_coordinates() {
    let grid = rotated_grid();
    for r in 0..grid.rows() {
        for c in 0..grid.cols() {
            let (lon, lat) = grid.interpolate(r as f64, c as f64).unwrap();
            assert!((lon - grid.lon_at(r, c)).abs() < 1e-9);
            assert!((lat - grid.lat_at(r, c)).abs() < 1e-9);
        }
    }
}

#[test]
fn test_approx_eq() {
    let a = rotated_grid();
    let b = rotated_grid();
    assert!(a.approx_eq(&b, 1e-9));
    let c = CurvilinearGrid::from_axes(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0, 3.0]).unwrap();
    assert!(!a.approx_eq(&c, 1e-9));
}

// ============================================================================
// Field cube tests
// ============================================================================

#[test]
fn test_field_matches_grid_shape() {
    let grid = rotated_grid();
    let field = FieldCube::new("iicethic", 5, grid.rows(), grid.cols(), vec![1.0; 5 * 12]).unwrap();
    assert_eq!(field.shape(), (5, 3, 4));
    assert_eq!(field.slice(4).unwrap().len(), grid.len());
}

#[test]
fn test_field_out_of_range_slice() {
    let field = FieldCube::new("iicethic", 1, 1, 1, vec![1.0]).unwrap();
    match field.slice(3) {
        Err(FociError::TimeOutOfRange { index, len }) => {
            assert_eq!(index, 3);
            assert_eq!(len, 1);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_mask_zero_sentinel_only_exact_matches() {
    let mut field = FieldCube::new("sosstsst", 1, 1, 4, vec![0.0, -0.0, 1e-7, 12.5]).unwrap();
    // -0.0 == 0.0 under IEEE comparison, so both are masked
    assert_eq!(field.mask_value(0.0), 2);
    let slice = field.slice(0).unwrap();
    assert!(slice[0].is_nan() && slice[1].is_nan());
    assert_eq!(slice[2], 1e-7);
}
