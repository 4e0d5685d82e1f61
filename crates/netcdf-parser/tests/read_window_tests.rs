//! Reads synthetic CRU files written into a temp directory.

use cru_common::{GridShape, SubWindowSpec};
use netcdf_parser::{read_dimensions, read_temperature_window, NetCdfError};
use test_utils::{
    create_test_volume, volume_value, write_cru_netcdf, write_synthetic_dataset,
    SYNTHETIC_GRID, SYNTHETIC_MONTHS,
};

#[test]
fn test_read_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_synthetic_dataset(dir.path()).unwrap();

    let dims = read_dimensions(&path).unwrap();
    assert_eq!(dims.months, SYNTHETIC_MONTHS);
    assert_eq!(dims.grid, SYNTHETIC_GRID);
}

#[test]
fn test_strided_window_has_exact_shape_and_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_synthetic_dataset(dir.path()).unwrap();

    let window = SubWindowSpec::new((2, 1), (3, 2), GridShape::new(4, 5)).unwrap();
    let loaded = read_temperature_window(&path, &window).unwrap();

    assert_eq!(loaded.shape, GridShape::new(4, 5));
    assert_eq!(loaded.months, SYNTHETIC_MONTHS);
    assert_eq!(loaded.data.len(), SYNTHETIC_MONTHS * 20);

    for month in [0usize, 17, 35] {
        for row in 0..4 {
            for col in 0..5 {
                let got = loaded.data[(month * 4 + row) * 5 + col];
                let expected = volume_value(month, 2 + 3 * row, 1 + 2 * col);
                assert_eq!(got, expected, "month={} row={} col={}", month, row, col);
            }
        }
    }
}

#[test]
fn test_coordinates_follow_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_synthetic_dataset(dir.path()).unwrap();

    let window = SubWindowSpec::new((0, 4), (1, 3), GridShape::new(2, 2)).unwrap();
    let loaded = read_temperature_window(&path, &window).unwrap();

    let lat = loaded.latitude.expect("lat");
    let lon = loaded.longitude.expect("lon");
    assert_eq!(lat, vec![55.0, 55.0, 55.5, 55.5]);
    assert_eq!(lon, vec![-168.0, -166.5, -168.0, -166.5]);
}

#[test]
fn test_window_past_grid_edge_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_synthetic_dataset(dir.path()).unwrap();

    // Last sampled row would be 2 + 3 * 4 = 14 on a 12-row grid.
    let window = SubWindowSpec::new((2, 0), (3, 1), GridShape::new(5, 2)).unwrap();
    let err = read_temperature_window(&path, &window).unwrap_err();
    assert!(matches!(
        err,
        NetCdfError::OutOfBounds { index: 14, extent: 12, .. }
    ));
}

#[test]
fn test_fill_values_become_nan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("masked.nc");
    let grid = GridShape::new(2, 2);
    let mut data = create_test_volume(1, 2, 2);
    data[3] = -9999.0;
    write_cru_netcdf(&path, 1, grid, &data, None).unwrap();

    let window = SubWindowSpec::new((0, 0), (1, 1), grid).unwrap();
    let loaded = read_temperature_window(&path, &window).unwrap();
    assert!(loaded.data[3].is_nan());
    assert_eq!(loaded.data[2], 100.0);
    assert!(loaded.latitude.is_none());
}
