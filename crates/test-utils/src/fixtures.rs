//! Common test fixtures for cru-temp tests.
//!
//! Run configurations in the YAML layout read by `cru_temp::RunConfig`, and
//! a writer for small CRU-shaped NetCDF files.

use std::path::Path;

use cru_common::GridShape;

/// File name the Alaska/lowres dataset is resolved to.
pub const ALASKA_LOWRES_FILE: &str = "cru_alaska_lowres_temperature.nc";

/// Months in a small synthetic file: 1901-01 through 1903-12.
pub const SYNTHETIC_MONTHS: usize = 36;

/// Absolute grid of a small synthetic file.
pub const SYNTHETIC_GRID: GridShape = GridShape { rows: 12, cols: 10 };

/// Default Alaska run: 30 day steps through 1901 on a decimated window.
///
/// Rows start at `y = 2` with stride 3, columns at `x = 1` with stride 2.
pub const ALASKA_LOWRES_YAML: &str = r#"
grid_type: uniform_rectilinear
grid_shape: [4, 5]
grids:
  temperature: np.float32
timestep: 30
model_start_date: 1901-01-01
model_end_date: 1901-12-31
dataset_start_date: 1901-01-01
dataset_end_date: 1903-12-31
i_ul: 1
j_ul: 2
i_skip: 2
j_skip: 3
run_region: Alaska
run_resolution: lowres
"#;

/// [`ALASKA_LOWRES_YAML`] pointed at a data directory.
pub fn alaska_config_yaml(data_dir: &Path) -> String {
    format!(
        "{}data_directory: {}\n",
        ALASKA_LOWRES_YAML,
        data_dir.display()
    )
}

/// Write a CRU-shaped NetCDF file.
///
/// `data` is `[month, row, col]` row-major. Coordinates, when given, are
/// row-major `rows x cols` latitude and longitude grids.
pub fn write_cru_netcdf(
    path: &Path,
    months: usize,
    grid: GridShape,
    data: &[f32],
    coordinates: Option<(&[f32], &[f32])>,
) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;

    file.add_attribute("title", "Synthetic CRU NCEP monthly temperature")?;
    file.add_dimension("time", months)?;
    file.add_dimension("y", grid.rows)?;
    file.add_dimension("x", grid.cols)?;

    {
        let mut temp_var = file.add_variable::<f32>("temp", &["time", "y", "x"])?;
        temp_var.put_attribute("units", "deg_C")?;
        temp_var.put_attribute("long_name", "monthly mean air temperature")?;
        temp_var.put_attribute("_FillValue", -9999.0f32)?;
        temp_var.put_values(data, ..)?;
    }

    if let Some((lat, lon)) = coordinates {
        {
            let mut lat_var = file.add_variable::<f32>("lat", &["y", "x"])?;
            lat_var.put_attribute("units", "degrees_north")?;
            lat_var.put_values(lat, ..)?;
        }
        {
            let mut lon_var = file.add_variable::<f32>("lon", &["y", "x"])?;
            lon_var.put_attribute("units", "degrees_east")?;
            lon_var.put_values(lon, ..)?;
        }
    }

    Ok(())
}

/// Write the standard synthetic dataset (values from
/// [`crate::create_test_volume`]) as [`ALASKA_LOWRES_FILE`] in `dir`.
pub fn write_synthetic_dataset(dir: &Path) -> Result<std::path::PathBuf, netcdf::Error> {
    let path = dir.join(ALASKA_LOWRES_FILE);
    let data = crate::create_test_volume(SYNTHETIC_MONTHS, SYNTHETIC_GRID.rows, SYNTHETIC_GRID.cols);
    let (lat, lon) = crate::create_coordinate_grids(SYNTHETIC_GRID.rows, SYNTHETIC_GRID.cols);
    write_cru_netcdf(
        &path,
        SYNTHETIC_MONTHS,
        SYNTHETIC_GRID,
        &data,
        Some((&lat, &lon)),
    )?;
    Ok(path)
}
