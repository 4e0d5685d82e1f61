//! Native NetCDF reading using the netcdf library.
//!
//! The file is opened, the requested hyperslab is read into memory, and the
//! handle is dropped before returning. Nothing here keeps a file open.

use std::path::Path;
use std::sync::Once;

use cru_common::{GridShape, SubWindowSpec};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::{
    decimate, CruDimensions, TemperatureWindow, LATITUDE_VAR, LONGITUDE_VAR, TEMPERATURE_VAR,
};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This function disables that output by calling
/// H5Eset_auto2 with null handlers. It only needs to be called once per process,
/// but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read the extent of the temperature variable.
pub fn read_dimensions<P: AsRef<Path>>(path: P) -> NetCdfResult<CruDimensions> {
    silence_hdf5_errors();

    let file = open(path.as_ref())?;
    let temp_var = file
        .variable(TEMPERATURE_VAR)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", TEMPERATURE_VAR)))?;

    temperature_dimensions(&temp_var)
}

/// Read the sub-window of the temperature variable for every month.
///
/// Returns `[month, row, col]` data of exactly `window.shape()` per month,
/// plus the matching latitude/longitude cells when the file has them.
pub fn read_temperature_window<P: AsRef<Path>>(
    path: P,
    window: &SubWindowSpec,
) -> NetCdfResult<TemperatureWindow> {
    silence_hdf5_errors();

    let path = path.as_ref();
    let file = open(path)?;

    let temp_var = file
        .variable(TEMPERATURE_VAR)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", TEMPERATURE_VAR)))?;
    let dims = temperature_dimensions(&temp_var)?;

    check_span("y", window.rows.last_sample(), dims.grid.rows)?;
    check_span("x", window.cols.last_sample(), dims.grid.cols)?;

    let rows = window.rows.read_span();
    let cols = window.cols.read_span();
    let span = GridShape::new(rows.len(), cols.len());
    let stride = (window.rows.stride(), window.cols.stride());

    debug!(
        path = %path.display(),
        months = dims.months,
        rows = ?rows,
        cols = ?cols,
        stride = ?stride,
        "Reading temperature hyperslab"
    );

    let raw: Vec<f32> = temp_var.get_values::<f32, _>((.., rows.clone(), cols.clone()))?;
    let raw = unpack(&temp_var, raw);
    let data = decimate(&raw, dims.months, span, stride);

    let latitude = read_coordinate(&file, LATITUDE_VAR, dims.grid, &rows, &cols, stride)?;
    let longitude = read_coordinate(&file, LONGITUDE_VAR, dims.grid, &rows, &cols, stride)?;

    Ok(TemperatureWindow {
        data,
        months: dims.months,
        shape: window.shape(),
        dataset_shape: dims.grid,
        latitude,
        longitude,
    })
}

// =============================================================================
// Internal helpers
// =============================================================================

fn open(path: &Path) -> NetCdfResult<netcdf::File> {
    if !path.exists() {
        return Err(NetCdfError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })
}

fn temperature_dimensions(var: &netcdf::Variable) -> NetCdfResult<CruDimensions> {
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    match shape.as_slice() {
        [months, rows, cols] => Ok(CruDimensions {
            months: *months,
            grid: GridShape::new(*rows, *cols),
        }),
        other => Err(NetCdfError::InvalidFormat(format!(
            "{} must be 3-D [time, y, x], found {} dimensions",
            TEMPERATURE_VAR,
            other.len()
        ))),
    }
}

fn check_span(dimension: &str, last_sample: usize, extent: usize) -> NetCdfResult<()> {
    if last_sample >= extent {
        return Err(NetCdfError::OutOfBounds {
            dimension: dimension.to_string(),
            index: last_sample,
            extent,
        });
    }
    Ok(())
}

/// Read a 2-D `[y, x]` coordinate variable over the window, if present.
fn read_coordinate(
    file: &netcdf::File,
    name: &str,
    grid: GridShape,
    rows: &std::ops::Range<usize>,
    cols: &std::ops::Range<usize>,
    stride: (usize, usize),
) -> NetCdfResult<Option<Vec<f32>>> {
    let Some(var) = file.variable(name) else {
        return Ok(None);
    };
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape != [grid.rows, grid.cols] {
        debug!(variable = name, shape = ?shape, "Skipping coordinate variable with unexpected shape");
        return Ok(None);
    }
    let raw: Vec<f32> = var.get_values::<f32, _>((rows.clone(), cols.clone()))?;
    Ok(Some(decimate(
        &raw,
        1,
        GridShape::new(rows.len(), cols.len()),
        stride,
    )))
}

/// Apply packing attributes and replace fill values with NaN.
fn unpack(var: &netcdf::Variable, raw: Vec<f32>) -> Vec<f32> {
    let scale_factor = get_f32_attr(var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f32_attr(var, "add_offset").unwrap_or(0.0);
    let fill_value = get_f32_attr(var, "_FillValue");
    let missing_value = get_f32_attr(var, "missing_value");

    raw.into_iter()
        .map(|val| {
            if Some(val) == fill_value || Some(val) == missing_value || !is_valid_f32(val) {
                f32::NAN
            } else {
                val * scale_factor + add_offset
            }
        })
        .collect()
}

/// CF default fill values are ~9.97e36; anything that large is missing.
fn is_valid_f32(v: f32) -> bool {
    v.is_finite() && v.abs() < 1.0e30
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f32 attribute.
fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_span() {
        assert!(check_span("y", 9, 10).is_ok());
        let err = check_span("x", 10, 10).unwrap_err();
        assert!(matches!(err, NetCdfError::OutOfBounds { index: 10, extent: 10, .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_dimensions("/nonexistent/cru_alaska_lowres_temperature.nc").unwrap_err();
        assert!(matches!(err, NetCdfError::IoError(_)));
    }

    #[test]
    fn test_fill_detection() {
        assert!(is_valid_f32(-12.5));
        assert!(!is_valid_f32(9.96921e36));
        assert!(!is_valid_f32(f32::NAN));
    }
}
