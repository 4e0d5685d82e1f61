//! NetCDF reader for CRU NCEP monthly temperature data.
//!
//! The CRU files hold a single 3-D variable `temp` dimensioned
//! `[time, y, x]`, one layer per calendar month starting in January of the
//! dataset's base year, plus 2-D `lat`/`lon` coordinate variables
//! dimensioned `[y, x]`.
//!
//! Only the requested sub-window is read. The reader pulls the smallest
//! contiguous hyperslab that covers every sampled cell and decimates it in
//! memory, so the result always has exactly the window's shape.

pub mod error;
pub mod native;

pub use error::{NetCdfError, NetCdfResult};
pub use native::{read_dimensions, read_temperature_window, silence_hdf5_errors};

use cru_common::GridShape;

/// Name of the temperature variable.
pub const TEMPERATURE_VAR: &str = "temp";
/// Name of the 2-D latitude variable.
pub const LATITUDE_VAR: &str = "lat";
/// Name of the 2-D longitude variable.
pub const LONGITUDE_VAR: &str = "lon";

/// Extent of a CRU temperature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CruDimensions {
    /// Length of the time dimension
    pub months: usize,
    /// Absolute spatial grid (y, x)
    pub grid: GridShape,
}

/// Temperature sub-window read from a file.
#[derive(Debug, Clone)]
pub struct TemperatureWindow {
    /// Values in `[month, row, col]` row-major order, fill values as NaN
    pub data: Vec<f32>,
    /// Number of months (all months in the file)
    pub months: usize,
    /// Local shape of the window
    pub shape: GridShape,
    /// Absolute shape of the file's grid
    pub dataset_shape: GridShape,
    /// Latitude of each window cell, when the file carries it
    pub latitude: Option<Vec<f32>>,
    /// Longitude of each window cell, when the file carries it
    pub longitude: Option<Vec<f32>>,
}

/// Keep every `stride`-th row and column of a stack of 2-D layers.
///
/// `raw` holds `layers` consecutive row-major layers of shape `span`.
/// The output has `ceil(span.rows / stride.0)` rows and
/// `ceil(span.cols / stride.1)` columns per layer.
pub fn decimate(raw: &[f32], layers: usize, span: GridShape, stride: (usize, usize)) -> Vec<f32> {
    let (row_stride, col_stride) = (stride.0.max(1), stride.1.max(1));
    let out_rows = span.rows.div_ceil(row_stride);
    let out_cols = span.cols.div_ceil(col_stride);

    let mut out = Vec::with_capacity(layers * out_rows * out_cols);
    for layer in 0..layers {
        for row in (0..span.rows).step_by(row_stride) {
            let base = (layer * span.rows + row) * span.cols;
            out.extend(
                raw[base..base + span.cols]
                    .iter()
                    .step_by(col_stride)
                    .copied(),
            );
        }
    }
    out
}
