//! Error types for NetCDF parsing operations.

use cru_common::CruError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Requested window does not fit the file's grid
    #[error("Window needs {dimension} index {index} but the file has {extent}")]
    OutOfBounds {
        dimension: String,
        index: usize,
        extent: usize,
    },

    /// Error reported by libnetcdf
    #[error("NetCDF library error: {0}")]
    Library(#[from] netcdf::Error),
}

impl From<NetCdfError> for CruError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::IoError(e) => CruError::Io(e),
            NetCdfError::OutOfBounds {
                dimension,
                index,
                extent,
            } => CruError::index_out_of_range(dimension, index as i64, extent),
            other => CruError::data_read(other.to_string()),
        }
    }
}
