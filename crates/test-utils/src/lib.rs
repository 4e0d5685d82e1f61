//! Shared test utilities for the cru-temp workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers and a skip macro for the real CRU file
//! - Synthetic temperature volumes with predictable values
//! - Run configuration fixtures and a small NetCDF writer
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// The real CRU dataset is large and not committed; tests that need it
/// print a skip message and return early when it is missing.
///
/// ```ignore
/// let path = require_test_file!("cru_alaska_lowres_temperature.nc");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// NaN on both sides counts as equal, which is what masked ocean cells need.
///
/// ```ignore
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        if !(left.is_nan() && right.is_nan()) {
            let diff = (left - right).abs();
            if !(diff <= epsilon) {
                panic!(
                    "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                    left, right, diff, epsilon
                );
            }
        }
    }};
}
