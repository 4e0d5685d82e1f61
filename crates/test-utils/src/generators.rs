//! Synthetic temperature volumes.
//!
//! Values are generated from absolute dataset coordinates so a test can
//! tell exactly which month, row and column a loaded cell came from.

/// Value stored at an absolute `(month, row, col)` of a test volume.
///
/// `month * 10000 + row * 100 + col`, exact in `f32` for the sizes used here.
pub fn volume_value(month: usize, row: usize, col: usize) -> f32 {
    (month * 10_000 + row * 100 + col) as f32
}

/// Creates a `[month, row, col]` volume filled with [`volume_value`].
///
/// # Example
///
/// ```
/// use test_utils::create_test_volume;
///
/// let volume = create_test_volume(2, 3, 4);
/// assert_eq!(volume.len(), 24);
/// assert_eq!(volume[0], 0.0);
/// assert_eq!(volume[5], 101.0);     // month 0, row 1, col 1
/// assert_eq!(volume[12], 10_000.0); // month 1, row 0, col 0
/// ```
pub fn create_test_volume(months: usize, rows: usize, cols: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(months * rows * cols);
    for month in 0..months {
        for row in 0..rows {
            for col in 0..cols {
                data.push(volume_value(month, row, col));
            }
        }
    }
    data
}

/// Latitude/longitude grids for a `rows x cols` dataset, row-major.
pub fn create_coordinate_grids(rows: usize, cols: usize) -> (Vec<f32>, Vec<f32>) {
    let mut lat = Vec::with_capacity(rows * cols);
    let mut lon = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            lat.push(55.0 + 0.5 * row as f32);
            lon.push(-170.0 + 0.5 * col as f32);
        }
    }
    (lat, lon)
}
