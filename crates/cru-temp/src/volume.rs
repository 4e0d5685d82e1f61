//! The loaded temperature volume and the per-date slice into it.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use cru_common::{CruError, CruResult, GridShape, MonthCalendar, SubWindowSpec};
use netcdf_parser::{decimate, CruDimensions, TemperatureWindow};
use serde::Serialize;

/// Where temperature windows are read from.
pub trait TemperatureSource {
    /// Human readable origin, for logs.
    fn describe(&self) -> String;

    /// Month count and absolute grid of the dataset.
    fn dimensions(&self) -> CruResult<CruDimensions>;

    /// Read every month of `window`, decimated to the window's shape.
    fn read_window(&self, window: &SubWindowSpec) -> CruResult<TemperatureWindow>;
}

/// A CRU NetCDF file on disk.
#[derive(Debug, Clone)]
pub struct NetCdfSource {
    path: PathBuf,
}

impl NetCdfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemperatureSource for NetCdfSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn dimensions(&self) -> CruResult<CruDimensions> {
        Ok(netcdf_parser::read_dimensions(&self.path)?)
    }

    fn read_window(&self, window: &SubWindowSpec) -> CruResult<TemperatureWindow> {
        Ok(netcdf_parser::read_temperature_window(&self.path, window)?)
    }
}

/// A full `[month, row, col]` volume held in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    months: usize,
    grid: GridShape,
    data: Vec<f32>,
    coordinates: Option<(Vec<f32>, Vec<f32>)>,
}

impl InMemorySource {
    pub fn new(months: usize, grid: GridShape, data: Vec<f32>) -> CruResult<Self> {
        let expected = months * grid.len();
        if data.len() != expected {
            return Err(CruError::invalid_argument(
                "data",
                format!(
                    "expected {} values for {} months of {}, got {}",
                    expected,
                    months,
                    grid,
                    data.len()
                ),
            ));
        }
        Ok(Self {
            months,
            grid,
            data,
            coordinates: None,
        })
    }

    /// Attach row-major latitude and longitude grids.
    pub fn with_coordinates(mut self, latitude: Vec<f32>, longitude: Vec<f32>) -> CruResult<Self> {
        if latitude.len() != self.grid.len() || longitude.len() != self.grid.len() {
            return Err(CruError::invalid_argument(
                "coordinates",
                format!("latitude and longitude must each hold {} values", self.grid.len()),
            ));
        }
        self.coordinates = Some((latitude, longitude));
        Ok(self)
    }

    /// Copy the contiguous `span` of each layer, then keep every stride-th cell.
    fn extract(&self, layer_data: &[f32], layers: usize, window: &SubWindowSpec) -> Vec<f32> {
        let rows = window.rows.read_span();
        let cols = window.cols.read_span();
        let span = GridShape::new(rows.len(), cols.len());

        let mut raw = Vec::with_capacity(layers * span.len());
        for layer in 0..layers {
            let layer_base = layer * self.grid.len();
            for row in rows.clone() {
                let start = layer_base + self.grid.flat_index(row, cols.start);
                raw.extend_from_slice(&layer_data[start..start + span.cols]);
            }
        }
        decimate(&raw, layers, span, (window.rows.stride(), window.cols.stride()))
    }
}

impl TemperatureSource for InMemorySource {
    fn describe(&self) -> String {
        format!("in-memory volume ({} months of {})", self.months, self.grid)
    }

    fn dimensions(&self) -> CruResult<CruDimensions> {
        Ok(CruDimensions {
            months: self.months,
            grid: self.grid,
        })
    }

    fn read_window(&self, window: &SubWindowSpec) -> CruResult<TemperatureWindow> {
        window.validate_within(self.grid)?;
        let data = self.extract(&self.data, self.months, window);
        let (latitude, longitude) = match &self.coordinates {
            Some((lat, lon)) => (
                Some(self.extract(lat, 1, window)),
                Some(self.extract(lon, 1, window)),
            ),
            None => (None, None),
        };
        Ok(TemperatureWindow {
            data,
            months: self.months,
            shape: window.shape(),
            dataset_shape: self.grid,
            latitude,
            longitude,
        })
    }
}

/// Temperatures for every month over the simulation window, stored
/// `[month, row, col]` row-major. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct TemperatureVolume {
    data: Vec<f32>,
    shape: GridShape,
    calendar: MonthCalendar,
    latitude: Option<Vec<f32>>,
    longitude: Option<Vec<f32>>,
}

impl TemperatureVolume {
    pub fn new(data: Vec<f32>, months: usize, shape: GridShape, base_year: i32) -> CruResult<Self> {
        if data.len() != months * shape.len() {
            return Err(CruError::data_read(format!(
                "volume holds {} values, expected {} months of {}",
                data.len(),
                months,
                shape
            )));
        }
        Ok(Self {
            data,
            shape,
            calendar: MonthCalendar::new(base_year, months),
            latitude: None,
            longitude: None,
        })
    }

    /// Take ownership of a window read from a source.
    pub fn from_window(window: TemperatureWindow, base_year: i32) -> CruResult<Self> {
        let mut volume = Self::new(window.data, window.months, window.shape, base_year)?;
        volume.latitude = window.latitude;
        volume.longitude = window.longitude;
        Ok(volume)
    }

    pub fn months(&self) -> usize {
        self.calendar.month_count
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn calendar(&self) -> &MonthCalendar {
        &self.calendar
    }

    pub fn latitude(&self) -> Option<&[f32]> {
        self.latitude.as_deref()
    }

    pub fn longitude(&self) -> Option<&[f32]> {
        self.longitude.as_deref()
    }

    /// Month index of `date`, failing when the volume has no such month.
    pub fn month_index(&self, date: NaiveDate) -> CruResult<usize> {
        self.calendar.checked_month_index(date)
    }

    /// The 2-D layer for one month.
    pub fn slice(&self, month_index: usize) -> CruResult<TemperatureSlice<'_>> {
        if month_index >= self.months() {
            return Err(CruError::index_out_of_range(
                "month",
                month_index as i64,
                self.months(),
            ));
        }
        let len = self.shape.len();
        let start = month_index * len;
        Ok(TemperatureSlice {
            month_index,
            shape: self.shape,
            values: &self.data[start..start + len],
        })
    }

    pub fn slice_for_date(&self, date: NaiveDate) -> CruResult<TemperatureSlice<'_>> {
        self.slice(self.month_index(date)?)
    }
}

/// One month of the volume, `shape.rows x shape.cols` row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSlice<'a> {
    month_index: usize,
    shape: GridShape,
    values: &'a [f32],
}

impl<'a> TemperatureSlice<'a> {
    pub fn month_index(&self) -> usize {
        self.month_index
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn values(&self) -> &'a [f32] {
        self.values
    }

    /// Value at a local cell.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.shape.rows || col >= self.shape.cols {
            return None;
        }
        self.values.get(self.shape.flat_index(row, col)).copied()
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.values.to_vec()
    }

    /// Min, mean and max over finite cells; `None` if every cell is missing.
    pub fn stats(&self) -> Option<SliceStats> {
        let mut valid = 0usize;
        let mut sum = 0f64;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for v in self.values.iter().copied().filter(|v| v.is_finite()) {
            valid += 1;
            sum += v as f64;
            min = min.min(v);
            max = max.max(v);
        }
        if valid == 0 {
            return None;
        }
        Some(SliceStats {
            min,
            mean: (sum / valid as f64) as f32,
            max,
            valid_cells: valid,
        })
    }
}

/// Summary of a slice's finite values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliceStats {
    pub min: f32,
    pub mean: f32,
    pub max: f32,
    pub valid_cells: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{create_coordinate_grids, create_test_volume, volume_value};

    fn source() -> InMemorySource {
        InMemorySource::new(3, GridShape::new(12, 10), create_test_volume(3, 12, 10)).unwrap()
    }

    #[test]
    fn test_in_memory_window_is_decimated() {
        let window = SubWindowSpec::new((2, 1), (3, 2), GridShape::new(4, 5)).unwrap();
        let read = source().read_window(&window).unwrap();
        assert_eq!(read.shape, GridShape::new(4, 5));
        assert_eq!(read.data.len(), 3 * 20);

        let volume = TemperatureVolume::from_window(read, 1901).unwrap();
        let slice = volume.slice(2).unwrap();
        assert_eq!(slice.get(3, 4), Some(volume_value(2, 11, 9)));
        assert_eq!(slice.get(0, 0), Some(volume_value(2, 2, 1)));
        assert_eq!(slice.get(4, 0), None);
    }

    #[test]
    fn test_in_memory_coordinates_follow_the_window() {
        let (lat, lon) = create_coordinate_grids(12, 10);
        let source = source().with_coordinates(lat, lon).unwrap();
        let window = SubWindowSpec::new((2, 1), (3, 2), GridShape::new(4, 5)).unwrap();
        let volume = TemperatureVolume::from_window(source.read_window(&window).unwrap(), 1901).unwrap();

        let latitude = volume.latitude().unwrap();
        let longitude = volume.longitude().unwrap();
        assert_eq!(latitude.len(), 20);
        // lat = 55 + 0.5 * row, lon = -170 + 0.5 * col
        assert_eq!(latitude[0], 56.0);
        assert_eq!(latitude[19], 60.5);
        assert_eq!(longitude[0], -169.5);
        assert_eq!(longitude[4], -165.5);

        let (short_lat, lon) = create_coordinate_grids(2, 2);
        assert!(self::source().with_coordinates(short_lat, lon).is_err());
    }

    #[test]
    fn test_in_memory_window_outside_grid_fails() {
        let window = SubWindowSpec::new((2, 1), (4, 2), GridShape::new(4, 5)).unwrap();
        let err = source().read_window(&window).unwrap_err();
        assert!(err.is_range());
    }

    #[test]
    fn test_in_memory_length_checked() {
        assert!(InMemorySource::new(2, GridShape::new(2, 2), vec![0.0; 7]).is_err());
    }

    #[test]
    fn test_slice_for_date_uses_month_index() {
        let volume =
            TemperatureVolume::new(create_test_volume(24, 2, 2), 24, GridShape::new(2, 2), 1901).unwrap();
        let date = NaiveDate::from_ymd_opt(1902, 3, 15).unwrap();
        let slice = volume.slice_for_date(date).unwrap();
        assert_eq!(slice.month_index(), 14);
        assert_eq!(slice.values()[3], volume_value(14, 1, 1));

        let late = NaiveDate::from_ymd_opt(1903, 1, 1).unwrap();
        assert!(volume.slice_for_date(late).unwrap_err().is_range());
    }

    #[test]
    fn test_stats_skip_missing_cells() {
        let data = vec![1.0, f32::NAN, 3.0, 8.0];
        let volume = TemperatureVolume::new(data, 1, GridShape::new(2, 2), 1901).unwrap();
        let stats = volume.slice(0).unwrap().stats().unwrap();
        assert_eq!(stats.valid_cells, 3);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 8.0);
        assert_eq!(stats.mean, 4.0);

        let empty = TemperatureVolume::new(vec![f32::NAN; 4], 1, GridShape::new(2, 2), 1901).unwrap();
        assert!(empty.slice(0).unwrap().stats().is_none());
    }
}
