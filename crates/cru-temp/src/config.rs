//! Run configuration.
//!
//! A run is described by a YAML file such as:
//!
//! ```yaml
//! grid_type: uniform_rectilinear
//! grid_shape: [4, 5]          # rows (y), cols (x) of the simulation grid
//! grids:
//!   temperature: np.float32
//! timestep: 30                # days
//! model_start_date: 1901-01-01
//! model_end_date: 1901-12-31
//! dataset_start_date: 1901-01-01
//! dataset_end_date: 2009-12-31
//! i_ul: 1                     # absolute x of local column 0
//! j_ul: 2                     # absolute y of local row 0
//! i_skip: 2                   # x stride, default 1
//! j_skip: 3                   # y stride, default 1
//! run_region: Alaska
//! run_resolution: lowres
//! ```
//!
//! `i` runs along the dataset's `x` dimension (the last dimension of
//! `temp[time, y, x]`) and `j` along `y`, so the simulation grid has
//! `grid_shape[0]` rows sampled from `j_ul` and `grid_shape[1]` columns
//! sampled from `i_ul`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use cru_common::time::CRU_BASE_YEAR;
use cru_common::{CruError, CruResult, DateRange, GridShape, SubWindowSpec};
use serde::{Deserialize, Serialize};

use crate::clock::TemporalConfig;
use crate::grids::GridElementType;

/// Environment variable naming the directory that holds dataset files.
pub const DATA_DIR_ENV: &str = "CRU_DATA_DIR";

/// Directory used when neither the config nor the environment names one.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Datasets that a (region, resolution) pair can select.
const KNOWN_DATASETS: &[(&str, &str, &str)] = &[(
    "Alaska",
    "lowres",
    "cru_alaska_lowres_temperature.nc",
)];

/// Configuration for one model run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Grid type; only `uniform_rectilinear` is supported.
    pub grid_type: String,

    /// Simulation grid shape as `[rows, cols]`, i.e. `[y, x]`.
    pub grid_shape: Vec<usize>,

    /// Declared grids by name and element type.
    pub grids: BTreeMap<String, String>,

    /// Step size in whole days.
    pub timestep: u32,

    pub model_start_date: NaiveDate,
    pub model_end_date: NaiveDate,
    pub dataset_start_date: NaiveDate,
    pub dataset_end_date: NaiveDate,

    /// Date of time-step 0; defaults to `model_start_date`.
    #[serde(default)]
    pub date_at_timestep0: Option<NaiveDate>,

    /// Absolute `x` index of local column 0.
    pub i_ul: usize,

    /// Absolute `y` index of local row 0.
    pub j_ul: usize,

    /// Stride along `x`.
    #[serde(default = "default_skip")]
    pub i_skip: usize,

    /// Stride along `y`.
    #[serde(default = "default_skip")]
    pub j_skip: usize,

    pub run_region: String,
    pub run_resolution: String,

    /// Year whose January is month index 0 of the dataset.
    #[serde(default = "default_base_year")]
    pub dataset_base_year: i32,

    /// Directory holding the dataset file.
    #[serde(default)]
    pub data_directory: Option<PathBuf>,
}

fn default_skip() -> usize {
    1
}

fn default_base_year() -> i32 {
    CRU_BASE_YEAR
}

impl RunConfig {
    /// Load and validate a configuration file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> CruResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CruError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
            .map_err(|e| CruError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse and validate a configuration document.
    pub fn from_yaml_str(contents: &str) -> CruResult<Self> {
        let config: RunConfig = serde_yaml::from_str(contents)
            .map_err(|e| CruError::config(format!("Invalid run configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field that can be checked without opening the dataset.
    pub fn validate(&self) -> CruResult<()> {
        self.parsed_grid_type()?;
        self.shape()?;
        self.grid_declarations()?;
        self.sub_window()?;
        self.temporal_config()?.validate()?;
        self.dataset_file_name()?;
        Ok(())
    }

    pub fn parsed_grid_type(&self) -> CruResult<GridType> {
        self.grid_type.parse()
    }

    /// Simulation grid shape.
    pub fn shape(&self) -> CruResult<GridShape> {
        match self.grid_shape.as_slice() {
            [rows, cols] if *rows > 0 && *cols > 0 => Ok(GridShape::new(*rows, *cols)),
            other => Err(CruError::invalid_value(
                "grid_shape",
                format!("expected two positive integers, got {:?}", other),
            )),
        }
    }

    /// Declared grids with their parsed element types, sorted by name.
    pub fn grid_declarations(&self) -> CruResult<Vec<(String, GridElementType)>> {
        if self.grids.is_empty() {
            return Err(CruError::invalid_value(
                "grids",
                "at least one grid must be declared",
            ));
        }
        self.grids
            .iter()
            .map(|(name, dtype)| {
                if name.trim().is_empty() {
                    return Err(CruError::invalid_value("grids", "grid names must not be empty"));
                }
                let element_type = dtype.parse().map_err(|e: CruError| {
                    CruError::invalid_value(format!("grids.{}", name), e.to_string())
                })?;
                Ok((name.clone(), element_type))
            })
            .collect()
    }

    /// Sub-window of the dataset grid: rows follow `j_*` along `y`,
    /// columns follow `i_*` along `x`.
    pub fn sub_window(&self) -> CruResult<SubWindowSpec> {
        SubWindowSpec::new(
            (self.j_ul, self.i_ul),
            (self.j_skip, self.i_skip),
            self.shape()?,
        )
    }

    /// Temporal settings for the clock.
    pub fn temporal_config(&self) -> CruResult<TemporalConfig> {
        let config = TemporalConfig {
            step_days: self.timestep,
            clock_zero: self.date_at_timestep0.unwrap_or(self.model_start_date),
            model_range: DateRange::new(self.model_start_date, self.model_end_date),
            dataset_range: DateRange::new(self.dataset_start_date, self.dataset_end_date),
        };
        Ok(config)
    }

    /// File name selected by `run_region` and `run_resolution`.
    pub fn dataset_file_name(&self) -> CruResult<&'static str> {
        KNOWN_DATASETS
            .iter()
            .find(|(region, resolution, _)| {
                *region == self.run_region && *resolution == self.run_resolution
            })
            .map(|(_, _, file)| *file)
            .ok_or_else(|| CruError::UnknownDataset {
                region: self.run_region.clone(),
                resolution: self.run_resolution.clone(),
            })
    }

    /// Directory the dataset is read from: `data_directory`, else
    /// `$CRU_DATA_DIR`, else `./data`.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_directory {
            return dir.clone();
        }
        std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Full path of the selected dataset file.
    pub fn dataset_path(&self) -> CruResult<PathBuf> {
        Ok(self.data_dir().join(self.dataset_file_name()?))
    }
}

/// Supported grid types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridType {
    UniformRectilinear,
}

impl GridType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UniformRectilinear => "uniform_rectilinear",
        }
    }
}

impl FromStr for GridType {
    type Err = CruError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uniform_rectilinear" => Ok(Self::UniformRectilinear),
            other => Err(CruError::invalid_value(
                "grid_type",
                format!("unrecognized grid type '{}'", other),
            )),
        }
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
