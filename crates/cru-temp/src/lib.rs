//! Monthly CRU temperature exposed one simulation step at a time.
//!
//! A [`CruTempModel`] is built from a [`RunConfig`]: it validates the run's
//! dates against the dataset, loads the configured sub-window of the
//! temperature file into memory once, and then serves the 2-D slice for the
//! month the simulation clock is in while the caller advances the clock.
//!
//! ```ignore
//! use cru_temp::{CruTempModel, RunConfig};
//!
//! let config = RunConfig::from_yaml_file("alaska.yaml")?;
//! let mut model = CruTempModel::initialize(&config)?;
//! while model.current_date() < model.last_date() {
//!     model.advance_one_step()?;
//!     let slice = model.current_value_slice()?;
//!     println!("{} {:?}", model.current_date(), slice.stats());
//! }
//! model.finalize()?;
//! ```

pub mod clock;
pub mod component;
pub mod config;
pub mod grids;
pub mod model;
pub mod volume;

pub use clock::{AdvanceOutcome, ClockState, ModelClock, TemporalConfig};
pub use component::CruTempComponent;
pub use config::{GridType, RunConfig};
pub use cru_common::{CruError, CruResult, GridShape, SubWindowSpec};
pub use grids::{GridBuffer, GridElementType, GridSet};
pub use model::CruTempModel;
pub use volume::{
    InMemorySource, NetCdfSource, SliceStats, TemperatureSlice, TemperatureSource,
    TemperatureVolume,
};
