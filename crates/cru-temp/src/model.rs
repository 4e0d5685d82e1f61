//! The CRU temperature model: configuration, clock and loaded volume.

use chrono::{NaiveDate, NaiveDateTime};
use cru_common::{CruResult, GridShape, SubWindowSpec};
use tracing::{debug, info};

use crate::clock::{AdvanceOutcome, ClockState, ModelClock};
use crate::config::RunConfig;
use crate::grids::GridSet;
use crate::volume::{NetCdfSource, TemperatureSlice, TemperatureSource, TemperatureVolume};

/// Name of the declared grid that mirrors the current temperature slice.
pub const TEMPERATURE_GRID: &str = "temperature";

/// An initialized model run.
///
/// Construction performs the whole initialization sequence, so every value
/// of this type has a loaded volume and a clock positioned at the start
/// date. The dataset is not touched again after construction.
#[derive(Debug, Clone)]
pub struct CruTempModel {
    config: RunConfig,
    clock: ModelClock,
    window: SubWindowSpec,
    dataset_shape: GridShape,
    volume: TemperatureVolume,
    grids: GridSet,
}

impl CruTempModel {
    /// Initialize from the dataset file selected by the configuration.
    pub fn initialize(config: &RunConfig) -> CruResult<Self> {
        let source = NetCdfSource::new(config.dataset_path()?);
        Self::initialize_with_source(config, &source)
    }

    /// Initialize, reading temperatures from `source`.
    pub fn initialize_with_source(
        config: &RunConfig,
        source: &dyn TemperatureSource,
    ) -> CruResult<Self> {
        info!(
            state = %ClockState::Initializing,
            source = %source.describe(),
            region = %config.run_region,
            resolution = %config.run_resolution,
            "Initializing CRU temperature model"
        );

        config.validate()?;
        let clock = ModelClock::new(config.temporal_config()?)?;
        let window = config.sub_window()?;

        let dimensions = source.dimensions()?;
        window.validate_within(dimensions.grid)?;
        debug!(
            rows = ?window.rows.read_span(),
            cols = ?window.cols.read_span(),
            row_stride = window.rows.stride(),
            col_stride = window.cols.stride(),
            dataset = %dimensions.grid,
            "Sub-window validated"
        );

        let volume =
            TemperatureVolume::from_window(source.read_window(&window)?, config.dataset_base_year)?;
        volume.month_index(clock.first_date())?;
        volume.month_index(clock.last_date())?;

        let grids = GridSet::allocate(window.shape(), &config.grid_declarations()?);

        let mut model = Self {
            config: config.clone(),
            clock,
            window,
            dataset_shape: dimensions.grid,
            volume,
            grids,
        };
        model.refresh_grids()?;

        info!(
            state = %model.state(),
            shape = %model.window.shape(),
            months = model.volume.months(),
            start = %model.first_date(),
            end = %model.last_date(),
            "Model initialized"
        );
        Ok(model)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn clock(&self) -> &ModelClock {
        &self.clock
    }

    pub fn window(&self) -> &SubWindowSpec {
        &self.window
    }

    /// Absolute grid of the dataset the window was read from.
    pub fn dataset_shape(&self) -> GridShape {
        self.dataset_shape
    }

    pub fn volume(&self) -> &TemperatureVolume {
        &self.volume
    }

    pub fn grids(&self) -> &GridSet {
        &self.grids
    }

    pub fn current_date(&self) -> NaiveDate {
        self.clock.current_date()
    }

    pub fn current_datetime(&self) -> NaiveDateTime {
        self.clock.current_datetime()
    }

    pub fn current_timestep(&self) -> i64 {
        self.clock.current_timestep()
    }

    pub fn step_size_days(&self) -> f64 {
        self.clock.step_size_days()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.clock.first_date()
    }

    pub fn last_date(&self) -> NaiveDate {
        self.clock.last_date()
    }

    pub fn first_timestep(&self) -> i64 {
        self.clock.first_timestep()
    }

    pub fn last_timestep(&self) -> i64 {
        self.clock.last_timestep()
    }

    /// Date the clock shows at `timestep`; see [`ModelClock::date_from_timestep`].
    pub fn date_from_timestep(&self, timestep: i64) -> CruResult<NaiveDate> {
        self.clock.date_from_timestep(timestep)
    }

    /// Month index of the current date within the volume.
    pub fn current_month_index(&self) -> CruResult<usize> {
        self.volume.month_index(self.current_date())
    }

    /// Temperatures for the month the clock is in.
    pub fn current_value_slice(&self) -> CruResult<TemperatureSlice<'_>> {
        self.volume.slice_for_date(self.current_date())
    }

    pub fn advance_one_step(&mut self) -> CruResult<()> {
        let volume = &self.volume;
        self.clock
            .advance_one_step_with(|date| volume.month_index(date).map(|_| ()))?;
        self.refresh_grids()
    }

    pub fn advance_by_fraction(&mut self, fraction: f64) -> CruResult<()> {
        let volume = &self.volume;
        self.clock
            .advance_by_fraction_with(fraction, |date| volume.month_index(date).map(|_| ()))?;
        self.refresh_grids()
    }

    pub fn advance_until(&mut self, target: NaiveDate) -> CruResult<AdvanceOutcome> {
        let volume = &self.volume;
        let outcome = self
            .clock
            .advance_until_with(target, |date| volume.month_index(date).map(|_| ()))?;
        if outcome.steps() > 0 {
            self.refresh_grids()?;
        }
        Ok(outcome)
    }

    /// Stop the run. Dates, time steps and the last slice stay readable.
    pub fn finalize(&mut self) -> CruResult<()> {
        self.clock.finalize()?;
        info!(
            state = %self.state(),
            date = %self.current_date(),
            timestep = self.current_timestep(),
            "Model finalized"
        );
        Ok(())
    }

    /// Copy the current slice into the temperature grid, when one is declared.
    fn refresh_grids(&mut self) -> CruResult<()> {
        if self.grids.get(TEMPERATURE_GRID).is_none() {
            return Ok(());
        }
        let values: Vec<f64> = self
            .volume
            .slice_for_date(self.clock.current_date())?
            .values()
            .iter()
            .map(|v| *v as f64)
            .collect();
        self.grids.get_mut(TEMPERATURE_GRID)?.set_from_f64(&values)
    }
}
