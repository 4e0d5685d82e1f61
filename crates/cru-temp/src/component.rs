//! Standard model-component surface over [`CruTempModel`].
//!
//! Callers that drive several coupled components talk to each one through
//! the same vocabulary: named variables with units, a numbered grid per
//! variable, and time reported as time-step numbers in days. This adapter
//! maps that vocabulary onto the model's typed accessors.

use std::path::Path;

use chrono::NaiveDate;
use cru_common::{CruError, CruResult, GridShape};
use tracing::info;

use crate::clock::{AdvanceOutcome, ClockState};
use crate::config::{GridType, RunConfig};
use crate::grids::GridElementType;
use crate::model::CruTempModel;
use crate::volume::TemperatureSource;

/// Output variable holding the current temperature slice.
pub const TEMPERATURE_VAR: &str = "atmosphere_bottom_air__temperature";
pub const START_DATE_VAR: &str = "datetime__start";
pub const END_DATE_VAR: &str = "datetime__end";

const TIME_UNITS: &str = "days";

const OUTPUT_VARS: &[&str] = &[TEMPERATURE_VAR];

const ATTRIBUTES: &[(&str, &str)] = &[
    ("model_name", "PermaModel_cruAKtemp"),
    ("version", "0.1"),
    ("author_name", "J. Scott Stewart"),
    ("grid_type", "uniform_rectilinear"),
    ("time_step_type", "fixed"),
    ("step_method", "explicit"),
    ("comp_name", "cruAKtemp"),
    ("model_family", "PermaModel"),
    ("cfg_extension", "_cruAKtemp_model.cfg"),
    ("time_units", TIME_UNITS),
];

const VAR_UNITS: &[(&str, &str)] = &[
    (TEMPERATURE_VAR, "deg_C"),
    (START_DATE_VAR, "days"),
    (END_DATE_VAR, "days"),
];

/// Component wrapper; holds no model until initialized.
#[derive(Debug, Default)]
pub struct CruTempComponent {
    model: Option<CruTempModel>,
}

impl CruTempComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a YAML run configuration and initialize from it.
    pub fn initialize_from_file<P: AsRef<Path>>(&mut self, path: P) -> CruResult<()> {
        let config = RunConfig::from_yaml_file(path)?;
        self.initialize(&config)
    }

    pub fn initialize(&mut self, config: &RunConfig) -> CruResult<()> {
        self.ensure_uninitialized()?;
        self.model = Some(CruTempModel::initialize(config)?);
        self.log_initialized();
        Ok(())
    }

    pub fn initialize_with_source(
        &mut self,
        config: &RunConfig,
        source: &dyn TemperatureSource,
    ) -> CruResult<()> {
        self.ensure_uninitialized()?;
        self.model = Some(CruTempModel::initialize_with_source(config, source)?);
        self.log_initialized();
        Ok(())
    }

    pub fn state(&self) -> ClockState {
        self.model
            .as_ref()
            .map_or(ClockState::Uninitialized, CruTempModel::state)
    }

    /// The wrapped model.
    pub fn model(&self) -> CruResult<&CruTempModel> {
        self.model
            .as_ref()
            .ok_or_else(|| CruError::invalid_state("model access", ClockState::Uninitialized))
    }

    fn model_mut(&mut self, operation: &str) -> CruResult<&mut CruTempModel> {
        self.model
            .as_mut()
            .ok_or_else(|| CruError::invalid_state(operation, ClockState::Uninitialized))
    }

    pub fn component_name(&self) -> &'static str {
        if self.model.is_some() {
            "Permamodel CRU-AK Temperature Component"
        } else {
            "CruAKtemp module"
        }
    }

    /// Static component attribute, looked up case-insensitively.
    pub fn attribute(&self, name: &str) -> CruResult<&'static str> {
        let key = name.to_lowercase();
        ATTRIBUTES
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| CruError::invalid_argument("attribute", format!("unknown attribute '{}'", name)))
    }

    pub fn input_var_names(&self) -> &'static [&'static str] {
        &[]
    }

    pub fn output_var_names(&self) -> &'static [&'static str] {
        OUTPUT_VARS
    }

    pub fn var_units(&self, name: &str) -> CruResult<&'static str> {
        VAR_UNITS
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| unknown_variable(name))
    }

    pub fn var_type(&self, name: &str) -> CruResult<GridElementType> {
        require_output(name)?;
        Ok(GridElementType::Float32)
    }

    pub fn var_itemsize(&self, name: &str) -> CruResult<usize> {
        Ok(self.var_type(name)?.itemsize())
    }

    pub fn var_nbytes(&self, name: &str) -> CruResult<usize> {
        Ok(self.var_itemsize(name)? * self.grid_size(self.var_grid(name)?)?)
    }

    /// Grid id of a variable; output variables are numbered from 0.
    pub fn var_grid(&self, name: &str) -> CruResult<usize> {
        OUTPUT_VARS
            .iter()
            .position(|v| *v == name)
            .ok_or_else(|| unknown_variable(name))
    }

    pub fn grid_type(&self, grid: usize) -> CruResult<GridType> {
        require_grid(grid)?;
        self.model()?.config().parsed_grid_type()
    }

    pub fn grid_shape(&self, grid: usize) -> CruResult<GridShape> {
        require_grid(grid)?;
        Ok(self.model()?.window().shape())
    }

    pub fn grid_size(&self, grid: usize) -> CruResult<usize> {
        Ok(self.grid_shape(grid)?.len())
    }

    pub fn grid_rank(&self, grid: usize) -> CruResult<usize> {
        require_grid(grid)?;
        Ok(2)
    }

    pub fn time_units(&self) -> &'static str {
        TIME_UNITS
    }

    /// Time step of the start date, which is also the initial current time.
    pub fn start_time(&self) -> CruResult<f64> {
        Ok(self.model()?.first_timestep() as f64)
    }

    pub fn current_time(&self) -> CruResult<f64> {
        Ok(self.model()?.current_timestep() as f64)
    }

    pub fn end_time(&self) -> CruResult<f64> {
        Ok(self.model()?.last_timestep() as f64)
    }

    /// Step length in days.
    pub fn time_step(&self) -> CruResult<f64> {
        Ok(self.model()?.step_size_days())
    }

    /// Date of [`START_DATE_VAR`].
    pub fn start_date(&self) -> CruResult<NaiveDate> {
        Ok(self.model()?.first_date())
    }

    /// Date of [`END_DATE_VAR`].
    pub fn end_date(&self) -> CruResult<NaiveDate> {
        Ok(self.model()?.last_date())
    }

    pub fn update(&mut self) -> CruResult<()> {
        self.model_mut("update")?.advance_one_step()
    }

    pub fn update_frac(&mut self, fraction: f64) -> CruResult<()> {
        self.model_mut("update_frac")?.advance_by_fraction(fraction)
    }

    pub fn update_until(&mut self, date: NaiveDate) -> CruResult<AdvanceOutcome> {
        self.model_mut("update_until")?.advance_until(date)
    }

    /// Advance to time `time`, in steps, converted to a date the same way
    /// the clock reports its own time steps.
    pub fn update_until_time(&mut self, time: f64) -> CruResult<AdvanceOutcome> {
        if !time.is_finite() {
            return Err(CruError::invalid_argument(
                "time",
                format!("must be finite, got {}", time),
            ));
        }
        let model = self.model_mut("update_until_time")?;
        let date = model.date_from_timestep(time.floor() as i64)?;
        model.advance_until(date)
    }

    /// Flattened copy of a variable's current values.
    pub fn get_value(&self, name: &str) -> CruResult<Vec<f32>> {
        require_output(name)?;
        Ok(self.model()?.current_value_slice()?.to_vec())
    }

    /// Values at flat indices of a variable's grid.
    pub fn get_value_at_indices(&self, name: &str, indices: &[usize]) -> CruResult<Vec<f32>> {
        require_output(name)?;
        let slice = self.model()?.current_value_slice()?;
        let values = slice.values();
        indices
            .iter()
            .map(|&i| {
                values
                    .get(i)
                    .copied()
                    .ok_or_else(|| CruError::index_out_of_range("flat index", i as i64, values.len()))
            })
            .collect()
    }

    pub fn finalize(&mut self) -> CruResult<()> {
        self.model_mut("finalize")?.finalize()
    }

    fn ensure_uninitialized(&self) -> CruResult<()> {
        match &self.model {
            Some(model) => Err(CruError::invalid_state("initialize", model.state())),
            None => Ok(()),
        }
    }

    fn log_initialized(&self) {
        if let Some(model) = &self.model {
            info!(
                component = self.component_name(),
                shape = %model.window().shape(),
                "Component initialized"
            );
        }
    }
}

fn unknown_variable(name: &str) -> CruError {
    CruError::invalid_argument("variable", format!("unknown variable '{}'", name))
}

fn require_output(name: &str) -> CruResult<()> {
    if OUTPUT_VARS.contains(&name) {
        Ok(())
    } else {
        Err(unknown_variable(name))
    }
}

fn require_grid(grid: usize) -> CruResult<()> {
    if grid < OUTPUT_VARS.len() {
        Ok(())
    } else {
        Err(CruError::invalid_argument("grid", format!("unknown grid id {}", grid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::InMemorySource;
    use test_utils::{create_test_volume, ALASKA_LOWRES_YAML, SYNTHETIC_GRID, SYNTHETIC_MONTHS};

    fn component() -> CruTempComponent {
        let config = RunConfig::from_yaml_str(ALASKA_LOWRES_YAML).unwrap();
        let source = InMemorySource::new(
            SYNTHETIC_MONTHS,
            SYNTHETIC_GRID,
            create_test_volume(SYNTHETIC_MONTHS, SYNTHETIC_GRID.rows, SYNTHETIC_GRID.cols),
        )
        .unwrap();
        let mut component = CruTempComponent::new();
        component.initialize_with_source(&config, &source).unwrap();
        component
    }

    #[test]
    fn test_uninitialized_component() {
        let mut component = CruTempComponent::new();
        assert_eq!(component.state(), ClockState::Uninitialized);
        assert_eq!(component.component_name(), "CruAKtemp module");
        assert!(matches!(
            component.update().unwrap_err(),
            CruError::InvalidState { .. }
        ));
        assert!(component.current_time().is_err());
    }

    #[test]
    fn test_attributes() {
        let component = component();
        assert_eq!(component.attribute("MODEL_NAME").unwrap(), "PermaModel_cruAKtemp");
        assert_eq!(component.attribute("time_units").unwrap(), "days");
        assert!(component.attribute("color").is_err());
        assert_eq!(
            component.component_name(),
            "Permamodel CRU-AK Temperature Component"
        );
    }

    #[test]
    fn test_variable_metadata() {
        let component = component();
        assert!(component.input_var_names().is_empty());
        assert_eq!(component.output_var_names(), &[TEMPERATURE_VAR]);
        assert_eq!(component.var_units(TEMPERATURE_VAR).unwrap(), "deg_C");
        assert_eq!(component.var_units(END_DATE_VAR).unwrap(), "days");
        assert_eq!(component.var_grid(TEMPERATURE_VAR).unwrap(), 0);
        assert_eq!(component.grid_shape(0).unwrap(), GridShape::new(4, 5));
        assert_eq!(component.grid_size(0).unwrap(), 20);
        assert_eq!(component.grid_rank(0).unwrap(), 2);
        assert_eq!(component.grid_type(0).unwrap(), GridType::UniformRectilinear);
        assert_eq!(component.var_itemsize(TEMPERATURE_VAR).unwrap(), 4);
        assert_eq!(component.var_nbytes(TEMPERATURE_VAR).unwrap(), 80);
        assert!(component.var_units("soil__temperature").is_err());
        assert!(component.grid_shape(1).is_err());
    }

    #[test]
    fn test_times_in_steps() {
        let mut component = component();
        assert_eq!(component.start_time().unwrap(), 0.0);
        assert_eq!(component.end_time().unwrap(), 12.0);
        assert_eq!(component.time_step().unwrap(), 30.0);
        component.update().unwrap();
        assert_eq!(component.current_time().unwrap(), 1.0);
        component.update_frac(0.5).unwrap();
        assert_eq!(component.current_time().unwrap(), 1.0);
    }

    #[test]
    fn test_update_until_time_lands_on_that_step() {
        let mut component = component();
        let outcome = component.update_until_time(4.0).unwrap();
        assert_eq!(outcome.steps(), 4);
        assert_eq!(component.current_time().unwrap(), 4.0);

        let outcome = component.update_until_time(2.0).unwrap();
        assert!(matches!(outcome, AdvanceOutcome::NoOp { .. }));
        assert!(component.update_until_time(f64::NAN).is_err());
    }

    #[test]
    fn test_start_time_matches_initial_current_time() {
        let yaml = format!(
            "{}date_at_timestep0: 1900-12-02\n",
            ALASKA_LOWRES_YAML.replace("dataset_start_date: 1901-01-01", "dataset_start_date: 1900-01-01")
        );
        let config = RunConfig::from_yaml_str(&yaml).unwrap();
        let source = InMemorySource::new(
            SYNTHETIC_MONTHS,
            SYNTHETIC_GRID,
            create_test_volume(SYNTHETIC_MONTHS, SYNTHETIC_GRID.rows, SYNTHETIC_GRID.cols),
        )
        .unwrap();
        let mut component = CruTempComponent::new();
        component.initialize_with_source(&config, &source).unwrap();

        // Clock zero is one step before the start date.
        assert_eq!(component.start_time().unwrap(), 1.0);
        assert_eq!(component.current_time().unwrap(), component.start_time().unwrap());
        assert_eq!(component.end_time().unwrap(), 13.0);
    }

    #[test]
    fn test_values_at_indices() {
        let component = component();
        let all = component.get_value(TEMPERATURE_VAR).unwrap();
        let picked = component
            .get_value_at_indices(TEMPERATURE_VAR, &[0, 19])
            .unwrap();
        assert_eq!(picked, vec![all[0], all[19]]);
        let err = component
            .get_value_at_indices(TEMPERATURE_VAR, &[20])
            .unwrap_err();
        assert!(err.is_range());
    }

    #[test]
    fn test_second_initialize_rejected() {
        let mut component = component();
        let config = RunConfig::from_yaml_str(ALASKA_LOWRES_YAML).unwrap();
        let source = InMemorySource::new(1, GridShape::new(1, 1), vec![0.0]).unwrap();
        let err = component
            .initialize_with_source(&config, &source)
            .unwrap_err();
        assert!(matches!(err, CruError::InvalidState { .. }));
    }
}
