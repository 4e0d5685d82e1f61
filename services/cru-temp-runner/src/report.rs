//! Serializable records of a run.

use chrono::NaiveDate;
use cru_temp::{ClockState, CruResult, CruTempModel, SliceStats};
use serde::Serialize;

/// The slice the model held after one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub timestep: i64,
    pub date: NaiveDate,
    pub month_index: usize,
    /// `None` when every cell of the slice is missing
    pub stats: Option<SliceStats>,
}

impl StepReport {
    /// Describe the model's current position and slice.
    pub fn capture(model: &CruTempModel) -> CruResult<Self> {
        let slice = model.current_value_slice()?;
        Ok(Self {
            timestep: model.current_timestep(),
            date: model.current_date(),
            month_index: slice.month_index(),
            stats: slice.stats(),
        })
    }
}

/// Everything printed by `--summary`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub region: String,
    pub resolution: String,
    /// Local window shape as `[rows, cols]`
    pub shape: [usize; 2],
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub final_date: NaiveDate,
    pub final_timestep: i64,
    pub state: ClockState,
    pub steps: Vec<StepReport>,
}

impl RunSummary {
    pub fn new(model: &CruTempModel, steps: Vec<StepReport>) -> Self {
        let shape = model.window().shape();
        Self {
            region: model.config().run_region.clone(),
            resolution: model.config().run_resolution.clone(),
            shape: [shape.rows, shape.cols],
            first_date: model.first_date(),
            last_date: model.last_date(),
            final_date: model.current_date(),
            final_timestep: model.current_timestep(),
            state: model.state(),
            steps,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
