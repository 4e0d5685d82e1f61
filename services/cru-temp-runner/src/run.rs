//! The stepping loop.

use chrono::NaiveDate;
use cru_temp::{AdvanceOutcome, CruResult, CruTempModel};
use tracing::{info, warn};

use crate::report::StepReport;

/// Step `model` until its date reaches `until` (default: the model end
/// date), one step at a time, recording each step.
pub fn run_to(model: &mut CruTempModel, until: Option<NaiveDate>) -> CruResult<Vec<StepReport>> {
    let end = model.last_date();
    let goal = match until {
        Some(date) if date > end => {
            warn!(until = %date, end = %end, "Stop date is past the model end date, using end date");
            end
        }
        Some(date) => date,
        None => end,
    };

    let mut reports = Vec::new();
    while model.current_date() < goal {
        // Target the next day so each call takes at most one step.
        let Some(next_day) = model.current_date().succ_opt() else {
            break;
        };
        match model.advance_until(next_day)? {
            AdvanceOutcome::NoOp { .. } => break,
            outcome if outcome.steps() == 0 => break,
            _ => {}
        }

        let report = StepReport::capture(model)?;
        match &report.stats {
            Some(stats) => info!(
                timestep = report.timestep,
                date = %report.date,
                month = report.month_index,
                min = stats.min,
                mean = stats.mean,
                max = stats.max,
                valid = stats.valid_cells,
                "Step"
            ),
            None => warn!(
                timestep = report.timestep,
                date = %report.date,
                month = report.month_index,
                "Step has no valid cells"
            ),
        }
        reports.push(report);
    }

    if model.current_date() < goal {
        warn!(
            date = %model.current_date(),
            goal = %goal,
            "Stopped early, the next step would leave the dataset"
        );
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cru_temp::{InMemorySource, RunConfig};
    use test_utils::{create_test_volume, ALASKA_LOWRES_YAML, SYNTHETIC_GRID, SYNTHETIC_MONTHS};

    fn model() -> CruTempModel {
        let config = RunConfig::from_yaml_str(ALASKA_LOWRES_YAML).unwrap();
        let source = InMemorySource::new(
            SYNTHETIC_MONTHS,
            SYNTHETIC_GRID,
            create_test_volume(SYNTHETIC_MONTHS, SYNTHETIC_GRID.rows, SYNTHETIC_GRID.cols),
        )
        .unwrap();
        CruTempModel::initialize_with_source(&config, &source).unwrap()
    }

    #[test]
    fn test_runs_to_end_date() {
        let mut model = model();
        let reports = run_to(&mut model, None).unwrap();
        assert_eq!(reports.len(), 13);
        assert_eq!(reports[0].timestep, 1);
        assert!(model.current_date() >= model.last_date());
    }

    #[test]
    fn test_stops_at_until() {
        let mut model = model();
        let until = NaiveDate::from_ymd_opt(1901, 3, 1).unwrap();
        let reports = run_to(&mut model, Some(until)).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].month_index, 2);
    }
}
