//! Stepping scenarios against an in-memory synthetic volume.

use chrono::{Duration, NaiveDate};
use cru_temp::{
    AdvanceOutcome, ClockState, CruError, CruTempModel, GridShape, InMemorySource, RunConfig,
};
use test_utils::{
    create_test_volume, volume_value, ALASKA_LOWRES_YAML, SYNTHETIC_GRID, SYNTHETIC_MONTHS,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn source() -> InMemorySource {
    InMemorySource::new(
        SYNTHETIC_MONTHS,
        SYNTHETIC_GRID,
        create_test_volume(SYNTHETIC_MONTHS, SYNTHETIC_GRID.rows, SYNTHETIC_GRID.cols),
    )
    .unwrap()
}

fn config(yaml: &str) -> RunConfig {
    RunConfig::from_yaml_str(yaml).unwrap()
}

fn build(yaml: &str) -> CruTempModel {
    CruTempModel::initialize_with_source(&config(yaml), &source()).unwrap()
}

#[test]
fn test_start_of_1901_is_month_zero() {
    let model = build(ALASKA_LOWRES_YAML);
    assert_eq!(model.current_date(), date(1901, 1, 1));
    assert_eq!(model.current_timestep(), 0);
    assert_eq!(model.first_timestep(), 0);
    assert_eq!(model.current_month_index().unwrap(), 0);
    assert_eq!(model.step_size_days(), 30.0);
    assert_eq!(model.first_date(), date(1901, 1, 1));
    assert_eq!(model.last_date(), date(1901, 12, 31));
}

#[test]
fn test_slice_maps_local_cells_to_strided_absolute_cells() {
    let model = build(ALASKA_LOWRES_YAML);
    let slice = model.current_value_slice().unwrap();
    assert_eq!(slice.shape(), GridShape::new(4, 5));
    for row in 0..4 {
        for col in 0..5 {
            let expected = volume_value(0, 2 + 3 * row, 1 + 2 * col);
            assert_eq!(slice.get(row, col), Some(expected), "cell ({}, {})", row, col);
        }
    }
}

#[test]
fn test_window_past_dataset_fails_before_stepping() {
    // rows 2, 6, 10, 14 on a 12 row grid
    let yaml = ALASKA_LOWRES_YAML.replace("j_skip: 3", "j_skip: 4");
    let err = CruTempModel::initialize_with_source(&config(&yaml), &source()).unwrap_err();
    assert!(err.is_range(), "expected a range error, got {}", err);
    assert!(matches!(err, CruError::IndexOutOfRange { index: 14, extent: 12, .. }));
}

#[test]
fn test_row_and_column_strides_are_independent() {
    let yaml = ALASKA_LOWRES_YAML.replace("i_skip: 2", "i_skip: 1");
    let model = build(&yaml);
    let slice = model.current_value_slice().unwrap();
    assert_eq!(slice.get(3, 4), Some(volume_value(0, 11, 5)));

    let yaml = ALASKA_LOWRES_YAML.replace("j_skip: 3", "j_skip: 1");
    let model = build(&yaml);
    let slice = model.current_value_slice().unwrap();
    assert_eq!(slice.get(3, 4), Some(volume_value(0, 5, 9)));
}

#[test]
fn test_slice_is_stable_between_advances() {
    let mut model = build(ALASKA_LOWRES_YAML);
    model.advance_one_step().unwrap();
    let first = model.current_value_slice().unwrap().to_vec();
    let second = model.current_value_slice().unwrap().to_vec();
    assert_eq!(first, second);
}

#[test]
fn test_each_step_moves_one_step_and_follows_months() {
    let mut model = build(ALASKA_LOWRES_YAML);
    let mut previous = model.current_date();
    for _ in 0..11 {
        model.advance_one_step().unwrap();
        assert_eq!(model.current_date() - previous, Duration::days(30));
        previous = model.current_date();

        let month = model.current_month_index().unwrap();
        let slice = model.current_value_slice().unwrap();
        assert_eq!(slice.month_index(), month);
        assert_eq!(slice.get(0, 0), Some(volume_value(month, 2, 1)));
    }
    assert_eq!(model.current_timestep(), 11);
    assert_eq!(model.state(), ClockState::Stepping);
}

#[test]
fn test_advance_until_clamps_to_end_date() {
    let mut model = build(ALASKA_LOWRES_YAML);
    let outcome = model.advance_until(date(1950, 1, 1)).unwrap();
    assert_eq!(
        outcome,
        AdvanceOutcome::Clamped {
            steps: 13,
            end: date(1901, 12, 31)
        }
    );
    assert!(model.current_date() >= model.last_date());
    assert_eq!(model.current_month_index().unwrap(), 12);
}

#[test]
fn test_advance_until_never_leaves_the_volume() {
    let yaml = ALASKA_LOWRES_YAML
        .replace("model_start_date: 1901-01-01", "model_start_date: 1903-06-01")
        .replace("model_end_date: 1901-12-31", "model_end_date: 1903-12-31");
    let mut model = build(&yaml);
    let outcome = model.advance_until(date(1999, 1, 1)).unwrap();
    assert_eq!(outcome.steps(), 7);
    assert_eq!(model.current_date(), date(1903, 12, 28));
    assert_eq!(model.current_month_index().unwrap(), SYNTHETIC_MONTHS - 1);

    let err = model.advance_one_step().unwrap_err();
    assert!(err.is_range());
    assert_eq!(model.current_date(), date(1903, 12, 28));
}

#[test]
fn test_advance_until_earlier_date_does_nothing() {
    let mut model = build(ALASKA_LOWRES_YAML);
    model.advance_until(date(1901, 6, 1)).unwrap();
    let before = model.current_date();
    let slice_before = model.current_value_slice().unwrap().to_vec();

    let outcome = model.advance_until(date(1901, 2, 1)).unwrap();
    assert!(matches!(outcome, AdvanceOutcome::NoOp { .. }));
    assert_eq!(model.current_date(), before);
    assert_eq!(model.current_value_slice().unwrap().to_vec(), slice_before);
}

#[test]
fn test_fractional_advance_moves_date_only() {
    let mut model = build(ALASKA_LOWRES_YAML);
    model.advance_by_fraction(1.5).unwrap();
    assert_eq!(model.current_date(), date(1901, 2, 15));
    assert_eq!(model.current_timestep(), 0);
    assert_eq!(model.current_value_slice().unwrap().month_index(), 1);

    assert!(model.advance_by_fraction(-1.0).is_err());
}

#[test]
fn test_clock_zero_before_start() {
    let yaml = format!(
        "{}date_at_timestep0: 1900-12-02\n",
        ALASKA_LOWRES_YAML.replace("dataset_start_date: 1901-01-01", "dataset_start_date: 1900-01-01")
    );
    let model = build(&yaml);
    // 30 elapsed days
    assert_eq!(model.current_timestep(), 1);
    assert_eq!(model.first_timestep(), 1);
}

#[test]
fn test_reported_step_date_stays_in_served_month() {
    let yaml = format!(
        "{}date_at_timestep0: 1900-12-10\n",
        ALASKA_LOWRES_YAML.replace("dataset_start_date: 1901-01-01", "dataset_start_date: 1900-01-01")
    );
    let mut model = build(&yaml);
    loop {
        let step_date = model.date_from_timestep(model.current_timestep()).unwrap();
        assert_eq!(
            model.volume().month_index(step_date).unwrap(),
            model.current_month_index().unwrap(),
            "timestep {} at {}",
            model.current_timestep(),
            model.current_date()
        );
        if model.current_date() >= model.last_date() {
            break;
        }
        model.advance_one_step().unwrap();
    }
}

#[test]
fn test_start_outside_dataset_is_configuration_error() {
    let yaml = ALASKA_LOWRES_YAML.replace("model_start_date: 1901-01-01", "model_start_date: 1900-07-01");
    let err = CruTempModel::initialize_with_source(
        &RunConfig {
            model_start_date: date(1900, 7, 1),
            ..config(ALASKA_LOWRES_YAML)
        },
        &source(),
    )
    .unwrap_err();
    assert!(err.is_configuration());
    assert!(RunConfig::from_yaml_str(&yaml).unwrap_err().is_configuration());
}

#[test]
fn test_model_end_past_loaded_months_is_range_error() {
    let short = InMemorySource::new(6, SYNTHETIC_GRID, create_test_volume(6, 12, 10)).unwrap();
    let err = CruTempModel::initialize_with_source(&config(ALASKA_LOWRES_YAML), &short).unwrap_err();
    assert!(err.is_range());
}
