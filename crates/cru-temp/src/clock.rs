//! Model clock: date/time-step bookkeeping and the lifecycle state machine.
//!
//! Time-step numbers are derived from dates with a single conversion,
//! [`ModelClock::timestep_from_date`], which floor-divides the whole days
//! elapsed since the clock-zero date by the step size. Dates before clock
//! zero therefore map to negative steps, and a date that falls part way
//! through a step maps to the step that contains it.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use cru_common::time::days_between;
use cru_common::{CruError, CruResult, DateRange};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Temporal settings of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalConfig {
    /// Step size in whole days
    pub step_days: u32,
    /// Date of time-step 0
    pub clock_zero: NaiveDate,
    /// Simulation start and end dates
    pub model_range: DateRange,
    /// Dates the dataset holds values for
    pub dataset_range: DateRange,
}

impl TemporalConfig {
    /// Check step size, date ordering and that clock zero, start and end
    /// all fall inside the dataset's valid range.
    pub fn validate(&self) -> CruResult<()> {
        if self.step_days == 0 {
            return Err(CruError::invalid_value(
                "timestep",
                "step size must be at least one day",
            ));
        }
        if self.dataset_range.start > self.dataset_range.end {
            return Err(CruError::invalid_value(
                "dataset_end_date",
                format!(
                    "{} precedes dataset_start_date {}",
                    self.dataset_range.end, self.dataset_range.start
                ),
            ));
        }
        if self.model_range.start > self.model_range.end {
            return Err(CruError::invalid_value(
                "model_end_date",
                format!(
                    "{} precedes model_start_date {}",
                    self.model_range.end, self.model_range.start
                ),
            ));
        }
        self.dataset_range
            .require("date_at_timestep0", self.clock_zero)?;
        self.dataset_range
            .require("model_start_date", self.model_range.start)?;
        self.dataset_range
            .require("model_end_date", self.model_range.end)?;
        Ok(())
    }

    pub fn step(&self) -> Duration {
        Duration::days(self.step_days as i64)
    }
}

/// Lifecycle state of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    Uninitialized,
    Initializing,
    Initialized,
    Stepping,
    Finalizing,
    Finalized,
}

impl ClockState {
    /// Whether the clock may be advanced in this state.
    pub fn can_step(&self) -> bool {
        matches!(self, Self::Initialized | Self::Stepping)
    }
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Stepping => "stepping",
            Self::Finalizing => "finalizing",
            Self::Finalized => "finalized",
        };
        write!(f, "{}", name)
    }
}

/// Result of [`ModelClock::advance_until_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// The clock reached the target after `steps` steps.
    Advanced { steps: u64 },
    /// The target was past the model end date; the clock ran to `end`.
    Clamped { steps: u64, end: NaiveDate },
    /// The target preceded the current date; nothing changed.
    NoOp {
        target: NaiveDate,
        current: NaiveDate,
    },
}

impl AdvanceOutcome {
    pub fn steps(&self) -> u64 {
        match self {
            Self::Advanced { steps } | Self::Clamped { steps, .. } => *steps,
            Self::NoOp { .. } => 0,
        }
    }
}

/// Tracks the current date and time step of a run.
#[derive(Debug, Clone)]
pub struct ModelClock {
    config: TemporalConfig,
    state: ClockState,
    current: NaiveDateTime,
    current_timestep: i64,
    first_timestep: i64,
    last_timestep: i64,
}

impl ModelClock {
    /// Validate the temporal settings and place the clock at the start date.
    pub fn new(config: TemporalConfig) -> CruResult<Self> {
        config.validate()?;

        let mut clock = Self {
            config,
            state: ClockState::Initializing,
            current: config.model_range.start.and_time(NaiveTime::MIN),
            current_timestep: 0,
            first_timestep: 0,
            last_timestep: 0,
        };
        clock.first_timestep = clock.timestep_from_date(config.model_range.start);
        clock.last_timestep = clock.timestep_from_date(config.model_range.end);
        clock.current_timestep = clock.first_timestep;
        clock.state = ClockState::Initialized;

        debug!(
            clock_zero = %config.clock_zero,
            start = %config.model_range.start,
            end = %config.model_range.end,
            step_days = config.step_days,
            first_timestep = clock.first_timestep,
            last_timestep = clock.last_timestep,
            "Clock initialized"
        );
        Ok(clock)
    }

    pub fn config(&self) -> &TemporalConfig {
        &self.config
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Time step containing `date`: `floor(days since clock zero / step)`.
    pub fn timestep_from_date(&self, date: NaiveDate) -> i64 {
        days_between(self.config.clock_zero, date).div_euclid(self.config.step_days as i64)
    }

    /// Date the clock shows at `timestep` when stepping whole steps from
    /// the start date.
    ///
    /// Steps are counted from the start date, not from clock zero, so
    /// `timestep_from_date(date_from_timestep(t)) == t` and the date lands
    /// in the same month the clock serves at that step, even when the start
    /// date is not a whole number of steps after clock zero.
    pub fn date_from_timestep(&self, timestep: i64) -> CruResult<NaiveDate> {
        timestep
            .checked_sub(self.first_timestep)
            .and_then(|steps| steps.checked_mul(self.config.step_days as i64))
            .and_then(Duration::try_days)
            .and_then(|offset| self.config.model_range.start.checked_add_signed(offset))
            .ok_or_else(|| {
                CruError::invalid_argument(
                    "timestep",
                    format!("time step {} is not representable as a date", timestep),
                )
            })
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current.date()
    }

    /// Current instant, including any fractional-step offset.
    pub fn current_datetime(&self) -> NaiveDateTime {
        self.current
    }

    pub fn current_timestep(&self) -> i64 {
        self.current_timestep
    }

    pub fn first_timestep(&self) -> i64 {
        self.first_timestep
    }

    pub fn last_timestep(&self) -> i64 {
        self.last_timestep
    }

    pub fn first_date(&self) -> NaiveDate {
        self.config.model_range.start
    }

    pub fn last_date(&self) -> NaiveDate {
        self.config.model_range.end
    }

    pub fn step_size_days(&self) -> f64 {
        self.config.step_days as f64
    }

    /// Advance one whole step.
    ///
    /// `check` is called with the candidate date before anything changes;
    /// an error from it, or a date past the dataset's valid end, leaves the
    /// clock where it was.
    pub fn advance_one_step_with<F>(&mut self, check: F) -> CruResult<()>
    where
        F: FnOnce(NaiveDate) -> CruResult<()>,
    {
        self.ensure_can_step("advance_one_step")?;
        let next = self.next_step()?;
        self.check_candidate(next.date(), check)?;

        self.current = next;
        self.current_timestep = self.timestep_from_date(next.date());
        self.state = ClockState::Stepping;
        debug!(
            date = %self.current_date(),
            timestep = self.current_timestep,
            "Advanced one step"
        );
        Ok(())
    }

    /// Advance by `fraction` of a step without changing the step counter.
    pub fn advance_by_fraction_with<F>(&mut self, fraction: f64, check: F) -> CruResult<()>
    where
        F: FnOnce(NaiveDate) -> CruResult<()>,
    {
        self.ensure_can_step("advance_by_fraction")?;
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(CruError::invalid_argument(
                "fraction",
                format!("must be finite and non-negative, got {}", fraction),
            ));
        }
        let millis = (fraction * self.config.step_days as f64 * 86_400_000.0).round();
        if millis > i64::MAX as f64 {
            return Err(CruError::invalid_argument(
                "fraction",
                format!("{} steps is not representable as a date", fraction),
            ));
        }
        let next = Duration::try_milliseconds(millis as i64)
            .and_then(|offset| self.current.checked_add_signed(offset))
            .ok_or_else(|| {
                CruError::invalid_argument(
                    "fraction",
                    format!("{} steps is not representable as a date", fraction),
                )
            })?;
        self.check_candidate(next.date(), check)?;

        self.current = next;
        self.state = ClockState::Stepping;
        debug!(
            fraction = fraction,
            datetime = %self.current,
            timestep = self.current_timestep,
            "Advanced by fraction of a step"
        );
        Ok(())
    }

    /// Step until the current date reaches `target`.
    ///
    /// A target past the model end date is clamped to it. A target before
    /// the current date is not an error: it is logged and reported as
    /// [`AdvanceOutcome::NoOp`]. A final step that would cross the model end
    /// date into dates the dataset or `check` rejects is skipped.
    pub fn advance_until_with<F>(&mut self, target: NaiveDate, mut check: F) -> CruResult<AdvanceOutcome>
    where
        F: FnMut(NaiveDate) -> CruResult<()>,
    {
        self.ensure_can_step("advance_until")?;
        let current = self.current_date();
        if target < current {
            warn!(
                target = %target,
                current = %current,
                "Target date precedes current date, not advancing"
            );
            return Ok(AdvanceOutcome::NoOp { target, current });
        }

        let end = self.config.model_range.end;
        let (goal, clamped) = if target > end {
            (end, true)
        } else {
            (target, false)
        };

        let mut steps = 0u64;
        while self.current_date() < goal {
            // The step that crosses the end date is optional: it is taken
            // only when it stays inside the data.
            let next = match self.next_step() {
                Ok(next) => next.date(),
                Err(e) => {
                    debug!(error = %e, "Stopping before an unrepresentable step");
                    break;
                }
            };
            if next > end {
                if let Err(e) = self.check_candidate(next, &mut check) {
                    debug!(next = %next, error = %e, "Stopping before a step outside the data");
                    break;
                }
            }
            self.advance_one_step_with(&mut check)?;
            steps += 1;
        }

        if clamped {
            debug!(target = %target, end = %end, steps = steps, "Clamped advance to model end date");
            Ok(AdvanceOutcome::Clamped { steps, end })
        } else {
            Ok(AdvanceOutcome::Advanced { steps })
        }
    }

    /// Move through `Finalizing` to `Finalized`. Calling it again is a no-op.
    pub fn finalize(&mut self) -> CruResult<()> {
        match self.state {
            ClockState::Finalized => Ok(()),
            ClockState::Initialized | ClockState::Stepping => {
                self.state = ClockState::Finalizing;
                debug!(date = %self.current_date(), timestep = self.current_timestep, "Finalizing clock");
                self.state = ClockState::Finalized;
                Ok(())
            }
            other => Err(CruError::invalid_state("finalize", other)),
        }
    }

    fn ensure_can_step(&self, operation: &str) -> CruResult<()> {
        if self.state.can_step() {
            Ok(())
        } else {
            Err(CruError::invalid_state(operation, self.state))
        }
    }

    /// Instant one whole step after the current one.
    fn next_step(&self) -> CruResult<NaiveDateTime> {
        self.current
            .checked_add_signed(self.config.step())
            .ok_or_else(|| {
                CruError::date_out_of_range(
                    self.current_date(),
                    format!("a step of {} days from it is not a valid date", self.config.step_days),
                )
            })
    }

    fn check_candidate<F>(&self, date: NaiveDate, check: F) -> CruResult<()>
    where
        F: FnOnce(NaiveDate) -> CruResult<()>,
    {
        if date > self.config.dataset_range.end {
            return Err(CruError::date_out_of_range(
                date,
                format!(
                    "past the dataset's valid end date {}",
                    self.config.dataset_range.end
                ),
            ));
        }
        check(date)
    }
}
