//! Common types and utilities shared across the cru-temp workspace.

pub mod error;
pub mod grid;
pub mod time;

pub use error::{CruError, CruResult};
pub use grid::{AxisIndexer, BoundsCheck, GridShape, SubWindowSpec};
pub use time::{DateRange, MonthCalendar};
