//! CRU temperature runner library.
//!
//! Drives an initialized model from its start date to its end date (or an
//! earlier stop date), logging a summary of every slice it passes through.

pub mod report;
pub mod run;

pub use report::{RunSummary, StepReport};
pub use run::run_to;
