//! Error types for the cru-temp workspace.

use thiserror::Error;

/// Result type alias using CruError.
pub type CruResult<T> = Result<T, CruError>;

/// Primary error type for the temperature window core.
#[derive(Debug, Error)]
pub enum CruError {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    #[error("Unsupported region/resolution combination: region '{region}', resolution '{resolution}'")]
    UnknownDataset { region: String, resolution: String },

    // === Range Errors ===
    #[error("{axis} index {index} is outside [0, {extent})")]
    IndexOutOfRange {
        axis: String,
        index: i64,
        extent: usize,
    },

    #[error("Absolute index {absolute} is not on the {axis} stride (origin {origin}, stride {stride})")]
    OffStride {
        axis: String,
        absolute: i64,
        origin: usize,
        stride: usize,
    },

    #[error("Date {date} is outside the available data ({message})")]
    DateOutOfRange { date: String, message: String },

    // === Lifecycle Errors ===
    #[error("Operation '{operation}' is not permitted while {state}")]
    InvalidState { operation: String, state: String },

    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    // === Data Errors ===
    #[error("Failed to read dataset: {0}")]
    DataRead(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CruError {
    /// Create a Configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an InvalidConfigValue error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an IndexOutOfRange error.
    pub fn index_out_of_range(axis: impl Into<String>, index: i64, extent: usize) -> Self {
        Self::IndexOutOfRange {
            axis: axis.into(),
            index,
            extent,
        }
    }

    /// Create a DateOutOfRange error.
    pub fn date_out_of_range(date: impl ToString, message: impl Into<String>) -> Self {
        Self::DateOutOfRange {
            date: date.to_string(),
            message: message.into(),
        }
    }

    /// Create an InvalidState error.
    pub fn invalid_state(operation: impl Into<String>, state: impl ToString) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            state: state.to_string(),
        }
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a DataRead error.
    pub fn data_read(msg: impl Into<String>) -> Self {
        Self::DataRead(msg.into())
    }

    /// Get the error category reported to adapters.
    pub fn category(&self) -> &'static str {
        match self {
            CruError::Configuration(_)
            | CruError::InvalidConfigValue { .. }
            | CruError::UnknownDataset { .. } => "ConfigurationError",

            CruError::IndexOutOfRange { .. }
            | CruError::OffStride { .. }
            | CruError::DateOutOfRange { .. } => "RangeError",

            CruError::InvalidState { .. } | CruError::InvalidArgument { .. } => "UsageError",

            CruError::DataRead(_) | CruError::Io(_) => "DataError",
        }
    }

    /// True for errors caused by the configuration rather than by a step.
    pub fn is_configuration(&self) -> bool {
        self.category() == "ConfigurationError"
    }

    /// True for spatial or temporal out-of-bounds errors.
    pub fn is_range(&self) -> bool {
        self.category() == "RangeError"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(CruError::config("bad").category(), "ConfigurationError");
        assert_eq!(
            CruError::index_out_of_range("row", 12, 10).category(),
            "RangeError"
        );
        assert_eq!(
            CruError::invalid_state("advance_one_step", "finalized").category(),
            "UsageError"
        );
        assert!(CruError::UnknownDataset {
            region: "Yukon".to_string(),
            resolution: "lowres".to_string(),
        }
        .is_configuration());
    }

    #[test]
    fn test_messages_name_the_axis() {
        let err = CruError::index_out_of_range("column", -1, 4);
        assert_eq!(err.to_string(), "column index -1 is outside [0, 4)");
    }
}
