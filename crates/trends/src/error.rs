use configuration::ConfigError;
use core_types::{CoreError, Metric};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrendError {
    #[error("Input data failed validation: {0}")]
    Validation(#[from] CoreError),

    /// The statistic is not yet computable. Callers usually report it as N/A.
    #[error("Not enough data to analyze '{metric}': {reason}")]
    InsufficientData { metric: Metric, reason: String },

    #[error("Invalid analysis configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("An internal calculation error occurred: {0}")]
    Calculation(String),
}

impl TrendError {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, TrendError::InsufficientData { .. })
    }
}
