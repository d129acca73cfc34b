use configuration::ConfigError;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Input data failed validation: {0}")]
    Validation(#[from] CoreError),

    #[error("Invalid KPI configuration: {0}")]
    Configuration(#[from] ConfigError),
}
