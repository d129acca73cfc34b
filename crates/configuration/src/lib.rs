use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

#[cfg(feature = "clap")]
pub mod overrides;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{CohortConfig, KpiTargets, Settings, TrendConfig};

#[cfg(feature = "clap")]
pub use overrides::ConfigOverrides;

/// Prefix for environment overrides, e.g. `MEETING_INSIGHT_COHORT__CURRENT_WEEKS=6`.
pub const ENV_PREFIX: &str = "MEETING_INSIGHT";

/// Loads the application configuration.
///
/// Reads `path` when given (the file must exist), otherwise an optional
/// `config.toml` in the working directory. Environment variables are layered
/// on top, then the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config.toml").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(builder)
}

/// Loads the configuration from a TOML string. Environment variables are not consulted.
pub fn load_config_from_str(toml: &str) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Settings, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    tracing::debug!(?settings, "Configuration loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Metric;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(load_config_from_str("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let settings = load_config_from_str(
            r#"
            [kpi]
            meeting_duration_reduction_pct = 15

            [trend]
            report_metrics = ["minutes_per_meeting"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.kpi.meeting_duration_reduction_pct, 15.0);
        assert_eq!(settings.kpi.meeting_count_reduction_pct, 15.0);
        assert_eq!(settings.trend.report_metrics, vec![Metric::MinutesPerMeeting]);
        assert_eq!(settings.cohort.current_weeks, 4);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = load_config_from_str("[cohort]\ncurrent_weeks = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn reads_an_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[cohort]\ncurrent_weeks = 6").unwrap();

        let settings = load_config(Some(file.path())).unwrap();
        assert_eq!(settings.cohort.current_weeks, 6);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
