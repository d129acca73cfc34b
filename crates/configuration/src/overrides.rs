use crate::error::ConfigError;
use crate::settings::Settings;
use clap::Args;

/// Command-line overrides layered on top of the loaded settings.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Number of most recent weeks forming the current cohort.
    #[arg(long)]
    pub weeks: Option<usize>,

    /// Z-score above which a period is reported as anomalous.
    #[arg(long)]
    pub anomaly_threshold: Option<f64>,

    /// Number of users listed in the top-user ranking.
    #[arg(long)]
    pub top_users: Option<usize>,

    /// Target for the meeting-duration reduction KPI, in percent.
    #[arg(long)]
    pub duration_target: Option<f64>,
}

impl ConfigOverrides {
    /// Applies every provided override and re-validates the result.
    pub fn apply(&self, mut settings: Settings) -> Result<Settings, ConfigError> {
        if let Some(weeks) = self.weeks {
            settings.cohort.current_weeks = weeks;
        }
        if let Some(threshold) = self.anomaly_threshold {
            settings.trend.anomaly_z_threshold = threshold;
        }
        if let Some(n) = self.top_users {
            settings.trend.top_users = n;
        }
        if let Some(target) = self.duration_target {
            settings.kpi.meeting_duration_reduction_pct = target;
        }
        settings.validate()?;
        Ok(settings)
    }
}
