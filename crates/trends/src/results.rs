use core_types::{Metric, PeriodKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// One point of the per-period series a trend line is fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub index: usize,
    pub period_id: String,
    pub period_kind: PeriodKind,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub metric: Metric,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: Option<f64>,
    pub direction: TrendDirection,
    /// End-to-end change in percent; `None` when the series starts at zero.
    pub change_rate: Option<f64>,
    pub first_value: f64,
    pub last_value: f64,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub period_id: String,
    /// Absent for points of an aggregate (per-period) series.
    pub user_id: Option<String>,
    pub value: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
    pub kind: AnomalyKind,
}

/// Summary statistics of one metric over the most recent period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub metric: Metric,
    pub period_id: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub stddev: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub metric: Metric,
    pub period_a: String,
    pub period_b: String,
    pub mean_a: f64,
    pub mean_b: f64,
    /// (mean_b − mean_a) / mean_a × 100; `None` when mean_a is zero.
    pub change_rate: Option<f64>,
    pub t_statistic: f64,
    pub degrees_of_freedom: Option<f64>,
    pub p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedUser {
    pub user_id: String,
    /// The user's mean across all periods they appear in.
    pub value: f64,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub metric_a: Metric,
    pub metric_b: Metric,
    pub sample_size: usize,
    pub pearson_r: Option<f64>,
    pub pearson_p_value: Option<f64>,
    pub spearman_r: Option<f64>,
    pub spearman_p_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodChange {
    pub period_id: String,
    pub value: f64,
    pub previous_value: Option<f64>,
    pub change: Option<f64>,
    pub change_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserImprovement {
    pub user_id: String,
    pub baseline: f64,
    pub current: f64,
    /// (baseline − current) / baseline × 100; `None` for a zero baseline.
    pub improvement_rate: Option<f64>,
    pub improved: bool,
}

/// Everything the report renderer needs for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub distribution: Option<Distribution>,
    pub trend: Option<TrendResult>,
    pub top_users: Vec<RankedUser>,
    pub anomalies: Vec<AnomalyPoint>,
}
