use crate::error::TrendError;
use crate::results::{
    AnomalyKind, AnomalyPoint, Correlation, Distribution, MetricSummary, PeriodChange,
    PeriodComparison, RankedUser, TrendDirection, TrendPoint, TrendResult, UserImprovement,
};
use crate::stats;
use configuration::settings::non_negative;
use configuration::{ConfigError, TrendConfig};
use core_types::{Dataset, Metric};
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Fewest distinct periods a trend line is fitted on.
const MIN_TREND_PERIODS: usize = 3;
/// Fewest pairs a correlation is computed on.
const MIN_CORRELATION_PAIRS: usize = 3;

/// The statistics engine for a time-ordered meeting dataset.
///
/// The analyzer borrows the dataset immutably and keeps no state between
/// calls, so the same dataset can be analyzed for several metrics at once.
/// Every operation validates the dataset before computing anything.
pub struct TrendAnalyzer<'a> {
    data: &'a Dataset,
    config: TrendConfig,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(data: &'a Dataset, config: TrendConfig) -> Result<Self, TrendError> {
        config.validate()?;
        Ok(Self { data, config })
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Fits a least-squares line through the per-period means of `metric`.
    ///
    /// The x axis is the period index, not calendar time: monthly and weekly
    /// periods are not evenly spaced.
    pub fn analyze_trend(&self, metric: Metric) -> Result<TrendResult, TrendError> {
        self.data.validate()?;

        let series = self.data.period_means(metric);
        if series.len() < MIN_TREND_PERIODS {
            return Err(TrendError::InsufficientData {
                metric,
                reason: format!(
                    "a trend needs at least {MIN_TREND_PERIODS} periods, found {}",
                    series.len()
                ),
            });
        }

        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        let fit = stats::linear_regression(&values)?;

        let scale = values.as_slice().mean().abs();
        let direction = if fit.slope.abs() <= self.config.flat_slope_epsilon * scale {
            TrendDirection::Flat
        } else if fit.slope > 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        };

        let first_value = values[0];
        let last_value = values[values.len() - 1];
        let change_rate =
            (first_value != 0.0).then(|| (last_value - first_value) / first_value * 100.0);

        tracing::debug!(
            %metric,
            slope = fit.slope,
            r_squared = fit.r_squared,
            ?direction,
            "Trend fitted over {} periods",
            values.len()
        );

        let points = series
            .into_iter()
            .enumerate()
            .map(|(index, (period, value))| TrendPoint {
                index,
                period_id: period.id,
                period_kind: period.kind,
                value,
            })
            .collect();

        Ok(TrendResult {
            metric,
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            p_value: fit.p_value,
            direction,
            change_rate,
            first_value,
            last_value,
            points,
        })
    }

    /// Flags periods whose mean deviates from the series mean by more than
    /// `threshold` sample standard deviations.
    ///
    /// Only anomalous periods are returned, in period order. A constant series
    /// (or one with fewer than two periods) has nothing to standardize against
    /// and yields no anomalies.
    pub fn detect_anomalies(
        &self,
        metric: Metric,
        threshold: f64,
    ) -> Result<Vec<AnomalyPoint>, TrendError> {
        non_negative("anomaly threshold", threshold)?;
        self.data.validate()?;

        let series = self.data.period_means(metric);
        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        let Some((mean, stddev)) = stats::mean_and_stddev(&values) else {
            return Ok(Vec::new());
        };

        let anomalies: Vec<AnomalyPoint> = series
            .into_iter()
            .filter_map(|(period, value)| anomaly(period.id, None, value, mean, stddev, threshold))
            .collect();

        tracing::debug!(%metric, threshold, "Found {} anomalous periods", anomalies.len());
        Ok(anomalies)
    }

    /// Same rule as [`detect_anomalies`](Self::detect_anomalies), applied to
    /// every individual record. Results are ordered by z-score, highest first.
    pub fn detect_user_anomalies(
        &self,
        metric: Metric,
        threshold: f64,
    ) -> Result<Vec<AnomalyPoint>, TrendError> {
        non_negative("anomaly threshold", threshold)?;
        self.data.validate()?;

        let observations: Vec<(&str, &str, f64)> = self
            .data
            .records()
            .iter()
            .filter_map(|r| metric.value(r).map(|v| (r.user_id.as_str(), r.period_id.as_str(), v)))
            .collect();
        let values: Vec<f64> = observations.iter().map(|(_, _, v)| *v).collect();
        let Some((mean, stddev)) = stats::mean_and_stddev(&values) else {
            return Ok(Vec::new());
        };

        let mut anomalies: Vec<AnomalyPoint> = observations
            .into_iter()
            .filter_map(|(user, period, value)| {
                anomaly(period.to_string(), Some(user.to_string()), value, mean, stddev, threshold)
            })
            .collect();
        anomalies.sort_by(|a, b| {
            b.z_score
                .total_cmp(&a.z_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        tracing::debug!(%metric, threshold, "Found {} anomalous records", anomalies.len());
        Ok(anomalies)
    }

    /// Distribution of per-user values in the most recent period.
    pub fn analyze_distribution(&self, metric: Metric) -> Result<Distribution, TrendError> {
        self.data.validate()?;

        let period = self.data.latest_period().ok_or_else(|| TrendError::InsufficientData {
            metric,
            reason: "the dataset is empty".to_string(),
        })?;

        let mut values: Vec<f64> = self
            .data
            .period_records(&period.id)
            .filter(|r| r.period_kind == period.kind)
            .filter_map(|r| metric.value(r))
            .collect();
        if values.is_empty() {
            return Err(TrendError::InsufficientData {
                metric,
                reason: format!("no values in period '{}'", period.id),
            });
        }
        values.sort_by(f64::total_cmp);

        let stddev = (values.len() >= 2).then(|| values.as_slice().std_dev());

        Ok(Distribution {
            metric,
            count: values.len(),
            mean: values.as_slice().mean(),
            median: stats::quantile(&values, 0.5),
            p25: stats::quantile(&values, 0.25),
            p75: stats::quantile(&values, 0.75),
            stddev,
            min: values[0],
            max: values[values.len() - 1],
            skewness: stats::skewness(&values),
            kurtosis: stats::kurtosis(&values),
            period_id: period.id,
        })
    }

    /// Welch's two-sample t-test between the per-user values of two periods.
    pub fn compare_periods(
        &self,
        metric: Metric,
        period_a: &str,
        period_b: &str,
    ) -> Result<PeriodComparison, TrendError> {
        self.data.validate()?;

        let sample = |period_id: &str| -> Vec<f64> {
            self.data
                .period_records(period_id)
                .filter_map(|r| metric.value(r))
                .collect()
        };
        let a = sample(period_a);
        let b = sample(period_b);

        for (id, values) in [(period_a, &a), (period_b, &b)] {
            if values.len() < 2 {
                return Err(TrendError::InsufficientData {
                    metric,
                    reason: format!(
                        "period '{id}' has {} values, a t-test needs at least 2",
                        values.len()
                    ),
                });
            }
        }

        let mean_a = a.as_slice().mean();
        let mean_b = b.as_slice().mean();
        let test = stats::welch_t_test(&a, &b)?;
        let significant = test.p_value < self.config.significance_level;

        tracing::debug!(
            %metric,
            period_a,
            period_b,
            t = test.t_statistic,
            p = test.p_value,
            significant,
            "Compared periods"
        );

        Ok(PeriodComparison {
            metric,
            period_a: period_a.to_string(),
            period_b: period_b.to_string(),
            mean_a,
            mean_b,
            change_rate: (mean_a != 0.0).then(|| (mean_b - mean_a) / mean_a * 100.0),
            t_statistic: test.t_statistic,
            degrees_of_freedom: test.degrees_of_freedom,
            p_value: test.p_value,
            significant,
        })
    }

    /// The `n` users with the highest mean `metric`, ties broken by user id.
    pub fn identify_top_users(
        &self,
        metric: Metric,
        n: usize,
    ) -> Result<Vec<RankedUser>, TrendError> {
        if n == 0 {
            return Err(ConfigError::ValidationError(
                "the number of top users must be at least 1".to_string(),
            )
            .into());
        }
        self.data.validate()?;

        let mut users: Vec<RankedUser> = self
            .data
            .per_user_mean(metric)
            .into_iter()
            .map(|(user_id, (value, data_points))| RankedUser { user_id, value, data_points })
            .collect();
        users.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        users.truncate(n);

        Ok(users)
    }

    /// Pearson and Spearman correlation between two metrics, paired per record.
    ///
    /// Records where either metric is undefined are dropped before both
    /// coefficients are computed.
    pub fn analyze_correlation(
        &self,
        metric_a: Metric,
        metric_b: Metric,
    ) -> Result<Correlation, TrendError> {
        self.data.validate()?;

        let (xs, ys): (Vec<f64>, Vec<f64>) = self
            .data
            .records()
            .iter()
            .filter_map(|r| metric_a.value(r).zip(metric_b.value(r)))
            .unzip();

        if xs.len() < MIN_CORRELATION_PAIRS {
            return Err(TrendError::InsufficientData {
                metric: metric_a,
                reason: format!(
                    "correlation with '{metric_b}' needs at least {MIN_CORRELATION_PAIRS} \
                     complete pairs, found {}",
                    xs.len()
                ),
            });
        }

        let pearson_r = stats::pearson(&xs, &ys);
        let spearman_r = stats::spearman(&xs, &ys);
        let p_value = |r: Option<f64>| {
            r.map(|r| stats::correlation_p_value(r, xs.len()))
                .transpose()
        };

        Ok(Correlation {
            metric_a,
            metric_b,
            sample_size: xs.len(),
            pearson_p_value: p_value(pearson_r)?,
            spearman_p_value: p_value(spearman_r)?,
            pearson_r,
            spearman_r,
        })
    }

    /// Period-over-period change of the per-period mean.
    pub fn week_over_week_change(&self, metric: Metric) -> Result<Vec<PeriodChange>, TrendError> {
        self.data.validate()?;

        let mut previous: Option<f64> = None;
        let changes = self
            .data
            .period_means(metric)
            .into_iter()
            .map(|(period, value)| {
                let change = previous.map(|p| value - p);
                let change_rate = previous
                    .filter(|p| *p != 0.0)
                    .map(|p| (value - p) / p * 100.0);
                let row = PeriodChange {
                    period_id: period.id,
                    value,
                    previous_value: previous,
                    change,
                    change_rate,
                };
                previous = Some(value);
                row
            })
            .collect();

        Ok(changes)
    }

    /// Per-user improvement between the baseline (monthly) records and the
    /// `current_weeks` most recent weeks. Only users present in both cohorts
    /// are listed, best improvement first.
    pub fn improvement_by_user(
        &self,
        metric: Metric,
        current_weeks: usize,
    ) -> Result<Vec<UserImprovement>, TrendError> {
        if current_weeks == 0 {
            return Err(ConfigError::ValidationError(
                "the current cohort must span at least 1 week".to_string(),
            )
            .into());
        }
        self.data.validate()?;

        let baseline = self.data.baseline().per_user_mean(metric);
        let current = self.data.recent_weeks(current_weeks).per_user_mean(metric);

        let mut rows: Vec<UserImprovement> = baseline
            .into_iter()
            .filter_map(|(user_id, (before, _))| {
                let (after, _) = current.get(&user_id)?;
                let improvement_rate = (before > 0.0).then(|| (before - after) / before * 100.0);
                Some(UserImprovement {
                    user_id,
                    baseline: before,
                    current: *after,
                    improved: improvement_rate.is_some_and(|r| r > 0.0),
                    improvement_rate,
                })
            })
            .collect();

        rows.sort_by(|a, b| match (a.improvement_rate, b.improvement_rate) {
            (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.user_id.cmp(&b.user_id)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.user_id.cmp(&b.user_id),
        });

        Ok(rows)
    }

    /// Distribution, trend, top users and anomalies for each metric, using the
    /// configured thresholds. Statistics that are not yet computable are `None`.
    pub fn summary_report(
        &self,
        metrics: &[Metric],
    ) -> Result<BTreeMap<Metric, MetricSummary>, TrendError> {
        let mut report = BTreeMap::new();

        for &metric in metrics {
            let summary = MetricSummary {
                distribution: allow_insufficient(self.analyze_distribution(metric))?,
                trend: allow_insufficient(self.analyze_trend(metric))?,
                top_users: self.identify_top_users(metric, self.config.top_users)?,
                anomalies: self.detect_anomalies(metric, self.config.anomaly_z_threshold)?,
            };
            report.insert(metric, summary);
        }

        tracing::info!("Summary report built for {} metrics", report.len());
        Ok(report)
    }
}

fn anomaly(
    period_id: String,
    user_id: Option<String>,
    value: f64,
    mean: f64,
    stddev: f64,
    threshold: f64,
) -> Option<AnomalyPoint> {
    let z_score = (value - mean) / stddev;
    (z_score.abs() > threshold).then(|| AnomalyPoint {
        period_id,
        user_id,
        value,
        z_score,
        is_anomaly: true,
        kind: if z_score > 0.0 { AnomalyKind::High } else { AnomalyKind::Low },
    })
}

/// Turns `InsufficientData` into `None`, passing every other error through.
fn allow_insufficient<T>(result: Result<T, TrendError>) -> Result<Option<T>, TrendError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_insufficient_data() => {
            tracing::warn!("{e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
