use crate::error::MetricsError;
use crate::kpi::{KpiKind, KpiResult, Target, Unit};
use configuration::KpiTargets;
use core_types::{Dataset, Metric, PeriodKind};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Cohorts smaller than this yield "insufficient data" instead of a KPI value.
const MIN_COHORT_RECORDS: usize = 2;

/// Aggregate figures for a single period, used for period-by-period tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub period_id: String,
    pub period_kind: PeriodKind,
    pub records: usize,
    pub meetings_per_day: f64,
    pub meeting_minutes_per_day: f64,
    /// Instant meetings as a percentage of instant + scheduled meetings.
    pub instant_share_pct: f64,
}

/// A stateless calculator for the meeting-load KPIs.
///
/// Every KPI compares a baseline cohort with a current cohort against a target
/// taken from `KpiTargets`. Degenerate inputs (empty or single-record cohorts,
/// zero denominators) never raise; they produce a result with `change = None`
/// and `met = false`.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    targets: KpiTargets,
}

impl MetricsCalculator {
    /// Creates a calculator, rejecting target sets that fail validation.
    pub fn new(targets: KpiTargets) -> Result<Self, MetricsError> {
        targets.validate()?;
        Ok(Self { targets })
    }

    pub fn targets(&self) -> &KpiTargets {
        &self.targets
    }

    /// The main entry point: every KPI in reporting order.
    ///
    /// Primary KPIs come first, then secondary, then monitoring. The weekly
    /// volatility KPI is only present when `weekly` is provided.
    pub fn calculate_all_kpis(
        &self,
        baseline: &Dataset,
        current: &Dataset,
        weekly: Option<&Dataset>,
    ) -> Result<Vec<KpiResult>, MetricsError> {
        let mut results = self.calculate_primary_kpis(baseline, current)?;
        results.extend(self.calculate_secondary_kpis(baseline, current)?);
        results.extend(self.calculate_monitoring_kpis(baseline, current, weekly)?);

        let met = results.iter().filter(|r| r.met).count();
        tracing::info!(
            baseline_records = baseline.len(),
            current_records = current.len(),
            "Calculated {} KPIs, {} met their target",
            results.len(),
            met
        );

        Ok(results)
    }

    /// Meeting-count reduction, meeting-duration reduction and instant-share drop.
    pub fn calculate_primary_kpis(
        &self,
        baseline: &Dataset,
        current: &Dataset,
    ) -> Result<Vec<KpiResult>, MetricsError> {
        validate_cohorts(baseline, current)?;

        Ok(vec![
            self.mean_reduction(
                KpiKind::MeetingCountReduction,
                Metric::MeetingsPerDay,
                baseline,
                current,
                self.targets.meeting_count_reduction_pct,
            ),
            self.mean_reduction(
                KpiKind::MeetingDurationReduction,
                Metric::MeetingMinutesPerDay,
                baseline,
                current,
                self.targets.meeting_duration_reduction_pct,
            ),
            self.instant_share_drop(baseline, current),
        ])
    }

    /// Minutes-per-meeting improvement, 1v1 substitution and burden balance.
    pub fn calculate_secondary_kpis(
        &self,
        baseline: &Dataset,
        current: &Dataset,
    ) -> Result<Vec<KpiResult>, MetricsError> {
        validate_cohorts(baseline, current)?;

        Ok(vec![
            self.duration_efficiency(baseline, current),
            self.one_on_one_substitution(baseline, current),
            self.burden_balance(baseline, current),
        ])
    }

    /// Heavy-user improvement and, when a weekly series is given, weekly volatility.
    pub fn calculate_monitoring_kpis(
        &self,
        baseline: &Dataset,
        current: &Dataset,
        weekly: Option<&Dataset>,
    ) -> Result<Vec<KpiResult>, MetricsError> {
        validate_cohorts(baseline, current)?;

        let mut results = vec![self.heavy_user_improvement(baseline, current)];
        if let Some(weekly) = weekly {
            weekly.validate()?;
            results.push(self.weekly_volatility(weekly));
        }
        Ok(results)
    }

    /// Per-period aggregates, in period order.
    pub fn period_comparison(
        &self,
        dataset: &Dataset,
    ) -> Result<Vec<PeriodSnapshot>, MetricsError> {
        dataset.validate()?;

        let snapshots = dataset
            .periods()
            .into_iter()
            .map(|period| {
                let cohort: Dataset = dataset
                    .period_records(&period.id)
                    .filter(|r| r.period_kind == period.kind)
                    .cloned()
                    .collect();
                PeriodSnapshot {
                    records: cohort.len(),
                    meetings_per_day: cohort_mean(&cohort, Metric::MeetingsPerDay).unwrap_or(0.0),
                    meeting_minutes_per_day: cohort_mean(&cohort, Metric::MeetingMinutesPerDay)
                        .unwrap_or(0.0),
                    instant_share_pct: instant_share(&cohort),
                    period_id: period.id,
                    period_kind: period.kind,
                }
            })
            .collect();

        Ok(snapshots)
    }

    // ---===[ Individual KPIs ]===---

    fn mean_reduction(
        &self,
        kind: KpiKind,
        metric: Metric,
        baseline: &Dataset,
        current: &Dataset,
        target_pct: f64,
    ) -> KpiResult {
        let baseline_mean = cohort_mean(baseline, metric);
        let current_mean = cohort_mean(current, metric);

        let change = if sufficient(baseline, current) {
            baseline_mean
                .zip(current_mean)
                .and_then(|(b, c)| reduction_rate(b, c))
        } else {
            None
        };

        finish(
            kind,
            baseline_mean,
            current_mean,
            change,
            Target::at_least(target_pct, Unit::Percent),
        )
    }

    /// A cohort with no instant or scheduled meetings has a share of 0 and the
    /// comparison still proceeds.
    fn instant_share_drop(&self, baseline: &Dataset, current: &Dataset) -> KpiResult {
        let baseline_share = (!baseline.is_empty()).then(|| instant_share(baseline));
        let current_share = (!current.is_empty()).then(|| instant_share(current));

        let change = if sufficient(baseline, current) {
            baseline_share.zip(current_share).map(|(b, c)| b - c)
        } else {
            None
        };

        finish(
            KpiKind::InstantShareDrop,
            baseline_share,
            current_share,
            change,
            Target::at_least(self.targets.instant_share_drop_points, Unit::PercentagePoints),
        )
    }

    fn duration_efficiency(&self, baseline: &Dataset, current: &Dataset) -> KpiResult {
        let baseline_mpm = minutes_per_meeting(baseline);
        let current_mpm = minutes_per_meeting(current);

        let change = if sufficient(baseline, current) {
            baseline_mpm
                .zip(current_mpm)
                .and_then(|(b, c)| reduction_rate(b, c))
        } else {
            None
        };

        finish(
            KpiKind::DurationEfficiency,
            baseline_mpm,
            current_mpm,
            change,
            Target::at_least(self.targets.efficiency_improvement_pct, Unit::Percent),
        )
    }

    fn one_on_one_substitution(&self, baseline: &Dataset, current: &Dataset) -> KpiResult {
        let baseline_share = one_on_one_share(baseline);
        let current_share = one_on_one_share(current);

        let change = if sufficient(baseline, current) {
            baseline_share.zip(current_share).map(|(b, c)| c - b)
        } else {
            None
        };

        finish(
            KpiKind::OneOnOneSubstitution,
            baseline_share,
            current_share,
            change,
            Target::at_least(self.targets.one_on_one_increase_points, Unit::PercentagePoints),
        )
    }

    /// Lower CV means meetings are spread more evenly across people.
    fn burden_balance(&self, baseline: &Dataset, current: &Dataset) -> KpiResult {
        let baseline_cv = per_user_cv(baseline);
        let current_cv = per_user_cv(current);

        let change = if sufficient(baseline, current) {
            baseline_cv
                .zip(current_cv)
                .and_then(|(b, c)| reduction_rate(b, c))
        } else {
            None
        };

        finish(
            KpiKind::BurdenBalance,
            baseline_cv,
            current_cv,
            change,
            Target::at_least(self.targets.burden_cv_decrease_pct, Unit::Percent),
        )
    }

    fn heavy_user_improvement(&self, baseline: &Dataset, current: &Dataset) -> KpiResult {
        let mut ranked: Vec<(String, f64)> = baseline
            .per_user_mean(Metric::MeetingsPerDay)
            .into_iter()
            .map(|(user, (mean, _))| (user, mean))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(self.targets.heavy_user_count);

        let heavy: BTreeSet<&str> = ranked.iter().map(|(user, _)| user.as_str()).collect();
        tracing::debug!(users = ?heavy, "Selected heavy baseline users");

        let baseline_avg = mean(ranked.iter().map(|(_, v)| *v));
        let current_avg = mean(
            current
                .per_user_mean(Metric::MeetingsPerDay)
                .into_iter()
                .filter(|(user, _)| heavy.contains(user.as_str()))
                .map(|(_, (v, _))| v),
        );

        let change = if sufficient(baseline, current) {
            baseline_avg
                .zip(current_avg)
                .and_then(|(b, c)| reduction_rate(b, c))
        } else {
            None
        };

        finish(
            KpiKind::HeavyUserImprovement,
            baseline_avg,
            current_avg,
            change,
            Target::at_least(self.targets.heavy_user_improvement_pct, Unit::Percent),
        )
    }

    /// CV of the per-week mean meetings per day. Reaching the target means the
    /// weekly series has stabilized.
    fn weekly_volatility(&self, weekly: &Dataset) -> KpiResult {
        let week_means: Vec<f64> = weekly
            .period_means(Metric::MeetingsPerDay)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let cv = coefficient_of_variation(&week_means);

        finish(
            KpiKind::WeeklyVolatility,
            None,
            cv,
            cv,
            Target::below(self.targets.weekly_volatility_max_cv, Unit::Ratio),
        )
    }
}

fn finish(
    kind: KpiKind,
    baseline: Option<f64>,
    current: Option<f64>,
    change: Option<f64>,
    target: Target,
) -> KpiResult {
    let result = KpiResult::evaluate(kind, baseline, current, change, target);
    if result.is_insufficient() {
        tracing::warn!(kpi = kind.name(), "Insufficient data, KPI reported as N/A");
    } else {
        tracing::debug!(
            kpi = kind.name(),
            baseline = ?result.baseline_value,
            current = ?result.current_value,
            change = ?result.change,
            met = result.met,
            "KPI evaluated"
        );
    }
    result
}

fn validate_cohorts(baseline: &Dataset, current: &Dataset) -> Result<(), MetricsError> {
    baseline.validate()?;
    current.validate()?;
    Ok(())
}

fn sufficient(baseline: &Dataset, current: &Dataset) -> bool {
    baseline.len() >= MIN_COHORT_RECORDS && current.len() >= MIN_COHORT_RECORDS
}

/// (baseline − current) / baseline × 100; undefined for a zero baseline.
fn reduction_rate(baseline: f64, current: f64) -> Option<f64> {
    (baseline > 0.0).then(|| (baseline - current) / baseline * 100.0)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.collect();
    (!values.is_empty()).then(|| values.mean())
}

fn cohort_mean(cohort: &Dataset, metric: Metric) -> Option<f64> {
    mean(cohort.values(metric).into_iter())
}

fn instant_share(cohort: &Dataset) -> f64 {
    let (instant, scheduled) = cohort.records().iter().fold((0u64, 0u64), |(i, s), r| {
        (i + u64::from(r.instant_meetings), s + u64::from(r.scheduled_meetings))
    });
    let denominator = instant + scheduled;
    if denominator == 0 {
        0.0
    } else {
        instant as f64 / denominator as f64 * 100.0
    }
}

fn one_on_one_share(cohort: &Dataset) -> Option<f64> {
    let (one_on_one, total) = cohort.records().iter().fold((0u64, 0u64), |(o, t), r| {
        (o + u64::from(r.one_on_one_calls), t + u64::from(r.total_meetings))
    });
    (total > 0).then(|| one_on_one as f64 / total as f64 * 100.0)
}

fn minutes_per_meeting(cohort: &Dataset) -> Option<f64> {
    let minutes = cohort_mean(cohort, Metric::MeetingMinutesPerDay)?;
    let meetings = cohort_mean(cohort, Metric::MeetingsPerDay)?;
    (meetings > 0.0).then(|| minutes / meetings)
}

fn per_user_cv(cohort: &Dataset) -> Option<f64> {
    let user_means: Vec<f64> = cohort
        .per_user_mean(Metric::MeetingsPerDay)
        .into_values()
        .map(|(v, _)| v)
        .collect();
    coefficient_of_variation(&user_means)
}

/// Sample stddev / mean. Needs two values and a positive mean.
fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = values.mean();
    if mean <= 0.0 {
        return None;
    }
    Some(values.std_dev() / mean)
}
