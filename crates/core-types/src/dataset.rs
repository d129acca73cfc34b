use crate::enums::{Metric, PeriodKind};
use crate::error::CoreError;
use crate::structs::{Period, Record};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, BTreeSet};

/// A period-ordered collection of records.
///
/// Construction sorts the records by period (stable, so the loader's row order
/// is kept inside a period). Construction never rejects records; call
/// [`Dataset::validate`] before trusting the values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by_cached_key(|r| r.period());
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validates every record, returning the first violation found.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.records
            .iter()
            .enumerate()
            .try_for_each(|(index, record)| record.validate(index))
            .inspect_err(|e| {
                tracing::warn!(records = self.records.len(), "Dataset rejected: {e}");
            })
    }

    /// Distinct periods, in analysis order.
    pub fn periods(&self) -> Vec<Period> {
        let set: BTreeSet<Period> = self.records.iter().map(Record::period).collect();
        set.into_iter().collect()
    }

    pub fn latest_period(&self) -> Option<Period> {
        self.records.last().map(Record::period)
    }

    /// Records belonging to the period with the given id.
    pub fn period_records<'a>(
        &'a self,
        period_id: &'a str,
    ) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.period_id == period_id)
    }

    pub fn of_kind(&self, kind: PeriodKind) -> Dataset {
        self.filtered(|r| r.period_kind == kind)
    }

    /// The baseline cohort: every monthly record.
    pub fn baseline(&self) -> Dataset {
        self.of_kind(PeriodKind::Monthly)
    }

    pub fn weekly(&self) -> Dataset {
        self.of_kind(PeriodKind::Weekly)
    }

    /// The current cohort: records of the `n` most recent weekly periods.
    pub fn recent_weeks(&self, n: usize) -> Dataset {
        let weeks: BTreeSet<Period> = self
            .periods()
            .into_iter()
            .filter(|p| p.kind == PeriodKind::Weekly)
            .rev()
            .take(n)
            .collect();
        self.filtered(|r| weeks.contains(&r.period()))
    }

    /// Distinct user ids, sorted.
    pub fn users(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.user_id.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// All defined values of `metric`, in record order.
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.records.iter().filter_map(|r| metric.value(r)).collect()
    }

    /// Mean of `metric` per user across every period the user appears in.
    /// Users with no defined value are left out.
    pub fn per_user_mean(&self, metric: Metric) -> BTreeMap<String, (f64, usize)> {
        let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in &self.records {
            if let Some(value) = metric.value(record) {
                values.entry(record.user_id.clone()).or_default().push(value);
            }
        }
        values
            .into_iter()
            .map(|(user, v)| {
                let count = v.len();
                (user, (v.mean(), count))
            })
            .collect()
    }

    /// Mean of `metric` for each period, in period order. Periods where the
    /// metric is undefined for every record are skipped.
    pub fn period_means(&self, metric: Metric) -> Vec<(Period, f64)> {
        self.periods()
            .into_iter()
            .filter_map(|period| {
                let values: Vec<f64> = self
                    .records
                    .iter()
                    .filter(|r| r.period_id == period.id && r.period_kind == period.kind)
                    .filter_map(|r| metric.value(r))
                    .collect();
                (!values.is_empty()).then(|| (period, values.mean()))
            })
            .collect()
    }

    fn filtered(&self, keep: impl Fn(&Record) -> bool) -> Dataset {
        Dataset {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}
