use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of KPIs evaluated by the `MetricsCalculator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiKind {
    MeetingCountReduction,
    MeetingDurationReduction,
    InstantShareDrop,
    DurationEfficiency,
    OneOnOneSubstitution,
    BurdenBalance,
    HeavyUserImprovement,
    WeeklyVolatility,
}

impl KpiKind {
    pub fn name(&self) -> &'static str {
        match self {
            KpiKind::MeetingCountReduction => "Meeting-count reduction rate",
            KpiKind::MeetingDurationReduction => "Meeting-duration reduction rate",
            KpiKind::InstantShareDrop => "Instant-meeting share drop",
            KpiKind::DurationEfficiency => "Minutes-per-meeting improvement",
            KpiKind::OneOnOneSubstitution => "1v1 substitution rate",
            KpiKind::BurdenBalance => "Burden-distribution balance",
            KpiKind::HeavyUserImprovement => "Heavy-user improvement",
            KpiKind::WeeklyVolatility => "Weekly volatility",
        }
    }

    pub fn category(&self) -> KpiCategory {
        match self {
            KpiKind::MeetingCountReduction
            | KpiKind::MeetingDurationReduction
            | KpiKind::InstantShareDrop => KpiCategory::Primary,
            KpiKind::DurationEfficiency
            | KpiKind::OneOnOneSubstitution
            | KpiKind::BurdenBalance => KpiCategory::Secondary,
            KpiKind::HeavyUserImprovement | KpiKind::WeeklyVolatility => KpiCategory::Monitoring,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiCategory {
    /// Must reach target for the intervention to count as a success.
    Primary,
    Secondary,
    /// Informational signals, not pass/fail criteria.
    Monitoring,
}

impl fmt::Display for KpiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiCategory::Primary => write!(f, "primary"),
            KpiCategory::Secondary => write!(f, "secondary"),
            KpiCategory::Monitoring => write!(f, "monitoring"),
        }
    }
}

/// The unit a KPI's `change` is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Percent,
    PercentagePoints,
    Ratio,
}

impl Unit {
    fn suffix(&self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::PercentagePoints => "pp",
            Unit::Ratio => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    AtLeast,
    Below,
}

/// A threshold expression such as "≥15%" or "<0.15".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub comparison: Comparison,
    pub threshold: f64,
    pub unit: Unit,
}

impl Target {
    pub fn at_least(threshold: f64, unit: Unit) -> Self {
        Self { comparison: Comparison::AtLeast, threshold, unit }
    }

    pub fn below(threshold: f64, unit: Unit) -> Self {
        Self { comparison: Comparison::Below, threshold, unit }
    }

    pub fn is_met(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::AtLeast => value >= self.threshold,
            Comparison::Below => value < self.threshold,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.comparison {
            Comparison::AtLeast => "≥",
            Comparison::Below => "<",
        };
        write!(f, "{op}{}{}", self.threshold, self.unit.suffix())
    }
}

/// The outcome of one KPI comparison between the baseline and current cohorts.
///
/// `change` is `None` when the KPI could not be computed (zero denominator or
/// a cohort with fewer than two records); `met` is then always `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    pub kind: KpiKind,
    pub name: String,
    pub category: KpiCategory,
    pub baseline_value: Option<f64>,
    pub current_value: Option<f64>,
    pub change: Option<f64>,
    pub target: Target,
    pub met: bool,
}

impl KpiResult {
    /// Builds a result and decides `met` from `change` and `target`.
    pub fn evaluate(
        kind: KpiKind,
        baseline_value: Option<f64>,
        current_value: Option<f64>,
        change: Option<f64>,
        target: Target,
    ) -> Self {
        let met = change.is_some_and(|c| target.is_met(c));
        Self {
            kind,
            name: kind.name().to_string(),
            category: kind.category(),
            baseline_value,
            current_value,
            change,
            target,
            met,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.change.is_none()
    }

    /// `change` formatted with its unit, or "N/A".
    pub fn change_display(&self) -> String {
        match self.change {
            Some(change) => format!("{change:.2}{}", self.target.unit.suffix()),
            None => "N/A".to_string(),
        }
    }
}

/// Counts `(met, total)` for one category.
pub fn tally(results: &[KpiResult], category: KpiCategory) -> (usize, usize) {
    results
        .iter()
        .filter(|r| r.category == category)
        .fold((0, 0), |(met, total), r| (met + usize::from(r.met), total + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn targets_render_like_threshold_expressions() {
        assert_eq!(Target::at_least(15.0, Unit::Percent).to_string(), "≥15%");
        assert_eq!(Target::at_least(10.0, Unit::PercentagePoints).to_string(), "≥10pp");
        assert_eq!(Target::below(0.15, Unit::Ratio).to_string(), "<0.15");
    }

    #[test]
    fn missing_change_is_never_met() {
        let result = KpiResult::evaluate(
            KpiKind::MeetingCountReduction,
            Some(0.0),
            Some(1.0),
            None,
            Target::at_least(0.0, Unit::Percent),
        );
        assert!(!result.met);
        assert!(result.is_insufficient());
        assert_eq!(result.change_display(), "N/A");
    }

    #[test]
    fn tally_counts_per_category() {
        let target = Target::at_least(10.0, Unit::Percent);
        let results = vec![
            KpiResult::evaluate(KpiKind::MeetingCountReduction, None, None, Some(12.0), target),
            KpiResult::evaluate(KpiKind::MeetingDurationReduction, None, None, Some(8.0), target),
            KpiResult::evaluate(KpiKind::BurdenBalance, None, None, Some(30.0), target),
        ];
        assert_eq!(tally(&results, KpiCategory::Primary), (1, 2));
        assert_eq!(tally(&results, KpiCategory::Secondary), (1, 1));
        assert_eq!(tally(&results, KpiCategory::Monitoring), (0, 0));
    }
}
