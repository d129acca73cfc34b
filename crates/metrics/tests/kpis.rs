use configuration::KpiTargets;
use core_types::{CoreError, Dataset, PeriodKind, Record};
use metrics::{KpiCategory, KpiKind, KpiResult, MetricsCalculator, MetricsError, tally};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

fn rec(user: &str, period: &str, meetings: f64, minutes: f64, counts: (u32, u32, u32)) -> Record {
    let (instant, scheduled, one_on_one) = counts;
    let kind = if period.ends_with('月') { PeriodKind::Monthly } else { PeriodKind::Weekly };
    Record {
        user_id: user.to_string(),
        period_id: period.to_string(),
        period_kind: kind,
        meetings_per_day: meetings,
        meeting_minutes_per_day: minutes,
        instant_meetings: instant,
        scheduled_meetings: scheduled,
        one_on_one_calls: one_on_one,
        total_meetings: instant + scheduled + one_on_one,
    }
}

fn cohort(period: &str, meetings: &[f64]) -> Dataset {
    meetings
        .iter()
        .enumerate()
        .map(|(i, m)| rec(&format!("user{i:02}"), period, *m, m * 30.0, (1, 1, 0)))
        .collect()
}

fn calculator() -> MetricsCalculator {
    MetricsCalculator::new(KpiTargets::default()).unwrap()
}

fn find(results: &[KpiResult], kind: KpiKind) -> &KpiResult {
    results.iter().find(|r| r.kind == kind).expect("KPI present")
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("value present");
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

#[test]
fn meeting_count_reduction_matches_the_worked_example() {
    let baseline = cohort("9月", &[5.0, 4.0, 6.0]);
    let current = cohort("11.3-11.9", &[4.0, 3.0, 4.0, 5.0]);

    let results = calculator().calculate_primary_kpis(&baseline, &current).unwrap();
    let kpi = find(&results, KpiKind::MeetingCountReduction);

    assert_close(kpi.baseline_value, 5.0);
    assert_close(kpi.current_value, 4.0);
    assert_close(kpi.change, 20.0);
    assert!(kpi.met);
    assert_eq!(kpi.target.to_string(), "≥15%");
}

#[test]
fn duration_target_is_configurable() {
    let baseline = cohort("9月", &[5.0, 4.0, 6.0]);
    let current = cohort("11.3-11.9", &[4.2, 4.2, 4.2, 4.2]);

    // Minutes track meetings * 30, so the duration reduction is 16%.
    let strict = calculator().calculate_primary_kpis(&baseline, &current).unwrap();
    assert!(!find(&strict, KpiKind::MeetingDurationReduction).met);

    let lenient = MetricsCalculator::new(KpiTargets {
        meeting_duration_reduction_pct: 15.0,
        ..Default::default()
    })
    .unwrap()
    .calculate_primary_kpis(&baseline, &current)
    .unwrap();
    let kpi = find(&lenient, KpiKind::MeetingDurationReduction);
    assert_close(kpi.change, 16.0);
    assert!(kpi.met);
}

#[test]
fn zero_baseline_reports_not_available_instead_of_failing() {
    let baseline = cohort("9月", &[0.0, 0.0, 0.0]);
    let current = cohort("11.3-11.9", &[1.0, 2.0]);

    let results = calculator().calculate_all_kpis(&baseline, &current, None).unwrap();
    let kpi = find(&results, KpiKind::MeetingCountReduction);

    assert_eq!(kpi.change, None);
    assert!(!kpi.met);
    assert_eq!(find(&results, KpiKind::BurdenBalance).change, None);
}

#[rstest]
#[case::single_baseline_record(&[5.0], &[4.0, 3.0])]
#[case::single_current_record(&[5.0, 4.0], &[3.0])]
#[case::empty_current(&[5.0, 4.0], &[])]
fn undersized_cohorts_are_insufficient(#[case] baseline: &[f64], #[case] current: &[f64]) {
    let baseline = cohort("9月", baseline);
    let current = cohort("11.3-11.9", current);

    let results = calculator().calculate_all_kpis(&baseline, &current, None).unwrap();
    assert!(results.iter().all(|r| r.change.is_none() && !r.met));
}

#[test]
fn instant_share_drop_is_measured_in_points() {
    let baseline: Dataset = vec![
        rec("a", "9月", 4.0, 120.0, (3, 2, 1)),
        rec("b", "9月", 4.0, 120.0, (3, 2, 0)),
    ]
    .into_iter()
    .collect();
    let current: Dataset = vec![
        rec("a", "11.3-11.9", 3.0, 90.0, (1, 4, 1)),
        rec("b", "11.3-11.9", 3.0, 90.0, (2, 3, 0)),
    ]
    .into_iter()
    .collect();

    let results = calculator().calculate_primary_kpis(&baseline, &current).unwrap();
    let kpi = find(&results, KpiKind::InstantShareDrop);

    assert_close(kpi.baseline_value, 60.0);
    assert_close(kpi.current_value, 30.0);
    assert_close(kpi.change, 30.0);
    assert!(kpi.met);
}

#[test]
fn instant_share_with_no_instant_or_scheduled_meetings_counts_as_zero() {
    let baseline: Dataset = vec![
        rec("a", "9月", 2.0, 60.0, (0, 0, 4)),
        rec("b", "9月", 2.0, 60.0, (0, 0, 2)),
    ]
    .into_iter()
    .collect();
    let current: Dataset = vec![
        rec("a", "11.3-11.9", 2.0, 60.0, (1, 1, 0)),
        rec("b", "11.3-11.9", 2.0, 60.0, (1, 1, 0)),
    ]
    .into_iter()
    .collect();

    let results = calculator().calculate_primary_kpis(&baseline, &current).unwrap();
    let kpi = find(&results, KpiKind::InstantShareDrop);

    assert_close(kpi.baseline_value, 0.0);
    assert_close(kpi.change, -50.0);
    assert!(!kpi.met);
}

#[test]
fn secondary_kpis() {
    let baseline: Dataset = vec![
        rec("a", "9月", 2.0, 120.0, (2, 7, 1)),
        rec("b", "9月", 6.0, 360.0, (2, 7, 1)),
    ]
    .into_iter()
    .collect();
    let current: Dataset = vec![
        rec("a", "11.3-11.9", 3.0, 120.0, (1, 6, 3)),
        rec("b", "11.3-11.9", 3.0, 120.0, (1, 6, 3)),
    ]
    .into_iter()
    .collect();

    let results = calculator().calculate_secondary_kpis(&baseline, &current).unwrap();

    // 60 minutes per meeting before, 40 after.
    let efficiency = find(&results, KpiKind::DurationEfficiency);
    assert_close(efficiency.baseline_value, 60.0);
    assert_close(efficiency.current_value, 40.0);
    assert_close(efficiency.change, 100.0 / 3.0);
    assert!(efficiency.met);

    // 1v1 share moves from 10% to 30%.
    let substitution = find(&results, KpiKind::OneOnOneSubstitution);
    assert_close(substitution.change, 20.0);
    assert!(substitution.met);

    // Perfectly even load afterwards: the CV drops to zero.
    let burden = find(&results, KpiKind::BurdenBalance);
    assert_close(burden.current_value, 0.0);
    assert_close(burden.change, 100.0);
    assert!(burden.met);
}

#[test]
fn heavy_users_are_followed_from_the_baseline() {
    let mut baseline = Vec::new();
    let mut current = Vec::new();
    for i in 0..12 {
        let user = format!("u{i:02}");
        let load = f64::from(i + 1);
        baseline.push(rec(&user, "9月", load, load * 30.0, (1, 1, 0)));
        current.push(rec(&user, "11.3-11.9", load / 2.0, load * 15.0, (1, 1, 0)));
    }

    let results = calculator()
        .calculate_monitoring_kpis(&Dataset::new(baseline), &Dataset::new(current), None)
        .unwrap();
    assert_eq!(results.len(), 1);

    // Top 10 are loads 3..=12, mean 7.5, halved afterwards.
    let kpi = find(&results, KpiKind::HeavyUserImprovement);
    assert_close(kpi.baseline_value, 7.5);
    assert_close(kpi.current_value, 3.75);
    assert_close(kpi.change, 50.0);
    assert!(kpi.met);
}

#[test]
fn heavy_users_absent_from_the_current_cohort_are_not_available() {
    let baseline: Dataset = (0..12)
        .map(|i| rec(&format!("u{i:02}"), "9月", f64::from(i + 1), 30.0, (1, 1, 0)))
        .collect();
    let current: Dataset = (0..4)
        .map(|i| rec(&format!("joiner{i}"), "11.3-11.9", 1.0, 30.0, (1, 1, 0)))
        .collect();

    let results = calculator().calculate_monitoring_kpis(&baseline, &current, None).unwrap();

    let kpi = find(&results, KpiKind::HeavyUserImprovement);
    assert_close(kpi.baseline_value, 7.5);
    assert_eq!(kpi.current_value, None);
    assert_eq!(kpi.change, None);
    assert!(!kpi.met);
}

/// Three weeks whose means are 2, 4 and 6: CV = 2 / 4 = 0.5.
fn swinging_weeks() -> Dataset {
    [("10.20-10.26", 2.0), ("10.27-11.2", 4.0), ("11.3-11.9", 6.0)]
        .iter()
        .flat_map(|(week, m)| cohort(week, &[*m, *m]).records().to_vec())
        .collect()
}

#[rstest]
#[case::default_threshold(0.15, false)]
#[case::at_the_threshold(0.5, false)]
#[case::above_the_threshold(0.51, true)]
fn weekly_volatility_must_stay_below_the_threshold(#[case] max_cv: f64, #[case] met: bool) {
    let targets = KpiTargets { weekly_volatility_max_cv: max_cv, ..Default::default() };
    let baseline = cohort("9月", &[5.0, 4.0, 6.0]);
    let current = cohort("11.3-11.9", &[4.0, 3.0, 4.0, 5.0]);

    let results = MetricsCalculator::new(targets)
        .unwrap()
        .calculate_monitoring_kpis(&baseline, &current, Some(&swinging_weeks()))
        .unwrap();

    let kpi = find(&results, KpiKind::WeeklyVolatility);
    assert_eq!(kpi.change, Some(0.5));
    assert_eq!(kpi.met, met);
}

#[test]
fn weekly_volatility_is_only_reported_with_a_weekly_series() {
    let baseline = cohort("9月", &[5.0, 4.0, 6.0]);
    let current = cohort("11.3-11.9", &[4.0, 3.0, 4.0, 5.0]);
    let weekly: Dataset = ["10.20-10.26", "10.27-11.2", "11.3-11.9"]
        .iter()
        .flat_map(|week| cohort(week, &[4.0, 4.0]).records().to_vec())
        .collect();

    let without = calculator().calculate_all_kpis(&baseline, &current, None).unwrap();
    assert!(without.iter().all(|r| r.kind != KpiKind::WeeklyVolatility));

    let with = calculator().calculate_all_kpis(&baseline, &current, Some(&weekly)).unwrap();
    let kpi = find(&with, KpiKind::WeeklyVolatility);
    assert_close(kpi.change, 0.0);
    assert!(kpi.met);
    assert_eq!(kpi.target.to_string(), "<0.15");
}

#[test]
fn results_come_in_reporting_order() {
    let baseline = cohort("9月", &[5.0, 4.0, 6.0]);
    let current = cohort("11.3-11.9", &[4.0, 3.0, 4.0, 5.0]);
    let weekly = current.clone();

    let kinds: Vec<KpiKind> = calculator()
        .calculate_all_kpis(&baseline, &current, Some(&weekly))
        .unwrap()
        .into_iter()
        .map(|r| r.kind)
        .collect();

    assert_eq!(
        kinds,
        vec![
            KpiKind::MeetingCountReduction,
            KpiKind::MeetingDurationReduction,
            KpiKind::InstantShareDrop,
            KpiKind::DurationEfficiency,
            KpiKind::OneOnOneSubstitution,
            KpiKind::BurdenBalance,
            KpiKind::HeavyUserImprovement,
            KpiKind::WeeklyVolatility,
        ]
    );
}

#[test]
fn malformed_records_surface_as_validation_errors() {
    let baseline = cohort("9月", &[5.0, 4.0, 6.0]);
    let mut current = cohort("11.3-11.9", &[4.0, 3.0]).records().to_vec();
    current[1].total_meetings += 1;

    let err = calculator()
        .calculate_all_kpis(&baseline, &Dataset::new(current), None)
        .unwrap_err();
    match err {
        MetricsError::Validation(CoreError::DataValidation { index, user_id, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(user_id, "user01");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn primary_tally_and_json_shape() {
    let baseline = cohort("9月", &[5.0, 4.0, 6.0]);
    let current = cohort("11.3-11.9", &[4.0, 3.0, 4.0, 5.0]);
    let results = calculator().calculate_all_kpis(&baseline, &current, None).unwrap();

    // Count and duration both drop 20%; instant share is unchanged.
    assert_eq!(tally(&results, KpiCategory::Primary), (2, 3));

    let json = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(json["kind"], "meeting_count_reduction");
    assert_eq!(json["category"], "primary");
    assert_eq!(json["target"]["comparison"], "at_least");
}

#[test]
fn period_comparison_lists_every_period() {
    let mut records = cohort("9月", &[5.0, 3.0]).records().to_vec();
    records.extend(cohort("10.20-10.26", &[2.0, 2.0, 2.0]).records().to_vec());

    let snapshots = calculator().period_comparison(&Dataset::new(records)).unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].period_id, "9月");
    assert_eq!(snapshots[0].meetings_per_day, 4.0);
    assert_eq!(snapshots[1].records, 3);
    assert_eq!(snapshots[1].instant_share_pct, 50.0);
}

proptest! {
    #[test]
    fn reduction_sign_follows_the_means(
        baseline in prop::collection::vec(0.1f64..20.0, 2..12),
        current in prop::collection::vec(0.0f64..20.0, 2..12),
    ) {
        let b = cohort("9月", &baseline);
        let c = cohort("11.3-11.9", &current);
        let calc = calculator();

        let first = calc.calculate_primary_kpis(&b, &c).unwrap();
        let second = calc.calculate_primary_kpis(&b, &c).unwrap();
        prop_assert_eq!(&first, &second);

        let kpi = find(&first, KpiKind::MeetingCountReduction);
        let b_mean = kpi.baseline_value.unwrap();
        let c_mean = kpi.current_value.unwrap();
        let change = kpi.change.unwrap();
        prop_assert_eq!(change > 0.0, b_mean > c_mean);
        prop_assert_eq!(change < 0.0, b_mean < c_mean);
    }
}
