use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use core_types::Metric;
use metrics::{KpiResult, PeriodSnapshot};
use std::collections::BTreeMap;
use trends::{MetricSummary, PeriodComparison, TrendDirection};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:+.1}%"))
}

pub fn kpi_table(results: &[KpiResult]) -> Table {
    let mut table = new_table(vec![
        "Category", "KPI", "Baseline", "Current", "Change", "Target", "Status",
    ]);
    for kpi in results {
        let status = if kpi.is_insufficient() {
            Cell::new("insufficient data").fg(Color::Yellow)
        } else if kpi.met {
            Cell::new("met").fg(Color::Green)
        } else {
            Cell::new("not met").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&kpi.category),
            Cell::new(&kpi.name),
            Cell::new(number(kpi.baseline_value)),
            Cell::new(number(kpi.current_value)),
            Cell::new(kpi.change_display()),
            Cell::new(&kpi.target),
            status,
        ]);
    }
    table
}

pub fn period_table(snapshots: &[PeriodSnapshot]) -> Table {
    let mut table = new_table(vec![
        "Period",
        "Kind",
        "Users",
        "Meetings/day",
        "Minutes/day",
        "Instant share",
    ]);
    for s in snapshots {
        table.add_row(vec![
            s.period_id.clone(),
            s.period_kind.to_string(),
            s.records.to_string(),
            format!("{:.2}", s.meetings_per_day),
            format!("{:.2}", s.meeting_minutes_per_day),
            format!("{:.1}%", s.instant_share_pct),
        ]);
    }
    table
}

pub fn trend_table(report: &BTreeMap<Metric, MetricSummary>) -> Table {
    let mut table = new_table(vec![
        "Metric", "Direction", "Slope", "R²", "p-value", "Change", "Latest mean", "Anomalies",
    ]);
    for (metric, summary) in report {
        let mut row = vec![Cell::new(metric.label())];
        match &summary.trend {
            Some(trend) => {
                let color = match trend.direction {
                    TrendDirection::Down => Color::Green,
                    TrendDirection::Up => Color::Red,
                    TrendDirection::Flat => Color::Reset,
                };
                row.push(Cell::new(format!("{:?}", trend.direction)).fg(color));
                row.push(Cell::new(format!("{:.3}", trend.slope)));
                row.push(Cell::new(format!("{:.3}", trend.r_squared)));
                row.push(Cell::new(number(trend.p_value)));
                row.push(Cell::new(percent(trend.change_rate)));
            }
            None => {
                row.push(Cell::new("insufficient data").fg(Color::Yellow));
                row.extend((0..4).map(|_| Cell::new("-")));
            }
        }
        row.push(Cell::new(number(summary.distribution.as_ref().map(|d| d.mean))));
        row.push(Cell::new(summary.anomalies.len()));
        table.add_row(row);
    }
    table
}

pub fn top_users_table(metric: Metric, summary: &MetricSummary) -> Table {
    let mut table = new_table(vec!["#", "User", metric.label(), "Periods"]);
    for (rank, user) in summary.top_users.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            user.user_id.clone(),
            format!("{:.2}", user.value),
            user.data_points.to_string(),
        ]);
    }
    table
}

pub fn comparison_table(comparisons: &[PeriodComparison]) -> Table {
    let mut table = new_table(vec![
        "Metric",
        "From",
        "To",
        "Mean before",
        "Mean after",
        "Change",
        "p-value",
        "Significant",
    ]);
    for c in comparisons {
        table.add_row(vec![
            Cell::new(c.metric.label()),
            Cell::new(&c.period_a),
            Cell::new(&c.period_b),
            Cell::new(format!("{:.2}", c.mean_a)),
            Cell::new(format!("{:.2}", c.mean_b)),
            Cell::new(percent(c.change_rate)),
            Cell::new(format!("{:.4}", c.p_value)),
            Cell::new(if c.significant { "yes" } else { "no" }),
        ]);
    }
    table
}
