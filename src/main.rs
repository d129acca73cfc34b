mod report;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use configuration::{ConfigOverrides, Settings, load_config};
use core_types::{Dataset, Metric};
use metrics::{KpiCategory, KpiResult, MetricsCalculator, PeriodSnapshot, tally};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use trends::{MetricSummary, PeriodComparison, TrendAnalyzer};

/// The main entry point for the meeting-load analysis tool.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_deref())?;

    // A missing .env file is fine; a malformed one is not.
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("Failed to read .env file"),
    }

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args),
        Commands::Summary(args) => handle_summary(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Measures whether a meeting-reduction intervention reached its targets.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Also write logs to `meeting-insight.log` in this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every KPI and the trend statistics of the report metrics.
    Analyze(RunArgs),
    /// Print only the primary KPIs and how many of them were met.
    Summary(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding the exported per-period CSV or JSON reports.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Settings file (TOML). Defaults to `config.toml` when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

/// Installs the global subscriber. The returned guard must live until exit so
/// buffered file output is flushed.
fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(filter).with(console).try_init()?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
    let appender = tracing_appender::rolling::never(dir, "meeting-insight.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;
    Ok(Some(guard))
}

// ==============================================================================
// Shared Setup
// ==============================================================================

/// Settings, the full dataset and the two cohorts every command works on.
struct Workspace {
    settings: Settings,
    data: Dataset,
    baseline: Dataset,
    current: Dataset,
}

impl Workspace {
    fn load(args: &RunArgs) -> Result<Self> {
        let settings = load_config(args.config.as_deref()).context("Failed to load settings")?;
        let settings = args.overrides.apply(settings).context("Invalid command-line override")?;

        let data = loader::load_dir(&args.data_dir)
            .with_context(|| format!("Failed to load reports from '{}'", args.data_dir.display()))?;
        data.validate().context("The loaded reports are inconsistent")?;

        let baseline = data.baseline();
        let current = data.recent_weeks(settings.cohort.current_weeks);
        tracing::info!(
            records = data.len(),
            users = data.users().len(),
            baseline_records = baseline.len(),
            current_records = current.len(),
            "Dataset loaded"
        );

        Ok(Self { settings, data, baseline, current })
    }

    fn calculator(&self) -> Result<MetricsCalculator> {
        Ok(MetricsCalculator::new(self.settings.kpi.clone())?)
    }
}

// ==============================================================================
// Analyze Command
// ==============================================================================

#[derive(Serialize)]
struct AnalysisReport {
    generated_at: DateTime<Local>,
    baseline_periods: Vec<String>,
    current_periods: Vec<String>,
    kpis: Vec<KpiResult>,
    periods: Vec<PeriodSnapshot>,
    comparisons: Vec<PeriodComparison>,
    trends: BTreeMap<Metric, MetricSummary>,
}

fn handle_analyze(args: RunArgs) -> Result<()> {
    let ws = Workspace::load(&args)?;
    let calculator = ws.calculator()?;

    let weekly = ws.data.weekly();
    let kpis = calculator.calculate_all_kpis(&ws.baseline, &ws.current, Some(&weekly))?;
    let periods = calculator.period_comparison(&ws.data)?;

    let analyzer = TrendAnalyzer::new(&ws.data, ws.settings.trend.clone())?;
    let report_metrics = &ws.settings.trend.report_metrics;
    let trends = analyzer.summary_report(report_metrics)?;
    let comparisons = baseline_vs_latest(&analyzer, &ws, report_metrics)?;

    let analysis = AnalysisReport {
        generated_at: Local::now(),
        baseline_periods: period_ids(&ws.baseline),
        current_periods: period_ids(&ws.current),
        kpis,
        periods,
        comparisons,
        trends,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Meeting-load analysis, generated {}", analysis.generated_at.format("%Y-%m-%d %H:%M"));
    println!(
        "Baseline: {}    Current: {}\n",
        analysis.baseline_periods.join(", "),
        analysis.current_periods.join(", ")
    );
    println!("{}\n", report::kpi_table(&analysis.kpis));
    print_tally(&analysis.kpis);
    println!("\n{}\n", report::period_table(&analysis.periods));
    if !analysis.comparisons.is_empty() {
        println!("{}\n", report::comparison_table(&analysis.comparisons));
    }
    println!("{}", report::trend_table(&analysis.trends));
    for (metric, summary) in &analysis.trends {
        if !summary.top_users.is_empty() {
            println!(
                "\nTop users by {}\n{}",
                metric.label(),
                report::top_users_table(*metric, summary)
            );
        }
    }

    Ok(())
}

/// Welch tests between the last baseline month and the latest week, for each
/// metric with enough values on both sides.
fn baseline_vs_latest(
    analyzer: &TrendAnalyzer<'_>,
    ws: &Workspace,
    metrics: &[Metric],
) -> Result<Vec<PeriodComparison>> {
    let (Some(before), Some(after)) = (ws.baseline.latest_period(), ws.current.latest_period())
    else {
        return Ok(Vec::new());
    };

    let mut comparisons = Vec::new();
    for &metric in metrics {
        match analyzer.compare_periods(metric, &before.id, &after.id) {
            Ok(comparison) => comparisons.push(comparison),
            Err(e) if e.is_insufficient_data() => tracing::warn!("Skipping comparison: {e}"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(comparisons)
}

// ==============================================================================
// Summary Command
// ==============================================================================

fn handle_summary(args: RunArgs) -> Result<()> {
    let ws = Workspace::load(&args)?;
    let kpis = ws.calculator()?.calculate_primary_kpis(&ws.baseline, &ws.current)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&kpis)?);
        return Ok(());
    }

    println!("{}\n", report::kpi_table(&kpis));
    print_tally(&kpis);
    Ok(())
}

fn print_tally(kpis: &[KpiResult]) {
    for category in [KpiCategory::Primary, KpiCategory::Secondary, KpiCategory::Monitoring] {
        let (met, total) = tally(kpis, category);
        if total > 0 {
            println!("{category} KPIs met: {met}/{total}");
        }
    }
}

fn period_ids(data: &Dataset) -> Vec<String> {
    data.periods().into_iter().map(|p| p.id).collect()
}
