//! # Meeting Insight Trend Analyzer
//!
//! Statistical analysis over the full, period-ordered meeting dataset: trend
//! fitting, z-score anomaly detection, distribution and correlation analysis,
//! period-to-period significance tests and top-user rankings.
//!
//! ## Architectural Principles
//!
//! - **Independent of the KPI engine:** it consumes a `core_types::Dataset`
//!   just like the `metrics` crate, and neither depends on the other.
//! - **Borrowing, stateless analyzer:** `TrendAnalyzer` borrows the dataset
//!   and keeps no state between calls.
//! - **Typed degradation:** too few points for a statistic is
//!   `TrendError::InsufficientData`, which `summary_report` turns into `None`.
//!   A malformed record (`Validation`) or a bad threshold (`Configuration`) is
//!   always fatal for the call.
//!
//! ## Public API
//!
//! - `TrendAnalyzer`: trend, anomaly, distribution, comparison, ranking and
//!   correlation operations plus the combined `summary_report`.
//! - Result types (`TrendResult`, `AnomalyPoint`, `Distribution`, ...): plain
//!   serializable value objects.
//! - `stats`: the numeric kernels (regression, Welch test, ranks, moments).
//! - `TrendError`: the errors that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod analyzer;
pub mod error;
pub mod results;
pub mod stats;

// Re-export the key components to create a clean, public-facing API.
pub use analyzer::TrendAnalyzer;
pub use error::TrendError;
pub use results::{
    AnomalyKind, AnomalyPoint, Correlation, Distribution, MetricSummary, PeriodChange,
    PeriodComparison, RankedUser, TrendDirection, TrendPoint, TrendResult, UserImprovement,
};
