//! # Meeting Insight KPI Engine
//!
//! This crate evaluates whether an intervention reduced meeting load by
//! comparing a baseline cohort with a current cohort. It acts as the scorecard
//! of the system.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O. It depends only on `core-types` for the data and on
//!   `configuration` for the KPI targets.
//! - **Stateless calculation:** `MetricsCalculator` takes two datasets and
//!   returns a fresh `Vec<KpiResult>`. Calls never share state, so independent
//!   datasets can be processed from several threads at once.
//! - **No exceptions for missing data:** a zero denominator or a cohort with
//!   fewer than two records gives `change = None`, `met = false`.
//!
//! ## Public API
//!
//! - `MetricsCalculator`: computes the primary, secondary and monitoring KPIs.
//! - `KpiResult`: one KPI's baseline value, current value, change and verdict.
//! - `MetricsError`: validation and configuration failures.

// Declare the modules that constitute this crate.
pub mod calculator;
pub mod error;
pub mod kpi;

// Re-export the key components to create a clean, public-facing API.
pub use calculator::{MetricsCalculator, PeriodSnapshot};
pub use error::MetricsError;
pub use kpi::{Comparison, KpiCategory, KpiKind, KpiResult, Target, Unit, tally};
