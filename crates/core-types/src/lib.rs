//! # Meeting Insight Core Types
//!
//! Shared vocabulary for every other crate in the workspace: the per-user,
//! per-period `Record`, the period ordering rules, the `Dataset` container and
//! the typed `Metric` enumeration used instead of string column lookups.
//!
//! This crate has no knowledge of KPIs or statistics. It only knows how to hold
//! records, order them, slice them into cohorts and validate them.

pub mod dataset;
pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use dataset::Dataset;
pub use enums::{Metric, PeriodKind};
pub use error::CoreError;
pub use structs::{Period, Record};
