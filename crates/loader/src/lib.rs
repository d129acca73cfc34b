//! # Loader Crate
//!
//! Turns the exported per-period meeting reports into a `Dataset`.
//!
//! ## Architectural Principles
//!
//! - **Thin Adapter:** The loader only maps the export's column contract onto
//!   `Record`s. It performs no statistics and no validation beyond what
//!   deserialization requires; the engines validate the dataset they receive.
//! - **Period From File Name:** Each file holds one period. Its id and kind come
//!   from the file stem, never from the rows themselves.
//!
//! ## Public API
//!
//! - `load_dir`: Loads every `*.csv` and `*.json` report in a directory into a
//!   `Dataset`.
//! - `load_file`: Loads the records of a single report.
//! - `parse_period`: Derives a `Period` from a report's file stem.
//! - `ReportFormat`: The file formats the exporter produces, told apart by extension.
//! - `LoaderError`: The errors that can occur while reading reports.

pub mod error;
pub mod reader;
pub mod row;

pub use error::LoaderError;
pub use reader::{ReportFormat, load_dir, load_file, parse_period};
pub use row::ReportRow;
