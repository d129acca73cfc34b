use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a JSON array of rows: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Row {row} of '{}' is malformed: {source}", path.display())]
    Row {
        path: PathBuf,
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Row {row} of '{}' is malformed: {source}", path.display())]
    CsvRow {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("'{}' is neither a .csv nor a .json report", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Cannot derive a period from file name '{0}'")]
    UnknownPeriod(String),
}
