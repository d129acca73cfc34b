use crate::error::LoaderError;
use crate::row::ReportRow;
use core_types::{Dataset, Period, PeriodKind, Record};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix the report exporter appends to every file stem.
const REPORT_SUFFIX: &str = "会议详情";

/// Derives the period a report covers from its file stem.
///
/// "9月会议详情" is the monthly period "9月"; "10.20-10.26会议详情" is the
/// weekly period "10.20-10.26". The suffix is optional.
pub fn parse_period(stem: &str) -> Option<Period> {
    let id = stem.trim();
    let id = id.strip_suffix(REPORT_SUFFIX).unwrap_or(id).trim();

    if let Some(month) = id.strip_suffix('月') {
        let month: u32 = month.parse().ok()?;
        return (1..=12).contains(&month).then(|| Period::new(id, PeriodKind::Monthly));
    }

    let (start, end) = id.split_once('-')?;
    (is_month_day(start) && is_month_day(end)).then(|| Period::new(id, PeriodKind::Weekly))
}

fn is_month_day(s: &str) -> bool {
    let Some((month, day)) = s.split_once('.') else {
        return false;
    };
    matches!(
        (month.parse::<u32>(), day.parse::<u32>()),
        (Ok(m), Ok(d)) if (1..=12).contains(&m) && (1..=31).contains(&d)
    )
}

/// File formats the report exporter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Reads one exported report for a single period: a CSV file with a header
/// row, or a JSON array of rows keyed by the same column names.
pub fn load_file(path: &Path) -> Result<Vec<Record>, LoaderError> {
    let format = ReportFormat::from_path(path)
        .ok_or_else(|| LoaderError::UnsupportedFormat(path.to_path_buf()))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LoaderError::UnknownPeriod(path.display().to_string()))?;
    let period =
        parse_period(stem).ok_or_else(|| LoaderError::UnknownPeriod(stem.to_string()))?;

    let rows = match format {
        ReportFormat::Csv => read_csv(path)?,
        ReportFormat::Json => read_json(path)?,
    };
    let records: Vec<Record> = rows.into_iter().map(|row| row.into_record(&period)).collect();

    tracing::debug!(
        path = %path.display(),
        period = %period.id,
        ?format,
        "Loaded {} rows",
        records.len()
    );
    Ok(records)
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> LoaderError + '_ {
    move |source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_csv(path: &Path) -> Result<Vec<ReportRow>, LoaderError> {
    let file = fs::File::open(path).map_err(io_error(path))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    reader
        .deserialize::<ReportRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|source| LoaderError::CsvRow {
                path: path.to_path_buf(),
                row: i + 1,
                source,
            })
        })
        .collect()
}

fn read_json(path: &Path) -> Result<Vec<ReportRow>, LoaderError> {
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&text).map_err(|source| LoaderError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    rows.into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value::<ReportRow>(value).map_err(|source| LoaderError::Row {
                path: path.to_path_buf(),
                row: i + 1,
                source,
            })
        })
        .collect()
}

/// Loads every `*.csv` and `*.json` report in `dir` into one period-ordered
/// dataset.
pub fn load_dir(dir: &Path) -> Result<Dataset, LoaderError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error(dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(io_error(dir))?;
    paths.retain(|p| p.is_file() && ReportFormat::from_path(p).is_some());
    paths.sort();

    let mut records = Vec::new();
    for path in &paths {
        records.extend(load_file(path)?);
    }

    if records.is_empty() {
        tracing::warn!(dir = %dir.display(), "No report rows found");
    } else {
        tracing::info!(
            dir = %dir.display(),
            "Loaded {} records from {} files",
            records.len(),
            paths.len()
        );
    }
    Ok(Dataset::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn monthly_and_weekly_stems() {
        assert_eq!(parse_period("9月会议详情"), Some(Period::new("9月", PeriodKind::Monthly)));
        assert_eq!(parse_period("10月"), Some(Period::new("10月", PeriodKind::Monthly)));
        assert_eq!(
            parse_period("10.20-10.26会议详情"),
            Some(Period::new("10.20-10.26", PeriodKind::Weekly))
        );
        assert_eq!(
            parse_period("10.27-11.2会议详情"),
            Some(Period::new("10.27-11.2", PeriodKind::Weekly))
        );
    }

    #[test]
    fn unrecognised_stems() {
        for stem in ["会议详情", "13月会议详情", "summary", "10.20会议详情", "10.40-11.2", "a.b-c.d"] {
            assert_eq!(parse_period(stem), None, "{stem}");
        }
    }
}
