//! Typed result tables loaded from the benchmark harness CSV output
//!
//! The schema is closed: the harness writes a fixed set of columns and every
//! report declares up front which of them it needs. There is no generic,
//! runtime-introspected column machinery here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors for table loading and filtering
#[derive(Error, Debug)]
pub enum TableError {
    #[error("results file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} has no header row")]
    Empty { path: PathBuf },

    #[error("column '{column}' missing from {path}")]
    MissingColumn { column: Column, path: PathBuf },

    #[error("{path}:{line}: cannot parse '{value}' as column '{column}'")]
    Parse {
        path: PathBuf,
        line: usize,
        column: Column,
        value: String,
    },

    #[error("{path}:{line}: row has {found} fields, header has {expected}")]
    RaggedRow {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, TableError>;

/// The fixed column set of the harness result tables, plus the single
/// `Usage` column of the testing-set series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Detector,
    TestingSet,
    NBins,
    NObsPerPeriod,
    Alpha,
    Time2Build,
    Time2Predict,
    Tp,
    Tn,
    Fp,
    Fn,
    Usage,
}

impl Column {
    /// Header name as written by the harness
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Detector => "detector",
            Column::TestingSet => "testing_set",
            Column::NBins => "n_bins",
            Column::NObsPerPeriod => "n_obs_per_period",
            Column::Alpha => "alpha",
            Column::Time2Build => "time2build",
            Column::Time2Predict => "time2predict",
            Column::Tp => "tp",
            Column::Tn => "tn",
            Column::Fp => "fp",
            Column::Fn => "fn",
            Column::Usage => "Usage",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Columns every result table carries
const CORE_COLUMNS: [Column; 8] = [
    Column::Detector,
    Column::TestingSet,
    Column::Time2Build,
    Column::Time2Predict,
    Column::Tp,
    Column::Tn,
    Column::Fp,
    Column::Fn,
];

/// The three swept parameter columns, present only in the sensitivity table
pub const PARAM_COLUMNS: [Column; 3] = [Column::NBins, Column::NObsPerPeriod, Column::Alpha];

/// One of the swept detector parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamColumn {
    NBins,
    NObsPerPeriod,
    Alpha,
}

impl ParamColumn {
    pub fn as_column(&self) -> Column {
        match self {
            ParamColumn::NBins => Column::NBins,
            ParamColumn::NObsPerPeriod => Column::NObsPerPeriod,
            ParamColumn::Alpha => Column::Alpha,
        }
    }

    /// Axis label used in chart payloads
    pub fn label(&self) -> &'static str {
        self.as_column().as_str()
    }
}

/// Which testing set a result row was measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestingSet {
    Normal,
    Anomalous,
}

impl TestingSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestingSet::Normal => "normal",
            TestingSet::Anomalous => "anomalous",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(TestingSet::Normal),
            "anomalous" => Some(TestingSet::Anomalous),
            _ => None,
        }
    }
}

/// Detector parameter configuration for one sweep run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamConfig {
    pub n_bins: u32,
    pub n_obs_per_period: u32,
    pub alpha: f64,
}

impl ParamConfig {
    /// Parameter value viewed as a grid coordinate
    pub fn value(&self, param: ParamColumn) -> f64 {
        match param {
            ParamColumn::NBins => f64::from(self.n_bins),
            ParamColumn::NObsPerPeriod => f64::from(self.n_obs_per_period),
            ParamColumn::Alpha => self.alpha,
        }
    }
}

/// Confusion matrix counts for one result row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    /// True positives - anomalies correctly flagged
    pub tp: u64,
    /// True negatives - normal observations correctly passed
    pub tn: u64,
    /// False positives - normal observations incorrectly flagged
    pub fp: u64,
    /// False negatives - anomalies incorrectly missed
    #[serde(rename = "fn")]
    pub fn_: u64,
}

/// One row of a harness results table, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub detector: String,
    pub testing_set: TestingSet,
    /// `Some` exactly when the source table carries the parameter columns
    pub params: Option<ParamConfig>,
    pub time2build: f64,
    pub time2predict: f64,
    pub confusion: Confusion,
}

/// Equality predicate over the enumerated filterable columns
#[derive(Debug, Clone)]
pub enum RowFilter {
    DetectorEq(String),
    TestingSetEq(TestingSet),
    ParamEq(ParamColumn, f64),
}

impl RowFilter {
    fn matches(&self, record: &ResultRecord) -> bool {
        match self {
            RowFilter::DetectorEq(name) => record.detector == *name,
            RowFilter::TestingSetEq(set) => record.testing_set == *set,
            RowFilter::ParamEq(param, value) => record
                .params
                .map(|p| p.value(*param) == *value)
                .unwrap_or(false),
        }
    }
}

/// An ordered, read-only snapshot of one results table
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    records: Vec<ResultRecord>,
    has_params: bool,
}

impl ResultTable {
    /// Load a results table, verifying that every `required` column is
    /// present in the header before parsing any row.
    pub fn load(path: &Path, required: &[Column]) -> Result<Self> {
        let raw = read_source(path)?;
        Self::parse_csv(&raw, required, path)
    }

    /// Parse CSV text into a table. `path` only labels errors.
    pub fn parse_csv(raw: &str, required: &[Column], path: &Path) -> Result<Self> {
        let mut lines = raw.lines().enumerate();
        let header = match lines.next() {
            Some((_, line)) => line,
            None => {
                return Err(TableError::Empty {
                    path: path.to_path_buf(),
                })
            }
        };
        let index = header_index(header);

        for column in required.iter().chain(CORE_COLUMNS.iter()) {
            if !index.contains_key(column.as_str()) {
                return Err(TableError::MissingColumn {
                    column: *column,
                    path: path.to_path_buf(),
                });
            }
        }
        let has_params = PARAM_COLUMNS
            .iter()
            .all(|c| index.contains_key(c.as_str()));

        let mut records = Vec::new();
        for (line_idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < index.len() {
                return Err(TableError::RaggedRow {
                    path: path.to_path_buf(),
                    line: line_idx + 1,
                    expected: index.len(),
                    found: fields.len(),
                });
            }
            records.push(parse_record(path, line_idx + 1, &index, &fields, has_params)?);
        }

        Ok(ResultTable {
            records,
            has_params,
        })
    }

    /// Build a table from already-typed records (tests, synthetic sweeps)
    pub fn from_records(records: Vec<ResultRecord>) -> Self {
        let has_params = records.iter().all(|r| r.params.is_some());
        ResultTable {
            records,
            has_params,
        }
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the source table carried the three parameter columns
    pub fn has_params(&self) -> bool {
        self.has_params
    }

    /// New table with only the rows matching `filter`. No matching rows
    /// yields an empty table, not an error.
    pub fn filter(&self, filter: &RowFilter) -> ResultTable {
        ResultTable {
            records: self
                .records
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect(),
            has_params: self.has_params,
        }
    }

    /// Distinct sorted values observed for `param` across the whole table.
    /// The sweep is not guaranteed dense, so this is the axis range, not a
    /// promise that every combination was measured.
    pub fn param_values(&self, param: ParamColumn) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .records
            .iter()
            .filter_map(|r| r.params.map(|p| p.value(param)))
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        values
    }
}

/// Load the `Usage` column of a testing-set table, truncated to the first
/// `limit` observations.
pub fn load_usage_series(path: &Path, limit: usize) -> Result<Vec<f64>> {
    let raw = read_source(path)?;
    let mut lines = raw.lines().enumerate();
    let header = match lines.next() {
        Some((_, line)) => line,
        None => {
            return Err(TableError::Empty {
                path: path.to_path_buf(),
            })
        }
    };
    let index = header_index(header);
    let usage_idx = *index
        .get(Column::Usage.as_str())
        .ok_or_else(|| TableError::MissingColumn {
            column: Column::Usage,
            path: path.to_path_buf(),
        })?;

    let mut series = Vec::new();
    for (line_idx, line) in lines {
        if series.len() == limit {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let value = field_at(&fields, usage_idx, Column::Usage, path, line_idx + 1)?;
        series.push(value);
    }
    Ok(series)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            TableError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            TableError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn header_index(header: &str) -> HashMap<String, usize> {
    header
        .split(',')
        .map(|name| name.trim().to_string())
        .enumerate()
        .map(|(idx, name)| (name, idx))
        .collect()
}

fn field_at<T: FromStr>(
    fields: &[&str],
    idx: usize,
    column: Column,
    path: &Path,
    line: usize,
) -> Result<T> {
    let text = fields.get(idx).copied().unwrap_or("");
    text.parse::<T>().map_err(|_| TableError::Parse {
        path: path.to_path_buf(),
        line,
        column,
        value: text.to_string(),
    })
}

fn parse_record(
    path: &Path,
    line: usize,
    index: &HashMap<String, usize>,
    fields: &[&str],
    has_params: bool,
) -> Result<ResultRecord> {
    let col = |column: Column| index[column.as_str()];
    // duplicate header names can leave positions past the checked row
    // length, so field access stays bounds-checked
    let text_at = |idx: usize| fields.get(idx).copied().unwrap_or("");

    let detector = text_at(col(Column::Detector)).to_string();
    let raw_set = text_at(col(Column::TestingSet));
    let testing_set = TestingSet::parse(raw_set).ok_or_else(|| TableError::Parse {
        path: path.to_path_buf(),
        line,
        column: Column::TestingSet,
        value: raw_set.to_string(),
    })?;

    let params = if has_params {
        Some(ParamConfig {
            n_bins: field_at(fields, col(Column::NBins), Column::NBins, path, line)?,
            n_obs_per_period: field_at(
                fields,
                col(Column::NObsPerPeriod),
                Column::NObsPerPeriod,
                path,
                line,
            )?,
            alpha: field_at(fields, col(Column::Alpha), Column::Alpha, path, line)?,
        })
    } else {
        None
    };

    Ok(ResultRecord {
        detector,
        testing_set,
        params,
        time2build: field_at(fields, col(Column::Time2Build), Column::Time2Build, path, line)?,
        time2predict: field_at(
            fields,
            col(Column::Time2Predict),
            Column::Time2Predict,
            path,
            line,
        )?,
        confusion: Confusion {
            tp: field_at(fields, col(Column::Tp), Column::Tp, path, line)?,
            tn: field_at(fields, col(Column::Tn), Column::Tn, path, line)?,
            fp: field_at(fields, col(Column::Fp), Column::Fp, path, line)?,
            fn_: field_at(fields, col(Column::Fn), Column::Fn, path, line)?,
        },
    })
}
