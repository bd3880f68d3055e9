//! Grouping and reduction of result tables
//!
//! Rows are partitioned by a tuple of enumerated key columns and every
//! non-key numeric column is reduced independently. The aggregate is backed
//! by an ordered map so iteration follows ascending key order and indexed
//! output stays deterministic across runs.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::table::{ParamColumn, ResultRecord, ResultTable};

/// Errors for group/reduce operations
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("key column '{0}' not present in table")]
    MissingKeyColumn(KeyColumn),
}

pub type Result<T> = std::result::Result<T, AggregateError>;

/// Columns a table can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumn {
    Detector,
    TestingSet,
    NBins,
    NObsPerPeriod,
    Alpha,
}

impl KeyColumn {
    pub fn from_param(param: ParamColumn) -> Self {
        match param {
            ParamColumn::NBins => KeyColumn::NBins,
            ParamColumn::NObsPerPeriod => KeyColumn::NObsPerPeriod,
            ParamColumn::Alpha => KeyColumn::Alpha,
        }
    }

    /// Key value of `record`, or `None` when the record does not carry the
    /// column (parameter keys on a parameter-less table).
    fn value_of(&self, record: &ResultRecord) -> Option<KeyValue> {
        match self {
            KeyColumn::Detector => Some(KeyValue::Text(record.detector.clone())),
            KeyColumn::TestingSet => {
                Some(KeyValue::Text(record.testing_set.as_str().to_string()))
            }
            KeyColumn::NBins => record
                .params
                .map(|p| KeyValue::Num(f64::from(p.n_bins))),
            KeyColumn::NObsPerPeriod => record
                .params
                .map(|p| KeyValue::Num(f64::from(p.n_obs_per_period))),
            KeyColumn::Alpha => record.params.map(|p| KeyValue::Num(p.alpha)),
        }
    }
}

impl fmt::Display for KeyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyColumn::Detector => "detector",
            KeyColumn::TestingSet => "testing_set",
            KeyColumn::NBins => "n_bins",
            KeyColumn::NObsPerPeriod => "n_obs_per_period",
            KeyColumn::Alpha => "alpha",
        };
        f.write_str(name)
    }
}

/// One component of a group key. Numeric components order by
/// `f64::total_cmp` so fractional parameters (alpha) are usable as keys.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Text(String),
    Num(f64),
}

impl KeyValue {
    pub fn as_num(&self) -> Option<f64> {
        match self {
            KeyValue::Num(n) => Some(*n),
            KeyValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyValue::Text(t) => Some(t),
            KeyValue::Num(_) => None,
        }
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyValue::Text(a), KeyValue::Text(b)) => a.cmp(b),
            (KeyValue::Num(a), KeyValue::Num(b)) => a.total_cmp(b),
            (KeyValue::Text(_), KeyValue::Num(_)) => Ordering::Less,
            (KeyValue::Num(_), KeyValue::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Text(t) => f.write_str(t),
            KeyValue::Num(n) => write!(f, "{n}"),
        }
    }
}

/// Tuple of key values identifying one partition
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct GroupKey(Vec<KeyValue>);

impl GroupKey {
    pub fn new(values: Vec<KeyValue>) -> Self {
        GroupKey(values)
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }

    /// Numeric component at `idx`
    pub fn num(&self, idx: usize) -> Option<f64> {
        self.0.get(idx).and_then(KeyValue::as_num)
    }

    /// Text component at `idx`
    pub fn text(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).and_then(KeyValue::as_text)
    }
}

/// How the non-key numeric columns of a partition are reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Mean,
}

/// Reduced numeric columns of one partition. Confusion counts are carried
/// as f64 so one shape serves both sum and mean reduction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReducedRow {
    pub time2build: f64,
    pub time2predict: f64,
    pub tp: f64,
    pub tn: f64,
    pub fp: f64,
    #[serde(rename = "fn")]
    pub fn_: f64,
    /// Number of source rows that fell into the partition
    pub rows: usize,
}

impl ReducedRow {
    fn accumulate(&mut self, record: &ResultRecord) {
        self.time2build += record.time2build;
        self.time2predict += record.time2predict;
        self.tp += record.confusion.tp as f64;
        self.tn += record.confusion.tn as f64;
        self.fp += record.confusion.fp as f64;
        self.fn_ += record.confusion.fn_ as f64;
        self.rows += 1;
    }

    fn into_mean(self) -> ReducedRow {
        if self.rows == 0 {
            return self;
        }
        let n = self.rows as f64;
        ReducedRow {
            time2build: self.time2build / n,
            time2predict: self.time2predict / n,
            tp: self.tp / n,
            tn: self.tn / n,
            fp: self.fp / n,
            fn_: self.fn_ / n,
            rows: self.rows,
        }
    }

    /// Component-wise sum, used when re-combining sum-reduced partitions
    fn merge_sum(&mut self, other: &ReducedRow) {
        self.time2build += other.time2build;
        self.time2predict += other.time2predict;
        self.tp += other.tp;
        self.tn += other.tn;
        self.fp += other.fp;
        self.fn_ += other.fn_;
        self.rows += other.rows;
    }
}

/// Mapping from group key to reduced row, iterated in ascending key order
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    groups: BTreeMap<GroupKey, ReducedRow>,
}

impl Aggregate {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&ReducedRow> {
        self.groups.get(key)
    }

    /// Ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &ReducedRow)> {
        self.groups.iter()
    }

    /// Re-combine two sum-reduced aggregates by key. Aggregating disjoint
    /// partitions and combining equals aggregating the whole table; only
    /// meaningful for `Reduction::Sum` results.
    pub fn combine(mut self, other: Aggregate) -> Aggregate {
        for (key, row) in other.groups {
            self.groups.entry(key).or_default().merge_sum(&row);
        }
        self
    }
}

/// Partition `table` by the tuple of values in `keys` and reduce every
/// non-key numeric column. Duplicate rows for one key accumulate; an empty
/// table produces an empty aggregate.
pub fn group_reduce(
    table: &ResultTable,
    keys: &[KeyColumn],
    reduction: Reduction,
) -> Result<Aggregate> {
    let mut groups: BTreeMap<GroupKey, ReducedRow> = BTreeMap::new();

    for record in table.records() {
        let mut tuple = Vec::with_capacity(keys.len());
        for key in keys {
            tuple.push(
                key.value_of(record)
                    .ok_or(AggregateError::MissingKeyColumn(*key))?,
            );
        }
        groups
            .entry(GroupKey::new(tuple))
            .or_default()
            .accumulate(record);
    }

    if reduction == Reduction::Mean {
        groups = groups
            .into_iter()
            .map(|(key, row)| (key, row.into_mean()))
            .collect();
    }

    Ok(Aggregate { groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Confusion, ParamConfig, ResultRecord, TestingSet};

    fn record(detector: &str, set: TestingSet, confusion: Confusion) -> ResultRecord {
        ResultRecord {
            detector: detector.to_string(),
            testing_set: set,
            params: None,
            time2build: 0.002,
            time2predict: 0.001,
            confusion,
        }
    }

    fn two_detector_table() -> ResultTable {
        ResultTable::from_records(vec![
            record(
                "A",
                TestingSet::Normal,
                Confusion {
                    tp: 10,
                    tn: 10,
                    fp: 0,
                    fn_: 0,
                },
            ),
            record(
                "A",
                TestingSet::Anomalous,
                Confusion {
                    tp: 5,
                    tn: 5,
                    fp: 0,
                    fn_: 0,
                },
            ),
            record(
                "B",
                TestingSet::Normal,
                Confusion {
                    tp: 8,
                    tn: 8,
                    fp: 2,
                    fn_: 2,
                },
            ),
            record(
                "B",
                TestingSet::Anomalous,
                Confusion {
                    tp: 4,
                    tn: 4,
                    fp: 1,
                    fn_: 1,
                },
            ),
        ])
    }

    #[test]
    fn test_group_sum_by_detector() {
        let aggregate =
            group_reduce(&two_detector_table(), &[KeyColumn::Detector], Reduction::Sum).unwrap();
        assert_eq!(aggregate.len(), 2);

        let a = aggregate
            .get(&GroupKey::new(vec![KeyValue::Text("A".to_string())]))
            .unwrap();
        assert_eq!((a.tp, a.tn, a.fp, a.fn_), (15.0, 15.0, 0.0, 0.0));
        assert_eq!(a.rows, 2);

        let b = aggregate
            .get(&GroupKey::new(vec![KeyValue::Text("B".to_string())]))
            .unwrap();
        assert_eq!((b.tp, b.tn, b.fp, b.fn_), (12.0, 12.0, 3.0, 3.0));
    }

    #[test]
    fn test_group_iteration_is_ascending() {
        let aggregate =
            group_reduce(&two_detector_table(), &[KeyColumn::Detector], Reduction::Sum).unwrap();
        let keys: Vec<String> = aggregate
            .iter()
            .map(|(k, _)| k.text(0).unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn test_mean_reduction_of_timings() {
        let mut first = record(
            "A",
            TestingSet::Normal,
            Confusion::default(),
        );
        first.time2build = 0.002;
        let mut second = record(
            "A",
            TestingSet::Anomalous,
            Confusion::default(),
        );
        second.time2build = 0.004;

        let table = ResultTable::from_records(vec![first, second]);
        let aggregate = group_reduce(&table, &[KeyColumn::Detector], Reduction::Mean).unwrap();
        let row = aggregate
            .get(&GroupKey::new(vec![KeyValue::Text("A".to_string())]))
            .unwrap();
        assert!((row.time2build - 0.003).abs() < 1e-12);
        assert_eq!(row.rows, 2);
    }

    #[test]
    fn test_duplicate_keys_accumulate() {
        let confusion = Confusion {
            tp: 1,
            tn: 1,
            fp: 1,
            fn_: 1,
        };
        let table = ResultTable::from_records(vec![
            record("A", TestingSet::Normal, confusion),
            record("A", TestingSet::Normal, confusion),
            record("A", TestingSet::Normal, confusion),
        ]);
        let aggregate = group_reduce(&table, &[KeyColumn::Detector], Reduction::Sum).unwrap();
        assert_eq!(aggregate.len(), 1);
        let row = aggregate.iter().next().unwrap().1;
        assert_eq!(row.tp, 3.0);
        assert_eq!(row.rows, 3);
    }

    #[test]
    fn test_empty_table_reduces_to_empty_aggregate() {
        let table = ResultTable::from_records(Vec::new());
        let aggregate = group_reduce(&table, &[KeyColumn::Detector], Reduction::Sum).unwrap();
        assert!(aggregate.is_empty());
    }

    #[test]
    fn test_missing_key_column_is_an_error() {
        let table = two_detector_table();
        let err = group_reduce(&table, &[KeyColumn::NBins], Reduction::Sum).unwrap_err();
        assert!(matches!(err, AggregateError::MissingKeyColumn(KeyColumn::NBins)));
    }

    #[test]
    fn test_param_tuple_keys_order_numerically() {
        let mut records = Vec::new();
        for (n_bins, alpha) in [(60u32, 10.0), (30, 5.0), (60, 5.0), (30, 10.0)] {
            let mut r = record("A", TestingSet::Normal, Confusion::default());
            r.params = Some(ParamConfig {
                n_bins,
                n_obs_per_period: 336,
                alpha,
            });
            records.push(r);
        }
        let table = ResultTable::from_records(records);
        let aggregate = group_reduce(
            &table,
            &[KeyColumn::NBins, KeyColumn::Alpha],
            Reduction::Sum,
        )
        .unwrap();
        let keys: Vec<(f64, f64)> = aggregate
            .iter()
            .map(|(k, _)| (k.num(0).unwrap(), k.num(1).unwrap()))
            .collect();
        assert_eq!(
            keys,
            vec![(30.0, 5.0), (30.0, 10.0), (60.0, 5.0), (60.0, 10.0)]
        );
    }

    #[test]
    fn test_combine_partitions_equals_whole() {
        let table = two_detector_table();
        let whole = group_reduce(&table, &[KeyColumn::Detector], Reduction::Sum).unwrap();

        let records = table.records();
        let left = ResultTable::from_records(records[..2].to_vec());
        let right = ResultTable::from_records(records[2..].to_vec());
        let combined = group_reduce(&left, &[KeyColumn::Detector], Reduction::Sum)
            .unwrap()
            .combine(group_reduce(&right, &[KeyColumn::Detector], Reduction::Sum).unwrap());

        assert_eq!(whole.len(), combined.len());
        for ((wk, wr), (ck, cr)) in whole.iter().zip(combined.iter()) {
            assert_eq!(wk, ck);
            assert_eq!(wr, cr);
        }
    }
}
