//! Property-based tests for the aggregation pipeline
//!
//! Covers the data-shape invariants of the report pipeline:
//! 1. Accuracy stays inside [0, 1] whenever it is defined
//! 2. Sum reduction is associative/commutative across table partitions
//! 3. Aggregation never errors on empty input and never loses rows
//! 4. The sensitivity scatter places cells by key, never by position

use proptest::prelude::*;

use informe::accuracy::accuracy;
use informe::aggregate::{group_reduce, KeyColumn, Reduction};
use informe::sensitivity::accuracy_surface;
use informe::table::{Confusion, ParamColumn, ParamConfig, ResultRecord, ResultTable, TestingSet};

fn record_strategy() -> impl Strategy<Value = ResultRecord> {
    (
        prop::sample::select(vec!["A", "B", "C"]),
        prop::bool::ANY,
        0u32..100,
        0u32..100,
        0u32..100,
        0u32..100,
        // multiples of 1/1024 are exactly representable, so sums compare
        // exactly regardless of accumulation order
        0u32..1024,
        0u32..1024,
    )
        .prop_map(
            |(detector, anomalous, tp, tn, fp, fn_, build, predict)| ResultRecord {
                detector: detector.to_string(),
                testing_set: if anomalous {
                    TestingSet::Anomalous
                } else {
                    TestingSet::Normal
                },
                params: None,
                time2build: f64::from(build) / 1024.0,
                time2predict: f64::from(predict) / 1024.0,
                confusion: Confusion {
                    tp: u64::from(tp),
                    tn: u64::from(tn),
                    fp: u64::from(fp),
                    fn_: u64::from(fn_),
                },
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_accuracy_in_unit_interval(
        records in prop::collection::vec(record_strategy(), 0..30),
    ) {
        let table = ResultTable::from_records(records);
        let aggregate = group_reduce(&table, &[KeyColumn::Detector], Reduction::Sum).unwrap();

        for (_, row) in aggregate.iter() {
            let total = row.tp + row.tn + row.fp + row.fn_;
            match accuracy(row) {
                Some(value) => {
                    prop_assert!(total > 0.0);
                    prop_assert!((0.0..=1.0).contains(&value));
                }
                None => prop_assert_eq!(total, 0.0),
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_partitioned_sum_reduction_combines_to_whole(
        records in prop::collection::vec(record_strategy(), 0..40),
        split in 0usize..41,
    ) {
        let split = split.min(records.len());
        let table = ResultTable::from_records(records.clone());
        let whole = group_reduce(&table, &[KeyColumn::Detector], Reduction::Sum).unwrap();

        let left = ResultTable::from_records(records[..split].to_vec());
        let right = ResultTable::from_records(records[split..].to_vec());
        let combined = group_reduce(&left, &[KeyColumn::Detector], Reduction::Sum)
            .unwrap()
            .combine(group_reduce(&right, &[KeyColumn::Detector], Reduction::Sum).unwrap());

        prop_assert_eq!(whole.len(), combined.len());
        for ((wk, wr), (ck, cr)) in whole.iter().zip(combined.iter()) {
            prop_assert_eq!(wk, ck);
            prop_assert_eq!(wr, cr);
        }
    }

    #[test]
    fn prop_group_reduce_preserves_row_count(
        records in prop::collection::vec(record_strategy(), 0..40),
        by_testing_set in prop::bool::ANY,
    ) {
        let table = ResultTable::from_records(records);
        let keys = if by_testing_set {
            vec![KeyColumn::Detector, KeyColumn::TestingSet]
        } else {
            vec![KeyColumn::Detector]
        };
        let aggregate = group_reduce(&table, &keys, Reduction::Sum).unwrap();

        let grouped_rows: usize = aggregate.iter().map(|(_, row)| row.rows).sum();
        prop_assert_eq!(grouped_rows, table.len());
        prop_assert!(aggregate.len() <= table.len().max(1));
    }
}

/// Sweep positions: 3 n_bins values x 2 n_obs_per_period values
const GRID_N_BINS: [u32; 3] = [10, 20, 30];
const GRID_N_OBS: [u32; 2] = [100, 200];

fn sweep_record(cell: usize) -> ResultRecord {
    let n_bins = GRID_N_BINS[cell % 3];
    let n_obs = GRID_N_OBS[cell / 3];
    ResultRecord {
        detector: "Hamming".to_string(),
        testing_set: TestingSet::Anomalous,
        params: Some(ParamConfig {
            n_bins,
            n_obs_per_period: n_obs,
            alpha: 5.0,
        }),
        time2build: 0.001,
        time2predict: 0.001,
        confusion: Confusion {
            // distinct accuracy 1/(1+cell) per grid position
            tp: 1,
            tn: 0,
            fp: cell as u64,
            fn_: 0,
        },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_scatter_places_cells_by_key_even_when_sweep_is_incomplete(
        measured in prop::collection::btree_set(0usize..6, 1..=6),
    ) {
        let records: Vec<ResultRecord> = measured.iter().map(|&c| sweep_record(c)).collect();
        let table = ResultTable::from_records(records);

        let surface = accuracy_surface(
            &table,
            ParamColumn::Alpha,
            5.0,
            ParamColumn::NObsPerPeriod,
            ParamColumn::NBins,
        )
        .unwrap();

        // axes are the distinct sorted values of the measured rows
        let x_axis = table.param_values(ParamColumn::NBins);
        let y_axis = table.param_values(ParamColumn::NObsPerPeriod);
        prop_assert_eq!(&surface.grid.x_axis, &x_axis);
        prop_assert_eq!(&surface.grid.y_axis, &y_axis);

        let mut defined = 0;
        for cell in 0..6 {
            let n_bins = f64::from(GRID_N_BINS[cell % 3]);
            let n_obs = f64::from(GRID_N_OBS[cell / 3]);
            let x_idx = x_axis.iter().position(|v| *v == n_bins);
            let y_idx = y_axis.iter().position(|v| *v == n_obs);
            let (Some(x_idx), Some(y_idx)) = (x_idx, y_idx) else {
                prop_assert!(!measured.contains(&cell));
                continue;
            };

            let expected = if measured.contains(&cell) {
                defined += 1;
                Some(1.0 / (1.0 + cell as f64))
            } else {
                None
            };
            prop_assert_eq!(surface.grid.cell(y_idx, x_idx), expected);
        }
        prop_assert_eq!(surface.grid.defined_cells().len(), defined);
    }
}
