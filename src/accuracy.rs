//! Accuracy derivation from aggregated confusion counts

use crate::aggregate::ReducedRow;

/// Accuracy of a reduced confusion row: (tp+tn) / (tp+tn+fp+fn).
///
/// A partition with zero total observations has no defined accuracy and
/// yields `None`. Callers must carry the sentinel through and exclude it
/// from downstream statistics instead of substituting zero.
pub fn accuracy(row: &ReducedRow) -> Option<f64> {
    let num = row.tp + row.tn;
    let den = num + row.fp + row.fn_;
    if den > 0.0 {
        Some(num / den)
    } else {
        None
    }
}

/// Defined values of a sentinel-carrying series, order preserved
pub fn defined(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().copied().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tp: f64, tn: f64, fp: f64, fn_: f64) -> ReducedRow {
        ReducedRow {
            tp,
            tn,
            fp,
            fn_,
            rows: 1,
            ..ReducedRow::default()
        }
    }

    #[test]
    fn test_perfect_detector() {
        assert_eq!(accuracy(&row(15.0, 15.0, 0.0, 0.0)), Some(1.0));
    }

    #[test]
    fn test_grouped_scenario() {
        // Detector B from the two-set scenario: (12,12,3,3) -> 0.8
        assert_eq!(accuracy(&row(12.0, 12.0, 3.0, 3.0)), Some(0.8));
    }

    #[test]
    fn test_zero_denominator_is_undefined_not_zero() {
        assert_eq!(accuracy(&row(0.0, 0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn test_accuracy_stays_in_unit_interval() {
        for (tp, tn, fp, fn_) in [
            (0.0, 0.0, 7.0, 3.0),
            (1.0, 0.0, 0.0, 99.0),
            (50.0, 50.0, 0.0, 0.0),
            (3.5, 2.5, 1.0, 1.0), // mean-reduced fractional counts
        ] {
            let value = accuracy(&row(tp, tn, fp, fn_)).unwrap();
            assert!((0.0..=1.0).contains(&value), "accuracy {value} out of range");
        }
    }

    #[test]
    fn test_defined_skips_sentinels() {
        let values = vec![Some(1.0), None, Some(0.5), None];
        assert_eq!(defined(&values), vec![1.0, 0.5]);
    }
}
