//! Descriptive statistics over report series
//!
//! Mean/stddev/min/max run through trueno's SIMD vector ops; quartiles and
//! the median come from aprender's quantile implementation (R-7 method).
//! Note: trueno's stddev is the population deviation (divide by n).

use aprender::stats::DescriptiveStats;
use serde::Serialize;
use trueno::Vector;

use crate::accuracy;

/// Timing columns are recorded in seconds; reports print milliseconds.
pub const MS_PER_SECOND: f64 = 1000.0;

/// Descriptive statistics of one series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Describe {
    /// Print the block to stdout, matching the report layout
    pub fn print(&self, label: &str) {
        println!("{label}:");
        println!("  Count:        {}", self.count);
        println!("  Mean:         {:.4}", self.mean);
        println!("  Std Dev:      {:.4}", self.std);
        println!("  Min:          {:.4}", self.min);
        println!("  25%:          {:.4}", self.q25);
        println!("  Median (P50): {:.4}", self.median);
        println!("  75%:          {:.4}", self.q75);
        println!("  Max:          {:.4}", self.max);
    }
}

/// Descriptive statistics of `values`, `None` for an empty series
pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }

    let data: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    let v = Vector::from_slice(&data);
    let stats = DescriptiveStats::new(&v);

    Some(Describe {
        count: values.len(),
        mean: f64::from(v.mean().unwrap_or(0.0)),
        std: f64::from(v.stddev().unwrap_or(0.0)),
        min: f64::from(v.min().unwrap_or(0.0)),
        q25: f64::from(stats.quantile(0.25).unwrap_or(0.0)),
        median: f64::from(stats.quantile(0.5).unwrap_or(0.0)),
        q75: f64::from(stats.quantile(0.75).unwrap_or(0.0)),
        max: f64::from(v.max().unwrap_or(0.0)),
    })
}

/// Statistics over the defined subset of a sentinel-carrying series.
/// Undefined entries are excluded, not counted as zero; `count` reports how
/// many entries were defined.
pub fn describe_defined(values: &[Option<f64>]) -> Option<Describe> {
    describe(&accuracy::defined(values))
}

/// Seconds to milliseconds, element-wise
pub fn to_millis(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v * MS_PER_SECOND).collect()
}
