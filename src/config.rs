//! Named configuration for a reporting run
//!
//! Everything the original workflow hardcoded — table locations, the
//! detector under study, the reference parameter values — is carried here
//! so the same pipeline runs against different datasets and reference
//! points.

use std::path::{Path, PathBuf};

/// Reference parameter values fixed by the three accuracy surfaces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceParams {
    pub n_bins: u32,
    pub alpha: f64,
    pub n_obs_per_period: u32,
}

impl Default for ReferenceParams {
    fn default() -> Self {
        ReferenceParams {
            n_bins: 30,
            alpha: 5.0,
            n_obs_per_period: 336,
        }
    }
}

/// Configuration of one reporting run
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Directory the relative table paths resolve against
    pub data_dir: PathBuf,
    /// Detector variant analyzed by the sensitivity report
    pub detector: String,
    pub reference: ReferenceParams,
    /// Observations compared between the two testing sets (one week of
    /// half-hourly readings by default)
    pub window: usize,
    pub test_normal: PathBuf,
    pub test_anomalous: PathBuf,
    pub variants_results: PathBuf,
    pub sensitivity_results: PathBuf,
}

impl ReportConfig {
    pub fn new(data_dir: &Path, detector: &str) -> Self {
        ReportConfig {
            data_dir: data_dir.to_path_buf(),
            detector: detector.to_string(),
            reference: ReferenceParams::default(),
            window: 336,
            test_normal: PathBuf::from("dataset/test_normal.csv"),
            test_anomalous: PathBuf::from("dataset/test_anomalous.csv"),
            variants_results: PathBuf::from("script_results/variants_results.csv"),
            sensitivity_results: PathBuf::from("script_results/params_sensitivity_results.csv"),
        }
    }

    pub fn test_normal_path(&self) -> PathBuf {
        self.data_dir.join(&self.test_normal)
    }

    pub fn test_anomalous_path(&self) -> PathBuf {
        self.data_dir.join(&self.test_anomalous)
    }

    pub fn variants_results_path(&self) -> PathBuf {
        self.data_dir.join(&self.variants_results)
    }

    pub fn sensitivity_results_path(&self) -> PathBuf {
        self.data_dir.join(&self.sensitivity_results)
    }
}
