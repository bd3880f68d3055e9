//! CLI argument parsing for Informe

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the report summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report (default)
    Text,
    /// JSON report for machine parsing
    Json,
}

/// Which of the fixed report types to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// All three reports in order
    All,
    /// Testing-set comparison over the observation window
    TestingSets,
    /// Per-detector accuracy and timing statistics
    Variants,
    /// Parameter sensitivity surfaces for one detector
    Sensitivity,
}

#[derive(Parser, Debug)]
#[command(name = "informe")]
#[command(version)]
#[command(about = "Accuracy and performance reports for anomaly-detector benchmarks", long_about = None)]
pub struct Cli {
    /// Directory containing dataset/ and script_results/
    #[arg(long = "data-dir", value_name = "DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Detector variant analyzed by the sensitivity report
    #[arg(short = 'd', long = "detector", default_value = "Hamming")]
    pub detector: String,

    /// Which report to generate
    #[arg(long = "report", value_enum, default_value = "all")]
    pub report: ReportKind,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Reference n_bins fixed by the alpha vs n_obs_per_period accuracy view
    #[arg(long = "ref-n-bins", value_name = "N", default_value = "30")]
    pub ref_n_bins: u32,

    /// Reference alpha fixed by the n_bins vs n_obs_per_period accuracy view
    #[arg(long = "ref-alpha", value_name = "ALPHA", default_value = "5.0")]
    pub ref_alpha: f64,

    /// Reference n_obs_per_period fixed by the alpha vs n_bins accuracy view
    #[arg(long = "ref-n-obs", value_name = "N", default_value = "336")]
    pub ref_n_obs_per_period: u32,

    /// Observations compared between the two testing sets
    #[arg(long = "window", value_name = "N", default_value = "336")]
    pub window: usize,

    /// Write each chart payload as a JSON file into DIR
    #[arg(long = "charts-dir", value_name = "DIR")]
    pub charts_dir: Option<PathBuf>,

    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug: bool,
}
