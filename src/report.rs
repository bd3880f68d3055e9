//! Report generation
//!
//! Orchestrates load -> filter -> aggregate -> derive for the three report
//! types, prints the textual summaries to stdout, and hands the resulting
//! arrays to the chart renderer. Each method returns a serializable report
//! struct so the binary can emit JSON instead of text.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::accuracy;
use crate::aggregate::{group_reduce, KeyColumn, Reduction};
use crate::config::ReportConfig;
use crate::render::{ChartRenderer, LineSeries, LineStyle, SurfaceLabels};
use crate::sensitivity::{accuracy_surface, timing_surfaces, AccuracySurface, TimingSurfaces};
use crate::stats::{describe, describe_defined, Describe, MS_PER_SECOND};
use crate::table::{load_usage_series, ParamColumn, ResultTable, RowFilter, PARAM_COLUMNS};

/// The two usage series plotted against each other
#[derive(Debug, Clone, Serialize)]
pub struct TestingSetComparison {
    pub window: usize,
    pub normal: Vec<f64>,
    pub anomalous: Vec<f64>,
}

/// Accuracy of one detector variant over both testing sets
#[derive(Debug, Clone, Serialize)]
pub struct VariantAccuracy {
    pub detector: String,
    /// `None` when the aggregate had zero total observations
    pub accuracy: Option<f64>,
}

/// Per-variant accuracy plus timing statistics across variants
#[derive(Debug, Clone, Serialize)]
pub struct VariantsReport {
    pub accuracy: Vec<VariantAccuracy>,
    pub time2build_ms: Option<Describe>,
    pub time2predict_ms: Option<Describe>,
}

/// One accuracy surface with the statistics of its defined cells
#[derive(Debug, Clone, Serialize)]
pub struct AccuracySurfaceReport {
    pub surface: AccuracySurface,
    pub stats: Option<Describe>,
}

/// Sensitivity analysis of one detector across the parameter sweep
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityReport {
    pub detector: String,
    pub timing: TimingSurfaces,
    pub time2build_ms: Option<Describe>,
    pub time2predict_ms: Option<Describe>,
    pub accuracy_surfaces: Vec<AccuracySurfaceReport>,
}

/// Builds the three fixed report types against one configuration
pub struct ReportGenerator<'a, R: ChartRenderer> {
    config: &'a ReportConfig,
    renderer: &'a mut R,
    print_text: bool,
}

impl<'a, R: ChartRenderer> ReportGenerator<'a, R> {
    pub fn new(config: &'a ReportConfig, renderer: &'a mut R, print_text: bool) -> Self {
        ReportGenerator {
            config,
            renderer,
            print_text,
        }
    }

    /// Report (a): the two testing sets over the comparison window,
    /// normal solid and anomalous dotted.
    pub fn compare_testing_sets(&mut self) -> Result<TestingSetComparison> {
        let normal = load_usage_series(&self.config.test_normal_path(), self.config.window)
            .context("loading normal testing set")?;
        let anomalous = load_usage_series(&self.config.test_anomalous_path(), self.config.window)
            .context("loading anomalous testing set")?;
        tracing::debug!(
            normal = normal.len(),
            anomalous = anomalous.len(),
            "loaded testing sets"
        );

        if self.print_text {
            println!("-------- Testing sets comparison ---------------------");
            println!(
                "normal: {} observations, anomalous: {} observations",
                normal.len(),
                anomalous.len()
            );
            println!("------------------------------------------------------");
        }

        let steps = normal.len().max(anomalous.len());
        let x_axis: Vec<f64> = (0..steps).map(|i| i as f64).collect();
        self.renderer.render_lines(
            &x_axis,
            &[
                LineSeries {
                    label: "normal".to_string(),
                    style: LineStyle::Solid,
                    values: normal.clone(),
                },
                LineSeries {
                    label: "anomalous".to_string(),
                    style: LineStyle::Dotted,
                    values: anomalous.clone(),
                },
            ],
        )?;

        Ok(TestingSetComparison {
            window: self.config.window,
            normal,
            anomalous,
        })
    }

    /// Report (b): per-detector accuracy over both testing sets plus
    /// descriptive timing statistics across detectors.
    pub fn detector_variants(&mut self) -> Result<VariantsReport> {
        let path = self.config.variants_results_path();
        let table = ResultTable::load(&path, &[])
            .with_context(|| format!("loading variants results from {}", path.display()))?;
        tracing::debug!(rows = table.len(), "loaded variants table");

        let sums = group_reduce(&table, &[KeyColumn::Detector], Reduction::Sum)?;
        let accuracy_rows: Vec<VariantAccuracy> = sums
            .iter()
            .map(|(key, row)| VariantAccuracy {
                detector: key.text(0).unwrap_or_default().to_string(),
                accuracy: accuracy::accuracy(row),
            })
            .collect();

        // mean across the two testing-set rows, then milliseconds
        let means = group_reduce(&table, &[KeyColumn::Detector], Reduction::Mean)?;
        let build_ms: Vec<f64> = means
            .iter()
            .map(|(_, row)| row.time2build * MS_PER_SECOND)
            .collect();
        let predict_ms: Vec<f64> = means
            .iter()
            .map(|(_, row)| row.time2predict * MS_PER_SECOND)
            .collect();
        let time2build_ms = describe(&build_ms);
        let time2predict_ms = describe(&predict_ms);

        if self.print_text {
            println!("-------- Detector variants analysis report -----------");
            println!("Accuracy:");
            for entry in &accuracy_rows {
                match entry.accuracy {
                    Some(value) => println!("  {:<24} {:.6}", entry.detector, value),
                    None => println!("  {:<24} undefined", entry.detector),
                }
            }
            if let Some(stats) = &time2build_ms {
                stats.print("Time to build the model (ms)");
            }
            if let Some(stats) = &time2predict_ms {
                stats.print("Time to make predictions (ms)");
            }
            println!("------------------------------------------------------");
        }

        // detectors with undefined accuracy are left out of the bar chart
        let categories: Vec<String> = accuracy_rows
            .iter()
            .filter(|e| e.accuracy.is_some())
            .map(|e| e.detector.clone())
            .collect();
        let values: Vec<f64> = accuracy_rows
            .iter()
            .filter_map(|e| e.accuracy)
            .collect();
        self.renderer.render_horizontal_bars(&categories, &values)?;

        Ok(VariantsReport {
            accuracy: accuracy_rows,
            time2build_ms,
            time2predict_ms,
        })
    }

    /// Report (c): for the configured detector, two timing surfaces over
    /// (n_obs_per_period, n_bins) and three fixed-parameter accuracy
    /// surfaces at the reference values.
    pub fn params_sensitivity(&mut self) -> Result<SensitivityReport> {
        let path = self.config.sensitivity_results_path();
        let table = ResultTable::load(&path, &PARAM_COLUMNS)
            .with_context(|| format!("loading sensitivity results from {}", path.display()))?;
        let selected = table.filter(&RowFilter::DetectorEq(self.config.detector.clone()));
        tracing::debug!(
            detector = %self.config.detector,
            rows = selected.len(),
            "selected sweep rows"
        );

        let timing =
            timing_surfaces(&selected, ParamColumn::NObsPerPeriod, ParamColumn::NBins)?;
        let time2build_ms = describe(&timing.time2build_ms.defined_cells());
        let time2predict_ms = describe(&timing.time2predict_ms.defined_cells());

        if self.print_text {
            println!("-------- Parameters sensitivity analysis report ------");
            println!("Detector: {}", self.config.detector);
            if let Some(stats) = &time2build_ms {
                stats.print("Mean time to build the model (ms)");
            }
            if let Some(stats) = &time2predict_ms {
                stats.print("Mean time to make predictions (ms)");
            }
        }

        self.renderer.render_surface(
            SurfaceLabels {
                x: "n_bins",
                y: "n_obs_per_period",
                z: "time2build (ms)",
            },
            &timing.time2build_ms.x_axis,
            &timing.time2build_ms.y_axis,
            &timing.time2build_ms.to_z(),
        )?;
        self.renderer.render_surface(
            SurfaceLabels {
                x: "n_bins",
                y: "n_obs_per_period",
                z: "time2predict (ms)",
            },
            &timing.time2predict_ms.x_axis,
            &timing.time2predict_ms.y_axis,
            &timing.time2predict_ms.to_z(),
        )?;

        let reference = self.config.reference;
        let views = [
            (
                ParamColumn::NBins,
                f64::from(reference.n_bins),
                ParamColumn::NObsPerPeriod,
                ParamColumn::Alpha,
            ),
            (
                ParamColumn::Alpha,
                reference.alpha,
                ParamColumn::NObsPerPeriod,
                ParamColumn::NBins,
            ),
            (
                ParamColumn::NObsPerPeriod,
                f64::from(reference.n_obs_per_period),
                ParamColumn::NBins,
                ParamColumn::Alpha,
            ),
        ];

        let mut accuracy_surfaces = Vec::with_capacity(views.len());
        for (fixed, fixed_value, y, x) in views {
            let surface = accuracy_surface(&selected, fixed, fixed_value, y, x)?;
            let flat: Vec<Option<f64>> =
                surface.grid.cells.iter().flatten().copied().collect();
            let stats = describe_defined(&flat);

            if self.print_text {
                match &stats {
                    Some(stats) => {
                        stats.print(&format!("Accuracy ({} = {})", fixed.label(), fixed_value))
                    }
                    None => println!(
                        "Accuracy ({} = {}): no defined cells",
                        fixed.label(),
                        fixed_value
                    ),
                }
            }

            self.renderer.render_surface(
                SurfaceLabels {
                    x: x.label(),
                    y: y.label(),
                    z: "accuracy",
                },
                &surface.grid.x_axis,
                &surface.grid.y_axis,
                &surface.grid.to_z(),
            )?;
            accuracy_surfaces.push(AccuracySurfaceReport { surface, stats });
        }

        if self.print_text {
            println!("------------------------------------------------------");
        }

        Ok(SensitivityReport {
            detector: self.config.detector.clone(),
            timing,
            time2build_ms,
            time2predict_ms,
            accuracy_surfaces,
        })
    }
}
