//! Chart payload boundary
//!
//! The pipeline never renders anything itself. It produces arrays and grids
//! in the shapes a plotting frontend expects and hands them to a
//! `ChartRenderer`. The binary ships a null renderer and a JSON file writer
//! (`--charts-dir`); tests substitute a recording implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Line style hint for a plotted series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dotted,
}

/// One named series of a line chart
#[derive(Debug, Clone, Serialize)]
pub struct LineSeries {
    pub label: String,
    pub style: LineStyle,
    pub values: Vec<f64>,
}

/// Axis labels of a surface chart
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SurfaceLabels {
    pub x: &'static str,
    pub y: &'static str,
    pub z: &'static str,
}

/// External chart-rendering collaborator
pub trait ChartRenderer {
    fn render_lines(&mut self, x_axis: &[f64], series: &[LineSeries]) -> Result<()>;

    fn render_horizontal_bars(&mut self, categories: &[String], values: &[f64]) -> Result<()>;

    /// `z` is row-major, y outer and x inner; empty cells are NaN
    fn render_surface(
        &mut self,
        labels: SurfaceLabels,
        x_axis: &[f64],
        y_axis: &[f64],
        z: &[Vec<f64>],
    ) -> Result<()>;
}

/// Discards every chart; charts are delegated to an external frontend
#[derive(Debug, Default)]
pub struct NullRenderer;

impl ChartRenderer for NullRenderer {
    fn render_lines(&mut self, _x_axis: &[f64], _series: &[LineSeries]) -> Result<()> {
        Ok(())
    }

    fn render_horizontal_bars(&mut self, _categories: &[String], _values: &[f64]) -> Result<()> {
        Ok(())
    }

    fn render_surface(
        &mut self,
        _labels: SurfaceLabels,
        _x_axis: &[f64],
        _y_axis: &[f64],
        _z: &[Vec<f64>],
    ) -> Result<()> {
        Ok(())
    }
}

#[derive(Serialize)]
struct LinesPayload<'a> {
    chart: &'static str,
    x_axis: &'a [f64],
    series: &'a [LineSeries],
}

#[derive(Serialize)]
struct BarsPayload<'a> {
    chart: &'static str,
    categories: &'a [String],
    values: &'a [f64],
}

#[derive(Serialize)]
struct SurfacePayload<'a> {
    chart: &'static str,
    labels: SurfaceLabels,
    x_axis: &'a [f64],
    y_axis: &'a [f64],
    z: &'a [Vec<f64>],
}

/// Writes each chart payload as a numbered JSON file for an external
/// plotting frontend. NaN cells serialize as `null`.
#[derive(Debug)]
pub struct JsonChartWriter {
    dir: PathBuf,
    next_index: usize,
}

impl JsonChartWriter {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create charts directory {}", dir.display()))?;
        Ok(JsonChartWriter {
            dir: dir.to_path_buf(),
            next_index: 1,
        })
    }

    fn write<T: Serialize>(&mut self, kind: &str, payload: &T) -> Result<()> {
        let path = self.dir.join(format!("{:03}_{kind}.json", self.next_index));
        let body = serde_json::to_string_pretty(payload)?;
        fs::write(&path, body)
            .with_context(|| format!("cannot write chart payload {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote chart payload");
        self.next_index += 1;
        Ok(())
    }
}

impl ChartRenderer for JsonChartWriter {
    fn render_lines(&mut self, x_axis: &[f64], series: &[LineSeries]) -> Result<()> {
        self.write(
            "lines",
            &LinesPayload {
                chart: "lines",
                x_axis,
                series,
            },
        )
    }

    fn render_horizontal_bars(&mut self, categories: &[String], values: &[f64]) -> Result<()> {
        self.write(
            "barh",
            &BarsPayload {
                chart: "barh",
                categories,
                values,
            },
        )
    }

    fn render_surface(
        &mut self,
        labels: SurfaceLabels,
        x_axis: &[f64],
        y_axis: &[f64],
        z: &[Vec<f64>],
    ) -> Result<()> {
        self.write(
            "surface",
            &SurfacePayload {
                chart: "surface",
                labels,
                x_axis,
                y_axis,
                z,
            },
        )
    }
}
