//! Fixed-parameter sensitivity views over the parameter sweep
//!
//! A view fixes one parameter to its reference value, aggregates over the
//! remaining two dimensions, and scatters the per-cell scalar into a 2D
//! grid keyed by (y_value, x_value). The sweep is not guaranteed dense, so
//! cells are placed by key match, never by positional reshape; unmeasured
//! combinations stay explicitly empty.

use serde::Serialize;
use thiserror::Error;

use crate::accuracy;
use crate::aggregate::{group_reduce, AggregateError, KeyColumn, Reduction};
use crate::stats::MS_PER_SECOND;
use crate::table::{ParamColumn, ResultTable, RowFilter};

/// Errors for sensitivity view construction
#[derive(Error, Debug)]
pub enum SensitivityError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("cell ({y}, {x}) falls outside the derived axes")]
    CellOutsideAxes { y: f64, x: f64 },
}

pub type Result<T> = std::result::Result<T, SensitivityError>;

/// 2D grid of per-cell scalars, row-major with y outer and x inner.
/// `None` marks a cell with no data: an unmeasured parameter combination
/// or an undefined accuracy.
#[derive(Debug, Clone, Serialize)]
pub struct SurfaceGrid {
    pub x_axis: Vec<f64>,
    pub y_axis: Vec<f64>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl SurfaceGrid {
    fn empty(y_axis: Vec<f64>, x_axis: Vec<f64>) -> Self {
        let cells = vec![vec![None; x_axis.len()]; y_axis.len()];
        SurfaceGrid {
            x_axis,
            y_axis,
            cells,
        }
    }

    fn set(&mut self, y: f64, x: f64, value: Option<f64>) -> Result<()> {
        let row = axis_position(&self.y_axis, y)
            .ok_or(SensitivityError::CellOutsideAxes { y, x })?;
        let col = axis_position(&self.x_axis, x)
            .ok_or(SensitivityError::CellOutsideAxes { y, x })?;
        self.cells[row][col] = value;
        Ok(())
    }

    pub fn cell(&self, y_idx: usize, x_idx: usize) -> Option<f64> {
        self.cells.get(y_idx).and_then(|row| row.get(x_idx)).copied().flatten()
    }

    /// Grid for the renderer contract: empty cells become NaN
    pub fn to_z(&self) -> Vec<Vec<f64>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.unwrap_or(f64::NAN)).collect())
            .collect()
    }

    /// Defined cell values in row-major order
    pub fn defined_cells(&self) -> Vec<f64> {
        self.cells
            .iter()
            .flat_map(|row| row.iter().copied().flatten())
            .collect()
    }
}

fn axis_position(axis: &[f64], value: f64) -> Option<usize> {
    axis.binary_search_by(|probe| probe.total_cmp(&value)).ok()
}

/// Accuracy over a fixed-parameter slice of the sweep
#[derive(Debug, Clone, Serialize)]
pub struct AccuracySurface {
    pub fixed: ParamColumn,
    pub fixed_value: f64,
    pub y: ParamColumn,
    pub x: ParamColumn,
    pub grid: SurfaceGrid,
}

/// Mean build/predict times (ms) over two parameter dimensions
#[derive(Debug, Clone, Serialize)]
pub struct TimingSurfaces {
    pub y: ParamColumn,
    pub x: ParamColumn,
    pub time2build_ms: SurfaceGrid,
    pub time2predict_ms: SurfaceGrid,
}

/// Fix `fixed == fixed_value`, sum-reduce the surviving rows by
/// `(y, fixed, x)`, derive per-cell accuracy, and scatter into a grid whose
/// axes are the distinct sorted `x`/`y` values of the *unfiltered* table.
pub fn accuracy_surface(
    table: &ResultTable,
    fixed: ParamColumn,
    fixed_value: f64,
    y: ParamColumn,
    x: ParamColumn,
) -> Result<AccuracySurface> {
    let sliced = table.filter(&RowFilter::ParamEq(fixed, fixed_value));
    let grouped = group_reduce(
        &sliced,
        &[
            KeyColumn::from_param(y),
            KeyColumn::from_param(fixed),
            KeyColumn::from_param(x),
        ],
        Reduction::Sum,
    )?;

    let mut grid = SurfaceGrid::empty(table.param_values(y), table.param_values(x));
    for (key, row) in grouped.iter() {
        // parameter keys are always numeric
        let (Some(yv), Some(xv)) = (key.num(0), key.num(2)) else {
            continue;
        };
        grid.set(yv, xv, accuracy::accuracy(row))?;
    }

    Ok(AccuracySurface {
        fixed,
        fixed_value,
        y,
        x,
        grid,
    })
}

/// Mean-reduce the table by `(y, x)` over all remaining dimensions and
/// scatter build/predict times, scaled to milliseconds, into grids.
pub fn timing_surfaces(
    table: &ResultTable,
    y: ParamColumn,
    x: ParamColumn,
) -> Result<TimingSurfaces> {
    let grouped = group_reduce(
        table,
        &[KeyColumn::from_param(y), KeyColumn::from_param(x)],
        Reduction::Mean,
    )?;

    let y_axis = table.param_values(y);
    let x_axis = table.param_values(x);
    let mut build = SurfaceGrid::empty(y_axis.clone(), x_axis.clone());
    let mut predict = SurfaceGrid::empty(y_axis, x_axis);

    for (key, row) in grouped.iter() {
        let (Some(yv), Some(xv)) = (key.num(0), key.num(1)) else {
            continue;
        };
        build.set(yv, xv, Some(row.time2build * MS_PER_SECOND))?;
        predict.set(yv, xv, Some(row.time2predict * MS_PER_SECOND))?;
    }

    Ok(TimingSurfaces {
        y,
        x,
        time2build_ms: build,
        time2predict_ms: predict,
    })
}
