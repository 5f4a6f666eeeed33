//! In-memory `(time, rows, cols)` fields.

use crate::{FociError, FociResult};
use serde::{Deserialize, Serialize};

/// A physical field such as sea-surface temperature or ice thickness,
/// stored as a dense `(time, rows, cols)` array of `f32`.
///
/// Missing values are represented as NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCube {
    /// Variable name in the source file (e.g. `sosstsst`)
    pub name: String,
    /// `units` attribute, if present
    pub units: Option<String>,
    /// `long_name` attribute, if present
    pub long_name: Option<String>,
    nt: usize,
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl FieldCube {
    pub fn new(
        name: impl Into<String>,
        nt: usize,
        rows: usize,
        cols: usize,
        data: Vec<f32>,
    ) -> FociResult<Self> {
        if data.len() != nt * rows * cols {
            return Err(FociError::ShapeMismatch(format!(
                "field has {} values, expected {}x{}x{}={}",
                data.len(),
                nt,
                rows,
                cols,
                nt * rows * cols
            )));
        }
        Ok(Self {
            name: name.into(),
            units: None,
            long_name: None,
            nt,
            rows,
            cols,
            data,
        })
    }

    pub fn with_units(mut self, units: Option<String>) -> Self {
        self.units = units;
        self
    }

    pub fn with_long_name(mut self, long_name: Option<String>) -> Self {
        self.long_name = long_name;
        self
    }

    /// `(time, rows, cols)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nt, self.rows, self.cols)
    }

    pub fn time_len(&self) -> usize {
        self.nt
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The 2-D slice at time index `t`, row-major.
    pub fn slice(&self, t: usize) -> FociResult<&[f32]> {
        if t >= self.nt {
            return Err(FociError::TimeOutOfRange {
                index: t,
                len: self.nt,
            });
        }
        let n = self.rows * self.cols;
        Ok(&self.data[t * n..(t + 1) * n])
    }

    /// Replace every value equal to `missing` with NaN.
    ///
    /// Returns the number of cells masked.
    pub fn mask_value(&mut self, missing: f32) -> usize {
        let mut masked = 0;
        for v in self.data.iter_mut() {
            if *v == missing {
                *v = f32::NAN;
                masked += 1;
            }
        }
        masked
    }

    /// Minimum and maximum over time indices `[start, end)`, skipping NaN.
    pub fn value_range(&self, start: usize, end: usize) -> Option<(f32, f32)> {
        let end = end.min(self.nt);
        if start >= end {
            return None;
        }
        let n = self.rows * self.cols;
        finite_range(&self.data[start * n..end * n])
    }

    /// Mean over the time axis, skipping NaN. Cells with no valid value stay NaN.
    pub fn time_mean(&self) -> Vec<f32> {
        let n = self.rows * self.cols;
        let mut sums = vec![0.0f64; n];
        let mut counts = vec![0u32; n];
        for step in self.data.chunks_exact(n.max(1)) {
            for (i, &v) in step.iter().enumerate() {
                if !v.is_nan() {
                    sums[i] += v as f64;
                    counts[i] += 1;
                }
            }
        }
        sums.iter()
            .zip(&counts)
            .map(|(&s, &c)| if c == 0 { f32::NAN } else { (s / c as f64) as f32 })
            .collect()
    }

    /// Concatenate cubes along the time axis.
    ///
    /// All parts must share the same name and spatial shape.
    pub fn concat_time(parts: Vec<FieldCube>) -> FociResult<FieldCube> {
        let mut iter = parts.into_iter();
        let mut first = iter
            .next()
            .ok_or_else(|| FociError::ShapeMismatch("no fields to concatenate".to_string()))?;
        for part in iter {
            if part.rows != first.rows || part.cols != first.cols {
                return Err(FociError::ShapeMismatch(format!(
                    "cannot concatenate {}x{} field onto {}x{} field",
                    part.rows, part.cols, first.rows, first.cols
                )));
            }
            first.nt += part.nt;
            first.data.extend_from_slice(&part.data);
        }
        Ok(first)
    }
}

/// Minimum and maximum of the finite values in a slice.
pub fn finite_range(values: &[f32]) -> Option<(f32, f32)> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    (min <= max).then_some((min, max))
}
