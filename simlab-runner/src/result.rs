//! Sweep result tensors and repetition-axis reductions.

use serde::{Deserialize, Serialize};

use simlab_core::BatchLabel;

use crate::config::Reduction;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

pub(crate) fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Measure results over a full sweep grid.
///
/// Shape `[n_values, n_reps]` for scalar measures and logically
/// `[n_values, n_reps, width]` otherwise; stored flat in row-major order.
/// Failed cells hold NaN sentinels — never a fabricated zero — and the
/// failure count travels with the tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTensor {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Sweep name this tensor came from.
    pub sweep: String,
    /// One label per swept value, in sweep order.
    pub labels: Vec<BatchLabel>,
    pub n_values: usize,
    pub n_reps: usize,
    /// Measure output width (1 for scalar measures).
    pub width: usize,
    /// Flat cell data; NaN sentinels travel as JSON nulls.
    #[serde(with = "nan_as_null")]
    data: Vec<f64>,
    /// Number of (value, repetition) cells whose measure call failed.
    pub failures: usize,
}

impl ResultTensor {
    pub(crate) fn new(
        sweep: String,
        labels: Vec<BatchLabel>,
        n_reps: usize,
        width: usize,
        data: Vec<f64>,
        failures: usize,
    ) -> Self {
        let n_values = labels.len();
        debug_assert_eq!(data.len(), n_values * n_reps * width);
        Self {
            schema_version: SCHEMA_VERSION,
            sweep,
            labels,
            n_values,
            n_reps,
            width,
            data,
            failures,
        }
    }

    /// Whether the measure was scalar-valued.
    pub fn is_scalar(&self) -> bool {
        self.width == 1
    }

    /// One cell's measure output.
    pub fn cell(&self, value_index: usize, rep_index: usize) -> &[f64] {
        let start = (value_index * self.n_reps + rep_index) * self.width;
        &self.data[start..start + self.width]
    }

    /// One cell's scalar output (width-1 tensors).
    pub fn scalar(&self, value_index: usize, rep_index: usize) -> f64 {
        self.cell(value_index, rep_index)[0]
    }

    /// Collapse the repetition axis, one output row per swept value.
    ///
    /// NaN sentinels are excluded from the aggregate; a cell column with no
    /// finite repetitions reduces to NaN.
    pub fn reduce(&self, reduction: Reduction) -> Vec<Vec<f64>> {
        self.collapse(|column| match reduction {
            Reduction::Mean => nan_mean(column),
            Reduction::Median => nan_median(column),
        })
    }

    /// NaN-aware sample standard deviation across the repetition axis.
    pub fn spread(&self) -> Vec<Vec<f64>> {
        self.collapse(nan_std)
    }

    fn collapse(&self, aggregate: impl Fn(&[f64]) -> f64) -> Vec<Vec<f64>> {
        let mut out = Vec::with_capacity(self.n_values);
        let mut column = Vec::with_capacity(self.n_reps);
        for value_index in 0..self.n_values {
            let mut row = Vec::with_capacity(self.width);
            for w in 0..self.width {
                column.clear();
                for rep_index in 0..self.n_reps {
                    column.push(self.cell(value_index, rep_index)[w]);
                }
                row.push(aggregate(&column));
            }
            out.push(row);
        }
        out
    }
}

/// JSON has no NaN; encode sentinel cells as nulls on the wire.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let wire: Vec<Option<f64>> = data
            .iter()
            .map(|v| if v.is_finite() { Some(*v) } else { None })
            .collect();
        wire.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let wire: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(wire.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

fn nan_mean(values: &[f64]) -> f64 {
    let kept = finite(values);
    if kept.is_empty() {
        return f64::NAN;
    }
    kept.iter().sum::<f64>() / kept.len() as f64
}

fn nan_median(values: &[f64]) -> f64 {
    let mut kept = finite(values);
    if kept.is_empty() {
        return f64::NAN;
    }
    kept.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = kept.len() / 2;
    if kept.len() % 2 == 1 {
        kept[mid]
    } else {
        (kept[mid - 1] + kept[mid]) / 2.0
    }
}

fn nan_std(values: &[f64]) -> f64 {
    let kept = finite(values);
    if kept.len() < 2 {
        return f64::NAN;
    }
    let mean = kept.iter().sum::<f64>() / kept.len() as f64;
    let variance =
        kept.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (kept.len() - 1) as f64;
    variance.sqrt()
}
