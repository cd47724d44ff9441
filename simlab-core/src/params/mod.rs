//! Simulation parameter models.
//!
//! A [`SimParams`] is the keyword-argument structure handed to a signal
//! generator: the base timing parameters (`n_seconds`, `fs`), generator-
//! specific fields, and — for composed signals — named component sub-models
//! with optional relative variance weights.

pub mod iter;
pub mod registry;
pub mod sampler;
pub mod update;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parameter model construction and slot updates.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("n_seconds must be positive, got {0}")]
    InvalidDuration(f64),
    #[error("fs must be positive, got {0}")]
    InvalidSamplingRate(f64),
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
    #[error("component_variances expects a list value")]
    VariancesNotAList,
    #[error("{components} components but {variances} component variances")]
    VarianceCountMismatch { components: usize, variances: usize },
    #[error("no parameter definition registered under '{0}'")]
    UnknownDefinition(String),
    #[error("no iterator definition registered under '{0}'")]
    UnknownIterator(String),
}

/// One parameter slot value: a scalar, a list, or a bounded range.
///
/// Lists carry multi-element parameters such as `component_variances`
/// weights; ranges carry frequency-band style bounds where either side may
/// be open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Values(Vec<f64>),
    Range { low: Option<f64>, high: Option<f64> },
}

impl ParamValue {
    /// Scalar payload, if this value is one.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ParamValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// List payload, if this value is one.
    pub fn as_values(&self) -> Option<&[f64]> {
        match self {
            ParamValue::Values(v) => Some(v),
            _ => None,
        }
    }

    /// The scalar a sweep axis is labelled with: the value itself, or the
    /// final element of a list-valued parameter.
    pub fn label_scalar(&self) -> Option<f64> {
        match self {
            ParamValue::Scalar(v) => Some(*v),
            ParamValue::Values(v) => v.last().copied(),
            ParamValue::Range { .. } => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::Values(v)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(v) => write!(f, "{v}"),
            ParamValue::Values(v) => {
                let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            ParamValue::Range { low, high } => {
                let fmt_bound = |b: &Option<f64>| match b {
                    Some(v) => v.to_string(),
                    None => "..".to_string(),
                };
                write!(f, "({}, {})", fmt_bound(low), fmt_bound(high))
            }
        }
    }
}

/// Parameters of one named component inside a composed signal.
pub type ComponentParams = BTreeMap<String, ParamValue>;

/// Parameter model for one signal generator call.
///
/// `fields` holds generator-specific parameters for single-generator models;
/// composed models instead populate `components` (one sub-model per additive
/// term) and optionally `component_variances` (relative variance weights,
/// one per component, applied when components are summed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Simulated duration, in seconds.
    pub n_seconds: f64,
    /// Sampling rate, in Hz.
    pub fs: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, ComponentParams>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_variances: Vec<f64>,
}

impl SimParams {
    /// New model with the given base timing parameters.
    ///
    /// Both must be strictly positive and explicitly supplied — there is no
    /// late binding of `fs` from ambient settings.
    pub fn new(n_seconds: f64, fs: f64) -> Result<Self, ParamError> {
        if !(n_seconds > 0.0) {
            return Err(ParamError::InvalidDuration(n_seconds));
        }
        if !(fs > 0.0) {
            return Err(ParamError::InvalidSamplingRate(fs));
        }
        Ok(Self {
            n_seconds,
            fs,
            fields: BTreeMap::new(),
            components: BTreeMap::new(),
            component_variances: Vec::new(),
        })
    }

    /// Builder: set one top-level field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder: add one named component sub-model.
    pub fn with_component(mut self, name: impl Into<String>, params: ComponentParams) -> Self {
        self.components.insert(name.into(), params);
        self
    }

    /// Builder: set relative variance weights, one per component.
    pub fn with_component_variances(mut self, variances: Vec<f64>) -> Self {
        self.component_variances = variances;
        self
    }

    /// Number of samples a generator driven by this model must produce.
    pub fn n_samples(&self) -> usize {
        (self.n_seconds * self.fs).round() as usize
    }

    /// Scalar value of a top-level field.
    pub fn scalar(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(ParamValue::as_scalar)
    }

    /// Check structural invariants: positive base parameters, and variance
    /// weights (when present) matching the component count.
    pub fn validate(&self) -> Result<(), ParamError> {
        if !(self.n_seconds > 0.0) {
            return Err(ParamError::InvalidDuration(self.n_seconds));
        }
        if !(self.fs > 0.0) {
            return Err(ParamError::InvalidSamplingRate(self.fs));
        }
        if !self.component_variances.is_empty()
            && self.component_variances.len() != self.components.len()
        {
            return Err(ParamError::VarianceCountMismatch {
                components: self.components.len(),
                variances: self.component_variances.len(),
            });
        }
        Ok(())
    }

    /// Flatten to scalar columns for per-trial parameter collection.
    ///
    /// Top-level fields keep their key, component fields become
    /// `"{component}.{key}"`, variance weights become `"var_{i}"`.
    /// Non-scalar values are skipped.
    pub fn flatten(&self) -> BTreeMap<String, f64> {
        let mut flat = BTreeMap::new();
        flat.insert("n_seconds".to_string(), self.n_seconds);
        flat.insert("fs".to_string(), self.fs);
        for (key, value) in &self.fields {
            if let Some(v) = value.as_scalar() {
                flat.insert(key.clone(), v);
            }
        }
        for (component, params) in &self.components {
            for (key, value) in params {
                if let Some(v) = value.as_scalar() {
                    flat.insert(format!("{component}.{key}"), v);
                }
            }
        }
        for (i, v) in self.component_variances.iter().enumerate() {
            flat.insert(format!("var_{i}"), *v);
        }
        flat
    }
}
