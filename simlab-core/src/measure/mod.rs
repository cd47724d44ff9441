//! Time-series measures.
//!
//! A [`Measure`] maps one signal to a scalar or a small fixed-size vector.
//! The output arity is declared up front via [`Measure::output_width`] —
//! it is a construction-time contract, not something inferred from the
//! first result.

pub mod funcs;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::funcs::{AutocorrDecay, HjorthParams, SignalMean, SignalVariance, SpectralSlope};

/// Errors from applying a measure to one signal.
#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("signal too short: {got} samples, need at least {need}")]
    SignalTooShort { need: usize, got: usize },
    #[error("{0}")]
    Failed(String),
}

/// A measurement function over one time series.
///
/// `compute` must return exactly `output_width()` values on success; the
/// same measure must keep that width consistent across all calls within one
/// sweep.
pub trait Measure: Send + Sync {
    fn name(&self) -> &str;

    /// Declared output arity (1 for scalar measures).
    fn output_width(&self) -> usize {
        1
    }

    fn compute(&self, sig: &[f64]) -> Result<Vec<f64>, MeasureError>;
}

/// Serializable measure selection (factory input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasureConfig {
    /// Mean of the signal.
    SignalMean,
    /// Sample variance of the signal.
    SignalVariance,
    /// Lag (in samples) at which autocorrelation first drops below 1/e.
    AutocorrDecay { max_lag: usize },
    /// Hjorth activity, mobility, and complexity (3-vector).
    HjorthParams,
    /// Log-log periodogram slope over a frequency band.
    SpectralSlope { fs: f64, f_min: f64, f_max: f64 },
}

impl MeasureConfig {
    /// Build the configured measure.
    pub fn build(&self) -> Box<dyn Measure> {
        match self {
            MeasureConfig::SignalMean => Box::new(SignalMean),
            MeasureConfig::SignalVariance => Box::new(SignalVariance),
            MeasureConfig::AutocorrDecay { max_lag } => {
                Box::new(AutocorrDecay { max_lag: *max_lag })
            }
            MeasureConfig::HjorthParams => Box::new(HjorthParams),
            MeasureConfig::SpectralSlope { fs, f_min, f_max } => Box::new(SpectralSlope {
                fs: *fs,
                f_min: *f_min,
                f_max: *f_max,
            }),
        }
    }
}
