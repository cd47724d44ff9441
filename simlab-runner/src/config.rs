//! Serializable sweep and comparison configuration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use simlab_core::{
    GeneratorConfig, MeasureConfig, ParamError, ParamSlot, ParamValue, SimParams,
};

/// Unique identifier for a sweep or comparison run (content-addressable
/// hash).
pub type RunId = String;

/// Errors from configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown reduction '{0}' (expected 'mean' or 'median')")]
    UnknownReduction(String),
    #[error("'{0}' has no parameter values")]
    NoValues(String),
    #[error("'{0}' has zero repetitions")]
    NoRepetitions(String),
    #[error("'{0}' has zero trials")]
    NoTrials(String),
    #[error("'{0}' defines no measures")]
    NoMeasures(String),
    #[error("measure '{0}' appears more than once")]
    DuplicateMeasure(String),
    #[error("measure '{measure}' returns {width} values; comparisons need scalar measures")]
    VectorMeasure { measure: String, width: usize },
    #[error(transparent)]
    Param(#[from] ParamError),
}

/// Configuration for one parametric sweep.
///
/// Defines the full (value × repetition) grid: which generator to drive,
/// the base parameter model, the slot to vary with its ordered values, the
/// measure to apply, and execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Sweep name, used in error messages and artifact keys.
    pub name: String,
    pub generator: GeneratorConfig,
    pub base_params: SimParams,
    /// The slot that varies.
    pub slot: ParamSlot,
    /// Ordered values to step the slot across.
    pub values: Vec<ParamValue>,
    /// Repetitions per value.
    pub n_reps: usize,
    /// Worker count: -1 (or 0) resolves to all available cores.
    #[serde(default = "default_n_jobs")]
    pub n_jobs: i32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub measure: MeasureConfig,
}

fn default_n_jobs() -> i32 {
    -1
}

fn default_seed() -> u64 {
    42
}

impl SweepConfig {
    /// Deterministic content hash of this configuration.
    ///
    /// Two sweeps with identical configs share a RunId and can share stored
    /// artifacts.
    pub fn run_id(&self) -> RunId {
        hash_config(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.values.is_empty() {
            return Err(ConfigError::NoValues(self.name.clone()));
        }
        if self.n_reps == 0 {
            return Err(ConfigError::NoRepetitions(self.name.clone()));
        }
        self.base_params.validate()?;
        Ok(())
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(doc: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(doc)
    }
}

/// One sampled axis of a comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerDef {
    pub slot: ParamSlot,
    pub values: Vec<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probs: Option<Vec<f64>>,
}

/// Configuration for one comparison run: several measures evaluated against
/// the same realized signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    pub name: String,
    pub generator: GeneratorConfig,
    pub base_params: SimParams,
    /// Axes resampled per trial; empty means a fixed parameter model.
    #[serde(default)]
    pub samplers: Vec<SamplerDef>,
    pub measures: Vec<MeasureConfig>,
    pub n_trials: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Collect the flattened realized parameters per trial.
    #[serde(default)]
    pub collect_params: bool,
}

impl CompareConfig {
    pub fn run_id(&self) -> RunId {
        hash_config(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_trials == 0 {
            return Err(ConfigError::NoTrials(self.name.clone()));
        }
        if self.measures.is_empty() {
            return Err(ConfigError::NoMeasures(self.name.clone()));
        }
        self.base_params.validate()?;
        let mut seen = std::collections::BTreeSet::new();
        for config in &self.measures {
            let measure = config.build();
            if !seen.insert(measure.name().to_string()) {
                return Err(ConfigError::DuplicateMeasure(measure.name().to_string()));
            }
            if measure.output_width() != 1 {
                return Err(ConfigError::VectorMeasure {
                    measure: measure.name().to_string(),
                    width: measure.output_width(),
                });
            }
        }
        Ok(())
    }

    pub fn from_toml_str(doc: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(doc)
    }
}

fn hash_config<T: Serialize>(config: &T) -> RunId {
    // Configs are plain data; serialization cannot fail
    let json = serde_json::to_string(config).unwrap_or_default();
    blake3::hash(json.as_bytes()).to_hex().to_string()
}

/// How to collapse the repetition axis of a result tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reduction {
    Mean,
    Median,
}

impl FromStr for Reduction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s {
            "mean" => Ok(Reduction::Mean),
            "median" => Ok(Reduction::Median),
            other => Err(ConfigError::UnknownReduction(other.to_string())),
        }
    }
}
