//! SimLab Core — parameter models, iteration, sampling, signal generation,
//! and time-series measures.
//!
//! This crate contains the building blocks of the sweep engine:
//! - Nested parameter models with component sub-models and variance weights
//! - Slot updaters as inspectable data (no closures)
//! - Deterministic, restartable parameter iteration
//! - Stochastic (optionally weighted, optionally unbounded) sampling
//! - Injectable registries of named parameter/iterator definitions
//! - Hash-derived RNG hierarchy for scheduling-independent reproducibility
//! - Signal generator and measure traits with simple built-ins

pub mod measure;
pub mod params;
pub mod rng;
pub mod sim;

pub use measure::{Measure, MeasureConfig, MeasureError};
pub use params::iter::ParamIter;
pub use params::registry::{IterDef, ParamDef, ParamRegistry};
pub use params::sampler::{ParamSampler, SamplerError, ValueSampler};
pub use params::update::ParamSlot;
pub use params::{ComponentParams, ParamError, ParamValue, SimParams};
pub use rng::SeedHierarchy;
pub use sim::pipeline::{
    simulate_across_models, simulate_across_values, simulate_multiple, BatchLabel, SigIter,
    SignalBatch,
};
pub use sim::{generator_for_name, GenerateError, GeneratorConfig, SignalGenerator};
