//! Stochastic parameter sampling.
//!
//! [`ValueSampler`] draws values independently (with replacement) from a
//! finite candidate set, uniformly or under an explicit discrete
//! distribution. [`ParamSampler`] binds one or more (slot, sampler) pairs to
//! a base model and yields a fresh updated model per combined draw.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use thiserror::Error;

use super::update::ParamSlot;
use super::{ParamError, ParamValue, SimParams};

/// Errors from sampler construction.
///
/// All of these are configuration errors, raised eagerly at construction —
/// never lazily at the first draw.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("candidate value set is empty")]
    NoValues,
    #[error("got {probs} probabilities for {values} candidate values")]
    ProbabilityMismatch { values: usize, probs: usize },
    #[error("probabilities must be non-negative with a positive sum")]
    InvalidProbabilities,
    #[error(transparent)]
    Param(#[from] ParamError),
}

/// Lazy sequence of values drawn from a finite candidate set.
///
/// Candidates that are themselves lists (e.g. component-variance pairs)
/// yield the whole sub-list per draw. `n_draws: None` gives an infinite
/// sequence; `Some(k)` stops after exactly `k` draws.
#[derive(Debug, Clone)]
pub struct ValueSampler {
    values: Vec<ParamValue>,
    weights: Option<WeightedIndex<f64>>,
    n_draws: Option<usize>,
    drawn: usize,
    rng: StdRng,
}

impl ValueSampler {
    pub fn new(
        values: Vec<ParamValue>,
        probs: Option<Vec<f64>>,
        n_draws: Option<usize>,
        seed: u64,
    ) -> Result<Self, SamplerError> {
        if values.is_empty() {
            return Err(SamplerError::NoValues);
        }
        let weights = match probs {
            Some(probs) => {
                if probs.len() != values.len() {
                    return Err(SamplerError::ProbabilityMismatch {
                        values: values.len(),
                        probs: probs.len(),
                    });
                }
                Some(WeightedIndex::new(&probs).map_err(|_| SamplerError::InvalidProbabilities)?)
            }
            None => None,
        };
        Ok(Self {
            values,
            weights,
            n_draws,
            drawn: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Uniform sampler over the candidate set.
    pub fn uniform(
        values: Vec<ParamValue>,
        n_draws: Option<usize>,
        seed: u64,
    ) -> Result<Self, SamplerError> {
        Self::new(values, None, n_draws, seed)
    }

    /// Draws remaining, or `None` when unbounded.
    pub fn remaining(&self) -> Option<usize> {
        self.n_draws.map(|n| n.saturating_sub(self.drawn))
    }

    /// Whether this sampler ever stops on its own.
    pub fn is_bounded(&self) -> bool {
        self.n_draws.is_some()
    }
}

impl Iterator for ValueSampler {
    type Item = ParamValue;

    fn next(&mut self) -> Option<ParamValue> {
        if let Some(n) = self.n_draws {
            if self.drawn >= n {
                return None;
            }
        }
        self.drawn += 1;
        let index = match &self.weights {
            Some(dist) => dist.sample(&mut self.rng),
            None => self.rng.gen_range(0..self.values.len()),
        };
        Some(self.values[index].clone())
    }
}

/// Samples one or more parameter slots per draw, yielding updated models.
///
/// Each inner sampler advances independently exactly once per combined
/// update step. The sequence is bounded by the tightest inner bound, and
/// unbounded only when every inner sampler is.
#[derive(Debug, Clone)]
pub struct ParamSampler {
    base: SimParams,
    samplers: Vec<(ParamSlot, ValueSampler)>,
}

impl ParamSampler {
    pub fn new(
        base: &SimParams,
        samplers: Vec<(ParamSlot, ValueSampler)>,
    ) -> Result<Self, SamplerError> {
        // Validate every slot against the base model up front
        let mut scratch = base.clone();
        for (slot, _) in &samplers {
            slot.clear(&mut scratch)?;
        }
        Ok(Self {
            base: base.clone(),
            samplers,
        })
    }

    /// Combined draws remaining, or `None` when unbounded.
    pub fn bound(&self) -> Option<usize> {
        self.samplers
            .iter()
            .filter_map(|(_, sampler)| sampler.remaining())
            .min()
    }

    pub fn is_bounded(&self) -> bool {
        self.bound().is_some()
    }

    /// The base model draws are applied on top of.
    pub fn base(&self) -> &SimParams {
        &self.base
    }
}

impl Iterator for ParamSampler {
    type Item = SimParams;

    fn next(&mut self) -> Option<SimParams> {
        let mut model = self.base.clone();
        for (slot, sampler) in &mut self.samplers {
            let value = sampler.next()?;
            // Slots were validated against the base at construction.
            slot.apply(&mut model, &value).ok()?;
        }
        Some(model)
    }
}
