//! Signal pipeline: lazy yielders and eager batches.
//!
//! Bridges parameter models to realized signals: [`SigIter`] lazily yields
//! one signal per draw, [`simulate_multiple`] materializes a fixed-size
//! batch, and [`simulate_across_values`] runs a batch per parameter model
//! from an iterator or sampler.

use std::fmt;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::params::iter::ParamIter;
use crate::params::SimParams;
use crate::rng::SeedHierarchy;

use super::{GenerateError, SignalGenerator};

/// Lazily yields signals from one generator and one parameter model.
///
/// The model is reused by reference across draws; fresh realizations come
/// from the iterator's own RNG stream. `n_sims: None` yields indefinitely.
pub struct SigIter<'a> {
    generator: &'a dyn SignalGenerator,
    params: &'a SimParams,
    n_sims: Option<usize>,
    produced: usize,
    rng: StdRng,
}

impl<'a> SigIter<'a> {
    pub fn new(
        generator: &'a dyn SignalGenerator,
        params: &'a SimParams,
        n_sims: Option<usize>,
        seed: u64,
    ) -> Self {
        Self {
            generator,
            params,
            n_sims,
            produced: 0,
            rng: SeedHierarchy::new(seed).rng_for("sig_iter", 0),
        }
    }
}

impl Iterator for SigIter<'_> {
    type Item = Result<Vec<f64>, GenerateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(n) = self.n_sims {
            if self.produced >= n {
                return None;
            }
        }
        self.produced += 1;
        Some(self.generator.generate(self.params, &mut self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.n_sims {
            Some(n) => {
                let remaining = n.saturating_sub(self.produced);
                (remaining, Some(remaining))
            }
            None => (usize::MAX, None),
        }
    }
}

/// An eagerly materialized batch of same-length signals, row-major
/// `[n_signals, n_samples]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBatch {
    pub n_signals: usize,
    pub n_samples: usize,
    data: Vec<f64>,
}

impl SignalBatch {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let n_signals = rows.len();
        let n_samples = rows.first().map_or(0, Vec::len);
        let data = rows.into_iter().flatten().collect();
        Self {
            n_signals,
            n_samples,
            data,
        }
    }

    /// One signal by row index.
    pub fn signal(&self, index: usize) -> &[f64] {
        let start = index * self.n_samples;
        &self.data[start..start + self.n_samples]
    }

    pub fn signals(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.n_samples)
    }

    /// First `n` rows as a new batch (used to cap loaded batches).
    pub fn truncated(&self, n: usize) -> SignalBatch {
        let n = n.min(self.n_signals);
        SignalBatch {
            n_signals: n,
            n_samples: self.n_samples,
            data: self.data[..n * self.n_samples].to_vec(),
        }
    }
}

/// Label for one batch in a cross-value simulation set.
///
/// Deterministic sweeps label batches by the swept value; sampled sweeps,
/// which have no single named value, fall back to the ordinal index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BatchLabel {
    Value(f64),
    Index(usize),
}

impl fmt::Display for BatchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchLabel::Value(v) => write!(f, "{v}"),
            BatchLabel::Index(i) => write!(f, "#{i}"),
        }
    }
}

/// Simulate `n_sims` signals from one parameter model.
///
/// Fails if the generator returns a length inconsistent with
/// `params.n_samples()`.
pub fn simulate_multiple(
    generator: &dyn SignalGenerator,
    params: &SimParams,
    n_sims: usize,
    seed: u64,
) -> Result<SignalBatch, GenerateError> {
    let expected = params.n_samples();
    let mut rows = Vec::with_capacity(n_sims);
    for sig in SigIter::new(generator, params, Some(n_sims), seed) {
        let sig = sig?;
        if sig.len() != expected {
            return Err(GenerateError::LengthMismatch {
                generator: generator.name().to_string(),
                expected,
                got: sig.len(),
            });
        }
        rows.push(sig);
    }
    Ok(SignalBatch::from_rows(rows))
}

/// Simulate a batch per parameter model from a deterministic iterator,
/// labelling each batch with its swept value.
pub fn simulate_across_values(
    generator: &dyn SignalGenerator,
    iter: &ParamIter,
    n_sims: usize,
    seed: u64,
) -> Result<Vec<(BatchLabel, SignalBatch)>, GenerateError> {
    let seeds = SeedHierarchy::new(seed);
    let mut batches = Vec::with_capacity(iter.len());
    for (index, params) in iter.models().enumerate() {
        let label = iter.values()[index]
            .label_scalar()
            .map(BatchLabel::Value)
            .unwrap_or(BatchLabel::Index(index));
        let batch = simulate_multiple(
            generator,
            &params,
            n_sims,
            seeds.sub_seed("across_values", index as u64),
        )?;
        batches.push((label, batch));
    }
    Ok(batches)
}

/// Simulate a batch per already-realized parameter model, labelling batches
/// by ordinal index (the sampler case, where no named value exists).
pub fn simulate_across_models(
    generator: &dyn SignalGenerator,
    models: impl IntoIterator<Item = SimParams>,
    n_sims: usize,
    seed: u64,
) -> Result<Vec<(BatchLabel, SignalBatch)>, GenerateError> {
    let seeds = SeedHierarchy::new(seed);
    let mut batches = Vec::new();
    for (index, params) in models.into_iter().enumerate() {
        let batch = simulate_multiple(
            generator,
            &params,
            n_sims,
            seeds.sub_seed("across_models", index as u64),
        )?;
        batches.push((BatchLabel::Index(index), batch));
    }
    Ok(batches)
}
