//! Built-in signal generators.
//!
//! Deliberately simple physics: enough structure for sweeps and measure
//! comparisons to have something real to chew on, without pulling in a
//! spectral toolbox. All generators standardize their output, and composed
//! signals weight each component by its relative variance.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::TAU;

use crate::params::{ParamValue, SimParams};

use super::{generator_for_name, GenerateError, SignalGenerator};

/// Gaussian white noise, zero mean and unit variance in expectation.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhiteNoise;

impl SignalGenerator for WhiteNoise {
    fn name(&self) -> &str {
        "white_noise"
    }

    fn generate(&self, params: &SimParams, rng: &mut StdRng) -> Result<Vec<f64>, GenerateError> {
        params.validate()?;
        Ok((0..params.n_samples())
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect())
    }
}

/// Power-law (1/f-like) noise via random-phase spectral synthesis.
///
/// Reads the `exponent` field (power ∝ f^exponent) and an optional
/// `f_range` band limit. Synthesis is a direct sum over the frequency grid,
/// O(n·k) in samples × retained frequencies — fine at research signal
/// lengths, not meant for streaming use.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerlawNoise;

impl SignalGenerator for PowerlawNoise {
    fn name(&self) -> &str {
        "powerlaw_noise"
    }

    fn generate(&self, params: &SimParams, rng: &mut StdRng) -> Result<Vec<f64>, GenerateError> {
        params.validate()?;
        let exponent = params
            .scalar("exponent")
            .ok_or_else(|| GenerateError::MissingParameter("exponent".into()))?;
        let (f_low, f_high) = frequency_band(params)?;

        let n = params.n_samples();
        let df = params.fs / n as f64;
        let nyquist = params.fs / 2.0;

        let mut sig = vec![0.0; n];
        let max_k = (nyquist / df).floor() as usize;
        for k in 1..=max_k {
            let freq = k as f64 * df;
            if freq < f_low || freq > f_high {
                continue;
            }
            // Amplitude in f^(exponent/2) so power falls off as f^exponent
            let amplitude = freq.powf(exponent / 2.0);
            let phase: f64 = rng.gen_range(0.0..TAU);
            let omega = TAU * k as f64 / n as f64;
            for (t, sample) in sig.iter_mut().enumerate() {
                *sample += amplitude * (omega * t as f64 + phase).cos();
            }
        }

        standardize(&mut sig);
        Ok(sig)
    }
}

/// Unit-variance sinusoid with a random starting phase.
///
/// Reads the `freq` field, in Hz.
#[derive(Debug, Clone, Copy, Default)]
pub struct Oscillation;

impl SignalGenerator for Oscillation {
    fn name(&self) -> &str {
        "oscillation"
    }

    fn generate(&self, params: &SimParams, rng: &mut StdRng) -> Result<Vec<f64>, GenerateError> {
        params.validate()?;
        let freq = params
            .scalar("freq")
            .ok_or_else(|| GenerateError::MissingParameter("freq".into()))?;
        let n = params.n_samples();
        let phase: f64 = rng.gen_range(0.0..TAU);
        // sqrt(2) amplitude gives unit variance over whole cycles
        let amplitude = 2.0_f64.sqrt();
        Ok((0..n)
            .map(|t| amplitude * (TAU * freq * t as f64 / params.fs + phase).sin())
            .collect())
    }
}

/// Weighted sum of named component generators.
///
/// Each entry of `params.components` names a built-in generator and carries
/// its sub-parameters; the base `(n_seconds, fs)` is shared. Components are
/// standardized, then scaled by the square root of their relative variance
/// weight. Weights align with components in name order; an empty weight
/// list means equal unit weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct Combined;

impl SignalGenerator for Combined {
    fn name(&self) -> &str {
        "combined"
    }

    fn generate(&self, params: &SimParams, rng: &mut StdRng) -> Result<Vec<f64>, GenerateError> {
        params.validate()?;
        if params.components.is_empty() {
            return Err(GenerateError::MissingParameter("components".into()));
        }

        let n = params.n_samples();
        let mut sig = vec![0.0; n];
        for (i, (name, component_params)) in params.components.iter().enumerate() {
            let generator = generator_for_name(name)?;
            let mut sub = SimParams::new(params.n_seconds, params.fs)?;
            sub.fields = component_params.clone();

            let mut component = generator.generate(&sub, rng)?;
            if component.len() != n {
                return Err(GenerateError::LengthMismatch {
                    generator: name.clone(),
                    expected: n,
                    got: component.len(),
                });
            }
            standardize(&mut component);

            let variance = params.component_variances.get(i).copied().unwrap_or(1.0);
            let weight = variance.max(0.0).sqrt();
            for (sample, value) in sig.iter_mut().zip(&component) {
                *sample += weight * value;
            }
        }
        Ok(sig)
    }
}

/// Read the optional `f_range` band limit as (low, high) in Hz.
fn frequency_band(params: &SimParams) -> Result<(f64, f64), GenerateError> {
    match params.fields.get("f_range") {
        None => Ok((0.0, f64::INFINITY)),
        Some(ParamValue::Range { low, high }) => Ok((
            low.unwrap_or(0.0),
            high.unwrap_or(f64::INFINITY),
        )),
        Some(_) => Err(GenerateError::WrongValueKind("f_range".into())),
    }
}

/// Center to zero mean and scale to unit variance in place.
///
/// Near-constant input is only centered.
fn standardize(sig: &mut [f64]) {
    let n = sig.len();
    if n == 0 {
        return;
    }
    let mean = sig.iter().sum::<f64>() / n as f64;
    for sample in sig.iter_mut() {
        *sample -= mean;
    }
    let variance = sig.iter().map(|s| s * s).sum::<f64>() / n as f64;
    let std = variance.sqrt();
    if std > 1e-12 {
        for sample in sig.iter_mut() {
            *sample /= std;
        }
    }
}
