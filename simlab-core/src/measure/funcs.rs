//! Built-in measures — pure functions from one signal to a few numbers.

use std::f64::consts::TAU;

use super::{Measure, MeasureError};

/// Mean of the signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalMean;

impl Measure for SignalMean {
    fn name(&self) -> &str {
        "signal_mean"
    }

    fn compute(&self, sig: &[f64]) -> Result<Vec<f64>, MeasureError> {
        if sig.is_empty() {
            return Err(MeasureError::SignalTooShort { need: 1, got: 0 });
        }
        Ok(vec![mean(sig)])
    }
}

/// Sample variance of the signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalVariance;

impl Measure for SignalVariance {
    fn name(&self) -> &str {
        "signal_variance"
    }

    fn compute(&self, sig: &[f64]) -> Result<Vec<f64>, MeasureError> {
        if sig.len() < 2 {
            return Err(MeasureError::SignalTooShort { need: 2, got: sig.len() });
        }
        Ok(vec![sample_variance(sig)])
    }
}

/// Lag (in samples) at which the autocorrelation first drops below 1/e.
///
/// Returns `max_lag` when the autocorrelation stays above the threshold for
/// every lag checked — a saturated timescale, not a failure.
#[derive(Debug, Clone, Copy)]
pub struct AutocorrDecay {
    pub max_lag: usize,
}

impl Measure for AutocorrDecay {
    fn name(&self) -> &str {
        "autocorr_decay"
    }

    fn compute(&self, sig: &[f64]) -> Result<Vec<f64>, MeasureError> {
        if sig.len() <= self.max_lag {
            return Err(MeasureError::SignalTooShort {
                need: self.max_lag + 1,
                got: sig.len(),
            });
        }
        let mu = mean(sig);
        let denom: f64 = sig.iter().map(|x| (x - mu).powi(2)).sum();
        if denom <= 0.0 {
            return Err(MeasureError::Failed("constant signal".into()));
        }
        let threshold = 1.0 / std::f64::consts::E;
        for lag in 1..=self.max_lag {
            let num: f64 = sig[..sig.len() - lag]
                .iter()
                .zip(&sig[lag..])
                .map(|(a, b)| (a - mu) * (b - mu))
                .sum();
            if num / denom < threshold {
                return Ok(vec![lag as f64]);
            }
        }
        Ok(vec![self.max_lag as f64])
    }
}

/// Hjorth parameters: activity, mobility, complexity.
///
/// Activity is the signal variance; mobility the ratio of the derivative's
/// standard deviation to the signal's; complexity the mobility of the
/// derivative relative to the mobility of the signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct HjorthParams;

impl Measure for HjorthParams {
    fn name(&self) -> &str {
        "hjorth_params"
    }

    fn output_width(&self) -> usize {
        3
    }

    fn compute(&self, sig: &[f64]) -> Result<Vec<f64>, MeasureError> {
        if sig.len() < 3 {
            return Err(MeasureError::SignalTooShort { need: 3, got: sig.len() });
        }
        let d1: Vec<f64> = sig.windows(2).map(|w| w[1] - w[0]).collect();
        let d2: Vec<f64> = d1.windows(2).map(|w| w[1] - w[0]).collect();

        let var0 = sample_variance(sig);
        let var1 = sample_variance(&d1);
        let var2 = sample_variance(&d2);
        if var0 <= 0.0 || var1 <= 0.0 {
            return Err(MeasureError::Failed("constant signal".into()));
        }

        let activity = var0;
        let mobility = (var1 / var0).sqrt();
        let complexity = (var2 / var1).sqrt() / mobility;
        Ok(vec![activity, mobility, complexity])
    }
}

/// Log-log periodogram slope over a frequency band.
///
/// Computes a direct DFT periodogram on the raw signal and regresses
/// log10(power) on log10(frequency) across bins inside `[f_min, f_max]`.
/// For power-law noise the slope recovers the generating exponent.
#[derive(Debug, Clone, Copy)]
pub struct SpectralSlope {
    /// Sampling rate the signal was recorded at, in Hz.
    pub fs: f64,
    pub f_min: f64,
    pub f_max: f64,
}

impl Measure for SpectralSlope {
    fn name(&self) -> &str {
        "spectral_slope"
    }

    fn compute(&self, sig: &[f64]) -> Result<Vec<f64>, MeasureError> {
        let n = sig.len();
        if n < 4 {
            return Err(MeasureError::SignalTooShort { need: 4, got: n });
        }

        let mut log_f = Vec::new();
        let mut log_p = Vec::new();
        for k in 1..=n / 2 {
            let freq = k as f64 * self.fs / n as f64;
            if freq < self.f_min || freq > self.f_max {
                continue;
            }
            let (mut re, mut im) = (0.0, 0.0);
            for (t, x) in sig.iter().enumerate() {
                let angle = TAU * k as f64 * t as f64 / n as f64;
                re += x * angle.cos();
                im -= x * angle.sin();
            }
            let power = (re * re + im * im) / n as f64;
            if power > 0.0 {
                log_f.push(freq.log10());
                log_p.push(power.log10());
            }
        }
        if log_f.len() < 2 {
            return Err(MeasureError::Failed(
                "fewer than 2 frequency bins in range".into(),
            ));
        }

        Ok(vec![regression_slope(&log_f, &log_p)])
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_variance(values: &[f64]) -> f64 {
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Least-squares slope of y on x.
fn regression_slope(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x);
    let my = mean(y);
    let num: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let den: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
    num / den
}
