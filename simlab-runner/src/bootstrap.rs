//! Bootstrap correlation and correlation-difference statistics.
//!
//! Supplies the statistics contract the aggregation layer consumes:
//! - `bootstrap_corr(x, y)` — Pearson r with a percentile bootstrap CI and
//!   an analytic two-sided p-value from the Student t distribution
//! - `bootstrap_diff(feature, a, b)` — bootstrap distribution of the
//!   difference between two correlations against a shared feature
//!
//! The t CDF is built from first principles (Lanczos ln-gamma plus the
//! regularized incomplete beta via Lentz's continued fraction) rather than
//! pulling in a stats crate. Resampling is seeded and paired: one index
//! vector per resample, applied to both inputs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for bootstrap resampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Number of bootstrap resamples (default 1000).
    pub n_resamples: usize,
    /// Central confidence mass for the CI (default 0.95).
    pub ci: f64,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_resamples: 1000,
            ci: 0.95,
            seed: 42,
        }
    }
}

/// One correlation estimate: point value, CI bounds, p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrStats {
    pub r: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub p: f64,
}

/// One correlation-difference estimate against a shared feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffStats {
    /// Correlation of the feature with the first measure.
    pub r_first: f64,
    /// Correlation of the feature with the second measure.
    pub r_second: f64,
    /// Point estimate of `r_first - r_second`.
    pub diff: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub p: f64,
}

/// Errors from correlation statistics.
#[derive(Debug, Error)]
pub enum CorrError {
    #[error("correlation inputs have mismatched lengths: {x} vs {y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("need at least 3 finite paired observations, got {0}")]
    TooFewObservations(usize),
    #[error("selection mask length {mask} does not match vector length {vector} for '{name}'")]
    MaskMismatch {
        name: String,
        mask: usize,
        vector: usize,
    },
}

/// Pearson correlation coefficient.
pub fn pearson_r(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut dx = 0.0;
    let mut dy = 0.0;
    for (a, b) in x.iter().zip(y) {
        num += (a - mx) * (b - my);
        dx += (a - mx).powi(2);
        dy += (b - my).powi(2);
    }
    let den = (dx * dy).sqrt();
    if den < 1e-300 {
        return 0.0;
    }
    num / den
}

/// Bootstrap Pearson correlation: point estimate, percentile CI, analytic
/// two-sided p.
///
/// Pairs with a non-finite member on either side (NaN sentinels from failed
/// measure cells) are dropped before anything is computed.
pub fn bootstrap_corr(x: &[f64], y: &[f64], config: &BootstrapConfig) -> Result<CorrStats, CorrError> {
    if x.len() != y.len() {
        return Err(CorrError::LengthMismatch { x: x.len(), y: y.len() });
    }
    let (x, y) = drop_nonfinite_pairs(x, y);
    let n = x.len();
    if n < 3 {
        return Err(CorrError::TooFewObservations(n));
    }

    let r = pearson_r(&x, &y);
    let p = corr_p_value(r, n);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut resampled = Vec::with_capacity(config.n_resamples);
    let mut rx = vec![0.0; n];
    let mut ry = vec![0.0; n];
    for _ in 0..config.n_resamples {
        for i in 0..n {
            let j = rng.gen_range(0..n);
            rx[i] = x[j];
            ry[i] = y[j];
        }
        let r_star = pearson_r(&rx, &ry);
        if r_star.is_finite() {
            resampled.push(r_star);
        }
    }
    let (ci_low, ci_high) = percentile_ci(&mut resampled, config.ci, r);

    Ok(CorrStats { r, ci_low, ci_high, p })
}

/// Bootstrap difference between two correlations to a shared feature.
///
/// Resamples all three vectors with one index draw per resample, building
/// the distribution of `corr(feature, a) - corr(feature, b)`. The p-value is
/// the two-sided fraction of the bootstrap distribution crossing zero.
pub fn bootstrap_diff(
    feature: &[f64],
    a: &[f64],
    b: &[f64],
    config: &BootstrapConfig,
) -> Result<DiffStats, CorrError> {
    if feature.len() != a.len() {
        return Err(CorrError::LengthMismatch { x: feature.len(), y: a.len() });
    }
    if feature.len() != b.len() {
        return Err(CorrError::LengthMismatch { x: feature.len(), y: b.len() });
    }
    let kept: Vec<usize> = (0..feature.len())
        .filter(|&i| feature[i].is_finite() && a[i].is_finite() && b[i].is_finite())
        .collect();
    let n = kept.len();
    if n < 3 {
        return Err(CorrError::TooFewObservations(n));
    }
    let f: Vec<f64> = kept.iter().map(|&i| feature[i]).collect();
    let a: Vec<f64> = kept.iter().map(|&i| a[i]).collect();
    let b: Vec<f64> = kept.iter().map(|&i| b[i]).collect();

    let r_first = pearson_r(&f, &a);
    let r_second = pearson_r(&f, &b);
    let diff = r_first - r_second;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut resampled = Vec::with_capacity(config.n_resamples);
    let (mut rf, mut ra, mut rb) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
    for _ in 0..config.n_resamples {
        for i in 0..n {
            let j = rng.gen_range(0..n);
            rf[i] = f[j];
            ra[i] = a[j];
            rb[i] = b[j];
        }
        let d = pearson_r(&rf, &ra) - pearson_r(&rf, &rb);
        if d.is_finite() {
            resampled.push(d);
        }
    }

    let (ci_low, ci_high) = percentile_ci(&mut resampled, config.ci, diff);
    let p = if resampled.is_empty() {
        1.0
    } else {
        // Ties at exactly zero count half to each side
        let below = resampled.iter().filter(|&&d| d < 0.0).count() as f64;
        let at_zero = resampled.iter().filter(|&&d| d == 0.0).count() as f64;
        let frac = (below + 0.5 * at_zero) / resampled.len() as f64;
        (2.0 * frac.min(1.0 - frac)).clamp(0.0, 1.0)
    };

    Ok(DiffStats {
        r_first,
        r_second,
        diff,
        ci_low,
        ci_high,
        p,
    })
}

fn drop_nonfinite_pairs(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip()
}

/// CI bounds from a bootstrap distribution; degenerate distributions
/// collapse onto the point estimate.
fn percentile_ci(resampled: &mut [f64], ci: f64, point: f64) -> (f64, f64) {
    if resampled.is_empty() {
        return (point, point);
    }
    resampled.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let tail = (1.0 - ci) / 2.0 * 100.0;
    (
        percentile_sorted(resampled, tail),
        percentile_sorted(resampled, 100.0 - tail),
    )
}

/// Percentile of a sorted slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Two-sided p-value for a Pearson r under the null of zero correlation.
///
/// Uses the exact transform t = r sqrt((n-2)/(1-r^2)) with n-2 degrees of
/// freedom.
fn corr_p_value(r: f64, n: usize) -> f64 {
    let df = (n - 2) as f64;
    let r2 = r * r;
    if r2 >= 1.0 {
        return 0.0;
    }
    let t = r.abs() * (df / (1.0 - r2)).sqrt();
    (2.0 * (1.0 - student_t_cdf(t, df))).clamp(0.0, 1.0)
}

// ─── Math primitives ─────────────────────────────────────────────────

/// Lanczos approximation for ln(Gamma(x)), g=7, n=9.
fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        // Reflection formula: Gamma(x) * Gamma(1-x) = pi / sin(pi*x)
        let log_pi = std::f64::consts::PI.ln();
        let sin_val = (std::f64::consts::PI * x).sin();
        if sin_val.abs() < 1e-300 {
            return f64::INFINITY;
        }
        return log_pi - sin_val.abs().ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    let t = x + G + 0.5;
    let log_sqrt_2pi = (2.0 * std::f64::consts::PI).sqrt().ln();
    log_sqrt_2pi + (t.ln() * (x + 0.5)) - t + sum.ln()
}

/// Regularized incomplete beta function I_x(a, b) via Lentz's continued
/// fraction.
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if !(0.0..=1.0).contains(&x) {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.0;
    }
    if x == 1.0 {
        return 1.0;
    }
    // Symmetry relation for better convergence
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(b, a, 1.0 - x);
    }

    let ln_prefix =
        a * x.ln() + b * (1.0 - x).ln() - ln_gamma(a) - ln_gamma(b) + ln_gamma(a + b) - a.ln();
    let prefix = ln_prefix.exp();

    let max_iter = 200;
    let epsilon = 1e-14;
    let tiny = 1e-30;

    let mut c = 1.0_f64;
    let mut d = 1.0 - (a + b) * x / (a + 1.0);
    if d.abs() < tiny {
        d = tiny;
    }
    d = 1.0 / d;
    let mut f = d;

    for m in 1..=max_iter {
        let m_f64 = m as f64;

        let numerator_even =
            m_f64 * (b - m_f64) * x / ((a + 2.0 * m_f64 - 1.0) * (a + 2.0 * m_f64));
        d = 1.0 + numerator_even * d;
        if d.abs() < tiny {
            d = tiny;
        }
        c = 1.0 + numerator_even / c;
        if c.abs() < tiny {
            c = tiny;
        }
        d = 1.0 / d;
        f *= c * d;

        let numerator_odd = -((a + m_f64) * (a + b + m_f64) * x)
            / ((a + 2.0 * m_f64) * (a + 2.0 * m_f64 + 1.0));
        d = 1.0 + numerator_odd * d;
        if d.abs() < tiny {
            d = tiny;
        }
        c = 1.0 + numerator_odd / c;
        if c.abs() < tiny {
            c = tiny;
        }
        d = 1.0 / d;
        let delta = c * d;
        f *= delta;

        if (delta - 1.0).abs() < epsilon {
            break;
        }
    }

    prefix * f
}

/// CDF of the Student t distribution with `df` degrees of freedom.
fn student_t_cdf(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return if t > 0.0 { 1.0 } else { 0.0 };
    }
    let x = df / (df + t * t);
    let tail = 0.5 * regularized_incomplete_beta(df / 2.0, 0.5, x);
    if t > 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_on_perfect_lines() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let up = vec![2.0, 4.0, 6.0, 8.0];
        let down = vec![8.0, 6.0, 4.0, 2.0];
        assert!((pearson_r(&x, &up) - 1.0).abs() < 1e-12);
        assert!((pearson_r(&x, &down) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_constant_input_is_zero() {
        assert_eq!(pearson_r(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn bootstrap_corr_on_correlated_data() {
        let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + ((v * 0.7).sin() * 5.0)).collect();
        let stats = bootstrap_corr(&x, &y, &BootstrapConfig::default()).unwrap();
        assert!(stats.r > 0.99);
        assert!(stats.ci_low <= stats.r && stats.r <= stats.ci_high);
        assert!(stats.p < 1e-6);
    }

    #[test]
    fn bootstrap_corr_on_independent_data_has_high_p() {
        // Deterministic pseudo-independent pair
        let x: Vec<f64> = (0..60).map(|i| ((i * 37 % 61) as f64).sin()).collect();
        let y: Vec<f64> = (0..60).map(|i| ((i * 23 % 59) as f64).cos()).collect();
        let stats = bootstrap_corr(&x, &y, &BootstrapConfig::default()).unwrap();
        assert!(stats.r.abs() < 0.4);
        assert!(stats.p > 0.001);
    }

    #[test]
    fn bootstrap_corr_is_deterministic_for_a_seed() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| v + (v * 0.3).sin() * 10.0).collect();
        let config = BootstrapConfig::default();
        let a = bootstrap_corr(&x, &y, &config).unwrap();
        let b = bootstrap_corr(&x, &y, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn nan_pairs_are_dropped_not_propagated() {
        let x = vec![1.0, 2.0, f64::NAN, 3.0, 4.0];
        let y = vec![1.0, 2.0, 100.0, 3.0, 4.0];
        let stats = bootstrap_corr(&x, &y, &BootstrapConfig::default()).unwrap();
        assert!((stats.r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn too_few_observations_is_an_error() {
        let err = bootstrap_corr(&[1.0, 2.0], &[1.0, 2.0], &BootstrapConfig::default())
            .unwrap_err();
        assert!(matches!(err, CorrError::TooFewObservations(2)));
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err =
            bootstrap_corr(&[1.0, 2.0, 3.0], &[1.0, 2.0], &BootstrapConfig::default()).unwrap_err();
        assert!(matches!(err, CorrError::LengthMismatch { x: 3, y: 2 }));
    }

    #[test]
    fn diff_detects_stronger_correlation() {
        let feature: Vec<f64> = (0..80).map(|i| i as f64).collect();
        // a tracks the feature tightly, b is diluted with structure
        let a: Vec<f64> = feature.iter().map(|v| v + (v * 0.9).sin()).collect();
        let b: Vec<f64> = feature.iter().map(|v| v + 40.0 * (v * 0.35).sin()).collect();
        let stats = bootstrap_diff(&feature, &a, &b, &BootstrapConfig::default()).unwrap();
        assert!(stats.r_first > stats.r_second);
        assert!(stats.diff > 0.0);
        assert!(stats.ci_low <= stats.diff && stats.diff <= stats.ci_high);
    }

    #[test]
    fn diff_of_identical_vectors_is_zero() {
        let feature: Vec<f64> = (0..50).map(|i| (i as f64 * 0.3).sin()).collect();
        let a: Vec<f64> = feature.iter().map(|v| v * 2.0).collect();
        let stats = bootstrap_diff(&feature, &a, &a, &BootstrapConfig::default()).unwrap();
        assert_eq!(stats.diff, 0.0);
        assert!(stats.p > 0.5);
    }

    // ─── Math primitives ─────────────────────────────────────────

    #[test]
    fn ln_gamma_matches_known_values() {
        // Gamma(5) = 24
        assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
        // Gamma(0.5) = sqrt(pi)
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn t_cdf_symmetry_and_center() {
        assert!((student_t_cdf(0.0, 10.0) - 0.5).abs() < 1e-10);
        let upper = student_t_cdf(1.5, 10.0);
        let lower = student_t_cdf(-1.5, 10.0);
        assert!((upper + lower - 1.0).abs() < 1e-10);
    }

    #[test]
    fn t_cdf_matches_tabulated_value() {
        // t = 2.228, df = 10 is the 97.5th percentile
        assert!((student_t_cdf(2.228, 10.0) - 0.975).abs() < 1e-3);
    }
}
