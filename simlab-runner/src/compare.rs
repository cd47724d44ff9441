//! Comparison runner — multiple measures against the same realized signals.
//!
//! Unlike the sweep runner, every measure is evaluated on the *same* signal
//! per trial: one signal is generated, then each measure applied to it.
//! That guarantees sample-aligned result vectors suitable for correlation
//! analysis.

use std::collections::BTreeMap;

use serde::Serialize;

use simlab_core::{Measure, ParamSampler, SeedHierarchy, SignalGenerator, SimParams};

use crate::config::ConfigError;
use crate::sweep::SweepError;

/// Where a comparison run's parameter models come from.
pub enum ParamSource {
    /// Every trial reuses one fixed model.
    Fixed(SimParams),
    /// Every trial redraws from a sampler.
    Sampled(ParamSampler),
}

impl ParamSource {
    fn bound(&self) -> Option<usize> {
        match self {
            ParamSource::Fixed(_) => None,
            ParamSource::Sampled(sampler) => sampler.bound(),
        }
    }

    fn draw(&mut self) -> Option<SimParams> {
        match self {
            ParamSource::Fixed(params) => Some(params.clone()),
            ParamSource::Sampled(sampler) => sampler.next(),
        }
    }
}

/// Sample-aligned measure results from one comparison run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonResults {
    /// Measure name → one value per trial (NaN for failed calls).
    pub results: BTreeMap<String, Vec<f64>>,
    /// Measure name → failed-call count.
    pub failures: BTreeMap<String, usize>,
    /// Flattened realized parameters per trial, when collection was
    /// requested.
    pub trial_params: Option<Vec<BTreeMap<String, f64>>>,
}

/// Run every measure against the same realized signal, one signal per trial.
///
/// Measures must be scalar-valued with distinct names (checked eagerly), and
/// a bounded source must cover `n_trials` (also eager). Failed measure calls
/// leave a NaN in that measure's vector for the trial and count toward its
/// failure tally; the other measures still see the signal.
pub fn run_comparisons(
    generator: &dyn SignalGenerator,
    mut source: ParamSource,
    measures: &[Box<dyn Measure>],
    n_trials: usize,
    seed: u64,
    collect_params: bool,
    run_name: &str,
) -> Result<ComparisonResults, SweepError> {
    let mut seen = std::collections::BTreeSet::new();
    for measure in measures {
        if !seen.insert(measure.name().to_string()) {
            return Err(ConfigError::DuplicateMeasure(measure.name().to_string()).into());
        }
        if measure.output_width() != 1 {
            return Err(ConfigError::VectorMeasure {
                measure: measure.name().to_string(),
                width: measure.output_width(),
            }
            .into());
        }
    }
    if let Some(bound) = source.bound() {
        if bound < n_trials {
            return Err(SweepError::SourceExhausted {
                sweep: run_name.to_string(),
                requested: n_trials,
                available: bound,
            });
        }
    }

    let seeds = SeedHierarchy::new(seed);
    let mut out = ComparisonResults {
        results: measures
            .iter()
            .map(|m| (m.name().to_string(), Vec::with_capacity(n_trials)))
            .collect(),
        failures: measures.iter().map(|m| (m.name().to_string(), 0)).collect(),
        trial_params: collect_params.then(|| Vec::with_capacity(n_trials)),
    };

    for trial in 0..n_trials {
        // bound() was checked; a sampler cannot run dry mid-run
        let model = match source.draw() {
            Some(model) => model,
            None => {
                return Err(SweepError::SourceExhausted {
                    sweep: run_name.to_string(),
                    requested: n_trials,
                    available: trial,
                })
            }
        };
        let mut rng = seeds.rng_for("trial", trial as u64);
        let sig = generator.generate(&model, &mut rng)?;

        if let Some(trial_params) = &mut out.trial_params {
            trial_params.push(model.flatten());
        }
        for measure in measures {
            let name = measure.name();
            let value = match measure.compute(&sig) {
                Ok(values) => values[0],
                Err(_) => {
                    if let Some(count) = out.failures.get_mut(name) {
                        *count += 1;
                    }
                    f64::NAN
                }
            };
            if let Some(vector) = out.results.get_mut(name) {
                vector.push(value);
            }
        }
    }
    Ok(out)
}
