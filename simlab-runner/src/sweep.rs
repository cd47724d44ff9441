//! Sweep runner — serial and parallel execution over a (value × repetition)
//! grid.
//!
//! Both modes share one contract: for every parameter model produced by the
//! sweep axis, generate `n_reps` signals and apply the measure, accumulating
//! a [`ResultTensor`]. The parallel mode drains the parameter source up
//! front, replicates each model `n_reps` times into one flat job list, and
//! dispatches it to a per-call rayon pool with an order-preserving collect —
//! result order is load-bearing for the reshape step.
//!
//! Per-cell RNG streams are derived by hashing (seed, job index), so serial
//! and parallel runs over the same grid are bit-identical.

use rayon::prelude::*;
use thiserror::Error;

use simlab_core::{
    BatchLabel, GenerateError, Measure, ParamIter, ParamSampler, SeedHierarchy, SignalBatch,
    SignalGenerator, SimParams,
};

use crate::config::ConfigError;
use crate::result::ResultTensor;

/// Errors from sweep execution.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The measure returned variably-shaped output across cells; always
    /// fatal for the whole sweep.
    #[error(
        "sweep '{sweep}': collected {total} result values, which does not divide evenly \
         across {n_values} values x {n_reps} repetitions"
    )]
    ShapeMismatch {
        sweep: String,
        total: usize,
        n_values: usize,
        n_reps: usize,
    },
    #[error("sweep '{0}': parameter source is unbounded; drain a finite number of draws first")]
    UnboundedSource(String),
    #[error("sweep '{sweep}': requested {requested} draws but the source provides {available}")]
    SourceExhausted {
        sweep: String,
        requested: usize,
        available: usize,
    },
    #[error("sweep '{sweep}': stored batch has {available} signals, need {requested}")]
    NotEnoughSignals {
        sweep: String,
        requested: usize,
        available: usize,
    },
    #[error("worker pool: {0}")]
    Pool(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// One (label, model) row per materialized sweep-axis entry.
pub type LabelledModels = Vec<(BatchLabel, SimParams)>;

fn labelled_models(iter: &ParamIter) -> LabelledModels {
    iter.models()
        .enumerate()
        .map(|(index, model)| {
            let label = iter.values()[index]
                .label_scalar()
                .map(BatchLabel::Value)
                .unwrap_or(BatchLabel::Index(index));
            (label, model)
        })
        .collect()
}

/// Drain `n_draws` models from a sampler, labelling them ordinally.
///
/// Fails eagerly when the sampler is bounded below the request.
pub fn drain_sampler(
    sampler: ParamSampler,
    n_draws: usize,
    sweep: &str,
) -> Result<LabelledModels, SweepError> {
    if let Some(bound) = sampler.bound() {
        if bound < n_draws {
            return Err(SweepError::SourceExhausted {
                sweep: sweep.to_string(),
                requested: n_draws,
                available: bound,
            });
        }
    }
    Ok(sampler
        .take(n_draws)
        .enumerate()
        .map(|(index, model)| (BatchLabel::Index(index), model))
        .collect())
}

/// Drain a bounded sampler to its full extent.
///
/// Parallel execution materializes its whole job list up front, so an
/// unbounded sampler cannot be swept without an explicit draw count — use
/// [`drain_sampler`] for that.
pub fn drain_bounded_sampler(
    sampler: ParamSampler,
    sweep: &str,
) -> Result<LabelledModels, SweepError> {
    match sampler.bound() {
        Some(bound) => drain_sampler(sampler, bound, sweep),
        None => Err(SweepError::UnboundedSource(sweep.to_string())),
    }
}

/// Run one (model, repetition) cell: generate, then measure.
///
/// A failing measure yields a NaN sentinel row of the declared width — a
/// missing value, distinct from a legitimate zero — and flags the failure.
/// Generator errors are fatal and propagate.
fn run_cell(
    generator: &dyn SignalGenerator,
    measure: &dyn Measure,
    model: &SimParams,
    seeds: &SeedHierarchy,
    job_index: usize,
) -> Result<(Vec<f64>, bool), GenerateError> {
    let mut rng = seeds.rng_for("cell", job_index as u64);
    let sig = generator.generate(model, &mut rng)?;
    match measure.compute(&sig) {
        Ok(values) => Ok((values, false)),
        Err(_) => Ok((vec![f64::NAN; measure.output_width()], true)),
    }
}

/// Reshape the flat per-job results into a tensor.
///
/// The sole shape-validation mechanism: the total element count must divide
/// evenly by `n_values * n_reps`. A remainder means the measure returned
/// variably-shaped output and aborts the whole sweep.
fn reshape(
    sweep: &str,
    labels: Vec<BatchLabel>,
    n_reps: usize,
    raw: Vec<Vec<f64>>,
    failures: usize,
) -> Result<ResultTensor, SweepError> {
    let n_values = labels.len();
    let total: usize = raw.iter().map(Vec::len).sum();
    let cells = n_values * n_reps;
    if cells == 0 || total % cells != 0 || total == 0 {
        return Err(SweepError::ShapeMismatch {
            sweep: sweep.to_string(),
            total,
            n_values,
            n_reps,
        });
    }
    let width = total / cells;
    // Even division can still hide a ragged layout; every job must have
    // produced exactly one width-sized row.
    if raw.iter().any(|row| row.len() != width) {
        return Err(SweepError::ShapeMismatch {
            sweep: sweep.to_string(),
            total,
            n_values,
            n_reps,
        });
    }
    let data: Vec<f64> = raw.into_iter().flatten().collect();
    Ok(ResultTensor::new(
        sweep.to_string(),
        labels,
        n_reps,
        width,
        data,
        failures,
    ))
}

/// Run a sweep serially: deterministic order over both axes.
pub fn run_sweep(
    generator: &dyn SignalGenerator,
    iter: &ParamIter,
    measure: &dyn Measure,
    n_reps: usize,
    seed: u64,
    sweep: &str,
) -> Result<ResultTensor, SweepError> {
    run_sweep_over(generator, labelled_models(iter), measure, n_reps, seed, sweep)
}

/// Run a sweep serially over explicit labelled models (the sampler case).
pub fn run_sweep_over(
    generator: &dyn SignalGenerator,
    models: LabelledModels,
    measure: &dyn Measure,
    n_reps: usize,
    seed: u64,
    sweep: &str,
) -> Result<ResultTensor, SweepError> {
    let seeds = SeedHierarchy::new(seed);
    let mut raw = Vec::with_capacity(models.len() * n_reps);
    let mut failures = 0;
    for (value_index, (_, model)) in models.iter().enumerate() {
        for rep in 0..n_reps {
            let job_index = value_index * n_reps + rep;
            let (values, failed) = run_cell(generator, measure, model, &seeds, job_index)?;
            if failed {
                failures += 1;
            }
            raw.push(values);
        }
    }
    let labels = models.into_iter().map(|(label, _)| label).collect();
    reshape(sweep, labels, n_reps, raw, failures)
}

/// Run a sweep in parallel on a fixed-size worker pool.
///
/// `n_jobs <= 0` resolves to all available cores at call time; a positive
/// value pins the pool size. The pool is scoped to this call — created,
/// used, and torn down here, never shared across sweeps.
pub fn run_sweep_parallel(
    generator: &dyn SignalGenerator,
    iter: &ParamIter,
    measure: &dyn Measure,
    n_reps: usize,
    n_jobs: i32,
    seed: u64,
    sweep: &str,
) -> Result<ResultTensor, SweepError> {
    run_sweep_parallel_with_progress(generator, iter, measure, n_reps, n_jobs, seed, sweep, |_, _| {})
}

/// Parallel sweep with a progress callback.
///
/// The callback is invoked after each job completes with (completed so far,
/// total). Completion order is scheduling-dependent; result order is not.
#[allow(clippy::too_many_arguments)]
pub fn run_sweep_parallel_with_progress(
    generator: &dyn SignalGenerator,
    iter: &ParamIter,
    measure: &dyn Measure,
    n_reps: usize,
    n_jobs: i32,
    seed: u64,
    sweep: &str,
    progress: impl Fn(usize, usize) + Send + Sync,
) -> Result<ResultTensor, SweepError> {
    run_sweep_models_parallel(
        generator,
        labelled_models(iter),
        measure,
        n_reps,
        n_jobs,
        seed,
        sweep,
        progress,
    )
}

/// Parallel sweep over explicit labelled models.
#[allow(clippy::too_many_arguments)]
pub fn run_sweep_models_parallel(
    generator: &dyn SignalGenerator,
    models: LabelledModels,
    measure: &dyn Measure,
    n_reps: usize,
    n_jobs: i32,
    seed: u64,
    sweep: &str,
    progress: impl Fn(usize, usize) + Send + Sync,
) -> Result<ResultTensor, SweepError> {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let seeds = SeedHierarchy::new(seed);
    let total_jobs = models.len() * n_reps;

    // One flat job list: each model replicated n_reps times, in order
    let jobs: Vec<(usize, &SimParams)> = models
        .iter()
        .enumerate()
        .flat_map(|(value_index, (_, model))| {
            (0..n_reps).map(move |rep| (value_index * n_reps + rep, model))
        })
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(resolve_n_jobs(n_jobs))
        .build()
        .map_err(|e| SweepError::Pool(e.to_string()))?;

    let done = AtomicUsize::new(0);
    // par_iter + collect preserves submission order, which the reshape
    // below depends on
    let collected: Result<Vec<(Vec<f64>, bool)>, GenerateError> = pool.install(|| {
        jobs.par_iter()
            .map(|(job_index, model)| {
                let cell = run_cell(generator, measure, model, &seeds, *job_index)?;
                let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
                progress(completed, total_jobs);
                Ok(cell)
            })
            .collect()
    });

    let collected = collected?;
    let failures = collected.iter().filter(|(_, failed)| *failed).count();
    let raw = collected.into_iter().map(|(values, _)| values).collect();
    let labels = models.into_iter().map(|(label, _)| label).collect();
    reshape(sweep, labels, n_reps, raw, failures)
}

/// Apply a measure to previously generated (or loaded) signal batches.
///
/// This is the measurement-application stage decoupled from generation:
/// batches fresh from [`simlab_core::simulate_across_values`] and batches
/// reloaded from the store are interchangeable. `n_reps: None` uses every
/// signal of the first batch; `Some(n)` caps each batch at its first `n`
/// rows.
pub fn run_sweep_from_signals(
    batches: &[(BatchLabel, SignalBatch)],
    measure: &dyn Measure,
    n_reps: Option<usize>,
    sweep: &str,
) -> Result<ResultTensor, SweepError> {
    let n_reps = match n_reps {
        Some(n) => n,
        None => batches.first().map_or(0, |(_, batch)| batch.n_signals),
    };
    let mut raw = Vec::with_capacity(batches.len() * n_reps);
    let mut failures = 0;
    for (_, batch) in batches {
        if batch.n_signals < n_reps {
            return Err(SweepError::NotEnoughSignals {
                sweep: sweep.to_string(),
                requested: n_reps,
                available: batch.n_signals,
            });
        }
        for sig in batch.signals().take(n_reps) {
            match measure.compute(sig) {
                Ok(values) => raw.push(values),
                Err(_) => {
                    failures += 1;
                    raw.push(vec![f64::NAN; measure.output_width()]);
                }
            }
        }
    }
    let labels = batches.iter().map(|(label, _)| *label).collect();
    reshape(sweep, labels, n_reps, raw, failures)
}

/// `-1` (or any non-positive count) means all available processing units.
fn resolve_n_jobs(n_jobs: i32) -> usize {
    if n_jobs <= 0 {
        // rayon resolves zero to the number of available cores
        0
    } else {
        n_jobs as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use simlab_core::{MeasureError, ParamSlot, ParamValue, SimParams};

    /// Writes the `level` field into every sample.
    struct LevelSignal;

    impl SignalGenerator for LevelSignal {
        fn name(&self) -> &str {
            "level_signal"
        }

        fn generate(
            &self,
            params: &SimParams,
            _rng: &mut StdRng,
        ) -> Result<Vec<f64>, GenerateError> {
            let level = params
                .scalar("level")
                .ok_or_else(|| GenerateError::MissingParameter("level".into()))?;
            Ok(vec![level; params.n_samples()])
        }
    }

    /// Absolute value of the first sample.
    struct AbsFirstSample;

    impl Measure for AbsFirstSample {
        fn name(&self) -> &str {
            "abs_first_sample"
        }

        fn compute(&self, sig: &[f64]) -> Result<Vec<f64>, MeasureError> {
            Ok(vec![sig[0].abs()])
        }
    }

    fn level_iter(values: &[f64]) -> ParamIter {
        let base = SimParams::new(0.1, 100.0).unwrap().with_field("level", 0.0);
        ParamIter::new(
            &base,
            ParamSlot::field("level"),
            values.iter().copied().map(ParamValue::from).collect(),
        )
        .unwrap()
    }

    #[test]
    fn mean_reduction_recovers_absolute_levels() {
        let iter = level_iter(&[-3.0, -2.0, -1.0, 0.0]);
        let tensor =
            run_sweep(&LevelSignal, &iter, &AbsFirstSample, 10, 42, "abs_levels").unwrap();

        assert_eq!(tensor.n_values, 4);
        assert_eq!(tensor.n_reps, 10);
        assert!(tensor.is_scalar());
        assert_eq!(tensor.failures, 0);

        let means: Vec<f64> = tensor
            .reduce(crate::config::Reduction::Mean)
            .into_iter()
            .map(|row| row[0])
            .collect();
        assert_eq!(means, vec![3.0, 2.0, 1.0, 0.0]);

        // Deterministic measure: zero spread
        for row in tensor.spread() {
            assert_eq!(row[0], 0.0);
        }
    }

    #[test]
    fn labels_carry_swept_values() {
        let iter = level_iter(&[-3.0, -2.0]);
        let tensor = run_sweep(&LevelSignal, &iter, &AbsFirstSample, 2, 0, "labels").unwrap();
        assert_eq!(
            tensor.labels,
            vec![BatchLabel::Value(-3.0), BatchLabel::Value(-2.0)]
        );
    }

    #[test]
    fn unknown_generator_parameter_is_fatal() {
        let base = SimParams::new(0.1, 100.0).unwrap();
        let iter = ParamIter::new(&base, ParamSlot::field("other"), vec![1.0.into()]).unwrap();
        let err = run_sweep(&LevelSignal, &iter, &AbsFirstSample, 2, 0, "fatal").unwrap_err();
        assert!(matches!(err, SweepError::Generate(_)));
    }

    #[test]
    fn resolve_n_jobs_pins_or_defaults() {
        assert_eq!(resolve_n_jobs(-1), 0);
        assert_eq!(resolve_n_jobs(0), 0);
        assert_eq!(resolve_n_jobs(3), 3);
    }

    #[test]
    fn empty_grid_is_a_shape_error() {
        let err = reshape("empty", Vec::new(), 5, Vec::new(), 0).unwrap_err();
        assert!(matches!(err, SweepError::ShapeMismatch { .. }));
    }
}
