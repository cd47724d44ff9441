//! Property tests for tensor shape reconciliation and reductions.

use proptest::prelude::*;
use rand::rngs::StdRng;
use simlab_core::{
    GenerateError, Measure, MeasureError, ParamIter, ParamSlot, ParamValue, SignalGenerator,
    SimParams,
};
use simlab_runner::{run_sweep, Reduction, SweepError};

/// Constant-zero signal generator.
struct Silence;

impl SignalGenerator for Silence {
    fn name(&self) -> &str {
        "silence"
    }

    fn generate(&self, params: &SimParams, _rng: &mut StdRng) -> Result<Vec<f64>, GenerateError> {
        Ok(vec![0.0; params.n_samples()])
    }
}

/// Always returns `width` copies of 1.0.
struct ConstantVector {
    width: usize,
}

impl Measure for ConstantVector {
    fn name(&self) -> &str {
        "constant_vector"
    }

    fn output_width(&self) -> usize {
        self.width
    }

    fn compute(&self, _sig: &[f64]) -> Result<Vec<f64>, MeasureError> {
        Ok(vec![1.0; self.width])
    }
}

/// Returns an extra element on the final call of a known grid.
struct LastCallWide {
    total_calls: std::sync::atomic::AtomicUsize,
    grid_size: usize,
}

impl Measure for LastCallWide {
    fn name(&self) -> &str {
        "last_call_wide"
    }

    fn compute(&self, _sig: &[f64]) -> Result<Vec<f64>, MeasureError> {
        let call = self
            .total_calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        if call + 1 == self.grid_size {
            Ok(vec![1.0, 2.0])
        } else {
            Ok(vec![1.0])
        }
    }
}

fn grid_iter(n_values: usize) -> ParamIter {
    let base = SimParams::new(0.05, 100.0).unwrap();
    ParamIter::new(
        &base,
        ParamSlot::field("v"),
        (0..n_values).map(|v| ParamValue::from(v as f64)).collect(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Constant-width measures always reshape to [n_values, n_reps, width].
    #[test]
    fn constant_width_always_reshapes(
        n_values in 1..6usize,
        n_reps in 1..6usize,
        width in 1..4usize,
    ) {
        let measure = ConstantVector { width };
        let tensor = run_sweep(&Silence, &grid_iter(n_values), &measure, n_reps, 0, "p").unwrap();
        prop_assert_eq!(tensor.n_values, n_values);
        prop_assert_eq!(tensor.n_reps, n_reps);
        prop_assert_eq!(tensor.width, width);
        prop_assert_eq!(tensor.failures, 0);

        // All-constant cells reduce to the constant with zero spread
        let reduced = tensor.reduce(Reduction::Median);
        for row in reduced {
            for v in row {
                prop_assert_eq!(v, 1.0);
            }
        }
    }

    /// A single wide cell anywhere in the grid poisons the whole sweep.
    #[test]
    fn one_ragged_cell_aborts(
        n_values in 2..5usize,
        n_reps in 2..5usize,
    ) {
        let measure = LastCallWide {
            total_calls: std::sync::atomic::AtomicUsize::new(0),
            grid_size: n_values * n_reps,
        };
        let result = run_sweep(&Silence, &grid_iter(n_values), &measure, n_reps, 0, "ragged");
        prop_assert!(matches!(result, Err(SweepError::ShapeMismatch { .. })), "expected ShapeMismatch error");
    }
}
