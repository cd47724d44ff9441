//! Persistence boundary tests: stored signal batches must be
//! interchangeable with freshly generated ones at the measurement stage.

use simlab_core::measure::funcs::SignalVariance;
use simlab_core::sim::generators::PowerlawNoise;
use simlab_core::{simulate_across_values, ParamIter, ParamSlot, ParamValue, SimParams};
use simlab_runner::{run_sweep_from_signals, SignalStore};

fn exponent_iter(values: &[f64]) -> ParamIter {
    let base = SimParams::new(1.0, 100.0).unwrap().with_field("exponent", -1.0);
    ParamIter::new(
        &base,
        ParamSlot::field("exponent"),
        values.iter().copied().map(ParamValue::from).collect(),
    )
    .unwrap()
}

#[test]
fn measuring_loaded_signals_equals_measuring_fresh_ones() {
    let dir = tempfile::tempdir().unwrap();
    let store = SignalStore::new(dir.path()).unwrap();

    let iter = exponent_iter(&[-2.0, -1.0, 0.0]);
    let fresh = simulate_across_values(&PowerlawNoise, &iter, 5, 7).unwrap();
    store.save_signals("ap_exp", &fresh).unwrap();
    let loaded = store.load_signals("ap_exp").unwrap();

    let from_fresh = run_sweep_from_signals(&fresh, &SignalVariance, None, "ap_exp").unwrap();
    let from_loaded = run_sweep_from_signals(&loaded, &SignalVariance, None, "ap_exp").unwrap();
    assert_eq!(from_fresh, from_loaded);
}

#[test]
fn tensors_roundtrip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SignalStore::new(dir.path()).unwrap();

    let batches =
        simulate_across_values(&PowerlawNoise, &exponent_iter(&[-2.0, -1.0]), 4, 0).unwrap();
    let tensor = run_sweep_from_signals(&batches, &SignalVariance, None, "roundtrip").unwrap();

    store.save_tensor("roundtrip", &tensor).unwrap();
    let loaded = store.load_tensor("roundtrip").unwrap();
    assert_eq!(tensor, loaded);
    assert!(store.contains_tensor("roundtrip"));
    assert!(!store.contains_signals("roundtrip"));
}
