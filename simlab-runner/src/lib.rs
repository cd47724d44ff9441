//! SimLab Runner — sweep orchestration, comparisons, and statistics.
//!
//! This crate builds on `simlab-core` to provide:
//! - Serializable sweep/comparison configuration with content-hash run ids
//! - Serial and parallel sweep execution with shape reconciliation
//! - NaN-sentinel failure accounting and NaN-aware reductions
//! - Comparison runs (many measures, same realized signals)
//! - Bootstrap correlation and correlation-difference statistics
//! - Deduplicated pairwise correlation tables
//! - A JSON signal/result store and CSV export

pub mod bootstrap;
pub mod compare;
pub mod config;
pub mod corrs;
pub mod export;
pub mod result;
pub mod store;
pub mod sweep;

pub use bootstrap::{
    bootstrap_corr, bootstrap_diff, pearson_r, BootstrapConfig, CorrError, CorrStats, DiffStats,
};
pub use compare::{run_comparisons, ComparisonResults, ParamSource};
pub use config::{CompareConfig, ConfigError, Reduction, RunId, SamplerDef, SweepConfig};
pub use corrs::{
    compute_all_corrs, compute_all_corrs_with, compute_corrs_to_feature,
    compute_diffs_to_feature, compute_diffs_to_feature_with, CorrelationTable, DiffTable,
    MeasureVectors, PairwiseTable,
};
pub use export::{
    export_corr_csv, export_summary_csv, export_tensor_csv, export_tensor_json,
    import_tensor_json,
};
pub use result::{ResultTensor, SCHEMA_VERSION};
pub use store::SignalStore;
pub use sweep::{
    drain_bounded_sampler, drain_sampler, run_sweep, run_sweep_from_signals,
    run_sweep_models_parallel, run_sweep_over, run_sweep_parallel,
    run_sweep_parallel_with_progress, LabelledModels, SweepError,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SweepConfig>();
        assert_sync::<SweepConfig>();
        assert_send::<CompareConfig>();
        assert_sync::<CompareConfig>();
        assert_send::<Reduction>();
        assert_sync::<Reduction>();
    }

    #[test]
    fn result_tensor_is_send_sync() {
        assert_send::<ResultTensor>();
        assert_sync::<ResultTensor>();
    }

    #[test]
    fn statistics_types_are_send_sync() {
        assert_send::<BootstrapConfig>();
        assert_sync::<BootstrapConfig>();
        assert_send::<CorrStats>();
        assert_sync::<CorrStats>();
        assert_send::<DiffStats>();
        assert_sync::<DiffStats>();
        assert_send::<CorrelationTable>();
        assert_sync::<CorrelationTable>();
    }

    #[test]
    fn store_is_send_sync() {
        assert_send::<SignalStore>();
        assert_sync::<SignalStore>();
    }
}
