//! Correlation aggregation across measure result vectors.
//!
//! All pairwise statistics share one dedup discipline: each unordered pair
//! of distinct measures is computed once and written under both keys, so a
//! table over k measures costs exactly k*(k-1)/2 bootstrap calls — the
//! bootstrap dominates, so halving the call count matters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bootstrap::{
    bootstrap_corr, bootstrap_diff, BootstrapConfig, CorrError, CorrStats, DiffStats,
};

/// Named measure result vectors, sample-aligned across measures.
pub type MeasureVectors = BTreeMap<String, Vec<f64>>;

/// Symmetric pairwise statistics keyed by measure name on both axes.
///
/// By construction `table[a][b] == table[b][a]` and there is no `table[a][a]`
/// entry — absent, not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseTable<T>(BTreeMap<String, BTreeMap<String, T>>);

pub type CorrelationTable = PairwiseTable<CorrStats>;
pub type DiffTable = PairwiseTable<DiffStats>;

impl<T> Default for PairwiseTable<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T: Clone> PairwiseTable<T> {
    fn with_measures<'a>(names: impl Iterator<Item = &'a String>) -> Self {
        Self(names.map(|name| (name.clone(), BTreeMap::new())).collect())
    }

    fn contains(&self, a: &str, b: &str) -> bool {
        self.0.get(a).is_some_and(|row| row.contains_key(b))
    }

    /// Store one pair symmetrically: computed once, written twice.
    fn insert_pair(&mut self, a: &str, b: &str, stats: T) {
        if let Some(row) = self.0.get_mut(a) {
            row.insert(b.to_string(), stats.clone());
        }
        if let Some(row) = self.0.get_mut(b) {
            row.insert(a.to_string(), stats);
        }
    }

    pub fn get(&self, a: &str, b: &str) -> Option<&T> {
        self.0.get(a).and_then(|row| row.get(b))
    }

    /// Measure names on the table's axes.
    pub fn measures(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Each unordered pair once, in name order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, &T)> {
        self.0.iter().flat_map(|(a, row)| {
            row.iter()
                .filter(move |(b, _)| a.as_str() < b.as_str())
                .map(move |(b, stats)| (a.as_str(), b.as_str(), stats))
        })
    }
}

/// Apply one shared boolean mask to every vector (co-selection).
///
/// Every vector must share length with the mask; selection is identical
/// across vectors so results stay sample-aligned.
fn co_select(
    results: &MeasureVectors,
    select: Option<&[bool]>,
) -> Result<MeasureVectors, CorrError> {
    let Some(mask) = select else {
        return Ok(results.clone());
    };
    results
        .iter()
        .map(|(name, vector)| {
            if vector.len() != mask.len() {
                return Err(CorrError::MaskMismatch {
                    name: name.clone(),
                    mask: mask.len(),
                    vector: vector.len(),
                });
            }
            let kept = vector
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(v, _)| *v)
                .collect();
            Ok((name.clone(), kept))
        })
        .collect()
}

fn select_feature(feature: &[f64], select: Option<&[bool]>) -> Result<Vec<f64>, CorrError> {
    match select {
        None => Ok(feature.to_vec()),
        Some(mask) => {
            if feature.len() != mask.len() {
                return Err(CorrError::MaskMismatch {
                    name: "feature".into(),
                    mask: mask.len(),
                    vector: feature.len(),
                });
            }
            Ok(feature
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(v, _)| *v)
                .collect())
        }
    }
}

/// Correlate every unordered pair of measures, deduplicated.
pub fn compute_all_corrs(
    results: &MeasureVectors,
    select: Option<&[bool]>,
    config: &BootstrapConfig,
) -> Result<CorrelationTable, CorrError> {
    compute_all_corrs_with(results, select, |x, y| bootstrap_corr(x, y, config))
}

/// Pairwise correlations with an injected correlation function.
///
/// The collaborator seam: tests and alternative estimators plug in here.
pub fn compute_all_corrs_with<F>(
    results: &MeasureVectors,
    select: Option<&[bool]>,
    mut corr_fn: F,
) -> Result<CorrelationTable, CorrError>
where
    F: FnMut(&[f64], &[f64]) -> Result<CorrStats, CorrError>,
{
    let selected = co_select(results, select)?;
    let mut table = CorrelationTable::with_measures(selected.keys());
    for (m1, v1) in &selected {
        for (m2, v2) in &selected {
            // Skip self-pairs and pairs already filled via symmetry
            if m1 == m2 || table.contains(m2, m1) {
                continue;
            }
            let stats = corr_fn(v1, v2)?;
            table.insert_pair(m1, m2, stats);
        }
    }
    Ok(table)
}

/// Correlate every measure against one shared external feature.
pub fn compute_corrs_to_feature(
    results: &MeasureVectors,
    feature: &[f64],
    select: Option<&[bool]>,
    config: &BootstrapConfig,
) -> Result<BTreeMap<String, CorrStats>, CorrError> {
    let selected = co_select(results, select)?;
    let feature = select_feature(feature, select)?;
    selected
        .iter()
        .map(|(name, vector)| {
            bootstrap_corr(vector, &feature, config).map(|stats| (name.clone(), stats))
        })
        .collect()
}

/// Correlation differences conditioned on a feature, for every unordered
/// pair of measures — same dedup discipline as [`compute_all_corrs`].
pub fn compute_diffs_to_feature(
    results: &MeasureVectors,
    feature: &[f64],
    select: Option<&[bool]>,
    config: &BootstrapConfig,
) -> Result<DiffTable, CorrError> {
    compute_diffs_to_feature_with(results, feature, select, |f, a, b| {
        bootstrap_diff(f, a, b, config)
    })
}

/// Correlation differences with an injected difference function.
pub fn compute_diffs_to_feature_with<F>(
    results: &MeasureVectors,
    feature: &[f64],
    select: Option<&[bool]>,
    mut diff_fn: F,
) -> Result<DiffTable, CorrError>
where
    F: FnMut(&[f64], &[f64], &[f64]) -> Result<DiffStats, CorrError>,
{
    let selected = co_select(results, select)?;
    let feature = select_feature(feature, select)?;
    let mut table = DiffTable::with_measures(selected.keys());
    for (m1, v1) in &selected {
        for (m2, v2) in &selected {
            if m1 == m2 || table.contains(m2, m1) {
                continue;
            }
            let stats = diff_fn(&feature, v1, v2)?;
            table.insert_pair(m1, m2, stats);
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(pairs: &[(&str, &[f64])]) -> MeasureVectors {
        pairs
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect()
    }

    fn stub_stats(r: f64) -> CorrStats {
        CorrStats {
            r,
            ci_low: r,
            ci_high: r,
            p: 0.5,
        }
    }

    #[test]
    fn table_is_symmetric_with_no_self_entries() {
        let results = vectors(&[
            ("a", &[1.0, 2.0, 3.0, 4.0]),
            ("b", &[4.0, 3.0, 2.0, 1.0]),
            ("c", &[1.0, 3.0, 2.0, 4.0]),
        ]);
        let table =
            compute_all_corrs(&results, None, &BootstrapConfig::default()).unwrap();

        for a in ["a", "b", "c"] {
            assert!(table.get(a, a).is_none(), "self entry for {a}");
            for b in ["a", "b", "c"] {
                if a != b {
                    assert_eq!(table.get(a, b), table.get(b, a));
                }
            }
        }
    }

    #[test]
    fn pairwise_calls_are_deduplicated() {
        let results = vectors(&[
            ("a", &[1.0, 2.0, 3.0, 4.0]),
            ("b", &[4.0, 3.0, 2.0, 1.0]),
            ("c", &[1.0, 3.0, 2.0, 4.0]),
            ("d", &[2.0, 1.0, 4.0, 3.0]),
        ]);
        let mut calls = 0;
        let table = compute_all_corrs_with(&results, None, |_, _| {
            calls += 1;
            Ok(stub_stats(0.0))
        })
        .unwrap();

        // k*(k-1)/2, not k*(k-1)
        assert_eq!(calls, 6);
        assert_eq!(table.pairs().count(), 6);
    }

    #[test]
    fn mask_is_co_selected_across_all_vectors() {
        let results = vectors(&[
            ("a", &[1.0, 99.0, 2.0, 3.0]),
            ("b", &[2.0, -50.0, 4.0, 6.0]),
        ]);
        let mask = [true, false, true, true];
        let mut seen_lengths = Vec::new();
        compute_all_corrs_with(&results, Some(&mask), |x, y| {
            seen_lengths.push((x.len(), y.len()));
            Ok(stub_stats(pearson_stub(x, y)))
        })
        .unwrap();
        assert_eq!(seen_lengths, vec![(3, 3)]);
    }

    fn pearson_stub(x: &[f64], y: &[f64]) -> f64 {
        crate::bootstrap::pearson_r(x, y)
    }

    #[test]
    fn mask_length_mismatch_is_an_error() {
        let results = vectors(&[("a", &[1.0, 2.0]), ("b", &[3.0, 4.0])]);
        let mask = [true, false, true];
        let err = compute_all_corrs(&results, Some(&mask), &BootstrapConfig::default())
            .unwrap_err();
        assert!(matches!(err, CorrError::MaskMismatch { .. }));
    }

    #[test]
    fn corrs_to_feature_recovers_signs() {
        let results = vectors(&[
            ("a", &[1.0, 2.0, 3.0, 4.0]),
            ("b", &[4.0, 3.0, 2.0, 1.0]),
        ]);
        let feature = [1.0, 2.0, 3.0, 4.0];
        let corrs = compute_corrs_to_feature(
            &results,
            &feature,
            None,
            &BootstrapConfig::default(),
        )
        .unwrap();

        assert!((corrs["a"].r - 1.0).abs() < 1e-10);
        assert!((corrs["b"].r + 1.0).abs() < 1e-10);
    }

    #[test]
    fn diffs_table_shares_dedup_discipline() {
        let results = vectors(&[
            ("a", &[1.0, 2.0, 3.0, 4.0]),
            ("b", &[4.0, 3.0, 2.0, 1.0]),
            ("c", &[1.0, 3.0, 2.0, 4.0]),
        ]);
        let feature = [1.0, 2.0, 3.0, 4.0];
        let mut calls = 0;
        let table = compute_diffs_to_feature_with(&results, &feature, None, |_, _, _| {
            calls += 1;
            Ok(DiffStats {
                r_first: 0.0,
                r_second: 0.0,
                diff: 0.0,
                ci_low: 0.0,
                ci_high: 0.0,
                p: 1.0,
            })
        })
        .unwrap();

        assert_eq!(calls, 3);
        assert_eq!(table.get("a", "b"), table.get("b", "a"));
        assert!(table.get("a", "a").is_none());
    }

    #[test]
    fn table_roundtrips_through_json() {
        let results = vectors(&[
            ("a", &[1.0, 2.0, 3.0, 4.0]),
            ("b", &[4.0, 3.0, 2.0, 1.0]),
        ]);
        let table =
            compute_all_corrs(&results, None, &BootstrapConfig::default()).unwrap();
        let json = serde_json::to_string(&table).unwrap();
        let back: CorrelationTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
    }
}
