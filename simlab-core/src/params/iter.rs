//! Deterministic parameter iteration.
//!
//! A [`ParamIter`] pairs a base model, a slot, and an ordered value sequence.
//! Each pass re-derives a fresh deep copy of the base model per value, so
//! every yielded model is a structurally independent snapshot and repeated
//! passes are bit-identical.

use super::update::ParamSlot;
use super::{ParamError, ParamValue, SimParams};

/// Iterates one parameter slot across an ordered sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamIter {
    base: SimParams,
    slot: ParamSlot,
    values: Vec<ParamValue>,
}

impl ParamIter {
    /// Build an iterator over `values` for one slot of `base`.
    ///
    /// The stored snapshot has the target slot nulled out, documenting which
    /// slot varies; the caller's `base` is left untouched. Fails if the slot
    /// does not fit the model (unknown component).
    pub fn new(
        base: &SimParams,
        slot: ParamSlot,
        values: Vec<ParamValue>,
    ) -> Result<Self, ParamError> {
        let mut snapshot = base.clone();
        slot.clear(&mut snapshot)?;
        Ok(Self {
            base: snapshot,
            slot,
            values,
        })
    }

    /// Number of parameter models one pass yields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values stepped across, in yield order.
    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    /// The slot being varied.
    pub fn slot(&self) -> &ParamSlot {
        &self.slot
    }

    /// Start a fresh pass over the parameter models.
    ///
    /// Every call restarts from the first value and yields the identical
    /// sequence, which is what makes sweeps reproducible.
    pub fn models(&self) -> ParamIterPass<'_> {
        ParamIterPass {
            iter: self,
            cursor: 0,
        }
    }
}

impl<'a> IntoIterator for &'a ParamIter {
    type Item = SimParams;
    type IntoIter = ParamIterPass<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.models()
    }
}

/// One pass over a [`ParamIter`]'s models.
#[derive(Debug, Clone)]
pub struct ParamIterPass<'a> {
    iter: &'a ParamIter,
    cursor: usize,
}

impl Iterator for ParamIterPass<'_> {
    type Item = SimParams;

    fn next(&mut self) -> Option<SimParams> {
        let value = self.iter.values.get(self.cursor)?;
        let mut model = self.iter.base.clone();
        // The slot was validated against the base model at construction,
        // so applying it cannot fail here.
        self.iter.slot.apply(&mut model, value).ok()?;
        self.cursor += 1;
        Some(model)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.iter.values.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ParamIterPass<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SimParams {
        SimParams::new(30.0, 500.0)
            .unwrap()
            .with_field("exponent", -1.5)
    }

    fn exponent_iter() -> ParamIter {
        let values = [-3.0, -2.0, -1.0, 0.0].map(ParamValue::from).to_vec();
        ParamIter::new(&base(), ParamSlot::field("exponent"), values).unwrap()
    }

    #[test]
    fn len_matches_value_count() {
        let iter = exponent_iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.models().len(), 4);
    }

    #[test]
    fn yields_values_in_order() {
        let iter = exponent_iter();
        let exponents: Vec<f64> = iter
            .models()
            .map(|m| m.scalar("exponent").unwrap())
            .collect();
        assert_eq!(exponents, vec![-3.0, -2.0, -1.0, 0.0]);
    }

    #[test]
    fn two_passes_are_identical() {
        let iter = exponent_iter();
        let first: Vec<SimParams> = iter.models().collect();
        let second: Vec<SimParams> = iter.models().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn caller_base_model_is_never_mutated() {
        let original = base();
        let iter = ParamIter::new(
            &original,
            ParamSlot::field("exponent"),
            vec![1.0.into(), 2.0.into()],
        )
        .unwrap();
        let _ = iter.models().collect::<Vec<_>>();
        assert_eq!(original.scalar("exponent"), Some(-1.5));
    }

    #[test]
    fn yielded_models_are_independent_snapshots() {
        let iter = exponent_iter();
        let mut models: Vec<SimParams> = iter.models().collect();
        models[0].fields.insert("exponent".into(), 99.0.into());
        // Mutating one snapshot does not bleed into its siblings
        assert_eq!(models[1].scalar("exponent"), Some(-2.0));
    }

    #[test]
    fn snapshot_has_slot_nulled() {
        let iter = exponent_iter();
        assert!(!iter.base.fields.contains_key("exponent"));
    }

    #[test]
    fn unknown_component_rejected_at_construction() {
        let err = ParamIter::new(
            &base(),
            ParamSlot::component("oscillation", "freq"),
            vec![10.0.into()],
        )
        .unwrap_err();
        assert!(matches!(err, ParamError::UnknownComponent(_)));
    }
}
