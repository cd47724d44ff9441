//! Named catalogs of parameter and iterator definitions.
//!
//! A [`ParamRegistry`] is an explicit, injectable registry: base timing
//! parameters plus named model definitions and named sweep-axis definitions.
//! Registries are plain values — multiple independent catalogs can coexist,
//! which keeps test fixtures isolated from one another.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::iter::ParamIter;
use super::update::ParamSlot;
use super::{ComponentParams, ParamError, ParamValue, SimParams};

/// A parameter definition without the base timing parameters.
///
/// The registry merges its base `(n_seconds, fs)` into every definition on
/// access, so definitions stay reusable across timing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, ComponentParams>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_variances: Vec<f64>,
}

impl ParamDef {
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_component(mut self, name: impl Into<String>, params: ComponentParams) -> Self {
        self.components.insert(name.into(), params);
        self
    }

    pub fn with_component_variances(mut self, variances: Vec<f64>) -> Self {
        self.component_variances = variances;
        self
    }
}

/// One named sweep axis: which definition to start from, which slot to vary,
/// and the ordered values to step across.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterDef {
    pub label: String,
    pub slot: ParamSlot,
    pub values: Vec<ParamValue>,
}

/// Explicit catalog of reusable parameter and iterator definitions.
#[derive(Debug, Clone)]
pub struct ParamRegistry {
    n_seconds: f64,
    fs: f64,
    defs: BTreeMap<String, ParamDef>,
    iters: BTreeMap<String, IterDef>,
}

impl ParamRegistry {
    pub fn new(n_seconds: f64, fs: f64) -> Result<Self, ParamError> {
        // Reuse the base-parameter validation
        SimParams::new(n_seconds, fs)?;
        Ok(Self {
            n_seconds,
            fs,
            defs: BTreeMap::new(),
            iters: BTreeMap::new(),
        })
    }

    /// Register one named parameter definition.
    pub fn register(&mut self, label: impl Into<String>, def: ParamDef) {
        self.defs.insert(label.into(), def);
    }

    /// Register several definitions at once; `clear` drops existing ones
    /// first.
    pub fn register_group(&mut self, group: BTreeMap<String, ParamDef>, clear: bool) {
        if clear {
            self.defs.clear();
        }
        self.defs.extend(group);
    }

    /// Register one named sweep-axis definition.
    pub fn register_iter(&mut self, name: impl Into<String>, def: IterDef) {
        self.iters.insert(name.into(), def);
    }

    /// Labels of the registered parameter definitions.
    pub fn labels(&self) -> Vec<&str> {
        self.defs.keys().map(String::as_str).collect()
    }

    /// Materialize one definition as a full model with the base merged in.
    pub fn get(&self, label: &str) -> Result<SimParams, ParamError> {
        let def = self
            .defs
            .get(label)
            .ok_or_else(|| ParamError::UnknownDefinition(label.to_string()))?;
        let mut params = SimParams::new(self.n_seconds, self.fs)?;
        params.fields = def.fields.clone();
        params.components = def.components.clone();
        params.component_variances = def.component_variances.clone();
        params.validate()?;
        Ok(params)
    }

    /// Materialize one named sweep axis as a ready-to-run [`ParamIter`].
    pub fn iter(&self, name: &str) -> Result<ParamIter, ParamError> {
        let def = self
            .iters
            .get(name)
            .ok_or_else(|| ParamError::UnknownIterator(name.to_string()))?;
        let base = self.get(&def.label)?;
        ParamIter::new(&base, def.slot.clone(), def.values.clone())
    }
}
