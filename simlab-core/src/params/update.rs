//! Parameter slot updaters.
//!
//! A [`ParamSlot`] names one writable slot of a [`SimParams`]: a top-level
//! field, a field nested inside one named component, or the component
//! variance weights. Slots are plain data rather than closures, so a sweep
//! definition can be serialized, inspected, and compared.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ParamError, ParamValue, SimParams};

/// Address of one writable parameter slot.
///
/// Two slots are structurally distinct iff their (key, component) pairs
/// differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamSlot {
    /// A top-level generator field.
    Field { key: String },
    /// A field inside one named component.
    Component { component: String, key: String },
    /// The `component_variances` weight list.
    Variances,
}

impl ParamSlot {
    /// Slot for a top-level field.
    pub fn field(key: impl Into<String>) -> Self {
        ParamSlot::Field { key: key.into() }
    }

    /// Slot for a field inside one component.
    pub fn component(component: impl Into<String>, key: impl Into<String>) -> Self {
        ParamSlot::Component {
            component: component.into(),
            key: key.into(),
        }
    }

    /// Write `value` into this slot of `params`.
    ///
    /// The model is mutated in place; taking a fresh copy first is the
    /// caller's responsibility (the iterator does this on every step).
    pub fn apply(&self, params: &mut SimParams, value: &ParamValue) -> Result<(), ParamError> {
        match self {
            ParamSlot::Field { key } => {
                params.fields.insert(key.clone(), value.clone());
                Ok(())
            }
            ParamSlot::Component { component, key } => {
                let comp = params
                    .components
                    .get_mut(component)
                    .ok_or_else(|| ParamError::UnknownComponent(component.clone()))?;
                comp.insert(key.clone(), value.clone());
                Ok(())
            }
            ParamSlot::Variances => {
                let values = value
                    .as_values()
                    .ok_or(ParamError::VariancesNotAList)?;
                params.component_variances = values.to_vec();
                Ok(())
            }
        }
    }

    /// Null this slot out, documenting that it is the one that will vary.
    ///
    /// Errors on a component slot whose component does not exist, which
    /// makes slot/model compatibility checkable before any iteration.
    pub fn clear(&self, params: &mut SimParams) -> Result<(), ParamError> {
        match self {
            ParamSlot::Field { key } => {
                params.fields.remove(key);
                Ok(())
            }
            ParamSlot::Component { component, key } => {
                let comp = params
                    .components
                    .get_mut(component)
                    .ok_or_else(|| ParamError::UnknownComponent(component.clone()))?;
                comp.remove(key);
                Ok(())
            }
            ParamSlot::Variances => {
                params.component_variances.clear();
                Ok(())
            }
        }
    }
}

impl fmt::Display for ParamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamSlot::Field { key } => write!(f, "{key}"),
            ParamSlot::Component { component, key } => write!(f, "{component}.{key}"),
            ParamSlot::Variances => write!(f, "component_variances"),
        }
    }
}
