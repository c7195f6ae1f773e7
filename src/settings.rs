//! Conversion settings and their precedence resolution.
//!
//! Every variable is filtered through at most one effective
//! [`ConversionSetting`]: an inclusive numeric range or a categorical
//! allow-list. Three configuration sources can supply one, and resolution is
//! a pure function over three immutable layers rather than a shared map
//! patched in place:
//!
//! 1. display-time override (narrowing applied only to the current view),
//! 2. the analyst-configured setting attached at item selection,
//! 3. the dataset-wide default derived from type inference.
//!
//! A variable with no setting in any layer is simply not filtered.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    age,
    variable::{CategorySummary, VariableProfile},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversionSetting {
    /// Inclusive integer bounds, `min <= max`.
    Numerical { min: i64, max: i64 },
    /// Raw (or, for Age, bin-label) values a row may carry.
    Categorical { allowed: BTreeSet<String> },
}

impl ConversionSetting {
    pub fn numerical(min: i64, max: i64) -> Self {
        Self::Numerical { min, max }
    }

    pub fn categorical<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Categorical {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

/// The three precedence layers, highest first: display override, configured,
/// default. Layers are immutable once handed to the pipeline; a view that
/// needs different overrides builds a new value.
#[derive(Debug, Clone, Default)]
pub struct SettingLayers {
    display: HashMap<String, ConversionSetting>,
    configured: HashMap<String, ConversionSetting>,
    defaults: HashMap<String, ConversionSetting>,
}

impl SettingLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_display(mut self, variable_id: impl Into<String>, setting: ConversionSetting) -> Self {
        self.display.insert(variable_id.into(), setting);
        self
    }

    pub fn with_configured(
        mut self,
        variable_id: impl Into<String>,
        setting: ConversionSetting,
    ) -> Self {
        self.configured.insert(variable_id.into(), setting);
        self
    }

    pub fn with_default(mut self, variable_id: impl Into<String>, setting: ConversionSetting) -> Self {
        self.defaults.insert(variable_id.into(), setting);
        self
    }

    /// Resolves the effective setting for a variable, or `None` when no layer
    /// mentions it (including ids from a stale configuration that never
    /// existed in this dataset).
    pub fn resolve(&self, variable_id: &str) -> Option<&ConversionSetting> {
        self.display
            .get(variable_id)
            .or_else(|| self.configured.get(variable_id))
            .or_else(|| self.defaults.get(variable_id))
    }
}

/// The dataset-wide default for a variable: its full observed numeric range,
/// or its full observed category set.
pub fn default_setting(
    profile: &VariableProfile,
    summaries: &[CategorySummary],
) -> ConversionSetting {
    match (profile.min, profile.max) {
        (Some(min), Some(max)) if profile.is_numeric() => ConversionSetting::Numerical {
            min: min.floor() as i64,
            max: max.ceil() as i64,
        },
        _ => ConversionSetting::categorical(summaries.iter().map(|s| s.name.clone())),
    }
}

/// Projects a setting into label space for consumers that compare bin/category
/// labels. A categorical setting is returned as-is; a numeric range on the Age
/// variable is converted to its equivalent set of age-bin labels. A numeric
/// range on any other variable has no label-space equivalent.
pub fn categorical_view(
    setting: &ConversionSetting,
    variable_id: &str,
) -> Option<BTreeSet<String>> {
    match setting {
        ConversionSetting::Categorical { allowed } => Some(allowed.clone()),
        ConversionSetting::Numerical { min, max } if age::is_age_variable(variable_id) => {
            Some(age::bins_for_range(*min, *max).into_iter().collect())
        }
        ConversionSetting::Numerical { .. } => None,
    }
}
