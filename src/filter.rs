//! Row inclusion: conjunctive evaluation of resolved conversion settings.
//!
//! A row is kept iff it satisfies every active variable's effective setting.
//! There is no OR across variables; the only disjunction is membership within
//! a single allow-list. Parse failures and stale variable ids degrade to
//! exclusion or to "not filtered" — nothing in here returns an error.

use log::debug;

use crate::{
    age,
    data::{Dataset, normalize_categorical, parse_number},
    settings::{ConversionSetting, SettingLayers},
};

/// One variable's resolved setting bound to its column position.
#[derive(Debug, Clone)]
pub struct ActiveFilter<'a> {
    pub variable_id: &'a str,
    pub column: usize,
    pub setting: &'a ConversionSetting,
}

/// Binds the resolved setting of each active variable to its column. Variables
/// unknown to the dataset (stale configuration) or without a setting in any
/// layer are skipped, i.e. they always pass.
pub fn build_active_filters<'a>(
    dataset: &Dataset,
    layers: &'a SettingLayers,
    active_ids: &'a [String],
) -> Vec<ActiveFilter<'a>> {
    let mut filters = Vec::new();
    for id in active_ids {
        let Some(column) = dataset.column_index(id) else {
            debug!("Skipping filter for unknown variable '{id}'");
            continue;
        };
        let Some(setting) = layers.resolve(id) else {
            continue;
        };
        filters.push(ActiveFilter {
            variable_id: id,
            column,
            setting,
        });
    }
    filters
}

fn matches_setting(raw: &str, variable_id: &str, setting: &ConversionSetting) -> bool {
    match setting {
        ConversionSetting::Numerical { min, max } => match parse_number(raw) {
            Some(value) => value >= *min as f64 && value <= *max as f64,
            None => false,
        },
        ConversionSetting::Categorical { allowed } => {
            if age::is_age_variable(variable_id) {
                allowed.contains(&age::age_bin(raw))
            } else {
                allowed.contains(normalize_categorical(raw))
            }
        }
    }
}

/// Whether one row satisfies every active filter.
pub fn row_matches(dataset: &Dataset, row: usize, filters: &[ActiveFilter<'_>]) -> bool {
    filters.iter().all(|filter| {
        matches_setting(
            dataset.value(row, filter.column),
            filter.variable_id,
            filter.setting,
        )
    })
}

/// Indices of all rows that satisfy every active filter, in row order.
pub fn filter_rows(dataset: &Dataset, filters: &[ActiveFilter<'_>]) -> Vec<usize> {
    let kept: Vec<usize> = (0..dataset.row_count())
        .filter(|&row| row_matches(dataset, row, filters))
        .collect();
    debug!(
        "Filter kept {} of {} row(s) across {} condition(s)",
        kept.len(),
        dataset.row_count(),
        filters.len()
    );
    kept
}
