#![allow(dead_code)]

use std::path::PathBuf;

use survey_segments::{
    data::Dataset,
    settings::{ConversionSetting, SettingLayers, default_setting},
    variable::{VariableProfile, category_summaries, profile_dataset},
};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Builds an in-memory dataset from string literals.
pub fn dataset_from(headers: &[&str], rows: &[&[&str]]) -> Dataset {
    Dataset::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect(),
    )
    .expect("well-formed test dataset")
}

/// Profiles a dataset and seeds the default layer for every variable, the
/// way variable adoption does it.
pub fn layers_with_defaults(dataset: &Dataset) -> (Vec<VariableProfile>, SettingLayers) {
    let profiles = profile_dataset(dataset);
    let mut layers = SettingLayers::new();
    for (column, profile) in profiles.iter().enumerate() {
        let summaries = category_summaries(dataset, column, profile.kind);
        let setting: ConversionSetting = default_setting(profile, &summaries);
        layers = layers.with_default(profile.id.clone(), setting);
    }
    (profiles, layers)
}
