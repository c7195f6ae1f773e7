//! Core analysis pipeline for respondent-level survey data.
//!
//! The crate turns a loaded tabular dataset plus per-variable inclusion
//! rules into the derived statistics behind segment-comparison, composition,
//! and positioning views:
//!
//! 1. [`variable`] — classify each column as numeric or categorical and
//!    profile it.
//! 2. [`settings`] — resolve one effective conversion setting per variable
//!    from three precedence layers.
//! 3. [`filter`] — keep the rows that satisfy every active setting.
//! 4. [`segment`] — partition kept rows into numbered segments.
//! 5. [`range`] — integer histograms and constrained min/max range editing.
//! 6. [`aggregate`] / [`positioning`] — per-choice comparison tables,
//!    composition series, and two-axis bubble plots.
//!
//! Everything recomputes from the original rows whenever an input changes;
//! no derived structure is shared between views. Presentation (dialogs,
//! tree views, chart rendering) is an external collaborator that feeds
//! resolved inputs in and renders the outputs.

pub mod age;
pub mod aggregate;
pub mod data;
pub mod filter;
pub mod loader;
pub mod positioning;
pub mod range;
pub mod segment;
pub mod settings;
pub mod variable;

use std::{env, sync::OnceLock};

use log::LevelFilter;

static LOGGER: OnceLock<()> = OnceLock::new();

/// Initializes env_logger once for hosts (and tests) that have no logger of
/// their own. Defaults this crate to `info` unless `RUST_LOG` is set.
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("survey_segments", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}
