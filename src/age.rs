//! Age binning.
//!
//! Age carries a dual representation: its raw column is numeric, but every
//! categorical-style comparison (allow-list filtering, choice aggregation)
//! goes through the fixed bucket mapping below. Buckets are open-ended at
//! both extremes and five years wide in between.

use std::sync::OnceLock;

use regex::Regex;

use crate::data::{MISSING, is_missing};

/// Variable id the dual representation applies to.
pub const AGE_VARIABLE_ID: &str = "age";

pub const UNDER_BIN: &str = "19-and-under";
pub const OVER_BIN: &str = "60-and-over";

pub fn is_age_variable(variable_id: &str) -> bool {
    variable_id == AGE_VARIABLE_ID
}

/// Maps a raw age cell to its bucket label. Missing or unparseable values
/// land in the `NA` bucket rather than failing.
pub fn age_bin(raw: &str) -> String {
    if is_missing(raw) {
        return MISSING.to_string();
    }
    let Some(parsed) = raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()) else {
        return MISSING.to_string();
    };
    let age = parsed.floor() as i64;
    if age <= 19 {
        return UNDER_BIN.to_string();
    }
    if age >= 60 {
        return OVER_BIN.to_string();
    }
    let lower = age / 5 * 5;
    format!("{lower}-{}", lower + 4)
}

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)").expect("valid regex"))
}

/// Sort key for bucket labels: the under-19 bucket first, five-year buckets
/// ascending, the 60-and-over bucket after them, `NA` last.
pub fn bin_sort_key(bin: &str) -> i64 {
    match bin {
        UNDER_BIN => 0,
        OVER_BIN => 100,
        MISSING => 999,
        other => leading_number()
            .captures(other)
            .and_then(|caps| caps[1].parse::<i64>().ok())
            .unwrap_or(50),
    }
}

/// Distinct bucket labels covering the inclusive integer age range
/// `[min, max]`, in display order. Used to evaluate a numeric Age range
/// against bucket-label allow-lists; the inverse direction is not supported.
pub fn bins_for_range(min: i64, max: i64) -> Vec<String> {
    let mut bins: Vec<String> = Vec::new();
    for age in min..=max {
        let bin = age_bin(&age.to_string());
        if bins.last().map(String::as_str) != Some(bin.as_str()) {
            bins.push(bin);
        }
    }
    bins
}
