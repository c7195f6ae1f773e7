//! Variable profiling: type inference and descriptive statistics.
//!
//! Each column is classified exactly once when the dataset is loaded. A
//! column is [`VariableKind::Numeric`] iff it has at least one non-missing
//! value and every non-missing value parses as a finite number; anything
//! else, including a column with no responses at all, is categorical.

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, MISSING, is_missing, parse_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableProfile {
    pub id: String,
    pub name: String,
    pub kind: VariableKind,
    /// Observed numeric minimum; absent for categorical variables.
    pub min: Option<f64>,
    /// Observed numeric maximum; absent for categorical variables.
    pub max: Option<f64>,
    /// Percentage of non-missing cells, rounded to one decimal place.
    pub valid_response_rate: f64,
    /// Population standard deviation rounded to two decimal places; absent
    /// for categorical variables, where dispersion is not meaningful.
    pub std_dev: Option<f64>,
}

impl VariableProfile {
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, VariableKind::Numeric)
    }
}

/// One distinct observed value of a variable with its sample count and share,
/// as shown in the conversion-settings table and used to seed categorical
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub samples: usize,
    /// Share of all rows (missing included in the denominator), rounded to
    /// one decimal place.
    pub ratio: f64,
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Classifies one column and computes its descriptive statistics.
pub fn infer_variable<'a, I>(id: &str, name: &str, values: I) -> VariableProfile
where
    I: IntoIterator<Item = &'a str>,
{
    let mut total = 0usize;
    let mut non_missing = 0usize;
    let mut numbers: Vec<f64> = Vec::new();
    let mut all_numeric = true;
    for raw in values {
        total += 1;
        if is_missing(raw) {
            continue;
        }
        non_missing += 1;
        match parse_number(raw) {
            Some(value) => numbers.push(value),
            None => all_numeric = false,
        }
    }

    let kind = if all_numeric && non_missing > 0 {
        VariableKind::Numeric
    } else {
        VariableKind::Categorical
    };

    let valid_response_rate = if total > 0 {
        round_to(non_missing as f64 / total as f64 * 100.0, 1)
    } else {
        0.0
    };

    let (min, max, std_dev) = match kind {
        VariableKind::Numeric => {
            let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
            let variance = numbers
                .iter()
                .map(|v| (v - mean) * (v - mean))
                .sum::<f64>()
                / numbers.len() as f64;
            (
                Some(min),
                Some(max),
                Some(round_to(variance.sqrt(), 2)),
            )
        }
        VariableKind::Categorical => (None, None, None),
    };

    debug!(
        "Inferred variable '{id}' as {kind:?} ({non_missing}/{total} valid response(s))"
    );
    VariableProfile {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        min,
        max,
        valid_response_rate,
        std_dev,
    }
}

/// Profiles every column of a dataset.
pub fn profile_dataset(dataset: &Dataset) -> Vec<VariableProfile> {
    (0..dataset.column_count())
        .map(|col| {
            let id = dataset.headers()[col].clone();
            let values: Vec<&str> = dataset.column_values(col).collect();
            infer_variable(&id, &id, values)
        })
        .collect()
}

/// Distinct observed values of a column with counts and shares. Sorted
/// numerically ascending when the variable is numeric, lexicographically
/// otherwise, with `NA` always last.
pub fn category_summaries(
    dataset: &Dataset,
    column: usize,
    kind: VariableKind,
) -> Vec<CategorySummary> {
    let total = dataset.row_count();
    let counts = dataset
        .column_values(column)
        .map(|raw| if raw.is_empty() { MISSING } else { raw })
        .counts();

    let mut names: Vec<&str> = counts.keys().copied().collect();
    names.sort_by(|a, b| {
        if *a == MISSING {
            return std::cmp::Ordering::Greater;
        }
        if *b == MISSING {
            return std::cmp::Ordering::Less;
        }
        match kind {
            VariableKind::Numeric => parse_number(a)
                .partial_cmp(&parse_number(b))
                .unwrap_or(std::cmp::Ordering::Equal),
            VariableKind::Categorical => a.cmp(b),
        }
    });

    names
        .into_iter()
        .map(|name| {
            let samples = counts[name];
            let ratio = if total > 0 {
                round_to(samples as f64 / total as f64 * 100.0, 1)
            } else {
                0.0
            };
            CategorySummary {
                name: name.to_string(),
                samples,
                ratio,
            }
        })
        .collect()
}
