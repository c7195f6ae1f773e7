//! Choice-level aggregation over filtered, segment-assigned rows.
//!
//! The comparison table enumerates every distinct normalized value
//! ("choice") of each target variable and reports overall and per-segment
//! counts and percentages side by side, so the consumer can flip between
//! percentage and raw-count display without recomputation. The composition
//! series is the same aggregation restricted to a single variable with an
//! optional adopted-choice list, shaped for line/area charts.

use std::collections::HashMap;

use anyhow::{Result, bail};
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    age,
    data::{Dataset, MISSING, normalize_categorical, parse_number},
    segment::Assignment,
    variable::VariableKind,
};

/// A variable selected for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetVariable {
    pub id: String,
    pub name: String,
    pub kind: VariableKind,
}

/// One choice of one variable with overall and per-segment statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub variable_id: String,
    pub variable_name: String,
    pub choice_id: String,
    pub choice_name: String,
    pub total_ratio: f64,
    pub total_count: usize,
    pub segment_ratios: Vec<f64>,
    pub segment_counts: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
    pub segment_sizes: Vec<usize>,
    pub total_rows: usize,
}

/// One choice's per-segment shares, for composition-ratio charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionPoint {
    pub choice: String,
    /// `segment_shares[s]` is the percentage of segment `s + 1` that carries
    /// this choice; `0` for empty segments.
    pub segment_shares: Vec<f64>,
}

/// Normalized aggregation bucket of one cell: the age bin for the Age
/// variable, the raw value with empty collapsed to `NA` otherwise.
pub fn choice_of(dataset: &Dataset, row: usize, column: usize, variable_id: &str) -> String {
    let raw = dataset.value(row, column);
    if age::is_age_variable(variable_id) {
        age::age_bin(raw)
    } else {
        normalize_categorical(raw).to_string()
    }
}

fn sort_choices(choices: &mut [String], variable_id: &str, kind: VariableKind) {
    if age::is_age_variable(variable_id) {
        choices.sort_by_key(|choice| age::bin_sort_key(choice));
        return;
    }
    match kind {
        VariableKind::Numeric => choices.sort_by(|a, b| {
            match (parse_number(a), parse_number(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                // NA (and anything unparseable) sorts last.
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.cmp(b),
            }
        }),
        VariableKind::Categorical => choices.sort_by(|a, b| {
            if a == MISSING {
                return std::cmp::Ordering::Greater;
            }
            if b == MISSING {
                return std::cmp::Ordering::Less;
            }
            a.cmp(b)
        }),
    }
}

struct ChoiceCounts {
    total: usize,
    per_segment: Vec<usize>,
}

fn tally_choices(
    dataset: &Dataset,
    rows: &[usize],
    assignment: &Assignment,
    column: usize,
    variable_id: &str,
) -> HashMap<String, ChoiceCounts> {
    let segment_count = assignment.segment_count as usize;
    let mut counts: HashMap<String, ChoiceCounts> = HashMap::new();
    for (position, &row) in rows.iter().enumerate() {
        let choice = choice_of(dataset, row, column, variable_id);
        let entry = counts.entry(choice).or_insert_with(|| ChoiceCounts {
            total: 0,
            per_segment: vec![0; segment_count],
        });
        entry.total += 1;
        let segment = assignment.segment_ids[position] as usize - 1;
        entry.per_segment[segment] += 1;
    }
    counts
}

fn ratio(count: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        count as f64 / denominator as f64 * 100.0
    }
}

/// Builds the comparison table for the given targets over filtered rows and
/// their segment assignment. `rows` and `assignment.segment_ids` must be
/// parallel (one id per filtered row).
pub fn build_comparison_rows(
    dataset: &Dataset,
    rows: &[usize],
    assignment: &Assignment,
    targets: &[TargetVariable],
) -> Result<ComparisonTable> {
    if rows.len() != assignment.row_count() {
        bail!(
            "Assignment covers {} row(s) but {} were supplied",
            assignment.row_count(),
            rows.len()
        );
    }

    let total_rows = rows.len();
    let mut result = Vec::new();
    for target in targets {
        let Some(column) = dataset.column_index(&target.id) else {
            // Stale target from a previous dataset: contributes nothing.
            continue;
        };
        let counts = tally_choices(dataset, rows, assignment, column, &target.id);
        let mut choices: Vec<String> = counts.keys().cloned().collect();
        sort_choices(&mut choices, &target.id, target.kind);

        for (idx, choice) in choices.iter().enumerate() {
            let tally = &counts[choice];
            let segment_ratios = tally
                .per_segment
                .iter()
                .zip(&assignment.sizes)
                .map(|(&count, &size)| ratio(count, size))
                .collect();
            result.push(ComparisonRow {
                variable_id: target.id.clone(),
                variable_name: target.name.clone(),
                choice_id: (idx + 1).to_string(),
                choice_name: choice.clone(),
                total_ratio: ratio(tally.total, total_rows),
                total_count: tally.total,
                segment_ratios,
                segment_counts: tally.per_segment.clone(),
            });
        }
    }

    info!(
        "Built {} comparison row(s) for {} target(s) over {} filtered row(s)",
        result.len(),
        targets.len(),
        total_rows
    );
    Ok(ComparisonTable {
        rows: result,
        segment_sizes: assignment.sizes.clone(),
        total_rows,
    })
}

/// Per-segment composition shares of one variable, optionally restricted to
/// an adopted list of choices (unknown adopted names yield all-zero points).
pub fn build_composition_series(
    dataset: &Dataset,
    rows: &[usize],
    assignment: &Assignment,
    target: &TargetVariable,
    adopted_choices: Option<&[String]>,
) -> Result<Vec<CompositionPoint>> {
    if rows.len() != assignment.row_count() {
        bail!(
            "Assignment covers {} row(s) but {} were supplied",
            assignment.row_count(),
            rows.len()
        );
    }
    let Some(column) = dataset.column_index(&target.id) else {
        return Ok(Vec::new());
    };

    let counts = tally_choices(dataset, rows, assignment, column, &target.id);
    let choices: Vec<String> = match adopted_choices {
        Some(adopted) => adopted.to_vec(),
        None => {
            let mut all: Vec<String> = counts.keys().cloned().collect();
            sort_choices(&mut all, &target.id, target.kind);
            all
        }
    };

    let series = choices
        .into_iter()
        .map(|choice| {
            let segment_shares = match counts.get(&choice) {
                Some(tally) => tally
                    .per_segment
                    .iter()
                    .zip(&assignment.sizes)
                    .map(|(&count, &size)| ratio(count, size))
                    .collect(),
                None => vec![0.0; assignment.segment_count as usize],
            };
            CompositionPoint {
                choice,
                segment_shares,
            }
        })
        .collect_vec();
    Ok(series)
}
