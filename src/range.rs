//! Binning and interactive range editing.
//!
//! Numeric variables are summarized as integer-indexed histograms over a
//! fixed global domain, and the analyst narrows `[min, max]` either by
//! dragging bound handles (clamped silently, fired at pointer-move rate) or
//! by typing values (validated, reported as [`RangeEditError`]). Switching to
//! an IQR outlier mode replaces the bounds with quartile-derived ones and
//! locks manual editing until custom mode is restored.
//!
//! Everything here is pure state transformation; rendering the histogram and
//! the drag handles is the caller's concern.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `bins[i]` counts values equal to `global_min + i`. Values outside
/// `[global_min, global_max]` are ignored; non-integer values count toward
/// the bin of their floor.
pub fn build_histogram(values: &[f64], global_min: i64, global_max: i64) -> Vec<usize> {
    if global_max < global_min {
        return Vec::new();
    }
    let span = (global_max - global_min + 1) as usize;
    let mut bins = vec![0usize; span];
    for &value in values {
        if !value.is_finite() {
            continue;
        }
        let index = value.floor() as i64 - global_min;
        if index >= 0 && (index as usize) < span {
            bins[index as usize] += 1;
        }
    }
    bins
}

/// Quartile-based outlier bounds: quartiles are the sample values at the
/// `floor(n * 0.25)` / `floor(n * 0.75)` positions of the ascending sort (no
/// interpolation). Requires at least four values; the result is clamped into
/// `[global_min, global_max]`.
pub fn iqr_bounds(
    values: &[f64],
    multiplier: f64,
    global_min: i64,
    global_max: i64,
) -> Option<(i64, i64)> {
    if values.len() < 4 {
        return None;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let q1 = sorted[(n as f64 * 0.25).floor() as usize];
    let q3 = sorted[(n as f64 * 0.75).floor() as usize];
    let iqr = q3 - q1;
    let lower = global_min.max((q1 - multiplier * iqr).floor() as i64);
    let upper = global_max.min((q3 + multiplier * iqr).ceil() as i64);
    Some((lower, upper))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlierMode {
    /// Bounds are whatever the analyst set; editing enabled.
    Custom,
    /// Bounds derived with multiplier 1.5; editing locked.
    Iqr1_5,
    /// Bounds derived with multiplier 3.0; editing locked.
    Iqr3_0,
}

impl OutlierMode {
    pub fn multiplier(self) -> Option<f64> {
        match self {
            OutlierMode::Custom => None,
            OutlierMode::Iqr1_5 => Some(1.5),
            OutlierMode::Iqr3_0 => Some(3.0),
        }
    }
}

/// User-correctable problems with a manually entered range. The selection
/// keeps its last valid state whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeEditError {
    #[error("bounds are derived from the outlier mode and cannot be edited")]
    Locked,
    #[error("minimum value is required")]
    MissingMin,
    #[error("maximum value is required")]
    MissingMax,
    #[error("'{0}' is not a whole number")]
    NotANumber(String),
    #[error("value {value} is outside the allowed range {min}..={max}")]
    OutOfDomain { value: i64, min: i64, max: i64 },
    #[error("minimum {min} exceeds maximum {max}")]
    Inverted { min: i64, max: i64 },
}

/// The editable `[min, max]` selection of one numeric variable, pinned inside
/// its global domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    domain_min: i64,
    domain_max: i64,
    min: i64,
    max: i64,
    mode: OutlierMode,
}

impl RangeSelection {
    /// Starts with the full domain selected and custom (editable) mode.
    pub fn new(domain_min: i64, domain_max: i64) -> Self {
        let domain_max = domain_max.max(domain_min);
        Self {
            domain_min,
            domain_max,
            min: domain_min,
            max: domain_max,
            mode: OutlierMode::Custom,
        }
    }

    pub fn domain(&self) -> (i64, i64) {
        (self.domain_min, self.domain_max)
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn mode(&self) -> OutlierMode {
        self.mode
    }

    /// Manual edits are disabled while outlier-derived bounds are active.
    pub fn is_editable(&self) -> bool {
        self.mode == OutlierMode::Custom
    }

    /// Drag-style edit of the lower bound: clamped to
    /// `[domain_min, current_max]`, silently ignored while locked. Returns
    /// the effective bound.
    pub fn propose_min(&mut self, proposed: i64) -> i64 {
        if self.is_editable() {
            self.min = proposed.clamp(self.domain_min, self.max);
        }
        self.min
    }

    /// Drag-style edit of the upper bound: clamped to
    /// `[current_min, domain_max]`, silently ignored while locked. Returns
    /// the effective bound.
    pub fn propose_max(&mut self, proposed: i64) -> i64 {
        if self.is_editable() {
            self.max = proposed.clamp(self.min, self.domain_max);
        }
        self.max
    }

    /// Confirms a typed min/max pair. On any validation failure the current
    /// selection is left untouched; [`RangeEditError::Locked`] is returned
    /// while an outlier mode owns the bounds, so the caller can tell an
    /// ignored entry from an applied one.
    pub fn confirm_entry(&mut self, min_text: &str, max_text: &str) -> Result<(), RangeEditError> {
        if !self.is_editable() {
            return Err(RangeEditError::Locked);
        }
        let min = parse_bound(min_text, RangeEditError::MissingMin)?;
        let max = parse_bound(max_text, RangeEditError::MissingMax)?;
        for value in [min, max] {
            if value < self.domain_min || value > self.domain_max {
                return Err(RangeEditError::OutOfDomain {
                    value,
                    min: self.domain_min,
                    max: self.domain_max,
                });
            }
        }
        if min > max {
            return Err(RangeEditError::Inverted { min, max });
        }
        self.min = min;
        self.max = max;
        Ok(())
    }

    /// Switches the outlier mode. Entering an IQR mode recomputes the bounds
    /// from `sample` and locks editing; if the sample is too small the bounds
    /// are left as they are. Returning to custom unlocks editing and keeps
    /// the derived bounds.
    pub fn set_outlier_mode(&mut self, mode: OutlierMode, sample: &[f64]) {
        self.mode = mode;
        let Some(multiplier) = mode.multiplier() else {
            return;
        };
        if let Some((lower, upper)) = iqr_bounds(sample, multiplier, self.domain_min, self.domain_max)
        {
            debug!(
                "Outlier bounds with k={multiplier}: [{lower}, {upper}] inside [{}, {}]",
                self.domain_min, self.domain_max
            );
            self.min = lower;
            self.max = upper;
        }
    }
}

fn parse_bound(text: &str, missing: RangeEditError) -> Result<i64, RangeEditError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(missing);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| RangeEditError::NotANumber(trimmed.to_string()))
}
