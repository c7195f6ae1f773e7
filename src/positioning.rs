//! Positioning-map aggregation.
//!
//! Each segment becomes one bubble positioned by the per-segment central
//! tendency of two axes. An axis is either a numeric variable (plain mean of
//! parsed values) or one specific categorical value (match ratio, scaled by
//! 100 so it reads as a percentage). Bubble radii follow a square-root scale
//! so that *area*, not radius, is proportional to segment size, and the axis
//! domains are padded so the largest bubble never clips the plotting area.
//! Overlay items run the same axis evaluation over their matching rows and
//! land on the same scales.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Dataset, normalize_categorical, parse_number},
    segment::Assignment,
};

/// A categorical axis choice: "ratio of rows whose `variable_id` equals
/// `choice_name`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSelection {
    pub variable_id: String,
    pub variable_name: String,
    pub choice_id: String,
    pub choice_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Mean of the variable's parsed numeric values.
    Numeric {
        variable_id: String,
        variable_name: String,
    },
    /// Match ratio against one categorical value, read as a percentage.
    Match(AxisSelection),
}

impl Axis {
    fn variable_id(&self) -> &str {
        match self {
            Axis::Numeric { variable_id, .. } => variable_id,
            Axis::Match(selection) => &selection.variable_id,
        }
    }

    fn is_match(&self) -> bool {
        matches!(self, Axis::Match(_))
    }

    /// Contribution of one cell to the axis sum. Unparseable numeric cells
    /// and non-matching categorical cells contribute zero.
    fn cell_value(&self, raw: &str) -> f64 {
        match self {
            Axis::Numeric { .. } => parse_number(raw).unwrap_or(0.0),
            Axis::Match(selection) => {
                if normalize_categorical(raw) == selection.choice_name {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Mean over a group, scaled to a percentage for match axes.
    fn mean(&self, sum: f64, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let mean = sum / count as f64;
        if self.is_match() { mean * 100.0 } else { mean }
    }
}

/// A category variable plus the choice values to plot as overlay markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySelection {
    pub variable_id: String,
    pub choice_names: Vec<String>,
}

/// Pixel geometry of the plotting area. `plot_size` is the smaller dimension
/// of the drawable region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    pub plot_size: f64,
    pub min_radius: f64,
    pub max_radius: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        // Radii follow the rendered chart: diameters of 5% and 50% of the
        // smaller plot dimension.
        Self {
            plot_size: 480.0,
            min_radius: 12.0,
            max_radius: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentBubble {
    pub id: u16,
    pub x: f64,
    pub y: f64,
    /// Row count of the segment.
    pub size: usize,
    /// Radius in pixels on the square-root scale.
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayMarker {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositioningPlot {
    pub bubbles: Vec<SegmentBubble>,
    pub overlays: Vec<OverlayMarker>,
    /// Padded axis domains the consumer should scale against.
    pub x_domain: (f64, f64),
    pub y_domain: (f64, f64),
}

fn sqrt_radius(size: usize, min_size: usize, max_size: usize, plot: &PlotConfig) -> f64 {
    let lo = (min_size as f64).sqrt();
    let hi = (max_size as f64).sqrt();
    if hi > lo {
        let t = ((size as f64).sqrt() - lo) / (hi - lo);
        plot.min_radius + t * (plot.max_radius - plot.min_radius)
    } else {
        (plot.min_radius + plot.max_radius) / 2.0
    }
}

/// Symmetric padding that reserves room for the largest bubble at either end
/// of an axis: `max_radius * span / (plot_size - 2 * max_radius)` in domain
/// units. A degenerate span falls back to a fixed pad so a single point still
/// has breathing room.
fn domain_padding(span: f64, plot: &PlotConfig) -> f64 {
    let usable = plot.plot_size - 2.0 * plot.max_radius;
    if span > 0.0 && usable > 0.0 {
        plot.max_radius * span / usable
    } else {
        5.0
    }
}

fn padded_domain(values: &[f64], is_match_axis: bool, plot: &PlotConfig) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 100.0);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = domain_padding(max - min, plot);
    let lower = (min - pad).max(0.0);
    let upper = if is_match_axis {
        (max + pad).min(100.0)
    } else {
        max + pad
    };
    (lower, upper)
}

/// Aggregates the positioning plot for one view. `rows` are the filtered row
/// indices, parallel to `assignment.segment_ids`.
pub fn build_positioning(
    dataset: &Dataset,
    rows: &[usize],
    assignment: &Assignment,
    x_axis: &Axis,
    y_axis: &Axis,
    overlay: Option<&OverlaySelection>,
    plot: &PlotConfig,
) -> Result<PositioningPlot> {
    if rows.len() != assignment.row_count() {
        bail!(
            "Assignment covers {} row(s) but {} were supplied",
            assignment.row_count(),
            rows.len()
        );
    }

    let x_column = dataset.column_index(x_axis.variable_id());
    let y_column = dataset.column_index(y_axis.variable_id());
    let cell = |row: usize, column: Option<usize>, axis: &Axis| -> f64 {
        // A stale axis variable contributes zero rather than failing.
        column.map_or(0.0, |col| axis.cell_value(dataset.value(row, col)))
    };

    let segment_count = assignment.segment_count as usize;
    let mut x_sums = vec![0.0f64; segment_count];
    let mut y_sums = vec![0.0f64; segment_count];
    for (position, &row) in rows.iter().enumerate() {
        let segment = assignment.segment_ids[position] as usize - 1;
        x_sums[segment] += cell(row, x_column, x_axis);
        y_sums[segment] += cell(row, y_column, y_axis);
    }

    let occupied: Vec<usize> = (0..segment_count)
        .filter(|&s| assignment.sizes[s] > 0)
        .collect();
    let min_size = occupied
        .iter()
        .map(|&s| assignment.sizes[s])
        .min()
        .unwrap_or(0);
    let max_size = occupied
        .iter()
        .map(|&s| assignment.sizes[s])
        .max()
        .unwrap_or(0);

    let bubbles: Vec<SegmentBubble> = occupied
        .iter()
        .map(|&s| {
            let size = assignment.sizes[s];
            SegmentBubble {
                id: (s + 1) as u16,
                x: x_axis.mean(x_sums[s], size),
                y: y_axis.mean(y_sums[s], size),
                size,
                radius: sqrt_radius(size, min_size, max_size, plot),
            }
        })
        .collect();

    let mut overlays = Vec::new();
    if let Some(selection) = overlay {
        if let Some(overlay_column) = dataset.column_index(&selection.variable_id) {
            for choice in &selection.choice_names {
                let matching: Vec<usize> = rows
                    .iter()
                    .copied()
                    .filter(|&row| {
                        normalize_categorical(dataset.value(row, overlay_column)) == *choice
                    })
                    .collect();
                if matching.is_empty() {
                    continue;
                }
                let x_sum: f64 = matching.iter().map(|&row| cell(row, x_column, x_axis)).sum();
                let y_sum: f64 = matching.iter().map(|&row| cell(row, y_column, y_axis)).sum();
                overlays.push(OverlayMarker {
                    name: choice.clone(),
                    x: x_axis.mean(x_sum, matching.len()),
                    y: y_axis.mean(y_sum, matching.len()),
                });
            }
        }
    }

    let all_x: Vec<f64> = bubbles
        .iter()
        .map(|b| b.x)
        .chain(overlays.iter().map(|m| m.x))
        .collect();
    let all_y: Vec<f64> = bubbles
        .iter()
        .map(|b| b.y)
        .chain(overlays.iter().map(|m| m.y))
        .collect();

    Ok(PositioningPlot {
        x_domain: padded_domain(&all_x, x_axis.is_match(), plot),
        y_domain: padded_domain(&all_y, y_axis.is_match(), plot),
        bubbles,
        overlays,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Assignment;

    fn dataset() -> Dataset {
        let rows = (0..10)
            .map(|i| {
                let gender = if i < 4 { "female" } else { "male" };
                vec![format!("{}", 20 + i), gender.to_string()]
            })
            .collect();
        Dataset::new(vec!["age".to_string(), "gender".to_string()], rows).expect("dataset")
    }

    fn match_axis(variable: &str, choice: &str) -> Axis {
        Axis::Match(AxisSelection {
            variable_id: variable.to_string(),
            variable_name: variable.to_string(),
            choice_id: "1".to_string(),
            choice_name: choice.to_string(),
        })
    }

    fn numeric_axis(variable: &str) -> Axis {
        Axis::Numeric {
            variable_id: variable.to_string(),
            variable_name: variable.to_string(),
        }
    }

    #[test]
    fn match_axis_reads_as_percentage() {
        // One segment of 10 rows with 4 matches: x must be 40, not 0.4.
        let data = dataset();
        let rows: Vec<usize> = (0..10).collect();
        let assignment = Assignment::from_ids(vec![1; 10], 1).expect("assignment");
        let plot = build_positioning(
            &data,
            &rows,
            &assignment,
            &match_axis("gender", "female"),
            &numeric_axis("age"),
            None,
            &PlotConfig::default(),
        )
        .expect("plot");

        assert_eq!(plot.bubbles.len(), 1);
        assert_eq!(plot.bubbles[0].x, 40.0);
        assert_eq!(plot.bubbles[0].y, 24.5); // mean of 20..=29
    }

    #[test]
    fn bubble_area_tracks_segment_size() {
        let data = dataset();
        let rows: Vec<usize> = (0..10).collect();
        // Segment 1 holds 2 rows, segment 2 holds 8.
        let ids = vec![1, 1, 2, 2, 2, 2, 2, 2, 2, 2];
        let assignment = Assignment::from_ids(ids, 2).expect("assignment");
        let config = PlotConfig::default();
        let plot = build_positioning(
            &data,
            &rows,
            &assignment,
            &numeric_axis("age"),
            &numeric_axis("age"),
            None,
            &config,
        )
        .expect("plot");

        let small = plot.bubbles.iter().find(|b| b.size == 2).expect("small");
        let large = plot.bubbles.iter().find(|b| b.size == 8).expect("large");
        assert_eq!(small.radius, config.min_radius);
        assert_eq!(large.radius, config.max_radius);
    }

    #[test]
    fn equal_sized_segments_share_one_radius() {
        let data = dataset();
        let rows: Vec<usize> = (0..10).collect();
        let ids = vec![1, 2, 1, 2, 1, 2, 1, 2, 1, 2];
        let assignment = Assignment::from_ids(ids, 2).expect("assignment");
        let plot = build_positioning(
            &data,
            &rows,
            &assignment,
            &numeric_axis("age"),
            &numeric_axis("age"),
            None,
            &PlotConfig::default(),
        )
        .expect("plot");
        assert_eq!(plot.bubbles[0].radius, plot.bubbles[1].radius);
    }

    #[test]
    fn overlay_markers_use_the_same_axis_semantics() {
        let data = dataset();
        let rows: Vec<usize> = (0..10).collect();
        let assignment = Assignment::from_ids(vec![1; 10], 1).expect("assignment");
        let overlay = OverlaySelection {
            variable_id: "gender".to_string(),
            choice_names: vec!["female".to_string(), "unseen".to_string()],
        };
        let plot = build_positioning(
            &data,
            &rows,
            &assignment,
            &numeric_axis("age"),
            &match_axis("gender", "female"),
            Some(&overlay),
            &PlotConfig::default(),
        )
        .expect("plot");

        // "unseen" matches no rows and is skipped.
        assert_eq!(plot.overlays.len(), 1);
        let marker = &plot.overlays[0];
        assert_eq!(marker.name, "female");
        assert_eq!(marker.x, 21.5); // mean of ages 20..=23
        assert_eq!(marker.y, 100.0); // all overlay rows match themselves
    }

    #[test]
    fn domains_are_padded_but_clamped_for_match_axes() {
        let data = dataset();
        let rows: Vec<usize> = (0..10).collect();
        let ids = vec![1, 1, 1, 1, 1, 2, 2, 2, 2, 2];
        let assignment = Assignment::from_ids(ids, 2).expect("assignment");
        let plot = build_positioning(
            &data,
            &rows,
            &assignment,
            &match_axis("gender", "female"),
            &numeric_axis("age"),
            None,
            &PlotConfig::default(),
        )
        .expect("plot");

        let (x_lo, x_hi) = plot.x_domain;
        assert!(x_lo >= 0.0);
        assert!(x_hi <= 100.0);
        let xs: Vec<f64> = plot.bubbles.iter().map(|b| b.x).collect();
        let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(x_lo <= x_min);
        assert!(x_hi >= x_max);

        // The numeric axis is padded beyond the observed maximum.
        let (y_lo, y_hi) = plot.y_domain;
        let ys: Vec<f64> = plot.bubbles.iter().map(|b| b.y).collect();
        let y_max = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(y_hi > y_max);
        assert!(y_lo >= 0.0);
    }

    #[test]
    fn empty_input_yields_default_domains() {
        let data = dataset();
        let assignment = Assignment::from_ids(Vec::new(), 3).expect("assignment");
        let plot = build_positioning(
            &data,
            &[],
            &assignment,
            &numeric_axis("age"),
            &numeric_axis("age"),
            None,
            &PlotConfig::default(),
        )
        .expect("plot");
        assert!(plot.bubbles.is_empty());
        assert_eq!(plot.x_domain, (0.0, 100.0));
    }
}
