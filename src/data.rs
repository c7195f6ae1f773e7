//! Dataset container and raw-value helpers.
//!
//! A [`Dataset`] is an ordered set of column headers plus rows of raw string
//! cells, immutable once constructed. Row identity is positional; there is no
//! primary key. Everything downstream (profiles, filters, aggregations) is
//! derived from this structure and recomputed on demand.

use anyhow::{Result, anyhow};

/// Sentinel spelled out in the source data for a missing response.
pub const MISSING: &str = "NA";

/// A cell is missing iff it is empty or carries the `NA` sentinel.
pub fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw == MISSING
}

/// Normalizes a raw cell for categorical treatment: empty collapses to the
/// literal `NA` category, everything else passes through untouched.
pub fn normalize_categorical(raw: &str) -> &str {
    if raw.is_empty() { MISSING } else { raw }
}

/// Parses a raw cell as a finite number. Missing cells and values that do not
/// parse (or parse to NaN/infinity) yield `None` rather than an error, so
/// filtering can degrade to exclusion.
pub fn parse_number(raw: &str) -> Option<f64> {
    if is_missing(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Builds a dataset from headers and raw rows, rejecting rows whose width
    /// does not match the header count.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = headers.len();
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(anyhow!(
                    "Row {} has {} field(s), expected {}",
                    idx + 1,
                    row.len(),
                    width
                ));
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Position of a variable id among the headers, if present.
    pub fn column_index(&self, variable_id: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == variable_id)
    }

    /// Raw cell value at (row, column). Out-of-bounds reads collapse to the
    /// empty string so callers can treat them as missing.
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// All raw values of one column, in row order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(column).map(String::as_str).unwrap_or(""))
    }

    /// Non-missing values of one column parsed as numbers, in row order.
    pub fn numeric_column_values(&self, column: usize) -> Vec<f64> {
        self.column_values(column).filter_map(parse_number).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_detection_covers_sentinel_and_empty() {
        assert!(is_missing(""));
        assert!(is_missing("NA"));
        assert!(!is_missing("0"));
        assert!(!is_missing("na"));
    }

    #[test]
    fn normalize_categorical_collapses_empty_to_na() {
        assert_eq!(normalize_categorical(""), "NA");
        assert_eq!(normalize_categorical("NA"), "NA");
        assert_eq!(normalize_categorical("female"), "female");
    }

    #[test]
    fn parse_number_rejects_missing_and_non_finite() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number(" 3.5 "), Some(3.5));
        assert_eq!(parse_number("NA"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn dataset_rejects_ragged_rows() {
        let headers = vec!["a".to_string(), "b".to_string()];
        let rows = vec![vec!["1".to_string()]];
        assert!(Dataset::new(headers, rows).is_err());
    }

    #[test]
    fn dataset_lookups_are_total() {
        let dataset = Dataset::new(
            vec!["age".to_string(), "gender".to_string()],
            vec![
                vec!["22".to_string(), "female".to_string()],
                vec!["NA".to_string(), String::new()],
            ],
        )
        .expect("dataset");

        assert_eq!(dataset.column_index("gender"), Some(1));
        assert_eq!(dataset.column_index("missing"), None);
        assert_eq!(dataset.value(0, 0), "22");
        assert_eq!(dataset.value(9, 9), "");
        assert_eq!(dataset.numeric_column_values(0), vec![22.0]);
    }
}
