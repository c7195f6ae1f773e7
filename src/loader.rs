//! CSV loading adapter.
//!
//! The analysis pipeline itself has no file-format boundary; this module is
//! the collaborator that turns a delimited text file into an in-memory
//! [`Dataset`]. It resolves the delimiter from the file extension (`.tsv` →
//! tab, anything else → comma) with manual override, and decodes input
//! through `encoding_rs`, defaulting to UTF-8.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::info;

use crate::data::Dataset;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Decodes one field verbatim. Whitespace is preserved: padding can be a
/// deliberate part of a categorical value, and numeric parsing trims on its
/// own at parse time.
fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Loads a headered CSV/TSV file into a [`Dataset`].
pub fn load_dataset(
    path: &Path,
    delimiter: Option<u8>,
    encoding_label: Option<&str>,
) -> Result<Dataset> {
    let delimiter = resolve_delimiter(path, delimiter);
    let encoding = resolve_encoding(encoding_label)?;

    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(BufReader::new(file));

    let headers = decode_record(&reader.byte_headers()?.clone(), encoding)
        .with_context(|| format!("Decoding headers of {path:?}"))?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(decoded);
    }

    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        rows.len(),
        headers.len(),
        path
    );
    Dataset::new(headers, rows).with_context(|| format!("Validating rows of {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn resolve_delimiter_prefers_override_then_extension() {
        assert_eq!(resolve_delimiter(Path::new("a.tsv"), None), b'\t');
        assert_eq!(resolve_delimiter(Path::new("a.csv"), None), b',');
        assert_eq!(resolve_delimiter(Path::new("a.txt"), None), b',');
        assert_eq!(resolve_delimiter(Path::new("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn resolve_encoding_defaults_to_utf8() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(resolve_encoding(Some("shift_jis")).unwrap().name(), "Shift_JIS");
        assert!(resolve_encoding(Some("no-such-encoding")).is_err());
    }

    #[test]
    fn load_dataset_keeps_fields_verbatim() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "age,gender").unwrap();
        writeln!(file, " 22 ,\" padded \"").unwrap();
        writeln!(file, "NA,").unwrap();

        let dataset = load_dataset(file.path(), None, None).expect("load");
        assert_eq!(dataset.headers(), ["age", "gender"]);
        assert_eq!(dataset.row_count(), 2);
        // Padding survives; numeric parsing tolerates it downstream.
        assert_eq!(dataset.value(0, 0), " 22 ");
        assert_eq!(dataset.value(0, 1), " padded ");
        assert_eq!(crate::data::parse_number(dataset.value(0, 0)), Some(22.0));
        assert_eq!(dataset.value(1, 1), "");
    }

    #[test]
    fn load_dataset_rejects_ragged_input() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "a,b").unwrap();
        writeln!(file, "1,2,3").unwrap();

        assert!(load_dataset(file.path(), None, None).is_err());
    }
}
