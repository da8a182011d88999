use std::collections::BTreeSet;

use csv::{QuoteStyle, StringRecord, Terminator, Trim};
use thiserror::Error;

use super::model::{CellValue, DataRow, Dataset};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DecodeError {
    /// Nothing but blank lines.
    #[error("the file is empty")]
    Empty,

    #[error("the file has a header but no data rows")]
    HeaderOnly,

    #[error("the file is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("malformed CSV: {0}")]
    Malformed(#[from] csv::Error),
}

impl DecodeError {
    /// True when the input decoded cleanly but carries no data rows.
    pub fn is_no_data(&self) -> bool {
        matches!(self, DecodeError::Empty | DecodeError::HeaderOnly)
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("row {row} has no value for column '{column}'")]
    MissingColumn { row: usize, column: String },

    #[error("writing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("flushing CSV buffer: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoded CSV is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decode uploaded bytes into a [`Dataset`].
///
/// The first non-blank record is the header. Fields are trimmed, quoted
/// fields follow RFC 4180, short rows are padded with empty text and extra
/// fields are dropped. Blank and whitespace-only lines are skipped.
pub fn decode(bytes: &[u8]) -> Result<Dataset, DecodeError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)?;

    // Records end at `\n`; the `\r` of a `\r\n` ending is removed by the trim.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .terminator(Terminator::Any(b'\n'))
        .from_reader(text.as_bytes());

    let mut located = Vec::new();
    for result in reader.records() {
        let record = result?;
        let start = record.position().map_or(0, |p| p.byte() as usize);
        located.push((start, record));
    }

    // Each record's raw text runs up to where the next one starts.
    let ends: Vec<usize> = located
        .iter()
        .skip(1)
        .map(|(start, _)| *start)
        .chain([text.len()])
        .collect();

    let mut records = located
        .into_iter()
        .zip(ends)
        .filter(|((start, record), end)| !is_blank(record, text.get(*start..*end)))
        .map(|((_, record), _)| record);
    let header = records.next().ok_or(DecodeError::Empty)?;
    let headers: Vec<String> = header.iter().map(str::to_string).collect();
    let (columns, duplicate_columns) = collapse_duplicates(&headers);

    if !duplicate_columns.is_empty() {
        log::warn!("Duplicate CSV header names {duplicate_columns:?}; the last occurrence wins");
    }

    let rows: Vec<DataRow> = records.map(|record| decode_row(&headers, &record)).collect();
    if rows.is_empty() {
        return Err(DecodeError::HeaderOnly);
    }

    Ok(Dataset::new(columns, duplicate_columns, rows))
}

/// A record from a blank or whitespace-only line. The raw text decides, so a
/// quoted empty field (`""`) is a real record.
fn is_blank(record: &StringRecord, raw: Option<&str>) -> bool {
    record.len() == 1
        && record.get(0).is_some_and(str::is_empty)
        && raw.map_or(true, |line| line.trim().is_empty())
}

fn decode_row(headers: &[String], record: &StringRecord) -> DataRow {
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let field = record.get(idx).unwrap_or("");
            (header.as_str(), CellValue::from_field(field))
        })
        .collect()
}

/// Keep each header name at its first position; report names seen again.
fn collapse_duplicates(headers: &[String]) -> (Vec<String>, Vec<String>) {
    let mut seen = BTreeSet::new();
    let mut columns = Vec::with_capacity(headers.len());
    let mut duplicates = Vec::new();
    for h in headers {
        if seen.insert(h.as_str()) {
            columns.push(h.clone());
        } else if !duplicates.contains(h) {
            duplicates.push(h.clone());
        }
    }
    (columns, duplicates)
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encode `rows` restricted to `columns` as CSV text.
///
/// The header is quoted only where needed; every data field is quoted.
/// Lines are separated by `\n` with no trailing newline.
pub fn encode(rows: &[DataRow], columns: &[String]) -> Result<String, EncodeError> {
    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut header = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(columns)?;
    let buf = header.into_inner().map_err(|e| e.into_error())?;

    let mut body = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf);

    for (row_idx, row) in rows.iter().enumerate() {
        let fields = columns
            .iter()
            .map(|col| {
                row.get(col)
                    .map(CellValue::to_string)
                    .ok_or_else(|| EncodeError::MissingColumn {
                        row: row_idx,
                        column: col.clone(),
                    })
            })
            .collect::<Result<Vec<String>, EncodeError>>()?;
        body.write_record(&fields)?;
    }

    let buf = body.into_inner().map_err(|e| e.into_error())?;
    let mut text = String::from_utf8(buf)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Download name for an export of `original`: `sales.csv` → `sales_filtered.csv`.
pub fn export_file_name(original: &str, suffix: &str) -> String {
    let stem = match original.len().checked_sub(4) {
        Some(cut) if original.is_char_boundary(cut) && original[cut..].eq_ignore_ascii_case(".csv") => {
            &original[..cut]
        }
        _ => original,
    };
    format!("{stem}{suffix}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn decodes_simple_table() {
        let ds = decode(b"name,age\nJohn,30\nJane,25").unwrap();

        assert_eq!(ds.columns, cols(&["name", "age"]));
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].get("name"), Some(&text("John")));
        assert_eq!(ds.rows[0].get("age"), Some(&CellValue::Number(30.0)));
        assert_eq!(ds.rows[1].get("name"), Some(&text("Jane")));
        assert_eq!(ds.rows[1].get("age"), Some(&CellValue::Number(25.0)));
    }

    #[test]
    fn encodes_simple_table() {
        let ds = decode(b"name,age\nJohn,30\nJane,25").unwrap();
        let out = encode(&ds.rows, &ds.columns).unwrap();
        assert_eq!(out, "name,age\n\"John\",\"30\"\n\"Jane\",\"25\"");
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(matches!(decode(b""), Err(DecodeError::Empty)));
        assert!(matches!(decode(b"\n  \n\t\n"), Err(DecodeError::Empty)));
    }

    #[test]
    fn header_only_is_reported() {
        let err = decode(b"name,age\n\n").unwrap_err();
        assert!(matches!(err, DecodeError::HeaderOnly));
        assert!(err.is_no_data());
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let err = decode(b"name\n\xff\xfe").unwrap_err();
        assert!(matches!(err, DecodeError::Encoding(_)));
        assert!(!err.is_no_data());
    }

    #[test]
    fn skips_blank_lines_and_trims_fields() {
        let ds = decode(b"\n name , city \n\nJohn ,  New York \n   \r\nJane,Oslo\r\n").unwrap();
        assert_eq!(ds.columns, cols(&["name", "city"]));
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].get("city"), Some(&text("New York")));
        assert_eq!(ds.rows[1].get("name"), Some(&text("Jane")));
    }

    #[test]
    fn strips_utf8_bom() {
        let ds = decode(b"\xEF\xBB\xBFid\n1").unwrap();
        assert_eq!(ds.columns, cols(&["id"]));
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_truncated() {
        let ds = decode(b"a,b,c\n1\n1,2,3,4").unwrap();
        assert_eq!(ds.rows[0].get("b"), Some(&text("")));
        assert_eq!(ds.rows[0].get("c"), Some(&text("")));
        assert_eq!(ds.rows[1].len(), 3);
        assert_eq!(ds.rows[1].get("c"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn every_row_has_exactly_the_columns() {
        let ds = decode(b"b,a,b\n1\n1,2,3,4\nx,y,z").unwrap();
        let expected: BTreeSet<&str> = ds.columns.iter().map(String::as_str).collect();
        for row in &ds.rows {
            assert_eq!(row.keys().collect::<BTreeSet<_>>(), expected);
        }
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let ds = decode(b"name,city\n\"Doe, John\",\"New York\"").unwrap();
        assert_eq!(ds.rows[0].get("name"), Some(&text("Doe, John")));
        assert_eq!(ds.rows[0].get("city"), Some(&text("New York")));
    }

    #[test]
    fn quoted_numbers_are_still_numbers() {
        let ds = decode(b"n\n\"42\"").unwrap();
        assert_eq!(ds.rows[0].get("n"), Some(&CellValue::Number(42.0)));
    }

    #[test]
    fn signed_zeros_share_one_unique_value() {
        let ds = decode(b"n\n0\n-0").unwrap();
        assert_eq!(ds.unique_values["n"].len(), 1);
        assert_eq!(ds.rows[1].get("n"), Some(&CellValue::Number(0.0)));
    }

    #[test]
    fn duplicate_headers_are_flagged_and_last_wins() {
        let ds = decode(b"a,b,a\n1,2,3").unwrap();
        assert_eq!(ds.columns, cols(&["a", "b"]));
        assert_eq!(ds.duplicate_columns, cols(&["a"]));
        assert_eq!(ds.rows[0].get("a"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn round_trip_is_stable() {
        let input = b"name,age,city\nJohn,30,New York\nJane,25.5,\"Oslo, NO\"\nBob,,Paris";
        let first = decode(input).unwrap();
        let encoded = encode(&first.rows, &first.columns).unwrap();
        let second = decode(encoded.as_bytes()).unwrap();

        assert_eq!(second.columns, first.columns);
        assert_eq!(second.rows, first.rows);

        let again = encode(&second.rows, &second.columns).unwrap();
        assert_eq!(again, encoded);
    }

    #[test]
    fn quoted_empty_line_is_a_row() {
        let ds = decode(b"a\n\"\"\nx").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].get("a"), Some(&text("")));
        assert_eq!(ds.rows[1].get("a"), Some(&text("x")));
    }

    #[test]
    fn single_column_empty_cell_survives_round_trip() {
        let first = decode(b"a\n,\nx").unwrap();
        assert_eq!(first.len(), 2);

        let encoded = encode(&first.rows, &first.columns).unwrap();
        assert_eq!(encoded, "a\n\"\"\n\"x\"");

        let second = decode(encoded.as_bytes()).unwrap();
        assert_eq!(second.rows, first.rows);
    }

    #[test]
    fn blank_line_inside_quotes_is_kept() {
        let ds = decode(b"a,b\n\"x\n\ny\",1").unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.rows[0].get("a"), Some(&text("x\n\ny")));
        assert_eq!(ds.rows[0].get("b"), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn embedded_newlines_survive_round_trip() {
        let row = DataRow::from_iter([
            ("note", text("line one\n\nline three")),
            ("n", CellValue::Number(7.0)),
        ]);
        let columns = cols(&["note", "n"]);
        let encoded = encode(&[row.clone()], &columns).unwrap();

        let ds = decode(encoded.as_bytes()).unwrap();
        assert_eq!(ds.columns, columns);
        assert_eq!(ds.rows, vec![row]);
    }

    #[test]
    fn lone_carriage_return_does_not_end_a_record() {
        let ds = decode(b"name\nx\ry\r\nz").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].get("name"), Some(&text("x\ry")));
        assert_eq!(ds.rows[1].get("name"), Some(&text("z")));
    }

    #[test]
    fn encode_escapes_quotes_and_header_commas() {
        let row = DataRow::from_iter([("say, what", text("he said \"hi\""))]);
        let out = encode(&[row], &cols(&["say, what"])).unwrap();
        assert_eq!(out, "\"say, what\"\n\"he said \"\"hi\"\"\"");
    }

    #[test]
    fn encode_rejects_missing_column() {
        let row = DataRow::from_iter([("name", text("John"))]);
        let err = encode(&[row], &cols(&["name", "age"])).unwrap_err();
        match err {
            EncodeError::MissingColumn { row, column } => {
                assert_eq!(row, 0);
                assert_eq!(column, "age");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn encode_without_rows_is_header_only() {
        assert_eq!(encode(&[], &cols(&["a", "b"])).unwrap(), "a,b");
        assert_eq!(encode(&[], &[]).unwrap(), "");
    }

    #[test]
    fn export_name_replaces_extension() {
        assert_eq!(export_file_name("sales.csv", "_filtered"), "sales_filtered.csv");
        assert_eq!(export_file_name("SALES.CSV", "_filtered"), "SALES_filtered.csv");
        assert_eq!(export_file_name("data", "_filtered"), "data_filtered.csv");
        assert_eq!(export_file_name("a.csv.csv", "_x"), "a.csv_x.csv");
        assert_eq!(export_file_name("é.csv", "_f"), "é_f.csv");
    }
}
