//! Delimited-text ingestion.
//!
//! Measurement reports are semicolon-separated with a mandatory header row. Column types are
//! inferred from the content, reading numbers with the report's decimal separator:
//!
//! - every non-empty cell parses as an integer → [`DataType::Int64`]
//! - every non-empty cell parses as a finite decimal number → [`DataType::Float64`]
//! - otherwise → [`DataType::Utf8`] (columns with stray text land here until coerced)
//!
//! Cells spelling a non-finite number (`inf`, `NaN`) do not decide the type; they load as
//! nulls. Columns with no content at all are typed `Float64` and hold only nulls.

use std::io::Read;
use std::path::Path;

use crate::coercion::parse_decimal;
use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// A `csv` reader builder configured for measurement reports.
pub fn reader_builder(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.delimiter(delimiter).has_headers(true).flexible(true);
    builder
}

/// Ingest a delimited file into an in-memory [`DataSet`], inferring column types.
pub fn ingest_csv_from_path(
    path: impl AsRef<Path>,
    delimiter: u8,
    decimal: char,
) -> ProcessingResult<DataSet> {
    let mut rdr = reader_builder(delimiter).from_path(path)?;
    ingest_csv_from_reader(&mut rdr, decimal)
}

/// Ingest delimited data from an existing reader, inferring column types.
///
/// Short records are padded with nulls. A record with more fields than the header is
/// rejected. Numbers are read with `decimal` as decimal separator; point decimals are always
/// accepted.
pub fn ingest_csv_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    decimal: char,
) -> ProcessingResult<DataSet> {
    let headers = read_headers(rdr)?;

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(ProcessingError::SchemaMismatch {
                message: format!(
                    "row {} has {} fields but the header has {}",
                    row_idx0 + 2,
                    record.len(),
                    headers.len()
                ),
            });
        }
        let mut row: Vec<String> = record.iter().map(|s| s.trim().to_owned()).collect();
        row.resize(headers.len(), String::new());
        raw_rows.push(row);
    }

    let fields: Vec<Field> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Field::new(name.clone(), infer_type(&raw_rows, idx, decimal)))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(fields.iter())
                .map(|(raw, field)| inferred_value(raw, field.data_type, decimal))
                .collect()
        })
        .collect();

    Ok(DataSet::new(Schema::new(fields), rows))
}

fn read_headers<R: Read>(rdr: &mut csv::Reader<R>) -> ProcessingResult<Vec<String>> {
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(ProcessingError::SchemaMismatch {
            message: "input has no header row".to_string(),
        });
    }
    Ok(headers)
}

fn infer_type(rows: &[Vec<String>], idx: usize, decimal: char) -> DataType {
    let mut cells = rows
        .iter()
        .filter_map(|r| r.get(idx))
        .filter(|s| !s.is_empty() && !is_non_finite(s))
        .peekable();
    if cells.peek().is_none() {
        return DataType::Float64;
    }

    let mut all_int = true;
    for cell in cells {
        if all_int && cell.parse::<i64>().is_ok() {
            continue;
        }
        all_int = false;
        if parse_decimal(cell, decimal).is_none() {
            return DataType::Utf8;
        }
    }
    if all_int { DataType::Int64 } else { DataType::Float64 }
}

fn is_non_finite(cell: &str) -> bool {
    cell.parse::<f64>().is_ok_and(|v| !v.is_finite())
}

fn inferred_value(raw: String, data_type: DataType, decimal: char) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match data_type {
        DataType::Int64 => raw.parse().map(Value::Int64).unwrap_or(Value::Null),
        DataType::Float64 => parse_decimal(&raw, decimal)
            .map(Value::Float64)
            .unwrap_or(Value::Null),
        DataType::Utf8 => Value::Utf8(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::{ingest_csv_from_reader, reader_builder};
    use crate::types::{DataType, Value};

    #[test]
    fn infers_int_float_and_text_columns() {
        let input = "Num_Lote;T1_FineNS;x;T1_ResetCount;empty\n1;0.5;a;1,5;\n2;7;b;2;\n";
        let mut rdr = reader_builder(b';').from_reader(input.as_bytes());
        let ds = ingest_csv_from_reader(&mut rdr, '.').unwrap();

        let types: Vec<DataType> = ds.schema.fields.iter().map(|f| f.data_type).collect();
        assert_eq!(
            types,
            vec![
                DataType::Int64,
                DataType::Float64,
                DataType::Utf8,
                DataType::Utf8,
                DataType::Float64
            ]
        );
        assert_eq!(ds.rows[1][1], Value::Float64(7.0));
        assert_eq!(ds.rows[0][3], Value::Utf8("1,5".to_string()));
        assert_eq!(ds.rows[0][4], Value::Null);
    }

    #[test]
    fn short_rows_are_padded_long_rows_rejected() {
        let input = "a;b;c\n1;2\n";
        let mut rdr = reader_builder(b';').from_reader(input.as_bytes());
        let ds = ingest_csv_from_reader(&mut rdr, ',').unwrap();
        assert_eq!(ds.rows[0], vec![Value::Int64(1), Value::Int64(2), Value::Null]);

        let input = "a;b\n1;2;3\n";
        let mut rdr = reader_builder(b';').from_reader(input.as_bytes());
        let err = ingest_csv_from_reader(&mut rdr, ',').unwrap_err();
        assert!(err.to_string().contains("row 2 has 3 fields"));
    }

    #[test]
    fn byte_order_mark_is_stripped_from_header() {
        let input = "\u{feff}Timestamp_PC;Num_Lote\n10:00;1\n";
        let mut rdr = reader_builder(b';').from_reader(input.as_bytes());
        let ds = ingest_csv_from_reader(&mut rdr, ',').unwrap();
        assert_eq!(ds.schema.index_of("Timestamp_PC"), Some(0));
    }

    #[test]
    fn comma_decimals_infer_as_float_with_comma_separator() {
        let input = "T1_FineNS;T2_FineNS\n1,5;3,0\n0.25;abc\n";
        let mut rdr = reader_builder(b';').from_reader(input.as_bytes());
        let ds = ingest_csv_from_reader(&mut rdr, ',').unwrap();

        assert_eq!(ds.schema.fields[0].data_type, DataType::Float64);
        assert_eq!(ds.rows[0][0], Value::Float64(1.5));
        assert_eq!(ds.rows[1][0], Value::Float64(0.25));
        assert_eq!(ds.schema.fields[1].data_type, DataType::Utf8);
    }

    #[test]
    fn non_finite_cells_load_as_nulls_in_numeric_columns() {
        let input = "t1_nS;x\n0.5;inf\ninf;NaN\n1.5;\n";
        let mut rdr = reader_builder(b';').from_reader(input.as_bytes());
        let ds = ingest_csv_from_reader(&mut rdr, ',').unwrap();

        assert_eq!(ds.schema.fields[0].data_type, DataType::Float64);
        assert_eq!(
            ds.column(0).cloned().collect::<Vec<_>>(),
            vec![Value::Float64(0.5), Value::Null, Value::Float64(1.5)]
        );
        assert_eq!(ds.schema.fields[1].data_type, DataType::Float64);
        assert!(ds.column(1).all(|v| *v == Value::Null));
    }
}
