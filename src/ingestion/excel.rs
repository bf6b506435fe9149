#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Ingest one sheet of a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into an in-memory `DataSet`.
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - Detects the first non-empty row as the header row
/// - Infers column types the same way delimited ingestion does: all-integral numeric columns
///   become `Int64`, other numeric columns `Float64`, anything mixed or textual `Utf8`
pub fn ingest_excel_from_path(
    path: impl AsRef<Path>,
    sheet_name: Option<&str>,
) -> ProcessingResult<DataSet> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ProcessingError::SchemaMismatch {
                message: "workbook has no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    ingest_sheet_range(&sheet, &range)
}

fn ingest_sheet_range(sheet: &str, range: &calamine::Range<Data>) -> ProcessingResult<DataSet> {
    let mut rows_iter = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let headers: Vec<String> = rows_iter
        .next()
        .ok_or_else(|| ProcessingError::SchemaMismatch {
            message: format!("sheet '{sheet}' has no non-empty rows (no header row found)"),
        })?
        .iter()
        .map(|c| cell_to_string(c).trim().to_string())
        .collect();

    let cells: Vec<Vec<Data>> = rows_iter
        .map(|row| {
            let mut out = row.to_vec();
            out.resize(headers.len(), Data::Empty);
            out
        })
        .collect();

    let fields: Vec<Field> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Field::new(name.clone(), infer_type(&cells, idx)))
        .collect();

    let rows = cells
        .iter()
        .map(|row| {
            row.iter()
                .zip(fields.iter())
                .map(|(cell, field)| convert_cell(cell, field.data_type))
                .collect()
        })
        .collect();

    Ok(DataSet::new(Schema::new(fields), rows))
}

fn infer_type(rows: &[Vec<Data>], idx: usize) -> DataType {
    let mut all_int = true;
    let mut any = false;
    for cell in rows.iter().filter_map(|r| r.get(idx)) {
        match cell {
            Data::Empty => {}
            Data::Int(_) => any = true,
            Data::Float(f) => {
                any = true;
                if f.fract() != 0.0 {
                    all_int = false;
                }
            }
            _ => return DataType::Utf8,
        }
    }
    if any && all_int { DataType::Int64 } else { DataType::Float64 }
}

fn convert_cell(c: &Data, data_type: DataType) -> Value {
    match (c, data_type) {
        (Data::Empty, _) => Value::Null,
        (Data::Int(i), DataType::Int64) => Value::Int64(*i),
        (Data::Float(f), DataType::Int64) => Value::Int64(*f as i64),
        (Data::Int(i), DataType::Float64) => Value::Float64(*i as f64),
        (Data::Float(f), DataType::Float64) => Value::Float64(*f),
        (other, _) => {
            let s = cell_to_string(other);
            if s.trim().is_empty() {
                Value::Null
            } else {
                Value::Utf8(s)
            }
        }
    }
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
        Data::Empty => String::new(),
        _ => c.to_string(),
    }
}
