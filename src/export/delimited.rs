use crate::coercion::to_locale_text;
use crate::error::ProcessingResult;
use crate::types::{DataSet, Value};

use super::ExportOptions;

/// Render `dataset` as delimited text.
///
/// The header row lists column names in schema order. Floats use `options.decimal` as decimal
/// separator, nulls become empty fields, and no row index column is written.
pub fn render_delimited(dataset: &DataSet, options: &ExportOptions) -> ProcessingResult<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(Vec::new());

    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(|v| cell_text(v, options.decimal)))?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

fn cell_text(value: &Value, decimal: char) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int64(v) => v.to_string(),
        Value::Float64(v) if !v.is_finite() => String::new(),
        Value::Float64(v) => to_locale_text(*v, decimal),
        Value::Utf8(s) => s.clone(),
    }
}
