//! Locale-aware numeric coercion.
//!
//! Measurement files write decimals with a comma (`1,5`). Coercion turns such text into an
//! `f64` one cell at a time; a malformed cell becomes [`Value::Null`] without affecting its
//! neighbours and without returning an error.

use tracing::debug;

use crate::types::{ColumnRole, DataSet, DataType, Field, Value};

/// Parse comma-decimal text into a number.
///
/// Every `,` is replaced by `.` before parsing, so `"1,5"` and `"1.5"` both give `1.5`.
/// Returns `None` for anything that does not parse (including blank text and thousands
/// grouping such as `"1.234,5"`). Non-finite results (`"inf"`, `"NaN"`) are rejected too.
pub fn coerce(raw: &str) -> Option<f64> {
    parse_decimal(raw, ',')
}

/// Parse text written with `decimal` as decimal separator.
///
/// Point-decimal text is accepted whatever `decimal` is. Only finite values are returned.
pub fn parse_decimal(raw: &str, decimal: char) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = if decimal == '.' {
        trimmed.parse::<f64>()
    } else {
        trimmed.replace(decimal, ".").parse::<f64>()
    };
    parsed.ok().filter(|v| v.is_finite())
}

/// Coerce a single cell.
///
/// - `Utf8` → `Float64`, or `Null` when the text is not a number
/// - `Int64` → `Float64`
/// - non-finite `Float64` → `Null`
/// - other `Float64` and `Null` are returned unchanged
pub fn coerce_value(value: &Value) -> Value {
    match value {
        Value::Utf8(s) => coerce(s).map(Value::Float64).unwrap_or(Value::Null),
        Value::Int64(v) => Value::Float64(*v as f64),
        Value::Float64(v) if !v.is_finite() => Value::Null,
        Value::Float64(_) | Value::Null => value.clone(),
    }
}

/// Render a number with `decimal` as decimal separator; the inverse of [`parse_decimal`].
///
/// Integral values keep a fractional part (`3,0`), so a reloaded column is still a float column.
pub fn to_locale_text(value: f64, decimal: char) -> String {
    let text = format!("{value:?}");
    if decimal == '.' {
        text
    } else {
        text.replace('.', &decimal.to_string())
    }
}

/// Coerce the named columns of `dataset` in place and retype them to [`DataType::Float64`].
///
/// Columns not present in the schema are skipped. Returns the number of cells that were
/// non-empty before coercion but invalid after it.
pub fn convert_decimal_format(dataset: &mut DataSet, columns: &[String]) -> usize {
    let mut invalid = 0usize;
    for column in columns {
        let Some(idx) = dataset.schema.index_of(column) else {
            continue;
        };
        let mut column_invalid = 0usize;
        for row in &mut dataset.rows {
            if let Some(cell) = row.get_mut(idx) {
                let coerced = coerce_value(cell);
                if matches!(coerced, Value::Null) && !cell.is_empty() {
                    column_invalid += 1;
                }
                *cell = coerced;
            }
        }
        if let Some(field) = dataset.schema.fields.get_mut(idx) {
            field.data_type = DataType::Float64;
        }
        if column_invalid > 0 {
            debug!(column = %column, invalid = column_invalid, "cells failed numeric coercion");
        }
        invalid += column_invalid;
    }
    invalid
}

/// Append (or overwrite) `target` with the coerced values of `source`, as a `Float64`
/// measurement column.
///
/// Returns `false`, leaving the dataset untouched, when `source` is absent.
pub fn derive_numeric_column(dataset: &mut DataSet, source: &str, target: &str) -> bool {
    let Some(src) = dataset.schema.index_of(source) else {
        debug!(source, target, "source column absent, nothing derived");
        return false;
    };
    let values: Vec<Value> = dataset.column(src).map(coerce_value).collect();

    match dataset.schema.index_of(target) {
        Some(idx) => {
            for (row, value) in dataset.rows.iter_mut().zip(values) {
                if let Some(cell) = row.get_mut(idx) {
                    *cell = value;
                }
            }
            if let Some(field) = dataset.schema.fields.get_mut(idx) {
                field.data_type = DataType::Float64;
            }
        }
        None => dataset.push_column(
            Field::new(target, DataType::Float64).with_role(ColumnRole::Measurement),
            values,
        ),
    }
    true
}
