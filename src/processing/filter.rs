//! Row filtering for [`crate::types::DataSet`].
//!
//! Two fixed filters exist: batch-id equality on the identifier column and an inclusive
//! index range on the index column. Both preserve row order and never fail on an empty
//! result.

use tracing::debug;

use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, ProcessingResult};
use crate::pipeline::PipelineParams;
use crate::types::{DataSet, Value};

/// Returns a new [`DataSet`] containing only rows for which `predicate` returns `true`.
///
/// This is a convenience wrapper around [`DataSet::filter_rows`].
pub fn filter<F>(dataset: &DataSet, predicate: F) -> DataSet
where
    F: FnMut(&[Value]) -> bool,
{
    dataset.filter_rows(predicate)
}

/// Keep rows whose `column` value equals `batch_id`.
///
/// The comparison is numeric: `Int64(1)` and `Float64(1.0)` both match `1`. Text and null
/// cells never match.
///
/// # Errors
///
/// [`ProcessingError::SchemaMismatch`] if `column` is not in the schema.
pub fn filter_by_batch(dataset: &DataSet, column: &str, batch_id: i64) -> ProcessingResult<DataSet> {
    let idx = column_index(dataset, column)?;
    let out = filter(dataset, |row| {
        row.get(idx).is_some_and(|v| numeric_eq(v, batch_id))
    });
    debug!(column, batch_id, before = dataset.row_count(), after = out.row_count(), "batch filter");
    Ok(out)
}

/// Keep rows whose `column` value lies within the given bounds (both inclusive).
///
/// A `None` bound is not applied. The lower bound is applied before the upper bound.
///
/// # Errors
///
/// [`ProcessingError::SchemaMismatch`] if a bound is set and `column` is not in the schema.
pub fn filter_by_index_range(
    dataset: &DataSet,
    column: &str,
    min_index: Option<i64>,
    max_index: Option<i64>,
) -> ProcessingResult<DataSet> {
    if min_index.is_none() && max_index.is_none() {
        return Ok(dataset.clone());
    }
    let idx = column_index(dataset, column)?;

    let mut out = dataset.clone();
    if let Some(min) = min_index {
        out = filter(&out, |row| {
            row.get(idx).and_then(Value::as_f64).is_some_and(|v| v >= min as f64)
        });
    }
    if let Some(max) = max_index {
        out = filter(&out, |row| {
            row.get(idx).and_then(Value::as_f64).is_some_and(|v| v <= max as f64)
        });
    }
    debug!(
        column,
        ?min_index,
        ?max_index,
        before = dataset.row_count(),
        after = out.row_count(),
        "index range filter"
    );
    Ok(out)
}

/// Apply the batch filter and then the index range filter described by `params`.
///
/// Identifier and index column names come from `config`. A `0` parameter disables its filter.
pub fn filter_records(
    dataset: &DataSet,
    config: &ProcessingConfig,
    params: &PipelineParams,
) -> ProcessingResult<DataSet> {
    let by_batch = match enabled(params.lote_number) {
        Some(id) => filter_by_batch(dataset, &config.identifier_column, id)?,
        None => dataset.clone(),
    };
    filter_by_index_range(
        &by_batch,
        &config.index_column,
        enabled(params.min_index),
        enabled(params.max_index),
    )
}

/// Map the `0 = disabled` parameter convention onto an optional bound.
pub fn enabled(value: u64) -> Option<i64> {
    if value == 0 {
        None
    } else {
        Some(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

fn numeric_eq(value: &Value, target: i64) -> bool {
    match value {
        Value::Int64(v) => *v == target,
        Value::Float64(v) => *v == target as f64,
        Value::Null | Value::Utf8(_) => false,
    }
}

fn column_index(dataset: &DataSet, column: &str) -> ProcessingResult<usize> {
    dataset
        .schema
        .index_of(column)
        .ok_or_else(|| ProcessingError::missing_column(column))
}
