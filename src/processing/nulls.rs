//! Null-row elimination.

use tracing::debug;

use crate::types::{DataSet, Value};

/// Drop rows in which every cell is missing or blank.
///
/// The criterion is textual emptiness ([`Value::is_empty`]), so this is meant to run before
/// numeric coercion: a row holding only unparseable text is kept. Returns the filtered
/// dataset and the number of removed rows.
pub fn drop_empty_rows(dataset: &DataSet) -> (DataSet, usize) {
    let out = dataset.filter_rows(|row| !row.iter().all(Value::is_empty));
    let removed = dataset.row_count() - out.row_count();
    debug!(removed, remaining = out.row_count(), "empty rows dropped");
    (out, removed)
}
