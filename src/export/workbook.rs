use rust_xlsxwriter::Workbook;

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, Value};

use super::ExportOptions;

/// Render `dataset` as a single-sheet `.xlsx` workbook.
///
/// Row 0 holds the column names. Numbers are written as native numeric cells (no locale
/// substitution), text as strings, and nulls are left blank. No row index column is written.
pub fn render_workbook(dataset: &DataSet, options: &ExportOptions) -> ProcessingResult<Vec<u8>> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(&options.sheet_name)?;

    for (col, name) in dataset.schema.field_names().enumerate() {
        ws.write_string(0, column_number(col)?, name)?;
    }

    for (row_idx0, row) in dataset.rows.iter().enumerate() {
        let row_num = u32::try_from(row_idx0 + 1).map_err(|_| too_large("rows", row_idx0 + 1))?;
        for (col, value) in row.iter().enumerate() {
            let col_num = column_number(col)?;
            match value {
                Value::Null => {}
                Value::Int64(v) => {
                    ws.write_number(row_num, col_num, *v as f64)?;
                }
                Value::Float64(v) if v.is_finite() => {
                    ws.write_number(row_num, col_num, *v)?;
                }
                Value::Float64(_) => {}
                Value::Utf8(s) => {
                    ws.write_string(row_num, col_num, s)?;
                }
            }
        }
    }

    Ok(wb.save_to_buffer()?)
}

fn column_number(col: usize) -> ProcessingResult<u16> {
    u16::try_from(col).map_err(|_| too_large("columns", col + 1))
}

fn too_large(what: &str, n: usize) -> ProcessingError {
    ProcessingError::SchemaMismatch {
        message: format!("too many {what} for a workbook ({n})"),
    }
}
