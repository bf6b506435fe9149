//! Min-max normalization.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{ColumnRole, DataSet, DataType, Field, Value};

/// Default suffix for appended normalized columns.
pub const NORMALIZED_SUFFIX: &str = "_normalized";

/// Which numeric columns [`normalize`] rescales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeScope {
    /// Every numeric column, including identifier and index columns.
    #[default]
    AllNumeric,
    /// Only columns with the [`ColumnRole::Measurement`] role.
    MeasurementsOnly,
}

/// Append a `<column><suffix>` column with values rescaled to `[0, 1]` for every numeric
/// column selected by `scope`.
///
/// Min and max are taken over valid cells only; invalid cells stay [`Value::Null`] in the
/// output. Columns whose valid values are all equal (or that have none) are skipped, so no
/// constant or NaN column is produced. Originals are kept unchanged, and columns appended by
/// this call are not themselves normalized. Returns the names of the appended columns.
pub fn normalize(dataset: &mut DataSet, scope: NormalizeScope, suffix: &str) -> Vec<String> {
    let candidates: Vec<(usize, String)> = dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| selected(f, scope))
        .map(|(idx, f)| (idx, f.name.clone()))
        .collect();

    let mut appended = Vec::new();
    for (idx, name) in candidates {
        let Some((min, max)) = min_max(dataset, idx) else {
            debug!(column = %name, "no valid values, not normalized");
            continue;
        };
        if max == min {
            debug!(column = %name, value = min, "constant column, not normalized");
            continue;
        }

        let range = max - min;
        let values: Vec<Value> = dataset
            .column(idx)
            .map(|v| match v.as_f64() {
                Some(x) => Value::Float64((x - min) / range),
                None => Value::Null,
            })
            .collect();

        let out_name = format!("{name}{suffix}");
        dataset.push_column(
            Field::new(out_name.clone(), DataType::Float64).with_role(ColumnRole::Measurement),
            values,
        );
        appended.push(out_name);
    }
    appended
}

fn selected(field: &Field, scope: NormalizeScope) -> bool {
    field.data_type.is_numeric()
        && match scope {
            NormalizeScope::AllNumeric => true,
            NormalizeScope::MeasurementsOnly => field.role == ColumnRole::Measurement,
        }
}

fn min_max(dataset: &DataSet, idx: usize) -> Option<(f64, f64)> {
    dataset
        .column(idx)
        .filter_map(Value::as_f64)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::{normalize, NormalizeScope, NORMALIZED_SUFFIX};
    use crate::types::{ColumnRole, DataSet, DataType, Field, Schema, Value};

    fn sample_dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("T1_Index", DataType::Int64).with_role(ColumnRole::Index),
            Field::new("T1_FineNS", DataType::Float64).with_role(ColumnRole::Measurement),
            Field::new("T2_FineNS", DataType::Float64).with_role(ColumnRole::Measurement),
            Field::new("Timestamp_PC", DataType::Utf8),
        ]);
        DataSet::new(
            schema,
            vec![
                vec![
                    Value::Int64(10),
                    Value::Float64(2.0),
                    Value::Float64(1.0),
                    Value::Utf8("a".to_string()),
                ],
                vec![
                    Value::Int64(20),
                    Value::Null,
                    Value::Float64(1.0),
                    Value::Utf8("b".to_string()),
                ],
                vec![
                    Value::Int64(30),
                    Value::Float64(6.0),
                    Value::Float64(1.0),
                    Value::Utf8("c".to_string()),
                ],
                vec![
                    Value::Int64(40),
                    Value::Float64(4.0),
                    Value::Float64(1.0),
                    Value::Utf8("d".to_string()),
                ],
            ],
        )
    }

    #[test]
    fn rescales_to_unit_interval_and_skips_constant_columns() {
        let mut ds = sample_dataset();
        let original = ds.clone();

        let appended = normalize(&mut ds, NormalizeScope::AllNumeric, NORMALIZED_SUFFIX);

        assert_eq!(appended, vec!["T1_Index_normalized", "T1_FineNS_normalized"]);
        assert_eq!(ds.schema.index_of("T2_FineNS_normalized"), None);

        let idx = ds.schema.index_of("T1_FineNS_normalized").unwrap();
        let col: Vec<&Value> = ds.column(idx).collect();
        assert_eq!(
            col,
            vec![
                &Value::Float64(0.0),
                &Value::Null,
                &Value::Float64(1.0),
                &Value::Float64(0.5)
            ]
        );

        // Originals retained.
        for (row, orig) in ds.rows.iter().zip(&original.rows) {
            assert_eq!(&row[..4], orig.as_slice());
        }
    }

    #[test]
    fn measurements_only_scope_leaves_index_alone() {
        let mut ds = sample_dataset();
        let appended = normalize(&mut ds, NormalizeScope::MeasurementsOnly, "_norm");
        assert_eq!(appended, vec!["T1_FineNS_norm"]);
        assert_eq!(ds.column_count(), 5);
    }

    #[test]
    fn outputs_stay_within_bounds() {
        let schema = Schema::new(vec![Field::new("x", DataType::Float64)]);
        let values = [3.5, -2.0, 7.25, 0.0, 7.25, -2.0, 1.0];
        let rows = values.iter().map(|v| vec![Value::Float64(*v)]).collect();
        let mut ds = DataSet::new(schema, rows);

        normalize(&mut ds, NormalizeScope::AllNumeric, NORMALIZED_SUFFIX);

        let normalized: Vec<f64> = ds.column(1).filter_map(Value::as_f64).collect();
        assert_eq!(normalized.len(), values.len());
        assert!(normalized.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(normalized[1], 0.0);
        assert_eq!(normalized[2], 1.0);
    }

    #[test]
    fn constant_column_produces_nothing() {
        let schema = Schema::new(vec![Field::new("c", DataType::Float64)]);
        let mut ds = DataSet::new(schema, vec![vec![Value::Float64(1.0)]; 3]);
        let appended = normalize(&mut ds, NormalizeScope::AllNumeric, NORMALIZED_SUFFIX);
        assert!(appended.is_empty());
        assert_eq!(ds.column_count(), 1);
    }

    #[test]
    fn all_null_column_is_skipped() {
        let schema = Schema::new(vec![Field::new("n", DataType::Float64)]);
        let mut ds = DataSet::new(schema, vec![vec![Value::Null]; 2]);
        assert!(normalize(&mut ds, NormalizeScope::AllNumeric, NORMALIZED_SUFFIX).is_empty());
    }

    #[test]
    fn infinite_cells_are_invalid_not_bounds() {
        let schema = Schema::new(vec![Field::new("t1_nS", DataType::Float64)]);
        let rows = [0.5, f64::INFINITY, 1.5, f64::NAN]
            .iter()
            .map(|v| vec![Value::Float64(*v)])
            .collect();
        let mut ds = DataSet::new(schema, rows);

        normalize(&mut ds, NormalizeScope::AllNumeric, NORMALIZED_SUFFIX);

        let col: Vec<&Value> = ds.column(1).collect();
        assert_eq!(
            col,
            vec![
                &Value::Float64(0.0),
                &Value::Null,
                &Value::Float64(1.0),
                &Value::Null
            ]
        );
    }
}
