//! Descriptive statistics over numeric columns.

use std::fmt;

use serde::Serialize;

use crate::types::{DataSet, Value};

/// Summary of the valid values of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    /// Column name.
    pub column: String,
    /// Number of non-null cells.
    pub valid_count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation (n - 1). `None` with fewer than two valid values.
    pub std: Option<f64>,
    pub median: f64,
}

/// Statistics for every numeric column of a dataset, in column order.
///
/// Columns without a single valid value have no entry in [`Self::columns`]; their names are
/// listed in [`Self::empty_columns`] instead, so the omission is visible to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub columns: Vec<ColumnStatistics>,
    pub empty_columns: Vec<String>,
}

impl StatisticsReport {
    /// Statistics for `column`, if it was numeric and had valid values.
    pub fn get(&self, column: &str) -> Option<&ColumnStatistics> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Number of reported columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// `true` if no column had valid values.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<24} {:>8} {:>14} {:>14} {:>14} {:>14}",
            "column", "valid", "min", "max", "mean", "std"
        )?;
        for c in &self.columns {
            let std = c.std.map(|s| format!("{s:.2}")).unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:<24} {:>8} {:>14.2} {:>14.2} {:>14.2} {:>14}",
                c.column, c.valid_count, c.min, c.max, c.mean, std
            )?;
        }
        for name in &self.empty_columns {
            writeln!(f, "{name:<24} {:>8}", 0)?;
        }
        Ok(())
    }
}

/// Compute [`ColumnStatistics`] for every numeric column of `dataset`.
///
/// Null cells are excluded from every aggregate: a column with three valid and two null cells
/// reports `valid_count == 3` and a mean over those three values. Text columns are not
/// considered; coerce them first (see [`crate::coercion::convert_decimal_format`]).
pub fn compute_statistics(dataset: &DataSet) -> StatisticsReport {
    let mut report = StatisticsReport::default();
    for (idx, field) in dataset.schema.fields.iter().enumerate() {
        if !field.data_type.is_numeric() {
            continue;
        }
        let values: Vec<f64> = dataset.column(idx).filter_map(Value::as_f64).collect();
        match summarize(&field.name, values) {
            Some(stats) => report.columns.push(stats),
            None => report.empty_columns.push(field.name.clone()),
        }
    }
    report
}

fn summarize(column: &str, mut values: Vec<f64>) -> Option<ColumnStatistics> {
    let (count, min, max, sum) = values.iter().fold(
        (0usize, f64::INFINITY, f64::NEG_INFINITY, 0.0f64),
        |(n, lo, hi, sum), &v| (n + 1, lo.min(v), hi.max(v), sum + v),
    );
    if count == 0 {
        return None;
    }

    let mean = (sum / count as f64).clamp(min, max);
    let std = (count > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    values.sort_by(f64::total_cmp);
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };

    Some(ColumnStatistics {
        column: column.to_string(),
        valid_count: count,
        min,
        max,
        mean,
        std,
        median,
    })
}

#[cfg(test)]
mod tests {
    use super::compute_statistics;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn dataset_with_invalid_cells() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("Num_Lote", DataType::Int64),
            Field::new("T1_FineNS", DataType::Float64),
            Field::new("T2_FineNS", DataType::Float64),
            Field::new("Timestamp_PC", DataType::Utf8),
        ]);
        let rows = vec![
            vec![Value::Int64(1), Value::Float64(2.0), Value::Null, Value::Utf8("a".into())],
            vec![Value::Int64(1), Value::Null, Value::Null, Value::Utf8("b".into())],
            vec![Value::Int64(1), Value::Float64(4.0), Value::Null, Value::Utf8("c".into())],
            vec![Value::Int64(1), Value::Null, Value::Null, Value::Utf8("d".into())],
            vec![Value::Int64(1), Value::Float64(9.0), Value::Null, Value::Utf8("e".into())],
        ];
        DataSet::new(schema, rows)
    }

    #[test]
    fn invalid_cells_are_excluded_from_aggregates() {
        let report = compute_statistics(&dataset_with_invalid_cells());
        let s = report.get("T1_FineNS").unwrap();

        assert_eq!(s.valid_count, 3);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.median, 4.0);
        let std = s.std.unwrap();
        assert!((std - 13.0f64.sqrt()).abs() < 1e-12, "std={std}");
    }

    #[test]
    fn fully_invalid_columns_are_listed_separately() {
        let report = compute_statistics(&dataset_with_invalid_cells());
        assert!(report.get("T2_FineNS").is_none());
        assert_eq!(report.empty_columns, vec!["T2_FineNS".to_string()]);
        // Text columns are not numeric and appear nowhere.
        assert!(report.get("Timestamp_PC").is_none());
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn single_value_has_no_std() {
        let report = compute_statistics(&dataset_with_invalid_cells());
        let lote = report.get("Num_Lote").unwrap();
        assert_eq!(lote.valid_count, 5);
        assert_eq!(lote.std, Some(0.0));

        let schema = Schema::new(vec![Field::new("x", DataType::Float64)]);
        let ds = DataSet::new(schema, vec![vec![Value::Float64(1.25)]]);
        let report = compute_statistics(&ds);
        assert_eq!(report.get("x").unwrap().std, None);
        assert_eq!(report.get("x").unwrap().median, 1.25);
    }

    #[test]
    fn mean_lies_between_min_and_max() {
        let schema = Schema::new(vec![Field::new("x", DataType::Float64)]);
        let rows = [0.1, 0.1, 0.1, 0.7, -3.3, 1e6]
            .iter()
            .map(|v| vec![Value::Float64(*v)])
            .collect();
        let report = compute_statistics(&DataSet::new(schema, rows));
        let s = report.get("x").unwrap();
        assert!(s.min <= s.mean && s.mean <= s.max);
        assert_eq!(s.median, 0.1);
    }

    #[test]
    fn display_renders_one_line_per_column() {
        let report = compute_statistics(&dataset_with_invalid_cells());
        let text = report.to_string();
        assert!(text.contains("T1_FineNS"));
        assert!(text.contains("5.00"));
        assert_eq!(text.lines().count(), 1 + 2 + 1);
    }
}
