//! Step-by-step processing for scripts and notebooks.
//!
//! [`DataProcessor`] holds one loaded table plus a working copy. Every mutating call operates
//! on the working copy, which is created from the loaded table on first use, so a caller can
//! chain `filter_by_batch` → `convert_decimal_format` → `calculate_statistics` and export the
//! result at any point.

use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::coercion;
use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, ProcessingResult};
use crate::export::{self, ExportOptions};
use crate::ingestion::{load_from_path, LoadFormat, LoadOptions};
use crate::processing::{self, StatisticsReport};
use crate::types::{DataSet, Value};

/// Shape of the current table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub row_count: usize,
    pub column_count: usize,
    pub column_names: Vec<String>,
    /// Approximate in-memory size of the table, in bytes.
    pub memory_estimate: usize,
    /// First non-empty value of the timestamp column, if the table has one.
    pub first_timestamp: Option<String>,
}

impl Summary {
    fn of(ds: &DataSet, timestamp_column: &str) -> Self {
        Self {
            row_count: ds.row_count(),
            column_count: ds.column_count(),
            column_names: ds.schema.field_names().map(str::to_string).collect(),
            memory_estimate: estimate_memory(ds),
            first_timestamp: first_timestamp(ds, timestamp_column),
        }
    }

    /// [`Summary::memory_estimate`] in mebibytes.
    pub fn memory_mb(&self) -> f64 {
        self.memory_estimate as f64 / (1024.0 * 1024.0)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rows:    {}", self.row_count)?;
        writeln!(f, "columns: {}", self.column_count)?;
        writeln!(f, "memory:  {:.3} MB", self.memory_mb())?;
        if let Some(ts) = &self.first_timestamp {
            writeln!(f, "first:   {ts}")?;
        }
        for name in &self.column_names {
            writeln!(f, "  - {name}")?;
        }
        Ok(())
    }
}

/// Scripting-style façade over loading, processing and export.
#[derive(Debug)]
pub struct DataProcessor {
    path: PathBuf,
    delimiter: u8,
    config: ProcessingConfig,
    loaded: Option<DataSet>,
    current: Option<DataSet>,
}

impl DataProcessor {
    /// Create a processor for the file at `path`. Nothing is read until [`DataProcessor::load`].
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
            config: ProcessingConfig::default(),
            loaded: None,
            current: None,
        }
    }

    /// Use `config` for column names, numeric columns and export separators.
    pub fn with_config(mut self, config: ProcessingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. Replaces any previously loaded table and discards the working copy.
    ///
    /// Files with a workbook extension are read as workbooks; anything else, including files
    /// without an extension, as delimited text.
    pub fn load(&mut self) -> ProcessingResult<&DataSet> {
        let options = LoadOptions {
            format: Some(LoadFormat::from_path(&self.path)),
            delimiter: self.delimiter,
            decimal: self.config.decimal_separator,
            ..LoadOptions::default()
        };
        let ds = load_from_path(&self.path, &options, &self.config)?;
        self.current = None;
        Ok(self.loaded.insert(ds))
    }

    /// The working copy if one exists, otherwise the loaded table.
    pub fn data(&self) -> Option<&DataSet> {
        self.current.as_ref().or(self.loaded.as_ref())
    }

    /// Discard the working copy; the next call starts again from the loaded table.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Keep rows of batch `batch_id`. An empty result is not an error.
    pub fn filter_by_batch(&mut self, batch_id: i64) -> ProcessingResult<&DataSet> {
        let column = self.config.identifier_column.clone();
        self.replace_with(|ds| processing::filter_by_batch(ds, &column, batch_id))
    }

    /// Keep rows whose index lies in the inclusive range. `None` leaves that side open.
    pub fn filter_by_index_range(
        &mut self,
        min_index: Option<i64>,
        max_index: Option<i64>,
    ) -> ProcessingResult<&DataSet> {
        let column = self.config.index_column.clone();
        self.replace_with(|ds| processing::filter_by_index_range(ds, &column, min_index, max_index))
    }

    /// Drop rows whose cells are all empty. Returns the number of rows removed.
    pub fn remove_empty_rows(&mut self) -> ProcessingResult<usize> {
        let current = self.current_mut()?;
        let (kept, removed) = processing::drop_empty_rows(current);
        *current = kept;
        Ok(removed)
    }

    /// Coerce the configured numeric columns. Returns the number of cells that became invalid.
    pub fn convert_decimal_format(&mut self) -> ProcessingResult<usize> {
        let columns = self.config.numeric_columns.clone();
        let current = self.current_mut()?;
        Ok(coercion::convert_decimal_format(current, &columns))
    }

    /// Append min-max normalized columns. Returns their names.
    pub fn normalize_numeric_columns(&mut self) -> ProcessingResult<Vec<String>> {
        let scope = self.config.normalize_scope;
        let suffix = self.config.normalized_suffix.clone();
        let current = self.current_mut()?;
        Ok(processing::normalize(current, scope, &suffix))
    }

    /// Statistics over the numeric columns of the current table.
    pub fn calculate_statistics(&self) -> ProcessingResult<StatisticsReport> {
        Ok(processing::compute_statistics(self.require()?))
    }

    /// Write the current table as delimited text.
    pub fn export_delimited(&self, path: impl AsRef<Path>) -> ProcessingResult<()> {
        export::export_delimited(self.require()?, path, &ExportOptions::from_config(&self.config))
    }

    /// Write the current table as an `.xlsx` workbook.
    pub fn export_workbook(&self, path: impl AsRef<Path>) -> ProcessingResult<()> {
        export::export_workbook(self.require()?, path, &ExportOptions::from_config(&self.config))
    }

    pub fn get_summary(&self) -> ProcessingResult<Summary> {
        let summary = Summary::of(self.require()?, &self.config.timestamp_column);
        info!(
            rows = summary.row_count,
            columns = summary.column_count,
            memory_mb = summary.memory_mb(),
            "summary"
        );
        Ok(summary)
    }

    fn require(&self) -> ProcessingResult<&DataSet> {
        self.data().ok_or(ProcessingError::NotLoaded)
    }

    fn current_mut(&mut self) -> ProcessingResult<&mut DataSet> {
        let loaded = self.loaded.as_ref().ok_or(ProcessingError::NotLoaded)?;
        Ok(self.current.get_or_insert_with(|| loaded.clone()))
    }

    fn replace_with<F>(&mut self, f: F) -> ProcessingResult<&DataSet>
    where
        F: FnOnce(&DataSet) -> ProcessingResult<DataSet>,
    {
        let current = self.current_mut()?;
        *current = f(current)?;
        Ok(current)
    }
}

fn first_timestamp(ds: &DataSet, column: &str) -> Option<String> {
    let idx = ds.schema.index_of(column)?;
    ds.column(idx).find(|v| !v.is_empty()).map(|v| match v {
        Value::Utf8(s) => s.clone(),
        Value::Int64(n) => n.to_string(),
        Value::Float64(x) => x.to_string(),
        Value::Null => String::new(),
    })
}

fn estimate_memory(ds: &DataSet) -> usize {
    let header: usize = ds.schema.field_names().map(str::len).sum();
    ds.reduce_rows(header, |acc, row| {
        acc + mem::size_of::<Vec<Value>>()
            + row
                .iter()
                .map(|v| match v {
                    Value::Utf8(s) => mem::size_of::<Value>() + s.capacity(),
                    _ => mem::size_of::<Value>(),
                })
                .sum::<usize>()
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::DataProcessor;
    use crate::config::ProcessingConfig;
    use crate::error::ProcessingError;
    use crate::types::Value;

    fn tmp_csv(contents: &str) -> PathBuf {
        tmp_named(".csv", contents)
    }

    fn tmp_named(suffix: &str, contents: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("session_{nanos}{suffix}"));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const REPORT: &str = "Timestamp_PC;Num_Lote;T1_Index;T1_FineNS\n\
                          t0;1;10;1,5\n\
                          t1;2;20;2,5\n\
                          t2;1;30;x\n\
                          ;;;\n";

    #[test]
    fn calls_before_load_fail_with_not_loaded() {
        let mut p = DataProcessor::new("does-not-matter.csv", b';');
        assert!(matches!(p.get_summary(), Err(ProcessingError::NotLoaded)));
        assert!(matches!(p.filter_by_batch(1), Err(ProcessingError::NotLoaded)));
        assert!(matches!(p.remove_empty_rows(), Err(ProcessingError::NotLoaded)));
        assert!(p.data().is_none());
    }

    #[test]
    fn chained_calls_work_on_the_same_table() {
        let path = tmp_csv(REPORT);
        let mut p = DataProcessor::new(&path, b';');
        assert_eq!(p.load().unwrap().row_count(), 4);

        assert_eq!(p.remove_empty_rows().unwrap(), 1);
        assert_eq!(p.filter_by_batch(1).unwrap().row_count(), 2);
        assert_eq!(p.convert_decimal_format().unwrap(), 1);

        let ds = p.data().unwrap();
        let idx = ds.schema.index_of("T1_FineNS").unwrap();
        assert_eq!(ds.rows[0][idx], Value::Float64(1.5));
        assert_eq!(ds.rows[1][idx], Value::Null);

        let stats = p.calculate_statistics().unwrap();
        assert_eq!(stats.get("T1_FineNS").unwrap().valid_count, 1);

        p.reset();
        assert_eq!(p.get_summary().unwrap().row_count, 4);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn empty_filter_result_is_zero_rows() {
        let path = tmp_csv(REPORT);
        let mut p = DataProcessor::new(&path, b';');
        p.load().unwrap();
        assert_eq!(p.filter_by_index_range(Some(100), None).unwrap().row_count(), 0);

        let summary = p.get_summary().unwrap();
        assert_eq!(summary.row_count, 0);
        assert_eq!(summary.column_count, 4);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn summary_reports_columns_and_memory() {
        let path = tmp_csv(REPORT);
        let mut p = DataProcessor::new(&path, b';');
        p.load().unwrap();

        let summary = p.get_summary().unwrap();
        assert_eq!(
            summary.column_names,
            vec!["Timestamp_PC", "Num_Lote", "T1_Index", "T1_FineNS"]
        );
        assert!(summary.memory_estimate > 0);
        assert!(summary.memory_mb() > 0.0);
        assert!(summary.to_string().contains("rows:    4"));
        assert_eq!(summary.first_timestamp.as_deref(), Some("t0"));
        assert!(summary.to_string().contains("first:   t0"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn first_timestamp_skips_blank_cells_and_follows_config() {
        let path = tmp_csv("Stamp;Num_Lote\n;1\n10:00:05;2\n");
        let mut p = DataProcessor::new(&path, b';');
        p.load().unwrap();
        assert_eq!(p.get_summary().unwrap().first_timestamp, None);

        let config = ProcessingConfig {
            timestamp_column: "Stamp".to_string(),
            ..ProcessingConfig::default()
        };
        let mut p = DataProcessor::new(&path, b';').with_config(config);
        p.load().unwrap();
        assert_eq!(
            p.get_summary().unwrap().first_timestamp.as_deref(),
            Some("10:00:05")
        );

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unusual_or_missing_extensions_load_as_delimited() {
        for suffix in [".log", ""] {
            let path = tmp_named(suffix, REPORT);
            let mut p = DataProcessor::new(&path, b';');
            assert_eq!(p.load().unwrap().row_count(), 4);
            std::fs::remove_file(&path).unwrap();
        }
    }
}
