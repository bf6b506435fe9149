//! Unified loading entrypoint.
//!
//! Most callers should use [`load_from_path`], which reads a measurement file into an
//! in-memory [`crate::types::DataSet`], assigns column roles from a
//! [`ProcessingConfig`] and checks the header against the expected report columns.
//!
//! - If [`LoadOptions::format`] is `None`, the format is inferred from the file extension.
//! - Delimited input reads numbers with [`LoadOptions::decimal`] as decimal separator.

#[cfg(feature = "excel")]
use std::error::Error as StdError;
use std::fmt;
use std::path::Path;

use tracing::{error, info, warn};

use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, ProcessingResult};
use crate::types::DataSet;

use super::csv;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFormat {
    /// Delimited text (`.csv`, `.txt`).
    Delimited,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Workbook,
}

impl LoadFormat {
    /// Parse a load format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" | "dat" => Some(Self::Delimited),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }

    /// Format of `path` by extension; anything not recognised as a workbook is delimited text.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Self::Delimited)
    }
}

impl fmt::Display for LoadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delimited => f.write_str("delimited"),
            Self::Workbook => f.write_str("workbook"),
        }
    }
}

/// Options controlling [`load_from_path`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// If `None`, infer from the file extension.
    pub format: Option<LoadFormat>,
    /// Field separator for delimited input.
    pub delimiter: u8,
    /// Decimal separator for delimited input. Point decimals are accepted either way.
    pub decimal: char,
    /// Workbook sheet to read. `None` reads the first sheet.
    pub sheet: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: None,
            delimiter: b';',
            decimal: ',',
            sheet: None,
        }
    }
}

impl LoadOptions {
    /// Options using the field and decimal separators of `config`.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            delimiter: config.separator_byte(),
            decimal: config.decimal_separator,
            ..Self::default()
        }
    }
}

/// Load a measurement file.
///
/// On success the returned dataset has column roles assigned from `config`. Expected columns
/// that are missing are reported with a warning; loading does not fail because of them.
///
/// # Errors
///
/// Any read or parse failure. No partial dataset is returned.
///
/// # Examples
///
/// ```no_run
/// use measurement_processing::config::ProcessingConfig;
/// use measurement_processing::ingestion::{load_from_path, LoadOptions};
///
/// # fn main() -> Result<(), measurement_processing::ProcessingError> {
/// let config = ProcessingConfig::default();
/// let ds = load_from_path("Reporte_de_Datos.csv", &LoadOptions::from_config(&config), &config)?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn load_from_path(
    path: impl AsRef<Path>,
    options: &LoadOptions,
    config: &ProcessingConfig,
) -> ProcessingResult<DataSet> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let result = match format {
        LoadFormat::Delimited => load_delimited(path, options),
        LoadFormat::Workbook => load_workbook(path, options.sheet.as_deref()),
    };

    match result {
        Ok(mut ds) => {
            config.assign_roles(&mut ds.schema);
            let missing = config.missing_expected_columns(&ds.schema);
            if !missing.is_empty() {
                warn!(path = %path.display(), ?missing, "input lacks expected columns");
            }
            info!(
                path = %path.display(),
                %format,
                rows = ds.row_count(),
                columns = ds.column_count(),
                "file loaded"
            );
            Ok(ds)
        }
        Err(e) => {
            if is_infrastructure_error(&e) {
                error!(path = %path.display(), %format, error = %e, "failed to read input");
            } else {
                warn!(path = %path.display(), %format, error = %e, "malformed input");
            }
            Err(e)
        }
    }
}

fn load_delimited(path: &Path, options: &LoadOptions) -> ProcessingResult<DataSet> {
    csv::ingest_csv_from_path(path, options.delimiter, options.decimal)
}

fn load_workbook(path: &Path, sheet: Option<&str>) -> ProcessingResult<DataSet> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, sheet);

    #[cfg(feature = "excel")]
    {
        super::excel::ingest_excel_from_path(path, sheet)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(ProcessingError::SchemaMismatch {
            message: "workbook loading not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

/// I/O failures (missing file, permissions) as opposed to malformed content.
fn is_infrastructure_error(e: &ProcessingError) -> bool {
    match e {
        ProcessingError::Io(_) => true,
        ProcessingError::Csv(err) => matches!(err.kind(), ::csv::ErrorKind::Io(_)),
        #[cfg(feature = "excel")]
        ProcessingError::Excel(err) => error_chain_contains_io(err),
        _ => false,
    }
}

#[cfg(feature = "excel")]
fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

fn infer_format_from_path(path: &Path) -> ProcessingResult<LoadFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ProcessingError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    LoadFormat::from_extension(ext).ok_or_else(|| ProcessingError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::LoadFormat;

    #[test]
    fn format_from_extension_is_case_insensitive() {
        assert_eq!(LoadFormat::from_extension("CSV"), Some(LoadFormat::Delimited));
        assert_eq!(LoadFormat::from_extension("xlsx"), Some(LoadFormat::Workbook));
        assert_eq!(LoadFormat::from_extension("parquet"), None);
    }

    #[test]
    fn unrecognised_paths_default_to_delimited() {
        assert_eq!(LoadFormat::from_path(Path::new("run.XLSX")), LoadFormat::Workbook);
        assert_eq!(LoadFormat::from_path(Path::new("acq.log")), LoadFormat::Delimited);
        assert_eq!(LoadFormat::from_path(Path::new("Reporte")), LoadFormat::Delimited);
    }
}
