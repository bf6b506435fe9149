//! Writing processed datasets to disk.
//!
//! Two encodings are supported:
//!
//! - [`ExportFormat::Delimited`]: `;`-separated text with comma decimals, header row, no row
//!   index column. Reloading it with the same conventions gives back the same numbers.
//! - [`ExportFormat::Workbook`]: a single-sheet `.xlsx` with a header row and native numeric
//!   cells.
//!
//! Both are rendered fully in memory, written to a temporary sibling file and renamed onto the
//! destination, so a failed export never leaves a truncated file behind.

mod delimited;
mod workbook;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, ProcessingResult};
use crate::types::DataSet;

pub use delimited::render_delimited;
pub use workbook::render_workbook;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Semicolon-separated text with comma decimals.
    Delimited,
    /// Office Open XML workbook (`.xlsx`).
    Workbook,
}

impl ExportFormat {
    /// Parse an export format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(Self::Delimited),
            "xlsx" => Some(Self::Workbook),
            _ => None,
        }
    }

    /// Infer the format of `path` from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Options controlling export encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Field separator for delimited output.
    pub delimiter: u8,
    /// Decimal separator for delimited output.
    pub decimal: char,
    /// Worksheet name for workbook output.
    pub sheet_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            decimal: ',',
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl ExportOptions {
    /// Options using the separators of `config`.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            delimiter: config.separator_byte(),
            decimal: config.decimal_separator,
            ..Self::default()
        }
    }
}

/// Export `dataset` to `path` in the given format.
///
/// # Errors
///
/// [`ProcessingError::Export`] naming the destination and the underlying cause. The dataset
/// is untouched and can be exported again.
pub fn export(
    dataset: &DataSet,
    format: ExportFormat,
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> ProcessingResult<()> {
    let path = path.as_ref();
    let result = match format {
        ExportFormat::Delimited => render_delimited(dataset, options),
        ExportFormat::Workbook => render_workbook(dataset, options),
    }
    .and_then(|bytes| write_atomically(path, &bytes));

    match result {
        Ok(()) => {
            info!(path = %path.display(), ?format, rows = dataset.row_count(), "exported");
            Ok(())
        }
        Err(e) => {
            warn!(path = %path.display(), ?format, error = %e, "export failed");
            Err(ProcessingError::Export {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    }
}

/// Export to delimited text (`;` fields, `,` decimals by default).
pub fn export_delimited(
    dataset: &DataSet,
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> ProcessingResult<()> {
    export(dataset, ExportFormat::Delimited, path, options)
}

/// Export to a single-sheet `.xlsx` workbook.
pub fn export_workbook(
    dataset: &DataSet,
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> ProcessingResult<()> {
    export(dataset, ExportFormat::Workbook, path, options)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> ProcessingResult<()> {
    let tmp = temp_sibling(path);
    let written = fs::File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(bytes)?;
            f.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!(".{name}.{}.partial", std::process::id()))
}
