use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for loading, processing and export operations.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Error type returned by loaders, processing stages and exporters.
///
/// Per-cell coercion failures are not errors: they become [`crate::types::Value::Null`].
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-text read or write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook serialization error.
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[cfg(feature = "excel")]
    /// Workbook ingestion error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// The table does not have the shape an operation needs (missing column, no header, ...).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A session operation was called before any data was loaded.
    #[error("no data loaded: call load() first")]
    NotLoaded,

    /// The worker thread pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Writing an export destination failed.
    #[error("failed to export '{}': {message}", path.display())]
    Export { path: PathBuf, message: String },
}

impl ProcessingError {
    pub(crate) fn missing_column(column: &str) -> Self {
        Self::SchemaMismatch {
            message: format!("missing required column '{column}'"),
        }
    }
}
