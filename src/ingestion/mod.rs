//! Loading measurement files.
//!
//! Most callers should use [`load_from_path`] (from [`unified`]) which:
//!
//! - auto-detects the format by file extension (or you can override via [`LoadOptions`])
//! - reads the file into an in-memory [`crate::types::DataSet`]
//! - assigns column roles and checks the header against the expected report columns
//!
//! Format-specific functions are also available under [`csv`] and, with the `excel`
//! feature, `excel`.

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod unified;

pub use unified::{load_from_path, LoadFormat, LoadOptions};
