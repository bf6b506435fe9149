//! `measurement-processing` loads semicolon-delimited measurement reports into an in-memory
//! [`types::DataSet`], filters them by batch and index range, coerces comma-decimal text into
//! numbers, optionally appends min-max normalized columns, computes summary statistics and
//! exports the result as delimited text or an `.xlsx` workbook.
//!
//! ## What a report looks like
//!
//! ```text
//! Timestamp_PC;Num_Lote;T1_Index;T1_ResetCount;T1_FineNS;T2_Index;T2_ResetCount;T2_FineNS;t1_nS
//! 2026-02-01 10:00:00;1;10;3;1,5;10;3;2,25;12
//! ```
//!
//! The header row is mandatory. Missing expected columns are reported as warnings, never as
//! errors. Cells that fail numeric coercion become [`types::Value::Null`] and are excluded from
//! statistics and normalization; they never abort a run.
//!
//! ## Entry points
//!
//! - [`pipeline::Pipeline`]: runs the fixed stage sequence for one parameter set and reports
//!   progress checkpoints (25/50/75/100) to a [`pipeline::PipelineObserver`]
//! - [`execution::PipelineExecutor`]: runs pipelines on a worker pool and delivers progress and
//!   the outcome over a channel
//! - [`session::DataProcessor`]: step-by-step calls for scripts
//! - [`ingestion::load_from_path`] and [`export::export`]: file I/O on their own
//!
//! ## Example: run the pipeline
//!
//! ```no_run
//! use measurement_processing::config::ProcessingConfig;
//! use measurement_processing::ingestion::{load_from_path, LoadOptions};
//! use measurement_processing::{Pipeline, PipelineParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProcessingConfig::default();
//! let ds = load_from_path("Reporte_de_Datos.csv", &LoadOptions::from_config(&config), &config)?;
//!
//! let params = PipelineParams {
//!     lote_number: 1,
//!     min_index: 100,
//!     max_index: 200,
//!     ..PipelineParams::default()
//! };
//! let processed = Pipeline::new(config).run(&ds, &params)?;
//! println!("rows={}", processed.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: step by step
//!
//! ```no_run
//! use measurement_processing::DataProcessor;
//!
//! # fn main() -> Result<(), measurement_processing::ProcessingError> {
//! let mut p = DataProcessor::new("Reporte_de_Datos.csv", b';');
//! p.load()?;
//! p.filter_by_batch(1)?;
//! p.convert_decimal_format()?;
//! println!("{}", p.calculate_statistics()?);
//! p.export_workbook("lote_1.xlsx")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Cargo features
//!
//! - `excel` (default): reading `.xlsx`/`.xls`/`.ods` input through `calamine`. Workbook
//!   *export* is always available.

pub mod coercion;
pub mod config;
pub mod error;
pub mod execution;
pub mod export;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod session;
pub mod types;

pub use error::{ProcessingError, ProcessingResult};
pub use pipeline::{Pipeline, PipelineParams};
pub use session::DataProcessor;
