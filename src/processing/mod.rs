//! In-memory transformations applied to a loaded [`crate::types::DataSet`].
//!
//! Each stage takes a dataset and returns (or updates) a new one; none of them perform I/O.
//!
//! - [`filter`]: batch-id equality and index range filters
//! - [`nulls`]: dropping rows with no content
//! - [`normalize()`]: min-max rescaling into appended `<column>_normalized` columns
//! - [`compute_statistics`]: count/min/max/mean/std/median per numeric column
//!
//! ## Example: filter → coerce → statistics
//!
//! ```rust
//! use measurement_processing::coercion::convert_decimal_format;
//! use measurement_processing::processing::{compute_statistics, filter_by_batch};
//! use measurement_processing::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("Num_Lote", DataType::Int64),
//!     Field::new("T1_ResetCount", DataType::Utf8),
//! ]);
//! let ds = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Int64(1), Value::Utf8("1,5".to_string())],
//!         vec![Value::Int64(2), Value::Utf8("2,5".to_string())],
//!         vec![Value::Int64(1), Value::Utf8("n/a".to_string())],
//!     ],
//! );
//!
//! let mut lote = filter_by_batch(&ds, "Num_Lote", 1).unwrap();
//! convert_decimal_format(&mut lote, &["T1_ResetCount".to_string()]);
//!
//! let report = compute_statistics(&lote);
//! let stats = report.get("T1_ResetCount").unwrap();
//! assert_eq!(stats.valid_count, 1);
//! assert_eq!(stats.mean, 1.5);
//! ```

pub mod filter;
pub mod normalize;
pub mod nulls;
pub mod statistics;

pub use filter::{filter, filter_by_batch, filter_by_index_range, filter_records};
pub use normalize::{normalize, NormalizeScope, NORMALIZED_SUFFIX};
pub use nulls::drop_empty_rows;
pub use statistics::{compute_statistics, ColumnStatistics, StatisticsReport};
