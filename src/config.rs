//! Tunable settings for loading and processing measurement files.
//!
//! [`ProcessingConfig::default`] matches the layout of the acquisition software's reports:
//! semicolon-separated fields, comma decimals, `Num_Lote` as batch identifier and `T1_Index`
//! as the range-filter column. Any subset can be overridden from a TOML file:
//!
//! ```toml
//! csv_separator = ";"
//! index_column = "T2_Index"
//! normalize_scope = "measurements_only"
//!
//! [defaults]
//! lote_number = 3
//! remove_nulls = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProcessingResult;
use crate::pipeline::PipelineParams;
use crate::processing::NormalizeScope;
use crate::types::{ColumnRole, Schema};

/// Columns expected in an acquisition report, in file order.
pub const EXPECTED_COLUMNS: [&str; 9] = [
    "Timestamp_PC",
    "Num_Lote",
    "T1_Index",
    "T1_ResetCount",
    "T1_FineNS",
    "T2_Index",
    "T2_ResetCount",
    "T2_FineNS",
    "t1_nS",
];

/// Columns that carry comma-decimal measurements.
pub const NUMERIC_COLUMNS: [&str; 4] = ["T1_ResetCount", "T1_FineNS", "T2_ResetCount", "T2_FineNS"];

/// Loading and processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Field separator of input and delimited output files.
    pub csv_separator: char,
    /// Decimal separator used on disk.
    pub decimal_separator: char,
    /// Column holding the batch identifier.
    pub identifier_column: String,
    /// Column used for index range filtering.
    pub index_column: String,
    /// Column holding the acquisition timestamp, shown in summaries.
    pub timestamp_column: String,
    /// Raw column the derived time-difference column is computed from.
    pub time_difference_source: String,
    /// Name of the derived time-difference column.
    pub time_difference_column: String,
    /// Columns coerced from comma-decimal text to numbers.
    pub numeric_columns: Vec<String>,
    /// Columns a well-formed report should contain. Checked on load, never enforced.
    pub expected_columns: Vec<String>,
    /// Suffix appended to normalized column names.
    pub normalized_suffix: String,
    /// Which numeric columns the normalizer touches.
    pub normalize_scope: NormalizeScope,
    /// Parameters used when the caller does not supply their own.
    pub defaults: PipelineParams,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            csv_separator: ';',
            decimal_separator: ',',
            identifier_column: "Num_Lote".to_string(),
            index_column: "T1_Index".to_string(),
            timestamp_column: "Timestamp_PC".to_string(),
            time_difference_source: "t1_nS".to_string(),
            time_difference_column: "Time_Difference".to_string(),
            numeric_columns: NUMERIC_COLUMNS.iter().map(|s| s.to_string()).collect(),
            expected_columns: EXPECTED_COLUMNS.iter().map(|s| s.to_string()).collect(),
            normalized_suffix: "_normalized".to_string(),
            normalize_scope: NormalizeScope::AllNumeric,
            defaults: PipelineParams {
                lote_number: 1,
                min_index: 0,
                max_index: 0,
                remove_nulls: true,
                normalize: false,
                time_difference: false,
            },
        }
    }
}

impl ProcessingConfig {
    /// Parse a configuration from TOML text. Missing keys keep their default value.
    pub fn from_toml_str(text: &str) -> ProcessingResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> ProcessingResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The field separator as a single byte, as the `csv` crate wants it.
    ///
    /// Non-ASCII separators fall back to `;`.
    pub fn separator_byte(&self) -> u8 {
        u8::try_from(self.csv_separator)
            .ok()
            .filter(u8::is_ascii)
            .unwrap_or(b';')
    }

    /// Role of a column according to this configuration.
    pub fn role_of(&self, column: &str) -> ColumnRole {
        if column == self.identifier_column {
            ColumnRole::Identifier
        } else if column == self.index_column {
            ColumnRole::Index
        } else if self.numeric_columns.iter().any(|c| c == column) {
            ColumnRole::Measurement
        } else {
            ColumnRole::Opaque
        }
    }

    /// Assign roles to every field of `schema` in place.
    pub fn assign_roles(&self, schema: &mut Schema) {
        for field in &mut schema.fields {
            field.role = self.role_of(&field.name);
        }
    }

    /// Expected columns absent from `schema`, in expected order.
    pub fn missing_expected_columns(&self, schema: &Schema) -> Vec<String> {
        self.expected_columns
            .iter()
            .filter(|c| schema.index_of(c).is_none())
            .cloned()
            .collect()
    }
}
