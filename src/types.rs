//! Core data model: the in-memory record table and its cells.
//!
//! A [`DataSet`] is a rectangular, row-ordered table described by a [`Schema`] (a list of
//! [`Field`]s). Each field carries a physical [`DataType`] and a semantic [`ColumnRole`].

use serde::{Deserialize, Serialize};

/// Physical data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// UTF-8 string (including not-yet-coerced comma-decimal numbers).
    Utf8,
}

impl DataType {
    /// Whether values of this type take part in statistics and normalization.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }
}

/// Semantic role of a column within a measurement file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Batch identifier used for equality filtering (e.g. `Num_Lote`).
    Identifier,
    /// Orderable integer used for range filtering (e.g. `T1_Index`).
    Index,
    /// Numeric measurement subject to coercion, statistics and normalization.
    Measurement,
    /// Passed through untouched (e.g. a timestamp string).
    #[default]
    Opaque,
}

/// A single named column in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name, as found in the header row.
    pub name: String,
    /// Physical type of the cells.
    pub data_type: DataType,
    /// Semantic role.
    pub role: ColumnRole,
}

impl Field {
    /// Create a new field with the [`ColumnRole::Opaque`] role.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            role: ColumnRole::Opaque,
        }
    }

    /// Builder-style role assignment.
    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = role;
        self
    }
}

/// Ordered list of fields shared by every row of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the field with the given name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single cell of a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing, empty, or invalid after coercion.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Numeric view of the cell; non-finite floats count as missing. Text is not coerced here;
    /// see [`crate::coercion`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// `true` for [`Value::Null`] and blank strings.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Utf8(s) => s.trim().is_empty(),
            Self::Int64(_) | Self::Float64(_) => false,
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// `true` when the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema and the relative order of rows.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Iterate the cells of column `idx`, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| row.get(idx).unwrap_or(&Value::Null))
    }

    /// Append a column. `values` must hold one cell per row.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the row count.
    pub fn push_column(&mut self, field: Field, values: Vec<Value>) {
        assert!(
            values.len() == self.rows.len(),
            "column '{}' has {} values but dataset has {} rows",
            field.name,
            values.len(),
            self.rows.len()
        );
        self.schema.fields.push(field);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Reduce (fold) all rows into an accumulator value.
    ///
    /// This is similar to `Iterator::fold`, but provides each row as `&[Value]`.
    pub fn reduce_rows<A, F>(&self, init: A, mut reducer: F) -> A
    where
        F: FnMut(A, &[Value]) -> A,
    {
        self.rows
            .iter()
            .fold(init, |acc, row| reducer(acc, row.as_slice()))
    }
}
