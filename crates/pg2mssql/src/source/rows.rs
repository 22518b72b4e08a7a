//! Raw catalog rows as returned by a [`CatalogReader`](crate::core::CatalogReader).
//!
//! Rows are flat and ordered; grouping them into tables and indexes is the
//! model builder's job. All row types serialize so a catalog can be captured
//! once and replayed offline.

use serde::{Deserialize, Serialize};

/// One table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRow {
    pub schema: String,
    pub table: String,
    pub column: String,
    /// 1-based attribute number.
    pub ordinal: i32,
    /// `atttypid::regtype` (e.g. "integer", "text[]").
    pub regtype: String,
    /// `format_type(atttypid, atttypmod)` (e.g. "character varying(40)").
    #[serde(default)]
    pub formatted_type: String,
    pub is_nullable: bool,
    #[serde(default)]
    pub array_dims: i32,
    #[serde(default)]
    pub max_char_size: Option<i32>,
    #[serde(default)]
    pub numeric_precision: Option<i32>,
    #[serde(default)]
    pub numeric_scale: Option<i32>,
    #[serde(default)]
    pub default_expr: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ColumnRow {
    /// Whether the column holds an array and needs its cardinality sampled.
    pub fn is_array(&self) -> bool {
        self.array_dims > 0 || self.regtype.ends_with("[]")
    }

    /// Scalar `bytea` columns are measured by byte length rather than cardinality.
    pub fn is_binary(&self) -> bool {
        !self.is_array() && self.regtype == "bytea"
    }

    /// Whether the column's contents must be sampled before emitting.
    pub fn needs_sampling(&self) -> bool {
        self.is_array() || self.is_binary()
    }
}

/// One user-defined domain type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTypeRow {
    pub schema: String,
    pub name: String,
    /// Base type as `regtype`.
    pub base_type: String,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub max_char_size: Option<i32>,
    #[serde(default)]
    pub numeric_precision: Option<i32>,
    #[serde(default)]
    pub numeric_scale: Option<i32>,
}

/// Comment attached to a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCommentRow {
    pub schema: String,
    pub table: String,
    pub comment: String,
}

/// One sequence with its current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRow {
    pub schema: String,
    pub name: String,
    /// smallint, integer or bigint.
    pub data_type: String,
    pub start_value: i64,
    pub increment_by: i64,
    pub min_value: i64,
    pub max_value: i64,
    #[serde(default = "default_cache")]
    pub cache_size: i64,
    #[serde(default)]
    pub cycle: bool,
    /// `None` until `nextval` has been called.
    #[serde(default)]
    pub last_value: Option<i64>,
    /// `regtype` of the column owning the sequence (serial, identity or
    /// `OWNED BY`), when there is one.
    #[serde(default)]
    pub owner_type: Option<String>,
}

fn default_cache() -> i64 {
    1
}

/// One key position of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub schema: String,
    pub table: String,
    pub index_name: String,
    pub is_primary: bool,
    pub is_unique: bool,
    /// `None` for expression keys.
    pub column: Option<String>,
    /// 1-based key position.
    pub column_position: i32,
    /// `pg_index.indoption` bits for this key.
    #[serde(default)]
    pub options: i32,
}

/// One foreign key constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyRow {
    pub schema: String,
    pub table: String,
    pub constraint_name: String,
    pub columns: Vec<String>,
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    /// `confdeltype` code (a, r, c, n, d).
    #[serde(default = "default_action")]
    pub on_delete: String,
    /// `confupdtype` code (a, r, c, n, d).
    #[serde(default = "default_action")]
    pub on_update: String,
}

fn default_action() -> String {
    "a".to_string()
}

/// Array cardinality observed for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardinalityRow {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub max_cardinality: i64,
}
