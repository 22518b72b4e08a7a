//! Traits at the two seams of the conversion pipeline.
//!
//! - [`CatalogReader`]: yields raw catalog rows from a source database
//! - [`TypeMapper`]: maps source type names to target type names

use async_trait::async_trait;

use crate::error::Result;
use crate::source::rows::{
    ColumnRow, ForeignKeyRow, IndexRow, SequenceRow, TableCommentRow, UserTypeRow,
};

use super::schema::ColumnDescriptor;

/// Read raw catalog rows from a source database.
///
/// Each method returns its rows already ordered the way the model builder
/// expects: columns by (schema, table, ordinal), indexes by (schema, table,
/// index, key position), everything else by schema and name.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Table columns with types, defaults and comments.
    async fn read_columns(&self) -> Result<Vec<ColumnRow>>;

    /// User-defined domain types.
    async fn read_user_types(&self) -> Result<Vec<UserTypeRow>>;

    /// Table-level comments.
    async fn read_table_comments(&self) -> Result<Vec<TableCommentRow>>;

    /// Sequences with their current state.
    async fn read_sequences(&self) -> Result<Vec<SequenceRow>>;

    /// Index key columns, one row per (index, key position).
    async fn read_indexes(&self) -> Result<Vec<IndexRow>>;

    /// Foreign key constraints with paired column lists.
    async fn read_foreign_keys(&self) -> Result<Vec<ForeignKeyRow>>;

    /// Largest array cardinality (or byte length for binary columns) over a
    /// sample of at most `sample_limit` rows.
    ///
    /// Returns `None` when the table has no non-null values in the sample.
    async fn array_cardinality(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        is_binary: bool,
        sample_limit: i64,
    ) -> Result<Option<i64>>;

    /// Human-readable name of the source (for logging).
    fn source_name(&self) -> &str;
}

/// Maps data types between source and target dialects.
pub trait TypeMapper: Send + Sync {
    /// Get the source dialect name.
    fn source_dialect(&self) -> &str;

    /// Get the target dialect name.
    fn target_dialect(&self) -> &str;

    /// Map a bare source type name (no size, no array suffix).
    fn map_type(&self, source_type: &str) -> TypeMapping;

    /// Largest value a target integer type can hold, `None` if unbounded.
    fn max_value_for_type(&self, target_type: &str) -> Option<i64>;

    /// Map a column, rendering size, precision and scale.
    fn map_column(&self, col: &ColumnDescriptor) -> ColumnMapping;
}

/// Result of mapping a column from source to target.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    /// Target column name.
    pub name: String,
    /// Target data type including size (e.g. "varchar(40)", "numeric(10,2)").
    pub target_type: String,
    /// Whether the column is nullable.
    pub is_nullable: bool,
    /// Warning for types that had no mapping.
    pub warning: Option<String>,
}

/// Result of mapping a type from source to target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Target type name without size.
    pub target_type: String,
    /// Set when the type was passed through unchanged.
    pub warning: Option<String>,
}

impl TypeMapping {
    /// A known mapping.
    pub fn mapped(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            warning: None,
        }
    }

    /// An unknown type passed through as-is.
    pub fn unmapped(source_type: impl Into<String>) -> Self {
        let source_type = source_type.into();
        let warning = format!("no SQL Server mapping for type '{}'; emitted unchanged", source_type);
        Self {
            target_type: source_type,
            warning: Some(warning),
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.warning.is_none()
    }
}
