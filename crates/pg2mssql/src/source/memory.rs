//! Catalog snapshots.
//!
//! A [`CatalogSnapshot`] holds every row a [`CatalogReader`] produces plus
//! the observed array cardinalities, so a catalog can be captured once from
//! a live server and converted later without a connection.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::CatalogReader;
use crate::error::{ConvertError, Result};

use super::rows::{
    CardinalityRow, ColumnRow, ForeignKeyRow, IndexRow, SequenceRow, TableCommentRow,
    UserTypeRow,
};

/// Serializable copy of a source catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Where the snapshot was taken.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub columns: Vec<ColumnRow>,
    #[serde(default)]
    pub user_types: Vec<UserTypeRow>,
    #[serde(default)]
    pub table_comments: Vec<TableCommentRow>,
    #[serde(default)]
    pub sequences: Vec<SequenceRow>,
    #[serde(default)]
    pub indexes: Vec<IndexRow>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyRow>,
    #[serde(default)]
    pub cardinalities: Vec<CardinalityRow>,
}

impl CatalogSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the snapshot as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| ConvertError::output(path, e))
    }

    /// Read every catalog row from `reader`, sampling array cardinalities and
    /// binary lengths.
    ///
    /// Query failures are fatal here; a partial snapshot would silently
    /// drop objects on replay.
    pub async fn capture(reader: &dyn CatalogReader, sample_limit: i64) -> Result<Self> {
        let columns = reader.read_columns().await?;

        let mut cardinalities = Vec::new();
        for col in columns.iter().filter(|c| c.needs_sampling()) {
            let observed = reader
                .array_cardinality(
                    &col.schema,
                    &col.table,
                    &col.column,
                    col.is_binary(),
                    sample_limit,
                )
                .await?;
            if let Some(max_cardinality) = observed {
                cardinalities.push(CardinalityRow {
                    schema: col.schema.clone(),
                    table: col.table.clone(),
                    column: col.column.clone(),
                    max_cardinality,
                });
            }
        }

        let snapshot = Self {
            source: reader.source_name().to_string(),
            user_types: reader.read_user_types().await?,
            table_comments: reader.read_table_comments().await?,
            sequences: reader.read_sequences().await?,
            indexes: reader.read_indexes().await?,
            foreign_keys: reader.read_foreign_keys().await?,
            columns,
            cardinalities,
        };

        info!(
            "Captured {} columns, {} sequences, {} index keys and {} foreign keys from {}",
            snapshot.columns.len(),
            snapshot.sequences.len(),
            snapshot.indexes.len(),
            snapshot.foreign_keys.len(),
            snapshot.source
        );
        Ok(snapshot)
    }
}

/// [`CatalogReader`] over a [`CatalogSnapshot`].
///
/// Rows are returned in the order the model builder requires regardless of
/// the order they were stored in.
pub struct InMemoryCatalog {
    snapshot: CatalogSnapshot,
    excluded_schemas: Vec<String>,
    name: String,
}

impl InMemoryCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        let name = if snapshot.source.is_empty() {
            "snapshot".to_string()
        } else {
            format!("snapshot of {}", snapshot.source)
        };
        Self {
            snapshot,
            excluded_schemas: Vec::new(),
            name,
        }
    }

    /// Skip rows belonging to these schemas.
    pub fn excluding(mut self, schemas: Vec<String>) -> Self {
        self.excluded_schemas = schemas;
        self
    }

    fn included(&self, schema: &str) -> bool {
        !schema.starts_with("pg_") && !self.excluded_schemas.iter().any(|s| s == schema)
    }

    fn filtered<T: Clone>(&self, rows: &[T], schema_of: impl Fn(&T) -> &str) -> Vec<T> {
        rows.iter()
            .filter(|r| self.included(schema_of(r)))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn read_columns(&self) -> Result<Vec<ColumnRow>> {
        let mut rows = self.filtered(&self.snapshot.columns, |r| &r.schema);
        rows.sort_by(|a, b| {
            (&a.schema, &a.table, a.ordinal).cmp(&(&b.schema, &b.table, b.ordinal))
        });
        debug!("Snapshot yielded {} column rows", rows.len());
        Ok(rows)
    }

    async fn read_user_types(&self) -> Result<Vec<UserTypeRow>> {
        let mut rows = self.filtered(&self.snapshot.user_types, |r| &r.schema);
        rows.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        Ok(rows)
    }

    async fn read_table_comments(&self) -> Result<Vec<TableCommentRow>> {
        let mut rows = self.filtered(&self.snapshot.table_comments, |r| &r.schema);
        rows.sort_by(|a, b| (&a.schema, &a.table).cmp(&(&b.schema, &b.table)));
        Ok(rows)
    }

    async fn read_sequences(&self) -> Result<Vec<SequenceRow>> {
        let mut rows = self.filtered(&self.snapshot.sequences, |r| &r.schema);
        rows.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        Ok(rows)
    }

    async fn read_indexes(&self) -> Result<Vec<IndexRow>> {
        let mut rows = self.filtered(&self.snapshot.indexes, |r| &r.schema);
        rows.sort_by(|a, b| {
            (&a.schema, &a.table, &a.index_name, a.column_position).cmp(&(
                &b.schema,
                &b.table,
                &b.index_name,
                b.column_position,
            ))
        });
        Ok(rows)
    }

    async fn read_foreign_keys(&self) -> Result<Vec<ForeignKeyRow>> {
        let mut rows = self.filtered(&self.snapshot.foreign_keys, |r| &r.schema);
        rows.sort_by(|a, b| {
            (&a.schema, &a.table, &a.constraint_name).cmp(&(
                &b.schema,
                &b.table,
                &b.constraint_name,
            ))
        });
        Ok(rows)
    }

    async fn array_cardinality(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        _is_binary: bool,
        _sample_limit: i64,
    ) -> Result<Option<i64>> {
        Ok(self
            .snapshot
            .cardinalities
            .iter()
            .find(|c| c.schema == schema && c.table == table && c.column == column)
            .map(|c| c.max_cardinality))
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_columns_returned_in_builder_order() {
        let snapshot = CatalogSnapshot {
            columns: vec![
                column_row("sales", "orders", "total", 2, "numeric"),
                column_row("hr", "staff", "id", 1, "integer"),
                column_row("sales", "orders", "id", 1, "integer"),
            ],
            ..Default::default()
        };
        let reader = InMemoryCatalog::new(snapshot);
        let rows = reader.read_columns().await.unwrap();
        let keys: Vec<_> = rows
            .iter()
            .map(|r| format!("{}.{}.{}", r.schema, r.table, r.column))
            .collect();
        assert_eq!(keys, vec!["hr.staff.id", "sales.orders.id", "sales.orders.total"]);
    }

    #[tokio::test]
    async fn test_excluded_schemas_filtered() {
        let snapshot = CatalogSnapshot {
            columns: vec![
                column_row("public", "t", "id", 1, "integer"),
                column_row("sales", "orders", "id", 1, "integer"),
                column_row("pg_temp_3", "scratch", "id", 1, "integer"),
            ],
            ..Default::default()
        };
        let reader = InMemoryCatalog::new(snapshot).excluding(vec!["public".into()]);
        let rows = reader.read_columns().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].schema, "sales");
    }

    #[tokio::test]
    async fn test_cardinality_lookup() {
        let snapshot = CatalogSnapshot {
            cardinalities: vec![CardinalityRow {
                schema: "sales".into(),
                table: "orders".into(),
                column: "tags".into(),
                max_cardinality: 3,
            }],
            ..Default::default()
        };
        let reader = InMemoryCatalog::new(snapshot);
        assert_eq!(
            reader
                .array_cardinality("sales", "orders", "tags", false, 100)
                .await
                .unwrap(),
            Some(3)
        );
        assert_eq!(
            reader
                .array_cardinality("sales", "orders", "notes", false, 100)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_capture_round_trips_through_json() {
        let original = CatalogSnapshot {
            source: "db:5432/inventory".into(),
            columns: vec![column_row("sales", "orders", "tags", 1, "text[]")],
            cardinalities: vec![CardinalityRow {
                schema: "sales".into(),
                table: "orders".into(),
                column: "tags".into(),
                max_cardinality: 4,
            }],
            ..Default::default()
        };
        let reader = InMemoryCatalog::new(original);
        let captured = CatalogSnapshot::capture(&reader, 100).await.unwrap();
        assert_eq!(captured.source, "snapshot of db:5432/inventory");
        assert_eq!(captured.cardinalities.len(), 1);

        let parsed = CatalogSnapshot::from_json(&captured.to_json().unwrap()).unwrap();
        assert_eq!(parsed.columns, captured.columns);
    }
}
