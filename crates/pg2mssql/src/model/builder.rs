//! Groups raw catalog rows into a [`SchemaCatalog`].
//!
//! Column rows are consumed as a stream sorted by (schema, table, ordinal).
//! The table being assembled lives in a [`TableContext`] owned by the caller
//! of [`accept_column`]; a change of (schema, table) closes the previous
//! table, and [`flush_table`] closes the last one after the stream ends.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::core::{
    ColumnDescriptor, Diagnostic, DiagnosticKind, Diagnostics, SchemaCatalog, SequenceDescriptor,
    TableDescriptor, UserTypeDescriptor,
};
use crate::source::rows::{
    ColumnRow, ForeignKeyRow, IndexRow, SequenceRow, TableCommentRow, UserTypeRow,
};

use super::foreign_keys::build_foreign_keys;
use super::indexes::group_indexes;

/// All rows read from the catalog for one run.
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
    pub columns: Vec<ColumnRow>,
    pub user_types: Vec<UserTypeRow>,
    pub table_comments: Vec<TableCommentRow>,
    pub sequences: Vec<SequenceRow>,
    pub indexes: Vec<IndexRow>,
    pub foreign_keys: Vec<ForeignKeyRow>,
}

/// Options that influence model building.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Suffix stripped from foreign key names.
    pub foreign_key_suffix: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            foreign_key_suffix: "_fkey".to_string(),
        }
    }
}

/// Result of [`build_catalog`].
#[derive(Debug)]
pub struct BuildOutput {
    pub catalog: SchemaCatalog,
    pub diagnostics: Vec<Diagnostic>,
}

/// Table currently being assembled.
#[derive(Debug)]
struct TableGroup {
    table: TableDescriptor,
    names: HashSet<String>,
}

/// Column grouping context.
#[derive(Debug, Default)]
pub struct TableContext {
    current: Option<TableGroup>,
}

impl TableContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_current(&self, schema: &str, table: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|g| g.table.schema == schema && g.table.name == table)
    }
}

/// Add one column row, closing the previous table on a key change.
pub fn accept_column(
    ctx: &mut TableContext,
    row: ColumnRow,
    catalog: &mut SchemaCatalog,
    diagnostics: &mut Diagnostics,
) {
    if !ctx.is_current(&row.schema, &row.table) {
        flush_table(ctx, catalog);
        catalog.note_schema(&row.schema);
        ctx.current = Some(TableGroup {
            table: TableDescriptor {
                schema: row.schema.clone(),
                name: row.table.clone(),
                columns: Vec::new(),
                comment: None,
            },
            names: HashSet::new(),
        });
    }

    let Some(group) = ctx.current.as_mut() else {
        return;
    };

    if !group.names.insert(row.column.clone()) {
        diagnostics.record(
            DiagnosticKind::DuplicateColumn,
            format!("{}.{}.{}", row.schema, row.table, row.column),
            format!("column row at ordinal {} repeats an earlier name; dropped", row.ordinal),
        );
        return;
    }

    group.table.columns.push(column_descriptor(row));
}

/// Close the table being assembled, if any.
pub fn flush_table(ctx: &mut TableContext, catalog: &mut SchemaCatalog) {
    if let Some(group) = ctx.current.take() {
        debug!(
            "Built table {} with {} columns",
            group.table.full_name(),
            group.table.columns.len()
        );
        catalog.tables.push(group.table);
    }
}

fn column_descriptor(row: ColumnRow) -> ColumnDescriptor {
    let array_dims = if row.array_dims == 0 && row.regtype.ends_with("[]") {
        1
    } else {
        row.array_dims
    };
    ColumnDescriptor {
        name: row.column,
        ordinal: row.ordinal,
        formatted_type: if row.formatted_type.is_empty() {
            row.regtype.clone()
        } else {
            row.formatted_type
        },
        source_type: row.regtype,
        is_nullable: row.is_nullable,
        array_dims,
        max_cardinality: 0,
        numeric_precision: row.numeric_precision,
        numeric_scale: row.numeric_scale,
        max_char_size: row.max_char_size,
        default: row.default_expr.filter(|d| !d.trim().is_empty()),
        comment: row.comment.filter(|c| !c.is_empty()),
    }
}

fn sequence_descriptor(row: SequenceRow) -> SequenceDescriptor {
    SequenceDescriptor {
        target_type: row.data_type.clone(),
        schema: row.schema,
        name: row.name,
        data_type: row.data_type,
        owner_type: row.owner_type,
        start: row.start_value,
        increment: row.increment_by,
        min_value: row.min_value,
        max_value: row.max_value,
        cache: row.cache_size,
        cycle: row.cycle,
        last_value: row.last_value.unwrap_or(row.start_value),
        is_called: row.last_value.is_some(),
    }
}

fn user_type_descriptor(row: UserTypeRow) -> UserTypeDescriptor {
    UserTypeDescriptor {
        schema: row.schema,
        name: row.name,
        base_type: row.base_type,
        not_null: row.not_null,
        max_char_size: row.max_char_size,
        numeric_precision: row.numeric_precision,
        numeric_scale: row.numeric_scale,
    }
}

/// Build the catalog model from raw rows.
///
/// An empty column stream yields a catalog with no tables; the caller treats
/// that as "nothing to process". Indexes and foreign keys on tables that are
/// not part of the catalog are dropped.
pub fn build_catalog(rows: CatalogRows, options: &BuildOptions) -> BuildOutput {
    let mut catalog = SchemaCatalog::default();
    let mut diagnostics = Diagnostics::new();

    let mut ctx = TableContext::new();
    for row in rows.columns {
        accept_column(&mut ctx, row, &mut catalog, &mut diagnostics);
    }
    flush_table(&mut ctx, &mut catalog);

    for row in rows.table_comments {
        if let Some(table) = catalog
            .tables
            .iter_mut()
            .find(|t| t.schema == row.schema && t.name == row.table)
        {
            table.comment = Some(row.comment).filter(|c| !c.is_empty());
        }
    }

    for row in rows.user_types {
        catalog.note_schema(&row.schema);
        catalog.user_types.push(user_type_descriptor(row));
    }

    for row in rows.sequences {
        catalog.note_schema(&row.schema);
        catalog.sequences.push(sequence_descriptor(row));
    }

    let known: HashSet<(String, String)> = catalog
        .tables
        .iter()
        .map(|t| (t.schema.clone(), t.name.clone()))
        .collect();
    let has_table = |schema: &str, table: &str| known.contains(&(schema.to_string(), table.to_string()));

    catalog.indexes = group_indexes(&rows.indexes, &mut diagnostics)
        .into_iter()
        .filter(|idx| has_table(&idx.schema, &idx.table))
        .collect();

    let foreign_keys = build_foreign_keys(&rows.foreign_keys, &options.foreign_key_suffix, &mut diagnostics);
    for fk in foreign_keys {
        if !has_table(&fk.schema, &fk.table) {
            continue;
        }
        if !has_table(&fk.ref_schema, &fk.ref_table) {
            diagnostics.record(
                DiagnosticKind::InvalidForeignKey,
                format!("{}.{}.{}", fk.schema, fk.table, fk.source_name),
                format!(
                    "references {}.{}, which is not being converted",
                    fk.ref_schema, fk.ref_table
                ),
            );
            continue;
        }
        catalog.foreign_keys.push(fk);
    }

    info!(
        "Built catalog: {} schemas, {} tables, {} columns, {} user types, {} sequences, {} indexes, {} foreign keys",
        catalog.schemas.len(),
        catalog.tables.len(),
        catalog.column_count(),
        catalog.user_types.len(),
        catalog.sequences.len(),
        catalog.indexes.len(),
        catalog.foreign_keys.len()
    );

    BuildOutput {
        catalog,
        diagnostics: diagnostics.into_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IndexKind;
    use crate::source::memory::test_support::{column_row, fk_row, index_row, sequence_row};

    #[test]
    fn test_empty_stream_gives_empty_catalog() {
        let output = build_catalog(CatalogRows::default(), &BuildOptions::default());
        assert!(output.catalog.is_empty());
        assert!(output.catalog.schemas.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_single_table_flushed_at_end() {
        let mut ctx = TableContext::new();
        let mut catalog = SchemaCatalog::default();
        let mut diags = Diagnostics::new();

        accept_column(
            &mut ctx,
            column_row("sales", "orders", "id", 1, "integer"),
            &mut catalog,
            &mut diags,
        );
        accept_column(
            &mut ctx,
            column_row("sales", "orders", "total", 2, "numeric"),
            &mut catalog,
            &mut diags,
        );
        // Nothing is emitted until the stream ends
        assert!(catalog.tables.is_empty());

        flush_table(&mut ctx, &mut catalog);
        assert_eq!(catalog.tables.len(), 1);
        assert_eq!(catalog.tables[0].columns.len(), 2);

        // A second flush is a no-op
        flush_table(&mut ctx, &mut catalog);
        assert_eq!(catalog.tables.len(), 1);
    }

    #[test]
    fn test_groups_by_table_and_records_schemas_in_order() {
        let rows = CatalogRows {
            columns: vec![
                column_row("sales", "customers", "id", 1, "integer"),
                column_row("sales", "orders", "id", 1, "integer"),
                column_row("sales", "orders", "customer_id", 2, "integer"),
                column_row("hr", "staff", "id", 1, "integer"),
            ],
            ..Default::default()
        };
        let output = build_catalog(rows, &BuildOptions::default());
        let catalog = output.catalog;

        assert_eq!(catalog.schemas, vec!["sales", "hr"]);
        let tables: Vec<_> = catalog.tables.iter().map(|t| t.full_name()).collect();
        assert_eq!(tables, vec!["sales.customers", "sales.orders", "hr.staff"]);
        assert_eq!(catalog.table("sales", "orders").unwrap().columns.len(), 2);
    }

    #[test]
    fn test_same_table_name_in_two_schemas_split() {
        let rows = CatalogRows {
            columns: vec![
                column_row("a", "items", "id", 1, "integer"),
                column_row("b", "items", "id", 1, "integer"),
            ],
            ..Default::default()
        };
        let output = build_catalog(rows, &BuildOptions::default());
        assert_eq!(output.catalog.tables.len(), 2);
    }

    #[test]
    fn test_duplicate_column_dropped() {
        let rows = CatalogRows {
            columns: vec![
                column_row("sales", "orders", "id", 1, "integer"),
                column_row("sales", "orders", "id", 2, "bigint"),
            ],
            ..Default::default()
        };
        let output = build_catalog(rows, &BuildOptions::default());
        let table = &output.catalog.tables[0];
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.columns[0].source_type, "integer");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].kind, DiagnosticKind::DuplicateColumn);
    }

    #[test]
    fn test_comments_sequences_indexes_and_foreign_keys_attached() {
        let rows = CatalogRows {
            columns: vec![
                column_row("sales", "customers", "id", 1, "integer"),
                column_row("sales", "orders", "id", 1, "integer"),
                column_row("sales", "orders", "customer_id", 2, "integer"),
            ],
            table_comments: vec![TableCommentRow {
                schema: "sales".into(),
                table: "orders".into(),
                comment: "Customer orders".into(),
            }],
            sequences: vec![sequence_row("orders_id_seq", "integer", 9_000_000_000)],
            indexes: vec![
                index_row("sales", "orders", "orders_pkey", true, true, Some("id"), 1),
                index_row("sales", "ghost", "ghost_pkey", true, true, Some("id"), 1),
            ],
            foreign_keys: vec![
                fk_row("orders", "orders_customer_id_fkey", &["customer_id"], "customers", &["id"]),
                fk_row("orders", "orders_region_fkey", &["region_id"], "regions", &["id"]),
            ],
            ..Default::default()
        };
        let output = build_catalog(rows, &BuildOptions::default());
        let catalog = output.catalog;

        assert_eq!(
            catalog.table("sales", "orders").unwrap().comment.as_deref(),
            Some("Customer orders")
        );
        assert_eq!(catalog.sequences.len(), 1);
        assert!(!catalog.sequences[0].is_called);
        assert_eq!(catalog.indexes.len(), 1);
        assert_eq!(catalog.indexes[0].kind, IndexKind::PrimaryKey);
        assert_eq!(catalog.foreign_keys.len(), 1);
        assert_eq!(catalog.foreign_keys[0].name, "FK_orders_customer_id");
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::InvalidForeignKey));
    }

    #[test]
    fn test_called_sequence_keeps_last_value() {
        let mut row = sequence_row("orders_id_seq", "bigint", i64::MAX);
        row.last_value = Some(41);
        let rows = CatalogRows {
            sequences: vec![row],
            ..Default::default()
        };
        let output = build_catalog(rows, &BuildOptions::default());
        let seq = &output.catalog.sequences[0];
        assert!(seq.is_called);
        assert_eq!(seq.last_value, 41);
    }
}
