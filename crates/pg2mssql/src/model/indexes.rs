//! Index row grouping.
//!
//! Index rows arrive one per key column, sorted by (schema, table, index,
//! key position). A two-state machine folds consecutive rows with the same
//! key into one [`IndexDescriptor`]; the caller must call [`finish`] once
//! the stream ends so the last index is not lost.

use std::collections::HashSet;

use tracing::debug;

use crate::core::{
    DiagnosticKind, Diagnostics, IndexColumn, IndexDescriptor, IndexKind, SortDirection,
};
use crate::source::rows::IndexRow;

/// An index being assembled.
#[derive(Debug)]
pub struct PendingIndex {
    descriptor: IndexDescriptor,
    has_expression: bool,
}

impl PendingIndex {
    fn start(row: &IndexRow) -> Self {
        let kind = if row.is_primary {
            IndexKind::PrimaryKey
        } else if row.is_unique {
            IndexKind::Unique
        } else {
            IndexKind::Plain
        };
        Self {
            descriptor: IndexDescriptor {
                schema: row.schema.clone(),
                table: row.table.clone(),
                name: row.index_name.clone(),
                kind,
                columns: Vec::new(),
            },
            has_expression: false,
        }
    }

    fn same_index(&self, row: &IndexRow) -> bool {
        self.descriptor.schema == row.schema
            && self.descriptor.table == row.table
            && self.descriptor.name == row.index_name
    }

    fn add(&mut self, row: &IndexRow) {
        match &row.column {
            Some(column) => self.descriptor.columns.push(IndexColumn {
                name: column.clone(),
                direction: SortDirection::from_option(row.options),
            }),
            None => self.has_expression = true,
        }
    }
}

/// Grouping state.
#[derive(Debug, Default)]
pub enum IndexState {
    #[default]
    Idle,
    Accumulating(PendingIndex),
}

/// Output of index grouping.
#[derive(Debug, Default)]
pub struct IndexGrouping {
    pub indexes: Vec<IndexDescriptor>,
    primary_keys: HashSet<(String, String)>,
}

/// Feed one row, returning the next state.
pub fn step(
    state: IndexState,
    row: &IndexRow,
    out: &mut IndexGrouping,
    diagnostics: &mut Diagnostics,
) -> IndexState {
    match state {
        IndexState::Idle => {
            let mut pending = PendingIndex::start(row);
            pending.add(row);
            IndexState::Accumulating(pending)
        }
        IndexState::Accumulating(mut pending) if pending.same_index(row) => {
            pending.add(row);
            IndexState::Accumulating(pending)
        }
        IndexState::Accumulating(pending) => {
            close(pending, out, diagnostics);
            step(IndexState::Idle, row, out, diagnostics)
        }
    }
}

/// Flush the index still being accumulated, if any.
pub fn finish(state: IndexState, out: &mut IndexGrouping, diagnostics: &mut Diagnostics) {
    if let IndexState::Accumulating(pending) = state {
        close(pending, out, diagnostics);
    }
}

fn close(pending: PendingIndex, out: &mut IndexGrouping, diagnostics: &mut Diagnostics) {
    let mut index = pending.descriptor;
    let object = format!("{}.{}.{}", index.schema, index.table, index.name);

    // A partial column list would change what the index enforces.
    if pending.has_expression || index.columns.is_empty() {
        diagnostics.record(
            DiagnosticKind::ExpressionIndex,
            object,
            "index has expression keys and was not converted",
        );
        return;
    }

    if index.kind == IndexKind::PrimaryKey {
        let table_key = (index.schema.clone(), index.table.clone());
        if !out.primary_keys.insert(table_key) {
            diagnostics.record(
                DiagnosticKind::ExtraPrimaryKey,
                object,
                "table already has a primary key; converted as a unique constraint",
            );
            index.kind = IndexKind::Unique;
        }
    }

    debug!(
        "Grouped {:?} {} on {}.{} ({} columns)",
        index.kind,
        index.name,
        index.schema,
        index.table,
        index.columns.len()
    );
    out.indexes.push(index);
}

/// Group a full stream of index rows.
pub fn group_indexes(rows: &[IndexRow], diagnostics: &mut Diagnostics) -> Vec<IndexDescriptor> {
    let mut out = IndexGrouping::default();
    let mut state = IndexState::Idle;
    for row in rows {
        state = step(state, row, &mut out, diagnostics);
    }
    finish(state, &mut out, diagnostics);
    out.indexes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::test_support::index_row;

    #[test]
    fn test_primary_and_unique_do_not_mix_columns() {
        let rows = vec![
            index_row("sales", "orders", "orders_pkey", true, true, Some("id"), 1),
            index_row("sales", "orders", "orders_ref_key", false, true, Some("ref"), 1),
            index_row("sales", "orders", "orders_ref_key", false, true, Some("region"), 2),
        ];
        let mut diags = Diagnostics::new();
        let indexes = group_indexes(&rows, &mut diags);

        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].kind, IndexKind::PrimaryKey);
        assert_eq!(indexes[0].columns.len(), 1);
        assert_eq!(indexes[0].columns[0].name, "id");
        assert_eq!(indexes[1].kind, IndexKind::Unique);
        let names: Vec<_> = indexes[1].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ref", "region"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_last_index_flushed() {
        let rows = vec![index_row("sales", "orders", "orders_pkey", true, true, Some("id"), 1)];
        let mut diags = Diagnostics::new();

        let mut out = IndexGrouping::default();
        let state = step(IndexState::Idle, &rows[0], &mut out, &mut diags);
        assert!(out.indexes.is_empty());
        assert!(matches!(state, IndexState::Accumulating(_)));

        finish(state, &mut out, &mut diags);
        assert_eq!(out.indexes.len(), 1);
    }

    #[test]
    fn test_same_index_name_on_different_tables_split() {
        let rows = vec![
            index_row("sales", "a", "idx_created", false, false, Some("created"), 1),
            index_row("sales", "b", "idx_created", false, false, Some("created"), 1),
        ];
        let mut diags = Diagnostics::new();
        let indexes = group_indexes(&rows, &mut diags);
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].table, "a");
        assert_eq!(indexes[1].table, "b");
        assert_eq!(indexes[1].kind, IndexKind::Plain);
    }

    #[test]
    fn test_descending_option() {
        let mut row = index_row("sales", "orders", "idx_created", false, false, Some("created"), 1);
        row.options = 3;
        let mut diags = Diagnostics::new();
        let indexes = group_indexes(&[row], &mut diags);
        assert_eq!(indexes[0].columns[0].direction, SortDirection::Desc);
    }

    #[test]
    fn test_expression_index_skipped() {
        let rows = vec![
            index_row("sales", "orders", "idx_lower_ref", false, false, None, 1),
            index_row("sales", "orders", "idx_region", false, false, Some("region"), 1),
        ];
        let mut diags = Diagnostics::new();
        let indexes = group_indexes(&rows, &mut diags);
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].name, "idx_region");
        assert_eq!(diags.count(DiagnosticKind::ExpressionIndex), 1);
    }

    #[test]
    fn test_second_primary_key_demoted() {
        let rows = vec![
            index_row("sales", "orders", "orders_pkey", true, true, Some("id"), 1),
            index_row("sales", "orders", "orders_pkey2", true, true, Some("ref"), 1),
        ];
        let mut diags = Diagnostics::new();
        let indexes = group_indexes(&rows, &mut diags);
        assert_eq!(indexes[0].kind, IndexKind::PrimaryKey);
        assert_eq!(indexes[1].kind, IndexKind::Unique);
        assert_eq!(diags.count(DiagnosticKind::ExtraPrimaryKey), 1);
    }
}
