//! Foreign key naming and validation.

use std::collections::HashMap;

use crate::core::{DiagnosticKind, Diagnostics, ForeignKeyDescriptor, ReferentialAction};
use crate::source::rows::ForeignKeyRow;

/// Target base name for a catalog constraint name.
///
/// The configured suffix is stripped once and `FK_` is prefixed:
/// `orders_customer_id_fkey` becomes `FK_orders_customer_id`.
pub fn base_name(constraint_name: &str, suffix: &str) -> String {
    let stem = if suffix.is_empty() {
        constraint_name
    } else {
        constraint_name
            .strip_suffix(suffix)
            .filter(|s| !s.is_empty())
            .unwrap_or(constraint_name)
    };
    format!("FK_{}", stem)
}

/// Build foreign key descriptors in catalog scan order.
///
/// Rows whose local and referenced column lists differ in length are
/// dropped. Within a table, a base name seen before gets a 0-based
/// occurrence counter appended (second occurrence `1`, third `2`, ...).
pub fn build_foreign_keys(
    rows: &[ForeignKeyRow],
    suffix: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<ForeignKeyDescriptor> {
    let mut seen: HashMap<(String, String, String), usize> = HashMap::new();
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        if row.columns.is_empty() || row.columns.len() != row.ref_columns.len() {
            diagnostics.record(
                DiagnosticKind::InvalidForeignKey,
                format!("{}.{}.{}", row.schema, row.table, row.constraint_name),
                format!(
                    "{} local columns but {} referenced columns",
                    row.columns.len(),
                    row.ref_columns.len()
                ),
            );
            continue;
        }

        let base = base_name(&row.constraint_name, suffix);
        let occurrence = seen
            .entry((row.schema.clone(), row.table.clone(), base.clone()))
            .or_insert(0);
        let name = if *occurrence == 0 {
            base
        } else {
            format!("{}{}", base, occurrence)
        };
        *occurrence += 1;

        out.push(ForeignKeyDescriptor {
            name,
            source_name: row.constraint_name.clone(),
            schema: row.schema.clone(),
            table: row.table.clone(),
            ref_schema: row.ref_schema.clone(),
            ref_table: row.ref_table.clone(),
            columns: row.columns.clone(),
            ref_columns: row.ref_columns.clone(),
            on_delete: ReferentialAction::from_pg_code(&row.on_delete),
            on_update: ReferentialAction::from_pg_code(&row.on_update),
        });
    }

    out
}
