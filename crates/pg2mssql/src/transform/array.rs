//! Array column flattening.
//!
//! SQL Server has no array types, so an array column whose sampled maximum
//! cardinality is M > 1 becomes M scalar columns `name1..nameM`. The numeric
//! suffix is zero-padded to the number of digits in M, at most three.

use std::collections::HashMap;

use tracing::debug;

use crate::core::{ColumnDescriptor, IndexColumn, SchemaCatalog};

/// Observed cardinalities keyed by (schema, table, column).
pub type Cardinalities = HashMap<(String, String, String), i64>;

/// Columns produced from one source column.
#[derive(Debug, Clone)]
pub struct FlattenResult {
    pub columns: Vec<ColumnDescriptor>,
}

impl FlattenResult {
    pub fn was_expanded(&self) -> bool {
        self.columns.len() > 1
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Counts reported by [`flatten_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenSummary {
    /// Array columns replaced by more than one column.
    pub expanded: usize,
    /// Columns generated for them.
    pub generated: usize,
}

/// Zero-padding width for M generated columns: the digit count of M,
/// never more than three.
pub fn suffix_width(count: i64) -> usize {
    count.max(1).to_string().len().min(3)
}

/// Type text with array brackets removed ("character varying(20)[]" → "character varying(20)").
fn strip_array_suffix(ty: &str) -> String {
    let mut out = ty.trim();
    while let Some(stripped) = out.strip_suffix("[]") {
        out = stripped.trim_end();
    }
    out.to_string()
}

fn scalar_from(col: &ColumnDescriptor, name: String, cardinality: i64) -> ColumnDescriptor {
    ColumnDescriptor {
        name,
        source_type: col.element_type().to_string(),
        formatted_type: strip_array_suffix(&col.formatted_type),
        array_dims: 0,
        max_cardinality: cardinality,
        ..col.clone()
    }
}

/// Flatten one column given its observed cardinality.
///
/// Scalars are returned unchanged. Arrays with an unknown cardinality or at
/// most one element become a single scalar column under the original name.
/// Only the first generated column keeps the default and the comment.
pub fn flatten_column(col: &ColumnDescriptor, cardinality: Option<i64>) -> FlattenResult {
    if !col.is_array() {
        return FlattenResult {
            columns: vec![col.clone()],
        };
    }

    let count = cardinality.unwrap_or(0);
    if count <= 1 {
        return FlattenResult {
            columns: vec![scalar_from(col, col.name.clone(), count.max(0))],
        };
    }

    let width = suffix_width(count);
    let columns = (1..=count)
        .map(|i| {
            let mut generated = scalar_from(col, format!("{}{:0width$}", col.name, i), count);
            if i > 1 {
                generated.default = None;
                generated.comment = None;
            }
            generated
        })
        .collect();

    FlattenResult { columns }
}

/// Flatten every array column in the catalog.
///
/// Ordinals are renumbered so generated columns sit where the array column
/// was. Index keys on a flattened column expand to all generated columns.
pub fn flatten_catalog(catalog: &mut SchemaCatalog, cardinalities: &Cardinalities) -> FlattenSummary {
    let mut summary = FlattenSummary::default();
    let mut replaced: HashMap<(String, String, String), Vec<String>> = HashMap::new();

    for table in &mut catalog.tables {
        if !table.columns.iter().any(|c| c.is_array()) {
            continue;
        }

        let mut columns = Vec::with_capacity(table.columns.len());
        for col in &table.columns {
            let key = (table.schema.clone(), table.name.clone(), col.name.clone());
            let result = flatten_column(col, cardinalities.get(&key).copied());
            if result.was_expanded() {
                summary.expanded += 1;
                summary.generated += result.columns.len();
                debug!(
                    "Flattened {}.{}.{} into {} columns",
                    table.schema,
                    table.name,
                    col.name,
                    result.columns.len()
                );
                replaced.insert(key, result.names());
            }
            columns.extend(result.columns);
        }

        for (i, col) in columns.iter_mut().enumerate() {
            col.ordinal = i as i32 + 1;
        }
        table.columns = columns;
    }

    if replaced.is_empty() {
        return summary;
    }

    for index in &mut catalog.indexes {
        let mut keys = Vec::with_capacity(index.columns.len());
        for key in &index.columns {
            let lookup = (index.schema.clone(), index.table.clone(), key.name.clone());
            match replaced.get(&lookup) {
                Some(names) => keys.extend(names.iter().map(|name| IndexColumn {
                    name: name.clone(),
                    direction: key.direction,
                })),
                None => keys.push(key.clone()),
            }
        }
        index.columns = keys;
    }

    summary
}

/// Record the sampled byte length of scalar `bytea` columns as their size.
///
/// Columns without a sample keep no size and are emitted as `varbinary(max)`.
/// Returns the number of columns sized.
pub fn size_binary_columns(catalog: &mut SchemaCatalog, cardinalities: &Cardinalities) -> usize {
    let mut sized = 0;
    for table in &mut catalog.tables {
        for col in &mut table.columns {
            if col.is_array() || !col.source_type.trim().eq_ignore_ascii_case("bytea") {
                continue;
            }
            let key = (table.schema.clone(), table.name.clone(), col.name.clone());
            if let Some(length) = cardinalities.get(&key).copied().filter(|n| *n > 0) {
                col.max_char_size = i32::try_from(length).ok();
                sized += 1;
            }
        }
    }
    sized
}
