//! Sequence range resolution.
//!
//! A sequence is clamped to the type of the column it feeds, not its own
//! declared type: a `bigint` sequence behind an `integer` column can never
//! hand out more than `int` holds on SQL Server.

use tracing::debug;

use crate::core::{DefaultValueSpec, SchemaCatalog, SequenceDescriptor, TypeMapper};

use super::defaults::translate;

/// Maximum value after clamping to what `target_type` can hold.
pub fn resolve(sequence: &SequenceDescriptor, target_type: &str, mapper: &dyn TypeMapper) -> i64 {
    match mapper.max_value_for_type(target_type) {
        Some(capacity) => sequence.max_value.min(capacity),
        None => sequence.max_value,
    }
}

/// Source type of the column a sequence feeds.
///
/// The owning column recorded in the catalog wins, then the first column
/// whose default calls `nextval` on the sequence, then the sequence's own
/// declared type.
pub fn feeding_type<'a>(catalog: &'a SchemaCatalog, sequence: &'a SequenceDescriptor) -> &'a str {
    if let Some(owner) = sequence.owner_type.as_deref() {
        return owner;
    }

    for table in &catalog.tables {
        for col in &table.columns {
            let Some(raw) = col.default.as_deref() else {
                continue;
            };
            if let DefaultValueSpec::SequenceNextValue { schema, sequence: name } =
                translate(&table.schema, raw)
            {
                if schema == sequence.schema && name == sequence.name {
                    return col.element_type();
                }
            }
        }
    }

    &sequence.data_type
}

/// Resolve target types and clamp maxima for every sequence.
///
/// Returns the number of sequences whose maximum changed.
pub fn apply(catalog: &mut SchemaCatalog, mapper: &dyn TypeMapper) -> usize {
    let targets: Vec<String> = catalog
        .sequences
        .iter()
        .map(|sequence| mapper.map_type(feeding_type(catalog, sequence)).target_type)
        .collect();

    let mut clamped = 0;
    for (sequence, target_type) in catalog.sequences.iter_mut().zip(targets) {
        sequence.target_type = target_type;
        let adjusted = resolve(sequence, &sequence.target_type, mapper);
        if adjusted != sequence.max_value {
            debug!(
                "Clamped {} maximum from {} to {} ({})",
                sequence.full_name(),
                sequence.max_value,
                adjusted,
                sequence.target_type
            );
            sequence.max_value = adjusted;
            clamped += 1;
        }
    }
    clamped
}

/// Value the target sequence should start at so it continues where the
/// source left off, kept inside [min, max].
pub fn resume_value(sequence: &SequenceDescriptor) -> i64 {
    let next = if sequence.is_called {
        sequence.last_value.saturating_add(sequence.increment)
    } else {
        sequence.last_value
    };
    if sequence.min_value <= sequence.max_value {
        next.clamp(sequence.min_value, sequence.max_value)
    } else {
        next
    }
}
