//! Core types shared by every stage of the conversion.
//!
//! - [`schema`]: structured catalog model (tables, columns, sequences, ...)
//! - [`diagnostics`]: recoverable per-object problems
//! - [`traits`]: the catalog reader and type mapper seams
//! - [`identifier`]: identifier validation and quoting

pub mod diagnostics;
pub mod identifier;
pub mod schema;
pub mod traits;

// Re-export commonly used types for convenience
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use schema::{
    ColumnDescriptor, DefaultValueSpec, ForeignKeyDescriptor, IndexColumn, IndexDescriptor,
    IndexKind, ReferentialAction, SchemaCatalog, SequenceDescriptor, SortDirection,
    TableDescriptor, UserTypeDescriptor,
};
pub use traits::{CatalogReader, ColumnMapping, TypeMapper, TypeMapping};
