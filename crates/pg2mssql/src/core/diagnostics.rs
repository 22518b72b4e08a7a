//! Recoverable conditions found while converting a catalog.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Category of a recovered problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Type had no mapping and was passed through unchanged.
    UnmappableType,
    /// Default expression had no target equivalent and was omitted.
    UnsupportedDefault,
    /// A catalog query failed; its rows were treated as empty.
    CatalogQueryFailure,
    /// Foreign key row with mismatched column lists.
    InvalidForeignKey,
    /// Second column row with a name already seen in the same table.
    DuplicateColumn,
    /// Index key that is an expression rather than a column.
    ExpressionIndex,
    /// More than one primary key recorded for a table.
    ExtraPrimaryKey,
    /// Object name that cannot be emitted.
    InvalidIdentifier,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::UnmappableType => "unmappable type",
            DiagnosticKind::UnsupportedDefault => "unsupported default",
            DiagnosticKind::CatalogQueryFailure => "catalog query failure",
            DiagnosticKind::InvalidForeignKey => "invalid foreign key",
            DiagnosticKind::DuplicateColumn => "duplicate column",
            DiagnosticKind::ExpressionIndex => "expression index",
            DiagnosticKind::ExtraPrimaryKey => "extra primary key",
            DiagnosticKind::InvalidIdentifier => "invalid identifier",
        };
        f.write_str(s)
    }
}

/// A single recovered problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Qualified name of the affected object.
    pub object: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}: {}", self.kind, self.object, self.message)
    }
}

/// Accumulates diagnostics for one pipeline stage.
///
/// Every recorded diagnostic is also logged at WARN level.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a diagnostic.
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        object: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            object: object.into(),
            message: message.into(),
        };
        warn!(kind = %diagnostic.kind, object = %diagnostic.object, "{}", diagnostic.message);
        self.entries.push(diagnostic);
    }

    /// Append diagnostics collected elsewhere without logging them again.
    pub fn extend(&mut self, other: Vec<Diagnostic>) {
        self.entries.extend(other);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_count() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.record(DiagnosticKind::UnmappableType, "sales.orders.shape", "box");
        diags.record(
            DiagnosticKind::UnsupportedDefault,
            "sales.orders.total",
            "'0'::money",
        );
        diags.record(DiagnosticKind::UnmappableType, "sales.orders.area", "polygon");

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count(DiagnosticKind::UnmappableType), 2);
        assert_eq!(diags.count(DiagnosticKind::ExtraPrimaryKey), 0);
    }

    #[test]
    fn test_display_names_object() {
        let d = Diagnostic {
            kind: DiagnosticKind::InvalidForeignKey,
            object: "sales.orders".into(),
            message: "2 local columns but 1 referenced".into(),
        };
        assert_eq!(
            d.to_string(),
            "invalid foreign key on sales.orders: 2 local columns but 1 referenced"
        );
    }
}
