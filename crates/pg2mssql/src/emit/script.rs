//! Script artifacts: ordered batches of statements.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use super::statement::Statement;

/// Batch separator.
const GO: &str = "GO";

/// The fixed set of generated scripts, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    CreateSchemas,
    CreateTypes,
    DropTypes,
    CreateTables,
    DropTables,
    TruncateTables,
    CreateIndexes,
    CreateForeignKeys,
}

impl ArtifactKind {
    /// All artifacts in the order they are produced.
    pub const ALL: [ArtifactKind; 8] = [
        ArtifactKind::CreateSchemas,
        ArtifactKind::CreateTypes,
        ArtifactKind::DropTypes,
        ArtifactKind::CreateTables,
        ArtifactKind::DropTables,
        ArtifactKind::TruncateTables,
        ArtifactKind::CreateIndexes,
        ArtifactKind::CreateForeignKeys,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::CreateSchemas => "create_schemas.sql",
            ArtifactKind::CreateTypes => "create_types.sql",
            ArtifactKind::DropTypes => "drop_types.sql",
            ArtifactKind::CreateTables => "create_tables.sql",
            ArtifactKind::DropTables => "drop_tables.sql",
            ArtifactKind::TruncateTables => "truncate_tables.sql",
            ArtifactKind::CreateIndexes => "create_indexes.sql",
            ArtifactKind::CreateForeignKeys => "create_foreign_keys.sql",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// One output script.
///
/// The `USE` header and the transaction envelope are added when the script
/// is rendered; `batches` holds only the content statements.
#[derive(Debug, Clone)]
pub struct Script {
    pub kind: ArtifactKind,
    database: Option<String>,
    batches: Vec<Vec<Statement>>,
}

impl Script {
    pub fn new(kind: ArtifactKind, database: Option<String>) -> Self {
        Self {
            kind,
            database,
            batches: Vec::new(),
        }
    }

    /// Append a batch; empty batches are ignored.
    pub fn push_batch(&mut self, batch: Vec<Statement>) {
        if !batch.is_empty() {
            self.batches.push(batch);
        }
    }

    /// Append a single statement as its own batch.
    pub fn push(&mut self, statement: Statement) {
        self.batches.push(vec![statement]);
    }

    pub fn batches(&self) -> &[Vec<Statement>] {
        &self.batches
    }

    /// Content statements, excluding header and envelope.
    pub fn statement_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.batches.iter().flatten()
    }

    /// Write the full script text.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if let Some(db) = &self.database {
            writeln!(out, "{}", Statement::UseDatabase(db.clone()))?;
            writeln!(out, "{}\n", GO)?;
        }

        writeln!(out, "{}", Statement::BeginTransaction)?;
        writeln!(out, "{}\n", GO)?;

        for batch in &self.batches {
            for statement in batch {
                writeln!(out, "{}", statement)?;
            }
            writeln!(out, "{}\n", GO)?;
        }

        writeln!(out, "{}", Statement::CommitTransaction)?;
        writeln!(out, "{}", GO)?;
        Ok(())
    }

    /// Render to a string.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_unique() {
        let mut names: Vec<_> = ArtifactKind::ALL.iter().map(|k| k.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ArtifactKind::ALL.len());
    }

    #[test]
    fn test_render_envelope_and_batches() {
        let mut script = Script::new(ArtifactKind::CreateSchemas, Some("Inventory".into()));
        script.push(Statement::CreateSchema("sales".into()));
        script.push(Statement::CreateSchema("hr".into()));

        let text = script.render();
        let expected = "USE [Inventory];\nGO\n\n\
                        BEGIN TRANSACTION;\nGO\n\n\
                        CREATE SCHEMA [sales];\nGO\n\n\
                        CREATE SCHEMA [hr];\nGO\n\n\
                        COMMIT TRANSACTION;\nGO\n";
        assert_eq!(text, expected);
        assert_eq!(script.statement_count(), 2);
    }

    #[test]
    fn test_no_use_header_without_database() {
        let mut script = Script::new(ArtifactKind::TruncateTables, None);
        script.push_batch(vec![]);
        assert!(script.batches().is_empty());
        assert!(script.render().starts_with("BEGIN TRANSACTION;"));
    }
}
