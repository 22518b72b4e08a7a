//! Structured T-SQL statements.
//!
//! Statements carry raw (validated) names; bracket quoting and string
//! escaping happen only in the [`Display`](fmt::Display) implementation.

use std::fmt;

use crate::core::identifier::{bracket, mssql_string_literal};
use crate::core::{IndexColumn, ReferentialAction};

/// Index options appended to every plain index.
const INDEX_OPTIONS: &str = "PAD_INDEX = OFF, STATISTICS_NORECOMPUTE = OFF, SORT_IN_TEMPDB = OFF, \
     DROP_EXISTING = OFF, ONLINE = OFF, ALLOW_ROW_LOCKS = ON, ALLOW_PAGE_LOCKS = ON";

/// Schema-qualified object name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    pub schema: String,
    pub name: String,
}

impl ObjectName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// The bracketed name as an `N'...'` literal, for `OBJECT_ID` / `TYPE_ID`.
    fn as_literal(&self) -> String {
        mssql_string_literal(&self.to_string())
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", bracket(&self.schema), bracket(&self.name))
    }
}

/// One column of a `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Fully rendered type, e.g. `varchar(40)` or `[sales].[amount]`.
    pub data_type: String,
    pub nullable: bool,
}

/// Target of an `sp_addextendedproperty` description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionTarget {
    Table,
    Column(String),
}

/// Referential actions rendered on a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyActionClause {
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

/// A single T-SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    UseDatabase(String),
    BeginTransaction,
    CommitTransaction,
    SetOption {
        option: &'static str,
        on: bool,
    },
    CreateSchema(String),
    CreateType {
        name: ObjectName,
        base_type: String,
        not_null: bool,
    },
    DropType(ObjectName),
    CreateSequence {
        name: ObjectName,
        data_type: String,
        start: i64,
        increment: i64,
        min_value: i64,
        max_value: i64,
        cache: i64,
        cycle: bool,
    },
    DropSequence(ObjectName),
    CreateTable {
        name: ObjectName,
        columns: Vec<ColumnDefinition>,
    },
    DropTable(ObjectName),
    TruncateTable(ObjectName),
    AddDefault {
        table: ObjectName,
        constraint: String,
        column: String,
        expression: String,
    },
    AddDescription {
        table: ObjectName,
        target: DescriptionTarget,
        text: String,
    },
    AddPrimaryKey {
        table: ObjectName,
        constraint: String,
        columns: Vec<IndexColumn>,
    },
    AddUnique {
        table: ObjectName,
        constraint: String,
        columns: Vec<IndexColumn>,
    },
    CreateIndex {
        table: ObjectName,
        name: String,
        columns: Vec<IndexColumn>,
    },
    AddForeignKey {
        table: ObjectName,
        constraint: String,
        columns: Vec<String>,
        referenced: ObjectName,
        ref_columns: Vec<String>,
        actions: Option<ForeignKeyActionClause>,
    },
    DropForeignKey {
        table: ObjectName,
        constraint: String,
    },
}

fn key_list(columns: &[IndexColumn]) -> String {
    columns
        .iter()
        .map(|c| format!("{} {}", bracket(&c.name), c.direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn name_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| bracket(c))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::UseDatabase(db) => write!(f, "USE {};", bracket(db)),
            Statement::BeginTransaction => f.write_str("BEGIN TRANSACTION;"),
            Statement::CommitTransaction => f.write_str("COMMIT TRANSACTION;"),
            Statement::SetOption { option, on } => {
                write!(f, "SET {} {};", option, if *on { "ON" } else { "OFF" })
            }
            Statement::CreateSchema(schema) => write!(f, "CREATE SCHEMA {};", bracket(schema)),
            Statement::CreateType {
                name,
                base_type,
                not_null,
            } => write!(
                f,
                "CREATE TYPE {} FROM {} {};",
                name,
                base_type,
                if *not_null { "NOT NULL" } else { "NULL" }
            ),
            Statement::DropType(name) => write!(
                f,
                "IF TYPE_ID({}) IS NOT NULL DROP TYPE {};",
                name.as_literal(),
                name
            ),
            Statement::CreateSequence {
                name,
                data_type,
                start,
                increment,
                min_value,
                max_value,
                cache,
                cycle,
            } => {
                write!(
                    f,
                    "CREATE SEQUENCE {} AS {} START WITH {} INCREMENT BY {} MINVALUE {} MAXVALUE {} ",
                    name, data_type, start, increment, min_value, max_value
                )?;
                if *cache > 1 {
                    write!(f, "CACHE {} ", cache)?;
                } else {
                    f.write_str("NO CACHE ")?;
                }
                f.write_str(if *cycle { "CYCLE;" } else { "NO CYCLE;" })
            }
            Statement::DropSequence(name) => write!(
                f,
                "IF OBJECT_ID({}, N'SO') IS NOT NULL DROP SEQUENCE {};",
                name.as_literal(),
                name
            ),
            Statement::CreateTable { name, columns } => {
                writeln!(f, "CREATE TABLE {} (", name)?;
                for (i, col) in columns.iter().enumerate() {
                    write!(
                        f,
                        "    {} {} {}",
                        bracket(&col.name),
                        col.data_type,
                        if col.nullable { "NULL" } else { "NOT NULL" }
                    )?;
                    if i + 1 < columns.len() {
                        f.write_str(",")?;
                    }
                    f.write_str("\n")?;
                }
                f.write_str(") ON [PRIMARY];")
            }
            Statement::DropTable(name) => write!(
                f,
                "IF OBJECT_ID({}, N'U') IS NOT NULL DROP TABLE {};",
                name.as_literal(),
                name
            ),
            Statement::TruncateTable(name) => write!(f, "TRUNCATE TABLE {};", name),
            Statement::AddDefault {
                table,
                constraint,
                column,
                expression,
            } => write!(
                f,
                "ALTER TABLE {} ADD CONSTRAINT {} DEFAULT ({}) FOR {};",
                table,
                bracket(constraint),
                expression,
                bracket(column)
            ),
            Statement::AddDescription {
                table,
                target,
                text,
            } => {
                write!(
                    f,
                    "EXEC sys.sp_addextendedproperty @name = N'MS_Description', @value = {}, \
                     @level0type = N'SCHEMA', @level0name = {}, \
                     @level1type = N'TABLE', @level1name = {}",
                    mssql_string_literal(text),
                    mssql_string_literal(&table.schema),
                    mssql_string_literal(&table.name)
                )?;
                if let DescriptionTarget::Column(column) = target {
                    write!(
                        f,
                        ", @level2type = N'COLUMN', @level2name = {}",
                        mssql_string_literal(column)
                    )?;
                }
                f.write_str(";")
            }
            Statement::AddPrimaryKey {
                table,
                constraint,
                columns,
            } => write!(
                f,
                "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY CLUSTERED ({});",
                table,
                bracket(constraint),
                key_list(columns)
            ),
            Statement::AddUnique {
                table,
                constraint,
                columns,
            } => write!(
                f,
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE NONCLUSTERED ({});",
                table,
                bracket(constraint),
                key_list(columns)
            ),
            Statement::CreateIndex {
                table,
                name,
                columns,
            } => write!(
                f,
                "CREATE NONCLUSTERED INDEX {} ON {} ({}) WITH ({});",
                bracket(name),
                table,
                key_list(columns),
                INDEX_OPTIONS
            ),
            Statement::AddForeignKey {
                table,
                constraint,
                columns,
                referenced,
                ref_columns,
                actions,
            } => {
                write!(
                    f,
                    "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                    table,
                    bracket(constraint),
                    name_list(columns),
                    referenced,
                    name_list(ref_columns)
                )?;
                if let Some(clause) = actions {
                    write!(
                        f,
                        " ON DELETE {} ON UPDATE {}",
                        clause.on_delete.as_sql(),
                        clause.on_update.as_sql()
                    )?;
                }
                f.write_str(";")
            }
            Statement::DropForeignKey { table, constraint } => write!(
                f,
                "IF OBJECT_ID({}, N'F') IS NOT NULL ALTER TABLE {} DROP CONSTRAINT {};",
                ObjectName::new(table.schema.clone(), constraint.clone()).as_literal(),
                table,
                bracket(constraint)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SortDirection;

    fn orders() -> ObjectName {
        ObjectName::new("sales", "orders")
    }

    #[test]
    fn test_create_table_layout() {
        let stmt = Statement::CreateTable {
            name: orders(),
            columns: vec![
                ColumnDefinition {
                    name: "id".into(),
                    data_type: "integer".into(),
                    nullable: false,
                },
                ColumnDefinition {
                    name: "note".into(),
                    data_type: "varchar(max)".into(),
                    nullable: true,
                },
            ],
        };
        assert_eq!(
            stmt.to_string(),
            "CREATE TABLE [sales].[orders] (\n    [id] integer NOT NULL,\n    [note] varchar(max) NULL\n) ON [PRIMARY];"
        );
    }

    #[test]
    fn test_default_constraint() {
        let stmt = Statement::AddDefault {
            table: orders(),
            constraint: "DF_orders_created".into(),
            column: "created".into(),
            expression: "GETDATE()".into(),
        };
        assert_eq!(
            stmt.to_string(),
            "ALTER TABLE [sales].[orders] ADD CONSTRAINT [DF_orders_created] DEFAULT (GETDATE()) FOR [created];"
        );
    }

    #[test]
    fn test_primary_key_and_index() {
        let cols = vec![IndexColumn {
            name: "id".into(),
            direction: SortDirection::Asc,
        }];
        let pk = Statement::AddPrimaryKey {
            table: orders(),
            constraint: "PK_orders".into(),
            columns: cols.clone(),
        };
        assert_eq!(
            pk.to_string(),
            "ALTER TABLE [sales].[orders] ADD CONSTRAINT [PK_orders] PRIMARY KEY CLUSTERED ([id] ASC);"
        );

        let idx = Statement::CreateIndex {
            table: orders(),
            name: "idx_orders_id".into(),
            columns: cols,
        };
        let text = idx.to_string();
        assert!(text.starts_with(
            "CREATE NONCLUSTERED INDEX [idx_orders_id] ON [sales].[orders] ([id] ASC) WITH (PAD_INDEX = OFF"
        ));
        assert!(text.ends_with("ALLOW_PAGE_LOCKS = ON);"));
    }

    #[test]
    fn test_foreign_key_actions_optional() {
        let mut stmt = Statement::AddForeignKey {
            table: orders(),
            constraint: "FK_orders_customer_id".into(),
            columns: vec!["customer_id".into()],
            referenced: ObjectName::new("sales", "customers"),
            ref_columns: vec!["id".into()],
            actions: None,
        };
        assert_eq!(
            stmt.to_string(),
            "ALTER TABLE [sales].[orders] ADD CONSTRAINT [FK_orders_customer_id] FOREIGN KEY ([customer_id]) REFERENCES [sales].[customers] ([id]);"
        );

        if let Statement::AddForeignKey { actions, .. } = &mut stmt {
            *actions = Some(ForeignKeyActionClause {
                on_delete: ReferentialAction::Cascade,
                on_update: ReferentialAction::Restrict,
            });
        }
        assert!(stmt
            .to_string()
            .ends_with("([id]) ON DELETE CASCADE ON UPDATE NO ACTION;"));
    }

    #[test]
    fn test_description_escapes_text() {
        let stmt = Statement::AddDescription {
            table: orders(),
            target: DescriptionTarget::Column("ref".into()),
            text: "customer's reference".into(),
        };
        let text = stmt.to_string();
        assert!(text.contains("@value = N'customer''s reference'"));
        assert!(text.contains("@level2type = N'COLUMN', @level2name = N'ref';"));
    }

    #[test]
    fn test_drop_guards() {
        assert_eq!(
            Statement::DropTable(orders()).to_string(),
            "IF OBJECT_ID(N'[sales].[orders]', N'U') IS NOT NULL DROP TABLE [sales].[orders];"
        );
        assert_eq!(
            Statement::DropForeignKey {
                table: orders(),
                constraint: "FK_orders_customer_id".into()
            }
            .to_string(),
            "IF OBJECT_ID(N'[sales].[FK_orders_customer_id]', N'F') IS NOT NULL ALTER TABLE [sales].[orders] DROP CONSTRAINT [FK_orders_customer_id];"
        );
    }

    #[test]
    fn test_create_sequence() {
        let stmt = Statement::CreateSequence {
            name: ObjectName::new("sales", "orders_id_seq"),
            data_type: "integer".into(),
            start: 42,
            increment: 1,
            min_value: 1,
            max_value: 2_147_483_647,
            cache: 1,
            cycle: false,
        };
        assert_eq!(
            stmt.to_string(),
            "CREATE SEQUENCE [sales].[orders_id_seq] AS integer START WITH 42 INCREMENT BY 1 MINVALUE 1 MAXVALUE 2147483647 NO CACHE NO CYCLE;"
        );
    }
}
