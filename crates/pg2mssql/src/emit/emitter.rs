//! Catalog → script rendering.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::{Config, ForeignKeyActions};
use crate::core::identifier::{bracket, validate_identifier};
use crate::core::{
    ColumnDescriptor, Diagnostic, DiagnosticKind, Diagnostics, ForeignKeyDescriptor,
    IndexDescriptor, IndexKind, ReferentialAction, SchemaCatalog, TableDescriptor, TypeMapper,
    UserTypeDescriptor,
};
use crate::dialect::render_sized;
use crate::transform::defaults::split_qualified;
use crate::transform::sequence::resume_value;
use crate::transform::translate_default;

use super::script::{ArtifactKind, Script};
use super::statement::{
    ColumnDefinition, DescriptionTarget, ForeignKeyActionClause, ObjectName, Statement,
};

/// Rendering options.
#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    /// Database named in the `USE` header of every script.
    pub database: Option<String>,

    /// How referential actions are rendered on foreign keys.
    pub foreign_key_actions: ForeignKeyActions,
}

impl EmitOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            database: config.use_database().map(str::to_string),
            foreign_key_actions: config.conversion.foreign_key_actions,
        }
    }
}

/// Scripts plus the diagnostics recorded while rendering them.
#[derive(Debug, Default)]
pub struct EmitOutput {
    /// Scripts in [`ArtifactKind::ALL`] order; empty for an empty catalog.
    pub scripts: Vec<Script>,
    pub diagnostics: Vec<Diagnostic>,
}

impl EmitOutput {
    pub fn script(&self, kind: ArtifactKind) -> Option<&Script> {
        self.scripts.iter().find(|s| s.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Renders a [`SchemaCatalog`] into the fixed set of T-SQL scripts.
pub struct DdlEmitter<'a> {
    mapper: &'a dyn TypeMapper,
    options: EmitOptions,
}

/// Names that failed validation; objects depending on them are skipped.
#[derive(Default)]
struct Rejected {
    tables: HashSet<(String, String)>,
}

impl Rejected {
    fn has_table(&self, schema: &str, table: &str) -> bool {
        self.tables.contains(&(schema.to_string(), table.to_string()))
    }
}

fn names_valid(names: &[&str], object: &str, diags: &mut Diagnostics) -> bool {
    for name in names {
        if let Err(e) = validate_identifier(name) {
            diags.record(DiagnosticKind::InvalidIdentifier, object, e.to_string());
            return false;
        }
    }
    true
}

impl<'a> DdlEmitter<'a> {
    pub fn new(mapper: &'a dyn TypeMapper, options: EmitOptions) -> Self {
        Self { mapper, options }
    }

    /// Render every script.
    pub fn emit(&self, catalog: &SchemaCatalog) -> EmitOutput {
        if catalog.is_empty() {
            info!("Catalog has no tables, no scripts generated");
            return EmitOutput::default();
        }

        let mut diags = Diagnostics::new();
        let rejected = self.reject_invalid_tables(catalog, &mut diags);

        let scripts = vec![
            self.create_schemas(catalog, &mut diags),
            self.create_types(catalog, &mut diags),
            self.drop_types(catalog),
            self.create_tables(catalog, &rejected, &mut diags),
            self.drop_tables(catalog, &rejected),
            self.truncate_tables(catalog, &rejected),
            self.create_indexes(catalog, &rejected, &mut diags),
            self.create_foreign_keys(catalog, &rejected, &mut diags),
        ];

        for script in &scripts {
            debug!("{}: {} statements", script.kind, script.statement_count());
        }

        EmitOutput {
            scripts,
            diagnostics: diags.into_vec(),
        }
    }

    fn script(&self, kind: ArtifactKind) -> Script {
        Script::new(kind, self.options.database.clone())
    }

    fn reject_invalid_tables(&self, catalog: &SchemaCatalog, diags: &mut Diagnostics) -> Rejected {
        let mut rejected = Rejected::default();
        for table in &catalog.tables {
            let mut names = vec![table.schema.as_str(), table.name.as_str()];
            names.extend(table.columns.iter().map(|c| c.name.as_str()));
            if !names_valid(&names, &table.full_name(), diags) {
                rejected
                    .tables
                    .insert((table.schema.clone(), table.name.clone()));
            }
        }
        rejected
    }

    fn create_schemas(&self, catalog: &SchemaCatalog, diags: &mut Diagnostics) -> Script {
        let mut script = self.script(ArtifactKind::CreateSchemas);
        for schema in &catalog.schemas {
            // CREATE SCHEMA must be alone in its batch
            if names_valid(&[schema.as_str()], schema, diags) {
                script.push(Statement::CreateSchema(schema.clone()));
            }
        }
        script
    }

    fn create_types(&self, catalog: &SchemaCatalog, diags: &mut Diagnostics) -> Script {
        let mut script = self.script(ArtifactKind::CreateTypes);

        for user_type in &catalog.user_types {
            let object = format!("{}.{}", user_type.schema, user_type.name);
            if !names_valid(&[user_type.schema.as_str(), user_type.name.as_str()], &object, diags) {
                continue;
            }
            let mapping = self.mapper.map_type(&user_type.base_type);
            if let Some(warning) = mapping.warning {
                diags.record(DiagnosticKind::UnmappableType, &object, warning);
            }
            script.push(Statement::CreateType {
                name: ObjectName::new(&user_type.schema, &user_type.name),
                base_type: render_sized(
                    &mapping.target_type,
                    user_type.max_char_size,
                    user_type.numeric_precision,
                    user_type.numeric_scale,
                ),
                not_null: user_type.not_null,
            });
        }

        for sequence in &catalog.sequences {
            let object = sequence.full_name();
            if !names_valid(&[sequence.schema.as_str(), sequence.name.as_str()], &object, diags) {
                continue;
            }
            script.push(Statement::CreateSequence {
                name: ObjectName::new(&sequence.schema, &sequence.name),
                data_type: sequence.target_type.clone(),
                start: resume_value(sequence),
                increment: sequence.increment,
                min_value: sequence.min_value,
                max_value: sequence.max_value,
                cache: sequence.cache,
                cycle: sequence.cycle,
            });
        }

        script
    }

    fn drop_types(&self, catalog: &SchemaCatalog) -> Script {
        let mut script = self.script(ArtifactKind::DropTypes);

        script.push_batch(
            catalog
                .sequences
                .iter()
                .filter(|s| validate_identifier(&s.schema).is_ok() && validate_identifier(&s.name).is_ok())
                .map(|s| Statement::DropSequence(ObjectName::new(&s.schema, &s.name)))
                .collect(),
        );
        script.push_batch(
            catalog
                .user_types
                .iter()
                .filter(|t| validate_identifier(&t.schema).is_ok() && validate_identifier(&t.name).is_ok())
                .map(|t| Statement::DropType(ObjectName::new(&t.schema, &t.name)))
                .collect(),
        );

        script
    }

    fn create_tables(
        &self,
        catalog: &SchemaCatalog,
        rejected: &Rejected,
        diags: &mut Diagnostics,
    ) -> Script {
        let mut script = self.script(ArtifactKind::CreateTables);
        let tables: Vec<&TableDescriptor> = catalog
            .tables
            .iter()
            .filter(|t| !rejected.has_table(&t.schema, &t.name))
            .collect();

        script.push_batch(vec![
            Statement::SetOption {
                option: "ANSI_NULLS",
                on: true,
            },
            Statement::SetOption {
                option: "QUOTED_IDENTIFIER",
                on: true,
            },
        ]);

        for table in &tables {
            let columns = table
                .columns
                .iter()
                .map(|col| self.column_definition(catalog, table, col, diags))
                .collect();
            script.push(Statement::CreateTable {
                name: ObjectName::new(&table.schema, &table.name),
                columns,
            });
        }

        for table in &tables {
            script.push_batch(self.defaults(table, diags));
        }

        for table in &tables {
            script.push_batch(
                table
                    .columns
                    .iter()
                    .filter_map(|col| {
                        col.comment.as_ref().map(|text| Statement::AddDescription {
                            table: ObjectName::new(&table.schema, &table.name),
                            target: DescriptionTarget::Column(col.name.clone()),
                            text: text.clone(),
                        })
                    })
                    .collect(),
            );
        }

        script.push_batch(
            tables
                .iter()
                .filter_map(|table| {
                    table.comment.as_ref().map(|text| Statement::AddDescription {
                        table: ObjectName::new(&table.schema, &table.name),
                        target: DescriptionTarget::Table,
                        text: text.clone(),
                    })
                })
                .collect(),
        );

        script
    }

    fn column_definition(
        &self,
        catalog: &SchemaCatalog,
        table: &TableDescriptor,
        col: &ColumnDescriptor,
        diags: &mut Diagnostics,
    ) -> ColumnDefinition {
        if let Some(user_type) = find_user_type(catalog, &table.schema, col.element_type()) {
            return ColumnDefinition {
                name: col.name.clone(),
                data_type: format!("{}.{}", bracket(&user_type.schema), bracket(&user_type.name)),
                nullable: col.is_nullable,
            };
        }

        let mapping = self.mapper.map_column(col);
        if let Some(warning) = mapping.warning {
            diags.record(
                DiagnosticKind::UnmappableType,
                format!("{}.{}", table.full_name(), col.name),
                warning,
            );
        }
        ColumnDefinition {
            name: mapping.name,
            data_type: mapping.target_type,
            nullable: mapping.is_nullable,
        }
    }

    fn defaults(&self, table: &TableDescriptor, diags: &mut Diagnostics) -> Vec<Statement> {
        let mut batch = Vec::new();
        for col in &table.columns {
            let Some(raw) = col.default.as_deref() else {
                continue;
            };
            let object = format!("{}.{}", table.full_name(), col.name);
            let Some(expression) = translate_default(&table.schema, raw).render() else {
                diags.record(
                    DiagnosticKind::UnsupportedDefault,
                    &object,
                    format!("default '{}' has no SQL Server equivalent; omitted", raw),
                );
                continue;
            };
            let constraint = format!("DF_{}_{}", table.name, col.name);
            if !names_valid(&[constraint.as_str()], &object, diags) {
                continue;
            }
            batch.push(Statement::AddDefault {
                table: ObjectName::new(&table.schema, &table.name),
                constraint,
                column: col.name.clone(),
                expression,
            });
        }
        batch
    }

    fn drop_tables(&self, catalog: &SchemaCatalog, rejected: &Rejected) -> Script {
        let mut script = self.script(ArtifactKind::DropTables);

        script.push_batch(
            catalog
                .foreign_keys
                .iter()
                .filter(|fk| fk_emittable(fk, rejected))
                .map(|fk| Statement::DropForeignKey {
                    table: ObjectName::new(&fk.schema, &fk.table),
                    constraint: fk.name.clone(),
                })
                .collect(),
        );

        script.push_batch(
            catalog
                .tables
                .iter()
                .rev()
                .filter(|t| !rejected.has_table(&t.schema, &t.name))
                .map(|t| Statement::DropTable(ObjectName::new(&t.schema, &t.name)))
                .collect(),
        );

        script
    }

    fn truncate_tables(&self, catalog: &SchemaCatalog, rejected: &Rejected) -> Script {
        let mut script = self.script(ArtifactKind::TruncateTables);
        script.push_batch(
            catalog
                .tables
                .iter()
                .filter(|t| !rejected.has_table(&t.schema, &t.name))
                .map(|t| Statement::TruncateTable(ObjectName::new(&t.schema, &t.name)))
                .collect(),
        );
        script
    }

    fn create_indexes(
        &self,
        catalog: &SchemaCatalog,
        rejected: &Rejected,
        diags: &mut Diagnostics,
    ) -> Script {
        let mut script = self.script(ArtifactKind::CreateIndexes);

        for table in &catalog.tables {
            if rejected.has_table(&table.schema, &table.name) {
                continue;
            }
            let batch = catalog
                .indexes
                .iter()
                .filter(|ix| ix.schema == table.schema && ix.table == table.name)
                .filter_map(|ix| index_statement(ix, diags))
                .collect();
            script.push_batch(batch);
        }

        script
    }

    fn create_foreign_keys(
        &self,
        catalog: &SchemaCatalog,
        rejected: &Rejected,
        diags: &mut Diagnostics,
    ) -> Script {
        let mut script = self.script(ArtifactKind::CreateForeignKeys);

        for table in &catalog.tables {
            let batch = catalog
                .foreign_keys
                .iter()
                .filter(|fk| fk.schema == table.schema && fk.table == table.name)
                .filter(|fk| fk_emittable(fk, rejected))
                .filter(|fk| {
                    let object = format!("{}.{}", table.full_name(), fk.name);
                    let mut names = vec![fk.name.as_str()];
                    names.extend(fk.columns.iter().map(String::as_str));
                    names.extend(fk.ref_columns.iter().map(String::as_str));
                    names_valid(&names, &object, diags)
                })
                .map(|fk| Statement::AddForeignKey {
                    table: ObjectName::new(&fk.schema, &fk.table),
                    constraint: fk.name.clone(),
                    columns: fk.columns.clone(),
                    referenced: ObjectName::new(&fk.ref_schema, &fk.ref_table),
                    ref_columns: fk.ref_columns.clone(),
                    actions: self.action_clause(fk),
                })
                .collect();
            script.push_batch(batch);
        }

        script
    }

    fn action_clause(&self, fk: &ForeignKeyDescriptor) -> Option<ForeignKeyActionClause> {
        match self.options.foreign_key_actions {
            ForeignKeyActions::Omit => None,
            ForeignKeyActions::Cascade => Some(ForeignKeyActionClause {
                on_delete: ReferentialAction::Cascade,
                on_update: ReferentialAction::Cascade,
            }),
            ForeignKeyActions::Source => Some(ForeignKeyActionClause {
                on_delete: fk.on_delete,
                on_update: fk.on_update,
            }),
        }
    }
}

fn fk_emittable(fk: &ForeignKeyDescriptor, rejected: &Rejected) -> bool {
    !rejected.has_table(&fk.schema, &fk.table)
        && !rejected.has_table(&fk.ref_schema, &fk.ref_table)
        && validate_identifier(&fk.name).is_ok()
}

fn index_statement(ix: &IndexDescriptor, diags: &mut Diagnostics) -> Option<Statement> {
    let table = ObjectName::new(&ix.schema, &ix.table);
    let object = format!("{}.{}.{}", ix.schema, ix.table, ix.name);

    let statement = match ix.kind {
        IndexKind::PrimaryKey => {
            let constraint = format!("PK_{}", ix.table);
            if !names_valid(&[constraint.as_str()], &object, diags) {
                return None;
            }
            Statement::AddPrimaryKey {
                table,
                constraint,
                columns: ix.columns.clone(),
            }
        }
        IndexKind::Unique => {
            if !names_valid(&[ix.name.as_str()], &object, diags) {
                return None;
            }
            Statement::AddUnique {
                table,
                constraint: ix.name.clone(),
                columns: ix.columns.clone(),
            }
        }
        IndexKind::Plain => {
            if !names_valid(&[ix.name.as_str()], &object, diags) {
                return None;
            }
            Statement::CreateIndex {
                table,
                name: ix.name.clone(),
                columns: ix.columns.clone(),
            }
        }
    };
    Some(statement)
}

/// Resolve a column type naming a domain.
///
/// `regtype` prints a domain qualified only when its schema is not on the
/// search path, so a bare name is looked up in the table's schema first and
/// then by name alone.
fn find_user_type<'c>(
    catalog: &'c SchemaCatalog,
    table_schema: &str,
    type_name: &str,
) -> Option<&'c UserTypeDescriptor> {
    if catalog.user_types.is_empty() {
        return None;
    }

    let parts = split_qualified(type_name);
    match parts.as_slice() {
        [schema, name] => catalog
            .user_types
            .iter()
            .find(|t| &t.schema == schema && &t.name == name),
        [name] => catalog
            .user_types
            .iter()
            .find(|t| t.schema == table_schema && &t.name == name)
            .or_else(|| {
                let mut matches = catalog.user_types.iter().filter(|t| &t.name == name);
                match (matches.next(), matches.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::test_support::{make_test_column, make_test_sequence, make_test_table};
    use crate::core::{IndexColumn, SortDirection};
    use crate::dialect::PostgresToMssqlMapper;

    fn key(name: &str) -> IndexColumn {
        IndexColumn {
            name: name.to_string(),
            direction: SortDirection::Asc,
        }
    }

    fn sample_catalog() -> SchemaCatalog {
        let mut id = make_test_column("id", "integer", 1);
        id.is_nullable = false;
        id.default = Some("nextval('orders_id_seq'::regclass)".into());
        let mut created = make_test_column("created", "timestamp without time zone", 2);
        created.default = Some("now()".into());
        created.comment = Some("row creation".into());
        let mut status = make_test_column("status", "character varying", 3);
        status.max_char_size = Some(20);
        status.default = Some("'{}'::jsonb".into());
        let customer = make_test_column("customer_id", "integer", 4);

        let mut orders = make_test_table("sales", "orders", vec![id, created, status, customer]);
        orders.comment = Some("Customer's orders".into());

        let mut cust_id = make_test_column("id", "integer", 1);
        cust_id.is_nullable = false;
        let customers = make_test_table("sales", "customers", vec![cust_id]);

        let mut catalog = SchemaCatalog::default();
        catalog.note_schema("sales");
        catalog.tables = vec![customers, orders];
        catalog.sequences = vec![make_test_sequence("orders_id_seq", "integer", 2_147_483_647)];
        catalog.indexes = vec![
            IndexDescriptor {
                schema: "sales".into(),
                table: "orders".into(),
                name: "orders_pkey".into(),
                kind: IndexKind::PrimaryKey,
                columns: vec![key("id")],
            },
            IndexDescriptor {
                schema: "sales".into(),
                table: "orders".into(),
                name: "orders_status_idx".into(),
                kind: IndexKind::Plain,
                columns: vec![key("status")],
            },
        ];
        catalog.foreign_keys = vec![ForeignKeyDescriptor {
            name: "FK_orders_customer_id".into(),
            source_name: "orders_customer_id_fkey".into(),
            schema: "sales".into(),
            table: "orders".into(),
            ref_schema: "sales".into(),
            ref_table: "customers".into(),
            columns: vec!["customer_id".into()],
            ref_columns: vec!["id".into()],
            on_delete: ReferentialAction::Cascade,
            on_update: ReferentialAction::Restrict,
        }];
        catalog
    }

    fn emit_with(catalog: &SchemaCatalog, options: EmitOptions) -> EmitOutput {
        let mapper = PostgresToMssqlMapper::new();
        DdlEmitter::new(&mapper, options).emit(catalog)
    }

    fn rendered(output: &EmitOutput, kind: ArtifactKind) -> String {
        output.script(kind).map(|s| s.render()).unwrap_or_default()
    }

    #[test]
    fn test_empty_catalog_emits_nothing() {
        let output = emit_with(&SchemaCatalog::default(), EmitOptions::default());
        assert!(output.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_all_scripts_in_order() {
        let output = emit_with(&sample_catalog(), EmitOptions::default());
        let kinds: Vec<_> = output.scripts.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, ArtifactKind::ALL.to_vec());
    }

    #[test]
    fn test_create_tables_content() {
        let output = emit_with(&sample_catalog(), EmitOptions::default());
        let text = rendered(&output, ArtifactKind::CreateTables);

        assert!(text.contains("SET ANSI_NULLS ON;\nSET QUOTED_IDENTIFIER ON;\nGO"));
        assert!(text.contains("    [id] integer NOT NULL,"));
        assert!(text.contains("    [created] datetime2 NULL,"));
        assert!(text.contains("    [status] varchar(20) NULL,"));
        assert!(text.contains(
            "ADD CONSTRAINT [DF_orders_id] DEFAULT (NEXT VALUE FOR [sales].[orders_id_seq]) FOR [id];"
        ));
        assert!(text.contains("ADD CONSTRAINT [DF_orders_created] DEFAULT (GETDATE()) FOR [created];"));
        assert!(!text.contains("DF_orders_status"));
        assert!(text.contains("@value = N'Customer''s orders'"));
        assert!(text.contains("@level2name = N'created'"));

        // tables come before defaults, defaults before comments
        let table_pos = text.find("CREATE TABLE [sales].[orders]").unwrap();
        let default_pos = text.find("DF_orders_id").unwrap();
        let comment_pos = text.find("sp_addextendedproperty").unwrap();
        assert!(table_pos < default_pos && default_pos < comment_pos);
    }

    #[test]
    fn test_unsupported_default_is_diagnosed() {
        let output = emit_with(&sample_catalog(), EmitOptions::default());
        let diag = output
            .diagnostics
            .iter()
            .find(|d| d.kind == DiagnosticKind::UnsupportedDefault)
            .expect("unsupported default diagnostic");
        assert_eq!(diag.object, "sales.orders.status");
        assert!(diag.message.contains("'{}'::jsonb"));
    }

    #[test]
    fn test_indexes_and_foreign_keys() {
        let output = emit_with(&sample_catalog(), EmitOptions::default());
        let indexes = rendered(&output, ArtifactKind::CreateIndexes);
        assert!(indexes.contains(
            "ALTER TABLE [sales].[orders] ADD CONSTRAINT [PK_orders] PRIMARY KEY CLUSTERED ([id] ASC);"
        ));
        assert!(indexes.contains("CREATE NONCLUSTERED INDEX [orders_status_idx] ON [sales].[orders]"));
        assert!(!indexes.contains("UNIQUE"));

        let fks = rendered(&output, ArtifactKind::CreateForeignKeys);
        assert!(fks.contains(
            "FOREIGN KEY ([customer_id]) REFERENCES [sales].[customers] ([id]);"
        ));
        assert!(!fks.contains("ON DELETE"));
    }

    #[test]
    fn test_foreign_key_action_modes() {
        let cascade = emit_with(
            &sample_catalog(),
            EmitOptions {
                database: None,
                foreign_key_actions: ForeignKeyActions::Cascade,
            },
        );
        assert!(rendered(&cascade, ArtifactKind::CreateForeignKeys)
            .contains("ON DELETE CASCADE ON UPDATE CASCADE;"));

        let source = emit_with(
            &sample_catalog(),
            EmitOptions {
                database: None,
                foreign_key_actions: ForeignKeyActions::Source,
            },
        );
        assert!(rendered(&source, ArtifactKind::CreateForeignKeys)
            .contains("ON DELETE CASCADE ON UPDATE NO ACTION;"));
    }

    #[test]
    fn test_drop_tables_drops_foreign_keys_first() {
        let output = emit_with(&sample_catalog(), EmitOptions::default());
        let text = rendered(&output, ArtifactKind::DropTables);
        let fk_pos = text.find("DROP CONSTRAINT [FK_orders_customer_id]").unwrap();
        let orders_pos = text.find("DROP TABLE [sales].[orders]").unwrap();
        let customers_pos = text.find("DROP TABLE [sales].[customers]").unwrap();
        assert!(fk_pos < orders_pos);
        // reverse catalog order
        assert!(orders_pos < customers_pos);
    }

    #[test]
    fn test_types_and_sequences() {
        let mut catalog = sample_catalog();
        catalog.user_types.push(UserTypeDescriptor {
            schema: "sales".into(),
            name: "sku".into(),
            base_type: "character varying".into(),
            not_null: true,
            max_char_size: Some(12),
            numeric_precision: None,
            numeric_scale: None,
        });
        catalog.tables[0]
            .columns
            .push(make_test_column("code", "sku", 2));
        catalog.sequences[0].last_value = 41;
        catalog.sequences[0].is_called = true;

        let output = emit_with(&catalog, EmitOptions::default());
        let types = rendered(&output, ArtifactKind::CreateTypes);
        let type_pos = types
            .find("CREATE TYPE [sales].[sku] FROM varchar(12) NOT NULL;")
            .unwrap();
        let seq_pos = types
            .find("CREATE SEQUENCE [sales].[orders_id_seq] AS integer START WITH 42 ")
            .unwrap();
        assert!(type_pos < seq_pos);

        let drops = rendered(&output, ArtifactKind::DropTypes);
        assert!(drops.find("DROP SEQUENCE").unwrap() < drops.find("DROP TYPE").unwrap());

        let tables = rendered(&output, ArtifactKind::CreateTables);
        assert!(tables.contains("    [code] [sales].[sku] NULL"));
    }

    #[test]
    fn test_use_database_header() {
        let output = emit_with(
            &sample_catalog(),
            EmitOptions {
                database: Some("Inventory".into()),
                foreign_key_actions: ForeignKeyActions::Omit,
            },
        );
        for script in &output.scripts {
            assert!(script.render().starts_with("USE [Inventory];\nGO\n"));
        }
    }

    #[test]
    fn test_unmapped_type_passes_through_with_diagnostic() {
        let mut catalog = sample_catalog();
        catalog.tables[0]
            .columns
            .push(make_test_column("addr", "inet", 2));
        let output = emit_with(&catalog, EmitOptions::default());
        assert!(rendered(&output, ArtifactKind::CreateTables).contains("    [addr] inet NULL"));
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnmappableType && d.object == "sales.customers.addr"));
    }

    #[test]
    fn test_invalid_identifier_skips_table() {
        let mut catalog = sample_catalog();
        catalog.tables.push(make_test_table(
            "sales",
            &"x".repeat(200),
            vec![make_test_column("id", "integer", 1)],
        ));
        let output = emit_with(&catalog, EmitOptions::default());
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::InvalidIdentifier));
        assert!(!rendered(&output, ArtifactKind::CreateTables).contains(&"x".repeat(200)));
        assert!(!rendered(&output, ArtifactKind::TruncateTables).contains(&"x".repeat(200)));
    }
}
