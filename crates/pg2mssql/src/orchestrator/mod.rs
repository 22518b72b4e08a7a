//! Conversion orchestrator - main workflow coordinator.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{CatalogReader, Diagnostic, DiagnosticKind, Diagnostics};
use crate::dialect::PostgresToMssqlMapper;
use crate::emit::{write_scripts, DdlEmitter, EmitOptions, Script, WrittenArtifact};
use crate::error::{ConvertError, Result};
use crate::model::{build_catalog, BuildOptions, CatalogRows};
use crate::source::{CatalogSnapshot, PgCatalogReader};
use crate::transform::{flatten_catalog, sequence, size_binary_columns, Cardinalities};

/// Conversion orchestrator.
pub struct Converter {
    config: Config,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Scripts were generated (or planned, for a dry run).
    Generated,
    /// The catalog had no tables; nothing was written.
    NothingToProcess,
}

/// Object counts after transformation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectCounts {
    pub schemas: usize,
    pub tables: usize,
    pub columns: usize,
    pub user_types: usize,
    pub sequences: usize,
    pub indexes: usize,
    pub foreign_keys: usize,
    /// Array columns split into several scalar columns.
    pub arrays_flattened: usize,
    /// Sequences whose maximum was lowered to fit the target type.
    pub sequences_clamped: usize,
}

/// Result of a conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final outcome.
    pub outcome: RunOutcome,

    /// Catalog the run read from.
    pub source: String,

    /// True when scripts were rendered but not written.
    pub dry_run: bool,

    /// Directory the scripts were (or would be) written to.
    pub output_dir: PathBuf,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    pub counts: ObjectCounts,

    /// Scripts in dependency order.
    pub artifacts: Vec<WrittenArtifact>,

    /// Recovered problems, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl ConversionResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

/// Result of a source connectivity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub source: String,
    pub source_latency_ms: u64,
    pub server_version: Option<String>,
    pub source_error: Option<String>,
}

impl Converter {
    /// Create a new converter.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the PostgreSQL catalog connection.
    pub async fn connect(&self) -> Result<PgCatalogReader> {
        PgCatalogReader::connect(
            &self.config.source,
            self.config.conversion.excluded_schema_list(),
        )
        .await
    }

    /// Connect to the source catalog and run the conversion.
    ///
    /// The connection is closed when the reader is dropped at the end of
    /// this call, whether or not the run succeeded.
    pub async fn run(&self, dry_run: bool) -> Result<ConversionResult> {
        let reader = self.connect().await?;
        self.run_with_reader(&reader, dry_run).await
    }

    /// Run the conversion against any catalog reader.
    pub async fn run_with_reader(
        &self,
        reader: &dyn CatalogReader,
        dry_run: bool,
    ) -> Result<ConversionResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let output_dir = self.config.conversion.output_dir.clone();
        let mapper = PostgresToMssqlMapper::new();
        let mut diagnostics = Diagnostics::new();

        info!("Starting conversion run: {}", run_id);

        // Phase 1: Read catalog
        info!("Phase 1: Reading catalog from {}", reader.source_name());
        let rows = read_rows(reader, &mut diagnostics).await?;
        let cardinalities = sample_cardinalities(
            reader,
            &rows,
            self.config.conversion.array_sample_limit,
            &mut diagnostics,
        )
        .await?;

        // Phase 2: Build model
        info!("Phase 2: Building catalog model");
        let build = build_catalog(
            rows,
            &BuildOptions {
                foreign_key_suffix: self.config.conversion.foreign_key_suffix.clone(),
            },
        );
        diagnostics.extend(build.diagnostics);
        let mut catalog = build.catalog;

        let mut counts = ObjectCounts::default();
        let mut artifacts = Vec::new();

        let outcome = if catalog.is_empty() {
            info!("No tables found in {}, nothing to process", reader.source_name());
            RunOutcome::NothingToProcess
        } else {
            // Phase 3: Transform
            info!("Phase 3: Flattening arrays and resolving sequences");
            let flattened = flatten_catalog(&mut catalog, &cardinalities);
            counts.arrays_flattened = flattened.expanded;
            size_binary_columns(&mut catalog, &cardinalities);
            counts.sequences_clamped = sequence::apply(&mut catalog, &mapper);

            // Phase 4: Emit
            info!("Phase 4: Generating T-SQL");
            let emitted =
                DdlEmitter::new(&mapper, EmitOptions::from_config(&self.config)).emit(&catalog);
            diagnostics.extend(emitted.diagnostics);

            // Phase 5: Write
            if dry_run {
                info!("Dry run: skipping writes to {}", output_dir.display());
                artifacts = plan_artifacts(&output_dir, &emitted.scripts);
            } else {
                info!("Phase 5: Writing scripts to {}", output_dir.display());
                artifacts = write_scripts(&output_dir, &emitted.scripts)?;
            }
            RunOutcome::Generated
        };

        counts.schemas = catalog.schemas.len();
        counts.tables = catalog.tables.len();
        counts.columns = catalog.column_count();
        counts.user_types = catalog.user_types.len();
        counts.sequences = catalog.sequences.len();
        counts.indexes = catalog.indexes.len();
        counts.foreign_keys = catalog.foreign_keys.len();

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        if !diagnostics.is_empty() {
            warn!("Run finished with {} warnings", diagnostics.len());
        }
        info!(
            "Conversion {} in {:.2}s: {} tables, {} artifacts",
            run_id,
            duration,
            counts.tables,
            artifacts.len()
        );

        Ok(ConversionResult {
            run_id,
            outcome,
            source: reader.source_name().to_string(),
            dry_run,
            output_dir,
            started_at,
            completed_at,
            duration_seconds: duration,
            counts,
            artifacts,
            diagnostics: diagnostics.into_vec(),
        })
    }

    /// Capture the live catalog into a snapshot.
    pub async fn capture_snapshot(&self) -> Result<CatalogSnapshot> {
        let reader = self.connect().await?;
        CatalogSnapshot::capture(&reader, self.config.conversion.array_sample_limit).await
    }

    /// Test the source connection.
    pub async fn health_check(&self) -> Result<HealthCheckResult> {
        let source = format!(
            "{}:{}/{}",
            self.config.source.host, self.config.source.port, self.config.source.database
        );
        let start = Instant::now();

        let probe = async {
            let reader = self.connect().await?;
            reader.server_version().await
        };

        let result = match probe.await {
            Ok(version) => HealthCheckResult {
                healthy: true,
                source,
                source_latency_ms: start.elapsed().as_millis() as u64,
                server_version: Some(version),
                source_error: None,
            },
            Err(e) => HealthCheckResult {
                healthy: false,
                source,
                source_latency_ms: start.elapsed().as_millis() as u64,
                server_version: None,
                source_error: Some(e.to_string()),
            },
        };
        Ok(result)
    }
}

/// Read every row set, treating a failed query as an empty one.
async fn read_rows(reader: &dyn CatalogReader, diags: &mut Diagnostics) -> Result<CatalogRows> {
    Ok(CatalogRows {
        columns: recover("columns", reader.read_columns().await, diags)?,
        user_types: recover("user types", reader.read_user_types().await, diags)?,
        table_comments: recover("table comments", reader.read_table_comments().await, diags)?,
        sequences: recover("sequences", reader.read_sequences().await, diags)?,
        indexes: recover("indexes", reader.read_indexes().await, diags)?,
        foreign_keys: recover("foreign keys", reader.read_foreign_keys().await, diags)?,
    })
}

fn recover<T>(entity: &str, result: Result<Vec<T>>, diags: &mut Diagnostics) -> Result<Vec<T>> {
    match result {
        Ok(rows) => Ok(rows),
        Err(e) if is_recoverable(&e) => {
            diags.record(DiagnosticKind::CatalogQueryFailure, entity, e.to_string());
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Failed queries are recoverable; a lost connection is not.
fn is_recoverable(e: &ConvertError) -> bool {
    match e {
        ConvertError::CatalogQuery { .. } => true,
        ConvertError::Source(source) => !source.is_closed(),
        _ => false,
    }
}

/// Sample the cardinality of every array column and the byte length of
/// every binary column.
async fn sample_cardinalities(
    reader: &dyn CatalogReader,
    rows: &CatalogRows,
    sample_limit: i64,
    diags: &mut Diagnostics,
) -> Result<Cardinalities> {
    let mut cardinalities = Cardinalities::new();
    for col in rows.columns.iter().filter(|c| c.needs_sampling()) {
        let object = format!("{}.{}.{}", col.schema, col.table, col.column);
        let observed = reader
            .array_cardinality(
                &col.schema,
                &col.table,
                &col.column,
                col.is_binary(),
                sample_limit,
            )
            .await;
        match observed {
            Ok(Some(max)) => {
                debug!("{} measures up to {}", object, max);
                cardinalities.insert((col.schema.clone(), col.table.clone(), col.column.clone()), max);
            }
            Ok(None) => debug!("{} has no sampled values", object),
            Err(e) if is_recoverable(&e) => {
                diags.record(DiagnosticKind::CatalogQueryFailure, object, e.to_string());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(cardinalities)
}

/// Artifacts a dry run would have written.
fn plan_artifacts(dir: &Path, scripts: &[Script]) -> Vec<WrittenArtifact> {
    scripts
        .iter()
        .map(|script| WrittenArtifact {
            kind: script.kind,
            path: dir.join(script.kind.file_name()),
            statements: script.statement_count(),
            bytes: script.render().len() as u64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::emit::ArtifactKind;
    use crate::source::memory::test_support::{column_row, fk_row, index_row, sequence_row};
    use crate::source::rows::{
        CardinalityRow, ColumnRow, ForeignKeyRow, IndexRow, SequenceRow, TableCommentRow,
        UserTypeRow,
    };
    use crate::source::InMemoryCatalog;

    const CONFIG: &str = r#"
source:
  host: localhost
  database: inventory
  user: reader
  password: secret
target:
  database: Inventory
"#;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::from_yaml(CONFIG).unwrap();
        config.conversion.output_dir = dir.to_path_buf();
        config
    }

    fn sample_snapshot() -> CatalogSnapshot {
        let mut id = column_row("sales", "orders", "id", 1, "integer");
        id.is_nullable = false;
        id.default_expr = Some("nextval('sales.orders_id_seq'::regclass)".into());
        let tags = column_row("sales", "orders", "tags", 2, "text[]");
        let customer = column_row("sales", "orders", "customer_id", 3, "integer");
        let mut cust_id = column_row("sales", "customers", "id", 1, "integer");
        cust_id.is_nullable = false;
        let digest = column_row("sales", "customers", "digest", 2, "bytea");
        let photo = column_row("sales", "customers", "photo", 3, "bytea");

        CatalogSnapshot {
            source: "db:5432/inventory".into(),
            columns: vec![id, tags, customer, cust_id, digest, photo],
            sequences: vec![sequence_row("orders_id_seq", "bigint", 9_000_000_000)],
            indexes: vec![
                index_row("sales", "orders", "orders_pkey", true, true, Some("id"), 1),
                index_row("sales", "orders", "orders_tags_idx", false, false, Some("tags"), 1),
                index_row("sales", "customers", "customers_pkey", true, true, Some("id"), 1),
            ],
            foreign_keys: vec![fk_row(
                "orders",
                "orders_customer_id_fkey",
                &["customer_id"],
                "customers",
                &["id"],
            )],
            cardinalities: vec![
                CardinalityRow {
                    schema: "sales".into(),
                    table: "orders".into(),
                    column: "tags".into(),
                    max_cardinality: 3,
                },
                CardinalityRow {
                    schema: "sales".into(),
                    table: "customers".into(),
                    column: "digest".into(),
                    max_cardinality: 16,
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_writes_all_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::new(config_in(dir.path()));
        let reader = InMemoryCatalog::new(sample_snapshot());

        let result = converter.run_with_reader(&reader, false).await.unwrap();
        assert_eq!(result.outcome, RunOutcome::Generated);
        assert_eq!(result.artifacts.len(), ArtifactKind::ALL.len());
        assert_eq!(result.counts.tables, 2);
        assert_eq!(result.counts.arrays_flattened, 1);
        assert_eq!(result.counts.sequences_clamped, 1);
        assert_eq!(result.source, "snapshot of db:5432/inventory");

        for kind in ArtifactKind::ALL {
            assert!(dir.path().join(kind.file_name()).exists(), "{} missing", kind);
        }

        let tables = std::fs::read_to_string(dir.path().join("create_tables.sql")).unwrap();
        assert!(tables.starts_with("USE [Inventory];\nGO\n"));
        assert!(tables.contains("[tags1] text NULL,"));
        assert!(tables.contains("[tags3] text NULL,"));
        assert!(!tables.contains("[tags] "));
        assert!(tables.contains("DEFAULT (NEXT VALUE FOR [sales].[orders_id_seq]) FOR [id];"));
        assert!(tables.contains("[digest] binary(16) NULL,"));
        assert!(tables.contains("[photo] varbinary(max) NULL\n"));

        let types = std::fs::read_to_string(dir.path().join("create_types.sql")).unwrap();
        assert!(types.contains("[sales].[orders_id_seq] AS integer START WITH"));
        assert!(types.contains("MAXVALUE 2147483647"));

        let indexes = std::fs::read_to_string(dir.path().join("create_indexes.sql")).unwrap();
        assert!(indexes.contains("([tags1] ASC, [tags2] ASC, [tags3] ASC)"));
        assert!(indexes.contains("[PK_customers] PRIMARY KEY CLUSTERED"));

        let fks = std::fs::read_to_string(dir.path().join("create_foreign_keys.sql")).unwrap();
        assert!(fks.contains("[FK_orders_customer_id]"));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_nothing_to_process() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let converter = Converter::new(config_in(&out));
        let reader = InMemoryCatalog::new(CatalogSnapshot::default());

        let result = converter.run_with_reader(&reader, false).await.unwrap();
        assert_eq!(result.outcome, RunOutcome::NothingToProcess);
        assert!(result.artifacts.is_empty());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let converter = Converter::new(config_in(&out));
        let reader = InMemoryCatalog::new(sample_snapshot());

        let result = converter.run_with_reader(&reader, true).await.unwrap();
        assert!(result.dry_run);
        assert_eq!(result.outcome, RunOutcome::Generated);
        assert_eq!(result.artifacts.len(), ArtifactKind::ALL.len());
        assert!(result.artifacts.iter().all(|a| a.bytes > 0));
        assert!(!out.exists());
    }

    /// Reader that fails selected calls.
    struct FailingReader {
        inner: InMemoryCatalog,
        /// Index query fails with a recoverable error.
        fail_indexes: bool,
        /// Connection is lost before the column query.
        lose_connection: bool,
    }

    impl FailingReader {
        fn new(snapshot: CatalogSnapshot) -> Self {
            Self {
                inner: InMemoryCatalog::new(snapshot),
                fail_indexes: false,
                lose_connection: false,
            }
        }
    }

    #[async_trait]
    impl CatalogReader for FailingReader {
        async fn read_columns(&self) -> Result<Vec<ColumnRow>> {
            if self.lose_connection {
                return Err(ConvertError::Connection(
                    "db:5432/inventory: connection closed".into(),
                ));
            }
            self.inner.read_columns().await
        }
        async fn read_user_types(&self) -> Result<Vec<UserTypeRow>> {
            self.inner.read_user_types().await
        }
        async fn read_table_comments(&self) -> Result<Vec<TableCommentRow>> {
            self.inner.read_table_comments().await
        }
        async fn read_sequences(&self) -> Result<Vec<SequenceRow>> {
            self.inner.read_sequences().await
        }
        async fn read_indexes(&self) -> Result<Vec<IndexRow>> {
            if self.fail_indexes {
                return Err(ConvertError::catalog_query("indexes", "permission denied"));
            }
            self.inner.read_indexes().await
        }
        async fn read_foreign_keys(&self) -> Result<Vec<ForeignKeyRow>> {
            self.inner.read_foreign_keys().await
        }
        async fn array_cardinality(
            &self,
            schema: &str,
            table: &str,
            column: &str,
            is_binary: bool,
            sample_limit: i64,
        ) -> Result<Option<i64>> {
            self.inner
                .array_cardinality(schema, table, column, is_binary, sample_limit)
                .await
        }
        fn source_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_failed_query_is_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::new(config_in(dir.path()));
        let mut reader = FailingReader::new(sample_snapshot());
        reader.fail_indexes = true;

        let result = converter.run_with_reader(&reader, false).await.unwrap();
        assert_eq!(result.outcome, RunOutcome::Generated);
        assert_eq!(result.count(DiagnosticKind::CatalogQueryFailure), 1);
        assert_eq!(result.counts.indexes, 0);

        let json = result.to_json().unwrap();
        assert!(json.contains("\"catalog_query_failure\""));
        assert!(json.contains("\"generated\""));
    }

    #[tokio::test]
    async fn test_lost_connection_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let converter = Converter::new(config_in(&out));
        let mut reader = FailingReader::new(sample_snapshot());
        reader.lose_connection = true;

        let err = converter.run_with_reader(&reader, false).await.unwrap_err();
        assert!(matches!(err, ConvertError::Connection(_)));
        assert_eq!(err.exit_code(), 3);
        assert!(!out.exists());
    }
}
