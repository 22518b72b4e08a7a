//! # pg2mssql
//!
//! PostgreSQL catalog to SQL Server DDL translation library.
//!
//! The library reads a PostgreSQL system catalog (tables, columns, domains,
//! sequences, indexes, foreign keys) and produces a dependency-ordered set of
//! T-SQL scripts that recreate the schema on SQL Server:
//!
//! - **Type mapping** from PostgreSQL type names to SQL Server types
//! - **Array flattening** into numbered scalar columns
//! - **Default translation** including `nextval` to `NEXT VALUE FOR`
//! - **Sequence clamping** to the range of the target integer type
//! - **Offline snapshots** so a catalog can be converted without a connection
//!
//! ## Example
//!
//! ```rust,no_run
//! use pg2mssql::{Config, Converter};
//!
//! #[tokio::main]
//! async fn main() -> pg2mssql::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let result = Converter::new(config).run(false).await?;
//!     println!("Generated {} scripts", result.artifacts.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod emit;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod source;
pub mod transform;

// Re-exports for convenient access
pub use config::{Config, ConversionConfig, ForeignKeyActions, SourceConfig, TargetConfig};
pub use crate::core::{CatalogReader, Diagnostic, DiagnosticKind, SchemaCatalog, TypeMapper};
pub use dialect::PostgresToMssqlMapper;
pub use emit::{ArtifactKind, DdlEmitter, EmitOptions, EmitOutput};
pub use error::{ConvertError, Result};
pub use orchestrator::{ConversionResult, Converter, HealthCheckResult, RunOutcome};
pub use source::{CatalogSnapshot, InMemoryCatalog, PgCatalogReader};
