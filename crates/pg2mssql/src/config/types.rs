//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (PostgreSQL).
    pub source: SourceConfig,

    /// Target database configuration (SQL Server).
    #[serde(default)]
    pub target: TargetConfig,

    /// Conversion behavior configuration.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Source database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database type (always "postgres").
    #[serde(default = "default_postgres")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// SSL mode: disable, require, verify-ca, verify-full (default: "require").
    #[serde(default = "default_require")]
    pub ssl_mode: String,

    /// Connect timeout in seconds (default: 30).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Target database (SQL Server) configuration.
///
/// The target is never connected to; these values only shape the scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database type (always "mssql").
    #[serde(default = "default_mssql")]
    pub r#type: String,

    /// Database named in the `USE` header of every script.
    #[serde(default)]
    pub database: Option<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            r#type: default_mssql(),
            database: None,
        }
    }
}

/// Conversion behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Directory that receives the generated scripts (default: "output").
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Convert objects in the `public` schema (default: false).
    #[serde(default)]
    pub include_public: bool,

    /// Additional schemas to skip.
    #[serde(default)]
    pub excluded_schemas: Vec<String>,

    /// Rows sampled per array column when measuring cardinality (default: 10000).
    #[serde(default = "default_array_sample_limit")]
    pub array_sample_limit: i64,

    /// How referential actions are rendered on foreign keys (default: omit).
    #[serde(default)]
    pub foreign_key_actions: ForeignKeyActions,

    /// Suffix stripped from catalog foreign key names (default: "_fkey").
    #[serde(default = "default_fkey_suffix")]
    pub foreign_key_suffix: String,

    /// Emit a `USE [database]` header when a target database is set (default: true).
    #[serde(default = "default_true")]
    pub emit_use_database: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            include_public: false,
            excluded_schemas: Vec::new(),
            array_sample_limit: default_array_sample_limit(),
            foreign_key_actions: ForeignKeyActions::default(),
            foreign_key_suffix: default_fkey_suffix(),
            emit_use_database: true,
        }
    }
}

impl ConversionConfig {
    /// Schemas the catalog reader must skip.
    pub fn excluded_schema_list(&self) -> Vec<String> {
        let mut schemas = vec![
            "pg_catalog".to_string(),
            "information_schema".to_string(),
            "pg_toast".to_string(),
        ];
        if !self.include_public {
            schemas.push("public".to_string());
        }
        for schema in &self.excluded_schemas {
            if !schemas.contains(schema) {
                schemas.push(schema.clone());
            }
        }
        schemas
    }
}

/// Rendering of `ON DELETE` / `ON UPDATE` clauses on foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyActions {
    /// No referential action clauses.
    #[default]
    Omit,

    /// `ON DELETE CASCADE ON UPDATE CASCADE` on every foreign key.
    Cascade,

    /// Actions copied from the source catalog.
    Source,
}

// Default value functions for serde
fn default_postgres() -> String {
    "postgres".to_string()
}

fn default_mssql() -> String {
    "mssql".to_string()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_require() -> String {
    "require".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_array_sample_limit() -> i64 {
    10_000
}

fn default_fkey_suffix() -> String {
    "_fkey".to_string()
}

fn default_true() -> bool {
    true
}
