//! Error types for the conversion library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for conversion operations.
///
/// Only conditions that stop a run are represented here. Problems confined
/// to a single catalog row (an unmappable type, an unsupported default) are
/// reported as [`Diagnostic`](crate::core::Diagnostic)s instead.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source catalog could not be reached.
    #[error("Connection to source catalog failed: {0}")]
    Connection(String),

    /// A catalog query failed.
    #[error("Catalog query for {entity} failed: {message}")]
    CatalogQuery { entity: String, message: String },

    /// Source database error surfaced by the driver.
    #[error("Source database error: {0}")]
    Source(#[from] tokio_postgres::Error),

    /// An identifier from the catalog cannot be emitted safely.
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// An output artifact could not be created or written.
    #[error("Failed to write artifact {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    /// Create a CatalogQuery error for the given entity kind.
    pub fn catalog_query(entity: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::CatalogQuery {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create an Output error for an artifact path.
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Output {
            path: path.into(),
            source,
        }
    }

    /// Name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            ConvertError::Config(_) | ConvertError::Yaml(_) => "configuration",
            ConvertError::Connection(_) => "connect",
            ConvertError::CatalogQuery { .. } | ConvertError::Source(_) => "catalog read",
            ConvertError::Identifier(_) => "model build",
            ConvertError::Output { .. } | ConvertError::Io(_) => "artifact output",
            ConvertError::Json(_) => "serialization",
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConvertError::Config(_) | ConvertError::Yaml(_) => 2,
            ConvertError::Connection(_) | ConvertError::Source(_) => 3,
            ConvertError::Output { .. } | ConvertError::Io(_) => 4,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error during {}: {}\n", self.stage(), self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;
