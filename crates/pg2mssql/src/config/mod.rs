//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{ConvertError, Result};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Database named in the script headers, if any.
    pub fn use_database(&self) -> Option<&str> {
        if self.conversion.emit_use_database {
            self.target.database.as_deref()
        } else {
            None
        }
    }
}

impl SourceConfig {
    /// Build a tokio-postgres configuration.
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host);
        pg.port(self.port);
        pg.dbname(&self.database);
        pg.user(&self.user);
        pg.password(&self.password);
        pg.application_name("pg2mssql");
        pg.connect_timeout(std::time::Duration::from_secs(self.connect_timeout_secs));
        pg
    }
}
