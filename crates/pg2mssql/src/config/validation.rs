//! Configuration validation.

use super::Config;
use crate::error::{ConvertError, Result};
use crate::source::SslMode;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.host.is_empty() {
        return Err(ConvertError::Config("source.host is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(ConvertError::Config("source.database is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(ConvertError::Config("source.user is required".into()));
    }
    if config.source.r#type != "postgres" {
        return Err(ConvertError::Config(format!(
            "source.type must be 'postgres', got '{}'",
            config.source.r#type
        )));
    }
    SslMode::parse(&config.source.ssl_mode)?;

    // Target validation
    if config.target.r#type != "mssql" {
        return Err(ConvertError::Config(format!(
            "target.type must be 'mssql', got '{}'",
            config.target.r#type
        )));
    }
    if let Some(db) = &config.target.database {
        if db.trim().is_empty() {
            return Err(ConvertError::Config(
                "target.database must not be blank when set".into(),
            ));
        }
    }

    // Conversion validation
    if config.conversion.output_dir.as_os_str().is_empty() {
        return Err(ConvertError::Config(
            "conversion.output_dir is required".into(),
        ));
    }
    if config.conversion.array_sample_limit < 1 {
        return Err(ConvertError::Config(
            "conversion.array_sample_limit must be at least 1".into(),
        ));
    }

    Ok(())
}
