//! Identifier validation and quoting.
//!
//! Catalog names end up in two places: the sampling queries run against
//! PostgreSQL and the generated T-SQL scripts. Identifiers cannot be bound as
//! query parameters, so every name is validated and quoted for its dialect
//! before it is spliced into SQL text.

use crate::error::{ConvertError, Result};

/// Maximum identifier length accepted by SQL Server.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for emission.
///
/// Rejects empty names, names containing null bytes and names longer than
/// SQL Server's 128 character limit.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ConvertError::Identifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(ConvertError::Identifier(format!(
            "identifier contains a null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(ConvertError::Identifier(format!(
            "identifier exceeds {} characters (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.chars().count(),
            name
        )));
    }

    Ok(())
}

/// Quote a PostgreSQL identifier with double quotes.
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Qualify a PostgreSQL relation name with its schema.
pub fn qualify_pg(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_pg(schema)?, quote_pg(table)?))
}

/// Quote a SQL Server identifier with brackets.
pub fn quote_mssql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(bracket(name))
}

/// Qualify a SQL Server object name with its schema.
pub fn qualify_mssql(schema: &str, name: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_mssql(schema)?, quote_mssql(name)?))
}

/// Bracket a name that has already been validated.
pub(crate) fn bracket(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Render a Unicode string literal for T-SQL (`N'...'`).
pub fn mssql_string_literal(value: &str) -> String {
    format!("N'{}'", value.replace('\'', "''"))
}
