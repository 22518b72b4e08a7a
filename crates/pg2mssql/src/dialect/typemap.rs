//! PostgreSQL → SQL Server type mapping.
//!
//! Source types arrive as `regtype` text ("character varying", "timestamp
//! without time zone", "integer[]"). They are parsed into [`PgType`] first;
//! every name without a known SQL Server equivalent lands in
//! [`PgType::Other`] and is emitted unchanged with a warning.

use crate::core::schema::ColumnDescriptor;
use crate::core::traits::{ColumnMapping, TypeMapper, TypeMapping};

/// PostgreSQL type names the mapper knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgType {
    BigInt,
    Integer,
    Int,
    SmallInt,
    Numeric,
    Decimal,
    Dec,
    Real,
    DoublePrecision,
    Money,
    Boolean,
    Char,
    Character,
    CharacterVarying,
    Text,
    Xml,
    Bytea,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    /// Anything else, as written but with the array suffix removed.
    Other(String),
}

impl PgType {
    /// Parse a `regtype` name, ignoring any `[]` suffix and a size modifier.
    ///
    /// Matching is case-insensitive; unknown names keep their original case
    /// since quoted PostgreSQL identifiers are case-sensitive.
    pub fn parse(regtype: &str) -> Self {
        let mut name = regtype.trim();
        while let Some(stripped) = name.strip_suffix("[]") {
            name = stripped.trim_end();
        }
        let lower = name.to_lowercase();

        match strip_modifier(&lower).as_str() {
            "bigint" => PgType::BigInt,
            "integer" => PgType::Integer,
            "int" => PgType::Int,
            "smallint" => PgType::SmallInt,
            "numeric" => PgType::Numeric,
            "decimal" => PgType::Decimal,
            "dec" => PgType::Dec,
            "real" => PgType::Real,
            "double precision" => PgType::DoublePrecision,
            "money" => PgType::Money,
            "boolean" => PgType::Boolean,
            "char" => PgType::Char,
            "character" => PgType::Character,
            "character varying" => PgType::CharacterVarying,
            "text" => PgType::Text,
            "xml" => PgType::Xml,
            "bytea" => PgType::Bytea,
            "date" => PgType::Date,
            "time" | "time without time zone" => PgType::Time,
            "timestamp" | "timestamp without time zone" => PgType::Timestamp,
            "timestamp with time zone" => PgType::TimestampTz,
            "uuid" => PgType::Uuid,
            _ => PgType::Other(name.to_string()),
        }
    }

    /// SQL Server type name, `None` for [`PgType::Other`].
    pub fn mssql_name(&self) -> Option<&'static str> {
        let name = match self {
            PgType::BigInt => "bigint",
            PgType::Integer => "integer",
            PgType::Int => "int",
            PgType::SmallInt => "smallint",
            PgType::Numeric => "numeric",
            PgType::Decimal => "decimal",
            PgType::Dec => "dec",
            PgType::Real => "real",
            PgType::DoublePrecision => "double precision",
            PgType::Money => "money",
            PgType::Boolean => "bit",
            PgType::Char => "char",
            PgType::Character => "character",
            PgType::CharacterVarying => "varchar",
            PgType::Text => "text",
            PgType::Xml => "xml",
            PgType::Bytea => "binary",
            PgType::Date => "date",
            PgType::Time => "time",
            PgType::Timestamp => "datetime2",
            PgType::TimestampTz => "datetimeoffset",
            PgType::Uuid => "uniqueidentifier",
            PgType::Other(_) => return None,
        };
        Some(name)
    }
}

/// "time(3) without time zone" → "time without time zone", "numeric(10,2)" → "numeric".
fn strip_modifier(name: &str) -> String {
    match (name.find('('), name.find(')')) {
        (Some(open), Some(close)) if close > open => {
            let mut out = String::with_capacity(name.len());
            out.push_str(name[..open].trim_end());
            let rest = name[close + 1..].trim_start();
            if !rest.is_empty() {
                out.push(' ');
                out.push_str(rest);
            }
            out
        }
        _ => name.to_string(),
    }
}

/// PostgreSQL → SQL Server type mapper.
#[derive(Debug, Clone, Default)]
pub struct PostgresToMssqlMapper;

impl PostgresToMssqlMapper {
    pub fn new() -> Self {
        Self
    }
}

impl TypeMapper for PostgresToMssqlMapper {
    fn source_dialect(&self) -> &str {
        "postgres"
    }

    fn target_dialect(&self) -> &str {
        "mssql"
    }

    fn map_type(&self, source_type: &str) -> TypeMapping {
        match PgType::parse(source_type) {
            PgType::Other(name) => TypeMapping::unmapped(name),
            known => match known.mssql_name() {
                Some(target) => TypeMapping::mapped(target),
                None => TypeMapping::unmapped(source_type.trim()),
            },
        }
    }

    fn max_value_for_type(&self, target_type: &str) -> Option<i64> {
        let lower = target_type.trim().to_lowercase();
        match strip_modifier(&lower).as_str() {
            "tinyint" => Some(255),
            "smallint" => Some(i16::MAX as i64),
            "int" | "integer" => Some(i32::MAX as i64),
            "bigint" => Some(i64::MAX),
            _ => None,
        }
    }

    fn map_column(&self, col: &ColumnDescriptor) -> ColumnMapping {
        let mapping = self.map_type(col.element_type());
        let target_type = render_sized(
            &mapping.target_type,
            col.max_char_size,
            col.numeric_precision,
            col.numeric_scale,
        );

        ColumnMapping {
            name: col.name.clone(),
            target_type,
            is_nullable: col.is_nullable,
            warning: mapping.warning,
        }
    }
}

/// Largest fixed `binary(n)` SQL Server accepts.
const MAX_BINARY_LENGTH: i32 = 8000;

/// Attach size, precision and scale to a mapped type name.
///
/// A known character size wins; precision applies only to the exact numeric
/// types and scale is printed only when positive. `varchar` without a size
/// becomes `varchar(max)`. `binary` takes its sampled byte length, and
/// becomes `varbinary(max)` when none was sampled or it exceeds 8000.
pub fn render_sized(
    target: &str,
    max_char_size: Option<i32>,
    precision: Option<i32>,
    scale: Option<i32>,
) -> String {
    if target == "binary" {
        return match max_char_size.filter(|s| (1..=MAX_BINARY_LENGTH).contains(s)) {
            Some(size) => format!("binary({})", size),
            None => "varbinary(max)".to_string(),
        };
    }

    if let Some(size) = max_char_size.filter(|s| *s > 0) {
        return format!("{}({})", target, size);
    }

    let is_exact_numeric = matches!(target, "numeric" | "decimal" | "dec");
    if is_exact_numeric {
        if let Some(p) = precision.filter(|p| *p > 0) {
            return match scale.filter(|s| *s > 0) {
                Some(s) => format!("{}({},{})", target, p, s),
                None => format!("{}({})", target, p),
            };
        }
    }

    if target == "varchar" {
        return "varchar(max)".to_string();
    }

    target.to_string()
}
