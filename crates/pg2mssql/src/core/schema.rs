//! Structured catalog model.
//!
//! These descriptors are produced once per run by the model builder from raw
//! catalog rows and are consumed read-only by the emitter. Only sequence
//! maxima and array flattening mutate them after the build.

use serde::{Deserialize, Serialize};

use super::identifier::bracket;

/// Snapshot of everything converted in one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    /// Schema names in first-seen order.
    pub schemas: Vec<String>,

    /// Tables in catalog order.
    pub tables: Vec<TableDescriptor>,

    /// User-defined (domain) types.
    pub user_types: Vec<UserTypeDescriptor>,

    /// Sequences.
    pub sequences: Vec<SequenceDescriptor>,

    /// Primary keys, unique constraints and plain indexes.
    pub indexes: Vec<IndexDescriptor>,

    /// Foreign keys with derived target names.
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl SchemaCatalog {
    /// True when there are no tables to convert.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Look up a table by schema and name.
    pub fn table(&self, schema: &str, name: &str) -> Option<&TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.schema == schema && t.name == name)
    }

    /// Record a schema name if it has not been seen yet.
    pub fn note_schema(&mut self, schema: &str) {
        if !self.schemas.iter().any(|s| s == schema) {
            self.schemas.push(schema.to_string());
        }
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

/// Table metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Schema name.
    pub schema: String,

    /// Table name.
    pub name: String,

    /// Columns in ordinal order.
    pub columns: Vec<ColumnDescriptor>,

    /// Table comment.
    pub comment: Option<String>,
}

impl TableDescriptor {
    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Ordinal position (1-based, catalog order).
    pub ordinal: i32,

    /// Type identifier as printed by `regtype` (e.g. "character varying[]").
    pub source_type: String,

    /// Type as printed by `format_type` (e.g. "character varying(20)[]").
    pub formatted_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Number of array dimensions (0 for scalars).
    pub array_dims: i32,

    /// Largest observed array cardinality (0 for scalars or when unknown).
    pub max_cardinality: i64,

    /// Numeric precision.
    pub numeric_precision: Option<i32>,

    /// Numeric scale.
    pub numeric_scale: Option<i32>,

    /// Maximum character length.
    pub max_char_size: Option<i32>,

    /// Raw default expression.
    pub default: Option<String>,

    /// Column comment.
    pub comment: Option<String>,
}

impl ColumnDescriptor {
    /// Whether the column is an array.
    pub fn is_array(&self) -> bool {
        self.array_dims > 0 || self.source_type.ends_with("[]")
    }

    /// Source type with any array suffix removed.
    pub fn element_type(&self) -> &str {
        let mut ty = self.source_type.trim();
        while let Some(stripped) = ty.strip_suffix("[]") {
            ty = stripped.trim_end();
        }
        ty
    }
}

/// Translated column default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultValueSpec {
    /// Emitted verbatim.
    Literal(String),
    /// `now()`.
    BuiltinNow,
    /// `true` / `false`.
    BooleanLiteral(bool),
    /// `nextval('...')` on a sequence.
    SequenceNextValue { schema: String, sequence: String },
    /// A cast literal whose value is emitted without the cast.
    PassThrough(String),
    /// No target equivalent; nothing is emitted.
    Unsupported,
}

impl DefaultValueSpec {
    /// Render as a T-SQL expression, or `None` for unsupported defaults.
    pub fn render(&self) -> Option<String> {
        match self {
            DefaultValueSpec::Literal(text) | DefaultValueSpec::PassThrough(text) => {
                Some(text.clone())
            }
            DefaultValueSpec::BuiltinNow => Some("GETDATE()".to_string()),
            DefaultValueSpec::BooleanLiteral(value) => {
                Some(if *value { "1" } else { "0" }.to_string())
            }
            DefaultValueSpec::SequenceNextValue { schema, sequence } => Some(format!(
                "NEXT VALUE FOR {}.{}",
                bracket(schema),
                bracket(sequence)
            )),
            DefaultValueSpec::Unsupported => None,
        }
    }
}

/// User-defined domain type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTypeDescriptor {
    pub schema: String,
    pub name: String,
    /// Base type as printed by `regtype`.
    pub base_type: String,
    pub not_null: bool,
    pub max_char_size: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
}

/// Sequence metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceDescriptor {
    /// Schema name.
    pub schema: String,

    /// Sequence name.
    pub name: String,

    /// Source data type (smallint, integer or bigint).
    pub data_type: String,

    /// Type of the column that owns the sequence, when known.
    pub owner_type: Option<String>,

    /// Resolved target type.
    pub target_type: String,

    /// Catalog start value.
    pub start: i64,

    /// Increment.
    pub increment: i64,

    /// Minimum value.
    pub min_value: i64,

    /// Maximum value, clamped to the target type once resolved.
    pub max_value: i64,

    /// Cache size.
    pub cache: i64,

    /// Whether the sequence wraps around.
    pub cycle: bool,

    /// Last value handed out (or the start value if never called).
    pub last_value: i64,

    /// Whether `last_value` has actually been returned by `nextval`.
    pub is_called: bool,
}

impl SequenceDescriptor {
    /// Get the fully qualified sequence name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// Kind of index-backed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    PrimaryKey,
    Unique,
    Plain,
}

/// Sort direction of an index column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Direction from `pg_index.indoption`; bit 0 marks descending.
    pub fn from_option(option: i32) -> Self {
        if option & 1 == 1 {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One key column of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    pub direction: SortDirection,
}

/// Index metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Schema name.
    pub schema: String,

    /// Owning table.
    pub table: String,

    /// Index name.
    pub name: String,

    /// Primary key, unique constraint or plain index.
    pub kind: IndexKind,

    /// Key columns in index order.
    pub columns: Vec<IndexColumn>,
}

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// Parse a `pg_constraint.confdeltype` / `confupdtype` code.
    pub fn from_pg_code(code: &str) -> Self {
        match code.trim() {
            "r" => ReferentialAction::Restrict,
            "c" => ReferentialAction::Cascade,
            "n" => ReferentialAction::SetNull,
            "d" => ReferentialAction::SetDefault,
            _ => ReferentialAction::NoAction,
        }
    }

    /// T-SQL rendering. SQL Server has no RESTRICT.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction | ReferentialAction::Restrict => "NO ACTION",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// Foreign key metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    /// Target constraint name (`FK_...`, deduplicated per table).
    pub name: String,

    /// Constraint name in the source catalog.
    pub source_name: String,

    /// Owning schema.
    pub schema: String,

    /// Owning table.
    pub table: String,

    /// Referenced schema.
    pub ref_schema: String,

    /// Referenced table.
    pub ref_table: String,

    /// Local column names.
    pub columns: Vec<String>,

    /// Referenced column names, paired with `columns`.
    pub ref_columns: Vec<String>,

    /// ON DELETE action.
    pub on_delete: ReferentialAction,

    /// ON UPDATE action.
    pub on_update: ReferentialAction,
}
