//! PostgreSQL catalog reader.
//!
//! Holds a single `tokio_postgres::Client` for the whole read phase. The
//! connection task is spawned on the current runtime and finishes on its own
//! once the reader (and with it the client) is dropped.

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

use crate::config::SourceConfig;
use crate::core::identifier::{qualify_pg, quote_pg};
use crate::core::CatalogReader;
use crate::error::{ConvertError, Result};

use super::rows::{
    ColumnRow, ForeignKeyRow, IndexRow, SequenceRow, TableCommentRow, UserTypeRow,
};
use super::tls::{SslMode, TlsBuilder};

// Character sizes and numeric precision are decoded from atttypmod, which
// also covers array columns (information_schema reports NULL for those).
const COLUMNS_SQL: &str = r#"
    SELECT
        n.nspname::text,
        c.relname::text,
        a.attname::text,
        a.attnum::int4,
        a.atttypid::regtype::text,
        format_type(a.atttypid, a.atttypmod),
        NOT a.attnotnull,
        a.attndims::int4,
        CASE
            WHEN a.atttypid = ANY (ARRAY[1042::oid, 1043::oid, 1014::oid, 1015::oid])
                 AND a.atttypmod > 0 THEN a.atttypmod - 4
        END::int4,
        CASE
            WHEN a.atttypid = ANY (ARRAY[1700::oid, 1231::oid]) AND a.atttypmod > 0
                THEN ((a.atttypmod - 4) >> 16) & 65535
        END::int4,
        CASE
            WHEN a.atttypid = ANY (ARRAY[1700::oid, 1231::oid]) AND a.atttypmod > 0
                THEN (a.atttypmod - 4) & 65535
        END::int4,
        pg_get_expr(d.adbin, d.adrelid),
        col_description(a.attrelid, a.attnum::int4)
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
    LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
    WHERE c.relkind IN ('r', 'p')
      AND NOT c.relispartition
      AND a.attnum > 0
      AND NOT a.attisdropped
      AND n.nspname NOT LIKE 'pg\_%'
      AND NOT (n.nspname = ANY($1))
    ORDER BY n.nspname, c.relname, a.attnum
"#;

const USER_TYPES_SQL: &str = r#"
    SELECT
        n.nspname::text,
        t.typname::text,
        t.typbasetype::regtype::text,
        t.typnotnull,
        CASE
            WHEN t.typbasetype = ANY (ARRAY[1042::oid, 1043::oid]) AND t.typtypmod > 0
                THEN t.typtypmod - 4
        END::int4,
        CASE
            WHEN t.typbasetype = 1700::oid AND t.typtypmod > 0
                THEN ((t.typtypmod - 4) >> 16) & 65535
        END::int4,
        CASE
            WHEN t.typbasetype = 1700::oid AND t.typtypmod > 0
                THEN (t.typtypmod - 4) & 65535
        END::int4
    FROM pg_catalog.pg_type t
    JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
    WHERE t.typtype = 'd'
      AND n.nspname NOT LIKE 'pg\_%'
      AND NOT (n.nspname = ANY($1))
    ORDER BY n.nspname, t.typname
"#;

const TABLE_COMMENTS_SQL: &str = r#"
    SELECT n.nspname::text, c.relname::text, d.description
    FROM pg_catalog.pg_description d
    JOIN pg_catalog.pg_class c ON c.oid = d.objoid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE d.classoid = 'pg_catalog.pg_class'::regclass
      AND d.objsubid = 0
      AND c.relkind IN ('r', 'p')
      AND n.nspname NOT LIKE 'pg\_%'
      AND NOT (n.nspname = ANY($1))
    ORDER BY n.nspname, c.relname
"#;

// The owning column comes from the auto/internal dependency that serial,
// identity and OWNED BY record against the sequence.
const SEQUENCES_SQL: &str = r#"
    SELECT
        s.schemaname::text,
        s.sequencename::text,
        s.data_type::text,
        s.start_value,
        s.increment_by,
        s.min_value,
        s.max_value,
        s.cache_size,
        s.cycle,
        s.last_value,
        (
            SELECT a.atttypid::regtype::text
            FROM pg_catalog.pg_depend d
            JOIN pg_catalog.pg_attribute a
                ON a.attrelid = d.refobjid AND a.attnum = d.refobjsubid
            WHERE d.classid = 'pg_catalog.pg_class'::regclass
              AND d.objid = c.oid
              AND d.refclassid = 'pg_catalog.pg_class'::regclass
              AND d.refobjsubid > 0
              AND d.deptype IN ('a', 'i')
            LIMIT 1
        )
    FROM pg_catalog.pg_sequences s
    JOIN pg_catalog.pg_namespace n ON n.nspname = s.schemaname
    JOIN pg_catalog.pg_class c ON c.relnamespace = n.oid AND c.relname = s.sequencename
    WHERE s.schemaname NOT LIKE 'pg\_%'
      AND NOT (s.schemaname = ANY($1))
    ORDER BY s.schemaname, s.sequencename
"#;

// One row per key position; INCLUDE columns (beyond indnkeyatts) are skipped.
// attname is NULL for expression keys (attnum 0).
const INDEXES_SQL: &str = r#"
    SELECT
        n.nspname::text,
        t.relname::text,
        i.relname::text,
        ix.indisprimary,
        ix.indisunique,
        a.attname::text,
        k.ord::int4,
        COALESCE(ix.indoption[k.ord - 1], 0)::int4
    FROM pg_catalog.pg_index ix
    JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
    JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
    CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
    LEFT JOIN pg_catalog.pg_attribute a
        ON a.attrelid = t.oid AND a.attnum = k.attnum AND k.attnum > 0
    WHERE t.relkind IN ('r', 'p')
      AND NOT t.relispartition
      AND k.ord <= ix.indnkeyatts
      AND n.nspname NOT LIKE 'pg\_%'
      AND NOT (n.nspname = ANY($1))
    ORDER BY n.nspname, t.relname, i.relname, k.ord
"#;

const FOREIGN_KEYS_SQL: &str = r#"
    SELECT
        n.nspname::text,
        t.relname::text,
        c.conname::text,
        ARRAY(
            SELECT a.attname::text
            FROM unnest(c.conkey) WITH ORDINALITY AS k(attnum, ord)
            JOIN pg_catalog.pg_attribute a
                ON a.attrelid = c.conrelid AND a.attnum = k.attnum
            ORDER BY k.ord
        ),
        rn.nspname::text,
        rt.relname::text,
        ARRAY(
            SELECT a.attname::text
            FROM unnest(c.confkey) WITH ORDINALITY AS k(attnum, ord)
            JOIN pg_catalog.pg_attribute a
                ON a.attrelid = c.confrelid AND a.attnum = k.attnum
            ORDER BY k.ord
        ),
        c.confdeltype::text,
        c.confupdtype::text
    FROM pg_catalog.pg_constraint c
    JOIN pg_catalog.pg_class t ON t.oid = c.conrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
    JOIN pg_catalog.pg_class rt ON rt.oid = c.confrelid
    JOIN pg_catalog.pg_namespace rn ON rn.oid = rt.relnamespace
    WHERE c.contype = 'f'
      AND NOT t.relispartition
      AND n.nspname NOT LIKE 'pg\_%'
      AND NOT (n.nspname = ANY($1))
    ORDER BY n.nspname, t.relname, c.conname
"#;

/// Catalog reader over a live PostgreSQL connection.
pub struct PgCatalogReader {
    client: Client,
    excluded_schemas: Vec<String>,
    name: String,
}

impl PgCatalogReader {
    /// Open the catalog connection.
    ///
    /// `excluded_schemas` are skipped by every catalog query.
    pub async fn connect(config: &SourceConfig, excluded_schemas: Vec<String>) -> Result<Self> {
        let ssl_mode = SslMode::parse(&config.ssl_mode)?;
        let pg_config = config.pg_config();
        let name = format!("{}:{}/{}", config.host, config.port, config.database);

        let client = match TlsBuilder::new(ssl_mode).build()? {
            None => {
                let (client, connection) = pg_config
                    .connect(NoTls)
                    .await
                    .map_err(|e| connection_error(&name, e))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("PostgreSQL catalog connection error: {}", e);
                    }
                });
                client
            }
            Some(tls) => {
                let (client, connection) = pg_config
                    .connect(tls)
                    .await
                    .map_err(|e| connection_error(&name, e))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("PostgreSQL catalog connection error: {}", e);
                    }
                });
                client
            }
        };

        info!("Connected to PostgreSQL catalog at {} (ssl_mode={:?})", name, ssl_mode);

        Ok(Self {
            client,
            excluded_schemas,
            name,
        })
    }

    /// Server version string, used by the health check.
    pub async fn server_version(&self) -> Result<String> {
        let row = self
            .client
            .query_one("SELECT version()", &[])
            .await
            .map_err(|e| connection_error(&self.name, e))?;
        Ok(row.try_get(0)?)
    }

    async fn query_catalog(&self, entity: &str, sql: &str) -> Result<Vec<Row>> {
        let rows = self
            .client
            .query(sql, &[&self.excluded_schemas])
            .await
            .map_err(|e| self.query_error(entity, e))?;
        debug!("Read {} {} rows from {}", rows.len(), entity, self.name);
        Ok(rows)
    }

    /// A lost connection is fatal; any other query failure is recoverable.
    fn query_error(&self, entity: &str, e: tokio_postgres::Error) -> ConvertError {
        if e.is_closed() {
            connection_error(&self.name, e)
        } else {
            ConvertError::catalog_query(entity, error_detail(&e))
        }
    }
}

fn connection_error(target: &str, e: tokio_postgres::Error) -> ConvertError {
    ConvertError::Connection(format!("{}: {}", target, error_detail(&e)))
}

/// Driver errors print a generic message; the cause carries the detail.
fn error_detail(e: &tokio_postgres::Error) -> String {
    match std::error::Error::source(e) {
        Some(source) => format!("{}: {}", e, source),
        None => e.to_string(),
    }
}

impl ColumnRow {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            schema: row.try_get(0)?,
            table: row.try_get(1)?,
            column: row.try_get(2)?,
            ordinal: row.try_get(3)?,
            regtype: row.try_get(4)?,
            formatted_type: row.try_get(5)?,
            is_nullable: row.try_get(6)?,
            array_dims: row.try_get(7)?,
            max_char_size: row.try_get(8)?,
            numeric_precision: row.try_get(9)?,
            numeric_scale: row.try_get(10)?,
            default_expr: row.try_get(11)?,
            comment: row.try_get(12)?,
        })
    }
}

impl UserTypeRow {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            schema: row.try_get(0)?,
            name: row.try_get(1)?,
            base_type: row.try_get(2)?,
            not_null: row.try_get(3)?,
            max_char_size: row.try_get(4)?,
            numeric_precision: row.try_get(5)?,
            numeric_scale: row.try_get(6)?,
        })
    }
}

impl TableCommentRow {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            schema: row.try_get(0)?,
            table: row.try_get(1)?,
            comment: row.try_get(2)?,
        })
    }
}

impl SequenceRow {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            schema: row.try_get(0)?,
            name: row.try_get(1)?,
            data_type: row.try_get(2)?,
            start_value: row.try_get(3)?,
            increment_by: row.try_get(4)?,
            min_value: row.try_get(5)?,
            max_value: row.try_get(6)?,
            cache_size: row.try_get(7)?,
            cycle: row.try_get(8)?,
            last_value: row.try_get(9)?,
            owner_type: row.try_get(10)?,
        })
    }
}

impl IndexRow {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            schema: row.try_get(0)?,
            table: row.try_get(1)?,
            index_name: row.try_get(2)?,
            is_primary: row.try_get(3)?,
            is_unique: row.try_get(4)?,
            column: row.try_get(5)?,
            column_position: row.try_get(6)?,
            options: row.try_get(7)?,
        })
    }
}

impl ForeignKeyRow {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            schema: row.try_get(0)?,
            table: row.try_get(1)?,
            constraint_name: row.try_get(2)?,
            columns: row.try_get(3)?,
            ref_schema: row.try_get(4)?,
            ref_table: row.try_get(5)?,
            ref_columns: row.try_get(6)?,
            on_delete: row.try_get(7)?,
            on_update: row.try_get(8)?,
        })
    }
}

#[async_trait]
impl CatalogReader for PgCatalogReader {
    async fn read_columns(&self) -> Result<Vec<ColumnRow>> {
        self.query_catalog("columns", COLUMNS_SQL)
            .await?
            .iter()
            .map(ColumnRow::from_row)
            .collect()
    }

    async fn read_user_types(&self) -> Result<Vec<UserTypeRow>> {
        self.query_catalog("user types", USER_TYPES_SQL)
            .await?
            .iter()
            .map(UserTypeRow::from_row)
            .collect()
    }

    async fn read_table_comments(&self) -> Result<Vec<TableCommentRow>> {
        self.query_catalog("table comments", TABLE_COMMENTS_SQL)
            .await?
            .iter()
            .map(TableCommentRow::from_row)
            .collect()
    }

    async fn read_sequences(&self) -> Result<Vec<SequenceRow>> {
        self.query_catalog("sequences", SEQUENCES_SQL)
            .await?
            .iter()
            .map(SequenceRow::from_row)
            .collect()
    }

    async fn read_indexes(&self) -> Result<Vec<IndexRow>> {
        self.query_catalog("indexes", INDEXES_SQL)
            .await?
            .iter()
            .map(IndexRow::from_row)
            .collect()
    }

    async fn read_foreign_keys(&self) -> Result<Vec<ForeignKeyRow>> {
        self.query_catalog("foreign keys", FOREIGN_KEYS_SQL)
            .await?
            .iter()
            .map(ForeignKeyRow::from_row)
            .collect()
    }

    async fn array_cardinality(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        is_binary: bool,
        sample_limit: i64,
    ) -> Result<Option<i64>> {
        let col = quote_pg(column)?;
        let relation = qualify_pg(schema, table)?;
        let measure = if is_binary { "length" } else { "cardinality" };
        let sql = format!(
            "SELECT max({measure}(s.{col}))::int8 FROM \
             (SELECT {col} FROM {relation} WHERE {col} IS NOT NULL LIMIT $1) s"
        );

        let row = self
            .client
            .query_one(&sql, &[&sample_limit])
            .await
            .map_err(|e| {
                self.query_error(
                    &format!("array cardinality of {}.{}.{}", schema, table, column),
                    e,
                )
            })?;
        Ok(row.try_get(0)?)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
