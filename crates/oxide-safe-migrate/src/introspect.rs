//! Live catalog introspection.
//!
//! [`Introspector`] answers "what exists right now" by querying the catalog of
//! the connected database. Nothing is cached: every call issues a fresh query,
//! so a step always sees the effects of the step before it.
//!
//! Every catalog query casts its output columns to text or 64-bit integers so
//! that rows decode uniformly through `sqlx::Any`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::AnyConnection;

use crate::dialect::Dialect;
use crate::error::{MigrateError, Result};
use crate::schema::{EnumType, ForeignKeyAction};
use crate::seed::KeyFilter;

/// A column as it exists in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Declared type exactly as the catalog reports it.
    pub type_name: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Default expression exactly as the catalog reports it.
    pub default: Option<String>,
    /// 1-based position in the primary key, 0 if not part of it.
    pub primary_key: u32,
    /// Whether the value is computed by a `GENERATED ALWAYS AS` expression.
    #[serde(default)]
    pub generated: bool,
}

/// Where an index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexOrigin {
    /// Created with `CREATE INDEX`.
    Created,
    /// Backs a `UNIQUE` constraint of the table definition.
    UniqueConstraint,
    /// Backs the primary key.
    PrimaryKey,
}

/// An index as it exists in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name.
    pub name: String,
    /// Indexed columns in key order. Expression parts are omitted.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// How the index was created.
    pub origin: IndexOrigin,
    /// The `CREATE INDEX` statement, where the catalog keeps it (SQLite).
    pub sql: Option<String>,
}

/// A foreign key as it exists in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    /// Referencing columns.
    pub columns: Vec<String>,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced columns; empty means the referenced primary key.
    pub referenced_columns: Vec<String>,
    /// ON UPDATE action.
    pub on_update: ForeignKeyAction,
    /// ON DELETE action.
    pub on_delete: ForeignKeyAction,
}

/// Everything the catalog knows about one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescriptor>,
    /// Indexes, sorted by name.
    pub indexes: Vec<IndexDescriptor>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    /// Whether the primary key uses SQLite `AUTOINCREMENT`.
    pub autoincrement: bool,
}

impl TableDescriptor {
    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary key columns in key order.
    #[must_use]
    pub fn primary_key(&self) -> Vec<&str> {
        let mut pk: Vec<&ColumnDescriptor> =
            self.columns.iter().filter(|c| c.primary_key > 0).collect();
        pk.sort_by_key(|c| c.primary_key);
        pk.into_iter().map(|c| c.name.as_str()).collect()
    }
}

// Tables.
const SQLITE_TABLES: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
const MYSQL_TABLES: &str = "SELECT CAST(TABLE_NAME AS CHAR) FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME";
const POSTGRES_TABLES: &str =
    "SELECT tablename::text FROM pg_tables WHERE schemaname = current_schema() ORDER BY tablename";
const GENERIC_TABLES: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_type = 'BASE TABLE' ORDER BY table_name";

// Columns: (name, type, nullable, default, pk position, generated).
// `hidden` is 1 for hidden virtual-table columns, 2 or 3 for generated ones.
const SQLITE_COLUMNS: &str = "SELECT name, type, 1 - \"notnull\", dflt_value, pk, hidden IN (2, 3) \
     FROM pragma_table_xinfo(?) WHERE hidden <> 1 ORDER BY cid";
const MYSQL_COLUMNS: &str = "SELECT CAST(COLUMN_NAME AS CHAR), CAST(COLUMN_TYPE AS CHAR), \
     CAST(CASE WHEN IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS SIGNED), \
     CAST(COLUMN_DEFAULT AS CHAR), \
     CAST(CASE WHEN COLUMN_KEY = 'PRI' THEN 1 ELSE 0 END AS SIGNED), \
     CAST(CASE WHEN EXTRA LIKE '%VIRTUAL GENERATED%' OR EXTRA LIKE '%STORED GENERATED%' \
     THEN 1 ELSE 0 END AS SIGNED) \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION";
const POSTGRES_COLUMNS: &str = "SELECT a.attname::text, format_type(a.atttypid, a.atttypmod)::text, \
     (CASE WHEN a.attnotnull THEN 0 ELSE 1 END)::int8, \
     pg_get_expr(d.adbin, d.adrelid)::text, \
     COALESCE(array_position(pk.conkey, a.attnum), 0)::int8, \
     (CASE WHEN a.attgenerated <> '' THEN 1 ELSE 0 END)::int8 \
     FROM pg_attribute a \
     JOIN pg_class c ON c.oid = a.attrelid \
     JOIN pg_namespace n ON n.oid = c.relnamespace \
     LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum \
     LEFT JOIN pg_constraint pk ON pk.conrelid = c.oid AND pk.contype = 'p' \
     WHERE c.relname = $1 AND n.nspname = current_schema() \
     AND a.attnum > 0 AND NOT a.attisdropped \
     ORDER BY a.attnum";
const GENERIC_COLUMNS: &str = "SELECT column_name, data_type, \
     CASE WHEN is_nullable = 'YES' THEN 1 ELSE 0 END, column_default, 0, 0 \
     FROM information_schema.columns WHERE table_name = ? ORDER BY ordinal_position";

// Indexes.
const SQLITE_INDEX_LIST: &str = "SELECT name, \"unique\", origin FROM pragma_index_list(?)";
const SQLITE_INDEX_INFO: &str = "SELECT name FROM pragma_index_info(?) ORDER BY seqno";
const SQLITE_INDEX_SQL: &str = "SELECT sql FROM sqlite_master WHERE type = 'index' AND name = ?";
// (index, column, unique, primary) ordered by index then key position.
const MYSQL_INDEXES: &str = "SELECT CAST(INDEX_NAME AS CHAR), CAST(COLUMN_NAME AS CHAR), \
     CAST(1 - NON_UNIQUE AS SIGNED), \
     CAST(CASE WHEN INDEX_NAME = 'PRIMARY' THEN 1 ELSE 0 END AS SIGNED) \
     FROM information_schema.STATISTICS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
     ORDER BY INDEX_NAME, SEQ_IN_INDEX";
const POSTGRES_INDEXES: &str = "SELECT i.relname::text, a.attname::text, \
     (CASE WHEN ix.indisunique THEN 1 ELSE 0 END)::int8, \
     (CASE WHEN ix.indisprimary THEN 1 ELSE 0 END)::int8 \
     FROM pg_index ix \
     JOIN pg_class t ON t.oid = ix.indrelid \
     JOIN pg_class i ON i.oid = ix.indexrelid \
     JOIN pg_namespace n ON n.oid = t.relnamespace \
     CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord) \
     LEFT JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
     WHERE t.relname = $1 AND n.nspname = current_schema() \
     ORDER BY i.relname, k.ord";

// Foreign keys: (key id, column, referenced table, referenced column, on update, on delete).
const SQLITE_FOREIGN_KEYS: &str = "SELECT CAST(id AS TEXT), \"from\", \"table\", \"to\", on_update, on_delete \
     FROM pragma_foreign_key_list(?) ORDER BY id, seq";
const MYSQL_FOREIGN_KEYS: &str = "SELECT CAST(k.CONSTRAINT_NAME AS CHAR), CAST(k.COLUMN_NAME AS CHAR), \
     CAST(k.REFERENCED_TABLE_NAME AS CHAR), CAST(k.REFERENCED_COLUMN_NAME AS CHAR), \
     CAST(r.UPDATE_RULE AS CHAR), CAST(r.DELETE_RULE AS CHAR) \
     FROM information_schema.KEY_COLUMN_USAGE k \
     JOIN information_schema.REFERENTIAL_CONSTRAINTS r \
     ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME \
     WHERE k.TABLE_SCHEMA = DATABASE() AND k.TABLE_NAME = ? AND k.REFERENCED_TABLE_NAME IS NOT NULL \
     ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION";
const POSTGRES_FOREIGN_KEYS: &str = "SELECT c.conname::text, a.attname::text, ft.relname::text, fa.attname::text, \
     CASE c.confupdtype WHEN 'c' THEN 'CASCADE' WHEN 'n' THEN 'SET NULL' \
     WHEN 'd' THEN 'SET DEFAULT' WHEN 'r' THEN 'RESTRICT' ELSE 'NO ACTION' END, \
     CASE c.confdeltype WHEN 'c' THEN 'CASCADE' WHEN 'n' THEN 'SET NULL' \
     WHEN 'd' THEN 'SET DEFAULT' WHEN 'r' THEN 'RESTRICT' ELSE 'NO ACTION' END \
     FROM pg_constraint c \
     JOIN pg_class t ON t.oid = c.conrelid \
     JOIN pg_namespace n ON n.oid = t.relnamespace \
     JOIN pg_class ft ON ft.oid = c.confrelid \
     CROSS JOIN LATERAL unnest(c.conkey, c.confkey) WITH ORDINALITY AS k(attnum, fattnum, ord) \
     JOIN pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = k.attnum \
     JOIN pg_attribute fa ON fa.attrelid = c.confrelid AND fa.attnum = k.fattnum \
     WHERE c.contype = 'f' AND t.relname = $1 AND n.nspname = current_schema() \
     ORDER BY c.conname, k.ord";

// Enums.
const POSTGRES_ENUM_LABELS: &str = "SELECT e.enumlabel::text FROM pg_enum e \
     JOIN pg_type t ON t.oid = e.enumtypid \
     WHERE t.typname = $1 ORDER BY e.enumsortorder";
const POSTGRES_ENUM_TYPE: &str =
    "SELECT COUNT(*)::int8 FROM pg_type WHERE typname = $1 AND typtype = 'e'";

const SQLITE_TABLE_SQL: &str = "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?";
const SQLITE_TRIGGERS: &str = "SELECT sql FROM sqlite_master \
     WHERE type = 'trigger' AND tbl_name = ? AND sql IS NOT NULL ORDER BY name";

type ColumnRow = (String, String, i64, Option<String>, i64, i64);
type IndexRow = (String, Option<String>, i64, i64);
type ForeignKeyRow = (String, String, String, Option<String>, String, String);

/// Catalog reader bound to one connection.
pub struct Introspector<'c> {
    conn: &'c mut AnyConnection,
    dialect: Dialect,
}

impl<'c> Introspector<'c> {
    /// Creates an introspector for a connection whose dialect is known.
    pub fn new(conn: &'c mut AnyConnection, dialect: Dialect) -> Self {
        Self { conn, dialect }
    }

    fn unsupported(&self, operation: &'static str) -> MigrateError {
        MigrateError::UnsupportedDialectOperation {
            dialect: self.dialect.name(),
            operation,
        }
    }

    /// Lists the base tables of the current schema, sorted by name.
    pub async fn list_tables(&mut self) -> Result<Vec<String>> {
        let sql = match self.dialect {
            Dialect::ConstrainedString => SQLITE_TABLES,
            Dialect::OrdinalEnum => MYSQL_TABLES,
            Dialect::NativeEnum => POSTGRES_TABLES,
            Dialect::Generic => GENERIC_TABLES,
        };
        let rows: Vec<(String,)> = sqlx::query_as(sql)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| MigrateError::introspection(sql, e))?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Lists the columns of `table` in declaration order. A missing table
    /// yields an empty list.
    pub async fn list_columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let sql = match self.dialect {
            Dialect::ConstrainedString => SQLITE_COLUMNS,
            Dialect::OrdinalEnum => MYSQL_COLUMNS,
            Dialect::NativeEnum => POSTGRES_COLUMNS,
            Dialect::Generic => GENERIC_COLUMNS,
        };
        let rows: Vec<ColumnRow> = sqlx::query_as(sql)
            .bind(table)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| MigrateError::introspection(sql, e))?;

        Ok(rows
            .into_iter()
            .map(
                |(name, type_name, nullable, default, pk, generated)| ColumnDescriptor {
                    name,
                    type_name,
                    nullable: nullable != 0,
                    default,
                    primary_key: u32::try_from(pk).unwrap_or(0),
                    generated: generated != 0,
                },
            )
            .collect())
    }

    /// Lists the indexes of `table`, sorted by name. A missing table yields
    /// an empty list.
    pub async fn list_indexes(&mut self, table: &str) -> Result<Vec<IndexDescriptor>> {
        let mut indexes = match self.dialect {
            Dialect::ConstrainedString => self.sqlite_indexes(table).await?,
            Dialect::OrdinalEnum => self.grouped_indexes(MYSQL_INDEXES, table).await?,
            Dialect::NativeEnum => self.grouped_indexes(POSTGRES_INDEXES, table).await?,
            Dialect::Generic => return Err(self.unsupported("list_indexes")),
        };
        indexes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(indexes)
    }

    async fn sqlite_indexes(&mut self, table: &str) -> Result<Vec<IndexDescriptor>> {
        let list: Vec<(String, i64, String)> = sqlx::query_as(SQLITE_INDEX_LIST)
            .bind(table)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| MigrateError::introspection(SQLITE_INDEX_LIST, e))?;

        let mut indexes = Vec::with_capacity(list.len());
        for (name, unique, origin) in list {
            let columns: Vec<(Option<String>,)> = sqlx::query_as(SQLITE_INDEX_INFO)
                .bind(&name)
                .fetch_all(&mut *self.conn)
                .await
                .map_err(|e| MigrateError::introspection(SQLITE_INDEX_INFO, e))?;
            let sql: Option<(Option<String>,)> = sqlx::query_as(SQLITE_INDEX_SQL)
                .bind(&name)
                .fetch_optional(&mut *self.conn)
                .await
                .map_err(|e| MigrateError::introspection(SQLITE_INDEX_SQL, e))?;

            indexes.push(IndexDescriptor {
                name,
                columns: columns.into_iter().filter_map(|(c,)| c).collect(),
                unique: unique != 0,
                origin: match origin.as_str() {
                    "pk" => IndexOrigin::PrimaryKey,
                    "u" => IndexOrigin::UniqueConstraint,
                    _ => IndexOrigin::Created,
                },
                sql: sql.and_then(|(s,)| s),
            });
        }
        Ok(indexes)
    }

    async fn grouped_indexes(
        &mut self,
        sql: &'static str,
        table: &str,
    ) -> Result<Vec<IndexDescriptor>> {
        let rows: Vec<IndexRow> = sqlx::query_as(sql)
            .bind(table)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| MigrateError::introspection(sql, e))?;
        Ok(group_index_rows(rows))
    }

    /// Lists the foreign keys declared on `table`.
    pub async fn list_foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKeyDescriptor>> {
        let sql = match self.dialect {
            Dialect::ConstrainedString => SQLITE_FOREIGN_KEYS,
            Dialect::OrdinalEnum => MYSQL_FOREIGN_KEYS,
            Dialect::NativeEnum => POSTGRES_FOREIGN_KEYS,
            Dialect::Generic => return Err(self.unsupported("list_foreign_keys")),
        };
        let rows: Vec<ForeignKeyRow> = sqlx::query_as(sql)
            .bind(table)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| MigrateError::introspection(sql, e))?;
        Ok(group_foreign_key_rows(rows))
    }

    /// Returns the `CREATE TABLE` statement the catalog stores for `table`.
    pub async fn table_sql(&mut self, table: &str) -> Result<Option<String>> {
        if self.dialect != Dialect::ConstrainedString {
            return Err(self.unsupported("table_sql"));
        }
        let row: Option<(Option<String>,)> = sqlx::query_as(SQLITE_TABLE_SQL)
            .bind(table)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| MigrateError::introspection(SQLITE_TABLE_SQL, e))?;
        Ok(row.and_then(|(sql,)| sql))
    }

    /// Returns the `CREATE TRIGGER` statements of the triggers on `table`.
    pub async fn list_triggers(&mut self, table: &str) -> Result<Vec<String>> {
        if self.dialect != Dialect::ConstrainedString {
            return Err(self.unsupported("list_triggers"));
        }
        let rows: Vec<(String,)> = sqlx::query_as(SQLITE_TRIGGERS)
            .bind(table)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|e| MigrateError::introspection(SQLITE_TRIGGERS, e))?;
        Ok(rows.into_iter().map(|(sql,)| sql).collect())
    }

    /// Returns whether a standalone enum type named `name` exists. Only
    /// the native-enum dialect has such objects.
    pub async fn enum_type_exists(&mut self, name: &str) -> Result<bool> {
        if self.dialect != Dialect::NativeEnum {
            return Ok(false);
        }
        let (count,): (i64,) = sqlx::query_as(POSTGRES_ENUM_TYPE)
            .bind(name)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| MigrateError::introspection(POSTGRES_ENUM_TYPE, e))?;
        Ok(count > 0)
    }

    /// Reads the value set currently allowed for an enumerated column.
    ///
    /// The native-enum dialect reads the labels of type `enum_name`; the
    /// ordinal dialect parses the column's `ENUM(...)` type; the others parse
    /// the `col IN (...)` check of the table definition. Returns `None` when
    /// the type, column or constraint does not exist.
    pub async fn enum_values(
        &mut self,
        table: &str,
        column: &str,
        enum_name: &str,
    ) -> Result<Option<EnumType>> {
        match self.dialect {
            Dialect::NativeEnum => {
                let rows: Vec<(String,)> = sqlx::query_as(POSTGRES_ENUM_LABELS)
                    .bind(enum_name)
                    .fetch_all(&mut *self.conn)
                    .await
                    .map_err(|e| MigrateError::introspection(POSTGRES_ENUM_LABELS, e))?;
                if rows.is_empty() {
                    return Ok(None);
                }
                Ok(Some(EnumType::new(
                    enum_name,
                    rows.into_iter().map(|(label,)| label),
                )))
            }
            Dialect::OrdinalEnum => {
                let columns = self.list_columns(table).await?;
                Ok(columns
                    .iter()
                    .find(|c| c.name == column)
                    .and_then(|c| parse_enum_type(&c.type_name))
                    .map(|values| EnumType::new(enum_name, values)))
            }
            Dialect::ConstrainedString | Dialect::Generic => {
                let sql = self.table_sql(table).await?;
                Ok(sql
                    .and_then(|sql| parse_check_values(&sql, column))
                    .map(|values| EnumType::new(enum_name, values)))
            }
        }
    }

    /// Counts the rows of `table` matching `filter`. An empty filter counts
    /// every row.
    pub async fn count_rows(&mut self, table: &str, filter: &KeyFilter) -> Result<i64> {
        let strategy = self.dialect.strategy();
        let mut sql = format!("SELECT COUNT(*) FROM {}", strategy.quote_identifier(table));
        if let Some(clause) = filter.where_clause(strategy) {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        let (count,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| MigrateError::introspection(sql.clone(), e))?;
        Ok(count)
    }

    /// Describes `table`, or returns `None` if it does not exist.
    pub async fn describe_table(&mut self, table: &str) -> Result<Option<TableDescriptor>> {
        if !self.list_tables().await?.iter().any(|t| t == table) {
            return Ok(None);
        }
        let columns = self.list_columns(table).await?;
        let indexes = self.list_indexes(table).await?;
        let foreign_keys = self.list_foreign_keys(table).await?;
        let autoincrement = match self.dialect {
            Dialect::ConstrainedString => self
                .table_sql(table)
                .await?
                .is_some_and(|sql| sql.to_ascii_uppercase().contains("AUTOINCREMENT")),
            _ => false,
        };

        Ok(Some(TableDescriptor {
            name: table.to_string(),
            columns,
            indexes,
            foreign_keys,
            autoincrement,
        }))
    }
}

fn group_index_rows(rows: Vec<IndexRow>) -> Vec<IndexDescriptor> {
    let mut indexes: Vec<IndexDescriptor> = Vec::new();
    for (name, column, unique, primary) in rows {
        let index = match indexes.last_mut() {
            Some(last) if last.name == name => last,
            _ => {
                indexes.push(IndexDescriptor {
                    name,
                    columns: Vec::new(),
                    unique: unique != 0,
                    origin: if primary != 0 {
                        IndexOrigin::PrimaryKey
                    } else {
                        IndexOrigin::Created
                    },
                    sql: None,
                });
                let pushed = indexes.len() - 1;
                &mut indexes[pushed]
            }
        };
        if let Some(column) = column {
            index.columns.push(column);
        }
    }
    indexes
}

fn group_foreign_key_rows(rows: Vec<ForeignKeyRow>) -> Vec<ForeignKeyDescriptor> {
    let mut keys: Vec<(String, ForeignKeyDescriptor)> = Vec::new();
    for (id, column, referenced_table, referenced_column, on_update, on_delete) in rows {
        match keys.last_mut() {
            Some((last_id, fk)) if *last_id == id => {
                fk.columns.push(column);
                fk.referenced_columns.extend(referenced_column);
            }
            _ => keys.push((
                id,
                ForeignKeyDescriptor {
                    columns: vec![column],
                    referenced_table,
                    referenced_columns: referenced_column.into_iter().collect(),
                    on_update: ForeignKeyAction::from_catalog(&on_update),
                    on_delete: ForeignKeyAction::from_catalog(&on_delete),
                },
            )),
        }
    }
    keys.into_iter().map(|(_, fk)| fk).collect()
}

/// Extracts the quoted literals of a comma-separated list, unescaping `''`.
fn parse_literals(list: &str) -> Vec<String> {
    let Ok(re) = Regex::new(r"'((?:[^']|'')*)'") else {
        return Vec::new();
    };
    re.captures_iter(list)
        .map(|c| c[1].replace("''", "'"))
        .collect()
}

/// Parses a MySQL column type of the form `enum('a','b')`.
pub(crate) fn parse_enum_type(column_type: &str) -> Option<Vec<String>> {
    let re = Regex::new(r"(?is)^\s*enum\s*\((.*)\)\s*$").ok()?;
    re.captures(column_type).map(|c| parse_literals(&c[1]))
}

/// Finds the `col IN ('a', 'b')` check for `column` in a table definition.
pub(crate) fn parse_check_values(table_sql: &str, column: &str) -> Option<Vec<String>> {
    let pattern = format!(
        r#"(?is)(?:^|[\s(,])["`\[]?{}["`\]]?\s+IN\s*\(((?:[^)']|'(?:[^']|'')*')*)\)"#,
        regex::escape(column)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(table_sql).map(|c| parse_literals(&c[1]))
}
