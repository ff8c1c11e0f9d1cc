//! Shadow-table rebuild.
//!
//! Used where a column's constraint cannot be altered in place. The table is
//! copied into `_shadow_<table>` with the new definition, the original is
//! dropped and the shadow renamed over it. The new definition is the stored
//! `CREATE TABLE` statement with only the widened column restated. Each statement belongs to a named
//! [`RebuildStep`] so a failure reports how far the protocol got:
//!
//! | failed step     | state of the data                                    |
//! |-----------------|------------------------------------------------------|
//! | `CreateShadow`  | original untouched                                   |
//! | `CopyRows`      | original untouched, shadow partially filled          |
//! | `DropOriginal`  | original untouched, shadow complete                  |
//! | `RenameShadow`  | original dropped, every row is in the shadow table   |
//! | `Reindex`       | table rebuilt, some indexes or triggers missing      |
//!
//! A shadow table left over by an aborted run is dropped before a new one is
//! created, as long as the original table still exists.

use std::fmt;
use std::ops::Range;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::context::MigrationContext;
use crate::ddl::Applied;
use crate::dialect::{Dialect, MigrationDialect};
use crate::enums::EnumExtension;
use crate::error::{MigrateError, Result};
use crate::introspect::{parse_check_values, IndexOrigin, TableDescriptor};
use crate::schema::{quote_literal, EnumType, SqlType};

/// Prefix of the temporary table a rebuild copies into.
pub const SHADOW_PREFIX: &str = "_shadow_";

/// A step of the shadow-table rebuild protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RebuildStep {
    /// Create the shadow table with the new definition.
    CreateShadow,
    /// Copy every row into the shadow table.
    CopyRows,
    /// Drop the original table.
    DropOriginal,
    /// Rename the shadow table to the original name.
    RenameShadow,
    /// Recreate the secondary indexes and triggers of the original table.
    Reindex,
}

impl fmt::Display for RebuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateShadow => "create-shadow",
            Self::CopyRows => "copy-rows",
            Self::DropOriginal => "drop-original",
            Self::RenameShadow => "rename-shadow",
            Self::Reindex => "reindex",
        })
    }
}

/// The ordered statements of one rebuild.
#[derive(Debug, Clone)]
pub struct RebuildPlan {
    /// Table being rebuilt.
    pub table: String,
    /// Name of the shadow table.
    pub shadow: String,
    /// Statements tagged with the step they belong to.
    pub steps: Vec<(RebuildStep, String)>,
}

impl RebuildPlan {
    /// Plans a rebuild of `table` in which the enumerated column of
    /// `extension` accepts the values of `widened`.
    ///
    /// The shadow is created from `table_sql`, the statement the catalog
    /// stores for the table. Every column and table constraint is carried
    /// over as written; only the enumerated column's type and value check
    /// change. Explicitly created indexes are recreated from their stored
    /// SQL. Fails at [`RebuildStep::CreateShadow`] when the definition
    /// cannot be carried over.
    pub fn widen_enum(
        dialect: &dyn MigrationDialect,
        table: &TableDescriptor,
        table_sql: &str,
        extension: &EnumExtension,
        widened: &EnumType,
    ) -> Result<Self> {
        let shadow = format!("{}{}", SHADOW_PREFIX, table.name);
        let create = shadow_table_sql(dialect, table_sql, &shadow, extension, widened).map_err(
            |e| MigrateError::RebuildFailed {
                table: table.name.clone(),
                step: RebuildStep::CreateShadow,
                source: Box::new(e),
            },
        )?;
        let mut steps = vec![(RebuildStep::CreateShadow, create)];

        // Generated columns are recomputed by the shadow table.
        let stored: Vec<_> = table.columns.iter().filter(|c| !c.generated).collect();
        let columns: Vec<String> = stored
            .iter()
            .map(|c| dialect.quote_identifier(&c.name))
            .collect();
        let sources: Vec<String> = stored
            .iter()
            .map(|c| {
                let name = dialect.quote_identifier(&c.name);
                match &extension.backfill {
                    Some(value) if c.name == extension.column => {
                        format!("COALESCE({}, {})", name, quote_literal(value))
                    }
                    _ => name,
                }
            })
            .collect();
        steps.push((
            RebuildStep::CopyRows,
            format!(
                "INSERT INTO {} ({}) SELECT {} FROM {}",
                dialect.quote_identifier(&shadow),
                columns.join(", "),
                sources.join(", "),
                dialect.quote_identifier(&table.name)
            ),
        ));
        steps.push((RebuildStep::DropOriginal, dialect.drop_table_sql(&table.name)));
        steps.push((
            RebuildStep::RenameShadow,
            dialect.rename_table_sql(&shadow, &table.name),
        ));
        for index in &table.indexes {
            if index.origin != IndexOrigin::Created {
                continue;
            }
            if let Some(sql) = &index.sql {
                steps.push((RebuildStep::Reindex, sql.clone()));
            }
        }

        Ok(Self {
            table: table.name.clone(),
            shadow,
            steps,
        })
    }

    /// Recreates `triggers` once the shadow has taken the table's name.
    #[must_use]
    pub fn with_triggers(mut self, triggers: Vec<String>) -> Self {
        self.steps
            .extend(triggers.into_iter().map(|sql| (RebuildStep::Reindex, sql)));
        self
    }

    fn failed(&self, step: RebuildStep, source: MigrateError) -> MigrateError {
        MigrateError::RebuildFailed {
            table: self.table.clone(),
            step,
            source: Box::new(source),
        }
    }
}

/// Keywords that can open a table constraint.
const TABLE_CONSTRAINTS: [&str; 5] = ["CONSTRAINT", "PRIMARY", "UNIQUE", "CHECK", "FOREIGN"];

/// Keywords that end a column's type and open its constraints.
const COLUMN_CONSTRAINTS: [&str; 11] = [
    "CONSTRAINT",
    "PRIMARY",
    "NOT",
    "NULL",
    "UNIQUE",
    "CHECK",
    "DEFAULT",
    "COLLATE",
    "REFERENCES",
    "GENERATED",
    "AS",
];

/// Splits SQL text into tokens and returns their byte ranges.
///
/// A token is a quoted string or identifier, a single `(`, `)` or `,`, or a
/// run of anything else. Whitespace and comments only separate tokens.
/// Returns `None` on an unterminated quote.
fn tokenize(sql: &str) -> Option<Vec<Range<usize>>> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = sql[i..].find('\n').map_or(bytes.len(), |n| i + n + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |n| i + 2 + n + 2);
            }
            open @ (b'\'' | b'"' | b'`' | b'[') => {
                let close = if open == b'[' { b']' } else { open };
                let mut end = i + 1;
                loop {
                    let n = end + bytes[end..].iter().position(|&b| b == close)?;
                    // A doubled quote is an escaped quote.
                    if close != b']' && bytes.get(n + 1) == Some(&close) {
                        end = n + 2;
                    } else {
                        end = n + 1;
                        break;
                    }
                }
                tokens.push(i..end);
                i = end;
            }
            b'(' | b')' | b',' => {
                tokens.push(i..i + 1);
                i += 1;
            }
            _ => {
                let start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && !matches!(bytes[i], b'\'' | b'"' | b'`' | b'[' | b'(' | b')' | b',')
                {
                    i += 1;
                }
                tokens.push(start..i);
            }
        }
    }
    Some(tokens)
}

/// Index of the `)` closing the `(` at `open`.
fn closing_paren(sql: &str, tokens: &[Range<usize>], open: usize) -> Option<usize> {
    if tokens.get(open).map(|t| &sql[t.clone()]) != Some("(") {
        return None;
    }
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match &sql[token.clone()] {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn unquote(identifier: &str) -> String {
    let bytes = identifier.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&(q @ (b'"' | b'`' | b'\''))), Some(&last)) if last == q && bytes.len() >= 2 => {
            let q = char::from(q);
            identifier[1..identifier.len() - 1].replace(&format!("{q}{q}"), &q.to_string())
        }
        (Some(b'['), Some(b']')) if bytes.len() >= 2 => {
            identifier[1..identifier.len() - 1].to_string()
        }
        _ => identifier.to_string(),
    }
}

/// Returns whether `group` is exactly `(<column> IN ('a', ...))`.
fn is_value_check(group: &str, column: &str) -> bool {
    let name = regex::escape(column);
    let pattern = format!(
        r#"(?is)^\(\s*(?:"{name}"|`{name}`|\[{name}\]|{name})\s+IN\s*\(\s*'(?:[^']|'')*'(?:\s*,\s*'(?:[^']|'')*')*\s*\)\s*\)$"#
    );
    Regex::new(&pattern).is_ok_and(|re| re.is_match(group.trim()))
}

/// A `CREATE TABLE` statement split at its top-level commas.
struct TableDefinition<'a> {
    /// Column definitions and table constraints, in order.
    items: Vec<&'a str>,
    /// Table options after the closing parenthesis, such as `STRICT`.
    options: &'a str,
}

impl<'a> TableDefinition<'a> {
    fn parse(sql: &'a str) -> Option<Self> {
        let tokens = tokenize(sql)?;
        let text = |t: &Range<usize>| -> &'a str { &sql[t.clone()] };
        if !text(tokens.first()?).eq_ignore_ascii_case("CREATE") {
            return None;
        }
        let open = tokens.iter().position(|t| text(t) == "(")?;
        let head = &tokens[..open];
        if !head.iter().any(|t| text(t).eq_ignore_ascii_case("TABLE"))
            || head.iter().any(|t| text(t).eq_ignore_ascii_case("VIRTUAL"))
        {
            return None;
        }

        let mut items = Vec::new();
        let mut depth = 0usize;
        let mut start = tokens[open].end;
        for token in &tokens[open..] {
            match text(token) {
                "(" => depth += 1,
                ")" => {
                    depth -= 1;
                    if depth == 0 {
                        items.push(sql[start..token.start].trim());
                        return Some(Self {
                            items,
                            options: sql[token.end..].trim(),
                        });
                    }
                }
                "," if depth == 1 => {
                    items.push(sql[start..token.start].trim());
                    start = token.end;
                }
                _ => {}
            }
        }
        None
    }
}

fn shadow_table_sql(
    dialect: &dyn MigrationDialect,
    table_sql: &str,
    shadow: &str,
    extension: &EnumExtension,
    widened: &EnumType,
) -> Result<String> {
    let cannot_carry = |reason: String| {
        MigrateError::InvalidState(format!(
            "Cannot carry the definition of '{}' over: {}",
            extension.table, reason
        ))
    };
    let definition = TableDefinition::parse(table_sql)
        .ok_or_else(|| cannot_carry("not a plain CREATE TABLE statement".to_string()))?;

    let mut items = Vec::with_capacity(definition.items.len());
    let mut found = false;
    for item in definition.items {
        let tokens = tokenize(item).unwrap_or_default();
        let Some(first) = tokens.first().map(|t| &item[t.clone()]) else {
            return Err(cannot_carry("empty definition item".to_string()));
        };

        if TABLE_CONSTRAINTS
            .iter()
            .any(|k| first.eq_ignore_ascii_case(k))
        {
            if !is_table_value_check(item, &tokens, &extension.column) {
                items.push(item.to_string());
            }
            continue;
        }

        if unquote(first).eq_ignore_ascii_case(&extension.column) {
            items.push(enum_column_definition(dialect, item, &tokens, extension, widened)?);
            found = true;
        } else {
            items.push(item.to_string());
        }
    }
    if !found {
        return Err(cannot_carry(format!(
            "column '{}' is not in the stored definition",
            extension.column
        )));
    }

    // Any other value list on the column would keep rejecting new values.
    for item in &items {
        let rewritten = unquote(item.split_whitespace().next().unwrap_or(""))
            .eq_ignore_ascii_case(&extension.column);
        if !rewritten && parse_check_values(item, &extension.column).is_some() {
            return Err(cannot_carry(format!(
                "'{}' also restricts the values of '{}'",
                item, extension.column
            )));
        }
    }

    let mut sql = format!(
        "CREATE TABLE {} (\n  {}\n)",
        dialect.quote_identifier(shadow),
        items.join(",\n  ")
    );
    if !definition.options.is_empty() {
        sql.push(' ');
        sql.push_str(definition.options);
    }
    Ok(sql)
}

/// Returns whether a table constraint is `[CONSTRAINT name] CHECK (<column>
/// IN (...))`.
fn is_table_value_check(item: &str, tokens: &[Range<usize>], column: &str) -> bool {
    let text = |i: usize| tokens.get(i).map_or("", |t| &item[t.clone()]);
    let check = if text(0).eq_ignore_ascii_case("CONSTRAINT") {
        2
    } else {
        0
    };
    text(check).eq_ignore_ascii_case("CHECK")
        && tokens
            .get(check + 1)
            .is_some_and(|open| is_value_check(&item[open.start..], column))
}

/// Restates the definition of the enumerated column: the type and value
/// check are replaced, every other constraint is kept as written.
fn enum_column_definition(
    dialect: &dyn MigrationDialect,
    item: &str,
    tokens: &[Range<usize>],
    extension: &EnumExtension,
    widened: &EnumType,
) -> Result<String> {
    let text = |i: usize| &item[tokens[i].clone()];
    let is = |i: usize, keyword: &str| i < tokens.len() && text(i).eq_ignore_ascii_case(keyword);

    let constraints = (1..tokens.len())
        .find(|&i| COLUMN_CONSTRAINTS.iter().any(|k| is(i, *k)))
        .unwrap_or(tokens.len());

    let mut kept = Vec::new();
    let mut segment = tokens.get(constraints).map_or(item.len(), |t| t.start);
    let mut not_null = false;
    let mut depth = 0usize;
    let mut i = constraints;
    while i < tokens.len() {
        match text(i) {
            "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            _ if is(i, "GENERATED") || is(i, "AS") => {
                return Err(MigrateError::InvalidState(format!(
                    "Cannot carry the definition of '{}' over: '{}' is a generated column",
                    extension.table, extension.column
                )));
            }
            _ if is(i, "NOT") && is(i + 1, "NULL") => not_null = true,
            _ if is(i, "CHECK") => {
                if let Some(close) = closing_paren(item, tokens, i + 1) {
                    let group = &item[tokens[i + 1].start..tokens[close].end];
                    if is_value_check(group, &extension.column) {
                        let from = if i >= constraints + 2 && is(i - 2, "CONSTRAINT") {
                            i - 2
                        } else {
                            i
                        };
                        kept.push(&item[segment..tokens[from].start]);
                        segment = tokens[close].end;
                        i = close + 1;
                        continue;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    kept.push(&item[segment..]);
    let kept: Vec<&str> = kept.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if parse_check_values(&kept.join(" "), &extension.column).is_some() {
        return Err(MigrateError::InvalidState(format!(
            "Cannot carry the definition of '{}' over: '{}' has another value check",
            extension.table, extension.column
        )));
    }

    let mut parts = vec![
        dialect.quote_identifier(&unquote(text(0))),
        dialect.type_name(&SqlType::Enum(widened.clone())),
    ];
    parts.extend(kept.into_iter().map(String::from));
    if extension.backfill.is_some() && !not_null {
        parts.push("NOT NULL".to_string());
    }
    if let Some(check) = dialect.enum_check(&extension.column, widened) {
        parts.push(format!("CHECK ({})", check));
    }
    Ok(parts.join(" "))
}

impl MigrationContext {
    /// Widens a `CHECK`-constrained column through a shadow-table rebuild.
    pub(crate) async fn rebuild_for_enum(&mut self, extension: &EnumExtension) -> Result<Applied> {
        if self.dialect() != Dialect::ConstrainedString {
            return Err(MigrateError::UnsupportedDialectOperation {
                dialect: self.dialect().name(),
                operation: "rebuild",
            });
        }

        let table = self
            .introspector()
            .describe_table(&extension.table)
            .await?
            .ok_or_else(|| {
                MigrateError::InvalidState(format!(
                    "Cannot rebuild '{}': table does not exist",
                    extension.table
                ))
            })?;
        let column = table.column(&extension.column).ok_or_else(|| {
            MigrateError::InvalidState(format!(
                "Cannot rebuild '{}': column '{}' does not exist",
                extension.table, extension.column
            ))
        })?;
        let current = self
            .introspector()
            .enum_values(&extension.table, &extension.column, &extension.enum_name)
            .await?;

        let values_missing = current
            .as_ref()
            .map_or(true, |c| !c.is_superset_of(&extension.target()));
        let tighten = extension.backfill.is_some() && column.nullable;
        if !values_missing && !tighten {
            return Ok(Applied::Skipped);
        }

        let widened = match &current {
            Some(current) => current.extended_with(&extension.values),
            None => extension.target(),
        };
        let table_sql = self
            .introspector()
            .table_sql(&extension.table)
            .await?
            .unwrap_or_default();
        let triggers = self.introspector().list_triggers(&extension.table).await?;
        let plan =
            RebuildPlan::widen_enum(self.strategy(), &table, &table_sql, extension, &widened)?
                .with_triggers(triggers);

        // Foreign keys are not enforced while the original is dropped, and
        // the legacy rename leaves views and triggers naming it untouched.
        let mut restore = Vec::new();
        if self.session_flag("PRAGMA foreign_keys").await? != 0 {
            self.set_session("PRAGMA foreign_keys = OFF").await?;
            restore.push("PRAGMA foreign_keys = ON");
        }
        if self.session_flag("PRAGMA legacy_alter_table").await? == 0 {
            self.set_session("PRAGMA legacy_alter_table = ON").await?;
            restore.push("PRAGMA legacy_alter_table = OFF");
        }
        let mut outcome = self.run_rebuild(&plan).await;
        for sql in restore {
            let restored = self.set_session(sql).await;
            outcome = outcome.and(restored);
        }
        outcome?;
        Ok(Applied::Executed)
    }

    async fn run_rebuild(&mut self, plan: &RebuildPlan) -> Result<()> {
        info!(table = %plan.table, shadow = %plan.shadow, "Rebuilding table");

        if self.table_exists(&plan.shadow).await? {
            warn!(shadow = %plan.shadow, "Dropping shadow table left by an aborted rebuild");
            let sql = self.strategy().drop_table_sql(&plan.shadow);
            self.execute(&sql)
                .await
                .map_err(|e| plan.failed(RebuildStep::CreateShadow, e))?;
        }

        for (step, sql) in &plan.steps {
            debug!(table = %plan.table, step = %step, "Rebuild step");
            self.execute(sql).await.map_err(|e| plan.failed(*step, e))?;
        }
        Ok(())
    }
}
