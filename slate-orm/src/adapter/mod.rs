//! # SQL Adapter Module
//!
//! Everything that differs between SQL dialects lives behind [`SqlAdapter`].
//!
//! The trait's provided methods produce PostgreSQL-family SQL. A dialect only
//! overrides what it spells differently, see [`SqliteAdapter`]. Builders never
//! format SQL themselves; they collect rendered fragments and hand them to the
//! adapter.
//!
//! Identifiers are always quoted. Values are embedded as literals, with text
//! escaped by doubling single quotes.

mod postgres;
mod sqlite;

pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

use crate::{
    column::ForeignKey,
    column_type::ColumnType,
    errors::{Error, Result},
    value::{Value, TIMESTAMP_FORMAT},
};

// ============================================================================
// Introspection Records
// ============================================================================

/// One column as reported by the database catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub column_name: String,
    /// The default expression exactly as the catalog reports it.
    pub column_default: Option<String>,
    pub is_nullable: bool,
    pub data_type: String,
    pub character_maximum_length: Option<i64>,
}

impl ColumnInfo {
    /// Decodes `column_default` into a value of `column_type`.
    ///
    /// Strips the quoting and `::type` casts catalogs add, then parses the rest
    /// according to the column type. Function defaults such as `now()` are not
    /// values and come back as `None`.
    pub fn default_value(&self, column_type: &ColumnType) -> Result<Option<Value>> {
        let Some(raw) = self.column_default.as_deref() else {
            return Ok(None);
        };

        let (text, quoted) = strip_default_literal(raw);

        let undecodable = || Error::Conversion(format!("cannot decode default {:?} for column {}", raw, self.column_name));

        let value = match column_type {
            ColumnType::PrimaryKey { inner, .. } => return self.default_value(inner),
            ColumnType::Boolean { .. } => match text.to_ascii_lowercase().as_str() {
                "t" | "true" | "1" => Value::Boolean(true),
                "f" | "false" | "0" => Value::Boolean(false),
                _ => return Err(undecodable()),
            },
            ColumnType::Integer { .. } => Value::Integer(text.parse().map_err(|_| undecodable())?),
            ColumnType::String { .. } if quoted => Value::Text(text),
            ColumnType::String { .. } => return Err(undecodable()),
            ColumnType::Datetime { .. } => match crate::value::parse_timestamp(&text) {
                Some(ts) => Value::Timestamp(ts),
                None => return Ok(None),
            },
        };

        Ok(Some(value))
    }
}

/// Splits a catalog default into its literal text and whether it was quoted.
///
/// A quoted literal ends at the first quote that is not doubled, so a `::` inside
/// the quotes belongs to the value and only a cast after the closing quote is dropped.
fn strip_default_literal(raw: &str) -> (String, bool) {
    let text = raw.trim();
    if let Some(body) = text.strip_prefix('\'') {
        let mut literal = String::new();
        let mut chars = body.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '\'' {
                literal.push(c);
            } else if chars.peek() == Some(&'\'') {
                chars.next();
                literal.push('\'');
            } else {
                return (literal, true);
            }
        }
    }

    match text.split_once("::") {
        Some((head, _cast)) => (head.trim().to_string(), false),
        None => (text.to_string(), false),
    }
}

/// One constraint column as reported by the database catalog.
///
/// SQLite only reports foreign keys and has no schemas or constraint names,
/// hence the optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintInfo {
    pub table_schema: Option<String>,
    pub constraint_name: Option<String>,
    pub table_name: String,
    pub column_name: String,
    pub foreign_table_schema: Option<String>,
    pub foreign_table_name: String,
    pub foreign_column_name: String,
}

pub(crate) fn text_at(row: &[Value], index: usize) -> Result<Option<String>> {
    match row.get(index) {
        None => Err(Error::Conversion(format!("introspection row has no column {}", index))),
        Some(Value::Null) => Ok(None),
        Some(Value::Text(s)) => Ok(Some(s.clone())),
        Some(other) => Ok(Some(other.to_string())),
    }
}

pub(crate) fn required_text_at(row: &[Value], index: usize) -> Result<String> {
    text_at(row, index)?.ok_or_else(|| Error::Conversion(format!("introspection column {} is NULL", index)))
}

// ============================================================================
// SqlAdapter Trait
// ============================================================================

/// Dialect-specific SQL generation.
pub trait SqlAdapter: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str {
        "postgres"
    }

    // ------------------------------------------------------------------------
    // Keywords
    // ------------------------------------------------------------------------

    fn string_column(&self, len: usize) -> String {
        format!("VARCHAR({})", len)
    }

    fn integer_column(&self) -> &'static str {
        "INT"
    }

    fn boolean_column(&self) -> &'static str {
        "BOOLEAN"
    }

    fn timestamp_column(&self) -> &'static str {
        "TIMESTAMP"
    }

    /// Type keyword for an auto-incrementing key. Empty means the key column
    /// keeps its own type.
    fn autoincrement(&self) -> &'static str {
        "SERIAL"
    }

    /// Literal inserted in place of an absent autoincrement key.
    fn autoincrement_default(&self) -> &'static str {
        "DEFAULT"
    }

    fn primary_key(&self) -> &'static str {
        "PRIMARY KEY"
    }

    fn not_null(&self) -> &'static str {
        "NOT NULL"
    }

    fn null(&self) -> &'static str {
        "NULL"
    }

    fn default_keyword(&self) -> &'static str {
        "DEFAULT"
    }

    fn if_not_exists(&self) -> &'static str {
        "IF NOT EXISTS"
    }

    /// Whether `UNIQUE` may appear inside a column definition.
    fn inline_unique(&self) -> bool {
        true
    }

    fn datetime_now(&self) -> &'static str {
        "now()"
    }

    // ------------------------------------------------------------------------
    // Identifiers & Literals
    // ------------------------------------------------------------------------

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn render_bool(&self, value: bool) -> String {
        if value { "'t'".to_string() } else { "'f'".to_string() }
    }

    fn render_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => self.null().to_string(),
            Value::Boolean(b) => self.render_bool(*b),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Timestamp(ts) => format!("'{}'", ts.format(TIMESTAMP_FORMAT)),
        }
    }

    // ------------------------------------------------------------------------
    // DDL
    // ------------------------------------------------------------------------

    fn foreign_key(&self, fk: &ForeignKey) -> String {
        let parents = fk.parent_columns().iter().map(|c| self.quote_identifier(c)).collect::<Vec<_>>().join(", ");
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_identifier(&fk.name),
            self.quote_identifier(&fk.key_column),
            self.quote_identifier(&fk.parent_table),
            parents
        );
        if let Some(action) = fk.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = fk.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action));
        }
        sql
    }

    fn create_table(&self, table: &str, columns: &[String], if_not_exists: bool, foreign_keys: &[String]) -> String {
        let guard = if if_not_exists { format!("{} ", self.if_not_exists()) } else { String::new() };
        let body = columns.iter().chain(foreign_keys).cloned().collect::<Vec<_>>().join(", ");
        format!("CREATE TABLE {}{} ({});", guard, self.quote_identifier(table), body)
    }

    fn create_unique_index(&self, table: &str, column: &str) -> String {
        format!(
            "CREATE UNIQUE INDEX {} {} ON {} ({});",
            self.if_not_exists(),
            self.quote_identifier(&format!("{}_{}_idx", table, column)),
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    fn rename_table(&self, old: &str, new: &str) -> String {
        format!("ALTER TABLE {} RENAME TO {};", self.quote_identifier(old), self.quote_identifier(new))
    }

    fn add_column(&self, table: &str, column_sql: &str) -> String {
        format!("ALTER TABLE {} ADD COLUMN {};", self.quote_identifier(table), column_sql)
    }

    fn drop_column(&self, table: &str, column: &str) -> String {
        format!("ALTER TABLE {} DROP COLUMN {};", self.quote_identifier(table), self.quote_identifier(column))
    }

    fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {};", self.quote_identifier(table))
    }

    /// Statements that remove every table. `tables` is the current table list;
    /// dialects that drop the whole schema ignore it.
    fn clear_database(&self, _tables: &[String]) -> Vec<String> {
        vec![
            "DROP SCHEMA public CASCADE;".to_string(),
            "CREATE SCHEMA public;".to_string(),
            "GRANT ALL ON SCHEMA public TO public;".to_string(),
        ]
    }

    // ------------------------------------------------------------------------
    // DML
    // ------------------------------------------------------------------------

    /// `conditions` are already rendered fragments; every fragment after the
    /// first carries its own `AND`/`OR`.
    fn select(&self, table: &str, columns: Option<&[String]>, conditions: &[String], limit: Option<usize>) -> String {
        let projection = match columns {
            Some(columns) if !columns.is_empty() => {
                columns.iter().map(|c| self.quote_identifier(c)).collect::<Vec<_>>().join(", ")
            }
            _ => "*".to_string(),
        };
        let mut sql = format!("SELECT {} FROM {}", projection, self.quote_identifier(table));
        push_where(&mut sql, conditions);
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql.push(';');
        sql
    }

    /// One multi-row insert. `rows` hold rendered literals in `columns` order.
    fn insert_items(&self, table: &str, columns: &[String], rows: &[Vec<String>], returning: Option<&str>) -> String {
        let names = columns.iter().map(|c| self.quote_identifier(c)).collect::<Vec<_>>().join(", ");
        let values = rows.iter().map(|row| format!("({})", row.join(", "))).collect::<Vec<_>>().join(", ");
        let mut sql = format!("INSERT INTO {} ({}) VALUES {}", self.quote_identifier(table), names, values);
        if let Some(column) = returning {
            sql.push_str(&format!(" RETURNING {}", self.quote_identifier(column)));
        }
        sql.push(';');
        sql
    }

    /// `assignments` are rendered `"col" = literal` pairs.
    fn update(&self, table: &str, assignments: &[String], conditions: &[String]) -> String {
        let mut sql = format!("UPDATE {} SET {}", self.quote_identifier(table), assignments.join(", "));
        push_where(&mut sql, conditions);
        sql.push(';');
        sql
    }

    fn delete(&self, table: &str, conditions: &[String]) -> String {
        let mut sql = format!("DELETE FROM {}", self.quote_identifier(table));
        push_where(&mut sql, conditions);
        sql.push(';');
        sql
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Query returning one row per user table, the name in the first column.
    fn table_list(&self) -> String {
        "SELECT table_name::text FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name;"
            .to_string()
    }

    fn table_columns_info(&self, table: &str) -> String {
        format!(
            "SELECT column_name::text, column_default::text, is_nullable::text, data_type::text, \
             character_maximum_length::bigint FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = {} ORDER BY ordinal_position;",
            self.render_literal(&Value::from(table))
        )
    }

    fn column_info_from_row(&self, row: &[Value]) -> Result<ColumnInfo> {
        Ok(ColumnInfo {
            column_name: required_text_at(row, 0)?,
            column_default: text_at(row, 1)?,
            is_nullable: text_at(row, 2)?.as_deref() == Some("YES"),
            data_type: required_text_at(row, 3)?,
            character_maximum_length: row.get(4).and_then(Value::as_i64),
        })
    }

    fn table_constraints_info(&self, table: &str) -> String {
        format!(
            "SELECT tc.table_schema::text AS ts, tc.constraint_name::text AS cn, tc.table_name::text AS tn, \
             kcu.column_name::text AS kn, ccu.table_schema::text AS foreign_table_schema, \
             ccu.table_name::text AS foreign_table_name, ccu.column_name::text AS foreign_column_name \
             FROM information_schema.table_constraints AS tc \
             JOIN information_schema.key_column_usage AS kcu \
             ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
             JOIN information_schema.constraint_column_usage AS ccu \
             ON ccu.constraint_name = tc.constraint_name \
             WHERE tc.table_schema = 'public' AND tc.table_name = {} \
             GROUP BY ts, cn, tn, kn, foreign_table_schema, foreign_table_name, foreign_column_name;",
            self.render_literal(&Value::from(table))
        )
    }

    fn constraint_info_from_row(&self, row: &[Value], _table: &str) -> Result<ConstraintInfo> {
        Ok(ConstraintInfo {
            table_schema: text_at(row, 0)?,
            constraint_name: text_at(row, 1)?,
            table_name: required_text_at(row, 2)?,
            column_name: required_text_at(row, 3)?,
            foreign_table_schema: text_at(row, 4)?,
            foreign_table_name: required_text_at(row, 5)?,
            foreign_column_name: required_text_at(row, 6)?,
        })
    }
}

fn push_where(sql: &mut String, conditions: &[String]) {
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" "));
    }
}

// ============================================================================
// Tests
// ============================================================================
