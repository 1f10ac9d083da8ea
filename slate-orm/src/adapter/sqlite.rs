//! SQLite dialect.

use super::{required_text_at, text_at, ColumnInfo, ConstraintInfo, SqlAdapter};
use crate::{errors::Result, value::Value};

/// Adapter for SQLite.
///
/// SQLite has no sized strings, stores booleans as integers, turns an
/// `INTEGER PRIMARY KEY` into the rowid alias instead of using a serial type,
/// and cannot declare `UNIQUE` inside `ALTER TABLE ... ADD COLUMN`, so unique
/// columns get a separate index.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteAdapter;

impl SqlAdapter for SqliteAdapter {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn string_column(&self, _len: usize) -> String {
        "TEXT".to_string()
    }

    fn integer_column(&self) -> &'static str {
        "INTEGER"
    }

    fn boolean_column(&self) -> &'static str {
        "INTEGER"
    }

    fn autoincrement(&self) -> &'static str {
        ""
    }

    fn autoincrement_default(&self) -> &'static str {
        "NULL"
    }

    fn inline_unique(&self) -> bool {
        false
    }

    fn datetime_now(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    fn render_bool(&self, value: bool) -> String {
        if value { "1".to_string() } else { "0".to_string() }
    }

    fn clear_database(&self, tables: &[String]) -> Vec<String> {
        tables.iter().map(|table| self.drop_table(table)).collect()
    }

    fn table_list(&self) -> String {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name;".to_string()
    }

    // pragma table_info: cid, name, type, notnull, dflt_value, pk
    fn table_columns_info(&self, table: &str) -> String {
        format!("PRAGMA table_info({});", self.quote_identifier(table))
    }

    fn column_info_from_row(&self, row: &[Value]) -> Result<ColumnInfo> {
        Ok(ColumnInfo {
            column_name: required_text_at(row, 1)?,
            column_default: text_at(row, 4)?,
            is_nullable: row.get(3).and_then(Value::as_i64) == Some(0),
            data_type: required_text_at(row, 2)?,
            character_maximum_length: None,
        })
    }

    // pragma foreign_key_list: id, seq, table, from, to, on_update, on_delete, match
    fn table_constraints_info(&self, table: &str) -> String {
        format!("PRAGMA foreign_key_list({});", self.quote_identifier(table))
    }

    fn constraint_info_from_row(&self, row: &[Value], table: &str) -> Result<ConstraintInfo> {
        Ok(ConstraintInfo {
            table_schema: None,
            constraint_name: None,
            table_name: table.to_string(),
            column_name: required_text_at(row, 3)?,
            foreign_table_schema: None,
            foreign_table_name: required_text_at(row, 2)?,
            foreign_column_name: required_text_at(row, 4)?,
        })
    }
}
