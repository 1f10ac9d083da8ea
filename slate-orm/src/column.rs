//! Column and foreign key descriptors.

use std::fmt;

use crate::{adapter::SqlAdapter, column_type::ColumnType, errors::Result};

// ============================================================================
// Column
// ============================================================================

/// A named, typed column with its constraints.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub unique: bool,
    pub nullable: bool,
}

impl Column {
    /// A nullable, non-unique column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self { name: name.into(), column_type, unique: false, nullable: true }
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.column_type.is_primary_key()
    }

    /// Renders the column definition used inside `CREATE TABLE` and
    /// `ADD COLUMN`.
    ///
    /// `UNIQUE` is only inlined on dialects that support it there; the others
    /// get a separate unique index from the table creator.
    pub fn render_sql(&self, adapter: &dyn SqlAdapter) -> Result<String> {
        let mut sql = format!("{} {}", adapter.quote_identifier(&self.name), self.column_type.render_type(adapter)?);

        if self.unique && adapter.inline_unique() {
            sql.push_str(" UNIQUE");
        }
        if !self.nullable && !self.is_primary_key() {
            sql.push(' ');
            sql.push_str(adapter.not_null());
        }

        Ok(sql)
    }
}

// ============================================================================
// Foreign Key
// ============================================================================

/// Action taken on the child rows when the referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A named foreign key constraint from one column to a parent table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub key_column: String,
    pub parent_table: String,
    /// Comma separated list of referenced columns.
    pub parent_key_columns: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKey {
    pub fn new(
        name: impl Into<String>,
        key_column: impl Into<String>,
        parent_table: impl Into<String>,
        parent_key_columns: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            key_column: key_column.into(),
            parent_table: parent_table.into(),
            parent_key_columns: parent_key_columns.into(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// The referenced columns, trimmed.
    pub fn parent_columns(&self) -> Vec<&str> {
        self.parent_key_columns.split(',').map(str::trim).filter(|c| !c.is_empty()).collect()
    }

    pub fn render_sql(&self, adapter: &dyn SqlAdapter) -> String {
        adapter.foreign_key(self)
    }
}
