//! # Migration Module
//!
//! Schema changes: creating tables from model schemas and the individual
//! ALTER/DROP steps a version upgrade is made of.
//!
//! ## Overview
//!
//! - [`CreateTable`] turns a [`Schema`] into `CREATE TABLE IF NOT EXISTS`,
//!   foreign keys included, plus one unique index per unique column on
//!   dialects that cannot declare `UNIQUE` inline
//! - [`Migration`] lists tables and columns, renames tables, adds and drops
//!   columns, creates and drops tables
//!
//! Each statement is committed on its own. A multi-step migration that fails
//! halfway leaves the steps before it in place.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use slate_orm::{Column, ColumnType, Engine, Model};
//!
//! let engine = Engine::builder("sqlite://app.db".parse()?)
//!     .version(2)
//!     .on_create(|create| {
//!         create.create::<User>()?.create::<Project>()?;
//!         Ok(())
//!     })
//!     .on_update(|migration, from, _to| {
//!         if from < 2 {
//!             migration.add_column("user", &Column::new("nickname", ColumnType::string()))?;
//!         }
//!         Ok(())
//!     })
//!     .connect()?;
//! ```

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    adapter::{ColumnInfo, SqlAdapter},
    column::Column,
    errors::Result,
    model::{Model, Schema},
    session::Executor,
};

// ============================================================================
// Table Creation
// ============================================================================

fn create_schema(adapter: &dyn SqlAdapter, executor: &mut dyn Executor, schema: &Schema) -> Result<()> {
    let columns = schema.columns.iter().map(|c| c.render_sql(adapter)).collect::<Result<Vec<_>>>()?;
    let foreign_keys = schema.foreign_keys.iter().map(|fk| fk.render_sql(adapter)).collect::<Vec<_>>();

    executor.execute(&adapter.create_table(&schema.table_name, &columns, true, &foreign_keys))?;
    executor.commit()?;
    log::info!("Created table {}", schema.table_name);

    if !adapter.inline_unique() {
        for column in schema.columns.iter().filter(|c| c.unique && !c.is_primary_key()) {
            executor.execute(&adapter.create_unique_index(&schema.table_name, &column.name))?;
            executor.commit()?;
        }
    }

    Ok(())
}

/// Creates tables for models.
///
/// Tables are created in call order; a table with foreign keys should come
/// after the tables it references.
///
/// # Example
///
/// ```rust,ignore
/// session.create_table().create::<User>()?.create::<Project>()?;
/// ```
pub struct CreateTable<'s> {
    adapter: &'s dyn SqlAdapter,
    executor: &'s mut dyn Executor,
}

impl<'s> CreateTable<'s> {
    pub fn new(adapter: &'s dyn SqlAdapter, executor: &'s mut dyn Executor) -> Self {
        Self { adapter, executor }
    }

    /// Creates the table of `M` if it does not exist.
    ///
    /// # Errors
    ///
    /// `AutoincrementType` when the schema's key cannot be auto-incremented,
    /// or any database error.
    pub fn create<M: Model>(&mut self) -> Result<&mut Self> {
        self.create_schema(M::schema())
    }

    /// Creates a table from a schema that is not backed by a model type.
    pub fn create_schema(&mut self, schema: &Schema) -> Result<&mut Self> {
        create_schema(self.adapter, &mut *self.executor, schema)?;
        Ok(self)
    }
}

// ============================================================================
// Migration
// ============================================================================

/// Schema change steps, handed to the engine's update callback.
pub struct Migration<'s> {
    adapter: &'s dyn SqlAdapter,
    executor: &'s mut dyn Executor,
}

impl<'s> Migration<'s> {
    pub fn new(adapter: &'s dyn SqlAdapter, executor: &'s mut dyn Executor) -> Self {
        Self { adapter, executor }
    }

    pub fn adapter(&self) -> &'s dyn SqlAdapter {
        self.adapter
    }

    fn run(&mut self, sql: &str) -> Result<&mut Self> {
        self.executor.execute(sql)?;
        self.executor.commit()?;
        Ok(self)
    }

    /// Names of the user tables in the database.
    pub fn table_list(&mut self) -> Result<Vec<String>> {
        let sql = self.adapter.table_list();
        self.executor
            .fetch_all(&sql)?
            .iter()
            .map(|row| crate::adapter::required_text_at(row, 0))
            .collect()
    }

    /// Columns of `table` as the database reports them.
    pub fn table_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        let sql = self.adapter.table_columns_info(table);
        self.executor.fetch_all(&sql)?.iter().map(|row| self.adapter.column_info_from_row(row)).collect()
    }

    pub fn change_table_name(&mut self, old: &str, new: &str) -> Result<&mut Self> {
        log::info!("Renaming table {} to {}", old, new);
        let sql = self.adapter.rename_table(old, new);
        self.run(&sql)
    }

    pub fn add_column(&mut self, table: &str, column: &Column) -> Result<&mut Self> {
        log::info!("Adding column {}.{}", table, column.name);
        let sql = self.adapter.add_column(table, &column.render_sql(self.adapter)?);
        self.run(&sql)?;

        if column.unique && !self.adapter.inline_unique() {
            let sql = self.adapter.create_unique_index(table, &column.name);
            self.run(&sql)?;
        }
        Ok(self)
    }

    pub fn delete_column(&mut self, table: &str, column: &str) -> Result<&mut Self> {
        log::info!("Dropping column {}.{}", table, column);
        let sql = self.adapter.drop_column(table, column);
        self.run(&sql)
    }

    pub fn create_table<M: Model>(&mut self) -> Result<&mut Self> {
        create_schema(self.adapter, &mut *self.executor, M::schema())?;
        Ok(self)
    }

    pub fn delete_table(&mut self, table: &str) -> Result<&mut Self> {
        log::info!("Dropping table {}", table);
        let sql = self.adapter.drop_table(table);
        self.run(&sql)
    }
}
