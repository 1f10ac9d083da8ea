//! Catalog introspection for one model's table.

use std::marker::PhantomData;

use crate::{
    adapter::{ColumnInfo, ConstraintInfo, SqlAdapter},
    errors::Result,
    model::Model,
    session::Executor,
};

pub struct TableInfo<'s, M> {
    adapter: &'s dyn SqlAdapter,
    executor: &'s mut dyn Executor,
    _marker: PhantomData<M>,
}

impl<'s, M: Model> TableInfo<'s, M> {
    pub fn new(adapter: &'s dyn SqlAdapter, executor: &'s mut dyn Executor) -> Self {
        Self { adapter, executor, _marker: PhantomData }
    }

    /// Columns as the database reports them, in table order.
    pub fn columns_info(&mut self) -> Result<Vec<ColumnInfo>> {
        let sql = self.adapter.table_columns_info(M::table_name());
        self.executor.fetch_all(&sql)?.iter().map(|row| self.adapter.column_info_from_row(row)).collect()
    }

    /// Constraints as the database reports them. SQLite only reports foreign keys.
    pub fn constraints_info(&mut self) -> Result<Vec<ConstraintInfo>> {
        let sql = self.adapter.table_constraints_info(M::table_name());
        self.executor
            .fetch_all(&sql)?
            .iter()
            .map(|row| self.adapter.constraint_info_from_row(row, M::table_name()))
            .collect()
    }
}
