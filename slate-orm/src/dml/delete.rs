//! DELETE builder.

use std::marker::PhantomData;

use super::{Conditions, Connective, Op};
use crate::{adapter::SqlAdapter, errors::Result, model::Model, session::Executor, value::Value};

/// A DELETE over one model's table. Without conditions every row goes.
pub struct Delete<'s, M> {
    adapter: &'s dyn SqlAdapter,
    executor: &'s mut dyn Executor,
    conditions: Conditions,
    _marker: PhantomData<M>,
}

impl<'s, M: Model> Delete<'s, M> {
    pub fn new(adapter: &'s dyn SqlAdapter, executor: &'s mut dyn Executor) -> Self {
        Self { adapter, executor, conditions: Conditions::default(), _marker: PhantomData }
    }

    pub fn filter(mut self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.conditions.push(M::schema(), self.adapter, Connective::Where, column, op, value.into());
        self
    }

    pub fn and(mut self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.conditions.push(M::schema(), self.adapter, Connective::And, column, op, value.into());
        self
    }

    pub fn or(mut self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.conditions.push(M::schema(), self.adapter, Connective::Or, column, op, value.into());
        self
    }

    pub fn equals(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Eq, value)
    }

    pub fn to_sql(&self) -> String {
        self.adapter.delete(M::table_name(), self.conditions.fragments())
    }

    /// Runs the DELETE and commits. Returns the number of rows removed.
    pub fn commit(mut self) -> Result<u64> {
        self.conditions.check()?;

        let sql = self.to_sql();
        let affected = self.executor.execute(&sql)?;
        self.executor.commit()?;
        Ok(affected)
    }
}
