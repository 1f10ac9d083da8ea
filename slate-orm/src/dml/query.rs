//! SELECT builder.

use std::marker::PhantomData;

use super::{Conditions, Connective, Op};
use crate::{
    adapter::SqlAdapter,
    errors::Result,
    model::{Model, Record},
    session::Executor,
    value::Value,
};

/// A fluent SELECT over one model.
///
/// The column list is always spelled out in the model's declared order, so
/// rows map positionally onto the schema whatever the physical table layout.
///
/// # Example
///
/// ```rust,ignore
/// let admins = session
///     .query::<User>()
///     .filter("is_admin", Op::Eq, true)
///     .and("age", Op::Gt, 30)
///     .all()?;
///
/// let newest = session.query::<User>().equals("email", "a@x.io").first()?;
/// ```
pub struct Query<'s, M> {
    adapter: &'s dyn SqlAdapter,
    executor: &'s mut dyn Executor,
    conditions: Conditions,
    limit: Option<usize>,
    _marker: PhantomData<M>,
}

impl<'s, M: Model> Query<'s, M> {
    pub fn new(adapter: &'s dyn SqlAdapter, executor: &'s mut dyn Executor) -> Self {
        Self { adapter, executor, conditions: Conditions::default(), limit: None, _marker: PhantomData }
    }

    /// Starts the WHERE clause.
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

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The SELECT this query would run.
    pub fn to_sql(&self) -> String {
        let columns = M::schema().column_names();
        self.adapter.select(M::table_name(), Some(&columns), self.conditions.fragments(), self.limit)
    }

    /// The first matching row. Uses `LIMIT 1` unless a limit was set.
    pub fn first(mut self) -> Result<Option<M>> {
        self.conditions.check()?;
        if self.limit.is_none() {
            self.limit = Some(1);
        }

        let sql = self.to_sql();
        match self.executor.fetch_one(&sql)? {
            Some(row) => Ok(Some(M::from_record(&Record::from_row(M::schema(), row)?)?)),
            None => Ok(None),
        }
    }

    /// Every matching row.
    pub fn all(mut self) -> Result<Vec<M>> {
        self.conditions.check()?;

        let sql = self.to_sql();
        self.executor
            .fetch_all(&sql)?
            .into_iter()
            .map(|row| M::from_record(&Record::from_row(M::schema(), row)?))
            .collect()
    }
}
