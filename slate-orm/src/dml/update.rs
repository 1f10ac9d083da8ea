//! UPDATE builder.

use std::marker::PhantomData;

use super::{render_assignment, Conditions, Connective, Op};
use crate::{
    adapter::SqlAdapter,
    errors::{Error, Result},
    model::Model,
    session::Executor,
    value::Value,
};

/// An UPDATE over one model's table.
///
/// Without conditions every row is updated.
///
/// # Example
///
/// ```rust,ignore
/// session.update::<User>().set("age", 31).equals("email", "a@x.io").commit()?;
/// ```
pub struct Update<'s, M> {
    adapter: &'s dyn SqlAdapter,
    executor: &'s mut dyn Executor,
    assignments: Vec<String>,
    conditions: Conditions,
    _marker: PhantomData<M>,
}

impl<'s, M: Model> Update<'s, M> {
    pub fn new(adapter: &'s dyn SqlAdapter, executor: &'s mut dyn Executor) -> Self {
        Self { adapter, executor, assignments: Vec::new(), conditions: Conditions::default(), _marker: PhantomData }
    }

    /// Adds `column = value` to the SET list.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        match render_assignment(M::schema(), self.adapter, column, &value.into()) {
            Ok(assignment) => self.assignments.push(assignment),
            Err(err) => self.conditions.fail(err),
        }
        self
    }

    /// Adds every `(column, value)` pair to the SET list.
    pub fn values<I, K, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        values.into_iter().fold(self, |update, (column, value)| update.set(column.as_ref(), value))
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
        self.adapter.update(M::table_name(), &self.assignments, self.conditions.fragments())
    }

    /// Runs the UPDATE and commits. Returns the number of rows changed.
    pub fn commit(mut self) -> Result<u64> {
        self.conditions.check()?;
        if self.assignments.is_empty() {
            return Err(Error::invalid_argument("update has no values to set"));
        }

        let sql = self.to_sql();
        let affected = self.executor.execute(&sql)?;
        self.executor.commit()?;
        Ok(affected)
    }
}
