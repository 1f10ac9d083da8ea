//! # DML Module
//!
//! Statement builders for reading and writing rows, plus table introspection.
//!
//! `Query`, `Update` and `Delete` share one WHERE protocol:
//!
//! - `filter(column, op, value)` starts the condition chain; at most once, and first
//! - `and(..)` / `or(..)` extend it
//! - `equals(column, value)` is `filter(column, Op::Eq, value)`
//!
//! Columns are resolved against the model schema and values are rendered as
//! literals through the column type. Misuse does not panic and does not
//! interrupt the chain: the first problem is kept and returned by the terminal
//! call, before any SQL reaches the database.

mod delete;
mod insert;
mod query;
mod table_info;
mod update;

pub use delete::Delete;
pub use insert::Insert;
pub use query::Query;
pub use table_info::TableInfo;
pub use update::Update;

use std::fmt;

use crate::{
    adapter::SqlAdapter,
    errors::{Error, Result},
    model::Schema,
    value::Value,
};

// ============================================================================
// Operators
// ============================================================================

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
}

impl Op {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Connective {
    Where,
    And,
    Or,
}

// ============================================================================
// Conditions
// ============================================================================

/// Rendered WHERE fragments and the first error met while building them.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    fragments: Vec<String>,
    started: bool,
    error: Option<Error>,
}

impl Conditions {
    pub(crate) fn push(
        &mut self,
        schema: &Schema,
        adapter: &dyn SqlAdapter,
        connective: Connective,
        column: &str,
        op: Op,
        value: Value,
    ) {
        let fragment = match (connective, self.started) {
            (Connective::Where, true) => Err(Error::invalid_argument("filter() may only be called once per statement")),
            (Connective::And | Connective::Or, false) => {
                Err(Error::invalid_argument("and()/or() must follow filter()"))
            }
            _ => render_condition(schema, adapter, column, op, &value),
        };
        self.started = true;

        match fragment {
            Ok(fragment) => {
                let fragment = match connective {
                    Connective::Where => fragment,
                    Connective::And => format!("AND {}", fragment),
                    Connective::Or => format!("OR {}", fragment),
                };
                self.fragments.push(fragment);
            }
            Err(err) => self.fail(err),
        }
    }

    /// Keeps only the first error.
    pub(crate) fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Returns the recorded error, if any.
    pub(crate) fn check(&mut self) -> Result<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

fn render_condition(schema: &Schema, adapter: &dyn SqlAdapter, column: &str, op: Op, value: &Value) -> Result<String> {
    let target = schema.column(column).ok_or_else(|| {
        Error::InvalidArgument(format!("table {} has no column {}", schema.table_name, column))
    })?;
    let name = adapter.quote_identifier(&target.name);

    if value.is_null() {
        return match op {
            Op::Eq => Ok(format!("{} IS NULL", name)),
            Op::Ne => Ok(format!("{} IS NOT NULL", name)),
            other => Err(Error::InvalidArgument(format!("NULL cannot be compared with {}", other))),
        };
    }

    let literal = target.column_type.render_insert_value(value, adapter)?;
    Ok(format!("{} {} {}", name, op, literal))
}

/// Renders `"column" = literal` assignments for an UPDATE.
pub(crate) fn render_assignment(schema: &Schema, adapter: &dyn SqlAdapter, column: &str, value: &Value) -> Result<String> {
    let target = schema.column(column).ok_or_else(|| {
        Error::InvalidArgument(format!("table {} has no column {}", schema.table_name, column))
    })?;
    if value.is_null() && !target.nullable {
        return Err(Error::Validation(format!("column {}.{} is not nullable", schema.table_name, column)));
    }
    let literal = target.column_type.render_insert_value(value, adapter)?;
    Ok(format!("{} = {}", adapter.quote_identifier(&target.name), literal))
}

// ============================================================================
// Tests
// ============================================================================
