//! INSERT builder.

use std::any::TypeId;

use crate::{
    adapter::SqlAdapter,
    errors::{Error, Result},
    model::{Entity, Record},
    session::Executor,
    value::Value,
};

/// A multi-row INSERT.
///
/// Every item of a batch must be of the same model type. Absent values are
/// written as `NULL`; an absent autoincrement key lets the database pick one.
///
/// # Example
///
/// ```rust,ignore
/// let ids = session.insert_items(&users).commit()?;
/// ```
pub struct Insert<'s> {
    adapter: &'s dyn SqlAdapter,
    executor: &'s mut dyn Executor,
    items: Vec<(TypeId, Record)>,
    error: Option<Error>,
}

impl<'s> Insert<'s> {
    pub fn new(adapter: &'s dyn SqlAdapter, executor: &'s mut dyn Executor) -> Self {
        Self { adapter, executor, items: Vec::new(), error: None }
    }

    fn push(&mut self, model_type: TypeId, record: Result<Record>) {
        match record {
            Ok(record) => self.items.push((model_type, record)),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
    }

    pub fn add_item(mut self, item: &dyn Entity) -> Self {
        self.push(item.model_type(), item.record());
        self
    }

    pub fn add_items<'i, E, I>(mut self, items: I) -> Self
    where
        E: Entity + ?Sized + 'i,
        I: IntoIterator<Item = &'i E>,
    {
        for item in items {
            self.push(item.model_type(), item.record());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The INSERT for the current batch, or `None` when it is empty.
    ///
    /// # Errors
    ///
    /// `DifferentModelsType` when the batch mixes model types, `Validation`
    /// when a value cannot be rendered for its column.
    pub fn to_sql(&self) -> Result<Option<String>> {
        let Some((first_type, first)) = self.items.first() else {
            return Ok(None);
        };
        let schema = first.schema();

        if let Some((_, other)) = self.items.iter().find(|(model_type, _)| model_type != first_type) {
            return Err(Error::DifferentModelsType(format!(
                "all items should be {} models, found a {} model",
                schema.table_name,
                other.schema().table_name
            )));
        }

        let rows = self
            .items
            .iter()
            .map(|(_, record)| {
                schema
                    .columns
                    .iter()
                    .zip(record.values())
                    .map(|(column, value)| column.column_type.render_insert_value(value, self.adapter))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let returning = schema.primary_key().map(|c| c.name.as_str());
        Ok(Some(self.adapter.insert_items(&schema.table_name, &schema.column_names(), &rows, returning)))
    }

    /// Runs the INSERT and commits.
    ///
    /// Returns `None` for an empty batch. Otherwise returns the primary keys
    /// of the new rows in insertion order, or an empty list when the table
    /// has no primary key.
    pub fn commit(mut self) -> Result<Option<Vec<Value>>> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let Some(sql) = self.to_sql()? else {
            return Ok(None);
        };

        let has_key = self.items.first().is_some_and(|(_, record)| record.schema().primary_key().is_some());
        let ids = if has_key {
            self.executor
                .fetch_all(&sql)?
                .into_iter()
                .map(|row| row.into_iter().next().unwrap_or(Value::Null))
                .collect()
        } else {
            self.executor.execute(&sql)?;
            Vec::new()
        };
        self.executor.commit()?;

        Ok(Some(ids))
    }
}
